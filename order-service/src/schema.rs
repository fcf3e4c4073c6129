diesel::table! {
    orders (id) {
        id -> Integer,
        username -> Text,
        product_name -> Text,
        product_id -> Integer,
        order_date -> Text,
    }
}
