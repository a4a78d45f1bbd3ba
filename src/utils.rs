use std::collections::HashMap;

use tera::{to_value, try_get_value, Value};

/// Dish prices are stored as received; an empty price reads as zero.
pub fn display_price(price: &str) -> String {
    let price = price.trim();
    if price.is_empty() {
        "$0".to_string()
    } else {
        format!("${price}")
    }
}

/// Tera filter wrapping [`display_price`]: `{{ dish.price | price }}`.
pub fn price_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let price = try_get_value!("price", "value", String, value);
    Ok(to_value(display_price(&price))?)
}
