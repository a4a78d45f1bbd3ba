use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A cached menu entry. `id` is assigned by the store on insert and does not
/// survive a sync.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Dish {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image: String,
}

/// Remote menu document: `{ "menu": [ ... ] }`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MenuList {
    pub menu: Vec<MenuItem>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub title: String,
    #[serde(rename = "descriptionDish", alias = "description")]
    pub description: String,
    #[serde(deserialize_with = "price_as_text")]
    pub price: String,
    pub category: String,
    pub image: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(serde_json::Number),
}

// The endpoint has shipped prices both as strings and as bare numbers.
fn price_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Text(price) => price,
        RawPrice::Number(price) => price.to_string(),
    })
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotificationPreferences {
    pub order_statuses: bool,
    pub password_changes: bool,
    pub special_offers: bool,
    pub newsletter: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            order_statuses: true,
            password_changes: true,
            special_offers: true,
            newsletter: true,
        }
    }
}

impl NotificationPreferences {
    pub fn all_off() -> Self {
        Self {
            order_statuses: false,
            password_changes: false,
            special_offers: false,
            newsletter: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_menu_with_description_dish_key() {
        let json = r#"{"menu":[{"title":"Greek Salad","descriptionDish":"Crispy lettuce","price":"10","category":"starters","image":"https://example.com/greek.jpg"}]}"#;
        let list: MenuList = serde_json::from_str(json).unwrap();
        assert_eq!(list.menu.len(), 1);
        assert_eq!(list.menu[0].title, "Greek Salad");
        assert_eq!(list.menu[0].description, "Crispy lettuce");
        assert_eq!(list.menu[0].price, "10");
    }

    #[test]
    fn accepts_live_endpoint_shape() {
        let json = r#"{"menu":[{"id":1,"title":"Bruschetta","description":"Grilled bread","price":7,"image":"b.jpg","category":"starters"}]}"#;
        let list: MenuList = serde_json::from_str(json).unwrap();
        assert_eq!(list.menu[0].description, "Grilled bread");
        assert_eq!(list.menu[0].price, "7");
    }

    #[test]
    fn rejects_payload_without_menu_key() {
        let result = serde_json::from_str::<MenuList>(r#"{"dishes":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_item_missing_fields() {
        let result = serde_json::from_str::<MenuList>(r#"{"menu":[{"title":"x","price":"1"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn notification_defaults_are_on() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.order_statuses && prefs.password_changes);
        assert!(prefs.special_offers && prefs.newsletter);
        assert_ne!(prefs, NotificationPreferences::all_off());
    }
}
