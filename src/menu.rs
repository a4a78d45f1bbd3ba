use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db,
    errors::AppError,
    settings::LAST_MENU_SYNC_KEY,
    structs::{Dish, MenuList},
};

pub const CATEGORIES: [&str; 4] = ["starters", "mains", "desserts", "drinks"];

pub async fn fetch_menu(client: &Client, url: &str) -> Result<MenuList, AppError> {
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(AppError::BadServerResponse(response.status()));
    }

    let body = response.bytes().await?;
    let menu: MenuList = serde_json::from_slice(&body)?;
    log::debug!("Fetched {} menu items from {}", menu.menu.len(), url);
    Ok(menu)
}

/// Fetches the remote menu and replaces every cached dish with it. The new
/// dishes and the sync timestamp commit together; the local table is
/// untouched unless the fetch, the decode and every write succeed.
pub async fn sync_menu(client: &Client, pool: &SqlitePool, url: &str) -> Result<usize, AppError> {
    let menu = fetch_menu(client, url).await?;

    let synced_at = chrono::Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    let stored = db::replace_dishes_in(&mut tx, &menu.menu).await?;
    db::set_setting(&mut *tx, LAST_MENU_SYNC_KEY, &synced_at).await?;
    tx.commit().await?;

    log::info!("Menu synced: {} dishes", stored);
    Ok(stored)
}

/// Screen-facing sync: failures are logged and the cached menu is served as is.
pub async fn refresh_menu(client: &Client, pool: &SqlitePool, url: &str) -> Option<usize> {
    match sync_menu(client, pool, url).await {
        Ok(stored) => Some(stored),
        Err(e) => {
            log::error!("Failed to update menu: {}", e);
            None
        }
    }
}

/// Query string of the menu screen.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MenuFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub vegan: bool,
    pub search: Option<String>,
}

impl MenuFilter {
    /// Selecting the active category again clears it.
    pub fn toggle_category(&self, category: &str) -> Option<String> {
        match &self.category {
            Some(current) if current.eq_ignore_ascii_case(category) => None,
            _ => Some(category.to_string()),
        }
    }

    pub fn matches(&self, dish: &Dish) -> bool {
        let category = dish.category.to_lowercase();

        let matches_category = match self.category.as_deref().filter(|c| !c.is_empty()) {
            Some(selected) => category == selected.to_lowercase(),
            None => true,
        };
        let matches_vegan = !self.vegan || category == "vegan";
        let matches_search = match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => dish.title.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        };

        matches_category && matches_vegan && matches_search
    }

    pub fn apply(&self, dishes: Vec<Dish>) -> Vec<Dish> {
        dishes.into_iter().filter(|dish| self.matches(dish)).collect()
    }
}
