use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

use crate::errors::AppError;

pub const DEFAULT_MENU_URL: &str =
    "https://raw.githubusercontent.com/Meta-Mobile-Developer-PC/Working-With-Data-API/main/menu.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub menu_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://little_lemon.db")?,
            menu_url: try_load("MENU_URL", DEFAULT_MENU_URL)?,
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "8080")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::ConfigError(format!("invalid {key} value {raw:?}: {e}"))
    })
}
