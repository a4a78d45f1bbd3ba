use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    Executor, Sqlite, SqlitePool, Transaction,
};

use crate::{
    errors::AppError,
    structs::{Dish, MenuItem},
};

pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePool::connect_with(opts).await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!().run(pool).await?;
    log::info!("Database migrated successfully");
    Ok(())
}

/// Deletes every cached dish and inserts `items` inside the caller's
/// transaction. Nothing is visible until the caller commits.
pub async fn replace_dishes_in(
    tx: &mut Transaction<'_, Sqlite>,
    items: &[MenuItem],
) -> Result<usize, sqlx::Error> {
    let cleared = sqlx::query("DELETE FROM dishes")
        .execute(&mut **tx)
        .await?
        .rows_affected();

    for item in items {
        sqlx::query(
            "INSERT INTO dishes (title, description, price, category, image) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.price)
        .bind(&item.category)
        .bind(&item.image)
        .execute(&mut **tx)
        .await?;
    }

    log::info!("Replacing {} cached dishes with {}", cleared, items.len());
    Ok(items.len())
}

pub async fn get_all_dishes(pool: &SqlitePool) -> Result<Vec<Dish>, sqlx::Error> {
    let dishes = sqlx::query_as::<_, Dish>("SELECT * FROM dishes ORDER BY title ASC")
        .fetch_all(pool)
        .await?;
    Ok(dishes)
}

pub async fn get_dish_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Dish>, sqlx::Error> {
    let dish = sqlx::query_as::<_, Dish>("SELECT * FROM dishes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(dish)
}

pub async fn count_dishes(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dishes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_setting<'e, E>(executor: E, key: &str) -> Result<Option<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(executor)
        .await?;
    Ok(value.map(|(v,)| v))
}

pub async fn set_setting<'e, E>(executor: E, key: &str, value: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn replace_dishes(pool: &SqlitePool, items: &[MenuItem]) -> Result<usize, AppError> {
    let mut tx = pool.begin().await?;
    let stored = replace_dishes_in(&mut tx, items).await?;
    tx.commit().await?;
    Ok(stored)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

#[cfg(test)]
pub(crate) fn menu_item(title: &str, category: &str) -> MenuItem {
    MenuItem {
        title: title.to_string(),
        description: format!("{title} description"),
        price: "10".to_string(),
        category: category.to_string(),
        image: format!("https://example.com/{title}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_dishes_keeps_only_latest_set() {
        let pool = test_pool().await;

        let first: Vec<_> = (0..5).map(|i| menu_item(&format!("dish {i}"), "mains")).collect();
        replace_dishes(&pool, &first).await.unwrap();
        assert_eq!(count_dishes(&pool).await.unwrap(), 5);

        let second = vec![menu_item("Lemon Dessert", "desserts"), menu_item("Pasta", "mains")];
        assert_eq!(replace_dishes(&pool, &second).await.unwrap(), 2);
        assert_eq!(count_dishes(&pool).await.unwrap(), 2);

        let titles: Vec<_> = get_all_dishes(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["Lemon Dessert", "Pasta"]);
    }

    #[tokio::test]
    async fn replace_with_empty_menu_clears_table() {
        let pool = test_pool().await;
        replace_dishes(&pool, &[menu_item("Greek Salad", "starters")]).await.unwrap();

        replace_dishes(&pool, &[]).await.unwrap();
        assert_eq!(count_dishes(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_replace_rolls_back_the_delete() {
        let pool = test_pool().await;
        replace_dishes(&pool, &[menu_item("Greek Salad", "starters")]).await.unwrap();

        // Reject any insert with an empty title so the second batch fails midway.
        sqlx::query(
            "CREATE TRIGGER reject_untitled BEFORE INSERT ON dishes WHEN NEW.title = '' \
             BEGIN SELECT RAISE(ABORT, 'untitled dish'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let batch = vec![menu_item("Bruschetta", "starters"), menu_item("", "mains")];
        assert!(replace_dishes(&pool, &batch).await.is_err());

        let dishes = get_all_dishes(&pool).await.unwrap();
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].title, "Greek Salad");
    }

    #[tokio::test]
    async fn dish_lookup_by_id() {
        let pool = test_pool().await;
        replace_dishes(&pool, &[menu_item("Grilled Fish", "mains")]).await.unwrap();

        let id = get_all_dishes(&pool).await.unwrap()[0].id;
        let dish = get_dish_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(dish.title, "Grilled Fish");
        assert!(get_dish_by_id(&pool, id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_upsert() {
        let pool = test_pool().await;
        assert_eq!(get_setting(&pool, "email").await.unwrap(), None);

        set_setting(&pool, "email", "a@b.c").await.unwrap();
        set_setting(&pool, "email", "tilly@littlelemon.com").await.unwrap();
        assert_eq!(
            get_setting(&pool, "email").await.unwrap().as_deref(),
            Some("tilly@littlelemon.com")
        );
    }
}
