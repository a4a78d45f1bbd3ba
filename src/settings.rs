//! Flat key-value persistence for the profile, the logged-in flag and the
//! notification toggles. Nothing here validates values; callers gate writes
//! on [`OnboardingForm`].

use sqlx::SqlitePool;

use crate::{
    db::{get_setting, set_setting},
    errors::AppError,
    structs::{NotificationPreferences, UserProfile},
    validation::OnboardingForm,
};

pub const FIRST_NAME_KEY: &str = "first_name";
pub const LAST_NAME_KEY: &str = "last_name";
pub const EMAIL_KEY: &str = "email";
pub const PHONE_NUMBER_KEY: &str = "phone_number";
pub const IS_LOGGED_IN_KEY: &str = "is_logged_in";
pub const ORDER_STATUSES_KEY: &str = "order_statuses";
pub const PASSWORD_CHANGES_KEY: &str = "password_changes";
pub const SPECIAL_OFFERS_KEY: &str = "special_offers";
pub const NEWSLETTER_KEY: &str = "newsletter";
pub const LAST_MENU_SYNC_KEY: &str = "last_menu_sync";

async fn get_string(pool: &SqlitePool, key: &str) -> Result<String, AppError> {
    Ok(get_setting(pool, key).await?.unwrap_or_default())
}

async fn get_bool(pool: &SqlitePool, key: &str, default: bool) -> Result<bool, AppError> {
    Ok(match get_setting(pool, key).await?.as_deref() {
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            log::warn!("Unexpected value {other:?} for {key}, using {default}");
            default
        }
        None => default,
    })
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub async fn load_profile(pool: &SqlitePool) -> Result<UserProfile, AppError> {
    Ok(UserProfile {
        first_name: get_string(pool, FIRST_NAME_KEY).await?,
        last_name: get_string(pool, LAST_NAME_KEY).await?,
        email: get_string(pool, EMAIL_KEY).await?,
        phone_number: get_string(pool, PHONE_NUMBER_KEY).await?,
    })
}

pub async fn load_notifications(pool: &SqlitePool) -> Result<NotificationPreferences, AppError> {
    Ok(NotificationPreferences {
        order_statuses: get_bool(pool, ORDER_STATUSES_KEY, true).await?,
        password_changes: get_bool(pool, PASSWORD_CHANGES_KEY, true).await?,
        special_offers: get_bool(pool, SPECIAL_OFFERS_KEY, true).await?,
        newsletter: get_bool(pool, NEWSLETTER_KEY, true).await?,
    })
}

pub async fn is_logged_in(pool: &SqlitePool) -> Result<bool, AppError> {
    get_bool(pool, IS_LOGGED_IN_KEY, false).await
}

pub async fn last_menu_sync(pool: &SqlitePool) -> Result<Option<String>, AppError> {
    Ok(get_setting(pool, LAST_MENU_SYNC_KEY).await?)
}

/// Writes profile and notification flags in one transaction.
pub async fn save_all(
    pool: &SqlitePool,
    profile: &UserProfile,
    notifications: &NotificationPreferences,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    save_profile_fields(&mut tx, profile).await?;
    save_notification_flags(&mut tx, notifications).await?;
    tx.commit().await?;
    Ok(())
}

/// Validates the onboarding form and, when it passes, stores the profile and
/// marks the user logged in. The form carries the error message otherwise.
pub async fn register(pool: &SqlitePool, form: &mut OnboardingForm) -> Result<bool, AppError> {
    if !form.validate() {
        log::info!("Registration rejected: {:?}", form.error_message);
        return Ok(false);
    }

    let profile = form.to_profile();
    let mut tx = pool.begin().await?;
    save_profile_fields(&mut tx, &profile).await?;
    set_setting(&mut *tx, IS_LOGGED_IN_KEY, bool_text(true)).await?;
    tx.commit().await?;

    log::info!("Registered {}", profile.email);
    Ok(true)
}

/// Clears the profile, switches every notification off and drops the
/// logged-in flag.
pub async fn logout(pool: &SqlitePool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    save_profile_fields(&mut tx, &UserProfile::default()).await?;
    save_notification_flags(&mut tx, &NotificationPreferences::all_off()).await?;
    set_setting(&mut *tx, IS_LOGGED_IN_KEY, bool_text(false)).await?;
    tx.commit().await?;
    log::info!("Logged out, local profile cleared");
    Ok(())
}

async fn save_profile_fields(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    profile: &UserProfile,
) -> Result<(), sqlx::Error> {
    set_setting(&mut **tx, FIRST_NAME_KEY, &profile.first_name).await?;
    set_setting(&mut **tx, LAST_NAME_KEY, &profile.last_name).await?;
    set_setting(&mut **tx, EMAIL_KEY, &profile.email).await?;
    set_setting(&mut **tx, PHONE_NUMBER_KEY, &profile.phone_number).await?;
    Ok(())
}

async fn save_notification_flags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    notifications: &NotificationPreferences,
) -> Result<(), sqlx::Error> {
    set_setting(&mut **tx, ORDER_STATUSES_KEY, bool_text(notifications.order_statuses)).await?;
    set_setting(&mut **tx, PASSWORD_CHANGES_KEY, bool_text(notifications.password_changes)).await?;
    set_setting(&mut **tx, SPECIAL_OFFERS_KEY, bool_text(notifications.special_offers)).await?;
    set_setting(&mut **tx, NEWSLETTER_KEY, bool_text(notifications.newsletter)).await?;
    Ok(())
}

/// Working copy of the profile screen. Edits stay here until [`save`] writes
/// them; [`discard`] throws them away.
///
/// [`save`]: ProfileEditor::save
/// [`discard`]: ProfileEditor::discard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileEditor {
    pub form: OnboardingForm,
    pub notifications: NotificationPreferences,
}

impl ProfileEditor {
    pub async fn load(pool: &SqlitePool) -> Result<Self, AppError> {
        let profile = load_profile(pool).await?;
        Ok(Self {
            form: OnboardingForm::from_profile(&profile),
            notifications: load_notifications(pool).await?,
        })
    }

    /// Reloads every field from the store. Never writes.
    pub async fn discard(&mut self, pool: &SqlitePool) -> Result<(), AppError> {
        *self = Self::load(pool).await?;
        Ok(())
    }

    /// Persists the editable fields when the form is valid. Returns whether
    /// anything was written.
    pub async fn save(&mut self, pool: &SqlitePool) -> Result<bool, AppError> {
        let gated = self.form.is_form_valid();
        if !self.form.validate() || !gated {
            return Ok(false);
        }

        save_all(pool, &self.form.to_profile(), &self.notifications).await?;
        log::info!("Profile changes saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn tilly() -> OnboardingForm {
        OnboardingForm {
            first_name: "Tilly".into(),
            last_name: "Lemon".into(),
            email: "tilly@littlelemon.com".into(),
            phone_number: "+13125550100".into(),
            ..OnboardingForm::default()
        }
    }

    #[tokio::test]
    async fn fresh_store_has_defaults() {
        let pool = test_pool().await;
        assert_eq!(load_profile(&pool).await.unwrap(), UserProfile::default());
        assert_eq!(load_notifications(&pool).await.unwrap(), NotificationPreferences::default());
        assert!(!is_logged_in(&pool).await.unwrap());
        assert!(last_menu_sync(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_stores_profile_and_logs_in() {
        let pool = test_pool().await;
        let mut form = tilly();
        assert!(register(&pool, &mut form).await.unwrap());

        let profile = load_profile(&pool).await.unwrap();
        assert_eq!(profile.first_name, "Tilly");
        assert_eq!(profile.phone_number, "+13125550100");
        assert!(is_logged_in(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_registration_writes_nothing() {
        let pool = test_pool().await;
        let mut form = OnboardingForm {
            email: "ab.c".into(),
            ..tilly()
        };
        assert!(!register(&pool, &mut form).await.unwrap());
        assert_eq!(form.error_message.as_deref(), Some("Invalid email address."));
        assert_eq!(load_profile(&pool).await.unwrap(), UserProfile::default());
        assert!(!is_logged_in(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn logout_clears_profile_and_notifications() {
        let pool = test_pool().await;
        register(&pool, &mut tilly()).await.unwrap();
        save_all(&pool, &tilly().to_profile(), &NotificationPreferences::default())
            .await
            .unwrap();

        logout(&pool).await.unwrap();

        assert_eq!(load_profile(&pool).await.unwrap(), UserProfile::default());
        assert_eq!(load_notifications(&pool).await.unwrap(), NotificationPreferences::all_off());
        assert!(!is_logged_in(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn discard_restores_stored_values_without_writing() {
        let pool = test_pool().await;
        register(&pool, &mut tilly()).await.unwrap();

        let mut editor = ProfileEditor::load(&pool).await.unwrap();
        editor.form.first_name = "Adrian".into();
        editor.notifications.newsletter = false;

        editor.discard(&pool).await.unwrap();
        assert_eq!(editor.form.first_name, "Tilly");
        assert!(editor.notifications.newsletter);
        assert_eq!(load_profile(&pool).await.unwrap().first_name, "Tilly");
    }

    #[tokio::test]
    async fn save_persists_valid_edits() {
        let pool = test_pool().await;
        register(&pool, &mut tilly()).await.unwrap();

        let mut editor = ProfileEditor::load(&pool).await.unwrap();
        editor.form.email = "adrian@littlelemon.com".into();
        editor.notifications.special_offers = false;
        assert!(editor.save(&pool).await.unwrap());

        assert_eq!(load_profile(&pool).await.unwrap().email, "adrian@littlelemon.com");
        assert!(!load_notifications(&pool).await.unwrap().special_offers);
    }

    #[tokio::test]
    async fn save_is_gated_on_validity() {
        let pool = test_pool().await;
        register(&pool, &mut tilly()).await.unwrap();

        let mut editor = ProfileEditor::load(&pool).await.unwrap();
        editor.form.phone_number = "555".into();
        editor.notifications.newsletter = false;
        assert!(!editor.save(&pool).await.unwrap());
        assert_eq!(editor.form.error_message.as_deref(), Some("Invalid phone number format."));

        assert_eq!(load_profile(&pool).await.unwrap().phone_number, "+13125550100");
        assert!(load_notifications(&pool).await.unwrap().newsletter);
    }
}
