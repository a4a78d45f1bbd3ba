use serde::{Deserialize, Serialize};

use crate::structs::UserProfile;

pub const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required.";
pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email address.";
pub const INVALID_PHONE_MESSAGE: &str = "Invalid phone number format.";

/// Editable onboarding/profile inputs plus the error banner state.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct OnboardingForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(skip_deserializing)]
    pub show_error: bool,
    #[serde(skip_deserializing)]
    pub error_message: Option<String>,
}

impl OnboardingForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone_number: profile.phone_number.clone(),
            ..Self::default()
        }
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }

    /// Validity flag the save/register controls bind to. Pure; recomputed
    /// whenever any of the four inputs changes.
    pub fn is_form_valid(&self) -> bool {
        !is_blank(&self.first_name)
            && !is_blank(&self.last_name)
            && is_valid_email(&self.email)
            && (self.phone_number.is_empty() || is_valid_phone(&self.phone_number))
    }

    /// Checks the rules in priority order and records the first failure as
    /// the user-facing message.
    pub fn validate(&mut self) -> bool {
        let failure = if is_blank(&self.first_name) || is_blank(&self.last_name) || is_blank(&self.email) {
            Some(REQUIRED_FIELDS_MESSAGE)
        } else if !is_valid_email(&self.email) {
            Some(INVALID_EMAIL_MESSAGE)
        } else if !self.phone_number.is_empty() && !is_valid_phone(&self.phone_number) {
            Some(INVALID_PHONE_MESSAGE)
        } else {
            None
        };

        match failure {
            Some(message) => {
                log::debug!("Form validation failed: {message}");
                self.error_message = Some(message.to_string());
                self.show_error = true;
                false
            }
            None => {
                self.error_message = None;
                self.show_error = false;
                true
            }
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Exactly one non-empty local part and one non-empty domain containing a `.`.
/// Empty pieces between separators are ignored, so `"a@@b.c"` passes.
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').filter(|part| !part.is_empty()).collect();
    parts.len() == 2 && parts[1].contains('.')
}

/// `+` followed by one or more digits.
pub fn is_valid_phone(phone: &str) -> bool {
    match phone.strip_prefix('+') {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_numeric()),
        None => false,
    }
}
