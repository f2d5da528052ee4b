//! Remote field limits applied to a changeset before submission.
//!
//! Validation only accepts or rejects. It never trims or blanks values.

use validator::{ValidateEmail, ValidateUrl};

use crate::changeset::{ChangeSet, FieldValue};
use crate::error::CoreError;
use crate::profile::ProfileField;

pub const MAX_ABOUT_LEN: usize = 139;
pub const MAX_DESCRIPTION_LEN: usize = 512;
pub const MAX_ADDRESS_LEN: usize = 256;
pub const MAX_EMAIL_LEN: usize = 128;
pub const MAX_VERTICAL_LEN: usize = 64;
pub const MAX_WEBSITE_LEN: usize = 256;

/// Maximum character count accepted for a single value of `field`.
pub fn max_len(field: ProfileField) -> usize {
    match field {
        ProfileField::About => MAX_ABOUT_LEN,
        ProfileField::Description => MAX_DESCRIPTION_LEN,
        ProfileField::Address => MAX_ADDRESS_LEN,
        ProfileField::Email => MAX_EMAIL_LEN,
        ProfileField::Vertical => MAX_VERTICAL_LEN,
        ProfileField::Websites => MAX_WEBSITE_LEN,
    }
}

/// Validate every value in `changes` against the remote limits.
pub fn validate_changes(changes: &ChangeSet) -> Result<(), CoreError> {
    for (field, value) in changes.iter() {
        match value {
            FieldValue::Text(text) => {
                validate_length(field, text)?;
                if field == ProfileField::Email && !text.validate_email() {
                    return Err(CoreError::Validation(format!(
                        "'{text}' is not a valid email address"
                    )));
                }
            }
            FieldValue::List(items) => {
                for item in items {
                    validate_length(field, item)?;
                    validate_website(item)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_length(field: ProfileField, value: &str) -> Result<(), CoreError> {
    let limit = max_len(field);
    if value.chars().count() > limit {
        return Err(CoreError::Validation(format!(
            "Field '{field}' exceeds maximum length of {limit} characters"
        )));
    }
    Ok(())
}

fn validate_website(url: &str) -> Result<(), CoreError> {
    let has_web_scheme = url.starts_with("https://") || url.starts_with("http://");
    if !has_web_scheme || !url.validate_url() {
        return Err(CoreError::Validation(format!(
            "'{url}' is not a valid http(s) URL"
        )));
    }
    Ok(())
}
