//! Business profile fields and normalization of remote profile responses.
//!
//! The remote service returns the profile in several envelope shapes
//! (`{data: [...]}`, `{data: {...}}`, or a flat object). [`normalize_profile`]
//! collapses all of them into a single [`ProfileFields`] value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of websites the remote profile accepts.
pub const MAX_WEBSITES: usize = 2;

/// Field list requested when reading a profile.
pub const PROFILE_READ_FIELDS: &str =
    "about,address,description,email,profile_picture_url,websites,vertical";

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// An editable profile field.
///
/// Declaration order is the diff priority order: scalars first, websites last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    About,
    Description,
    Address,
    Email,
    Vertical,
    Websites,
}

impl ProfileField {
    /// Scalar (single string) fields in diff priority order.
    pub const SCALARS: [ProfileField; 5] = [
        ProfileField::About,
        ProfileField::Description,
        ProfileField::Address,
        ProfileField::Email,
        ProfileField::Vertical,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::About => "about",
            Self::Description => "description",
            Self::Address => "address",
            Self::Email => "email",
            Self::Vertical => "vertical",
            Self::Websites => "websites",
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A business profile as loaded from, or proposed for, the remote service.
///
/// Every field defaults to empty. `picture_url` is server-derived and never
/// part of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFields {
    pub about: String,
    pub description: String,
    pub address: String,
    pub email: String,
    pub vertical: String,
    pub websites: Vec<String>,
    #[serde(rename = "profile_picture_url")]
    pub picture_url: String,
}

impl ProfileFields {
    /// Value of a scalar field, or `None` for [`ProfileField::Websites`].
    pub fn scalar(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::About => Some(&self.about),
            ProfileField::Description => Some(&self.description),
            ProfileField::Address => Some(&self.address),
            ProfileField::Email => Some(&self.email),
            ProfileField::Vertical => Some(&self.vertical),
            ProfileField::Websites => None,
        }
    }
}

/// Normalize a raw remote profile response into [`ProfileFields`].
///
/// Accepts `{data: [profile, ...]}` (first entry wins), `{data: profile}`,
/// or a flat profile object. Anything else yields an empty profile.
/// Non-string values are treated as empty; websites are truncated to
/// [`MAX_WEBSITES`].
pub fn normalize_profile(raw: &Value) -> ProfileFields {
    let entry = match raw.get("data") {
        Some(Value::Array(items)) => items.first(),
        Some(data @ Value::Object(_)) => Some(data),
        _ => Some(raw),
    };

    let Some(Value::Object(map)) = entry else {
        return ProfileFields::default();
    };

    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let websites = match map.get("websites") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .take(MAX_WEBSITES)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    ProfileFields {
        about: text("about"),
        description: text("description"),
        address: text("address"),
        email: text("email"),
        vertical: text("vertical"),
        websites,
        picture_url: text("profile_picture_url"),
    }
}
