//! Minimal changeset computation between a loaded profile and user edits.
//!
//! Only fields with a non-blank proposed value that differs from the
//! baseline are included. A blank proposal never clears a remote field.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::profile::{ProfileField, ProfileFields, MAX_WEBSITES};

/// Marker shown as the old value when the baseline field was empty.
pub const EMPTY_MARKER: &str = "(empty)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// New value for a changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// Changed fields keyed by name, in diff priority order.
///
/// Never holds an empty string or empty list; an empty `ChangeSet` means
/// there is nothing to update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    fields: BTreeMap<ProfileField, FieldValue>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn get(&self, field: ProfileField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Changed fields in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (ProfileField, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.fields.keys().copied()
    }

    fn insert(&mut self, field: ProfileField, value: FieldValue) {
        debug_assert!(!value.is_blank(), "ChangeSet must never hold blank values");
        self.fields.insert(field, value);
    }
}

/// Human-readable record of one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub field: ProfileField,
    pub old: String,
    pub new: String,
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.old, self.new)
    }
}

/// Result of [`compute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComputedChanges {
    pub changes: ChangeSet,
    pub diffs: Vec<DiffEntry>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the minimal changeset that turns `baseline` into `proposed`.
///
/// Scalars are compared after trimming and included (trimmed) only when
/// non-blank and different. Websites are compared as a whole list: blank
/// entries are dropped, the rest truncated to [`MAX_WEBSITES`], and the
/// comma-joined renderings compared.
pub fn compute(baseline: &ProfileFields, proposed: &ProfileFields) -> ComputedChanges {
    let mut result = ComputedChanges::default();

    for field in ProfileField::SCALARS {
        let new = proposed.scalar(field).unwrap_or_default().trim();
        let old = baseline.scalar(field).unwrap_or_default().trim();
        if new.is_empty() || new == old {
            continue;
        }

        result.changes.insert(field, FieldValue::Text(new.to_string()));
        result.diffs.push(DiffEntry {
            field,
            old: display_old(old),
            new: new.to_string(),
        });
    }

    let new_sites = clean_websites(&proposed.websites);
    let old_sites = clean_websites(&baseline.websites);
    let new_joined = new_sites.join(",");
    let old_joined = old_sites.join(",");
    if !new_sites.is_empty() && new_joined != old_joined {
        result
            .changes
            .insert(ProfileField::Websites, FieldValue::List(new_sites));
        result.diffs.push(DiffEntry {
            field: ProfileField::Websites,
            old: display_old(&old_joined),
            new: new_joined,
        });
    }

    result
}

/// Trim entries, drop blanks, keep the first [`MAX_WEBSITES`].
fn clean_websites(websites: &[String]) -> Vec<String> {
    websites
        .iter()
        .map(|site| site.trim())
        .filter(|site| !site.is_empty())
        .take(MAX_WEBSITES)
        .map(str::to_string)
        .collect()
}

fn display_old(old: &str) -> String {
    if old.is_empty() {
        EMPTY_MARKER.to_string()
    } else {
        old.to_string()
    }
}
