//! Per-user feature and comment ledgers: `userId -> [text, ...]`, append-only.

use ma_core::document::{FieldPath, FieldUpdate};
use ma_core::models::{Place, UserId, UserLedger};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerField {
    Features,
    Comments,
}

impl LedgerField {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerField::Features => "features",
            LedgerField::Comments => "comments",
        }
    }

    /// Singular noun used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            LedgerField::Features => "feature",
            LedgerField::Comments => "comment",
        }
    }

    pub fn entries(self, place: &Place) -> &UserLedger {
        match self {
            LedgerField::Features => &place.features,
            LedgerField::Comments => &place.comments,
        }
    }
}

/// A copy of `ledger` with `text` appended to `user`'s entry.
pub fn appended(ledger: &UserLedger, user: &UserId, text: &str) -> UserLedger {
    let mut next = ledger.clone();
    next.entry(user.clone()).or_default().push(text.to_string());
    next
}

/// Appends to just this user's entry; other users' entries are never rewritten.
pub fn atomic_updates(field: LedgerField, user: &UserId, text: &str) -> Vec<FieldUpdate> {
    let path = FieldPath::new(field.as_str()).child(user.as_str());
    vec![FieldUpdate::array_append(path, vec![json!(text)])]
}

/// Rewrites the whole map from `place`. Only safe with a version check.
pub fn overwrite_updates(field: LedgerField, place: &Place, user: &UserId, text: &str) -> Vec<FieldUpdate> {
    let next = appended(field.entries(place), user, text);
    vec![FieldUpdate::set(field.as_str(), json!(next))]
}
