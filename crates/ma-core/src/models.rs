//! # Domain Models
//!
//! These structs represent the core entities of MyAccess. Field names
//! serialize in the camelCase the stored documents use.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity assigned by the authentication provider. Doubles as the user
/// document's primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single like-or-dislike vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    /// The opposite vote; a voter is removed from its set when voting this kind.
    pub fn opposite(self) -> Self {
        match self {
            VoteKind::Like => VoteKind::Dislike,
            VoteKind::Dislike => VoteKind::Like,
        }
    }
}

/// Per-user ordered text entries (features or comments).
pub type UserLedger = BTreeMap<UserId, Vec<String>>;

/// A reviewed physical place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Assigned by the store on creation.
    pub id: String,
    pub place_name: String,
    pub description: String,
    pub location: String,
    pub city: String,
    pub images: Vec<String>,
    /// User ids; a voter is never in both `likes` and `dislikes`.
    pub likes: Vec<UserId>,
    pub dislikes: Vec<UserId>,
    pub features: UserLedger,
    pub comments: UserLedger,
    /// Creator of the place.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub date_added: Option<DateTime<Utc>>,
}

impl Place {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn dislike_count(&self) -> usize {
        self.dislikes.len()
    }

    /// The user's current vote, if any.
    pub fn vote_of(&self, user: &UserId) -> Option<VoteKind> {
        if self.likes.contains(user) {
            Some(VoteKind::Like)
        } else if self.dislikes.contains(user) {
            Some(VoteKind::Dislike)
        } else {
            None
        }
    }
}

/// Submission for a new place. The creator is the authenticated caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    pub place_name: String,
    pub description: String,
    pub location: String,
    pub city: String,
    #[serde(default)]
    pub features: UserLedger,
    #[serde(skip)]
    pub images: Vec<RawImage>,
}

/// A document that `fetch_all` could not decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    pub id: String,
    pub reason: String,
}

/// Best-effort listing: every decodable place plus what was skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaceListing {
    pub places: Vec<Place>,
    pub skipped: Vec<SkippedDocument>,
}

/// A registered user's profile and contribution bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: String,
    pub date_joined: Option<DateTime<Utc>>,
    /// Only ever grows, via atomic increments.
    pub total_contribution_points: i64,
    pub contributions: Vec<String>,
    pub liked_posts: Vec<String>,
}

/// Profile data written at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    #[serde(default, rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
}

/// Destination folder of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Place,
    Profile,
}

impl ImageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFolder::Place => "place_images",
            ImageFolder::Profile => "profile_images",
        }
    }
}

/// Raw bytes of an image picked by the user, before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub data: Bytes,
}

impl RawImage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}
