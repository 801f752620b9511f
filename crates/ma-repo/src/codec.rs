//! Mapping between stored documents and domain models.
//!
//! Required string fields must be present and well-typed; collection fields
//! default to empty when missing so older and newer documents both decode.

use chrono::{DateTime, Utc};
use ma_core::document::{Document, FieldUpdate};
use ma_core::models::{Place, User, UserId, UserLedger};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceRecord {
    place_name: String,
    description: String,
    location: String,
    city: String,
    #[serde(rename = "userID")]
    user_id: UserId,
    #[serde(default)]
    features: UserLedger,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    likes: Vec<UserId>,
    #[serde(default)]
    dislikes: Vec<UserId>,
    #[serde(default)]
    comments: UserLedger,
    #[serde(default)]
    date_added: Option<Value>,
    #[serde(default)]
    date_created: Option<Value>,
}

pub fn decode_place(doc: Document) -> Result<Place, serde_json::Error> {
    let record: PlaceRecord = serde_json::from_value(Value::Object(doc.fields))?;
    Ok(Place {
        id: doc.id,
        place_name: record.place_name,
        description: record.description,
        location: record.location,
        city: record.city,
        images: record.images,
        likes: record.likes,
        dislikes: record.dislikes,
        features: record.features,
        comments: record.comments,
        user_id: record.user_id,
        date_added: timestamp(record.date_added.as_ref()).or_else(|| timestamp(record.date_created.as_ref())),
    })
}

/// Writes for a brand-new place document.
pub struct NewPlaceFields<'a> {
    pub place_name: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub city: &'a str,
    pub features: &'a UserLedger,
    pub images: &'a [String],
    pub creator: &'a UserId,
}

impl NewPlaceFields<'_> {
    pub fn into_updates(self) -> Vec<FieldUpdate> {
        vec![
            FieldUpdate::set("placeName", json!(self.place_name)),
            FieldUpdate::set("description", json!(self.description)),
            FieldUpdate::set("location", json!(self.location)),
            FieldUpdate::set("city", json!(self.city)),
            FieldUpdate::set("features", json!(self.features)),
            FieldUpdate::set("images", json!(self.images)),
            FieldUpdate::set("likes", json!([])),
            FieldUpdate::set("dislikes", json!([])),
            FieldUpdate::set("comments", json!({})),
            FieldUpdate::set("userID", json!(self.creator)),
            FieldUpdate::server_timestamp("dateAdded"),
        ]
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    user_id: UserId,
    email: String,
    name: String,
    #[serde(default, rename = "profileImageURL")]
    profile_image_url: Option<String>,
    #[serde(default)]
    date_joined: Option<Value>,
    #[serde(default)]
    total_contribution_points: i64,
    #[serde(default)]
    contributions: Vec<String>,
    #[serde(default)]
    liked_posts: Vec<String>,
}

pub fn decode_user(doc: Document, default_image: &str) -> Result<User, serde_json::Error> {
    let record: UserRecord = serde_json::from_value(Value::Object(doc.fields))?;
    Ok(User {
        user_id: record.user_id,
        email: record.email,
        name: record.name,
        profile_image_url: record.profile_image_url.unwrap_or_else(|| default_image.to_string()),
        date_joined: timestamp(record.date_joined.as_ref()),
        total_contribution_points: record.total_contribution_points,
        contributions: record.contributions,
        liked_posts: record.liked_posts,
    })
}

pub fn new_user_fields(user_id: &UserId, email: &str, name: &str, profile_image_url: &str) -> Vec<FieldUpdate> {
    vec![
        FieldUpdate::set("userId", json!(user_id)),
        FieldUpdate::set("email", json!(email)),
        FieldUpdate::set("name", json!(name)),
        FieldUpdate::set("profileImageURL", json!(profile_image_url)),
        FieldUpdate::server_timestamp("dateJoined"),
        FieldUpdate::set("totalContributionPoints", json!(0)),
        FieldUpdate::set("contributions", json!([])),
        FieldUpdate::set("likedPosts", json!([])),
    ]
}

// Timestamps are informational; an unreadable one decodes as absent.
fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value?.as_str()?.parse().ok()
}
