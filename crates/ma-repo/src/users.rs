//! # User Repository
//!
//! Profiles keyed by the authentication provider's user id, plus
//! contribution bookkeeping. Every mutation here is a single atomic
//! union/increment request, so concurrent callers never lose updates.

use std::sync::Arc;

use log::{debug, info, warn};
use ma_core::document::{FieldUpdate, UpdateRequest};
use ma_core::error::{AppError, Result, StoreError};
use ma_core::models::{NewUser, User, UserId};
use ma_core::traits::DocumentStore;
use serde_json::json;

use crate::codec;
use crate::validation::{require_caller, required};

/// Default collection holding user documents.
pub const USERS: &str = "users";

/// Profile picture used when a user signs up without one.
pub const DEFAULT_PROFILE_IMAGE_URL: &str = "/static/uploads/profile_images/default_user_image.png";

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
    default_profile_image: String,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: USERS.to_string(),
            default_profile_image: DEFAULT_PROFILE_IMAGE_URL.to_string(),
        }
    }

    pub fn with_default_profile_image(mut self, url: impl Into<String>) -> Self {
        self.default_profile_image = url.into();
        self
    }

    /// Registers the caller. Calling again for an existing user refreshes
    /// email, name and (when given) the profile image, leaving `dateJoined`
    /// and contribution counters untouched.
    pub async fn create_user(&self, caller: Option<&UserId>, new_user: NewUser) -> Result<User> {
        let user_id = require_caller(caller)?;
        let email = required("email", &new_user.email)?;
        let name = required("name", &new_user.name)?;
        let supplied_image = new_user
            .profile_image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let image = supplied_image.as_deref().unwrap_or(&self.default_profile_image);
        let fields = codec::new_user_fields(user_id, &email, &name, image);
        match self.store.create_with_id(&self.collection, user_id.as_str(), fields).await {
            Ok(()) => info!("Registered user {user_id}"),
            Err(StoreError::AlreadyExists { .. }) => {
                let mut updates = vec![FieldUpdate::set("email", json!(email)), FieldUpdate::set("name", json!(name))];
                if let Some(url) = &supplied_image {
                    updates.push(FieldUpdate::set("profileImageURL", json!(url)));
                }
                self.store
                    .update_fields(&self.collection, user_id.as_str(), UpdateRequest::new(updates))
                    .await?;
                debug!("User {user_id} already registered, refreshed profile");
            }
            Err(err) => return Err(err.into()),
        }

        self.fetch_user(user_id.as_str()).await
    }

    /// Fails with `NotFound` when the document is absent or malformed.
    pub async fn fetch_user(&self, id: &str) -> Result<User> {
        let doc = self
            .store
            .get(&self.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        codec::decode_user(doc, &self.default_profile_image).map_err(|err| {
            warn!("User {id} is malformed: {err}");
            self.not_found(id)
        })
    }

    /// Records a contribution and awards `points` in one atomic request.
    pub async fn add_contribution(&self, caller: Option<&UserId>, contribution_id: &str, points: i64) -> Result<()> {
        let user_id = require_caller(caller)?;
        let contribution_id = required("contributionId", contribution_id)?;
        if points < 0 {
            return Err(AppError::ValidationError(format!(
                "points must not be negative, got {points}"
            )));
        }

        let request = UpdateRequest::new(vec![
            FieldUpdate::array_union("contributions", vec![json!(contribution_id)]),
            FieldUpdate::increment("totalContributionPoints", points),
        ]);
        self.store.update_fields(&self.collection, user_id.as_str(), request).await?;
        info!("Awarded {points} points to {user_id} for {contribution_id}");
        Ok(())
    }

    pub async fn add_liked_post(&self, caller: Option<&UserId>, post_id: &str) -> Result<()> {
        let user_id = require_caller(caller)?;
        let post_id = required("postId", post_id)?;
        let request = UpdateRequest::new(vec![FieldUpdate::array_union("likedPosts", vec![json!(post_id)])]);
        self.store.update_fields(&self.collection, user_id.as_str(), request).await?;
        Ok(())
    }

    fn not_found(&self, id: &str) -> AppError {
        AppError::NotFound(self.collection.clone(), id.to_string())
    }
}
