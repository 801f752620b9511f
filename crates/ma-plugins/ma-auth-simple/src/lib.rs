//! # ma-auth-simple
//!
//! Signed bearer tokens of the form `<userId>.<signature>`, where the
//! signature is the hex HMAC-SHA256 of the user id under the server secret.
//! Stands in for the hosted identity provider in development and tests.

use hmac::{Hmac, Mac};
use ma_core::models::UserId;
use ma_core::traits::AuthProvider;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    /// Keyed once; cloned per token.
    key: HmacSha256,
}

impl SimpleAuthProvider {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let key = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|err| anyhow::anyhow!("invalid auth secret: {err}"))?;
        Ok(Self { key })
    }

    fn mac(&self, user_id: &str) -> HmacSha256 {
        let mut mac = self.key.clone();
        mac.update(user_id.as_bytes());
        mac
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn issue_token(&self, user: &UserId) -> String {
        let signature = self.mac(user.as_str()).finalize().into_bytes();
        format!("{}.{}", user.as_str(), hex::encode(signature))
    }

    fn resolve_token(&self, token: &str) -> Option<UserId> {
        // User ids may contain dots; the signature never does.
        let (user_id, signature) = token.trim().rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;
        self.mac(user_id).verify_slice(&signature).ok()?;
        Some(UserId::from(user_id))
    }
}
