//! Request and response bodies that have no domain-model counterpart.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ma_core::error::AppError;
use ma_core::models::{NewPlace, RawImage, VoteKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

/// A place submission. Images travel as base64 strings.
#[derive(Debug, Deserialize)]
pub struct CreatePlaceRequest {
    #[serde(flatten)]
    pub place: NewPlace,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreatePlaceRequest {
    pub fn into_new_place(self) -> Result<NewPlace, AppError> {
        let mut place = self.place;
        place.images = self
            .images
            .iter()
            .enumerate()
            .map(|(index, encoded)| decode_image(index, encoded))
            .collect::<Result<_, _>>()?;
        Ok(place)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub kind: VoteKind,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default, rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    /// Base64 picture, uploaded to the profile folder.
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRequest {
    pub contribution_id: String,
    pub points: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostRequest {
    pub post_id: String,
}

pub fn decode_image(index: usize, encoded: &str) -> Result<RawImage, AppError> {
    // Tolerate data URLs ("data:image/png;base64,....").
    let payload = encoded.rsplit_once(',').map_or(encoded, |(_, data)| data);
    STANDARD
        .decode(payload.trim())
        .map(RawImage::new)
        .map_err(|err| AppError::ValidationError(format!("image {index} is not valid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_place_request_decodes_images() {
        let body = json!({
            "placeName": "Spence Hall",
            "description": "Dorm",
            "location": "UD",
            "city": "Newark",
            "images": ["AQID", "data:image/png;base64,BAU="]
        });
        let request: CreatePlaceRequest = serde_json::from_value(body).unwrap();
        let place = request.into_new_place().unwrap();
        assert_eq!(place.place_name, "Spence Hall");
        assert_eq!(place.images[0].data.as_ref(), &[1u8, 2, 3]);
        assert_eq!(place.images[1].data.as_ref(), &[4u8, 5]);
        assert!(place.features.is_empty());
    }

    #[test]
    fn bad_base64_is_a_validation_error() {
        let err = decode_image(2, "***").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("image 2")));
    }
}
