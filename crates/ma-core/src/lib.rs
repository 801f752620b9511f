//! myaccess/crates/ma-core/src/lib.rs
//!
//! The central domain types and interface definitions for MyAccess.

pub mod document;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use document::*;
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    fn place() -> Place {
        Place {
            id: "p1".to_string(),
            place_name: "Spence Hall".to_string(),
            description: "Dorm".to_string(),
            location: "West Campus".to_string(),
            city: "Nashville".to_string(),
            images: vec![],
            likes: vec![UserId::from("u1")],
            dislikes: vec![UserId::from("u2")],
            features: Default::default(),
            comments: Default::default(),
            user_id: UserId::from("u1"),
            date_added: None,
        }
    }

    #[test]
    fn vote_of_reports_membership() {
        let p = place();
        assert_eq!(p.vote_of(&UserId::from("u1")), Some(VoteKind::Like));
        assert_eq!(p.vote_of(&UserId::from("u2")), Some(VoteKind::Dislike));
        assert_eq!(p.vote_of(&UserId::from("u3")), None);
        assert_eq!((p.like_count(), p.dislike_count()), (1, 1));
    }

    #[test]
    fn place_serializes_with_document_field_names() {
        let json = serde_json::to_value(place()).unwrap();
        assert_eq!(json["placeName"], "Spence Hall");
        assert_eq!(json["userID"], "u1");
        assert!(json.get("dateAdded").is_some());
    }

    #[test]
    fn vote_kind_wire_format() {
        assert_eq!(serde_json::to_string(&VoteKind::Dislike).unwrap(), "\"dislike\"");
        assert_eq!(VoteKind::Like.opposite(), VoteKind::Dislike);
    }
}
