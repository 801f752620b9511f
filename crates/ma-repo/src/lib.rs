//! # ma-repo
//!
//! Place and user repositories: the rules by which many independent clients
//! mutate shared place records (votes, features, comments) without losing
//! updates or breaking vote exclusivity.

pub mod codec;
pub mod images;
pub mod ledger;
pub mod places;
pub mod users;
pub mod validation;
pub mod vote;

pub use places::{PlaceRepository, WriteStrategy, PLACES};
pub use users::{UserRepository, DEFAULT_PROFILE_IMAGE_URL, USERS};
