//! Like/dislike resolution.
//!
//! Every write produced here leaves the voter in exactly one of `likes` /
//! `dislikes`, whether it is an atomic union/remove pair or a whole-array
//! overwrite computed from a snapshot.

use ma_core::document::FieldUpdate;
use ma_core::models::{Place, UserId, VoteKind};
use serde_json::json;

pub const LIKES: &str = "likes";
pub const DISLIKES: &str = "dislikes";

fn field(kind: VoteKind) -> &'static str {
    match kind {
        VoteKind::Like => LIKES,
        VoteKind::Dislike => DISLIKES,
    }
}

/// Removes `voter` from both sets, then adds it to the one matching `kind`.
pub fn resolve(likes: &[UserId], dislikes: &[UserId], voter: &UserId, kind: VoteKind) -> (Vec<UserId>, Vec<UserId>) {
    let mut likes: Vec<UserId> = likes.iter().filter(|id| *id != voter).cloned().collect();
    let mut dislikes: Vec<UserId> = dislikes.iter().filter(|id| *id != voter).cloned().collect();
    match kind {
        VoteKind::Like => likes.push(voter.clone()),
        VoteKind::Dislike => dislikes.push(voter.clone()),
    }
    (likes, dislikes)
}

/// Single request the store applies atomically; needs no prior read.
pub fn atomic_updates(voter: &UserId, kind: VoteKind) -> Vec<FieldUpdate> {
    vec![
        FieldUpdate::array_union(field(kind), vec![json!(voter)]),
        FieldUpdate::array_remove(field(kind.opposite()), vec![json!(voter)]),
    ]
}

/// Whole-array writes computed from `place`. Only safe with a version check.
pub fn overwrite_updates(place: &Place, voter: &UserId, kind: VoteKind) -> Vec<FieldUpdate> {
    let (likes, dislikes) = resolve(&place.likes, &place.dislikes, voter, kind);
    vec![FieldUpdate::set(LIKES, json!(likes)), FieldUpdate::set(DISLIKES, json!(dislikes))]
}
