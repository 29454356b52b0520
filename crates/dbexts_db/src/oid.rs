//! Textual identifier parsing.
//!
//! [`to_object_id`] is the lenient path used for ids supplied by callers: anything that is
//! not hex maps to `None` instead of an error. Repositories parse ids for deletion with the
//! driver's own parser instead, see [`crate::MongoCrud::delete_by_id`].

use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Hex digits with an optional `0x`/`0X` prefix.
pub static HEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0x|0X)?[a-fA-F0-9]+$").expect("hex pattern is valid"));

/// Parses `text` into an [`ObjectId`].
///
/// Returns `None` when `text` is not hex or is not a valid object id. Callers must treat
/// `None` as a validation failure, not as "not found".
pub fn to_object_id(text: &str) -> Option<ObjectId> {
    if !HEX_PATTERN.is_match(text) {
        return None;
    }
    ObjectId::parse_str(text).ok()
}
