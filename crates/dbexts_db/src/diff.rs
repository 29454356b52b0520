//! Partial-update statements computed from two versions of a record.
//!
//! Both records are serialized with serde, so a field's external name is whatever its
//! serde attributes say (`rename`, `rename_all`), and fields come out in declaration
//! order. Only scalar fields take part: embedded documents and arrays are skipped, as is
//! the `_id` field.

use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use tracing::{debug, warn};

/// Update operator wrapping the changed fields.
pub const SET: &str = "$set";

/// External name of the identifier field.
pub const OID: &str = "_id";

/// A field value as written into an update statement
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<FieldValue> for Bson {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Bson::Null,
            FieldValue::Bool(b) => Bson::Boolean(b),
            FieldValue::Int(i) => Bson::Int64(i),
            FieldValue::Float(f) => Bson::Double(f),
            FieldValue::Str(s) => Bson::String(s),
        }
    }
}

/// Extracts the update value of a serialized field.
///
/// Booleans and numbers keep their kind; every other scalar falls back to its string form.
/// Returns `None` for embedded documents and arrays, which are not compared.
pub fn extract_value(value: &Bson) -> Option<FieldValue> {
    let extracted = match value {
        Bson::Document(_) | Bson::Array(_) => return None,
        Bson::Null | Bson::Undefined => FieldValue::Null,
        Bson::Boolean(b) => FieldValue::Bool(*b),
        Bson::Int32(i) => FieldValue::Int(i64::from(*i)),
        Bson::Int64(i) => FieldValue::Int(*i),
        Bson::Double(f) => FieldValue::Float(*f),
        Bson::String(s) => FieldValue::Str(s.clone()),
        Bson::ObjectId(oid) => FieldValue::Str(oid.to_hex()),
        Bson::DateTime(dt) => FieldValue::Str(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.to_string()),
        ),
        other => FieldValue::Str(other.to_string()),
    };
    Some(extracted)
}

fn is_comparable(value: &Bson) -> bool {
    !matches!(value, Bson::Document(_) | Bson::Array(_))
}

// NaN equals itself when the bits match
fn same_value(old: &Bson, new: &Bson) -> bool {
    match (old, new) {
        (Bson::Double(a), Bson::Double(b)) => a == b || a.to_bits() == b.to_bits(),
        _ => old == new,
    }
}

/// Builds the `(external name, new value)` pairs for every field that differs between
/// `old` and `new`.
///
/// Identical records give an empty document. If `old` or `new` does not serialize to a
/// document (it is not a struct or map), the result is empty as well. A field that `new`
/// leaves out of its serialized form, e.g. through `skip_serializing_if`, is not reported.
///
/// # Errors
///
/// Returns the serializer error when a record cannot be represented in BSON at all, for
/// example a `u64` above `i64::MAX`.
pub fn try_make_update_statements<A: Serialize>(
    old: &A,
    new: &A,
) -> Result<Document, bson::ser::Error> {
    let (old_doc, new_doc) = match (bson::to_bson(old)?, bson::to_bson(new)?) {
        (Bson::Document(old_doc), Bson::Document(new_doc)) => (old_doc, new_doc),
        _ => {
            debug!("Not a structured record, nothing to compare");
            return Ok(Document::new());
        }
    };

    let mut updates = Document::new();
    for (name, new_value) in &new_doc {
        if name == OID {
            continue;
        }
        let old_value = old_doc.get(name).unwrap_or(&Bson::Null);
        if !is_comparable(old_value) || !is_comparable(new_value) {
            continue;
        }
        if same_value(old_value, new_value) {
            continue;
        }
        if let Some(value) = extract_value(new_value) {
            updates.insert(name.clone(), Bson::from(value));
        }
    }
    Ok(updates)
}

/// Like [`try_make_update_statements`], but a record that cannot be serialized gives an
/// empty statement. The serializer error is logged.
pub fn make_update_statements<A: Serialize>(old: &A, new: &A) -> Document {
    try_make_update_statements(old, new).unwrap_or_else(|e| {
        warn!("Cannot serialize record, no update statement built: {}", e);
        Document::new()
    })
}

/// Wraps [`make_update_statements`] in a `$set` envelope ready for an update call.
pub fn make_update_set_statement<A: Serialize>(old: &A, new: &A) -> Document {
    let mut statement = Document::new();
    statement.insert(SET, make_update_statements(old, new));
    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Person {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        #[serde(rename = "first_name")]
        first_name: String,
        #[serde(rename = "last_name")]
        last_name: String,
        age: i32,
        score: f64,
        active: bool,
        nickname: Option<String>,
        tags: Vec<String>,
    }

    fn mk_test_person() -> Person {
        Person {
            id: None,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            age: 42,
            score: 1.5,
            active: true,
            nickname: None,
            tags: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_make_update_statement() {
        let someone = mk_test_person();
        let mut someone_new = mk_test_person();
        someone_new.first_name = "Jane".to_string();

        let updates = make_update_statements(&someone, &someone_new);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates.get_str("first_name").unwrap(), "Jane");
    }

    #[test]
    fn test_field_order_follows_declaration() {
        let old = mk_test_person();
        let new = Person {
            active: false,
            first_name: "Jane".to_string(),
            age: 43,
            ..mk_test_person()
        };

        let updates = make_update_statements(&old, &new);
        let keys: Vec<&str> = updates.keys().map(String::as_str).collect();
        assert_eq!(keys, ["first_name", "age", "active"]);
    }

    #[test]
    fn test_scalar_kinds_are_extracted() {
        let old = mk_test_person();
        let new = Person {
            age: 7,
            score: 2.25,
            active: false,
            nickname: Some("JD".to_string()),
            ..mk_test_person()
        };

        let updates = make_update_statements(&old, &new);
        assert_eq!(updates.get("age"), Some(&Bson::Int64(7)));
        assert_eq!(updates.get("score"), Some(&Bson::Double(2.25)));
        assert_eq!(updates.get("active"), Some(&Bson::Boolean(false)));
        assert_eq!(updates.get("nickname"), Some(&Bson::String("JD".to_string())));
    }

    #[test]
    fn test_cleared_option_is_set_to_null() {
        let old = Person {
            nickname: Some("JD".to_string()),
            ..mk_test_person()
        };
        let new = mk_test_person();

        let updates = make_update_statements(&old, &new);
        assert_eq!(updates.get("nickname"), Some(&Bson::Null));
    }

    #[test]
    fn test_arrays_are_not_compared() {
        let old = mk_test_person();
        let new = Person {
            tags: vec!["guest".to_string()],
            ..mk_test_person()
        };

        assert!(make_update_statements(&old, &new).is_empty());
    }

    #[test]
    fn test_identifier_is_excluded() {
        let old = Person {
            id: Some(ObjectId::new()),
            ..mk_test_person()
        };
        let new = Person {
            id: Some(ObjectId::new()),
            ..mk_test_person()
        };

        assert!(make_update_statements(&old, &new).is_empty());
    }

    #[test]
    fn test_non_struct_yields_empty_statement() {
        assert!(make_update_statements(&1_i32, &2_i32).is_empty());
        assert!(make_update_statements(&"a", &"b").is_empty());
    }

    #[derive(Debug, Clone, Serialize)]
    struct Counter {
        name: String,
        hits: u64,
    }

    #[test]
    fn test_unserializable_record_is_an_error() {
        let old = Counter {
            name: "John".to_string(),
            hits: u64::MAX,
        };
        let new = Counter {
            name: "Jane".to_string(),
            ..old.clone()
        };

        assert!(try_make_update_statements(&old, &new).is_err());
        assert!(make_update_statements(&old, &new).is_empty());
    }

    #[test]
    fn test_nan_field_equals_itself() {
        let person = Person {
            score: f64::NAN,
            ..mk_test_person()
        };

        assert!(make_update_statements(&person, &person.clone()).is_empty());

        let scored = Person {
            score: 2.0,
            ..person.clone()
        };
        let updates = make_update_statements(&person, &scored);
        assert_eq!(updates.get("score"), Some(&Bson::Double(2.0)));
    }

    #[test]
    fn test_set_envelope() {
        let old = mk_test_person();
        let new = Person {
            last_name: "Roe".to_string(),
            ..mk_test_person()
        };

        let statement = make_update_set_statement(&old, &new);
        assert_eq!(statement.len(), 1);
        let set = statement.get_document(SET).unwrap();
        assert_eq!(set.get_str("last_name").unwrap(), "Roe");
    }

    #[test]
    fn test_extract_value_contract() {
        assert_eq!(extract_value(&Bson::Int32(3)), Some(FieldValue::Int(3)));
        assert_eq!(
            extract_value(&Bson::Document(Document::new())),
            None
        );
        let oid = ObjectId::new();
        assert_eq!(
            extract_value(&Bson::ObjectId(oid)),
            Some(FieldValue::Str(oid.to_hex()))
        );
    }

    prop_compose! {
        fn arb_person()(
            first_name in "[A-Za-z]{1,12}",
            last_name in "[A-Za-z]{1,12}",
            age in 0..120i32,
            score in -1.0e6..1.0e6f64,
            active in any::<bool>(),
            nickname in proptest::option::of("[a-z]{1,8}"),
        ) -> Person {
            Person {
                id: Some(ObjectId::new()),
                first_name,
                last_name,
                age,
                score,
                active,
                nickname,
                tags: Vec::new(),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_diff_of_identical_records_is_empty(person in arb_person()) {
            prop_assert!(make_update_statements(&person, &person).is_empty());
        }

        #[test]
        fn prop_identifier_never_appears(old in arb_person(), new in arb_person()) {
            let updates = make_update_statements(&old, &new);
            prop_assert!(!updates.contains_key(OID));
        }

        #[test]
        fn prop_single_change_gives_single_entry(
            person in arb_person(),
            last_name in "[A-Za-z]{1,12}",
        ) {
            prop_assume!(person.last_name != last_name);
            let changed = Person { last_name: last_name.clone(), ..person.clone() };

            let updates = make_update_statements(&person, &changed);
            prop_assert_eq!(updates.len(), 1);
            prop_assert_eq!(updates.get_str("last_name").unwrap(), last_name.as_str());
        }
    }
}
