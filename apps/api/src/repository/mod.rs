//! Typed, per-entity access to the document store.
//!
//! Each repository owns the path conventions for one entity type and the
//! JSON encoding of its model. Owner-scoped entities take the owner id on
//! every call, so a lookup can never leave the owner's partition.

pub mod profiles;
pub mod resumes;
pub mod settings;
pub mod shared;
pub mod templates;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::store::{FieldUpdate, StoreError, StoreResult};

pub use profiles::ProfileRepository;
pub use resumes::ResumeRepository;
pub use settings::SettingsRepository;
pub use shared::SharedResumeRepository;
pub use templates::TemplateRepository;

fn encode<T: Serialize>(model: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(model)?)
}

fn decode<T: DeserializeOwned>(doc: Value) -> StoreResult<T> {
    Ok(serde_json::from_value(doc)?)
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> StoreResult<Vec<T>> {
    docs.into_iter().map(decode).collect()
}

/// Turns the named top-level fields of an encoded model into `Set` updates.
fn set_fields<T: Serialize>(model: &T, fields: &[&str]) -> StoreResult<Vec<FieldUpdate>> {
    let Value::Object(mut map) = encode(model)? else {
        return Err(StoreError::InvalidDocument(
            "model did not encode to an object".to_string(),
        ));
    };
    Ok(fields
        .iter()
        .map(|field| FieldUpdate::set(field, map.remove(*field).unwrap_or(Value::Null)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        a: u32,
        b: &'static str,
        c: bool,
    }

    #[test]
    fn test_set_fields_picks_named_fields() {
        let updates = set_fields(&Sample { a: 1, b: "x", c: true }, &["a", "c"]).unwrap();
        assert_eq!(
            updates,
            vec![FieldUpdate::set("a", 1), FieldUpdate::set("c", true)]
        );
    }
}
