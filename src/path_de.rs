use serde::de::DeserializeOwned;

use crate::field::Field;

/// A JSON document that failed to deserialize, with the path of the failure.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {source}")]
pub struct InputError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, InputError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| InputError {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

/// Parse a field tree from its JSON form.
pub fn field_from_json(src: &str) -> Result<Field, InputError> {
    from_str_with_path(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_path_of_bad_member() {
        let src = r#"{
            "name": "Users",
            "type": "object",
            "children": [
                { "name": "id", "type": "string" },
                { "name": "age", "type": "integer" }
            ]
        }"#;
        let err = field_from_json(src).unwrap_err();
        assert_eq!(err.path, "children[1].type");
        assert!(err.to_string().starts_with("at JSON path children[1].type → unknown variant `integer`"));
    }

    #[test]
    fn parses_valid_tree() {
        let field = field_from_json(r#"{ "name": "age", "type": "number", "validations": { "min": 13 } }"#).unwrap();
        assert_eq!(field.validations.unwrap().min, Some(13.0));
    }
}
