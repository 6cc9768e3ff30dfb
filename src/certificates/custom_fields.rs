use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A custom field the account has declared (`GET <service>/customFields`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomFieldDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub mandatory: bool,
}

/// A name/value pair attached to an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl TryFrom<Value> for CustomField {
    type Error = Error;

    /// Accepts only `{"name": <string>, "value": <string>}` objects.
    fn try_from(value: Value) -> Result<Self> {
        let mut entry = match value {
            Value::Object(entry) => entry,
            other => {
                return Err(Error::CustomFieldType(format!(
                    "custom fields must be objects, not {}",
                    json_kind(&other)
                )));
            }
        };
        match (entry.remove("name"), entry.remove("value")) {
            (Some(Value::String(name)), Some(Value::String(value))) => Ok(Self { name, value }),
            (Some(_), Some(_)) => Err(Error::CustomFieldType(
                "custom field 'name' and 'value' must be strings".to_string(),
            )),
            _ => Err(Error::CustomFieldType(
                "custom field objects must contain both a 'name' key and a 'value' key"
                    .to_string(),
            )),
        }
    }
}

/// Converts loosely typed JSON entries, failing on the first malformed one.
pub fn custom_fields_from_json(values: Vec<Value>) -> Result<Vec<CustomField>> {
    values.into_iter().map(CustomField::try_from).collect()
}

/// Checks supplied fields against the account schema before anything is sent.
///
/// Every name must be declared, and every mandatory name must appear exactly
/// once: a missing field and a repeated field are reported separately.
pub fn validate_custom_fields(
    schema: &[CustomFieldDefinition],
    fields: &[CustomField],
) -> Result<()> {
    for field in fields {
        if !schema.iter().any(|def| def.name == field.name) {
            let defined: Vec<&str> = schema.iter().map(|def| def.name.as_str()).collect();
            return Err(Error::validation(format!(
                "custom field {} not defined for your account; defined custom fields are {:?}",
                field.name, defined
            )));
        }
    }

    for mandatory in schema.iter().filter(|def| def.mandatory) {
        match fields.iter().filter(|f| f.name == mandatory.name).count() {
            0 => {
                return Err(Error::validation(format!(
                    "missing mandatory custom field {}",
                    mandatory.name
                )));
            }
            1 => {}
            _ => {
                return Err(Error::validation(format!(
                    "too many custom field objects with name {}",
                    mandatory.name
                )));
            }
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<CustomFieldDefinition> {
        vec![
            CustomFieldDefinition {
                id: 1,
                name: "cost center".to_string(),
                mandatory: true,
            },
            CustomFieldDefinition {
                id: 2,
                name: "ticket".to_string(),
                mandatory: false,
            },
        ]
    }

    fn message(err: Error) -> String {
        match err {
            Error::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_mandatory_and_optional_fields() {
        let fields = vec![
            CustomField::new("cost center", "42"),
            CustomField::new("ticket", "OPS-1"),
        ];
        assert!(validate_custom_fields(&schema(), &fields).is_ok());
    }

    #[test]
    fn empty_schema_accepts_no_fields() {
        assert!(validate_custom_fields(&[], &[]).is_ok());
    }

    #[test]
    fn rejects_unknown_names() {
        let fields = vec![
            CustomField::new("cost center", "42"),
            CustomField::new("colour", "blue"),
        ];
        let msg = message(validate_custom_fields(&schema(), &fields).unwrap_err());
        assert!(msg.contains("colour"));
        assert!(msg.contains("not defined"));
    }

    #[test]
    fn missing_and_duplicated_mandatory_fields_are_distinct() {
        let missing = message(
            validate_custom_fields(&schema(), &[CustomField::new("ticket", "x")]).unwrap_err(),
        );
        let duplicated = message(
            validate_custom_fields(
                &schema(),
                &[
                    CustomField::new("cost center", "1"),
                    CustomField::new("cost center", "2"),
                ],
            )
            .unwrap_err(),
        );
        assert!(missing.starts_with("missing mandatory"));
        assert!(duplicated.starts_with("too many"));
        assert_ne!(missing, duplicated);
    }

    #[test]
    fn optional_fields_may_repeat() {
        let fields = vec![
            CustomField::new("cost center", "1"),
            CustomField::new("ticket", "a"),
            CustomField::new("ticket", "b"),
        ];
        assert!(validate_custom_fields(&schema(), &fields).is_ok());
    }

    #[test]
    fn non_object_entries_are_type_errors() {
        for value in [json!("cost center"), json!(["a", "b"]), json!(7), json!(null)] {
            let err = CustomField::try_from(value).unwrap_err();
            assert!(matches!(err, Error::CustomFieldType(_)));
        }
    }

    #[test]
    fn objects_need_name_and_value() {
        let err = CustomField::try_from(json!({"name": "ticket"})).unwrap_err();
        assert!(matches!(err, Error::CustomFieldType(ref msg) if msg.contains("'value'")));

        let err = CustomField::try_from(json!({"name": 1, "value": "x"})).unwrap_err();
        assert!(matches!(err, Error::CustomFieldType(_)));
    }

    #[test]
    fn from_json_converts_valid_entries() {
        let fields =
            custom_fields_from_json(vec![json!({"name": "ticket", "value": "OPS-9"})]).unwrap();
        assert_eq!(fields, vec![CustomField::new("ticket", "OPS-9")]);

        let err = custom_fields_from_json(vec![
            json!({"name": "ticket", "value": "OPS-9"}),
            json!("oops"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::CustomFieldType(_)));
    }
}
