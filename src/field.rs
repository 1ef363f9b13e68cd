//! Field-description tree shared by the emitter and the reflector.
//!
//! A [`Field`] is the single recursive entity: leaves describe scalar values,
//! `object` fields carry one child per member, `array` fields carry exactly one
//! child describing the element. The JSON form uses the camelCase keys the
//! designer UI stores (`enumValues`, `calculatedField`, ...).
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Object,
    Array,
    Calculated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validations {
    /// `None` is "required" when emitting and "unknown" when reflecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Pattern source, without delimiters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Refinement expression, embedded as code. Never reflected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedField {
    /// Sibling field names, in parameter order.
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Validations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Field>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_field: Option<CalculatedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type `{0}`")]
pub struct UnknownFieldType(pub String);

// ————————————————————————————————————————————————————————————————————————————
// FIELD TYPE
// ————————————————————————————————————————————————————————————————————————————

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Enum,
        FieldType::Object,
        FieldType::Array,
        FieldType::Calculated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Enum => "enum",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Calculated => "calculated",
        }
    }

    /// Kinds whose generated constructor coerces string input (HTML forms).
    pub fn is_coerced(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }

    pub fn is_composite(self) -> bool {
        matches!(self, FieldType::Object | FieldType::Array)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATIONS
// ————————————————————————————————————————————————————————————————————————————

impl Validations {
    pub fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.min.is_none()
            && self.max.is_none()
            && self.regex.is_none()
            && self.custom.is_none()
    }

    /// Only an explicit `required: false` marks a field optional.
    pub fn is_optional(&self) -> bool {
        self.required == Some(false)
    }
}

/// Compact tag line shown next to a field in the designer tree,
/// e.g. `required, min: 3, max: 20`.
pub fn validation_summary(validations: Option<&Validations>) -> String {
    let Some(v) = validations else { return String::new() };
    let mut parts = Vec::<String>::new();
    if v.required == Some(true) {
        parts.push("required".to_string());
    }
    if let Some(min) = v.min {
        parts.push(format!("min: {}", crate::emit::js_number(min)));
    }
    if let Some(max) = v.max {
        parts.push(format!("max: {}", crate::emit::js_number(max)));
    }
    if v.regex.as_deref().is_some_and(|s| !s.is_empty()) {
        parts.push("regex".to_string());
    }
    if v.custom.as_deref().is_some_and(|s| !s.is_empty()) {
        parts.push("custom".to_string());
    }
    parts.join(", ")
}

// ————————————————————————————————————————————————————————————————————————————
// FIELD
// ————————————————————————————————————————————————————————————————————————————

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            label: None,
            description: None,
            validations: None,
            enum_values: None,
            children: None,
            calculated_field: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::new(name, FieldType::Enum);
        field.enum_values = Some(values.into_iter().map(Into::into).collect());
        field
    }

    pub fn object(name: impl Into<String>, children: Vec<Field>) -> Self {
        let mut field = Self::new(name, FieldType::Object);
        field.children = Some(children);
        field
    }

    pub fn array(name: impl Into<String>, item: Field) -> Self {
        let mut field = Self::new(name, FieldType::Array);
        field.children = Some(vec![item]);
        field
    }

    pub fn calculated<I, S>(name: impl Into<String>, dependencies: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::new(name, FieldType::Calculated);
        field.calculated_field = Some(CalculatedField {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            formula: formula.into(),
        });
        field
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_validations(mut self, validations: Validations) -> Self {
        self.validations = Some(validations);
        self
    }

    pub fn required(mut self) -> Self {
        self.validations_mut().required = Some(true);
        self
    }

    pub fn optional(mut self) -> Self {
        self.validations_mut().required = Some(false);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.validations_mut().min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.validations_mut().max = Some(max);
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.validations_mut().regex = Some(pattern.into());
        self
    }

    pub fn custom(mut self, refinement: impl Into<String>) -> Self {
        self.validations_mut().custom = Some(refinement.into());
        self
    }

    pub fn validations_mut(&mut self) -> &mut Validations {
        self.validations.get_or_insert_with(Validations::default)
    }

    pub fn children(&self) -> &[Field] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn child(&self, name: &str) -> Option<&Field> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Element schema of an array field (first child only).
    pub fn element(&self) -> Option<&Field> {
        match self.ty {
            FieldType::Array => self.children().first(),
            _ => None,
        }
    }

    /// Number of fields in this tree, root included.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Field::count).sum::<usize>()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_designer_json() {
        let value = json!({
            "name": "profile",
            "type": "object",
            "children": [
                { "name": "bio", "type": "string", "validations": { "max": 500 }, "description": "Biography" },
                { "name": "role", "type": "enum", "enumValues": ["user", "admin"] },
                { "name": "total", "type": "calculated",
                  "calculatedField": { "dependencies": ["a", "b"], "formula": "a + b" } }
            ]
        });
        let field: Field = serde_json::from_value(value).unwrap();
        assert_eq!(field.ty, FieldType::Object);
        assert_eq!(field.children().len(), 3);
        let bio = field.child("bio").unwrap();
        assert_eq!(bio.validations.as_ref().unwrap().max, Some(500.0));
        assert_eq!(bio.validations.as_ref().unwrap().required, None);
        let role = field.child("role").unwrap();
        assert_eq!(role.enum_values.as_deref(), Some(&["user".to_string(), "admin".to_string()][..]));
        let total = field.child("total").unwrap();
        assert_eq!(total.calculated_field.as_ref().unwrap().dependencies, vec!["a", "b"]);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent() {
        let field = Field::enumeration("role", ["user"]).required();
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value, json!({
            "name": "role",
            "type": "enum",
            "validations": { "required": true },
            "enumValues": ["user"]
        }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = serde_json::from_value::<Field>(json!({ "name": "x", "type": "uuid" }));
        assert!(err.is_err());
        assert_eq!("uuid".parse::<FieldType>(), Err(UnknownFieldType("uuid".into())));
        assert_eq!("date".parse::<FieldType>(), Ok(FieldType::Date));
    }

    #[test]
    fn only_explicit_false_is_optional() {
        assert!(!Validations::default().is_optional());
        assert!(!Field::string("a").required().validations.unwrap().is_optional());
        assert!(Field::string("a").optional().validations.unwrap().is_optional());
    }

    #[test]
    fn summary_lists_tags_in_display_order() {
        let v = Field::string("username").custom("(s) => true").max(20.0).min(3.0).required();
        assert_eq!(validation_summary(v.validations.as_ref()), "required, min: 3, max: 20, custom");
        let v = Field::string("url").regex("^https?://.*$").optional();
        assert_eq!(validation_summary(v.validations.as_ref()), "regex");
        assert_eq!(validation_summary(None), "");
    }

    #[test]
    fn array_element_is_first_child() {
        let mut tags = Field::array("tags", Field::string("tag"));
        tags.children.as_mut().unwrap().push(Field::number("ignored"));
        assert_eq!(tags.element().map(|f| f.name.as_str()), Some("tag"));
        assert_eq!(tags.count(), 3);
        assert!(Field::string("tag").element().is_none());
    }
}
