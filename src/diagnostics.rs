//! Non-fatal anomalies collected while emitting or reflecting.
//!
//! Neither transformation fails on malformed input; they degrade to a best
//! effort result and report what they had to paper over here.
use std::fmt;

use crate::field::FieldType;

/// Dotted location of a field inside a tree, e.g. `Users.profile.bio`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

/// Which embedded text an escaping or safety anomaly refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSlot {
    Name,
    EnumValue,
    Label,
    Description,
    Regex,
    Custom,
    Formula,
    Dependency,
}

impl fmt::Display for TextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextSlot::Name => "name",
            TextSlot::EnumValue => "enum value",
            TextSlot::Label => "label",
            TextSlot::Description => "description",
            TextSlot::Regex => "regex",
            TextSlot::Custom => "custom refinement",
            TextSlot::Formula => "formula",
            TextSlot::Dependency => "dependency",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Anomaly {
    #[error("{path}: array has no element schema, emitted as a bare z.array()")]
    EmptyArray { path: FieldPath },
    #[error("{path}: array declares {extra} extra element schema(s), only the first is used")]
    ExtraArrayChildren { path: FieldPath, extra: usize },
    #[error("{path}: enum has no values")]
    MissingEnumValues { path: FieldPath },
    #[error("{path}: calculated field has no formula")]
    MissingFormula { path: FieldPath },
    #[error("{path}: `{attribute}` is ignored on {ty} fields")]
    IgnoredAttribute { path: FieldPath, attribute: &'static str, ty: FieldType },
    #[error("{path}: duplicate sibling name `{name}`")]
    DuplicateName { path: FieldPath, name: String },
    #[error("{path}: dependency `{name}` is not a sibling field")]
    UnknownDependency { path: FieldPath, name: String },
    #[error("{path}: {slot} `{text}` is not a valid identifier")]
    InvalidIdentifier { path: FieldPath, slot: TextSlot, text: String },
    #[error("{path}: {slot} was escaped before embedding")]
    EscapedText { path: FieldPath, slot: TextSlot },
    #[error("{path}: {slot} contains characters that corrupt the emitted source")]
    UnsafeText { path: FieldPath, slot: TextSlot },
    #[error("{path}: {slot} has unbalanced brackets")]
    UnbalancedCode { path: FieldPath, slot: TextSlot },
    #[error("{path}: unhandled validator kind {kind}, reflected as string")]
    UnhandledKind { path: FieldPath, kind: &'static str },
}

impl Anomaly {
    pub fn path(&self) -> &FieldPath {
        match self {
            Anomaly::EmptyArray { path }
            | Anomaly::ExtraArrayChildren { path, .. }
            | Anomaly::MissingEnumValues { path }
            | Anomaly::MissingFormula { path }
            | Anomaly::IgnoredAttribute { path, .. }
            | Anomaly::DuplicateName { path, .. }
            | Anomaly::UnknownDependency { path, .. }
            | Anomaly::InvalidIdentifier { path, .. }
            | Anomaly::EscapedText { path, .. }
            | Anomaly::UnsafeText { path, .. }
            | Anomaly::UnbalancedCode { path, .. }
            | Anomaly::UnhandledKind { path, .. } => path,
        }
    }
}
