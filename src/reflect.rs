//! Validator object → field tree.
//!
//! Best effort and lossy: labels, descriptions, custom refinements and
//! calculated fields have no counterpart that survives in a built validator,
//! so they are never reconstructed. Unknown kinds degrade to `string`.
use crate::diagnostics::{Anomaly, FieldPath};
use crate::field::{Field, FieldType, Validations};
use crate::validator::{ZodKind, ZodType};

/// Name given to the reflected root.
pub const ROOT_NAME: &str = "root";
/// Name given to the synthetic element child of an array.
pub const ITEM_NAME: &str = "item";

#[derive(Debug, Clone, PartialEq)]
pub struct Reflected {
    pub field: Field,
    pub anomalies: Vec<Anomaly>,
}

pub fn reflect(validator: &ZodType) -> Reflected {
    reflect_named(validator, ROOT_NAME)
}

pub fn reflect_named(validator: &ZodType, name: &str) -> Reflected {
    let mut anomalies = Vec::new();
    let field = reflect_node(validator, name, &FieldPath::root(name), &mut anomalies);
    tracing::debug!(root = name, fields = field.count(), anomalies = anomalies.len(), "reflected validator");
    Reflected { field, anomalies }
}

/// Field tree only, diagnostics discarded.
pub fn zod_to_field(validator: &ZodType) -> Field {
    reflect(validator).field
}

fn reflect_node(v: &ZodType, name: &str, path: &FieldPath, anomalies: &mut Vec<Anomaly>) -> Field {
    let mut field = Field::new(name, FieldType::String);

    match &v.kind {
        ZodKind::Object(shape) => {
            field.ty = FieldType::Object;
            field.children = Some(
                shape
                    .iter()
                    .map(|(key, member)| reflect_node(member, key, &path.child(key), anomalies))
                    .collect(),
            );
        }
        ZodKind::Array(element) => {
            field.ty = FieldType::Array;
            field.children = Some(vec![reflect_node(element, ITEM_NAME, &path.child(ITEM_NAME), anomalies)]);
        }
        ZodKind::Enum(values) => {
            field.ty = FieldType::Enum;
            field.enum_values = Some(values.clone());
        }
        ZodKind::Number => field.ty = FieldType::Number,
        ZodKind::Boolean => field.ty = FieldType::Boolean,
        ZodKind::Date => field.ty = FieldType::Date,
        ZodKind::String => {}
        ZodKind::BigInt
        | ZodKind::Null
        | ZodKind::Any
        | ZodKind::Unknown
        | ZodKind::Function { .. } => {
            anomalies.push(Anomaly::UnhandledKind { path: path.clone(), kind: v.type_name() });
        }
    }

    field.validations = Some(reflect_validations(v));
    field
}

fn reflect_validations(v: &ZodType) -> Validations {
    let mut validations = Validations::default();
    if v.is_optional() {
        validations.required = Some(false);
    }
    if let Some(min) = v.def.minimum {
        validations.min = Some(min);
    }
    if let Some(max) = v.def.maximum {
        validations.max = Some(max);
    }
    if let Some(regex) = &v.def.regex {
        validations.regex = Some(regex.source.clone());
    }
    validations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_bounded_member() {
        let v = ZodType::object([("age", ZodType::number().optional().min(13.0))]);
        let reflected = reflect(&v);
        let root = &reflected.field;
        assert_eq!(root.name, "root");
        assert_eq!(root.ty, FieldType::Object);
        assert_eq!(root.children().len(), 1);
        let age = &root.children()[0];
        assert_eq!(age.name, "age");
        assert_eq!(age.ty, FieldType::Number);
        assert_eq!(
            age.validations,
            Some(Validations { required: Some(false), min: Some(13.0), ..Validations::default() })
        );
        assert!(reflected.anomalies.is_empty());
    }

    #[test]
    fn every_node_gets_a_validations_record() {
        let field = zod_to_field(&ZodType::boolean());
        assert_eq!(field.validations, Some(Validations::default()));
    }

    #[test]
    fn arrays_get_a_synthetic_item_child() {
        let v = ZodType::array(ZodType::enumeration(["twitter", "facebook"]));
        let field = zod_to_field(&v);
        assert_eq!(field.ty, FieldType::Array);
        let item = field.element().unwrap();
        assert_eq!(item.name, "item");
        assert_eq!(item.ty, FieldType::Enum);
        assert_eq!(item.enum_values.as_ref().unwrap(), &["twitter", "facebook"]);
    }

    #[test]
    fn members_keep_native_order() {
        let v = ZodType::object([
            ("zipCode", ZodType::string()),
            ("city", ZodType::string()),
            ("createdAt", ZodType::date()),
        ]);
        let names: Vec<_> = zod_to_field(&v).children().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["zipCode", "city", "createdAt"]);
    }

    #[test]
    fn regex_source_is_copied() {
        let v = ZodType::string().regex_with_flags("^https?://.*$", "i");
        let field = zod_to_field(&v);
        assert_eq!(field.validations.unwrap().regex.as_deref(), Some("^https?://.*$"));
    }

    #[test]
    fn unhandled_kinds_fall_back_to_string() {
        let v = ZodType::object([
            ("total", ZodType::function().implement(["items"], "items.length")),
            ("meta", ZodType::any()),
        ]);
        let reflected = reflect_named(&v, "Orders");
        assert!(reflected.field.children().iter().all(|c| c.ty == FieldType::String));
        assert!(reflected.field.children().iter().all(|c| c.calculated_field.is_none()));
        assert_eq!(
            reflected.anomalies,
            vec![
                Anomaly::UnhandledKind { path: FieldPath::root("Orders").child("total"), kind: "ZodFunction" },
                Anomaly::UnhandledKind { path: FieldPath::root("Orders").child("meta"), kind: "ZodAny" },
            ]
        );
    }

    #[test]
    fn descriptions_and_refinements_are_not_reconstructed() {
        let v = ZodType::string().refine("(s) => s.length > 0").describe("Name");
        let field = zod_to_field(&v);
        assert_eq!(field.label, None);
        assert_eq!(field.description, None);
        assert_eq!(field.validations.unwrap().custom, None);
    }
}
