//! emit → load → reflect over the built-in samples.

use zod_designer::{
    emit_module, generate_zod_schema, load, reflect::reflect_named, Anomaly, EmitOptions, Field,
    FieldType, SampleRegistry,
};

fn reflect_emitted(field: &Field) -> Field {
    let source = generate_zod_schema(field);
    let module = load(&source).unwrap_or_else(|e| panic!("{}: {e}\n{source}", field.name));
    let name = module.name.expect("emitted modules declare a binding");
    reflect_named(&module.validator, &name).field
}

/// Structure that survives a round trip: kinds, enum values, optionality, bounds, patterns.
fn assert_same_shape(designed: &Field, reflected: &Field, path: &str) {
    if designed.ty == FieldType::Calculated {
        assert_eq!(reflected.ty, FieldType::String, "{path}");
        assert!(reflected.calculated_field.is_none(), "{path}");
        return;
    }
    assert_eq!(reflected.ty, designed.ty, "{path}");
    assert_eq!(reflected.enum_values, designed.enum_values, "{path}");

    let before = designed.validations.clone().unwrap_or_default();
    let after = reflected.validations.clone().expect("reflected fields always carry validations");
    assert_eq!(after.is_optional(), before.is_optional(), "{path}");
    assert_eq!(after.min, before.min, "{path}");
    assert_eq!(after.max, before.max, "{path}");
    assert_eq!(
        after.regex.map(|r| r.replace("\\/", "/")),
        before.regex.map(|r| r.replace("\\/", "/")),
        "{path}"
    );
    assert_eq!(after.custom, None, "{path}");

    match designed.ty {
        FieldType::Object => {
            let names: Vec<_> = designed.children().iter().map(|c| &c.name).collect();
            let reflected_names: Vec<_> = reflected.children().iter().map(|c| &c.name).collect();
            assert_eq!(reflected_names, names, "{path}");
            for (a, b) in designed.children().iter().zip(reflected.children()) {
                assert_same_shape(a, b, &format!("{path}.{}", a.name));
            }
        }
        FieldType::Array => {
            let item = reflected.element().expect("array reflects with an element");
            assert_eq!(item.name, "item", "{path}");
            assert_same_shape(designed.element().expect("sample arrays have elements"), item, &format!("{path}[]"));
        }
        _ => {}
    }
}

fn assert_no_annotations(field: &Field) {
    assert_eq!(field.label, None, "{}", field.name);
    assert_eq!(field.description, None, "{}", field.name);
    field.children().iter().for_each(assert_no_annotations);
}

#[test]
fn samples_survive_round_trip_structurally() {
    let registry = SampleRegistry::builtin();
    for (key, field) in registry.iter() {
        let reflected = reflect_emitted(field);
        assert_eq!(reflected.name, field.name, "{key}");
        assert_same_shape(field, &reflected, key);
    }
}

#[test]
fn annotations_and_calculations_are_lost() {
    let registry = SampleRegistry::builtin();
    let orders = registry.get("orders").unwrap();
    let reflected = reflect_emitted(orders);
    assert_no_annotations(&reflected);
    for name in ["totalAmount", "grandTotal"] {
        let field = reflected.child(name).unwrap();
        assert_eq!(field.ty, FieldType::String);
        assert!(field.calculated_field.is_none());
    }
}

#[test]
fn reflection_reports_calculated_fields_as_unhandled() {
    let registry = SampleRegistry::builtin();
    let source = generate_zod_schema(registry.get("orders").unwrap());
    let module = load(&source).unwrap();
    let reflected = reflect_named(&module.validator, "Orders");
    let kinds: Vec<_> = reflected
        .anomalies
        .iter()
        .map(|a| match a {
            Anomaly::UnhandledKind { path, kind } => (path.to_string(), *kind),
            other => panic!("unexpected anomaly {other}"),
        })
        .collect();
    assert_eq!(
        kinds,
        [
            ("Orders.totalAmount".to_string(), "ZodFunction"),
            ("Orders.grandTotal".to_string(), "ZodFunction"),
        ]
    );
}

#[test]
fn second_round_trip_is_a_fixpoint() {
    let registry = SampleRegistry::builtin();
    for (key, field) in registry.iter() {
        let once = reflect_emitted(field);
        let twice = reflect_emitted(&once);
        assert_eq!(
            emit_module(&once, &EmitOptions::default()).source,
            emit_module(&twice, &EmitOptions::default()).source,
            "{key}"
        );
    }
}

#[test]
fn verbatim_output_of_url_patterns_does_not_load() {
    let url = Field::object("Link", vec![Field::string("url").regex("^https?://.*$")]);
    let verbatim = emit_module(&url, &EmitOptions::verbatim());
    assert!(verbatim.source.contains("/^https?://.*$/"));
    assert!(load(&verbatim.source).is_err());
    let escaped = emit_module(&url, &EmitOptions::default());
    assert!(load(&escaped.source).is_ok());
}
