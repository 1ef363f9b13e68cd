//! Field tree → Zod source text.
//!
//! Every field expands to a constructor call (`z.string()`, `z.coerce.number()`,
//! `z.object({...})`, ...) followed by validation suffixes in a fixed order:
//! `.optional()`, `.min()`, `.max()`, `.regex()`, `.refine()`, then
//! `.describe()` for label/description. Output is a pure function of the tree.
use std::collections::HashSet;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::{Anomaly, FieldPath, TextSlot};
use crate::field::{CalculatedField, Field, FieldType, Validations};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Escape quotes, backslashes and regex delimiters in embedded text.
    /// When off, text is embedded verbatim and unsafe text is only reported.
    pub escape_text: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { escape_text: true }
    }
}

impl EmitOptions {
    pub fn verbatim() -> Self {
        Self { escape_text: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub source: String,
    pub anomalies: Vec<Anomaly>,
}

pub struct ZodCodegen {
    options: EmitOptions,
    anomalies: Vec<Anomaly>,
    out: String,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Emit a full module (`import`, `const <name>Schema = ...`, default export).
pub fn emit_module(field: &Field, options: &EmitOptions) -> Emitted {
    let mut cg = ZodCodegen::new(*options);
    cg.emit(field);
    cg.into_output()
}

/// Emit only the schema expression for `field`.
pub fn emit_expression(field: &Field, options: &EmitOptions) -> Emitted {
    let mut cg = ZodCodegen::new(*options);
    cg.check_siblings(std::slice::from_ref(field), &FieldPath::default());
    cg.out = cg.field(field, &FieldPath::root(&field.name));
    cg.into_output()
}

/// Module text with default options, diagnostics discarded.
pub fn generate_zod_schema(field: &Field) -> String {
    emit_module(field, &EmitOptions::default()).source
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Format a number the way JavaScript's `String(n)` does.
///
/// Magnitudes at or above `1e21` or below `1e-6` switch to exponent form
/// (`1e+21`, `1.5e-7`), everything else prints positionally.
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let formatted = format!("{value:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        }
    } else {
        value.to_string()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CODEGEN
// ————————————————————————————————————————————————————————————————————————————

impl ZodCodegen {
    pub fn new(options: EmitOptions) -> Self {
        Self { options, anomalies: Vec::new(), out: String::new() }
    }

    pub fn emit(&mut self, root: &Field) {
        tracing::debug!(root = %root.name, fields = root.count(), "emitting zod module");
        let path = FieldPath::root(&root.name);
        // The root has no siblings; this still validates its own dependencies.
        self.check_siblings(std::slice::from_ref(root), &FieldPath::default());
        let binding = format!("{}Schema", self.binding_name(&root.name, &path));
        let expr = self.field(root, &path);
        self.out = format!(
            "import {{ z }} from 'zod';\n\nconst {binding} = {expr};\n\nexport default {binding};"
        );
    }

    pub fn into_output(self) -> Emitted {
        Emitted { source: self.out, anomalies: self.anomalies }
    }

    fn field(&mut self, f: &Field, path: &FieldPath) -> String {
        self.check_attributes(f, path);
        let mut schema = self.constructor(f, path);
        if let Some(v) = &f.validations {
            self.validations(&mut schema, v, path);
        }
        self.describe(&mut schema, f, path);
        schema
    }

    fn constructor(&mut self, f: &Field, path: &FieldPath) -> String {
        match f.ty {
            FieldType::Enum => match f.enum_values.as_deref() {
                Some(values) => {
                    if values.is_empty() {
                        self.anomalies.push(Anomaly::MissingEnumValues { path: path.clone() });
                    }
                    let values = values
                        .iter()
                        .map(|v| self.quoted(v, '\'', path, TextSlot::EnumValue))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("z.enum([{values}])")
                }
                None => {
                    self.anomalies.push(Anomaly::MissingEnumValues { path: path.clone() });
                    "z.enum()".to_string()
                }
            },
            FieldType::Object => match f.children.as_deref() {
                Some([]) => "z.object({})".to_string(),
                Some(children) => {
                    self.check_siblings(children, path);
                    let members = children
                        .iter()
                        .map(|child| {
                            let child_path = path.child(&child.name);
                            let key = self.member_key(&child.name, &child_path);
                            format!("{key}: {}", self.field(child, &child_path))
                        })
                        .collect::<Vec<_>>()
                        .join(",\n    ");
                    format!("z.object({{\n    {members}\n  }})")
                }
                None => "z.object()".to_string(),
            },
            FieldType::Array => match f.children.as_deref() {
                Some([item, rest @ ..]) => {
                    if !rest.is_empty() {
                        self.anomalies.push(Anomaly::ExtraArrayChildren {
                            path: path.clone(),
                            extra: rest.len(),
                        });
                    }
                    format!("z.array({})", self.field(item, &path.child(&item.name)))
                }
                _ => {
                    self.anomalies.push(Anomaly::EmptyArray { path: path.clone() });
                    "z.array()".to_string()
                }
            },
            FieldType::Calculated => match &f.calculated_field {
                Some(calc) => self.function(calc, path),
                None => {
                    self.anomalies.push(Anomaly::MissingFormula { path: path.clone() });
                    "z.function()".to_string()
                }
            },
            ty if ty.is_coerced() => format!("z.coerce.{ty}()"),
            ty => format!("z.{ty}()"),
        }
    }

    fn function(&mut self, calc: &CalculatedField, path: &FieldPath) -> String {
        for dep in &calc.dependencies {
            if !is_identifier(dep) {
                self.anomalies.push(Anomaly::InvalidIdentifier {
                    path: path.clone(),
                    slot: TextSlot::Dependency,
                    text: dep.clone(),
                });
            }
        }
        self.check_code(&calc.formula, path, TextSlot::Formula);
        format!(
            "z.function().implement(({}) => {})",
            calc.dependencies.join(", "),
            calc.formula
        )
    }

    fn validations(&mut self, schema: &mut String, v: &Validations, path: &FieldPath) {
        if v.is_optional() {
            schema.push_str(".optional()");
        }
        if let Some(min) = v.min {
            let _ = write!(schema, ".min({})", js_number(min));
        }
        if let Some(max) = v.max {
            let _ = write!(schema, ".max({})", js_number(max));
        }
        if let Some(pattern) = v.regex.as_deref().filter(|s| !s.is_empty()) {
            let literal = self.regex_literal(pattern, path);
            let _ = write!(schema, ".regex({literal})");
        }
        if let Some(custom) = v.custom.as_deref().filter(|s| !s.is_empty()) {
            self.check_code(custom, path, TextSlot::Custom);
            let _ = write!(schema, ".refine({custom})");
        }
    }

    fn describe(&mut self, schema: &mut String, f: &Field, path: &FieldPath) {
        let mut args = Vec::new();
        if let Some(label) = f.label.as_deref().filter(|s| !s.is_empty()) {
            args.push(self.quoted(label, '"', path, TextSlot::Label));
        }
        if let Some(description) = f.description.as_deref().filter(|s| !s.is_empty()) {
            args.push(self.quoted(description, '"', path, TextSlot::Description));
        }
        if !args.is_empty() {
            let _ = write!(schema, ".describe({})", args.join(", "));
        }
    }

    // ———————————————————————————————— checks ————————————————————————————————

    fn check_attributes(&mut self, f: &Field, path: &FieldPath) {
        let mut ignored = |attribute: &'static str| {
            self.anomalies.push(Anomaly::IgnoredAttribute { path: path.clone(), attribute, ty: f.ty });
        };
        if f.enum_values.is_some() && f.ty != FieldType::Enum {
            ignored("enumValues");
        }
        if f.children.is_some() && !f.ty.is_composite() {
            ignored("children");
        }
        if f.calculated_field.is_some() && f.ty != FieldType::Calculated {
            ignored("calculatedField");
        }
    }

    /// Names unique among siblings; calculated dependencies must name a sibling.
    fn check_siblings(&mut self, siblings: &[Field], parent: &FieldPath) {
        let mut seen = HashSet::new();
        for child in siblings {
            if !seen.insert(child.name.as_str()) {
                self.anomalies.push(Anomaly::DuplicateName {
                    path: parent.clone(),
                    name: child.name.clone(),
                });
            }
        }
        for child in siblings.iter().filter(|c| c.ty == FieldType::Calculated) {
            let Some(calc) = &child.calculated_field else { continue };
            for dep in &calc.dependencies {
                if *dep == child.name || !seen.contains(dep.as_str()) {
                    self.anomalies.push(Anomaly::UnknownDependency {
                        path: parent.child(&child.name),
                        name: dep.clone(),
                    });
                }
            }
        }
    }

    fn check_code(&mut self, code: &str, path: &FieldPath, slot: TextSlot) {
        if !is_balanced(code) {
            self.anomalies.push(Anomaly::UnbalancedCode { path: path.clone(), slot });
        }
    }

    // ——————————————————————————————— embedding ——————————————————————————————

    fn binding_name(&mut self, name: &str, path: &FieldPath) -> String {
        if is_identifier(name) {
            return name.to_string();
        }
        self.anomalies.push(Anomaly::InvalidIdentifier {
            path: path.clone(),
            slot: TextSlot::Name,
            text: name.to_string(),
        });
        if self.options.escape_text { sanitize_identifier(name) } else { name.to_string() }
    }

    fn member_key(&mut self, name: &str, path: &FieldPath) -> String {
        if is_identifier(name) {
            return name.to_string();
        }
        if self.options.escape_text {
            self.anomalies.push(Anomaly::EscapedText { path: path.clone(), slot: TextSlot::Name });
            format!("'{}'", escape_js_string(name, '\''))
        } else {
            self.anomalies.push(Anomaly::InvalidIdentifier {
                path: path.clone(),
                slot: TextSlot::Name,
                text: name.to_string(),
            });
            name.to_string()
        }
    }

    fn quoted(&mut self, text: &str, quote: char, path: &FieldPath, slot: TextSlot) -> String {
        let breaks_literal = text.chars().any(|c| c == quote || c == '\\' || c == '\n' || c == '\r');
        if self.options.escape_text {
            if breaks_literal {
                self.anomalies.push(Anomaly::EscapedText { path: path.clone(), slot });
                return format!("{quote}{}{quote}", escape_js_string(text, quote));
            }
        } else if breaks_literal {
            self.anomalies.push(Anomaly::UnsafeText { path: path.clone(), slot });
        }
        format!("{quote}{text}{quote}")
    }

    fn regex_literal(&mut self, pattern: &str, path: &FieldPath) -> String {
        let mut body = String::with_capacity(pattern.len());
        let mut unsafe_chars = false;
        let mut escaped = false;
        let mut in_class = false;
        for c in pattern.chars() {
            if escaped {
                escaped = false;
                body.push(c);
                continue;
            }
            match c {
                '\\' => escaped = true,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    unsafe_chars = true;
                    if self.options.escape_text {
                        body.push('\\');
                    }
                }
                '\n' | '\r' => {
                    unsafe_chars = true;
                    if self.options.escape_text {
                        body.push_str(if c == '\n' { "\\n" } else { "\\r" });
                        continue;
                    }
                }
                _ => {}
            }
            body.push(c);
        }
        // a trailing lone backslash would escape the closing delimiter
        if escaped {
            unsafe_chars = true;
            if self.options.escape_text {
                body.push('\\');
            }
        }
        if unsafe_chars {
            let anomaly = if self.options.escape_text {
                Anomaly::EscapedText { path: path.clone(), slot: TextSlot::Regex }
            } else {
                Anomaly::UnsafeText { path: path.clone(), slot: TextSlot::Regex }
            };
            self.anomalies.push(anomaly);
        }
        format!("/{body}/")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn escape_js_string(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Bracket balance of a code fragment, ignoring string and template literals.
pub(crate) fn is_balanced(code: &str) -> bool {
    let mut stack = Vec::new();
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                let mut closed = false;
                while let Some(d) = chars.next() {
                    if d == '\\' {
                        chars.next();
                    } else if d == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return false;
                }
            }
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

// ------------------------------- Tests ------------------------------------ //
