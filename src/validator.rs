//! In-memory validator objects, shaped like the Zod class hierarchy.
//!
//! A [`ZodType`] is what a schema module evaluates to: a kind (the runtime
//! class) plus a flat descriptor holding the modifiers chained onto it. The
//! builders mirror the library's fluent API so validators read the same in
//! Rust as they do in the generated source.
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ZodType {
    pub kind: ZodKind,
    pub def: ZodDef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZodKind {
    String,
    Number,
    Boolean,
    Date,
    BigInt,
    Null,
    Any,
    Unknown,
    Enum(Vec<String>),
    /// Member map in declaration order.
    Object(IndexMap<String, ZodType>),
    Array(Box<ZodType>),
    Function { params: Vec<String>, body: Option<String> },
}

/// Descriptor of chained modifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZodDef {
    pub coerce: bool,
    pub is_optional: Option<bool>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub regex: Option<RegexDef>,
    pub refinements: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexDef {
    pub source: String,
    pub flags: String,
}

impl ZodType {
    pub fn new(kind: ZodKind) -> Self {
        Self { kind, def: ZodDef::default() }
    }

    pub fn string() -> Self {
        Self::new(ZodKind::String)
    }

    pub fn number() -> Self {
        Self::new(ZodKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(ZodKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(ZodKind::Date)
    }

    pub fn any() -> Self {
        Self::new(ZodKind::Any)
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ZodKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    pub fn object<I, K>(shape: I) -> Self
    where
        I: IntoIterator<Item = (K, ZodType)>,
        K: Into<String>,
    {
        Self::new(ZodKind::Object(shape.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn array(element: ZodType) -> Self {
        Self::new(ZodKind::Array(Box::new(element)))
    }

    pub fn function() -> Self {
        Self::new(ZodKind::Function { params: Vec::new(), body: None })
    }

    pub fn coerce(mut self) -> Self {
        self.def.coerce = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.def.is_optional = Some(true);
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        self.def.minimum = Some(value);
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        self.def.maximum = Some(value);
        self
    }

    pub fn regex(self, source: impl Into<String>) -> Self {
        self.regex_with_flags(source, "")
    }

    pub fn regex_with_flags(mut self, source: impl Into<String>, flags: impl Into<String>) -> Self {
        self.def.regex = Some(RegexDef { source: source.into(), flags: flags.into() });
        self
    }

    pub fn refine(mut self, code: impl Into<String>) -> Self {
        self.def.refinements.push(code.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.def.description = Some(description.into());
        self
    }

    /// Attach an implementation; no-op on anything but a function.
    pub fn implement<I, S>(mut self, params: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ZodKind::Function { params: p, body: b } = &mut self.kind {
            *p = params.into_iter().map(Into::into).collect();
            *b = Some(body.into());
        }
        self
    }

    pub fn is_optional(&self) -> bool {
        self.def.is_optional == Some(true)
    }

    /// Library class name of this validator's kind.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ZodKind::String => "ZodString",
            ZodKind::Number => "ZodNumber",
            ZodKind::Boolean => "ZodBoolean",
            ZodKind::Date => "ZodDate",
            ZodKind::BigInt => "ZodBigInt",
            ZodKind::Null => "ZodNull",
            ZodKind::Any => "ZodAny",
            ZodKind::Unknown => "ZodUnknown",
            ZodKind::Enum(_) => "ZodEnum",
            ZodKind::Object(_) => "ZodObject",
            ZodKind::Array(_) => "ZodArray",
            ZodKind::Function { .. } => "ZodFunction",
        }
    }

    pub fn shape(&self) -> Option<&IndexMap<String, ZodType>> {
        match &self.kind {
            ZodKind::Object(shape) => Some(shape),
            _ => None,
        }
    }
}
