//! Schema module source → validator object.
//!
//! Understands the subset of TypeScript the emitter produces: an optional
//! `import { z } from 'zod'`, a single `const <name>Schema = z....;`
//! declaration and an optional default export. A bare `z.` expression is
//! accepted too. Opaque code (`refine`, `implement` bodies) is captured as
//! text up to its closing parenthesis.
use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{all_consuming, map, opt, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{many0, separated_list0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::validator::{RegexDef, ZodKind, ZodType};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    /// Declared binding with its `Schema` suffix removed, if declared.
    pub name: Option<String>,
    pub validator: ZodType,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct LoadError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
struct SyntaxError<'a> {
    input: &'a str,
    message: Cow<'static, str>,
}

type PResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

#[derive(Debug, Clone, PartialEq)]
enum Method {
    Optional,
    Min(f64),
    Max(f64),
    Regex(RegexDef),
    Refine(String),
    Describe(Vec<String>),
    Implement(Vec<String>, String),
}

impl<'a> SyntaxError<'a> {
    fn new(input: &'a str, message: impl Into<Cow<'static, str>>) -> Self {
        Self { input, message: message.into() }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::Eof => "unexpected trailing input".into(),
            ErrorKind::Char | ErrorKind::Tag => "unexpected token".into(),
            other => format!("unexpected input ({other:?})").into(),
        };
        Self { input, message }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Load a schema module (or a bare expression) into a validator object.
pub fn load(source: &str) -> Result<LoadedModule, LoadError> {
    match all_consuming(module)(source) {
        Ok((_, (binding, validator))) => {
            let name = binding.map(|b| match b.strip_suffix("Schema") {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => b,
            });
            tracing::debug!(name = ?name, kind = validator.type_name(), "loaded schema module");
            Ok(LoadedModule { name, validator })
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(locate(source, e)),
        Err(nom::Err::Incomplete(_)) => Err(LoadError {
            line: 1,
            column: 1,
            message: "incomplete input".to_string(),
        }),
    }
}

/// Load a single `z.` expression.
pub fn load_expression(source: &str) -> Result<ZodType, LoadError> {
    match all_consuming(delimited(multispace0, expression, multispace0))(source) {
        Ok((_, validator)) => Ok(validator),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(locate(source, e)),
        Err(nom::Err::Incomplete(_)) => Err(LoadError {
            line: 1,
            column: 1,
            message: "incomplete input".to_string(),
        }),
    }
}

fn locate(source: &str, error: SyntaxError<'_>) -> LoadError {
    let offset = source.len().saturating_sub(error.input.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    LoadError { line, column, message: error.message.into_owned() }
}

// ————————————————————————————————————————————————————————————————————————————
// MODULE
// ————————————————————————————————————————————————————————————————————————————

fn module(input: &str) -> PResult<'_, (Option<String>, ZodType)> {
    let (input, _) = multispace0(input)?;
    let (input, _) = opt(import_statement)(input)?;
    let (input, (binding, validator)) = alt((
        map(declaration, |(binding, v)| (Some(binding), v)),
        map(terminated(expression, statement_end), |v| (None, v)),
    ))(input)?;
    let (input, _) = opt(export_default)(input)?;
    Ok((input, (binding, validator)))
}

fn import_statement(input: &str) -> PResult<'_, ()> {
    value(
        (),
        tuple((tag("import"), sym('{'), tag("z"), sym('}'), tag("from"), multispace0, string_literal, statement_end)),
    )(input)
}

fn declaration(input: &str) -> PResult<'_, (String, ZodType)> {
    let (input, _) = opt(terminated(tag("export"), multispace1))(input)?;
    let (input, _) = terminated(alt((tag("const"), tag("let"), tag("var"))), multispace1)(input)?;
    let (input, binding) = identifier(input)?;
    let (input, _) = sym('=')(input)?;
    let (input, validator) = expression(input)?;
    let (input, _) = statement_end(input)?;
    Ok((input, (binding.to_string(), validator)))
}

fn export_default(input: &str) -> PResult<'_, &str> {
    let (input, _) = terminated(tag("export"), multispace1)(input)?;
    let (input, _) = terminated(tag("default"), multispace1)(input)?;
    let (input, binding) = identifier(input)?;
    let (input, _) = statement_end(input)?;
    Ok((input, binding))
}

fn statement_end(input: &str) -> PResult<'_, ()> {
    value((), pair(multispace0, opt(pair(char(';'), multispace0))))(input)
}

// ————————————————————————————————————————————————————————————————————————————
// EXPRESSIONS
// ————————————————————————————————————————————————————————————————————————————

fn expression(input: &str) -> PResult<'_, ZodType> {
    let (input, _) = pair(char('z'), sym('.'))(input)?;
    let (input, base) = constructor(input)?;
    let (input, methods) = many0(preceded(sym('.'), located_method))(input)?;

    let mut validator = base;
    for (at, method) in methods {
        validator = apply(validator, method).map_err(|message| nom::Err::Failure(SyntaxError::new(at, message)))?;
    }
    Ok((input, validator))
}

fn constructor(input: &str) -> PResult<'_, ZodType> {
    alt((coerce_call, enum_call, object_call, array_call, scalar_call))(input)
}

fn coerce_call(input: &str) -> PResult<'_, ZodType> {
    let (input, _) = pair(tag("coerce"), sym('.'))(input)?;
    let (input, validator) = scalar_call(input)?;
    Ok((input, validator.coerce()))
}

fn scalar_call(input: &str) -> PResult<'_, ZodType> {
    let (rest, name) = identifier(input)?;
    let kind = match name {
        "string" => ZodKind::String,
        "number" => ZodKind::Number,
        "boolean" => ZodKind::Boolean,
        "date" => ZodKind::Date,
        "bigint" => ZodKind::BigInt,
        "null" => ZodKind::Null,
        "any" => ZodKind::Any,
        "unknown" => ZodKind::Unknown,
        "function" => ZodKind::Function { params: Vec::new(), body: None },
        other => {
            return Err(nom::Err::Failure(SyntaxError::new(
                input,
                format!("unsupported constructor `z.{other}()`"),
            )));
        }
    };
    let (rest, _) = pair(sym('('), char(')'))(rest)?;
    Ok((rest, ZodType::new(kind)))
}

fn enum_call(input: &str) -> PResult<'_, ZodType> {
    let (input, _) = tag("enum")(input)?;
    let (input, values) = delimited(
        sym('('),
        opt(delimited(
            sym('['),
            terminated(separated_list0(sym(','), string_literal), opt(sym(','))),
            sym(']'),
        )),
        char(')'),
    )(input)?;
    Ok((input, ZodType::new(ZodKind::Enum(values.unwrap_or_default()))))
}

fn object_call(input: &str) -> PResult<'_, ZodType> {
    let (input, _) = tag("object")(input)?;
    let (input, members) = delimited(
        sym('('),
        opt(delimited(
            sym('{'),
            terminated(separated_list0(sym(','), member), opt(sym(','))),
            sym('}'),
        )),
        char(')'),
    )(input)?;
    Ok((input, ZodType::object(members.unwrap_or_default())))
}

fn member(input: &str) -> PResult<'_, (String, ZodType)> {
    let (input, key) = alt((map(identifier, str::to_string), string_literal))(input)?;
    let (input, _) = sym(':')(input)?;
    let (input, validator) = expression(input)?;
    Ok((input, (key, validator)))
}

fn array_call(input: &str) -> PResult<'_, ZodType> {
    let (input, _) = tag("array")(input)?;
    let (input, element) = delimited(sym('('), opt(terminated(expression, multispace0)), char(')'))(input)?;
    let element = element.unwrap_or_else(|| ZodType::new(ZodKind::Unknown));
    Ok((input, ZodType::array(element)))
}

// ————————————————————————————————————————————————————————————————————————————
// METHODS
// ————————————————————————————————————————————————————————————————————————————

fn located_method(input: &str) -> PResult<'_, (&str, Method)> {
    let (rest, method) = method(input)?;
    Ok((rest, (input, method)))
}

fn method(input: &str) -> PResult<'_, Method> {
    let (rest, name) = identifier(input)?;
    let (rest, _) = sym('(')(rest)?;
    let (rest, method) = match name {
        "optional" => (rest, Method::Optional),
        "min" => map(number, Method::Min)(rest)?,
        "max" => map(number, Method::Max)(rest)?,
        "regex" => map(regex_literal, Method::Regex)(rest)?,
        "refine" => map(raw_code, |code| Method::Refine(code.to_string()))(rest)?,
        "describe" => map(separated_list1(sym(','), string_literal), Method::Describe)(rest)?,
        "implement" => map(arrow_function, |(params, body)| Method::Implement(params, body))(rest)?,
        other => {
            return Err(nom::Err::Failure(SyntaxError::new(
                input,
                format!("unsupported method `.{other}()`"),
            )));
        }
    };
    let (rest, _) = preceded(multispace0, char(')'))(rest)?;
    Ok((rest, method))
}

fn apply(validator: ZodType, method: Method) -> Result<ZodType, &'static str> {
    Ok(match method {
        Method::Optional => validator.optional(),
        Method::Min(n) => validator.min(n),
        Method::Max(n) => validator.max(n),
        Method::Regex(RegexDef { source, flags }) => validator.regex_with_flags(source, flags),
        Method::Refine(code) => validator.refine(code),
        // `describe` takes one argument; extra arguments are dropped.
        Method::Describe(args) => match args.into_iter().next() {
            Some(description) => validator.describe(description),
            None => validator,
        },
        Method::Implement(params, body) => {
            if !matches!(validator.kind, ZodKind::Function { .. }) {
                return Err("`.implement()` is only valid on z.function()");
            }
            validator.implement(params, body)
        }
    })
}

fn arrow_function(input: &str) -> PResult<'_, (Vec<String>, String)> {
    let (input, params) = delimited(
        char('('),
        delimited(multispace0, separated_list0(sym(','), map(identifier, str::to_string)), multispace0),
        char(')'),
    )(input)?;
    let (input, _) = delimited(multispace0, tag("=>"), multispace0)(input)?;
    let (input, body) = raw_code(input)?;
    Ok((input, (params, body.to_string())))
}

// ————————————————————————————————————————————————————————————————————————————
// LEXICAL
// ————————————————————————————————————————————————————————————————————————————

fn sym<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    delimited(multispace0, char(c), multispace0)
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

fn number(input: &str) -> PResult<'_, f64> {
    double(input)
}

/// `'...'` or `"..."` with backslash escapes.
fn string_literal(input: &str) -> PResult<'_, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(nom::Err::Error(SyntaxError::new(input, "expected a string literal"))),
    };
    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            c if c == quote => return Ok((&input[i + c.len_utf8()..], out)),
            c => out.push(c),
        }
    }
    Err(nom::Err::Failure(SyntaxError::new(input, "unterminated string literal")))
}

/// `/source/flags`; a `/` inside a character class does not terminate.
fn regex_literal(input: &str) -> PResult<'_, RegexDef> {
    let (rest, _) = char('/')(input)?;
    let mut escaped = false;
    let mut in_class = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let source = &rest[..i];
                let (rest, flags) = take_while(|c: char| c.is_ascii_alphabetic())(&rest[i + 1..])?;
                return Ok((rest, RegexDef { source: source.to_string(), flags: flags.to_string() }));
            }
            '\n' => break,
            _ => {}
        }
    }
    Err(nom::Err::Failure(SyntaxError::new(input, "unterminated regex literal")))
}

/// Code up to the `)` that closes the enclosing call, skipping nested
/// brackets and string literals. The closing `)` is not consumed.
fn raw_code(input: &str) -> PResult<'_, &str> {
    let mut depth = 0usize;
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                let mut closed = false;
                while let Some((_, d)) = chars.next() {
                    if d == '\\' {
                        chars.next();
                    } else if d == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    break;
                }
            }
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                let code = input[..i].trim();
                if code.is_empty() {
                    return Err(nom::Err::Failure(SyntaxError::new(input, "expected an expression")));
                }
                return Ok((&input[i..], code));
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Err(nom::Err::Failure(SyntaxError::new(input, "unclosed call")))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_emitted_module() {
        let source = "import { z } from 'zod';\n\n\
                      const UsersSchema = z.object({\n    \
                      id: z.string().describe(\"Unique identifier\"),\n    \
                      age: z.coerce.number().optional().min(13)\n  \
                      });\n\nexport default UsersSchema;";
        let loaded = load(source).unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Users"));
        let shape = loaded.validator.shape().unwrap();
        let keys: Vec<_> = shape.keys().cloned().collect();
        assert_eq!(keys, ["id", "age"]);
        assert_eq!(shape["id"].def.description.as_deref(), Some("Unique identifier"));
        let age = &shape["age"];
        assert_eq!(age.kind, ZodKind::Number);
        assert!(age.def.coerce);
        assert!(age.is_optional());
        assert_eq!(age.def.minimum, Some(13.0));
    }

    #[test]
    fn loads_bare_expression() {
        let v = load_expression("z.enum(['user', 'admin',])").unwrap();
        assert_eq!(v, ZodType::enumeration(["user", "admin"]));
        let loaded = load("z.array(z.string());").unwrap();
        assert_eq!(loaded.name, None);
        assert_eq!(loaded.validator, ZodType::array(ZodType::string()));
    }

    #[test]
    fn regex_and_escapes_survive() {
        let v = load_expression(r#"z.string().regex(/^a\/b[/]$/i).describe("say \"hi\"", "ignored")"#).unwrap();
        assert_eq!(v.def.regex, Some(RegexDef { source: r"^a\/b[/]$".into(), flags: "i".into() }));
        assert_eq!(v.def.description.as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn captures_opaque_code() {
        let source = "z.function().implement((items) => (items) => items.reduce((sum, item) => sum + item.price, 0))";
        let v = load_expression(source).unwrap();
        assert_eq!(
            v.kind,
            ZodKind::Function {
                params: vec!["items".into()],
                body: Some("(items) => items.reduce((sum, item) => sum + item.price, 0)".into()),
            }
        );
        let v = load_expression("z.string().refine((s) => s !== ')')").unwrap();
        assert_eq!(v.def.refinements, vec!["(s) => s !== ')'"]);
    }

    #[test]
    fn bare_composites_load() {
        assert_eq!(load_expression("z.object()").unwrap(), ZodType::object(Vec::<(String, ZodType)>::new()));
        assert_eq!(load_expression("z.object({})").unwrap(), ZodType::object(Vec::<(String, ZodType)>::new()));
        assert_eq!(load_expression("z.enum()").unwrap(), ZodType::enumeration(Vec::<String>::new()));
        assert_eq!(load_expression("z.array()").unwrap(), ZodType::array(ZodType::new(ZodKind::Unknown)));
    }

    #[test]
    fn quoted_member_keys() {
        let v = load_expression("z.object({ 'first name': z.string() })").unwrap();
        assert!(v.shape().unwrap().contains_key("first name"));
    }

    #[test]
    fn reports_position_of_unknown_constructor() {
        let err = load("const XSchema = z.object({\n  a: z.uuid()\n});").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 8);
        assert_eq!(err.message, "unsupported constructor `z.uuid()`");
    }

    #[test]
    fn rejects_unsupported_methods() {
        let err = load_expression("z.string().email()").unwrap_err();
        assert_eq!(err.message, "unsupported method `.email()`");
        let err = load_expression("z.string().implement(() => 1)").unwrap_err();
        assert_eq!(err.message, "`.implement()` is only valid on z.function()");
        assert_eq!(err.column, 12);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(load("z.string(); z.number();").is_err());
        assert!(load_expression("z.string(").is_err());
    }
}
