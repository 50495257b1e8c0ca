//! SS-002: Deferred values and expression combinators.
//!
//! A `DeferredValue` names an output of a resource that only exists after the
//! external engine applies the document. Combinators wrap deferred values into
//! a `Token` tree without ever reading through to a concrete value; the tree is
//! only turned into `${...}` text when the synthesizer renders it.

use super::error::{Result, SynthError};
use super::types::{Shape, Value};
use std::fmt;

/// Placeholder for output `output` of the resource at identity path `producer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeferredValue {
    producer: String,
    output: String,
    shape: Shape,
}

impl DeferredValue {
    pub fn producer(&self) -> &str {
        &self.producer
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}

/// Declare a deferred output of the resource at `producer`.
///
/// `declare_resource` calls this for every output in a type's schema. Calling
/// it directly builds a reference out of band; the synthesizer still checks
/// that the producer exists and that the reference graph stays acyclic.
pub fn declare_output(producer: &str, output: &str, shape: Shape) -> DeferredValue {
    DeferredValue {
        producer: producer.to_string(),
        output: output.to_string(),
        shape,
    }
}

/// Deferred expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Ref(DeferredValue),
    /// Sequence view over a scalar- or list-shaped reference.
    AsList(Box<Token>),
    Element {
        list: Box<Token>,
        index: usize,
    },
    Interpolate(Vec<Segment>),
}

/// Piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Text(String),
    Token(Token),
}

impl From<DeferredValue> for Token {
    fn from(dv: DeferredValue) -> Self {
        Self::Ref(dv)
    }
}

impl Token {
    /// Static shape of the value this expression will produce.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Ref(dv) => dv.shape,
            Self::AsList(_) => Shape::List,
            Self::Element { .. } | Self::Interpolate(_) => Shape::Scalar,
        }
    }

    /// Visit every deferred value leaf in this expression.
    pub fn visit_refs<'a>(&'a self, f: &mut dyn FnMut(&'a DeferredValue)) {
        match self {
            Self::Ref(dv) => f(dv),
            Self::AsList(inner) => inner.visit_refs(f),
            Self::Element { list, .. } => list.visit_refs(f),
            Self::Interpolate(segments) => {
                for segment in segments {
                    if let Segment::Token(t) = segment {
                        t.visit_refs(f);
                    }
                }
            }
        }
    }

    /// Document form: `${...}` for expressions, template text for interpolations.
    pub fn render(&self) -> String {
        match self {
            Self::Interpolate(segments) => template_body(segments, false),
            other => format!("${{{}}}", other.expr()),
        }
    }

    /// Bare expression form, used inside function operands.
    fn expr(&self) -> String {
        match self {
            Self::Ref(dv) => format!("{}.{}", dv.producer, dv.output),
            Self::AsList(inner) => inner.expr(),
            Self::Element { list, index } => format!("element({}, {})", list.expr(), index),
            Self::Interpolate(segments) => format!("\"{}\"", template_body(segments, true)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Escape `${` in literal text so the apply engine never reads it as a reference.
pub fn escape_literal(text: &str) -> String {
    text.replace("${", "$${")
}

fn template_body(segments: &[Segment], quoted: bool) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                let mut escaped = escape_literal(text);
                if quoted {
                    escaped = escaped.replace('\\', "\\\\").replace('"', "\\\"");
                }
                out.push_str(&escaped);
            }
            Segment::Token(t) => {
                out.push_str("${");
                out.push_str(&t.expr());
                out.push('}');
            }
        }
    }
    out
}

// ============================================================================
// Combinators
// ============================================================================

/// `element(list, index)`. The operand must be list-shaped.
pub fn element_at(list: impl Into<Token>, index: usize) -> Result<Token> {
    let list = list.into();
    if list.shape() != Shape::List {
        return Err(SynthError::ShapeMismatch {
            context: format!("element({}, {})", list.expr(), index),
            expected: Shape::List.to_string(),
            found: list.shape(),
        });
    }
    Ok(Token::Element {
        list: Box::new(list),
        index,
    })
}

/// Coerce a scalar- or list-shaped reference into an indexable list view.
pub fn as_list(value: impl Into<Token>) -> Result<Token> {
    let value = value.into();
    match value.shape() {
        Shape::Scalar | Shape::List => Ok(Token::AsList(Box::new(value))),
        Shape::Map => Err(SynthError::ShapeMismatch {
            context: format!("as_list({})", value.expr()),
            expected: "scalar or list".to_string(),
            found: Shape::Map,
        }),
    }
}

/// Interpolate `values` into `template`, one value per `{}` placeholder.
///
/// Literal scalars are inlined as text; deferred values must be scalar.
/// Nested interpolations are flattened into the outer template.
pub fn interpolate(template: &str, values: Vec<Value>) -> Result<Token> {
    let pieces: Vec<&str> = template.split("{}").collect();
    let placeholders = pieces.len() - 1;
    if placeholders != values.len() {
        return Err(SynthError::InvalidTemplate {
            template: template.to_string(),
            reason: format!(
                "{} placeholder(s) but {} value(s)",
                placeholders,
                values.len()
            ),
        });
    }

    let mut segments = Vec::new();
    for (i, piece) in pieces.iter().enumerate() {
        push_text(&mut segments, piece);
        let Some(value) = values.get(i) else {
            continue;
        };
        match value {
            Value::String(s) => push_text(&mut segments, s),
            Value::Number(n) => push_text(&mut segments, &n.to_string()),
            Value::Bool(b) => push_text(&mut segments, &b.to_string()),
            Value::Token(Token::Interpolate(inner)) => {
                for segment in inner {
                    match segment {
                        Segment::Text(text) => push_text(&mut segments, text),
                        Segment::Token(t) => segments.push(Segment::Token(t.clone())),
                    }
                }
            }
            Value::Token(t) if t.shape() == Shape::Scalar => {
                segments.push(Segment::Token(t.clone()));
            }
            other => {
                let found = match other {
                    Value::Token(t) => t.shape(),
                    Value::Map(_) => Shape::Map,
                    _ => Shape::List,
                };
                return Err(SynthError::ShapeMismatch {
                    context: format!("interpolate(\"{}\") argument {}", template, i),
                    expected: Shape::Scalar.to_string(),
                    found,
                });
            }
        }
    }

    Ok(Token::Interpolate(segments))
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(prev)) = segments.last_mut() {
        prev.push_str(text);
    } else {
        segments.push(Segment::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnets() -> DeferredValue {
        declare_output("vpc", "private_subnets", Shape::List)
    }

    #[test]
    fn test_ss002_ref_render() {
        let t: Token = declare_output("bastion/role", "name", Shape::Scalar).into();
        assert_eq!(t.render(), "${bastion/role.name}");
        assert_eq!(t.shape(), Shape::Scalar);
    }

    #[test]
    fn test_ss002_element_of_as_list() {
        let t = element_at(as_list(subnets()).unwrap(), 0).unwrap();
        assert_eq!(t.shape(), Shape::Scalar);
        assert_eq!(t.render(), "${element(vpc.private_subnets, 0)}");
    }

    #[test]
    fn test_ss002_element_direct_on_list_ref() {
        let t = element_at(subnets(), 1).unwrap();
        assert_eq!(t.render(), "${element(vpc.private_subnets, 1)}");
    }

    #[test]
    fn test_ss002_element_on_scalar_fails() {
        let id = declare_output("vpc", "vpc_id", Shape::Scalar);
        let err = element_at(id, 0).unwrap_err();
        assert!(matches!(
            err,
            SynthError::ShapeMismatch {
                found: Shape::Scalar,
                ..
            }
        ));
    }

    #[test]
    fn test_ss002_element_on_element_fails() {
        let first = element_at(subnets(), 0).unwrap();
        assert!(element_at(first, 0).is_err());
    }

    #[test]
    fn test_ss002_as_list_on_scalar_then_index() {
        let raw = declare_output("mod", "ids", Shape::Scalar);
        let t = element_at(as_list(raw).unwrap(), 2).unwrap();
        assert_eq!(t.render(), "${element(mod.ids, 2)}");
    }

    #[test]
    fn test_ss002_as_list_on_map_fails() {
        let tags = declare_output("vpc", "tags", Shape::Map);
        let err = as_list(tags).unwrap_err();
        assert!(matches!(err, SynthError::ShapeMismatch { found: Shape::Map, .. }));
    }

    #[test]
    fn test_ss002_as_list_renders_transparently() {
        let t = as_list(subnets()).unwrap();
        assert_eq!(t.render(), "${vpc.private_subnets}");
        assert_eq!(t.shape(), Shape::List);
    }

    #[test]
    fn test_ss002_interpolate_mixed() {
        let name = declare_output("role", "name", Shape::Scalar);
        let t = interpolate(
            "arn:{}:role/{}-{}",
            vec![Value::from("aws"), Value::Token(name.into()), Value::Number(7)],
        )
        .unwrap();
        assert_eq!(t.render(), "arn:aws:role/${role.name}-7");
        assert_eq!(t.shape(), Shape::Scalar);
    }

    #[test]
    fn test_ss002_interpolate_escapes_literal_dollar_brace() {
        let t = interpolate("${literal}-{}", vec![Value::from("x")]).unwrap();
        assert_eq!(t.render(), "$${literal}-x");
    }

    #[test]
    fn test_ss002_interpolate_arity_mismatch() {
        let err = interpolate("{}-{}", vec![Value::from("a")]).unwrap_err();
        assert!(matches!(err, SynthError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_ss002_interpolate_rejects_list() {
        let err = interpolate("{}", vec![Value::Token(subnets().into())]).unwrap_err();
        assert!(matches!(err, SynthError::ShapeMismatch { found: Shape::List, .. }));
    }

    #[test]
    fn test_ss002_interpolate_flattens_nested() {
        let id = declare_output("sg", "id", Shape::Scalar);
        let inner = interpolate("sg-{}", vec![Value::Token(id.into())]).unwrap();
        let outer = interpolate("[{}]", vec![Value::Token(inner)]).unwrap();
        assert_eq!(outer.render(), "[sg-${sg.id}]");
    }

    #[test]
    fn test_ss002_interpolation_as_operand_is_quoted() {
        let id = declare_output("sg", "id", Shape::Scalar);
        let inner = interpolate("say \"{}\"", vec![Value::Token(id.into())]).unwrap();
        let list = as_list(inner).unwrap();
        assert_eq!(list.render(), "${\"say \\\"${sg.id}\\\"\"}");
    }

    #[test]
    fn test_ss002_visit_refs_collects_leaves() {
        let a = declare_output("a", "id", Shape::Scalar);
        let b = declare_output("b", "ids", Shape::List);
        let t = interpolate(
            "{}/{}",
            vec![
                Value::Token(a.into()),
                Value::Token(element_at(b, 0).unwrap()),
            ],
        )
        .unwrap();
        let mut producers = Vec::new();
        t.visit_refs(&mut |dv| producers.push(dv.producer().to_string()));
        assert_eq!(producers, vec!["a", "b"]);
    }

    #[test]
    fn test_ss002_combinators_do_not_mutate_operands() {
        let dv = subnets();
        let before = dv.clone();
        let _ = element_at(as_list(dv.clone()).unwrap(), 0).unwrap();
        assert_eq!(dv, before);
    }
}
