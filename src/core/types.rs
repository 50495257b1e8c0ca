//! SS-001: Shared types: shapes, attribute values, resource catalog tags,
//! schemas, the synthesized document, and the stack configuration.
//!
//! Document and config types derive Serialize/Deserialize; the document's
//! attribute maps are `BTreeMap` so serialization order never depends on
//! insertion order.

use super::token::Token;
use crate::resources;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Shapes and attribute values
// ============================================================================

/// Static shape of a deferred value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar,
    List,
    Map,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::List => write!(f, "list"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// An attribute value: a literal, a literal collection (which may itself
/// hold deferred elements), or a deferred expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Token(Token),
}

impl Value {
    /// Short kind name used in type errors.
    pub fn kind_name(&self) -> String {
        match self {
            Self::String(_) => "string".to_string(),
            Self::Number(_) => "number".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Map(_) => "map".to_string(),
            Self::Token(t) => format!("deferred {}", t.shape()),
        }
    }

    /// Build a list of string literals.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Build a map from `(key, value)` pairs.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Visit every deferred expression reachable from this value.
    pub fn visit_tokens<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        match self {
            Self::Token(t) => f(t),
            Self::List(items) => items.iter().for_each(|v| v.visit_tokens(f)),
            Self::Map(entries) => entries.values().for_each(|v| v.visit_tokens(f)),
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Token> for Value {
    fn from(t: Token) -> Self {
        Self::Token(t)
    }
}

/// Attributes passed to `declare_resource`.
pub type Attributes = BTreeMap<String, Value>;

// ============================================================================
// Resource catalog
// ============================================================================

/// Closed catalog of resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Vpc,
    SecurityGroup,
    IamRole,
    IamPolicyDocument,
    IamInstanceProfile,
    Ami,
    Instance,
}

impl ResourceType {
    /// Attribute and output schema for this type.
    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Vpc => &resources::network::VPC,
            Self::SecurityGroup => &resources::network::SECURITY_GROUP,
            Self::IamRole => &resources::iam::ROLE,
            Self::IamPolicyDocument => &resources::iam::POLICY_DOCUMENT,
            Self::IamInstanceProfile => &resources::iam::INSTANCE_PROFILE,
            Self::Ami => &resources::compute::AMI,
            Self::Instance => &resources::compute::INSTANCE,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema().type_tag)
    }
}

/// Whether a type is created by the apply engine or only read by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Managed,
    Data,
}

/// Expected kind of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Str,
    Num,
    Bool,
    StrList,
    StrMap,
    /// List of free-form nested blocks (maps).
    Blocks,
}

impl AttrKind {
    /// Shape a deferred value must have to stand in for this kind.
    pub fn shape(self) -> Shape {
        match self {
            Self::Str | Self::Num | Self::Bool => Shape::Scalar,
            Self::StrList | Self::Blocks => Shape::List,
            Self::StrMap => Shape::Map,
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => write!(f, "string"),
            Self::Num => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
            Self::StrList => write!(f, "list(string)"),
            Self::StrMap => write!(f, "map(string)"),
            Self::Blocks => write!(f, "list(block)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub name: &'static str,
    pub shape: Shape,
}

/// Static schema for one resource type.
#[derive(Debug)]
pub struct Schema {
    /// Type tag emitted in the document
    pub type_tag: &'static str,
    pub mode: Mode,
    pub attributes: &'static [AttrSpec],
    pub outputs: &'static [OutputSpec],
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&AttrSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

// ============================================================================
// Synthesized document
// ============================================================================

/// The artifact handed to the external apply engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Root construct name
    pub name: String,

    /// Provider configuration blocks (opaque pass-through)
    #[serde(default)]
    pub provider: BTreeMap<String, serde_json::Value>,

    /// Resource records in a valid topological order
    pub resources: Vec<ResourceRecord>,
}

/// One resource in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Identity path (e.g. `bastion/instance`)
    pub path: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub mode: Mode,

    /// Attribute values; references are rendered as `${...}` expressions
    pub attributes: BTreeMap<String, serde_json::Value>,

    /// Identity paths this record references (sorted)
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Output encoding for a synthesized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

// ============================================================================
// Synthesis lock (synth.lock.yaml)
// ============================================================================

/// Fingerprint of the last written document, for diffing and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthLock {
    /// Schema version
    pub schema: String,

    /// Document name
    pub name: String,

    /// Generator version
    pub generator: String,

    /// Document file name, relative to the output directory
    pub document: String,

    /// BLAKE3 hash of the document bytes
    pub document_hash: String,

    /// Per-resource fingerprints, in document order
    pub resources: IndexMap<String, ResourceFingerprint>,
}

/// Per-resource lock entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFingerprint {
    #[serde(rename = "type")]
    pub resource_type: String,

    /// BLAKE3 hash of the record's canonical JSON
    pub hash: String,

    #[serde(default)]
    pub depends_on: Vec<String>,
}

// ============================================================================
// Stack configuration (stack.yaml)
// ============================================================================

/// Root configuration for the bundled stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Root construct / document name
    pub name: String,

    /// Project name used for tagging
    pub project: String,

    pub provider: ProviderConfig,

    pub vpc: VpcConfig,

    /// Connectable instances (order-preserving)
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub region: String,

    /// Extra default tags; `project` and `terraform` are always added
    #[serde(default)]
    pub default_tags: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcConfig {
    pub cidr: String,

    #[serde(default)]
    pub azs: Vec<String>,

    #[serde(default)]
    pub private_subnets: Vec<String>,

    #[serde(default)]
    pub public_subnets: Vec<String>,

    #[serde(default)]
    pub enable_nat_gateway: bool,

    #[serde(default = "default_true")]
    pub enable_dns_hostnames: bool,

    #[serde(default = "default_true")]
    pub enable_dns_support: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Construct name of the unit
    pub name: String,

    /// Index into the VPC's private subnets output
    #[serde(default)]
    pub subnet_index: usize,

    #[serde(default = "default_instance_type")]
    pub instance_type: String,
}

fn default_true() -> bool {
    true
}

fn default_instance_type() -> String {
    "t2.micro".to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token::declare_output;

    #[test]
    fn test_ss001_config_parse() {
        let yaml = r#"
version: "1.0"
name: hello
project: HelloStack
provider:
  region: ap-northeast-1
  default_tags:
    owner: platform
vpc:
  cidr: 10.30.0.0/16
  azs: [ap-northeast-1a, ap-northeast-1c]
  private_subnets: [10.30.1.0/24, 10.30.2.0/24]
  public_subnets: [10.30.11.0/24, 10.30.12.0/24]
  enable_nat_gateway: true
instances:
  - name: bastion
"#;
        let config: StackConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.name, "hello");
        assert_eq!(config.provider.default_tags["owner"], "platform");
        assert_eq!(config.vpc.private_subnets.len(), 2);
        assert!(config.vpc.enable_dns_support);
        assert_eq!(config.instances[0].instance_type, "t2.micro");
        assert_eq!(config.instances[0].subnet_index, 0);
    }

    #[test]
    fn test_ss001_shape_display() {
        assert_eq!(Shape::Scalar.to_string(), "scalar");
        assert_eq!(Shape::List.to_string(), "list");
        assert_eq!(Shape::Map.to_string(), "map");
    }

    #[test]
    fn test_ss001_resource_type_display_uses_tag() {
        assert_eq!(ResourceType::Instance.to_string(), "aws_instance");
        assert_eq!(ResourceType::Vpc.to_string(), "vpc");
        assert_eq!(ResourceType::Ami.schema().mode, Mode::Data);
    }

    #[test]
    fn test_ss001_value_kind_names() {
        let t = declare_output("vpc", "private_subnets", Shape::List);
        assert_eq!(Value::from("x").kind_name(), "string");
        assert_eq!(Value::Token(t.into()).kind_name(), "deferred list");
    }

    #[test]
    fn test_ss001_visit_tokens_nested() {
        let a = declare_output("a", "id", Shape::Scalar);
        let b = declare_output("b", "id", Shape::Scalar);
        let v = Value::List(vec![
            Value::Token(a.into()),
            Value::map([("x", Value::Token(b.into()))]),
            Value::Number(3),
        ]);
        let mut seen = 0;
        v.visit_tokens(&mut |_| seen += 1);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_ss001_lock_roundtrip() {
        let lock = SynthLock {
            schema: "1.0".to_string(),
            name: "hello".to_string(),
            generator: "synthstack 0.1.0".to_string(),
            document: "hello.json".to_string(),
            document_hash: "blake3:abc".to_string(),
            resources: IndexMap::from([(
                "vpc".to_string(),
                ResourceFingerprint {
                    resource_type: "vpc".to_string(),
                    hash: "blake3:def".to_string(),
                    depends_on: vec![],
                },
            )]),
        };
        let yaml = serde_yaml_ng::to_string(&lock).unwrap();
        assert!(yaml.contains("type: vpc"));
        let back: SynthLock = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.resources["vpc"], lock.resources["vpc"]);
    }

    #[test]
    fn test_ss001_document_roundtrip() {
        let doc = Document {
            name: "hello".to_string(),
            provider: BTreeMap::new(),
            resources: vec![ResourceRecord {
                path: "vpc".to_string(),
                resource_type: "vpc".to_string(),
                mode: Mode::Managed,
                attributes: BTreeMap::from([(
                    "cidr".to_string(),
                    serde_json::Value::String("10.0.0.0/16".to_string()),
                )]),
                depends_on: vec![],
            }],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"type\":\"vpc\""));
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
