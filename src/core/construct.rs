//! SS-003: Construct tree, identity paths, and the resource declaration choke point.
//!
//! The tree is an arena: nodes and resources live in vectors owned by
//! `ConstructTree` and point at their parent by id. A node's entry map is only
//! written by `register`, which `create_child` and `declare_resource` call after
//! all validation has passed, so a failed call leaves the tree untouched.

use super::error::{Result, SynthError};
use super::token::{declare_output, DeferredValue, Token};
use super::types::{AttrKind, AttrSpec, Attributes, ResourceType, Schema, Shape, Value};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Separator joining local names into an identity path.
pub const PATH_SEPARATOR: char = '/';

/// Index of a construct node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Index of a resource declaration in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

/// What a local name under a node refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Node(NodeId),
    Resource(ResourceId),
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    /// Cached at creation; empty for the root
    path: String,
    entries: IndexMap<String, Entry>,
}

/// A declared resource.
#[derive(Debug, Clone)]
pub struct ResourceDecl {
    pub path: String,
    pub resource_type: ResourceType,
    pub owner: NodeId,
    pub attributes: Attributes,
}

/// Handle returned by `declare_resource`; the only source of a resource's
/// deferred outputs for downstream composition.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    id: ResourceId,
    path: String,
    resource_type: ResourceType,
    outputs: IndexMap<&'static str, DeferredValue>,
}

impl ResourceHandle {
    pub fn id_in_tree(&self) -> ResourceId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Deferred value for output `name`.
    pub fn output(&self, name: &str) -> Result<DeferredValue> {
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| SynthError::UnknownOutput {
                path: self.path.clone(),
                resource_type: self.resource_type.to_string(),
                output: name.to_string(),
            })
    }

    /// Deferred output `name` wrapped as an attribute value.
    pub fn value(&self, name: &str) -> Result<Value> {
        Ok(Value::Token(Token::Ref(self.output(name)?)))
    }

    /// The `id` output, present on every catalog type.
    pub fn id(&self) -> Result<Value> {
        self.value("id")
    }
}

/// Composition tree for one synthesis pass.
#[derive(Debug)]
pub struct ConstructTree {
    nodes: Vec<Node>,
    resources: Vec<ResourceDecl>,
    providers: BTreeMap<String, serde_json::Value>,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("valid name pattern"))
}

/// Check that `name` is usable as a local name.
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SynthError::InvalidName {
            name: name.to_string(),
        })
    }
}

impl ConstructTree {
    /// Create a tree with a root named `name`. The root name becomes the
    /// document name and is not part of any identity path.
    pub fn new(name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            nodes: vec![Node {
                name: name.to_string(),
                parent: None,
                path: String::new(),
                entries: IndexMap::new(),
            }],
            resources: Vec::new(),
            providers: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn name(&self) -> &str {
        &self.nodes[0].name
    }

    /// Attach an opaque provider configuration block.
    pub fn set_provider(&mut self, name: &str, config: serde_json::Value) {
        self.providers.insert(name.to_string(), config);
    }

    pub fn providers(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.providers
    }

    /// Cached identity path of `node` (empty for the root).
    pub fn identity_path(&self, node: NodeId) -> &str {
        &self.nodes[node.0].path
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn local_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    /// Entries under `node` in insertion order.
    pub fn entries(&self, node: NodeId) -> impl Iterator<Item = (&str, Entry)> {
        self.nodes[node.0]
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), *entry))
    }

    pub fn resource(&self, id: ResourceId) -> &ResourceDecl {
        &self.resources[id.0]
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Add a child construct named `name` under `parent`.
    pub fn create_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let path = self.check_new_entry(parent, name)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            path,
            entries: IndexMap::new(),
        });
        self.register(parent, name, Entry::Node(id));
        debug!(path = %self.nodes[id.0].path, "construct created");
        Ok(id)
    }

    /// Declare a resource of `resource_type` named `name` under `owner`.
    ///
    /// Validates name, attribute names, literal kinds, deferred shapes, and
    /// required attributes before touching the tree.
    pub fn declare_resource(
        &mut self,
        owner: NodeId,
        name: &str,
        resource_type: ResourceType,
        attributes: Attributes,
    ) -> Result<ResourceHandle> {
        let path = self.check_new_entry(owner, name)?;
        let schema = resource_type.schema();
        check_attributes(&path, schema, &attributes)?;

        let outputs: IndexMap<&'static str, DeferredValue> = schema
            .outputs
            .iter()
            .map(|o| (o.name, declare_output(&path, o.name, o.shape)))
            .collect();

        let id = ResourceId(self.resources.len());
        self.resources.push(ResourceDecl {
            path: path.clone(),
            resource_type,
            owner,
            attributes,
        });
        self.register(owner, name, Entry::Resource(id));
        debug!(path = %path, resource_type = %resource_type, "resource declared");

        Ok(ResourceHandle {
            id,
            path,
            resource_type,
            outputs,
        })
    }

    /// Validate a new local name under `parent` and return its identity path.
    fn check_new_entry(&self, parent: NodeId, name: &str) -> Result<String> {
        validate_name(name)?;
        let node = &self.nodes[parent.0];
        if node.entries.contains_key(name) {
            let parent_label = if node.path.is_empty() {
                node.name.clone()
            } else {
                node.path.clone()
            };
            return Err(SynthError::DuplicateName {
                parent: parent_label,
                name: name.to_string(),
            });
        }
        Ok(if node.path.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", node.path, PATH_SEPARATOR, name)
        })
    }

    fn register(&mut self, parent: NodeId, name: &str, entry: Entry) {
        self.nodes[parent.0].entries.insert(name.to_string(), entry);
    }
}

// ============================================================================
// Attribute validation
// ============================================================================

fn check_attributes(path: &str, schema: &Schema, attributes: &Attributes) -> Result<()> {
    for (name, value) in attributes {
        let spec = schema
            .attribute(name)
            .ok_or_else(|| SynthError::UnknownAttribute {
                path: path.to_string(),
                resource_type: schema.type_tag.to_string(),
                attribute: name.clone(),
            })?;
        check_value(path, spec, value)?;
    }

    for spec in schema.attributes.iter().filter(|a| a.required) {
        if !attributes.contains_key(spec.name) {
            return Err(SynthError::UnresolvedRequiredAttribute {
                path: path.to_string(),
                resource_type: schema.type_tag.to_string(),
                attribute: spec.name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_value(path: &str, spec: &AttrSpec, value: &Value) -> Result<()> {
    if let Value::Token(t) = value {
        return check_shape(path, spec.name, spec.kind.shape(), t);
    }

    let ok = match (spec.kind, value) {
        (AttrKind::Str, Value::String(_))
        | (AttrKind::Num, Value::Number(_))
        | (AttrKind::Bool, Value::Bool(_)) => true,
        (AttrKind::StrList, Value::List(items)) => {
            for item in items {
                check_scalar_element(path, spec, item)?;
            }
            true
        }
        (AttrKind::StrMap, Value::Map(entries)) => {
            for item in entries.values() {
                check_scalar_element(path, spec, item)?;
            }
            true
        }
        (AttrKind::Blocks, Value::List(items)) => items.iter().all(|b| matches!(b, Value::Map(_))),
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(SynthError::AttributeType {
            path: path.to_string(),
            attribute: spec.name.to_string(),
            expected: spec.kind.to_string(),
            found: value.kind_name(),
        })
    }
}

/// Elements of string lists and maps: string literals or scalar tokens.
fn check_scalar_element(path: &str, spec: &AttrSpec, item: &Value) -> Result<()> {
    match item {
        Value::String(_) => Ok(()),
        Value::Token(t) => check_shape(path, spec.name, Shape::Scalar, t),
        other => Err(SynthError::AttributeType {
            path: path.to_string(),
            attribute: spec.name.to_string(),
            expected: spec.kind.to_string(),
            found: format!("element of kind {}", other.kind_name()),
        }),
    }
}

fn check_shape(path: &str, attribute: &str, expected: Shape, token: &Token) -> Result<()> {
    if token.shape() == expected {
        return Ok(());
    }
    Err(SynthError::ShapeMismatch {
        context: format!("attribute '{}.{}'", path, attribute),
        expected: expected.to_string(),
        found: token.shape(),
    })
}
