//! SS-005: Document synthesis.
//!
//! Walks the construct tree once (depth-first, insertion order), derives and
//! validates the reference graph, and emits one record per resource in
//! topological order. Deferred values are rendered to `${...}` text here and
//! nowhere else. The same tree always yields byte-identical output.

use super::construct::{ConstructTree, Entry, NodeId, ResourceDecl};
use super::error::Result;
use super::resolver;
use super::token::escape_literal;
use super::types::{Document, DocumentFormat, ResourceRecord, Value};
use std::collections::HashMap;
use tracing::info;

/// Synthesize the document for `tree`.
pub fn synthesize(tree: &ConstructTree) -> Result<Document> {
    let mut collected = Vec::with_capacity(tree.resource_count());
    collect_resources(tree, tree.root(), &mut collected);

    let graph = resolver::build_reference_graph(&collected)?;
    let order = resolver::topological_order(&graph)?;

    let by_path: HashMap<&str, &ResourceDecl> =
        collected.iter().map(|r| (r.path.as_str(), *r)).collect();

    let mut resources = Vec::with_capacity(order.len());
    for path in &order {
        // `order` is built from `collected`, so every path is present.
        let decl = by_path[path.as_str()];
        let schema = decl.resource_type.schema();
        resources.push(ResourceRecord {
            path: decl.path.clone(),
            resource_type: schema.type_tag.to_string(),
            mode: schema.mode,
            attributes: decl
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), render_value(v)))
                .collect(),
            depends_on: graph.dependencies_of(&decl.path),
        });
    }

    info!(
        name = %tree.name(),
        resources = resources.len(),
        edges = graph.edge_count(),
        "synthesized document"
    );

    Ok(Document {
        name: tree.name().to_string(),
        provider: tree.providers().clone(),
        resources,
    })
}

/// Synthesize and encode in one step.
pub fn synthesize_to_string(tree: &ConstructTree, format: DocumentFormat) -> Result<String> {
    let document = synthesize(tree)?;
    render_document(&document, format)
}

/// Encode a document. Output always ends with a newline.
pub fn render_document(document: &Document, format: DocumentFormat) -> Result<String> {
    let mut out = match format {
        DocumentFormat::Json => serde_json::to_string_pretty(document)?,
        DocumentFormat::Yaml => serde_yaml_ng::to_string(document)?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn collect_resources<'t>(tree: &'t ConstructTree, node: NodeId, out: &mut Vec<&'t ResourceDecl>) {
    for (_, entry) in tree.entries(node) {
        match entry {
            Entry::Node(child) => collect_resources(tree, child, out),
            Entry::Resource(id) => out.push(tree.resource(id)),
        }
    }
}

/// Render an attribute value: literals as JSON, deferred values as text.
/// Literal strings have `${` escaped so only tokens render as references.
pub fn render_value(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(escape_literal(s)),
        Value::Number(n) => serde_json::Value::from(*n),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(render_value).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), render_value(v)))
                .collect(),
        ),
        Value::Token(t) => serde_json::Value::String(t.render()),
    }
}
