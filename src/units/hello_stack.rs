//! SS-021: The bundled stack. Provider block, VPC module, and one connectable
//! instance per configured entry, each placed in a private subnet chosen by a
//! deferred `element(...)` over the VPC's subnet output.

use super::connectable_instance::ConnectableInstance;
use super::CompositionUnit;
use crate::core::construct::{ConstructTree, ResourceHandle};
use crate::core::error::{Result, SynthError};
use crate::core::parser;
use crate::core::token::{as_list, element_at};
use crate::core::types::{Attributes, ResourceType, StackConfig, Value};
use tracing::debug;

/// Compose the whole stack described by `config` into a fresh tree.
///
/// The config is validated first; any validation error aborts composition.
pub fn compose(config: &StackConfig) -> Result<ConstructTree> {
    let errors = parser::validate_config(config);
    if !errors.is_empty() {
        let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(SynthError::Config(joined.join("; ")));
    }

    let mut tree = ConstructTree::new(&config.name)?;
    tree.set_provider("aws", provider_block(config));

    let vpc = declare_vpc(&mut tree, config)?;
    let subnets = vpc.output("private_subnets")?;

    for instance in &config.instances {
        let subnet_id = element_at(as_list(subnets.clone())?, instance.subnet_index)?;
        debug!(unit = %instance.name, subnet_index = instance.subnet_index, "composing instance");
        ConnectableInstance::new(tree.root(), &instance.name, &vpc, Value::Token(subnet_id))
            .with_instance_type(&instance.instance_type)
            .create_resources(&mut tree)?;
    }

    Ok(tree)
}

/// Provider configuration passed through untouched to the document.
fn provider_block(config: &StackConfig) -> serde_json::Value {
    let mut tags = serde_json::Map::new();
    tags.insert("project".to_string(), config.project.clone().into());
    tags.insert("terraform".to_string(), "true".into());
    for (k, v) in &config.provider.default_tags {
        tags.insert(k.clone(), v.clone().into());
    }
    serde_json::json!({
        "region": config.provider.region,
        "default_tags": [{ "tags": tags }],
    })
}

fn declare_vpc(tree: &mut ConstructTree, config: &StackConfig) -> Result<ResourceHandle> {
    let vpc = &config.vpc;
    let attributes: Attributes = [
        ("cidr", Value::from(vpc.cidr.as_str())),
        ("name", Value::from(config.project.as_str())),
        ("azs", Value::strings(vpc.azs.iter().cloned())),
        ("private_subnets", Value::strings(vpc.private_subnets.iter().cloned())),
        ("public_subnets", Value::strings(vpc.public_subnets.iter().cloned())),
        ("manage_default_network_acl", Value::Bool(false)),
        ("enable_dns_hostnames", Value::Bool(vpc.enable_dns_hostnames)),
        ("enable_dns_support", Value::Bool(vpc.enable_dns_support)),
        ("enable_nat_gateway", Value::Bool(vpc.enable_nat_gateway)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    tree.declare_resource(tree.root(), "vpc", ResourceType::Vpc, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synth::{synthesize, synthesize_to_string};
    use crate::core::types::DocumentFormat;

    const HELLO: &str = r#"
version: "1.0"
name: hello
project: HelloStack
provider:
  region: ap-northeast-1
vpc:
  cidr: 10.30.0.0/16
  azs: [ap-northeast-1a, ap-northeast-1c]
  private_subnets: [10.30.1.0/24, 10.30.2.0/24]
  public_subnets: [10.30.11.0/24, 10.30.12.0/24]
  enable_nat_gateway: true
instances:
  - name: connectable
"#;

    fn config() -> StackConfig {
        parser::parse_config(HELLO).unwrap()
    }

    #[test]
    fn test_ss021_compose_hello() {
        let tree = compose(&config()).unwrap();
        let doc = synthesize(&tree).unwrap();
        assert_eq!(doc.name, "hello");
        assert_eq!(doc.resources.len(), 7);
        assert_eq!(doc.provider["aws"]["region"], "ap-northeast-1");
        assert_eq!(
            doc.provider["aws"]["default_tags"][0]["tags"]["project"],
            "HelloStack"
        );
        let instance = doc
            .resources
            .iter()
            .find(|r| r.path == "connectable/instance")
            .unwrap();
        assert_eq!(
            instance.attributes["subnet_id"],
            "${element(vpc.private_subnets, 0)}"
        );
        let sg = doc
            .resources
            .iter()
            .find(|r| r.path == "connectable/egress")
            .unwrap();
        assert_eq!(sg.attributes["vpc_id"], "${vpc.vpc_id}");
    }

    #[test]
    fn test_ss021_vpc_literals() {
        let tree = compose(&config()).unwrap();
        let doc = synthesize(&tree).unwrap();
        let vpc = doc.resources.iter().find(|r| r.path == "vpc").unwrap();
        assert_eq!(vpc.attributes["cidr"], "10.30.0.0/16");
        assert_eq!(vpc.attributes["manage_default_network_acl"], false);
        assert_eq!(vpc.attributes["enable_nat_gateway"], true);
        assert_eq!(
            vpc.attributes["azs"],
            serde_json::json!(["ap-northeast-1a", "ap-northeast-1c"])
        );
    }

    #[test]
    fn test_ss021_invalid_config_aborts() {
        let mut cfg = config();
        cfg.instances[0].subnet_index = 9;
        let err = compose(&cfg).unwrap_err();
        assert!(matches!(err, SynthError::Config(ref m) if m.contains("out of range")));
    }

    #[test]
    fn test_ss021_deterministic_across_compositions() {
        let a = synthesize_to_string(&compose(&config()).unwrap(), DocumentFormat::Json).unwrap();
        let b = synthesize_to_string(&compose(&config()).unwrap(), DocumentFormat::Json).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ss021_multiple_instances() {
        let mut cfg = config();
        let mut second = cfg.instances[0].clone();
        second.name = "worker".to_string();
        second.subnet_index = 1;
        cfg.instances.push(second);
        let doc = synthesize(&compose(&cfg).unwrap()).unwrap();
        assert_eq!(doc.resources.len(), 13);
        let worker = doc
            .resources
            .iter()
            .find(|r| r.path == "worker/instance")
            .unwrap();
        assert_eq!(
            worker.attributes["subnet_id"],
            "${element(vpc.private_subnets, 1)}"
        );
    }
}
