//! SS-006: stack.yaml parsing and validation.
//!
//! Parses stack.yaml and validates structural constraints before composition:
//! - Version must be "1.0"
//! - Stack and instance names must be valid construct names
//! - Instance names must be unique
//! - subnet_index must address a configured private subnet
//! - azs and subnet lists must line up

use super::construct::validate_name;
use super::types::*;
use std::collections::HashSet;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a stack.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<StackConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a stack.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<StackConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &StackConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    if config.version != "1.0" {
        push(format!("version must be \"1.0\", got \"{}\"", config.version));
    }

    if config.name.is_empty() {
        push("name must not be empty".to_string());
    } else if validate_name(&config.name).is_err() {
        push(format!("name '{}' is not a valid construct name", config.name));
    }

    if config.provider.region.is_empty() {
        push("provider.region must not be empty".to_string());
    }

    if config.vpc.cidr.is_empty() {
        push("vpc.cidr must not be empty".to_string());
    }

    let azs = config.vpc.azs.len();
    for (label, subnets) in [
        ("private_subnets", &config.vpc.private_subnets),
        ("public_subnets", &config.vpc.public_subnets),
    ] {
        if azs > 0 && !subnets.is_empty() && subnets.len() != azs {
            push(format!(
                "vpc.{} has {} entries but {} azs are configured",
                label,
                subnets.len(),
                azs
            ));
        }
    }

    let mut seen = HashSet::new();
    for instance in &config.instances {
        if validate_name(&instance.name).is_err() {
            push(format!(
                "instance '{}' is not a valid construct name",
                instance.name
            ));
        }
        if instance.name == "vpc" {
            push("instance name 'vpc' collides with the stack's VPC".to_string());
        }
        if !seen.insert(instance.name.as_str()) {
            push(format!("duplicate instance name '{}'", instance.name));
        }
        if instance.subnet_index >= config.vpc.private_subnets.len() {
            push(format!(
                "instance '{}' subnet_index {} is out of range ({} private subnets)",
                instance.name,
                instance.subnet_index,
                config.vpc.private_subnets.len()
            ));
        }
        if instance.instance_type.is_empty() {
            push(format!("instance '{}' has no instance_type", instance.name));
        }
    }

    errors
}
