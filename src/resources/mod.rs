//! Resource catalog: attribute and output schemas per resource type.
//!
//! Each module declares static `Schema`s for one provider service area:
//! 1. Attribute specs: name, expected kind, whether the attribute is required
//! 2. Output specs: name and shape of each deferred output
//!
//! Every type exposes an `id` output.

pub mod compute;
pub mod iam;
pub mod network;

use crate::core::types::{AttrKind, AttrSpec, OutputSpec, Shape};

pub(crate) const fn attr(name: &'static str, kind: AttrKind) -> AttrSpec {
    AttrSpec {
        name,
        kind,
        required: false,
    }
}

pub(crate) const fn required(name: &'static str, kind: AttrKind) -> AttrSpec {
    AttrSpec {
        name,
        kind,
        required: true,
    }
}

pub(crate) const fn output(name: &'static str, shape: Shape) -> OutputSpec {
    OutputSpec { name, shape }
}

#[cfg(test)]
mod tests {
    use crate::core::types::{ResourceType, Shape};
    use std::collections::HashSet;

    const ALL: [ResourceType; 7] = [
        ResourceType::Vpc,
        ResourceType::SecurityGroup,
        ResourceType::IamRole,
        ResourceType::IamPolicyDocument,
        ResourceType::IamInstanceProfile,
        ResourceType::Ami,
        ResourceType::Instance,
    ];

    #[test]
    fn test_ss010_every_type_has_id_output() {
        for t in ALL {
            let id = t.schema().output("id");
            assert!(id.is_some(), "{t} has no id output");
            assert_eq!(id.map(|o| o.shape), Some(Shape::Scalar));
        }
    }

    #[test]
    fn test_ss010_names_unique_within_schema() {
        for t in ALL {
            let schema = t.schema();
            let attrs: HashSet<_> = schema.attributes.iter().map(|a| a.name).collect();
            assert_eq!(attrs.len(), schema.attributes.len(), "{t} attributes");
            let outs: HashSet<_> = schema.outputs.iter().map(|o| o.name).collect();
            assert_eq!(outs.len(), schema.outputs.len(), "{t} outputs");
        }
    }

    #[test]
    fn test_ss010_type_tags_unique() {
        let tags: HashSet<_> = ALL.iter().map(|t| t.schema().type_tag).collect();
        assert_eq!(tags.len(), ALL.len());
    }
}
