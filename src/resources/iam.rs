//! SS-012: IAM schemas for roles, instance profiles, and the policy document data source.

use super::{attr, output, required};
use crate::core::types::{AttrKind, Mode, Schema, Shape};

pub static ROLE: Schema = Schema {
    type_tag: "aws_iam_role",
    mode: Mode::Managed,
    attributes: &[
        attr("name", AttrKind::Str),
        required("assume_role_policy", AttrKind::Str),
        attr("description", AttrKind::Str),
        attr("managed_policy_arns", AttrKind::StrList),
        attr("max_session_duration", AttrKind::Num),
        attr("path", AttrKind::Str),
        attr("tags", AttrKind::StrMap),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("arn", Shape::Scalar),
        output("name", Shape::Scalar),
        output("unique_id", Shape::Scalar),
    ],
};

/// Policy document rendered by the engine; `json` is the serialized policy.
pub static POLICY_DOCUMENT: Schema = Schema {
    type_tag: "aws_iam_policy_document",
    mode: Mode::Data,
    attributes: &[
        required("statement", AttrKind::Blocks),
        attr("version", AttrKind::Str),
    ],
    outputs: &[output("id", Shape::Scalar), output("json", Shape::Scalar)],
};

pub static INSTANCE_PROFILE: Schema = Schema {
    type_tag: "aws_iam_instance_profile",
    mode: Mode::Managed,
    attributes: &[
        attr("name", AttrKind::Str),
        required("role", AttrKind::Str),
        attr("path", AttrKind::Str),
        attr("tags", AttrKind::StrMap),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("arn", Shape::Scalar),
        output("name", Shape::Scalar),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss012_policy_document_is_data_source() {
        assert_eq!(POLICY_DOCUMENT.mode, Mode::Data);
        assert!(POLICY_DOCUMENT.output("json").is_some());
    }

    #[test]
    fn test_ss012_profile_requires_role() {
        assert!(INSTANCE_PROFILE.attribute("role").is_some_and(|a| a.required));
        assert!(ROLE.attribute("assume_role_policy").is_some_and(|a| a.required));
    }
}
