//! SS-013: Compute schemas for AMI lookup and EC2 instances.

use super::{attr, output, required};
use crate::core::types::{AttrKind, Mode, Schema, Shape};

pub static AMI: Schema = Schema {
    type_tag: "aws_ami",
    mode: Mode::Data,
    attributes: &[
        attr("most_recent", AttrKind::Bool),
        attr("owners", AttrKind::StrList),
        attr("filter", AttrKind::Blocks),
        attr("name_regex", AttrKind::Str),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("arn", Shape::Scalar),
        output("name", Shape::Scalar),
        output("image_id", Shape::Scalar),
        output("architecture", Shape::Scalar),
    ],
};

pub static INSTANCE: Schema = Schema {
    type_tag: "aws_instance",
    mode: Mode::Managed,
    attributes: &[
        required("ami", AttrKind::Str),
        required("instance_type", AttrKind::Str),
        attr("subnet_id", AttrKind::Str),
        attr("vpc_security_group_ids", AttrKind::StrList),
        attr("iam_instance_profile", AttrKind::Str),
        attr("associate_public_ip_address", AttrKind::Bool),
        attr("key_name", AttrKind::Str),
        attr("user_data", AttrKind::Str),
        attr("tags", AttrKind::StrMap),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("arn", Shape::Scalar),
        output("private_ip", Shape::Scalar),
        output("public_ip", Shape::Scalar),
        output("availability_zone", Shape::Scalar),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss013_instance_required_attributes() {
        let required: Vec<_> = INSTANCE
            .attributes
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name)
            .collect();
        assert_eq!(required, vec!["ami", "instance_type"]);
    }

    #[test]
    fn test_ss013_ami_lookup_has_no_required_attributes() {
        assert_eq!(AMI.mode, Mode::Data);
        assert!(AMI.attributes.iter().all(|a| !a.required));
    }
}
