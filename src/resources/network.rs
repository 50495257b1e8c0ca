//! SS-011: Network schemas for the VPC registry module and security groups.

use super::{attr, output, required};
use crate::core::types::{AttrKind, Mode, Schema, Shape};

/// VPC registry module. Subnet outputs are lists of subnet ids.
pub static VPC: Schema = Schema {
    type_tag: "vpc",
    mode: Mode::Managed,
    attributes: &[
        required("cidr", AttrKind::Str),
        attr("name", AttrKind::Str),
        attr("azs", AttrKind::StrList),
        attr("private_subnets", AttrKind::StrList),
        attr("public_subnets", AttrKind::StrList),
        attr("enable_nat_gateway", AttrKind::Bool),
        attr("enable_dns_hostnames", AttrKind::Bool),
        attr("enable_dns_support", AttrKind::Bool),
        attr("manage_default_network_acl", AttrKind::Bool),
        attr("tags", AttrKind::StrMap),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("vpc_id", Shape::Scalar),
        output("vpc_cidr_block", Shape::Scalar),
        output("private_subnets", Shape::List),
        output("public_subnets", Shape::List),
        output("nat_public_ips", Shape::List),
    ],
};

pub static SECURITY_GROUP: Schema = Schema {
    type_tag: "aws_security_group",
    mode: Mode::Managed,
    attributes: &[
        attr("name", AttrKind::Str),
        attr("description", AttrKind::Str),
        attr("vpc_id", AttrKind::Str),
        attr("ingress", AttrKind::Blocks),
        attr("egress", AttrKind::Blocks),
        attr("tags", AttrKind::StrMap),
    ],
    outputs: &[
        output("id", Shape::Scalar),
        output("arn", Shape::Scalar),
        output("name", Shape::Scalar),
        output("owner_id", Shape::Scalar),
        output("tags_all", Shape::Map),
    ],
};
