//! SS-020: Connectable instance, an SSM-reachable EC2 instance with its IAM
//! role, instance profile, egress-only security group, and AMI lookup.
//!
//! All declarations go under a child construct named after the unit, so the
//! unit can be instantiated any number of times in one tree.

use super::CompositionUnit;
use crate::core::construct::{ConstructTree, NodeId, ResourceHandle};
use crate::core::error::Result;
use crate::core::types::{Attributes, ResourceType, Value};

const SSM_MANAGED_POLICY: &str = "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore";
const AMAZON_LINUX_2_PATTERN: &str = "amzn2-ami-hvm-*-x86_64-gp2";
const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";

pub struct ConnectableInstance<'a> {
    scope: NodeId,
    name: String,
    vpc: &'a ResourceHandle,
    subnet_id: Value,
    instance_type: String,
}

impl<'a> ConnectableInstance<'a> {
    /// `vpc` must be a VPC module handle; `subnet_id` is usually a deferred
    /// element of its private subnets.
    pub fn new(scope: NodeId, name: &str, vpc: &'a ResourceHandle, subnet_id: Value) -> Self {
        Self {
            scope,
            name: name.to_string(),
            vpc,
            subnet_id,
            instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
        }
    }

    pub fn with_instance_type(mut self, instance_type: &str) -> Self {
        self.instance_type = instance_type.to_string();
        self
    }

    fn create_role(&self, tree: &mut ConstructTree, unit: NodeId) -> Result<ResourceHandle> {
        let policy = self.create_assume_role_policy(tree, unit)?;
        let name = physical_name(tree, unit, "role");
        tree.declare_resource(
            unit,
            "role",
            ResourceType::IamRole,
            attrs([
                ("name", Value::from(name)),
                ("assume_role_policy", policy.value("json")?),
                ("managed_policy_arns", Value::strings([SSM_MANAGED_POLICY])),
            ]),
        )
    }

    fn create_assume_role_policy(
        &self,
        tree: &mut ConstructTree,
        unit: NodeId,
    ) -> Result<ResourceHandle> {
        let statement = Value::map([
            ("actions", Value::strings(["sts:AssumeRole"])),
            (
                "principals",
                Value::List(vec![Value::map([
                    ("identifiers", Value::strings(["ec2.amazonaws.com"])),
                    ("type", Value::from("Service")),
                ])]),
            ),
        ]);
        tree.declare_resource(
            unit,
            "assume_role_policy",
            ResourceType::IamPolicyDocument,
            attrs([("statement", Value::List(vec![statement]))]),
        )
    }

    fn create_egress_security_group(
        &self,
        tree: &mut ConstructTree,
        unit: NodeId,
    ) -> Result<ResourceHandle> {
        let name = physical_name(tree, unit, "egress");
        let egress = Value::map([
            ("from_port", Value::Number(0)),
            ("to_port", Value::Number(0)),
            ("protocol", Value::from("-1")),
            ("cidr_blocks", Value::strings(["0.0.0.0/0"])),
        ]);
        tree.declare_resource(
            unit,
            "egress",
            ResourceType::SecurityGroup,
            attrs([
                ("name", Value::from(name.as_str())),
                ("vpc_id", self.vpc.value("vpc_id")?),
                ("ingress", Value::List(vec![])),
                ("egress", Value::List(vec![egress])),
                ("tags", Value::map([("Name", Value::from(name))])),
            ]),
        )
    }

    fn create_instance(
        &self,
        tree: &mut ConstructTree,
        unit: NodeId,
        role: &ResourceHandle,
    ) -> Result<ResourceHandle> {
        let ami = tree.declare_resource(
            unit,
            "ami",
            ResourceType::Ami,
            attrs([
                ("most_recent", Value::Bool(true)),
                ("owners", Value::strings(["amazon"])),
                (
                    "filter",
                    Value::List(vec![Value::map([
                        ("name", Value::from("name")),
                        ("values", Value::strings([AMAZON_LINUX_2_PATTERN])),
                    ])]),
                ),
            ]),
        )?;
        let sg = self.create_egress_security_group(tree, unit)?;
        let profile_name = physical_name(tree, unit, "profile");
        let profile = tree.declare_resource(
            unit,
            "profile",
            ResourceType::IamInstanceProfile,
            attrs([
                ("name", Value::from(profile_name)),
                ("role", role.value("name")?),
            ]),
        )?;

        let name = physical_name(tree, unit, "instance");
        tree.declare_resource(
            unit,
            "instance",
            ResourceType::Instance,
            attrs([
                ("ami", ami.id()?),
                ("instance_type", Value::from(self.instance_type.as_str())),
                ("iam_instance_profile", profile.value("name")?),
                ("vpc_security_group_ids", Value::List(vec![sg.id()?])),
                ("subnet_id", self.subnet_id.clone()),
                ("tags", Value::map([("Name", Value::from(name))])),
            ]),
        )
    }
}

impl CompositionUnit for ConnectableInstance<'_> {
    type Output = ResourceHandle;

    fn create_resources(&self, tree: &mut ConstructTree) -> Result<ResourceHandle> {
        let unit = tree.create_child(self.scope, &self.name)?;
        let role = self.create_role(tree, unit)?;
        self.create_instance(tree, unit, &role)
    }
}

/// Provider-side name derived from the unit's identity path.
fn physical_name(tree: &ConstructTree, unit: NodeId, suffix: &str) -> String {
    format!("{}-{}", tree.identity_path(unit).replace('/', "-"), suffix)
}

fn attrs<const N: usize>(entries: [(&str, Value); N]) -> Attributes {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
