/// Shared network declared once for all clusters
use std::collections::BTreeMap;
use tracing::debug;

use super::models::{ResourceProperties, SecurityGroupArgs, SecurityGroupRule, SubnetArgs, VpcArgs};
use crate::config::StackSettings;
use crate::error::Result;
use crate::graph::{Declaration, ResourceGraph, ResourceId};

/// Ids of the shared network declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedNetwork {
    pub vpc: ResourceId,
    pub subnet: ResourceId,
    pub security_group: ResourceId,
}

fn name_tag(name: &str) -> BTreeMap<String, String> {
    [("Name".to_string(), name.to_string())].into_iter().collect()
}

/// Declare VPC, subnet and security group
pub fn declare_shared_network(
    graph: &mut ResourceGraph,
    settings: &StackSettings,
) -> Result<SharedNetwork> {
    let network = &settings.network;

    let vpc = graph.push(Declaration {
        id: ResourceId::new("general-vpc"),
        name: "generalVpc".to_string(),
        cluster: None,
        properties: ResourceProperties::Vpc(VpcArgs {
            cidr_block: network.vpc_cidr.clone(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            tags: name_tag("generalVpc"),
        }),
        depends_on: vec![],
    })?;

    let subnet = graph.push(Declaration {
        id: ResourceId::new("general-subnet"),
        name: "generalSubnet".to_string(),
        cluster: None,
        properties: ResourceProperties::Subnet(SubnetArgs {
            vpc_id: vpc.output("id"),
            cidr_block: network.subnet_cidr.clone(),
            availability_zone: settings.availability_zone.clone(),
            tags: name_tag("generalSubnet"),
        }),
        depends_on: vec![vpc.clone()],
    })?;

    let security_group = graph.push(Declaration {
        id: ResourceId::new("general-security-group"),
        name: "generalSecurityGroup".to_string(),
        cluster: None,
        properties: ResourceProperties::SecurityGroup(SecurityGroupArgs {
            vpc_id: vpc.output("id"),
            description: "Allow SSH traffic".to_string(),
            ingress: vec![SecurityGroupRule {
                protocol: "tcp".to_string(),
                from_port: 22,
                to_port: 22,
                cidr_blocks: vec![network.ssh_ingress_cidr.clone()],
            }],
            egress: vec![SecurityGroupRule {
                protocol: "-1".to_string(),
                from_port: 0,
                to_port: 0,
                cidr_blocks: vec!["0.0.0.0/0".to_string()],
            }],
            tags: name_tag("generalSecurityGroup"),
        }),
        depends_on: vec![vpc.clone()],
    })?;

    debug!("Declared shared network {} / {} / {}", vpc, subnet, security_group);

    Ok(SharedNetwork {
        vpc,
        subnet,
        security_group,
    })
}
