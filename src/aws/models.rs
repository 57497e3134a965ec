/// AWS resource argument models, serialized with the provider's property names
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::config::EnvironmentVariable;
use crate::graph::Reference;

/// Kinds of resource the expander declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vpc,
    Subnet,
    SecurityGroup,
    EcsCluster,
    LaunchTemplate,
    AutoscalingGroup,
    CapacityProvider,
    ClusterCapacityProviders,
    TaskDefinition,
    Service,
}

impl ResourceKind {
    /// Provider type token
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "aws:ec2:Vpc",
            ResourceKind::Subnet => "aws:ec2:Subnet",
            ResourceKind::SecurityGroup => "aws:ec2:SecurityGroup",
            ResourceKind::EcsCluster => "aws:ecs:Cluster",
            ResourceKind::LaunchTemplate => "aws:ec2:LaunchTemplate",
            ResourceKind::AutoscalingGroup => "aws:autoscaling:Group",
            ResourceKind::CapacityProvider => "aws:ecs:CapacityProvider",
            ResourceKind::ClusterCapacityProviders => "aws:ecs:ClusterCapacityProviders",
            ResourceKind::TaskDefinition => "aws:ecs:TaskDefinition",
            ResourceKind::Service => "aws:ecs:Service",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_token())
    }
}

/// Properties of one declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceProperties {
    Vpc(VpcArgs),
    Subnet(SubnetArgs),
    SecurityGroup(SecurityGroupArgs),
    EcsCluster(EcsClusterArgs),
    LaunchTemplate(LaunchTemplateArgs),
    AutoscalingGroup(AutoscalingGroupArgs),
    CapacityProvider(CapacityProviderArgs),
    ClusterCapacityProviders(ClusterCapacityProvidersArgs),
    TaskDefinition(TaskDefinitionArgs),
    Service(ServiceArgs),
}

impl ResourceProperties {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceProperties::Vpc(_) => ResourceKind::Vpc,
            ResourceProperties::Subnet(_) => ResourceKind::Subnet,
            ResourceProperties::SecurityGroup(_) => ResourceKind::SecurityGroup,
            ResourceProperties::EcsCluster(_) => ResourceKind::EcsCluster,
            ResourceProperties::LaunchTemplate(_) => ResourceKind::LaunchTemplate,
            ResourceProperties::AutoscalingGroup(_) => ResourceKind::AutoscalingGroup,
            ResourceProperties::CapacityProvider(_) => ResourceKind::CapacityProvider,
            ResourceProperties::ClusterCapacityProviders(_) => {
                ResourceKind::ClusterCapacityProviders
            }
            ResourceProperties::TaskDefinition(_) => ResourceKind::TaskDefinition,
            ResourceProperties::Service(_) => ResourceKind::Service,
        }
    }

    /// Outputs of other declarations this one consumes
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            ResourceProperties::Vpc(_)
            | ResourceProperties::EcsCluster(_)
            | ResourceProperties::TaskDefinition(_) => vec![],
            ResourceProperties::Subnet(args) => vec![&args.vpc_id],
            ResourceProperties::SecurityGroup(args) => vec![&args.vpc_id],
            ResourceProperties::LaunchTemplate(args) => args
                .network_interfaces
                .iter()
                .flat_map(|ni| ni.security_groups.iter().chain(std::iter::once(&ni.subnet_id)))
                .collect(),
            ResourceProperties::AutoscalingGroup(args) => vec![&args.launch_template.id],
            ResourceProperties::CapacityProvider(args) => {
                vec![&args.auto_scaling_group_provider.auto_scaling_group_arn]
            }
            ResourceProperties::ClusterCapacityProviders(args) => {
                std::iter::once(&args.cluster_name)
                    .chain(args.capacity_providers.iter())
                    .collect()
            }
            ResourceProperties::Service(args) => std::iter::once(&args.cluster)
                .chain(std::iter::once(&args.task_definition))
                .chain(
                    args.capacity_provider_strategies
                        .iter()
                        .map(|s| &s.capacity_provider),
                )
                .collect(),
        }
    }
}

/// aws:ec2:Vpc
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcArgs {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub tags: BTreeMap<String, String>,
}

/// aws:ec2:Subnet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetArgs {
    pub vpc_id: Reference,
    pub cidr_block: String,
    pub availability_zone: String,
    pub tags: BTreeMap<String, String>,
}

/// aws:ec2:SecurityGroup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupArgs {
    pub vpc_id: Reference,
    pub description: String,
    pub ingress: Vec<SecurityGroupRule>,
    pub egress: Vec<SecurityGroupRule>,
    pub tags: BTreeMap<String, String>,
}

/// Ingress or egress rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr_blocks: Vec<String>,
}

/// aws:ecs:Cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsClusterArgs {
    pub name: String,
    pub settings: Vec<ClusterSetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSetting {
    pub name: String,
    pub value: String,
}

/// aws:ec2:LaunchTemplate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateArgs {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub block_device_mappings: Vec<BlockDeviceMapping>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub instance_market_options: InstanceMarketOptions,
    pub update_default_version: bool,
    /// Base64-encoded
    pub user_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeviceMapping {
    pub device_name: String,
    pub ebs: EbsVolume,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EbsVolume {
    pub iops: u32,
    pub volume_size: u32,
    pub throughput: u32,
    pub volume_type: String,
    pub delete_on_termination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub associate_public_ip_address: String,
    pub security_groups: Vec<Reference>,
    pub subnet_id: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMarketOptions {
    pub market_type: String,
    pub spot_options: SpotOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotOptions {
    pub max_price: String,
}

/// aws:autoscaling:Group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingGroupArgs {
    pub name: String,
    pub availability_zones: Vec<String>,
    pub launch_template: LaunchTemplateSpecification,
    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub tags: Vec<GroupTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchTemplateSpecification {
    pub id: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTag {
    pub key: String,
    pub value: String,
    pub propagate_at_launch: bool,
}

/// aws:ecs:CapacityProvider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProviderArgs {
    pub name: String,
    pub auto_scaling_group_provider: AutoScalingGroupProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingGroupProvider {
    pub auto_scaling_group_arn: Reference,
    pub managed_termination_protection: String,
}

/// aws:ecs:ClusterCapacityProviders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapacityProvidersArgs {
    pub cluster_name: Reference,
    pub capacity_providers: Vec<Reference>,
}

/// aws:ecs:TaskDefinition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionArgs {
    pub family: String,
    pub network_mode: String,
    pub requires_compatibilities: Vec<String>,
    pub container_definitions: ContainerDefinitions,
}

/// Container definitions, passed to the provider as a JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDefinitions {
    pub containers: Vec<ContainerDefinition>,

    /// Wrap the document in `fn::secret` so the engine encrypts it in state
    pub secret: bool,
}

impl Serialize for ContainerDefinitions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let json = serde_json::to_string(&self.containers).map_err(serde::ser::Error::custom)?;
        // the document is literal text; `$$` keeps `${..}` away from interpolation
        let literal = json.replace('$', "$$");

        if self.secret {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("fn::secret", &literal)?;
            map.end()
        } else {
            serializer.serialize_str(&literal)
        }
    }
}

/// One entry of an ECS container definitions document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub essential: bool,
    pub memory_reservation: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    pub environment: Vec<EnvironmentVariable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ContainerDependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firelens_configuration: Option<FirelensConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
    pub mount_points: NoEntries,
    pub port_mappings: NoEntries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Startup ordering edge between containers of one task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDependency {
    pub container_name: String,
    pub condition: DependencyCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyCondition {
    Start,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirelensConfiguration {
    #[serde(rename = "type")]
    pub router_type: String,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    pub options: BTreeMap<String, String>,
}

/// A list property that is always sent, and always empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoEntries;

impl Serialize for NoEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(std::iter::empty::<()>())
    }
}

/// aws:ecs:Service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArgs {
    pub name: String,
    pub cluster: Reference,
    pub desired_count: u32,
    pub deployment_minimum_healthy_percent: u32,
    pub task_definition: Reference,
    pub capacity_provider_strategies: Vec<CapacityProviderStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProviderStrategy {
    pub capacity_provider: Reference,
    pub base: u32,
    pub weight: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_definition_wire_names() {
        let container = ContainerDefinition {
            name: "containerb".to_string(),
            image: "alpine:latest".to_string(),
            essential: false,
            memory_reservation: 224,
            command: None,
            environment: vec![EnvironmentVariable::new("A", "1")],
            depends_on: vec![ContainerDependency {
                container_name: "containera".to_string(),
                condition: DependencyCondition::Start,
            }],
            firelens_configuration: None,
            log_configuration: None,
            mount_points: NoEntries,
            port_mappings: NoEntries,
            user: None,
        };

        let json = serde_json::to_value(&container).unwrap();
        assert_eq!(json["memoryReservation"], 224);
        assert_eq!(json["dependsOn"][0]["containerName"], "containera");
        assert_eq!(json["dependsOn"][0]["condition"], "START");
        assert_eq!(json["environment"][0]["name"], "A");
        assert!(json.get("command").is_none());
        assert!(json.get("logConfiguration").is_none());
    }

    #[test]
    fn test_task_definition_embeds_json_document() {
        let args = TaskDefinitionArgs {
            family: "clustera".to_string(),
            network_mode: "bridge".to_string(),
            requires_compatibilities: vec!["EC2".to_string()],
            container_definitions: ContainerDefinitions {
                containers: vec![],
                secret: false,
            },
        };
        let json = serde_json::to_value(ResourceProperties::TaskDefinition(args)).unwrap();
        assert_eq!(json["containerDefinitions"], "[]");
        assert_eq!(json["networkMode"], "bridge");
    }

    fn container_with_command(command: &[&str]) -> ContainerDefinition {
        ContainerDefinition {
            name: "containera".to_string(),
            image: "alpine:latest".to_string(),
            essential: true,
            memory_reservation: 224,
            command: Some(command.iter().map(|c| c.to_string()).collect()),
            environment: vec![EnvironmentVariable::new("TEMPLATE", "${name}")],
            depends_on: vec![],
            firelens_configuration: None,
            log_configuration: None,
            mount_points: NoEntries,
            port_mappings: NoEntries,
            user: None,
        }
    }

    #[test]
    fn test_container_document_escapes_interpolation() {
        let definitions = ContainerDefinitions {
            containers: vec![container_with_command(&["sh", "-c", "echo ${HOME}"])],
            secret: false,
        };

        let raw = serde_json::to_value(&definitions).unwrap();
        let raw = raw.as_str().unwrap();
        assert!(raw.contains("echo $${HOME}"));
        assert!(raw.contains("$${name}"));
        assert!(!raw.contains("echo ${HOME}"));
    }

    #[test]
    fn test_secret_container_document() {
        let definitions = ContainerDefinitions {
            containers: vec![container_with_command(&["true"])],
            secret: true,
        };

        let json = serde_json::to_value(&definitions).unwrap();
        let raw = json["fn::secret"].as_str().unwrap();
        assert!(raw.starts_with('['));
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_lists_are_sent() {
        let json = serde_json::to_value(container_with_command(&["true"])).unwrap();
        assert_eq!(json["mountPoints"], serde_json::json!([]));
        assert_eq!(json["portMappings"], serde_json::json!([]));
    }

    #[test]
    fn test_type_tokens() {
        assert_eq!(ResourceKind::AutoscalingGroup.type_token(), "aws:autoscaling:Group");
        assert_eq!(
            ResourceKind::ClusterCapacityProviders.to_string(),
            "aws:ecs:ClusterCapacityProviders"
        );
    }
}
