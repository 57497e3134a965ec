/// Per-cluster resource chain
use tracing::debug;

use super::models::*;
use super::network::SharedNetwork;
use super::{task, user_data};
use crate::config::{ClusterEntry, StackSettings};
use crate::error::Result;
use crate::graph::{Declaration, ResourceGraph, ResourceId};

/// Ids of everything declared for one table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterResources {
    pub cluster: ResourceId,
    pub launch_template: ResourceId,
    pub autoscaling_group: ResourceId,
    pub capacity_provider: ResourceId,
    pub capacity_provider_binding: ResourceId,
    pub task_definition: ResourceId,
    pub service: ResourceId,
}

/// Declares the resources of table entries against a shared network
pub struct ClusterBuilder<'a> {
    settings: &'a StackSettings,
    network: &'a SharedNetwork,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(settings: &'a StackSettings, network: &'a SharedNetwork) -> Self {
        Self { settings, network }
    }

    fn declaration(
        &self,
        entry: &ClusterEntry,
        suffix: &str,
        properties: ResourceProperties,
        depends_on: Vec<ResourceId>,
    ) -> Declaration {
        Declaration {
            id: ResourceId::new(format!("{}-{}", entry.name, suffix)),
            name: entry.name.clone(),
            cluster: Some(entry.name.clone()),
            properties,
            depends_on,
        }
    }

    /// Declare cluster, launch template, autoscaling group, capacity provider,
    /// binding, task definition and service for one entry
    pub fn declare(&self, graph: &mut ResourceGraph, entry: &ClusterEntry) -> Result<ClusterResources> {
        let name = entry.name.as_str();
        let subnet = &self.network.subnet;
        let security_group = &self.network.security_group;
        let instance = &self.settings.instance;

        let cluster = graph.push(self.declaration(
            entry,
            "cluster",
            ResourceProperties::EcsCluster(EcsClusterArgs {
                name: name.to_string(),
                settings: vec![ClusterSetting {
                    name: "containerInsights".to_string(),
                    value: "disabled".to_string(),
                }],
            }),
            vec![security_group.clone(), subnet.clone()],
        ))?;

        let launch_template = graph.push(self.declaration(
            entry,
            "launch-template",
            ResourceProperties::LaunchTemplate(LaunchTemplateArgs {
                name: name.to_string(),
                image_id: instance.ami.clone(),
                instance_type: instance.instance_type.clone(),
                block_device_mappings: vec![BlockDeviceMapping {
                    device_name: "/dev/sda1".to_string(),
                    ebs: EbsVolume {
                        iops: 3000,
                        volume_size: instance.volume_size_gib,
                        throughput: 125,
                        volume_type: "gp3".to_string(),
                        delete_on_termination: "true".to_string(),
                    },
                }],
                network_interfaces: vec![NetworkInterface {
                    associate_public_ip_address: "true".to_string(),
                    security_groups: vec![security_group.output("id")],
                    subnet_id: subnet.output("id"),
                }],
                instance_market_options: InstanceMarketOptions {
                    market_type: "spot".to_string(),
                    spot_options: SpotOptions {
                        max_price: instance.spot_max_price.clone(),
                    },
                },
                update_default_version: true,
                user_data: user_data::encoded(name)?,
            }),
            vec![cluster.clone()],
        ))?;

        // Capacity is adjusted outside this tool; declare it empty.
        let autoscaling_group = graph.push(self.declaration(
            entry,
            "asg",
            ResourceProperties::AutoscalingGroup(AutoscalingGroupArgs {
                name: name.to_string(),
                availability_zones: vec![self.settings.availability_zone.clone()],
                launch_template: LaunchTemplateSpecification {
                    id: launch_template.output("id"),
                },
                desired_capacity: 0,
                min_size: 0,
                max_size: 0,
                tags: vec![GroupTag {
                    key: "Name".to_string(),
                    value: name.to_string(),
                    propagate_at_launch: true,
                }],
            }),
            vec![launch_template.clone(), subnet.clone(), security_group.clone()],
        ))?;

        let capacity_provider = graph.push(self.declaration(
            entry,
            "capacity-provider",
            ResourceProperties::CapacityProvider(CapacityProviderArgs {
                name: name.to_string(),
                auto_scaling_group_provider: AutoScalingGroupProvider {
                    auto_scaling_group_arn: autoscaling_group.output("arn"),
                    managed_termination_protection: "DISABLED".to_string(),
                },
            }),
            vec![autoscaling_group.clone()],
        ))?;

        let capacity_provider_binding = graph.push(self.declaration(
            entry,
            "capacity-providers",
            ResourceProperties::ClusterCapacityProviders(ClusterCapacityProvidersArgs {
                cluster_name: cluster.output("name"),
                capacity_providers: vec![capacity_provider.output("name")],
            }),
            vec![cluster.clone(), capacity_provider.clone()],
        ))?;

        let task_definition = graph.push(self.declaration(
            entry,
            "task-definition",
            ResourceProperties::TaskDefinition(TaskDefinitionArgs {
                family: name.to_string(),
                network_mode: "bridge".to_string(),
                requires_compatibilities: vec!["EC2".to_string()],
                container_definitions: ContainerDefinitions {
                    containers: task::container_definitions(
                        name,
                        &entry.spec,
                        &self.settings.logging,
                    ),
                    secret: self.settings.logging.has_credentials(),
                },
            }),
            vec![security_group.clone(), subnet.clone()],
        ))?;

        let service = graph.push(self.declaration(
            entry,
            "service",
            ResourceProperties::Service(ServiceArgs {
                name: name.to_string(),
                cluster: cluster.output("arn"),
                desired_count: 1,
                deployment_minimum_healthy_percent: 0,
                task_definition: task_definition.output("arn"),
                capacity_provider_strategies: vec![CapacityProviderStrategy {
                    capacity_provider: capacity_provider.output("name"),
                    base: 1,
                    weight: 1,
                }],
            }),
            vec![
                cluster.clone(),
                capacity_provider.clone(),
                autoscaling_group.clone(),
                subnet.clone(),
                security_group.clone(),
            ],
        ))?;

        debug!("Declared resources for cluster {}", name);

        Ok(ClusterResources {
            cluster,
            launch_template,
            autoscaling_group,
            capacity_provider,
            capacity_provider_binding,
            task_definition,
            service,
        })
    }
}
