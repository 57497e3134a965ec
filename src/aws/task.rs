/// Task definition containers: log router sidecar plus the two application containers
use std::collections::BTreeMap;

use super::models::{
    ContainerDefinition, ContainerDependency, DependencyCondition, FirelensConfiguration,
    LogConfiguration, NoEntries,
};
use crate::config::{ClusterSpec, ContainerSpec, LoggingSettings};

pub const LOG_ROUTER: &str = "logrouter";
pub const CONTAINER_A: &str = "containera";
pub const CONTAINER_B: &str = "containerb";

const LOG_ROUTER_MEMORY: u32 = 127;
const APP_MEMORY: u32 = 224;

/// Containers of one task, in startup order
pub fn container_definitions(
    cluster: &str,
    spec: &ClusterSpec,
    logging: &LoggingSettings,
) -> Vec<ContainerDefinition> {
    let log_router = ContainerDefinition {
        name: LOG_ROUTER.to_string(),
        image: logging.router_image.clone(),
        essential: true,
        memory_reservation: LOG_ROUTER_MEMORY,
        command: None,
        environment: vec![],
        depends_on: vec![],
        firelens_configuration: Some(FirelensConfiguration {
            router_type: "fluentbit".to_string(),
            options: [("enable-ecs-log-metadata".to_string(), "true".to_string())]
                .into_iter()
                .collect(),
        }),
        log_configuration: None,
        mount_points: NoEntries,
        port_mappings: NoEntries,
        user: Some("0".to_string()),
    };

    let mut containera = app_container(CONTAINER_A, &spec.containera, LOG_ROUTER);
    containera.essential = true;
    containera.log_configuration = Some(loki_log_configuration(cluster, logging));

    let mut containerb = app_container(CONTAINER_B, &spec.containerb, CONTAINER_A);
    containerb.essential = false;

    vec![log_router, containera, containerb]
}

fn app_container(name: &str, spec: &ContainerSpec, after: &str) -> ContainerDefinition {
    ContainerDefinition {
        name: name.to_string(),
        image: spec.image_ref(),
        essential: false,
        memory_reservation: APP_MEMORY,
        command: spec.command.clone(),
        environment: spec.sorted_envars(),
        depends_on: vec![ContainerDependency {
            container_name: after.to_string(),
            condition: DependencyCondition::Start,
        }],
        firelens_configuration: None,
        log_configuration: None,
        mount_points: NoEntries,
        port_mappings: NoEntries,
        user: None,
    }
}

/// Firelens output to Loki, labelled with the cluster as job
fn loki_log_configuration(cluster: &str, logging: &LoggingSettings) -> LogConfiguration {
    let options: BTreeMap<String, String> = [
        ("Name", "grafana-loki".to_string()),
        ("Url", logging.resolved_url()),
        ("Labels", format!("{{job=\"{}\"}}", cluster)),
        ("RemoveKeys", "container_id,ecs_task_arn".to_string()),
        (
            "LabelKeys",
            "container_name,ecs_task_definition,source,ecs_cluster".to_string(),
        ),
        ("LineFormat", "key_value".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    LogConfiguration {
        log_driver: "awsfirelens".to_string(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;

    fn containers() -> Vec<ContainerDefinition> {
        let config = ClusterConfig::example();
        let spec = config.clusters.get("clustera").unwrap();
        container_definitions("clustera", spec, &config.settings.logging)
    }

    #[test]
    fn test_container_order_and_startup_edges() {
        let containers = containers();
        let names: Vec<_> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![LOG_ROUTER, CONTAINER_A, CONTAINER_B]);

        assert!(containers[0].depends_on.is_empty());
        for (container, upstream) in containers[1..].iter().zip(&names) {
            assert_eq!(container.depends_on.len(), 1);
            assert_eq!(container.depends_on[0].container_name, *upstream);
            assert_eq!(container.depends_on[0].condition, DependencyCondition::Start);
        }
    }

    #[test]
    fn test_essential_flags() {
        let containers = containers();
        assert!(containers[0].essential);
        assert!(containers[1].essential);
        assert!(!containers[2].essential);
    }

    #[test]
    fn test_only_containera_forwards_logs() {
        let containers = containers();
        assert!(containers[0].log_configuration.is_none());
        assert!(containers[2].log_configuration.is_none());

        let log = containers[1].log_configuration.as_ref().unwrap();
        assert_eq!(log.log_driver, "awsfirelens");
        assert_eq!(log.options["Labels"], "{job=\"clustera\"}");
        assert_eq!(log.options["Name"], "grafana-loki");
        assert_eq!(log.options["LineFormat"], "key_value");

        let firelens = containers[0].firelens_configuration.as_ref().unwrap();
        assert_eq!(firelens.router_type, "fluentbit");
        assert_eq!(containers[0].user.as_deref(), Some("0"));
    }

    #[test]
    fn test_environment_sorted() {
        let containers = containers();
        for container in &containers[1..] {
            let names: Vec<_> = container.environment.iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names, vec!["SOME_ENVA", "SOME_ENVB"]);
        }
        assert!(containers[0].environment.is_empty());
    }

    #[test]
    fn test_missing_command_uses_entrypoint() {
        let mut config = ClusterConfig::example();
        let mut spec = config.clusters.get("clustera").unwrap().clone();
        spec.containerb.command = None;
        config.settings.logging.router_image = "fluent-bit:custom".to_string();

        let containers = container_definitions("clustera", &spec, &config.settings.logging);
        assert_eq!(containers[0].image, "fluent-bit:custom");
        assert!(containers[2].command.is_none());
        assert_eq!(containers[1].image, "alpine:latest");
        assert_eq!(
            containers[1].command.as_deref(),
            Some(&["sleep".to_string(), "1000".to_string()][..])
        );
    }
}
