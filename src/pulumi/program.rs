/// Rendering a resource graph as a Pulumi YAML program
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::aws::models::ResourceProperties;
use crate::aws::Expansion;
use crate::config::StackSettings;
use crate::graph::Declaration;

pub const PROGRAM_FILE: &str = "Pulumi.yaml";

/// Map serialized in insertion order
#[derive(Debug, Clone, PartialEq)]
struct OrderedMap<V>(Vec<(String, V)>);

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ProgramResource<'a> {
    #[serde(rename = "type")]
    type_token: &'static str,
    name: &'a str,
    properties: &'a ResourceProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ResourceOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceOptions {
    depends_on: Vec<String>,
}

impl<'a> From<&'a Declaration> for ProgramResource<'a> {
    fn from(declaration: &'a Declaration) -> Self {
        let options = (!declaration.depends_on.is_empty()).then(|| ResourceOptions {
            depends_on: declaration
                .depends_on
                .iter()
                .map(|id| id.interpolation())
                .collect(),
        });

        Self {
            type_token: declaration.kind().type_token(),
            name: &declaration.name,
            properties: &declaration.properties,
            options,
        }
    }
}

/// A complete Pulumi YAML program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program<'a> {
    name: &'a str,
    runtime: &'static str,
    description: String,
    resources: OrderedMap<ProgramResource<'a>>,
    outputs: OrderedMap<String>,
}

impl<'a> Program<'a> {
    pub fn new(settings: &'a StackSettings, expansion: &'a Expansion) -> Self {
        let resources = expansion
            .graph
            .iter()
            .map(|d| (d.id.to_string(), ProgramResource::from(d)))
            .collect();

        let mut outputs = Vec::new();
        for (name, r) in &expansion.clusters {
            outputs.push((format!("{}-cluster-arn", name), r.cluster.output("arn").to_string()));
            outputs.push((
                format!("{}-launch-template-id", name),
                r.launch_template.output("id").to_string(),
            ));
            outputs.push((
                format!("{}-autoscaling-group", name),
                r.autoscaling_group.output("name").to_string(),
            ));
            outputs.push((
                format!("{}-capacity-provider", name),
                r.capacity_provider.output("name").to_string(),
            ));
            outputs.push((
                format!("{}-capacity-providers-cluster", name),
                r.capacity_provider_binding.output("clusterName").to_string(),
            ));
            outputs.push((
                format!("{}-task-definition-arn", name),
                r.task_definition.output("arn").to_string(),
            ));
            outputs.push((format!("{}-service", name), r.service.output("name").to_string()));
        }

        Self {
            name: &settings.project,
            runtime: "yaml",
            description: format!(
                "ECS clusters on spot capacity ({} clusters)",
                expansion.clusters.len()
            ),
            resources: OrderedMap(resources),
            outputs: OrderedMap(outputs),
        }
    }

    /// Render as YAML
    pub fn render(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }
}
