/// Cluster table: the hand-authored clusters and their two containers
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

/// A single environment variable passed to a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One application container of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image repository (e.g., "alpine")
    #[serde(default = "default_image")]
    pub image: String,

    /// Image tag
    pub version: String,

    /// Command override; the image entrypoint runs when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Environment variables, in authoring order
    #[serde(default)]
    pub envars: Vec<EnvironmentVariable>,
}

fn default_image() -> String {
    "alpine".to_string()
}

impl ContainerSpec {
    /// Full image reference
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.version)
    }

    /// Environment sorted by name (stable, ordinal)
    pub fn sorted_envars(&self) -> Vec<EnvironmentVariable> {
        let mut envars = self.envars.clone();
        envars.sort_by(|a, b| a.name.cmp(&b.name));
        envars
    }

    /// First environment variable name that appears more than once
    fn duplicate_envar(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.envars
            .iter()
            .map(|e| e.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// The two containers every cluster runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub containera: ContainerSpec,
    pub containerb: ContainerSpec,
}

/// A named table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEntry {
    pub name: String,
    pub spec: ClusterSpec,
}

/// Clusters in authoring order, keyed by unique name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTable {
    entries: Vec<ClusterEntry>,
}

impl ClusterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cluster, rejecting a name that is already present
    pub fn insert(&mut self, name: impl Into<String>, spec: ClusterSpec) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(Error::DuplicateCluster(name));
        }
        self.entries.push(ClusterEntry { name, spec });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClusterSpec> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check names and per-container environment
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one cluster is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            validate_cluster_name(&entry.name)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::DuplicateCluster(entry.name.clone()));
            }

            for (role, container) in [
                ("containera", &entry.spec.containera),
                ("containerb", &entry.spec.containerb),
            ] {
                if container.version.is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "cluster {}: container {} has an empty version",
                        entry.name, role
                    )));
                }
                if let Some(name) = container.duplicate_envar() {
                    return Err(Error::DuplicateEnvVar {
                        cluster: entry.name.clone(),
                        container: role.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Collects entries as given; `validate` reports repeated names
impl FromIterator<ClusterEntry> for ClusterTable {
    fn from_iter<I: IntoIterator<Item = ClusterEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// ECS cluster names: 1-255 letters, digits, hyphens and underscores
fn validate_cluster_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 255 {
        return Err(Error::InvalidConfig(format!(
            "cluster name must be 1-255 characters: {:?}",
            name
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidConfig(format!(
            "cluster name may only contain letters, digits, '-' and '_': {}",
            name
        )));
    }
    Ok(())
}

impl Serialize for ClusterTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClusterTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ClusterTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping from cluster name to cluster spec")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut table = ClusterTable::new();
                while let Some((name, spec)) = access.next_entry::<String, ClusterSpec>()? {
                    table.insert(name, spec).map_err(serde::de::Error::custom)?;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
