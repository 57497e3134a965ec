/// Resource declarations and the dependency graph between them
use serde::{Serialize, Serializer};
use std::fmt;

use crate::aws::models::{ResourceKind, ResourceProperties};
use crate::error::{Error, Result};

/// Logical identifier of a declaration, unique within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whole-resource interpolation, as used in `dependsOn`
    pub fn interpolation(&self) -> String {
        format!("${{{}}}", self.0)
    }

    /// Reference to one of this resource's outputs
    pub fn output(&self, attribute: &'static str) -> Reference {
        Reference {
            resource: self.clone(),
            attribute,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An output of another declaration, resolved by the engine at apply time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub resource: ResourceId,
    pub attribute: &'static str,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.resource, self.attribute)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single resource to be created by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: ResourceId,

    /// Resource name handed to the engine
    pub name: String,

    /// Owning table entry; `None` for shared resources
    pub cluster: Option<String>,

    pub properties: ResourceProperties,

    /// Explicit prerequisites, in declaration order
    pub depends_on: Vec<ResourceId>,
}

impl Declaration {
    pub fn kind(&self) -> ResourceKind {
        self.properties.kind()
    }

    /// Explicit prerequisites followed by any resource referenced only through outputs
    pub fn prerequisites(&self) -> Vec<&ResourceId> {
        let mut prerequisites: Vec<&ResourceId> = self.depends_on.iter().collect();
        for reference in self.properties.references() {
            if !prerequisites.contains(&&reference.resource) {
                prerequisites.push(&reference.resource);
            }
        }
        prerequisites
    }
}

/// Declarations in insertion order; insertion order is a topological order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGraph {
    declarations: Vec<Declaration>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration whose prerequisites are all already present
    pub fn push(&mut self, declaration: Declaration) -> Result<ResourceId> {
        if self.contains(&declaration.id) {
            return Err(Error::DuplicateResource(declaration.id));
        }

        if let Some(missing) = declaration
            .prerequisites()
            .into_iter()
            .find(|id| !self.contains(id))
        {
            return Err(Error::UnknownDependency {
                resource: declaration.id.clone(),
                missing: missing.clone(),
            });
        }

        let id = declaration.id.clone();
        self.declarations.push(declaration);
        Ok(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Declaration> {
        self.declarations.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declarations that list `id` as a prerequisite
    pub fn dependents_of<'a>(&'a self, id: &'a ResourceId) -> impl Iterator<Item = &'a Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.prerequisites().contains(&id))
    }

    /// Declarations owned by one table entry
    pub fn for_cluster<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.cluster.as_deref() == Some(cluster))
    }

    /// Declarations shared by every cluster
    pub fn shared(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| d.cluster.is_none())
    }
}
