/// AWS resource declarations for ECS clusters on spot capacity
pub mod cluster;
pub mod models;
pub mod network;
pub mod task;
pub mod user_data;

pub use cluster::{ClusterBuilder, ClusterResources};
pub use network::{declare_shared_network, SharedNetwork};

use tracing::info;

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::graph::ResourceGraph;

/// Everything declared for a configuration
#[derive(Debug, Clone)]
pub struct Expansion {
    pub graph: ResourceGraph,
    pub network: SharedNetwork,
    /// Per-cluster ids, in table order
    pub clusters: Vec<(String, ClusterResources)>,
}

/// Expand the cluster table into declarations: shared network first,
/// then each entry in table order
pub fn expand(config: &ClusterConfig) -> Result<Expansion> {
    let mut graph = ResourceGraph::new();
    let network = declare_shared_network(&mut graph, &config.settings)?;

    let builder = ClusterBuilder::new(&config.settings, &network);
    let mut clusters = Vec::with_capacity(config.clusters.len());
    for entry in config.clusters.iter() {
        info!("Expanding cluster: {}", entry.name);
        let resources = builder.declare(&mut graph, entry)?;
        clusters.push((entry.name.clone(), resources));
    }

    info!(
        "Declared {} resources for {} clusters in VPC {}",
        graph.len(),
        clusters.len(),
        network.vpc
    );

    Ok(Expansion {
        graph,
        network,
        clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterSpec, ClusterTable};
    use std::collections::HashSet;

    #[test]
    fn test_expand_example() {
        let config = ClusterConfig::example();
        let expansion = expand(&config).unwrap();

        assert_eq!(expansion.graph.len(), 3 + 2 * 7);
        let names: Vec<_> = expansion.clusters.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["clustera", "clusterb"]);
    }

    #[test]
    fn test_clusters_are_independent() {
        let config = ClusterConfig::example();
        let expansion = expand(&config).unwrap();
        let graph = &expansion.graph;
        let shared: HashSet<_> = graph.shared().map(|d| d.id.clone()).collect();
        assert_eq!(shared.len(), 3);

        for (name, _) in &expansion.clusters {
            let own: HashSet<_> = graph.for_cluster(name).map(|d| d.id.clone()).collect();
            for declaration in graph.for_cluster(name) {
                for id in declaration.prerequisites() {
                    assert!(
                        own.contains(id) || shared.contains(id),
                        "{} in {} depends on foreign {}",
                        declaration.id,
                        name,
                        id
                    );
                }
            }
        }

        // every cluster touches the shared network
        for (name, resources) in &expansion.clusters {
            let cluster = graph.get(&resources.cluster).unwrap();
            assert!(cluster.depends_on.contains(&expansion.network.subnet), "{}", name);
        }
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let config = ClusterConfig::example();
        assert_eq!(expand(&config).unwrap().graph, expand(&config).unwrap().graph);
    }

    #[test]
    fn test_table_order_drives_declaration_order() {
        let example = ClusterConfig::example();
        let spec: ClusterSpec = example.clusters.get("clustera").unwrap().clone();

        let mut clusters = ClusterTable::new();
        clusters.insert("zulu", spec.clone()).unwrap();
        clusters.insert("alpha", spec).unwrap();
        let config = ClusterConfig {
            settings: example.settings,
            clusters,
        };

        let expansion = expand(&config).unwrap();
        let owners: Vec<_> = expansion
            .graph
            .iter()
            .filter_map(|d| d.cluster.as_deref())
            .collect();
        assert_eq!(owners.first(), Some(&"zulu"));
        assert_eq!(owners.last(), Some(&"alpha"));
    }
}
