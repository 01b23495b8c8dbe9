//! JSON batch input format
//!
//! A batch file holds a shared node table and a list of load instances.
//! Elements reference nodes by id; an instance without an `outline` takes the
//! outer boundary of its elements as the loaded surface.

use crate::engine::{BatchEntry, LoadInstance, RejectedInstance, SurfaceSource};
use crate::error::{AreaLoadError, Result};
use crate::loads::{LoadDefinition, LoadDefinitionConfig};
use crate::mesh::{EdgeId, ElementId, ElementTopology, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct JsonBatch {
    #[serde(default)]
    nodes: BTreeMap<NodeId, [f64; 3]>,
    instances: Vec<JsonInstance>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonInstance {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outline: Option<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    free_edges: Vec<EdgeId>,
    load: LoadDefinitionConfig,
    #[serde(default)]
    elements: Vec<JsonElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonElement {
    id: ElementId,
    nodes: Vec<NodeId>,
}

/// Read a batch file
///
/// Malformed JSON fails the whole file. A load definition that does not
/// validate only rejects its own instance.
pub fn read_batch<P: AsRef<Path>>(path: P) -> Result<Vec<BatchEntry>> {
    let file = File::open(path.as_ref())?;

    let reader = BufReader::new(file);
    let batch: JsonBatch = serde_json::from_reader(reader).map_err(|e| {
        AreaLoadError::ConfigError(format!("Failed to parse JSON batch: {}", e))
    })?;

    log::info!(
        "Read {} nodes and {} instances from {}",
        batch.nodes.len(),
        batch.instances.len(),
        path.as_ref().display()
    );

    Ok(batch
        .instances
        .into_iter()
        .map(|instance| convert_instance(instance, &batch.nodes))
        .collect())
}

fn convert_instance(instance: JsonInstance, nodes: &BTreeMap<NodeId, [f64; 3]>) -> BatchEntry {
    let case_id = instance.load.case_id.clone();
    let category = instance.load.category;
    let load = match LoadDefinition::try_from(instance.load) {
        Ok(load) => load,
        Err(error) => {
            log::warn!("Rejecting instance '{}': {}", instance.name, error);
            return Err(RejectedInstance {
                name: instance.name,
                case_id,
                category,
                error,
            });
        }
    };

    let source = match instance.outline {
        Some(outline) => SurfaceSource::Outline(
            outline
                .into_iter()
                .map(|[x, y, z]| Point::new(x, y, z))
                .collect(),
        ),
        None => SurfaceSource::Elements,
    };

    // Unknown node ids leave the element short of positions; the mapper
    // reports it instead of failing the whole batch.
    let elements = instance
        .elements
        .into_iter()
        .map(|element| {
            let positions = element
                .nodes
                .iter()
                .filter_map(|id| nodes.get(id))
                .map(|&[x, y, z]| Point::new(x, y, z))
                .collect();
            ElementTopology::new(element.id, element.nodes, positions)
        })
        .collect();

    Ok(LoadInstance::new(&instance.name, source, load, elements).with_free_edges(instance.free_edges))
}

pub fn write_batch<P: AsRef<Path>>(instances: &[LoadInstance], path: P) -> Result<()> {
    let mut nodes = BTreeMap::new();
    for element in instances.iter().flat_map(|i| &i.elements) {
        for (id, p) in element.node_ids.iter().zip(&element.positions) {
            nodes.insert(*id, [p.x, p.y, p.z]);
        }
    }

    let batch = JsonBatch {
        nodes,
        instances: instances
            .iter()
            .map(|instance| JsonInstance {
                name: instance.name.clone(),
                outline: match &instance.source {
                    SurfaceSource::Outline(vertices) => {
                        Some(vertices.iter().map(|p| [p.x, p.y, p.z]).collect())
                    }
                    SurfaceSource::Elements => None,
                },
                free_edges: instance.free_edges.clone(),
                load: LoadDefinitionConfig::from(&instance.load),
                elements: instance
                    .elements
                    .iter()
                    .map(|e| JsonElement {
                        id: e.id,
                        nodes: e.node_ids.clone(),
                    })
                    .collect(),
            })
            .collect(),
    };

    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &batch).map_err(|e| {
        AreaLoadError::ConfigError(format!("Failed to write JSON batch: {}", e))
    })?;

    Ok(())
}
