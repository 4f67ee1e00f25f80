//! Task metadata extraction and write-back
//!
//! Task records are the flat, serializable view of task-like elements that
//! the host exchanges with its data store. Extraction reads the task
//! metrics record of each task; updating upserts that record and commits
//! the changed blocks through the modeler so that the change lands on the
//! command stack like any other edit.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::metadata::MetadataBlock;
use crate::modeler::Modeler;
use crate::types::{DiagramGraph, ElementId};

/// What a stringified object looks like after a lossy upstream round trip
const OBJECT_SENTINEL: &str = "[object Object]";

/// Flat view of a task-like element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Element ID
    pub task_id: String,
    #[serde(default)]
    pub name: String,
    /// Element type tag
    #[serde(rename = "type", default)]
    pub task_type: String,
    /// "HH:MM" or empty
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: String,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            name: String::new(),
            task_type: String::new(),
            duration: duration.into(),
        }
    }
}

/// Accept any JSON value for a duration
///
/// Strings are kept, numbers and booleans are stringified, everything else
/// becomes empty.
fn lenient_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

/// Normalize an incoming duration value
///
/// Blank input and the stringified-object sentinel become empty.
pub fn sanitize_duration(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == OBJECT_SENTINEL {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Read a task record for every task-like element, in diagram order
pub fn extract_tasks(graph: &DiagramGraph) -> Vec<TaskRecord> {
    graph
        .tasks()
        .map(|element| TaskRecord {
            task_id: element.id.clone(),
            name: element.name.clone().unwrap_or_default(),
            task_type: element.element_type.clone(),
            duration: element
                .extension_elements
                .as_ref()
                .and_then(MetadataBlock::task_metrics)
                .map(|metrics| metrics.duration.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Compute the metadata blocks that result from applying `records`
///
/// Returns `(element_id, new_block)` for every element whose block would
/// change. Records for unknown elements are skipped. The graph itself is
/// not touched.
pub fn plan_task_updates(
    graph: &DiagramGraph,
    records: &[TaskRecord],
) -> Vec<(ElementId, MetadataBlock)> {
    let mut planned: Vec<(ElementId, MetadataBlock)> = Vec::new();

    for record in records {
        let Some(element) = graph.find_element(&record.task_id) else {
            log::debug!("Skipping task record for unknown element '{}'", record.task_id);
            continue;
        };

        // A later record for the same element builds on the earlier one
        let current = planned
            .iter()
            .rev()
            .find(|(id, _)| *id == element.id)
            .map(|(_, block)| block.clone())
            .or_else(|| element.extension_elements.clone());

        let mut block = current.clone().unwrap_or_default();
        let duration = sanitize_duration(&record.duration);
        block.update_task_metrics(|m| m.duration = duration);

        if current.as_ref() != Some(&block) {
            planned.retain(|(id, _)| *id != element.id);
            planned.push((element.id.clone(), block));
        }
    }

    planned
}

/// Upsert task records directly into a graph, bypassing the command stack
///
/// Returns the IDs of the elements that changed.
pub fn apply_task_records(graph: &mut DiagramGraph, records: &[TaskRecord]) -> Vec<ElementId> {
    let planned = plan_task_updates(graph, records);
    let mut changed = Vec::with_capacity(planned.len());
    for (element_id, block) in planned {
        if let Some(element) = graph.find_element_mut(&element_id) {
            element.extension_elements = Some(block);
            changed.push(element_id);
        }
    }
    changed
}

/// Write task records back into the modeler's diagram
///
/// All changes are committed as a single property-update transaction.
/// Returns the number of elements that changed.
pub fn update_tasks(modeler: &mut Modeler, records: &[TaskRecord]) -> Result<usize> {
    let planned = plan_task_updates(modeler.graph()?, records);
    let count = planned.len();
    if count > 0 {
        modeler.update_properties_batch(planned)?;
    }
    Ok(count)
}
