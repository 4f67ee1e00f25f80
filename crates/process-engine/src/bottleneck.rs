//! Bottleneck highlighting
//!
//! Marks the task(s) with the longest duration so the host can color them.

use serde::{Deserialize, Serialize};

use crate::canvas::{markers, Canvas};
use crate::tasks::TaskRecord;
use crate::types::{DiagramGraph, ElementId};

/// Which tasks count as bottlenecks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckPolicy {
    /// The single task with the strictly highest duration; ties go to the
    /// first task in diagram order
    #[default]
    HighestDuration,
    /// Every task strictly above the mean duration
    AboveAverage,
}

/// Parse an "HH:MM" duration into minutes
///
/// Blank input or anything that does not split into exactly two parts is
/// zero. A part that is not a number counts as zero. Signed parts are
/// accepted; a negative total is zero.
pub fn parse_duration(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let parts: Vec<&str> = text.split(':').collect();
    let [hours, minutes] = parts.as_slice() else {
        return 0;
    };

    let hours: i64 = hours.trim().parse().unwrap_or(0);
    let minutes: i64 = minutes.trim().parse().unwrap_or(0);
    let total = hours.saturating_mul(60).saturating_add(minutes);
    if total <= 0 {
        return 0;
    }
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Select bottleneck task IDs according to the policy
///
/// Only tasks with a positive duration are candidates.
pub fn find_bottlenecks(tasks: &[TaskRecord], policy: BottleneckPolicy) -> Vec<ElementId> {
    let timed: Vec<(&str, u32)> = tasks
        .iter()
        .map(|t| (t.task_id.as_str(), parse_duration(&t.duration)))
        .filter(|(_, minutes)| *minutes > 0)
        .collect();

    if timed.is_empty() {
        return Vec::new();
    }

    match policy {
        BottleneckPolicy::HighestDuration => {
            let mut best = timed[0];
            for candidate in &timed[1..] {
                if candidate.1 > best.1 {
                    best = *candidate;
                }
            }
            vec![best.0.to_string()]
        }
        BottleneckPolicy::AboveAverage => {
            let total: u64 = timed.iter().map(|(_, m)| u64::from(*m)).sum();
            let count = timed.len() as u64;
            // minutes > total / count, without rounding
            timed
                .iter()
                .filter(|(_, m)| u64::from(*m) * count > total)
                .map(|(id, _)| id.to_string())
                .collect()
        }
    }
}

/// Mark bottleneck tasks on the canvas
///
/// Previous bottleneck markers on task-like elements are cleared first.
/// Returns the IDs that were marked.
pub fn apply_bottleneck_colors(
    graph: &DiagramGraph,
    canvas: &mut Canvas,
    tasks: &[TaskRecord],
    policy: BottleneckPolicy,
) -> Vec<ElementId> {
    clear_bottleneck_colors(graph, canvas);

    let marked: Vec<ElementId> = find_bottlenecks(tasks, policy)
        .into_iter()
        .filter(|id| graph.find_element(id).is_some())
        .collect();

    for id in &marked {
        canvas.add_marker(id, markers::BOTTLENECK_HIGH);
    }
    if !marked.is_empty() {
        log::debug!("Marked {} bottleneck task(s): {:?}", marked.len(), marked);
    }
    marked
}

/// Remove the bottleneck marker from every task-like element
pub fn clear_bottleneck_colors(graph: &DiagramGraph, canvas: &mut Canvas) {
    for task in graph.tasks() {
        canvas.remove_marker(&task.id, markers::BOTTLENECK_HIGH);
    }
}
