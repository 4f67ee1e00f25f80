//! Structural rules and the rule registry
//!
//! A rule inspects the diagram and reports violations. Rules never see
//! each other's output, so they can be reordered or switched off freely
//! through `RuleConfig`.
//!
//! # Usage
//!
//! ```ignore
//! use process_engine::{RuleRegistry, Violation};
//!
//! let mut registry = RuleRegistry::with_builtin_rules();
//! registry.register_fn("no-empty-diagram", |graph| {
//!     Ok(if graph.is_empty() {
//!         vec![Violation::global("Diagram is empty")]
//!     } else {
//!         vec![]
//!     })
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{element_types, DiagramGraph};

/// Rule identifiers of the built-in rule set
pub mod rule_ids {
    pub const START_EVENT_REQUIRED: &str = "start-event-required";
    pub const END_EVENT_REQUIRED: &str = "end-event-required";
    pub const NO_ORPHAN_ELEMENTS: &str = "no-orphan-elements";
    pub const TASK_MULTIPLE_OUTGOING: &str = "task-multiple-outgoing";
}

/// One detected rule failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// `None` for diagram-wide findings
    pub element_id: Option<String>,
    pub message: String,
}

impl Violation {
    /// A violation tied to an element
    pub fn at(element_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element_id: Some(element_id.into()),
            message: message.into(),
        }
    }

    /// A diagram-wide violation
    pub fn global(message: impl Into<String>) -> Self {
        Self {
            element_id: None,
            message: message.into(),
        }
    }
}

/// A structural check over the diagram
pub trait Rule: Send + Sync {
    /// Stable identifier, used as the key in `RuleConfig`
    fn id(&self) -> &str;

    /// Inspect the graph
    ///
    /// Returning `Err` makes the orchestrator skip this rule for the
    /// current pass; other rules still run.
    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>>;
}

/// Requires at least one StartEvent
pub struct StartEventRequired;

impl Rule for StartEventRequired {
    fn id(&self) -> &str {
        rule_ids::START_EVENT_REQUIRED
    }

    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>> {
        if graph.count_of_type(element_types::START_EVENT) == 0 {
            Ok(vec![Violation::global("Process has no start event")])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Requires at least one EndEvent
pub struct EndEventRequired;

impl Rule for EndEventRequired {
    fn id(&self) -> &str {
        rule_ids::END_EVENT_REQUIRED
    }

    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>> {
        if graph.count_of_type(element_types::END_EVENT) == 0 {
            Ok(vec![Violation::global("Process has no end event")])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Flags flow nodes that are not connected to anything
///
/// Start and end events and boundary events are exempt: the first two
/// legitimately have one side open, boundary events hang off their host.
pub struct NoOrphanElements;

impl Rule for NoOrphanElements {
    fn id(&self) -> &str {
        rule_ids::NO_ORPHAN_ELEMENTS
    }

    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>> {
        let violations = graph
            .all_elements()
            .filter(|e| e.is_flow_node())
            .filter(|e| {
                !e.is_type(element_types::START_EVENT) && !e.is_type(element_types::END_EVENT)
            })
            .filter(|e| !e.is_boundary_event())
            .filter(|e| {
                graph.incoming(&e.id).next().is_none() && graph.outgoing(&e.id).next().is_none()
            })
            .map(|e| {
                Violation::at(
                    &e.id,
                    format!("'{}' is not connected to the process flow", e.label()),
                )
            })
            .collect();
        Ok(violations)
    }
}

/// Flags tasks that fork through more than one unconditional sequence flow
pub struct TaskMultipleOutgoing;

impl Rule for TaskMultipleOutgoing {
    fn id(&self) -> &str {
        rule_ids::TASK_MULTIPLE_OUTGOING
    }

    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for task in graph.tasks() {
            let unconditional = graph
                .outgoing(&task.id)
                .filter(|flow| flow.is_type(element_types::SEQUENCE_FLOW))
                .filter(|flow| flow.is_unconditional())
                .count();

            if unconditional > 1 {
                violations.push(Violation::at(
                    &task.id,
                    format!(
                        "'{}' has {} unconditional outgoing flows; use a gateway to split the flow",
                        task.label(),
                        unconditional
                    ),
                ));
            }
        }
        Ok(violations)
    }
}

/// Rule backed by a closure
pub struct FnRule {
    id: String,
    check: Box<dyn Fn(&DiagramGraph) -> Result<Vec<Violation>> + Send + Sync>,
}

impl FnRule {
    pub fn new(
        id: impl Into<String>,
        check: impl Fn(&DiagramGraph) -> Result<Vec<Violation>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            check: Box::new(check),
        }
    }
}

impl Rule for FnRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn check(&self, graph: &DiagramGraph) -> Result<Vec<Violation>> {
        (self.check)(graph)
    }
}

/// Registry mapping rule IDs to implementations
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in rules
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(StartEventRequired));
        registry.register(Arc::new(EndEventRequired));
        registry.register(Arc::new(NoOrphanElements));
        registry.register(Arc::new(TaskMultipleOutgoing));
        registry
    }

    /// Register a rule, replacing any rule with the same ID
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.insert(rule.id().to_string(), rule);
    }

    /// Register a closure as a rule
    pub fn register_fn<F>(&mut self, id: impl Into<String>, check: F)
    where
        F: Fn(&DiagramGraph) -> Result<Vec<Violation>> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnRule::new(id, check)));
    }

    pub fn get(&self, rule_id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(rule_id)
    }

    pub fn has_rule(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// Registered rule IDs, sorted
    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Merge another registry into this one
    ///
    /// Rules from `other` override rules in `self` with the same ID.
    pub fn merge(&mut self, other: RuleRegistry) {
        self.rules.extend(other.rules);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}
