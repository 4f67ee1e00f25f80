//! Core types for process diagrams
//!
//! A diagram is a flat list of elements. Flow nodes (tasks, events,
//! gateways, sub-processes) and connections (sequence flows, message
//! flows) live side by side; a connection is simply an element that
//! carries a `source` and a `target`. Incoming and outgoing lists are
//! derived from those references rather than stored twice.

use serde::{Deserialize, Serialize};

use crate::metadata::MetadataBlock;

/// Unique identifier for an element
pub type ElementId = String;

/// Well-known element type tags
pub mod element_types {
    pub const START_EVENT: &str = "StartEvent";
    pub const END_EVENT: &str = "EndEvent";
    pub const BOUNDARY_EVENT: &str = "BoundaryEvent";
    pub const TASK: &str = "Task";
    pub const USER_TASK: &str = "UserTask";
    pub const SERVICE_TASK: &str = "ServiceTask";
    pub const EXCLUSIVE_GATEWAY: &str = "ExclusiveGateway";
    pub const PARALLEL_GATEWAY: &str = "ParallelGateway";
    pub const SUB_PROCESS: &str = "SubProcess";
    pub const SEQUENCE_FLOW: &str = "SequenceFlow";
}

const FLOW_NODE_SUFFIXES: [&str; 4] = ["Task", "Event", "Gateway", "SubProcess"];

/// Shape geometry
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A node or connection in the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier within the diagram
    pub id: ElementId,
    /// Type tag (e.g. "Task", "StartEvent", "SequenceFlow")
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Geometry (shapes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Source element (connections only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ElementId>,
    /// Target element (connections only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
    /// Host element of a boundary event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to_ref: Option<ElementId>,
    /// Condition on a sequence flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Custom extension records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_elements: Option<MetadataBlock>,
}

impl Element {
    /// Create a bare element with the given id and type tag
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            name: None,
            bounds: None,
            source: None,
            target: None,
            attached_to_ref: None,
            condition_expression: None,
            extension_elements: None,
        }
    }

    /// Create a connection between two elements
    pub fn connection(
        id: impl Into<String>,
        element_type: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let mut element = Self::new(id, element_type);
        element.source = Some(source.into());
        element.target = Some(target.into());
        element
    }

    pub fn is_type(&self, type_tag: &str) -> bool {
        self.element_type == type_tag
    }

    /// Any task variant (Task, UserTask, ServiceTask, ...)
    pub fn is_task_like(&self) -> bool {
        self.element_type.ends_with("Task")
    }

    /// Tasks, events, gateways and sub-processes
    pub fn is_flow_node(&self) -> bool {
        FLOW_NODE_SUFFIXES
            .iter()
            .any(|suffix| self.element_type.ends_with(suffix))
    }

    pub fn is_boundary_event(&self) -> bool {
        self.attached_to_ref.is_some()
    }

    pub fn is_connection(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// True for a connection without a (non-blank) condition
    pub fn is_unconditional(&self) -> bool {
        self.condition_expression
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A complete process diagram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramGraph {
    /// Unique identifier for this diagram
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// All shapes and connections, in registry order
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl DiagramGraph {
    /// Create a new empty diagram
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// All elements in registry order
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Find an element by ID
    pub fn find_element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Find an element by ID (mutable)
    pub fn find_element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Connections ending at an element
    pub fn incoming<'a>(&'a self, element_id: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.is_connection() && e.target.as_deref() == Some(element_id))
    }

    /// Connections starting at an element
    pub fn outgoing<'a>(&'a self, element_id: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.is_connection() && e.source.as_deref() == Some(element_id))
    }

    /// Task-like elements in registry order
    pub fn tasks(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_task_like())
    }

    /// Count elements with an exact type tag
    pub fn count_of_type(&self, type_tag: &str) -> usize {
        self.elements.iter().filter(|e| e.is_type(type_tag)).count()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
