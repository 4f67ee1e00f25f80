//! Fluent builder for process diagrams
//!
//! Provides a compact way to construct diagrams programmatically.

use crate::metadata::{ExtensionRecord, MetadataBlock, TaskMetrics};
use crate::types::{element_types, Bounds, DiagramGraph, Element};

/// Fluent builder for constructing process diagrams
///
/// # Example
///
/// ```ignore
/// let graph = DiagramBuilder::new("proc-1", "Order handling")
///     .add_start_event("start")
///     .add_task("check", "Check order")
///     .with_duration("00:15")
///     .add_end_event("end")
///     .connect("start", "check")
///     .connect("check", "end")
///     .build();
/// ```
pub struct DiagramBuilder {
    id: String,
    name: String,
    elements: Vec<Element>,
    flow_counter: usize,
    next_x: f64,
}

impl DiagramBuilder {
    /// Create a new diagram builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            elements: Vec::new(),
            flow_counter: 0,
            next_x: 0.0,
        }
    }

    /// Add a shape of any type, laid out left to right
    pub fn add_shape(mut self, id: impl Into<String>, element_type: impl Into<String>) -> Self {
        let element_type = element_type.into();
        let (width, height) = if element_type.ends_with("Event") {
            (36.0, 36.0)
        } else if element_type.ends_with("Gateway") {
            (50.0, 50.0)
        } else {
            (100.0, 80.0)
        };

        let mut element = Element::new(id, element_type);
        element.bounds = Some(Bounds::new(self.next_x, 0.0, width, height));
        self.next_x += width + 50.0;
        self.elements.push(element);
        self
    }

    pub fn add_start_event(self, id: impl Into<String>) -> Self {
        self.add_shape(id, element_types::START_EVENT)
    }

    pub fn add_end_event(self, id: impl Into<String>) -> Self {
        self.add_shape(id, element_types::END_EVENT)
    }

    /// Add a plain task with a name
    pub fn add_task(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.add_shape(id, element_types::TASK).with_name(name)
    }

    pub fn add_gateway(self, id: impl Into<String>) -> Self {
        self.add_shape(id, element_types::EXCLUSIVE_GATEWAY)
    }

    /// Add a boundary event attached to a host element
    pub fn add_boundary_event(
        mut self,
        id: impl Into<String>,
        attached_to: impl Into<String>,
    ) -> Self {
        let mut element = Element::new(id, element_types::BOUNDARY_EVENT);
        element.attached_to_ref = Some(attached_to.into());
        self.elements.push(element);
        self
    }

    /// Set the name of the most recently added element
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if let Some(element) = self.elements.last_mut() {
            element.name = Some(name.into());
        }
        self
    }

    /// Attach a task metrics record to the most recently added element
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        if let Some(element) = self.elements.last_mut() {
            let block = element
                .extension_elements
                .get_or_insert_with(MetadataBlock::new);
            let duration = duration.into();
            block.update_task_metrics(|m| m.duration = duration);
        }
        self
    }

    /// Append an arbitrary extension record to the most recently added element
    pub fn with_record(mut self, record: ExtensionRecord) -> Self {
        if let Some(element) = self.elements.last_mut() {
            element
                .extension_elements
                .get_or_insert_with(MetadataBlock::new)
                .values
                .push(record);
        }
        self
    }

    /// Set full task metrics on the most recently added element
    pub fn with_metrics(mut self, metrics: TaskMetrics) -> Self {
        if let Some(element) = self.elements.last_mut() {
            element
                .extension_elements
                .get_or_insert_with(MetadataBlock::new)
                .update_task_metrics(|m| *m = metrics);
        }
        self
    }

    /// Add a sequence flow (auto-generates the flow ID)
    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.flow_counter += 1;
        self.elements.push(Element::connection(
            format!("flow-{}", self.flow_counter),
            element_types::SEQUENCE_FLOW,
            source,
            target,
        ));
        self
    }

    /// Add a sequence flow guarded by a condition
    pub fn connect_conditional(
        self,
        source: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        let mut builder = self.connect(source, target);
        if let Some(flow) = builder.elements.last_mut() {
            flow.condition_expression = Some(condition.into());
        }
        builder
    }

    /// Build the diagram without validation
    pub fn build(self) -> DiagramGraph {
        let mut graph = DiagramGraph::new(self.id, self.name);
        graph.elements = self.elements;
        graph
    }
}
