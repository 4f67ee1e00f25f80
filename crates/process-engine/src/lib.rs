//! Process Engine - validation and task metadata for BPMN process diagrams
//!
//! This crate is the core behind a diagram-editor widget. It provides:
//!
//! - A rule-based structural validator with configurable severities
//! - Extraction and write-back of task metrics stored in extension elements
//! - Bottleneck highlighting based on task durations
//! - An in-process `Modeler` with snapshot undo/redo and change events
//!
//! # Architecture
//!
//! - `DiagramGraph`: flat element list with derived incoming/outgoing queries
//! - `RuleRegistry` + `RuleConfig`: pluggable rules, run by `validate_diagram`
//! - `Modeler`: owns the live diagram, its `Canvas` of markers and its
//!   `CommandStack`; every edit is a property-update transaction
//! - `EventSink`: generic event delivery (not tied to any host)
//!
//! # Example
//!
//! ```ignore
//! use process_engine::{DiagramBuilder, Modeler, TaskRecord};
//!
//! let graph = DiagramBuilder::new("p", "Process")
//!     .add_start_event("start")
//!     .add_task("review", "Review")
//!     .add_end_event("end")
//!     .connect("start", "review")
//!     .connect("review", "end")
//!     .build();
//!
//! let mut modeler = Modeler::default();
//! modeler.import_graph(&graph)?;
//! modeler.update_tasks(&[TaskRecord::new("review", "01:30")])?;
//! let report = modeler.validate()?;
//! ```

pub mod bottleneck;
pub mod builder;
pub mod canvas;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod modeler;
pub mod rules;
pub mod tasks;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use bottleneck::{parse_duration, BottleneckPolicy};
pub use builder::DiagramBuilder;
pub use canvas::{markers, Canvas};
pub use config::ModelerConfig;
pub use error::{ProcessEngineError, Result};
pub use events::{DiagramEvent, EventSink, NullEventSink, VecEventSink};
pub use metadata::{ExtensionRecord, MetadataBlock, TaskMetrics};
pub use modeler::{ImportOutcome, ImportState, Modeler};
pub use rules::{Rule, RuleRegistry, Violation};
pub use tasks::{extract_tasks, TaskRecord};
pub use types::{Bounds, DiagramGraph, Element, ElementId};
pub use undo::{CommandStack, Restored};
pub use validation::{
    validate_diagram, ResultSeverity, RuleConfig, Severity, ValidationReport, ValidationResult,
};
