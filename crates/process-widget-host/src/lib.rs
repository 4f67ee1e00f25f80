//! Host-widget bindings for the process engine.
//!
//! The low-code host talks to the engine through a single `Widget` object.
//! Diagrams, task records, validation reports and events cross the
//! boundary as JSON strings so the host side needs no generated types
//! beyond the object itself.
//!
//! # Usage
//!
//! ```bash
//! # Build the cdylib
//! cargo build -p process-widget-host --release
//!
//! # Generate bindings
//! cargo run -p process-widget-host --features cli --bin process-widget-bindgen -- \
//!     generate --library target/release/libprocess_widget_host.so \
//!     --language kotlin --out-dir ./bindings
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use process_engine::{
    ImportOutcome, Modeler, ModelerConfig, ProcessEngineError, TaskRecord, VecEventSink,
};
use serde::Serialize;

uniffi::setup_scaffolding!();

// ============================================================================
// Error types
// ============================================================================

/// FFI-friendly error type mapping from ProcessEngineError.
#[derive(Debug, Clone, uniffi::Error, thiserror::Error)]
pub enum HostError {
    #[error("Failed to load diagram: {message}")]
    DiagramLoad { message: String },

    #[error("No diagram loaded")]
    NotReady,

    #[error("Element not found: {message}")]
    ElementNotFound { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl From<ProcessEngineError> for HostError {
    fn from(err: ProcessEngineError) -> Self {
        match err {
            ProcessEngineError::DiagramLoad(message) => HostError::DiagramLoad { message },
            ProcessEngineError::NotReady => HostError::NotReady,
            ProcessEngineError::ElementNotFound(message) => HostError::ElementNotFound { message },
            ProcessEngineError::Config(message) => HostError::Config { message },
            ProcessEngineError::Serialization(err) => HostError::InvalidInput {
                message: err.to_string(),
            },
            other => HostError::Other {
                message: other.to_string(),
            },
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

fn to_json<T: Serialize>(value: &T) -> HostResult<String> {
    serde_json::to_string(value).map_err(|e| HostError::Other {
        message: e.to_string(),
    })
}

// ============================================================================
// Free functions
// ============================================================================

/// Initialize logging for the host process.
///
/// Reads `RUST_LOG`, defaulting to `info`. Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::info!("process-widget-host {} ready", env!("CARGO_PKG_VERSION"));
    }
}

/// Library version.
#[uniffi::export]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Parse a duration string ("HH:MM") into minutes.
#[uniffi::export]
pub fn parse_duration(text: String) -> u32 {
    process_engine::parse_duration(&text)
}

// ============================================================================
// Widget
// ============================================================================

/// Snapshot of the widget state for toolbar rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetStatus {
    ready: bool,
    can_undo: bool,
    can_redo: bool,
    error_count: usize,
    warning_count: usize,
}

/// A diagram editor instance bound to one host widget.
#[derive(uniffi::Object)]
pub struct Widget {
    modeler: Mutex<Modeler>,
    events: Arc<VecEventSink>,
}

impl Widget {
    fn with_config(config: ModelerConfig) -> Arc<Self> {
        let events = Arc::new(VecEventSink::new());
        let modeler = Modeler::new(config).with_event_sink(events.clone());
        Arc::new(Self {
            modeler: Mutex::new(modeler),
            events,
        })
    }
}

#[uniffi::export]
impl Widget {
    /// Create a widget with the default configuration.
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Self::with_config(ModelerConfig::default())
    }

    /// Create a widget from a JSON configuration.
    #[uniffi::constructor]
    pub fn with_config_json(config_json: String) -> HostResult<Arc<Self>> {
        let config = ModelerConfig::from_json(&config_json)?;
        Ok(Self::with_config(config))
    }

    /// Import a diagram document. Returns false if it matched the last import.
    pub fn import_diagram(&self, diagram_json: String) -> HostResult<bool> {
        let outcome = self.modeler.lock().import_json(&diagram_json)?;
        Ok(outcome == ImportOutcome::Reloaded)
    }

    /// Export the live diagram as JSON.
    pub fn export_diagram(&self) -> HostResult<String> {
        Ok(self.modeler.lock().export_json()?)
    }

    /// Run validation. Returns a JSON ValidationReport.
    pub fn validate(&self) -> HostResult<String> {
        let report = self.modeler.lock().validate()?;
        to_json(&report)
    }

    /// Extract task records. Returns a JSON array of TaskRecord.
    pub fn extract_tasks(&self) -> HostResult<String> {
        let tasks = self.modeler.lock().extract_tasks()?;
        to_json(&tasks)
    }

    /// Write task records back. `tasks_json` is a JSON array of TaskRecord.
    /// Returns the number of elements that changed.
    pub fn update_tasks(&self, tasks_json: String) -> HostResult<u32> {
        let records: Vec<TaskRecord> =
            serde_json::from_str(&tasks_json).map_err(|e| HostError::InvalidInput {
                message: e.to_string(),
            })?;
        let changed = self.modeler.lock().update_tasks(&records)?;
        Ok(u32::try_from(changed).unwrap_or(u32::MAX))
    }

    /// Highlight bottleneck tasks. Returns the marked element IDs.
    pub fn apply_bottleneck_colors(&self) -> HostResult<Vec<String>> {
        Ok(self.modeler.lock().apply_bottleneck_colors()?)
    }

    /// Remove bottleneck highlighting.
    pub fn clear_bottleneck_colors(&self) -> HostResult<()> {
        Ok(self.modeler.lock().clear_bottleneck_colors()?)
    }

    /// Markers currently shown on an element.
    pub fn markers(&self, element_id: String) -> Vec<String> {
        self.modeler.lock().canvas().markers_of(&element_id)
    }

    /// Undo the last committed change. Returns false if there was none.
    pub fn undo(&self) -> HostResult<bool> {
        Ok(self.modeler.lock().undo()?)
    }

    /// Redo the last undone change. Returns false if there was none.
    pub fn redo(&self) -> HostResult<bool> {
        Ok(self.modeler.lock().redo()?)
    }

    /// Current widget state as JSON.
    pub fn status(&self) -> HostResult<String> {
        let modeler = self.modeler.lock();
        let (error_count, warning_count) = modeler
            .last_report()
            .map(|r| (r.errors.len(), r.warnings.len()))
            .unwrap_or((0, 0));
        to_json(&WidgetStatus {
            ready: modeler.is_ready(),
            can_undo: modeler.can_undo(),
            can_redo: modeler.can_redo(),
            error_count,
            warning_count,
        })
    }

    /// Take all events emitted since the last call. Returns a JSON array.
    pub fn drain_events(&self) -> HostResult<String> {
        to_json(&self.events.drain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn diagram() -> String {
        json!({
            "id": "leave",
            "name": "Leave request",
            "elements": [
                {"id": "start", "type": "StartEvent"},
                {"id": "submit", "type": "UserTask", "name": "Submit",
                 "extensionElements": {"values": [{"$type": "custom:TaskMetrics", "duration": "00:20"}]}},
                {"id": "approve", "type": "UserTask", "name": "Approve",
                 "extensionElements": {"values": [{"$type": "custom:TaskMetrics", "duration": "04:00"}]}},
                {"id": "end", "type": "EndEvent"},
                {"id": "f1", "type": "SequenceFlow", "source": "start", "target": "submit"},
                {"id": "f2", "type": "SequenceFlow", "source": "submit", "target": "approve"},
                {"id": "f3", "type": "SequenceFlow", "source": "approve", "target": "end"}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_not_ready_errors() {
        let widget = Widget::new();
        assert!(matches!(widget.validate(), Err(HostError::NotReady)));
        assert!(matches!(widget.extract_tasks(), Err(HostError::NotReady)));
    }

    #[test]
    fn test_import_and_reimport() {
        let widget = Widget::new();
        assert!(widget.import_diagram(diagram()).unwrap());
        assert!(!widget.import_diagram(diagram()).unwrap());
        assert!(matches!(
            widget.import_diagram("<definitions/>".to_string()),
            Err(HostError::DiagramLoad { .. })
        ));
    }

    #[test]
    fn test_tasks_json_round_trip() {
        let widget = Widget::new();
        widget.import_diagram(diagram()).unwrap();

        let tasks: Value = serde_json::from_str(&widget.extract_tasks().unwrap()).unwrap();
        assert_eq!(
            tasks,
            json!([
                {"taskId": "submit", "name": "Submit", "type": "UserTask", "duration": "00:20"},
                {"taskId": "approve", "name": "Approve", "type": "UserTask", "duration": "04:00"}
            ])
        );

        let changed = widget
            .update_tasks(r#"[{"taskId": "submit", "duration": "01:10"}, {"taskId": "nope", "duration": "01:00"}]"#.to_string())
            .unwrap();
        assert_eq!(changed, 1);

        let tasks: Vec<TaskRecord> = serde_json::from_str(&widget.extract_tasks().unwrap()).unwrap();
        assert_eq!(tasks[0].duration, "01:10");

        let exported: Value = serde_json::from_str(&widget.export_diagram().unwrap()).unwrap();
        assert_eq!(
            exported["elements"][1]["extensionElements"]["values"][0]["duration"],
            json!("01:10")
        );
    }

    #[test]
    fn test_update_tasks_rejects_bad_json() {
        let widget = Widget::new();
        widget.import_diagram(diagram()).unwrap();
        assert!(matches!(
            widget.update_tasks("{".to_string()),
            Err(HostError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_validate_report_json() {
        let widget = Widget::new();
        widget.import_diagram(diagram()).unwrap();

        let report: Value = serde_json::from_str(&widget.validate().unwrap()).unwrap();
        assert_eq!(report["errors"], json!([]));
        assert_eq!(report["warnings"], json!([]));
    }

    #[test]
    fn test_bottleneck_and_markers() {
        let widget = Widget::new();
        widget.import_diagram(diagram()).unwrap();

        assert_eq!(widget.apply_bottleneck_colors().unwrap(), vec!["approve"]);
        assert_eq!(widget.markers("approve".to_string()), vec!["bottleneck-high"]);

        widget.clear_bottleneck_colors().unwrap();
        assert!(widget.markers("approve".to_string()).is_empty());
    }

    #[test]
    fn test_config_and_status() {
        let widget = Widget::with_config_json(
            r#"{"rules": {"start-event-required": "warning"}, "bottleneckPolicy": "above_average"}"#
                .to_string(),
        )
        .unwrap();
        widget
            .import_diagram(r#"{"id": "d", "elements": [{"id": "e", "type": "EndEvent"}]}"#.to_string())
            .unwrap();

        let status: Value = serde_json::from_str(&widget.status().unwrap()).unwrap();
        assert_eq!(status["ready"], json!(true));
        assert_eq!(status["warningCount"], json!(1));
        assert_eq!(status["errorCount"], json!(0));
        assert_eq!(status["canUndo"], json!(false));

        assert!(matches!(
            Widget::with_config_json(r#"{"maxUndoSnapshots": 0}"#.to_string()),
            Err(HostError::Config { .. })
        ));
    }

    #[test]
    fn test_undo_and_events() {
        let widget = Widget::new();
        widget.import_diagram(diagram()).unwrap();
        widget
            .update_tasks(r#"[{"taskId": "approve", "duration": "00:30"}]"#.to_string())
            .unwrap();

        let events: Value = serde_json::from_str(&widget.drain_events().unwrap()).unwrap();
        let types: Vec<&str> = events
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["type"].as_str())
            .collect();
        assert_eq!(
            types,
            vec![
                "diagramImported",
                "validationCompleted",
                "elementsChanged",
                "validationCompleted"
            ]
        );

        assert!(widget.undo().unwrap());
        let tasks: Vec<TaskRecord> = serde_json::from_str(&widget.extract_tasks().unwrap()).unwrap();
        assert_eq!(tasks[1].duration, "04:00");
        assert!(widget.redo().unwrap());
        assert!(!widget.redo().unwrap());
    }

    #[test]
    fn test_parse_duration_export() {
        assert_eq!(parse_duration("02:30".to_string()), 150);
    }
}
