//! Diagram change events
//!
//! The modeler reports imports, committed edits, validation passes and
//! marker changes through an `EventSink`, so the host can react without
//! polling.

use serde::{Deserialize, Serialize};

/// Trait for receiving diagram events
///
/// This abstracts over the transport (host callback, channel, buffer).
pub trait EventSink: Send + Sync {
    /// Deliver an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: DiagramEvent) -> Result<(), EventError>;
}

/// Error when delivering events fails
#[derive(Debug, Clone, thiserror::Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

/// Events emitted by the modeler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramEvent {
    /// A new diagram replaced the previous one
    #[serde(rename_all = "camelCase")]
    DiagramImported {
        diagram_id: String,
        element_count: usize,
    },

    /// Element properties were committed
    #[serde(rename_all = "camelCase")]
    ElementsChanged { element_ids: Vec<String> },

    /// The diagram was restored from the command stack
    ///
    /// `element_ids` are the elements of the reverted or re-applied
    /// transaction.
    #[serde(rename_all = "camelCase")]
    HistoryRestored {
        element_ids: Vec<String>,
        can_undo: bool,
        can_redo: bool,
    },

    /// A validation pass finished
    #[serde(rename_all = "camelCase")]
    ValidationCompleted {
        error_count: usize,
        warning_count: usize,
    },

    /// A marker was (re)applied
    #[serde(rename_all = "camelCase")]
    MarkersChanged {
        marker: String,
        element_ids: Vec<String>,
    },
}

impl DiagramEvent {
    pub fn elements_changed(element_ids: Vec<String>) -> Self {
        Self::ElementsChanged { element_ids }
    }

    pub fn markers_changed(marker: &str, element_ids: Vec<String>) -> Self {
        Self::MarkersChanged {
            marker: marker.to_string(),
            element_ids,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: DiagramEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing and for hosts that drain events after each call.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<DiagramEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<DiagramEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Take all collected events, leaving the sink empty
    pub fn drain(&self) -> Vec<DiagramEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: DiagramEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        sink.send(DiagramEvent::elements_changed(vec!["t1".to_string()]))
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DiagramEvent::ElementsChanged { element_ids } => {
                assert_eq!(element_ids, &vec!["t1".to_string()]);
            }
            _ => panic!("Expected ElementsChanged event"),
        }

        assert_eq!(sink.drain().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        sink.send(DiagramEvent::ValidationCompleted {
            error_count: 0,
            warning_count: 0,
        })
        .unwrap();
    }

    #[test]
    fn test_event_json_shape() {
        let event = DiagramEvent::ValidationCompleted {
            error_count: 2,
            warning_count: 1,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"type": "validationCompleted", "errorCount": 2, "warningCount": 1})
        );
    }
}
