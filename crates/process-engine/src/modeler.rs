//! The in-process diagram editor instance
//!
//! `Modeler` owns the live diagram, its marker canvas and its command
//! stack. All edits go through property-update transactions, which
//! snapshot the diagram, notify the event sink and (optionally) re-run
//! validation before returning. Everything runs synchronously on the
//! caller's thread; one call completes before the next starts.
//!
//! # Import state
//!
//! Hosts tend to push the same document again on every re-render. The
//! modeler remembers the hash of the last imported document and ignores
//! an import whose text hashes the same.

use std::collections::HashSet;
use std::sync::Arc;

use crate::bottleneck;
use crate::canvas::{markers, Canvas};
use crate::config::ModelerConfig;
use crate::error::{ProcessEngineError, Result};
use crate::events::{DiagramEvent, EventSink, NullEventSink};
use crate::metadata::MetadataBlock;
use crate::rules::RuleRegistry;
use crate::tasks::{self, TaskRecord};
use crate::types::{DiagramGraph, ElementId};
use crate::undo::{CommandStack, Restored};
use crate::validation::{apply_validation_markers, validate_diagram, ValidationReport};

/// Whether a diagram is loaded, and which one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    /// `hash` is the blake3 hex digest of the imported document text
    Loaded { hash: String },
}

/// Result of an import request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The document was parsed and replaced the current diagram
    Reloaded,
    /// The document matched the last import; nothing was done
    Unchanged,
}

/// Live diagram editor
pub struct Modeler {
    state: ImportState,
    graph: Option<DiagramGraph>,
    canvas: Canvas,
    commands: CommandStack,
    registry: RuleRegistry,
    config: ModelerConfig,
    sink: Arc<dyn EventSink>,
    last_report: Option<ValidationReport>,
    /// Bottleneck highlighting is on and follows every committed change
    bottlenecks_shown: bool,
}

impl Modeler {
    /// Create an idle modeler with the built-in rules
    pub fn new(config: ModelerConfig) -> Self {
        Self {
            state: ImportState::Idle,
            graph: None,
            canvas: Canvas::new(),
            commands: CommandStack::new(config.max_undo_snapshots),
            registry: RuleRegistry::with_builtin_rules(),
            config,
            sink: Arc::new(NullEventSink),
            last_report: None,
            bottlenecks_shown: false,
        }
    }

    /// Replace the rule registry
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Route events to the given sink
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// True once a diagram has been imported
    pub fn is_ready(&self) -> bool {
        self.graph.is_some()
    }

    pub fn config(&self) -> &ModelerConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// The live diagram
    pub fn graph(&self) -> Result<&DiagramGraph> {
        self.graph.as_ref().ok_or(ProcessEngineError::NotReady)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Report of the most recent validation pass
    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    // --- Import / export ---

    /// Import a diagram document (JSON)
    ///
    /// A document identical to the last import is ignored. A document that
    /// fails to parse leaves the current diagram untouched.
    pub fn import_json(&mut self, text: &str) -> Result<ImportOutcome> {
        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let ImportState::Loaded { hash: loaded } = &self.state {
            if *loaded == hash {
                log::debug!("Diagram unchanged ({}), skipping import", &hash[..12]);
                return Ok(ImportOutcome::Unchanged);
            }
        }

        let graph: DiagramGraph = serde_json::from_str(text)
            .map_err(|e| ProcessEngineError::DiagramLoad(e.to_string()))?;
        check_unique_ids(&graph)?;

        self.commands.reset(&graph)?;
        self.canvas.clear();
        self.last_report = None;
        self.bottlenecks_shown = false;

        log::info!(
            "Imported diagram '{}' with {} elements",
            graph.id,
            graph.len()
        );
        self.emit(DiagramEvent::DiagramImported {
            diagram_id: graph.id.clone(),
            element_count: graph.len(),
        });

        self.graph = Some(graph);
        self.state = ImportState::Loaded { hash };

        if self.config.auto_validate {
            self.validate()?;
        }
        Ok(ImportOutcome::Reloaded)
    }

    /// Import an already-built diagram
    pub fn import_graph(&mut self, graph: &DiagramGraph) -> Result<ImportOutcome> {
        let text = serde_json::to_string(graph)?;
        self.import_json(&text)
    }

    /// Serialize the live diagram
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.graph()?)?)
    }

    // --- Property updates ---

    /// Replace the metadata block of one element
    pub fn update_properties(&mut self, element_id: &str, block: MetadataBlock) -> Result<()> {
        self.update_properties_batch(vec![(element_id.to_string(), block)])
    }

    /// Replace the metadata blocks of several elements in one transaction
    ///
    /// Either every element exists and all blocks are written, or nothing
    /// changes. One snapshot is pushed for the whole batch.
    pub fn update_properties_batch(
        &mut self,
        updates: Vec<(ElementId, MetadataBlock)>,
    ) -> Result<()> {
        let graph = self.graph.as_mut().ok_or(ProcessEngineError::NotReady)?;

        if let Some((missing, _)) = updates
            .iter()
            .find(|(id, _)| graph.find_element(id).is_none())
        {
            return Err(ProcessEngineError::ElementNotFound(missing.clone()));
        }

        let mut changed = Vec::with_capacity(updates.len());
        for (element_id, block) in updates {
            if let Some(element) = graph.find_element_mut(&element_id) {
                element.extension_elements = Some(block);
                changed.push(element_id);
            }
        }

        self.commands.commit(graph, changed.clone())?;
        log::debug!("Committed properties of {} element(s)", changed.len());
        self.emit(DiagramEvent::elements_changed(changed));
        self.after_change()
    }

    /// Step back in history. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.graph()?;
        match self.commands.undo() {
            Some(restored) => self.restore(restored?),
            None => Ok(false),
        }
    }

    /// Step forward in history. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.graph()?;
        match self.commands.redo() {
            Some(restored) => self.restore(restored?),
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    fn restore(&mut self, restored: Restored) -> Result<bool> {
        self.graph = Some(restored.graph);
        self.emit(DiagramEvent::HistoryRestored {
            element_ids: restored.changed,
            can_undo: self.commands.can_undo(),
            can_redo: self.commands.can_redo(),
        });
        self.after_change()?;
        Ok(true)
    }

    fn after_change(&mut self) -> Result<()> {
        if self.config.auto_validate {
            self.validate()?;
        }
        if self.bottlenecks_shown {
            self.mark_bottlenecks()?;
        }
        Ok(())
    }

    // --- Derived views ---

    /// Run the configured rules and refresh validation markers
    pub fn validate(&mut self) -> Result<ValidationReport> {
        let graph = self.graph.as_ref().ok_or(ProcessEngineError::NotReady)?;
        let report = validate_diagram(graph, &self.registry, &self.config.rules);

        apply_validation_markers(&mut self.canvas, &report);
        self.emit(DiagramEvent::ValidationCompleted {
            error_count: report.errors.len(),
            warning_count: report.warnings.len(),
        });

        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Task records of the live diagram
    pub fn extract_tasks(&self) -> Result<Vec<TaskRecord>> {
        Ok(tasks::extract_tasks(self.graph()?))
    }

    /// Write task records back; returns the number of elements changed
    pub fn update_tasks(&mut self, records: &[TaskRecord]) -> Result<usize> {
        tasks::update_tasks(self, records)
    }

    /// Highlight bottleneck tasks using the configured policy
    ///
    /// The highlighting stays on, and is recomputed after every committed
    /// change, undo and redo, until `clear_bottleneck_colors`.
    pub fn apply_bottleneck_colors(&mut self) -> Result<Vec<ElementId>> {
        let marked = self.mark_bottlenecks()?;
        self.bottlenecks_shown = true;
        Ok(marked)
    }

    fn mark_bottlenecks(&mut self) -> Result<Vec<ElementId>> {
        let graph = self.graph.as_ref().ok_or(ProcessEngineError::NotReady)?;
        let records = tasks::extract_tasks(graph);
        let marked = bottleneck::apply_bottleneck_colors(
            graph,
            &mut self.canvas,
            &records,
            self.config.bottleneck_policy,
        );
        self.emit(DiagramEvent::markers_changed(
            markers::BOTTLENECK_HIGH,
            marked.clone(),
        ));
        Ok(marked)
    }

    /// Remove all bottleneck highlighting
    pub fn clear_bottleneck_colors(&mut self) -> Result<()> {
        let graph = self.graph.as_ref().ok_or(ProcessEngineError::NotReady)?;
        bottleneck::clear_bottleneck_colors(graph, &mut self.canvas);
        self.bottlenecks_shown = false;
        self.emit(DiagramEvent::markers_changed(
            markers::BOTTLENECK_HIGH,
            Vec::new(),
        ));
        Ok(())
    }

    fn emit(&self, event: DiagramEvent) {
        if let Err(e) = self.sink.send(event) {
            log::warn!("Dropped diagram event: {}", e);
        }
    }
}

impl Default for Modeler {
    fn default() -> Self {
        Self::new(ModelerConfig::default())
    }
}

fn check_unique_ids(graph: &DiagramGraph) -> Result<()> {
    let mut seen = HashSet::with_capacity(graph.len());
    for element in graph.all_elements() {
        if !seen.insert(element.id.as_str()) {
            return Err(ProcessEngineError::DiagramLoad(format!(
                "duplicate element id '{}'",
                element.id
            )));
        }
    }
    Ok(())
}
