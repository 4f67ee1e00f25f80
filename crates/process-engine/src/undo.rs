//! Command stack of diagram transactions
//!
//! Every property-update transaction the modeler commits becomes one
//! entry: the IDs of the elements it touched plus a zstd-compressed JSON
//! image of the diagram right after the commit. The first entry is the
//! imported baseline and touches nothing.
//!
//! Undo moves back to the previous image and reports the elements of the
//! transaction it reverted. Redo moves forward and reports the elements
//! of the transaction it re-applied.

use std::collections::VecDeque;

use crate::error::{ProcessEngineError, Result};
use crate::types::{DiagramGraph, ElementId};

/// Default number of history entries kept
pub const DEFAULT_MAX_SNAPSHOTS: usize = 100;

/// zstd level for diagram images
const COMPRESSION_LEVEL: i32 = 3;

/// One committed transaction
struct Transaction {
    changed: Vec<ElementId>,
    image: Vec<u8>,
}

impl Transaction {
    fn record(graph: &DiagramGraph, changed: Vec<ElementId>) -> Result<Self> {
        let json = serde_json::to_vec(graph)?;
        let image = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| ProcessEngineError::Compression(e.to_string()))?;
        Ok(Self { changed, image })
    }

    fn diagram(&self) -> Result<DiagramGraph> {
        let json = zstd::decode_all(self.image.as_slice())
            .map_err(|e| ProcessEngineError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// A diagram state reached through undo or redo
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub graph: DiagramGraph,
    /// Elements of the transaction that was reverted or re-applied
    pub changed: Vec<ElementId>,
}

/// Undo/redo history of committed transactions
pub struct CommandStack {
    history: VecDeque<Transaction>,
    /// Index of the entry matching the live diagram
    cursor: usize,
    depth: usize,
}

impl CommandStack {
    /// Create an empty stack keeping at most `depth` entries
    pub fn new(depth: usize) -> Self {
        Self {
            history: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
        }
    }

    /// Drop all history and start over from `graph`
    pub fn reset(&mut self, graph: &DiagramGraph) -> Result<()> {
        let baseline = Transaction::record(graph, Vec::new())?;
        self.history.clear();
        self.history.push_back(baseline);
        self.cursor = 0;
        Ok(())
    }

    /// Record a committed transaction
    ///
    /// Entries after the cursor (the redo branch) are discarded. When the
    /// stack is full the oldest entry goes, and the next one becomes the
    /// baseline.
    pub fn commit(&mut self, graph: &DiagramGraph, changed: Vec<ElementId>) -> Result<()> {
        let transaction = Transaction::record(graph, changed)?;

        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push_back(transaction);
        self.cursor = self.history.len() - 1;

        while self.history.len() > self.depth {
            self.history.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
        Ok(())
    }

    /// Revert the transaction at the cursor
    ///
    /// Returns `None` when the cursor is at the baseline.
    pub fn undo(&mut self) -> Option<Result<Restored>> {
        if !self.can_undo() {
            return None;
        }
        let changed = self.history[self.cursor].changed.clone();
        self.cursor -= 1;
        Some(
            self.history[self.cursor]
                .diagram()
                .map(|graph| Restored { graph, changed }),
        )
    }

    /// Re-apply the transaction after the cursor
    ///
    /// Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Result<Restored>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        let transaction = &self.history[self.cursor];
        Some(transaction.diagram().map(|graph| Restored {
            graph,
            changed: transaction.changed.clone(),
        }))
    }

    /// Diagram at the cursor
    pub fn current(&self) -> Option<Result<DiagramGraph>> {
        self.history.get(self.cursor).map(Transaction::diagram)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Number of entries, baseline included
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNAPSHOTS)
    }
}
