//! The selection transformer: clone-and-apply over the whole selection.
//!
//! Additions run addition-major, model-minor: every selected node gets its
//! i-th clone before any node gets its (i+1)-th. Each clone is made from
//! the previous clone of the same node, so edits compound.

use crate::edits::{CompiledEdits, NodeEdits};
use crate::error::{ApplyError, CompileWarning, EngineError};
use crate::fonts::FontLoader;
use crate::format::format_snapshot;
use crate::instruction::PropertyInstruction;
use crate::property::{HandlerCtx, NodeModel, PropertyKey};
use recur_core::{NodeId, NodeIndex, RangeTable, SceneGraph};
use serde_json::Value;
use std::fmt;

/// A clone or handler failure, isolated to one clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyFailure {
    /// The selected node the clone descends from.
    pub source: NodeId,
    /// Zero-based addition.
    pub addition: usize,
    /// The failing handler; `None` when cloning itself failed.
    pub key: Option<PropertyKey>,
    pub error: ApplyError,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Some(key) => write!(
                f,
                "{} (addition {}): `{}` failed: {}",
                self.source,
                self.addition + 1,
                key.name(),
                self.error
            ),
            None => write!(
                f,
                "{} (addition {}): could not clone: {}",
                self.source,
                self.addition + 1,
                self.error
            ),
        }
    }
}

/// Outcome of one apply request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Every clone made, in creation order. This becomes the selection.
    pub created: Vec<NodeIndex>,
    /// Instructions discarded at compile time.
    pub warnings: Vec<CompileWarning>,
    pub failures: Vec<ApplyFailure>,
}

/// Models for the current selection, in selection order.
#[derive(Debug, Clone)]
pub struct SelectionTransformer {
    selection: Vec<NodeIndex>,
    models: Vec<NodeModel>,
}

impl SelectionTransformer {
    /// Build a model for every selected node.
    pub fn new(graph: &SceneGraph, fonts: &mut dyn FontLoader) -> Result<Self, EngineError> {
        let selection = graph.selection().to_vec();
        let models = selection
            .iter()
            .map(|&idx| NodeModel::build(graph, idx, fonts))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("transformer over {} nodes", models.len());
        Ok(Self { selection, models })
    }

    pub fn selection(&self) -> &[NodeIndex] {
        &self.selection
    }

    pub fn models(&self) -> &[NodeModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Formatted snapshots for the form layer, one per selected node.
    pub fn views(&self, ranges: &RangeTable) -> Vec<Value> {
        self.models
            .iter()
            .map(|model| format_snapshot(&model.snapshot, ranges))
            .collect()
    }

    /// Compile one instruction tree per selected node.
    pub fn compile(
        &self,
        data: &[NodeEdits<PropertyInstruction>],
    ) -> Result<(Vec<CompiledEdits>, Vec<CompileWarning>), EngineError> {
        if data.len() != self.models.len() {
            return Err(EngineError::DataMismatch {
                expected: self.models.len(),
                found: data.len(),
            });
        }
        let mut warnings = Vec::new();
        let compiled = self
            .models
            .iter()
            .zip(data)
            .map(|(model, raw)| {
                let (mut compiled, mut w) = raw.compile(model.snapshot.id);
                warnings.append(&mut w);
                if let Some(colours) = model.colours() {
                    colours.links.share(&mut compiled.edits.selection_colours);
                }
                compiled
            })
            .collect();
        Ok((compiled, warnings))
    }

    /// Run `additions` rounds of clone-and-apply and select the clones.
    ///
    /// A failing clone or handler is recorded and skipped; it never stops
    /// the other nodes or later additions.
    pub fn apply(
        &self,
        graph: &mut SceneGraph,
        compiled: &mut [CompiledEdits],
        additions: usize,
    ) -> Result<ApplyReport, EngineError> {
        if additions == 0 {
            return Err(EngineError::InvalidAdditions(additions));
        }
        if compiled.len() != self.models.len() {
            return Err(EngineError::DataMismatch {
                expected: self.models.len(),
                found: compiled.len(),
            });
        }

        let mut current: Vec<NodeIndex> = self.models.iter().map(|m| m.source).collect();
        let mut report = ApplyReport::default();

        for addition in 0..additions {
            for (m, model) in self.models.iter().enumerate() {
                let source = model.snapshot.id;
                let clone = match graph.clone_node(current[m]) {
                    Ok(clone) => clone,
                    Err(error) => {
                        log::warn!("{source}: clone failed: {error}");
                        report.failures.push(ApplyFailure {
                            source,
                            addition,
                            key: None,
                            error: error.into(),
                        });
                        continue;
                    }
                };
                current[m] = clone;

                let edits = &mut compiled[m];
                if edits.edits.is_empty() {
                    report.created.push(clone);
                    continue;
                }
                for &key in model.keys() {
                    if !key.is_edited(&edits.edits) {
                        continue;
                    }
                    let mut ctx = HandlerCtx {
                        graph: &mut *graph,
                        node: clone,
                        edits: &mut *edits,
                        model,
                    };
                    if let Err(error) = (key.handler())(&mut ctx) {
                        log::warn!("{source}: {} failed on addition {addition}: {error}", key.name());
                        report.failures.push(ApplyFailure {
                            source,
                            addition,
                            key: Some(key),
                            error,
                        });
                        break;
                    }
                }
                report.created.push(clone);
            }
        }

        log::debug!(
            "applied {additions} additions: {} clones, {} failures",
            report.created.len(),
            report.failures.len()
        );
        graph.set_selection(report.created.clone());
        Ok(report)
    }

    /// Compile `data`, then apply it.
    pub fn apply_all(
        &self,
        graph: &mut SceneGraph,
        data: &[NodeEdits<PropertyInstruction>],
        additions: usize,
    ) -> Result<ApplyReport, EngineError> {
        if additions == 0 {
            return Err(EngineError::InvalidAdditions(additions));
        }
        let (mut compiled, warnings) = self.compile(data)?;
        let mut report = self.apply(graph, &mut compiled, additions)?;
        report.warnings = warnings;
        Ok(report)
    }
}
