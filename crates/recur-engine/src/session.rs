//! The plugin session: message boundary between the form layer and the
//! transformer.
//!
//! The session owns the document, reacts to selection changes by rebuilding
//! its [`SelectionTransformer`], and queues [`PluginMessage`]s for the form
//! layer. One apply request closes the session.

use crate::edits::NodeEdits;
use crate::error::EngineError;
use crate::fonts::FontLoader;
use crate::instruction::PropertyInstruction;
use crate::transformer::{ApplyReport, SelectionTransformer};
use recur_core::{EngineConfig, NodeId, SceneGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent to the form layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PluginMessage {
    /// One formatted snapshot per selected node.
    InitViews { nodes: Vec<Value> },
    /// Drop every view; a new selection follows.
    DeleteHtml,
    /// Nothing is selected.
    SelectNode,
    Notify { message: String },
}

/// Messages received from the form layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiMessage {
    ApplyNodes {
        additions: usize,
        data: Vec<NodeEdits<PropertyInstruction>>,
    },
}

/// Notice shown when the selection changes.
pub fn selection_notice(len: usize) -> String {
    if len == 1 {
        "1 node has been selected.".to_string()
    } else {
        format!("{len} nodes have been selected.")
    }
}

const LARGE_SELECTION_NOTICE: &str = "Large selections may take a while to apply.";

#[derive(Debug)]
pub struct Session<F> {
    graph: SceneGraph,
    fonts: F,
    config: EngineConfig,
    transformer: Option<SelectionTransformer>,
    outbox: Vec<PluginMessage>,
    closed: bool,
}

impl<F: FontLoader> Session<F> {
    /// Open a session over `graph` and report its current selection.
    pub fn new(graph: SceneGraph, fonts: F, config: EngineConfig) -> Result<Self, EngineError> {
        let mut session = Self {
            graph,
            fonts,
            config,
            transformer: None,
            outbox: Vec::new(),
            closed: false,
        };
        session.init()?;
        Ok(session)
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.outbox.push(PluginMessage::Notify {
            message: message.into(),
        });
    }

    fn init(&mut self) -> Result<(), EngineError> {
        let transformer = SelectionTransformer::new(&self.graph, &mut self.fonts)?;
        let len = transformer.len();
        self.notify(selection_notice(len));
        if len > self.config.warn_selection_len {
            self.notify(LARGE_SELECTION_NOTICE);
        }

        if transformer.is_empty() {
            self.outbox.push(PluginMessage::SelectNode);
            self.transformer = None;
        } else {
            let nodes = transformer.views(&self.config.ranges);
            self.outbox.push(PluginMessage::InitViews { nodes });
            self.transformer = Some(transformer);
        }
        Ok(())
    }

    /// The host selection changed: clear the views and start over.
    pub fn selection_changed(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        self.outbox.push(PluginMessage::DeleteHtml);
        self.init()
    }

    /// Replace the host selection by id.
    pub fn select(&mut self, ids: &[NodeId]) -> Result<(), EngineError> {
        let selection = ids
            .iter()
            .map(|&id| self.graph.index_of(id).ok_or(EngineError::UnknownId(id)))
            .collect::<Result<Vec<_>, _>>()?;
        self.graph.set_selection(selection);
        self.selection_changed()
    }

    /// Handle one message from the form layer.
    pub fn handle(&mut self, message: UiMessage) -> Result<ApplyReport, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        let UiMessage::ApplyNodes { additions, data } = message;
        let transformer = self.transformer.as_ref().ok_or(EngineError::NoSelection)?;
        let report = transformer.apply_all(&mut self.graph, &data, additions)?;

        for warning in &report.warnings {
            self.outbox.push(PluginMessage::Notify {
                message: warning.to_string(),
            });
        }
        for failure in &report.failures {
            self.outbox.push(PluginMessage::Notify {
                message: failure.to_string(),
            });
        }
        log::debug!("session closed after {} clones", report.created.len());
        self.closed = true;
        Ok(report)
    }

    /// Parse and handle a JSON message from the form layer.
    pub fn handle_json(&mut self, json: &str) -> Result<ApplyReport, EngineError> {
        let message: UiMessage =
            serde_json::from_str(json).map_err(|e| EngineError::json(e.to_string()))?;
        self.handle(message)
    }

    /// Take every queued outgoing message.
    pub fn drain_messages(&mut self) -> Vec<PluginMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Formatted snapshots of the current selection; empty when nothing
    /// is selected.
    pub fn views(&self) -> Vec<Value> {
        self.transformer
            .as_ref()
            .map(|t| t.views(&self.config.ranges))
            .unwrap_or_default()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn fonts(&self) -> &F {
        &self.fonts
    }

    pub fn transformer(&self) -> Option<&SelectionTransformer> {
        self.transformer.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
