//! WASM bridge for Recur: exposes a plugin [`Session`] to the UI.
//!
//! Compiled via `wasm-pack build --target web`. Every call speaks JSON
//! strings; outgoing messages queue inside the session and are collected
//! with [`RecurPlugin::drain_messages`].

use recur_core::{EngineConfig, NodeId, SceneGraph};
use recur_engine::{ApplyReport, FontCache, PluginMessage, Session};
use std::fmt::Display;
use wasm_bindgen::prelude::*;

/// One plugin run over a host document.
#[wasm_bindgen]
pub struct RecurPlugin {
    session: Session<FontCache>,
}

#[wasm_bindgen]
impl RecurPlugin {
    /// Open a session over `document` (a JSON document tree with its
    /// selection). `config` may be empty for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(document: &str, config: &str) -> Result<RecurPlugin, JsValue> {
        console_setup();
        let session = open(document, config).map_err(to_js)?;
        Ok(Self { session })
    }

    /// Queued messages for the UI as a JSON array.
    pub fn drain_messages(&mut self) -> String {
        messages_json(&self.session.drain_messages())
    }

    /// Current views as a JSON array, one per selected node.
    pub fn init_views(&self) -> String {
        serde_json::to_string(&self.session.views()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replace the selection with the ids in a JSON array.
    pub fn select(&mut self, ids: &str) -> Result<(), JsValue> {
        let ids = parse_ids(ids).map_err(to_js)?;
        self.session.select(&ids).map_err(to_js)
    }

    /// The host reported a selection change.
    pub fn selection_changed(&mut self) -> Result<(), JsValue> {
        self.session.selection_changed().map_err(to_js)
    }

    /// Handle an `applynodes` message. Returns a JSON summary of the run.
    pub fn apply(&mut self, message: &str) -> Result<String, JsValue> {
        let report = self.session.handle_json(message).map_err(to_js)?;
        Ok(report_json(self.session.graph(), &report))
    }

    /// The document as it stands, as JSON.
    pub fn document(&self) -> Result<String, JsValue> {
        self.session.graph().to_json().map_err(to_js)
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

/// Errors cross the boundary as JS `Error` objects.
fn to_js(e: impl Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn open(document: &str, config: &str) -> Result<Session<FontCache>, String> {
    let config = if config.trim().is_empty() {
        EngineConfig::default()
    } else {
        EngineConfig::from_json(config).map_err(|e| format!("config JSON is invalid: {e}"))?
    };
    let graph = SceneGraph::from_json(document).map_err(|e| e.to_string())?;
    Session::new(graph, FontCache::new(), config).map_err(|e| e.to_string())
}

fn parse_ids(json: &str) -> Result<Vec<NodeId>, String> {
    serde_json::from_str(json).map_err(|e| format!("expected an array of node ids: {e}"))
}

fn messages_json(messages: &[PluginMessage]) -> String {
    serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string())
}

/// `{"created":[ids],"warnings":[..],"failures":[..]}`
fn report_json(graph: &SceneGraph, report: &ApplyReport) -> String {
    let created: Vec<NodeId> = report
        .created
        .iter()
        .filter_map(|&idx| graph.get(idx).map(|n| n.id))
        .collect();
    let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    let failures: Vec<String> = report.failures.iter().map(ToString::to_string).collect();
    serde_json::json!({
        "created": created,
        "warnings": warnings,
        "failures": failures,
    })
    .to_string()
}

/// Route panics and `log` records to the browser console.
fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Recur WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            static LOGGER: ConsoleLogger = ConsoleLogger;
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"{
        "nodes": [
            { "id": "wasm:box", "kind": { "type": "ELLIPSE" }, "width": 40, "height": 40 }
        ],
        "selection": ["wasm:box"]
    }"#;

    #[test]
    fn open_uses_defaults_for_an_empty_config() {
        let mut session = open(DOC, "").unwrap();
        let messages: serde_json::Value =
            serde_json::from_str(&messages_json(&session.drain_messages())).unwrap();
        assert_eq!(messages[0]["method"], "notify");
        assert_eq!(messages[1]["method"], "initviews");
        assert_eq!(messages[1]["nodes"][0]["type"], "ELLIPSE");
        assert_eq!(messages[1]["nodes"][0], session.views()[0]);
    }

    #[test]
    fn bad_inputs_are_reported() {
        assert!(open(DOC, "{").unwrap_err().starts_with("config JSON is invalid"));
        assert!(open("not json", "").is_err());
        assert!(parse_ids(r#"{"id": 1}"#).is_err());
        assert_eq!(
            parse_ids(r#"["wasm:a", "wasm:b"]"#).unwrap(),
            vec![NodeId::intern("wasm:a"), NodeId::intern("wasm:b")]
        );
    }

    #[test]
    fn config_reaches_the_session() {
        let mut session = open(DOC, r#"{"warnSelectionLen": 0}"#).unwrap();
        let messages = session.drain_messages();
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn report_lists_clone_ids() {
        let mut session = open(DOC, "").unwrap();
        let request = r#"{
            "type": "applynodes",
            "additions": 2,
            "data": [{ "width": { "value": "+10", "breakpoint": "hold", "max": 500, "min": 0 } }]
        }"#;
        let report = session.handle_json(request).unwrap();
        let summary: serde_json::Value =
            serde_json::from_str(&report_json(session.graph(), &report)).unwrap();

        let created = summary["created"].as_array().unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[0].as_str().unwrap().starts_with("wasm:box~"));
        assert_eq!(summary["warnings"], serde_json::json!([]));
        assert_eq!(summary["failures"], serde_json::json!([]));
    }
}
