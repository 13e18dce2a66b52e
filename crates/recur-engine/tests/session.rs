//! Integration tests: a full session from the first selection report to
//! the apply request, driven through JSON messages.

use pretty_assertions::assert_eq;
use recur_core::{EngineConfig, NodeId, SceneGraph};
use recur_engine::{EngineError, FontCache, PluginMessage, Session};
use serde_json::json;

const DOC: &str = r#"{
    "nodes": [
        {
            "id": "ss:card", "name": "Card",
            "kind": { "type": "RECTANGLE", "cornerRadius": 4, "topLeftRadius": 4,
                      "topRightRadius": 4, "bottomLeftRadius": 4, "bottomRightRadius": 4 },
            "x": 10, "y": 20, "width": 120, "height": 80, "rotation": 0,
            "fills": [{ "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1 }, "opacity": 0.5 }],
            "dashPattern": [4, 2]
        },
        {
            "id": "ss:label",
            "kind": { "type": "TEXT", "characters": "Card", "fontSize": 14,
                      "letterSpacing": { "value": 10, "unit": "PERCENT" } }
        }
    ],
    "selection": ["ss:card"]
}"#;

fn open() -> Session<FontCache> {
    let _ = env_logger::builder().is_test(true).try_init();
    let graph = SceneGraph::from_json(DOC).unwrap();
    Session::new(graph, FontCache::new(), EngineConfig::default()).unwrap()
}

#[test]
fn opening_reports_the_selection() {
    let mut session = open();
    let messages = session.drain_messages();
    assert_eq!(
        messages[0],
        PluginMessage::Notify {
            message: "1 node has been selected.".into()
        }
    );

    let PluginMessage::InitViews { nodes } = &messages[1] else {
        panic!("expected initviews, got {:?}", messages[1]);
    };
    let card = &nodes[0];
    assert_eq!(card["type"], json!("RECTANGLE"));
    assert_eq!(card["name"], json!("Card"));
    assert_eq!(card["width"], json!(120.0));
    assert_eq!(card["rotation"], json!("0°"));
    assert_eq!(card["cornerRadius"], json!(4.0));
    assert_eq!(card["dashPattern"], json!([4.0, 2.0]));
    assert_eq!(card["fills"][0]["opacity"], json!("50%"));
    assert_eq!(card["fills"][0]["color"], json!({ "r": 255, "g": 255, "b": 255 }));

    // Nothing else queued.
    assert_eq!(messages.len(), 2);
    assert!(session.drain_messages().is_empty());
}

#[test]
fn reselecting_clears_views_first() {
    let mut session = open();
    session.drain_messages();

    session.select(&[NodeId::intern("ss:label")]).unwrap();
    let messages = session.drain_messages();
    assert_eq!(messages[0], PluginMessage::DeleteHtml);
    let PluginMessage::InitViews { nodes } = messages.last().unwrap() else {
        panic!("expected initviews");
    };
    assert_eq!(nodes[0]["type"], json!("TEXT"));
    assert_eq!(nodes[0]["letterSpacing"], json!(1.0));
    assert_eq!(session.fonts().loaded().len(), 1);

    session.select(&[]).unwrap();
    let messages = session.drain_messages();
    assert_eq!(messages.last(), Some(&PluginMessage::SelectNode));
    assert!(session.transformer().is_none());
}

#[test]
fn apply_request_clones_and_closes() {
    let mut session = open();
    session.drain_messages();

    let request = json!({
        "type": "applynodes",
        "additions": 2,
        "data": [{
            "x": { "value": "+130", "breakpoint": "hold", "max": "Infinity", "min": "-Infinity" },
            "cornerRadius": { "value": "*2", "breakpoint": "hold", "max": 100, "min": 0 },
            "fills": [{ "a": { "value": "+25", "breakpoint": "loop", "max": 100, "min": 0 } }],
            "dashPattern": [null, { "value": "+1", "breakpoint": "hold", "max": 100, "min": 0 }],
            "height": { "value": "+1", "breakpoint": "bounce", "max": 100, "min": 0 }
        }]
    });
    let report = session.handle_json(&request.to_string()).unwrap();
    assert!(session.is_closed());
    assert_eq!(report.created.len(), 2);

    let graph = session.graph();
    assert_eq!(graph.selection(), report.created.as_slice());
    let doc = graph.to_document();
    let last = &doc.nodes[2].node;
    assert_eq!(last.x, 270.0);
    assert_eq!(last.height, 80.0);
    assert_eq!(last.dash_pattern.as_slice(), &[4.0, 4.0]);
    let recur_core::NodeKind::Rectangle(rect) = &last.kind else {
        panic!("clone is not a rectangle");
    };
    assert_eq!(rect.corner_radius, recur_core::Mixed::Value(16.0));
    assert_eq!(rect.bottom_left_radius, 16.0);
    assert_eq!(
        last.fills.as_ref().unwrap()[0],
        recur_core::Paint::solid(1.0, 1.0, 1.0, 1.0)
    );

    // The invalid breakpoint comes back as a notice.
    let messages = session.drain_messages();
    assert_eq!(messages.len(), 1);
    let PluginMessage::Notify { message } = &messages[0] else {
        panic!("expected a notice");
    };
    assert!(message.contains("`height`"), "{message}");

    let again = json!({ "type": "applynodes", "additions": 1, "data": [{}] });
    assert_eq!(
        session.handle_json(&again.to_string()),
        Err(EngineError::Closed)
    );
    assert_eq!(session.selection_changed(), Err(EngineError::Closed));
}

#[test]
fn zero_additions_leave_the_session_open() {
    let mut session = open();
    let request = json!({ "type": "applynodes", "additions": 0, "data": [{}] });
    assert_eq!(
        session.handle_json(&request.to_string()),
        Err(EngineError::InvalidAdditions(0))
    );
    assert!(!session.is_closed());
}
