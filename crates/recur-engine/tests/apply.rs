//! Integration tests: apply passes over JSON documents, from model building
//! through compilation to the final host selection.

use pretty_assertions::assert_eq;
use recur_core::{Breakpoint, FontName, NodeKind, Paint, Point, SceneGraph};
use recur_engine::{
    ColorEdit, EngineError, FontCache, ModelKind, NodeEdits, PaintEdit, PropertyInstruction,
    SelectionTransformer,
};
use std::f64::consts::PI;

const EPS: f64 = 1e-9;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn instruction(value: &str, breakpoint: Breakpoint, max: f64, min: f64) -> Option<PropertyInstruction> {
    Some(PropertyInstruction::new(value, breakpoint, max, min))
}

fn load(json: &str) -> SceneGraph {
    SceneGraph::from_json(json).unwrap()
}

#[test]
fn width_grows_across_three_additions() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:rect", "kind": { "type": "RECTANGLE" },
                "x": 0, "y": 0, "width": 100, "height": 100
            }],
            "selection": ["it:rect"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();

    let mut edits = NodeEdits::default();
    edits.width = instruction("+10", Breakpoint::Hold, 500.0, 0.0);
    let report = transformer.apply_all(&mut sg, &[edits], 3).unwrap();

    let clones: Vec<_> = report
        .created
        .iter()
        .map(|&idx| sg.get(idx).unwrap())
        .collect();
    let widths: Vec<f64> = clones.iter().map(|n| n.width).collect();
    assert_eq!(widths, vec![110.0, 120.0, 130.0]);
    for clone in &clones {
        assert_eq!((clone.x, clone.y, clone.height, clone.rotation), (0.0, 0.0, 100.0, 0.0));
    }
    assert_eq!(sg.selection(), report.created.as_slice());
    assert!(report.warnings.is_empty() && report.failures.is_empty());

    // The source is untouched.
    let source = sg.get(transformer.selection()[0]).unwrap();
    assert_eq!(source.width, 100.0);
}

#[test]
fn starting_angle_loops_and_keeps_the_span() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:arc",
                "kind": {
                    "type": "ELLIPSE",
                    "arcData": { "startingAngle": 0, "endingAngle": 3.141592653589793, "innerRadius": 0 }
                },
                "width": 80, "height": 80
            }],
            "selection": ["it:arc"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();
    assert_eq!(transformer.models()[0].kind, ModelKind::Ellipse);

    let mut edits = NodeEdits::default();
    edits.starting_angle = instruction("+90", Breakpoint::Loop, 360.0, 0.0);
    let report = transformer.apply_all(&mut sg, &[edits], 5).unwrap();

    let starts: Vec<f64> = report
        .created
        .iter()
        .map(|&idx| {
            let NodeKind::Ellipse(e) = &sg.get(idx).unwrap().kind else {
                panic!("clone is not an ellipse")
            };
            assert!((e.arc_data.ending_angle - e.arc_data.starting_angle - PI).abs() < EPS);
            (e.arc_data.starting_angle.to_degrees() * 1000.0).round() / 1000.0
        })
        .collect();
    assert_eq!(starts, vec![90.0, 180.0, 270.0, 360.0, 90.0]);
}

#[test]
fn mixed_text_falls_back_without_loading_fonts() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:text",
                "kind": { "type": "TEXT", "characters": "Hello", "fontSize": "MIXED" },
                "x": 5, "width": 60, "height": 20
            }],
            "selection": ["it:text"]
        }"#,
    );
    let mut fonts = FontCache::new();
    let transformer = SelectionTransformer::new(&sg, &mut fonts).unwrap();

    let model = &transformer.models()[0];
    assert!(model.disabled);
    assert_eq!(model.kind, ModelKind::Generic);
    assert_eq!(model.snapshot.kind_label, "CUSTOM");
    assert!(fonts.loaded().is_empty());

    let mut edits = NodeEdits::default();
    edits.x = instruction("+5", Breakpoint::Hold, 0.0, 0.0);
    edits.font_size = instruction("+2", Breakpoint::Hold, 100.0, 1.0);
    let report = transformer.apply_all(&mut sg, &[edits], 1).unwrap();

    let clone = sg.get(report.created[0]).unwrap();
    assert_eq!(clone.x, 10.0);
    let NodeKind::Text(text) = &clone.kind else {
        panic!("clone is not text")
    };
    assert!(text.font_size.is_mixed());
}

#[test]
fn missing_fonts_demote_only_their_node() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [
                {
                    "id": "it:serif",
                    "kind": { "type": "TEXT", "fontSize": 16, "fontName": { "family": "Serif", "style": "Bold" } }
                },
                {
                    "id": "it:sans",
                    "kind": { "type": "TEXT", "fontSize": 16 }
                }
            ],
            "selection": ["it:serif", "it:sans"]
        }"#,
    );
    let serif = FontName {
        family: "Serif".into(),
        style: "Bold".into(),
    };
    let mut fonts = FontCache::new().with_missing(serif);
    let transformer = SelectionTransformer::new(&sg, &mut fonts).unwrap();
    let kinds: Vec<ModelKind> = transformer.models().iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![ModelKind::Generic, ModelKind::Text]);

    let mut edits = NodeEdits::default();
    edits.font_size = instruction("*2", Breakpoint::Hold, 100.0, 1.0);
    let report = transformer
        .apply_all(&mut sg, &[edits.clone(), edits], 1)
        .unwrap();
    let sizes: Vec<_> = report
        .created
        .iter()
        .map(|&idx| match &sg.get(idx).unwrap().kind {
            NodeKind::Text(t) => t.font_size.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        sizes,
        vec![recur_core::Mixed::Value(16.0), recur_core::Mixed::Value(32.0)]
    );
}

#[test]
fn duplicate_colours_move_together() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:group", "kind": { "type": "GROUP" },
                "children": [
                    {
                        "id": "it:group:a", "kind": { "type": "RECTANGLE" },
                        "fills": [{ "type": "SOLID", "color": { "r": 0.2, "g": 0.4, "b": 0.6 } }]
                    },
                    {
                        "id": "it:group:b", "kind": { "type": "ELLIPSE" },
                        "fills": [{ "type": "SOLID", "color": { "r": 0.2, "g": 0.4, "b": 0.6 } }]
                    }
                ]
            }],
            "selection": ["it:group"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();
    let colours = transformer.models()[0].colours().unwrap();
    assert_eq!(colours.len(), 2);
    assert_eq!(colours.links.groups, vec![vec![0, 1]]);

    // Only the leader carries an instruction; the follower gets a copy.
    let mut edits = NodeEdits::default();
    edits.selection_colours = vec![
        PaintEdit::Color(ColorEdit {
            r: instruction("+51", Breakpoint::Hold, 255.0, 0.0),
            a: instruction("x-50", Breakpoint::Hold, 100.0, 0.0),
            ..ColorEdit::default()
        }),
        PaintEdit::default(),
    ];
    let report = transformer.apply_all(&mut sg, &[edits], 2).unwrap();

    let last = *report.created.last().unwrap();
    let fills: Vec<Paint> = sg
        .find_all(last)
        .into_iter()
        .map(|idx| sg.get(idx).unwrap().fills.clone().unwrap()[0].clone())
        .collect();
    assert_eq!(fills[0], fills[1]);
    let Paint::Solid { color, opacity } = &fills[0] else {
        panic!("fill is not solid")
    };
    assert!((color.r - 0.6).abs() < EPS);
    assert!((color.g - 0.4).abs() < EPS);
    assert_eq!(*opacity, 0.0);
}

#[test]
fn linked_colours_keep_their_own_opacity() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:fade", "kind": { "type": "FRAME" },
                "children": [
                    {
                        "id": "it:fade:solid", "kind": { "type": "RECTANGLE" },
                        "fills": [{ "type": "SOLID", "color": { "r": 0, "g": 0.5, "b": 1 }, "opacity": 1 }]
                    },
                    {
                        "id": "it:fade:ghost", "kind": { "type": "RECTANGLE" },
                        "fills": [{ "type": "SOLID", "color": { "r": 0, "g": 0.5, "b": 1 }, "opacity": 0.2 }]
                    }
                ]
            }],
            "selection": ["it:fade"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();
    assert_eq!(
        transformer.models()[0].colours().unwrap().links.groups,
        vec![vec![0, 1]]
    );

    let mut edits = NodeEdits::default();
    edits.selection_colours = vec![PaintEdit::Color(ColorEdit {
        a: instruction("x-10", Breakpoint::Hold, 100.0, 0.0),
        ..ColorEdit::default()
    })];
    let report = transformer.apply_all(&mut sg, &[edits], 1).unwrap();

    let opacities: Vec<f64> = sg
        .find_all(report.created[0])
        .into_iter()
        .map(|idx| match &sg.get(idx).unwrap().fills.as_ref().unwrap()[0] {
            Paint::Solid { opacity, .. } => *opacity,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(opacities.len(), 2);
    assert!((opacities[0] - 0.9).abs() < EPS);
    assert!((opacities[1] - 0.1).abs() < EPS);
}

#[test]
fn rotation_pivots_on_the_centre() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:spin", "kind": { "type": "RECTANGLE" },
                "x": 0, "y": 0, "width": 100, "height": 50
            }],
            "selection": ["it:spin"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();

    let mut edits = NodeEdits::default();
    edits.rotation = instruction("+90", Breakpoint::Hold, 180.0, -180.0);
    let report = transformer.apply_all(&mut sg, &[edits], 2).unwrap();

    let first = sg.get(report.created[0]).unwrap();
    assert!((first.x - 75.0).abs() < EPS && (first.y + 25.0).abs() < EPS);
    let second = sg.get(report.created[1]).unwrap();
    assert!((second.x - 100.0).abs() < EPS && (second.y - 50.0).abs() < EPS);

    for clone in [first, second] {
        let centre = clone.relative_transform() * Point::new(50.0, 25.0);
        assert!((centre.x - 50.0).abs() < 1e-6 && (centre.y - 25.0).abs() < 1e-6);
    }
}

#[test]
fn rotation_follows_a_move_in_the_same_pass() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [{
                "id": "it:slide", "kind": { "type": "RECTANGLE" },
                "width": 100, "height": 50
            }],
            "selection": ["it:slide"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();

    let mut edits = NodeEdits::default();
    edits.x = instruction("+10", Breakpoint::Hold, 0.0, 0.0);
    edits.rotation = instruction("+90", Breakpoint::Hold, 180.0, -180.0);
    let report = transformer.apply_all(&mut sg, &[edits], 1).unwrap();

    let clone = sg.get(report.created[0]).unwrap();
    let centre = clone.relative_transform() * Point::new(50.0, 25.0);
    assert!((centre.x - 60.0).abs() < 1e-6 && (centre.y - 25.0).abs() < 1e-6);
}

#[test]
fn one_bad_property_spares_the_rest() {
    init_logs();
    let mut sg = load(
        r#"{
            "nodes": [
                { "id": "it:iso:a", "kind": { "type": "STAR", "pointCount": 5, "innerRadius": 0.4 } },
                { "id": "it:iso:b", "kind": { "type": "POLYGON", "pointCount": 6 } }
            ],
            "selection": ["it:iso:a", "it:iso:b"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();

    let mut star = NodeEdits::default();
    star.point_count = instruction("+1", Breakpoint::Reverse, 7.0, 3.0);
    star.inner_radius = instruction("+", Breakpoint::Hold, 100.0, 0.0);
    let mut polygon = NodeEdits::default();
    polygon.point_count = instruction("+1", Breakpoint::Hold, 14.0, 3.0);
    let mut bad = polygon.point_count.clone().unwrap();
    bad.breakpoint = "sideways".into();
    polygon.stroke_weight = Some(bad);

    let report = transformer.apply_all(&mut sg, &[star, polygon], 3).unwrap();
    let paths: Vec<&str> = report.warnings.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(paths, vec!["innerRadius", "strokeWeight"]);
    assert!(report.failures.is_empty());

    let counts: Vec<u32> = report
        .created
        .iter()
        .map(|&idx| match &sg.get(idx).unwrap().kind {
            NodeKind::Star(s) => s.point_count,
            NodeKind::Polygon(p) => p.point_count,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    // Star reverses off 7; the polygon climbs.
    assert_eq!(counts, vec![6, 7, 7, 8, 6, 9]);
}

#[test]
fn mismatched_data_is_rejected_before_cloning() {
    let mut sg = load(
        r#"{
            "nodes": [{ "id": "it:one", "kind": { "type": "RECTANGLE" } }],
            "selection": ["it:one"]
        }"#,
    );
    let transformer = SelectionTransformer::new(&sg, &mut FontCache::new()).unwrap();
    let before = sg.children(sg.root).len();

    let result = transformer.apply_all(&mut sg, &[NodeEdits::default(), NodeEdits::default()], 1);
    assert_eq!(
        result,
        Err(EngineError::DataMismatch {
            expected: 1,
            found: 2
        })
    );
    assert_eq!(sg.children(sg.root).len(), before);
}
