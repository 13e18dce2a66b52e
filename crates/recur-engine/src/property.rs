//! Node property models.
//!
//! A [`NodeModel`] is built once per selected node. It fixes which
//! [`PropertyKey`]s the node understands, in the order their handlers run,
//! and snapshots the node's current values for the UI layer.
//!
//! Handler order is data: rotation must see the x/y written earlier in the
//! same pass, and an ellipse's ending angle must see its new starting angle.

use crate::colours::ColourSet;
use crate::edits::{CompiledEdits, NodeEdits};
use crate::error::{ApplyError, ModelError};
use crate::fonts::FontLoader;
use crate::handlers;
use recur_core::{
    Effect, GraphError, LetterSpacing, LineHeight, Mixed, NodeId, NodeIndex, NodeKind, Paint,
    SceneGraph, SceneNode,
};
use smallvec::SmallVec;

// ─── Keys ────────────────────────────────────────────────────────────────

/// Every property an instruction can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    X,
    Y,
    Width,
    Height,
    Rotation,
    CornerRadius,
    TopLeftRadius,
    TopRightRadius,
    BottomLeftRadius,
    BottomRightRadius,
    StartingAngle,
    EndingAngle,
    InnerRadius,
    PointCount,
    FontSize,
    LetterSpacing,
    LineHeight,
    ParagraphIndent,
    ParagraphSpacing,
    Fills,
    Strokes,
    StrokeWeight,
    DashPattern,
    Effects,
    SelectionColours,
}

/// Mutates one clone for one key.
pub type Handler = fn(&mut HandlerCtx<'_>) -> Result<(), ApplyError>;

impl PropertyKey {
    /// The name the UI layer uses for this key.
    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::X => "x",
            PropertyKey::Y => "y",
            PropertyKey::Width => "width",
            PropertyKey::Height => "height",
            PropertyKey::Rotation => "rotation",
            PropertyKey::CornerRadius => "cornerRadius",
            PropertyKey::TopLeftRadius => "topLeftRadius",
            PropertyKey::TopRightRadius => "topRightRadius",
            PropertyKey::BottomLeftRadius => "bottomLeftRadius",
            PropertyKey::BottomRightRadius => "bottomRightRadius",
            PropertyKey::StartingAngle => "startingAngle",
            PropertyKey::EndingAngle => "endingAngle",
            PropertyKey::InnerRadius => "innerRadius",
            PropertyKey::PointCount => "pointCount",
            PropertyKey::FontSize => "fontSize",
            PropertyKey::LetterSpacing => "letterSpacing",
            PropertyKey::LineHeight => "lineHeight",
            PropertyKey::ParagraphIndent => "paragraphIndent",
            PropertyKey::ParagraphSpacing => "paragraphSpacing",
            PropertyKey::Fills => "fills",
            PropertyKey::Strokes => "strokes",
            PropertyKey::StrokeWeight => "strokeWeight",
            PropertyKey::DashPattern => "dashPattern",
            PropertyKey::Effects => "effects",
            PropertyKey::SelectionColours => "selectionColours",
        }
    }

    /// The one handler for this key.
    pub fn handler(self) -> Handler {
        match self {
            PropertyKey::X => handlers::x,
            PropertyKey::Y => handlers::y,
            PropertyKey::Width => handlers::width,
            PropertyKey::Height => handlers::height,
            PropertyKey::Rotation => handlers::rotation,
            PropertyKey::CornerRadius => handlers::corner_radius,
            PropertyKey::TopLeftRadius => handlers::top_left_radius,
            PropertyKey::TopRightRadius => handlers::top_right_radius,
            PropertyKey::BottomLeftRadius => handlers::bottom_left_radius,
            PropertyKey::BottomRightRadius => handlers::bottom_right_radius,
            PropertyKey::StartingAngle => handlers::starting_angle,
            PropertyKey::EndingAngle => handlers::ending_angle,
            PropertyKey::InnerRadius => handlers::inner_radius,
            PropertyKey::PointCount => handlers::point_count,
            PropertyKey::FontSize => handlers::font_size,
            PropertyKey::LetterSpacing => handlers::letter_spacing,
            PropertyKey::LineHeight => handlers::line_height,
            PropertyKey::ParagraphIndent => handlers::paragraph_indent,
            PropertyKey::ParagraphSpacing => handlers::paragraph_spacing,
            PropertyKey::Fills => handlers::fills,
            PropertyKey::Strokes => handlers::strokes,
            PropertyKey::StrokeWeight => handlers::stroke_weight,
            PropertyKey::DashPattern => handlers::dash_pattern,
            PropertyKey::Effects => handlers::effects,
            PropertyKey::SelectionColours => handlers::selection_colours,
        }
    }

    /// Whether `edits` carries any instruction for this key.
    pub fn is_edited<T>(self, edits: &NodeEdits<T>) -> bool {
        match self {
            PropertyKey::X => edits.x.is_some(),
            PropertyKey::Y => edits.y.is_some(),
            PropertyKey::Width => edits.width.is_some(),
            PropertyKey::Height => edits.height.is_some(),
            PropertyKey::Rotation => edits.rotation.is_some(),
            PropertyKey::CornerRadius => edits.corner_radius.is_some(),
            PropertyKey::TopLeftRadius => edits.top_left_radius.is_some(),
            PropertyKey::TopRightRadius => edits.top_right_radius.is_some(),
            PropertyKey::BottomLeftRadius => edits.bottom_left_radius.is_some(),
            PropertyKey::BottomRightRadius => edits.bottom_right_radius.is_some(),
            PropertyKey::StartingAngle => edits.starting_angle.is_some(),
            PropertyKey::EndingAngle => edits.ending_angle.is_some(),
            PropertyKey::InnerRadius => edits.inner_radius.is_some(),
            PropertyKey::PointCount => edits.point_count.is_some(),
            PropertyKey::FontSize => edits.font_size.is_some(),
            PropertyKey::LetterSpacing => edits.letter_spacing.is_some(),
            PropertyKey::LineHeight => edits.line_height.is_some(),
            PropertyKey::ParagraphIndent => edits.paragraph_indent.is_some(),
            PropertyKey::ParagraphSpacing => edits.paragraph_spacing.is_some(),
            PropertyKey::Fills => !edits.fills.iter().all(|e| e.is_empty()),
            PropertyKey::Strokes => !edits.strokes.iter().all(|e| e.is_empty()),
            PropertyKey::StrokeWeight => edits.stroke_weight.is_some(),
            PropertyKey::DashPattern => edits.dash_pattern.iter().any(Option::is_some),
            PropertyKey::Effects => !edits.effects.iter().all(|e| e.is_empty()),
            PropertyKey::SelectionColours => {
                !edits.selection_colours.iter().all(|e| e.is_empty())
            }
        }
    }
}

// ─── Model kinds ─────────────────────────────────────────────────────────

use PropertyKey as K;

const GENERIC_KEYS: &[PropertyKey] = &[K::X, K::Y, K::Width, K::Height, K::Rotation];

const RECTANGLE_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::CornerRadius,
    K::TopLeftRadius,
    K::TopRightRadius,
    K::BottomLeftRadius,
    K::BottomRightRadius,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
];

const ELLIPSE_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::CornerRadius,
    K::StartingAngle,
    K::EndingAngle,
    K::InnerRadius,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
];

const POLYGON_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::CornerRadius,
    K::PointCount,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
];

const STAR_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::CornerRadius,
    K::PointCount,
    K::InnerRadius,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
];

const GROUP_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
    K::SelectionColours,
];

const TEXT_KEYS: &[PropertyKey] = &[
    K::X,
    K::Y,
    K::Width,
    K::Height,
    K::Rotation,
    K::FontSize,
    K::LetterSpacing,
    K::LineHeight,
    K::ParagraphIndent,
    K::ParagraphSpacing,
    K::Fills,
    K::Strokes,
    K::StrokeWeight,
    K::DashPattern,
    K::Effects,
];

/// The closed set of property models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Rectangle,
    Ellipse,
    Polygon,
    Star,
    /// Groups and frames.
    Group,
    Text,
    /// Anything else, and nodes whose kind-specific model failed.
    Generic,
}

impl ModelKind {
    pub fn for_node(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Rectangle(_) => ModelKind::Rectangle,
            NodeKind::Ellipse(_) => ModelKind::Ellipse,
            NodeKind::Polygon(_) => ModelKind::Polygon,
            NodeKind::Star(_) => ModelKind::Star,
            NodeKind::Group | NodeKind::Frame(_) => ModelKind::Group,
            NodeKind::Text(_) => ModelKind::Text,
            NodeKind::Line | NodeKind::Vector | NodeKind::BooleanOperation => ModelKind::Generic,
        }
    }

    /// Keys in handler order.
    pub fn keys(self) -> &'static [PropertyKey] {
        match self {
            ModelKind::Rectangle => RECTANGLE_KEYS,
            ModelKind::Ellipse => ELLIPSE_KEYS,
            ModelKind::Polygon => POLYGON_KEYS,
            ModelKind::Star => STAR_KEYS,
            ModelKind::Group => GROUP_KEYS,
            ModelKind::Text => TEXT_KEYS,
            ModelKind::Generic => GENERIC_KEYS,
        }
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// A property value as read from the live node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Number(f64),
    Paints(Vec<Paint>),
    Effects(Vec<Effect>),
    Dashes(SmallVec<[f64; 2]>),
    LetterSpacing(LetterSpacing),
    LineHeight(LineHeight),
    Colours(ColourSet),
    /// The host reported a mixed value.
    Unavailable,
}

/// Label shown instead of the node type when a model is disabled.
pub const DISABLED_LABEL: &str = "CUSTOM";

/// Current values of one node, copied when its model was built.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub id: NodeId,
    pub name: String,
    /// Host type tag, or [`DISABLED_LABEL`].
    pub kind_label: &'static str,
    pub constrain_proportions: bool,
    pub stroke_miter_limit: f64,
    pub values: Vec<(PropertyKey, PropValue)>,
}

impl ModelSnapshot {
    pub fn get(&self, key: PropertyKey) -> Option<&PropValue> {
        self.values.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn number(&self, key: PropertyKey) -> Option<f64> {
        match self.get(key)? {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn mixed_number(value: &Mixed<f64>) -> PropValue {
    value.value().map_or(PropValue::Unavailable, |v| PropValue::Number(*v))
}

fn read_value(graph: &SceneGraph, idx: NodeIndex, node: &SceneNode, key: PropertyKey) -> PropValue {
    use PropValue::Number;

    match (key, &node.kind) {
        (K::X, _) => Number(node.x),
        (K::Y, _) => Number(node.y),
        (K::Width, _) => Number(node.width),
        (K::Height, _) => Number(node.height),
        (K::Rotation, _) => Number(node.rotation),

        (K::CornerRadius, NodeKind::Rectangle(r)) => mixed_number(&r.corner_radius),
        (K::CornerRadius, NodeKind::Ellipse(e)) => Number(e.corner_radius),
        (K::CornerRadius, NodeKind::Polygon(p)) => Number(p.corner_radius),
        (K::CornerRadius, NodeKind::Star(s)) => Number(s.corner_radius),
        (K::TopLeftRadius, NodeKind::Rectangle(r)) => Number(r.top_left_radius),
        (K::TopRightRadius, NodeKind::Rectangle(r)) => Number(r.top_right_radius),
        (K::BottomLeftRadius, NodeKind::Rectangle(r)) => Number(r.bottom_left_radius),
        (K::BottomRightRadius, NodeKind::Rectangle(r)) => Number(r.bottom_right_radius),

        (K::StartingAngle, NodeKind::Ellipse(e)) => Number(e.arc_data.starting_angle),
        (K::EndingAngle, NodeKind::Ellipse(e)) => Number(e.arc_data.ending_angle),
        (K::InnerRadius, NodeKind::Ellipse(e)) => Number(e.arc_data.inner_radius),
        (K::InnerRadius, NodeKind::Star(s)) => Number(s.inner_radius),
        (K::PointCount, NodeKind::Polygon(p)) => Number(f64::from(p.point_count)),
        (K::PointCount, NodeKind::Star(s)) => Number(f64::from(s.point_count)),

        (K::FontSize, NodeKind::Text(t)) => mixed_number(&t.font_size),
        (K::LetterSpacing, NodeKind::Text(t)) => PropValue::LetterSpacing(t.letter_spacing),
        (K::LineHeight, NodeKind::Text(t)) => PropValue::LineHeight(t.line_height),
        (K::ParagraphIndent, NodeKind::Text(t)) => Number(t.paragraph_indent),
        (K::ParagraphSpacing, NodeKind::Text(t)) => Number(t.paragraph_spacing),

        (K::Fills, _) => node
            .fills
            .clone()
            .map_or(PropValue::Unavailable, PropValue::Paints),
        (K::Strokes, _) => node
            .strokes
            .clone()
            .map_or(PropValue::Unavailable, PropValue::Paints),
        (K::StrokeWeight, _) => Number(node.stroke_weight),
        (K::DashPattern, _) => PropValue::Dashes(node.dash_pattern.clone()),
        (K::Effects, _) => PropValue::Effects(node.effects.clone()),
        (K::SelectionColours, _) => PropValue::Colours(ColourSet::collect(graph, idx)),

        _ => PropValue::Unavailable,
    }
}

// ─── Models ──────────────────────────────────────────────────────────────

/// Per-node property model.
#[derive(Debug, Clone)]
pub struct NodeModel {
    pub source: NodeIndex,
    pub kind: ModelKind,
    /// Set when a mixed value made the kind-specific model unusable.
    pub disabled: bool,
    /// Why the node fell back to [`ModelKind::Generic`], if it did.
    pub fallback: Option<ModelError>,
    pub snapshot: ModelSnapshot,
}

impl NodeModel {
    /// Build the model for `idx`, loading a text node's font first.
    pub fn build(
        graph: &SceneGraph,
        idx: NodeIndex,
        fonts: &mut dyn FontLoader,
    ) -> Result<Self, GraphError> {
        let node = graph.get(idx).ok_or(GraphError::NodeNotFound(idx))?;
        let mut kind = ModelKind::for_node(&node.kind);
        let mut fallback = None;

        if let NodeKind::Text(text) = &node.kind {
            if let Err(error) = prepare_text(text, fonts) {
                log::warn!("{}: {error}; using the generic model", node.id);
                kind = ModelKind::Generic;
                fallback = Some(error);
            }
        }

        let disabled = fallback.is_some();
        let values = kind
            .keys()
            .iter()
            .map(|&key| (key, read_value(graph, idx, node, key)))
            .collect();
        let snapshot = ModelSnapshot {
            id: node.id,
            name: node.name.clone(),
            kind_label: if disabled {
                DISABLED_LABEL
            } else {
                node.kind.type_name()
            },
            constrain_proportions: node.constrain_proportions,
            stroke_miter_limit: node.stroke_miter_limit,
            values,
        };

        log::debug!("{}: {:?} model with {} keys", node.id, kind, kind.keys().len());
        Ok(Self {
            source: idx,
            kind,
            disabled,
            fallback,
            snapshot,
        })
    }

    pub fn keys(&self) -> &'static [PropertyKey] {
        self.kind.keys()
    }

    /// Flattened selection colours of a group or frame.
    pub fn colours(&self) -> Option<&ColourSet> {
        match self.snapshot.get(PropertyKey::SelectionColours)? {
            PropValue::Colours(set) => Some(set),
            _ => None,
        }
    }
}

/// Check a text node can use the text model, loading its font.
fn prepare_text(
    text: &recur_core::TextShape,
    fonts: &mut dyn FontLoader,
) -> Result<(), ModelError> {
    if text.font_size.is_mixed() {
        return Err(ModelError::MixedValue { key: "fontSize" });
    }
    let Mixed::Value(font) = &text.font_name else {
        return Err(ModelError::MultipleFonts);
    };
    fonts.load_font(font).map_err(|reason| ModelError::FontLoad {
        family: font.family.clone(),
        style: font.style.clone(),
        reason,
    })
}

// ─── Handler context ─────────────────────────────────────────────────────

/// What a handler sees: the graph, the clone it mutates, that node's
/// compiled edits and its model.
pub struct HandlerCtx<'a> {
    pub graph: &'a mut SceneGraph,
    pub node: NodeIndex,
    pub edits: &'a mut CompiledEdits,
    pub model: &'a NodeModel,
}
