//! Host document model.
//!
//! Mirrors the node API of the design tool the engine runs inside: a tree
//! of typed nodes carrying paints, effects and shape data, with `clone`,
//! `resize`, an affine `relativeTransform` and a current selection. Values
//! the host reports as "multiple differing values" are modelled as
//! [`Mixed::Mixed`].

use crate::error::GraphError;
use crate::id::NodeId;
use kurbo::{Affine, Vec2};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Mixed values ────────────────────────────────────────────────────────

/// A property value, or the host's sentinel for "the selection spans more
/// than one value" (e.g. a text node with two font sizes).
#[derive(Debug, Clone, PartialEq)]
pub enum Mixed<T> {
    Value(T),
    Mixed,
}

impl<T> Mixed<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Mixed::Value(v) => Some(v),
            Mixed::Mixed => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Mixed::Mixed)
    }
}

impl<T: Default> Default for Mixed<T> {
    fn default() -> Self {
        Mixed::Value(T::default())
    }
}

/// Wire marker for [`Mixed::Mixed`].
const MIXED_MARKER: &str = "MIXED";

impl<T: Serialize> Serialize for Mixed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Mixed::Value(v) => v.serialize(serializer),
            Mixed::Mixed => serializer.serialize_str(MIXED_MARKER),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Mixed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.as_str() == Some(MIXED_MARKER) {
            return Ok(Mixed::Mixed);
        }
        serde_json::from_value(raw)
            .map(Mixed::Value)
            .map_err(de::Error::custom)
    }
}

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGB color, channels in [0.0, 1.0]. Solid paints keep opacity beside it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// RGBA color, channels in [0.0, 1.0]. Used by gradient stops and shadows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradientKind {
    Linear,
    Radial,
    Angular,
    Diamond,
}

/// Named image adjustments, each stored in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFilter {
    Contrast,
    Exposure,
    Highlights,
    Saturation,
    Shadows,
    Temperature,
    Tint,
}

impl ImageFilter {
    /// Display order used by the form layer.
    pub const ALL: [ImageFilter; 7] = [
        ImageFilter::Contrast,
        ImageFilter::Exposure,
        ImageFilter::Highlights,
        ImageFilter::Saturation,
        ImageFilter::Shadows,
        ImageFilter::Temperature,
        ImageFilter::Tint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFilter::Contrast => "contrast",
            ImageFilter::Exposure => "exposure",
            ImageFilter::Highlights => "highlights",
            ImageFilter::Saturation => "saturation",
            ImageFilter::Shadows => "shadows",
            ImageFilter::Temperature => "temperature",
            ImageFilter::Tint => "tint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    pub contrast: f64,
    pub exposure: f64,
    pub highlights: f64,
    pub saturation: f64,
    pub shadows: f64,
    pub temperature: f64,
    pub tint: f64,
}

impl ImageFilters {
    pub fn get(&self, filter: ImageFilter) -> f64 {
        match filter {
            ImageFilter::Contrast => self.contrast,
            ImageFilter::Exposure => self.exposure,
            ImageFilter::Highlights => self.highlights,
            ImageFilter::Saturation => self.saturation,
            ImageFilter::Shadows => self.shadows,
            ImageFilter::Temperature => self.temperature,
            ImageFilter::Tint => self.tint,
        }
    }

    pub fn get_mut(&mut self, filter: ImageFilter) -> &mut f64 {
        match filter {
            ImageFilter::Contrast => &mut self.contrast,
            ImageFilter::Exposure => &mut self.exposure,
            ImageFilter::Highlights => &mut self.highlights,
            ImageFilter::Saturation => &mut self.saturation,
            ImageFilter::Shadows => &mut self.shadows,
            ImageFilter::Temperature => &mut self.temperature,
            ImageFilter::Tint => &mut self.tint,
        }
    }
}

fn full_opacity() -> f64 {
    1.0
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        color: Rgb,
        #[serde(default = "full_opacity")]
        opacity: f64,
    },
    Gradient {
        kind: GradientKind,
        stops: Vec<ColorStop>,
    },
    Image {
        #[serde(default)]
        filters: ImageFilters,
        #[serde(default = "full_opacity")]
        opacity: f64,
    },
}

impl Paint {
    pub fn solid(r: f64, g: f64, b: f64, opacity: f64) -> Self {
        Paint::Solid {
            color: Rgb::new(r, g, b),
            opacity,
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

fn visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: Rgba,
    pub offset: Offset,
    pub radius: f64,
    #[serde(default)]
    pub spread: f64,
    #[serde(default = "visible")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blur {
    pub radius: f64,
    #[serde(default = "visible")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    DropShadow(Shadow),
    InnerShadow(Shadow),
    LayerBlur(Blur),
    BackgroundBlur(Blur),
}

impl Effect {
    pub fn type_name(&self) -> &'static str {
        match self {
            Effect::DropShadow(_) => "DROP_SHADOW",
            Effect::InnerShadow(_) => "INNER_SHADOW",
            Effect::LayerBlur(_) => "LAYER_BLUR",
            Effect::BackgroundBlur(_) => "BACKGROUND_BLUR",
        }
    }
}

// ─── Shape payloads ──────────────────────────────────────────────────────

/// Arc of an ellipse. Angles in radians, inner radius in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcData {
    pub starting_angle: f64,
    pub ending_angle: f64,
    pub inner_radius: f64,
}

impl Default for ArcData {
    fn default() -> Self {
        Self {
            starting_angle: 0.0,
            ending_angle: std::f64::consts::TAU,
            inner_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RectangleShape {
    /// Mixed when the four corners differ.
    pub corner_radius: Mixed<f64>,
    pub top_left_radius: f64,
    pub top_right_radius: f64,
    pub bottom_left_radius: f64,
    pub bottom_right_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EllipseShape {
    pub corner_radius: f64,
    pub arc_data: ArcData,
}

fn default_point_count() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonShape {
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default = "default_point_count")]
    pub point_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarShape {
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default = "default_point_count")]
    pub point_count: u32,
    /// Ratio of inner to outer radius, [0.0, 1.0].
    #[serde(default)]
    pub inner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameShape {
    pub corner_radius: f64,
    pub clips_content: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl Default for FontName {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            style: "Regular".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LengthUnit {
    #[default]
    Pixels,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineHeightUnit {
    Pixels,
    Percent,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterSpacing {
    pub value: f64,
    pub unit: LengthUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineHeight {
    /// Ignored when `unit` is `Auto`.
    pub value: f64,
    pub unit: LineHeightUnit,
}

fn default_font_size() -> Mixed<f64> {
    Mixed::Value(12.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShape {
    #[serde(default)]
    pub characters: String,
    #[serde(default = "default_font_size")]
    pub font_size: Mixed<f64>,
    #[serde(default)]
    pub font_name: Mixed<FontName>,
    #[serde(default)]
    pub letter_spacing: LetterSpacing,
    #[serde(default)]
    pub line_height: LineHeight,
    #[serde(default)]
    pub paragraph_indent: f64,
    #[serde(default)]
    pub paragraph_spacing: f64,
}

impl Default for TextShape {
    fn default() -> Self {
        Self {
            characters: String::new(),
            font_size: default_font_size(),
            font_name: Mixed::default(),
            letter_spacing: LetterSpacing::default(),
            line_height: LineHeight::default(),
            paragraph_indent: 0.0,
            paragraph_spacing: 0.0,
        }
    }
}

// ─── Scene Graph Nodes ───────────────────────────────────────────────────

/// The node kinds the host can report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Rectangle(RectangleShape),
    Ellipse(EllipseShape),
    Polygon(PolygonShape),
    Star(StarShape),
    Group,
    Frame(FrameShape),
    Text(TextShape),
    Line,
    Vector,
    BooleanOperation,
}

impl NodeKind {
    /// The host's type tag (`"RECTANGLE"`, `"TEXT"`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Rectangle(_) => "RECTANGLE",
            NodeKind::Ellipse(_) => "ELLIPSE",
            NodeKind::Polygon(_) => "POLYGON",
            NodeKind::Star(_) => "STAR",
            NodeKind::Group => "GROUP",
            NodeKind::Frame(_) => "FRAME",
            NodeKind::Text(_) => "TEXT",
            NodeKind::Line => "LINE",
            NodeKind::Vector => "VECTOR",
            NodeKind::BooleanOperation => "BOOLEAN_OPERATION",
        }
    }

    /// Groups and boolean operations have no fills or strokes of their own.
    pub fn has_paints(&self) -> bool {
        !matches!(self, NodeKind::Group | NodeKind::BooleanOperation)
    }

    /// Whether nodes of this kind may hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Group | NodeKind::Frame(_) | NodeKind::BooleanOperation
        )
    }
}

fn default_stroke_weight() -> f64 {
    1.0
}

fn default_miter_limit() -> f64 {
    4.0
}

/// A single node in the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    pub kind: NodeKind,

    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Degrees, derived from the relative transform.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub constrain_proportions: bool,

    /// `None` when the node kind has no fills property at all (groups).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Paint>>,
    #[serde(default = "default_stroke_weight")]
    pub stroke_weight: f64,
    #[serde(default = "default_miter_limit")]
    pub stroke_miter_limit: f64,
    /// `[dash length, gap]`; empty for a solid stroke.
    #[serde(default)]
    pub dash_pattern: SmallVec<[f64; 2]>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        let has_paints = kind.has_paints();
        Self {
            id,
            name: id.as_str().to_string(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            constrain_proportions: false,
            fills: has_paints.then(Vec::new),
            strokes: has_paints.then(Vec::new),
            stroke_weight: default_stroke_weight(),
            stroke_miter_limit: default_miter_limit(),
            dash_pattern: SmallVec::new(),
            effects: Vec::new(),
        }
    }

    /// Give paint-carrying kinds empty fill and stroke lists when the
    /// source omitted them.
    pub(crate) fn fill_missing_paints(&mut self) {
        if self.kind.has_paints() {
            self.fills.get_or_insert_with(Vec::new);
            self.strokes.get_or_insert_with(Vec::new);
        }
    }

    /// Builder-style size setter.
    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// The host's `relativeTransform`: translation to (x, y), then rotation.
    pub fn relative_transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::rotate(self.rotation.to_radians())
    }

    /// Write the host's `relativeTransform`; x, y and rotation are re-derived.
    pub fn set_relative_transform(&mut self, transform: Affine) {
        let [a, b, _c, _d, e, f] = transform.as_coeffs();
        self.x = e;
        self.y = f;
        self.rotation = b.atan2(a).to_degrees();
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The host document: a tree of `SceneNode`s under an implicit page root.
///
/// Edges go from parent → child. Child order is kept explicitly so clones
/// can be inserted next to their source.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The page node every top-level node hangs off.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Children of each node in document (z) order.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// The host's current selection.
    selection: Vec<NodeIndex>,
}

impl SceneGraph {
    /// Create an empty document with a page root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let page = SceneNode::new(NodeId::intern("page"), NodeKind::Group);
        let root = graph.add_node(page);

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::intern("page"), root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
            selection: Vec::new(),
        }
    }

    /// Add a node as the last child of `parent`. Returns the new node's index.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add a node directly after `sibling` in its parent's child list.
    fn insert_after(&mut self, sibling: NodeIndex, node: SceneNode) -> NodeIndex {
        let parent = self.parent(sibling).unwrap_or(self.root);
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        let order = self.child_order.entry(parent).or_default();
        let pos = order
            .iter()
            .position(|&c| c == sibling)
            .map_or(order.len(), |p| p + 1);
        order.insert(pos, idx);
        self.id_index.insert(id, idx);
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&SceneNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut SceneNode> {
        self.graph.node_weight_mut(idx)
    }

    /// Look up a node by its id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Get the index for a NodeId.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map_or(&[], Vec::as_slice)
    }

    /// Every descendant of `idx` in depth-first pre-order (the host's
    /// `findAll`). `idx` itself is not included.
    pub fn find_all(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.collect_descendants(idx, &mut out);
        out
    }

    fn collect_descendants(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        for &child in self.children(idx) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Deep-copy the subtree at `idx` with fresh ids and insert it as the
    /// next sibling of the source. Returns the index of the copy.
    pub fn clone_node(&mut self, idx: NodeIndex) -> Result<NodeIndex, GraphError> {
        if idx == self.root {
            return Err(GraphError::CannotCloneRoot);
        }
        let mut copy = self.get(idx).ok_or(GraphError::NodeNotFound(idx))?.clone();
        copy.id = NodeId::clone_of(copy.id);
        let new_idx = self.insert_after(idx, copy);
        self.clone_children(idx, new_idx);
        Ok(new_idx)
    }

    fn clone_children(&mut self, from: NodeIndex, to: NodeIndex) {
        let children = self.children(from).to_vec();
        for child in children {
            let Some(node) = self.get(child) else { continue };
            let mut copy = node.clone();
            copy.id = NodeId::clone_of(copy.id);
            let copy_idx = self.add_node(to, copy);
            self.clone_children(child, copy_idx);
        }
    }

    /// Resize a node, keeping its position. Each axis is clamped to the
    /// host's 0.01 minimum.
    pub fn resize(&mut self, idx: NodeIndex, width: f64, height: f64) -> Result<(), GraphError> {
        let node = self.get_mut(idx).ok_or(GraphError::NodeNotFound(idx))?;
        if !width.is_finite() || !height.is_finite() {
            return Err(GraphError::InvalidSize { width, height });
        }
        node.width = width.max(MIN_DIMENSION);
        node.height = height.max(MIN_DIMENSION);
        Ok(())
    }

    /// The host's current selection.
    pub fn selection(&self) -> &[NodeIndex] {
        &self.selection
    }

    /// Replace the host's current selection. Unknown indices are dropped.
    pub fn set_selection(&mut self, selection: Vec<NodeIndex>) {
        self.selection = selection
            .into_iter()
            .filter(|idx| self.graph.contains_node(*idx))
            .collect();
    }
}

/// Smallest width or height the host accepts.
pub const MIN_DIMENSION: f64 = 0.01;

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
