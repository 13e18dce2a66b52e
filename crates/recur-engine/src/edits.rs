//! Typed per-node instruction tree.
//!
//! [`NodeEdits`] has one optional slot per editable property. It is generic
//! over the slot payload so the same shape carries raw instructions from
//! the form ([`PropertyInstruction`]) and compiled ones with their running
//! state ([`CompiledInstruction`]).

use crate::error::CompileWarning;
use crate::instruction::{CompiledInstruction, PropertyInstruction};
use recur_core::{NodeId, Point};
use serde::{Deserialize, Serialize};

// ─── Slot shapes ─────────────────────────────────────────────────────────

/// Channels of a colour, edited as r/g/b 0–255 and a 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorEdit<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<T>,
}

impl<T> Default for ColorEdit<T> {
    fn default() -> Self {
        Self {
            r: None,
            g: None,
            b: None,
            a: None,
        }
    }
}

impl<T> ColorEdit<T> {
    pub fn is_empty(&self) -> bool {
        self.r.is_none() && self.g.is_none() && self.b.is_none() && self.a.is_none()
    }

    fn map<U>(&self, path: &str, f: &mut impl FnMut(&str, &T) -> Option<U>) -> ColorEdit<U> {
        let mut slot = |name: &str, v: &Option<T>| {
            v.as_ref().and_then(|v| f(&format!("{path}.{name}"), v))
        };
        ColorEdit {
            r: slot("r", &self.r),
            g: slot("g", &self.g),
            b: slot("b", &self.b),
            a: slot("a", &self.a),
        }
    }
}

/// Image paint adjustments, each edited on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEdit<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadows: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<T>,
}

impl<T> Default for ImageEdit<T> {
    fn default() -> Self {
        Self {
            contrast: None,
            exposure: None,
            highlights: None,
            saturation: None,
            shadows: None,
            temperature: None,
            tint: None,
            opacity: None,
        }
    }
}

impl<T> ImageEdit<T> {
    pub fn filter_mut(&mut self, filter: recur_core::ImageFilter) -> &mut Option<T> {
        use recur_core::ImageFilter;
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

    pub fn is_empty(&self) -> bool {
        [
            &self.contrast,
            &self.exposure,
            &self.highlights,
            &self.saturation,
            &self.shadows,
            &self.temperature,
            &self.tint,
            &self.opacity,
        ]
        .iter()
        .all(|slot| slot.is_none())
    }

    fn map<U>(&self, path: &str, f: &mut impl FnMut(&str, &T) -> Option<U>) -> ImageEdit<U> {
        let mut slot = |name: &str, v: &Option<T>| {
            v.as_ref().and_then(|v| f(&format!("{path}.{name}"), v))
        };
        ImageEdit {
            contrast: slot("contrast", &self.contrast),
            exposure: slot("exposure", &self.exposure),
            highlights: slot("highlights", &self.highlights),
            saturation: slot("saturation", &self.saturation),
            shadows: slot("shadows", &self.shadows),
            temperature: slot("temperature", &self.temperature),
            tint: slot("tint", &self.tint),
            opacity: slot("opacity", &self.opacity),
        }
    }
}

/// Edits for one fill/stroke, matched to the paint at the same index.
///
/// A gradient is edited stop-by-stop; `{}` is an untouched paint of any
/// kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaintEdit<T> {
    Gradient(Vec<ColorEdit<T>>),
    Color(ColorEdit<T>),
    Image(ImageEdit<T>),
}

impl<T> Default for PaintEdit<T> {
    fn default() -> Self {
        PaintEdit::Color(ColorEdit::default())
    }
}

impl<T> PaintEdit<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            PaintEdit::Gradient(stops) => stops.iter().all(ColorEdit::is_empty),
            PaintEdit::Color(c) => c.is_empty(),
            PaintEdit::Image(i) => i.is_empty(),
        }
    }

    fn map<U>(&self, path: &str, f: &mut impl FnMut(&str, &T) -> Option<U>) -> PaintEdit<U> {
        match self {
            PaintEdit::Gradient(stops) => PaintEdit::Gradient(
                stops
                    .iter()
                    .enumerate()
                    .map(|(i, stop)| stop.map(&format!("{path}[{i}]"), f))
                    .collect(),
            ),
            PaintEdit::Color(c) => PaintEdit::Color(c.map(path, f)),
            PaintEdit::Image(i) => PaintEdit::Image(i.map(path, f)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetEdit<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<T>,
}

/// Edits for one effect. Blurs only use `radius`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEdit<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorEdit<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<OffsetEdit<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<T>,
}

impl<T> Default for EffectEdit<T> {
    fn default() -> Self {
        Self {
            color: None,
            offset: None,
            radius: None,
            spread: None,
        }
    }
}

impl<T> EffectEdit<T> {
    pub fn is_empty(&self) -> bool {
        self.color.as_ref().is_none_or(ColorEdit::is_empty)
            && self
                .offset
                .as_ref()
                .is_none_or(|o| o.x.is_none() && o.y.is_none())
            && self.radius.is_none()
            && self.spread.is_none()
    }

    fn map<U>(&self, path: &str, f: &mut impl FnMut(&str, &T) -> Option<U>) -> EffectEdit<U> {
        let color = self
            .color
            .as_ref()
            .map(|c| c.map(&format!("{path}.color"), &mut *f));
        let offset = self.offset.as_ref().map(|o| OffsetEdit {
            x: o.x.as_ref().and_then(|v| f(&format!("{path}.offset.x"), v)),
            y: o.y.as_ref().and_then(|v| f(&format!("{path}.offset.y"), v)),
        });
        EffectEdit {
            color,
            offset,
            radius: self.radius.as_ref().and_then(|v| f(&format!("{path}.radius"), v)),
            spread: self.spread.as_ref().and_then(|v| f(&format!("{path}.spread"), v)),
        }
    }
}

// ─── Node edits ──────────────────────────────────────────────────────────

fn dashes_are_empty<T>(dashes: &[Option<T>; 2]) -> bool {
    dashes.iter().all(Option::is_none)
}

/// Every editable slot of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct NodeEdits<T> {
    pub x: Option<T>,
    pub y: Option<T>,
    pub width: Option<T>,
    pub height: Option<T>,
    pub rotation: Option<T>,

    pub corner_radius: Option<T>,
    pub top_left_radius: Option<T>,
    pub top_right_radius: Option<T>,
    pub bottom_left_radius: Option<T>,
    pub bottom_right_radius: Option<T>,

    pub starting_angle: Option<T>,
    pub ending_angle: Option<T>,
    pub inner_radius: Option<T>,
    pub point_count: Option<T>,

    pub font_size: Option<T>,
    pub letter_spacing: Option<T>,
    pub line_height: Option<T>,
    pub paragraph_indent: Option<T>,
    pub paragraph_spacing: Option<T>,

    pub stroke_weight: Option<T>,
    /// `[dash length, gap]`, each independently editable.
    #[serde(default = "no_dashes", skip_serializing_if = "dashes_are_empty")]
    pub dash_pattern: [Option<T>; 2],

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<PaintEdit<T>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<PaintEdit<T>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectEdit<T>>,
    /// One entry per flattened selection-colour slot of a group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection_colours: Vec<PaintEdit<T>>,
}

fn no_dashes<T>() -> [Option<T>; 2] {
    [None, None]
}

impl<T> Default for NodeEdits<T> {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: None,
            height: None,
            rotation: None,
            corner_radius: None,
            top_left_radius: None,
            top_right_radius: None,
            bottom_left_radius: None,
            bottom_right_radius: None,
            starting_angle: None,
            ending_angle: None,
            inner_radius: None,
            point_count: None,
            font_size: None,
            letter_spacing: None,
            line_height: None,
            paragraph_indent: None,
            paragraph_spacing: None,
            stroke_weight: None,
            dash_pattern: no_dashes(),
            fills: Vec::new(),
            strokes: Vec::new(),
            effects: Vec::new(),
            selection_colours: Vec::new(),
        }
    }
}

impl<T> NodeEdits<T> {
    /// The scalar slots with their wire names.
    fn scalars(&self) -> [(&'static str, &Option<T>); 20] {
        [
            ("x", &self.x),
            ("y", &self.y),
            ("width", &self.width),
            ("height", &self.height),
            ("rotation", &self.rotation),
            ("cornerRadius", &self.corner_radius),
            ("topLeftRadius", &self.top_left_radius),
            ("topRightRadius", &self.top_right_radius),
            ("bottomLeftRadius", &self.bottom_left_radius),
            ("bottomRightRadius", &self.bottom_right_radius),
            ("startingAngle", &self.starting_angle),
            ("endingAngle", &self.ending_angle),
            ("innerRadius", &self.inner_radius),
            ("pointCount", &self.point_count),
            ("fontSize", &self.font_size),
            ("letterSpacing", &self.letter_spacing),
            ("lineHeight", &self.line_height),
            ("paragraphIndent", &self.paragraph_indent),
            ("paragraphSpacing", &self.paragraph_spacing),
            ("strokeWeight", &self.stroke_weight),
        ]
    }

    /// True when no slot anywhere in the tree carries an instruction.
    pub fn is_empty(&self) -> bool {
        self.scalars().iter().all(|(_, slot)| slot.is_none())
            && dashes_are_empty(&self.dash_pattern)
            && self.fills.iter().all(PaintEdit::is_empty)
            && self.strokes.iter().all(PaintEdit::is_empty)
            && self.effects.iter().all(EffectEdit::is_empty)
            && self.selection_colours.iter().all(PaintEdit::is_empty)
    }

    /// Map every present slot through `f`, which receives the slot path
    /// (`"width"`, `"fills[0].r"`, ...). Slots for which `f` returns `None`
    /// are left empty.
    pub fn map_slots<U>(&self, mut f: impl FnMut(&str, &T) -> Option<U>) -> NodeEdits<U> {
        let mut scalar = |name: &str, v: &Option<T>| v.as_ref().and_then(|v| f(name, v));
        let mut out = NodeEdits {
            x: scalar("x", &self.x),
            y: scalar("y", &self.y),
            width: scalar("width", &self.width),
            height: scalar("height", &self.height),
            rotation: scalar("rotation", &self.rotation),
            corner_radius: scalar("cornerRadius", &self.corner_radius),
            top_left_radius: scalar("topLeftRadius", &self.top_left_radius),
            top_right_radius: scalar("topRightRadius", &self.top_right_radius),
            bottom_left_radius: scalar("bottomLeftRadius", &self.bottom_left_radius),
            bottom_right_radius: scalar("bottomRightRadius", &self.bottom_right_radius),
            starting_angle: scalar("startingAngle", &self.starting_angle),
            ending_angle: scalar("endingAngle", &self.ending_angle),
            inner_radius: scalar("innerRadius", &self.inner_radius),
            point_count: scalar("pointCount", &self.point_count),
            font_size: scalar("fontSize", &self.font_size),
            letter_spacing: scalar("letterSpacing", &self.letter_spacing),
            line_height: scalar("lineHeight", &self.line_height),
            paragraph_indent: scalar("paragraphIndent", &self.paragraph_indent),
            paragraph_spacing: scalar("paragraphSpacing", &self.paragraph_spacing),
            stroke_weight: scalar("strokeWeight", &self.stroke_weight),
            dash_pattern: [
                scalar("dashPattern[0]", &self.dash_pattern[0]),
                scalar("dashPattern[1]", &self.dash_pattern[1]),
            ],
            ..NodeEdits::default()
        };

        let paints = |name: &str, list: &[PaintEdit<T>], f: &mut dyn FnMut(&str, &T) -> Option<U>| {
            let mut f = |p: &str, v: &T| f(p, v);
            list.iter()
                .enumerate()
                .map(|(i, edit)| edit.map(&format!("{name}[{i}]"), &mut f))
                .collect::<Vec<_>>()
        };
        out.fills = paints("fills", &self.fills, &mut f);
        out.strokes = paints("strokes", &self.strokes, &mut f);
        out.selection_colours = paints("selectionColours", &self.selection_colours, &mut f);
        out.effects = self
            .effects
            .iter()
            .enumerate()
            .map(|(i, edit)| edit.map(&format!("effects[{i}]"), &mut f))
            .collect();
        out
    }
}

// ─── Compilation ─────────────────────────────────────────────────────────

/// Compiled edits for one node plus the per-node state handlers share
/// across additions.
#[derive(Debug, Clone, Default)]
pub struct CompiledEdits {
    pub edits: NodeEdits<CompiledInstruction>,
    /// Top-left corner the rotation pivots around, fixed on first use.
    pub rotation_anchor: Option<Point>,
}

impl NodeEdits<PropertyInstruction> {
    /// Compile every slot. A slot that fails is dropped and reported; the
    /// rest of the tree is unaffected.
    pub fn compile(&self, node: NodeId) -> (CompiledEdits, Vec<CompileWarning>) {
        let mut warnings = Vec::new();
        let edits = self.map_slots(|path, raw| match raw.compile() {
            Ok(compiled) => {
                log::trace!("{node}: {path} = `{}` ({})", compiled.expression, compiled.breakpoint);
                Some(compiled)
            }
            Err(error) => {
                log::warn!("{node}: discarding {path}: {error}");
                warnings.push(CompileWarning {
                    node,
                    path: path.to_string(),
                    error,
                });
                None
            }
        });
        (
            CompiledEdits {
                edits,
                rotation_anchor: None,
            },
            warnings,
        )
    }
}
