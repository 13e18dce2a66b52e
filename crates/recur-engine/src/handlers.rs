//! Property handlers.
//!
//! Each handler reads the clone's live value, folds it through the slot's
//! [`CompiledInstruction`] and writes the result back. A handler whose slot
//! is empty does nothing.

use crate::edits::{ColorEdit, CompiledEdits, EffectEdit, PaintEdit};
use crate::error::ApplyError;
use crate::instruction::CompiledInstruction;
use crate::property::HandlerCtx;
use recur_core::{
    Affine, Effect, ImageFilter, LengthUnit, LineHeightUnit, Mixed, NodeIndex, NodeKind, Paint,
    Point, RectangleShape, Rgba, SceneGraph, SceneNode,
};
use std::f64::consts::TAU;

/// Colour channels are edited as 0–255.
const RGB_SCALE: f64 = 255.0;
/// Alpha, opacity, inner radius and image filters are edited as 0–100.
const PERCENT_SCALE: f64 = 100.0;

type Edits = crate::edits::NodeEdits<CompiledInstruction>;
type Slot = fn(&mut Edits) -> &mut Option<CompiledInstruction>;

fn node_mut(graph: &mut SceneGraph, idx: NodeIndex) -> Result<&mut SceneNode, ApplyError> {
    graph.get_mut(idx).ok_or_else(|| ApplyError::missing(idx))
}

/// Run `apply` with the clone and the instruction in `slot`, if any.
fn with_slot(
    ctx: &mut HandlerCtx<'_>,
    slot: Slot,
    apply: impl FnOnce(&mut SceneNode, &mut CompiledInstruction) -> Result<(), ApplyError>,
) -> Result<(), ApplyError> {
    let Some(inst) = slot(&mut ctx.edits.edits).as_mut() else {
        return Ok(());
    };
    let node = node_mut(ctx.graph, ctx.node)?;
    apply(node, inst)
}

// ─── Position & size ─────────────────────────────────────────────────────

pub fn x(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_slot(ctx, |e| &mut e.x, |node, inst| {
        node.x = inst.accumulate_unbounded(node.x);
        Ok(())
    })
}

pub fn y(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_slot(ctx, |e| &mut e.y, |node, inst| {
        node.y = inst.accumulate_unbounded(node.y);
        Ok(())
    })
}

pub fn width(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let Some(inst) = ctx.edits.edits.width.as_mut() else {
        return Ok(());
    };
    let node = ctx.graph.get(ctx.node).ok_or_else(|| ApplyError::missing(ctx.node))?;
    let (width, height) = (inst.accumulate(node.width), node.height);
    ctx.graph.resize(ctx.node, width, height)?;
    Ok(())
}

pub fn height(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let Some(inst) = ctx.edits.edits.height.as_mut() else {
        return Ok(());
    };
    let node = ctx.graph.get(ctx.node).ok_or_else(|| ApplyError::missing(ctx.node))?;
    let (width, height) = (node.width, inst.accumulate(node.height));
    ctx.graph.resize(ctx.node, width, height)?;
    Ok(())
}

// ─── Rotation ────────────────────────────────────────────────────────────

/// Top-left corner of the node with its current rotation undone.
fn unrotated_top_left(node: &SceneNode) -> Point {
    let (cx, cy) = (node.width / 2.0, node.height / 2.0);
    let (sin, cos) = node.rotation.to_radians().sin_cos();
    Point::new(
        node.x - (cx - cx * cos - cy * sin),
        node.y - (cy + cx * sin - cy * cos),
    )
}

/// Anchor taken the first time rotation runs in a pass.
fn anchor_at_rest(node: &SceneNode) -> Point {
    if node.rotation == 0.0 {
        Point::new(node.x, node.y)
    } else {
        unrotated_top_left(node)
    }
}

/// Anchor after x or y moved the clone earlier in the same pass.
fn anchor_after_move(node: &SceneNode) -> Point {
    unrotated_top_left(node)
}

/// Rotation by `degrees` about the centre of a `width` × `height` box whose
/// unrotated top-left corner is `anchor`.
fn rotation_about_centre(anchor: Point, width: f64, height: f64, degrees: f64) -> Affine {
    let (cx, cy) = (width / 2.0, height / 2.0);
    let (sin, cos) = degrees.to_radians().sin_cos();
    Affine::new([
        cos,
        sin,
        -sin,
        cos,
        anchor.x + (cx - cx * cos + cy * sin),
        anchor.y + (cy - cx * sin - cy * cos),
    ])
}

pub fn rotation(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let CompiledEdits {
        edits,
        rotation_anchor,
    } = &mut *ctx.edits;
    let moved = edits.x.is_some() || edits.y.is_some();
    let Some(inst) = edits.rotation.as_mut() else {
        return Ok(());
    };
    let node = node_mut(ctx.graph, ctx.node)?;

    let degrees = inst.accumulate(node.rotation);
    let anchor = if moved {
        *rotation_anchor.insert(anchor_after_move(node))
    } else {
        *rotation_anchor.get_or_insert_with(|| anchor_at_rest(node))
    };
    node.set_relative_transform(rotation_about_centre(
        anchor,
        node.width,
        node.height,
        degrees,
    ));
    Ok(())
}

// ─── Corners ─────────────────────────────────────────────────────────────

fn uniform_radius(rect: &RectangleShape) -> Mixed<f64> {
    let corners = [
        rect.top_left_radius,
        rect.top_right_radius,
        rect.bottom_left_radius,
        rect.bottom_right_radius,
    ];
    if corners.iter().all(|&r| r == corners[0]) {
        Mixed::Value(corners[0])
    } else {
        Mixed::Mixed
    }
}

pub fn corner_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, |e| &mut e.corner_radius, |node, inst| {
        match &mut node.kind {
            NodeKind::Rectangle(rect) => {
                let Mixed::Value(live) = rect.corner_radius else {
                    log::warn!("{}: corners differ, skipping cornerRadius", node.id);
                    return Ok(());
                };
                let radius = inst.accumulate(live);
                rect.corner_radius = Mixed::Value(radius);
                rect.top_left_radius = radius;
                rect.top_right_radius = radius;
                rect.bottom_left_radius = radius;
                rect.bottom_right_radius = radius;
            }
            NodeKind::Ellipse(e) => e.corner_radius = inst.accumulate(e.corner_radius),
            NodeKind::Polygon(p) => p.corner_radius = inst.accumulate(p.corner_radius),
            NodeKind::Star(s) => s.corner_radius = inst.accumulate(s.corner_radius),
            _ => return Err(ApplyError::kind_mismatch(idx, "rounded")),
        }
        Ok(())
    })
}

fn corner(
    ctx: &mut HandlerCtx<'_>,
    slot: Slot,
    pick: fn(&mut RectangleShape) -> &mut f64,
) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, slot, |node, inst| {
        let NodeKind::Rectangle(rect) = &mut node.kind else {
            return Err(ApplyError::kind_mismatch(idx, "RECTANGLE"));
        };
        let radius = pick(rect);
        *radius = inst.accumulate(*radius);
        rect.corner_radius = uniform_radius(rect);
        Ok(())
    })
}

pub fn top_left_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    corner(ctx, |e| &mut e.top_left_radius, |r| &mut r.top_left_radius)
}

pub fn top_right_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    corner(ctx, |e| &mut e.top_right_radius, |r| &mut r.top_right_radius)
}

pub fn bottom_left_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    corner(ctx, |e| &mut e.bottom_left_radius, |r| &mut r.bottom_left_radius)
}

pub fn bottom_right_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    corner(ctx, |e| &mut e.bottom_right_radius, |r| &mut r.bottom_right_radius)
}

// ─── Arcs, points & stars ────────────────────────────────────────────────

/// Moves the start of the arc, keeping its sweep.
pub fn starting_angle(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, |e| &mut e.starting_angle, |node, inst| {
        let NodeKind::Ellipse(ellipse) = &mut node.kind else {
            return Err(ApplyError::kind_mismatch(idx, "ELLIPSE"));
        };
        let arc = &mut ellipse.arc_data;
        let start = inst.accumulate(arc.starting_angle.to_degrees()).to_radians();
        arc.ending_angle = arc.ending_angle - arc.starting_angle + start;
        arc.starting_angle = start;
        Ok(())
    })
}

/// The sweep is edited as a percentage of a full turn from the start.
pub fn ending_angle(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, |e| &mut e.ending_angle, |node, inst| {
        let NodeKind::Ellipse(ellipse) = &mut node.kind else {
            return Err(ApplyError::kind_mismatch(idx, "ELLIPSE"));
        };
        let arc = &mut ellipse.arc_data;
        let sweep = (arc.ending_angle - arc.starting_angle) / TAU * PERCENT_SCALE;
        let sweep = inst.accumulate(sweep);
        arc.ending_angle = sweep / PERCENT_SCALE * TAU + arc.starting_angle;
        Ok(())
    })
}

pub fn inner_radius(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, |e| &mut e.inner_radius, |node, inst| {
        let ratio = match &mut node.kind {
            NodeKind::Ellipse(e) => &mut e.arc_data.inner_radius,
            NodeKind::Star(s) => &mut s.inner_radius,
            _ => return Err(ApplyError::kind_mismatch(idx, "ELLIPSE or STAR")),
        };
        *ratio = inst.accumulate_scaled(*ratio, PERCENT_SCALE);
        Ok(())
    })
}

/// Point counts are whole and never below a triangle.
fn to_point_count(value: f64) -> u32 {
    value.round().max(3.0) as u32
}

pub fn point_count(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, |e| &mut e.point_count, |node, inst| {
        let count = match &mut node.kind {
            NodeKind::Polygon(p) => &mut p.point_count,
            NodeKind::Star(s) => &mut s.point_count,
            _ => return Err(ApplyError::kind_mismatch(idx, "POLYGON or STAR")),
        };
        *count = to_point_count(inst.accumulate(f64::from(*count)));
        Ok(())
    })
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Line height the host uses for `AUTO`.
fn auto_line_height(font_size: f64) -> f64 {
    (font_size * 2f64.powf(1.0 / 5.0)).round()
}

fn percent_of(font_size: f64, percent: f64) -> f64 {
    (font_size * (percent / 100.0)).round()
}

/// Run `apply` on a text clone with a single font size.
fn with_text(
    ctx: &mut HandlerCtx<'_>,
    slot: Slot,
    apply: impl FnOnce(&mut recur_core::TextShape, f64, &mut CompiledInstruction),
) -> Result<(), ApplyError> {
    let idx = ctx.node;
    with_slot(ctx, slot, |node, inst| {
        let NodeKind::Text(text) = &mut node.kind else {
            return Err(ApplyError::kind_mismatch(idx, "TEXT"));
        };
        let Mixed::Value(font_size) = text.font_size else {
            log::warn!("{}: font size is mixed, skipping text edit", node.id);
            return Ok(());
        };
        apply(text, font_size, inst);
        Ok(())
    })
}

pub fn font_size(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_text(ctx, |e| &mut e.font_size, |text, size, inst| {
        text.font_size = Mixed::Value(inst.accumulate(size));
    })
}

pub fn letter_spacing(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_text(ctx, |e| &mut e.letter_spacing, |text, size, inst| {
        let spacing = &mut text.letter_spacing;
        if spacing.unit == LengthUnit::Percent {
            spacing.value = percent_of(size, spacing.value);
            spacing.unit = LengthUnit::Pixels;
        }
        spacing.value = inst.accumulate(spacing.value);
    })
}

pub fn line_height(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_text(ctx, |e| &mut e.line_height, |text, size, inst| {
        let height = &mut text.line_height;
        match height.unit {
            LineHeightUnit::Auto => height.value = auto_line_height(size),
            LineHeightUnit::Percent => height.value = percent_of(size, height.value),
            LineHeightUnit::Pixels => {}
        }
        height.unit = LineHeightUnit::Pixels;
        height.value = inst.accumulate(height.value);
    })
}

pub fn paragraph_indent(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_text(ctx, |e| &mut e.paragraph_indent, |text, _, inst| {
        text.paragraph_indent = inst.accumulate(text.paragraph_indent);
    })
}

pub fn paragraph_spacing(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_text(ctx, |e| &mut e.paragraph_spacing, |text, _, inst| {
        text.paragraph_spacing = inst.accumulate(text.paragraph_spacing);
    })
}

// ─── Paints ──────────────────────────────────────────────────────────────

fn edit_value(slot: &mut Option<CompiledInstruction>, value: &mut f64) {
    if let Some(inst) = slot {
        *value = inst.accumulate(*value);
    }
}

fn edit_scaled(slot: &mut Option<CompiledInstruction>, value: &mut f64, scale: f64) {
    if let Some(inst) = slot {
        *value = inst.accumulate_scaled(*value, scale);
    }
}

fn edit_rgba(color: &mut Rgba, edit: &mut ColorEdit<CompiledInstruction>) {
    edit_scaled(&mut edit.r, &mut color.r, RGB_SCALE);
    edit_scaled(&mut edit.g, &mut color.g, RGB_SCALE);
    edit_scaled(&mut edit.b, &mut color.b, RGB_SCALE);
    edit_scaled(&mut edit.a, &mut color.a, PERCENT_SCALE);
}

fn apply_paint(paint: &mut Paint, edit: &mut PaintEdit<CompiledInstruction>) {
    if edit.is_empty() {
        return;
    }
    match (paint, edit) {
        (Paint::Solid { color, opacity }, PaintEdit::Color(c)) => {
            edit_scaled(&mut c.r, &mut color.r, RGB_SCALE);
            edit_scaled(&mut c.g, &mut color.g, RGB_SCALE);
            edit_scaled(&mut c.b, &mut color.b, RGB_SCALE);
            edit_scaled(&mut c.a, opacity, PERCENT_SCALE);
        }
        (Paint::Gradient { stops, .. }, PaintEdit::Gradient(edits)) => {
            for (stop, edit) in stops.iter_mut().zip(edits.iter_mut()) {
                edit_rgba(&mut stop.color, edit);
            }
        }
        (Paint::Image { filters, opacity }, PaintEdit::Image(edit)) => {
            for filter in ImageFilter::ALL {
                edit_scaled(edit.filter_mut(filter), filters.get_mut(filter), PERCENT_SCALE);
            }
            edit_scaled(&mut edit.opacity, opacity, PERCENT_SCALE);
        }
        _ => log::warn!("paint edit does not match the paint it targets"),
    }
}

/// Edit paints index-for-index. Extra edits or paints are ignored.
fn apply_paints(paints: &mut [Paint], edits: &mut [PaintEdit<CompiledInstruction>]) {
    for (paint, edit) in paints.iter_mut().zip(edits.iter_mut()) {
        apply_paint(paint, edit);
    }
}

pub fn fills(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let edits = &mut ctx.edits.edits.fills;
    let node = node_mut(ctx.graph, ctx.node)?;
    if let Some(paints) = node.fills.as_mut() {
        apply_paints(paints, edits);
    }
    Ok(())
}

pub fn strokes(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let edits = &mut ctx.edits.edits.strokes;
    let node = node_mut(ctx.graph, ctx.node)?;
    if let Some(paints) = node.strokes.as_mut() {
        apply_paints(paints, edits);
    }
    Ok(())
}

pub fn stroke_weight(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    with_slot(ctx, |e| &mut e.stroke_weight, |node, inst| {
        node.stroke_weight = inst.accumulate(node.stroke_weight);
        Ok(())
    })
}

/// Each dash length is edited on its own; a missing entry reads as 0.
pub fn dash_pattern(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let edits = &mut ctx.edits.edits.dash_pattern;
    if edits.iter().all(Option::is_none) {
        return Ok(());
    }
    let node = node_mut(ctx.graph, ctx.node)?;
    for (i, slot) in edits.iter_mut().enumerate() {
        let Some(inst) = slot else { continue };
        if node.dash_pattern.len() <= i {
            node.dash_pattern.resize(i + 1, 0.0);
        }
        node.dash_pattern[i] = inst.accumulate(node.dash_pattern[i]);
    }
    Ok(())
}

fn apply_effect(effect: &mut Effect, edit: &mut EffectEdit<CompiledInstruction>) {
    match effect {
        Effect::DropShadow(shadow) | Effect::InnerShadow(shadow) => {
            if let Some(color) = edit.color.as_mut() {
                edit_rgba(&mut shadow.color, color);
            }
            if let Some(offset) = edit.offset.as_mut() {
                edit_value(&mut offset.x, &mut shadow.offset.x);
                edit_value(&mut offset.y, &mut shadow.offset.y);
            }
            edit_value(&mut edit.radius, &mut shadow.radius);
            edit_value(&mut edit.spread, &mut shadow.spread);
        }
        Effect::LayerBlur(blur) | Effect::BackgroundBlur(blur) => {
            edit_value(&mut edit.radius, &mut blur.radius);
        }
    }
}

pub fn effects(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let edits = &mut ctx.edits.edits.effects;
    let node = node_mut(ctx.graph, ctx.node)?;
    for (effect, edit) in node.effects.iter_mut().zip(edits.iter_mut()) {
        apply_effect(effect, edit);
    }
    Ok(())
}

// ─── Selection colours ───────────────────────────────────────────────────

/// Write selection-colour edits into every descendant of the clone, slot
/// by slot in flattening order. Linked duplicates already carry a copy of
/// their leader's edit.
pub fn selection_colours(ctx: &mut HandlerCtx<'_>) -> Result<(), ApplyError> {
    let edits = &mut ctx.edits.edits.selection_colours;

    let mut slot = 0;
    for idx in ctx.graph.find_all(ctx.node) {
        let node = node_mut(ctx.graph, idx)?;
        for paints in [node.fills.as_mut(), node.strokes.as_mut()]
            .into_iter()
            .flatten()
        {
            for paint in paints.iter_mut() {
                if let Some(edit) = edits.get_mut(slot) {
                    apply_paint(paint, edit);
                }
                slot += 1;
            }
        }
    }
    Ok(())
}
