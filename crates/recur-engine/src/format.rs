//! UI formatting of model snapshots.
//!
//! The form layer shows angles in degrees, fractions as percentages and
//! colour channels on 0–255. Numbers are rounded to two places.

use crate::colours::{ColourEntry, ColourSet};
use crate::property::{ModelSnapshot, PropValue, PropertyKey as K};
use recur_core::{
    Effect, GradientKind, ImageFilter, ImageFilters, LengthUnit, LetterSpacing, LineHeight,
    LineHeightUnit, Paint, Range, RangeTable, Rgba,
};
use serde_json::{Map, Value, json};
use std::f64::consts::TAU;

/// Shown in place of a value the host reported as mixed.
pub const DISABLED_VALUE: &str = "DISABLED";

/// Round to two decimal places, nudging exact halves upwards.
pub fn round2(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

fn degrees(value: f64) -> Value {
    json!(format!("{}°", round2(value)))
}

fn percent(fraction: f64) -> Value {
    json!(format!("{}%", round2(fraction * 100.0)))
}

fn capped_percent(value: f64, range: Range) -> Value {
    json!(format!("{}%", range.cap(round2(value))))
}

fn channel(value: f64) -> i64 {
    (value * 255.0).round() as i64
}

fn rgba(color: &Rgba) -> Value {
    json!({
        "r": channel(color.r),
        "g": channel(color.g),
        "b": channel(color.b),
        "a": percent(color.a),
    })
}

fn gradient_type(kind: GradientKind) -> &'static str {
    match kind {
        GradientKind::Linear => "GRADIENT_LINEAR",
        GradientKind::Radial => "GRADIENT_RADIAL",
        GradientKind::Angular => "GRADIENT_ANGULAR",
        GradientKind::Diamond => "GRADIENT_DIAMOND",
    }
}

fn image(filters: &ImageFilters, opacity: f64) -> Value {
    let filters: Map<String, Value> = ImageFilter::ALL
        .into_iter()
        .map(|f| (f.as_str().to_string(), percent(filters.get(f))))
        .collect();
    json!({ "type": "IMAGE", "filters": filters, "opacity": percent(opacity) })
}

fn gradient(kind: GradientKind, stops: &[recur_core::ColorStop]) -> Value {
    let stops: Vec<Value> = stops
        .iter()
        .map(|stop| json!({ "position": round2(stop.position), "color": rgba(&stop.color) }))
        .collect();
    json!({ "type": gradient_type(kind), "gradientStops": stops })
}

pub fn format_paint(paint: &Paint) -> Value {
    match paint {
        Paint::Solid { color, opacity } => json!({
            "type": "SOLID",
            "color": {
                "r": channel(color.r),
                "g": channel(color.g),
                "b": channel(color.b),
            },
            "opacity": percent(*opacity),
        }),
        Paint::Gradient { kind, stops } => gradient(*kind, stops),
        Paint::Image { filters, opacity } => image(filters, *opacity),
    }
}

pub fn format_effect(effect: &Effect) -> Value {
    match effect {
        Effect::DropShadow(shadow) | Effect::InnerShadow(shadow) => json!({
            "type": effect.type_name(),
            "color": rgba(&shadow.color),
            "offset": { "x": round2(shadow.offset.x), "y": round2(shadow.offset.y) },
            "radius": round2(shadow.radius),
            "spread": round2(shadow.spread),
            "visible": shadow.visible,
        }),
        Effect::LayerBlur(blur) | Effect::BackgroundBlur(blur) => json!({
            "type": effect.type_name(),
            "radius": round2(blur.radius),
            "visible": blur.visible,
        }),
    }
}

/// Selection colours. Solids use floored channels, matching the duplicate
/// check, and list the slots they are linked with.
pub fn format_colours(set: &ColourSet) -> Value {
    set.entries
        .iter()
        .enumerate()
        .map(|(slot, entry)| match entry {
            ColourEntry::Solid(c) => {
                let mut out = json!({
                    "r": (c.r * 255.0).floor() as i64,
                    "g": (c.g * 255.0).floor() as i64,
                    "b": (c.b * 255.0).floor() as i64,
                    "a": percent(c.a),
                });
                if let Some(refs) = set.links.refs(slot) {
                    out["refs"] = json!(refs);
                }
                out
            }
            ColourEntry::Gradient { kind, stops } => gradient(*kind, stops),
            ColourEntry::Image { filters, opacity } => image(filters, *opacity),
        })
        .collect()
}

fn letter_spacing_px(spacing: &LetterSpacing, font_size: Option<f64>) -> f64 {
    match (spacing.unit, font_size) {
        (LengthUnit::Percent, Some(size)) => (size * spacing.value / 100.0).round(),
        _ => round2(spacing.value),
    }
}

fn line_height_px(height: &LineHeight, font_size: Option<f64>) -> Option<f64> {
    match (height.unit, font_size) {
        (LineHeightUnit::Auto, Some(size)) => Some((size * 2f64.powf(1.0 / 5.0)).round()),
        (LineHeightUnit::Percent, Some(size)) => Some((size * height.value / 100.0).round()),
        (LineHeightUnit::Pixels, _) => Some(round2(height.value)),
        (_, None) => None,
    }
}

fn format_value(
    key: K,
    value: &PropValue,
    snapshot: &ModelSnapshot,
    ranges: &RangeTable,
) -> Value {
    match (key, value) {
        (_, PropValue::Unavailable) => json!(DISABLED_VALUE),
        (K::Rotation, PropValue::Number(v)) => degrees(*v),
        (K::StartingAngle, PropValue::Number(v)) => degrees(v.to_degrees()),
        (K::EndingAngle, PropValue::Number(end)) => {
            let start = snapshot.number(K::StartingAngle).unwrap_or(0.0);
            capped_percent((end - start) / TAU * 100.0, ranges.ending_angle)
        }
        (K::InnerRadius, PropValue::Number(v)) => capped_percent(v * 100.0, ranges.inner_radius),
        (_, PropValue::Number(v)) => json!(round2(*v)),
        (_, PropValue::Paints(paints)) => paints.iter().map(format_paint).collect(),
        (_, PropValue::Effects(effects)) => effects.iter().map(format_effect).collect(),
        (_, PropValue::Dashes(dashes)) => dashes.iter().map(|&d| json!(round2(d))).collect(),
        (_, PropValue::LetterSpacing(spacing)) => {
            json!(letter_spacing_px(spacing, snapshot.number(K::FontSize)))
        }
        (_, PropValue::LineHeight(height)) => {
            match line_height_px(height, snapshot.number(K::FontSize)) {
                Some(px) => json!(px),
                None => json!(DISABLED_VALUE),
            }
        }
        (_, PropValue::Colours(set)) => format_colours(set),
    }
}

/// Render a snapshot as the JSON object the form layer consumes.
pub fn format_snapshot(snapshot: &ModelSnapshot, ranges: &RangeTable) -> Value {
    let mut out = Map::new();
    out.insert("id".into(), json!(snapshot.id.as_str()));
    out.insert("name".into(), json!(snapshot.name));
    out.insert("type".into(), json!(snapshot.kind_label));
    out.insert(
        "constrainProportions".into(),
        json!(snapshot.constrain_proportions),
    );
    out.insert(
        "strokeMiterLimit".into(),
        json!(round2(snapshot.stroke_miter_limit)),
    );
    for (key, value) in &snapshot.values {
        out.insert(
            key.name().into(),
            format_value(*key, value, snapshot, ranges),
        );
    }
    Value::Object(out)
}
