//! Default `{max, min}` bounds per editable property.
//!
//! The UI layer pre-fills an instruction's range from this table, and the
//! formatting layer uses it to cap derived display values.

use serde::{Deserialize, Serialize};

/// An inclusive `[min, max]` band. Either side may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(with = "bound")]
    pub max: f64,
    #[serde(with = "bound")]
    pub min: f64,
}

impl Range {
    pub const fn new(max: f64, min: f64) -> Self {
        Self { max, min }
    }

    /// `(-∞, ∞)`.
    pub const UNBOUNDED: Range = Range::new(f64::INFINITY, f64::NEG_INFINITY);

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into the band.
    pub fn cap(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// JSON has no representation for infinity, so bounds travel as either a
/// number or a string such as `"Infinity"` / `"-Infinity"`.
pub mod bound {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    /// Parse a textual bound. NaN is rejected.
    pub fn parse(text: &str) -> Option<f64> {
        let text = text.trim();
        let value = match text {
            "∞" | "+∞" => f64::INFINITY,
            "-∞" => f64::NEG_INFINITY,
            _ => text.parse::<f64>().ok()?,
        };
        (!value.is_nan()).then_some(value)
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| de::Error::custom("bound is not representable as f64")),
            serde_json::Value::String(s) => {
                parse(&s).ok_or_else(|| de::Error::custom(format!("invalid bound `{s}`")))
            }
            other => Err(de::Error::custom(format!("invalid bound {other}"))),
        }
    }
}

const INF: f64 = f64::INFINITY;

/// The full default range table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RangeTable {
    pub x: Range,
    pub y: Range,
    pub width: Range,
    pub height: Range,
    pub rotation: Range,
    pub corner_radius: Range,
    pub top_left_radius: Range,
    pub top_right_radius: Range,
    pub bottom_left_radius: Range,
    pub bottom_right_radius: Range,
    pub dash_pattern: [Range; 2],
    pub stroke_miter_limit: Range,
    pub stroke_weight: Range,
    /// r, g and b of any colour, edited as 0–255.
    pub color_channel: Range,
    /// Alpha/opacity of a colour, edited as 0–100.
    pub alpha: Range,
    pub effect_offset: Range,
    pub effect_radius: Range,
    pub effect_spread: Range,
    pub starting_angle: Range,
    pub ending_angle: Range,
    pub inner_radius: Range,
    pub point_count: Range,
    pub font_size: Range,
    pub letter_spacing: Range,
    pub line_height: Range,
    pub paragraph_spacing: Range,
    pub paragraph_indent: Range,
    pub opacity: Range,
    pub image_filter: Range,
}

impl Default for RangeTable {
    fn default() -> Self {
        let radius = Range::new(100.0, 0.0);
        let percent = Range::new(100.0, 0.0);
        Self {
            x: Range::UNBOUNDED,
            y: Range::UNBOUNDED,
            width: Range::new(INF, 0.1),
            height: Range::new(INF, 0.1),
            rotation: Range::new(180.0, -180.0),
            corner_radius: radius,
            top_left_radius: radius,
            top_right_radius: radius,
            bottom_left_radius: radius,
            bottom_right_radius: radius,
            dash_pattern: [percent, percent],
            stroke_miter_limit: Range::new(10.0, 0.0),
            stroke_weight: Range::new(50.0, 0.0),
            color_channel: Range::new(255.0, 0.0),
            alpha: percent,
            effect_offset: percent,
            effect_radius: percent,
            effect_spread: percent,
            starting_angle: Range::new(360.0, 0.0),
            ending_angle: Range::new(100.0, -100.0),
            inner_radius: percent,
            point_count: Range::new(14.0, 3.0),
            font_size: Range::new(INF, 1.0),
            letter_spacing: Range::UNBOUNDED,
            line_height: Range::new(INF, 0.0),
            paragraph_spacing: Range::new(INF, 0.0),
            paragraph_indent: Range::new(INF, 0.0),
            opacity: percent,
            image_filter: Range::new(100.0, -100.0),
        }
    }
}

impl RangeTable {
    /// Look up a range by the property name the UI uses (`"cornerRadius"`,
    /// `"r"`, `"opacity"`, ...).
    pub fn get(&self, name: &str) -> Option<Range> {
        let range = match name {
            "x" => self.x,
            "y" => self.y,
            "width" => self.width,
            "height" => self.height,
            "rotation" => self.rotation,
            "cornerRadius" => self.corner_radius,
            "topLeftRadius" => self.top_left_radius,
            "topRightRadius" => self.top_right_radius,
            "bottomLeftRadius" => self.bottom_left_radius,
            "bottomRightRadius" => self.bottom_right_radius,
            "strokeMiterLimit" => self.stroke_miter_limit,
            "strokeWeight" => self.stroke_weight,
            "r" | "g" | "b" => self.color_channel,
            "a" => self.alpha,
            "offset" => self.effect_offset,
            "radius" => self.effect_radius,
            "spread" => self.effect_spread,
            "startingAngle" => self.starting_angle,
            "endingAngle" => self.ending_angle,
            "innerRadius" => self.inner_radius,
            "pointCount" => self.point_count,
            "fontSize" => self.font_size,
            "letterSpacing" => self.letter_spacing,
            "lineHeight" => self.line_height,
            "paragraphSpacing" => self.paragraph_spacing,
            "paragraphIndent" => self.paragraph_indent,
            "opacity" => self.opacity,
            "contrast" | "exposure" | "highlights" | "saturation" | "shadows" | "temperature"
            | "tint" => self.image_filter,
            _ => return None,
        };
        Some(range)
    }
}
