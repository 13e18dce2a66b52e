//! Property instructions and the accumulator.
//!
//! A [`PropertyInstruction`] is what the form layer sends for one edited
//! property. Compiling it yields a [`CompiledInstruction`], which owns the
//! running `overall` value threaded through every addition of one apply
//! operation.

use crate::error::InstructionError;
use recur_core::ranges::bound;
use recur_core::{Breakpoint, Expression};
use serde::{Deserialize, Serialize};

/// A bound as sent by the form: a number, or a string such as `"Infinity"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBound {
    Number(f64),
    Text(String),
}

impl RawBound {
    pub fn resolve(&self) -> Option<f64> {
        match self {
            RawBound::Number(n) if !n.is_nan() => Some(*n),
            RawBound::Number(_) => None,
            RawBound::Text(s) => bound::parse(s),
        }
    }
}

impl From<f64> for RawBound {
    fn from(n: f64) -> Self {
        if n.is_infinite() {
            RawBound::Text(if n > 0.0 { "Infinity" } else { "-Infinity" }.into())
        } else {
            RawBound::Number(n)
        }
    }
}

/// One user edit request: expression text, boundary policy and range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInstruction {
    pub value: String,
    pub breakpoint: String,
    #[serde(default)]
    pub max: Option<RawBound>,
    #[serde(default)]
    pub min: Option<RawBound>,
}

impl PropertyInstruction {
    pub fn new(value: impl Into<String>, breakpoint: Breakpoint, max: f64, min: f64) -> Self {
        Self {
            value: value.into(),
            breakpoint: breakpoint.as_str().into(),
            max: Some(max.into()),
            min: Some(min.into()),
        }
    }

    /// Validate policy and bounds, then compile the expression.
    pub fn compile(&self) -> Result<CompiledInstruction, InstructionError> {
        let breakpoint: Breakpoint = self.breakpoint.parse()?;
        let max = resolve_bound("max", self.max.as_ref())?;
        let min = resolve_bound("min", self.min.as_ref())?;
        let expression = Expression::compile(&self.value)?;
        Ok(CompiledInstruction::new(expression, breakpoint, max, min))
    }
}

fn resolve_bound(which: &'static str, raw: Option<&RawBound>) -> Result<f64, InstructionError> {
    let Some(raw) = raw else {
        return Err(InstructionError::bound(which, "<missing>"));
    };
    raw.resolve().ok_or_else(|| {
        let text = match raw {
            RawBound::Number(n) => n.to_string(),
            RawBound::Text(s) => s.clone(),
        };
        InstructionError::bound(which, text)
    })
}

/// A compiled instruction plus its accumulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledInstruction {
    pub expression: Expression,
    pub breakpoint: Breakpoint,
    pub max: f64,
    pub min: f64,
    /// Unbounded running value; `None` until the first accumulation.
    overall: Option<f64>,
    /// Last value handed back to a handler, after bounding and scaling.
    last: Option<f64>,
}

impl CompiledInstruction {
    pub fn new(expression: Expression, breakpoint: Breakpoint, max: f64, min: f64) -> Self {
        Self {
            expression,
            breakpoint,
            max,
            min,
            overall: None,
            last: None,
        }
    }

    pub fn overall(&self) -> Option<f64> {
        self.overall
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    fn step(&mut self, start: f64) -> f64 {
        let overall = self.expression.eval(self.overall.unwrap_or(start));
        self.overall = Some(overall);
        overall
    }

    /// Fold the expression onto the running value (or `live` on first use)
    /// and bound the result.
    pub fn accumulate(&mut self, live: f64) -> f64 {
        let overall = self.step(live);
        let value = self.breakpoint.apply(overall, self.max, self.min);
        self.last = Some(value);
        value
    }

    /// Like [`accumulate`](Self::accumulate) for values stored as fractions
    /// but edited on a larger scale (0–1 ↔ 0–255 or 0–100).
    pub fn accumulate_scaled(&mut self, live: f64, scale: f64) -> f64 {
        let overall = self.step(live * scale);
        let value = self.breakpoint.apply(overall, self.max, self.min) / scale;
        self.last = Some(value);
        value
    }

    /// Accumulate without bounding, for absolute positions.
    pub fn accumulate_unbounded(&mut self, live: f64) -> f64 {
        let value = self.step(live);
        self.last = Some(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(value: &str, breakpoint: Breakpoint, max: f64, min: f64) -> CompiledInstruction {
        PropertyInstruction::new(value, breakpoint, max, min)
            .compile()
            .unwrap()
    }

    #[test]
    fn first_call_starts_from_the_live_value() {
        let mut inst = compiled("+10", Breakpoint::Hold, 500.0, 0.0);
        assert_eq!(inst.accumulate(100.0), 110.0);
        // The live value is ignored once a running value exists.
        assert_eq!(inst.accumulate(9999.0), 120.0);
        assert_eq!(inst.overall(), Some(120.0));
    }

    #[test]
    fn overall_keeps_growing_past_the_bound() {
        let mut inst = compiled("+40", Breakpoint::Hold, 100.0, 0.0);
        assert_eq!(inst.accumulate(50.0), 90.0);
        assert_eq!(inst.accumulate(50.0), 100.0);
        assert_eq!(inst.overall(), Some(130.0));
    }

    #[test]
    fn identity_does_not_drift() {
        let mut inst = compiled("x", Breakpoint::Loop, 100.0, 0.0);
        inst.accumulate(42.0);
        let first = inst.overall();
        inst.accumulate(42.0);
        assert_eq!(inst.overall(), first);
        assert_eq!(inst.last(), Some(42.0));
    }

    #[test]
    fn scaled_values_round_trip_through_the_edit_scale() {
        let mut inst = compiled("+25", Breakpoint::Hold, 100.0, 0.0);
        assert_eq!(inst.accumulate_scaled(0.25, 100.0), 0.5);
        assert_eq!(inst.overall(), Some(50.0));
        assert_eq!(inst.accumulate_scaled(0.25, 100.0), 0.75);
    }

    #[test]
    fn unbounded_ignores_the_range() {
        let mut inst = compiled("+100", Breakpoint::Hold, 10.0, 0.0);
        assert_eq!(inst.accumulate_unbounded(0.0), 100.0);
        assert_eq!(inst.accumulate_unbounded(0.0), 200.0);
    }

    #[test]
    fn invalid_policy_or_bounds_are_rejected() {
        let mut raw = PropertyInstruction::new("+1", Breakpoint::Hold, 10.0, 0.0);
        raw.breakpoint = "bounce".into();
        assert!(matches!(raw.compile(), Err(InstructionError::Breakpoint(_))));

        let mut raw = PropertyInstruction::new("+1", Breakpoint::Hold, 10.0, 0.0);
        raw.max = Some(RawBound::Text("lots".into()));
        assert_eq!(
            raw.compile().unwrap_err(),
            InstructionError::bound("max", "lots")
        );

        let mut raw = PropertyInstruction::new("+1", Breakpoint::Hold, 10.0, 0.0);
        raw.min = None;
        assert!(matches!(
            raw.compile(),
            Err(InstructionError::Bound { which: "min", .. })
        ));

        let raw = PropertyInstruction::new("x + y", Breakpoint::Hold, 10.0, 0.0);
        assert!(raw.compile().unwrap_err().is_expression());
    }

    #[test]
    fn wire_form_accepts_infinity_strings() {
        let raw: PropertyInstruction = serde_json::from_str(
            r#"{"value":"+5","breakpoint":"loop","max":"Infinity","min":0}"#,
        )
        .unwrap();
        let inst = raw.compile().unwrap();
        assert_eq!(inst.max, f64::INFINITY);
        assert_eq!(inst.breakpoint, Breakpoint::Loop);
    }
}
