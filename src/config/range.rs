//! Shear factor specifications and their validated ranges.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RandShearError;

/// Allowed bounds for any user-supplied factor endpoint.
pub const FACTOR_BOUNDS: (f32, f32) = (0.0, 1.0);

/// A shear factor as the user supplied it.
///
/// A scalar `f` means the symmetric range `(-f, f)`; a list must hold
/// exactly two endpoints. The list form is kept as a `Vec` so that a
/// wrong-length list reaches validation (and its error message) instead of
/// failing inside the deserializer. Values of any other type are rejected
/// while parsing with the [`RandShearError::InvalidFactor`] message.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactorSpec {
    Scalar(f32),
    Range(Vec<f32>),
}

impl Default for FactorSpec {
    fn default() -> Self {
        FactorSpec::Scalar(0.0)
    }
}

impl From<f32> for FactorSpec {
    fn from(value: f32) -> Self {
        FactorSpec::Scalar(value)
    }
}

impl From<(f32, f32)> for FactorSpec {
    fn from((a, b): (f32, f32)) -> Self {
        FactorSpec::Range(vec![a, b])
    }
}

impl From<f64> for FactorSpec {
    fn from(value: f64) -> Self {
        FactorSpec::Scalar(value as f32)
    }
}

impl From<(f64, f64)> for FactorSpec {
    fn from((a, b): (f64, f64)) -> Self {
        FactorSpec::Range(vec![a as f32, b as f32])
    }
}

impl From<[f32; 2]> for FactorSpec {
    fn from(pair: [f32; 2]) -> Self {
        FactorSpec::Range(pair.to_vec())
    }
}

impl fmt::Display for FactorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorSpec::Scalar(v) => write!(f, "{}", v),
            FactorSpec::Range(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl<'de> Deserialize<'de> for FactorSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FactorVisitor { name: "factor" })
    }
}

/// Deserializes the `x_factor` config field.
pub(crate) fn deserialize_x_factor<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FactorSpec, D::Error> {
    deserializer.deserialize_any(FactorVisitor { name: "x_factor" })
}

/// Deserializes the `y_factor` config field.
pub(crate) fn deserialize_y_factor<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FactorSpec, D::Error> {
    deserializer.deserialize_any(FactorVisitor { name: "y_factor" })
}

/// Accepts a number or a list of numbers; anything else is an
/// `InvalidFactor` error naming the field.
struct FactorVisitor {
    name: &'static str,
}

impl FactorVisitor {
    fn invalid<E: de::Error>(&self, received: impl fmt::Display) -> E {
        E::custom(RandShearError::InvalidFactor {
            name: self.name.to_string(),
            message: received.to_string(),
        })
    }
}

impl<'de> Visitor<'de> for FactorVisitor {
    type Value = FactorSpec;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number or a list of two numbers for `{}`", self.name)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FactorSpec, E> {
        Ok(FactorSpec::Scalar(v as f32))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FactorSpec, E> {
        Ok(FactorSpec::Scalar(v as f32))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FactorSpec, E> {
        Ok(FactorSpec::Scalar(v as f32))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FactorSpec, E> {
        Err(self.invalid(format_args!("{:?}", v)))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FactorSpec, E> {
        Err(self.invalid(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<FactorSpec, E> {
        Err(self.invalid("null"))
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<FactorSpec, A::Error> {
        Err(self.invalid("a map"))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FactorSpec, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(2).min(16));
        loop {
            match seq.next_element::<f32>() {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break,
                Err(_) => return Err(self.invalid("a list containing a non-number")),
            }
        }
        Ok(FactorSpec::Range(values))
    }
}

/// A validated `(lower, upper)` sampling range for one shear axis.
///
/// Only obtainable through [`ShearRange::from_spec`], so `lower <= upper`
/// always holds and every supplied endpoint was checked against
/// [`FACTOR_BOUNDS`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShearRange {
    lower: f32,
    upper: f32,
}

impl ShearRange {
    /// Validates a factor spec and expands it into a sampling range.
    ///
    /// `name` is the constructor argument being validated (`x_factor` or
    /// `y_factor`) and is carried into the error.
    pub fn from_spec(spec: &FactorSpec, name: &str) -> Result<Self, RandShearError> {
        match spec {
            FactorSpec::Range(values) => {
                if values.len() != 2 {
                    return Err(RandShearError::InvalidFactor {
                        name: name.to_string(),
                        message: spec.to_string(),
                    });
                }
                check_factor_range(values[0], name)?;
                check_factor_range(values[1], name)?;
                let (lower, upper) = if values[0] <= values[1] {
                    (values[0], values[1])
                } else {
                    (values[1], values[0])
                };
                Ok(Self { lower, upper })
            }
            FactorSpec::Scalar(value) => {
                check_factor_range(*value, name)?;
                let magnitude = value.abs();
                Ok(Self {
                    lower: -magnitude,
                    upper: magnitude,
                })
            }
        }
    }

    #[inline]
    pub fn lower(&self) -> f32 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f32 {
        self.upper
    }
}

fn check_factor_range(value: f32, name: &str) -> Result<(), RandShearError> {
    let (min, max) = FACTOR_BOUNDS;
    // NaN fails `contains` as well.
    if !(min..=max).contains(&value) {
        return Err(RandShearError::FactorOutOfRange {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}
