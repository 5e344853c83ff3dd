//! Deserializers for fields the API sends inconsistently typed.
//!
//! Counts and page numbers sometimes arrive as JSON strings (`"page": "2"`),
//! identifiers sometimes as numbers, and amounts must go back out as plain
//! JSON numbers.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

fn to_u64<E: serde::de::Error>(raw: NumberOrText) -> Result<u64, E> {
    match raw {
        NumberOrText::Unsigned(n) => Ok(n),
        NumberOrText::Float(f) => Err(E::custom(format!("expected a whole number, got {f}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("expected a whole number, got '{s}'"))),
    }
}

pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Option::<NumberOrText>::deserialize(d)?
        .map(to_u64)
        .transpose()
}

pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    opt_u64(d)?
        .map(|n| u32::try_from(n).map_err(D::Error::custom))
        .transpose()
}

/// Count that may be a number, a numeric string, or `null` (read as 0).
pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(opt_u64(d)?.unwrap_or(0))
}

/// Identifier that may arrive as a string or a number.
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(opt_text(d)?.unwrap_or_default())
}

/// Free-form value that may be a string, a number or `null`.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(d)? {
        None => None,
        Some(NumberOrText::Unsigned(n)) => Some(n.to_string()),
        Some(NumberOrText::Float(f)) => Some(f.to_string()),
        Some(NumberOrText::Text(s)) => Some(s),
    })
}

/// Serialize a decimal as a JSON integer when it has no fraction, otherwise
/// as a float.
pub fn decimal_as_number<S: Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    if value.fract().is_zero()
        && let Some(whole) = value.to_i64()
    {
        return s.serialize_i64(whole);
    }
    match value.to_f64() {
        Some(f) => s.serialize_f64(f),
        None => Err(S::Error::custom(format!("{value} is out of range"))),
    }
}
