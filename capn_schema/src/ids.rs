/* Lenient numeric deserializers.
 *
 * The JSON codec writes 64-bit integers as strings so they survive
 * JavaScript consumers. Ids and 64-bit literals therefore accept a number,
 * a decimal string or a `0x` hex string. Floats additionally accept the
 * non-finite spellings `NaN`, `Infinity` and `-Infinity`. */

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

fn parse_u64<E: de::Error>(text: &str) -> Result<u64, E> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|_| E::custom(format!("invalid unsigned 64-bit value '{}'", text)))
}

fn parse_i64<E: de::Error>(text: &str) -> Result<i64, E> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('-') {
        let magnitude = parse_u64::<E>(rest)?;
        if magnitude > i64::MAX as u64 + 1 {
            return Err(E::custom(format!("signed 64-bit value '{}' out of range", text)));
        }
        return Ok((magnitude as i64).wrapping_neg());
    }
    let value = parse_u64::<E>(text)?;
    i64::try_from(value).map_err(|_| E::custom(format!("signed 64-bit value '{}' out of range", text)))
}

struct U64Visitor;

impl<'de> Visitor<'de> for U64Visitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned 64-bit integer or a string holding one")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("negative value {} for unsigned field", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        parse_u64(v)
    }
}

struct I64Visitor;

impl<'de> Visitor<'de> for I64Visitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a signed 64-bit integer or a string holding one")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("value {} out of range for int64", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        parse_i64(v)
    }
}

struct F64Visitor;

impl<'de> Visitor<'de> for F64Visitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a floating point number")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v.trim() {
            "NaN" | "nan" => Ok(f64::NAN),
            "Infinity" | "inf" => Ok(f64::INFINITY),
            "-Infinity" | "-inf" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid floating point value '{}'", other))),
        }
    }
}

pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    deserializer.deserialize_any(U64Visitor)
}

pub fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(I64Visitor)
}

pub fn float64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(F64Visitor)
}

pub fn float32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    deserializer.deserialize_any(F64Visitor).map(|v| v as f32)
}
