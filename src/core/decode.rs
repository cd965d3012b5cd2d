//! Raw register words to numeric values.

use crate::core::{
    catalog::{Layout, RegisterDefinition, Unit},
    operating_mode::OperatingMode,
    snapshot::Value,
};

/// Combine the high and low words into an unsigned 32-bit value.
///
/// Returns zero when fewer than two words are given.
pub fn combine32(words: &[u16]) -> u32 {
    match words {
        [high, low, ..] => u32::from(*high) << 16 | u32::from(*low),
        _ => 0,
    }
}

/// Apply the two's-complement correction for signed registers.
///
/// The threshold is 2¹⁵ regardless of the word count, which matches what the controllers report
/// for signed 32-bit runtimes and counters.
pub const fn correct_sign(raw: i64, signed: bool) -> i64 {
    if signed && raw > 32767 { raw - 65536 } else { raw }
}

/// Sign-correct and scale the raw value.
#[expect(clippy::cast_precision_loss)]
pub fn apply_scale(raw: i64, definition: &RegisterDefinition) -> f64 {
    correct_sign(raw, definition.signed) as f64 * definition.scale
}

/// Custom multi-word decoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decoder {
    /// Twelve decimal digits packed into three base-10000 words, least significant first.
    Digits12,
}

impl Decoder {
    pub const fn n_words(self) -> u16 {
        match self {
            Self::Digits12 => 3,
        }
    }

    /// Decode the words, `None` when they are not a valid encoding.
    pub fn decode(self, words: &[u16]) -> Option<i64> {
        match self {
            Self::Digits12 => {
                let [c0, c1, c2] = words.first_chunk::<3>()?;
                if [c0, c1, c2].into_iter().any(|chunk| *chunk >= 10_000) {
                    return None;
                }
                Some(i64::from(*c0) + i64::from(*c1) * 10_000 + i64::from(*c2) * 100_000_000)
            }
        }
    }
}

/// Raw integer according to the layout, before the sign correction.
pub fn decode_raw(words: &[u16], layout: Layout) -> Option<i64> {
    match layout {
        Layout::Single => words.first().copied().map(i64::from),
        Layout::Double => Some(i64::from(combine32(words))),
        Layout::Packed(decoder) => decoder.decode(words),
    }
}

/// Decode the words into the presentation value of the definition's unit.
///
/// Returns `None` when the words are not a valid encoding.
pub fn decode_value(words: &[u16], definition: &RegisterDefinition) -> Option<Value> {
    let raw = decode_raw(words, definition.layout)?;
    Some(match definition.unit {
        Unit::Flag => Value::Bool(raw != 0),
        Unit::Mode => Value::Text(
            OperatingMode::try_from(raw)
                .map_or_else(|code| format!("unknown_{code}"), |mode| mode.to_string()),
        ),
        unit if unit.is_integral() => Value::Int(correct_sign(raw, definition.signed)),
        _ => Value::Float(apply_scale(raw, definition)),
    })
}
