//! Conversions between raw holding-register windows and typed SunSpec values.
//!
//! Every decoder takes the exact window a field spans; a window of the wrong
//! length is an error rather than a truncation. Multi-register values are
//! big-endian in register order (`r0` is the most significant word).

use crate::prelude::*;

/// Raw value SunSpec uses for "not implemented" on `uint16`/`enum16` points.
pub const UINT16_NOT_IMPLEMENTED: u16 = 0xFFFF;
/// Raw value SunSpec uses for "not implemented" on `int16`/`sunssf` points.
pub const INT16_NOT_IMPLEMENTED: i16 = i16::MIN;
/// Raw value SunSpec uses for "not implemented" on `uint32` points.
pub const UINT32_NOT_IMPLEMENTED: u32 = 0xFFFF_FFFF;

/// Scale factors outside this range are rejected by the SunSpec spec.
pub const SCALE_FACTOR_RANGE: std::ops::RangeInclusive<i16> = -10..=10;

fn expect_len(registers: &[u16], expected: usize) -> Result<()> {
    if registers.len() != expected {
        return Err(SunSpecError::RegisterLength {
            expected,
            actual: registers.len(),
        }
        .into());
    }
    Ok(())
}

fn words_to_u64(registers: &[u16]) -> u64 {
    registers
        .iter()
        .fold(0u64, |acc, r| (acc << 16) | u64::from(*r))
}

// decoders {{{
pub fn decode_uint16(registers: &[u16]) -> Result<u16> {
    expect_len(registers, 1)?;
    Ok(registers[0])
}

pub fn decode_uint16_nullable(registers: &[u16]) -> Result<Option<u16>> {
    let value = decode_uint16(registers)?;
    Ok((value != UINT16_NOT_IMPLEMENTED).then_some(value))
}

pub fn decode_int16(registers: &[u16]) -> Result<i16> {
    expect_len(registers, 1)?;
    // two's-complement reinterpretation of the raw word
    Ok(registers[0] as i16)
}

pub fn decode_int16_nullable(registers: &[u16]) -> Result<Option<i16>> {
    let value = decode_int16(registers)?;
    Ok((value != INT16_NOT_IMPLEMENTED).then_some(value))
}

pub fn decode_uint32(registers: &[u16]) -> Result<u32> {
    expect_len(registers, 2)?;
    Ok((u32::from(registers[0]) << 16) | u32::from(registers[1]))
}

pub fn decode_uint32_nullable(registers: &[u16]) -> Result<Option<u32>> {
    let value = decode_uint32(registers)?;
    Ok((value != UINT32_NOT_IMPLEMENTED).then_some(value))
}

pub fn decode_acc32(registers: &[u16]) -> Result<u32> {
    decode_uint32(registers)
}

pub fn decode_acc64(registers: &[u16]) -> Result<u64> {
    expect_len(registers, 4)?;
    Ok(words_to_u64(registers))
}

pub fn decode_enum16(registers: &[u16]) -> Result<u16> {
    decode_uint16(registers)
}

pub fn decode_enum16_nullable(registers: &[u16]) -> Result<Option<u16>> {
    decode_uint16_nullable(registers)
}

pub fn decode_bitfield32(registers: &[u16]) -> Result<u32> {
    decode_uint32(registers)
}

pub fn decode_sunssf(registers: &[u16]) -> Result<i16> {
    let value = decode_int16(registers)?;
    if !SCALE_FACTOR_RANGE.contains(&value) {
        bail!("scale factor {} outside {:?}", value, SCALE_FACTOR_RANGE);
    }
    Ok(value)
}

pub fn decode_sunssf_nullable(registers: &[u16]) -> Result<Option<i16>> {
    match decode_int16_nullable(registers)? {
        None => Ok(None),
        Some(_) => decode_sunssf(registers).map(Some),
    }
}

/// Two bytes per register, high byte first. Trailing NUL and 0xFF padding
/// (unset registers) is removed; any other invalid UTF-8 becomes U+FFFD.
pub fn decode_string(registers: &[u16]) -> Result<String> {
    if registers.is_empty() {
        bail!("string field spans no registers");
    }

    let mut bytes: Vec<u8> = registers.iter().flat_map(|r| r.to_be_bytes()).collect();
    while let Some(0x00 | 0xFF) = bytes.last() {
        bytes.pop();
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
// }}}

// encoders {{{
pub fn encode_uint16(value: &u16) -> Result<Vec<u16>> {
    Ok(vec![*value])
}

pub fn encode_uint16_nullable(value: &Option<u16>) -> Result<Vec<u16>> {
    match value {
        Some(UINT16_NOT_IMPLEMENTED) => {
            bail!("{:#06X} is reserved for not-implemented", UINT16_NOT_IMPLEMENTED)
        }
        Some(v) => encode_uint16(v),
        None => Ok(vec![UINT16_NOT_IMPLEMENTED]),
    }
}

pub fn encode_int16(value: &i16) -> Result<Vec<u16>> {
    Ok(vec![*value as u16])
}

pub fn encode_int16_nullable(value: &Option<i16>) -> Result<Vec<u16>> {
    match value {
        Some(INT16_NOT_IMPLEMENTED) => {
            bail!("{} is reserved for not-implemented", INT16_NOT_IMPLEMENTED)
        }
        Some(v) => encode_int16(v),
        None => Ok(vec![INT16_NOT_IMPLEMENTED as u16]),
    }
}

pub fn encode_enum16(value: &u16) -> Result<Vec<u16>> {
    encode_uint16(value)
}
// }}}

// scale factors {{{
fn power_of_ten(exponent: u32) -> Decimal {
    // 10^n fits a Decimal mantissa for every exponent SCALE_FACTOR_RANGE allows
    Decimal::from_i128_with_scale(10i128.pow(exponent), 0)
}

/// Renders a raw register value as `value × 10^sf` in decimal arithmetic.
pub fn apply_scale<V: Into<Decimal>>(value: V, scale_factor: i16) -> Decimal {
    let value = value.into();
    let exponent = u32::from(scale_factor.unsigned_abs());

    if scale_factor >= 0 {
        value * power_of_ten(exponent)
    } else {
        value / power_of_ten(exponent)
    }
}

/// Inverse of [`apply_scale`]: `value × 10^-sf`.
pub fn unapply_scale(value: Decimal, scale_factor: i16) -> Decimal {
    apply_scale(value, scale_factor.saturating_neg())
}

pub fn apply_scale_nullable<V: Into<Decimal>>(
    value: Option<V>,
    scale_factor: Option<i16>,
) -> Option<Decimal> {
    match (value, scale_factor) {
        (Some(v), Some(sf)) => Some(apply_scale(v, sf)),
        _ => None,
    }
}
// }}}
