//! SMC Value Decoding
//!
//! Decodes the raw byte payload of an SMC key into a typed numeric value.
//! The SMC tags every key with a four-character data type; floats arrive
//! either as IEEE `flt ` or as big-endian fixed-point (`fpXY`/`spXY`, where
//! X and Y are hex digits giving the integer and fraction bit widths).

// =============================================================================
// Raw Values
// =============================================================================

/// A decoded sensor reading, tagged by the numeric kind the SMC reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Float(f32),
    Unsigned(u64),
    Signed(i64),
}

impl RawValue {
    /// Widen to f64 for metric emission.
    pub fn as_f64(&self) -> f64 {
        match *self {
            RawValue::Float(v) => v as f64,
            RawValue::Unsigned(v) => v as f64,
            RawValue::Signed(v) => v as f64,
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode an SMC value payload. Returns `None` for data types the exporter
/// does not model (strings, flags, hex blobs); those keys are skipped.
pub fn decode(data_type: &[u8; 4], bytes: &[u8]) -> Option<RawValue> {
    if bytes.is_empty() {
        return None;
    }

    match data_type {
        b"flt " if bytes.len() == 4 => {
            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
            Some(RawValue::Float(f32::from_ne_bytes(raw)))
        }
        b"ui8 " | b"ui16" | b"ui32" => Some(RawValue::Unsigned(be_uint(bytes))),
        b"si8 " if bytes.len() == 1 => Some(RawValue::Signed(bytes[0] as i8 as i64)),
        b"si16" if bytes.len() == 2 => {
            Some(RawValue::Signed(i16::from_be_bytes([bytes[0], bytes[1]]) as i64))
        }
        b"{pwm" if bytes.len() == 2 => {
            Some(RawValue::Float(be_u16(bytes) as f32 * 100.0 / 65536.0))
        }
        _ if bytes.len() == 2 => fixed_point(data_type, bytes),
        _ => None,
    }
}

/// Decode the `fpXY` (unsigned) and `spXY` (sign + X int + Y fraction bits)
/// fixed-point families. The bit widths must fill the 16-bit payload.
fn fixed_point(data_type: &[u8; 4], bytes: &[u8]) -> Option<RawValue> {
    let (signed, int_bits, frac_bits) = match data_type {
        [b'f', b'p', x, y] => (false, hex_digit(*x)?, hex_digit(*y)?),
        [b's', b'p', x, y] => (true, hex_digit(*x)?, hex_digit(*y)?),
        _ => return None,
    };

    let payload_bits = if signed { 15 } else { 16 };
    if int_bits + frac_bits != payload_bits {
        return None;
    }

    let divisor = (1u32 << frac_bits) as f32;
    let value = if signed {
        i16::from_be_bytes([bytes[0], bytes[1]]) as f32 / divisor
    } else {
        be_u16(bytes) as f32 / divisor
    };

    Some(RawValue::Float(value))
}

/// Big-endian accumulate over however many bytes the key reported.
fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn hex_digit(c: u8) -> Option<u32> {
    (c as char).to_digit(16)
}

/// Render a four-character code for logging.
pub fn fourcc_to_string(code: u32) -> String {
    code.to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

/// Pack a four-character key name into the u32 the SMC protocol expects.
pub fn fourcc_from_key(key: &str) -> u32 {
    let mut raw = [b' '; 4];
    for (i, b) in key.bytes().take(4).enumerate() {
        raw[i] = b;
    }
    u32::from_be_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flt() {
        let bytes = 45.5f32.to_ne_bytes();
        assert_eq!(decode(b"flt ", &bytes), Some(RawValue::Float(45.5)));
    }

    #[test]
    fn test_decode_unsigned() {
        assert_eq!(decode(b"ui8 ", &[150]), Some(RawValue::Unsigned(150)));
        assert_eq!(decode(b"ui16", &[0x01, 0x2c]), Some(RawValue::Unsigned(300)));
        assert_eq!(
            decode(b"ui32", &[0x00, 0x01, 0x00, 0x00]),
            Some(RawValue::Unsigned(65536))
        );
    }

    #[test]
    fn test_decode_signed() {
        assert_eq!(decode(b"si8 ", &[0xfb]), Some(RawValue::Signed(-5)));
        assert_eq!(decode(b"si16", &[0xff, 0x9c]), Some(RawValue::Signed(-100)));
    }

    #[test]
    fn test_decode_fixed_point_unsigned() {
        // fp88: 0x0180 = 384 / 256 = 1.5
        assert_eq!(decode(b"fp88", &[0x01, 0x80]), Some(RawValue::Float(1.5)));
        // fp4c: 0x1000 = 4096 / 4096 = 1.0
        assert_eq!(decode(b"fp4c", &[0x10, 0x00]), Some(RawValue::Float(1.0)));
        // fp1f: 0x8000 = 32768 / 32768 = 1.0
        assert_eq!(decode(b"fp1f", &[0x80, 0x00]), Some(RawValue::Float(1.0)));
    }

    #[test]
    fn test_decode_fixed_point_signed() {
        // sp78: 0x2d40 = 11584 / 256 = 45.25
        assert_eq!(decode(b"sp78", &[0x2d, 0x40]), Some(RawValue::Float(45.25)));
        // sp78 negative: 0xe000 = -8192 / 256 = -32.0
        assert_eq!(decode(b"sp78", &[0xe0, 0x00]), Some(RawValue::Float(-32.0)));
        // spf0: whole numbers
        assert_eq!(decode(b"spf0", &[0x00, 0x64]), Some(RawValue::Float(100.0)));
    }

    #[test]
    fn test_decode_pwm() {
        // 0x8000 / 65536 * 100 = 50%
        assert_eq!(decode(b"{pwm", &[0x80, 0x00]), Some(RawValue::Float(50.0)));
    }

    #[test]
    fn test_decode_unknown_type_skipped() {
        assert_eq!(decode(b"ch8*", &[0x41, 0x42]), None);
        assert_eq!(decode(b"hex_", &[0x00]), None);
        // Malformed fixed-point widths do not fill 16 bits
        assert_eq!(decode(b"fp11", &[0x00, 0x01]), None);
    }

    #[test]
    fn test_decode_empty_payload() {
        assert_eq!(decode(b"flt ", &[]), None);
        assert_eq!(decode(b"ui16", &[]), None);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(RawValue::Float(1.5).as_f64(), 1.5);
        assert_eq!(RawValue::Unsigned(150).as_f64(), 150.0);
        assert_eq!(RawValue::Signed(-3).as_f64(), -3.0);
    }

    #[test]
    fn test_fourcc_round_trip() {
        let code = fourcc_from_key("TC0P");
        assert_eq!(code, 0x54433050);
        assert_eq!(fourcc_to_string(code), "TC0P");
    }

    #[test]
    fn test_fourcc_short_key_padded() {
        assert_eq!(fourcc_to_string(fourcc_from_key("#KEY")), "#KEY");
        assert_eq!(fourcc_to_string(fourcc_from_key("AB")), "AB  ");
    }
}
