use crate::dex::error::{DexError, DexErrorKind};

/// Longest valid encoding of a 32-bit value.
pub(crate) const MAX_ULEB128_LEN: usize = 5;

#[cfg(test)]
pub(crate) fn encode_uleb128(value: u32) -> Vec<u8> {
    let mut result = Vec::new();
    let mut remaining = value;

    if remaining == 0 {
        result.push(0);
        return result;
    }

    while remaining != 0 {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        if remaining != 0 {
            byte |= 0x80;
        }

        result.push(byte);
    }

    result
}

/// Decodes one ULEB128 value from the front of `encoded`, returning the value and
/// the number of bytes it occupied.
pub(crate) fn decode_uleb128(encoded: &[u8]) -> Result<(u32, usize), DexError> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;

    for (count, &byte) in encoded.iter().take(MAX_ULEB128_LEN).enumerate() {
        let low = (byte & 0x7F) as u32;

        // The fifth byte only has room for the top four bits.
        if count == MAX_ULEB128_LEN - 1 && low > 0x0F {
            fail!(MalformedVarint, "uleb128 overflows 32 bits in byte {}", count);
        }
        value |= low << shift;

        if byte & 0x80 == 0 {
            return Ok((value, count + 1));
        }
        shift += 7;
    }

    if encoded.len() < MAX_ULEB128_LEN {
        fail!(OutOfBounds, "uleb128 runs past end of buffer after {} bytes", encoded.len());
    }
    fail!(MalformedVarint, "uleb128 not terminated within {} bytes", MAX_ULEB128_LEN)
}
