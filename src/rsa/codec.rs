// RSA Key Blob Codec
// Length-prefixed packing of key component pairs, carried as base64 text

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_bigint::BigUint;

use super::error::KeyError;

/// Pack two key components into the binary blob layout:
/// a 4-byte big-endian length, the first magnitude, a second length,
/// the second magnitude. Magnitudes are minimal big-endian bytes
/// (zero encodes as the single byte 0x00).
pub fn encode(first: &BigUint, second: &BigUint) -> Vec<u8> {
    let first_bytes = first.to_bytes_be();
    let second_bytes = second.to_bytes_be();

    let mut blob = Vec::with_capacity(8 + first_bytes.len() + second_bytes.len());
    blob.extend_from_slice(&(first_bytes.len() as u32).to_be_bytes());
    blob.extend_from_slice(&first_bytes);
    blob.extend_from_slice(&(second_bytes.len() as u32).to_be_bytes());
    blob.extend_from_slice(&second_bytes);
    blob
}

/// Unpack a blob produced by [`encode`].
/// Bytes past the second field are ignored; a truncated header or a
/// length that overruns the blob is an encoding error.
pub fn decode(blob: &[u8]) -> Result<(BigUint, BigUint), KeyError> {
    let mut cursor = 0usize;
    let first = read_field(blob, &mut cursor)?;
    let second = read_field(blob, &mut cursor)?;
    Ok((first, second))
}

fn read_field(blob: &[u8], cursor: &mut usize) -> Result<BigUint, KeyError> {
    let at = *cursor;
    let header = blob
        .get(at..at + 4)
        .ok_or_else(|| KeyError::Encoding(format!("truncated length prefix at byte {at}")))?;
    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    *cursor = at + 4;

    let at = *cursor;
    let payload = blob.get(at..at + length).ok_or_else(|| {
        KeyError::Encoding(format!(
            "field of {length} bytes at offset {at} overruns blob of {} bytes",
            blob.len()
        ))
    })?;
    *cursor = at + length;

    Ok(BigUint::from_bytes_be(payload))
}

/// Pack two key components and wrap the blob as standard base64.
pub fn encode_base64(first: &BigUint, second: &BigUint) -> String {
    STANDARD.encode(encode(first, second))
}

/// Unpack a base64 blob produced by [`encode_base64`].
pub fn decode_base64(text: &str) -> Result<(BigUint, BigUint), KeyError> {
    let blob = STANDARD
        .decode(text.trim())
        .map_err(|e| KeyError::Encoding(format!("invalid base64: {e}")))?;
    decode(&blob)
}

/// Base64 of a single integer's big-endian bytes, used for ciphertext
/// in transit.
pub fn encode_value(value: &BigUint) -> String {
    STANDARD.encode(value.to_bytes_be())
}

/// Decode a base64 integer produced by [`encode_value`].
pub fn decode_value(text: &str) -> Result<BigUint, KeyError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| KeyError::Encoding(format!("invalid base64: {e}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}
