/// Minimal length-prefixed concatenation encoding.
///
/// Not a general Solidity ABI encoder (cryptographic/wire-format primitive
/// implementation is out of scope) — just precise enough that
/// `decode(encode(x)) == x` holds for the handful of fixed-shape records
/// this client hashes (`Transaction`, `StateObject`).
///
/// Each field is written as an 8-byte big-endian length prefix followed by
/// its bytes, fields are concatenated in call order.
pub fn abi_encode(fields: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        out.extend_from_slice(&(field.len() as u64).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

/// Inverse of [`abi_encode`]: splits a buffer back into its fields.
pub fn abi_decode(mut buf: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut fields = Vec::new();
    while !buf.is_empty() {
        if buf.len() < 8 {
            return None;
        }
        let (len_bytes, rest) = buf.split_at(8);
        let len = u64::from_be_bytes(len_bytes.try_into().ok()?) as usize;
        if rest.len() < len {
            return None;
        }
        let (field, rest) = rest.split_at(len);
        fields.push(field.to_vec());
        buf = rest;
    }
    Some(fields)
}
