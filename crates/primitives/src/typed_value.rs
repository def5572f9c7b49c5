use crate::amount::{ArithmeticError, BigAmount};

const TOKEN_WIDTH: usize = 8;
const VALUE_WIDTH: usize = 24;

/// `typedValue(token, v)`: an 8-byte token prefix concatenated with a
/// 24-byte value suffix, producing a 32-byte sort key that groups entries
/// by token and then orders them by value within a token.
///
/// Fails rather than truncating if either component does not fit in its
/// allotted width.
pub fn typed_value(token: &BigAmount, value: &BigAmount) -> Result<[u8; 32], ArithmeticError> {
    let mut out = [0u8; 32];
    write_be_padded(token, &mut out[0..TOKEN_WIDTH])?;
    write_be_padded(value, &mut out[TOKEN_WIDTH..TOKEN_WIDTH + VALUE_WIDTH])?;
    Ok(out)
}

fn write_be_padded(v: &BigAmount, dst: &mut [u8]) -> Result<(), ArithmeticError> {
    let bytes = v.to_bytes_be();
    if bytes.len() > dst.len() {
        return Err(ArithmeticError::DoesNotFitU64(v.to_string()));
    }
    let offset = dst.len() - bytes.len();
    dst[offset..].copy_from_slice(&bytes);
    Ok(())
}
