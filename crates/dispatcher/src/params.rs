use rangechain_primitives::{Address, Hash32};
use serde_json::Value;

use crate::error::DispatchError;

fn field<'a>(params: &'a Value, name: &str) -> Result<&'a str, DispatchError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidParams(format!("missing string field {name}")))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, DispatchError> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(trimmed).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

pub fn address_field(params: &Value, name: &str) -> Result<Address, DispatchError> {
    let bytes = decode_hex(field(params, name)?)?;
    Address::try_from(bytes.as_slice())
        .map_err(|_| DispatchError::InvalidParams(format!("{name} must be a 20-byte address")))
}

pub fn hash_field(params: &Value, name: &str) -> Result<Hash32, DispatchError> {
    let bytes = decode_hex(field(params, name)?)?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| DispatchError::InvalidParams(format!("{name} must be a 32-byte hash")))?;
    Ok(Hash32::new(arr))
}

pub fn bytes_field(params: &Value, name: &str) -> Result<Vec<u8>, DispatchError> {
    decode_hex(field(params, name)?)
}

pub fn u64_field(params: &Value, name: &str) -> Result<u64, DispatchError> {
    params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| DispatchError::InvalidParams(format!("missing integer field {name}")))
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_field_parses_0x_prefixed_hex() {
        let params = json!({ "owner": format!("0x{}", "11".repeat(20)) });
        let addr = address_field(&params, "owner").unwrap();
        assert_eq!(addr.as_bytes(), &[0x11u8; 20]);
    }

    #[test]
    fn missing_field_is_invalid_params() {
        let params = json!({});
        assert!(matches!(
            address_field(&params, "owner"),
            Err(DispatchError::InvalidParams(_))
        ));
    }

    #[test]
    fn wrong_length_is_invalid_params() {
        let params = json!({ "owner": "0x1122" });
        assert!(matches!(
            address_field(&params, "owner"),
            Err(DispatchError::InvalidParams(_))
        ));
    }
}
