use rangechain_client_traits::AnchorEvent;
use rangechain_primitives::{Address, BigAmount, Hash32};
use rangechain_state::{Exit, StateObject};

use crate::error::SyncError;

/// The four domain events the anchor chain can drive into local state
/// (spec.md §4.G): a new deposit, a new block commitment, an exit
/// starting its challenge period, and an exit's finalisation being
/// confirmed on-chain.
#[derive(Clone, Debug)]
pub enum DomainEvent {
    Deposit(StateObject),
    BlockSubmitted { number: u64, root: Hash32 },
    ExitStarted(Exit),
    ExitFinalized {
        token: BigAmount,
        start: BigAmount,
        end: BigAmount,
    },
}

fn field<'a>(event: &'a AnchorEvent, name: &str) -> Result<&'a [u8], SyncError> {
    event
        .return_values
        .get(name)
        .map(|v| v.as_slice())
        .ok_or_else(|| SyncError::MissingField {
            event: event.name.clone(),
            field: name.to_string(),
        })
}

fn field_u64(event: &AnchorEvent, name: &str) -> Result<u64, SyncError> {
    let bytes = field(event, name)?;
    let arr: [u8; 8] = bytes.try_into().map_err(|_| SyncError::MalformedField {
        event: event.name.clone(),
        field: name.to_string(),
        reason: "expected 8 big-endian bytes".to_string(),
    })?;
    Ok(u64::from_be_bytes(arr))
}

fn field_amount(event: &AnchorEvent, name: &str) -> Result<BigAmount, SyncError> {
    Ok(BigAmount::from_bytes_be(field(event, name)?))
}

fn field_address(event: &AnchorEvent, name: &str) -> Result<Address, SyncError> {
    Address::try_from(field(event, name)?).map_err(|_| SyncError::MalformedField {
        event: event.name.clone(),
        field: name.to_string(),
        reason: "expected a 20-byte address".to_string(),
    })
}

fn field_hash(event: &AnchorEvent, name: &str) -> Result<Hash32, SyncError> {
    let bytes = field(event, name)?;
    let arr: [u8; 32] = bytes.try_into().map_err(|_| SyncError::MalformedField {
        event: event.name.clone(),
        field: name.to_string(),
        reason: "expected a 32-byte hash".to_string(),
    })?;
    Ok(Hash32::new(arr))
}

/// Parses a raw anchor-chain log into the domain event it represents,
/// per spec.md §4.G step 0 (computing a dedupe identity happens upstream
/// in `AnchorEvent::identity`, which already backs `SyncCursorStore`).
pub fn parse(event: &AnchorEvent) -> Result<DomainEvent, SyncError> {
    match event.name.as_str() {
        "Deposit" => {
            let start = field_amount(event, "start")?;
            let end = field_amount(event, "end")?;
            let block = field_amount(event, "block")?;
            let predicate = field_address(event, "predicate")?;
            let state = field(event, "state")?.to_vec();
            let object = StateObject::new(start, end, block, predicate, state)?;
            Ok(DomainEvent::Deposit(object))
        }
        "BlockSubmitted" => Ok(DomainEvent::BlockSubmitted {
            number: field_u64(event, "number")?,
            root: field_hash(event, "root")?,
        }),
        "ExitStarted" => {
            let id = field_hash(event, "id")?;
            let owner = field_address(event, "owner")?;
            let token = field_amount(event, "token")?;
            let start = field_amount(event, "start")?;
            let end = field_amount(event, "end")?;
            let block = field_u64(event, "block")?;
            Ok(DomainEvent::ExitStarted(Exit::new(id, owner, token, start, end, block)))
        }
        "ExitFinalized" => Ok(DomainEvent::ExitFinalized {
            token: field_amount(event, "token")?,
            start: field_amount(event, "start")?,
            end: field_amount(event, "end")?,
        }),
        other => Err(SyncError::UnknownEvent(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn raw(name: &str, fields: Vec<(&str, Vec<u8>)>) -> AnchorEvent {
        AnchorEvent {
            name: name.to_string(),
            block_number: 10,
            log_index: 0,
            transaction_hash: Hash32::ZERO,
            return_values: fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn parses_deposit_event() {
        let event = raw(
            "Deposit",
            vec![
                ("start", BigAmount::from_u64(0).to_bytes_be()),
                ("end", BigAmount::from_u64(100).to_bytes_be()),
                ("block", BigAmount::from_u64(1).to_bytes_be()),
                ("predicate", Address::new([1; 20]).as_bytes().to_vec()),
                ("state", vec![9, 9]),
            ],
        );
        let domain = parse(&event).unwrap();
        match domain {
            DomainEvent::Deposit(obj) => {
                assert_eq!(obj.start(), &BigAmount::from_u64(0));
                assert_eq!(obj.end(), &BigAmount::from_u64(100));
            }
            _ => panic!("expected Deposit"),
        }
    }

    #[test]
    fn parses_block_submitted_event() {
        let event = raw(
            "BlockSubmitted",
            vec![
                ("number", 42u64.to_be_bytes().to_vec()),
                ("root", Hash32::new([7; 32]).as_bytes().to_vec()),
            ],
        );
        match parse(&event).unwrap() {
            DomainEvent::BlockSubmitted { number, root } => {
                assert_eq!(number, 42);
                assert_eq!(root, Hash32::new([7; 32]));
            }
            _ => panic!("expected BlockSubmitted"),
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let event = raw("SomethingElse", vec![]);
        assert!(matches!(parse(&event), Err(SyncError::UnknownEvent(_))));
    }

    #[test]
    fn missing_field_is_reported_precisely() {
        let event = raw("BlockSubmitted", vec![("number", 1u64.to_be_bytes().to_vec())]);
        let err = parse(&event).unwrap_err();
        assert!(matches!(err, SyncError::MissingField { .. }));
    }
}
