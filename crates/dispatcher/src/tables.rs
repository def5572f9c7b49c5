use std::sync::Arc;

use rangechain_chain_store::ChainStore;
use rangechain_client_traits::WalletSigner;
use serde_json::{json, Value};

use crate::error::DispatchError;
use crate::params::{address_field, bytes_field, hash_field, to_hex, u64_field};
use crate::table::{MethodHandler, MethodTable};

/// `pg_getAccounts` / `pg_sign` / `pg_createAccount` (spec.md §6).
///
/// `WalletSigner` is synchronous, so these handlers need no async
/// bridging to fit [`crate::table::MethodHandler`]'s plain-`Fn` shape.
pub struct WalletMethods {
    wallet: Arc<dyn WalletSigner>,
}

impl WalletMethods {
    pub fn new(wallet: Arc<dyn WalletSigner>) -> Self {
        Self { wallet }
    }
}

impl MethodTable for WalletMethods {
    fn prefix(&self) -> &'static str {
        "pg_"
    }

    fn methods(&self) -> Vec<(&'static str, MethodHandler)> {
        let accounts_wallet = self.wallet.clone();
        let sign_wallet = self.wallet.clone();
        let create_wallet = self.wallet.clone();

        vec![
            (
                "getAccounts",
                Box::new(move |_params| {
                    let accounts: Vec<String> =
                        accounts_wallet.accounts().iter().map(ToString::to_string).collect();
                    Ok(json!(accounts))
                }) as MethodHandler,
            ),
            (
                "sign",
                Box::new(move |params| {
                    let account = address_field(&params, "account")?;
                    let message = bytes_field(&params, "message")?;
                    let signature = sign_wallet.sign(account, &message)?;
                    Ok(json!(to_hex(&signature)))
                }) as MethodHandler,
            ),
            (
                "createAccount",
                Box::new(move |_params| {
                    let account = create_wallet.create_account()?;
                    Ok(json!(account.to_string()))
                }) as MethodHandler,
            ),
        ]
    }
}

/// `pg_getBlockHeader` / `pg_getTransaction` / `pg_getExits` (spec.md
/// §6): thin reads over `ChainStore`, all synchronous, so these also fit
/// a plain-`Fn` handler directly.
pub struct ChainStoreMethods {
    chain_store: Arc<ChainStore>,
}

impl ChainStoreMethods {
    pub fn new(chain_store: Arc<ChainStore>) -> Self {
        Self { chain_store }
    }
}

impl MethodTable for ChainStoreMethods {
    fn prefix(&self) -> &'static str {
        "pg_"
    }

    fn methods(&self) -> Vec<(&'static str, MethodHandler)> {
        let header_store = self.chain_store.clone();
        let tx_store = self.chain_store.clone();
        let exits_store = self.chain_store.clone();

        vec![
            (
                "getBlockHeader",
                Box::new(move |params: Value| {
                    let block = u64_field(&params, "block")?;
                    let root = header_store.get_block_header(block)?;
                    Ok(match root {
                        Some(hash) => json!(to_hex(hash.as_bytes())),
                        None => Value::Null,
                    })
                }) as MethodHandler,
            ),
            (
                "getTransaction",
                Box::new(move |params: Value| {
                    let hash = hash_field(&params, "hash")?;
                    let tx = tx_store.get_transaction(hash)?;
                    match tx {
                        Some(tx) => serde_json::to_value(tx)
                            .map_err(|e| DispatchError::Internal(e.to_string())),
                        None => Ok(Value::Null),
                    }
                }) as MethodHandler,
            ),
            (
                "getExits",
                Box::new(move |params: Value| {
                    let owner = address_field(&params, "owner")?;
                    let exits = exits_store.get_exits(owner)?;
                    serde_json::to_value(exits).map_err(|e| DispatchError::Internal(e.to_string()))
                }) as MethodHandler,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::rpc::Request;
    use rangechain_client_traits::MockWalletSigner;
    use rangechain_primitives::{Address, BigAmount, Hash32};
    use rangechain_state::{Exit, StateObject, Transaction};

    #[test]
    fn get_accounts_lists_the_wallets_accounts() {
        let mut wallet = MockWalletSigner::new();
        wallet
            .expect_accounts()
            .returning(|| vec![Address::new([1; 20]), Address::new([2; 20])]);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&WalletMethods::new(Arc::new(wallet)));

        let response = dispatcher.dispatch(Request::new(
            "pg_getAccounts",
            Value::Null,
            json!(1),
        ));
        let result = response.result.unwrap();
        assert_eq!(result.as_array().unwrap().len(), 2);
    }

    #[test]
    fn sign_rejects_malformed_account_with_invalid_params() {
        let wallet = MockWalletSigner::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&WalletMethods::new(Arc::new(wallet)));

        let response = dispatcher.dispatch(Request::new(
            "pg_sign",
            json!({"account": "not-hex", "message": "0x00"}),
            json!(2),
        ));
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn get_transaction_returns_null_when_absent() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ChainStoreMethods::new(chain_store));

        let response = dispatcher.dispatch(Request::new(
            "pg_getTransaction",
            json!({ "hash": to_hex(Hash32::ZERO.as_bytes()) }),
            json!(3),
        ));
        assert_eq!(response.result, Some(Value::Null));
    }

    #[test]
    fn get_transaction_round_trips_a_stored_transaction() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let obj = StateObject::new(
            BigAmount::from_u64(0),
            BigAmount::from_u64(10),
            BigAmount::from_u64(1),
            Address::new([1; 20]),
            vec![],
        )
        .unwrap();
        let tx = Transaction::new(1, vec![], vec![], obj);
        chain_store.put_transaction(&tx).unwrap();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ChainStoreMethods::new(chain_store));

        let response = dispatcher.dispatch(Request::new(
            "pg_getTransaction",
            json!({ "hash": to_hex(tx.hash().as_bytes()) }),
            json!(4),
        ));
        assert!(response.result.is_some());
        assert_ne!(response.result.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn get_exits_returns_the_owners_exits() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let owner = Address::new([7; 20]);
        let exit = Exit::new(
            Hash32::new([1; 32]),
            owner,
            BigAmount::zero(),
            BigAmount::from_u64(0),
            BigAmount::from_u64(10),
            1,
        );
        chain_store.append_exit(&exit).await.unwrap();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ChainStoreMethods::new(chain_store));
        let response = dispatcher.dispatch(Request::new(
            "pg_getExits",
            json!({ "owner": owner.to_string() }),
            json!(5),
        ));
        let exits: Vec<Exit> = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(exits, vec![exit]);
    }
}
