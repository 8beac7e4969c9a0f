//! In-memory ledger.
//!
//! Serves canned read results, records submitted writes and replays swap
//! events. Used by tests across the workspace and by the CLI's demo mode.

use crate::ledger::{AbiValue, ContractCall, ContractReader, ContractWriter, LedgerError, TxHash};
use crate::uniswap_v2::events::{SwapEvent, SwapLogSource};
use async_trait::async_trait;
use nlswap_domain::PoolSnapshot;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

type ReadKey = (String, String, Vec<AbiValue>);

#[derive(Default)]
struct State {
    reads: HashMap<ReadKey, Vec<AbiValue>>,
    failures: HashMap<String, LedgerError>,
    submitted: Vec<ContractCall>,
    confirmed: Vec<TxHash>,
    swaps: HashMap<String, Vec<SwapEvent>>,
}

/// A ledger whose state lives in a hash map.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

fn normalize(value: &AbiValue) -> AbiValue {
    match value {
        AbiValue::Address(a) => AbiValue::Address(a.to_ascii_lowercase()),
        AbiValue::AddressArray(items) => {
            AbiValue::AddressArray(items.iter().map(|a| a.to_ascii_lowercase()).collect())
        }
        other => other.clone(),
    }
}

fn key_of(call: &ContractCall) -> ReadKey {
    (
        call.address.to_ascii_lowercase(),
        call.function.clone(),
        call.args.iter().map(normalize).collect(),
    )
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the result returned for `call`.
    pub fn set_read(&self, call: ContractCall, outputs: Vec<AbiValue>) {
        self.state().reads.insert(key_of(&call), outputs);
    }

    /// Forgets the result of `call`; reading it afterwards reverts.
    pub fn remove_read(&self, call: &ContractCall) {
        self.state().reads.remove(&key_of(call));
    }

    /// Seeds everything a pair read needs: tokens, reserves, metadata and LP supply.
    pub fn seed_pool(&self, pool: &PoolSnapshot, lp_total_supply: U256) {
        let pair = &pool.address;
        self.set_read(
            ContractCall::new(pair, "token0", vec![]),
            vec![AbiValue::address(&pool.token0)],
        );
        self.set_read(
            ContractCall::new(pair, "token1", vec![]),
            vec![AbiValue::address(&pool.token1)],
        );
        self.set_read(
            ContractCall::new(pair, "getReserves", vec![]),
            vec![
                AbiValue::Uint(pool.reserve0),
                AbiValue::Uint(pool.reserve1),
                AbiValue::uint(pool.block_timestamp_last.unwrap_or_default()),
            ],
        );
        self.set_read(
            ContractCall::new(pair, "totalSupply", vec![]),
            vec![AbiValue::Uint(lp_total_supply)],
        );
        for (token, symbol, decimals) in [
            (&pool.token0, &pool.token0_symbol, pool.decimals0),
            (&pool.token1, &pool.token1_symbol, pool.decimals1),
        ] {
            self.set_read(
                ContractCall::new(token, "symbol", vec![]),
                vec![AbiValue::String(symbol.clone())],
            );
            self.set_read(
                ContractCall::new(token, "decimals", vec![]),
                vec![AbiValue::uint(decimals)],
            );
        }
    }

    /// Registers `getPair(token0, token1)` on `factory`.
    pub fn seed_factory_pair(&self, factory: &str, pool: &PoolSnapshot) {
        self.set_read(
            ContractCall::new(
                factory,
                "getPair",
                vec![
                    AbiValue::address(&pool.token0),
                    AbiValue::address(&pool.token1),
                ],
            ),
            vec![AbiValue::address(&pool.address)],
        );
    }

    pub fn set_allowance(&self, token: &str, owner: &str, spender: &str, amount: U256) {
        self.set_read(
            crate::uniswap_v2::router::allowance(token, owner, spender),
            vec![AbiValue::Uint(amount)],
        );
    }

    pub fn set_balance(&self, token: &str, owner: &str, amount: U256) {
        self.set_read(
            crate::uniswap_v2::router::balance_of(token, owner),
            vec![AbiValue::Uint(amount)],
        );
    }

    /// Makes every write of `function` fail with `error`.
    pub fn fail_writes(&self, function: &str, error: LedgerError) {
        self.state().failures.insert(function.to_string(), error);
    }

    pub fn push_swap(&self, pair: &str, event: SwapEvent) {
        self.state()
            .swaps
            .entry(pair.to_ascii_lowercase())
            .or_default()
            .push(event);
    }

    /// Writes accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.state().submitted.clone()
    }

    /// Transactions confirmed so far.
    pub fn confirmed(&self) -> Vec<TxHash> {
        self.state().confirmed.clone()
    }
}

#[async_trait]
impl ContractReader for InMemoryLedger {
    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, LedgerError> {
        self.state()
            .reads
            .get(&key_of(call))
            .cloned()
            .ok_or_else(|| {
                LedgerError::Reverted(format!(
                    "{} on {} has no result",
                    call.function, call.address
                ))
            })
    }
}

#[async_trait]
impl ContractWriter for InMemoryLedger {
    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, LedgerError> {
        call.calldata()?;
        let mut state = self.state();
        if let Some(error) = state.failures.get(&call.function) {
            return Err(error.clone());
        }
        state.submitted.push(call.clone());
        let tx = format!("0x{:064x}", state.submitted.len());
        debug!(function = %call.function, tx = %tx, "Recorded write");
        Ok(tx)
    }

    async fn wait_for_confirmation(&self, tx: &TxHash) -> Result<(), LedgerError> {
        self.state().confirmed.push(tx.clone());
        Ok(())
    }
}

#[async_trait]
impl SwapLogSource for InMemoryLedger {
    async fn swap_events(
        &self,
        pair: &str,
        since_timestamp: u64,
    ) -> Result<Vec<SwapEvent>, LedgerError> {
        let mut events: Vec<SwapEvent> = self
            .state()
            .swaps
            .get(&pair.to_ascii_lowercase())
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.timestamp >= since_timestamp)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        events.sort_by_key(|e| (e.block_number, e.timestamp));
        Ok(events)
    }
}
