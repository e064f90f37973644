//! Token ledger.
//!
//! Tokens are earned at session end and spent on items from
//! [`REWARD_CATALOG`]. The balance is a plain integer string; transaction
//! and redemption histories are JSON arrays kept newest first and capped at
//! [`HISTORY_CAP`] entries.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{RewardItem, REWARD_CATALOG};
use crate::clock::Clock;
use crate::services::{JsonStoreExt, KeyValueStore};
use crate::storage::StorageKey;

pub const HISTORY_CAP: usize = 500;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),

    #[error("Insufficient balance: need {needed}, have {balance}")]
    InsufficientBalance { needed: u64, balance: u64 },

    #[error("Reward item not found: {0}")]
    ItemNotFound(String),

    #[error("Failed to persist '{0}'")]
    Persist(StorageKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Positive for earnings, negative for spending.
    pub amount: i64,
    pub reason: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: String,
    pub item_id: String,
    pub cost: u64,
    pub timestamp: u64,
}

pub fn find_item(item_id: &str) -> Option<&'static RewardItem> {
    REWARD_CATALOG.iter().find(|i| i.id == item_id)
}

pub struct RewardLedger {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

impl RewardLedger {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current balance. Unparsable values read as zero.
    pub fn balance(&self) -> u64 {
        self.store
            .get_string(StorageKey::RewardsBalance.as_str())
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// Newest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.store.get_json(StorageKey::RewardsTransactions, Vec::new())
    }

    /// Newest first.
    pub fn redemptions(&self) -> Vec<Redemption> {
        self.store.get_json(StorageKey::RewardsRedemptions, Vec::new())
    }

    fn new_id(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }

    fn record(&self, balance: u64, amount: i64, reason: &str, prefix: &str) -> Result<(), RewardError> {
        let mut txs = self.transactions();
        txs.insert(
            0,
            Transaction {
                id: Self::new_id(prefix),
                amount,
                reason: reason.to_string(),
                timestamp: self.clock.now_ms(),
            },
        );
        txs.truncate(HISTORY_CAP);

        if !self
            .store
            .set_string(StorageKey::RewardsBalance.as_str(), &balance.to_string())
        {
            return Err(RewardError::Persist(StorageKey::RewardsBalance));
        }
        if !self.store.set_json(StorageKey::RewardsTransactions, &txs) {
            return Err(RewardError::Persist(StorageKey::RewardsTransactions));
        }
        Ok(())
    }

    /// Credit `amount` tokens. Returns the new balance.
    pub fn add_tokens(&self, amount: u64, reason: &str) -> Result<u64, RewardError> {
        if amount == 0 {
            return Err(RewardError::InvalidAmount(amount));
        }
        let balance = self.balance().saturating_add(amount);
        self.record(balance, amount as i64, reason, "earn")?;
        tracing::info!(amount, balance, reason, "tokens added");
        Ok(balance)
    }

    /// Debit `amount` tokens. Returns the new balance.
    pub fn spend_tokens(&self, amount: u64, reason: &str) -> Result<u64, RewardError> {
        if amount == 0 {
            return Err(RewardError::InvalidAmount(amount));
        }
        let current = self.balance();
        if current < amount {
            return Err(RewardError::InsufficientBalance {
                needed: amount,
                balance: current,
            });
        }
        let balance = current - amount;
        self.record(balance, -(amount as i64), reason, "spend")?;
        tracing::info!(amount, balance, reason, "tokens spent");
        Ok(balance)
    }

    /// Spend the item's cost and append a redemption record.
    pub fn redeem_tokens(&self, item_id: &str) -> Result<(Redemption, u64), RewardError> {
        let item = find_item(item_id).ok_or_else(|| RewardError::ItemNotFound(item_id.to_string()))?;
        let balance = self.spend_tokens(item.cost, &format!("Redeem: {}", item.name))?;
        let record = Redemption {
            id: Self::new_id("redeem"),
            item_id: item.id.to_string(),
            cost: item.cost,
            timestamp: self.clock.now_ms(),
        };
        let mut history = self.redemptions();
        history.insert(0, record.clone());
        history.truncate(HISTORY_CAP);
        if !self.store.set_json(StorageKey::RewardsRedemptions, &history) {
            return Err(RewardError::Persist(StorageKey::RewardsRedemptions));
        }
        Ok((record, balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::services::memory::MemoryStore;

    fn ledger() -> (Rc<MemoryStore>, RewardLedger) {
        let store = Rc::new(MemoryStore::new());
        let ledger = RewardLedger::new(store.clone(), Rc::new(ManualClock::new(1_000)));
        (store, ledger)
    }

    #[test]
    fn add_then_spend() {
        let (_, ledger) = ledger();
        assert_eq!(ledger.add_tokens(30, "session").unwrap(), 30);
        assert_eq!(ledger.spend_tokens(10, "treat").unwrap(), 20);
        let txs = ledger.transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, -10);
        assert_eq!(txs[1].amount, 30);
        assert!(txs[0].id.starts_with("spend_"));
    }

    #[test]
    fn zero_and_overdraft_are_rejected() {
        let (_, ledger) = ledger();
        assert_eq!(ledger.add_tokens(0, "x"), Err(RewardError::InvalidAmount(0)));
        assert_eq!(
            ledger.spend_tokens(5, "x"),
            Err(RewardError::InsufficientBalance {
                needed: 5,
                balance: 0
            })
        );
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn redeem_spends_item_cost() {
        let (_, ledger) = ledger();
        ledger.add_tokens(60, "session").unwrap();
        let (record, balance) = ledger.redeem_tokens("sticker_pack").unwrap();
        assert_eq!(balance, 10);
        assert_eq!(record.cost, 50);
        assert_eq!(ledger.redemptions(), vec![record]);
        assert_eq!(ledger.transactions()[0].reason, "Redeem: Sticker Pack");
        assert!(matches!(
            ledger.redeem_tokens("pony"),
            Err(RewardError::ItemNotFound(_))
        ));
    }

    #[test]
    fn history_is_capped() {
        let (_, ledger) = ledger();
        for _ in 0..(HISTORY_CAP + 5) {
            ledger.add_tokens(1, "tick").unwrap();
        }
        assert_eq!(ledger.transactions().len(), HISTORY_CAP);
        assert_eq!(ledger.balance(), (HISTORY_CAP + 5) as u64);
    }

    #[test]
    fn garbage_balance_reads_as_zero() {
        let (store, ledger) = ledger();
        store.set_string("rewards:balance", "lots");
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn failed_write_surfaces_persist_error() {
        let (store, ledger) = ledger();
        store.set_fail_writes(true);
        assert_eq!(
            ledger.add_tokens(3, "session"),
            Err(RewardError::Persist(StorageKey::RewardsBalance))
        );
    }
}
