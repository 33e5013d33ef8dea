//! In-memory port implementations.
//!
//! Used by tests and the local CLI. Each user's entry is guarded by its
//! `DashMap` shard lock, so version checks and wallet debits are atomic per
//! user while different users proceed in parallel.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use milestones_domain::{ProgressionCost, ProgressionSnapshot, TutorialSnapshot, UserId};

use crate::infrastructure::ports::{
    ProgressionStateRepo, RepoError, TutorialStateRepo, Versioned, WalletError, WalletPort,
};

/// Versioned per-user snapshots.
pub struct InMemoryStateStore<T> {
    entries: DashMap<UserId, Versioned<T>>,
}

pub type InMemoryProgressionStore = InMemoryStateStore<ProgressionSnapshot>;
pub type InMemoryTutorialStore = InMemoryStateStore<TutorialSnapshot>;

impl<T: Clone + Default> InMemoryStateStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn load_entry(&self, user_id: &UserId) -> Versioned<T> {
        self.entries
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn save_entry(&self, user_id: &UserId, value: &T, expected_version: u64) -> Result<u64, RepoError> {
        match self.entries.entry(user_id.clone()) {
            Entry::Occupied(mut entry) => {
                let actual = entry.get().version;
                if actual != expected_version {
                    return Err(RepoError::conflict(user_id, expected_version, actual));
                }
                let next = actual + 1;
                entry.insert(Versioned::new(value.clone(), next));
                Ok(next)
            }
            Entry::Vacant(entry) => {
                if expected_version != 0 {
                    return Err(RepoError::conflict(user_id, expected_version, 0));
                }
                entry.insert(Versioned::new(value.clone(), 1));
                Ok(1)
            }
        }
    }
}

impl<T: Clone + Default> Default for InMemoryStateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressionStateRepo for InMemoryStateStore<ProgressionSnapshot> {
    async fn load(&self, user_id: &UserId) -> Result<Versioned<ProgressionSnapshot>, RepoError> {
        Ok(self.load_entry(user_id))
    }

    async fn save(
        &self,
        user_id: &UserId,
        snapshot: &ProgressionSnapshot,
        expected_version: u64,
    ) -> Result<u64, RepoError> {
        self.save_entry(user_id, snapshot, expected_version)
    }
}

#[async_trait]
impl TutorialStateRepo for InMemoryStateStore<TutorialSnapshot> {
    async fn load(&self, user_id: &UserId) -> Result<Versioned<TutorialSnapshot>, RepoError> {
        Ok(self.load_entry(user_id))
    }

    async fn save(
        &self,
        user_id: &UserId,
        snapshot: &TutorialSnapshot,
        expected_version: u64,
    ) -> Result<u64, RepoError> {
        self.save_entry(user_id, snapshot, expected_version)
    }
}

#[derive(Debug, Clone, Default)]
struct Holdings {
    currencies: BTreeMap<String, i64>,
    items: BTreeMap<String, i64>,
}

/// Wallet holding currencies and items per user.
#[derive(Default)]
pub struct InMemoryWallet {
    holdings: DashMap<UserId, Holdings>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_currency(&self, user_id: &UserId, currency: &str, amount: i64) {
        let mut holdings = self.holdings.entry(user_id.clone()).or_default();
        *holdings.currencies.entry(currency.to_string()).or_insert(0) += amount;
    }

    pub fn grant_item(&self, user_id: &UserId, item: &str, amount: i64) {
        let mut holdings = self.holdings.entry(user_id.clone()).or_default();
        *holdings.items.entry(item.to_string()).or_insert(0) += amount;
    }

    pub fn currency(&self, user_id: &UserId, currency: &str) -> i64 {
        self.holdings
            .get(user_id)
            .and_then(|holdings| holdings.currencies.get(currency).copied())
            .unwrap_or(0)
    }

    pub fn item(&self, user_id: &UserId, item: &str) -> i64 {
        self.holdings
            .get(user_id)
            .and_then(|holdings| holdings.items.get(item).copied())
            .unwrap_or(0)
    }
}

fn shortfall(held: &BTreeMap<String, i64>, required: &BTreeMap<String, i64>) -> Option<WalletError> {
    required.iter().find_map(|(name, amount)| {
        let available = held.get(name).copied().unwrap_or(0);
        (available < *amount).then(|| WalletError::InsufficientFunds {
            currency: name.clone(),
            required: *amount,
            available,
        })
    })
}

fn adjust(held: &mut BTreeMap<String, i64>, amounts: &BTreeMap<String, i64>, sign: i64) {
    for (name, amount) in amounts {
        *held.entry(name.clone()).or_insert(0) += sign * amount;
    }
}

#[async_trait]
impl WalletPort for InMemoryWallet {
    async fn charge(&self, user_id: &UserId, cost: &ProgressionCost) -> Result<(), WalletError> {
        let mut holdings = self.holdings.entry(user_id.clone()).or_default();
        if let Some(err) = shortfall(&holdings.currencies, &cost.currencies)
            .or_else(|| shortfall(&holdings.items, &cost.items))
        {
            return Err(err);
        }
        adjust(&mut holdings.currencies, &cost.currencies, -1);
        adjust(&mut holdings.items, &cost.items, -1);
        Ok(())
    }

    async fn refund(&self, user_id: &UserId, cost: &ProgressionCost) -> Result<(), WalletError> {
        let mut holdings = self.holdings.entry(user_id.clone()).or_default();
        adjust(&mut holdings.currencies, &cost.currencies, 1);
        adjust(&mut holdings.items, &cost.items, 1);
        Ok(())
    }
}
