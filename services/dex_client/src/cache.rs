//! # On-Chain State Cache
//!
//! ## Purpose
//!
//! Latest observed balances, allowances and reserves for the connected
//! account. Every entry is independently refreshable: reads go through the
//! cache (`get_*`), synchronous views look without reading (`peek_*`), and
//! workflows invalidate exactly the entries a confirmed transaction touched.
//!
//! ## Consistency Model
//!
//! - Keys carry the chain id, so identical addresses deployed on several
//!   chains never share an entry
//! - A read stores its result when it completes, so the freshest result by
//!   completion order wins
//! - A read issued before the latest invalidation still stores its value but
//!   leaves the entry stale; only a read issued afterwards clears it
//! - A failed read leaves the entry as it was: stale-but-present, or unknown
//!   if it was never fetched
//! - No lock is held across an await; concurrent reads of different keys
//!   proceed independently
//!
//! ## Architecture Role
//!
//! ```text
//! Workflows ──get/peek──▶ StateCache ──miss/stale──▶ ChainReader
//!     │                       ▲
//!     └──invalidate(keys)─────┘   (after confirmation)
//! ```

use dashmap::DashMap;
use dex_types::{Address, ChainId, ChainReader, DexError, ReservePair, U256};
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::logging::LogEmoji;

/// Identity of one cached on-chain value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Balance {
        chain_id: ChainId,
        asset: Address,
        owner: Address,
    },
    Allowance {
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    },
    Reserves {
        chain_id: ChainId,
        exchange: Address,
    },
}

impl CacheKey {
    /// Balance key; `None` when the asset or owner is undefined
    pub fn balance(chain_id: ChainId, asset: Option<Address>, owner: Option<Address>) -> Option<Self> {
        Some(CacheKey::Balance {
            chain_id,
            asset: asset?,
            owner: owner?,
        })
    }

    /// Allowance key; `None` when any party is undefined
    pub fn allowance(
        chain_id: ChainId,
        token: Option<Address>,
        owner: Option<Address>,
        spender: Option<Address>,
    ) -> Option<Self> {
        Some(CacheKey::Allowance {
            chain_id,
            token: token?,
            owner: owner?,
            spender: spender?,
        })
    }

    pub fn reserves(chain_id: ChainId, exchange: Option<Address>) -> Option<Self> {
        Some(CacheKey::Reserves {
            chain_id,
            exchange: exchange?,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            CacheKey::Balance { chain_id, .. }
            | CacheKey::Allowance { chain_id, .. }
            | CacheKey::Reserves { chain_id, .. } => *chain_id,
        }
    }
}

/// Raw cached value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedValue {
    Amount(U256),
    Reserves(ReservePair),
}

/// A cached value with its freshness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot<T> {
    pub value: T,
    /// Logical tick at which the value was stored
    pub refreshed_at: u64,
    /// Invalidated since the value was read
    pub stale: bool,
}

pub type BalanceSnapshot = Snapshot<U256>;
pub type AllowanceSnapshot = Snapshot<U256>;
pub type ReserveSnapshot = Snapshot<ReservePair>;

impl Snapshot<CachedValue> {
    fn amount(self) -> Option<Snapshot<U256>> {
        match self.value {
            CachedValue::Amount(value) => Some(self.with_value(value)),
            CachedValue::Reserves(_) => None,
        }
    }

    fn reserve_pair(self) -> Option<Snapshot<ReservePair>> {
        match self.value {
            CachedValue::Reserves(value) => Some(self.with_value(value)),
            CachedValue::Amount(_) => None,
        }
    }

    fn with_value<T>(self, value: T) -> Snapshot<T> {
        Snapshot {
            value,
            refreshed_at: self.refreshed_at,
            stale: self.stale,
        }
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    value: Option<CachedValue>,
    refreshed_at: u64,
    stale: bool,
    /// Tick of the latest invalidation
    invalidated_at: u64,
    in_flight: u32,
    invalidations: u64,
}

impl CacheEntry {
    fn snapshot(&self) -> Option<Snapshot<CachedValue>> {
        self.value.map(|value| Snapshot {
            value,
            refreshed_at: self.refreshed_at,
            stale: self.stale,
        })
    }
}

/// Bookkeeping view of one entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryStatus {
    pub known: bool,
    pub stale: bool,
    pub refreshed_at: Option<u64>,
    pub in_flight: u32,
    pub invalidations: u64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// `get` answered from a fresh entry
    pub hits: u64,
    /// `get` needed a read
    pub misses: u64,
    pub reads: u64,
    pub read_failures: u64,
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct MetricCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    reads: AtomicU64,
    read_failures: AtomicU64,
    invalidations: AtomicU64,
}

/// Read-through cache of on-chain state
pub struct StateCache {
    reader: Arc<dyn ChainReader>,
    entries: DashMap<CacheKey, CacheEntry>,
    /// Logical clock for issue/completion/invalidation ordering
    tick: AtomicU64,
    /// Bumped by `clear`; reads from an older generation are not stored
    generation: AtomicU64,
    counters: MetricCounters,
}

impl StateCache {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self {
            reader,
            entries: DashMap::new(),
            tick: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            counters: MetricCounters::default(),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Cached snapshot without issuing a read
    pub fn peek(&self, key: &CacheKey) -> Option<Snapshot<CachedValue>> {
        self.entries.get(key).and_then(|entry| entry.snapshot())
    }

    pub fn peek_balance(
        &self,
        chain_id: ChainId,
        asset: Option<Address>,
        owner: Option<Address>,
    ) -> Option<BalanceSnapshot> {
        let key = CacheKey::balance(chain_id, asset, owner)?;
        self.peek(&key)?.amount()
    }

    pub fn peek_allowance(
        &self,
        chain_id: ChainId,
        token: Option<Address>,
        owner: Option<Address>,
        spender: Option<Address>,
    ) -> Option<AllowanceSnapshot> {
        let key = CacheKey::allowance(chain_id, token, owner, spender)?;
        self.peek(&key)?.amount()
    }

    pub fn peek_reserves(&self, chain_id: ChainId, exchange: Option<Address>) -> Option<ReserveSnapshot> {
        let key = CacheKey::reserves(chain_id, exchange)?;
        self.peek(&key)?.reserve_pair()
    }

    /// Read-through lookup: reads when the entry is missing or stale
    pub async fn get(&self, key: CacheKey) -> Result<Snapshot<CachedValue>, DexError> {
        if let Some(snapshot) = self.peek(&key) {
            if !snapshot.stale {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(snapshot);
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.fetch(key).await
    }

    /// Latest balance of `asset` held by `owner`
    ///
    /// `Ok(None)` without any read when the asset or owner is undefined.
    pub async fn get_balance(
        &self,
        chain_id: ChainId,
        asset: Option<Address>,
        owner: Option<Address>,
    ) -> Result<Option<BalanceSnapshot>, DexError> {
        match CacheKey::balance(chain_id, asset, owner) {
            Some(key) => Ok(self.get(key).await?.amount()),
            None => Ok(None),
        }
    }

    pub async fn get_allowance(
        &self,
        chain_id: ChainId,
        token: Option<Address>,
        owner: Option<Address>,
        spender: Option<Address>,
    ) -> Result<Option<AllowanceSnapshot>, DexError> {
        match CacheKey::allowance(chain_id, token, owner, spender) {
            Some(key) => Ok(self.get(key).await?.amount()),
            None => Ok(None),
        }
    }

    pub async fn get_reserves(
        &self,
        chain_id: ChainId,
        exchange: Option<Address>,
    ) -> Result<Option<ReserveSnapshot>, DexError> {
        match CacheKey::reserves(chain_id, exchange) {
            Some(key) => Ok(self.get(key).await?.reserve_pair()),
            None => Ok(None),
        }
    }

    /// Issue a read for `key` and store its result on completion
    async fn fetch(&self, key: CacheKey) -> Result<Snapshot<CachedValue>, DexError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let issued_at = self.next_tick();
        self.entries.entry(key).or_default().in_flight += 1;
        self.counters.reads.fetch_add(1, Ordering::Relaxed);

        let result = self.read(&key).await;
        let completed_at = self.next_tick();

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding read of {:?} from before cache clear", key);
            return result.map(|value| Snapshot {
                value,
                refreshed_at: completed_at,
                stale: true,
            });
        }

        let mut entry = self.entries.entry(key).or_default();
        entry.in_flight = entry.in_flight.saturating_sub(1);

        match result {
            Ok(value) => {
                entry.value = Some(value);
                entry.refreshed_at = completed_at;
                if issued_at > entry.invalidated_at {
                    entry.stale = false;
                }
                Ok(Snapshot {
                    value,
                    refreshed_at: completed_at,
                    stale: entry.stale,
                })
            }
            Err(e) => {
                self.counters.read_failures.fetch_add(1, Ordering::Relaxed);
                debug!("Read of {:?} failed: {}", key, e);
                Err(e)
            }
        }
    }

    async fn read(&self, key: &CacheKey) -> Result<CachedValue, DexError> {
        match *key {
            CacheKey::Balance {
                chain_id,
                asset,
                owner,
            } => self
                .reader
                .balance_of(chain_id, asset, owner)
                .await
                .map(CachedValue::Amount),
            CacheKey::Allowance {
                chain_id,
                token,
                owner,
                spender,
            } => self
                .reader
                .allowance(chain_id, token, owner, spender)
                .await
                .map(CachedValue::Amount),
            CacheKey::Reserves { chain_id, exchange } => self
                .reader
                .reserves(chain_id, exchange)
                .await
                .map(CachedValue::Reserves),
        }
    }

    /// Mark an entry stale without reading
    pub fn mark_stale(&self, key: &CacheKey) {
        let invalidated_at = self.next_tick();
        let mut entry = self.entries.entry(*key).or_default();
        entry.stale = true;
        entry.invalidated_at = invalidated_at;
        entry.invalidations += 1;
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark an entry stale and re-read it
    pub async fn invalidate(&self, key: CacheKey) -> Result<(), DexError> {
        debug!("{} Invalidating {:?}", LogEmoji::CACHE, key);
        self.mark_stale(&key);
        self.fetch(key).await.map(|_| ())
    }

    /// Invalidate several entries, re-reading them concurrently
    ///
    /// Every key is invalidated even if some re-reads fail; the first
    /// failure is returned.
    pub async fn invalidate_all(&self, keys: &[CacheKey]) -> Result<(), DexError> {
        let results = join_all(keys.iter().map(|key| self.invalidate(*key))).await;
        results.into_iter().collect()
    }

    /// Drop every entry (account or chain changed)
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        debug!("{} State cache cleared", LogEmoji::CACHE);
    }

    pub fn entry_status(&self, key: &CacheKey) -> EntryStatus {
        match self.entries.get(key) {
            Some(entry) => EntryStatus {
                known: entry.value.is_some(),
                stale: entry.stale,
                refreshed_at: entry.value.map(|_| entry.refreshed_at),
                in_flight: entry.in_flight,
                invalidations: entry.invalidations,
            },
            None => EntryStatus::default(),
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            read_failures: self.counters.read_failures.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
