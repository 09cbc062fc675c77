//! Mock state and header views for tests.

use crate::{HeaderView, StateView, StateViewError, StateViewFactory, StateViewResult};
use alloy_primitives::{Address, B256};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// An in-memory [`StateView`] backed by hash maps.
///
/// Every storage lookup increments a shared counter so tests can assert how
/// many state accesses an operation performed (including zero).
#[derive(Debug, Clone, Default)]
pub struct MockStateView {
    storage_roots: HashMap<Address, B256>,
    storage: HashMap<(Address, B256), B256>,
    lookups: Arc<AtomicUsize>,
}

impl MockStateView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage root of the given account.
    pub fn with_storage_root(mut self, address: Address, root: B256) -> Self {
        self.set_storage_root(address, root);
        self
    }

    /// Sets the value of a storage slot of the given account.
    pub fn with_storage_value(mut self, address: Address, slot: B256, value: B256) -> Self {
        self.set_storage_value(address, slot, value);
        self
    }

    /// Sets the storage root of the given account.
    pub fn set_storage_root(&mut self, address: Address, root: B256) {
        self.storage_roots.insert(address, root);
    }

    /// Sets the value of a storage slot of the given account.
    pub fn set_storage_value(&mut self, address: Address, slot: B256, value: B256) {
        self.storage.insert((address, slot), value);
    }

    /// Number of storage lookups served so far, across all clones of this
    /// view.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl StateView for MockStateView {
    fn storage_root(&self, address: Address) -> StateViewResult<B256> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.storage_roots.get(&address).copied().unwrap_or_default())
    }

    fn storage_value(&self, address: Address, slot: B256) -> StateViewResult<Option<B256>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.storage.get(&(address, slot)).copied())
    }
}

/// A [`StateView`] whose lookups always fail, for exercising state-access
/// failure paths.
#[derive(Debug, Clone, Default)]
pub struct FailingStateView;

impl StateView for FailingStateView {
    fn storage_root(&self, _address: Address) -> StateViewResult<B256> {
        Err(StateViewError::Lookup("mock failure".to_string()))
    }

    fn storage_value(&self, _address: Address, _slot: B256) -> StateViewResult<Option<B256>> {
        Err(StateViewError::Lookup("mock failure".to_string()))
    }
}

/// An in-memory [`HeaderView`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MockHeader {
    /// Block number.
    pub number: u64,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
    /// Parent block hash.
    pub parent_hash: B256,
}

impl HeaderView for MockHeader {
    fn number(&self) -> u64 {
        self.number
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn parent_hash(&self) -> B256 {
        self.parent_hash
    }
}

/// A [`StateViewFactory`] over a fixed latest block and its parent.
#[derive(Debug, Clone, Default)]
pub struct MockStateViewFactory {
    /// Header of the latest block. `None` means an empty chain.
    pub header: Option<MockHeader>,
    /// State at the latest block.
    pub latest: MockStateView,
    /// State keyed by block hash, typically the parent.
    pub by_hash: HashMap<B256, MockStateView>,
}

impl MockStateViewFactory {
    /// Creates a factory whose latest block has the given header, with the
    /// parent state registered under `header.parent_hash`.
    pub fn new(header: MockHeader, latest: MockStateView, parent: MockStateView) -> Self {
        let mut by_hash = HashMap::new();
        by_hash.insert(header.parent_hash, parent);
        Self { header: Some(header), latest, by_hash }
    }
}

impl StateViewFactory for MockStateViewFactory {
    type StateView = MockStateView;
    type Header = MockHeader;

    fn latest_header(&self) -> StateViewResult<Option<Self::Header>> {
        Ok(self.header)
    }

    fn latest_state(&self) -> StateViewResult<Self::StateView> {
        Ok(self.latest.clone())
    }

    fn state_by_block_hash(&self, hash: B256) -> StateViewResult<Self::StateView> {
        self.by_hash.get(&hash).cloned().ok_or(StateViewError::BlockNotFound(hash))
    }
}
