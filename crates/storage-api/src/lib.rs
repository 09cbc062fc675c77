//! Read-only state and header view contracts.
//!
//! The pool and the admission handler never own chain state, they only query
//! it. These traits are the narrow boundary a node implements on top of its
//! storage engine: point storage lookups, storage roots and block header
//! attributes for one fixed block each. Implementations are expected to be
//! snapshot-consistent: a view handed out represents a single block and never
//! changes underneath the caller.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::{Address, B256};

mod error;
pub use error::StateViewError;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

/// Result alias for state view access.
pub type StateViewResult<T> = Result<T, StateViewError>;

/// A read-only view over the world state of a single block.
pub trait StateView: Send + Sync {
    /// Returns the storage root of the given account.
    fn storage_root(&self, address: Address) -> StateViewResult<B256>;

    /// Returns the value of the given storage slot of the given account, or
    /// `None` if the slot was never written.
    fn storage_value(&self, address: Address, slot: B256) -> StateViewResult<Option<B256>>;
}

impl<T: StateView + ?Sized> StateView for &T {
    fn storage_root(&self, address: Address) -> StateViewResult<B256> {
        (**self).storage_root(address)
    }

    fn storage_value(&self, address: Address, slot: B256) -> StateViewResult<Option<B256>> {
        (**self).storage_value(address, slot)
    }
}

impl<T: StateView + ?Sized> StateView for std::sync::Arc<T> {
    fn storage_root(&self, address: Address) -> StateViewResult<B256> {
        (**self).storage_root(address)
    }

    fn storage_value(&self, address: Address, slot: B256) -> StateViewResult<Option<B256>> {
        (**self).storage_value(address, slot)
    }
}

impl<T: StateView + ?Sized> StateView for Box<T> {
    fn storage_root(&self, address: Address) -> StateViewResult<B256> {
        (**self).storage_root(address)
    }

    fn storage_value(&self, address: Address, slot: B256) -> StateViewResult<Option<B256>> {
        (**self).storage_value(address, slot)
    }
}

/// Header attributes of a single block.
pub trait HeaderView: Send + Sync {
    /// The block number.
    fn number(&self) -> u64;

    /// The block timestamp, in unix seconds.
    fn timestamp(&self) -> u64;

    /// Hash of the parent block.
    fn parent_hash(&self) -> B256;
}

/// Produces state and header views anchored at specific blocks.
///
/// The factory is the only place the core asks for new views; deadlines and
/// retry policy for the underlying storage engine live behind it.
pub trait StateViewFactory: Send + Sync {
    /// The state view type handed out by this factory.
    type StateView: StateView;
    /// The header view type handed out by this factory.
    type Header: HeaderView;

    /// Returns the header of the latest block, if any block exists.
    fn latest_header(&self) -> StateViewResult<Option<Self::Header>>;

    /// Returns a state view anchored at the latest block.
    fn latest_state(&self) -> StateViewResult<Self::StateView>;

    /// Returns a state view anchored at the block with the given hash.
    fn state_by_block_hash(&self, hash: B256) -> StateViewResult<Self::StateView>;
}

impl<T: StateViewFactory> StateViewFactory for std::sync::Arc<T> {
    type StateView = T::StateView;
    type Header = T::Header;

    fn latest_header(&self) -> StateViewResult<Option<Self::Header>> {
        (**self).latest_header()
    }

    fn latest_state(&self) -> StateViewResult<Self::StateView> {
        (**self).latest_state()
    }

    fn state_by_block_hash(&self, hash: B256) -> StateViewResult<Self::StateView> {
        (**self).state_by_block_hash(hash)
    }
}
