//! Primitive store interface for remote data structures.
//!
//! Every collection adapter in this workspace keeps its state in a
//! key-addressed remote store and talks to it exclusively through the
//! [`StoreHandle`] trait defined here. The trait is the complete primitive
//! surface the adapters need: list, set and hash commands plus key deletion.
//!
//! # Backends
//!
//! - [`InMemoryStore`] -- `HashMap`-based store with remote-store semantics,
//!   for tests and embedding
//!
//! Connection management, authentication and retry policy belong to the
//! backend, not to the adapters built on top of it.

pub mod error;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use key::{validate_key, MAX_KEY_LEN};
pub use memory::InMemoryStore;
pub use traits::{SetOp, StoreHandle};
