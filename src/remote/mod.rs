//! Remote acquisition layer.
//!
//! Everything downstream of acquisition talks to a [`RemoteStore`]: directory
//! listing, a listing-based directory probe, and whole-file reads. The
//! production implementation is [`channel::SecureChannel`] (an SSH hop chain
//! with SFTP on the final hop); [`local::LocalStore`] serves on-disk archives
//! through the same interface, and tests use the in-memory store from
//! `crate::mock`.

pub mod catalog;
pub mod channel;
pub mod local;

pub use catalog::{CatalogEntry, RemoteCatalog};
pub use channel::{RemoteEndpoint, Secret, SecureChannel};
pub use local::LocalStore;

use crate::error::PickResult;

/// Listing and whole-file read over some file tree, remote or local.
///
/// Paths are `/`-joined strings in the store's own namespace; the catalog
/// builds them from its root, station, and file names.
pub trait RemoteStore {
    /// Entry names directly under `path`, sorted lexicographically.
    /// Fails with `Access` for a missing or forbidden path, `Connect` when
    /// the underlying session is broken.
    fn list(&self, path: &str) -> PickResult<Vec<String>>;

    /// Whole contents of the file at `path`. Open failures classify as
    /// `Access`; a transfer that dies after the open classifies as `Read`.
    fn read_all(&self, path: &str) -> PickResult<Vec<u8>>;

    /// Directory probe by attempted listing: a path is a directory exactly
    /// when listing it succeeds. Deliberately not a metadata stat — the probe
    /// answers the only question enumeration asks.
    fn is_directory(&self, path: &str) -> bool {
        self.list(path).is_ok()
    }
}
