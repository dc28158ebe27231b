//! Local directory archives behind the store interface.
//!
//! The same station/file layout sometimes lives on the operator's disk (an
//! exported archive, or a field laptop that already synced the data). Serving
//! it through [`RemoteStore`] lets the catalog, session, and ledger run
//! unchanged with no hop chain at all.

use crate::error::{PickError, PickResult};
use crate::remote::RemoteStore;
use std::fs;
use std::io;
use std::path::Path;

/// `RemoteStore` over the local filesystem. Paths are used as given; the
/// catalog builds them from its configured root.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

fn classify_io_error(err: &io::Error, path: &str, opened: bool) -> PickError {
    if opened {
        PickError::Read(format!("{path}: {err}"))
    } else {
        PickError::Access(format!("{path}: {err}"))
    }
}

impl RemoteStore for LocalStore {
    fn list(&self, path: &str) -> PickResult<Vec<String>> {
        let dir = fs::read_dir(Path::new(path))
            .map_err(|e| classify_io_error(&e, path, false))?;
        let mut names = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| classify_io_error(&e, path, false))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read_all(&self, path: &str) -> PickResult<Vec<u8>> {
        // A missing or forbidden path fails the open; anything after the
        // open is a read loss.
        let mut file = fs::File::open(Path::new(path))
            .map_err(|e| classify_io_error(&e, path, false))?;
        let mut raw = Vec::new();
        io::Read::read_to_end(&mut file, &mut raw)
            .map_err(|e| classify_io_error(&e, path, true))?;
        Ok(raw)
    }
}
