//! Deterministic record catalog over a remote file tree.
//!
//! The remote layout is `{root}/{station}/{name}.{ext}`: one subdirectory per
//! station, one waveform file per triggered event. [`RemoteCatalog`] turns
//! that tree into an ordered sequence of [`CatalogEntry`] values — station
//! lexicographic, then file lexicographic — so repeated enumerations of an
//! unchanged tree are identical.
//!
//! A failure while listing a single station is logged and that station is
//! skipped; its siblings still enumerate. Only a failure to list the root
//! itself fails the enumeration.

use crate::error::PickResult;
use crate::remote::RemoteStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One annotatable waveform file discovered under the catalog root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Station identifier (the subdirectory name).
    pub station: String,
    /// Absolute remote path of the waveform file.
    pub path: String,
    /// The raw reference token exactly as the ledger records it: the
    /// trailing underscore-delimited part of the filename when it parses as
    /// an epoch, empty otherwise.
    pub reference_raw: String,
    /// Reference epoch in seconds, when the filename carried one.
    pub reference: Option<f64>,
}

/// Enumerates station/file entries and parses filename reference epochs.
pub struct RemoteCatalog {
    suffix: String,
}

impl RemoteCatalog {
    /// `suffix` is the expected waveform extension without the dot, matched
    /// case-insensitively.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Walks `root` and returns every matching entry in deterministic order.
    pub fn enumerate(&self, store: &dyn RemoteStore, root: &str) -> PickResult<Vec<CatalogEntry>> {
        let root = root.trim_end_matches('/');
        let mut stations = store.list(root)?;
        stations.sort();
        info!(count = stations.len(), %root, "station folders found");

        let mut entries = Vec::new();
        for station in stations {
            let station_dir = format!("{root}/{station}");
            if !store.is_directory(&station_dir) {
                debug!(path = %station_dir, "not a directory, skipped");
                continue;
            }
            let mut names = match store.list(&station_dir) {
                Ok(names) => names,
                Err(err) => {
                    warn!(station = %station, error = %err, "station listing failed, skipped");
                    continue;
                }
            };
            names.sort();
            let mut kept = 0usize;
            for name in names {
                if !self.matches_suffix(&name) {
                    continue;
                }
                let (reference_raw, reference) = parse_reference(&name);
                entries.push(CatalogEntry {
                    station: station.clone(),
                    path: format!("{station_dir}/{name}"),
                    reference_raw,
                    reference,
                });
                kept += 1;
            }
            debug!(station = %station, files = kept, "station enumerated");
        }
        info!(total = entries.len(), "catalog enumeration complete");
        Ok(entries)
    }

    fn matches_suffix(&self, name: &str) -> bool {
        let wanted = format!(".{}", self.suffix.to_ascii_lowercase());
        name.to_ascii_lowercase().ends_with(&wanted)
    }
}

/// Splits off the trailing underscore-delimited token before the extension
/// and parses it as a floating-point epoch. Absence or a parse failure yields
/// `("", None)` — an entry without a reference, never an enumeration error.
pub fn parse_reference(name: &str) -> (String, Option<f64>) {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _ext)| stem);
    let token = stem.rsplit('_').next().unwrap_or(stem);
    match token.parse::<f64>() {
        Ok(epoch) if epoch.is_finite() => (token.to_string(), Some(epoch)),
        _ => (String::new(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_token_is_the_trailing_underscore_part() {
        let (raw, epoch) = parse_reference("STA1_1696204158.5.mseed");
        assert_eq!(raw, "1696204158.5");
        assert_eq!(epoch, Some(1696204158.5));
    }

    #[test]
    fn non_numeric_tail_yields_no_reference() {
        let (raw, epoch) = parse_reference("STA1_calibration.mseed");
        assert_eq!(raw, "");
        assert_eq!(epoch, None);
    }

    #[test]
    fn name_without_underscore_still_parses_when_numeric() {
        let (raw, epoch) = parse_reference("1696204158.5.mseed");
        assert_eq!(raw, "1696204158.5");
        assert_eq!(epoch, Some(1696204158.5));
    }

    #[test]
    fn extensionless_name_uses_whole_stem() {
        let (raw, epoch) = parse_reference("STA1_42");
        assert_eq!(raw, "42");
        assert_eq!(epoch, Some(42.0));
    }
}
