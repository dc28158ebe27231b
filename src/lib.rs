//! # Seispick Core Library
//!
//! This crate is the core library for the `seispick` application. It annotates
//! seismic waveform segments with a phase-arrival timestamp, combining the
//! output of an automated detector with an optional manual override, over data
//! that is only reachable through a chain of authenticated SSH hops. The
//! library contains everything except the rendering frontend: acquisition,
//! cataloging, admission, arbitration, session sequencing, and the durable
//! annotation ledger.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct
//! responsibility:
//!
//! - **`remote`**: The acquisition layer. `SecureChannel` establishes and
//!   tears down the SSH hop chain and exposes directory listing and whole-file
//!   reads over SFTP; `RemoteCatalog` turns the remote directory structure and
//!   filename conventions into an ordered list of annotatable entries;
//!   `LocalStore` provides the same interface over an on-disk archive.
//! - **`waveform`**: The canonical `Trace` and `WaveformSegment` data model
//!   produced by admission.
//! - **`admission`**: The gate between raw remote bytes and a normalized
//!   segment. Decode, detrend, resample, and merge are delegated to a
//!   `WaveformCodec`; this module owns the admission policy.
//! - **`oracle`**: The `DetectionOracle` contract for the external phase
//!   detector, and the `Candidate` picks it emits.
//! - **`arbiter`**: Deterministic selection of at most one candidate against
//!   the catalog reference timestamp, via an ordered fallback table.
//! - **`session`**: The `AnnotationSession` controller that sequences entries,
//!   holds the manual override, and drives save actions.
//! - **`ledger`**: The append-only annotation ledger, one durable line per
//!   save action.
//! - **`config`**: Strongly-typed configuration loaded from TOML and
//!   environment variables. See `config::Config`.
//! - **`error`**: The custom `PickError` enum for centralized error handling
//!   across the application.
//! - **`logging`**: Structured logging setup on top of `tracing`.
//! - **`validation`**: Utility functions for validating configuration values.
//! - **`mock`**: In-memory store, codec, and oracle implementations for
//!   running and testing without a remote host or a trained model.

pub mod admission;
pub mod arbiter;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod mock;
pub mod oracle;
pub mod remote;
pub mod session;
pub mod validation;
pub mod waveform;
