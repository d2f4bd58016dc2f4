#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]
//! Shared constants, configuration, error taxonomy, entity models and the
//! snapshot-diff engine used by every service that bridges the upstream
//! strategy bus and the broker gateway.

/// Process-wide constants: trading sessions, TTLs, queue limits.
pub mod constants;

/// Typed configuration loaded from YAML with a path-fallback chain.
pub mod config;

/// Unified error taxonomy for the bridge.
pub mod error;

/// Default `tracing` initialisers (console + rotating file sink).
pub mod logging;

/// Graceful shutdown primitives shared by every binary.
pub mod shutdown;

/// Trading-session windows and age checks (Asia/Shanghai).
pub mod time;

/// Entity models: orders, trades, positions, account, universe symbols.
pub mod model;

/// Generic snapshot-diff change detector.
pub mod diff;

/// Close-today / historical position split for SHFE/INE-style exchanges.
pub mod split;
