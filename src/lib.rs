//! linkwatch - a URL shortener that keeps an eye on its destinations
//!
//! Besides serving redirects, a background checker periodically probes every
//! stored destination, records whether it is alive or gone, and optionally looks
//! up an archived snapshot for gone destinations. The redirect handler then shows
//! an interstitial for gone links instead of redirecting.
//!
//! # Architecture
//! - `checker`: batch selection, probing, archive lookup, per-link state machine, scheduler
//! - `storage`: SeaORM storage backend (SQLite/MySQL/PostgreSQL) and models
//! - `api`: HTTP services (redirect, health)
//! - `config`: Static configuration (TOML + env)
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod checker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod storage;
pub mod system;
pub mod utils;
