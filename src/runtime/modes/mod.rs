//! Mode routing
//!
//! - `serve`: HTTP server plus background checker (default)
//! - `check-once`: one checker tick, then exit
//! - `add` / `remove` / `list`: link maintenance

pub mod check_once;
pub mod links;
pub mod server;

pub use check_once::run_check_once;
pub use links::{run_add, run_list, run_remove};
pub use server::run_server;
