//! Configuration management
//!
//! 静态配置从 TOML 文件 + 环境变量加载，进程生命周期内不可变。

mod r#impl;
mod structs;
pub mod validators;

pub use r#impl::{get_config, init_config, init_config_from, try_get_config};
pub use structs::*;
