//! 目标地址状态检查器
//!
//! 后台周期性探测每个短链接的目标地址，判定存活/失效，并可选地为失效链接查询
//! 存档快照。结果写入状态表，供重定向处理器决定是跳转还是展示失效提示页。
//!
//! - [`selector`]：无状态的到期批次选择
//! - [`prober`]：单次 HTTP 探测与三态分类
//! - [`archive`]：存档快照查询
//! - [`transition`]：每个链接的小状态机
//! - [`scheduler`]：周期调度、有界并发与失败隔离

pub mod archive;
pub mod prober;
pub mod repository;
pub mod scheduler;
pub mod selector;
mod settings;
pub mod transition;

pub use archive::{ArchiveResolver, WaybackResolver};
pub use prober::{Classification, DestinationProber, HttpProber, ProbeOutcome, classify_status};
pub use repository::{StatusRepository, UrlRepository};
pub use scheduler::{CheckerHandle, CheckerScheduler, SchedulerState, TickReport};
pub use selector::{DueBatches, select_archive_batch, select_destination_batch, select_due};
pub use settings::CheckerSettings;
pub use transition::{ProbeTransition, apply_archive, apply_probe};
