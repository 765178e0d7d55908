use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};

use crate::checker::CheckerHandle;

/// 等待检查器退出的最长时间（秒）
///
/// 已派发的探测需要跑完，单个探测受 probe_timeout 约束。
const CHECKER_STOP_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping background tasks...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 停止后台检查器，超时后放弃等待
pub async fn stop_checker(checker: Option<CheckerHandle>) {
    let Some(checker) = checker else {
        return;
    };

    let timeout = Duration::from_secs(CHECKER_STOP_TIMEOUT_SECS);
    if checker.stop_with_timeout(timeout).await {
        info!("Destination checker stopped cleanly");
    } else {
        error!(
            "Destination checker did not stop within {} seconds, abandoning in-flight checks",
            CHECKER_STOP_TIMEOUT_SECS
        );
    }
}
