use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static SLOW_SQL_TOTAL: AtomicU64 = AtomicU64::new(0);

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    if s.len() <= max_len {
        return s;
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &s[..cut])
}

/// 安装 SQLite 语句 profile（慢查询日志）
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `FAB_MES_PERF_SQL=1` 强制开启
/// - `FAB_MES_SLOW_SQL_MS=50` 配置慢 SQL 阈值（毫秒）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = match std::env::var("FAB_MES_PERF_SQL") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };

    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var("FAB_MES_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.profile(Some(sql_profile_callback));
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        let total = SLOW_SQL_TOTAL.fetch_add(1, Ordering::Relaxed) + 1;
        let sql_short = truncate_sql(sql, 420);
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            total,
            sql = %sql_short,
            "slow sql"
        );
    }
}

/// 性能统计 Guard：记录聚合操作耗时
///
/// 扇出查询跨线程执行，这里只统计调用方视角的总耗时。
///
/// 使用方式：
/// ```ignore
/// let perf = fab_mes::perf::PerfGuard::new("lot.history");
/// // do work...
/// tracing::error!(elapsed_ms = perf.elapsed_ms(), "...");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.elapsed_ms(),
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sql_respects_char_boundary() {
        let sql = "SELECT * FROM return_history WHERE return_reason = '품질 불량'";
        let short = truncate_sql(sql, 52);
        assert!(short.ends_with('…'));
        assert!(short.len() <= 52 + '…'.len_utf8());
    }

    #[test]
    fn test_is_true_variants() {
        assert!(is_true(" YES "));
        assert!(is_true("1"));
        assert!(!is_true("off"));
    }
}
