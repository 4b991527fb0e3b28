// ==========================================
// 多厂区 MES 聚合系统 - 并发扇出执行器
// ==========================================
// 职责: 对路由选中的厂区数据源执行同一查询并收集结果
// 规则:
// - 单厂区: 当前线程同步调用
// - 多厂区: 每厂区一个阻塞任务，共享截止时间，join_all 屏障后返回
// - 单厂区失败 / panic / 超时 → 该厂区槽位记为失败，不影响其他厂区
// - 超时任务不强制取消，其结果被丢弃
// ==========================================

use crate::domain::record::FabRecord;
use crate::domain::types::FabId;
use crate::repository::adapter::FabSourceAdapter;
use crate::repository::error::RepositoryResult;
use futures::future::join_all;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// 对单个数据源执行的查询操作
pub type FabOp<T> = Arc<dyn Fn(&dyn FabSourceAdapter<T>) -> RepositoryResult<Vec<T>> + Send + Sync>;

/// 厂区数据源共享句柄
pub type SharedAdapter<T> = Arc<dyn FabSourceAdapter<T>>;

/// 单厂区执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome<T> {
    Settled(Vec<T>),
    Failed(String),
    TimedOut,
}

/// 写一次的结果槽（每厂区一个）
#[derive(Debug, Clone, PartialEq)]
pub struct FabSlot<T> {
    pub fab: FabId,
    pub outcome: SlotOutcome<T>,
}

impl<T> FabSlot<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self.outcome, SlotOutcome::Settled(_))
    }

    /// 失败原因（成功时为 None）
    pub fn failure(&self) -> Option<String> {
        match &self.outcome {
            SlotOutcome::Settled(_) => None,
            SlotOutcome::Failed(reason) => Some(format!("{}: {}", self.fab, reason)),
            SlotOutcome::TimedOut => Some(format!("{}: timed out", self.fab)),
        }
    }
}

// ==========================================
// FanOutExecutor
// ==========================================
#[derive(Debug, Clone)]
pub struct FanOutExecutor {
    timeout: Duration,
}

impl FanOutExecutor {
    /// # 参数
    /// - `timeout`: 多厂区扇出的总超时（所有任务共享同一截止时间）
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 单厂区同步执行
    pub fn run_single<T: FabRecord>(
        &self,
        adapter: &dyn FabSourceAdapter<T>,
        op: &FabOp<T>,
        operation: &str,
    ) -> FabSlot<T> {
        let fab = adapter.fab();
        let outcome = match catch_unwind(AssertUnwindSafe(|| op(adapter))) {
            Ok(Ok(records)) => {
                debug!(fab = %fab, operation, count = records.len(), "厂区查询完成");
                SlotOutcome::Settled(records)
            }
            Ok(Err(e)) => {
                warn!(
                    fab = %fab,
                    operation,
                    unavailable = e.is_source_unavailable(),
                    error = %e,
                    "厂区查询失败，该厂区按空结果处理"
                );
                SlotOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(fab = %fab, operation, "厂区查询异常中止，该厂区按空结果处理");
                SlotOutcome::Failed("adapter panicked".to_string())
            }
        };
        FabSlot { fab, outcome }
    }

    /// 多厂区并发执行
    ///
    /// 返回槽位顺序与传入数据源顺序一致，与完成先后无关
    pub async fn run_all<T: FabRecord>(
        &self,
        adapters: Vec<SharedAdapter<T>>,
        op: FabOp<T>,
        operation: &str,
    ) -> Vec<FabSlot<T>> {
        let deadline = Instant::now() + self.timeout;
        let timeout_ms = self.timeout.as_millis() as u64;

        let tasks = adapters.into_iter().map(|adapter| {
            let op = Arc::clone(&op);
            let fab = adapter.fab();
            async move {
                let handle = tokio::task::spawn_blocking(move || op(adapter.as_ref()));

                let outcome = match timeout_at(deadline, handle).await {
                    Ok(Ok(Ok(records))) => {
                        debug!(fab = %fab, operation, count = records.len(), "厂区查询完成");
                        SlotOutcome::Settled(records)
                    }
                    Ok(Ok(Err(e))) => {
                        warn!(
                            fab = %fab,
                            operation,
                            unavailable = e.is_source_unavailable(),
                            error = %e,
                            "厂区查询失败，该厂区按空结果处理"
                        );
                        SlotOutcome::Failed(e.to_string())
                    }
                    Ok(Err(join_err)) => {
                        warn!(fab = %fab, operation, error = %join_err, "厂区查询任务异常中止，该厂区按空结果处理");
                        SlotOutcome::Failed(join_err.to_string())
                    }
                    Err(_) => {
                        warn!(fab = %fab, operation, timeout_ms, "厂区查询超时，结果将被丢弃");
                        SlotOutcome::TimedOut
                    }
                };
                FabSlot { fab, outcome }
            }
        });

        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::DateRange;
    use crate::domain::LotData;
    use crate::repository::adapter::UnavailableSource;
    use crate::repository::error::RepositoryError;

    struct StaticSource {
        fab: FabId,
        delay: Duration,
        panic: bool,
    }

    fn lot(fab: FabId, lot_number: &str) -> LotData {
        LotData {
            id: lot_number.to_string(),
            lot_number: lot_number.to_string(),
            product: None,
            fab,
            status: Some("waiting".to_string()),
            start_time: None,
            end_time: None,
            step: None,
            equipment: None,
            progress: None,
            estimated_completion: None,
            duration: None,
            result: None,
            created_at: None,
            updated_at: None,
        }
    }

    impl FabSourceAdapter<LotData> for StaticSource {
        fn fab(&self) -> FabId {
            self.fab
        }

        fn select_all(&self) -> RepositoryResult<Vec<LotData>> {
            std::thread::sleep(self.delay);
            if self.panic {
                panic!("driver crashed");
            }
            Ok(vec![lot(self.fab, &format!("LOT-{}", self.fab))])
        }

        fn select_by_key(&self, _key: &str) -> RepositoryResult<Vec<LotData>> {
            self.select_all()
        }

        fn select_by_fab(&self, _fab: FabId) -> RepositoryResult<Vec<LotData>> {
            self.select_all()
        }

        fn select_by_status(&self, _status: &str) -> RepositoryResult<Vec<LotData>> {
            self.select_all()
        }

        fn select_by_date_range(&self, _range: &DateRange) -> RepositoryResult<Vec<LotData>> {
            self.select_all()
        }

        fn select_matching(&self, _keyword: &str) -> RepositoryResult<Vec<LotData>> {
            self.select_all()
        }

        fn insert(&self, _record: &LotData) -> RepositoryResult<()> {
            Err(RepositoryError::InternalError("read only".to_string()))
        }

        fn update(&self, _record: &LotData) -> RepositoryResult<()> {
            Err(RepositoryError::InternalError("read only".to_string()))
        }
    }

    fn source(fab: FabId, delay_ms: u64, panic: bool) -> SharedAdapter<LotData> {
        Arc::new(StaticSource {
            fab,
            delay: Duration::from_millis(delay_ms),
            panic,
        })
    }

    fn select_all_op() -> FabOp<LotData> {
        Arc::new(|adapter: &dyn FabSourceAdapter<LotData>| adapter.select_all())
    }

    #[tokio::test]
    async fn test_run_all_keeps_slot_order() {
        let executor = FanOutExecutor::new(Duration::from_secs(2));
        let adapters = vec![
            source(FabId::M14, 60, false),
            source(FabId::M15, 0, false),
            source(FabId::M16, 20, false),
        ];

        let slots = executor.run_all(adapters, select_all_op(), "test").await;
        let fabs: Vec<FabId> = slots.iter().map(|s| s.fab).collect();
        assert_eq!(fabs, FabId::ALL.to_vec());
        assert!(slots.iter().all(FabSlot::is_settled));
    }

    #[tokio::test]
    async fn test_run_all_isolates_failure_panic_and_timeout() {
        let executor = FanOutExecutor::new(Duration::from_millis(100));
        let adapters: Vec<SharedAdapter<LotData>> = vec![
            Arc::new(UnavailableSource::new(FabId::M14, "offline")),
            source(FabId::M15, 0, true),
            source(FabId::M16, 500, false),
        ];

        let slots = executor.run_all(adapters, select_all_op(), "test").await;
        assert!(matches!(slots[0].outcome, SlotOutcome::Failed(_)));
        assert!(matches!(slots[1].outcome, SlotOutcome::Failed(_)));
        assert_eq!(slots[2].outcome, SlotOutcome::TimedOut);
        assert!(slots[2].failure().unwrap().contains("M16"));
    }

    #[test]
    fn test_run_single_catches_panic() {
        let executor = FanOutExecutor::new(Duration::from_secs(1));
        let crashing = StaticSource {
            fab: FabId::M15,
            delay: Duration::ZERO,
            panic: true,
        };

        let slot = executor.run_single(&crashing, &select_all_op(), "test");
        assert_eq!(slot.fab, FabId::M15);
        assert!(!slot.is_settled());
    }
}
