// ==========================================
// 多厂区 MES 聚合系统 - 聚合服务
// ==========================================
// 职责: 路由 → 扇出 → 合并 → （必要时）兜底，一个实现覆盖三类实体
// 读路径: 永不向调用方返回错误
// - 路由未命中: 空结果 + warn
// - 单厂区失败: 该厂区贡献空列表 + warn
// - 所有路由厂区均失败: 兜底数据 + error（可配置为空结果）
// 写路径: 新建返工 / 状态更新，错误向上传递
// ==========================================

use crate::domain::query::{AggregationResult, CallerContext, QueryFilter};
use crate::domain::record::FabRecord;
use crate::domain::types::FabId;
use crate::engine::error::{AggregationError, AggregationOutcome};
use crate::engine::executor::{FabOp, FabSlot, FanOutExecutor, SharedAdapter, SlotOutcome};
use crate::engine::fallback::FallbackGenerator;
use crate::engine::identity::{Clock, Creatable, IdGenerator, SystemClock, UuidIdGenerator};
use crate::engine::merger::{RecordMatcher, ResultMerger};
use crate::engine::router::{QueryRouter, Route};
use crate::perf::PerfGuard;
use crate::repository::adapter::FabSourceAdapter;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// 额外的记录谓词（活动状态 / 精确业务主键等）
type RecordPredicate<'a, T> = &'a (dyn Fn(&T) -> bool + Sync);

// ==========================================
// RecordAggregator Trait - 聚合读写接口
// ==========================================
#[async_trait]
pub trait RecordAggregator<T: FabRecord>: Send + Sync {
    /// 全量履历（按 fab 路由）
    async fn get_history(&self, fab: Option<&str>, ctx: &CallerContext) -> AggregationResult<T>;

    /// 非终态记录
    async fn get_active_status(&self, fab: Option<&str>, ctx: &CallerContext) -> AggregationResult<T>;

    async fn search(&self, filter: &QueryFilter, ctx: &CallerContext) -> AggregationResult<T>;

    /// 按业务主键查询单条（多厂区命中时取最新）
    async fn get_details(&self, key: &str, fab: Option<&str>, ctx: &CallerContext) -> Option<T>;

    /// 按业务主键定位记录，更新状态并写回所属厂区
    ///
    /// # 参数
    /// - `key`: 批次号 / 设备ID / 返工编号
    /// - `fab`: 可选厂区提示
    async fn update_status(
        &self,
        key: &str,
        status: &str,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> AggregationOutcome<T>;
}

/// 支持新建的记录聚合（目前仅返工）
#[async_trait]
pub trait RecordCreator<T: FabRecord>: Send + Sync {
    /// 生成 id / 业务编号 / 时间戳后写入记录所属厂区
    async fn create(&self, record: T, ctx: &CallerContext) -> AggregationOutcome<T>;
}

// ==========================================
// AggregationService
// ==========================================
pub struct AggregationService<T: FabRecord> {
    adapters: BTreeMap<FabId, SharedAdapter<T>>,
    executor: FanOutExecutor,
    fallback: Arc<dyn FallbackGenerator<T>>,
    fallback_enabled: bool,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<T: FabRecord> AggregationService<T> {
    /// 创建聚合服务
    ///
    /// # 参数
    /// - `adapters`: 各厂区数据源（同一厂区重复时后者覆盖前者）
    /// - `executor`: 扇出执行器
    /// - `fallback`: 兜底数据生成器
    pub fn new(
        adapters: Vec<SharedAdapter<T>>,
        executor: FanOutExecutor,
        fallback: Arc<dyn FallbackGenerator<T>>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.fab(), adapter))
            .collect();

        Self {
            adapters,
            executor,
            fallback,
            fallback_enabled: true,
            ids: Arc::new(UuidIdGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ==========================================
    // 内部: 扇出调度
    // ==========================================

    async fn dispatch(&self, route: &Route, op: FabOp<T>, operation: &'static str) -> Vec<FabSlot<T>> {
        match route {
            Route::Miss(_) => Vec::new(),
            Route::Single(fab) => match self.adapters.get(fab) {
                Some(adapter) => vec![self.executor.run_single(adapter.as_ref(), &op, operation)],
                None => vec![missing_adapter(*fab)],
            },
            Route::Fabs(fabs) => {
                let mut slots = Vec::with_capacity(fabs.len());
                let mut adapters = Vec::with_capacity(fabs.len());
                for fab in fabs {
                    match self.adapters.get(fab) {
                        Some(adapter) => adapters.push(Arc::clone(adapter)),
                        None => slots.push(missing_adapter(*fab)),
                    }
                }
                slots.extend(self.executor.run_all(adapters, op, operation).await);
                slots.sort_by_key(|slot| slot.fab);
                slots
            }
        }
    }

    /// 读路径主流程
    async fn aggregate(
        &self,
        operation: &'static str,
        filter: &QueryFilter,
        ctx: &CallerContext,
        build_op: impl FnOnce(&Route) -> FabOp<T> + Send,
        predicate: RecordPredicate<'_, T>,
    ) -> AggregationResult<T> {
        let _perf = PerfGuard::new(operation);
        let started = Instant::now();
        let entity = T::KIND;

        let route = QueryRouter::route(filter.fab(), ctx);
        if let Route::Miss(miss) = &route {
            warn!(entity = %entity, operation, user = %ctx.user, reason = %miss, "路由未命中，返回空结果");
            return AggregationResult::empty();
        }

        debug!(entity = %entity, operation, user = %ctx.user, route = ?route, "开始聚合查询");

        let op = build_op(&route);
        let slots = self.dispatch(&route, op, operation).await;
        let merged = ResultMerger::merge(slots);

        if merged.settled == 0 {
            let cause = AggregationError::NoSourceReachable {
                operation: operation.to_string(),
                fabs: route.fabs(),
                cause: merged.failures.join("; "),
            };
            return self.fall_back(operation, &route, filter, predicate, cause, merged.degraded_fabs, started);
        }

        let matcher = RecordMatcher::new(filter);
        let records: Vec<T> = merged
            .records
            .into_iter()
            .filter(|r| matcher.matches(r) && predicate(r))
            .collect();

        info!(
            entity = %entity,
            operation,
            count = records.len(),
            degraded = merged.degraded_fabs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "聚合查询完成"
        );
        AggregationResult::live(records, merged.degraded_fabs)
    }

    /// 整体兜底（与部分实时结果不混合）
    #[allow(clippy::too_many_arguments)]
    fn fall_back(
        &self,
        operation: &'static str,
        route: &Route,
        filter: &QueryFilter,
        predicate: RecordPredicate<'_, T>,
        cause: AggregationError,
        degraded_fabs: Vec<FabId>,
        started: Instant,
    ) -> AggregationResult<T> {
        let entity = T::KIND;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !self.fallback_enabled {
            error!(entity = %entity, operation, elapsed_ms, error = %cause, "聚合失败，兜底已关闭，返回空结果");
            return AggregationResult::live(Vec::new(), degraded_fabs);
        }

        error!(entity = %entity, operation, elapsed_ms, error = %cause, "聚合失败，返回兜底数据");

        let fabs = route.fabs();
        let matcher = RecordMatcher::new(filter);
        let mut records: Vec<T> = self
            .fallback
            .generate()
            .into_iter()
            .filter(|r| fabs.contains(&r.fab()) && matcher.matches(r) && predicate(r))
            .collect();
        ResultMerger::sort_newest_first(&mut records);

        AggregationResult::fallback(records, degraded_fabs)
    }

    fn writable_adapter(&self, fab: FabId) -> Result<&SharedAdapter<T>, RepositoryError> {
        self.adapters
            .get(&fab)
            .ok_or_else(|| RepositoryError::SourceUnavailable {
                fab,
                reason: "未配置数据源".to_string(),
            })
    }
}

fn missing_adapter<T>(fab: FabId) -> FabSlot<T> {
    warn!(fab = %fab, "厂区未配置数据源");
    FabSlot {
        fab,
        outcome: SlotOutcome::Failed("未配置数据源".to_string()),
    }
}

/// 检索下推: keyword > 实体专属条件 > status > 时间区间 > 单厂区 / 全量
///
/// 下推只缩小读取范围，合并后仍按完整 filter 过滤
fn search_op<T: FabRecord>(filter: &QueryFilter, route: &Route) -> FabOp<T> {
    if let Some(keyword) = filter.keyword() {
        let keyword = keyword.to_string();
        return Arc::new(move |a: &dyn FabSourceAdapter<T>| a.select_matching(&keyword));
    }

    let filter = filter.clone();
    let history = history_op(route);
    Arc::new(move |a: &dyn FabSourceAdapter<T>| {
        if let Some(rows) = a.select_by_conditions(&filter) {
            return rows;
        }
        if let Some(status) = filter.status() {
            return a.select_by_status(status);
        }
        if let Some(range) = &filter.date_range {
            return a.select_by_date_range(range);
        }
        history(a)
    })
}

fn active_op<T: FabRecord>(_route: &Route) -> FabOp<T> {
    Arc::new(|a: &dyn FabSourceAdapter<T>| a.select_active())
}

fn history_op<T: FabRecord>(route: &Route) -> FabOp<T> {
    match route {
        Route::Single(fab) => {
            let fab = *fab;
            Arc::new(move |a: &dyn FabSourceAdapter<T>| a.select_by_fab(fab))
        }
        _ => Arc::new(|a: &dyn FabSourceAdapter<T>| a.select_all()),
    }
}

// ==========================================
// RecordAggregator 实现
// ==========================================
#[async_trait]
impl<T: FabRecord> RecordAggregator<T> for AggregationService<T> {
    async fn get_history(&self, fab: Option<&str>, ctx: &CallerContext) -> AggregationResult<T> {
        let filter = QueryFilter::for_fab(fab);
        self.aggregate("get_history", &filter, ctx, history_op, &|_: &T| true)
            .await
    }

    async fn get_active_status(&self, fab: Option<&str>, ctx: &CallerContext) -> AggregationResult<T> {
        let filter = QueryFilter::for_fab(fab);
        self.aggregate("get_active_status", &filter, ctx, active_op, &|r: &T| r.is_active())
            .await
    }

    async fn search(&self, filter: &QueryFilter, ctx: &CallerContext) -> AggregationResult<T> {
        self.aggregate(
            "search",
            filter,
            ctx,
            |route: &Route| search_op(filter, route),
            &|_: &T| true,
        )
        .await
    }

    async fn get_details(&self, key: &str, fab: Option<&str>, ctx: &CallerContext) -> Option<T> {
        let filter = QueryFilter::for_fab(fab);
        let lookup = key.to_string();
        let build = move |_: &Route| -> FabOp<T> {
            Arc::new(move |a: &dyn FabSourceAdapter<T>| a.select_by_key(&lookup))
        };

        self.aggregate("get_details", &filter, ctx, build, &|r: &T| r.business_key() == key)
            .await
            .into_records()
            .into_iter()
            .next()
    }

    async fn update_status(
        &self,
        key: &str,
        status: &str,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> AggregationOutcome<T> {
        let _perf = PerfGuard::new("update_status");
        let entity = T::KIND;

        let route = QueryRouter::route(fab, ctx);
        if let Route::Miss(miss) = &route {
            warn!(entity = %entity, key, user = %ctx.user, reason = %miss, "状态更新路由未命中");
            return Err(AggregationError::RoutingMiss(miss.to_string()));
        }

        let lookup = key.to_string();
        let op: FabOp<T> = Arc::new(move |a: &dyn FabSourceAdapter<T>| a.select_by_key(&lookup));
        let slots = self.dispatch(&route, op, "update_status").await;

        let mut found: Option<T> = None;
        let mut unreachable = Vec::new();
        let mut failures = Vec::new();
        for slot in slots {
            let fab = slot.fab;
            match slot.outcome {
                SlotOutcome::Settled(rows) => {
                    let mut hits = rows
                        .into_iter()
                        .filter(|r| r.fab() == fab && r.business_key() == key);
                    if let Some(record) = hits.next() {
                        if found.is_none() {
                            found = Some(record);
                        } else {
                            warn!(entity = %entity, key, fab = %fab, "多个厂区存在相同业务主键，按厂区顺序取第一条");
                        }
                    }
                }
                SlotOutcome::Failed(reason) => {
                    failures.push(format!("{}: {}", fab, reason));
                    unreachable.push(fab);
                }
                SlotOutcome::TimedOut => {
                    failures.push(format!("{}: timed out", fab));
                    unreachable.push(fab);
                }
            }
        }

        // 未命中且有厂区不可达时，记录可能位于不可达厂区
        let Some(mut record) = found else {
            if !unreachable.is_empty() {
                warn!(entity = %entity, key, unreachable = ?unreachable, "状态更新未命中，部分厂区不可达");
                return Err(AggregationError::NoSourceReachable {
                    operation: "update_status".to_string(),
                    fabs: unreachable,
                    cause: failures.join("; "),
                });
            }
            return Err(AggregationError::NotFound {
                entity,
                id: key.to_string(),
            });
        };

        let previous = record.status().map(str::to_string);
        record.apply_status(status, self.clock.now());
        self.writable_adapter(record.fab())?.update(&record)?;

        info!(
            entity = %entity,
            key,
            id = record.id(),
            fab = %record.fab(),
            user = %ctx.user,
            from = previous.as_deref().unwrap_or("-"),
            to = status,
            "状态已更新"
        );
        Ok(record)
    }
}

#[async_trait]
impl<T: FabRecord + Creatable> RecordCreator<T> for AggregationService<T> {
    async fn create(&self, mut record: T, ctx: &CallerContext) -> AggregationOutcome<T> {
        let _perf = PerfGuard::new("create");
        let entity = T::KIND;
        let fab = record.fab();

        if !ctx.permits(fab) {
            warn!(entity = %entity, fab = %fab, user = %ctx.user, "无权在该厂区新建记录");
            return Err(AggregationError::NotPermitted(fab));
        }

        record.stamp_new(self.ids.as_ref(), self.clock.now());
        self.writable_adapter(fab)?.insert(&record)?;

        info!(
            entity = %entity,
            fab = %fab,
            id = record.id(),
            key = record.business_key(),
            user = %ctx.user,
            "记录已新建"
        );
        Ok(record)
    }
}

/// 返工聚合（读写 + 新建）
pub trait ReturnAggregator:
    RecordAggregator<crate::domain::ReturnHistory> + RecordCreator<crate::domain::ReturnHistory>
{
}

impl<S> ReturnAggregator for S where
    S: RecordAggregator<crate::domain::ReturnHistory> + RecordCreator<crate::domain::ReturnHistory>
{
}
