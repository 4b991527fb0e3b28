// ==========================================
// 多厂区 MES 聚合系统 - 引擎层（聚合核心）
// ==========================================
// 职责: 路由、并发扇出、结果合并、兜底策略
// 红线: Engine 不拼 SQL，只通过 FabSourceAdapter 访问数据
// ==========================================

pub mod error;
pub mod executor;
pub mod fallback;
pub mod identity;
pub mod merger;
pub mod router;
pub mod service;

// 重导出核心引擎
pub use error::{AggregationError, AggregationOutcome};
pub use executor::{FabOp, FabSlot, FanOutExecutor, SharedAdapter, SlotOutcome};
pub use fallback::{DemoFallback, FallbackGenerator};
pub use identity::{
    Clock, Creatable, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator,
};
pub use merger::{MergeOutcome, RecordMatcher, ResultMerger};
pub use router::{QueryRouter, Route, RouteMiss};
pub use service::{AggregationService, RecordAggregator, RecordCreator, ReturnAggregator};
