// ==========================================
// 多厂区 MES 聚合系统 - 应用状态
// ==========================================
// 职责: 打开三个厂区库，组装数据源、聚合服务与 API 实例
// 说明: 某厂区库无法打开时不阻塞启动，该厂区以不可达数据源接入
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{EquipmentApi, LotApi, ReturnApi};
use crate::config::AggregatorConfig;
use crate::db::open_existing_sqlite_connection;
use crate::domain::types::FabId;
use crate::domain::{EquipmentData, LotData, ReturnHistory};
use crate::engine::{
    AggregationService, Clock, DemoFallback, FanOutExecutor, IdGenerator, SharedAdapter,
    SystemClock, UuidIdGenerator,
};
use crate::repository::{RecordTable, SqliteFabRepository, UnavailableSource};

/// 应用状态
///
/// 包含所有API实例和共享的聚合服务
pub struct AppState {
    pub config: AggregatorConfig,

    /// 批次API
    pub lot_api: Arc<LotApi>,

    /// 设备API
    pub equipment_api: Arc<EquipmentApi>,

    /// 返工API
    pub return_api: Arc<ReturnApi>,

    pub lot_service: Arc<AggregationService<LotData>>,
    pub equipment_service: Arc<AggregationService<EquipmentData>>,
    pub return_service: Arc<AggregationService<ReturnHistory>>,

    /// 启动时无法打开的厂区
    pub unavailable_fabs: Vec<FabId>,
}

impl AppState {
    /// 创建新的AppState实例（UUID 生成器 + 系统时钟）
    pub fn new(config: AggregatorConfig) -> Self {
        Self::with_identity(config, Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    /// 创建AppState并注入 id 生成器与时钟
    ///
    /// # 说明
    /// 1. 按配置打开 M14 / M15 / M16 厂区库（每厂区一个共享连接）
    /// 2. 为每厂区构建批次 / 设备 / 返工数据源
    /// 3. 创建聚合服务与 API 实例
    pub fn with_identity(
        config: AggregatorConfig,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        tracing::info!(
            m14 = %config.m14_db_path,
            m15 = %config.m15_db_path,
            m16 = %config.m16_db_path,
            timeout_ms = config.fanout_timeout_ms,
            fallback_enabled = config.fallback_enabled,
            "初始化AppState"
        );

        let mut lot_adapters: Vec<SharedAdapter<LotData>> = Vec::new();
        let mut equipment_adapters: Vec<SharedAdapter<EquipmentData>> = Vec::new();
        let mut return_adapters: Vec<SharedAdapter<ReturnHistory>> = Vec::new();
        let mut unavailable_fabs = Vec::new();

        for fab in FabId::ALL {
            match open_fab_connection(fab, config.db_path(fab)) {
                Ok(conn) => {
                    lot_adapters.push(sqlite_adapter(fab, conn.clone()));
                    equipment_adapters.push(sqlite_adapter(fab, conn.clone()));
                    return_adapters.push(sqlite_adapter(fab, conn));
                }
                Err(reason) => {
                    tracing::warn!(fab = %fab, reason = %reason, "厂区库无法打开，按不可达数据源接入");
                    lot_adapters.push(Arc::new(UnavailableSource::new(fab, reason.clone())));
                    equipment_adapters.push(Arc::new(UnavailableSource::new(fab, reason.clone())));
                    return_adapters.push(Arc::new(UnavailableSource::new(fab, reason)));
                    unavailable_fabs.push(fab);
                }
            }
        }

        let executor = FanOutExecutor::new(config.fanout_timeout());
        let fallback = Arc::new(DemoFallback::new());

        let lot_service = Arc::new(
            AggregationService::new(lot_adapters, executor.clone(), fallback.clone())
                .with_fallback_enabled(config.fallback_enabled)
                .with_id_generator(ids.clone())
                .with_clock(clock.clone()),
        );
        let equipment_service = Arc::new(
            AggregationService::new(equipment_adapters, executor.clone(), fallback.clone())
                .with_fallback_enabled(config.fallback_enabled)
                .with_id_generator(ids.clone())
                .with_clock(clock.clone()),
        );
        let return_service = Arc::new(
            AggregationService::new(return_adapters, executor, fallback)
                .with_fallback_enabled(config.fallback_enabled)
                .with_id_generator(ids)
                .with_clock(clock),
        );

        let lot_api = Arc::new(LotApi::new(lot_service.clone()));
        let equipment_api = Arc::new(EquipmentApi::new(equipment_service.clone()));
        let return_api = Arc::new(ReturnApi::new(return_service.clone()));

        tracing::info!(unavailable = ?unavailable_fabs, "AppState初始化完成");

        Self {
            config,
            lot_api,
            equipment_api,
            return_api,
            lot_service,
            equipment_service,
            return_service,
            unavailable_fabs,
        }
    }
}

/// 打开厂区库（不存在时不创建）
fn open_fab_connection(fab: FabId, db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
    let conn = open_existing_sqlite_connection(db_path)
        .map_err(|e| format!("无法打开{}厂区库 {}: {}", fab, db_path, e))?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 单厂区单实体的 SQLite 数据源
pub fn sqlite_adapter<T: RecordTable>(fab: FabId, conn: Arc<Mutex<Connection>>) -> SharedAdapter<T> {
    Arc::new(SqliteFabRepository::<T>::from_connection(fab, conn))
}
