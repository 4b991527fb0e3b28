// ==========================================
// 多厂区 MES 聚合系统 - 设备数据仓储
// ==========================================

use crate::domain::equipment::EquipmentData;
use crate::domain::query::{NumericRange, QueryFilter};
use crate::repository::error::RepositoryResult;
use crate::repository::fab_repo::{RecordTable, SqliteFabRepository};
use rusqlite::types::ToSql;
use rusqlite::{params, Row};

/// 设备仓储（每厂区一个实例）
pub type EquipmentRepository = SqliteFabRepository<EquipmentData>;

impl RecordTable for EquipmentData {
    const TABLE: &'static str = "equipment_data";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "equipment_id",
        "equipment_name",
        "fab",
        "status",
        "current_operation",
        "current_lot",
        "utilization",
        "last_maintenance",
        "next_maintenance",
        "temperature",
        "pressure",
        "uptime",
        "alerts",
        "operation",
        "start_time",
        "end_time",
        "duration",
        "lot_number",
        "result",
        "created_at",
        "updated_at",
    ];
    const KEY_COLUMN: &'static str = "equipment_id";
    const SEARCH_COLUMNS: &'static [&'static str] = &["equipment_id", "equipment_name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(EquipmentData {
            id: row.get(0)?,
            equipment_id: row.get(1)?,
            equipment_name: row.get(2)?,
            fab: row.get(3)?,
            status: row.get(4)?,
            current_operation: row.get(5)?,
            current_lot: row.get(6)?,
            utilization: row.get(7)?,
            last_maintenance: row.get(8)?,
            next_maintenance: row.get(9)?,
            temperature: row.get(10)?,
            pressure: row.get(11)?,
            uptime: row.get(12)?,
            alerts: row.get(13)?,
            operation: row.get(14)?,
            start_time: row.get(15)?,
            end_time: row.get(16)?,
            duration: row.get(17)?,
            lot_number: row.get(18)?,
            result: row.get(19)?,
            created_at: row.get(20)?,
            updated_at: row.get(21)?,
        })
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        params![
            self.id,
            self.equipment_id,
            self.equipment_name,
            self.fab,
            self.status,
            self.current_operation,
            self.current_lot,
            self.utilization,
            self.last_maintenance,
            self.next_maintenance,
            self.temperature,
            self.pressure,
            self.uptime,
            self.alerts,
            self.operation,
            self.start_time,
            self.end_time,
            self.duration,
            self.lot_number,
            self.result,
            self.created_at,
            self.updated_at,
        ]
        .to_vec()
    }

    fn pushdown_conditions(
        repo: &SqliteFabRepository<Self>,
        filter: &QueryFilter,
    ) -> Option<RepositoryResult<Vec<Self>>> {
        if let Some(lot) = filter.current_lot() {
            return Some(repo.select_by_current_lot(lot));
        }
        if let Some(range) = &filter.utilization {
            return Some(repo.select_by_utilization_range(range));
        }
        filter
            .temperature
            .as_ref()
            .map(|range| repo.select_by_temperature_range(range))
    }
}

impl SqliteFabRepository<EquipmentData> {
    /// 按稼动率区间查询（闭区间，边界可缺省）
    pub fn select_by_utilization_range(
        &self,
        range: &NumericRange,
    ) -> RepositoryResult<Vec<EquipmentData>> {
        self.query_rows(
            &Self::select_sql(Some(
                "utilization IS NOT NULL \
                 AND (?1 IS NULL OR utilization >= ?1) \
                 AND (?2 IS NULL OR utilization <= ?2)",
            )),
            params![range.min, range.max],
        )
    }

    /// 按腔体温度区间查询
    pub fn select_by_temperature_range(
        &self,
        range: &NumericRange,
    ) -> RepositoryResult<Vec<EquipmentData>> {
        self.query_rows(
            &Self::select_sql(Some(
                "temperature IS NOT NULL \
                 AND (?1 IS NULL OR temperature >= ?1) \
                 AND (?2 IS NULL OR temperature <= ?2)",
            )),
            params![range.min, range.max],
        )
    }

    /// 按当前加工批次查询
    pub fn select_by_current_lot(&self, current_lot: &str) -> RepositoryResult<Vec<EquipmentData>> {
        self.query_rows(&Self::select_sql(Some("current_lot = ?1")), params![current_lot])
    }
}
