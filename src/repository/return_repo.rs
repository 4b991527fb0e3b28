// ==========================================
// 多厂区 MES 聚合系统 - 返工履历仓储
// ==========================================

use crate::domain::query::{DateRange, QueryFilter};
use crate::domain::return_history::ReturnHistory;
use crate::domain::types::return_status;
use crate::repository::error::RepositoryResult;
use crate::repository::fab_repo::{RecordTable, SqliteFabRepository};
use rusqlite::types::ToSql;
use rusqlite::{params, Row};

/// 返工履历仓储（每厂区一个实例）
pub type ReturnRepository = SqliteFabRepository<ReturnHistory>;

impl RecordTable for ReturnHistory {
    const TABLE: &'static str = "return_history";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "return_id",
        "lot_number",
        "product",
        "fab",
        "return_reason",
        "return_step",
        "return_date",
        "return_by",
        "target_step",
        "status",
        "severity",
        "resolved_date",
        "comments",
        "created_at",
        "updated_at",
    ];
    const KEY_COLUMN: &'static str = "return_id";
    const SEARCH_COLUMNS: &'static [&'static str] = &["return_id", "lot_number", "return_reason"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ReturnHistory {
            id: row.get(0)?,
            return_id: row.get(1)?,
            lot_number: row.get(2)?,
            product: row.get(3)?,
            fab: row.get(4)?,
            return_reason: row.get(5)?,
            return_step: row.get(6)?,
            return_date: row.get(7)?,
            return_by: row.get(8)?,
            target_step: row.get(9)?,
            status: row.get(10)?,
            severity: row.get(11)?,
            resolved_date: row.get(12)?,
            comments: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        params![
            self.id,
            self.return_id,
            self.lot_number,
            self.product,
            self.fab,
            self.return_reason,
            self.return_step,
            self.return_date,
            self.return_by,
            self.target_step,
            self.status,
            self.severity,
            self.resolved_date,
            self.comments,
            self.created_at,
            self.updated_at,
        ]
        .to_vec()
    }

    fn pushdown_conditions(
        repo: &SqliteFabRepository<Self>,
        filter: &QueryFilter,
    ) -> Option<RepositoryResult<Vec<Self>>> {
        if let Some(lot) = filter.lot_number() {
            return Some(repo.select_by_lot_number(lot));
        }
        if let Some(severity) = filter.severity() {
            return Some(repo.select_by_severity(severity));
        }
        filter
            .return_date_range
            .as_ref()
            .map(|range| repo.select_by_return_date_range(range))
    }

    fn pushdown_active(repo: &SqliteFabRepository<Self>) -> Option<RepositoryResult<Vec<Self>>> {
        Some(repo.select_unresolved())
    }
}

impl SqliteFabRepository<ReturnHistory> {
    /// 按批次号精确查询
    pub fn select_by_lot_number(&self, lot_number: &str) -> RepositoryResult<Vec<ReturnHistory>> {
        self.query_rows(&Self::select_sql(Some("lot_number = ?1")), params![lot_number])
    }

    pub fn select_by_severity(&self, severity: &str) -> RepositoryResult<Vec<ReturnHistory>> {
        self.query_rows(&Self::select_sql(Some("severity = ?1")), params![severity])
    }

    /// 未解决的返工（状态为空或非 resolved）
    pub fn select_unresolved(&self) -> RepositoryResult<Vec<ReturnHistory>> {
        self.query_rows(
            &Self::select_sql(Some("status IS NULL OR status <> ?1")),
            params![return_status::RESOLVED],
        )
    }

    /// 按返工日期区间查询（闭区间）
    pub fn select_by_return_date_range(
        &self,
        range: &DateRange,
    ) -> RepositoryResult<Vec<ReturnHistory>> {
        self.query_rows(
            &Self::select_sql(Some(
                "return_date IS NOT NULL \
                 AND (?1 IS NULL OR return_date >= ?1) \
                 AND (?2 IS NULL OR return_date <= ?2)",
            )),
            params![range.start, range.end],
        )
    }
}
