// ==========================================
// 多厂区 MES 聚合系统 - 批次数据仓储
// ==========================================

use crate::domain::lot::LotData;
use crate::domain::query::{NumericRange, QueryFilter};
use crate::domain::types::lot_status;
use crate::repository::error::RepositoryResult;
use crate::repository::fab_repo::{RecordTable, SqliteFabRepository};
use rusqlite::types::ToSql;
use rusqlite::{params, Row};

/// 批次仓储（每厂区一个实例）
pub type LotRepository = SqliteFabRepository<LotData>;

impl RecordTable for LotData {
    const TABLE: &'static str = "lot_data";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "lot_number",
        "product",
        "fab",
        "status",
        "start_time",
        "end_time",
        "step",
        "equipment",
        "progress",
        "estimated_completion",
        "duration",
        "result",
        "created_at",
        "updated_at",
    ];
    const KEY_COLUMN: &'static str = "lot_number";
    const SEARCH_COLUMNS: &'static [&'static str] = &["lot_number", "product"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(LotData {
            id: row.get(0)?,
            lot_number: row.get(1)?,
            product: row.get(2)?,
            fab: row.get(3)?,
            status: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            step: row.get(7)?,
            equipment: row.get(8)?,
            progress: row.get(9)?,
            estimated_completion: row.get(10)?,
            duration: row.get(11)?,
            result: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        params![
            self.id,
            self.lot_number,
            self.product,
            self.fab,
            self.status,
            self.start_time,
            self.end_time,
            self.step,
            self.equipment,
            self.progress,
            self.estimated_completion,
            self.duration,
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
        if let Some(range) = &filter.progress {
            return Some(repo.select_by_progress_range(range));
        }
        filter.product().map(|product| repo.select_by_product(product))
    }

    fn pushdown_active(repo: &SqliteFabRepository<Self>) -> Option<RepositoryResult<Vec<Self>>> {
        Some(repo.select_in_process())
    }
}

impl SqliteFabRepository<LotData> {
    /// 按进度区间查询（闭区间，边界可缺省）
    pub fn select_by_progress_range(&self, range: &NumericRange) -> RepositoryResult<Vec<LotData>> {
        self.query_rows(
            &Self::select_sql(Some(
                "progress IS NOT NULL \
                 AND (?1 IS NULL OR progress >= ?1) \
                 AND (?2 IS NULL OR progress <= ?2)",
            )),
            params![range.min, range.max],
        )
    }

    /// 按产品精确查询
    pub fn select_by_product(&self, product: &str) -> RepositoryResult<Vec<LotData>> {
        self.query_rows(&Self::select_sql(Some("product = ?1")), params![product])
    }

    /// 在制 / 等待中的批次
    pub fn select_in_process(&self) -> RepositoryResult<Vec<LotData>> {
        self.query_rows(
            &Self::select_sql(Some("status IN (?1, ?2)")),
            params![lot_status::IN_PROGRESS, lot_status::WAITING],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::DateRange;
    use crate::domain::types::FabId;
    use crate::repository::adapter::FabSourceAdapter;
    use chrono::{NaiveDate, NaiveDateTime};
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn setup_repo(fab: FabId) -> LotRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_fab_schema(&conn).unwrap();
        LotRepository::from_connection(fab, Arc::new(Mutex::new(conn)))
    }

    fn make_lot(id: &str, lot_number: &str, status: &str, progress: i32, created: NaiveDateTime) -> LotData {
        LotData {
            id: id.to_string(),
            lot_number: lot_number.to_string(),
            product: Some("Product A".to_string()),
            fab: FabId::M14,
            status: Some(status.to_string()),
            start_time: Some(created),
            end_time: None,
            step: Some("Step 1".to_string()),
            equipment: Some("EQP-001".to_string()),
            progress: Some(progress),
            estimated_completion: None,
            duration: None,
            result: Some("normal".to_string()),
            created_at: Some(created),
            updated_at: Some(created),
        }
    }

    #[test]
    fn test_insert_and_select_round() {
        let repo = setup_repo(FabId::M14);
        repo.insert(&make_lot("1", "LOT001", "completed", 100, ts(1, 8))).unwrap();
        repo.insert(&make_lot("2", "LOT002", "in_progress", 40, ts(2, 8))).unwrap();

        let all = repo.select_all().unwrap();
        assert_eq!(all.len(), 2);
        // 库内按 created_at 倒序
        assert_eq!(all[0].lot_number, "LOT002");

        let by_key = repo.select_by_key("LOT001").unwrap();
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key[0].progress, Some(100));
        assert_eq!(by_key[0].created_at, Some(ts(1, 8)));

        assert_eq!(repo.select_by_fab(FabId::M14).unwrap().len(), 2);
        assert!(repo.select_by_fab(FabId::M15).unwrap().is_empty());
        assert_eq!(repo.select_by_status("in_progress").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_rejects_foreign_fab() {
        let repo = setup_repo(FabId::M15);
        let err = repo
            .insert(&make_lot("1", "LOT001", "completed", 100, ts(1, 8)))
            .unwrap_err();
        assert!(err.to_string().contains("M14"));
    }

    #[test]
    fn test_select_matching_is_case_insensitive_substring() {
        let repo = setup_repo(FabId::M14);
        repo.insert(&make_lot("1", "LOT001", "completed", 100, ts(1, 8))).unwrap();
        repo.insert(&make_lot("2", "LOT102", "waiting", 0, ts(2, 8))).unwrap();

        assert_eq!(repo.select_matching("lot0").unwrap().len(), 1);
        assert_eq!(repo.select_matching("product a").unwrap().len(), 2);
        assert!(repo.select_matching("LOT_").unwrap().is_empty());
    }

    #[test]
    fn test_range_selects() {
        let repo = setup_repo(FabId::M14);
        repo.insert(&make_lot("1", "LOT001", "completed", 100, ts(1, 8))).unwrap();
        repo.insert(&make_lot("2", "LOT002", "in_progress", 45, ts(3, 8))).unwrap();
        repo.insert(&make_lot("3", "LOT003", "waiting", 12, ts(5, 8))).unwrap();

        let progress = NumericRange::new(Some(10.0), Some(50.0));
        assert_eq!(repo.select_by_progress_range(&progress).unwrap().len(), 2);
        let at_least = NumericRange::new(Some(45.0), None);
        assert_eq!(repo.select_by_progress_range(&at_least).unwrap().len(), 2);

        let range = DateRange::new(Some(ts(2, 0)), Some(ts(5, 8)));
        let hits = repo.select_by_date_range(&range).unwrap();
        assert_eq!(hits.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["3", "2"]);

        assert_eq!(repo.select_by_product("Product A").unwrap().len(), 3);
    }

    #[test]
    fn test_condition_and_active_pushdown() {
        let repo = setup_repo(FabId::M14);
        repo.insert(&make_lot("1", "LOT001", "completed", 100, ts(1, 8))).unwrap();
        repo.insert(&make_lot("2", "LOT002", "in_progress", 45, ts(3, 8))).unwrap();
        repo.insert(&make_lot("3", "LOT003", "waiting", 12, ts(5, 8))).unwrap();

        let active = repo.select_active().unwrap();
        assert_eq!(active.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["3", "2"]);

        let filter = QueryFilter::default().with_progress(NumericRange::new(Some(90.0), None));
        let hits = repo.select_by_conditions(&filter).unwrap().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lot_number, "LOT001");

        let by_product = QueryFilter::default().with_product("Product Z");
        assert!(repo.select_by_conditions(&by_product).unwrap().unwrap().is_empty());

        // 无批次条件时不下推
        assert!(repo.select_by_conditions(&QueryFilter::default().with_severity("High")).is_none());
    }

    #[test]
    fn test_update_persists_by_id() {
        let repo = setup_repo(FabId::M14);
        let mut lot = make_lot("1", "LOT001", "waiting", 0, ts(1, 8));
        repo.insert(&lot).unwrap();

        lot.status = Some("in_progress".to_string());
        lot.updated_at = Some(ts(1, 9));
        repo.update(&lot).unwrap();

        let stored = repo.select_by_key("LOT001").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status.as_deref(), Some("in_progress"));
        assert_eq!(stored[0].updated_at, Some(ts(1, 9)));

        lot.id = "404".to_string();
        assert!(repo.update(&lot).is_err());
    }
}
