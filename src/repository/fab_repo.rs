// ==========================================
// 多厂区 MES 聚合系统 - 厂区 SQLite 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入（表名/列名只来自常量）
// ==========================================

use crate::db::open_existing_sqlite_connection;
use crate::domain::query::{DateRange, QueryFilter};
use crate::domain::record::FabRecord;
use crate::domain::types::FabId;
use crate::repository::adapter::FabSourceAdapter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, Params, Row};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// RecordTable - 实体 ↔ 表 映射
// ==========================================
/// 每类记录对应一张表，列顺序由 COLUMNS 决定
///
/// `COLUMNS[0]` 必须是 `id`；`from_row` / `to_params` 与 COLUMNS 顺序一致
pub trait RecordTable: FabRecord {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// 业务主键列
    const KEY_COLUMN: &'static str;
    /// 关键字模糊查询列
    const SEARCH_COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn to_params(&self) -> Vec<&dyn ToSql>;

    /// 实体专属条件下推：选出 filter 中第一个可下推的条件，无则 None
    fn pushdown_conditions(
        _repo: &SqliteFabRepository<Self>,
        _filter: &QueryFilter,
    ) -> Option<RepositoryResult<Vec<Self>>> {
        None
    }

    /// 非终态条件下推，无则 None（读取全表后由调用方过滤）
    fn pushdown_active(_repo: &SqliteFabRepository<Self>) -> Option<RepositoryResult<Vec<Self>>> {
        None
    }
}

/// 转义 LIKE 通配符，返回 `%keyword%`
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// ==========================================
// SqliteFabRepository - 单厂区单实体仓储
// ==========================================
pub struct SqliteFabRepository<T> {
    fab: FabId,
    conn: Arc<Mutex<Connection>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: RecordTable> SqliteFabRepository<T> {
    /// 打开已有厂区库
    ///
    /// 库不可打开时返回 SourceUnavailable
    pub fn open(fab: FabId, db_path: &str) -> RepositoryResult<Self> {
        let conn = open_existing_sqlite_connection(db_path).map_err(|e| {
            RepositoryError::SourceUnavailable {
                fab,
                reason: e.to_string(),
            }
        })?;
        Ok(Self::from_connection(fab, Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建仓储实例（同一厂区的三类仓储共享连接）
    pub fn from_connection(fab: FabId, conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            fab,
            conn,
            _record: PhantomData,
        }
    }

    /// 获取数据库连接
    pub(crate) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("{}: {}", self.fab, e)))
    }

    pub(crate) fn select_sql(where_clause: Option<&str>) -> String {
        let columns = T::COLUMNS.join(", ");
        match where_clause {
            Some(clause) => format!(
                "SELECT {} FROM {} WHERE {} ORDER BY created_at DESC",
                columns,
                T::TABLE,
                clause
            ),
            None => format!("SELECT {} FROM {} ORDER BY created_at DESC", columns, T::TABLE),
        }
    }

    pub(crate) fn query_rows<P: Params>(&self, sql: &str, params: P) -> RepositoryResult<Vec<T>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| T::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl<T: RecordTable> FabSourceAdapter<T> for SqliteFabRepository<T> {
    fn fab(&self) -> FabId {
        self.fab
    }

    fn select_all(&self) -> RepositoryResult<Vec<T>> {
        self.query_rows(&Self::select_sql(None), [])
    }

    fn select_by_key(&self, key: &str) -> RepositoryResult<Vec<T>> {
        let clause = format!("{} = ?1", T::KEY_COLUMN);
        self.query_rows(&Self::select_sql(Some(&clause)), params![key])
    }

    fn select_by_fab(&self, fab: FabId) -> RepositoryResult<Vec<T>> {
        self.query_rows(&Self::select_sql(Some("fab = ?1")), params![fab])
    }

    fn select_by_status(&self, status: &str) -> RepositoryResult<Vec<T>> {
        self.query_rows(&Self::select_sql(Some("status = ?1")), params![status])
    }

    fn select_by_date_range(&self, range: &DateRange) -> RepositoryResult<Vec<T>> {
        if range.start.is_none() && range.end.is_none() {
            return self.select_all();
        }
        self.query_rows(
            &Self::select_sql(Some(
                "created_at IS NOT NULL \
                 AND (?1 IS NULL OR created_at >= ?1) \
                 AND (?2 IS NULL OR created_at <= ?2)",
            )),
            params![range.start, range.end],
        )
    }

    fn select_matching(&self, keyword: &str) -> RepositoryResult<Vec<T>> {
        let clause = T::SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{} LIKE ?1 ESCAPE '\\'", col))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.query_rows(&Self::select_sql(Some(&clause)), params![like_pattern(keyword)])
    }

    fn select_active(&self) -> RepositoryResult<Vec<T>> {
        match T::pushdown_active(self) {
            Some(rows) => rows,
            None => Ok(self
                .select_all()?
                .into_iter()
                .filter(|r| r.is_active())
                .collect()),
        }
    }

    fn select_by_conditions(&self, filter: &QueryFilter) -> Option<RepositoryResult<Vec<T>>> {
        T::pushdown_conditions(self, filter)
    }

    fn insert(&self, record: &T) -> RepositoryResult<()> {
        if record.fab() != self.fab {
            return Err(RepositoryError::ValidationError(format!(
                "记录厂区 {} 与数据源厂区 {} 不一致",
                record.fab(),
                self.fab
            )));
        }
        let placeholders = (1..=T::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders
        );
        let values = record.to_params();
        let conn = self.get_conn()?;
        conn.execute(&sql, values.as_slice())?;
        Ok(())
    }

    fn update(&self, record: &T) -> RepositoryResult<()> {
        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?1", T::TABLE, assignments);
        let values = record.to_params();
        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, values.as_slice())?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: T::KIND.to_string(),
                id: record.id().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("RET-00"), "%RET-00%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }
}
