// ==========================================
// 多厂区 MES 聚合系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有厂区库的 PRAGMA 与 busy_timeout
// - 区分“建库”与“打开已有库”：聚合层只打开已有库，
//   库文件缺失时视为该厂区数据源不可用，而不是静默建空库
// ==========================================

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开（必要时创建）SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 只打开已存在的库文件（不创建）
pub fn open_existing_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let mut conn = Connection::open_with_flags(db_path, flags)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 初始化厂区库表结构（幂等）
///
/// 三个厂区库结构相同：lot_data / equipment_data / return_history
pub fn init_fab_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS lot_data (
            id TEXT PRIMARY KEY,
            lot_number TEXT NOT NULL,
            product TEXT,
            fab TEXT NOT NULL,
            status TEXT,
            start_time TEXT,
            end_time TEXT,
            step TEXT,
            equipment TEXT,
            progress INTEGER,
            estimated_completion TEXT,
            duration TEXT,
            result TEXT,
            created_at TEXT,
            updated_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_lot_data_lot_number ON lot_data(lot_number);
        CREATE INDEX IF NOT EXISTS idx_lot_data_created_at ON lot_data(created_at);

        CREATE TABLE IF NOT EXISTS equipment_data (
            id TEXT PRIMARY KEY,
            equipment_id TEXT NOT NULL,
            equipment_name TEXT,
            fab TEXT NOT NULL,
            status TEXT,
            current_operation TEXT,
            current_lot TEXT,
            utilization INTEGER,
            last_maintenance TEXT,
            next_maintenance TEXT,
            temperature REAL,
            pressure REAL,
            uptime TEXT,
            alerts INTEGER,
            operation TEXT,
            start_time TEXT,
            end_time TEXT,
            duration TEXT,
            lot_number TEXT,
            result TEXT,
            created_at TEXT,
            updated_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_equipment_data_equipment_id ON equipment_data(equipment_id);

        CREATE TABLE IF NOT EXISTS return_history (
            id TEXT PRIMARY KEY,
            return_id TEXT NOT NULL,
            lot_number TEXT NOT NULL,
            product TEXT,
            fab TEXT NOT NULL,
            return_reason TEXT,
            return_step TEXT,
            return_date TEXT,
            return_by TEXT,
            target_step TEXT,
            status TEXT,
            severity TEXT,
            resolved_date TEXT,
            comments TEXT,
            created_at TEXT,
            updated_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_return_history_return_id ON return_history(return_id);
        CREATE INDEX IF NOT EXISTS idx_return_history_lot_number ON return_history(lot_number);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
