// ==========================================
// 多厂区 MES 聚合系统 - 厂区库初始化工具
// ==========================================
// 用法: seed_fab_dbs [输出目录]
// - 指定目录时生成 <dir>/m14.db / m15.db / m16.db
// - 未指定时使用配置中的三个库路径
// 已存在的库会先备份再重建，然后写入样例批次 / 设备 / 返工数据
// ==========================================

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use fab_mes::config::AggregatorConfig;
use fab_mes::db::{init_fab_schema, open_sqlite_connection};
use fab_mes::engine::{DemoFallback, FallbackGenerator};
use fab_mes::repository::{
    EquipmentRepository, FabSourceAdapter, LotRepository, RecordTable, ReturnRepository,
    SqliteFabRepository,
};
use fab_mes::{EquipmentData, FabId, LotData, ReturnHistory};

fn main() -> Result<(), Box<dyn Error>> {
    fab_mes::logging::init();

    let mut config = AggregatorConfig::load()?;
    if let Some(dir) = std::env::args().nth(1) {
        fs::create_dir_all(&dir)?;
        for fab in FabId::ALL {
            let path = Path::new(&dir)
                .join(format!("{}.db", fab.as_str().to_lowercase()))
                .to_string_lossy()
                .to_string();
            match fab {
                FabId::M14 => config.m14_db_path = path,
                FabId::M15 => config.m15_db_path = path,
                FabId::M16 => config.m16_db_path = path,
            }
        }
    }

    // 样例数据以当前时间为锚点
    let demo = DemoFallback::with_anchor(Local::now().naive_local());
    let lots: Vec<LotData> = demo.generate();
    let equipment: Vec<EquipmentData> = demo.generate();
    let returns: Vec<ReturnHistory> = demo.generate();

    for fab in FabId::ALL {
        let db_path = config.db_path(fab);
        if let Some(parent) = Path::new(db_path).parent() {
            fs::create_dir_all(parent)?;
        }
        backup_and_reset_db(db_path)?;

        let conn = open_sqlite_connection(db_path)?;
        init_fab_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let lot_count = seed(LotRepository::from_connection(fab, conn.clone()), &lots)?;
        let equipment_count = seed(EquipmentRepository::from_connection(fab, conn.clone()), &equipment)?;
        let return_count = seed(ReturnRepository::from_connection(fab, conn), &returns)?;

        eprintln!(
            "{} -> {} (lots={}, equipment={}, returns={})",
            fab, db_path, lot_count, equipment_count, return_count
        );
    }

    Ok(())
}

/// 写入属于该厂区的样例记录
fn seed<T: RecordTable>(repo: SqliteFabRepository<T>, records: &[T]) -> Result<usize, Box<dyn Error>> {
    let fab = repo.fab();
    let mut count = 0;
    for record in records.iter().filter(|r| r.fab() == fab) {
        repo.insert(record)?;
        count += 1;
    }
    Ok(count)
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
