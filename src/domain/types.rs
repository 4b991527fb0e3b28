// ==========================================
// 多厂区 MES 聚合系统 - 领域类型定义
// ==========================================
// 职责: 厂区标识、实体种类、数据来源、状态常量
// ==========================================

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 厂区标识 (Fab Id)
// ==========================================
// 每个厂区对应一个独立数据库，同时也是每条记录上的可过滤字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FabId {
    M14,
    M15,
    M16,
}

/// 无法识别的厂区代码
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("未知厂区: {0}")]
pub struct UnknownFab(pub String);

impl FabId {
    /// 全部厂区（固定顺序，合并时按此顺序拼接）
    pub const ALL: [FabId; 3] = [FabId::M14, FabId::M15, FabId::M16];

    pub fn as_str(&self) -> &'static str {
        match self {
            FabId::M14 => "M14",
            FabId::M15 => "M15",
            FabId::M16 => "M16",
        }
    }

    /// 宽松解析：去除首尾空白、忽略大小写
    pub fn parse(raw: &str) -> Option<FabId> {
        match raw.trim().to_uppercase().as_str() {
            "M14" => Some(FabId::M14),
            "M15" => Some(FabId::M15),
            "M16" => Some(FabId::M16),
            _ => None,
        }
    }
}

impl fmt::Display for FabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FabId {
    type Err = UnknownFab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FabId::parse(s).ok_or_else(|| UnknownFab(s.to_string()))
    }
}

impl ToSql for FabId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FabId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        FabId::from_str(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Lot,
    Equipment,
    Return,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Lot => "lot",
            EntityKind::Equipment => "equipment",
            EntityKind::Return => "return",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数据来源 (Provenance)
// ==========================================
// Live: 来自厂区数据库; Fallback: 来自内置演示数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Fallback => write!(f, "fallback"),
        }
    }
}

// ==========================================
// 状态常量
// ==========================================
// 状态字段在数据库中为自由字符串，以下取值驱动业务行为

pub mod lot_status {
    pub const COMPLETED: &str = "completed";
    pub const IN_PROGRESS: &str = "in_progress";
    pub const WAITING: &str = "waiting";
}

pub mod equipment_status {
    pub const RUNNING: &str = "running";
    pub const IDLE: &str = "idle";
    pub const ERROR: &str = "error";
    pub const MAINTENANCE: &str = "maintenance";
}

/// 返工生命周期: analyzing → processing → resolved
pub mod return_status {
    pub const ANALYZING: &str = "analyzing";
    pub const PROCESSING: &str = "processing";
    pub const RESOLVED: &str = "resolved";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fab_parse_is_lenient() {
        assert_eq!(FabId::parse("M14"), Some(FabId::M14));
        assert_eq!(FabId::parse(" m15 "), Some(FabId::M15));
        assert_eq!(FabId::parse("M17"), None);
        assert_eq!(FabId::parse(""), None);
    }

    #[test]
    fn test_fab_from_str_reports_raw_value() {
        let err = "P1".parse::<FabId>().unwrap_err();
        assert_eq!(err, UnknownFab("P1".to_string()));
    }

    #[test]
    fn test_provenance_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provenance::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(serde_json::to_string(&EntityKind::Return).unwrap(), "\"return\"");
    }
}
