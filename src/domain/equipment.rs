// ==========================================
// 多厂区 MES 聚合系统 - 设备实体
// ==========================================

use crate::domain::query::QueryFilter;
use crate::domain::record::FabRecord;
use crate::domain::types::{EntityKind, FabId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// EquipmentData - 设备履历
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentData {
    pub id: String,
    pub equipment_id: String,
    pub equipment_name: Option<String>,
    pub fab: FabId,
    pub status: Option<String>,
    pub current_operation: Option<String>,
    pub current_lot: Option<String>,
    /// 稼动率百分比
    pub utilization: Option<i32>,
    pub last_maintenance: Option<NaiveDateTime>,
    pub next_maintenance: Option<NaiveDateTime>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub uptime: Option<String>,
    pub alerts: Option<i32>,
    pub operation: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub lot_number: Option<String>,
    pub result: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl FabRecord for EquipmentData {
    const KIND: EntityKind = EntityKind::Equipment;

    fn id(&self) -> &str {
        &self.id
    }

    fn fab(&self) -> FabId {
        self.fab
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn business_key(&self) -> &str {
        &self.equipment_id
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }

    fn updated_at(&self) -> Option<NaiveDateTime> {
        self.updated_at
    }

    fn searchable_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.equipment_id.as_str()];
        if let Some(name) = self.equipment_name.as_deref() {
            fields.push(name);
        }
        fields
    }

    fn matches_conditions(&self, filter: &QueryFilter) -> bool {
        filter
            .utilization
            .map_or(true, |range| range.contains(self.utilization.map(f64::from)))
            && filter
                .temperature
                .map_or(true, |range| range.contains(self.temperature))
            && filter
                .current_lot()
                .map_or(true, |lot| self.current_lot.as_deref() == Some(lot))
    }

    // 设备没有终态（running/idle/error/maintenance 均需展示）
    fn is_active(&self) -> bool {
        true
    }

    fn apply_status(&mut self, status: &str, now: NaiveDateTime) {
        self.status = Some(status.to_string());
        self.updated_at = Some(now);
    }
}
