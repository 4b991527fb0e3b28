// ==========================================
// 多厂区 MES 聚合系统 - 兜底数据生成
// ==========================================
// 职责: 所有路由厂区均不可达时提供确定性的演示数据
// 约束: 无外部 I/O，时间基于固定锚点（同一锚点输出恒定）
// ==========================================

use crate::domain::types::FabId;
use crate::domain::{EquipmentData, LotData, ReturnHistory};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 兜底数据生成器
pub trait FallbackGenerator<T>: Send + Sync {
    fn generate(&self) -> Vec<T>;
}

/// 内置演示数据集（批次 / 设备 / 返工）
#[derive(Debug, Clone, Copy)]
pub struct DemoFallback {
    anchor: NaiveDateTime,
}

impl Default for DemoFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoFallback {
    pub fn new() -> Self {
        Self::with_anchor(default_anchor())
    }

    pub fn with_anchor(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }

    fn hours_ago(&self, hours: i64) -> NaiveDateTime {
        self.anchor - Duration::hours(hours)
    }

    fn hours_ahead(&self, hours: i64) -> NaiveDateTime {
        self.anchor + Duration::hours(hours)
    }

    fn days_ago(&self, days: i64) -> NaiveDateTime {
        self.anchor - Duration::days(days)
    }
}

fn default_anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 15)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

// ==========================================
// 批次演示数据
// ==========================================
impl FallbackGenerator<LotData> for DemoFallback {
    fn generate(&self) -> Vec<LotData> {
        let lot = |id: &str,
                   lot_number: &str,
                   product: &str,
                   fab: FabId,
                   status: &str,
                   start_h: i64,
                   end: Option<NaiveDateTime>,
                   step: &str,
                   equipment: &str,
                   progress: i32,
                   eta: Option<NaiveDateTime>,
                   duration: &str,
                   result: &str| LotData {
            id: id.to_string(),
            lot_number: lot_number.to_string(),
            product: text(product),
            fab,
            status: text(status),
            start_time: Some(self.hours_ago(start_h)),
            end_time: end,
            step: text(step),
            equipment: text(equipment),
            progress: Some(progress),
            estimated_completion: eta,
            duration: text(duration),
            result: text(result),
            created_at: Some(self.days_ago(1)),
            updated_at: Some(self.anchor),
        };

        vec![
            lot(
                "1", "LOT001", "Product A", FabId::M14, "completed", 8,
                Some(self.hours_ago(2)), "Step 5", "EQP-001", 100, None, "6시간", "normal",
            ),
            lot(
                "2", "LOT002", "Product B", FabId::M15, "in_progress", 4,
                None, "Step 3", "EQP-002", 45, Some(self.hours_ahead(4)), "진행중", "delayed",
            ),
            lot(
                "3", "LOT003", "Product C", FabId::M16, "waiting", 2,
                None, "Step 1", "EQP-003", 12, Some(self.hours_ahead(6)), "대기중", "normal",
            ),
        ]
    }
}

// ==========================================
// 设备演示数据
// ==========================================
impl FallbackGenerator<EquipmentData> for DemoFallback {
    fn generate(&self) -> Vec<EquipmentData> {
        let base = |id: &str, equipment_id: &str, name: &str, fab: FabId, status: &str| EquipmentData {
            id: id.to_string(),
            equipment_id: equipment_id.to_string(),
            equipment_name: text(name),
            fab,
            status: text(status),
            current_operation: None,
            current_lot: None,
            utilization: None,
            last_maintenance: None,
            next_maintenance: None,
            temperature: None,
            pressure: None,
            uptime: None,
            alerts: None,
            operation: None,
            start_time: None,
            end_time: None,
            duration: None,
            lot_number: None,
            result: None,
            created_at: Some(self.days_ago(1)),
            updated_at: Some(self.anchor),
        };

        vec![
            EquipmentData {
                current_operation: text("Exposure"),
                current_lot: text("LOT001"),
                utilization: Some(85),
                last_maintenance: Some(self.days_ago(7)),
                next_maintenance: Some(self.anchor + Duration::days(3)),
                temperature: Some(23.5),
                pressure: Some(1.2),
                uptime: text("168시간"),
                alerts: Some(0),
                operation: text("Exposure"),
                start_time: Some(self.hours_ago(3)),
                end_time: Some(self.hours_ago(1)),
                duration: text("2시간"),
                lot_number: text("LOT001"),
                result: text("normal"),
                ..base("1", "LITHO-001", "Lithography Scanner A", FabId::M14, "running")
            },
            EquipmentData {
                current_operation: text("Maintenance"),
                utilization: Some(45),
                last_maintenance: Some(self.days_ago(12)),
                next_maintenance: Some(self.days_ago(4)),
                temperature: Some(25.8),
                pressure: Some(0.9),
                uptime: text("72시간"),
                alerts: Some(3),
                operation: text("Dry Etch"),
                start_time: Some(self.hours_ago(6)),
                end_time: Some(self.hours_ago(2)),
                duration: text("4시간"),
                lot_number: text("LOT002"),
                result: text("delayed"),
                ..base("2", "ETCH-002", "Etching System B", FabId::M15, "error")
            },
            EquipmentData {
                current_operation: text("Scheduled PM"),
                utilization: Some(0),
                last_maintenance: Some(self.anchor),
                next_maintenance: Some(self.anchor + Duration::days(7)),
                temperature: Some(22.1),
                pressure: Some(1.0),
                uptime: text("0시간"),
                alerts: Some(0),
                operation: text("CVD"),
                start_time: Some(self.hours_ago(2)),
                duration: text("진행중"),
                lot_number: text("LOT003"),
                result: text("error"),
                ..base("3", "DEP-003", "Deposition Chamber C", FabId::M16, "maintenance")
            },
            EquipmentData {
                utilization: Some(65),
                last_maintenance: Some(self.days_ago(4)),
                next_maintenance: Some(self.anchor + Duration::days(4)),
                temperature: Some(24.2),
                pressure: Some(1.1),
                uptime: text("120시간"),
                alerts: Some(1),
                operation: text("Chemical Polishing"),
                start_time: Some(self.hours_ago(1)),
                end_time: Some(self.anchor),
                duration: text("1시간"),
                lot_number: text("LOT004"),
                result: text("normal"),
                ..base("4", "CMP-001", "CMP Polisher A", FabId::M14, "idle")
            },
        ]
    }
}

// ==========================================
// 返工演示数据
// ==========================================
impl FallbackGenerator<ReturnHistory> for DemoFallback {
    fn generate(&self) -> Vec<ReturnHistory> {
        let ret = |id: &str,
                   return_id: &str,
                   lot_number: &str,
                   product: &str,
                   fab: FabId,
                   reason: &str,
                   step: &str,
                   return_h: i64,
                   by: &str,
                   target: &str,
                   status: &str,
                   severity: &str,
                   resolved_h: Option<i64>,
                   comments: &str,
                   created_days: i64| ReturnHistory {
            id: id.to_string(),
            return_id: return_id.to_string(),
            lot_number: lot_number.to_string(),
            product: text(product),
            fab,
            return_reason: text(reason),
            return_step: text(step),
            return_date: Some(self.hours_ago(return_h)),
            return_by: text(by),
            target_step: text(target),
            status: text(status),
            severity: text(severity),
            resolved_date: resolved_h.map(|h| self.hours_ago(h)),
            comments: text(comments),
            created_at: Some(self.days_ago(created_days)),
            updated_at: Some(self.anchor),
        };

        vec![
            ret(
                "1", "RET-001", "LOT001", "Product A", FabId::M14, "품질 불량", "Lithography", 10,
                "김품질", "Clean", "resolved", "High", Some(8), "PR 두께 재조정 후 재처리 완료", 1,
            ),
            ret(
                "2", "RET-002", "LOT002", "Product B", FabId::M15, "설비 오염", "Etching", 13,
                "이공정", "Pre-Clean", "processing", "Medium", None, "챔버 클리닝 후 재진입 예정", 1,
            ),
            ret(
                "3", "RET-003", "LOT003", "Product C", FabId::M16, "측정값 이상", "Measurement", 14,
                "박측정", "CMP", "analyzing", "Low", None, "재측정 결과 대기 중", 1,
            ),
            ret(
                "4", "RET-004", "LOT004", "Product A", FabId::M14, "공정 파라미터 오류", "Deposition", 32,
                "최공정", "Strip", "resolved", "High", Some(16), "레시피 수정 후 재처리 완료", 2,
            ),
        ]
    }
}
