// ==========================================
// 多厂区 MES 聚合系统 - 结果合并
// ==========================================
// 职责: 将各厂区槽位合并为一个全局有序序列
// 排序: created_at 倒序，缺失时间戳排在最后，稳定排序
// 去重: 仅在厂区内部按 id 去重，跨厂区同 id 视为两条记录
// ==========================================

use crate::domain::query::QueryFilter;
use crate::domain::record::FabRecord;
use crate::domain::types::FabId;
use crate::engine::executor::{FabSlot, SlotOutcome};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::warn;

// ==========================================
// RecordMatcher - 客户端过滤
// ==========================================
/// 按 QueryFilter 在聚合结果上做客户端匹配
///
/// - keyword: 任一检索字段包含关键字（忽略大小写）
/// - status / severity: 精确相等
/// - date_range: created_at 落在闭区间内
/// - 实体专属条件: 交给 `FabRecord::matches_conditions`
///
/// fab 不在此处匹配，由路由决定
pub struct RecordMatcher<'a> {
    filter: &'a QueryFilter,
    keyword: Option<String>,
}

impl<'a> RecordMatcher<'a> {
    pub fn new(filter: &'a QueryFilter) -> Self {
        Self {
            filter,
            keyword: filter.keyword().map(str::to_lowercase),
        }
    }

    pub fn matches<T: FabRecord>(&self, record: &T) -> bool {
        if let Some(keyword) = &self.keyword {
            let hit = record
                .searchable_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(keyword.as_str()));
            if !hit {
                return false;
            }
        }

        if let Some(status) = self.filter.status() {
            if record.status() != Some(status) {
                return false;
            }
        }

        if let Some(severity) = self.filter.severity() {
            if record.severity() != Some(severity) {
                return false;
            }
        }

        if let Some(range) = &self.filter.date_range {
            if !range.contains(record.created_at()) {
                return false;
            }
        }

        record.matches_conditions(self.filter)
    }
}

// ==========================================
// MergeOutcome
// ==========================================
#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    pub records: Vec<T>,
    /// 失败或超时的厂区
    pub degraded_fabs: Vec<FabId>,
    /// 成功返回的厂区数
    pub settled: usize,
    /// 各失败厂区原因（用于兜底时记录根因）
    pub failures: Vec<String>,
}

// ==========================================
// ResultMerger
// ==========================================
pub struct ResultMerger;

impl ResultMerger {
    /// 合并槽位
    ///
    /// 先按槽位顺序拼接，再稳定排序
    pub fn merge<T: FabRecord>(slots: Vec<FabSlot<T>>) -> MergeOutcome<T> {
        let mut records = Vec::new();
        let mut degraded_fabs = Vec::new();
        let mut failures = Vec::new();
        let mut settled = 0;

        for slot in slots {
            if let Some(reason) = slot.failure() {
                degraded_fabs.push(slot.fab);
                failures.push(reason);
                continue;
            }
            if let SlotOutcome::Settled(rows) = slot.outcome {
                settled += 1;
                records.extend(Self::guard_slot(slot.fab, rows));
            }
        }

        Self::sort_newest_first(&mut records);

        MergeOutcome {
            records,
            degraded_fabs,
            settled,
            failures,
        }
    }

    /// 丢弃厂区不符的记录，并在厂区内按 id 去重（保留首条）
    fn guard_slot<T: FabRecord>(fab: FabId, rows: Vec<T>) -> Vec<T> {
        let mut seen = HashSet::new();
        rows.into_iter()
            .filter(|record| {
                if record.fab() != fab {
                    warn!(
                        fab = %fab,
                        record_fab = %record.fab(),
                        id = record.id(),
                        "记录厂区与数据源厂区不一致，已丢弃"
                    );
                    return false;
                }
                seen.insert(record.id().to_string())
            })
            .collect()
    }

    /// created_at 倒序，缺失排最后（稳定）
    pub fn sort_newest_first<T: FabRecord>(records: &mut [T]) {
        records.sort_by(|a, b| newest_first(a, b));
    }
}

fn newest_first<T: FabRecord>(a: &T, b: &T) -> Ordering {
    match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::DateRange;
    use crate::domain::ReturnHistory;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn ret(id: &str, fab: FabId, status: &str, created: Option<NaiveDateTime>) -> ReturnHistory {
        ReturnHistory {
            id: id.to_string(),
            return_id: format!("RET-{}", id),
            lot_number: "LOT001".to_string(),
            product: None,
            fab,
            return_reason: Some("Particle".to_string()),
            return_step: None,
            return_date: created,
            return_by: None,
            target_step: None,
            status: Some(status.to_string()),
            severity: Some("High".to_string()),
            resolved_date: None,
            comments: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn settled(fab: FabId, rows: Vec<ReturnHistory>) -> FabSlot<ReturnHistory> {
        FabSlot {
            fab,
            outcome: SlotOutcome::Settled(rows),
        }
    }

    fn ids(records: &[ReturnHistory]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_merge_sorts_desc_nulls_last_stable() {
        let slots = vec![
            settled(FabId::M14, vec![ret("a", FabId::M14, "resolved", None), ret("b", FabId::M14, "resolved", Some(ts(8)))]),
            settled(FabId::M15, vec![ret("c", FabId::M15, "resolved", Some(ts(9))), ret("d", FabId::M15, "resolved", None)]),
            settled(FabId::M16, vec![ret("e", FabId::M16, "resolved", Some(ts(8)))]),
        ];

        let merged = ResultMerger::merge(slots);
        assert_eq!(ids(&merged.records), vec!["c", "b", "e", "a", "d"]);
        assert_eq!(merged.settled, 3);
        assert!(merged.degraded_fabs.is_empty());
    }

    #[test]
    fn test_merge_keeps_cross_fab_duplicates_and_dedupes_within_fab() {
        let slots = vec![
            settled(FabId::M14, vec![ret("1", FabId::M14, "analyzing", Some(ts(1))), ret("1", FabId::M14, "analyzing", Some(ts(1)))]),
            settled(FabId::M15, vec![ret("1", FabId::M15, "analyzing", Some(ts(2)))]),
        ];

        let merged = ResultMerger::merge(slots);
        assert_eq!(merged.records.len(), 2);
        assert_eq!(merged.records[0].fab, FabId::M15);
    }

    #[test]
    fn test_merge_drops_foreign_fab_rows_and_tracks_failures() {
        let slots = vec![
            FabSlot {
                fab: FabId::M14,
                outcome: SlotOutcome::Failed("offline".to_string()),
            },
            settled(FabId::M15, vec![ret("x", FabId::M16, "resolved", Some(ts(3)))]),
            FabSlot {
                fab: FabId::M16,
                outcome: SlotOutcome::TimedOut,
            },
        ];

        let merged = ResultMerger::merge(slots);
        assert!(merged.records.is_empty());
        assert_eq!(merged.settled, 1);
        assert_eq!(merged.degraded_fabs, vec![FabId::M14, FabId::M16]);
        assert_eq!(merged.failures.len(), 2);
    }

    #[test]
    fn test_matcher_applies_all_criteria() {
        let filter = QueryFilter::default()
            .with_keyword("ret-B")
            .with_status("resolved")
            .with_severity("High")
            .with_date_range(DateRange::new(Some(ts(5)), Some(ts(10))));
        let matcher = RecordMatcher::new(&filter);

        assert!(matcher.matches(&ret("b", FabId::M14, "resolved", Some(ts(8)))));
        assert!(!matcher.matches(&ret("b", FabId::M14, "processing", Some(ts(8)))));
        assert!(!matcher.matches(&ret("b", FabId::M14, "resolved", Some(ts(11)))));
        assert!(!matcher.matches(&ret("c", FabId::M14, "resolved", Some(ts(8)))));

        let by_reason = QueryFilter::default().with_keyword("particle");
        assert!(RecordMatcher::new(&by_reason).matches(&ret("z", FabId::M16, "analyzing", None)));
    }
}
