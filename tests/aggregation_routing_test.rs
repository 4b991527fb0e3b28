// ==========================================
// 聚合路由集成测试
// ==========================================
// 测试目标: 厂区路由 / 调用方授权 / 单厂区隔离
// ==========================================


#[cfg(test)]
mod aggregation_routing_test {
    use crate::test_helpers::{make_lot, ts, MemorySource};
    use fab_mes::domain::query::{CallerContext, QueryFilter};
    use fab_mes::domain::types::{FabId, Provenance};
    use fab_mes::domain::LotData;
    use fab_mes::engine::{
        AggregationError, AggregationService, DemoFallback, FanOutExecutor, RecordAggregator,
        SharedAdapter,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        m14: Arc<MemorySource<LotData>>,
        m15: Arc<MemorySource<LotData>>,
        m16: Arc<MemorySource<LotData>>,
        service: AggregationService<LotData>,
    }

    fn fixture() -> Fixture {
        let m14 = MemorySource::new(
            FabId::M14,
            vec![
                make_lot("1", "LOT001", FabId::M14, "completed", ts(1, 8)),
                make_lot("4", "LOT004", FabId::M14, "in_progress", ts(4, 8)),
            ],
        );
        let m15 = MemorySource::new(
            FabId::M15,
            vec![make_lot("2", "LOT002", FabId::M15, "in_progress", ts(2, 8))],
        );
        let m16 = MemorySource::new(
            FabId::M16,
            vec![make_lot("3", "LOT003", FabId::M16, "waiting", ts(3, 8))],
        );

        let adapters: Vec<SharedAdapter<LotData>> = vec![m14.clone(), m15.clone(), m16.clone()];
        let service = AggregationService::new(
            adapters,
            FanOutExecutor::new(Duration::from_millis(500)),
            Arc::new(DemoFallback::new()),
        );

        Fixture { m14, m15, m16, service }
    }

    fn lot_numbers(records: &[LotData]) -> Vec<&str> {
        records.iter().map(|r| r.lot_number.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_fabs_merged_newest_first() {
        let fx = fixture();
        let result = fx.service.get_history(None, &CallerContext::system()).await;

        assert_eq!(result.provenance, Provenance::Live);
        assert!(result.degraded_fabs.is_empty());
        assert_eq!(lot_numbers(&result.records), vec!["LOT004", "LOT003", "LOT002", "LOT001"]);
        assert_eq!((fx.m14.calls(), fx.m15.calls(), fx.m16.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_single_fab_touches_only_that_source() {
        let fx = fixture();
        let result = fx.service.get_history(Some("m15"), &CallerContext::system()).await;

        assert_eq!(lot_numbers(&result.records), vec!["LOT002"]);
        assert!(result.records.iter().all(|r| r.fab == FabId::M15));
        assert_eq!((fx.m14.calls(), fx.m15.calls(), fx.m16.calls()), (0, 1, 0));
    }

    #[tokio::test]
    async fn test_blank_fab_means_all_fabs() {
        let fx = fixture();
        let result = fx.service.get_history(Some("  "), &CallerContext::system()).await;

        assert_eq!(result.len(), 4);
        assert_eq!((fx.m14.calls(), fx.m15.calls(), fx.m16.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_unknown_fab_returns_empty_without_calls() {
        let fx = fixture();
        let result = fx.service.get_history(Some("M99"), &CallerContext::system()).await;

        assert!(result.is_empty());
        assert!(!result.is_fallback());
        assert_eq!(fx.m14.calls() + fx.m15.calls() + fx.m16.calls(), 0);
    }

    #[tokio::test]
    async fn test_caller_context_limits_fanout() {
        let fx = fixture();
        let ctx = CallerContext::new("kim").with_permitted_fabs([FabId::M15, FabId::M16]);

        let result = fx.service.get_history(None, &ctx).await;
        assert_eq!(lot_numbers(&result.records), vec!["LOT003", "LOT002"]);
        assert_eq!(fx.m14.calls(), 0);

        // 显式请求未授权厂区
        let denied = fx.service.get_history(Some("M14"), &ctx).await;
        assert!(denied.is_empty());
        assert_eq!(fx.m14.calls(), 0);
    }

    #[tokio::test]
    async fn test_active_status_filters_terminal_lots() {
        let fx = fixture();
        let result = fx.service.get_active_status(None, &CallerContext::system()).await;

        assert_eq!(lot_numbers(&result.records), vec!["LOT004", "LOT003", "LOT002"]);
    }

    #[tokio::test]
    async fn test_search_keyword_and_status() {
        let fx = fixture();
        let filter = QueryFilter::for_fab(None)
            .with_keyword("lot00")
            .with_status("in_progress");

        let result = fx.service.search(&filter, &CallerContext::system()).await;
        assert_eq!(lot_numbers(&result.records), vec!["LOT004", "LOT002"]);
    }

    #[tokio::test]
    async fn test_details_and_update_status() {
        let fx = fixture();
        let ctx = CallerContext::system();

        let detail = fx.service.get_details("LOT003", None, &ctx).await;
        assert_eq!(detail.map(|r| r.fab), Some(FabId::M16));
        assert!(fx.service.get_details("LOT00", None, &ctx).await.is_none());

        let updated = fx.service.update_status("LOT002", "completed", None, &ctx).await.unwrap();
        assert_eq!(updated.fab, FabId::M15);
        assert_eq!(updated.status.as_deref(), Some("completed"));
        assert_eq!(fx.m15.rows()[0].status.as_deref(), Some("completed"));

        let missing = fx.service.update_status("LOT099", "completed", None, &ctx).await;
        assert!(matches!(missing, Err(AggregationError::NotFound { .. })));

        let miss = fx.service.update_status("LOT002", "completed", Some("M77"), &ctx).await;
        assert!(matches!(miss, Err(AggregationError::RoutingMiss(_))));
    }
}
