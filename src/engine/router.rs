// ==========================================
// 多厂区 MES 聚合系统 - 查询路由
// ==========================================
// 职责: 将 fab 过滤值映射为需要调用的厂区集合
// 规则:
// - 指定且可识别 → 单厂区
// - 未指定 / 空白 → 全部厂区
// - 指定但无法识别 → 路由未命中（空结果，不调用任何数据源）
// 红线: 纯选择逻辑，无副作用（日志由调用方输出）
// ==========================================

use crate::domain::query::CallerContext;
use crate::domain::types::FabId;
use std::fmt;

/// 路由未命中原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    /// 无法识别的厂区代码
    UnknownFab(String),
    /// 调用方无权访问该厂区
    NotPermitted(FabId),
    /// 调用方没有任何可访问厂区
    NoPermittedFab,
}

impl fmt::Display for RouteMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMiss::UnknownFab(raw) => write!(f, "未知厂区: {}", raw),
            RouteMiss::NotPermitted(fab) => write!(f, "无权访问厂区: {}", fab),
            RouteMiss::NoPermittedFab => write!(f, "无可访问厂区"),
        }
    }
}

/// 路由结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// 单厂区（同步调用）
    Single(FabId),
    /// 多厂区扇出（按 FabId::ALL 顺序，非空）
    Fabs(Vec<FabId>),
    Miss(RouteMiss),
}

impl Route {
    /// 路由选中的厂区（未命中为空）
    pub fn fabs(&self) -> Vec<FabId> {
        match self {
            Route::Single(fab) => vec![*fab],
            Route::Fabs(fabs) => fabs.clone(),
            Route::Miss(_) => Vec::new(),
        }
    }
}

// ==========================================
// QueryRouter
// ==========================================
pub struct QueryRouter;

impl QueryRouter {
    /// 计算路由
    ///
    /// # 参数
    /// - `fab`: 原始厂区过滤值（None/空白 表示全部）
    /// - `ctx`: 调用方上下文，路由结果与其授权厂区取交集
    pub fn route(fab: Option<&str>, ctx: &CallerContext) -> Route {
        let raw = fab.map(str::trim).filter(|v| !v.is_empty());

        match raw {
            Some(raw) => match FabId::parse(raw) {
                Some(fab) if ctx.permits(fab) => Route::Single(fab),
                Some(fab) => Route::Miss(RouteMiss::NotPermitted(fab)),
                None => Route::Miss(RouteMiss::UnknownFab(raw.to_string())),
            },
            None => {
                let fabs: Vec<FabId> = FabId::ALL
                    .iter()
                    .copied()
                    .filter(|fab| ctx.permits(*fab))
                    .collect();
                if fabs.is_empty() {
                    Route::Miss(RouteMiss::NoPermittedFab)
                } else {
                    Route::Fabs(fabs)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_fab_routes_single() {
        let ctx = CallerContext::system();
        assert_eq!(QueryRouter::route(Some("M15"), &ctx), Route::Single(FabId::M15));
        assert_eq!(QueryRouter::route(Some(" m16 "), &ctx), Route::Single(FabId::M16));
    }

    #[test]
    fn test_absent_or_blank_routes_all() {
        let ctx = CallerContext::system();
        let all = Route::Fabs(FabId::ALL.to_vec());
        assert_eq!(QueryRouter::route(None, &ctx), all);
        assert_eq!(QueryRouter::route(Some("   "), &ctx), all);
    }

    #[test]
    fn test_unknown_fab_is_miss() {
        let route = QueryRouter::route(Some("M99"), &CallerContext::system());
        assert_eq!(route, Route::Miss(RouteMiss::UnknownFab("M99".to_string())));
        assert!(route.fabs().is_empty());
    }

    #[test]
    fn test_caller_context_restricts_routes() {
        let ctx = CallerContext::new("lee").with_permitted_fabs([FabId::M16, FabId::M14]);
        assert_eq!(
            QueryRouter::route(None, &ctx),
            Route::Fabs(vec![FabId::M14, FabId::M16])
        );
        assert_eq!(
            QueryRouter::route(Some("M15"), &ctx),
            Route::Miss(RouteMiss::NotPermitted(FabId::M15))
        );

        let nobody = CallerContext::new("guest").with_permitted_fabs([]);
        assert_eq!(
            QueryRouter::route(None, &nobody),
            Route::Miss(RouteMiss::NoPermittedFab)
        );
    }
}
