// ==========================================
// 多厂区 MES 聚合系统 - 设备 API
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::request::SearchRequest;
use crate::api::validator::{require_non_blank, validate_entity_conditions, validate_query_filter};
use crate::domain::query::{AggregationResult, CallerContext};
use crate::domain::types::EntityKind;
use crate::domain::EquipmentData;
use crate::engine::service::RecordAggregator;

// ==========================================
// EquipmentApi - 设备 API
// ==========================================
pub struct EquipmentApi {
    service: Arc<dyn RecordAggregator<EquipmentData>>,
}

impl EquipmentApi {
    pub fn new(service: Arc<dyn RecordAggregator<EquipmentData>>) -> Self {
        Self { service }
    }

    pub async fn get_equipment_history(
        &self,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<EquipmentData>> {
        Ok(self.service.get_history(fab, ctx).await)
    }

    /// 设备状态看板（设备无终态，返回全部设备）
    pub async fn get_equipment_status(
        &self,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<EquipmentData>> {
        Ok(self.service.get_active_status(fab, ctx).await)
    }

    pub async fn get_equipment_details(
        &self,
        equipment_id: &str,
        ctx: &CallerContext,
    ) -> ApiResult<Option<EquipmentData>> {
        let equipment_id = require_non_blank("设备ID", equipment_id)?;
        Ok(self.service.get_details(equipment_id, None, ctx).await)
    }

    /// 检索设备（关键字匹配设备ID / 设备名称）
    pub async fn search_equipment(
        &self,
        request: &SearchRequest,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<EquipmentData>> {
        let filter = request.to_filter();
        validate_query_filter(&filter)?;
        validate_entity_conditions(EntityKind::Equipment, &filter)?;
        Ok(self.service.search(&filter, ctx).await)
    }

    /// 更新设备状态（running / idle / maintenance / error）
    pub async fn update_equipment_status(
        &self,
        equipment_id: &str,
        status: &str,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<EquipmentData> {
        let equipment_id = require_non_blank("设备ID", equipment_id)?;
        let status = require_non_blank("状态", status)?;
        Ok(self.service.update_status(equipment_id, status, fab, ctx).await?)
    }
}
