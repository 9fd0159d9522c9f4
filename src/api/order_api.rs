// ==========================================
// 宝石订单跟踪系统 - 订单 API
// ==========================================
// 职责: 订单创建/查询/更新/重算/删除的对外契约
// 约束: 原始字符串入参 (类型/状态) 在此解析, 非法取值返回 ValidationError
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::ActionLog;
use crate::domain::order::{
    Actor, NewOrder, Order, OrderFilter, OrderPatch, PaperUsage, StoneUsage, WeightBreakdown,
};
use crate::domain::types::{OrderStatus, OrderType};
use crate::engine::order_lifecycle::{BatchRecalcSummary, OrderLifecycleManager};
use crate::repository::action_log_repo::ActionLogRepository;

// ==========================================
// 请求/响应 DTO
// ==========================================

/// 创建订单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub design_id: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: i64,
    #[serde(default)]
    pub stones_used: Vec<StoneUsage>,
    #[serde(default)]
    pub paper_used: Vec<PaperUsage>,
    pub notes: Option<String>,
}

/// 更新订单请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub notes: Option<Option<String>>,
    pub final_weight: Option<f64>,
}

/// 重量重算响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateWeightResponse {
    pub order: Order,
    pub weight_breakdown: WeightBreakdown,
}

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    lifecycle: Arc<OrderLifecycleManager<ConfigManager>>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl OrderApi {
    /// 创建新的OrderApi实例
    ///
    /// # 参数
    /// - lifecycle: 订单生命周期引擎
    /// - action_log_repo: 操作日志仓储 (订单历史查询)
    pub fn new(
        lifecycle: Arc<OrderLifecycleManager<ConfigManager>>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            lifecycle,
            action_log_repo,
        }
    }

    // ==========================================
    // 写接口
    // ==========================================

    /// 创建订单
    ///
    /// # 返回
    /// - Ok(Order): 已持久化的订单 (含编号与计算重量)
    /// - Err(ApiError): ValidationError / NotFound / InsufficientStock ...
    pub fn create_order(&self, request: CreateOrderRequest, actor: &Actor) -> ApiResult<Order> {
        let new_order = NewOrder {
            order_type: parse_order_type(&request.order_type)?,
            design_id: request.design_id,
            quantity: request.quantity,
            stones_used: request.stones_used,
            paper_used: request.paper_used,
            notes: request.notes,
        };
        Ok(self.lifecycle.create_order(&new_order, actor)?)
    }

    /// 更新订单状态/备注/实测重量
    pub fn update_order(
        &self,
        order_id: &str,
        request: UpdateOrderRequest,
        actor: &Actor,
    ) -> ApiResult<Order> {
        let patch = OrderPatch {
            status: request.status.as_deref().map(parse_order_status).transpose()?,
            notes: request.notes,
            final_weight: request.final_weight,
        };
        Ok(self.lifecycle.update_order(order_id, &patch, actor)?)
    }

    /// 按当前主数据重算单个订单重量
    pub fn recalculate_order_weight(
        &self,
        order_id: &str,
        actor: &Actor,
    ) -> ApiResult<RecalculateWeightResponse> {
        let (order, weight_breakdown) = self.lifecycle.recalculate_order_weight(order_id, actor)?;
        Ok(RecalculateWeightResponse {
            order,
            weight_breakdown,
        })
    }

    /// 全量重算所有订单重量
    pub fn recalculate_all_order_weights(&self, actor: &Actor) -> ApiResult<BatchRecalcSummary> {
        Ok(self.lifecycle.recalculate_all_weights(actor)?)
    }

    /// 删除订单并回补库存 (仅管理员)
    pub fn delete_order(&self, order_id: &str, actor: &Actor) -> ApiResult<()> {
        Ok(self.lifecycle.delete_order(order_id, actor)?)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_order(&self, order_id: &str) -> ApiResult<Order> {
        if order_id.trim().is_empty() {
            return Err(ApiError::ValidationError("订单ID不能为空".to_string()));
        }
        Ok(self.lifecycle.get_order(order_id)?)
    }

    /// 查询订单列表 (创建时间倒序)
    ///
    /// # 参数
    /// - status / order_type: 可选的原始字符串过滤
    /// - design_id: 可选设计过滤
    pub fn list_orders(
        &self,
        status: Option<&str>,
        order_type: Option<&str>,
        design_id: Option<&str>,
    ) -> ApiResult<Vec<Order>> {
        let filter = OrderFilter {
            status: status.map(parse_order_status).transpose()?,
            order_type: order_type.map(parse_order_type).transpose()?,
            design_id: design_id.map(|s| s.to_string()),
        };
        debug!(?filter, "查询订单列表");
        Ok(self.lifecycle.list_orders(&filter)?)
    }

    /// 查询订单操作历史
    pub fn get_order_history(&self, order_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_order_id(order_id)?)
    }
}

fn parse_order_type(raw: &str) -> ApiResult<OrderType> {
    OrderType::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的订单类型: {}", raw)))
}

fn parse_order_status(raw: &str) -> ApiResult<OrderStatus> {
    OrderStatus::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的订单状态: {}", raw)))
}
