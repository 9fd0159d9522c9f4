// ==========================================
// 宝石订单跟踪系统 - 订单领域模型
// ==========================================
// 职责: 订单实体、物料清单 (BOM) 明细、重量计算结果
// 不变量:
// - order_number 全局唯一, 格式 {prefix}-YYYYMMDD-NNN
// - calculated_weight 为最近一次计算结果 (重算需显式触发)
// - weight_discrepancy = final_weight - calculated_weight (仅在 final_weight 存在时)
// ==========================================

use crate::domain::types::{OrderStatus, OrderType, UserRole};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StoneUsage / PaperUsage - BOM 明细 (值对象)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneUsage {
    pub stone_id: String,
    pub quantity: i64, // 粒
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperUsage {
    pub paper_id: String,
    pub quantity: i64, // 张 (非卷)
}

// ==========================================
// Order - 订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub design_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub quantity: i64,
    pub stones_used: Vec<StoneUsage>,
    pub paper_used: Vec<PaperUsage>,
    pub calculated_weight: f64,
    pub final_weight: Option<f64>,
    pub weight_discrepancy: f64,
    pub notes: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    /// 是否存在 BOM 明细
    pub fn has_usage(&self) -> bool {
        !self.stones_used.is_empty() || !self.paper_used.is_empty()
    }

    /// 依据当前 final_weight 与 calculated_weight 刷新偏差
    ///
    /// final_weight 未录入时保持原值
    pub fn refresh_discrepancy(&mut self) {
        if let Some(final_weight) = self.final_weight {
            self.weight_discrepancy = final_weight - self.calculated_weight;
        }
    }
}

// ==========================================
// NewOrder - 创建订单入参
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub design_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: i64,
    #[serde(default)]
    pub stones_used: Vec<StoneUsage>,
    #[serde(default)]
    pub paper_used: Vec<PaperUsage>,
    pub notes: Option<String>,
}

// ==========================================
// OrderPatch - 订单字段更新
// ==========================================
// notes: None = 不修改, Some(None) = 清空
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub notes: Option<Option<String>>,
    pub final_weight: Option<f64>,
}

// ==========================================
// OrderFilter - 订单列表过滤条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub design_id: Option<String>,
}

// ==========================================
// WeightBreakdown - BOM 重量计算结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightBreakdown {
    pub calculated_weight: f64, // 单件重量 × 数量
    pub weight_per_piece: f64,  // 宝石重量 + 纸重量
    pub stone_weight: f64,
    pub paper_weight: f64,
}

// ==========================================
// Actor - 操作人
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: UserRole::Admin,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: UserRole::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_order() -> Order {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Order {
            id: "o1".to_string(),
            order_number: "ORD-20240305-001".to_string(),
            design_id: "d1".to_string(),
            order_type: OrderType::Internal,
            status: OrderStatus::Pending,
            quantity: 2,
            stones_used: vec![],
            paper_used: vec![],
            calculated_weight: 40.0,
            final_weight: None,
            weight_discrepancy: 0.0,
            notes: None,
            created_by: "u1".to_string(),
            updated_by: "u1".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_refresh_discrepancy_requires_final_weight() {
        let mut order = sample_order();
        order.refresh_discrepancy();
        assert_eq!(order.weight_discrepancy, 0.0);

        order.final_weight = Some(45.0);
        order.refresh_discrepancy();
        assert_eq!(order.weight_discrepancy, 5.0);

        order.final_weight = Some(38.0);
        order.refresh_discrepancy();
        assert_eq!(order.weight_discrepancy, -2.0);
    }

    #[test]
    fn test_order_serializes_type_field() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert_eq!(json["type"], "internal");
        assert_eq!(json["orderNumber"], "ORD-20240305-001");
    }
}
