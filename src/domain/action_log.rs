// ==========================================
// 宝石订单跟踪系统 - 操作日志领域模型
// ==========================================
// 红线: 订单写操作必须记录, 与业务写入同一事务提交
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // 日志ID
    pub action_type: String,           // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub order_id: Option<String>,      // 关联订单 (批量操作为 None)
    pub payload_json: Option<JsonValue>, // 操作参数/结果 (JSON)
    pub detail: Option<String>,        // 详细描述
}

impl ActionLog {
    /// 构造一条新日志 (action_id 使用 UUID v4)
    pub fn new(
        action_type: ActionType,
        actor: &str,
        order_id: Option<&str>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
        action_ts: NaiveDateTime,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts,
            actor: actor.to_string(),
            order_id: order_id.map(|s| s.to_string()),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateOrder,       // 创建订单 (含库存扣减)
    UpdateOrder,       // 修改订单字段
    RecalculateWeight, // 单订单重量重算
    DeleteOrder,       // 删除订单 (含库存回补)
    BatchRecalculate,  // 全量重量重算
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::CreateOrder => write!(f, "CREATE_ORDER"),
            ActionType::UpdateOrder => write!(f, "UPDATE_ORDER"),
            ActionType::RecalculateWeight => write!(f, "RECALCULATE_WEIGHT"),
            ActionType::DeleteOrder => write!(f, "DELETE_ORDER"),
            ActionType::BatchRecalculate => write!(f, "BATCH_RECALCULATE"),
        }
    }
}
