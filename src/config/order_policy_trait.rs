// ==========================================
// 宝石订单跟踪系统 - 订单策略读取 Trait
// ==========================================
// 职责: 定义订单引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::StatusTransitionMode;
use std::error::Error;

/// 订单号前缀默认值
pub const DEFAULT_ORDER_NUMBER_PREFIX: &str = "ORD";

/// 日序号最小位数默认值
pub const DEFAULT_ORDER_SEQ_WIDTH: usize = 3;

// ==========================================
// OrderPolicyReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）、StaticOrderPolicy（固定值）
pub trait OrderPolicyReader: Send + Sync {
    /// 获取订单号前缀
    ///
    /// # 默认值
    /// - ORD
    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>>;

    /// 获取日序号补零位数
    ///
    /// # 默认值
    /// - 3
    fn get_order_seq_width(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取订单状态迁移模式
    ///
    /// # 默认值
    /// - PERMISSIVE
    fn get_status_transition_mode(&self) -> Result<StatusTransitionMode, Box<dyn Error>>;
}

// ==========================================
// StaticOrderPolicy - 固定策略
// ==========================================
#[derive(Debug, Clone)]
pub struct StaticOrderPolicy {
    pub order_number_prefix: String,
    pub order_seq_width: usize,
    pub status_transition_mode: StatusTransitionMode,
}

impl Default for StaticOrderPolicy {
    fn default() -> Self {
        Self {
            order_number_prefix: DEFAULT_ORDER_NUMBER_PREFIX.to_string(),
            order_seq_width: DEFAULT_ORDER_SEQ_WIDTH,
            status_transition_mode: StatusTransitionMode::Permissive,
        }
    }
}

impl OrderPolicyReader for StaticOrderPolicy {
    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.order_number_prefix.clone())
    }

    fn get_order_seq_width(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.order_seq_width)
    }

    fn get_status_transition_mode(&self) -> Result<StatusTransitionMode, Box<dyn Error>> {
        Ok(self.status_transition_mode)
    }
}
