// ==========================================
// 宝石订单跟踪系统 - 领域类型定义
// ==========================================
// 职责: 订单/物料相关的枚举类型
// 约束: 数据库存储值与序列化值保持一致 (小写 snake_case)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单类型 (Order Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Internal, // 内部订单
    Out,      // 外发订单
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl OrderType {
    /// 从字符串解析（非法值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "internal" => Some(OrderType::Internal),
            "out" => Some(OrderType::Out),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderType::Internal => "internal",
            OrderType::Out => "out",
        }
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 初始状态: pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,    // 待处理
    InProgress, // 生产中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// 从字符串解析（非法值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "pending" => Some(OrderStatus::Pending),
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// 工作流模式下是否允许迁移到目标状态
    ///
    /// 规则:
    /// - 同状态更新始终允许
    /// - pending → in_progress / cancelled
    /// - in_progress → completed / cancelled
    /// - completed / cancelled 为终态
    pub fn workflow_allows(&self, to: OrderStatus) -> bool {
        if *self == to {
            return true;
        }
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }
}

// ==========================================
// 状态迁移模式 (Status Transition Mode)
// ==========================================
// PERMISSIVE: 任意状态之间均可迁移（默认，保持原有行为）
// WORKFLOW: 按 OrderStatus::workflow_allows 校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTransitionMode {
    Permissive,
    Workflow,
}

impl Default for StatusTransitionMode {
    fn default() -> Self {
        StatusTransitionMode::Permissive
    }
}

impl fmt::Display for StatusTransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTransitionMode::Permissive => write!(f, "PERMISSIVE"),
            StatusTransitionMode::Workflow => write!(f, "WORKFLOW"),
        }
    }
}

impl StatusTransitionMode {
    /// 从配置值解析，未知值回退为 PERMISSIVE
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "WORKFLOW" => StatusTransitionMode::Workflow,
            _ => StatusTransitionMode::Permissive,
        }
    }

    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusTransitionMode::Permissive => true,
            StatusTransitionMode::Workflow => from.workflow_allows(to),
        }
    }
}

// ==========================================
// 库存类型 (Inventory Type)
// ==========================================
// 纸卷按库存类型分开建档，(name, inventory_type) 联合唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    Internal, // 内部库存
    Out,      // 外发库存
}

impl Default for InventoryType {
    fn default() -> Self {
        InventoryType::Internal
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl InventoryType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "internal" => Some(InventoryType::Internal),
            "out" => Some(InventoryType::Out),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            InventoryType::Internal => "internal",
            InventoryType::Out => "out",
        }
    }
}

// ==========================================
// 宝石计量单位 (Stone Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoneUnit {
    Pieces, // 粒
    Kg,     // 千克
    Grams,  // 克
}

impl Default for StoneUnit {
    fn default() -> Self {
        StoneUnit::Pieces
    }
}

impl fmt::Display for StoneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl StoneUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "pieces" => Some(StoneUnit::Pieces),
            "kg" => Some(StoneUnit::Kg),
            "grams" => Some(StoneUnit::Grams),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StoneUnit::Pieces => "pieces",
            StoneUnit::Kg => "kg",
            StoneUnit::Grams => "grams",
        }
    }
}

// ==========================================
// 设计状态 (Design Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    Active,
    Inactive,
}

impl Default for DesignStatus {
    fn default() -> Self {
        DesignStatus::Active
    }
}

impl DesignStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "active" => Some(DesignStatus::Active),
            "inactive" => Some(DesignStatus::Inactive),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DesignStatus::Active => "active",
            DesignStatus::Inactive => "inactive",
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
// 删除订单、维护物料主数据需要 admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}
