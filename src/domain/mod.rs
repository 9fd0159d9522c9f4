// ==========================================
// 宝石订单跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod material;
pub mod order;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use material::{
    Design, NewDesign, NewPaper, NewStone, Paper, PaperCatalogUpdate, Stone, StoneCatalogUpdate,
};
pub use order::{
    Actor, NewOrder, Order, OrderFilter, OrderPatch, PaperUsage, StoneUsage, WeightBreakdown,
};
pub use types::{
    DesignStatus, InventoryType, OrderStatus, OrderType, StatusTransitionMode, StoneUnit, UserRole,
};
