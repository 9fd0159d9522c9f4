// ==========================================
// 宝石订单跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 库存驱动的首饰生产订单跟踪 (BOM 扣料 / 重量核算 / 订单编号)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DesignStatus, InventoryType, OrderStatus, OrderType, StatusTransitionMode, StoneUnit,
    UserRole,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Actor, Design, NewOrder, Order, OrderFilter, OrderPatch, Paper,
    PaperUsage, Stone, StoneUsage, WeightBreakdown,
};

// 引擎
pub use engine::{
    BatchRecalcSummary, InventoryLedger, OrderError, OrderLifecycleManager, OrderSequencer,
    WeightCalculator,
};

// API
pub use api::{ApiError, InventoryApi, OrderApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "宝石订单跟踪系统";
