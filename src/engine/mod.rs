// ==========================================
// 宝石订单跟踪系统 - 引擎层
// ==========================================
// 职责: 实现业务规则 (库存账本 / 重量计算 / 编号 / 订单生命周期)
// 红线: Engine 不拼 SQL, 数据访问统一经由 repository
// ==========================================

pub mod error;
pub mod inventory_ledger;
pub mod order_lifecycle;
pub mod order_sequencer;
pub mod weight_calculator;

// 重导出核心引擎
pub use error::{MaterialKind, OrderError, OrderResult};
pub use inventory_ledger::InventoryLedger;
pub use order_lifecycle::{BatchRecalcSummary, OrderLifecycleManager};
pub use order_sequencer::OrderSequencer;
pub use weight_calculator::{
    InMemoryWeightCatalog, SqliteWeightCatalog, WeightCalculator, WeightCatalog,
};
