// ==========================================
// 宝石订单跟踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供上层请求处理 (HTTP/CLI) 调用
// ==========================================

pub mod error;
pub mod inventory_api;
pub mod order_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use inventory_api::InventoryApi;
pub use order_api::{CreateOrderRequest, OrderApi, RecalculateWeightResponse, UpdateOrderRequest};
