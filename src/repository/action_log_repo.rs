// ==========================================
// 宝石订单跟踪系统 - 操作日志数据仓储
// ==========================================
// 红线: 订单写操作必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
