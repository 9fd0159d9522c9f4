// ==========================================
// 宝石订单跟踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: *_in(conn, ..) 系列函数在调用方持有的连接/事务上执行,
//       供引擎层在同一事务内组合多个仓储操作
// ==========================================

pub mod action_log_repo;
pub mod design_repo;
pub mod error;
pub mod order_repo;
pub mod order_sequence_repo;
pub mod paper_repo;
pub mod stone_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use design_repo::DesignRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderRepository;
pub use order_sequence_repo::OrderSequenceRepository;
pub use paper_repo::PaperRepository;
pub use stone_repo::StoneRepository;
