// ==========================================
// 宝石订单跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 将引擎/仓储错误转换为调用方可渲染的错误
// 约束: 每类错误有稳定的 error_code, 并携带出错对象标识
// ==========================================

use crate::engine::error::{MaterialKind, OrderError};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    /// 入参缺失或字段无法解码
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 取值越界或枚举值非法 (如未知的订单类型/状态)
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    #[error("库存不足: {material} {name}(id={material_id}), 可用={available}, 需求={requested}")]
    InsufficientStock {
        material: String,
        material_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("冲突: {0}")]
    Conflict(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码 (供调用方映射提示文案/HTTP 状态)
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PermissionDenied(_) => "PERMISSION_DENIED",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "PERSISTENCE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 OrderError 转换
// ==========================================
impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => ApiError::ValidationError(msg),
            OrderError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            OrderError::InsufficientStock {
                material,
                material_id,
                name,
                available,
                requested,
            } => ApiError::InsufficientStock {
                material: match material {
                    MaterialKind::Stone => "stone".to_string(),
                    MaterialKind::Paper => "paper".to_string(),
                },
                material_id,
                name,
                available,
                requested,
            },
            OrderError::Conflict(msg) => ApiError::Conflict(msg),
            OrderError::Persistence(msg) => ApiError::DatabaseError(msg),
            OrderError::PermissionDenied { action } => ApiError::PermissionDenied(action),
            OrderError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("检查约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
