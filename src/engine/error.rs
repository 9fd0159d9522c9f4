// ==========================================
// 宝石订单跟踪系统 - 引擎层错误类型
// ==========================================
// 分类: 校验 / 未找到 / 库存不足 / 冲突 / 持久化 / 权限 / 状态迁移
// 约束: 所有错误携带足够结构 (类别 + 标识) 供调用方渲染提示
// ==========================================

use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

/// 物料种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Stone,
    Paper,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialKind::Stone => write!(f, "Stone"),
            MaterialKind::Paper => write!(f, "Paper"),
        }
    }
}

/// 订单引擎错误类型
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// available/requested 单位均为“粒/张”
    #[error("库存不足: {material} {name}(id={material_id}), 可用={available}, 需求={requested}")]
    InsufficientStock {
        material: MaterialKind,
        material_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("唯一约束冲突: {0}")]
    Conflict(String),

    #[error("持久化失败: {0}")]
    Persistence(String),

    #[error("权限不足: {action} 需要管理员权限")]
    PermissionDenied { action: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },
}

impl OrderError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        OrderError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => OrderError::NotFound { entity, id },
            RepositoryError::UniqueConstraintViolation(msg) => OrderError::Conflict(msg),
            other => OrderError::Persistence(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for OrderError {
    fn from(err: rusqlite::Error) -> Self {
        OrderError::from(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        let err: OrderError = RepositoryError::UniqueConstraintViolation("order_number".into()).into();
        assert!(matches!(err, OrderError::Conflict(_)));

        let err: OrderError = RepositoryError::NotFound {
            entity: "Order".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, OrderError::NotFound { ref entity, .. } if entity == "Order"));

        let err: OrderError = RepositoryError::LockError("poisoned".into()).into();
        assert!(matches!(err, OrderError::Persistence(_)));
    }

    #[test]
    fn test_insufficient_stock_message_has_both_figures() {
        let err = OrderError::InsufficientStock {
            material: MaterialKind::Stone,
            material_id: "s1".into(),
            name: "Ruby".into(),
            available: 5,
            requested: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("Ruby"));
        assert!(msg.contains("5"));
        assert!(msg.contains("10"));
    }
}
