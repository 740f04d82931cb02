// ==========================================
// 仓库 MTO+MTS 补货规则 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Engine / Repository错误为用户友好的错误消息
// ==========================================

use crate::engine::error::RoutingError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 仓库配置不完整（可由用户补全后重试）
    #[error("配置警告: {0}")]
    ConfigurationWarning(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

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
    /// 是否为可由用户修复的配置警告
    pub fn is_warning(&self) -> bool {
        matches!(self, ApiError::ConfigurationWarning(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RoutingError 转换
// ==========================================
impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::ConfigurationError(msg) => ApiError::ConfigurationWarning(msg),
            RoutingError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RoutingError::Repository(err) => ApiError::from(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_becomes_warning() {
        let err = ApiError::from(RoutingError::configuration("Can't find MTO Rule on the warehouse"));
        assert!(err.is_warning());
        assert!(err.to_string().contains("MTO Rule"));
    }

    #[test]
    fn test_nested_repository_error() {
        let err = ApiError::from(RoutingError::Repository(RepositoryError::not_found(
            "stock_warehouse",
            7,
        )));
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg.contains("id=7")));

        let err = ApiError::from(RepositoryError::UniqueConstraintViolation("code".to_string()));
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }
}
