// ==========================================
// 仓库 MTO+MTS 补货规则 - 路由引擎错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    /// 必需的基础数据缺失（通用路线、MTO/MTS 规则、伙伴库位）
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: i64 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RoutingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RoutingError::ConfigurationError(message.into())
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        RoutingError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, RoutingError::ConfigurationError(_))
    }
}

pub type RoutingResult<T> = Result<T, RoutingError>;
