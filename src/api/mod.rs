// ==========================================
// 仓库 MTO+MTS 补货规则 - API 层
// ==========================================
// 职责: 提供业务 API 接口，划定事务边界
// ==========================================

pub mod error;
pub mod warehouse_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use warehouse_api::WarehouseApi;
