// ==========================================
// 仓库 MTO+MTS 补货规则 - 引擎层
// ==========================================
// 职责: 仓库路由生成与 MTS+MTO 拆分补货规则生命周期
// 红线: Engine 不拼 SQL
// 红线: 扩展阶段总在基础阶段之后执行
// ==========================================

pub mod base_routing;
pub mod error;
pub mod mts_mto;
pub mod pipeline;
pub mod repositories;

// 重导出核心引擎
pub use base_routing::{BaseWarehouseRouting, PartnerLocations};
pub use error::{RoutingError, RoutingResult};
pub use mts_mto::MtsMtoExtension;
pub use pipeline::{RouteChange, RouteCreation, RouteStep, RoutingPipeline, WarehouseExtension};
pub use repositories::StockRepositories;
