// ==========================================
// 仓库 MTO+MTS 补货规则 - 领域模型层
// ==========================================
// 职责: 定义仓库、库位、路线、规则等实体与类型
// 红线: 不含数据访问逻辑,不含路由引擎逻辑
// ==========================================

pub mod lifecycle_log;
pub mod location;
pub mod route;
pub mod rule;
pub mod types;
pub mod warehouse;

// 重导出核心类型
pub use lifecycle_log::RuleLifecycleLog;
pub use location::{Location, PickingType};
pub use route::{Route, RouteValues};
pub use rule::{
    ProcurementRule, PushPullRules, PushRule, PushRuleValues, RuleSearch, RuleUpsert, RuleValues,
    DEFAULT_RULE_SEQUENCE,
};
pub use types::{
    DeliverySteps, LifecycleEvent, LocationUsage, PickingTypeCode, ProcureMethod, PushAuto,
    ReceptionSteps, RuleAction, RuleOrder, RuleVisibility,
};
pub use warehouse::{Warehouse, WarehouseCreate, WarehouseUpdate};
