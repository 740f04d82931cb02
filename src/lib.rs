// ==========================================
// 仓库 MTO+MTS 补货规则 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 仓库路由生成 + MTS+MTO 拆分补货规则生命周期
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 路由生成与扩展钩子
pub mod engine;

// 配置层 - 路由配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DeliverySteps, LifecycleEvent, ProcureMethod, ReceptionSteps, RuleAction,
};

// 领域实体
pub use domain::{
    ProcurementRule, PushRule, Route, RuleLifecycleLog, Warehouse, WarehouseCreate,
    WarehouseUpdate,
};

// 引擎
pub use engine::{BaseWarehouseRouting, MtsMtoExtension, RoutingPipeline, WarehouseExtension};

// 配置
pub use config::{ConfigManager, RoutingConfig};

// API
pub use api::{ApiError, ApiResult, WarehouseApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓库 MTO+MTS 补货规则";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
