// ==========================================
// 仓库 MTO+MTS 补货规则 - 配置层
// ==========================================
// 职责: 路由配置加载与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_db_path, ConfigManager, RoutingConfig};
