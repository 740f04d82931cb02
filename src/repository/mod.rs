// ==========================================
// 仓库 MTO+MTS 补货规则 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 全部仓储共享同一连接，事务由 run_in_transaction 划定
// ==========================================

pub mod error;
pub mod lifecycle_log_repo;
pub mod location_repo;
pub mod push_rule_repo;
pub mod route_repo;
pub mod rule_repo;
pub mod transaction;
pub mod warehouse_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use lifecycle_log_repo::RuleLifecycleLogRepository;
pub use location_repo::LocationRepository;
pub use push_rule_repo::PushRuleRepository;
pub use route_repo::RouteRepository;
pub use rule_repo::RuleRepository;
pub use transaction::run_in_transaction;
pub use warehouse_repo::WarehouseRepository;
