// ==========================================
// 仓库 MTO+MTS 补货规则 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合路由引擎所需的所有 Repository
// 约束: 全部仓储共享同一连接，保证 run_in_transaction 覆盖所有写入
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    LocationRepository, PushRuleRepository, RouteRepository, RuleLifecycleLogRepository,
    RuleRepository, WarehouseRepository,
};

/// 路由引擎仓储集合
///
/// # 包含的仓储
/// - `warehouse_repo`: 仓库与仓库-路线关联
/// - `location_repo`: 库位与作业类型
/// - `route_repo`: 路线与稳定标识
/// - `rule_repo`: 拉式补货规则
/// - `push_rule_repo`: 推式规则
/// - `lifecycle_log_repo`: 拆分补货规则生命周期日志
#[derive(Clone)]
pub struct StockRepositories {
    pub conn: Arc<Mutex<Connection>>,
    pub warehouse_repo: Arc<WarehouseRepository>,
    pub location_repo: Arc<LocationRepository>,
    pub route_repo: Arc<RouteRepository>,
    pub rule_repo: Arc<RuleRepository>,
    pub push_rule_repo: Arc<PushRuleRepository>,
    pub lifecycle_log_repo: Arc<RuleLifecycleLogRepository>,
}

impl StockRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            warehouse_repo: Arc::new(WarehouseRepository::from_connection(conn.clone())),
            location_repo: Arc::new(LocationRepository::from_connection(conn.clone())),
            route_repo: Arc::new(RouteRepository::from_connection(conn.clone())),
            rule_repo: Arc::new(RuleRepository::from_connection(conn.clone())),
            push_rule_repo: Arc::new(PushRuleRepository::from_connection(conn.clone())),
            lifecycle_log_repo: Arc::new(RuleLifecycleLogRepository::from_connection(conn.clone())),
            conn,
        }
    }

    /// 共享连接（事务边界使用）
    pub fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }
}
