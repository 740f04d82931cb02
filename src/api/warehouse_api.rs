// ==========================================
// 仓库 MTO+MTS 补货规则 - 仓库 API
// ==========================================
// 职责: 仓库创建、更新、MTS+MTO 开关、查询
// 约束: 每个写操作在一个事务内完成，失败整体回滚
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, RoutingConfig};
use crate::domain::lifecycle_log::RuleLifecycleLog;
use crate::domain::rule::ProcurementRule;
use crate::domain::types::{DeliverySteps, ReceptionSteps};
use crate::domain::warehouse::{Warehouse, WarehouseCreate, WarehouseUpdate};
use crate::engine::{MtsMtoExtension, RoutingPipeline, StockRepositories};
use crate::repository::run_in_transaction;

// ==========================================
// WarehouseApi - 仓库 API
// ==========================================

/// 仓库API
///
/// 职责：
/// 1. 仓库创建（含路线与规则生成）
/// 2. 仓库更新（步骤切换、改名、MTS+MTO 开关）
/// 3. 路线、规则与生命周期日志查询
pub struct WarehouseApi {
    conn: Arc<Mutex<Connection>>,
    pipeline: RoutingPipeline,
}

impl WarehouseApi {
    /// 打开数据库（建表与基础数据幂等初始化），配置取自 config_kv
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_initialized_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 基于已初始化的连接创建，配置取自 config_kv
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone()).load_routing_config()?;
        Ok(Self::new(conn, config))
    }

    /// 基于已初始化的连接与显式配置创建
    pub fn new(conn: Arc<Mutex<Connection>>, config: RoutingConfig) -> Self {
        let repos = StockRepositories::from_connection(conn.clone());
        let pipeline = RoutingPipeline::new(repos, config)
            .with_extension(Box::new(MtsMtoExtension::new()));
        Self { conn, pipeline }
    }

    pub fn pipeline(&self) -> &RoutingPipeline {
        &self.pipeline
    }

    // ===== 写操作 =====

    /// 创建仓库
    ///
    /// # 返回
    /// - Ok(Warehouse): 已生成路线的仓库
    /// - Err(ApiError::ConfigurationWarning): 基础路线 / 库位缺失
    pub fn create_warehouse(&self, create: &WarehouseCreate) -> ApiResult<Warehouse> {
        validate_name("仓库名称", &create.name)?;
        validate_name("仓库代码", &create.code)?;

        let warehouse = run_in_transaction(&self.conn, || {
            self.pipeline.create_warehouse(create).map_err(ApiError::from)
        })?;
        tracing::info!(warehouse_id = warehouse.id, code = %warehouse.code, "创建仓库");
        Ok(warehouse)
    }

    /// 批量更新仓库
    pub fn write_warehouses(&self, warehouse_ids: &[i64], update: &WarehouseUpdate) -> ApiResult<()> {
        if warehouse_ids.is_empty() {
            return Err(ApiError::InvalidInput("仓库ID列表不能为空".to_string()));
        }
        if update.is_empty() {
            return Err(ApiError::InvalidInput("更新内容不能为空".to_string()));
        }
        if let Some(name) = &update.name {
            validate_name("仓库名称", name)?;
        }
        if let Some(code) = &update.code {
            validate_name("仓库代码", code)?;
        }

        run_in_transaction(&self.conn, || {
            self.pipeline
                .write(warehouse_ids, update)
                .map_err(ApiError::from)
        })?;
        tracing::info!(?warehouse_ids, ?update, "更新仓库");
        Ok(())
    }

    /// 打开 / 关闭 MTS+MTO 管理
    pub fn set_mto_mts_management(&self, warehouse_id: i64, enabled: bool) -> ApiResult<Warehouse> {
        self.write_warehouses(&[warehouse_id], &WarehouseUpdate::mto_mts_management(enabled))?;
        self.get_warehouse(warehouse_id)
    }

    /// 仓库改名（code 为 None 时保持不变）
    pub fn rename_warehouse(
        &self,
        warehouse_id: i64,
        name: &str,
        code: Option<&str>,
    ) -> ApiResult<Warehouse> {
        let update = WarehouseUpdate::rename(name, code.map(str::to_string));
        self.write_warehouses(&[warehouse_id], &update)?;
        self.get_warehouse(warehouse_id)
    }

    /// 切换收货 / 发货步骤
    pub fn change_steps(
        &self,
        warehouse_id: i64,
        reception_steps: Option<ReceptionSteps>,
        delivery_steps: Option<DeliverySteps>,
    ) -> ApiResult<Warehouse> {
        if reception_steps.is_none() && delivery_steps.is_none() {
            return Err(ApiError::InvalidInput("收货步骤与发货步骤不能同时为空".to_string()));
        }
        let update = WarehouseUpdate {
            reception_steps,
            delivery_steps,
            ..Default::default()
        };
        self.write_warehouses(&[warehouse_id], &update)?;
        self.get_warehouse(warehouse_id)
    }

    // ===== 查询 =====

    pub fn get_warehouse(&self, warehouse_id: i64) -> ApiResult<Warehouse> {
        Ok(self.pipeline.repos().warehouse_repo.get(warehouse_id)?)
    }

    /// 查询规则（含停用记录）
    pub fn get_rule(&self, rule_id: i64) -> ApiResult<ProcurementRule> {
        Ok(self.pipeline.repos().rule_repo.get(rule_id)?)
    }

    /// 仓库可选用的全部路线
    pub fn list_routes_for_warehouse(&self, warehouse_id: i64) -> ApiResult<Vec<i64>> {
        let warehouse = self.get_warehouse(warehouse_id)?;
        Ok(self.pipeline.get_all_routes_for_wh(&warehouse)?)
    }

    /// 拆分补货规则生命周期日志（按写入顺序）
    pub fn list_rule_history(&self, warehouse_id: i64) -> ApiResult<Vec<RuleLifecycleLog>> {
        Ok(self
            .pipeline
            .repos()
            .lifecycle_log_repo
            .find_by_warehouse(warehouse_id)?)
    }
}

fn validate_name(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}
