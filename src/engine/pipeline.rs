// ==========================================
// 仓库 MTO+MTS 补货规则 - 路由生命周期钩子链
// ==========================================
// 职责: 定义仓库路由扩展 trait，并按 "基础阶段 -> 扩展阶段" 顺序调度
// 约束: 扩展阶段总在基础阶段完成之后执行
// 约束: 基础阶段内部的嵌套调用 (write -> change_route 等) 回到管线，
//       使扩展同样生效
// ==========================================

use crate::config::RoutingConfig;
use crate::domain::rule::PushPullRules;
use crate::domain::types::{DeliverySteps, ReceptionSteps};
use crate::domain::warehouse::{Warehouse, WarehouseCreate, WarehouseUpdate};
use crate::engine::base_routing::BaseWarehouseRouting;
use crate::engine::error::RoutingResult;
use crate::engine::repositories::StockRepositories;
use serde::{Deserialize, Serialize};

// ==========================================
// 钩子数据
// ==========================================

/// 路线中的一步: 来源库位 -> 目标库位 (作业类型)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub from_location_id: i64,
    pub dest_location_id: i64,
    pub picking_type_id: i64,
}

impl RouteStep {
    pub fn new(from_location_id: i64, dest_location_id: i64, picking_type_id: i64) -> Self {
        Self {
            from_location_id,
            dest_location_id,
            picking_type_id,
        }
    }
}

/// create_routes 的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCreation {
    /// 仓库自动生成的路线 (收货、发货)
    pub route_ids: Vec<i64>,
    pub reception_route_id: Option<i64>,
    pub delivery_route_id: Option<i64>,
    pub mto_pull_id: Option<i64>,
    pub mts_mto_rule_id: Option<i64>,
}

/// change_route 的步骤变更
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteChange {
    pub new_reception_step: Option<ReceptionSteps>,
    pub new_delivery_step: Option<DeliverySteps>,
}

// ==========================================
// 仓库路由扩展 Trait
// ==========================================

/// 仓库路由扩展
///
/// 每个方法对应一个生命周期钩子的扩展阶段，在基础阶段完成后调用。
/// 默认实现为空操作，扩展只需覆盖关心的钩子。
///
/// # 参数
/// - `pipeline`: 所属管线，用于访问仓储、配置或回调其他钩子
pub trait WarehouseExtension: Send + Sync {
    /// 扩展名称（日志用）
    fn name(&self) -> &str;

    fn after_create_routes(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse: &Warehouse,
        _creation: &mut RouteCreation,
    ) -> RoutingResult<()> {
        Ok(())
    }

    fn after_push_pull_rules(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse: &Warehouse,
        _active: bool,
        _rules: &mut PushPullRules,
    ) -> RoutingResult<()> {
        Ok(())
    }

    fn after_write(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse_ids: &[i64],
        _update: &WarehouseUpdate,
    ) -> RoutingResult<()> {
        Ok(())
    }

    fn after_all_routes(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse: &Warehouse,
        _route_ids: &mut Vec<i64>,
    ) -> RoutingResult<()> {
        Ok(())
    }

    /// `warehouse` 仍为改名前的快照
    fn after_handle_renaming(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse: &Warehouse,
        _name: &str,
        _code: &str,
    ) -> RoutingResult<()> {
        Ok(())
    }

    fn after_change_route(
        &self,
        _pipeline: &RoutingPipeline,
        _warehouse: &Warehouse,
        _change: &RouteChange,
    ) -> RoutingResult<()> {
        Ok(())
    }
}

// ==========================================
// RoutingPipeline - 钩子链调度
// ==========================================
pub struct RoutingPipeline {
    repos: StockRepositories,
    config: RoutingConfig,
    base: BaseWarehouseRouting,
    extensions: Vec<Box<dyn WarehouseExtension>>,
}

impl RoutingPipeline {
    /// 仅含基础阶段的管线
    pub fn new(repos: StockRepositories, config: RoutingConfig) -> Self {
        Self {
            repos,
            config,
            base: BaseWarehouseRouting,
            extensions: Vec::new(),
        }
    }

    /// 追加扩展（按追加顺序执行）
    pub fn with_extension(mut self, extension: Box<dyn WarehouseExtension>) -> Self {
        tracing::debug!("注册仓库路由扩展: {}", extension.name());
        self.extensions.push(extension);
        self
    }

    pub fn repos(&self) -> &StockRepositories {
        &self.repos
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn base(&self) -> &BaseWarehouseRouting {
        &self.base
    }

    // ===== 钩子 =====

    /// 新建仓库: 库位、作业类型、路线与规则
    pub fn create_warehouse(&self, create: &WarehouseCreate) -> RoutingResult<Warehouse> {
        self.base.create_warehouse(self, create)
    }

    pub fn create_routes(&self, warehouse: &Warehouse) -> RoutingResult<RouteCreation> {
        let mut creation = self.base.create_routes(self, warehouse)?;
        for ext in &self.extensions {
            ext.after_create_routes(self, warehouse, &mut creation)?;
        }
        Ok(creation)
    }

    pub fn get_push_pull_rules(
        &self,
        warehouse: &Warehouse,
        active: bool,
        steps: &[RouteStep],
        route_id: i64,
    ) -> RoutingResult<PushPullRules> {
        let mut rules = self
            .base
            .get_push_pull_rules(self, warehouse, active, steps, route_id)?;
        for ext in &self.extensions {
            ext.after_push_pull_rules(self, warehouse, active, &mut rules)?;
        }
        Ok(rules)
    }

    pub fn write(&self, warehouse_ids: &[i64], update: &WarehouseUpdate) -> RoutingResult<()> {
        self.base.write(self, warehouse_ids, update)?;
        for ext in &self.extensions {
            ext.after_write(self, warehouse_ids, update)?;
        }
        Ok(())
    }

    pub fn get_all_routes_for_wh(&self, warehouse: &Warehouse) -> RoutingResult<Vec<i64>> {
        let mut route_ids = self.base.get_all_routes_for_wh(self, warehouse)?;
        for ext in &self.extensions {
            ext.after_all_routes(self, warehouse, &mut route_ids)?;
        }
        Ok(route_ids)
    }

    pub fn handle_renaming(&self, warehouse: &Warehouse, name: &str, code: &str) -> RoutingResult<()> {
        self.base.handle_renaming(self, warehouse, name, code)?;
        for ext in &self.extensions {
            ext.after_handle_renaming(self, warehouse, name, code)?;
        }
        Ok(())
    }

    pub fn change_route(
        &self,
        warehouse: &Warehouse,
        new_reception_step: Option<ReceptionSteps>,
        new_delivery_step: Option<DeliverySteps>,
    ) -> RoutingResult<()> {
        let change = RouteChange {
            new_reception_step,
            new_delivery_step,
        };
        self.base.change_route(self, warehouse, &change)?;
        for ext in &self.extensions {
            ext.after_change_route(self, warehouse, &change)?;
        }
        Ok(())
    }
}
