// ==========================================
// 仓库 MTO+MTS 补货规则 - 基础路由生成
// ==========================================
// 职责: 仓库收货 / 发货路线及推拉规则的生成、切换、改名
// 红线: Engine 不拼 SQL，数据访问全部经由 Repository
// 红线: 规则只停用不删除，重新生成时优先复用已有记录
// ==========================================
// 收货步骤:
//   OneStep    -> (无规则)
//   TwoSteps   -> 收货区 -> 库存
//   ThreeSteps -> 收货区 -> 质检区 -> 库存
// 发货步骤:
//   ShipOnly     -> 库存 -> 客户
//   PickShip     -> 库存 -> 出库区 -> 客户
//   PickPackShip -> 库存 -> 打包区 -> 出库区 -> 客户
// ==========================================

use crate::domain::location::Location;
use crate::domain::route::{Route, RouteValues};
use crate::domain::rule::{PushPullRules, PushRuleValues, RuleUpsert, RuleValues};
use crate::domain::types::{
    DeliverySteps, LocationUsage, PickingTypeCode, ProcureMethod, PushAuto, ReceptionSteps,
    RuleVisibility,
};
use crate::domain::warehouse::{Warehouse, WarehouseCreate, WarehouseUpdate};
use crate::domain::ProcurementRule;
use crate::engine::error::{RoutingError, RoutingResult};
use crate::engine::pipeline::{RouteChange, RouteCreation, RouteStep, RoutingPipeline};
use crate::i18n;
use chrono::Utc;
use tracing::{debug, info};

/// 伙伴库位
#[derive(Debug, Clone)]
pub struct PartnerLocations {
    pub customer: Location,
    pub supplier: Location,
}

// ==========================================
// BaseWarehouseRouting - 基础阶段
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseWarehouseRouting;

impl BaseWarehouseRouting {
    // ===== 基础数据 =====

    /// 解析客户 / 供应商库位
    pub fn partner_locations(&self, pipeline: &RoutingPipeline) -> RoutingResult<PartnerLocations> {
        let config = pipeline.config();
        let customer = self.partner_location(pipeline, &config.customer_location_xml_id)?;
        let supplier = self.partner_location(pipeline, &config.supplier_location_xml_id)?;
        Ok(PartnerLocations { customer, supplier })
    }

    fn partner_location(&self, pipeline: &RoutingPipeline, xml_id: &str) -> RoutingResult<Location> {
        pipeline
            .repos()
            .location_repo
            .find_location_by_xml_id(xml_id)?
            .ok_or_else(|| {
                RoutingError::configuration(i18n::t_with_args(
                    "errors.partner_location_missing",
                    &[("xml_id", xml_id)],
                ))
            })
    }

    /// 通用 MTO 路线
    pub fn mto_route(&self, pipeline: &RoutingPipeline) -> RoutingResult<Route> {
        pipeline
            .repos()
            .route_repo
            .find_by_xml_id(&pipeline.config().mto_route_xml_id)?
            .ok_or_else(|| RoutingError::configuration(i18n::t("errors.mto_route_missing")))
    }

    // ===== 路线步骤 =====

    pub fn reception_route_steps(&self, warehouse: &Warehouse, steps: ReceptionSteps) -> Vec<RouteStep> {
        let wh = warehouse;
        match steps {
            ReceptionSteps::OneStep => Vec::new(),
            ReceptionSteps::TwoSteps => vec![RouteStep::new(
                wh.wh_input_stock_loc_id,
                wh.lot_stock_id,
                wh.int_type_id,
            )],
            ReceptionSteps::ThreeSteps => vec![
                RouteStep::new(wh.wh_input_stock_loc_id, wh.wh_qc_stock_loc_id, wh.int_type_id),
                RouteStep::new(wh.wh_qc_stock_loc_id, wh.lot_stock_id, wh.int_type_id),
            ],
        }
    }

    pub fn delivery_route_steps(
        &self,
        warehouse: &Warehouse,
        steps: DeliverySteps,
        customer_location_id: i64,
    ) -> Vec<RouteStep> {
        let wh = warehouse;
        match steps {
            DeliverySteps::ShipOnly => vec![RouteStep::new(
                wh.lot_stock_id,
                customer_location_id,
                wh.out_type_id,
            )],
            DeliverySteps::PickShip => vec![
                RouteStep::new(wh.lot_stock_id, wh.wh_output_stock_loc_id, wh.pick_type_id),
                RouteStep::new(wh.wh_output_stock_loc_id, customer_location_id, wh.out_type_id),
            ],
            DeliverySteps::PickPackShip => vec![
                RouteStep::new(wh.lot_stock_id, wh.wh_pack_stock_loc_id, wh.pick_type_id),
                RouteStep::new(wh.wh_pack_stock_loc_id, wh.wh_output_stock_loc_id, wh.pack_type_id),
                RouteStep::new(wh.wh_output_stock_loc_id, customer_location_id, wh.out_type_id),
            ],
        }
    }

    // ===== 命名 =====

    /// 路线名称: "{仓库名}: {标签}"
    pub fn format_routename(&self, warehouse: &Warehouse, label: &str) -> String {
        format!("{}: {}", warehouse.name, label)
    }

    /// 规则名称: "{仓库代码}: {来源库位} -> {目标库位}"
    pub fn format_rulename(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        from_location_id: i64,
        dest_location_id: i64,
    ) -> RoutingResult<String> {
        let locations = &pipeline.repos().location_repo;
        let from = locations.get_location(from_location_id)?;
        let dest = locations.get_location(dest_location_id)?;
        Ok(format!("{}: {} -> {}", warehouse.code, from.name, dest.name))
    }

    /// 默认 MTO 规则定义（取发货路线的第一步，挂在通用 MTO 路线上）
    pub fn mto_pull_values(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        delivery: DeliverySteps,
        customer_location_id: i64,
    ) -> RoutingResult<RuleValues> {
        let mto_route = self.mto_route(pipeline)?;
        let steps = self.delivery_route_steps(warehouse, delivery, customer_location_id);
        let first = steps
            .first()
            .copied()
            .ok_or_else(|| RoutingError::configuration(i18n::t("errors.mto_rule_missing")))?;

        let name = format!(
            "{} {}",
            self.format_rulename(pipeline, warehouse, first.from_location_id, first.dest_location_id)?,
            pipeline.config().label("rule.mto_suffix")
        );
        let mut values = RuleValues::move_rule(
            name,
            mto_route.id,
            first.from_location_id,
            first.dest_location_id,
            first.picking_type_id,
            warehouse.id,
            ProcureMethod::MakeToOrder,
        );
        values.sequence = pipeline.config().default_rule_sequence;
        Ok(values)
    }

    // ===== 查找或创建 =====

    /// 查找与定义匹配的已有规则（含停用记录）
    pub fn find_existing_rule(
        &self,
        pipeline: &RoutingPipeline,
        values: &RuleValues,
    ) -> RoutingResult<Option<ProcurementRule>> {
        Ok(pipeline.repos().rule_repo.find_matching(values)?)
    }

    /// 复用（并重新启用）已有规则，不存在时新建
    pub fn create_reactivate_rule(
        &self,
        pipeline: &RoutingPipeline,
        values: &RuleValues,
    ) -> RoutingResult<RuleUpsert> {
        let rules = &pipeline.repos().rule_repo;
        let mut values = values.clone();
        values.active = true;

        match self.find_existing_rule(pipeline, &values)? {
            Some(existing) => {
                rules.rewrite(existing.id, &values)?;
                debug!(rule_id = existing.id, was_active = existing.active, "复用已有规则: {}", values.name);
                Ok(RuleUpsert {
                    rule: rules.get(existing.id)?,
                    reused: true,
                })
            }
            None => {
                let id = rules.insert(&values)?;
                debug!(rule_id = id, "新建规则: {}", values.name);
                Ok(RuleUpsert {
                    rule: rules.get(id)?,
                    reused: false,
                })
            }
        }
    }

    fn create_reactivate_push(
        &self,
        pipeline: &RoutingPipeline,
        values: &PushRuleValues,
    ) -> RoutingResult<i64> {
        let pushes = &pipeline.repos().push_rule_repo;
        let mut values = values.clone();
        values.active = true;

        match pushes.find_matching(&values)? {
            Some(existing) => {
                pushes.rewrite(existing.id, &values)?;
                Ok(existing.id)
            }
            None => Ok(pushes.insert(&values)?),
        }
    }

    // ===== 钩子: 基础阶段 =====

    /// 由路线步骤生成推 / 拉规则定义
    ///
    /// 第一步从库存取货 (MakeToStock)，后续步骤按单触发 (MakeToOrder)
    pub fn get_push_pull_rules(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        active: bool,
        steps: &[RouteStep],
        route_id: i64,
    ) -> RoutingResult<PushPullRules> {
        let mut rules = PushPullRules::default();

        for (index, step) in steps.iter().enumerate() {
            let name =
                self.format_rulename(pipeline, warehouse, step.from_location_id, step.dest_location_id)?;

            rules.push_rules.push(PushRuleValues {
                name: name.clone(),
                route_id,
                location_from_id: step.from_location_id,
                location_dest_id: step.dest_location_id,
                picking_type_id: Some(step.picking_type_id),
                auto: PushAuto::Manual,
                warehouse_id: warehouse.id,
                active,
            });

            let procure_method = if index == 0 {
                ProcureMethod::MakeToStock
            } else {
                ProcureMethod::MakeToOrder
            };
            let mut pull = RuleValues::move_rule(
                name,
                route_id,
                step.from_location_id,
                step.dest_location_id,
                step.picking_type_id,
                warehouse.id,
                procure_method,
            );
            pull.sequence = pipeline.config().default_rule_sequence;
            pull.active = active;
            rules.pull_rules.push(pull);
        }

        Ok(rules)
    }

    /// 生成仓库的收货 / 发货路线与默认 MTO 规则
    ///
    /// 路线引用在返回前已写入仓库，扩展阶段可直接读取
    pub fn create_routes(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
    ) -> RoutingResult<RouteCreation> {
        let repos = pipeline.repos();
        let config = pipeline.config();
        let partners = self.partner_locations(pipeline)?;

        // 收货路线: 推式规则 + 按单拉式规则
        let reception_name =
            self.format_routename(warehouse, &config.label(warehouse.reception_steps.label_key()));
        let reception_route_id = repos
            .route_repo
            .insert(&RouteValues::warehouse_route(reception_name))?;
        repos.warehouse_repo.add_route(warehouse.id, reception_route_id)?;

        let steps = self.reception_route_steps(warehouse, warehouse.reception_steps);
        let rules = pipeline.get_push_pull_rules(warehouse, true, &steps, reception_route_id)?;
        for push in &rules.push_rules {
            repos.push_rule_repo.insert(push)?;
        }
        for mut pull in rules.pull_rules {
            pull.procure_method = ProcureMethod::MakeToOrder;
            repos.rule_repo.insert(&pull)?;
        }

        // 发货路线: 仅拉式规则
        let delivery_name =
            self.format_routename(warehouse, &config.label(warehouse.delivery_steps.label_key()));
        let delivery_route_id = repos
            .route_repo
            .insert(&RouteValues::warehouse_route(delivery_name))?;
        repos.warehouse_repo.add_route(warehouse.id, delivery_route_id)?;

        let steps =
            self.delivery_route_steps(warehouse, warehouse.delivery_steps, partners.customer.id);
        let rules = pipeline.get_push_pull_rules(warehouse, true, &steps, delivery_route_id)?;
        for pull in &rules.pull_rules {
            repos.rule_repo.insert(pull)?;
        }

        // 默认 MTO 规则
        let mto_values =
            self.mto_pull_values(pipeline, warehouse, warehouse.delivery_steps, partners.customer.id)?;
        let mto_pull_id = repos.rule_repo.insert(&mto_values)?;

        repos.warehouse_repo.set_route_refs(
            warehouse.id,
            Some(reception_route_id),
            Some(delivery_route_id),
            Some(mto_pull_id),
        )?;

        debug!(
            warehouse_id = warehouse.id,
            reception_route_id, delivery_route_id, mto_pull_id, "仓库路线已生成"
        );

        Ok(RouteCreation {
            route_ids: vec![reception_route_id, delivery_route_id],
            reception_route_id: Some(reception_route_id),
            delivery_route_id: Some(delivery_route_id),
            mto_pull_id: Some(mto_pull_id),
            mts_mto_rule_id: None,
        })
    }

    /// 切换收货 / 发货步骤
    ///
    /// 停用路线下原有规则后按新步骤重新生成（复用匹配的停用记录），
    /// 并同步默认 MTO 规则与作业类型默认库位
    pub fn change_route(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        change: &RouteChange,
    ) -> RoutingResult<()> {
        let repos = pipeline.repos();
        let config = pipeline.config();
        let partners = self.partner_locations(pipeline)?;

        if let Some(reception) = change.new_reception_step {
            let route_id = warehouse
                .reception_route_id
                .ok_or_else(|| RoutingError::not_found("reception_route", warehouse.id))?;
            repos.rule_repo.deactivate_by_route(route_id)?;
            repos.push_rule_repo.deactivate_by_route(route_id)?;
            repos.route_repo.update_name(
                route_id,
                &self.format_routename(warehouse, &config.label(reception.label_key())),
            )?;

            let steps = self.reception_route_steps(warehouse, reception);
            let rules = pipeline.get_push_pull_rules(warehouse, true, &steps, route_id)?;
            for push in &rules.push_rules {
                self.create_reactivate_push(pipeline, push)?;
            }
            for mut pull in rules.pull_rules {
                pull.procure_method = ProcureMethod::MakeToOrder;
                self.create_reactivate_rule(pipeline, &pull)?;
            }
        }

        if let Some(delivery) = change.new_delivery_step {
            let route_id = warehouse
                .delivery_route_id
                .ok_or_else(|| RoutingError::not_found("delivery_route", warehouse.id))?;
            repos.rule_repo.deactivate_by_route(route_id)?;
            repos.route_repo.update_name(
                route_id,
                &self.format_routename(warehouse, &config.label(delivery.label_key())),
            )?;

            let steps = self.delivery_route_steps(warehouse, delivery, partners.customer.id);
            let rules = pipeline.get_push_pull_rules(warehouse, true, &steps, route_id)?;
            for pull in &rules.pull_rules {
                self.create_reactivate_rule(pipeline, pull)?;
            }

            if let Some(mto_pull_id) = warehouse.mto_pull_id {
                let values =
                    self.mto_pull_values(pipeline, warehouse, delivery, partners.customer.id)?;
                repos.rule_repo.rewrite(mto_pull_id, &values)?;
            }
        }

        self.sync_picking_types(
            pipeline,
            warehouse,
            change.new_reception_step.unwrap_or(warehouse.reception_steps),
            change.new_delivery_step.unwrap_or(warehouse.delivery_steps),
            &partners,
        )?;

        debug!(
            warehouse_id = warehouse.id,
            reception = ?change.new_reception_step,
            delivery = ?change.new_delivery_step,
            "仓库路线已切换"
        );
        Ok(())
    }

    /// 仓库改名: 视图库位、路线名称、规则名称
    ///
    /// `warehouse` 为改名前的快照
    pub fn handle_renaming(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        name: &str,
        code: &str,
    ) -> RoutingResult<()> {
        let repos = pipeline.repos();
        repos
            .location_repo
            .update_location_name(warehouse.view_location_id, code)?;

        for route_id in repos.warehouse_repo.route_ids(warehouse.id)? {
            if let Some(route) = repos.route_repo.find_by_id(route_id)? {
                repos
                    .route_repo
                    .update_name(route.id, &route.name.replacen(&warehouse.name, name, 1))?;
            }
            for rule in repos
                .rule_repo
                .find_by_route(route_id, RuleVisibility::IncludeInactive)?
                .into_iter()
                .filter(|r| r.warehouse_id == warehouse.id)
            {
                repos
                    .rule_repo
                    .update_name(rule.id, &rule.name.replacen(&warehouse.code, code, 1))?;
            }
            for push in repos
                .push_rule_repo
                .find_by_route(route_id, RuleVisibility::IncludeInactive)?
                .into_iter()
                .filter(|p| p.warehouse_id == warehouse.id)
            {
                repos
                    .push_rule_repo
                    .update_name(push.id, &push.name.replacen(&warehouse.code, code, 1))?;
            }
        }

        if let Some(mto_pull_id) = warehouse.mto_pull_id {
            if let Some(rule) = repos.rule_repo.find_by_id(mto_pull_id)? {
                repos
                    .rule_repo
                    .update_name(rule.id, &rule.name.replacen(&warehouse.code, code, 1))?;
            }
        }

        debug!(warehouse_id = warehouse.id, "仓库改名: {} -> {} ({})", warehouse.name, name, code);
        Ok(())
    }

    /// 仓库的全部路线: 仓库路线 + 默认 MTO 规则所在路线
    pub fn get_all_routes_for_wh(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
    ) -> RoutingResult<Vec<i64>> {
        let repos = pipeline.repos();
        let mut route_ids = repos.warehouse_repo.route_ids(warehouse.id)?;
        if let Some(mto_pull_id) = warehouse.mto_pull_id {
            if let Some(route_id) = repos
                .rule_repo
                .find_by_id(mto_pull_id)?
                .and_then(|rule| rule.route_id)
            {
                route_ids.push(route_id);
            }
        }
        Ok(route_ids)
    }

    /// 仓库更新: 先切换路线，再处理改名，最后写入字段
    pub fn write(
        &self,
        pipeline: &RoutingPipeline,
        warehouse_ids: &[i64],
        update: &WarehouseUpdate,
    ) -> RoutingResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        let repos = pipeline.repos();

        for &id in warehouse_ids {
            let warehouse = repos.warehouse_repo.get(id)?;

            if update.touches_steps() {
                pipeline.change_route(&warehouse, update.reception_steps, update.delivery_steps)?;
            }

            if update.touches_naming() {
                let name = update.name.clone().unwrap_or_else(|| warehouse.name.clone());
                let code = update.code.clone().unwrap_or_else(|| warehouse.code.clone());
                pipeline.handle_renaming(&warehouse, &name, &code)?;
            }

            repos.warehouse_repo.update_fields(id, update)?;
        }
        Ok(())
    }

    /// 新建仓库: 库位、作业类型、仓库记录，随后经管线生成路线
    pub fn create_warehouse(
        &self,
        pipeline: &RoutingPipeline,
        create: &WarehouseCreate,
    ) -> RoutingResult<Warehouse> {
        let repos = pipeline.repos();
        let locations = &repos.location_repo;
        let partners = self.partner_locations(pipeline)?;

        let view = locations.insert_location(&create.code, LocationUsage::View, None)?;
        let lot_stock = locations.insert_location("Stock", LocationUsage::Internal, Some(view))?;
        let input = locations.insert_location("Input", LocationUsage::Internal, Some(view))?;
        let qc = locations.insert_location("Quality Control", LocationUsage::Internal, Some(view))?;
        let output = locations.insert_location("Output", LocationUsage::Internal, Some(view))?;
        let pack = locations.insert_location("Packing Zone", LocationUsage::Internal, Some(view))?;

        let prefix = |suffix: &str| format!("{}/{}/", create.code, suffix);
        let in_type = locations.insert_picking_type("Receipts", PickingTypeCode::Incoming, &prefix("IN"), None, None)?;
        let int_type = locations.insert_picking_type("Internal Transfers", PickingTypeCode::Internal, &prefix("INT"), None, None)?;
        let pick_type = locations.insert_picking_type("Pick", PickingTypeCode::Internal, &prefix("PICK"), None, None)?;
        let pack_type = locations.insert_picking_type("Pack", PickingTypeCode::Internal, &prefix("PACK"), None, None)?;
        let out_type = locations.insert_picking_type("Delivery Orders", PickingTypeCode::Outgoing, &prefix("OUT"), None, None)?;

        let now = Utc::now().naive_utc();
        let draft = Warehouse {
            id: 0,
            name: create.name.clone(),
            code: create.code.clone(),
            view_location_id: view,
            lot_stock_id: lot_stock,
            wh_input_stock_loc_id: input,
            wh_qc_stock_loc_id: qc,
            wh_output_stock_loc_id: output,
            wh_pack_stock_loc_id: pack,
            in_type_id: in_type,
            int_type_id: int_type,
            pick_type_id: pick_type,
            pack_type_id: pack_type,
            out_type_id: out_type,
            reception_steps: create.reception_steps,
            delivery_steps: create.delivery_steps,
            reception_route_id: None,
            delivery_route_id: None,
            mto_pull_id: None,
            mto_mts_management: create.mto_mts_management,
            mts_mto_rule_id: None,
            created_at: now,
            updated_at: now,
        };
        let id = repos.warehouse_repo.insert(&draft)?;
        let warehouse = repos.warehouse_repo.get(id)?;

        self.sync_picking_types(
            pipeline,
            &warehouse,
            warehouse.reception_steps,
            warehouse.delivery_steps,
            &partners,
        )?;

        let creation = pipeline.create_routes(&warehouse)?;
        if let Some(rule_id) = creation.mts_mto_rule_id {
            repos.warehouse_repo.set_mts_mto_rule(id, Some(rule_id))?;
        }

        info!(
            warehouse_id = id,
            code = %warehouse.code,
            mto_mts_management = warehouse.mto_mts_management,
            "仓库已创建"
        );
        Ok(repos.warehouse_repo.get(id)?)
    }

    /// 按步骤配置同步作业类型的默认库位与启用状态
    fn sync_picking_types(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        reception: ReceptionSteps,
        delivery: DeliverySteps,
        partners: &PartnerLocations,
    ) -> RoutingResult<()> {
        let locations = &pipeline.repos().location_repo;
        let wh = warehouse;

        let in_dest = match reception {
            ReceptionSteps::OneStep => wh.lot_stock_id,
            _ => wh.wh_input_stock_loc_id,
        };
        locations.update_picking_type_defaults(wh.in_type_id, Some(partners.supplier.id), Some(in_dest))?;

        locations.update_picking_type_defaults(wh.int_type_id, Some(wh.lot_stock_id), Some(wh.lot_stock_id))?;

        let pick_dest = match delivery {
            DeliverySteps::PickPackShip => wh.wh_pack_stock_loc_id,
            _ => wh.wh_output_stock_loc_id,
        };
        locations.update_picking_type_defaults(wh.pick_type_id, Some(wh.lot_stock_id), Some(pick_dest))?;
        locations.set_picking_type_active(wh.pick_type_id, delivery != DeliverySteps::ShipOnly)?;

        locations.update_picking_type_defaults(
            wh.pack_type_id,
            Some(wh.wh_pack_stock_loc_id),
            Some(wh.wh_output_stock_loc_id),
        )?;
        locations.set_picking_type_active(wh.pack_type_id, delivery == DeliverySteps::PickPackShip)?;

        let out_src = match delivery {
            DeliverySteps::ShipOnly => wh.lot_stock_id,
            _ => wh.wh_output_stock_loc_id,
        };
        locations.update_picking_type_defaults(wh.out_type_id, Some(out_src), Some(partners.customer.id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::domain::types::RuleAction;
    use crate::engine::repositories::StockRepositories;
    use std::sync::{Arc, Mutex};

    fn base_pipeline() -> RoutingPipeline {
        let conn = Arc::new(Mutex::new(crate::db::open_in_memory_connection().unwrap()));
        RoutingPipeline::new(StockRepositories::from_connection(conn), RoutingConfig::default())
    }

    fn active_rules(pipeline: &RoutingPipeline, route_id: i64) -> Vec<ProcurementRule> {
        pipeline
            .repos()
            .rule_repo
            .find_by_route(route_id, RuleVisibility::ActiveOnly)
            .unwrap()
    }

    #[test]
    fn test_create_warehouse_ship_only() {
        let pipeline = base_pipeline();
        let wh = pipeline
            .create_warehouse(&WarehouseCreate::new("Main", "WH"))
            .unwrap();

        let delivery_route = pipeline
            .repos()
            .route_repo
            .find_by_id(wh.delivery_route_id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(delivery_route.name, "Main: Ship Only");

        let pulls = active_rules(&pipeline, delivery_route.id);
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].name, "WH: Stock -> Customers");
        assert_eq!(pulls[0].procure_method, ProcureMethod::MakeToStock);
        assert_eq!(pulls[0].location_src_id, Some(wh.lot_stock_id));

        let mto = pipeline.repos().rule_repo.get(wh.mto_pull_id.unwrap()).unwrap();
        assert_eq!(mto.name, "WH: Stock -> Customers MTO");
        assert_eq!(mto.procure_method, ProcureMethod::MakeToOrder);
        assert_eq!(mto.picking_type_id, Some(wh.out_type_id));

        // 一步收货没有规则
        assert!(active_rules(&pipeline, wh.reception_route_id.unwrap()).is_empty());
        assert!(wh.mts_mto_rule_id.is_none());
    }

    #[test]
    fn test_three_step_reception_rules_are_mto() {
        let pipeline = base_pipeline();
        let wh = pipeline
            .create_warehouse(
                &WarehouseCreate::new("Main", "WH").with_reception_steps(ReceptionSteps::ThreeSteps),
            )
            .unwrap();
        let route_id = wh.reception_route_id.unwrap();
        let pulls = active_rules(&pipeline, route_id);
        assert_eq!(pulls.len(), 2);
        assert!(pulls.iter().all(|r| r.procure_method == ProcureMethod::MakeToOrder));
        assert_eq!(
            pipeline
                .repos()
                .push_rule_repo
                .find_by_route(route_id, RuleVisibility::ActiveOnly)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_change_route_reuses_deactivated_rules() {
        let pipeline = base_pipeline();
        let wh = pipeline
            .create_warehouse(&WarehouseCreate::new("Main", "WH"))
            .unwrap();
        let route_id = wh.delivery_route_id.unwrap();
        let original = active_rules(&pipeline, route_id)[0].id;

        pipeline
            .write(&[wh.id], &WarehouseUpdate::delivery_steps(DeliverySteps::PickPackShip))
            .unwrap();
        let wh = pipeline.repos().warehouse_repo.get(wh.id).unwrap();
        let pulls = active_rules(&pipeline, route_id);
        assert_eq!(pulls.len(), 3);
        assert!(pulls.iter().all(|r| r.action == RuleAction::Move));
        assert_eq!(pulls[0].procure_method, ProcureMethod::MakeToStock);
        assert!(!pipeline.repos().rule_repo.get(original).unwrap().active);

        // MTO 规则跟随第一步: 库存 -> 打包区
        let mto = pipeline.repos().rule_repo.get(wh.mto_pull_id.unwrap()).unwrap();
        assert_eq!(mto.location_id, wh.wh_pack_stock_loc_id);
        assert_eq!(mto.picking_type_id, Some(wh.pick_type_id));

        let pack_type = pipeline
            .repos()
            .location_repo
            .find_picking_type(wh.pack_type_id)
            .unwrap()
            .unwrap();
        assert!(pack_type.active);

        // 切回直接发货: 复用原规则而不是新建
        pipeline
            .write(&[wh.id], &WarehouseUpdate::delivery_steps(DeliverySteps::ShipOnly))
            .unwrap();
        let pulls = active_rules(&pipeline, route_id);
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].id, original);
        assert_eq!(
            pipeline
                .repos()
                .route_repo
                .find_by_id(route_id)
                .unwrap()
                .unwrap()
                .name,
            "Main: Ship Only"
        );
    }

    #[test]
    fn test_renaming_updates_routes_and_rules() {
        let pipeline = base_pipeline();
        let wh = pipeline
            .create_warehouse(&WarehouseCreate::new("Main", "WH"))
            .unwrap();
        pipeline
            .write(&[wh.id], &WarehouseUpdate::rename("Central", Some("CW".to_string())))
            .unwrap();

        let wh = pipeline.repos().warehouse_repo.get(wh.id).unwrap();
        assert_eq!(wh.name, "Central");
        assert_eq!(wh.code, "CW");

        let route = pipeline
            .repos()
            .route_repo
            .find_by_id(wh.delivery_route_id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(route.name, "Central: Ship Only");
        let pulls = active_rules(&pipeline, route.id);
        assert_eq!(pulls[0].name, "CW: Stock -> Customers");
        let mto = pipeline.repos().rule_repo.get(wh.mto_pull_id.unwrap()).unwrap();
        assert_eq!(mto.name, "CW: Stock -> Customers MTO");
        let view = pipeline
            .repos()
            .location_repo
            .get_location(wh.view_location_id)
            .unwrap();
        assert_eq!(view.name, "CW");
    }

    #[test]
    fn test_all_routes_include_mto_route() {
        let pipeline = base_pipeline();
        let wh = pipeline
            .create_warehouse(&WarehouseCreate::new("Main", "WH"))
            .unwrap();
        let routes = pipeline.get_all_routes_for_wh(&wh).unwrap();
        let mto_route = pipeline.base().mto_route(&pipeline).unwrap();
        assert_eq!(
            routes,
            vec![
                wh.reception_route_id.unwrap(),
                wh.delivery_route_id.unwrap(),
                mto_route.id
            ]
        );
    }

    #[test]
    fn test_missing_mto_route_is_configuration_error() {
        let pipeline = base_pipeline();
        pipeline
            .repos()
            .route_repo
            .unregister_xml_id(crate::db::XML_ID_MTO_ROUTE)
            .unwrap();
        let err = pipeline
            .create_warehouse(&WarehouseCreate::new("Main", "WH"))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
