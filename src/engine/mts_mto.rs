// ==========================================
// 仓库 MTO+MTS 补货规则 - MTS+MTO 扩展
// ==========================================
// 职责: 维护每个仓库唯一的拆分补货规则 (SPLIT_PROCUREMENT)
//   - 开关打开: 查找或创建，复用停用记录
//   - 开关关闭: 停用并断开引用，不删除
//   - 发货步骤变化: 同步库位与 MTS 规则引用
//   - 仓库改名: 同步规则名称
// 约束: 规则定义依赖基础阶段已更新的库位 / 路线，只能在基础阶段之后计算
// 约束: 查询可见性显式给出，不依赖隐式上下文
// ==========================================
// 状态:
//   (无规则) --开启--> ACTIVE --关闭--> INACTIVE (断开)
//                        ^                 |
//                        +------开启-------+  (复用同一条记录)
// ==========================================

use crate::domain::lifecycle_log::RuleLifecycleLog;
use crate::domain::route::Route;
use crate::domain::rule::{ProcurementRule, PushPullRules, RuleSearch, RuleValues};
use crate::domain::types::{LifecycleEvent, ProcureMethod, RuleAction, RuleOrder, RuleVisibility};
use crate::domain::warehouse::{Warehouse, WarehouseUpdate};
use crate::engine::error::{RoutingError, RoutingResult};
use crate::engine::pipeline::{RouteChange, RouteCreation, RoutingPipeline, WarehouseExtension};
use crate::i18n;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct MtsMtoExtension;

impl MtsMtoExtension {
    pub fn new() -> Self {
        Self
    }

    /// 通用 MTS+MTO 路线: 先按稳定标识，再按名称（取 id 最小者）
    pub fn resolve_mts_mto_route(&self, pipeline: &RoutingPipeline) -> RoutingResult<Route> {
        let routes = &pipeline.repos().route_repo;
        let config = pipeline.config();

        if let Some(route) = routes.find_by_xml_id(&config.mts_mto_route_xml_id)? {
            return Ok(route);
        }
        debug!(
            xml_id = %config.mts_mto_route_xml_id,
            "MTS+MTO 路线稳定标识无效，按名称查找"
        );
        routes
            .search_by_name_like(&config.mts_mto_route_name)?
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::configuration(i18n::t("errors.mts_mto_route_missing")))
    }

    /// 仓库的 MTS 规则: 发货路线上以库存库位为来源的规则
    ///
    /// 仅查启用记录；排序让停用记录在前，多条候选时取第一条。
    /// 在 ActiveOnly 下该排序等价于按 id 升序。
    pub fn resolve_mts_rule(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
    ) -> RoutingResult<ProcurementRule> {
        let missing = || RoutingError::configuration(i18n::t("errors.mts_rule_missing"));
        let delivery_route_id = warehouse.delivery_route_id.ok_or_else(missing)?;

        let search = RuleSearch::by_source_and_route(warehouse.lot_stock_id, delivery_route_id)
            .with_visibility(RuleVisibility::ActiveOnly)
            .with_order(RuleOrder::InactiveFirst);
        pipeline
            .repos()
            .rule_repo
            .search(&search)?
            .into_iter()
            .next()
            .ok_or_else(missing)
    }

    fn mto_rule(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
    ) -> RoutingResult<ProcurementRule> {
        let rule = match warehouse.mto_pull_id {
            Some(id) => pipeline.repos().rule_repo.find_by_id(id)?,
            None => None,
        };
        rule.ok_or_else(|| RoutingError::configuration(i18n::t("errors.mto_rule_missing")))
    }

    /// 计算仓库期望的拆分补货规则定义（不落库）
    ///
    /// # 错误
    /// - ConfigurationError: MTS+MTO 路线、MTO 规则或 MTS 规则缺失
    pub fn mts_mto_rule_values(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
    ) -> RoutingResult<RuleValues> {
        let route = self.resolve_mts_mto_route(pipeline)?;
        let mto_rule = self.mto_rule(pipeline, warehouse)?;
        let mts_rule = self.resolve_mts_rule(pipeline, warehouse)?;

        Ok(RuleValues {
            name: pipeline
                .base()
                .format_routename(warehouse, &pipeline.config().rule_suffix()),
            route_id: Some(route.id),
            action: RuleAction::SplitProcurement,
            location_id: mto_rule.location_id,
            location_src_id: None,
            picking_type_id: mto_rule.picking_type_id,
            warehouse_id: warehouse.id,
            procure_method: ProcureMethod::MakeToStock,
            mto_rule_id: Some(mto_rule.id),
            mts_rule_id: Some(mts_rule.id),
            sequence: pipeline.config().default_rule_sequence,
            active: true,
        })
    }

    /// 按开关状态创建 / 复用 / 停用拆分补货规则
    ///
    /// 必须在基础阶段更新完库位与路线之后调用，否则无法匹配到停用的旧规则
    pub fn create_mts_mto_rule(
        &self,
        pipeline: &RoutingPipeline,
        warehouse_ids: &[i64],
        enabled: bool,
    ) -> RoutingResult<()> {
        let repos = pipeline.repos();

        for &id in warehouse_ids {
            let warehouse = repos.warehouse_repo.get(id)?;

            if enabled {
                if warehouse.mts_mto_rule_id.is_some() {
                    continue;
                }
                let values = self.mts_mto_rule_values(pipeline, &warehouse)?;
                let upsert = pipeline.base().create_reactivate_rule(pipeline, &values)?;
                repos.warehouse_repo.set_mts_mto_rule(id, Some(upsert.rule.id))?;

                let event = if upsert.reused {
                    LifecycleEvent::Reactivated
                } else {
                    LifecycleEvent::Created
                };
                info!(warehouse_id = id, rule_id = upsert.rule.id, %event, "拆分补货规则已启用");
                self.record(
                    pipeline,
                    id,
                    Some(upsert.rule.id),
                    event,
                    json!({
                        "name": upsert.rule.name,
                        "mto_rule_id": upsert.rule.mto_rule_id,
                        "mts_rule_id": upsert.rule.mts_rule_id,
                    }),
                )?;
            } else if let Some(rule_id) = warehouse.mts_mto_rule_id {
                // 停用并断开: 保留记录以便重新开启时复用
                repos.rule_repo.set_active(rule_id, false)?;
                repos.warehouse_repo.set_mts_mto_rule(id, None)?;

                info!(warehouse_id = id, rule_id, "拆分补货规则已停用");
                self.record(pipeline, id, Some(rule_id), LifecycleEvent::Deactivated, json!({}))?;
            }
        }
        Ok(())
    }

    fn record(
        &self,
        pipeline: &RoutingPipeline,
        warehouse_id: i64,
        rule_id: Option<i64>,
        event: LifecycleEvent,
        payload: JsonValue,
    ) -> RoutingResult<()> {
        pipeline
            .repos()
            .lifecycle_log_repo
            .insert(&RuleLifecycleLog::new(warehouse_id, rule_id, event, Some(payload)))?;
        Ok(())
    }
}

impl WarehouseExtension for MtsMtoExtension {
    fn name(&self) -> &str {
        "mts_mto"
    }

    fn after_create_routes(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        creation: &mut RouteCreation,
    ) -> RoutingResult<()> {
        if !warehouse.mto_mts_management {
            return Ok(());
        }
        // 基础阶段已写入路线引用与 MTO 规则
        let current = pipeline.repos().warehouse_repo.get(warehouse.id)?;
        let values = self.mts_mto_rule_values(pipeline, &current)?;
        let rule_id = pipeline.repos().rule_repo.insert(&values)?;
        creation.mts_mto_rule_id = Some(rule_id);

        info!(warehouse_id = warehouse.id, rule_id, "拆分补货规则已创建");
        self.record(
            pipeline,
            warehouse.id,
            Some(rule_id),
            LifecycleEvent::Created,
            json!({
                "name": values.name,
                "mto_rule_id": values.mto_rule_id,
                "mts_rule_id": values.mts_rule_id,
            }),
        )
    }

    /// 客户库位一侧: 原规则复制为普通规则，原定义改为拆分补货并指向该副本
    fn after_push_pull_rules(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        _active: bool,
        rules: &mut PushPullRules,
    ) -> RoutingResult<()> {
        if !warehouse.mto_mts_management {
            return Ok(());
        }
        let customer = pipeline.base().partner_locations(pipeline)?.customer;

        for pull in rules
            .pull_rules
            .iter_mut()
            .filter(|p| p.location_id == customer.id)
        {
            let copy = pull.clone();
            let upsert = pipeline.base().create_reactivate_rule(pipeline, &copy)?;

            pull.action = RuleAction::SplitProcurement;
            pull.mto_rule_id = Some(upsert.rule.id);
            pull.mts_rule_id = Some(upsert.rule.id);
            pull.sequence = pipeline.config().customer_split_sequence;

            debug!(
                warehouse_id = warehouse.id,
                rule_id = upsert.rule.id,
                reused = upsert.reused,
                "客户库位规则改为拆分补货: {}",
                pull.name
            );
        }
        Ok(())
    }

    fn after_write(
        &self,
        pipeline: &RoutingPipeline,
        warehouse_ids: &[i64],
        update: &WarehouseUpdate,
    ) -> RoutingResult<()> {
        let Some(enabled) = update.mto_mts_management else {
            return Ok(());
        };

        self.create_mts_mto_rule(pipeline, warehouse_ids, enabled)?;

        // 以新的开关值重新生成发货路线，使客户库位一侧规则同步
        for &id in warehouse_ids {
            let warehouse = pipeline.repos().warehouse_repo.get(id)?;
            pipeline.change_route(&warehouse, None, Some(warehouse.delivery_steps))?;
        }
        Ok(())
    }

    fn after_all_routes(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        route_ids: &mut Vec<i64>,
    ) -> RoutingResult<()> {
        if !warehouse.mto_mts_management {
            return Ok(());
        }
        let Some(rule_id) = warehouse.mts_mto_rule_id else {
            return Ok(());
        };
        if let Some(route_id) = pipeline
            .repos()
            .rule_repo
            .find_by_id(rule_id)?
            .and_then(|rule| rule.route_id)
        {
            route_ids.push(route_id);
        }
        Ok(())
    }

    /// 已断开的停用规则按定义查找；前置条件缺失时跳过
    fn after_handle_renaming(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        name: &str,
        _code: &str,
    ) -> RoutingResult<()> {
        let rules = &pipeline.repos().rule_repo;

        let rule = match warehouse.mts_mto_rule_id {
            Some(rule_id) => rules.find_by_id(rule_id)?,
            None => match self.mts_mto_rule_values(pipeline, warehouse) {
                Ok(values) => pipeline.base().find_existing_rule(pipeline, &values)?,
                Err(err) if err.is_configuration() => {
                    debug!(warehouse_id = warehouse.id, "跳过拆分补货规则改名: {}", err);
                    None
                }
                Err(err) => return Err(err),
            },
        };

        let Some(rule) = rule else {
            return Ok(());
        };
        let new_name = rule.name.replacen(&warehouse.name, name, 1);
        if new_name == rule.name {
            return Ok(());
        }
        rules.update_name(rule.id, &new_name)?;

        info!(warehouse_id = warehouse.id, rule_id = rule.id, "拆分补货规则已改名: {}", new_name);
        self.record(
            pipeline,
            warehouse.id,
            Some(rule.id),
            LifecycleEvent::Renamed,
            json!({ "from": rule.name, "to": new_name }),
        )
    }

    /// 发货步骤变化后同步库位与 MTS 规则引用
    fn after_change_route(
        &self,
        pipeline: &RoutingPipeline,
        warehouse: &Warehouse,
        change: &RouteChange,
    ) -> RoutingResult<()> {
        if change.new_delivery_step.is_none() {
            return Ok(());
        }
        let current = pipeline.repos().warehouse_repo.get(warehouse.id)?;
        let Some(rule_id) = current.mts_mto_rule_id else {
            return Ok(());
        };

        let rules = &pipeline.repos().rule_repo;
        let mto_rule = self.mto_rule(pipeline, &current)?;
        rules.update_location(rule_id, mto_rule.location_id)?;
        let mts_rule = self.resolve_mts_rule(pipeline, &current)?;
        rules.update_mts_rule(rule_id, mts_rule.id)?;

        debug!(
            warehouse_id = current.id,
            rule_id,
            location_id = mto_rule.location_id,
            mts_rule_id = mts_rule.id,
            "拆分补货规则已同步"
        );
        self.record(
            pipeline,
            current.id,
            Some(rule_id),
            LifecycleEvent::Resynced,
            json!({
                "delivery_steps": change.new_delivery_step,
                "location_id": mto_rule.location_id,
                "mts_rule_id": mts_rule.id,
            }),
        )
    }
}
