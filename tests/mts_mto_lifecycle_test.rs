// ==========================================
// MTS+MTO 拆分补货规则生命周期集成测试
// ==========================================
// 测试范围:
// 1. 开关打开 / 关闭 / 再打开: 创建、停用、复用同一记录
// 2. 发货步骤切换: 规则库位与 MTS 规则同步
// 3. 仓库改名: 规则名称首个匹配替换
// 4. 路线列表: MTS+MTO 路线按开关出现
// 5. 前置条件缺失: 配置警告 + 事务回滚
// ==========================================


use stock_mts_mto_rule::config::RoutingConfig;
use stock_mts_mto_rule::domain::types::{
    DeliverySteps, LifecycleEvent, ProcureMethod, RuleAction, RuleOrder, RuleVisibility,
};
use stock_mts_mto_rule::domain::{RuleSearch, WarehouseCreate};
use stock_mts_mto_rule::ApiError;
use test_helpers::TestEnv;

fn events(env: &TestEnv, warehouse_id: i64) -> Vec<LifecycleEvent> {
    env.api
        .list_rule_history(warehouse_id)
        .expect("查询日志失败")
        .into_iter()
        .map(|log| log.event)
        .collect()
}

// ==========================================
// 规则存在性
// ==========================================

#[test]
fn test_rule_exists_only_when_flag_set() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let plain = env
        .api
        .create_warehouse(&WarehouseCreate::new("Plain", "PL"))
        .expect("创建失败");
    assert!(!plain.mto_mts_management);
    assert_eq!(plain.mts_mto_rule_id, None);
    assert!(env.split_rules(plain.id).is_empty());

    let hybrid = env
        .api
        .create_warehouse(&WarehouseCreate::new("Hybrid", "HY").with_mto_mts_management(true))
        .expect("创建失败");
    assert!(hybrid.mto_mts_management);
    let rule_id = hybrid.mts_mto_rule_id.expect("应生成拆分补货规则");

    let rule = env.api.get_rule(rule_id).expect("查询失败");
    assert!(rule.active);
    assert_eq!(rule.action, RuleAction::SplitProcurement);
    assert_eq!(rule.name, "Hybrid: MTS+MTO");
    assert_eq!(rule.route_id, Some(env.mts_mto_route_id()));
    assert_eq!(rule.mto_rule_id, hybrid.mto_pull_id);
    assert_eq!(rule.warehouse_id, hybrid.id);
    assert_eq!(rule.location_id, env.customer_location_id());
    assert_eq!(rule.location_src_id, None);
    assert_eq!(rule.picking_type_id, Some(hybrid.out_type_id));

    // MTS 规则: 发货路线上以库存库位为来源的规则
    let mts = env
        .api
        .get_rule(rule.mts_rule_id.expect("应有 MTS 规则"))
        .expect("查询失败");
    assert_eq!(mts.route_id, hybrid.delivery_route_id);
    assert_eq!(mts.location_src_id, Some(hybrid.lot_stock_id));
    assert_eq!(mts.action, RuleAction::Move);

    assert_eq!(events(&env, hybrid.id), vec![LifecycleEvent::Created]);
}

#[test]
fn test_enable_on_existing_warehouse() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");

    let wh = env.api.set_mto_mts_management(wh.id, true).expect("开启失败");
    assert!(wh.mto_mts_management);
    let rule_id = wh.mts_mto_rule_id.expect("应生成拆分补货规则");
    assert!(env.api.get_rule(rule_id).unwrap().active);
    assert_eq!(env.split_rules(wh.id).iter().filter(|r| r.id == rule_id).count(), 1);

    assert_eq!(
        events(&env, wh.id),
        vec![LifecycleEvent::Created, LifecycleEvent::Resynced]
    );
}

// ==========================================
// 停用与复用
// ==========================================

#[test]
fn test_toggle_off_on_reuses_same_rule() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let rule_id = wh.mts_mto_rule_id.expect("应生成拆分补货规则");
    let split_count = env.split_rules(wh.id).len();

    let wh = env.api.set_mto_mts_management(wh.id, false).expect("关闭失败");
    assert!(!wh.mto_mts_management);
    assert_eq!(wh.mts_mto_rule_id, None);

    // 只停用不删除，按停用优先排序可以找到
    let rule = env.api.get_rule(rule_id).expect("规则应保留");
    assert!(!rule.active);
    let inactive_first = env
        .repos()
        .rule_repo
        .search(
            &RuleSearch {
                route_id: Some(env.mts_mto_route_id()),
                ..Default::default()
            }
            .with_visibility(RuleVisibility::IncludeInactive)
            .with_order(RuleOrder::InactiveFirst),
        )
        .expect("查询失败");
    assert_eq!(inactive_first.first().map(|r| r.id), Some(rule_id));
    assert!(env
        .repos()
        .rule_repo
        .search(&RuleSearch {
            route_id: Some(env.mts_mto_route_id()),
            ..Default::default()
        })
        .expect("查询失败")
        .is_empty());

    let wh = env.api.set_mto_mts_management(wh.id, true).expect("开启失败");
    assert_eq!(wh.mts_mto_rule_id, Some(rule_id));
    assert!(env.api.get_rule(rule_id).unwrap().active);
    assert_eq!(env.split_rules(wh.id).len(), split_count);

    assert_eq!(
        events(&env, wh.id),
        vec![
            LifecycleEvent::Created,
            LifecycleEvent::Deactivated,
            LifecycleEvent::Reactivated,
            LifecycleEvent::Resynced,
        ]
    );
}

#[test]
fn test_disable_without_rule_is_noop() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");

    let wh = env.api.set_mto_mts_management(wh.id, false).expect("关闭失败");
    assert_eq!(wh.mts_mto_rule_id, None);
    assert!(events(&env, wh.id).is_empty());
}

// ==========================================
// 客户库位一侧
// ==========================================

#[test]
fn test_customer_leg_becomes_split() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let delivery_route_id = wh.delivery_route_id.expect("应有发货路线");
    let customer_id = env.customer_location_id();

    let rules = env.active_rules_on_route(delivery_route_id);
    let split: Vec<_> = rules
        .iter()
        .filter(|r| r.action == RuleAction::SplitProcurement)
        .collect();
    assert_eq!(split.len(), 1);
    let split = split[0];
    assert_eq!(split.location_id, customer_id);
    assert_eq!(split.sequence, 10);
    assert_eq!(split.mto_rule_id, split.mts_rule_id);

    let copy = env
        .api
        .get_rule(split.mto_rule_id.expect("应指向副本"))
        .expect("查询失败");
    assert_eq!(copy.action, RuleAction::Move);
    assert_eq!(copy.location_id, customer_id);
    assert_eq!(copy.route_id, Some(delivery_route_id));
    assert_eq!(copy.procure_method, ProcureMethod::MakeToStock);
    assert!(copy.active);
}

#[test]
fn test_customer_leg_reverts_when_disabled() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let delivery_route_id = wh.delivery_route_id.expect("应有发货路线");

    env.api.set_mto_mts_management(wh.id, false).expect("关闭失败");

    let rules = env.active_rules_on_route(delivery_route_id);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].action, RuleAction::Move);
    assert_eq!(rules[0].location_src_id, Some(wh.lot_stock_id));
}

// ==========================================
// 发货步骤切换
// ==========================================

#[test]
fn test_delivery_step_change_resyncs_rule() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let rule_id = wh.mts_mto_rule_id.expect("应生成拆分补货规则");
    let before = env.api.get_rule(rule_id).unwrap();
    assert_eq!(before.location_id, env.customer_location_id());

    let wh = env
        .api
        .change_steps(wh.id, None, Some(DeliverySteps::PickShip))
        .expect("切换失败");
    assert!(wh.mto_mts_management);
    assert_eq!(wh.mts_mto_rule_id, Some(rule_id));

    let rule = env.api.get_rule(rule_id).unwrap();
    let mto = env.api.get_rule(wh.mto_pull_id.expect("应有 MTO 规则")).unwrap();
    assert_eq!(rule.location_id, mto.location_id);
    assert_eq!(rule.location_id, wh.wh_output_stock_loc_id);

    let mts_candidates = env
        .repos()
        .rule_repo
        .search(&RuleSearch::by_source_and_route(
            wh.lot_stock_id,
            wh.delivery_route_id.unwrap(),
        ))
        .unwrap();
    let mts = mts_candidates.first().expect("应有 MTS 规则");
    assert_eq!(mts.location_id, wh.wh_output_stock_loc_id);
    assert_eq!(rule.mts_rule_id, Some(mts.id));
    assert_ne!(rule.mts_rule_id, before.mts_rule_id);

    // 不产生重复的拆分补货规则
    let on_route: Vec<_> = env
        .split_rules(wh.id)
        .into_iter()
        .filter(|r| r.route_id == Some(env.mts_mto_route_id()))
        .collect();
    assert_eq!(on_route.len(), 1);

    assert_eq!(events(&env, wh.id).last(), Some(&LifecycleEvent::Resynced));
}

#[test]
fn test_step_change_and_back_restores_rule() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let rule_id = wh.mts_mto_rule_id.unwrap();
    let before = env.api.get_rule(rule_id).unwrap();

    env.api
        .change_steps(wh.id, None, Some(DeliverySteps::PickPackShip))
        .expect("切换失败");
    env.api
        .change_steps(wh.id, None, Some(DeliverySteps::ShipOnly))
        .expect("切换失败");

    let after = env.api.get_rule(rule_id).unwrap();
    assert_eq!(after.location_id, before.location_id);
    assert_eq!(after.mts_rule_id, before.mts_rule_id);
}

// ==========================================
// 改名
// ==========================================

#[test]
fn test_rename_replaces_first_occurrence() {
    let config = RoutingConfig {
        mts_mto_rule_suffix: "WH1 hybrid".to_string(),
        ..Default::default()
    };
    let env = TestEnv::with_config(config).expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("WH1", "W1").with_mto_mts_management(true))
        .expect("创建失败");
    let rule_id = wh.mts_mto_rule_id.unwrap();
    assert_eq!(env.api.get_rule(rule_id).unwrap().name, "WH1: WH1 hybrid");

    let wh = env.api.rename_warehouse(wh.id, "WH2", None).expect("改名失败");
    assert_eq!(wh.name, "WH2");
    assert_eq!(wh.code, "W1");
    assert_eq!(env.api.get_rule(rule_id).unwrap().name, "WH2: WH1 hybrid");
    assert_eq!(events(&env, wh.id).last(), Some(&LifecycleEvent::Renamed));
}

#[test]
fn test_rename_disconnected_rule() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");
    let rule_id = wh.mts_mto_rule_id.unwrap();
    env.api.set_mto_mts_management(wh.id, false).expect("关闭失败");

    env.api
        .rename_warehouse(wh.id, "Central", Some("CW"))
        .expect("改名失败");

    let rule = env.api.get_rule(rule_id).unwrap();
    assert_eq!(rule.name, "Central: MTS+MTO");
    assert!(!rule.active);

    let wh = env.api.set_mto_mts_management(wh.id, true).expect("开启失败");
    assert_eq!(wh.mts_mto_rule_id, Some(rule_id));
}

#[test]
fn test_rename_without_rule_is_tolerated() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");
    env.repos().warehouse_repo.set_mto_pull(wh.id, None).unwrap();

    let wh = env.api.rename_warehouse(wh.id, "Other", None).expect("改名失败");
    assert_eq!(wh.name, "Other");
}

// ==========================================
// 路线列表
// ==========================================

#[test]
fn test_routes_for_warehouse_follow_flag() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mts_mto_route = env.mts_mto_route_id();
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");

    let routes = env.api.list_routes_for_warehouse(wh.id).unwrap();
    assert!(routes.contains(&env.mto_route_id()));
    assert!(routes.contains(&wh.reception_route_id.unwrap()));
    assert!(routes.contains(&wh.delivery_route_id.unwrap()));
    assert!(!routes.contains(&mts_mto_route));

    env.api.set_mto_mts_management(wh.id, true).unwrap();
    let routes = env.api.list_routes_for_warehouse(wh.id).unwrap();
    assert_eq!(routes.iter().filter(|&&id| id == mts_mto_route).count(), 1);

    env.api.set_mto_mts_management(wh.id, false).unwrap();
    let routes = env.api.list_routes_for_warehouse(wh.id).unwrap();
    assert!(!routes.contains(&mts_mto_route));
}

// ==========================================
// 路线解析
// ==========================================

#[test]
fn test_route_falls_back_to_name() {
    let config = RoutingConfig {
        mts_mto_route_xml_id: "missing.route_mto_mts".to_string(),
        ..Default::default()
    };
    let env = TestEnv::with_config(config).expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");

    let rule = env.api.get_rule(wh.mts_mto_rule_id.unwrap()).unwrap();
    assert_eq!(rule.route_id, Some(env.mts_mto_route_id()));
}

#[test]
fn test_missing_route_rolls_back_creation() {
    let config = RoutingConfig {
        mts_mto_route_xml_id: "missing.route_mto_mts".to_string(),
        mts_mto_route_name: "No Such Route".to_string(),
        ..Default::default()
    };
    let env = TestEnv::with_config(config).expect("无法创建测试环境");
    let locations_before = env.count("stock_location");

    let err = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .unwrap_err();
    assert!(err.is_warning(), "应为配置警告: {}", err);
    assert!(err.to_string().contains("MTS+MTO route"));

    assert_eq!(env.count("stock_warehouse"), 0);
    assert_eq!(env.count("procurement_rule"), 0);
    assert_eq!(env.count("stock_location"), locations_before);
}

// ==========================================
// 前置条件缺失
// ==========================================

#[test]
fn test_enable_without_mto_rule_warns_and_rolls_back() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");
    env.repos().warehouse_repo.set_mto_pull(wh.id, None).unwrap();
    let rules_before = env.count("procurement_rule");

    let err = env.api.set_mto_mts_management(wh.id, true).unwrap_err();
    assert!(matches!(err, ApiError::ConfigurationWarning(ref msg) if msg.contains("MTO Rule")));

    let wh = env.api.get_warehouse(wh.id).unwrap();
    assert!(!wh.mto_mts_management);
    assert_eq!(wh.mts_mto_rule_id, None);
    assert_eq!(env.count("procurement_rule"), rules_before);
    assert!(events(&env, wh.id).is_empty());
}
