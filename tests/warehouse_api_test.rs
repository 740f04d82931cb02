// ==========================================
// WarehouseApi 集成测试
// ==========================================
// 测试范围:
// 1. 数据库文件打开与重复初始化
// 2. config_kv 配置生效（后缀 / 排序 / 命名语言）
// 3. 收货 / 发货步骤切换后的路线与规则
// ==========================================


use stock_mts_mto_rule::config::{config_keys, ConfigManager};
use stock_mts_mto_rule::domain::types::{
    DeliverySteps, ProcureMethod, ReceptionSteps, RuleAction, RuleVisibility,
};
use stock_mts_mto_rule::domain::WarehouseCreate;
use stock_mts_mto_rule::{ApiError, WarehouseApi};
use test_helpers::{create_test_db, TestEnv};

// ==========================================
// 打开与配置
// ==========================================

#[test]
fn test_open_persists_across_reopen() {
    let (_temp_file, db_path) = create_test_db().expect("无法创建测试数据库");

    let wh_id = {
        let api = WarehouseApi::open(&db_path).expect("打开失败");
        api.create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
            .expect("创建失败")
            .id
    };

    // 重复初始化不重复写入基础数据
    let api = WarehouseApi::open(&db_path).expect("重新打开失败");
    let wh = api.get_warehouse(wh_id).expect("查询失败");
    assert_eq!(wh.code, "WH");
    assert!(wh.mts_mto_rule_id.is_some());
    assert_eq!(api.list_rule_history(wh_id).unwrap().len(), 1);
}

#[test]
fn test_stored_config_applies() {
    let (_temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    {
        let manager = ConfigManager::new(&db_path).expect("无法打开配置");
        manager
            .set_global_config_value(config_keys::MTS_MTO_RULE_SUFFIX, "Hybrid")
            .unwrap();
        manager
            .set_global_config_value(config_keys::CUSTOMER_SPLIT_SEQUENCE, "3")
            .unwrap();
    }

    let api = WarehouseApi::open(&db_path).expect("打开失败");
    let wh = api
        .create_warehouse(&WarehouseCreate::new("Main", "WH").with_mto_mts_management(true))
        .expect("创建失败");

    let rule = api.get_rule(wh.mts_mto_rule_id.unwrap()).unwrap();
    assert_eq!(rule.name, "Main: Hybrid");

    let split_leg = api
        .pipeline()
        .repos()
        .rule_repo
        .find_by_route(wh.delivery_route_id.unwrap(), RuleVisibility::ActiveOnly)
        .unwrap()
        .into_iter()
        .find(|r| r.action == RuleAction::SplitProcurement)
        .expect("应有客户库位拆分规则");
    assert_eq!(split_leg.sequence, 3);
}

#[test]
fn test_invalid_stored_config_is_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::DEFAULT_RULE_SEQUENCE, "twenty")
        .unwrap();

    assert!(matches!(
        WarehouseApi::open(&db_path),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_naming_locale_zh_cn() {
    let (_temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::NAMING_LOCALE, "zh-CN")
        .unwrap();

    let api = WarehouseApi::open(&db_path).expect("打开失败");
    let wh = api
        .create_warehouse(&WarehouseCreate::new("主仓", "ZC"))
        .expect("创建失败");
    let route = api
        .pipeline()
        .repos()
        .route_repo
        .find_by_id(wh.delivery_route_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(route.name, "主仓: 直接发货");

    let wh = api
        .change_steps(wh.id, None, Some(DeliverySteps::PickShip))
        .expect("切换失败");
    let route = api
        .pipeline()
        .repos()
        .route_repo
        .find_by_id(wh.delivery_route_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(route.name, "主仓: 拣货 + 发货");
}

// ==========================================
// 步骤切换
// ==========================================

#[test]
fn test_three_step_reception() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");
    let reception_route_id = wh.reception_route_id.unwrap();
    assert!(env.active_rules_on_route(reception_route_id).is_empty());

    let wh = env
        .api
        .change_steps(wh.id, Some(ReceptionSteps::ThreeSteps), None)
        .expect("切换失败");
    assert_eq!(wh.reception_steps, ReceptionSteps::ThreeSteps);

    let rules = env.active_rules_on_route(reception_route_id);
    assert_eq!(rules.len(), 2);
    assert!(rules
        .iter()
        .all(|r| r.procure_method == ProcureMethod::MakeToOrder));
    assert_eq!(rules[0].location_src_id, Some(wh.wh_input_stock_loc_id));
    assert_eq!(rules[1].location_id, wh.lot_stock_id);
    assert_eq!(rules[0].name, "WH: Input -> Quality Control");

    let route = env
        .repos()
        .route_repo
        .find_by_id(reception_route_id)
        .unwrap()
        .unwrap();
    assert_eq!(route.name, "Main: Receipt in 3 steps");

    // 切回一步收货: 规则停用不删除
    env.api
        .change_steps(wh.id, Some(ReceptionSteps::OneStep), None)
        .expect("切换失败");
    assert!(env.active_rules_on_route(reception_route_id).is_empty());
    assert_eq!(
        env.repos()
            .rule_repo
            .find_by_route(reception_route_id, RuleVisibility::IncludeInactive)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_rename_updates_code_in_rule_names() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");

    let wh = env
        .api
        .rename_warehouse(wh.id, "Central", Some("CW"))
        .expect("改名失败");
    assert_eq!(wh.code, "CW");

    let mto = env.api.get_rule(wh.mto_pull_id.unwrap()).unwrap();
    assert_eq!(mto.name, "CW: Stock -> Customers MTO");

    let delivery = env.active_rules_on_route(wh.delivery_route_id.unwrap());
    assert_eq!(delivery[0].name, "CW: Stock -> Customers");
}

#[test]
fn test_write_rejects_empty_update() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let wh = env
        .api
        .create_warehouse(&WarehouseCreate::new("Main", "WH"))
        .expect("创建失败");

    let err = env
        .api
        .write_warehouses(&[wh.id], &Default::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = env.api.rename_warehouse(wh.id, "", None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_batch_write_toggles_every_warehouse() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let a = env
        .api
        .create_warehouse(&WarehouseCreate::new("Alpha", "A"))
        .unwrap();
    let b = env
        .api
        .create_warehouse(&WarehouseCreate::new("Beta", "B").with_delivery_steps(DeliverySteps::PickPackShip))
        .unwrap();

    env.api
        .write_warehouses(
            &[a.id, b.id],
            &stock_mts_mto_rule::WarehouseUpdate::mto_mts_management(true),
        )
        .expect("批量开启失败");

    for id in [a.id, b.id] {
        let wh = env.api.get_warehouse(id).unwrap();
        let rule = env.api.get_rule(wh.mts_mto_rule_id.expect("应有规则")).unwrap();
        assert_eq!(rule.warehouse_id, id);
        assert!(rule.active);
    }

    let beta = env.api.get_warehouse(b.id).unwrap();
    let rule = env.api.get_rule(beta.mts_mto_rule_id.unwrap()).unwrap();
    assert_eq!(rule.location_id, beta.wh_pack_stock_loc_id);
    assert_eq!(rule.picking_type_id, Some(beta.pick_type_id));
}
