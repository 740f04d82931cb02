// ==========================================
// 仓库 MTO+MTS 补货规则 - 补货规则领域模型
// ==========================================
// 对齐: v0.1_schema.sql procurement_rule / stock_location_path 表
// 红线: 规则只停用不删除 (active = false)，以便后续复用
// ==========================================

use crate::domain::types::{ProcureMethod, PushAuto, RuleAction, RuleOrder, RuleVisibility};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 新建规则的默认优先级
pub const DEFAULT_RULE_SEQUENCE: i32 = 20;

// ==========================================
// ProcurementRule - 已持久化的拉式规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementRule {
    pub id: i64,
    pub name: String,
    pub route_id: Option<i64>,
    pub action: RuleAction,
    pub location_id: i64,             // 目标库位
    pub location_src_id: Option<i64>, // 来源库位
    pub picking_type_id: Option<i64>,
    pub warehouse_id: i64,
    pub procure_method: ProcureMethod,
    pub mto_rule_id: Option<i64>, // 仅拆分补货规则使用
    pub mts_rule_id: Option<i64>, // 仅拆分补货规则使用
    pub sequence: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProcurementRule {
    /// 取出规则定义 (用于复制)
    pub fn to_values(&self) -> RuleValues {
        RuleValues {
            name: self.name.clone(),
            route_id: self.route_id,
            action: self.action,
            location_id: self.location_id,
            location_src_id: self.location_src_id,
            picking_type_id: self.picking_type_id,
            warehouse_id: self.warehouse_id,
            procure_method: self.procure_method,
            mto_rule_id: self.mto_rule_id,
            mts_rule_id: self.mts_rule_id,
            sequence: self.sequence,
            active: self.active,
        }
    }

    pub fn is_split_procurement(&self) -> bool {
        self.action == RuleAction::SplitProcurement
    }
}

// ==========================================
// RuleValues - 规则定义 (未持久化)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleValues {
    pub name: String,
    pub route_id: Option<i64>,
    pub action: RuleAction,
    pub location_id: i64,
    pub location_src_id: Option<i64>,
    pub picking_type_id: Option<i64>,
    pub warehouse_id: i64,
    pub procure_method: ProcureMethod,
    pub mto_rule_id: Option<i64>,
    pub mts_rule_id: Option<i64>,
    pub sequence: i32,
    pub active: bool,
}

impl RuleValues {
    /// 普通移库规则定义
    pub fn move_rule(
        name: impl Into<String>,
        route_id: i64,
        location_src_id: i64,
        location_id: i64,
        picking_type_id: i64,
        warehouse_id: i64,
        procure_method: ProcureMethod,
    ) -> Self {
        Self {
            name: name.into(),
            route_id: Some(route_id),
            action: RuleAction::Move,
            location_id,
            location_src_id: Some(location_src_id),
            picking_type_id: Some(picking_type_id),
            warehouse_id,
            procure_method,
            mto_rule_id: None,
            mts_rule_id: None,
            sequence: DEFAULT_RULE_SEQUENCE,
            active: true,
        }
    }
}

// ==========================================
// RuleSearch - 规则查询条件
// ==========================================
// 可见性与排序显式给出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSearch {
    pub location_src_id: Option<i64>,
    pub route_id: Option<i64>,
    pub visibility: RuleVisibility,
    pub order: RuleOrder,
}

impl RuleSearch {
    /// 按 (来源库位, 路线) 查询
    pub fn by_source_and_route(location_src_id: i64, route_id: i64) -> Self {
        Self {
            location_src_id: Some(location_src_id),
            route_id: Some(route_id),
            ..Default::default()
        }
    }

    pub fn with_visibility(mut self, visibility: RuleVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_order(mut self, order: RuleOrder) -> Self {
        self.order = order;
        self
    }
}

// ==========================================
// PushRule - 推式规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRule {
    pub id: i64,
    pub name: String,
    pub route_id: i64,
    pub location_from_id: i64,
    pub location_dest_id: i64,
    pub picking_type_id: Option<i64>,
    pub auto: PushAuto,
    pub warehouse_id: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRuleValues {
    pub name: String,
    pub route_id: i64,
    pub location_from_id: i64,
    pub location_dest_id: i64,
    pub picking_type_id: Option<i64>,
    pub auto: PushAuto,
    pub warehouse_id: i64,
    pub active: bool,
}

/// 一次路线计算产出的推 / 拉规则定义
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPullRules {
    pub push_rules: Vec<PushRuleValues>,
    pub pull_rules: Vec<RuleValues>,
}

/// create_reactivate 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct RuleUpsert {
    pub rule: ProcurementRule,
    /// true: 复用了已有记录 (含重新启用)
    pub reused: bool,
}
