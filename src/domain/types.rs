// ==========================================
// 仓库 MTO+MTS 补货规则 - 领域类型定义
// ==========================================
// 存储约定: 枚举在数据库中以 SCREAMING_SNAKE_CASE 字符串保存
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 收货步骤 (Reception Steps)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceptionSteps {
    OneStep,    // 直接入库
    TwoSteps,   // 收货区 -> 库存
    ThreeSteps, // 收货区 -> 质检 -> 库存
}

impl ReceptionSteps {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReceptionSteps::OneStep => "ONE_STEP",
            ReceptionSteps::TwoSteps => "TWO_STEPS",
            ReceptionSteps::ThreeSteps => "THREE_STEPS",
        }
    }

    /// 从数据库字符串解析，未知值回落为 OneStep
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "TWO_STEPS" => ReceptionSteps::TwoSteps,
            "THREE_STEPS" => ReceptionSteps::ThreeSteps,
            _ => ReceptionSteps::OneStep,
        }
    }

    /// 路线名称的 i18n key
    pub fn label_key(&self) -> &'static str {
        match self {
            ReceptionSteps::OneStep => "route.one_step",
            ReceptionSteps::TwoSteps => "route.two_steps",
            ReceptionSteps::ThreeSteps => "route.three_steps",
        }
    }
}

impl fmt::Display for ReceptionSteps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 发货步骤 (Delivery Steps)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverySteps {
    ShipOnly,     // 库存 -> 客户
    PickShip,     // 库存 -> 出库区 -> 客户
    PickPackShip, // 库存 -> 打包区 -> 出库区 -> 客户
}

impl DeliverySteps {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DeliverySteps::ShipOnly => "SHIP_ONLY",
            DeliverySteps::PickShip => "PICK_SHIP",
            DeliverySteps::PickPackShip => "PICK_PACK_SHIP",
        }
    }

    /// 从数据库字符串解析，未知值回落为 ShipOnly
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "PICK_SHIP" => DeliverySteps::PickShip,
            "PICK_PACK_SHIP" => DeliverySteps::PickPackShip,
            _ => DeliverySteps::ShipOnly,
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            DeliverySteps::ShipOnly => "route.ship_only",
            DeliverySteps::PickShip => "route.pick_ship",
            DeliverySteps::PickPackShip => "route.pick_pack_ship",
        }
    }
}

impl fmt::Display for DeliverySteps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 规则动作 (Rule Action)
// ==========================================
// SplitProcurement: 运行时按可用库存在 MTO / MTS 规则之间分派
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    Move,
    Buy,
    Manufacture,
    SplitProcurement,
}

impl RuleAction {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RuleAction::Move => "MOVE",
            RuleAction::Buy => "BUY",
            RuleAction::Manufacture => "MANUFACTURE",
            RuleAction::SplitProcurement => "SPLIT_PROCUREMENT",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "BUY" => RuleAction::Buy,
            "MANUFACTURE" => RuleAction::Manufacture,
            "SPLIT_PROCUREMENT" => RuleAction::SplitProcurement,
            _ => RuleAction::Move,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 补货方式 (Procure Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcureMethod {
    MakeToStock, // 从现有库存取
    MakeToOrder, // 按单触发上游补货
}

impl ProcureMethod {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProcureMethod::MakeToStock => "MAKE_TO_STOCK",
            ProcureMethod::MakeToOrder => "MAKE_TO_ORDER",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "MAKE_TO_ORDER" => ProcureMethod::MakeToOrder,
            _ => ProcureMethod::MakeToStock,
        }
    }
}

// ==========================================
// 库位用途 (Location Usage)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationUsage {
    View,
    Internal,
    Customer,
    Supplier,
    Transit,
}

impl LocationUsage {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LocationUsage::View => "VIEW",
            LocationUsage::Internal => "INTERNAL",
            LocationUsage::Customer => "CUSTOMER",
            LocationUsage::Supplier => "SUPPLIER",
            LocationUsage::Transit => "TRANSIT",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "VIEW" => LocationUsage::View,
            "CUSTOMER" => LocationUsage::Customer,
            "SUPPLIER" => LocationUsage::Supplier,
            "TRANSIT" => LocationUsage::Transit,
            _ => LocationUsage::Internal,
        }
    }
}

// ==========================================
// 作业类型代码 (Picking Type Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickingTypeCode {
    Incoming,
    Outgoing,
    Internal,
}

impl PickingTypeCode {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PickingTypeCode::Incoming => "INCOMING",
            PickingTypeCode::Outgoing => "OUTGOING",
            PickingTypeCode::Internal => "INTERNAL",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "INCOMING" => PickingTypeCode::Incoming,
            "OUTGOING" => PickingTypeCode::Outgoing,
            _ => PickingTypeCode::Internal,
        }
    }
}

// ==========================================
// 推式规则自动化方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushAuto {
    Manual,      // 生成新的作业单
    Transparent, // 直接改写目标库位
}

impl PushAuto {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PushAuto::Manual => "MANUAL",
            PushAuto::Transparent => "TRANSPARENT",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "TRANSPARENT" => PushAuto::Transparent,
            _ => PushAuto::Manual,
        }
    }
}

// ==========================================
// 查询可见性 / 排序
// ==========================================
// 显式传参，不依赖隐式上下文

/// 规则查询是否包含已停用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuleVisibility {
    #[default]
    ActiveOnly,
    IncludeInactive,
}

impl RuleVisibility {
    pub fn includes_inactive(&self) -> bool {
        matches!(self, RuleVisibility::IncludeInactive)
    }
}

/// 规则查询排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuleOrder {
    /// 按 id 升序
    #[default]
    Id,
    /// 停用记录在前，再按 id 升序
    InactiveFirst,
}

impl RuleOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            RuleOrder::Id => "id ASC",
            RuleOrder::InactiveFirst => "active ASC, id ASC",
        }
    }
}

// ==========================================
// 拆分补货规则生命周期事件
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEvent {
    Created,
    Reactivated,
    Deactivated,
    Renamed,
    Resynced,
}

impl LifecycleEvent {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Created => "CREATED",
            LifecycleEvent::Reactivated => "REACTIVATED",
            LifecycleEvent::Deactivated => "DEACTIVATED",
            LifecycleEvent::Renamed => "RENAMED",
            LifecycleEvent::Resynced => "RESYNCED",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "REACTIVATED" => LifecycleEvent::Reactivated,
            "DEACTIVATED" => LifecycleEvent::Deactivated,
            "RENAMED" => LifecycleEvent::Renamed,
            "RESYNCED" => LifecycleEvent::Resynced,
            _ => LifecycleEvent::Created,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_db_str_roundtrip() {
        for step in [
            DeliverySteps::ShipOnly,
            DeliverySteps::PickShip,
            DeliverySteps::PickPackShip,
        ] {
            assert_eq!(DeliverySteps::from_db_str(step.to_db_str()), step);
        }
        assert_eq!(
            ReceptionSteps::from_db_str("THREE_STEPS"),
            ReceptionSteps::ThreeSteps
        );
        // 未知值回落
        assert_eq!(ReceptionSteps::from_db_str("crossdock"), ReceptionSteps::OneStep);
    }

    #[test]
    fn test_rule_order_sql() {
        assert_eq!(RuleOrder::InactiveFirst.to_sql(), "active ASC, id ASC");
        assert_eq!(RuleOrder::default(), RuleOrder::Id);
        assert!(!RuleVisibility::default().includes_inactive());
    }

    #[test]
    fn test_action_serde_format() {
        let json = serde_json::to_string(&RuleAction::SplitProcurement).unwrap();
        assert_eq!(json, "\"SPLIT_PROCUREMENT\"");
    }
}
