// ==========================================
// 仓库 MTO+MTS 补货规则 - 仓库领域模型
// ==========================================
// 对齐: v0.1_schema.sql stock_warehouse 表
// 扩展字段: mto_mts_management / mts_mto_rule_id
// ==========================================

use crate::domain::types::{DeliverySteps, ReceptionSteps};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Warehouse - 仓库
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub code: String,

    // ===== 库位 =====
    pub view_location_id: i64,
    pub lot_stock_id: i64,           // 库存库位
    pub wh_input_stock_loc_id: i64,  // 收货区
    pub wh_qc_stock_loc_id: i64,     // 质检区
    pub wh_output_stock_loc_id: i64, // 出库区
    pub wh_pack_stock_loc_id: i64,   // 打包区

    // ===== 作业类型 =====
    pub in_type_id: i64,
    pub int_type_id: i64,
    pub pick_type_id: i64,
    pub pack_type_id: i64,
    pub out_type_id: i64,

    // ===== 路由配置 =====
    pub reception_steps: ReceptionSteps,
    pub delivery_steps: DeliverySteps,
    pub reception_route_id: Option<i64>,
    pub delivery_route_id: Option<i64>,
    pub mto_pull_id: Option<i64>, // 默认 MTO 规则

    // ===== MTO+MTS 扩展 =====
    pub mto_mts_management: bool,
    pub mts_mto_rule_id: Option<i64>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// WarehouseCreate - 新建仓库请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseCreate {
    pub name: String,
    pub code: String,
    pub reception_steps: ReceptionSteps,
    pub delivery_steps: DeliverySteps,
    #[serde(default)]
    pub mto_mts_management: bool,
}

impl WarehouseCreate {
    /// 默认一步收货 / 直接发货
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            reception_steps: ReceptionSteps::OneStep,
            delivery_steps: DeliverySteps::ShipOnly,
            mto_mts_management: false,
        }
    }

    pub fn with_delivery_steps(mut self, steps: DeliverySteps) -> Self {
        self.delivery_steps = steps;
        self
    }

    pub fn with_reception_steps(mut self, steps: ReceptionSteps) -> Self {
        self.reception_steps = steps;
        self
    }

    pub fn with_mto_mts_management(mut self, enabled: bool) -> Self {
        self.mto_mts_management = enabled;
        self
    }
}

// ==========================================
// WarehouseUpdate - 仓库部分更新
// ==========================================
// None 表示本次更新不涉及该字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub reception_steps: Option<ReceptionSteps>,
    pub delivery_steps: Option<DeliverySteps>,
    pub mto_mts_management: Option<bool>,
}

impl WarehouseUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.reception_steps.is_none()
            && self.delivery_steps.is_none()
            && self.mto_mts_management.is_none()
    }

    pub fn touches_naming(&self) -> bool {
        self.name.is_some() || self.code.is_some()
    }

    pub fn touches_steps(&self) -> bool {
        self.reception_steps.is_some() || self.delivery_steps.is_some()
    }

    pub fn mto_mts_management(enabled: bool) -> Self {
        Self {
            mto_mts_management: Some(enabled),
            ..Default::default()
        }
    }

    pub fn delivery_steps(steps: DeliverySteps) -> Self {
        Self {
            delivery_steps: Some(steps),
            ..Default::default()
        }
    }

    pub fn rename(name: impl Into<String>, code: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            code,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_flags() {
        let update = WarehouseUpdate::mto_mts_management(true);
        assert!(!update.is_empty());
        assert!(!update.touches_steps());
        assert!(!update.touches_naming());

        let update = WarehouseUpdate::rename("WH2", None);
        assert!(update.touches_naming());

        assert!(WarehouseUpdate::default().is_empty());
    }
}
