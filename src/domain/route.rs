// ==========================================
// 仓库 MTO+MTS 补货规则 - 路线
// ==========================================

use serde::{Deserialize, Serialize};

/// 路线: 产品可选用的一组规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub sequence: i32,
    pub product_selectable: bool,
    pub warehouse_selectable: bool,
    pub active: bool,
}

/// 新建路线所需字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteValues {
    pub name: String,
    pub sequence: i32,
    pub product_selectable: bool,
    pub warehouse_selectable: bool,
}

impl RouteValues {
    /// 仓库自动生成的路线：仓库上可选，产品上不可选
    pub fn warehouse_route(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: 10,
            product_selectable: false,
            warehouse_selectable: true,
        }
    }
}
