// ==========================================
// 仓库 MTO+MTS 补货规则 - 库位与作业类型
// ==========================================

use crate::domain::types::{LocationUsage, PickingTypeCode};
use serde::{Deserialize, Serialize};

/// 库位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub usage: LocationUsage,
    pub location_id: Option<i64>, // 上级库位
    pub active: bool,
}

/// 作业类型 (收货 / 拣货 / 打包 / 发货 / 内部调拨)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingType {
    pub id: i64,
    pub name: String,
    pub code: PickingTypeCode,
    pub sequence_prefix: String,
    pub default_location_src_id: Option<i64>,
    pub default_location_dest_id: Option<i64>,
    pub active: bool,
}
