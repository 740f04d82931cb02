// ==========================================
// 仓库 MTO+MTS 补货规则 - 规则生命周期日志
// ==========================================
// 用途: 审计拆分补货规则的创建/复用/停用/改名/同步
// 对齐: v0.1_schema.sql rule_lifecycle_log 表
// ==========================================

use crate::domain::types::LifecycleEvent;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLifecycleLog {
    pub log_id: String,
    pub warehouse_id: i64,
    pub rule_id: Option<i64>,
    pub event: LifecycleEvent,
    pub payload_json: Option<JsonValue>,
    pub logged_at: NaiveDateTime,
}

impl RuleLifecycleLog {
    /// 以当前时间创建日志记录
    pub fn new(
        warehouse_id: i64,
        rule_id: Option<i64>,
        event: LifecycleEvent,
        payload_json: Option<JsonValue>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            warehouse_id,
            rule_id,
            event,
            payload_json,
            logged_at: Utc::now().naive_utc(),
        }
    }
}
