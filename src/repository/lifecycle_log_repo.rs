// ==========================================
// 仓库 MTO+MTS 补货规则 - 规则生命周期日志仓储
// ==========================================
// 红线: 日志只追加，不修改
// ==========================================

use crate::domain::lifecycle_log::RuleLifecycleLog;
use crate::domain::types::LifecycleEvent;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_log(row: &Row) -> rusqlite::Result<RuleLifecycleLog> {
    let payload: Option<String> = row.get(4)?;
    Ok(RuleLifecycleLog {
        log_id: row.get(0)?,
        warehouse_id: row.get(1)?,
        rule_id: row.get(2)?,
        event: LifecycleEvent::from_db_str(&row.get::<_, String>(3)?),
        // 无法解析的 payload 按缺失处理
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        logged_at: row.get(5)?,
    })
}

pub struct RuleLifecycleLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RuleLifecycleLogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, log: &RuleLifecycleLog) -> RepositoryResult<()> {
        let payload = match &log.payload_json {
            Some(value) => Some(serde_json::to_string(value).map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "payload_json".to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rule_lifecycle_log (log_id, warehouse_id, rule_id, event_type, payload_json, logged_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                log.log_id,
                log.warehouse_id,
                log.rule_id,
                log.event.to_db_str(),
                payload,
                log.logged_at,
            ],
        )?;
        Ok(())
    }

    /// 查询仓库的日志（按写入顺序）
    pub fn find_by_warehouse(&self, warehouse_id: i64) -> RepositoryResult<Vec<RuleLifecycleLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, warehouse_id, rule_id, event_type, payload_json, logged_at
            FROM rule_lifecycle_log
            WHERE warehouse_id = ?1
            ORDER BY rowid ASC
            "#,
        )?;
        let logs = stmt
            .query_map(params![warehouse_id], map_log)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}
