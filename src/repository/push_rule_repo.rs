// ==========================================
// 仓库 MTO+MTS 补货规则 - 推式规则仓储
// ==========================================
// 红线: 推式规则只停用不删除
// ==========================================

use crate::domain::rule::{PushRule, PushRuleValues};
use crate::domain::types::{PushAuto, RuleVisibility};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PUSH_COLUMNS: &str = "id, name, route_id, location_from_id, location_dest_id, picking_type_id, auto, warehouse_id, active";

fn map_push_rule(row: &Row) -> rusqlite::Result<PushRule> {
    Ok(PushRule {
        id: row.get(0)?,
        name: row.get(1)?,
        route_id: row.get(2)?,
        location_from_id: row.get(3)?,
        location_dest_id: row.get(4)?,
        picking_type_id: row.get(5)?,
        auto: PushAuto::from_db_str(&row.get::<_, String>(6)?),
        warehouse_id: row.get(7)?,
        active: row.get::<_, i32>(8)? != 0,
    })
}

pub struct PushRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PushRuleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, values: &PushRuleValues) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_location_path (
                name, route_id, location_from_id, location_dest_id, picking_type_id,
                auto, warehouse_id, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                values.name,
                values.route_id,
                values.location_from_id,
                values.location_dest_id,
                values.picking_type_id,
                values.auto.to_db_str(),
                values.warehouse_id,
                values.active as i32,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查找与定义匹配的已有推式规则（含停用记录，启用优先）
    pub fn find_matching(&self, values: &PushRuleValues) -> RepositoryResult<Option<PushRule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM stock_location_path
            WHERE route_id = ?1
              AND location_from_id = ?2
              AND location_dest_id = ?3
              AND picking_type_id IS ?4
              AND warehouse_id = ?5
            ORDER BY active DESC, id ASC
            LIMIT 1
            "#,
            PUSH_COLUMNS
        );
        Ok(conn
            .query_row(
                &sql,
                params![
                    values.route_id,
                    values.location_from_id,
                    values.location_dest_id,
                    values.picking_type_id,
                    values.warehouse_id,
                ],
                map_push_rule,
            )
            .optional()?)
    }

    pub fn rewrite(&self, id: i64, values: &PushRuleValues) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE stock_location_path SET
                name = ?1, route_id = ?2, location_from_id = ?3, location_dest_id = ?4,
                picking_type_id = ?5, auto = ?6, warehouse_id = ?7, active = ?8
            WHERE id = ?9
            "#,
            params![
                values.name,
                values.route_id,
                values.location_from_id,
                values.location_dest_id,
                values.picking_type_id,
                values.auto.to_db_str(),
                values.warehouse_id,
                values.active as i32,
                id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_location_path", id));
        }
        Ok(())
    }

    pub fn find_by_route(
        &self,
        route_id: i64,
        visibility: RuleVisibility,
    ) -> RepositoryResult<Vec<PushRule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM stock_location_path
            WHERE route_id = ?1 AND (?2 = 1 OR active = 1)
            ORDER BY id ASC
            "#,
            PUSH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map(params![route_id, visibility.includes_inactive() as i32], map_push_rule)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }

    pub fn deactivate_by_route(&self, route_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stock_location_path SET active = 0 WHERE route_id = ?1 AND active = 1",
            params![route_id],
        )?;
        Ok(affected)
    }

    pub fn update_name(&self, id: i64, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE stock_location_path SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(())
    }
}
