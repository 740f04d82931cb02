// ==========================================
// 仓库 MTO+MTS 补货规则 - 补货规则仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 规则只停用不删除
// 约束: 可见性 (是否含停用记录) 与排序由调用方显式给出
// ==========================================

use crate::domain::rule::{ProcurementRule, RuleSearch, RuleValues};
use crate::domain::types::{ProcureMethod, RuleAction, RuleVisibility};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const RULE_COLUMNS: &str = r#"
    id, name, route_id, action, location_id, location_src_id, picking_type_id,
    warehouse_id, procure_method, mto_rule_id, mts_rule_id, sequence, active,
    created_at, updated_at
"#;

fn map_rule(row: &Row) -> rusqlite::Result<ProcurementRule> {
    Ok(ProcurementRule {
        id: row.get(0)?,
        name: row.get(1)?,
        route_id: row.get(2)?,
        action: RuleAction::from_db_str(&row.get::<_, String>(3)?),
        location_id: row.get(4)?,
        location_src_id: row.get(5)?,
        picking_type_id: row.get(6)?,
        warehouse_id: row.get(7)?,
        procure_method: ProcureMethod::from_db_str(&row.get::<_, String>(8)?),
        mto_rule_id: row.get(9)?,
        mts_rule_id: row.get(10)?,
        sequence: row.get(11)?,
        active: row.get::<_, i32>(12)? != 0,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

// ==========================================
// RuleRepository - 拉式补货规则仓储
// ==========================================
pub struct RuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RuleRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建规则
    pub fn insert(&self, values: &RuleValues) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();
        conn.execute(
            r#"
            INSERT INTO procurement_rule (
                name, route_id, action, location_id, location_src_id, picking_type_id,
                warehouse_id, procure_method, mto_rule_id, mts_rule_id, sequence, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            "#,
            params![
                values.name,
                values.route_id,
                values.action.to_db_str(),
                values.location_id,
                values.location_src_id,
                values.picking_type_id,
                values.warehouse_id,
                values.procure_method.to_db_str(),
                values.mto_rule_id,
                values.mts_rule_id,
                values.sequence,
                values.active as i32,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 id 查询（不区分启用状态）
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProcurementRule>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM procurement_rule WHERE id = ?1", RULE_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_rule).optional()?)
    }

    /// 按 id 查询，不存在时返回 NotFound
    pub fn get(&self, id: i64) -> RepositoryResult<ProcurementRule> {
        self.find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("procurement_rule", id))
    }

    /// 条件查询
    ///
    /// # 参数
    /// - `search.visibility`: ActiveOnly 时过滤 active = 0 的记录
    /// - `search.order`: Id / InactiveFirst
    pub fn search(&self, search: &RuleSearch) -> RepositoryResult<Vec<ProcurementRule>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut args: Vec<i64> = Vec::new();

        if let Some(src) = search.location_src_id {
            args.push(src);
            conditions.push(format!("location_src_id = ?{}", args.len()));
        }
        if let Some(route_id) = search.route_id {
            args.push(route_id);
            conditions.push(format!("route_id = ?{}", args.len()));
        }
        if !search.visibility.includes_inactive() {
            conditions.push("active = 1".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM procurement_rule {} ORDER BY {}",
            RULE_COLUMNS,
            where_clause,
            search.order.to_sql()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map(params_from_iter(args.iter()), map_rule)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }

    /// 查询路线下的规则
    pub fn find_by_route(
        &self,
        route_id: i64,
        visibility: RuleVisibility,
    ) -> RepositoryResult<Vec<ProcurementRule>> {
        self.search(&RuleSearch {
            route_id: Some(route_id),
            visibility,
            ..Default::default()
        })
    }

    /// 查询仓库的规则（可按动作过滤）
    pub fn find_by_warehouse(
        &self,
        warehouse_id: i64,
        action: Option<RuleAction>,
        visibility: RuleVisibility,
    ) -> RepositoryResult<Vec<ProcurementRule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM procurement_rule
            WHERE warehouse_id = ?1
              AND (?2 IS NULL OR action = ?2)
              AND (?3 = 1 OR active = 1)
            ORDER BY id ASC
            "#,
            RULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map(
                params![
                    warehouse_id,
                    action.map(|a| a.to_db_str()),
                    visibility.includes_inactive() as i32
                ],
                map_rule,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }

    /// 查找与定义匹配的已有规则（含停用记录）
    ///
    /// 匹配字段: 路线、目标库位、来源库位、动作、作业类型、仓库
    /// 优先返回启用记录，其次 id 最小的停用记录
    pub fn find_matching(&self, values: &RuleValues) -> RepositoryResult<Option<ProcurementRule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM procurement_rule
            WHERE route_id IS ?1
              AND location_id = ?2
              AND location_src_id IS ?3
              AND action = ?4
              AND picking_type_id IS ?5
              AND warehouse_id = ?6
            ORDER BY active DESC, id ASC
            LIMIT 1
            "#,
            RULE_COLUMNS
        );
        Ok(conn
            .query_row(
                &sql,
                params![
                    values.route_id,
                    values.location_id,
                    values.location_src_id,
                    values.action.to_db_str(),
                    values.picking_type_id,
                    values.warehouse_id,
                ],
                map_rule,
            )
            .optional()?)
    }

    /// 用定义整体覆盖已有规则（包括 active）
    pub fn rewrite(&self, id: i64, values: &RuleValues) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE procurement_rule SET
                name = ?1, route_id = ?2, action = ?3, location_id = ?4, location_src_id = ?5,
                picking_type_id = ?6, warehouse_id = ?7, procure_method = ?8,
                mto_rule_id = ?9, mts_rule_id = ?10, sequence = ?11, active = ?12,
                updated_at = ?13
            WHERE id = ?14
            "#,
            params![
                values.name,
                values.route_id,
                values.action.to_db_str(),
                values.location_id,
                values.location_src_id,
                values.picking_type_id,
                values.warehouse_id,
                values.procure_method.to_db_str(),
                values.mto_rule_id,
                values.mts_rule_id,
                values.sequence,
                values.active as i32,
                Utc::now().naive_utc(),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("procurement_rule", id));
        }
        Ok(())
    }

    pub fn set_active(&self, id: i64, active: bool) -> RepositoryResult<()> {
        self.update_column(id, "active", active as i64)
    }

    pub fn update_location(&self, id: i64, location_id: i64) -> RepositoryResult<()> {
        self.update_column(id, "location_id", location_id)
    }

    pub fn update_mts_rule(&self, id: i64, mts_rule_id: i64) -> RepositoryResult<()> {
        self.update_column(id, "mts_rule_id", mts_rule_id)
    }

    pub fn update_name(&self, id: i64, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE procurement_rule SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, Utc::now().naive_utc(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("procurement_rule", id));
        }
        Ok(())
    }

    /// 停用路线下的全部启用规则
    ///
    /// # 返回
    /// 被停用的规则数量
    pub fn deactivate_by_route(&self, route_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE procurement_rule SET active = 0, updated_at = ?1 WHERE route_id = ?2 AND active = 1",
            params![Utc::now().naive_utc(), route_id],
        )?;
        Ok(affected)
    }

    // column 只接受本模块内的固定列名
    fn update_column(&self, id: i64, column: &str, value: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!(
            "UPDATE procurement_rule SET {} = ?1, updated_at = ?2 WHERE id = ?3",
            column
        );
        let affected = conn.execute(&sql, params![value, Utc::now().naive_utc(), id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("procurement_rule", id));
        }
        Ok(())
    }
}
