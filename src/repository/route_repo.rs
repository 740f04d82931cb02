// ==========================================
// 仓库 MTO+MTS 补货规则 - 路线仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 稳定标识 (external_id) 的读写也在此处
// ==========================================

use crate::db::MODEL_ROUTE;
use crate::domain::route::{Route, RouteValues};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ROUTE_COLUMNS: &str = "id, name, sequence, product_selectable, warehouse_selectable, active";

fn map_route(row: &Row) -> rusqlite::Result<Route> {
    Ok(Route {
        id: row.get(0)?,
        name: row.get(1)?,
        sequence: row.get(2)?,
        product_selectable: row.get::<_, i32>(3)? != 0,
        warehouse_selectable: row.get::<_, i32>(4)? != 0,
        active: row.get::<_, i32>(5)? != 0,
    })
}

// ==========================================
// RouteRepository - 路线仓储
// ==========================================
pub struct RouteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteRepository {
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

    /// 创建路线
    pub fn insert(&self, values: &RouteValues) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_route (name, sequence, product_selectable, warehouse_selectable, active)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
            params![
                values.name,
                values.sequence,
                values.product_selectable as i32,
                values.warehouse_selectable as i32,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM stock_route WHERE id = ?1", ROUTE_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_route).optional()?)
    }

    /// 按稳定标识解析路线
    ///
    /// # 返回
    /// - Ok(None): 标识未登记，或指向的记录已不存在
    pub fn find_by_xml_id(&self, xml_id: &str) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM stock_route
            WHERE id = (SELECT res_id FROM external_id WHERE xml_id = ?1 AND model = ?2)
            "#,
            ROUTE_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![xml_id, MODEL_ROUTE], map_route)
            .optional()?)
    }

    /// 名称模糊查询（仅启用路线，按 id 升序）
    pub fn search_by_name_like(&self, pattern: &str) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM stock_route
            WHERE active = 1 AND name LIKE '%' || ?1 || '%'
            ORDER BY id ASC
            "#,
            ROUTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let routes = stmt
            .query_map(params![pattern], map_route)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(routes)
    }

    pub fn update_name(&self, id: i64, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stock_route SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_route", id));
        }
        Ok(())
    }

    /// 登记稳定标识（已存在则覆盖）
    pub fn register_xml_id(&self, xml_id: &str, route_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO external_id (xml_id, model, res_id) VALUES (?1, ?2, ?3)",
            params![xml_id, MODEL_ROUTE, route_id],
        )?;
        Ok(())
    }

    /// 注销稳定标识
    pub fn unregister_xml_id(&self, xml_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM external_id WHERE xml_id = ?1", params![xml_id])?;
        Ok(())
    }
}
