// ==========================================
// 仓库 MTO+MTS 补货规则 - 库位 / 作业类型仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::location::{Location, PickingType};
use crate::domain::types::{LocationUsage, PickingTypeCode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const LOCATION_COLUMNS: &str = "id, name, usage, location_id, active";
const PICKING_TYPE_COLUMNS: &str = "id, name, code, sequence_prefix, default_location_src_id, default_location_dest_id, active";

fn map_location(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        usage: LocationUsage::from_db_str(&row.get::<_, String>(2)?),
        location_id: row.get(3)?,
        active: row.get::<_, i32>(4)? != 0,
    })
}

fn map_picking_type(row: &Row) -> rusqlite::Result<PickingType> {
    Ok(PickingType {
        id: row.get(0)?,
        name: row.get(1)?,
        code: PickingTypeCode::from_db_str(&row.get::<_, String>(2)?),
        sequence_prefix: row.get(3)?,
        default_location_src_id: row.get(4)?,
        default_location_dest_id: row.get(5)?,
        active: row.get::<_, i32>(6)? != 0,
    })
}

// ==========================================
// LocationRepository - 库位仓储
// ==========================================
/// 职责: 管理 stock_location / stock_picking_type 表
pub struct LocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LocationRepository {
    /// 创建新的 LocationRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 库位 =====

    pub fn insert_location(
        &self,
        name: &str,
        usage: LocationUsage,
        parent_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO stock_location (name, usage, location_id, active) VALUES (?1, ?2, ?3, 1)",
            params![name, usage.to_db_str(), parent_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_location(&self, id: i64) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM stock_location WHERE id = ?1", LOCATION_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_location).optional()?)
    }

    /// 按 id 读取库位，不存在时返回 NotFound
    pub fn get_location(&self, id: i64) -> RepositoryResult<Location> {
        self.find_location(id)?
            .ok_or_else(|| RepositoryError::not_found("stock_location", id))
    }

    /// 按稳定标识读取库位
    pub fn find_location_by_xml_id(&self, xml_id: &str) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM stock_location
            WHERE id = (SELECT res_id FROM external_id WHERE xml_id = ?1 AND model = 'stock.location')
            "#,
            LOCATION_COLUMNS
        );
        Ok(conn.query_row(&sql, params![xml_id], map_location).optional()?)
    }

    pub fn update_location_name(&self, id: i64, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stock_location SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_location", id));
        }
        Ok(())
    }

    // ===== 作业类型 =====

    pub fn insert_picking_type(
        &self,
        name: &str,
        code: PickingTypeCode,
        sequence_prefix: &str,
        default_location_src_id: Option<i64>,
        default_location_dest_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_picking_type (
                name, code, sequence_prefix,
                default_location_src_id, default_location_dest_id, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1)
            "#,
            params![
                name,
                code.to_db_str(),
                sequence_prefix,
                default_location_src_id,
                default_location_dest_id
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_picking_type(&self, id: i64) -> RepositoryResult<Option<PickingType>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_picking_type WHERE id = ?1",
            PICKING_TYPE_COLUMNS
        );
        Ok(conn.query_row(&sql, params![id], map_picking_type).optional()?)
    }

    pub fn update_picking_type_defaults(
        &self,
        id: i64,
        default_location_src_id: Option<i64>,
        default_location_dest_id: Option<i64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE stock_picking_type
            SET default_location_src_id = ?1, default_location_dest_id = ?2
            WHERE id = ?3
            "#,
            params![default_location_src_id, default_location_dest_id, id],
        )?;
        Ok(())
    }

    pub fn set_picking_type_active(&self, id: i64, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE stock_picking_type SET active = ?1 WHERE id = ?2",
            params![active as i32, id],
        )?;
        Ok(())
    }
}
