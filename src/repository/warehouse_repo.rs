// ==========================================
// 仓库 MTO+MTS 补货规则 - 仓库仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: stock_warehouse / stock_warehouse_route_rel 表
// ==========================================

use crate::domain::types::{DeliverySteps, ReceptionSteps};
use crate::domain::warehouse::{Warehouse, WarehouseUpdate};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const WAREHOUSE_COLUMNS: &str = r#"
    id, name, code,
    view_location_id, lot_stock_id, wh_input_stock_loc_id, wh_qc_stock_loc_id,
    wh_output_stock_loc_id, wh_pack_stock_loc_id,
    in_type_id, int_type_id, pick_type_id, pack_type_id, out_type_id,
    reception_steps, delivery_steps, reception_route_id, delivery_route_id, mto_pull_id,
    mto_mts_management, mts_mto_rule_id, created_at, updated_at
"#;

fn map_warehouse(row: &Row) -> rusqlite::Result<Warehouse> {
    Ok(Warehouse {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        view_location_id: row.get(3)?,
        lot_stock_id: row.get(4)?,
        wh_input_stock_loc_id: row.get(5)?,
        wh_qc_stock_loc_id: row.get(6)?,
        wh_output_stock_loc_id: row.get(7)?,
        wh_pack_stock_loc_id: row.get(8)?,
        in_type_id: row.get(9)?,
        int_type_id: row.get(10)?,
        pick_type_id: row.get(11)?,
        pack_type_id: row.get(12)?,
        out_type_id: row.get(13)?,
        reception_steps: ReceptionSteps::from_db_str(&row.get::<_, String>(14)?),
        delivery_steps: DeliverySteps::from_db_str(&row.get::<_, String>(15)?),
        reception_route_id: row.get(16)?,
        delivery_route_id: row.get(17)?,
        mto_pull_id: row.get(18)?,
        mto_mts_management: row.get::<_, i32>(19)? != 0,
        mts_mto_rule_id: row.get(20)?,
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}

// ==========================================
// WarehouseRepository - 仓库仓储
// ==========================================
pub struct WarehouseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WarehouseRepository {
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

    /// 插入仓库（忽略 `warehouse.id`，返回新 id）
    pub fn insert(&self, warehouse: &Warehouse) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_warehouse (
                name, code,
                view_location_id, lot_stock_id, wh_input_stock_loc_id, wh_qc_stock_loc_id,
                wh_output_stock_loc_id, wh_pack_stock_loc_id,
                in_type_id, int_type_id, pick_type_id, pack_type_id, out_type_id,
                reception_steps, delivery_steps, reception_route_id, delivery_route_id, mto_pull_id,
                mto_mts_management, mts_mto_rule_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
            )
            "#,
            params![
                warehouse.name,
                warehouse.code,
                warehouse.view_location_id,
                warehouse.lot_stock_id,
                warehouse.wh_input_stock_loc_id,
                warehouse.wh_qc_stock_loc_id,
                warehouse.wh_output_stock_loc_id,
                warehouse.wh_pack_stock_loc_id,
                warehouse.in_type_id,
                warehouse.int_type_id,
                warehouse.pick_type_id,
                warehouse.pack_type_id,
                warehouse.out_type_id,
                warehouse.reception_steps.to_db_str(),
                warehouse.delivery_steps.to_db_str(),
                warehouse.reception_route_id,
                warehouse.delivery_route_id,
                warehouse.mto_pull_id,
                warehouse.mto_mts_management as i32,
                warehouse.mts_mto_rule_id,
                warehouse.created_at,
                warehouse.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Warehouse>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM stock_warehouse WHERE id = ?1", WAREHOUSE_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_warehouse).optional()?)
    }

    /// 按 id 读取仓库，不存在时返回 NotFound
    pub fn get(&self, id: i64) -> RepositoryResult<Warehouse> {
        self.find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("stock_warehouse", id))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Warehouse>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM stock_warehouse ORDER BY id ASC", WAREHOUSE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let warehouses = stmt
            .query_map([], map_warehouse)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(warehouses)
    }

    /// 写入部分字段（None 字段保持不变）
    pub fn update_fields(&self, id: i64, update: &WarehouseUpdate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE stock_warehouse SET
                name = COALESCE(?1, name),
                code = COALESCE(?2, code),
                reception_steps = COALESCE(?3, reception_steps),
                delivery_steps = COALESCE(?4, delivery_steps),
                mto_mts_management = COALESCE(?5, mto_mts_management),
                updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                update.name,
                update.code,
                update.reception_steps.map(|s| s.to_db_str()),
                update.delivery_steps.map(|s| s.to_db_str()),
                update.mto_mts_management.map(|v| v as i32),
                Utc::now().naive_utc(),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_warehouse", id));
        }
        Ok(())
    }

    /// 记录仓库自动生成的收货 / 发货路线与默认 MTO 规则
    pub fn set_route_refs(
        &self,
        id: i64,
        reception_route_id: Option<i64>,
        delivery_route_id: Option<i64>,
        mto_pull_id: Option<i64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE stock_warehouse
            SET reception_route_id = ?1, delivery_route_id = ?2, mto_pull_id = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
            params![
                reception_route_id,
                delivery_route_id,
                mto_pull_id,
                Utc::now().naive_utc(),
                id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_warehouse", id));
        }
        Ok(())
    }

    pub fn set_mto_pull(&self, id: i64, mto_pull_id: Option<i64>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE stock_warehouse SET mto_pull_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![mto_pull_id, Utc::now().naive_utc(), id],
        )?;
        Ok(())
    }

    /// 设置 / 清除拆分补货规则引用
    pub fn set_mts_mto_rule(&self, id: i64, rule_id: Option<i64>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stock_warehouse SET mts_mto_rule_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![rule_id, Utc::now().naive_utc(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("stock_warehouse", id));
        }
        Ok(())
    }

    // ===== 仓库-路线关联 =====

    /// 关联路线（重复关联忽略）
    pub fn add_route(&self, warehouse_id: i64, route_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO stock_warehouse_route_rel (warehouse_id, route_id) VALUES (?1, ?2)",
            params![warehouse_id, route_id],
        )?;
        Ok(())
    }

    pub fn route_ids(&self, warehouse_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT route_id FROM stock_warehouse_route_rel WHERE warehouse_id = ?1 ORDER BY route_id ASC",
        )?;
        let ids = stmt
            .query_map(params![warehouse_id], |row| row.get(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(ids)
    }
}
