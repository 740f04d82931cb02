// ==========================================
// 仓库 MTO+MTS 补货规则 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 建表 (migrations/v0.1_schema.sql) 与基础数据 (客户库位、通用路线) 幂等初始化
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version（与 `migrations/v0.*.sql` 对齐）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V0_1: &str = include_str!("../migrations/v0.1_schema.sql");

// ===== 基础数据稳定标识 =====
pub const XML_ID_PARTNER_LOCATIONS: &str = "stock.stock_location_locations_partner";
pub const XML_ID_CUSTOMER_LOCATION: &str = "stock.stock_location_customers";
pub const XML_ID_SUPPLIER_LOCATION: &str = "stock.stock_location_suppliers";
pub const XML_ID_MTO_ROUTE: &str = "stock.route_warehouse0_mto";
pub const XML_ID_MTS_MTO_ROUTE: &str = "stock_mts_mto_rule.route_mto_mts";

pub const MODEL_LOCATION: &str = "stock.location";
pub const MODEL_ROUTE: &str = "stock.location.route";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接，并完成建表与基础数据初始化
pub fn open_initialized_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    seed_reference_data(&conn)?;
    Ok(conn)
}

/// 内存库（单元测试用）
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    seed_reference_data(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并记录 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_V0_1)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化基础数据（幂等）
///
/// - 伙伴库位视图、客户库位、供应商库位
/// - 通用 MTO 路线、MTS+MTO 路线
pub fn seed_reference_data(conn: &Connection) -> rusqlite::Result<()> {
    let partner_id = ensure_location(conn, XML_ID_PARTNER_LOCATIONS, "Partner Locations", "VIEW", None)?;
    ensure_location(conn, XML_ID_CUSTOMER_LOCATION, "Customers", "CUSTOMER", Some(partner_id))?;
    ensure_location(conn, XML_ID_SUPPLIER_LOCATION, "Suppliers", "SUPPLIER", Some(partner_id))?;

    ensure_route(conn, XML_ID_MTO_ROUTE, "Make To Order", 5)?;
    ensure_route(conn, XML_ID_MTS_MTO_ROUTE, "Make To Order + Make To Stock", 5)?;
    Ok(())
}

fn lookup_xml_id(conn: &Connection, xml_id: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT res_id FROM external_id WHERE xml_id = ?1",
        params![xml_id],
        |row| row.get(0),
    )
    .optional()
}

fn register_xml_id(conn: &Connection, xml_id: &str, model: &str, res_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO external_id (xml_id, model, res_id) VALUES (?1, ?2, ?3)",
        params![xml_id, model, res_id],
    )?;
    Ok(())
}

fn ensure_location(
    conn: &Connection,
    xml_id: &str,
    name: &str,
    usage: &str,
    parent_id: Option<i64>,
) -> rusqlite::Result<i64> {
    if let Some(id) = lookup_xml_id(conn, xml_id)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO stock_location (name, usage, location_id, active) VALUES (?1, ?2, ?3, 1)",
        params![name, usage, parent_id],
    )?;
    let id = conn.last_insert_rowid();
    register_xml_id(conn, xml_id, MODEL_LOCATION, id)?;
    Ok(id)
}

fn ensure_route(conn: &Connection, xml_id: &str, name: &str, sequence: i32) -> rusqlite::Result<i64> {
    if let Some(id) = lookup_xml_id(conn, xml_id)? {
        return Ok(id);
    }
    conn.execute(
        r#"
        INSERT INTO stock_route (name, sequence, product_selectable, warehouse_selectable, active)
        VALUES (?1, ?2, 1, 0, 1)
        "#,
        params![name, sequence],
    )?;
    let id = conn.last_insert_rowid();
    register_xml_id(conn, xml_id, MODEL_ROUTE, id)?;
    Ok(id)
}
