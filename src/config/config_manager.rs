// ==========================================
// 仓库 MTO+MTS 补货规则 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{
    open_sqlite_connection, XML_ID_CUSTOMER_LOCATION, XML_ID_MTO_ROUTE, XML_ID_MTS_MTO_ROUTE,
    XML_ID_SUPPLIER_LOCATION,
};
use crate::domain::rule::DEFAULT_RULE_SEQUENCE;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 拆分补货规则在客户库位一侧的默认优先级
pub const DEFAULT_CUSTOMER_SPLIT_SEQUENCE: i32 = 10;

/// 通用 MTS+MTO 路线的兜底名称
pub const DEFAULT_MTS_MTO_ROUTE_NAME: &str = "Make To Order + Make To Stock";

pub const DEFAULT_NAMING_LOCALE: &str = "en";

// ==========================================
// RoutingConfig - 路由配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// 通用 MTS+MTO 路线的稳定标识
    pub mts_mto_route_xml_id: String,
    /// 稳定标识失效时按名称查找
    pub mts_mto_route_name: String,
    pub mto_route_xml_id: String,
    pub customer_location_xml_id: String,
    pub supplier_location_xml_id: String,
    /// 拆分规则名称后缀，空串表示使用翻译文本
    pub mts_mto_rule_suffix: String,
    pub customer_split_sequence: i32,
    pub default_rule_sequence: i32,
    /// 生成路线 / 规则名称所用语言，与界面语言无关
    pub naming_locale: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mts_mto_route_xml_id: XML_ID_MTS_MTO_ROUTE.to_string(),
            mts_mto_route_name: DEFAULT_MTS_MTO_ROUTE_NAME.to_string(),
            mto_route_xml_id: XML_ID_MTO_ROUTE.to_string(),
            customer_location_xml_id: XML_ID_CUSTOMER_LOCATION.to_string(),
            supplier_location_xml_id: XML_ID_SUPPLIER_LOCATION.to_string(),
            mts_mto_rule_suffix: String::new(),
            customer_split_sequence: DEFAULT_CUSTOMER_SPLIT_SEQUENCE,
            default_rule_sequence: DEFAULT_RULE_SEQUENCE,
            naming_locale: DEFAULT_NAMING_LOCALE.to_string(),
        }
    }
}

impl RoutingConfig {
    /// 按 naming_locale 翻译名称片段
    pub fn label(&self, key: &str) -> String {
        rust_i18n::t!(key, locale = self.naming_locale.as_str()).to_string()
    }

    /// 拆分规则名称后缀
    pub fn rule_suffix(&self) -> String {
        if self.mts_mto_rule_suffix.trim().is_empty() {
            self.label("rule.mts_mto_suffix")
        } else {
            self.mts_mto_rule_suffix.clone()
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    /// 写入 global scope 的配置值（已存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn get_string_or(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_i32_or(&self, key: &str, default: i32) -> RepositoryResult<i32> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|e| RepositoryError::FieldValueError {
                    field: key.to_string(),
                    message: format!("{} ({})", e, raw),
                }),
        }
    }

    /// 加载路由配置，未设置的键取默认值
    pub fn load_routing_config(&self) -> RepositoryResult<RoutingConfig> {
        let defaults = RoutingConfig::default();
        let config = RoutingConfig {
            mts_mto_route_xml_id: self
                .get_string_or(config_keys::MTS_MTO_ROUTE_XML_ID, &defaults.mts_mto_route_xml_id)?,
            mts_mto_route_name: self
                .get_string_or(config_keys::MTS_MTO_ROUTE_NAME, &defaults.mts_mto_route_name)?,
            mto_route_xml_id: self
                .get_string_or(config_keys::MTO_ROUTE_XML_ID, &defaults.mto_route_xml_id)?,
            customer_location_xml_id: self.get_string_or(
                config_keys::CUSTOMER_LOCATION_XML_ID,
                &defaults.customer_location_xml_id,
            )?,
            supplier_location_xml_id: self.get_string_or(
                config_keys::SUPPLIER_LOCATION_XML_ID,
                &defaults.supplier_location_xml_id,
            )?,
            mts_mto_rule_suffix: self
                .get_string_or(config_keys::MTS_MTO_RULE_SUFFIX, &defaults.mts_mto_rule_suffix)?,
            customer_split_sequence: self.get_i32_or(
                config_keys::CUSTOMER_SPLIT_SEQUENCE,
                defaults.customer_split_sequence,
            )?,
            default_rule_sequence: self
                .get_i32_or(config_keys::DEFAULT_RULE_SEQUENCE, defaults.default_rule_sequence)?,
            naming_locale: self.get_string_or(config_keys::NAMING_LOCALE, &defaults.naming_locale)?,
        };
        tracing::debug!(?config, "路由配置已加载");
        Ok(config)
    }

    /// 获取所有 global 配置的快照（JSON格式，按键排序）
    pub fn config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&config_map).map_err(|e| RepositoryError::InternalError(e.to_string()))
    }
}

/// 获取默认数据库路径
///
/// - 环境变量 STOCK_MTS_MTO_DB_PATH 优先
/// - 其次为 用户数据目录/stock-mts-mto-rule/stock_mts_mto_rule.db
/// - 无法获取数据目录时回退到当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("STOCK_MTS_MTO_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./stock_mts_mto_rule.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("stock-mts-mto-rule");
        // 目录创建失败时交给后续打开连接报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("stock_mts_mto_rule.db");
    }
    path.to_string_lossy().to_string()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 通用路线 / 库位的稳定标识
    pub const MTS_MTO_ROUTE_XML_ID: &str = "routing/mts_mto_route_xml_id";
    pub const MTS_MTO_ROUTE_NAME: &str = "routing/mts_mto_route_name";
    pub const MTO_ROUTE_XML_ID: &str = "routing/mto_route_xml_id";
    pub const CUSTOMER_LOCATION_XML_ID: &str = "routing/customer_location_xml_id";
    pub const SUPPLIER_LOCATION_XML_ID: &str = "routing/supplier_location_xml_id";

    // 规则命名与优先级
    pub const MTS_MTO_RULE_SUFFIX: &str = "routing/mts_mto_rule_suffix";
    pub const CUSTOMER_SPLIT_SEQUENCE: &str = "routing/customer_split_sequence";
    pub const DEFAULT_RULE_SEQUENCE: &str = "routing/default_rule_sequence";
    pub const NAMING_LOCALE: &str = "routing/naming_locale";
}
