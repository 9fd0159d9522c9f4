// ==========================================
// 宝石订单跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::order_policy_trait::{
    OrderPolicyReader, DEFAULT_ORDER_NUMBER_PREFIX, DEFAULT_ORDER_SEQ_WIDTH,
};
use crate::db::open_sqlite_connection;
use crate::domain::types::StatusTransitionMode;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

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
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入/覆盖 global scope 配置
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// OrderPolicyReader 实现
// ==========================================
impl OrderPolicyReader for ConfigManager {
    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::ORDER_NUMBER_PREFIX,
            DEFAULT_ORDER_NUMBER_PREFIX,
        )?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(DEFAULT_ORDER_NUMBER_PREFIX.to_string());
        }
        Ok(trimmed.to_string())
    }

    fn get_order_seq_width(&self) -> Result<usize, Box<dyn Error>> {
        match self.get_config_value(config_keys::ORDER_SEQ_WIDTH)? {
            Some(raw) => {
                let width: usize = raw.trim().parse()?;
                Ok(width.clamp(1, 9))
            }
            None => Ok(DEFAULT_ORDER_SEQ_WIDTH),
        }
    }

    fn get_status_transition_mode(&self) -> Result<StatusTransitionMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::STATUS_TRANSITION_MODE, "PERMISSIVE")?;
        Ok(StatusTransitionMode::from_str(&value))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 订单号
    pub const ORDER_NUMBER_PREFIX: &str = "order_number_prefix";
    pub const ORDER_SEQ_WIDTH: &str = "order_seq_width";

    // 订单状态
    pub const STATUS_TRANSITION_MODE: &str = "status_transition_mode";
}
