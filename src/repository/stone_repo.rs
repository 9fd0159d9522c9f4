// ==========================================
// 宝石订单跟踪系统 - 宝石数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: quantity 只允许通过 *_in 的守卫语句修改 (由 InventoryLedger 调用)
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::material::Stone;
use crate::domain::types::StoneUnit;
use crate::repository::error::{decode_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const STONE_COLUMNS: &str =
    "id, name, quantity, unit, weight_per_piece, description, updated_by, created_at, updated_at";

// ==========================================
// StoneRepository - 宝石仓储
// ==========================================
pub struct StoneRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoneRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入宝石（name 重复时返回 UniqueConstraintViolation）
    pub fn insert(&self, stone: &Stone) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stone (
                id, name, quantity, unit, weight_per_piece, description,
                updated_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                stone.id,
                stone.name,
                stone.quantity,
                stone.unit.to_db_str(),
                stone.weight_per_piece,
                stone.description,
                stone.updated_by,
                format_ts(&stone.created_at),
                format_ts(&stone.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Stone>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, id)
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Stone>> {
        let conn = self.get_conn()?;
        let stone = conn
            .query_row(
                &format!("SELECT {} FROM stone WHERE name = ?1", STONE_COLUMNS),
                params![name],
                Self::map_row,
            )
            .optional()?;
        Ok(stone)
    }

    /// 查询全部宝石（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Stone>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM stone ORDER BY name", STONE_COLUMNS))?;
        let stones = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Stone>, _>>()?;
        Ok(stones)
    }

    /// 更新主数据字段（不含 quantity）
    ///
    /// # 返回
    /// - Ok(rows): 受影响行数 (0 表示不存在)
    pub fn update_catalog(&self, stone: &Stone) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE stone
            SET name = ?2, unit = ?3, weight_per_piece = ?4, description = ?5,
                updated_by = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                stone.id,
                stone.name,
                stone.unit.to_db_str(),
                stone.weight_per_piece,
                stone.description,
                stone.updated_by,
                format_ts(&stone.updated_at),
            ],
        )?;
        Ok(rows)
    }

    /// 删除库存为 0 的宝石
    ///
    /// # 返回
    /// - Ok(rows): 0 表示不存在或仍有库存
    pub fn delete_if_empty(&self, id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM stone WHERE id = ?1 AND quantity = 0", params![id])?;
        Ok(rows)
    }

    // ==========================================
    // 事务内访问（调用方持有连接/事务）
    // ==========================================

    /// 按 id 查询宝石
    pub fn find_in(conn: &Connection, id: &str) -> RepositoryResult<Option<Stone>> {
        let stone = conn
            .query_row(
                &format!("SELECT {} FROM stone WHERE id = ?1", STONE_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(stone)
    }

    /// 查询单粒重量（宝石不存在时返回 None）
    pub fn weight_per_piece_in(conn: &Connection, id: &str) -> RepositoryResult<Option<f64>> {
        let weight = conn
            .query_row(
                "SELECT weight_per_piece FROM stone WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(weight)
    }

    /// 守卫式扣减: 仅当库存 >= pieces 时扣减
    ///
    /// # 返回
    /// - Ok(1): 扣减成功
    /// - Ok(0): 宝石不存在或库存不足 (未修改)
    pub fn decrement_quantity_in(conn: &Connection, id: &str, pieces: i64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE stone SET quantity = quantity - ?2 WHERE id = ?1 AND quantity >= ?2",
            params![id, pieces],
        )?;
        Ok(rows)
    }

    /// 回补库存
    ///
    /// # 返回
    /// - Ok(0): 宝石已不存在
    pub fn increment_quantity_in(conn: &Connection, id: &str, pieces: i64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE stone SET quantity = quantity + ?2 WHERE id = ?1",
            params![id, pieces],
        )?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Stone> {
        Ok(Stone {
            id: row.get(0)?,
            name: row.get(1)?,
            quantity: row.get(2)?,
            unit: decode_column(3, &row.get::<_, String>(3)?, StoneUnit::parse)?,
            weight_per_piece: row.get(4)?,
            description: row.get(5)?,
            updated_by: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        })
    }
}
