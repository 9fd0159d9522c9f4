// ==========================================
// 宝石订单跟踪系统 - 纸卷数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑 (张/卷换算在 InventoryLedger)
// 约束: quantity 单位为“卷”
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::material::Paper;
use crate::domain::types::InventoryType;
use crate::repository::error::{decode_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const PAPER_COLUMNS: &str = "id, name, width, quantity, pieces_per_roll, weight_per_piece, \
     inventory_type, updated_by, created_at, updated_at";

// ==========================================
// PaperRepository - 纸卷仓储
// ==========================================
pub struct PaperRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaperRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入纸卷（(name, inventory_type) 重复时返回 UniqueConstraintViolation）
    pub fn insert(&self, paper: &Paper) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO paper (
                id, name, width, quantity, pieces_per_roll, weight_per_piece,
                inventory_type, updated_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                paper.id,
                paper.name,
                paper.width,
                paper.quantity,
                paper.pieces_per_roll,
                paper.weight_per_piece,
                paper.inventory_type.to_db_str(),
                paper.updated_by,
                format_ts(&paper.created_at),
                format_ts(&paper.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Paper>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, id)
    }

    /// 按库存类型查询纸卷（按宽度升序）
    pub fn list_by_inventory_type(&self, inventory_type: InventoryType) -> RepositoryResult<Vec<Paper>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM paper WHERE inventory_type = ?1 ORDER BY width, name",
            PAPER_COLUMNS
        ))?;
        let papers = stmt
            .query_map(params![inventory_type.to_db_str()], Self::map_row)?
            .collect::<Result<Vec<Paper>, _>>()?;
        Ok(papers)
    }

    /// 更新主数据字段（不含 quantity / inventory_type）
    pub fn update_catalog(&self, paper: &Paper) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE paper
            SET name = ?2, width = ?3, pieces_per_roll = ?4, weight_per_piece = ?5,
                updated_by = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                paper.id,
                paper.name,
                paper.width,
                paper.pieces_per_roll,
                paper.weight_per_piece,
                paper.updated_by,
                format_ts(&paper.updated_at),
            ],
        )?;
        Ok(rows)
    }

    /// 删除库存为 0 的纸卷
    pub fn delete_if_empty(&self, id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM paper WHERE id = ?1 AND quantity = 0", params![id])?;
        Ok(rows)
    }

    // ==========================================
    // 事务内访问（调用方持有连接/事务）
    // ==========================================

    pub fn find_in(conn: &Connection, id: &str) -> RepositoryResult<Option<Paper>> {
        let paper = conn
            .query_row(
                &format!("SELECT {} FROM paper WHERE id = ?1", PAPER_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(paper)
    }

    /// 查询单张重量（纸卷不存在时返回 None）
    pub fn weight_per_piece_in(conn: &Connection, id: &str) -> RepositoryResult<Option<f64>> {
        let weight = conn
            .query_row(
                "SELECT weight_per_piece FROM paper WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(weight)
    }

    /// 守卫式扣减卷数: 仅当库存卷数 >= rolls 时扣减
    ///
    /// # 返回
    /// - Ok(1): 扣减成功
    /// - Ok(0): 纸卷不存在或卷数不足 (未修改)
    pub fn decrement_rolls_in(conn: &Connection, id: &str, rolls: i64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE paper SET quantity = quantity - ?2 WHERE id = ?1 AND quantity >= ?2",
            params![id, rolls],
        )?;
        Ok(rows)
    }

    /// 回补卷数
    pub fn increment_rolls_in(conn: &Connection, id: &str, rolls: i64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE paper SET quantity = quantity + ?2 WHERE id = ?1",
            params![id, rolls],
        )?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Paper> {
        Ok(Paper {
            id: row.get(0)?,
            name: row.get(1)?,
            width: row.get(2)?,
            quantity: row.get(3)?,
            pieces_per_roll: row.get(4)?,
            weight_per_piece: row.get(5)?,
            inventory_type: decode_column(6, &row.get::<_, String>(6)?, InventoryType::parse)?,
            updated_by: row.get(7)?,
            created_at: parse_ts(8, &row.get::<_, String>(8)?)?,
            updated_at: parse_ts(9, &row.get::<_, String>(9)?)?,
        })
    }
}
