// ==========================================
// 宝石订单跟踪系统 - 设计数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::material::Design;
use crate::domain::types::DesignStatus;
use crate::repository::error::{decode_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DESIGN_COLUMNS: &str =
    "id, name, number, description, image_url, status, created_by, created_at, updated_at";

// ==========================================
// DesignRepository - 设计仓储
// ==========================================
pub struct DesignRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DesignRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入设计（number 重复时返回 UniqueConstraintViolation）
    pub fn insert(&self, design: &Design) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO design (
                id, name, number, description, image_url, status,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                design.id,
                design.name,
                design.number,
                design.description,
                design.image_url,
                design.status.to_db_str(),
                design.created_by,
                format_ts(&design.created_at),
                format_ts(&design.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Design>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, id)
    }

    /// 查询全部设计（按编号排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Design>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM design ORDER BY number",
            DESIGN_COLUMNS
        ))?;
        let designs = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Design>, _>>()?;
        Ok(designs)
    }

    // ==========================================
    // 事务内访问（调用方持有连接/事务）
    // ==========================================

    /// 按 id 查询设计
    pub fn find_in(conn: &Connection, id: &str) -> RepositoryResult<Option<Design>> {
        let design = conn
            .query_row(
                &format!("SELECT {} FROM design WHERE id = ?1", DESIGN_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(design)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Design> {
        Ok(Design {
            id: row.get(0)?,
            name: row.get(1)?,
            number: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            status: decode_column(5, &row.get::<_, String>(5)?, DesignStatus::parse)?,
            created_by: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        })
    }
}
