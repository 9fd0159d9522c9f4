// ==========================================
// 宝石订单跟踪系统 - 订单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: orders + order_stone_usage + order_paper_usage (明细随订单级联删除)
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::order::{Order, OrderFilter, PaperUsage, StoneUsage};
use crate::domain::types::{OrderStatus, OrderType};
use crate::repository::error::{decode_column, RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = "id, order_number, design_id, order_type, status, quantity, \
     calculated_weight, final_weight, weight_discrepancy, notes, \
     created_by, updated_by, created_at, updated_at";

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, id)
    }

    pub fn list(&self, filter: &OrderFilter) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        Self::list_in(&conn, filter)
    }

    // ==========================================
    // 事务内访问（调用方持有连接/事务）
    // ==========================================

    /// 插入订单及其 BOM 明细
    pub fn insert_in(conn: &Connection, order: &Order) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO orders (
                id, order_number, design_id, order_type, status, quantity,
                calculated_weight, final_weight, weight_discrepancy, notes,
                created_by, updated_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                order.id,
                order.order_number,
                order.design_id,
                order.order_type.to_db_str(),
                order.status.to_db_str(),
                order.quantity,
                order.calculated_weight,
                order.final_weight,
                order.weight_discrepancy,
                order.notes,
                order.created_by,
                order.updated_by,
                format_ts(&order.created_at),
                format_ts(&order.updated_at),
            ],
        )?;

        {
            let mut stmt = conn.prepare(
                "INSERT INTO order_stone_usage (order_id, line_no, stone_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (line_no, usage) in order.stones_used.iter().enumerate() {
                stmt.execute(params![order.id, line_no as i64, usage.stone_id, usage.quantity])?;
            }
        }
        {
            let mut stmt = conn.prepare(
                "INSERT INTO order_paper_usage (order_id, line_no, paper_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (line_no, usage) in order.paper_used.iter().enumerate() {
                stmt.execute(params![order.id, line_no as i64, usage.paper_id, usage.quantity])?;
            }
        }

        Ok(())
    }

    /// 按 id 查询订单（含明细）
    pub fn find_in(conn: &Connection, id: &str) -> RepositoryResult<Option<Order>> {
        let order = conn
            .query_row(
                &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;

        match order {
            Some(mut order) => {
                Self::load_usage_in(conn, &mut order)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// 按过滤条件查询订单（创建时间倒序）
    pub fn list_in(conn: &Connection, filter: &OrderFilter) -> RepositoryResult<Vec<Order>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            values.push(status.to_db_str().to_string());
            clauses.push("status = ?");
        }
        if let Some(order_type) = filter.order_type {
            values.push(order_type.to_db_str().to_string());
            clauses.push("order_type = ?");
        }
        if let Some(design_id) = &filter.design_id {
            values.push(design_id.clone());
            clauses.push("design_id = ?");
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM orders {} ORDER BY created_at DESC, order_number DESC",
            ORDER_COLUMNS, where_sql
        ))?;
        let mut orders = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<Result<Vec<Order>, _>>()?;

        for order in orders.iter_mut() {
            Self::load_usage_in(conn, order)?;
        }
        Ok(orders)
    }

    /// 查询全部订单 id（批量重算用）
    pub fn list_ids_in(conn: &Connection) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT id FROM orders ORDER BY created_at, order_number")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// 更新可变字段（状态/备注/重量/更新人）
    ///
    /// # 返回
    /// - Ok(rows): 0 表示订单不存在
    pub fn update_mutable_fields_in(conn: &Connection, order: &Order) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"
            UPDATE orders
            SET status = ?2, notes = ?3, calculated_weight = ?4, final_weight = ?5,
                weight_discrepancy = ?6, updated_by = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                order.id,
                order.status.to_db_str(),
                order.notes,
                order.calculated_weight,
                order.final_weight,
                order.weight_discrepancy,
                order.updated_by,
                format_ts(&order.updated_at),
            ],
        )?;
        Ok(rows)
    }

    /// 删除订单（明细级联删除）
    pub fn delete_in(conn: &Connection, id: &str) -> RepositoryResult<usize> {
        let rows = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
        Ok(rows)
    }

    fn load_usage_in(conn: &Connection, order: &mut Order) -> RepositoryResult<()> {
        let mut stmt = conn.prepare(
            "SELECT stone_id, quantity FROM order_stone_usage WHERE order_id = ?1 ORDER BY line_no",
        )?;
        order.stones_used = stmt
            .query_map(params![order.id], |row| {
                Ok(StoneUsage {
                    stone_id: row.get(0)?,
                    quantity: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<StoneUsage>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT paper_id, quantity FROM order_paper_usage WHERE order_id = ?1 ORDER BY line_no",
        )?;
        order.paper_used = stmt
            .query_map(params![order.id], |row| {
                Ok(PaperUsage {
                    paper_id: row.get(0)?,
                    quantity: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<PaperUsage>, _>>()?;

        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Order> {
        Ok(Order {
            id: row.get(0)?,
            order_number: row.get(1)?,
            design_id: row.get(2)?,
            order_type: decode_column(3, &row.get::<_, String>(3)?, OrderType::parse)?,
            status: decode_column(4, &row.get::<_, String>(4)?, OrderStatus::parse)?,
            quantity: row.get(5)?,
            stones_used: Vec::new(),
            paper_used: Vec::new(),
            calculated_weight: row.get(6)?,
            final_weight: row.get(7)?,
            weight_discrepancy: row.get(8)?,
            notes: row.get(9)?,
            created_by: row.get(10)?,
            updated_by: row.get(11)?,
            created_at: parse_ts(12, &row.get::<_, String>(12)?)?,
            updated_at: parse_ts(13, &row.get::<_, String>(13)?)?,
        })
    }
}
