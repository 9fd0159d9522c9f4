// ==========================================
// 宝石订单跟踪系统 - 订单日序号仓储
// ==========================================
// 表: order_day_sequence(day, last_seq)
// 约束: 取号为单条 upsert ... RETURNING, 与订单写入同一事务
// ==========================================

use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

pub struct OrderSequenceRepository;

impl OrderSequenceRepository {
    /// 原子地领取某日的下一个序号
    ///
    /// 说明：
    /// - 当日首次取号时以“当日已有订单数 + 1”作为起点（兼容无计数器的历史数据）
    /// - 之后严格递增，删除订单释放的序号不会被复用
    pub fn next_seq_in(conn: &Connection, day: NaiveDate) -> RepositoryResult<i64> {
        let day_str = day.format("%Y-%m-%d").to_string();
        let seq: i64 = conn.query_row(
            r#"
            INSERT INTO order_day_sequence (day, last_seq)
            VALUES (
                ?1,
                (SELECT COUNT(*) FROM orders WHERE substr(created_at, 1, 10) = ?1) + 1
            )
            ON CONFLICT(day) DO UPDATE SET last_seq = last_seq + 1
            RETURNING last_seq
            "#,
            params![day_str],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// 查询某日已发放的最大序号
    pub fn current_seq_in(conn: &Connection, day: NaiveDate) -> RepositoryResult<Option<i64>> {
        let seq = conn
            .query_row(
                "SELECT last_seq FROM order_day_sequence WHERE day = ?1",
                params![day.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq)
    }
}
