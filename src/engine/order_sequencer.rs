// ==========================================
// 宝石订单跟踪系统 - 订单编号生成
// ==========================================
// 格式: {prefix}-{YYYYMMDD}-{seq}, seq 按日递增并补零 (默认 ORD / 3 位)
// 并发: 取号与订单写入处于同一事务, 序号由单条 upsert 原子领取
// ==========================================

use crate::config::order_policy_trait::{DEFAULT_ORDER_NUMBER_PREFIX, DEFAULT_ORDER_SEQ_WIDTH};
use crate::engine::error::OrderResult;
use crate::repository::OrderSequenceRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSequencer {
    prefix: String,
    width: usize,
}

impl OrderSequencer {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width: width.max(1),
        }
    }

    /// 格式化订单编号 (序号超出位宽时按实际位数输出)
    pub fn format_order_number(&self, day: NaiveDate, seq: i64) -> String {
        format!(
            "{}-{}-{:0width$}",
            self.prefix,
            day.format("%Y%m%d"),
            seq,
            width = self.width
        )
    }

    /// 领取某日的下一个订单编号
    ///
    /// 须在写入订单的同一事务内调用, 事务回滚时序号一并回滚
    pub fn next_order_number(&self, conn: &Connection, day: NaiveDate) -> OrderResult<String> {
        let seq = OrderSequenceRepository::next_seq_in(conn, day)?;
        let number = self.format_order_number(day, seq);
        debug!(%day, seq, order_number = %number, "分配订单编号");
        Ok(number)
    }
}

impl Default for OrderSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER_NUMBER_PREFIX, DEFAULT_ORDER_SEQ_WIDTH)
    }
}
