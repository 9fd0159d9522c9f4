// ==========================================
// 宝石订单跟踪系统 - 库存账本引擎
// ==========================================
// 职责: 宝石/纸卷库存的唯一修改入口 + 可用量校验
// 红线: 其他组件不得直接写 stone.quantity / paper.quantity
// 约束: 纸卷按“卷”存储、按“张”消耗, 扣减与回补各自向上取整
// 并发: 扣减为守卫式 compare-and-decrement, 库存永不为负
// ==========================================

use crate::domain::material::{Paper, Stone};
use crate::engine::error::{MaterialKind, OrderError, OrderResult};
use crate::repository::{PaperRepository, StoneRepository};
use rusqlite::Connection;
use tracing::{debug, warn};

// ==========================================
// InventoryLedger - 库存账本
// ==========================================
// 无状态: 所有操作在调用方持有的连接/事务上执行
pub struct InventoryLedger {
    // 无状态引擎,不需要字段
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self {}
    }

    /// 张数换算为卷数 (向上取整)
    ///
    /// # 参数
    /// - pieces: 张数 (>= 0)
    /// - pieces_per_roll: 每卷张数 (> 0)
    pub fn rolls_for_pieces(pieces: i64, pieces_per_roll: i64) -> OrderResult<i64> {
        if pieces_per_roll <= 0 {
            return Err(OrderError::Validation(format!(
                "每卷张数必须大于0: {}",
                pieces_per_roll
            )));
        }
        if pieces < 0 {
            return Err(OrderError::Validation(format!("张数不能为负: {}", pieces)));
        }
        Ok(pieces / pieces_per_roll + i64::from(pieces % pieces_per_roll != 0))
    }

    // ==========================================
    // 可用量校验
    // ==========================================

    /// 校验宝石库存是否足够
    ///
    /// # 返回
    /// - Ok(Stone): 校验时刻的宝石快照
    /// - Err(NotFound): 宝石不存在
    /// - Err(InsufficientStock): quantity < pieces
    pub fn check_stone_available(
        &self,
        conn: &Connection,
        stone_id: &str,
        pieces: i64,
    ) -> OrderResult<Stone> {
        let stone = StoneRepository::find_in(conn, stone_id)?
            .ok_or_else(|| OrderError::not_found("Stone", stone_id))?;

        if stone.quantity < pieces {
            warn!(
                stone_id = %stone.id,
                name = %stone.name,
                available = stone.quantity,
                requested = pieces,
                "宝石库存不足"
            );
            return Err(OrderError::InsufficientStock {
                material: MaterialKind::Stone,
                material_id: stone.id.clone(),
                name: stone.name.clone(),
                available: stone.quantity,
                requested: pieces,
            });
        }

        Ok(stone)
    }

    /// 校验纸卷可用张数是否足够 (可用张数 = 卷数 × 每卷张数)
    pub fn check_paper_available(
        &self,
        conn: &Connection,
        paper_id: &str,
        pieces: i64,
    ) -> OrderResult<Paper> {
        let paper = PaperRepository::find_in(conn, paper_id)?
            .ok_or_else(|| OrderError::not_found("Paper", paper_id))?;

        let available = paper.available_pieces();
        if available < pieces {
            warn!(
                paper_id = %paper.id,
                name = %paper.name,
                available,
                requested = pieces,
                "纸张库存不足"
            );
            return Err(OrderError::InsufficientStock {
                material: MaterialKind::Paper,
                material_id: paper.id.clone(),
                name: paper.name.clone(),
                available,
                requested: pieces,
            });
        }

        Ok(paper)
    }

    // ==========================================
    // 扣减
    // ==========================================

    /// 扣减宝石库存 (quantity -= pieces)
    pub fn deduct_stone(&self, conn: &Connection, stone_id: &str, pieces: i64) -> OrderResult<()> {
        let rows = StoneRepository::decrement_quantity_in(conn, stone_id, pieces)?;
        if rows == 0 {
            // 守卫未命中: 重新读取以区分“不存在”与“库存不足”
            let stone = self.check_stone_available(conn, stone_id, pieces)?;
            return Err(OrderError::InsufficientStock {
                material: MaterialKind::Stone,
                material_id: stone.id,
                name: stone.name,
                available: stone.quantity,
                requested: pieces,
            });
        }

        debug!(stone_id, pieces, "宝石库存已扣减");
        Ok(())
    }

    /// 扣减纸卷库存 (quantity -= ceil(pieces / pieces_per_roll))
    ///
    /// # 返回
    /// - Ok(rolls): 实际扣减的卷数
    pub fn deduct_paper(&self, conn: &Connection, paper_id: &str, pieces: i64) -> OrderResult<i64> {
        let paper = PaperRepository::find_in(conn, paper_id)?
            .ok_or_else(|| OrderError::not_found("Paper", paper_id))?;
        let rolls = Self::rolls_for_pieces(pieces, paper.pieces_per_roll)?;

        let rows = PaperRepository::decrement_rolls_in(conn, paper_id, rolls)?;
        if rows == 0 {
            warn!(
                paper_id,
                available_rolls = paper.quantity,
                requested_rolls = rolls,
                "纸卷卷数不足"
            );
            return Err(OrderError::InsufficientStock {
                material: MaterialKind::Paper,
                material_id: paper.id.clone(),
                name: paper.name.clone(),
                available: paper.available_pieces(),
                requested: pieces,
            });
        }

        debug!(paper_id, pieces, rolls, "纸卷库存已扣减");
        Ok(rolls)
    }

    // ==========================================
    // 回补
    // ==========================================

    /// 回补宝石库存 (quantity += pieces)
    ///
    /// # 返回
    /// - Ok(false): 宝石已不存在, 跳过回补
    pub fn restore_stone(&self, conn: &Connection, stone_id: &str, pieces: i64) -> OrderResult<bool> {
        let rows = StoneRepository::increment_quantity_in(conn, stone_id, pieces)?;
        if rows == 0 {
            warn!(stone_id, pieces, "宝石不存在, 跳过库存回补");
            return Ok(false);
        }
        debug!(stone_id, pieces, "宝石库存已回补");
        Ok(true)
    }

    /// 回补纸卷库存 (quantity += ceil(pieces / pieces_per_roll))
    ///
    /// 与扣减独立取整, 不追踪已拆卷的剩余张数
    pub fn restore_paper(&self, conn: &Connection, paper_id: &str, pieces: i64) -> OrderResult<bool> {
        let paper = match PaperRepository::find_in(conn, paper_id)? {
            Some(p) => p,
            None => {
                warn!(paper_id, pieces, "纸卷不存在, 跳过库存回补");
                return Ok(false);
            }
        };
        let rolls = Self::rolls_for_pieces(pieces, paper.pieces_per_roll)?;
        PaperRepository::increment_rolls_in(conn, paper_id, rolls)?;
        debug!(paper_id, pieces, rolls, "纸卷库存已回补");
        Ok(true)
    }
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
