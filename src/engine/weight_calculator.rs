// ==========================================
// 宝石订单跟踪系统 - 重量计算引擎
// ==========================================
// 公式:
//   stone_weight = Σ stone.weight_per_piece × usage.quantity
//   paper_weight = Σ paper.weight_per_piece × usage.quantity
//   weight_per_piece = stone_weight + paper_weight
//   calculated_weight = weight_per_piece × quantity
// 约束: 纯计算, 无副作用; 已删除的物料贡献为 0
// ==========================================

use crate::domain::order::{PaperUsage, StoneUsage, WeightBreakdown};
use crate::engine::error::OrderResult;
use crate::repository::{PaperRepository, StoneRepository};
use rusqlite::Connection;
use std::collections::HashMap;

// ==========================================
// WeightCatalog - 单件重量来源
// ==========================================
/// 按物料 id 查询单粒/单张重量, 物料不存在时返回 None
pub trait WeightCatalog {
    fn stone_weight_per_piece(&self, stone_id: &str) -> OrderResult<Option<f64>>;
    fn paper_weight_per_piece(&self, paper_id: &str) -> OrderResult<Option<f64>>;
}

/// 基于当前连接/事务的主数据目录
pub struct SqliteWeightCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteWeightCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl WeightCatalog for SqliteWeightCatalog<'_> {
    fn stone_weight_per_piece(&self, stone_id: &str) -> OrderResult<Option<f64>> {
        Ok(StoneRepository::weight_per_piece_in(self.conn, stone_id)?)
    }

    fn paper_weight_per_piece(&self, paper_id: &str) -> OrderResult<Option<f64>> {
        Ok(PaperRepository::weight_per_piece_in(self.conn, paper_id)?)
    }
}

/// 内存目录 (批量预览/测试)
#[derive(Debug, Clone, Default)]
pub struct InMemoryWeightCatalog {
    pub stones: HashMap<String, f64>,
    pub papers: HashMap<String, f64>,
}

impl InMemoryWeightCatalog {
    pub fn with_stone(mut self, id: &str, weight_per_piece: f64) -> Self {
        self.stones.insert(id.to_string(), weight_per_piece);
        self
    }

    pub fn with_paper(mut self, id: &str, weight_per_piece: f64) -> Self {
        self.papers.insert(id.to_string(), weight_per_piece);
        self
    }
}

impl WeightCatalog for InMemoryWeightCatalog {
    fn stone_weight_per_piece(&self, stone_id: &str) -> OrderResult<Option<f64>> {
        Ok(self.stones.get(stone_id).copied())
    }

    fn paper_weight_per_piece(&self, paper_id: &str) -> OrderResult<Option<f64>> {
        Ok(self.papers.get(paper_id).copied())
    }
}

// ==========================================
// WeightCalculator - 重量计算器
// ==========================================
pub struct WeightCalculator {
    // 无状态引擎,不需要字段
}

impl WeightCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算订单重量
    ///
    /// # 参数
    /// - catalog: 单件重量来源 (计算时刻的主数据)
    /// - stones_used / paper_used: BOM 明细
    /// - quantity: 订单件数
    pub fn compute_weight(
        &self,
        catalog: &dyn WeightCatalog,
        stones_used: &[StoneUsage],
        paper_used: &[PaperUsage],
        quantity: i64,
    ) -> OrderResult<WeightBreakdown> {
        let mut stone_weight = 0.0;
        for usage in stones_used {
            if let Some(w) = catalog.stone_weight_per_piece(&usage.stone_id)? {
                stone_weight += w * usage.quantity as f64;
            }
        }

        let mut paper_weight = 0.0;
        for usage in paper_used {
            if let Some(w) = catalog.paper_weight_per_piece(&usage.paper_id)? {
                paper_weight += w * usage.quantity as f64;
            }
        }

        let weight_per_piece = stone_weight + paper_weight;
        Ok(WeightBreakdown {
            calculated_weight: weight_per_piece * quantity as f64,
            weight_per_piece,
            stone_weight,
            paper_weight,
        })
    }
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new()
    }
}
