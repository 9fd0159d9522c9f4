// ==========================================
// 宝石订单跟踪系统 - 物料与设计领域模型
// ==========================================
// 职责: 宝石(按粒计)、纸卷(按卷存、按张耗)、设计主数据
// 红线: quantity 字段只能经由 InventoryLedger 修改
// ==========================================

use crate::domain::types::{DesignStatus, InventoryType, StoneUnit};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Stone - 宝石 (按粒计数)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stone {
    pub id: String,
    pub name: String,                // 名称 (全局唯一)
    pub quantity: i64,               // 库存 (粒)
    pub unit: StoneUnit,             // 计量单位
    pub weight_per_piece: f64,       // 单粒重量
    pub description: Option<String>, // 描述
    pub updated_by: String,          // 最后修改人
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// Paper - 纸卷 (按卷存储, 按张消耗)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub name: String,                  // 名称 (与 inventory_type 联合唯一)
    pub width: f64,                    // 宽度
    pub quantity: i64,                 // 库存 (卷)
    pub pieces_per_roll: i64,          // 每卷张数
    pub weight_per_piece: f64,         // 单张重量
    pub inventory_type: InventoryType, // 库存类型
    pub updated_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Paper {
    /// 可用张数 = 卷数 × 每卷张数 (超出 i64 范围时饱和为 i64::MAX)
    pub fn available_pieces(&self) -> i64 {
        self.quantity.saturating_mul(self.pieces_per_roll)
    }
}

// ==========================================
// Design - 设计 (订单必须引用有效设计)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: String,
    pub name: String,
    pub number: String, // 设计编号 (唯一)
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: DesignStatus,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// 主数据登记/维护入参
// ==========================================

/// 新建宝石
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStone {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit: StoneUnit,
    pub weight_per_piece: f64,
    pub description: Option<String>,
}

/// 新建纸卷
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaper {
    pub name: String,
    pub width: f64,
    pub quantity: i64,
    pub pieces_per_roll: i64,
    pub weight_per_piece: f64,
    #[serde(default)]
    pub inventory_type: InventoryType,
}

/// 新建设计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDesign {
    pub name: String,
    pub number: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// 宝石主数据修改 (不含库存)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneCatalogUpdate {
    pub name: String,
    pub unit: Option<StoneUnit>,
    pub weight_per_piece: Option<f64>,
    pub description: Option<String>,
}

/// 纸卷主数据修改 (不含库存)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperCatalogUpdate {
    pub name: String,
    pub width: f64,
    pub pieces_per_roll: i64,
    pub weight_per_piece: f64,
}
