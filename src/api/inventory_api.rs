// ==========================================
// 宝石订单跟踪系统 - 库存主数据 API
// ==========================================
// 职责: 宝石/纸卷/设计的登记、查询、主数据维护
// 红线: 主数据维护不修改库存数量 (quantity 只经 InventoryLedger 变动)
// 权限: 主数据修改/删除仅限管理员
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::{
    Design, NewDesign, NewPaper, NewStone, Paper, PaperCatalogUpdate, Stone, StoneCatalogUpdate,
};
use crate::domain::order::Actor;
use crate::domain::types::{DesignStatus, InventoryType};
use crate::repository::{DesignRepository, PaperRepository, StoneRepository};

// ==========================================
// InventoryApi - 库存主数据 API
// ==========================================
pub struct InventoryApi {
    stone_repo: Arc<StoneRepository>,
    paper_repo: Arc<PaperRepository>,
    design_repo: Arc<DesignRepository>,
}

impl InventoryApi {
    pub fn new(
        stone_repo: Arc<StoneRepository>,
        paper_repo: Arc<PaperRepository>,
        design_repo: Arc<DesignRepository>,
    ) -> Self {
        Self {
            stone_repo,
            paper_repo,
            design_repo,
        }
    }

    // ==========================================
    // 宝石
    // ==========================================

    /// 登记宝石
    ///
    /// # 校验
    /// - name 非空且全局唯一
    /// - quantity >= 0, weight_per_piece > 0
    pub fn register_stone(&self, input: NewStone, actor: &Actor) -> ApiResult<Stone> {
        let name = require_name(&input.name)?;
        if input.quantity < 0 {
            return Err(ApiError::ValidationError(format!(
                "宝石数量不能为负: {}",
                input.quantity
            )));
        }
        require_positive("weightPerPiece", input.weight_per_piece)?;

        if self.stone_repo.find_by_name(&name)?.is_some() {
            return Err(ApiError::Conflict(format!("宝石名称已存在: {}", name)));
        }

        let ts = now();
        let stone = Stone {
            id: Uuid::new_v4().to_string(),
            name,
            quantity: input.quantity,
            unit: input.unit,
            weight_per_piece: input.weight_per_piece,
            description: input.description,
            updated_by: actor.user_id.clone(),
            created_at: ts,
            updated_at: ts,
        };
        self.stone_repo.insert(&stone)?;

        info!(stone_id = %stone.id, name = %stone.name, quantity = stone.quantity, "宝石已登记");
        Ok(stone)
    }

    pub fn get_stone(&self, stone_id: &str) -> ApiResult<Stone> {
        self.stone_repo
            .find_by_id(stone_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Stone".to_string(),
                id: stone_id.to_string(),
            })
    }

    pub fn list_stones(&self) -> ApiResult<Vec<Stone>> {
        Ok(self.stone_repo.list_all()?)
    }

    /// 修改宝石主数据 (不含库存, 仅管理员)
    pub fn update_stone_catalog(
        &self,
        stone_id: &str,
        update: StoneCatalogUpdate,
        actor: &Actor,
    ) -> ApiResult<Stone> {
        require_admin(actor, "update_stone")?;
        let name = require_name(&update.name)?;
        if let Some(w) = update.weight_per_piece {
            require_positive("weightPerPiece", w)?;
        }

        let mut stone = self.get_stone(stone_id)?;
        if let Some(existing) = self.stone_repo.find_by_name(&name)? {
            if existing.id != stone.id {
                return Err(ApiError::Conflict(format!("宝石名称已存在: {}", name)));
            }
        }

        stone.name = name;
        if let Some(unit) = update.unit {
            stone.unit = unit;
        }
        if let Some(w) = update.weight_per_piece {
            stone.weight_per_piece = w;
        }
        stone.description = update.description;
        stone.updated_by = actor.user_id.clone();
        stone.updated_at = now();

        if self.stone_repo.update_catalog(&stone)? == 0 {
            return Err(ApiError::NotFound {
                entity: "Stone".to_string(),
                id: stone_id.to_string(),
            });
        }

        info!(stone_id, actor = %actor.user_id, "宝石主数据已更新");
        Ok(stone)
    }

    /// 删除宝石 (库存须为 0, 仅管理员)
    pub fn delete_stone(&self, stone_id: &str, actor: &Actor) -> ApiResult<()> {
        require_admin(actor, "delete_stone")?;
        let stone = self.get_stone(stone_id)?;
        if stone.quantity > 0 || self.stone_repo.delete_if_empty(stone_id)? == 0 {
            return Err(ApiError::BusinessRuleViolation(format!(
                "宝石 {} 仍有库存, 不能删除",
                stone.name
            )));
        }

        info!(stone_id, name = %stone.name, actor = %actor.user_id, "宝石已删除");
        Ok(())
    }

    // ==========================================
    // 纸卷
    // ==========================================

    /// 登记纸卷
    ///
    /// # 校验
    /// - (name, inventory_type) 唯一
    /// - width > 0, quantity >= 0 (卷), pieces_per_roll > 0, weight_per_piece > 0
    pub fn register_paper(&self, input: NewPaper, actor: &Actor) -> ApiResult<Paper> {
        let name = require_name(&input.name)?;
        require_positive("width", input.width)?;
        if input.quantity < 0 {
            return Err(ApiError::ValidationError(format!(
                "纸卷数量不能为负: {}",
                input.quantity
            )));
        }
        if input.pieces_per_roll <= 0 {
            return Err(ApiError::ValidationError(format!(
                "每卷张数必须大于0: {}",
                input.pieces_per_roll
            )));
        }
        require_positive("weightPerPiece", input.weight_per_piece)?;

        let ts = now();
        let paper = Paper {
            id: Uuid::new_v4().to_string(),
            name,
            width: input.width,
            quantity: input.quantity,
            pieces_per_roll: input.pieces_per_roll,
            weight_per_piece: input.weight_per_piece,
            inventory_type: input.inventory_type,
            updated_by: actor.user_id.clone(),
            created_at: ts,
            updated_at: ts,
        };
        self.paper_repo.insert(&paper).map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict(format!(
                "纸卷名称已存在: {} ({})",
                paper.name, paper.inventory_type
            )),
            other => other,
        })?;

        info!(paper_id = %paper.id, name = %paper.name, rolls = paper.quantity, "纸卷已登记");
        Ok(paper)
    }

    pub fn get_paper(&self, paper_id: &str) -> ApiResult<Paper> {
        self.paper_repo
            .find_by_id(paper_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Paper".to_string(),
                id: paper_id.to_string(),
            })
    }

    /// 按库存类型查询纸卷 (默认 internal, 按宽度升序)
    pub fn list_papers(&self, inventory_type: Option<&str>) -> ApiResult<Vec<Paper>> {
        let inventory_type = match inventory_type {
            Some(raw) => InventoryType::parse(raw)
                .ok_or_else(|| ApiError::ValidationError(format!("未知的库存类型: {}", raw)))?,
            None => InventoryType::default(),
        };
        Ok(self.paper_repo.list_by_inventory_type(inventory_type)?)
    }

    /// 修改纸卷主数据 (不含库存, 仅管理员)
    pub fn update_paper_catalog(
        &self,
        paper_id: &str,
        update: PaperCatalogUpdate,
        actor: &Actor,
    ) -> ApiResult<Paper> {
        require_admin(actor, "update_paper")?;
        let name = require_name(&update.name)?;
        require_positive("width", update.width)?;
        if update.pieces_per_roll <= 0 {
            return Err(ApiError::ValidationError(format!(
                "每卷张数必须大于0: {}",
                update.pieces_per_roll
            )));
        }
        require_positive("weightPerPiece", update.weight_per_piece)?;

        let mut paper = self.get_paper(paper_id)?;
        paper.name = name;
        paper.width = update.width;
        paper.pieces_per_roll = update.pieces_per_roll;
        paper.weight_per_piece = update.weight_per_piece;
        paper.updated_by = actor.user_id.clone();
        paper.updated_at = now();

        let rows = self.paper_repo.update_catalog(&paper).map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict(format!(
                "纸卷名称已存在: {} ({})",
                paper.name, paper.inventory_type
            )),
            other => other,
        })?;
        if rows == 0 {
            return Err(ApiError::NotFound {
                entity: "Paper".to_string(),
                id: paper_id.to_string(),
            });
        }

        info!(paper_id, actor = %actor.user_id, "纸卷主数据已更新");
        Ok(paper)
    }

    /// 删除纸卷 (库存须为 0, 仅管理员)
    pub fn delete_paper(&self, paper_id: &str, actor: &Actor) -> ApiResult<()> {
        require_admin(actor, "delete_paper")?;
        let paper = self.get_paper(paper_id)?;
        if paper.quantity > 0 || self.paper_repo.delete_if_empty(paper_id)? == 0 {
            return Err(ApiError::BusinessRuleViolation(format!(
                "纸卷 {} 仍有库存, 不能删除",
                paper.name
            )));
        }

        info!(paper_id, name = %paper.name, actor = %actor.user_id, "纸卷已删除");
        Ok(())
    }

    // ==========================================
    // 设计
    // ==========================================

    /// 登记设计 (number 唯一)
    pub fn register_design(&self, input: NewDesign, actor: &Actor) -> ApiResult<Design> {
        let name = require_name(&input.name)?;
        let number = input.number.trim().to_string();
        if number.is_empty() {
            return Err(ApiError::ValidationError("设计编号不能为空".to_string()));
        }

        let ts = now();
        let design = Design {
            id: Uuid::new_v4().to_string(),
            name,
            number,
            description: input.description,
            image_url: input.image_url,
            status: DesignStatus::Active,
            created_by: actor.user_id.clone(),
            created_at: ts,
            updated_at: ts,
        };
        self.design_repo.insert(&design).map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict(format!("设计编号已存在: {}", design.number))
            }
            other => other,
        })?;

        info!(design_id = %design.id, number = %design.number, "设计已登记");
        Ok(design)
    }

    pub fn get_design(&self, design_id: &str) -> ApiResult<Design> {
        self.design_repo
            .find_by_id(design_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Design".to_string(),
                id: design_id.to_string(),
            })
    }

    pub fn list_designs(&self) -> ApiResult<Vec<Design>> {
        Ok(self.design_repo.list_all()?)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn require_admin(actor: &Actor, action: &str) -> ApiResult<()> {
    if actor.is_admin() {
        return Ok(());
    }
    warn!(actor = %actor.user_id, action, "非管理员尝试修改主数据");
    Err(ApiError::PermissionDenied(action.to_string()))
}

fn require_name(raw: &str) -> ApiResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::ValidationError("名称不能为空".to_string()));
    }
    Ok(name.to_string())
}

fn require_positive(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::ValidationError(format!(
            "{} 必须大于0: {}",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_guards() {
        assert!(require_name("  ").is_err());
        assert_eq!(require_name(" Ruby ").unwrap(), "Ruby");
        assert!(require_positive("width", 0.0).is_err());
        assert!(require_positive("width", f64::NAN).is_err());
        assert!(require_positive("width", 0.1).is_ok());
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&Actor::admin("root"), "delete_stone").is_ok());
        let err = require_admin(&Actor::user("u1"), "delete_stone").unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }
}
