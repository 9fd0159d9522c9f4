// ==========================================
// 宝石订单跟踪系统 - 订单生命周期引擎
// ==========================================
// 职责: 创建 / 重算重量 / 更新 / 删除 / 查询订单
// 红线: 校验先于任何写入; 库存只经 InventoryLedger 修改
// 事务: 每个写操作在单个 IMMEDIATE 事务内完成
//       (订单行 + BOM 明细 + 日序号 + 库存变动 + 操作日志)
// ==========================================

use crate::config::order_policy_trait::OrderPolicyReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::order::{Actor, NewOrder, Order, OrderFilter, OrderPatch, WeightBreakdown};
use crate::domain::types::{OrderStatus, StatusTransitionMode};
use crate::engine::error::{OrderError, OrderResult};
use crate::engine::inventory_ledger::InventoryLedger;
use crate::engine::order_sequencer::OrderSequencer;
use crate::engine::weight_calculator::{SqliteWeightCatalog, WeightCalculator};
use crate::repository::{ActionLogRepository, DesignRepository, OrderRepository};
use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// BatchRecalcSummary - 全量重算结果
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecalcSummary {
    pub success: usize, // 已更新
    pub skipped: usize, // 无 BOM 或计算重量 <= 0
    pub errors: usize,  // 单订单失败 (不中断批次)
}

// ==========================================
// OrderLifecycleManager - 订单生命周期管理
// ==========================================
pub struct OrderLifecycleManager<C>
where
    C: OrderPolicyReader,
{
    conn: Arc<Mutex<Connection>>,
    policy: Arc<C>,
    ledger: InventoryLedger,
    calculator: WeightCalculator,
}

impl<C> OrderLifecycleManager<C>
where
    C: OrderPolicyReader,
{
    /// 创建新的 OrderLifecycleManager 实例
    ///
    /// # 参数
    /// - conn: 与各仓储共享的数据库连接
    /// - policy: 订单策略配置读取器
    pub fn new(conn: Arc<Mutex<Connection>>, policy: Arc<C>) -> Self {
        Self {
            conn,
            policy,
            ledger: InventoryLedger::new(),
            calculator: WeightCalculator::new(),
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建订单 (以本地当前时间分配编号)
    pub fn create_order(&self, new_order: &NewOrder, actor: &Actor) -> OrderResult<Order> {
        self.create_order_at(new_order, actor, now())
    }

    /// 创建订单
    ///
    /// # 流程
    /// 1. 入参校验 + 设计存在性校验
    /// 2. 逐条校验宝石/纸张可用量 (任何失败均无副作用)
    /// 3. 分配订单编号
    /// 4. 计算重量
    /// 5. 写入订单 (status = pending)
    /// 6. 扣减库存 (守卫式, 兜底防超卖)
    /// 7. 写操作日志并提交
    ///
    /// # 参数
    /// - now: 创建时间, 决定订单编号中的日期
    #[instrument(skip(self, new_order, actor), fields(design_id = %new_order.design_id, actor = %actor.user_id))]
    pub fn create_order_at(
        &self,
        new_order: &NewOrder,
        actor: &Actor,
        now: NaiveDateTime,
    ) -> OrderResult<Order> {
        validate_new_order(new_order)?;
        let sequencer = self.sequencer()?;

        let mut conn = self.lock()?;
        let tx = begin_immediate(&mut conn)?;

        // === 步骤 1: 设计必须存在 ===
        if DesignRepository::find_in(&tx, &new_order.design_id)?.is_none() {
            return Err(OrderError::not_found("Design", &new_order.design_id));
        }

        // === 步骤 2: 可用量校验 ===
        for usage in &new_order.stones_used {
            self.ledger
                .check_stone_available(&tx, &usage.stone_id, usage.quantity)?;
        }
        for usage in &new_order.paper_used {
            self.ledger
                .check_paper_available(&tx, &usage.paper_id, usage.quantity)?;
        }

        // === 步骤 3: 订单编号 ===
        let order_number = sequencer.next_order_number(&tx, now.date())?;

        // === 步骤 4: 重量 ===
        let breakdown = self.calculator.compute_weight(
            &SqliteWeightCatalog::new(&tx),
            &new_order.stones_used,
            &new_order.paper_used,
            new_order.quantity,
        )?;

        // === 步骤 5: 写入订单 ===
        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number,
            design_id: new_order.design_id.clone(),
            order_type: new_order.order_type,
            status: OrderStatus::Pending,
            quantity: new_order.quantity,
            stones_used: new_order.stones_used.clone(),
            paper_used: new_order.paper_used.clone(),
            calculated_weight: breakdown.calculated_weight,
            final_weight: None,
            weight_discrepancy: 0.0,
            notes: new_order.notes.clone(),
            created_by: actor.user_id.clone(),
            updated_by: actor.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        OrderRepository::insert_in(&tx, &order)?;

        // === 步骤 6: 扣减库存 ===
        for usage in &order.stones_used {
            self.ledger.deduct_stone(&tx, &usage.stone_id, usage.quantity)?;
        }
        for usage in &order.paper_used {
            self.ledger.deduct_paper(&tx, &usage.paper_id, usage.quantity)?;
        }

        // === 步骤 7: 操作日志 ===
        let log = ActionLog::new(
            ActionType::CreateOrder,
            &actor.user_id,
            Some(&order.id),
            Some(json!({
                "order_number": order.order_number,
                "order_type": order.order_type.to_db_str(),
                "quantity": order.quantity,
                "stones_used": order.stones_used,
                "paper_used": order.paper_used,
                "calculated_weight": order.calculated_weight,
            })),
            None,
            now,
        );
        ActionLogRepository::insert_in(&tx, &log)?;

        tx.commit()?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            calculated_weight = order.calculated_weight,
            "订单已创建"
        );
        Ok(order)
    }

    // ==========================================
    // 重量重算
    // ==========================================

    /// 按当前主数据重算订单重量 (不触碰库存)
    ///
    /// # 返回
    /// - (更新后的订单, 重量明细)
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub fn recalculate_order_weight(
        &self,
        order_id: &str,
        actor: &Actor,
    ) -> OrderResult<(Order, WeightBreakdown)> {
        let mut conn = self.lock()?;
        let tx = begin_immediate(&mut conn)?;
        let ts = now();

        let mut order = OrderRepository::find_in(&tx, order_id)?
            .ok_or_else(|| OrderError::not_found("Order", order_id))?;
        let previous = order.calculated_weight;

        let breakdown = self.apply_recalculation(&tx, &mut order, actor, ts)?;

        let log = ActionLog::new(
            ActionType::RecalculateWeight,
            &actor.user_id,
            Some(&order.id),
            Some(json!({
                "previous_weight": previous,
                "calculated_weight": order.calculated_weight,
                "weight_discrepancy": order.weight_discrepancy,
            })),
            None,
            ts,
        );
        ActionLogRepository::insert_in(&tx, &log)?;

        tx.commit()?;

        info!(
            order_id,
            previous_weight = previous,
            calculated_weight = order.calculated_weight,
            "订单重量已重算"
        );
        Ok((order, breakdown))
    }

    /// 全量重算: 逐单重算, 单订单失败计入 errors 不中断批次
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub fn recalculate_all_weights(&self, actor: &Actor) -> OrderResult<BatchRecalcSummary> {
        let mut conn = self.lock()?;
        let mut tx = begin_immediate(&mut conn)?;
        let ts = now();
        let mut summary = BatchRecalcSummary::default();

        let ids = OrderRepository::list_ids_in(&tx)?;
        for id in &ids {
            let sp = tx.savepoint()?;
            match self.recalculate_one_in_batch(&sp, id, actor, ts) {
                Ok(true) => {
                    sp.commit()?;
                    summary.success += 1;
                }
                Ok(false) => {
                    summary.skipped += 1;
                }
                Err(e) => {
                    // savepoint 随 drop 回滚
                    warn!(order_id = %id, error = %e, "订单重量重算失败");
                    summary.errors += 1;
                }
            }
        }

        let log = ActionLog::new(
            ActionType::BatchRecalculate,
            &actor.user_id,
            None,
            Some(json!({
                "total": ids.len(),
                "success": summary.success,
                "skipped": summary.skipped,
                "errors": summary.errors,
            })),
            None,
            ts,
        );
        ActionLogRepository::insert_in(&tx, &log)?;

        tx.commit()?;

        info!(
            total = ids.len(),
            success = summary.success,
            skipped = summary.skipped,
            errors = summary.errors,
            "全量重量重算完成"
        );
        Ok(summary)
    }

    /// 批次中的单订单重算
    ///
    /// # 返回
    /// - Ok(true): 已更新
    /// - Ok(false): 跳过 (无 BOM 或计算重量 <= 0)
    fn recalculate_one_in_batch(
        &self,
        conn: &Connection,
        order_id: &str,
        actor: &Actor,
        ts: NaiveDateTime,
    ) -> OrderResult<bool> {
        let mut order = OrderRepository::find_in(conn, order_id)?
            .ok_or_else(|| OrderError::not_found("Order", order_id))?;

        if !order.has_usage() {
            debug!(order_id, "无 BOM 明细, 跳过");
            return Ok(false);
        }

        let breakdown = self.calculator.compute_weight(
            &SqliteWeightCatalog::new(conn),
            &order.stones_used,
            &order.paper_used,
            order.quantity,
        )?;
        if breakdown.calculated_weight <= 0.0 {
            debug!(order_id, "计算重量 <= 0, 跳过");
            return Ok(false);
        }

        order.calculated_weight = breakdown.calculated_weight;
        order.refresh_discrepancy();
        order.updated_by = actor.user_id.clone();
        order.updated_at = ts;
        OrderRepository::update_mutable_fields_in(conn, &order)?;
        Ok(true)
    }

    fn apply_recalculation(
        &self,
        conn: &Connection,
        order: &mut Order,
        actor: &Actor,
        ts: NaiveDateTime,
    ) -> OrderResult<WeightBreakdown> {
        let breakdown = self.calculator.compute_weight(
            &SqliteWeightCatalog::new(conn),
            &order.stones_used,
            &order.paper_used,
            order.quantity,
        )?;

        order.calculated_weight = breakdown.calculated_weight;
        order.refresh_discrepancy();
        order.updated_by = actor.user_id.clone();
        order.updated_at = ts;
        OrderRepository::update_mutable_fields_in(conn, order)?;
        Ok(breakdown)
    }

    // ==========================================
    // 更新
    // ==========================================

    /// 更新订单状态/备注/实测重量
    ///
    /// 说明：
    /// - PERMISSIVE 模式下任意状态可互转; WORKFLOW 模式按迁移表校验
    /// - 设置 final_weight 时重算 weight_discrepancy = final - calculated
    /// - 取消不回补库存
    #[instrument(skip(self, patch, actor), fields(actor = %actor.user_id))]
    pub fn update_order(&self, order_id: &str, patch: &OrderPatch, actor: &Actor) -> OrderResult<Order> {
        if let Some(w) = patch.final_weight {
            if !w.is_finite() || w < 0.0 {
                return Err(OrderError::Validation(format!("实测重量无效: {}", w)));
            }
        }
        let mode = self.transition_mode()?;

        let mut conn = self.lock()?;
        let tx = begin_immediate(&mut conn)?;
        let ts = now();

        let mut order = OrderRepository::find_in(&tx, order_id)?
            .ok_or_else(|| OrderError::not_found("Order", order_id))?;
        let from = order.status;

        if let Some(to) = patch.status {
            if !mode.allows(from, to) {
                warn!(order_id, %from, %to, %mode, "拒绝状态迁移");
                return Err(OrderError::InvalidStateTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            order.status = to;
        }
        if let Some(notes) = &patch.notes {
            order.notes = notes.clone();
        }
        if let Some(w) = patch.final_weight {
            order.final_weight = Some(w);
            order.refresh_discrepancy();
        }
        order.updated_by = actor.user_id.clone();
        order.updated_at = ts;

        OrderRepository::update_mutable_fields_in(&tx, &order)?;

        let log = ActionLog::new(
            ActionType::UpdateOrder,
            &actor.user_id,
            Some(&order.id),
            Some(json!({
                "from_status": from.to_db_str(),
                "to_status": order.status.to_db_str(),
                "final_weight": order.final_weight,
                "weight_discrepancy": order.weight_discrepancy,
                "notes_changed": patch.notes.is_some(),
            })),
            None,
            ts,
        );
        ActionLogRepository::insert_in(&tx, &log)?;

        tx.commit()?;

        info!(order_id, status = %order.status, "订单已更新");
        Ok(order)
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 删除订单并回补库存 (仅管理员)
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub fn delete_order(&self, order_id: &str, actor: &Actor) -> OrderResult<()> {
        if !actor.is_admin() {
            warn!(order_id, "非管理员尝试删除订单");
            return Err(OrderError::PermissionDenied {
                action: "delete_order".to_string(),
            });
        }

        let mut conn = self.lock()?;
        let tx = begin_immediate(&mut conn)?;
        let ts = now();

        let order = OrderRepository::find_in(&tx, order_id)?
            .ok_or_else(|| OrderError::not_found("Order", order_id))?;

        for usage in &order.stones_used {
            self.ledger.restore_stone(&tx, &usage.stone_id, usage.quantity)?;
        }
        for usage in &order.paper_used {
            self.ledger.restore_paper(&tx, &usage.paper_id, usage.quantity)?;
        }

        OrderRepository::delete_in(&tx, order_id)?;

        let log = ActionLog::new(
            ActionType::DeleteOrder,
            &actor.user_id,
            Some(order_id),
            Some(json!({
                "order_number": order.order_number,
                "stones_restored": order.stones_used,
                "paper_restored": order.paper_used,
            })),
            None,
            ts,
        );
        ActionLogRepository::insert_in(&tx, &log)?;

        tx.commit()?;

        info!(order_id, order_number = %order.order_number, "订单已删除, 库存已回补");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_order(&self, order_id: &str) -> OrderResult<Order> {
        let conn = self.lock()?;
        OrderRepository::find_in(&conn, order_id)?
            .ok_or_else(|| OrderError::not_found("Order", order_id))
    }

    /// 按条件查询订单 (创建时间倒序)
    pub fn list_orders(&self, filter: &OrderFilter) -> OrderResult<Vec<Order>> {
        let conn = self.lock()?;
        Ok(OrderRepository::list_in(&conn, filter)?)
    }

    // ==========================================
    // 内部工具
    // ==========================================

    fn lock(&self) -> OrderResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| OrderError::Persistence(format!("锁获取失败: {}", e)))
    }

    fn sequencer(&self) -> OrderResult<OrderSequencer> {
        let prefix = self
            .policy
            .get_order_number_prefix()
            .map_err(|e| OrderError::Persistence(format!("读取订单号前缀失败: {}", e)))?;
        let width = self
            .policy
            .get_order_seq_width()
            .map_err(|e| OrderError::Persistence(format!("读取序号位数失败: {}", e)))?;
        Ok(OrderSequencer::new(prefix, width))
    }

    fn transition_mode(&self) -> OrderResult<StatusTransitionMode> {
        self.policy
            .get_status_transition_mode()
            .map_err(|e| OrderError::Persistence(format!("读取状态迁移模式失败: {}", e)))
    }
}

/// 本地当前时间 (秒级, 与落库精度一致)
fn now() -> NaiveDateTime {
    let ts = Local::now().naive_local();
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// 开启 IMMEDIATE 事务 (跨连接写者经 busy_timeout 串行化)
fn begin_immediate(conn: &mut Connection) -> OrderResult<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn validate_new_order(new_order: &NewOrder) -> OrderResult<()> {
    if new_order.design_id.trim().is_empty() {
        return Err(OrderError::Validation("designId 不能为空".to_string()));
    }
    if new_order.quantity < 1 {
        return Err(OrderError::Validation(format!(
            "订单数量必须 >= 1: {}",
            new_order.quantity
        )));
    }
    for usage in &new_order.stones_used {
        if usage.stone_id.trim().is_empty() {
            return Err(OrderError::Validation("stoneId 不能为空".to_string()));
        }
        if usage.quantity < 0 {
            return Err(OrderError::Validation(format!(
                "宝石用量不能为负: {} x {}",
                usage.stone_id, usage.quantity
            )));
        }
    }
    for usage in &new_order.paper_used {
        if usage.paper_id.trim().is_empty() {
            return Err(OrderError::Validation("paperId 不能为空".to_string()));
        }
        if usage.quantity < 0 {
            return Err(OrderError::Validation(format!(
                "纸张用量不能为负: {} x {}",
                usage.paper_id, usage.quantity
            )));
        }
    }
    Ok(())
}
