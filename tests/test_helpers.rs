// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use gem_order_tracker::api::CreateOrderRequest;
use gem_order_tracker::app::AppState;
use gem_order_tracker::config::StaticOrderPolicy;
use gem_order_tracker::db::{init_schema, open_sqlite_connection};
use gem_order_tracker::domain::material::{Design, NewDesign, NewPaper, NewStone, Paper, Stone};
use gem_order_tracker::domain::order::{Actor, PaperUsage, StoneUsage};
use gem_order_tracker::domain::types::{InventoryType, StoneUnit};
use gem_order_tracker::engine::OrderLifecycleManager;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("非 UTF-8 路径")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建临时数据库 + AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    (temp_file, state)
}

/// 在独立连接上创建订单引擎（固定策略，便于指定创建时间）
pub fn create_lifecycle(
    db_path: &str,
    policy: StaticOrderPolicy,
) -> (
    OrderLifecycleManager<StaticOrderPolicy>,
    Arc<Mutex<Connection>>,
) {
    let conn = Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()));
    let manager = OrderLifecycleManager::new(conn.clone(), Arc::new(policy));
    (manager, conn)
}

pub fn admin() -> Actor {
    Actor::admin("admin01")
}

pub fn operator() -> Actor {
    Actor::user("operator01")
}

// ==========================================
// 主数据种子
// ==========================================

pub fn seed_design(state: &AppState, number: &str) -> Design {
    state
        .inventory_api
        .register_design(
            NewDesign {
                name: format!("Design {}", number),
                number: number.to_string(),
                description: None,
                image_url: None,
            },
            &admin(),
        )
        .unwrap()
}

pub fn seed_stone(state: &AppState, name: &str, quantity: i64, weight_per_piece: f64) -> Stone {
    state
        .inventory_api
        .register_stone(
            NewStone {
                name: name.to_string(),
                quantity,
                unit: StoneUnit::Pieces,
                weight_per_piece,
                description: None,
            },
            &admin(),
        )
        .unwrap()
}

pub fn seed_paper(
    state: &AppState,
    name: &str,
    rolls: i64,
    pieces_per_roll: i64,
    weight_per_piece: f64,
) -> Paper {
    state
        .inventory_api
        .register_paper(
            NewPaper {
                name: name.to_string(),
                width: 30.0,
                quantity: rolls,
                pieces_per_roll,
                weight_per_piece,
                inventory_type: InventoryType::Internal,
            },
            &admin(),
        )
        .unwrap()
}

// ==========================================
// 订单请求构造
// ==========================================

pub fn order_request(
    design_id: &str,
    quantity: i64,
    stones: &[(&str, i64)],
    papers: &[(&str, i64)],
) -> CreateOrderRequest {
    CreateOrderRequest {
        design_id: design_id.to_string(),
        order_type: "internal".to_string(),
        quantity,
        stones_used: stones
            .iter()
            .map(|(id, q)| StoneUsage {
                stone_id: id.to_string(),
                quantity: *q,
            })
            .collect(),
        paper_used: papers
            .iter()
            .map(|(id, q)| PaperUsage {
                paper_id: id.to_string(),
                quantity: *q,
            })
            .collect(),
        notes: None,
    }
}

// ==========================================
// 库存查询
// ==========================================

pub fn stone_quantity(state: &AppState, stone_id: &str) -> i64 {
    state.inventory_api.get_stone(stone_id).unwrap().quantity
}

pub fn paper_rolls(state: &AppState, paper_id: &str) -> i64 {
    state.inventory_api.get_paper(paper_id).unwrap().quantity
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
