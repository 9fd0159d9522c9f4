// ==========================================
// 宝石订单跟踪系统 - 命令行入口
// ==========================================
// 用法:
//   gem-order-tracker init   [db_path]   建表
//   gem-order-tracker recalc [db_path]   全量重算订单重量
//   gem-order-tracker stock  [db_path]   打印宝石/纸卷库存
// db_path 缺省时使用 GEM_ORDER_DB_PATH 或用户数据目录
// GEM_ORDER_LOG_FORMAT=json 时输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Result};
use gem_order_tracker::app::{get_default_db_path, AppState};
use gem_order_tracker::domain::order::{Actor, OrderFilter};
use gem_order_tracker::logging;

fn main() -> Result<()> {
    match std::env::var("GEM_ORDER_LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "stock".to_string());
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", gem_order_tracker::APP_NAME, gem_order_tracker::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "init" => {
            println!("schema ready: {}", state.db_path);
        }
        "recalc" => {
            let actor = Actor::admin("system");
            let summary = state.order_api.recalculate_all_order_weights(&actor)?;
            println!(
                "recalculated: success={} skipped={} errors={}",
                summary.success, summary.skipped, summary.errors
            );
        }
        "stock" => print_stock(&state)?,
        other => bail!("未知命令: {} (可用: init | recalc | stock)", other),
    }

    Ok(())
}

fn print_stock(state: &AppState) -> Result<()> {
    println!("== stones ==");
    for stone in state.inventory_api.list_stones()? {
        println!(
            "{:<24} {:>8} {:<6} {:>10.3}/pc",
            stone.name, stone.quantity, stone.unit, stone.weight_per_piece
        );
    }

    for inventory_type in ["internal", "out"] {
        println!("== paper ({}) ==", inventory_type);
        for paper in state.inventory_api.list_papers(Some(inventory_type))? {
            println!(
                "{:<24} w={:<8} {:>6} rolls x {:>5} = {:>8} pcs",
                paper.name,
                paper.width,
                paper.quantity,
                paper.pieces_per_roll,
                paper.available_pieces()
            );
        }
    }

    let orders = state.order_repo.list(&OrderFilter::default())?;
    println!("== orders: {} ==", orders.len());
    Ok(())
}
