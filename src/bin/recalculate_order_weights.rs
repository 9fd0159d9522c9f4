// Recalculate calculated_weight for every order from the current stone/paper weights.
//
// Usage:
//   cargo run --bin recalculate_order_weights -- [db_path]
//
// Orders without BOM lines, or whose computed weight is not positive, are skipped.

use gem_order_tracker::app::{get_default_db_path, AppState};
use gem_order_tracker::domain::order::Actor;
use gem_order_tracker::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let state = AppState::new(db_path)?;
    let summary = state
        .order_api
        .recalculate_all_order_weights(&Actor::admin("recalculate_order_weights"))?;

    println!("success={}", summary.success);
    println!("skipped={}", summary.skipped);
    println!("errors={}", summary.errors);
    Ok(())
}
