//! 簡單規劃示例：一次求解三個問題

use prodopt::{
    parse_demand_series, parse_duration_matrix, parse_routing, LotSizingParams,
    OrderQuantityParams, ProductionPlanner, SchedulingParams, SolverConfig,
};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 簡單規劃示例 ===\n");

    let order_quantity = OrderQuantityParams::new(100.0, 20.0, 5.0, 2.0);
    let lot_sizing = LotSizingParams::new(parse_demand_series("10, 20, 15")?, 25.0, 5.0, 100.0);
    let scheduling = SchedulingParams::new(
        parse_duration_matrix("[[3, 2], [1, 4]]")?,
        parse_routing("[[0, 1], [1, 0]]")?,
    );

    let config = SolverConfig::new().with_time_limit(Duration::from_secs(10));
    let report = ProductionPlanner::new(config).plan(&order_quantity, &lot_sizing, &scheduling)?;

    println!("{}", report);
    if let Some(ms) = report.calculation_time_ms {
        println!("\n耗時 {} ms", ms);
    }

    Ok(())
}
