//! prodopt 命令列前端：讀取輸入、嚴格解析、呼叫求解器、輸出結果

mod cli;

use anyhow::Context;
use clap::Parser;
use prodopt_calc::{LotSizingSolver, OrderQuantitySolver, ProductionPlanner, SchedulingSolver};
use prodopt_core::{
    parse_demand_series, parse_duration_matrix, parse_routing, LotSizingParams,
    OrderQuantityParams, PlanningScenario, SchedulingParams, SolverConfig,
};
use std::process::ExitCode;
use tracing::Level;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("錯誤: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 執行子命令並回傳要輸出的文字
fn execute(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Run {
            scenario,
            machine_exclusive,
            options,
        } => {
            let text = std::fs::read_to_string(&scenario)
                .with_context(|| format!("無法讀取情境檔 {}", scenario.display()))?;
            let mut scenario = PlanningScenario::from_json(&text)?;
            scenario.config = options.apply(scenario.config);
            if machine_exclusive {
                scenario.config.scheduling_formulation = cli::formulation(true);
            }

            let report = ProductionPlanner::run_scenario(&scenario)?;
            if options.json {
                Ok(serde_json::to_string_pretty(&report)?)
            } else {
                Ok(report.to_string())
            }
        }

        Command::OrderQuantity {
            mean_demand,
            std_dev,
            shortage_cost,
            excess_cost,
            options,
        } => {
            let params = OrderQuantityParams::new(mean_demand, std_dev, shortage_cost, excess_cost);
            let solver = OrderQuantitySolver::new(options.apply(SolverConfig::new()));
            let quantity = solver.solve(&params)?;

            if options.json {
                Ok(serde_json::json!({ "order_quantity": quantity }).to_string())
            } else {
                Ok(format!("最優訂購量: {:.2}", quantity))
            }
        }

        Command::LotSizing {
            demand,
            capacity,
            production_cost,
            setup_cost,
            options,
        } => {
            let demand = parse_demand_series(&demand)?;
            let params = LotSizingParams::new(demand, capacity, production_cost, setup_cost);
            let solver = LotSizingSolver::new(options.apply(SolverConfig::new()));
            let plan = solver.solve(&params)?;

            if options.json {
                Ok(serde_json::to_string_pretty(&plan)?)
            } else {
                Ok(plan.to_string())
            }
        }

        Command::Schedule {
            durations,
            routing,
            machine_exclusive,
            options,
        } => {
            let params =
                SchedulingParams::new(parse_duration_matrix(&durations)?, parse_routing(&routing)?);
            let config = options
                .apply(SolverConfig::new())
                .with_scheduling_formulation(cli::formulation(machine_exclusive));
            let schedule = SchedulingSolver::new(config).solve(&params)?;

            if options.json {
                Ok(serde_json::to_string_pretty(&schedule)?)
            } else {
                Ok(schedule.to_string())
            }
        }
    }
}
