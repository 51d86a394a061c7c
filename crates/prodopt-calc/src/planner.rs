//! 規劃器：一次執行三個求解器並彙整報告

use prodopt_core::{
    LotSizingParams, OrderQuantityParams, PlanningScenario, SchedulingParams, SolverConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{LotSizingSolver, OrderQuantitySolver, ProductionPlan, Schedule, SchedulingSolver};

/// 規劃報告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningReport {
    /// 最優訂購量
    pub order_quantity: f64,

    /// 生產計劃
    pub production_plan: ProductionPlan,

    /// 排程
    pub schedule: Schedule,

    /// 計算耗時（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_time_ms: Option<u128>,
}

impl fmt::Display for PlanningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "訂購量:")?;
        writeln!(f, "最優訂購量: {:.2}", self.order_quantity)?;
        writeln!(f)?;

        writeln!(f, "批量計劃:")?;
        writeln!(f, "{}", self.production_plan)?;
        writeln!(f)?;

        writeln!(f, "排程:")?;
        write!(f, "{}", self.schedule)
    }
}

/// 生產規劃器
pub struct ProductionPlanner {
    order_quantity: OrderQuantitySolver,
    lot_sizing: LotSizingSolver,
    scheduling: SchedulingSolver,
}

impl ProductionPlanner {
    /// 以各求解器的預設後端創建規劃器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            order_quantity: OrderQuantitySolver::new(config.clone()),
            lot_sizing: LotSizingSolver::new(config.clone()),
            scheduling: SchedulingSolver::new(config),
        }
    }

    /// 以自訂求解器組合創建規劃器
    pub fn with_solvers(
        order_quantity: OrderQuantitySolver,
        lot_sizing: LotSizingSolver,
        scheduling: SchedulingSolver,
    ) -> Self {
        Self {
            order_quantity,
            lot_sizing,
            scheduling,
        }
    }

    /// 執行情境檔中的三個問題
    pub fn run_scenario(scenario: &PlanningScenario) -> prodopt_core::Result<PlanningReport> {
        Self::new(scenario.config.clone()).plan(
            &scenario.order_quantity,
            &scenario.lot_sizing,
            &scenario.scheduling,
        )
    }

    /// 並行求解三個問題；任一失敗則整次規劃失敗
    pub fn plan(
        &self,
        order_quantity: &OrderQuantityParams,
        lot_sizing: &LotSizingParams,
        scheduling: &SchedulingParams,
    ) -> prodopt_core::Result<PlanningReport> {
        tracing::info!(
            "開始規劃：需求期數 {}，作業 {}，機台 {}",
            lot_sizing.demand.horizon(),
            scheduling.routing.tasks(),
            scheduling.durations.machines()
        );
        let start_time = std::time::Instant::now();

        let (order_result, (lot_result, schedule_result)) = rayon::join(
            || self.order_quantity.solve(order_quantity),
            || {
                rayon::join(
                    || self.lot_sizing.solve(lot_sizing),
                    || self.scheduling.solve(scheduling),
                )
            },
        );

        let order_quantity = order_result.map_err(|e| {
            tracing::warn!("訂購量求解失敗: {}", e);
            e
        })?;
        let production_plan = lot_result.map_err(|e| {
            tracing::warn!("批量求解失敗: {}", e);
            e
        })?;
        let schedule = schedule_result.map_err(|e| {
            tracing::warn!("排程求解失敗: {}", e);
            e
        })?;

        let elapsed = start_time.elapsed();
        tracing::info!("規劃完成，耗時 {:?}", elapsed);
        tracing::info!(
            "訂購量 {:.2}，設置 {} 次，完工時間 {}",
            order_quantity,
            production_plan.setup_count(),
            schedule.makespan
        );

        Ok(PlanningReport {
            order_quantity,
            production_plan,
            schedule,
            calculation_time_ms: Some(elapsed.as_millis()),
        })
    }
}

impl Default for ProductionPlanner {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}
