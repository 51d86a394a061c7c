//! 產能受限批量求解器
//!
//! 每期整數生產量 `x_t` 與設置旗標 `y_t`：
//! - 需求覆蓋 `x_t ≥ d_t`（期間不結轉庫存）
//! - 產能連結 `x_t ≤ cap·y_t`
//! - 最小化 `Σ (pc·x_t + sc·y_t)`

use prodopt_backend::{Backend, Comparison, LinearExpr, MicrolpBackend, Model, VarId};
use prodopt_core::{LotSizingParams, SolverConfig};
use std::collections::BTreeMap;

use crate::ProductionPlan;

/// 批量求解器
pub struct LotSizingSolver {
    backend: Box<dyn Backend>,
    config: SolverConfig,
}

/// 單期決策變數
struct PeriodVars {
    quantity: VarId,
    setup: VarId,
}

impl LotSizingSolver {
    /// 以混合整數線性規劃後端創建求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            backend: Box::new(MicrolpBackend),
            config,
        }
    }

    /// 建構器模式：替換後端
    pub fn with_backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// 求最優生產計劃
    pub fn solve(&self, params: &LotSizingParams) -> prodopt_core::Result<ProductionPlan> {
        params.validate()?;

        let horizon = params.demand.horizon();
        if horizon == 0 {
            tracing::debug!("規劃期數為 0，回傳空計劃");
            return Ok(ProductionPlan::empty());
        }

        if params.demand.peak() > params.capacity {
            tracing::debug!(
                "尖峰需求 {} 超過產能 {}，模型將不可行",
                params.demand.peak(),
                params.capacity
            );
        }

        let (model, periods) = build_model(params)?;
        tracing::debug!(
            "批量模型：{} 期，變數 {} 個，約束 {} 條",
            horizon,
            model.num_vars(),
            model.constraints().len()
        );

        let solution = self.backend.solve(&model, &self.config)?;

        let mut plan = ProductionPlan {
            quantities: BTreeMap::new(),
            setups: BTreeMap::new(),
            total_cost: solution.objective_value(),
        };
        for (period, vars) in periods.iter().enumerate() {
            plan.quantities.insert(period, solution.value(vars.quantity)?);
            plan.setups.insert(period, solution.value(vars.setup)? > 0.5);
        }

        tracing::debug!(
            "批量計劃：設置 {} 次，總成本 {}",
            plan.setup_count(),
            plan.total_cost
        );
        Ok(plan)
    }
}

impl Default for LotSizingSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

fn build_model(params: &LotSizingParams) -> prodopt_core::Result<(Model, Vec<PeriodVars>)> {
    let mut model = Model::new("lot_sizing");
    let mut periods = Vec::with_capacity(params.demand.horizon());
    let mut cost = LinearExpr::new();

    for (period, demand) in params.demand.iter().enumerate() {
        let quantity = model.integer(format!("x_{}", period), 0.0, f64::INFINITY);
        let setup = model.binary(format!("y_{}", period));

        model.add_constraint(
            format!("demand_{}", period),
            quantity.into(),
            Comparison::GreaterOrEqual,
            demand,
        )?;
        model.add_constraint(
            format!("capacity_{}", period),
            LinearExpr::from(quantity).plus(setup, -params.capacity),
            Comparison::LessOrEqual,
            0.0,
        )?;

        cost = cost
            .plus(quantity, params.production_cost)
            .plus(setup, params.setup_cost);
        periods.push(PeriodVars { quantity, setup });
    }

    model.minimize(cost)?;
    Ok((model, periods))
}
