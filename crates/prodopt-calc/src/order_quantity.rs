//! 訂購量求解器（報童型二次成本）
//!
//! 目標 `cf·(D−q)² + ce·(q−D)²` 等同 `(cf+ce)·(D−q)²`，最優解恆為 `q = D`，
//! 與成本比例及標準差無關。

use prodopt_backend::{Backend, LinearExpr, Model, QuadraticBackend, VarId};
use prodopt_core::{OrderQuantityParams, SolverConfig};

/// 訂購量求解器
pub struct OrderQuantitySolver {
    backend: Box<dyn Backend>,
    config: SolverConfig,
}

impl OrderQuantitySolver {
    /// 以凸二次規劃後端創建求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            backend: Box::new(QuadraticBackend),
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

    /// 求最優訂購量
    pub fn solve(&self, params: &OrderQuantityParams) -> prodopt_core::Result<f64> {
        params.validate()?;
        tracing::debug!(
            "訂購量模型：D = {}，σ = {}，cf = {}，ce = {}",
            params.mean_demand,
            params.std_dev,
            params.shortage_cost,
            params.excess_cost
        );

        let (model, q) = build_model(params)?;
        let solution = self.backend.solve(&model, &self.config)?;

        // 內點法可能回傳 -1e-10 之類的值
        Ok(solution.value(q)?.max(0.0))
    }
}

impl Default for OrderQuantitySolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

fn build_model(params: &OrderQuantityParams) -> prodopt_core::Result<(Model, VarId)> {
    let mut model = Model::new("order_quantity");
    let q = model.continuous("q", 0.0, f64::INFINITY);
    let demand = params.mean_demand;

    // 兩項成本皆為 0 時目標為常數，任何 q 都最優；以單位權重取 q = D 為代表解
    let (shortage, excess) = if params.shortage_cost + params.excess_cost == 0.0 {
        (1.0, 0.0)
    } else {
        (params.shortage_cost, params.excess_cost)
    };

    model.minimize_squares(
        LinearExpr::new(),
        vec![
            (shortage, LinearExpr::constant(demand).plus(q, -1.0)),
            (excess, LinearExpr::from(q).plus_constant(-demand)),
        ],
    )?;
    Ok((model, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodopt_backend::{CpBackend, MicrolpBackend};
    use prodopt_core::{FailureKind, PlanError};
    use proptest::prelude::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-4 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[rstest]
    #[case(100.0, 20.0, 5.0, 2.0)]
    #[case(100.0, 20.0, 2.0, 5.0)]
    #[case(100.0, 0.0, 1.0, 1.0)]
    #[case(0.0, 10.0, 3.0, 7.0)]
    #[case(42.5, 3.0, 0.0, 4.0)]
    fn test_quantity_equals_mean_demand(
        #[case] mean: f64,
        #[case] std_dev: f64,
        #[case] shortage: f64,
        #[case] excess: f64,
    ) {
        let params = OrderQuantityParams::new(mean, std_dev, shortage, excess);
        let quantity = OrderQuantitySolver::default().solve(&params).unwrap();

        assert_close(quantity, mean);
    }

    #[test]
    fn test_zero_costs_return_mean_demand() {
        let params = OrderQuantityParams::new(80.0, 5.0, 0.0, 0.0);
        let quantity = OrderQuantitySolver::default().solve(&params).unwrap();

        assert_close(quantity, 80.0);
    }

    #[test]
    fn test_linear_backend_reports_solver_error() {
        let params = OrderQuantityParams::new(100.0, 20.0, 5.0, 2.0);
        let solver = OrderQuantitySolver::default().with_backend(MicrolpBackend);

        let err = solver.solve(&params).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SolverError);
    }

    #[test]
    fn test_cp_backend_reports_solver_error() {
        let params = OrderQuantityParams::new(100.0, 20.0, 5.0, 2.0);
        let solver = OrderQuantitySolver::default().with_backend(CpBackend);

        let err = solver.solve(&params).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SolverError);
    }

    #[rstest]
    #[case(-1.0, 0.0, 1.0, 1.0)]
    #[case(10.0, -2.0, 1.0, 1.0)]
    #[case(10.0, 0.0, f64::NAN, 1.0)]
    #[case(10.0, 0.0, 1.0, f64::INFINITY)]
    fn test_invalid_input(
        #[case] mean: f64,
        #[case] std_dev: f64,
        #[case] shortage: f64,
        #[case] excess: f64,
    ) {
        let params = OrderQuantityParams::new(mean, std_dev, shortage, excess);
        let err = OrderQuantitySolver::default().solve(&params).unwrap_err();

        assert!(matches!(err, PlanError::InvalidInput(_)));
    }

    #[test]
    fn test_idempotent() {
        let solver = OrderQuantitySolver::default();
        let params = OrderQuantityParams::new(73.0, 11.0, 4.0, 9.0);

        assert_eq!(solver.solve(&params).unwrap(), solver.solve(&params).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_quantity_independent_of_costs(
            mean in 0.0f64..10_000.0,
            std_dev in 0.0f64..500.0,
            shortage in 0.01f64..100.0,
            excess in 0.01f64..100.0,
        ) {
            let params = OrderQuantityParams::new(mean, std_dev, shortage, excess);
            let quantity = OrderQuantitySolver::default().solve(&params).unwrap();

            prop_assert!((quantity - mean).abs() <= 1e-4 * mean.max(1.0));
        }
    }
}
