//! 混合整數線性規劃後端（microlp）

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use prodopt_core::{PlanError, SolverConfig};

use crate::model::{Comparison, Model, Sense, Solution, VarDomain};
use crate::{Backend, Capability};

/// 以 microlp 求解的混合整數線性規劃後端
///
/// 不支援時限與中途取消；`SolverConfig` 只在求解前檢查取消旗標。
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

impl Backend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn capability(&self) -> Capability {
        Capability::LinearMixedInteger
    }

    fn run(&self, model: &Model, _config: &SolverConfig) -> prodopt_core::Result<Solution> {
        check_integer_range(model)?;
        let objective = model.objective();
        let direction = match objective.sense {
            Sense::Minimize => OptimizationDirection::Minimize,
            Sense::Maximize => OptimizationDirection::Maximize,
        };

        let mut weights = vec![0.0; model.num_vars()];
        for (var, coef) in objective.linear.merged() {
            weights[var.index()] += coef;
        }

        let mut problem = Problem::new(direction);
        let mut vars = Vec::with_capacity(model.num_vars());
        for (variable, weight) in model.variables().iter().zip(weights) {
            let var = match variable.domain {
                VarDomain::Continuous => problem.add_var(weight, (variable.lower, variable.upper)),
                VarDomain::Integer => problem.add_integer_var(
                    weight,
                    (integer_bound(variable.lower), integer_bound(variable.upper)),
                ),
                VarDomain::Binary => problem.add_binary_var(weight),
            };
            vars.push(var);
        }

        for constraint in model.constraints() {
            let terms: Vec<(microlp::Variable, f64)> = constraint
                .expr
                .merged()
                .into_iter()
                .map(|(var, coef)| (vars[var.index()], coef))
                .collect();
            let op = match constraint.cmp {
                Comparison::LessOrEqual => ComparisonOp::Le,
                Comparison::GreaterOrEqual => ComparisonOp::Ge,
                Comparison::Equal => ComparisonOp::Eq,
            };
            problem.add_constraint(terms, op, constraint.rhs - constraint.expr.constant_term());
        }

        match problem.solve() {
            Ok(solution) => model.solution(solution.iter().map(|x| *x.1).collect()),
            Err(microlp::Error::Infeasible) => Err(PlanError::Infeasible),
            Err(e) => Err(PlanError::SolverError(format!("microlp: {}", e))),
        }
    }
}

/// microlp 的整數變數以 i32 表示
const INTEGER_LIMIT: f64 = i32::MAX as f64;

/// 有限的整數界限、以及含整數變數之約束的右側，都必須落在 i32 範圍內
///
/// 無限界限會收斂到 `±i32::MAX`，右側超出範圍時該收斂會產生假的不可行。
fn check_integer_range(model: &Model) -> prodopt_core::Result<()> {
    let out_of_range = |value: f64| value.is_finite() && value.abs() > INTEGER_LIMIT;

    for variable in model.variables().iter().filter(|v| v.domain.is_integral()) {
        if let Some(bound) = [variable.lower, variable.upper].into_iter().find(|&b| out_of_range(b)) {
            return Err(PlanError::SolverError(format!(
                "整數變數 {} 的界限 {} 超出 microlp 整數範圍 ±{}",
                variable.name,
                bound,
                i32::MAX
            )));
        }
    }

    for constraint in model.constraints() {
        let integral = constraint
            .expr
            .terms()
            .iter()
            .any(|&(var, _)| model.variables()[var.index()].domain.is_integral());
        let rhs = constraint.rhs - constraint.expr.constant_term();
        if integral && out_of_range(rhs) {
            return Err(PlanError::SolverError(format!(
                "約束 {} 的右側 {} 超出 microlp 整數範圍 ±{}",
                constraint.name,
                rhs,
                i32::MAX
            )));
        }
    }
    Ok(())
}

/// 整數變數界限轉為 microlp 接受的 i32
fn integer_bound(bound: f64) -> i32 {
    if bound.is_nan() {
        0
    } else if bound >= i32::MAX as f64 {
        i32::MAX
    } else if bound <= i32::MIN as f64 {
        i32::MIN
    } else {
        bound.round() as i32
    }
}
