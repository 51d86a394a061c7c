//! 凸二次規劃後端（clarabel 內點法）
//!
//! 將模型轉為 clarabel 的標準形式：
//! `min ½xᵀPx + qᵀx  s.t.  Ax + s = b, s ∈ K`

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use prodopt_core::{PlanError, SolverConfig};

use crate::model::{Comparison, Model, Sense, Solution};
use crate::{Backend, Capability};

/// 以 clarabel 求解的凸二次規劃後端
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticBackend;

impl Backend for QuadraticBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn capability(&self) -> Capability {
        Capability::ConvexQuadratic
    }

    fn run(&self, model: &Model, config: &SolverConfig) -> prodopt_core::Result<Solution> {
        let n = model.num_vars();
        let objective = model.objective();

        if objective.sense == Sense::Maximize && objective.is_quadratic() {
            return Err(PlanError::SolverError("最大化平方項目標不是凸問題".to_string()));
        }
        if let Some((weight, _)) = objective.squares.iter().find(|(w, _)| *w < 0.0 || !w.is_finite()) {
            return Err(PlanError::SolverError(format!(
                "平方項權重必須為非負有限數，實際為 {}",
                weight
            )));
        }

        // 目標：P 為稠密對稱矩陣，最後只取上三角
        let mut p = vec![vec![0.0; n]; n];
        let mut q = vec![0.0; n];
        let sign = match objective.sense {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        };
        for (var, coef) in objective.linear.merged() {
            q[var.index()] += sign * coef;
        }
        for (weight, expr) in &objective.squares {
            let terms = expr.merged();
            let c = expr.constant_term();
            for &(vi, ai) in &terms {
                q[vi.index()] += 2.0 * weight * c * ai;
                for &(vj, aj) in &terms {
                    p[vi.index()][vj.index()] += 2.0 * weight * ai * aj;
                }
            }
        }

        // 約束：等式列在前（零錐），不等式列在後（非負錐）
        let mut equalities: Vec<(Vec<f64>, f64)> = Vec::new();
        let mut inequalities: Vec<(Vec<f64>, f64)> = Vec::new();
        for constraint in model.constraints() {
            let mut row = vec![0.0; n];
            for (var, coef) in constraint.expr.merged() {
                row[var.index()] += coef;
            }
            let rhs = constraint.rhs - constraint.expr.constant_term();
            match constraint.cmp {
                Comparison::Equal => equalities.push((row, rhs)),
                Comparison::LessOrEqual => inequalities.push((row, rhs)),
                Comparison::GreaterOrEqual => {
                    inequalities.push((row.into_iter().map(|a| -a).collect(), -rhs))
                }
            }
        }
        for (index, variable) in model.variables().iter().enumerate() {
            if variable.lower.is_finite() {
                let mut row = vec![0.0; n];
                row[index] = -1.0;
                inequalities.push((row, -variable.lower));
            }
            if variable.upper.is_finite() {
                let mut row = vec![0.0; n];
                row[index] = 1.0;
                inequalities.push((row, variable.upper));
            }
        }

        let mut cones = Vec::new();
        if !equalities.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(equalities.len()));
        }
        if !inequalities.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(inequalities.len()));
        }
        let (rows, b): (Vec<Vec<f64>>, Vec<f64>) =
            equalities.into_iter().chain(inequalities).unzip();

        let p = csc_from_dense(n, n, |i, j| if i <= j { p[i][j] } else { 0.0 });
        let a = csc_from_dense(rows.len(), n, |i, j| rows[i][j]);

        let settings = DefaultSettings::<f64> {
            verbose: false,
            time_limit: config
                .time_limit
                .map(|limit| limit.as_secs_f64())
                .unwrap_or(f64::INFINITY),
            ..DefaultSettings::default()
        };

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        match &solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                model.solution(solver.solution.x.clone())
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Err(PlanError::Infeasible)
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => Err(PlanError::NoOptimalFound(
                format!("clarabel 終止狀態 {:?}", solver.solution.status),
            )),
            other => Err(PlanError::SolverError(format!("clarabel 終止狀態 {:?}", other))),
        }
    }
}

/// 由稠密取值函數建立 CSC 矩陣（略過 0）
fn csc_from_dense(rows: usize, cols: usize, entry: impl Fn(usize, usize) -> f64) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..cols {
        for i in 0..rows {
            let value = entry(i, j);
            if value != 0.0 {
                rowval.push(i);
                nzval.push(value);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
