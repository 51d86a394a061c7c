//! 制約規劃後端
//!
//! 有限整數定義域上的界限傳播加上深度優先分支定界。
//! 支援整數線性約束與互斥（disjunctive）約束，目標必須為線性。

pub mod monitor;
pub mod propagate;
pub mod search;

use prodopt_core::{PlanError, SolverConfig};

use crate::model::{Comparison, Model, Sense, Solution};
use crate::{Backend, Capability};
use monitor::CompositeMonitor;
use propagate::{Disjunctive, Domains, LinearRow};
use search::{CpProblem, SearchOutcome};

pub use monitor::{SearchCommand, SearchMonitor};
pub use search::SearchStatistics;

/// 制約規劃後端
#[derive(Debug, Clone, Copy, Default)]
pub struct CpBackend;

impl Backend for CpBackend {
    fn name(&self) -> &'static str {
        "cp-search"
    }

    fn capability(&self) -> Capability {
        Capability::ConstraintProgramming
    }

    fn run(&self, model: &Model, config: &SolverConfig) -> prodopt_core::Result<Solution> {
        let problem = compile(model)?;
        let mut monitor = CompositeMonitor::from_config(config);
        let (outcome, stats) = search::search(&problem, &mut monitor);
        tracing::debug!("模型 {} 搜尋統計：{}", model.name(), stats);

        match outcome {
            SearchOutcome::Optimal { values, .. } => {
                model.solution(values.into_iter().map(|v| v as f64).collect())
            }
            SearchOutcome::Infeasible => Err(PlanError::Infeasible),
            SearchOutcome::Aborted { reason, incumbent } => {
                tracing::warn!("模型 {} 搜尋中止：{}", model.name(), reason);
                Err(PlanError::NoOptimalFound(match incumbent {
                    Some(objective) => format!("{}（目前最佳目標值 {}，未證明最優）", reason, objective),
                    None => reason,
                }))
            }
        }
    }
}

/// 將模型轉為整數界限、`≤` 列與互斥群組
fn compile(model: &Model) -> prodopt_core::Result<CpProblem> {
    let bounds = model
        .variables()
        .iter()
        .map(|variable| {
            let lower = variable.lower.ceil();
            let upper = variable.upper.floor();
            if !lower.is_finite() || !upper.is_finite() {
                return Err(PlanError::SolverError(format!(
                    "變數 {} 的定義域無界，制約規劃需要有限定義域",
                    variable.name
                )));
            }
            Ok((lower as i64, upper as i64))
        })
        .collect::<prodopt_core::Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(model.constraints().len());
    for constraint in model.constraints() {
        let terms = constraint
            .expr
            .merged()
            .into_iter()
            .map(|(var, coef)| {
                if coef.fract() != 0.0 || !coef.is_finite() {
                    return Err(PlanError::SolverError(format!(
                        "約束 {} 含非整數係數 {}",
                        constraint.name, coef
                    )));
                }
                Ok((var.index(), coef as i64))
            })
            .collect::<prodopt_core::Result<Vec<_>>>()?;
        let rhs = constraint.rhs - constraint.expr.constant_term();
        // `≥` 取負轉為 `≤`；整數係數下右側可取整
        let at_most = || LinearRow::new(terms.clone(), rhs.floor() as i64);
        let at_least = || {
            LinearRow::new(
                terms.iter().map(|&(var, coef)| (var, -coef)).collect(),
                (rhs.ceil() as i64).saturating_neg(),
            )
        };

        match constraint.cmp {
            Comparison::LessOrEqual => rows.push(at_most()),
            Comparison::GreaterOrEqual => rows.push(at_least()),
            Comparison::Equal => {
                rows.push(at_most());
                rows.push(at_least());
            }
        }
    }

    let groups = model
        .no_overlaps()
        .iter()
        .map(|group| {
            if let Some(&(_, d)) = group.intervals.iter().find(|&&(_, d)| d < 0) {
                return Err(PlanError::SolverError(format!(
                    "互斥約束 {} 含負的加工時間 {}",
                    group.name, d
                )));
            }
            Ok(Disjunctive {
                intervals: group
                    .intervals
                    .iter()
                    .filter(|&&(_, d)| d > 0)
                    .map(|&(var, d)| (var.index(), d))
                    .collect(),
            })
        })
        .collect::<prodopt_core::Result<Vec<_>>>()?;

    let objective = model.objective();
    let sign = match objective.sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };

    Ok(CpProblem {
        domains: Domains::new(bounds),
        rows,
        groups,
        objective: objective
            .linear
            .merged()
            .into_iter()
            .map(|(var, coef)| (var.index(), sign * coef))
            .collect(),
        objective_constant: sign * objective.linear.constant_term(),
    })
}
