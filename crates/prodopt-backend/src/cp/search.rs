//! 深度優先分支定界搜尋

use std::time::{Duration, Instant};

use super::monitor::{SearchCommand, SearchMonitor};
use super::propagate::{self, Disjunctive, Domains, LinearRow, PropagationStop};

const OBJECTIVE_EPSILON: f64 = 1e-9;

/// 編譯後的整數最小化問題
#[derive(Debug, Clone)]
pub struct CpProblem {
    pub domains: Domains,
    pub rows: Vec<LinearRow>,
    pub groups: Vec<Disjunctive>,
    /// 最小化 `Σ coef·x + constant`
    pub objective: Vec<(usize, f64)>,
    pub objective_constant: f64,
}

impl CpProblem {
    /// 目標函數在目前定義域下的下界
    fn objective_lower_bound(&self, domains: &Domains) -> f64 {
        self.objective
            .iter()
            .map(|&(var, coef)| {
                if coef > 0.0 {
                    coef * domains.lower(var) as f64
                } else {
                    coef * domains.upper(var) as f64
                }
            })
            .sum::<f64>()
            + self.objective_constant
    }

    fn evaluate(&self, values: &[i64]) -> f64 {
        self.objective
            .iter()
            .map(|&(var, coef)| coef * values[var] as f64)
            .sum::<f64>()
            + self.objective_constant
    }
}

/// 搜尋結果
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// 找到解且已證明最優
    Optimal { values: Vec<i64>, objective: f64 },
    /// 已證明無解
    Infeasible,
    /// 監控器中止，尚未證明最優
    Aborted {
        reason: String,
        incumbent: Option<f64>,
    },
}

/// 搜尋統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatistics {
    pub nodes_explored: u64,
    pub decisions_generated: u64,
    pub max_depth: u64,
    pub prunings_infeasible: u64,
    pub prunings_bound: u64,
    pub solutions_found: u64,
    pub time_total: Duration,
}

impl std::fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "節點 {}，分支 {}，最大深度 {}，不可行剪枝 {}，界限剪枝 {}，解 {}，耗時 {:.2?}",
            self.nodes_explored,
            self.decisions_generated,
            self.max_depth,
            self.prunings_infeasible,
            self.prunings_bound,
            self.solutions_found,
            self.time_total
        )
    }
}

struct Node {
    domains: Domains,
    posted: Vec<LinearRow>,
    depth: u64,
}

impl Node {
    fn child(&self, domains: Domains, posted: Vec<LinearRow>) -> Node {
        Node {
            domains,
            posted,
            depth: self.depth + 1,
        }
    }
}

enum Branch {
    /// 互斥對的兩種先後
    Order {
        first: LinearRow,
        second: LinearRow,
    },
    /// 將變數固定在某一端，另一支排除該值
    Split { var: usize, at_lower: bool },
}

/// 分支順序：互斥對 → 目標變數 → 定義域最小的變數
fn select_branch(problem: &CpProblem, domains: &Domains) -> Option<Branch> {
    if let Some(((a, da), (b, db))) = propagate::unresolved_pair(domains, &problem.groups) {
        let a_before_b = LinearRow::precedence(a, da, b);
        let b_before_a = LinearRow::precedence(b, db, a);
        return Some(if domains.lower(a) <= domains.lower(b) {
            Branch::Order {
                first: a_before_b,
                second: b_before_a,
            }
        } else {
            Branch::Order {
                first: b_before_a,
                second: a_before_b,
            }
        });
    }

    if let Some(&(var, coef)) = problem
        .objective
        .iter()
        .find(|&&(var, _)| !domains.is_fixed(var))
    {
        return Some(Branch::Split {
            var,
            at_lower: coef >= 0.0,
        });
    }

    (0..domains.len())
        .filter(|&var| !domains.is_fixed(var))
        .min_by_key(|&var| domains.size(var))
        .map(|var| Branch::Split {
            var,
            at_lower: true,
        })
}

/// 執行分支定界直到證明最優、證明無解或被監控器中止
pub fn search(
    problem: &CpProblem,
    monitor: &mut dyn SearchMonitor,
) -> (SearchOutcome, SearchStatistics) {
    let start_time = Instant::now();
    let mut stats = SearchStatistics::default();
    let mut incumbent: Option<(Vec<i64>, f64)> = None;
    let mut aborted: Option<String> = None;

    monitor.on_enter_search();
    if propagate::has_negative_cycle(problem.domains.len(), &problem.rows) {
        tracing::debug!("先後約束形成正長度的環，模型不可行");
        stats.prunings_infeasible = 1;
        stats.time_total = start_time.elapsed();
        return (SearchOutcome::Infeasible, stats);
    }

    let mut stack = vec![Node {
        domains: problem.domains.clone(),
        posted: Vec::new(),
        depth: 0,
    }];

    while !stack.is_empty() {
        if let SearchCommand::Terminate(reason) = monitor.search_command() {
            aborted = Some(reason);
            break;
        }
        let Some(mut node) = stack.pop() else {
            break;
        };
        monitor.on_node();
        stats.nodes_explored += 1;
        stats.max_depth = stats.max_depth.max(node.depth);

        match propagate::propagate(
            &mut node.domains,
            &problem.rows,
            &node.posted,
            &problem.groups,
            monitor,
        ) {
            Ok(()) => {}
            Err(PropagationStop::Conflict) => {
                stats.prunings_infeasible += 1;
                continue;
            }
            Err(PropagationStop::Interrupted(reason)) => {
                aborted = Some(reason);
                break;
            }
        }

        let bound = problem.objective_lower_bound(&node.domains);
        if let Some((_, best)) = &incumbent {
            if bound >= best - OBJECTIVE_EPSILON {
                stats.prunings_bound += 1;
                continue;
            }
        }

        match select_branch(problem, &node.domains) {
            None => {
                let values = node.domains.lower_values();
                let objective = problem.evaluate(&values);
                stats.solutions_found += 1;
                monitor.on_solution_found(objective);
                incumbent = Some((values, objective));
            }
            Some(Branch::Order { first, second }) => {
                stats.decisions_generated += 2;
                let mut posted_second = node.posted.clone();
                posted_second.push(second);
                let mut posted_first = node.posted.clone();
                posted_first.push(first);
                let second = node.child(node.domains.clone(), posted_second);
                let first = node.child(node.domains.clone(), posted_first);
                stack.push(second);
                stack.push(first);
            }
            Some(Branch::Split { var, at_lower }) => {
                stats.decisions_generated += 2;
                let lower = node.domains.lower(var);
                let upper = node.domains.upper(var);
                let mut fixed = node.domains.clone();
                let mut rest = node.domains.clone();
                // 未固定的變數必有 lower < upper，以下不會衝突
                let split = if at_lower {
                    fixed.fix(var, lower).and(rest.raise_lower(var, lower as i128 + 1))
                } else {
                    fixed.fix(var, upper).and(rest.lower_upper(var, upper as i128 - 1))
                };
                if split.is_err() {
                    stats.prunings_infeasible += 1;
                    continue;
                }
                stack.push(node.child(rest, node.posted.clone()));
                stack.push(node.child(fixed, node.posted.clone()));
            }
        }
    }

    stats.time_total = start_time.elapsed();
    let outcome = match (aborted, incumbent) {
        (Some(reason), incumbent) => SearchOutcome::Aborted {
            reason,
            incumbent: incumbent.map(|(_, objective)| objective),
        },
        (None, Some((values, objective))) => SearchOutcome::Optimal { values, objective },
        (None, None) => SearchOutcome::Infeasible,
    };
    (outcome, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::monitor::{CompositeMonitor, NodeLimitMonitor, TimeLimitMonitor};

    fn two_jobs_one_machine() -> CpProblem {
        // s0, s1 in [0, 10], makespan m in [0, 10]
        // no overlap (s0, 3), (s1, 4); s + d <= m
        CpProblem {
            domains: Domains::new(vec![(0, 10), (0, 10), (0, 10)]),
            rows: vec![LinearRow::precedence(0, 3, 2), LinearRow::precedence(1, 4, 2)],
            groups: vec![Disjunctive {
                intervals: vec![(0, 3), (1, 4)],
            }],
            objective: vec![(2, 1.0)],
            objective_constant: 0.0,
        }
    }

    #[test]
    fn test_disjunctive_optimum() {
        let problem = two_jobs_one_machine();
        let (outcome, stats) = search(&problem, &mut CompositeMonitor::new());

        match outcome {
            SearchOutcome::Optimal { values, objective } => {
                assert_eq!(objective, 7.0);
                assert_eq!(values[2], 7);
                let (s0, s1) = (values[0], values[1]);
                assert!(s0 + 3 <= s1 || s1 + 4 <= s0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(stats.solutions_found >= 1);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = two_jobs_one_machine();
        problem.domains = Domains::new(vec![(0, 10), (0, 10), (0, 5)]);

        let (outcome, _) = search(&problem, &mut CompositeMonitor::new());
        assert_eq!(outcome, SearchOutcome::Infeasible);
    }

    #[test]
    fn test_maximize_via_negated_objective() {
        // max x + y s.t. x + y <= 5, x, y in [0, 4]
        let problem = CpProblem {
            domains: Domains::new(vec![(0, 4), (0, 4)]),
            rows: vec![LinearRow::new(vec![(0, 1), (1, 1)], 5)],
            groups: Vec::new(),
            objective: vec![(0, -1.0), (1, -1.0)],
            objective_constant: 0.0,
        };

        let (outcome, _) = search(&problem, &mut CompositeMonitor::new());
        match outcome {
            SearchOutcome::Optimal { values, objective } => {
                assert_eq!(objective, -5.0);
                assert_eq!(values[0] + values[1], 5);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_node_limit_aborts() {
        let problem = two_jobs_one_machine();
        let mut monitor = CompositeMonitor::new();
        monitor.add_monitor(NodeLimitMonitor::new(1));

        let (outcome, stats) = search(&problem, &mut monitor);
        assert!(matches!(outcome, SearchOutcome::Aborted { incumbent: None, .. }));
        assert_eq!(stats.nodes_explored, 1);
    }

    #[test]
    fn test_positive_precedence_cycle_infeasible_without_search() {
        // s0 + 1 <= s1, s1 + 20000000 <= s0
        let problem = CpProblem {
            domains: Domains::new(vec![(0, 40_000_000); 2]),
            rows: vec![LinearRow::precedence(0, 1, 1), LinearRow::precedence(1, 20_000_000, 0)],
            groups: Vec::new(),
            objective: vec![(0, 1.0)],
            objective_constant: 0.0,
        };

        let (outcome, stats) = search(&problem, &mut CompositeMonitor::new());
        assert_eq!(outcome, SearchOutcome::Infeasible);
        assert_eq!(stats.nodes_explored, 0);
    }

    #[test]
    fn test_time_limit_interrupts_long_propagation() {
        // x2 is fixed to 0, so the first row is x0 - x1 <= -1 in disguise
        let problem = CpProblem {
            domains: Domains::new(vec![(0, 2_000_000_000), (0, 2_000_000_000), (0, 0)]),
            rows: vec![
                LinearRow::new(vec![(0, 1), (1, -1), (2, 1)], -1),
                LinearRow::precedence(1, 1, 0),
            ],
            groups: Vec::new(),
            objective: vec![(0, 1.0)],
            objective_constant: 0.0,
        };
        let mut monitor = CompositeMonitor::new();
        monitor.add_monitor(TimeLimitMonitor::new(Duration::from_millis(50), 1));

        let started = Instant::now();
        let (outcome, _) = search(&problem, &mut monitor);

        assert!(matches!(outcome, SearchOutcome::Aborted { incumbent: None, .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_no_variables() {
        let problem = CpProblem {
            domains: Domains::new(Vec::new()),
            rows: Vec::new(),
            groups: Vec::new(),
            objective: Vec::new(),
            objective_constant: 2.0,
        };

        let (outcome, stats) = search(&problem, &mut CompositeMonitor::new());
        assert_eq!(
            outcome,
            SearchOutcome::Optimal {
                values: Vec::new(),
                objective: 2.0
            }
        );
        assert_eq!(stats.nodes_explored, 1);
    }
}
