//! 作業排程求解器
//!
//! 每個（作業, 機台）一個整數開始時間，定義域 `[0, H]`，H 為所有加工時間總和。
//! 約束為作業路線上的先後關係與完工時間下界，目標為最小化完工時間。
//! `MachineExclusive` 建模另外要求同一機台上的作業不得重疊。

use prodopt_backend::{Backend, Comparison, CpBackend, LinearExpr, Model, VarId};
use prodopt_core::{SchedulingFormulation, SchedulingParams, SolverConfig};
use std::collections::BTreeMap;

use crate::Schedule;

/// 排程求解器
pub struct SchedulingSolver {
    backend: Box<dyn Backend>,
    config: SolverConfig,
}

impl SchedulingSolver {
    /// 以制約規劃後端創建求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            backend: Box::new(CpBackend),
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

    pub fn formulation(&self) -> SchedulingFormulation {
        self.config.scheduling_formulation
    }

    /// 求最短完工時間的排程
    pub fn solve(&self, params: &SchedulingParams) -> prodopt_core::Result<Schedule> {
        let durations = params.integral_durations()?;
        let horizon = SchedulingParams::horizon(&durations)?;
        let tasks = params.routing.tasks();

        let (model, grid) = self.build_model(params, &durations, horizon)?;
        tracing::debug!(
            "排程模型：作業 {}，機台 {}，H = {}，建模 {:?}，約束 {} 條",
            tasks,
            durations.len(),
            horizon,
            self.formulation(),
            model.constraints().len()
        );

        let solution = self.backend.solve(&model, &self.config)?;

        let mut starts = BTreeMap::new();
        for (task, machines) in grid.starts.iter().enumerate() {
            let row = machines
                .iter()
                .enumerate()
                .map(|(machine, &var)| Ok((machine, solution.value(var)? as i64)))
                .collect::<prodopt_core::Result<BTreeMap<_, _>>>()?;
            starts.insert(task, row);
        }
        let makespan = solution.value(grid.makespan)? as i64;

        tracing::debug!("排程完工時間 {}", makespan);
        Ok(Schedule { starts, makespan })
    }

    fn build_model(
        &self,
        params: &SchedulingParams,
        durations: &[Vec<i64>],
        horizon: i64,
    ) -> prodopt_core::Result<(Model, StartGrid)> {
        let machines = durations.len();
        let tasks = params.routing.tasks();
        let upper = horizon as f64;

        let mut model = Model::new("scheduling");
        let starts: Vec<Vec<VarId>> = (0..tasks)
            .map(|task| {
                (0..machines)
                    .map(|machine| model.integer(format!("start_{}_{}", task, machine), 0.0, upper))
                    .collect()
            })
            .collect();
        let makespan = model.integer("makespan", 0.0, upper);

        // 路線先後：前一站完成後才能開始下一站
        for (task, route) in params.routing.iter().enumerate() {
            for (step, pair) in route.windows(2).enumerate() {
                let (from, to) = (pair[0], pair[1]);
                model.add_constraint(
                    format!("route_{}_{}", task, step),
                    LinearExpr::from(starts[task][from])
                        .plus_constant(durations[from][task] as f64)
                        .plus(starts[task][to], -1.0),
                    Comparison::LessOrEqual,
                    0.0,
                )?;
            }
        }

        for (task, row) in starts.iter().enumerate() {
            for (machine, &start) in row.iter().enumerate() {
                model.add_constraint(
                    format!("makespan_{}_{}", task, machine),
                    LinearExpr::from(start)
                        .plus_constant(durations[machine][task] as f64)
                        .plus(makespan, -1.0),
                    Comparison::LessOrEqual,
                    0.0,
                )?;
            }
        }

        if self.formulation() == SchedulingFormulation::MachineExclusive {
            for machine in 0..machines {
                let intervals: Vec<(VarId, i64)> = (0..tasks)
                    .filter(|&task| params.routing.visits(task, machine))
                    .map(|task| (starts[task][machine], durations[machine][task]))
                    .collect();
                if intervals.len() > 1 {
                    model.add_no_overlap(format!("machine_{}", machine), intervals)?;
                }
            }
        }

        model.minimize(makespan.into())?;
        Ok((model, StartGrid { starts, makespan }))
    }
}

impl Default for SchedulingSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

/// 作業 × 機台的開始時間變數
struct StartGrid {
    starts: Vec<Vec<VarId>>,
    makespan: VarId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodopt_backend::{MicrolpBackend, QuadraticBackend};
    use prodopt_core::{DurationMatrix, FailureKind, PlanError, RoutingSequence};
    use proptest::prelude::*;
    use rstest::rstest;
    use std::time::{Duration, Instant};

    fn params(durations: Vec<Vec<f64>>, routing: Vec<Vec<usize>>) -> SchedulingParams {
        SchedulingParams::new(DurationMatrix::new(durations), RoutingSequence::new(routing))
    }

    fn reference() -> SchedulingParams {
        params(vec![vec![3.0, 2.0], vec![1.0, 4.0]], vec![vec![0, 1], vec![1, 0]])
    }

    fn exclusive() -> SchedulingSolver {
        SchedulingSolver::new(
            SolverConfig::new().with_scheduling_formulation(SchedulingFormulation::MachineExclusive),
        )
    }

    /// 檢查路線先後與完工時間下界
    fn assert_valid(params: &SchedulingParams, schedule: &Schedule) {
        let d = |m: usize, t: usize| params.durations.duration(m, t).unwrap() as i64;
        for (task, route) in params.routing.iter().enumerate() {
            for pair in route.windows(2) {
                let from = schedule.start(task, pair[0]).unwrap();
                let to = schedule.start(task, pair[1]).unwrap();
                assert!(from + d(pair[0], task) <= to);
            }
        }
        let latest = schedule
            .completion_times(&params.durations)
            .values()
            .copied()
            .max()
            .unwrap_or(0);
        assert_eq!(schedule.makespan, latest);
    }

    #[test]
    fn test_reference_example() {
        let input = reference();
        let schedule = SchedulingSolver::default().solve(&input).unwrap();

        assert_eq!(schedule.makespan, 6);
        assert_eq!(schedule.starts.len(), 2);
        assert!(schedule.starts.values().all(|row| row.len() == 2));
        assert_valid(&input, &schedule);
    }

    #[test]
    fn test_exclusive_reference_example() {
        let input = reference();
        let schedule = exclusive().solve(&input).unwrap();

        assert_eq!(schedule.makespan, 6);
        assert_valid(&input, &schedule);
    }

    #[rstest]
    #[case(SchedulingFormulation::PrecedenceOnly, 4)]
    #[case(SchedulingFormulation::MachineExclusive, 7)]
    fn test_formulations_differ(#[case] formulation: SchedulingFormulation, #[case] expected: i64) {
        // 兩個作業共用機台 0，加工時間 3 與 4
        let input = params(vec![vec![3.0, 4.0]], vec![vec![0], vec![0]]);
        let solver =
            SchedulingSolver::new(SolverConfig::new().with_scheduling_formulation(formulation));

        let schedule = solver.solve(&input).unwrap();
        assert_eq!(schedule.makespan, expected);
    }

    #[test]
    fn test_exclusive_no_overlap() {
        let input = params(
            vec![vec![2.0, 3.0, 1.0], vec![4.0, 1.0, 2.0]],
            vec![vec![0, 1], vec![1, 0], vec![0, 1]],
        );
        let schedule = exclusive().solve(&input).unwrap();
        assert_valid(&input, &schedule);

        for machine in 0..2 {
            let mut busy: Vec<(i64, i64)> = (0..3)
                .map(|task| {
                    let start = schedule.start(task, machine).unwrap();
                    (start, start + input.durations.duration(machine, task).unwrap() as i64)
                })
                .collect();
            busy.sort();
            assert!(busy.windows(2).all(|w| w[0].1 <= w[1].0));
        }
    }

    #[test]
    fn test_repeated_machine_is_infeasible() {
        let input = params(vec![vec![3.0]], vec![vec![0, 0]]);
        let err = SchedulingSolver::default().solve(&input).unwrap_err();

        assert_eq!(err, PlanError::Infeasible);
    }

    #[rstest]
    #[case(SchedulingFormulation::PrecedenceOnly)]
    #[case(SchedulingFormulation::MachineExclusive)]
    fn test_revisited_machine_with_long_operation_fails_fast(
        #[case] formulation: SchedulingFormulation,
    ) {
        // 路線 0 → 1 → 0，H 約兩千萬
        let input = params(
            vec![vec![1.0, 20_000_000.0], vec![1.0, 0.0]],
            vec![vec![0, 1, 0], vec![]],
        );
        let solver = SchedulingSolver::new(
            SolverConfig::new()
                .with_time_limit(Duration::from_millis(100))
                .with_scheduling_formulation(formulation),
        );

        let started = Instant::now();
        let err = solver.solve(&input).unwrap_err();

        assert_eq!(err, PlanError::Infeasible);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_empty_instance() {
        let schedule = SchedulingSolver::default()
            .solve(&params(Vec::new(), Vec::new()))
            .unwrap();

        assert!(schedule.starts.is_empty());
        assert_eq!(schedule.makespan, 0);
    }

    #[rstest]
    #[case(vec![vec![3.0, 2.0]], vec![vec![0], vec![1]])]
    #[case(vec![vec![3.0, 2.0], vec![1.0]], vec![vec![0, 1], vec![1, 0]])]
    #[case(vec![vec![1.5, 2.0]], vec![vec![0], vec![0]])]
    #[case(vec![vec![-1.0, 2.0]], vec![vec![0], vec![0]])]
    fn test_invalid_input(#[case] durations: Vec<Vec<f64>>, #[case] routing: Vec<Vec<usize>>) {
        let err = SchedulingSolver::default()
            .solve(&params(durations, routing))
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }

    #[test]
    fn test_node_limit_reports_no_optimal() {
        let input = params(vec![vec![3.0, 4.0, 2.0]], vec![vec![0], vec![0], vec![0]]);
        let solver = SchedulingSolver::new(
            SolverConfig::new()
                .with_scheduling_formulation(SchedulingFormulation::MachineExclusive)
                .with_node_limit(1),
        );

        let err = solver.solve(&input).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoOptimalFound);
    }

    #[test]
    fn test_cancelled_reports_no_optimal() {
        let config = SolverConfig::new();
        config.cancel.cancel();

        let err = SchedulingSolver::new(config).solve(&reference()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoOptimalFound);
    }

    #[test]
    fn test_linear_backend_precedence_only() {
        let input = reference();
        let schedule = SchedulingSolver::default()
            .with_backend(MicrolpBackend)
            .solve(&input)
            .unwrap();

        assert_eq!(schedule.makespan, 6);
    }

    #[test]
    fn test_linear_backend_rejects_no_overlap() {
        let config =
            SolverConfig::new().with_scheduling_formulation(SchedulingFormulation::MachineExclusive);
        let err = SchedulingSolver::new(config)
            .with_backend(MicrolpBackend)
            .solve(&reference())
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::SolverError);
    }

    #[test]
    fn test_quadratic_backend_rejected() {
        let err = SchedulingSolver::default()
            .with_backend(QuadraticBackend)
            .solve(&reference())
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::SolverError);
    }

    #[test]
    fn test_idempotent() {
        let solver = exclusive();
        let input = reference();

        assert_eq!(solver.solve(&input).unwrap(), solver.solve(&input).unwrap());
    }

    fn instance() -> impl Strategy<Value = SchedulingParams> {
        (1usize..4, 1usize..4).prop_flat_map(|(machines, tasks)| {
            (
                prop::collection::vec(prop::collection::vec(0u8..6, tasks), machines),
                prop::collection::vec(
                    Just((0..machines).collect::<Vec<_>>()).prop_shuffle(),
                    tasks,
                ),
            )
                .prop_map(|(durations, routing)| {
                    params(
                        durations
                            .into_iter()
                            .map(|row| row.into_iter().map(f64::from).collect())
                            .collect(),
                        routing,
                    )
                })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_precedence_satisfied(input in instance()) {
            let schedule = SchedulingSolver::default().solve(&input).unwrap();
            assert_valid(&input, &schedule);
        }

        #[test]
        fn prop_exclusive_not_shorter(input in instance()) {
            let relaxed = SchedulingSolver::default().solve(&input).unwrap();
            let strict = exclusive().solve(&input).unwrap();

            assert_valid(&input, &strict);
            prop_assert!(strict.makespan >= relaxed.makespan);
        }
    }
}
