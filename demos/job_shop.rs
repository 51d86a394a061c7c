//! 作業排程示例：比較只含路線先後與機台互斥兩種建模

use prodopt::{
    DurationMatrix, FailureKind, RoutingSequence, SchedulingFormulation, SchedulingParams,
    SchedulingSolver, SolverConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 作業排程示例 ===\n");

    // 3 台機台 × 3 個作業
    let params = SchedulingParams::new(
        DurationMatrix::new(vec![
            vec![3.0, 2.0, 2.0],
            vec![2.0, 1.0, 4.0],
            vec![2.0, 4.0, 3.0],
        ]),
        RoutingSequence::new(vec![vec![0, 1, 2], vec![0, 2, 1], vec![1, 2, 0]]),
    );

    for formulation in [
        SchedulingFormulation::PrecedenceOnly,
        SchedulingFormulation::MachineExclusive,
    ] {
        let solver =
            SchedulingSolver::new(SolverConfig::new().with_scheduling_formulation(formulation));
        match solver.solve(&params) {
            Ok(schedule) => {
                println!("{:?}：完工時間 {}", formulation, schedule.makespan);
                for (task, machines) in &schedule.starts {
                    println!("  作業 {}: {:?}", task, machines);
                }
            }
            Err(e) if e.kind() == FailureKind::NoOptimalFound => {
                println!("{:?}：未在限制內證明最優（{}）", formulation, e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
