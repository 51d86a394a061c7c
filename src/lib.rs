//! # prodopt
//!
//! 生產規劃最佳化：報童型訂購量、產能受限批量、作業排程。
//!
//! ```no_run
//! use prodopt::{LotSizingParams, LotSizingSolver, DemandSeries};
//!
//! let demand = DemandSeries::new(vec![10.0, 20.0, 15.0])?;
//! let plan = LotSizingSolver::default().solve(&LotSizingParams::new(demand, 25.0, 5.0, 100.0))?;
//! assert_eq!(plan.quantities[&1], 20.0);
//! # Ok::<(), prodopt::PlanError>(())
//! ```

pub use prodopt_backend as backend;

pub use prodopt_backend::{Backend, Capability, CpBackend, MicrolpBackend, QuadraticBackend};
pub use prodopt_calc::{
    LotSizingSolver, OrderQuantitySolver, PlanningReport, ProductionPlan, ProductionPlanner,
    Schedule, SchedulingSolver,
};
pub use prodopt_core::{
    parse_demand_series, parse_duration_matrix, parse_routing, CancellationToken, DemandSeries,
    DurationMatrix, FailureKind, LotSizingParams, OrderQuantityParams, PlanError, PlanningScenario,
    Result, RoutingSequence, SchedulingFormulation, SchedulingParams, SolverConfig,
};
