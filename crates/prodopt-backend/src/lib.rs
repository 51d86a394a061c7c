//! # Production Optimization Backends
//!
//! 建模介面與求解器後端（混合整數線性規劃、制約規劃、凸二次規劃）

pub mod cp;
pub mod linear;
pub mod model;
pub mod quadratic;

// Re-export 主要類型
pub use cp::CpBackend;
pub use linear::MicrolpBackend;
pub use model::{
    Comparison, Constraint, LinearExpr, Model, NoOverlap, Objective, Sense, Solution, VarDomain,
    VarId, Variable,
};
pub use quadratic::QuadraticBackend;

use prodopt_core::{PlanError, SolverConfig};
use serde::{Deserialize, Serialize};

/// 後端能力類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// 混合整數線性規劃（連續、整數、0/1 變數，線性目標）
    LinearMixedInteger,
    /// 制約規劃（有限整數定義域，可含互斥約束）
    ConstraintProgramming,
    /// 凸二次規劃（連續變數，平方項目標）
    ConvexQuadratic,
}

impl Capability {
    /// 此類後端可處理的模型功能
    pub fn supported_features(&self) -> BackendFeatures {
        match self {
            Capability::LinearMixedInteger => BackendFeatures {
                continuous_variables: true,
                integer_variables: true,
                quadratic_objective: false,
                no_overlap: false,
            },
            Capability::ConstraintProgramming => BackendFeatures {
                continuous_variables: false,
                integer_variables: true,
                quadratic_objective: false,
                no_overlap: true,
            },
            Capability::ConvexQuadratic => BackendFeatures {
                continuous_variables: true,
                integer_variables: false,
                quadratic_objective: true,
                no_overlap: false,
            },
        }
    }
}

/// 模型功能旗標
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFeatures {
    pub continuous_variables: bool,
    pub integer_variables: bool,
    pub quadratic_objective: bool,
    pub no_overlap: bool,
}

impl BackendFeatures {
    /// 列出 `self` 需要但 `supported` 不支援的功能
    pub fn unsupported_by(&self, supported: &BackendFeatures) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.continuous_variables && !supported.continuous_variables {
            missing.push("連續變數");
        }
        if self.integer_variables && !supported.integer_variables {
            missing.push("整數變數");
        }
        if self.quadratic_objective && !supported.quadratic_objective {
            missing.push("二次目標");
        }
        if self.no_overlap && !supported.no_overlap {
            missing.push("互斥約束");
        }
        missing
    }
}

/// 求解器後端：接收建好的模型，回傳所有變數的取值
pub trait Backend: Send + Sync {
    /// 後端名稱
    fn name(&self) -> &'static str;

    /// 能力類別
    fn capability(&self) -> Capability;

    /// 實際求解（呼叫前已確認模型功能受支援）
    fn run(&self, model: &Model, config: &SolverConfig) -> prodopt_core::Result<Solution>;

    /// 檢查能力、取消狀態後求解
    fn solve(&self, model: &Model, config: &SolverConfig) -> prodopt_core::Result<Solution> {
        let missing = model
            .features()
            .unsupported_by(&self.capability().supported_features());
        if !missing.is_empty() {
            tracing::warn!(
                "後端 {} 無法處理模型 {}：{}",
                self.name(),
                model.name(),
                missing.join("、")
            );
            return Err(PlanError::SolverError(format!(
                "後端 {} 不支援{}",
                self.name(),
                missing.join("、")
            )));
        }

        if config.cancel.is_cancelled() {
            return Err(PlanError::NoOptimalFound("求解已取消".to_string()));
        }

        tracing::debug!(
            "後端 {} 求解模型 {}：變數 {} 個，約束 {} 條",
            self.name(),
            model.name(),
            model.num_vars(),
            model.constraints().len()
        );

        let start_time = std::time::Instant::now();
        let result = self.run(model, config);
        tracing::debug!(
            "模型 {} 求解結束（{}），耗時 {:?}",
            model.name(),
            if result.is_ok() { "最優" } else { "失敗" },
            start_time.elapsed()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodopt_core::FailureKind;
    use rstest::rstest;

    #[rstest]
    #[case(Capability::LinearMixedInteger, false, true, true)]
    #[case(Capability::ConstraintProgramming, false, false, true)]
    #[case(Capability::ConvexQuadratic, true, true, false)]
    fn test_capabilities(
        #[case] capability: Capability,
        #[case] quadratic: bool,
        #[case] continuous: bool,
        #[case] integer: bool,
    ) {
        let features = capability.supported_features();
        assert_eq!(features.quadratic_objective, quadratic);
        assert_eq!(features.continuous_variables, continuous);
        assert_eq!(features.integer_variables, integer);
    }

    #[test]
    fn test_unsupported_by() {
        let needed = BackendFeatures {
            continuous_variables: true,
            integer_variables: false,
            quadratic_objective: true,
            no_overlap: false,
        };

        let missing = needed.unsupported_by(&Capability::LinearMixedInteger.supported_features());
        assert_eq!(missing, vec!["二次目標"]);
        assert!(needed
            .unsupported_by(&Capability::ConvexQuadratic.supported_features())
            .is_empty());
    }

    #[test]
    fn test_cancelled_before_solve() {
        let mut model = Model::new("cancelled");
        let x = model.integer("x", 0.0, 5.0);
        model.minimize(x.into()).unwrap();

        let config = SolverConfig::new();
        config.cancel.cancel();

        let err = MicrolpBackend.solve(&model, &config).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoOptimalFound);
    }
}
