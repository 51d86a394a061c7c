//! # Production Optimization Core
//!
//! 核心資料模型、求解設定與錯誤類型

pub mod config;
pub mod demand;
pub mod order;
pub mod parse;
pub mod routing;
pub mod scenario;

// Re-export 主要類型
pub use config::{CancellationToken, SchedulingFormulation, SolverConfig};
pub use demand::{DemandSeries, LotSizingParams};
pub use order::OrderQuantityParams;
pub use parse::{parse_demand_series, parse_duration_matrix, parse_routing};
pub use routing::{DurationMatrix, RoutingSequence, SchedulingParams};
pub use scenario::PlanningScenario;

/// 求解錯誤類型
///
/// `Ok(value)` 即為最優解；其餘情況全部以此列舉回報，三個求解器共用同一契約。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("無效的輸入: {0}")]
    InvalidInput(String),

    #[error("輸入格式錯誤: {0}")]
    Parse(String),

    #[error("模型不可行：沒有任何指派滿足所有約束")]
    Infeasible,

    #[error("求解器錯誤: {0}")]
    SolverError(String),

    #[error("未找到最優解: {0}")]
    NoOptimalFound(String),

    #[error("變數 {variable} 不屬於模型 {model}")]
    ForeignVariable { variable: String, model: String },
}

impl PlanError {
    /// 錯誤分類（供呼叫端判斷，不需比對字串）
    pub fn kind(&self) -> FailureKind {
        match self {
            PlanError::InvalidInput(_) | PlanError::Parse(_) | PlanError::ForeignVariable { .. } => {
                FailureKind::InvalidInput
            }
            PlanError::Infeasible => FailureKind::Infeasible,
            PlanError::SolverError(_) => FailureKind::SolverError,
            PlanError::NoOptimalFound(_) => FailureKind::NoOptimalFound,
        }
    }
}

/// 失敗種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 參數格式錯誤或超出定義域
    InvalidInput,
    /// 已證明不可行
    Infeasible,
    /// 後端無法給出任何結論
    SolverError,
    /// 搜尋在證明最優前終止
    NoOptimalFound,
}

pub type Result<T> = std::result::Result<T, PlanError>;

/// 檢查實數參數為有限且非負
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanError::InvalidInput(format!(
            "{} 必須為非負有限數，實際為 {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PlanError::InvalidInput("x".into()), FailureKind::InvalidInput)]
    #[case(PlanError::Parse("x".into()), FailureKind::InvalidInput)]
    #[case(PlanError::Infeasible, FailureKind::Infeasible)]
    #[case(PlanError::SolverError("x".into()), FailureKind::SolverError)]
    #[case(PlanError::NoOptimalFound("x".into()), FailureKind::NoOptimalFound)]
    #[case(
        PlanError::ForeignVariable { variable: "q".into(), model: "m".into() },
        FailureKind::InvalidInput
    )]
    fn test_failure_kind(#[case] error: PlanError, #[case] expected: FailureKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("capacity", 0.0).is_ok());
        assert!(ensure_non_negative("capacity", -1.0).is_err());
        assert!(ensure_non_negative("capacity", f64::NAN).is_err());
        assert!(ensure_non_negative("capacity", f64::INFINITY).is_err());
    }
}
