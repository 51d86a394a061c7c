//! 需求序列與批量問題參數

use serde::{Deserialize, Serialize};

use crate::{ensure_non_negative, PlanError};

/// 需求序列（每期一筆，長度即計劃時界）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DemandSeries(Vec<f64>);

impl DemandSeries {
    /// 創建需求序列，拒絕負值或非有限數
    pub fn new(periods: Vec<f64>) -> crate::Result<Self> {
        for (period, &quantity) in periods.iter().enumerate() {
            ensure_non_negative(&format!("第 {} 期需求", period), quantity)?;
        }
        Ok(Self(periods))
    }

    /// 計劃時界（期數）
    pub fn horizon(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 指定期需求
    pub fn get(&self, period: usize) -> Option<f64> {
        self.0.get(period).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// 最大單期需求（空序列為 0）
    pub fn peak(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for DemandSeries {
    type Error = PlanError;

    fn try_from(periods: Vec<f64>) -> crate::Result<Self> {
        Self::new(periods)
    }
}

impl From<DemandSeries> for Vec<f64> {
    fn from(series: DemandSeries) -> Self {
        series.0
    }
}

/// 產能受限批量問題參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizingParams {
    /// 各期需求
    pub demand: DemandSeries,

    /// 每期共用產能
    pub capacity: f64,

    /// 單位生產成本
    pub production_cost: f64,

    /// 每期固定設置成本
    pub setup_cost: f64,
}

impl LotSizingParams {
    /// 創建新的批量問題參數
    pub fn new(demand: DemandSeries, capacity: f64, production_cost: f64, setup_cost: f64) -> Self {
        Self {
            demand,
            capacity,
            production_cost,
            setup_cost,
        }
    }

    /// 驗證產能為正、成本非負
    pub fn validate(&self) -> crate::Result<()> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "產能必須為正的有限數，實際為 {}",
                self.capacity
            )));
        }
        ensure_non_negative("單位生產成本", self.production_cost)?;
        ensure_non_negative("設置成本", self.setup_cost)?;
        Ok(())
    }
}
