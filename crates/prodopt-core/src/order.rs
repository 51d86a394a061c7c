//! 訂購量問題參數

use serde::{Deserialize, Serialize};

use crate::ensure_non_negative;

/// 報童型訂購量問題參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderQuantityParams {
    /// 平均需求
    pub mean_demand: f64,

    /// 需求標準差（目前僅供參考，不影響結果）
    pub std_dev: f64,

    /// 缺貨成本係數
    pub shortage_cost: f64,

    /// 過剩成本係數
    pub excess_cost: f64,
}

impl OrderQuantityParams {
    /// 創建新的訂購量參數
    pub fn new(mean_demand: f64, std_dev: f64, shortage_cost: f64, excess_cost: f64) -> Self {
        Self {
            mean_demand,
            std_dev,
            shortage_cost,
            excess_cost,
        }
    }

    /// 驗證所有參數為非負有限數
    pub fn validate(&self) -> crate::Result<()> {
        ensure_non_negative("平均需求", self.mean_demand)?;
        ensure_non_negative("需求標準差", self.std_dev)?;
        ensure_non_negative("缺貨成本", self.shortage_cost)?;
        ensure_non_negative("過剩成本", self.excess_cost)?;
        Ok(())
    }
}
