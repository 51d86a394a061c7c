//! 規劃情境（三個問題的完整輸入）

use serde::{Deserialize, Serialize};

use crate::{LotSizingParams, OrderQuantityParams, SchedulingParams, SolverConfig};

/// 一次規劃執行的全部輸入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningScenario {
    /// 訂購量問題
    pub order_quantity: OrderQuantityParams,

    /// 批量問題
    pub lot_sizing: LotSizingParams,

    /// 排程問題
    pub scheduling: SchedulingParams,

    /// 求解設定（可省略）
    #[serde(default)]
    pub config: SolverConfig,
}

impl PlanningScenario {
    /// 從 JSON 文字讀取情境
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| crate::PlanError::Parse(format!("情境檔格式錯誤: {}", e)))
    }
}
