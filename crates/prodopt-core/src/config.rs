//! 求解設定

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 求解參數配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 求解時限（None 表示不限制）
    #[serde(default)]
    pub time_limit: Option<Duration>,

    /// 搜尋節點上限（僅限制約規劃後端）
    #[serde(default)]
    pub node_limit: Option<u64>,

    /// 排程模型的建模方式
    #[serde(default)]
    pub scheduling_formulation: SchedulingFormulation,

    /// 取消旗標（由呼叫端持有並觸發）
    #[serde(skip)]
    pub cancel: CancellationToken,
}

impl SolverConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置求解時限
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// 建構器模式：設置搜尋節點上限
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// 建構器模式：設置排程建模方式
    pub fn with_scheduling_formulation(mut self, formulation: SchedulingFormulation) -> Self {
        self.scheduling_formulation = formulation;
        self
    }

    /// 建構器模式：設置取消旗標
    ///
    /// # 範例
    /// ```
    /// # use prodopt_core::{CancellationToken, SolverConfig};
    /// let token = CancellationToken::new();
    /// let config = SolverConfig::new().with_cancellation(token.clone());
    /// token.cancel();
    /// assert!(config.cancel.is_cancelled());
    /// ```
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// 排程模型的建模方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingFormulation {
    /// 僅工序先後約束（不限制機台互斥）
    #[default]
    PrecedenceOnly,

    /// 加上機台互斥（同一機台上的作業不得重疊）
    MachineExclusive,
}

/// 可跨執行緒共享的取消旗標
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 要求中止求解
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
