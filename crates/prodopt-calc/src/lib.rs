//! # Production Optimization Solvers
//!
//! 訂購量、產能受限批量、作業排程三個求解器，以及整合三者的規劃器

pub mod lot_sizing;
pub mod order_quantity;
pub mod planner;
pub mod scheduling;

// Re-export 主要類型
pub use lot_sizing::LotSizingSolver;
pub use order_quantity::OrderQuantitySolver;
pub use planner::{PlanningReport, ProductionPlanner};
pub use scheduling::SchedulingSolver;

use prodopt_core::DurationMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 批量問題結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionPlan {
    /// 期別 → 生產量
    pub quantities: BTreeMap<usize, f64>,

    /// 期別 → 是否設置
    pub setups: BTreeMap<usize, bool>,

    /// 總成本（生產成本 + 設置成本）
    pub total_cost: f64,
}

impl ProductionPlan {
    /// 創建空計劃（規劃期數為 0）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn horizon(&self) -> usize {
        self.quantities.len()
    }

    /// 設置次數
    pub fn setup_count(&self) -> usize {
        self.setups.values().filter(|&&on| on).count()
    }
}

/// `生產計劃: {期別: 數量, ...}` 與總成本兩行
impl fmt::Display for ProductionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "生產計劃: {{")?;
        for (i, (period, quantity)) in self.quantities.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", period, quantity)?;
        }
        writeln!(f, "}}")?;
        write!(f, "總成本: {:.2}", self.total_cost)
    }
}

/// 排程結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// 作業 → 機台 → 開始時間
    pub starts: BTreeMap<usize, BTreeMap<usize, i64>>,

    /// 完工時間
    pub makespan: i64,
}

impl Schedule {
    /// 開始時間；作業或機台不存在時為 None
    pub fn start(&self, task: usize, machine: usize) -> Option<i64> {
        self.starts.get(&task)?.get(&machine).copied()
    }

    /// 各作業的完成時間（所有機台上 開始 + 加工時間 的最大值）
    pub fn completion_times(&self, durations: &DurationMatrix) -> BTreeMap<usize, i64> {
        self.starts
            .iter()
            .map(|(&task, machines)| {
                let finish = machines
                    .iter()
                    .map(|(&machine, &start)| {
                        start + durations.duration(machine, task).unwrap_or(0.0) as i64
                    })
                    .max()
                    .unwrap_or(0);
                (task, finish)
            })
            .collect()
    }
}

/// 每個作業一行開始時間，最後一行為完工時間
impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (task, machines) in &self.starts {
            write!(f, "作業_{}: {{", task)?;
            for (i, (machine, start)) in machines.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "機台_{}: {}", machine, start)?;
            }
            writeln!(f, "}}")?;
        }
        write!(f, "完工時間: {}", self.makespan)
    }
}
