//! 命令列參數定義

use clap::{Args, Parser, Subcommand};
use prodopt_core::{SchedulingFormulation, SolverConfig};
use std::path::PathBuf;
use std::time::Duration;

/// 生產規劃最佳化：訂購量、批量、作業排程
#[derive(Parser, Debug)]
#[command(name = "prodopt", author, version, about, long_about = None)]
pub struct Cli {
    /// 日誌詳細程度（-v 為 info，-vv 為 debug，-vvv 為 trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 從 JSON 情境檔執行三個問題並輸出報告
    Run {
        /// 情境檔路徑
        #[arg(short, long)]
        scenario: PathBuf,

        /// 排程採用機台互斥建模（覆寫情境檔設定）
        #[arg(long)]
        machine_exclusive: bool,

        #[command(flatten)]
        options: SolveOptions,
    },

    /// 求最優訂購量
    OrderQuantity {
        /// 平均需求
        #[arg(long)]
        mean_demand: f64,

        /// 需求標準差
        #[arg(long, default_value_t = 0.0)]
        std_dev: f64,

        /// 缺貨成本
        #[arg(long)]
        shortage_cost: f64,

        /// 過剩成本
        #[arg(long)]
        excess_cost: f64,

        #[command(flatten)]
        options: SolveOptions,
    },

    /// 求產能受限的批量計劃
    LotSizing {
        /// 各期需求，逗號分隔或 JSON 陣列，例如 "10,20,15"
        #[arg(long)]
        demand: String,

        /// 每期產能
        #[arg(long)]
        capacity: f64,

        /// 單位生產成本
        #[arg(long)]
        production_cost: f64,

        /// 每期設置成本
        #[arg(long)]
        setup_cost: f64,

        #[command(flatten)]
        options: SolveOptions,
    },

    /// 求最短完工時間的排程
    Schedule {
        /// 加工時間矩陣（機台 × 作業），例如 "[[3,2],[1,4]]"
        #[arg(long)]
        durations: String,

        /// 各作業的機台路線，例如 "[[0,1],[1,0]]"
        #[arg(long)]
        routing: String,

        /// 同一機台上的作業不得重疊
        #[arg(long)]
        machine_exclusive: bool,

        #[command(flatten)]
        options: SolveOptions,
    },
}

/// 各子命令共用的求解選項
#[derive(Args, Debug, Clone, Default)]
pub struct SolveOptions {
    /// 求解時限（秒）
    #[arg(long)]
    pub time_limit_secs: Option<u64>,

    /// 制約規劃搜尋節點上限
    #[arg(long)]
    pub node_limit: Option<u64>,

    /// 以 JSON 輸出結果
    #[arg(long)]
    pub json: bool,
}

impl SolveOptions {
    /// 將命令列選項套用到求解設定上
    pub fn apply(&self, mut config: SolverConfig) -> SolverConfig {
        if let Some(secs) = self.time_limit_secs {
            config = config.with_time_limit(Duration::from_secs(secs));
        }
        if let Some(nodes) = self.node_limit {
            config = config.with_node_limit(nodes);
        }
        config
    }
}

/// 依旗標選擇排程建模方式
pub fn formulation(machine_exclusive: bool) -> SchedulingFormulation {
    if machine_exclusive {
        SchedulingFormulation::MachineExclusive
    } else {
        SchedulingFormulation::PrecedenceOnly
    }
}
