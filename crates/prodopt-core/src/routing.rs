//! 加工時間矩陣與工序路線

use serde::{Deserialize, Serialize};

use crate::PlanError;

/// 加工時間矩陣，`durations[machine][task]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMatrix(Vec<Vec<f64>>);

impl DurationMatrix {
    pub fn new(durations: Vec<Vec<f64>>) -> Self {
        Self(durations)
    }

    /// 機台數
    pub fn machines(&self) -> usize {
        self.0.len()
    }

    /// 指定機台、作業的加工時間
    pub fn duration(&self, machine: usize, task: usize) -> Option<f64> {
        self.0.get(machine).and_then(|row| row.get(task)).copied()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.0
    }
}

/// 工序路線：每個作業依序造訪的機台
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingSequence(Vec<Vec<usize>>);

impl RoutingSequence {
    pub fn new(routes: Vec<Vec<usize>>) -> Self {
        Self(routes)
    }

    /// 作業數
    pub fn tasks(&self) -> usize {
        self.0.len()
    }

    /// 指定作業的機台造訪順序
    pub fn route(&self, task: usize) -> &[usize] {
        self.0.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定作業是否造訪該機台
    pub fn visits(&self, task: usize, machine: usize) -> bool {
        self.route(task).contains(&machine)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.0.iter().map(Vec::as_slice)
    }
}

/// 排程問題參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingParams {
    pub durations: DurationMatrix,
    pub routing: RoutingSequence,
}

impl SchedulingParams {
    pub fn new(durations: DurationMatrix, routing: RoutingSequence) -> Self {
        Self { durations, routing }
    }

    /// 驗證矩陣形狀、機台索引與加工時間，並回傳整數化的加工時間
    ///
    /// 每列長度必須等於作業數；加工時間必須為非負整數。
    pub fn integral_durations(&self) -> crate::Result<Vec<Vec<i64>>> {
        let tasks = self.routing.tasks();
        let machines = self.durations.machines();

        for (task, route) in self.routing.iter().enumerate() {
            if let Some(&machine) = route.iter().find(|&&m| m >= machines) {
                return Err(PlanError::InvalidInput(format!(
                    "作業 {} 的路線引用了不存在的機台 {}（共 {} 台）",
                    task, machine, machines
                )));
            }
        }

        self.durations
            .rows()
            .iter()
            .enumerate()
            .map(|(machine, row)| {
                if row.len() != tasks {
                    return Err(PlanError::InvalidInput(format!(
                        "機台 {} 的加工時間有 {} 筆，應與作業數 {} 相同",
                        machine,
                        row.len(),
                        tasks
                    )));
                }
                row.iter()
                    .enumerate()
                    .map(|(task, &d)| {
                        if !d.is_finite() || d < 0.0 || d.fract() != 0.0 || d > i64::MAX as f64 {
                            return Err(PlanError::InvalidInput(format!(
                                "機台 {} 作業 {} 的加工時間必須為非負整數，實際為 {}",
                                machine, task, d
                            )));
                        }
                        Ok(d as i64)
                    })
                    .collect()
            })
            .collect()
    }

    /// 時間上界 H：所有加工時間總和
    pub fn horizon(durations: &[Vec<i64>]) -> crate::Result<i64> {
        durations
            .iter()
            .flatten()
            .try_fold(0i64, |acc, &d| acc.checked_add(d))
            .ok_or_else(|| PlanError::InvalidInput("加工時間總和溢位".to_string()))
    }
}
