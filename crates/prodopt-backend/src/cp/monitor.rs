//! 搜尋監控器：時限、節點上限、取消

use prodopt_core::{CancellationToken, SolverConfig};
use std::time::{Duration, Instant};

/// 監控器對搜尋的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    /// 繼續搜尋
    Continue,
    /// 中止搜尋，附上原因
    Terminate(String),
}

/// 搜尋過程的監控介面
pub trait SearchMonitor: Send {
    fn name(&self) -> &str;

    /// 搜尋開始前呼叫一次
    fn on_enter_search(&mut self) {}

    /// 每處理一個節點呼叫一次
    fn on_node(&mut self) {}

    /// 找到更好的解時呼叫
    fn on_solution_found(&mut self, _objective: f64) {}

    /// 每輪傳播呼叫一次
    fn on_propagation_pass(&mut self) {}

    /// 每次迭代開始前查詢
    fn search_command(&self) -> SearchCommand;

    /// 傳播迴圈中查詢；只有時限與取消需要打斷單一節點的傳播
    fn propagation_command(&self) -> SearchCommand {
        SearchCommand::Continue
    }
}

/// 超過時限即中止；每 `check_interval` 個節點才讀一次時鐘
pub struct TimeLimitMonitor {
    time_limit: Duration,
    start_time: Option<Instant>,
    check_interval: u64,
    ops_since_last_check: u64,
    expired: bool,
}

impl TimeLimitMonitor {
    pub fn new(time_limit: Duration, check_interval: u64) -> Self {
        Self {
            time_limit,
            start_time: None,
            check_interval: check_interval.max(1),
            ops_since_last_check: 0,
            expired: false,
        }
    }

    /// 預設每 256 個節點檢查一次
    pub fn with_default_check_interval(time_limit: Duration) -> Self {
        Self::new(time_limit, 256)
    }

    fn tick(&mut self) {
        self.ops_since_last_check += 1;
        if self.ops_since_last_check >= self.check_interval {
            self.check();
        }
    }

    fn check(&mut self) {
        self.ops_since_last_check = 0;
        if let Some(start) = self.start_time {
            self.expired = start.elapsed() >= self.time_limit;
        }
    }
}

impl SearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self) {
        self.start_time = Some(Instant::now());
        self.expired = false;
        self.check();
    }

    fn on_node(&mut self) {
        self.tick();
    }

    fn on_propagation_pass(&mut self) {
        self.tick();
    }

    fn search_command(&self) -> SearchCommand {
        if self.expired {
            SearchCommand::Terminate(format!("超過時限 {:?}", self.time_limit))
        } else {
            SearchCommand::Continue
        }
    }

    fn propagation_command(&self) -> SearchCommand {
        self.search_command()
    }
}

/// 處理節點數達上限即中止
pub struct NodeLimitMonitor {
    node_limit: u64,
    nodes: u64,
}

impl NodeLimitMonitor {
    pub fn new(node_limit: u64) -> Self {
        Self {
            node_limit,
            nodes: 0,
        }
    }
}

impl SearchMonitor for NodeLimitMonitor {
    fn name(&self) -> &str {
        "NodeLimitMonitor"
    }

    fn on_enter_search(&mut self) {
        self.nodes = 0;
    }

    fn on_node(&mut self) {
        self.nodes = self.nodes.saturating_add(1);
    }

    fn search_command(&self) -> SearchCommand {
        if self.nodes >= self.node_limit {
            SearchCommand::Terminate(format!("達到節點上限 {}", self.node_limit))
        } else {
            SearchCommand::Continue
        }
    }
}

/// 呼叫端觸發取消旗標即中止
pub struct InterruptMonitor {
    token: CancellationToken,
}

impl InterruptMonitor {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl SearchMonitor for InterruptMonitor {
    fn name(&self) -> &str {
        "InterruptMonitor"
    }

    fn search_command(&self) -> SearchCommand {
        if self.token.is_cancelled() {
            SearchCommand::Terminate("求解已取消".to_string())
        } else {
            SearchCommand::Continue
        }
    }

    fn propagation_command(&self) -> SearchCommand {
        self.search_command()
    }
}

/// 組合多個監控器；事件依序轉發，第一個中止指令生效
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Box<dyn SearchMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依求解設定組出時限、節點上限與取消監控
    pub fn from_config(config: &SolverConfig) -> Self {
        let mut composite = Self::new();
        composite.add_monitor(InterruptMonitor::new(config.cancel.clone()));
        if let Some(limit) = config.time_limit {
            composite.add_monitor(TimeLimitMonitor::with_default_check_interval(limit));
        }
        if let Some(nodes) = config.node_limit {
            composite.add_monitor(NodeLimitMonitor::new(nodes));
        }
        composite
    }

    pub fn add_monitor<M: SearchMonitor + 'static>(&mut self, monitor: M) {
        self.monitors.push(Box::new(monitor));
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl SearchMonitor for CompositeMonitor {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self) {
        self.monitors.iter_mut().for_each(|m| m.on_enter_search());
    }

    fn on_node(&mut self) {
        self.monitors.iter_mut().for_each(|m| m.on_node());
    }

    fn on_solution_found(&mut self, objective: f64) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_solution_found(objective));
    }

    fn on_propagation_pass(&mut self) {
        self.monitors.iter_mut().for_each(|m| m.on_propagation_pass());
    }

    fn search_command(&self) -> SearchCommand {
        self.monitors
            .iter()
            .map(|m| m.search_command())
            .find(|command| *command != SearchCommand::Continue)
            .unwrap_or(SearchCommand::Continue)
    }

    fn propagation_command(&self) -> SearchCommand {
        self.monitors
            .iter()
            .map(|m| m.propagation_command())
            .find(|command| *command != SearchCommand::Continue)
            .unwrap_or(SearchCommand::Continue)
    }
}
