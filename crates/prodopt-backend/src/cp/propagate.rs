//! 有限整數定義域與界限傳播

use super::monitor::{SearchCommand, SearchMonitor};

/// 傳播發現定義域為空
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

/// 傳播未到達不動點的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagationStop {
    /// 某變數定義域為空
    Conflict,
    /// 監控器要求中止（時限或取消）
    Interrupted(String),
}

impl From<Conflict> for PropagationStop {
    fn from(_: Conflict) -> Self {
        PropagationStop::Conflict
    }
}

/// 各變數的整數界限 `[lower, upper]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    bounds: Vec<(i64, i64)>,
}

impl Domains {
    pub fn new(bounds: Vec<(i64, i64)>) -> Self {
        Self { bounds }
    }

    pub fn lower(&self, var: usize) -> i64 {
        self.bounds[var].0
    }

    pub fn upper(&self, var: usize) -> i64 {
        self.bounds[var].1
    }

    pub fn size(&self, var: usize) -> u64 {
        self.upper(var).abs_diff(self.lower(var))
    }

    pub fn is_fixed(&self, var: usize) -> bool {
        self.lower(var) == self.upper(var)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// 所有定義域非空
    pub fn is_consistent(&self) -> bool {
        self.bounds.iter().all(|&(lo, hi)| lo <= hi)
    }

    /// 各變數的下界（全部固定時即為解）
    pub fn lower_values(&self) -> Vec<i64> {
        self.bounds.iter().map(|&(lo, _)| lo).collect()
    }

    /// 提高下界；回傳是否有變動
    pub fn raise_lower(&mut self, var: usize, value: i128) -> Result<bool, Conflict> {
        let (lo, hi) = self.bounds[var];
        if value > hi as i128 {
            return Err(Conflict);
        }
        if value > lo as i128 {
            self.bounds[var].0 = value as i64;
            return Ok(true);
        }
        Ok(false)
    }

    /// 降低上界；回傳是否有變動
    pub fn lower_upper(&mut self, var: usize, value: i128) -> Result<bool, Conflict> {
        let (lo, hi) = self.bounds[var];
        if value < lo as i128 {
            return Err(Conflict);
        }
        if value < hi as i128 {
            self.bounds[var].1 = value as i64;
            return Ok(true);
        }
        Ok(false)
    }

    /// 固定變數值
    pub fn fix(&mut self, var: usize, value: i64) -> Result<(), Conflict> {
        self.raise_lower(var, value as i128)?;
        self.lower_upper(var, value as i128)?;
        Ok(())
    }
}

/// 線性不等式 `Σ coef·x ≤ rhs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRow {
    pub terms: Vec<(usize, i64)>,
    pub rhs: i64,
}

impl LinearRow {
    pub fn new(terms: Vec<(usize, i64)>, rhs: i64) -> Self {
        Self { terms, rhs }
    }

    /// `x_before + duration ≤ x_after`
    pub fn precedence(before: usize, duration: i64, after: usize) -> Self {
        Self::new(vec![(before, 1), (after, -1)], duration.saturating_neg())
    }
}

/// 互斥群組：區間 `[start, start + duration)` 兩兩不重疊（只收錄正的加工時間）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disjunctive {
    pub intervals: Vec<(usize, i64)>,
}

fn min_contribution(domains: &Domains, var: usize, coef: i64) -> i128 {
    if coef > 0 {
        coef as i128 * domains.lower(var) as i128
    } else {
        coef as i128 * domains.upper(var) as i128
    }
}

fn floor_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d != 0 && ((n < 0) != (d < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d != 0 && ((n < 0) == (d < 0)) {
        q + 1
    } else {
        q
    }
}

/// 依單一線性不等式收緊界限
fn propagate_row(domains: &mut Domains, row: &LinearRow) -> Result<bool, Conflict> {
    let min_activity: i128 = row
        .terms
        .iter()
        .map(|&(var, coef)| min_contribution(domains, var, coef))
        .sum();
    let rhs = row.rhs as i128;
    if min_activity > rhs {
        return Err(Conflict);
    }

    let mut changed = false;
    for &(var, coef) in &row.terms {
        if coef == 0 {
            continue;
        }
        // 其他項取最小值後，本項最多可用的量
        let slack = rhs - (min_activity - min_contribution(domains, var, coef));
        changed |= if coef > 0 {
            domains.lower_upper(var, floor_div(slack, coef as i128))?
        } else {
            domains.raise_lower(var, ceil_div(slack, coef as i128))?
        };
    }
    Ok(changed)
}

/// 兩兩檢查互斥群組；只剩一種先後可能時強制該先後
fn propagate_disjunctive(domains: &mut Domains, group: &Disjunctive) -> Result<bool, Conflict> {
    let mut changed = false;
    for (k, &(a, da)) in group.intervals.iter().enumerate() {
        for &(b, db) in &group.intervals[k + 1..] {
            let a_first = can_precede(domains, a, da, b);
            let b_first = can_precede(domains, b, db, a);
            match (a_first, b_first) {
                (false, false) => return Err(Conflict),
                (true, false) => changed |= enforce_precedence(domains, a, da, b)?,
                (false, true) => changed |= enforce_precedence(domains, b, db, a)?,
                (true, true) => {}
            }
        }
    }
    Ok(changed)
}

fn can_precede(domains: &Domains, before: usize, duration: i64, after: usize) -> bool {
    domains.lower(before) as i128 + duration as i128 <= domains.upper(after) as i128
}

fn enforce_precedence(
    domains: &mut Domains,
    before: usize,
    duration: i64,
    after: usize,
) -> Result<bool, Conflict> {
    let raised = domains.raise_lower(after, domains.lower(before) as i128 + duration as i128)?;
    let lowered = domains.lower_upper(before, domains.upper(after) as i128 - duration as i128)?;
    Ok(raised || lowered)
}

/// 兩種先後皆可能的作業對（需要分支）
pub fn unresolved_pair(domains: &Domains, groups: &[Disjunctive]) -> Option<((usize, i64), (usize, i64))> {
    groups.iter().find_map(|group| {
        group.intervals.iter().enumerate().find_map(|(k, &(a, da))| {
            group.intervals[k + 1..].iter().find_map(|&(b, db)| {
                (can_precede(domains, a, da, b) && can_precede(domains, b, db, a))
                    .then_some(((a, da), (b, db)))
            })
        })
    })
}

/// 傳播至不動點
///
/// 差分約束形成的環每輪只移動環的權重，輪數可與定義域寬度同階；
/// 因此每輪之間都會詢問監控器是否該中止。
pub fn propagate(
    domains: &mut Domains,
    rows: &[LinearRow],
    posted: &[LinearRow],
    groups: &[Disjunctive],
    monitor: &mut dyn SearchMonitor,
) -> Result<(), PropagationStop> {
    if !domains.is_consistent() {
        return Err(PropagationStop::Conflict);
    }
    loop {
        let mut changed = false;
        for row in rows.iter().chain(posted) {
            changed |= propagate_row(domains, row)?;
        }
        for group in groups {
            changed |= propagate_disjunctive(domains, group)?;
        }
        if !changed {
            return Ok(());
        }

        monitor.on_propagation_pass();
        if let SearchCommand::Terminate(reason) = monitor.propagation_command() {
            return Err(PropagationStop::Interrupted(reason));
        }
    }
}

/// 差分約束 `x_a − x_b ≤ c` 是否含負權環（必定不可行）
///
/// 以 Bellman-Ford 自虛擬源點鬆弛；第 `n` 輪仍有變動即有負環。
/// 其他形式的列不參與判斷。
pub fn has_negative_cycle(vars: usize, rows: &[LinearRow]) -> bool {
    let edges: Vec<(usize, usize, i128)> = rows
        .iter()
        .filter_map(|row| match row.terms.as_slice() {
            &[(a, 1), (b, -1)] | &[(b, -1), (a, 1)] if a != b => Some((b, a, row.rhs as i128)),
            _ => None,
        })
        .collect();
    if edges.is_empty() {
        return false;
    }

    let mut dist = vec![0i128; vars];
    for _ in 0..vars {
        let mut relaxed = false;
        for &(from, to, weight) in &edges {
            if dist[from] + weight < dist[to] {
                dist[to] = dist[from] + weight;
                relaxed = true;
            }
        }
        if !relaxed {
            return false;
        }
    }
    true
}
