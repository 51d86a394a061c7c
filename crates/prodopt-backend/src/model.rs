//! 建模介面：變數、線性式、約束與目標

use prodopt_core::PlanError;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::BackendFeatures;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// 決策變數代號，綁定建立它的模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId {
    model: u64,
    index: usize,
}

impl VarId {
    /// 在所屬模型中的位置
    pub fn index(&self) -> usize {
        self.index
    }
}

/// 變數定義域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDomain {
    /// 連續實數
    Continuous,
    /// 整數
    Integer,
    /// 0/1
    Binary,
}

impl VarDomain {
    pub fn is_integral(&self) -> bool {
        matches!(self, VarDomain::Integer | VarDomain::Binary)
    }
}

/// 決策變數
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    pub upper: f64,
}

/// 線性式 `Σ coef·var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常數式
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// 建構器模式：加上一項 `coef·var`
    pub fn plus(mut self, var: VarId, coef: f64) -> Self {
        self.terms.push((var, coef));
        self
    }

    /// 建構器模式：加上常數
    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// 合併同一變數的係數，並移除係數為 0 的項
    pub fn merged(&self) -> Vec<(VarId, f64)> {
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for &(var, coef) in &self.terms {
            match merged.iter_mut().find(|(v, _)| *v == var) {
                Some((_, c)) => *c += coef,
                None => merged.push((var, coef)),
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        merged
    }

    /// 依變數位置取值計算
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values.get(var.index).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.terms.iter().map(|&(var, _)| var)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().plus(var, 1.0)
    }
}

/// 比較運算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
}

/// 線性約束 `expr (<=|>=|==) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl Constraint {
    /// 檢查取值是否滿足約束（允許 `tolerance` 誤差）
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::LessOrEqual => lhs <= self.rhs + tolerance,
            Comparison::GreaterOrEqual => lhs >= self.rhs - tolerance,
            Comparison::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// 互斥約束：區間 `[start, start + duration)` 兩兩不得重疊
#[derive(Debug, Clone, PartialEq)]
pub struct NoOverlap {
    pub name: String,
    pub intervals: Vec<(VarId, i64)>,
}

/// 最佳化方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// 目標函數：線性部分加上加權平方項 `Σ weight·(expr)²`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub linear: LinearExpr,
    pub squares: Vec<(f64, LinearExpr)>,
}

impl Objective {
    pub fn is_quadratic(&self) -> bool {
        !self.squares.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.linear.evaluate(values)
            + self
                .squares
                .iter()
                .map(|(weight, expr)| {
                    let v = expr.evaluate(values);
                    weight * v * v
                })
                .sum::<f64>()
    }
}

/// 最佳化模型，每次求解建立一次、用完即棄
#[derive(Debug)]
pub struct Model {
    id: u64,
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    no_overlaps: Vec<NoOverlap>,
    objective: Objective,
}

impl Model {
    /// 創建空模型
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            no_overlaps: Vec::new(),
            objective: Objective::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 新增變數；0/1 變數的界限固定為 [0, 1]
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        domain: VarDomain,
        lower: f64,
        upper: f64,
    ) -> VarId {
        let (lower, upper) = match domain {
            VarDomain::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        self.variables.push(Variable {
            name: name.into(),
            domain,
            lower,
            upper,
        });
        VarId {
            model: self.id,
            index: self.variables.len() - 1,
        }
    }

    /// 新增連續變數
    pub fn continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name, VarDomain::Continuous, lower, upper)
    }

    /// 新增整數變數
    pub fn integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name, VarDomain::Integer, lower, upper)
    }

    /// 新增 0/1 變數
    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, VarDomain::Binary, 0.0, 1.0)
    }

    /// 新增線性約束
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) -> prodopt_core::Result<()> {
        self.check_owned(expr.vars())?;
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
        Ok(())
    }

    /// 新增互斥約束
    pub fn add_no_overlap(
        &mut self,
        name: impl Into<String>,
        intervals: Vec<(VarId, i64)>,
    ) -> prodopt_core::Result<()> {
        self.check_owned(intervals.iter().map(|&(var, _)| var))?;
        self.no_overlaps.push(NoOverlap {
            name: name.into(),
            intervals,
        });
        Ok(())
    }

    /// 設置線性最小化目標
    pub fn minimize(&mut self, expr: LinearExpr) -> prodopt_core::Result<()> {
        self.set_objective(Objective {
            sense: Sense::Minimize,
            linear: expr,
            squares: Vec::new(),
        })
    }

    /// 設置線性最大化目標
    pub fn maximize(&mut self, expr: LinearExpr) -> prodopt_core::Result<()> {
        self.set_objective(Objective {
            sense: Sense::Maximize,
            linear: expr,
            squares: Vec::new(),
        })
    }

    /// 設置最小化 `linear + Σ weight·(expr)²`
    pub fn minimize_squares(
        &mut self,
        linear: LinearExpr,
        squares: Vec<(f64, LinearExpr)>,
    ) -> prodopt_core::Result<()> {
        self.set_objective(Objective {
            sense: Sense::Minimize,
            linear,
            squares,
        })
    }

    fn set_objective(&mut self, objective: Objective) -> prodopt_core::Result<()> {
        self.check_owned(objective.linear.vars())?;
        for (_, expr) in &objective.squares {
            self.check_owned(expr.vars())?;
        }
        self.objective = objective;
        Ok(())
    }

    fn check_owned(&self, mut vars: impl Iterator<Item = VarId>) -> prodopt_core::Result<()> {
        match vars.find(|var| var.model != self.id || var.index >= self.variables.len()) {
            Some(var) => Err(PlanError::ForeignVariable {
                variable: format!("#{}", var.index),
                model: self.name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// 查詢變數定義；變數必須屬於此模型
    pub fn variable(&self, var: VarId) -> prodopt_core::Result<&Variable> {
        self.check_owned(std::iter::once(var))?;
        Ok(&self.variables[var.index])
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn no_overlaps(&self) -> &[NoOverlap] {
        &self.no_overlaps
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// 模型用到的功能，供後端比對能力
    pub fn features(&self) -> BackendFeatures {
        BackendFeatures {
            continuous_variables: self
                .variables
                .iter()
                .any(|v| v.domain == VarDomain::Continuous),
            integer_variables: self.variables.iter().any(|v| v.domain.is_integral()),
            quadratic_objective: self.objective.is_quadratic(),
            no_overlap: !self.no_overlaps.is_empty(),
        }
    }

    /// 以指定取值建立解（檢查長度與模型一致）
    pub fn solution(&self, values: Vec<f64>) -> prodopt_core::Result<Solution> {
        if values.len() != self.variables.len() {
            return Err(PlanError::SolverError(format!(
                "後端回傳 {} 個變數值，模型有 {} 個變數",
                values.len(),
                self.variables.len()
            )));
        }
        let values: Vec<f64> = values
            .into_iter()
            .zip(&self.variables)
            .map(|(v, var)| if var.domain.is_integral() { v.round() } else { v })
            .collect();
        Ok(Solution {
            model: self.id,
            objective: self.objective.evaluate(&values),
            values,
        })
    }
}

/// 求解結果：所有變數的取值與目標值
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    model: u64,
    values: Vec<f64>,
    objective: f64,
}

impl Solution {
    /// 取得變數值；變數必須屬於產生此解的模型
    pub fn value(&self, var: VarId) -> prodopt_core::Result<f64> {
        if var.model != self.model {
            return Err(PlanError::ForeignVariable {
                variable: format!("#{}", var.index),
                model: format!("#{}", self.model),
            });
        }
        self.values
            .get(var.index)
            .copied()
            .ok_or_else(|| PlanError::SolverError(format!("解中缺少變數 #{}", var.index)))
    }

    pub fn objective_value(&self) -> f64 {
        self.objective
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
