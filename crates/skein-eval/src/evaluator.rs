//! Condition evaluator: truthiness, short-circuit logic, equality and
//! numeric ordering over [`Value`]s.

use skein_parser::parse_expression;
use skein_types::ast::{BinOp, Expr, UnaryOp};
use skein_types::{ExprError, Value};

use crate::env::VariableStore;

/// Evaluate `expr` against `vars`.
pub fn evaluate(expr: &Expr, vars: &VariableStore) -> Result<Value, ExprError> {
    Evaluator { vars }.eval_expr(expr)
}

/// Parse and evaluate condition text, coercing the result to a boolean.
///
/// Blank text is `true`.
pub fn evaluate_condition(text: &str, vars: &VariableStore) -> Result<bool, ExprError> {
    let expr = parse_expression(text)?;
    Ok(evaluate(&expr, vars)?.is_truthy())
}

/// Tree-walking evaluator over a borrowed variable store.
struct Evaluator<'a> {
    vars: &'a VariableStore,
}

impl Evaluator<'_> {
    fn eval_expr(&self, expr: &Expr) -> Result<Value, ExprError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => Ok(self.vars.get(name).cloned().unwrap_or(Value::Null)),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
        }
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr) -> Result<Value, ExprError> {
        let value = self.eval_expr(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        }
    }

    /// `&&` and `||` short-circuit and always produce a Boolean.
    fn eval_binary(&self, left: &Expr, op: BinOp, right: &Expr) -> Result<Value, ExprError> {
        let result = match op {
            BinOp::And => self.truthy(left)? && self.truthy(right)?,
            BinOp::Or => self.truthy(left)? || self.truthy(right)?,
            BinOp::Eq => loose_eq(&self.eval_expr(left)?, &self.eval_expr(right)?),
            BinOp::NotEq => !loose_eq(&self.eval_expr(left)?, &self.eval_expr(right)?),
            BinOp::Less => self.eval_ordering(left, op, right, |a, b| a < b)?,
            BinOp::LessEq => self.eval_ordering(left, op, right, |a, b| a <= b)?,
            BinOp::Greater => self.eval_ordering(left, op, right, |a, b| a > b)?,
            BinOp::GreaterEq => self.eval_ordering(left, op, right, |a, b| a >= b)?,
        };
        Ok(Value::Bool(result))
    }

    fn truthy(&self, expr: &Expr) -> Result<bool, ExprError> {
        Ok(self.eval_expr(expr)?.is_truthy())
    }

    /// Ordering requires both operands to coerce to numbers.
    fn eval_ordering(
        &self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        cmp: fn(f64, f64) -> bool,
    ) -> Result<bool, ExprError> {
        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;
        match (lv.as_number(), rv.as_number()) {
            (Some(a), Some(b)) => Ok(cmp(a, b)),
            _ => Err(ExprError::NotComparable {
                op: op.symbol(),
                left: lv.type_name(),
                right: rv.type_name(),
            }),
        }
    }
}

/// `==` semantics.
///
/// `null` equals only `null`. Two strings compare ordinally. Otherwise two
/// number-coercible operands compare as numbers, and anything left compares
/// structurally.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}
