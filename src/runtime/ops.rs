//! Operator semantics over value pairs.
//!
//! Combinations without a defined meaning produce `nil` rather than failing.
//! The one operator fault is integer division by zero.

use crate::runtime::error::RuntimeErrorKind;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinaryOp, UnaryOp};

pub fn unary(op: UnaryOp, operand: &Value) -> Value {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::Plus, Value::Int(_) | Value::Float(_)) => operand.clone(),
        (UnaryOp::Minus, Value::Int(n)) => Value::Int(n.wrapping_neg()),
        (UnaryOp::Minus, Value::Float(x)) => Value::Float(-x),
        _ => Value::Nil,
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let value = match (left, right) {
        (Value::Int(l), Value::Int(r)) => return int_op(op, *l, *r),
        (Value::Int(l), Value::Float(r)) => float_op(op, *l as f64, *r),
        (Value::Float(l), Value::Int(r)) => float_op(op, *l, *r as f64),
        (Value::Float(l), Value::Float(r)) => float_op(op, *l, *r),
        (Value::Bool(l), Value::Bool(r)) => bool_op(op, *l, *r),
        (Value::Str(l), Value::Str(r)) if op == BinaryOp::Add => {
            let mut s = String::with_capacity(l.len() + r.len());
            s.push_str(l);
            s.push_str(r);
            Value::Str(s.into())
        }
        _ => Value::Nil,
    };
    Ok(value)
}

fn int_op(op: BinaryOp, l: i64, r: i64) -> Result<Value, RuntimeErrorKind> {
    Ok(match op {
        BinaryOp::Add => Value::Int(l.wrapping_add(r)),
        BinaryOp::Sub => Value::Int(l.wrapping_sub(r)),
        BinaryOp::Mul => Value::Int(l.wrapping_mul(r)),
        BinaryOp::Div if r == 0 => return Err(RuntimeErrorKind::DivisionByZero),
        // Truncates toward zero; i64::MIN / -1 wraps
        BinaryOp::Div => Value::Int(l.wrapping_div(r)),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::LtEq => Value::Bool(l <= r),
        BinaryOp::GtEq => Value::Bool(l >= r),
        BinaryOp::Or | BinaryOp::And => Value::Nil,
    })
}

fn float_op(op: BinaryOp, l: f64, r: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Float(l + r),
        BinaryOp::Sub => Value::Float(l - r),
        BinaryOp::Mul => Value::Float(l * r),
        BinaryOp::Div => Value::Float(l / r),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::LtEq => Value::Bool(l <= r),
        BinaryOp::GtEq => Value::Bool(l >= r),
        BinaryOp::Or | BinaryOp::And => Value::Nil,
    }
}

fn bool_op(op: BinaryOp, l: bool, r: bool) -> Value {
    match op {
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Or => Value::Bool(l || r),
        BinaryOp::And => Value::Bool(l && r),
        _ => Value::Nil,
    }
}
