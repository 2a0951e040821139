//! Binary operator semantics

use crate::core::value::Value;
use crate::parse::ast::BinaryOp;
use std::cmp::Ordering;

/// Apply a binary operator to two evaluated operands
///
/// Short-circuit operators are handled here too, for compound assignment;
/// the evaluator skips the right operand itself when it can.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Nullish => {
            if left.is_nullish() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
        BinaryOp::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::BitOr => int32(left.to_int32() | right.to_int32()),
        BinaryOp::BitXor => int32(left.to_int32() ^ right.to_int32()),
        BinaryOp::BitAnd => int32(left.to_int32() & right.to_int32()),
        BinaryOp::Shr => int32(left.to_int32() >> shift_count(right)),
        BinaryOp::Shl => int32(left.to_int32().wrapping_shl(shift_count(right))),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right).is_some_and(Ordering::is_lt)),
        BinaryOp::Le => Value::Bool(compare(left, right).is_some_and(Ordering::is_le)),
        BinaryOp::Gt => Value::Bool(compare(left, right).is_some_and(Ordering::is_gt)),
        BinaryOp::Ge => Value::Bool(compare(left, right).is_some_and(Ordering::is_ge)),
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        // f64 `%` is the truncated remainder and yields NaN for a zero divisor
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(power(left.to_number(), right.to_number())),
    }
}

fn int32(n: i32) -> Value {
    Value::Number(f64::from(n))
}

fn shift_count(value: &Value) -> u32 {
    (value.to_int32() as u32) & 31
}

pub fn power(base: f64, exponent: f64) -> f64 {
    if exponent == 0.0 {
        1.0
    } else if exponent.is_nan() {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn is_stringish(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
    )
}

fn add(left: &Value, right: &Value) -> Value {
    if is_stringish(left) || is_stringish(right) {
        let mut text = left.to_js_string();
        text.push_str(&right.to_js_string());
        return Value::String(text);
    }
    Value::Number(left.to_number() + right.to_number())
}

/// Relational ordering; `None` means every comparison is false
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Undefined, _) | (_, Value::Undefined) => None,
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_bitwise_is_signed_int32() {
        assert_eq!(apply_binary(BinaryOp::BitOr, &num(4294967295.0), &num(0.0)), num(-1.0));
        assert_eq!(apply_binary(BinaryOp::Shl, &num(1.0), &num(31.0)), num(-2147483648.0));
        assert_eq!(apply_binary(BinaryOp::Shl, &num(1.0), &num(33.0)), num(2.0));
        assert_eq!(apply_binary(BinaryOp::Shr, &num(-8.0), &num(1.0)), num(-4.0));
        assert_eq!(apply_binary(BinaryOp::BitXor, &Value::Undefined, &num(5.0)), num(5.0));
        assert_eq!(apply_binary(BinaryOp::BitAnd, &num(f64::NAN), &num(5.0)), num(0.0));
    }

    #[test]
    fn test_remainder_keeps_dividend_sign() {
        assert_eq!(apply_binary(BinaryOp::Mod, &num(-7.0), &num(3.0)), num(-1.0));
        assert_eq!(apply_binary(BinaryOp::Mod, &num(7.0), &num(-3.0)), num(1.0));
        let nan = apply_binary(BinaryOp::Mod, &num(7.0), &num(0.0));
        assert!(nan.as_number().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_add_concatenates_strings_and_arrays() {
        assert_eq!(apply_binary(BinaryOp::Add, &Value::from("a"), &num(1.0)), Value::from("a1"));
        let arr = Value::array(vec![num(1.0), num(2.0)]);
        assert_eq!(apply_binary(BinaryOp::Add, &arr, &Value::from("")), Value::from("1,2"));
        assert_eq!(apply_binary(BinaryOp::Add, &Value::Null, &num(2.0)), num(2.0));
        let nan = apply_binary(BinaryOp::Add, &Value::Undefined, &num(2.0));
        assert!(nan.as_number().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_division() {
        assert_eq!(apply_binary(BinaryOp::Div, &num(1.0), &num(0.0)), num(f64::INFINITY));
        assert_eq!(apply_binary(BinaryOp::Div, &num(-1.0), &num(0.0)), num(f64::NEG_INFINITY));
    }

    #[test]
    fn test_power() {
        assert_eq!(apply_binary(BinaryOp::Pow, &num(5.0), &num(0.0)), num(1.0));
        assert_eq!(apply_binary(BinaryOp::Pow, &num(2.0), &num(10.0)), num(1024.0));
        assert_eq!(power(f64::NAN, 0.0), 1.0);
        assert!(power(1.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply_binary(BinaryOp::Lt, &num(1.0), &num(2.0)), Value::Bool(true));
        assert_eq!(apply_binary(BinaryOp::Ge, &Value::Undefined, &num(2.0)), Value::Bool(false));
        assert_eq!(apply_binary(BinaryOp::Lt, &Value::Undefined, &num(2.0)), Value::Bool(false));
        assert_eq!(apply_binary(BinaryOp::Gt, &Value::from("b"), &Value::from("a")), Value::Bool(true));
        assert_eq!(apply_binary(BinaryOp::Le, &Value::Null, &num(0.0)), Value::Bool(true));
    }

    #[test]
    fn test_equality() {
        assert_eq!(apply_binary(BinaryOp::Eq, &Value::Null, &Value::Undefined), Value::Bool(true));
        assert_eq!(apply_binary(BinaryOp::StrictEq, &Value::Null, &Value::Undefined), Value::Bool(false));
        let arr = Value::array(vec![]);
        assert_eq!(apply_binary(BinaryOp::StrictEq, &arr, &arr.clone()), Value::Bool(true));
        assert_eq!(apply_binary(BinaryOp::StrictNe, &arr, &Value::array(vec![])), Value::Bool(true));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(apply_binary(BinaryOp::Or, &num(0.0), &Value::from("x")), Value::from("x"));
        assert_eq!(apply_binary(BinaryOp::And, &num(0.0), &Value::from("x")), num(0.0));
        assert_eq!(apply_binary(BinaryOp::Nullish, &num(0.0), &num(3.0)), num(0.0));
        assert_eq!(apply_binary(BinaryOp::Nullish, &Value::Null, &num(3.0)), num(3.0));
    }
}
