//! Emulated runtime methods
//!
//! Only the methods deciphering routines actually use are provided. Each one
//! checks its preconditions and fails loudly rather than guessing.

use crate::core::value::{ArrayRef, Value};
use crate::error::JsError;
use crate::interp::ops::power;
use crate::interp::Interpreter;
use crate::Result;
use std::collections::HashMap;
use tracing::trace;

/// Global names that resolve to builtin namespaces when not shadowed
pub const NAMESPACES: &[&str] = &["String", "Math", "Array", "Object"];

/// Call a static method such as `String.fromCharCode` or `Math.pow`
pub fn call_static(namespace: &str, method: &str, args: &[Value]) -> Result<Value> {
    match (namespace, method) {
        ("String", "fromCharCode") => {
            if args.is_empty() {
                return Err(JsError::builtin(namespace, method, "takes at least one argument"));
            }
            let text = args
                .iter()
                .map(|arg| {
                    let code = (arg.to_int32() as u32) & 0xFFFF;
                    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect::<String>();
            Ok(Value::String(text))
        }
        ("Math", "pow") => match args {
            [base, exponent] => Ok(Value::Number(power(base.to_number(), exponent.to_number()))),
            _ => Err(JsError::builtin(namespace, method, "takes exactly two arguments")),
        },
        _ => Err(JsError::builtin(namespace, method, "is not supported")),
    }
}

/// Resolve a possibly negative position against a length, the way `slice` does
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let Some(value) = value.filter(|v| !matches!(v, Value::Undefined)) else {
        return default;
    };
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn expect_array<'v>(target: &'v Value, method: &str) -> Result<&'v ArrayRef> {
    target
        .as_array()
        .ok_or_else(|| JsError::builtin(target.type_name(), method, "must be called on an array"))
}

fn expect_no_args(target: &Value, method: &str, args: &[Value]) -> Result<()> {
    if !args.is_empty() {
        return Err(JsError::builtin(target.type_name(), method, "does not take arguments"));
    }
    Ok(())
}

impl Interpreter {
    /// Dispatch a builtin method on an evaluated receiver
    pub(crate) fn call_method(&self, target: &Value, method: &str, args: Vec<Value>, budget: usize) -> Result<Value> {
        trace!("Calling builtin {}.{} with {} args", target.type_name(), method, args.len());
        let kind = target.type_name();

        match method {
            "split" => {
                let text = target
                    .as_str()
                    .ok_or_else(|| JsError::builtin(kind, method, "must be called on a string"))?;
                let separator = match args.as_slice() {
                    [] => String::new(),
                    [separator] => separator.to_js_string(),
                    _ => return Err(JsError::builtin(kind, method, "does not support a limit")),
                };
                let pieces = if separator.is_empty() {
                    text.chars().map(|c| Value::String(c.to_string())).collect()
                } else {
                    text.split(separator.as_str()).map(Value::from).collect()
                };
                Ok(Value::array(pieces))
            }
            "join" => {
                let items = expect_array(target, method)?;
                let [separator] = args.as_slice() else {
                    return Err(JsError::builtin(kind, method, "takes exactly one argument"));
                };
                let separator = separator.to_js_string();
                let joined = items
                    .borrow()
                    .iter()
                    .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                    .collect::<Vec<_>>()
                    .join(&separator);
                Ok(Value::String(joined))
            }
            "reverse" => {
                expect_no_args(target, method, &args)?;
                expect_array(target, method)?.borrow_mut().reverse();
                Ok(target.clone())
            }
            "slice" => {
                if args.len() > 2 {
                    return Err(JsError::builtin(kind, method, "takes at most two arguments"));
                }
                match target {
                    Value::Array(items) => {
                        let items = items.borrow();
                        let start = relative_index(args.first(), items.len(), 0);
                        let end = relative_index(args.get(1), items.len(), items.len());
                        let sliced = if start < end { items[start..end].to_vec() } else { Vec::new() };
                        Ok(Value::array(sliced))
                    }
                    Value::String(text) => {
                        let chars: Vec<char> = text.chars().collect();
                        let start = relative_index(args.first(), chars.len(), 0);
                        let end = relative_index(args.get(1), chars.len(), chars.len());
                        let sliced = if start < end { chars[start..end].iter().collect() } else { String::new() };
                        Ok(Value::String(sliced))
                    }
                    _ => Err(JsError::builtin(kind, method, "must be called on an array or string")),
                }
            }
            "splice" => {
                let items = expect_array(target, method)?;
                if args.is_empty() {
                    return Err(JsError::builtin(kind, method, "takes at least one argument"));
                }
                let mut items = items.borrow_mut();
                let len = items.len();
                let start = relative_index(args.first(), len, 0);
                let count = match args.get(1) {
                    Some(count) => {
                        let n = count.to_number();
                        if n.is_nan() || n <= 0.0 {
                            0
                        } else {
                            (n.trunc() as usize).min(len - start)
                        }
                    }
                    None => len - start,
                };
                let inserted = args.iter().skip(2).cloned();
                let removed: Vec<Value> = items.splice(start..start + count, inserted).collect();
                Ok(Value::array(removed))
            }
            "unshift" => {
                let mut items = expect_array(target, method)?.borrow_mut();
                for (offset, arg) in args.into_iter().enumerate() {
                    items.insert(offset, arg);
                }
                drop(items);
                Ok(target.clone())
            }
            "pop" => {
                expect_no_args(target, method, &args)?;
                let popped = expect_array(target, method)?.borrow_mut().pop();
                Ok(popped.unwrap_or_default())
            }
            "push" => {
                let items = expect_array(target, method)?;
                if args.is_empty() {
                    return Err(JsError::builtin(kind, method, "takes at least one argument"));
                }
                items.borrow_mut().extend(args);
                Ok(target.clone())
            }
            "forEach" => {
                let items = expect_array(target, method)?;
                let (callback, this) = match args.as_slice() {
                    [callback] => (callback, None),
                    [callback, this] => (callback, Some(this.clone())),
                    _ => return Err(JsError::builtin(kind, method, "takes one or two arguments")),
                };
                let func = callback
                    .as_function()
                    .ok_or_else(|| JsError::builtin(kind, method, "callback must be a function"))?;

                let snapshot = items.borrow().clone();
                let mut results = Vec::with_capacity(snapshot.len());
                for (idx, item) in snapshot.into_iter().enumerate() {
                    let mut extra = HashMap::new();
                    if let Some(this) = &this {
                        extra.insert("this".to_string(), this.clone());
                    }
                    let call_args = [item, Value::from(idx), target.clone()];
                    results.push(self.invoke(func, &call_args, extra, budget)?);
                }
                Ok(Value::array(results))
            }
            "indexOf" => {
                let (needle, from) = match args.as_slice() {
                    [needle] => (needle, None),
                    [needle, from] => (needle, Some(from)),
                    _ => return Err(JsError::builtin(kind, method, "takes one or two arguments")),
                };
                let position = match target {
                    Value::Array(items) => {
                        let items = items.borrow();
                        let start = relative_index(from, items.len(), 0);
                        items
                            .iter()
                            .enumerate()
                            .skip(start)
                            .find(|(_, item)| item.strict_equals(needle))
                            .map(|(idx, _)| idx)
                    }
                    Value::String(text) => {
                        let chars: Vec<char> = text.chars().collect();
                        let start = relative_index(from, chars.len(), 0);
                        let needle: Vec<char> = needle.to_js_string().chars().collect();
                        (start..=chars.len().saturating_sub(needle.len()))
                            .find(|&idx| chars[idx..].starts_with(&needle))
                    }
                    _ => return Err(JsError::builtin(kind, method, "must be called on an array or string")),
                };
                Ok(position.map_or(Value::Number(-1.0), Value::from))
            }
            "charCodeAt" => {
                let text = target
                    .as_str()
                    .ok_or_else(|| JsError::builtin(kind, method, "must be called on a string"))?;
                // A missing or non-numeric position reads the first character
                let idx = args.first().map_or(0.0, Value::to_number);
                let idx = if idx.is_nan() { 0.0 } else { idx.trunc() };
                let code = if idx >= 0.0 {
                    text.chars().nth(idx as usize).map(|c| f64::from(u32::from(c)))
                } else {
                    None
                };
                Ok(Value::Number(code.unwrap_or(f64::NAN)))
            }
            "concat" => match target {
                Value::Array(items) => {
                    let mut joined = items.borrow().clone();
                    for arg in &args {
                        match arg.to_vec() {
                            Some(more) => joined.extend(more),
                            None => joined.push(arg.clone()),
                        }
                    }
                    Ok(Value::array(joined))
                }
                Value::String(text) => {
                    let mut joined = text.clone();
                    for arg in &args {
                        joined.push_str(&arg.to_js_string());
                    }
                    Ok(Value::String(joined))
                }
                _ => Err(JsError::builtin(kind, method, "must be called on an array or string")),
            },
            _ if target.as_str().is_some() => Err(JsError::builtin("String", method, "is not supported")),
            _ => Err(JsError::Type(format!("{}.{} is not a function", kind, method))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Value {
        Value::array(values.iter().map(|&n| Value::Number(n)).collect())
    }

    fn call(target: &Value, method: &str, args: Vec<Value>) -> Result<Value> {
        Interpreter::new("").call_method(target, method, args, 100)
    }

    #[test]
    fn test_push_returns_mutated_array() {
        let arr = nums(&[1.0, 2.0]);
        let result = call(&arr, "push", vec![Value::from(3), Value::from(4)]).unwrap();
        assert_eq!(result, nums(&[1.0, 2.0, 3.0, 4.0]));
        assert!(result.strict_equals(&arr));
        assert!(call(&arr, "push", vec![]).is_err());
    }

    #[test]
    fn test_splice_removes_and_inserts() {
        let arr = nums(&[1.0, 2.0, 3.0, 4.0]);
        let removed = call(&arr, "splice", vec![Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(removed, nums(&[2.0, 3.0]));
        assert_eq!(arr, nums(&[1.0, 4.0]));

        call(&arr, "splice", vec![Value::from(1), Value::from(0), Value::from(9)]).unwrap();
        assert_eq!(arr, nums(&[1.0, 9.0, 4.0]));
    }

    #[test]
    fn test_index_of() {
        let arr = nums(&[5.0, 6.0, 7.0]);
        assert_eq!(call(&arr, "indexOf", vec![Value::from(6)]).unwrap(), Value::from(1));
        assert_eq!(call(&arr, "indexOf", vec![Value::from(9)]).unwrap(), Value::from(-1));
        assert_eq!(call(&arr, "indexOf", vec![Value::from(5), Value::from(1)]).unwrap(), Value::from(-1));
        let text = Value::from("abcabc");
        assert_eq!(call(&text, "indexOf", vec![Value::from("ca")]).unwrap(), Value::from(2));
    }

    #[test]
    fn test_split_and_join() {
        let parts = call(&Value::from("abc"), "split", vec![Value::from("")]).unwrap();
        assert_eq!(parts.to_vec().unwrap().len(), 3);
        let parts = call(&Value::from("a,b"), "split", vec![Value::from(",")]).unwrap();
        assert_eq!(parts, Value::array(vec![Value::from("a"), Value::from("b")]));
        assert_eq!(call(&parts, "join", vec![Value::from("-")]).unwrap(), Value::from("a-b"));
        assert!(call(&parts, "join", vec![]).is_err());
    }

    #[test]
    fn test_reverse_pop_unshift() {
        let arr = nums(&[1.0, 2.0, 3.0]);
        call(&arr, "reverse", vec![]).unwrap();
        assert_eq!(arr, nums(&[3.0, 2.0, 1.0]));
        assert_eq!(call(&arr, "pop", vec![]).unwrap(), Value::from(1));
        call(&arr, "unshift", vec![Value::from(7), Value::from(8)]).unwrap();
        assert_eq!(arr, nums(&[7.0, 8.0, 3.0, 2.0]));
        assert_eq!(call(&nums(&[]), "pop", vec![]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_slice_with_negative_indices() {
        let arr = nums(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(call(&arr, "slice", vec![Value::from(1)]).unwrap(), nums(&[2.0, 3.0, 4.0]));
        assert_eq!(call(&arr, "slice", vec![Value::from(-2)]).unwrap(), nums(&[3.0, 4.0]));
        assert_eq!(call(&arr, "slice", vec![Value::from(1), Value::from(-1)]).unwrap(), nums(&[2.0, 3.0]));
        assert_eq!(call(&Value::from("hello"), "slice", vec![Value::from(1), Value::from(3)]).unwrap(), Value::from("el"));
    }

    #[test]
    fn test_char_code_and_from_char_code() {
        assert_eq!(call(&Value::from("A"), "charCodeAt", vec![Value::from(0)]).unwrap(), Value::from(65));
        let out_of_range = call(&Value::from("A"), "charCodeAt", vec![Value::from(5)]).unwrap();
        assert!(out_of_range.as_number().is_some_and(f64::is_nan));
        let text = call_static("String", "fromCharCode", &[Value::from(72), Value::from(105)]).unwrap();
        assert_eq!(text, Value::from("Hi"));
        assert!(call_static("String", "fromCharCode", &[]).is_err());
    }

    #[test]
    fn test_concat() {
        let arr = nums(&[1.0]);
        let joined = call(&arr, "concat", vec![nums(&[2.0, 3.0]), Value::from(4)]).unwrap();
        assert_eq!(joined, nums(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(arr, nums(&[1.0]));
    }

    #[test]
    fn test_unsupported_string_method_names_method() {
        let err = call(&Value::from("abc"), "toUpperCase", vec![]).unwrap_err();
        assert!(err.to_string().contains("toUpperCase"));
    }

    #[test]
    fn test_math_pow() {
        assert_eq!(call_static("Math", "pow", &[Value::from(2), Value::from(8)]).unwrap(), Value::from(256));
        assert!(call_static("Math", "pow", &[Value::from(2)]).is_err());
    }
}
