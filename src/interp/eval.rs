//! Tree-walking evaluation of statements and expressions
//!
//! Every nested statement or expression spends one unit of the recursion
//! budget. Calls made from inside the evaluator pass the remaining budget on,
//! so self-recursive source text runs out instead of overflowing the stack.

use crate::core::function::JsFunction;
use crate::core::scope::Scope;
use crate::core::value::Value;
use crate::error::JsError;
use crate::interp::builtins::{call_static, NAMESPACES};
use crate::interp::ops::apply_binary;
use crate::interp::Interpreter;
use crate::parse::ast::{BinaryOp, Expr, Property, Stmt, SwitchCase, UnaryOp, UpdateOp};
use crate::Result;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::warn;

/// How a statement finished
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(Value),
    Break,
    Continue,
    Return(Value),
}

/// Largest run of holes an indexed write may open past the end of an array
const MAX_ARRAY_GROWTH: usize = 1 << 16;

fn spend(budget: usize) -> Result<usize> {
    match budget.checked_sub(1) {
        Some(left) => Ok(left),
        None => {
            warn!("Recursion budget exhausted");
            Err(JsError::RecursionLimit)
        }
    }
}

impl Interpreter {
    pub(crate) fn exec_block(&self, stmts: &[Stmt], scope: &Scope, budget: usize) -> Result<Completion> {
        let mut last = Value::Undefined;
        for stmt in stmts {
            match self.exec_stmt(stmt, scope, budget)? {
                Completion::Normal(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: &Scope, budget: usize) -> Result<Completion> {
        let budget = spend(budget)?;

        match stmt {
            Stmt::Empty => Ok(Completion::Normal(Value::Undefined)),
            Stmt::Expr(expr) => Ok(Completion::Normal(self.eval_expr(expr, scope, budget)?)),
            Stmt::Var(decls) => {
                for decl in decls {
                    match &decl.init {
                        Some(init) => {
                            let value = self.eval_expr(init, scope, budget)?;
                            scope.set_local(&decl.name, value);
                        }
                        // Redeclaring keeps the current value
                        None if scope.get_local(&decl.name).is_some() => {}
                        None => scope.set_local(&decl.name, Value::Undefined),
                    }
                }
                Ok(Completion::Normal(Value::Undefined))
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, scope, budget)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Throw(expr) => {
                let value = self.eval_expr(expr, scope, budget)?;
                Err(JsError::Thrown(value.to_js_string()))
            }
            Stmt::Block(stmts) => self.exec_block(stmts, scope, budget),
            Stmt::If { cond, then, otherwise } => {
                if self.eval_expr(cond, scope, budget)?.is_truthy() {
                    self.exec_stmt(then, scope, budget)
                } else if let Some(otherwise) = otherwise {
                    self.exec_stmt(otherwise, scope, budget)
                } else {
                    Ok(Completion::Normal(Value::Undefined))
                }
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.exec_stmt(init, scope, budget)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval_expr(cond, scope, budget)?.is_truthy() {
                            break;
                        }
                    }
                    match self.exec_stmt(body, scope, budget)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal(_) | Completion::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval_expr(update, scope, budget)?;
                    }
                }
                Ok(Completion::Normal(Value::Undefined))
            }
            Stmt::Switch { selector, cases } => self.exec_switch(selector, cases, scope, budget),
            Stmt::Try { body, finally, .. } => {
                // Errors are not caught: the catch clause never runs
                let outcome = self.exec_block(body, scope, budget);
                if let Some(finally) = finally {
                    match self.exec_block(finally, scope, budget)? {
                        Completion::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                outcome
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
        }
    }

    fn exec_switch(&self, selector: &Expr, cases: &[SwitchCase], scope: &Scope, budget: usize) -> Result<Completion> {
        let value = self.eval_expr(selector, scope, budget)?;

        // Labels are tried in order first; `default` only when none matches
        let mut start = None;
        for (idx, case) in cases.iter().enumerate() {
            if let Some(label) = &case.label {
                if self.eval_expr(label, scope, budget)?.loose_equals(&value) {
                    start = Some(idx);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|case| case.label.is_none())) else {
            return Ok(Completion::Normal(Value::Undefined));
        };

        for case in &cases[start..] {
            match self.exec_block(&case.body, scope, budget)? {
                Completion::Normal(_) => {}
                Completion::Break => break,
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    pub(crate) fn eval_expr(&self, expr: &Expr, scope: &Scope, budget: usize) -> Result<Value> {
        let budget = spend(budget)?;

        match expr {
            Expr::Literal(literal) => Ok(literal.to_value()),
            Expr::Ident(name) => Ok(scope.get(name).unwrap_or_default()),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item, scope, budget))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::array(values))
            }
            Expr::Object(members) => {
                let mut table = HashMap::with_capacity(members.len());
                for (key, value) in members {
                    table.insert(key.clone(), self.eval_expr(value, scope, budget)?);
                }
                Ok(Value::object(table))
            }
            Expr::Function(def) => {
                let value = Value::Function(Rc::new(JsFunction::new(def.clone(), scope.clone())));
                scope.set_local(&def.name, value.clone());
                Ok(value)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, scope, budget)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Void => Value::Undefined,
                })
            }
            Expr::Update { op, prefix, name } => {
                let current = scope
                    .get(name)
                    .ok_or_else(|| JsError::Type(format!("{} is not defined", name)))?
                    .to_number();
                let updated = match op {
                    UpdateOp::Increment => current + 1.0,
                    UpdateOp::Decrement => current - 1.0,
                };
                scope.set(name, Value::Number(updated));
                Ok(Value::Number(if *prefix { updated } else { current }))
            }
            Expr::Binary { op, left, right } => {
                let lhs = self.eval_expr(left, scope, budget)?;
                let settled = match op {
                    BinaryOp::Nullish => !lhs.is_nullish(),
                    BinaryOp::Or => lhs.is_truthy(),
                    BinaryOp::And => !lhs.is_truthy(),
                    _ => false,
                };
                if settled {
                    return Ok(lhs);
                }
                let rhs = self.eval_expr(right, scope, budget)?;
                Ok(apply_binary(*op, &lhs, &rhs))
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, scope, budget)?.is_truthy() {
                    self.eval_expr(consequent, scope, budget)
                } else {
                    self.eval_expr(alternate, scope, budget)
                }
            }
            Expr::Assign { name, index, op, value } => {
                self.eval_assign(name, index.as_deref(), *op, value, scope, budget)
            }
            Expr::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval_expr(expr, scope, budget)?;
                }
                Ok(last)
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                if let Some(namespace) = builtin_namespace(object, scope) {
                    return Err(JsError::Unsupported(format!("{} member access", namespace)));
                }
                let target = self.member_target(object, *optional, scope, budget)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.property_key(property, scope, budget)?;
                get_member(&target, &key)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, scope, budget),
        }
    }

    fn eval_args(&self, args: &[Expr], scope: &Scope, budget: usize) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg, scope, budget)).collect()
    }

    fn property_key(&self, property: &Property, scope: &Scope, budget: usize) -> Result<Value> {
        match property {
            Property::Name(name) => Ok(Value::String(name.clone())),
            Property::Computed(expr) => self.eval_expr(expr, scope, budget),
        }
    }

    /// Evaluate the object of a member expression
    ///
    /// A bare name that is not bound is looked up as an object table in the
    /// source text.
    fn member_target(&self, object: &Expr, optional: bool, scope: &Scope, budget: usize) -> Result<Value> {
        match object {
            Expr::Ident(name) if !scope.contains(name) => match self.resolve_object(name) {
                Ok(value) => Ok(value),
                Err(_) if optional => Ok(Value::Undefined),
                Err(err) => Err(err),
            },
            _ => self.eval_expr(object, scope, budget),
        }
    }

    fn eval_assign(
        &self,
        name: &str,
        index: Option<&Expr>,
        op: Option<BinaryOp>,
        value: &Expr,
        scope: &Scope,
        budget: usize,
    ) -> Result<Value> {
        let combine = |current: Value, rhs: Value| match op {
            Some(op) => apply_binary(op, &current, &rhs),
            None => rhs,
        };

        let Some(index) = index else {
            let rhs = self.eval_expr(value, scope, budget)?;
            let updated = combine(scope.get(name).unwrap_or_default(), rhs);
            scope.set(name, updated.clone());
            return Ok(updated);
        };

        let target = scope
            .get(name)
            .ok_or_else(|| JsError::Type(format!("Cannot set index of undefined variable {}", name)))?;
        let key = self.eval_expr(index, scope, budget)?;
        let rhs = self.eval_expr(value, scope, budget)?;

        match &target {
            Value::Array(items) => {
                let idx = key
                    .as_index()
                    .ok_or_else(|| JsError::Type(format!("Invalid array index {} for {}", key, name)))?;
                if idx > items.borrow().len() + MAX_ARRAY_GROWTH {
                    return Err(JsError::Type(format!("Array index {} out of range for {}", idx, name)));
                }
                let current = items.borrow().get(idx).cloned().unwrap_or_default();
                let updated = combine(current, rhs);
                let mut items = items.borrow_mut();
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Undefined);
                }
                items[idx] = updated.clone();
                Ok(updated)
            }
            Value::Object(members) => {
                let key = key.to_js_string();
                let current = members.borrow().get(&key).cloned().unwrap_or_default();
                let updated = combine(current, rhs);
                members.borrow_mut().insert(key, updated.clone());
                Ok(updated)
            }
            other => Err(JsError::Type(format!(
                "Cannot set index of {} ({})",
                name,
                other.type_name()
            ))),
        }
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr], scope: &Scope, budget: usize) -> Result<Value> {
        match callee {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                if let Some((method, spread)) = prototype_call(object, property, scope) {
                    let mut values = self.eval_args(args, scope, budget)?.into_iter();
                    let this = values.next().unwrap_or_default();
                    let rest = if spread {
                        values.next().and_then(|list| list.to_vec()).unwrap_or_default()
                    } else {
                        values.collect()
                    };
                    return self.call_method(&this, method, rest, budget);
                }

                if let Some(namespace) = builtin_namespace(object, scope) {
                    let method = self.property_key(property, scope, budget)?.to_js_string();
                    let values = self.eval_args(args, scope, budget)?;
                    return call_static(namespace, &method, &values);
                }

                let target = self.member_target(object, *optional, scope, budget)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.property_key(property, scope, budget)?;
                let values = self.eval_args(args, scope, budget)?;

                // Function-valued members of arrays and object tables
                if matches!(target, Value::Array(_) | Value::Object(_)) {
                    if let Value::Function(func) = get_member(&target, &key)? {
                        return self.invoke(&func, &values, HashMap::new(), budget);
                    }
                }
                self.call_method(&target, &key.to_js_string(), values, budget)
            }
            Expr::Ident(name) if !scope.contains(name) => {
                let func = self.extract_function(name)?;
                let values = self.eval_args(args, scope, budget)?;
                self.invoke(&func, &values, HashMap::new(), budget)
            }
            _ => {
                let callee_value = self.eval_expr(callee, scope, budget)?;
                let func = callee_value
                    .as_function()
                    .cloned()
                    .ok_or_else(|| JsError::Type(format!("{} is not a function", callee_value.to_js_string())))?;
                let values = self.eval_args(args, scope, budget)?;
                self.invoke(&func, &values, HashMap::new(), budget)
            }
        }
    }
}

/// Namespace name when `object` is an unshadowed builtin global such as `String`
fn builtin_namespace(object: &Expr, scope: &Scope) -> Option<&'static str> {
    match object {
        Expr::Ident(name) if !scope.contains(name) => NAMESPACES.iter().copied().find(|ns| *ns == name.as_str()),
        _ => None,
    }
}

/// Recognise `String.prototype.m.call(...)` and `.apply(...)`
///
/// Returns the method name and whether arguments arrive as one array.
fn prototype_call<'e>(object: &'e Expr, property: &Property, scope: &Scope) -> Option<(&'e str, bool)> {
    let spread = match property {
        Property::Name(name) if name == "call" => false,
        Property::Name(name) if name == "apply" => true,
        _ => return None,
    };
    let Expr::Member {
        object: prototype,
        property: Property::Name(method),
        ..
    } = object
    else {
        return None;
    };
    let Expr::Member {
        object: namespace,
        property: Property::Name(prototype_key),
        ..
    } = prototype.as_ref()
    else {
        return None;
    };
    if prototype_key != "prototype" || builtin_namespace(namespace, scope).is_none() {
        return None;
    }
    Some((method.as_str(), spread))
}

/// Read a property of an evaluated value
fn get_member(target: &Value, key: &Value) -> Result<Value> {
    let name = key.to_js_string();
    match target {
        Value::Undefined | Value::Null => Err(JsError::Type(format!(
            "Cannot read properties of {} (reading '{}')",
            target.to_js_string(),
            name
        ))),
        Value::String(text) => {
            if name == "length" {
                return Ok(Value::from(text.chars().count()));
            }
            Ok(key
                .as_index()
                .and_then(|idx| text.chars().nth(idx))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default())
        }
        Value::Array(items) => {
            let items = items.borrow();
            if name == "length" {
                return Ok(Value::from(items.len()));
            }
            Ok(key.as_index().and_then(|idx| items.get(idx).cloned()).unwrap_or_default())
        }
        Value::Object(members) => {
            let members = members.borrow();
            match members.get(&name) {
                Some(value) => Ok(value.clone()),
                None if name == "length" => Ok(Value::from(members.len())),
                None => Ok(Value::Undefined),
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => Ok(Value::Undefined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Value {
        let interp = Interpreter::new("");
        interp.interpret_expression(src, &Scope::new(), 100).unwrap()
    }

    fn run_err(src: &str) -> JsError {
        let interp = Interpreter::new("");
        interp.interpret_statement(src, &Scope::new(), 100).unwrap_err()
    }

    #[test]
    fn test_scan_order_arithmetic() {
        assert_eq!(run("1+2*3"), Value::from(7));
        assert_eq!(run("10-3-2"), Value::from(5));
        // `-` is scanned before `+`, so this groups as 10-(3+2)
        assert_eq!(run("10-3+2"), Value::from(5));
        assert_eq!(run("(10-3)-2"), Value::from(5));
        assert_eq!(run("2*-2"), Value::from(-4));
        assert_eq!(run("-5%3"), Value::from(-2));
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        assert_eq!(run("var a=0; 1 || (a=5); a"), Value::from(0));
        assert_eq!(run("var a=0; 0 && (a=5); a"), Value::from(0));
        assert_eq!(run("null ?? 4"), Value::from(4));
    }

    #[test]
    fn test_update_semantics() {
        assert_eq!(run("var x=5; x++"), Value::from(5));
        assert_eq!(run("var x=5; ++x"), Value::from(6));
        assert_eq!(run("var x=5; x--; x"), Value::from(4));
        assert!(matches!(run_err("y++"), JsError::Type(_)));
    }

    #[test]
    fn test_index_assignment_extends_array() {
        assert_eq!(run("var a=[1]; a[2]=3; a.length"), Value::from(3));
        assert_eq!(run("var a=[1]; a[2]=3; a[1]"), Value::Undefined);
        assert_eq!(run("var a=[4,5]; a[1]+=2; a[1]"), Value::from(7));
    }

    #[test]
    fn test_index_assignment_far_past_end_is_rejected() {
        assert!(matches!(run_err("var a=[]; a[1e18]=1"), JsError::Type(_)));
        assert!(matches!(run_err("var a=[1]; a[1e9]=1"), JsError::Type(_)));
        assert_eq!(run("var a=[]; a[1000]=1; a.length"), Value::from(1001));

        let interp = Interpreter::new("function f(a){a[1e18]=1;return a.length}");
        let arr = Value::array(vec![]);
        assert!(interp.call_function("f", &[arr.clone()]).is_err());
        assert_eq!(arr, Value::array(vec![]));
    }

    #[test]
    fn test_switch_default_only_without_match() {
        let src = "var r=''; switch(3){case 1: r+='a'; default: r+='d'; case 2: r+='b'; break; case 3: r+='c'} r";
        assert_eq!(run(src), Value::from("c"));
        let src = "var r=''; switch(9){case 1: r+='a'; default: r+='d'; case 2: r+='b'; break; case 3: r+='c'} r";
        assert_eq!(run(src), Value::from("db"));
    }

    #[test]
    fn test_try_finally_runs() {
        assert_eq!(run("var a=1; try{a=2}finally{a+=10} a"), Value::from(12));
        let err = run_err("try{throw 'boom'}catch(e){}");
        assert!(matches!(err, JsError::Thrown(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_member_access() {
        assert_eq!(run("'abc'.length"), Value::from(3));
        assert_eq!(run("'abc'[1]"), Value::from("b"));
        assert_eq!(run("({a: 1, b: 2}).length"), Value::from(2));
        assert_eq!(run("var o={x: {y: 3}}; o.x.y"), Value::from(3));
        assert_eq!(run("var o=null; o?.y"), Value::Undefined);
        assert!(matches!(run_err("var o; o.y"), JsError::Type(_)));
    }

    #[test]
    fn test_object_literal_statement_with_member() {
        assert_eq!(run("{a: 5}.a"), Value::from(5));
    }

    #[test]
    fn test_prototype_call_and_apply() {
        assert_eq!(run("String.prototype.split.call('ab', '').length"), Value::from(2));
        assert_eq!(run("Array.prototype.join.apply([1,2], ['-'])"), Value::from("1-2"));
    }

    #[test]
    fn test_recursion_budget_bounds_nesting() {
        let interp = Interpreter::new("");
        let err = interp.interpret_expression("1+2+3+4+5+6", &Scope::new(), 3).unwrap_err();
        assert!(err.is_recursion_limit());
    }

    #[test]
    fn test_break_outside_loop_is_rejected() {
        assert!(run_err("break").is_syntax_error());
    }
}
