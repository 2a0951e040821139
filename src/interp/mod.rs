//! The interpreter: player source, global bindings and extraction caches
//!
//! An [`Interpreter`] owns one source text for its whole life. Functions and
//! object tables are pulled out of that text on first use and memoized, so a
//! routine referenced from many call sites is only scanned and parsed once.
//!
//! Instances are single-owner. They use `Rc`/`RefCell` internally and are
//! neither `Send` nor `Sync`; run separate instances for separate sources.

pub mod builtins;
pub mod eval;
pub mod extract;
pub mod ops;

pub use eval::Completion;

use crate::core::function::{JsFunction, SyntheticNames};
use crate::core::options::InterpreterOptions;
use crate::core::scope::{new_layer, Layer, Scope};
use crate::core::value::Value;
use crate::error::JsError;
use crate::parse::ast::{FunctionDef, Stmt};
use crate::parse::parser::parse_statements;
use crate::utils::cache::MemoCache;
use crate::Result;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

pub struct Interpreter {
    code: String,
    options: InterpreterOptions,
    globals: Layer,
    functions: MemoCache<String, Rc<JsFunction>>,
    objects: MemoCache<String, Value>,
    names: SyntheticNames,
}

impl Interpreter {
    /// Create an interpreter over a player source text
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            options: InterpreterOptions::default(),
            globals: new_layer(),
            functions: MemoCache::new(),
            objects: MemoCache::new(),
            names: SyntheticNames::new(),
        }
    }

    /// Create an interpreter whose object cache is pre-seeded
    ///
    /// Seeded names are returned as-is instead of being searched for in
    /// the source.
    pub fn with_objects(code: impl Into<String>, objects: HashMap<String, Value>) -> Self {
        let mut interp = Self::new(code);
        interp.objects = MemoCache::with_entries(objects);
        interp
    }

    /// Replace the interpreter options
    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn source(&self) -> &str {
        &self.code
    }

    /// Outermost layer shared by every extracted function
    pub fn globals(&self) -> &Layer {
        &self.globals
    }

    fn parse(&self, code: &str) -> Result<Vec<Stmt>> {
        parse_statements(code, &self.names, self.options.max_nesting)
    }

    pub(crate) fn compile(
        &self,
        name: String,
        params: Vec<String>,
        body: &str,
        layers: Vec<Layer>,
    ) -> Result<Rc<JsFunction>> {
        let body = self.parse(body)?;
        trace!("Compiled {} ({} statements)", name, body.len());
        let def = FunctionDef { name, params, body };
        Ok(Rc::new(JsFunction::new(Rc::new(def), Scope::from_layers(layers))))
    }

    /// Build a function from parameter names and body text
    ///
    /// The body is parsed once, nested function literals included. The
    /// function closes over `layers` (innermost first); an empty list gets
    /// a private layer of its own.
    pub fn build_function(&self, params: &[&str], body: &str, layers: Vec<Layer>) -> Result<Rc<JsFunction>> {
        let params = params.iter().map(|p| p.to_string()).collect();
        self.compile(self.names.mint(), params, body, layers)
    }

    /// Extract a named function and call it
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        debug!("Calling {} with {} args", name, args.len());
        let func = self.extract_function(name)?;
        func.call(self, args)
    }

    /// Call a compiled function with a fresh recursion budget
    pub fn call(&self, func: &JsFunction, args: &[Value]) -> Result<Value> {
        func.call(self, args)
    }

    /// Run a function body in a new innermost layer of parameter bindings
    ///
    /// Missing arguments are `undefined`; `extra` bindings are added after
    /// the parameters and win over them.
    pub(crate) fn invoke(
        &self,
        func: &JsFunction,
        args: &[Value],
        extra: HashMap<String, Value>,
        budget: usize,
    ) -> Result<Value> {
        let mut bindings: HashMap<String, Value> = func
            .params()
            .iter()
            .enumerate()
            .map(|(idx, param)| (param.clone(), args.get(idx).cloned().unwrap_or_default()))
            .collect();
        bindings.extend(extra);

        let scope = func.captured().child(bindings);
        match self.exec_block(&func.definition().body, &scope, budget)? {
            Completion::Return(value) => Ok(value),
            Completion::Normal(_) => Ok(Value::Undefined),
            Completion::Break | Completion::Continue => Err(JsError::Internal(format!(
                "loop control escaped function {}",
                func.name()
            ))),
        }
    }

    /// Execute statement text, returning its value and whether it returned
    pub fn interpret_statement(&self, code: &str, scope: &Scope, budget: usize) -> Result<(Value, bool)> {
        trace!("Interpreting {}", crate::error::truncate_code(code));
        let stmts = self.parse(code)?;
        match self.exec_block(&stmts, scope, budget)? {
            Completion::Normal(value) => Ok((value, false)),
            Completion::Return(value) => Ok((value, true)),
            Completion::Break | Completion::Continue => Err(JsError::syntax("Illegal break statement", code)),
        }
    }

    /// Evaluate expression text to a value
    pub fn interpret_expression(&self, code: &str, scope: &Scope, budget: usize) -> Result<Value> {
        let (value, returned) = self.interpret_statement(code, scope, budget)?;
        if returned {
            return Err(JsError::syntax("Cannot return from an expression", code));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_function_end_to_end() {
        let interp = Interpreter::new("function f(a,b){return a+b}");
        let result = interp.call_function("f", &[Value::from(2), Value::from(3)]).unwrap();
        assert_eq!(result, Value::from(5));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        let interp = Interpreter::new("function f(a,b){return b}");
        assert_eq!(interp.call_function("f", &[Value::from(1)]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_no_return_gives_undefined() {
        let interp = Interpreter::new("function f(a){a.push(1)}");
        let arr = Value::array(vec![]);
        assert_eq!(interp.call_function("f", &[arr.clone()]).unwrap(), Value::Undefined);
        assert_eq!(arr, Value::array(vec![Value::from(1)]));
    }

    #[test]
    fn test_build_function_with_shared_layer() {
        let interp = Interpreter::new("");
        let shared = new_layer();
        let inc = interp
            .build_function(&["n"], "count = count + n; return count", vec![shared.clone()])
            .unwrap();
        shared.borrow_mut().insert("count".to_string(), Value::from(0));
        inc.call(&interp, &[Value::from(2)]).unwrap();
        assert_eq!(interp.call(&inc, &[Value::from(3)]).unwrap(), Value::from(5));
        assert_eq!(shared.borrow().get("count"), Some(&Value::from(5)));
    }

    #[test]
    fn test_seeded_objects() {
        let table = Value::object(HashMap::from([("k".to_string(), Value::from(7))]));
        let interp = Interpreter::with_objects("function f(){return O.k}", HashMap::from([("O".to_string(), table)]));
        assert_eq!(interp.call_function("f", &[]).unwrap(), Value::from(7));
    }

    #[test]
    fn test_interpret_expression_rejects_return() {
        let interp = Interpreter::new("");
        let err = interp.interpret_expression("return 1", &Scope::new(), 100).unwrap_err();
        assert!(err.is_syntax_error());
        let (value, returned) = interp.interpret_statement("return 1", &Scope::new(), 100).unwrap();
        assert!(returned);
        assert_eq!(value, Value::from(1));
    }

    #[test]
    fn test_interpret_expression_object_text() {
        let interp = Interpreter::new("");
        let value = interp.interpret_expression("{a: 1, b: 2}", &Scope::new(), 100).unwrap();
        let expected = HashMap::from([("a".to_string(), Value::from(1)), ("b".to_string(), Value::from(2))]);
        assert_eq!(value, Value::object(expected));

        let value = interp
            .interpret_expression(r#"{"a": [1, {"b": null}], "c": "x"}"#, &Scope::new(), 100)
            .unwrap();
        let inner = Value::object(HashMap::from([("b".to_string(), Value::Null)]));
        let expected = HashMap::from([
            ("a".to_string(), Value::array(vec![Value::from(1), inner])),
            ("c".to_string(), Value::from("x")),
        ]);
        assert_eq!(value, Value::object(expected));
    }

    #[test]
    fn test_recursion_depth_scales_with_limit() {
        let code = "function f(n){return n?1+f(n-1):0}";
        let interp = Interpreter::new(code);
        assert_eq!(interp.call_function("f", &[Value::from(20)]).unwrap(), Value::from(20));
        assert!(interp.call_function("f", &[Value::from(30)]).unwrap_err().is_recursion_limit());

        let interp = Interpreter::new(code).with_options(InterpreterOptions::new().with_recursion_limit(200));
        assert_eq!(interp.call_function("f", &[Value::from(30)]).unwrap(), Value::from(30));
    }

    #[test]
    fn test_options_are_applied() {
        let interp = Interpreter::new("function f(){return f()}")
            .with_options(InterpreterOptions::new().with_recursion_limit(10));
        assert_eq!(interp.options().recursion_limit, 10);
        assert!(interp.call_function("f", &[]).unwrap_err().is_recursion_limit());
    }
}
