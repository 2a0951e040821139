//! Compiled functions and synthetic binding names

use crate::core::scope::Scope;
use crate::core::value::Value;
use crate::interp::Interpreter;
use crate::parse::ast::FunctionDef;
use crate::Result;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A callable closure: a parsed function plus the scope layers it closed over
pub struct JsFunction {
    def: Rc<FunctionDef>,
    captured: Scope,
}

impl JsFunction {
    pub fn new(def: Rc<FunctionDef>, captured: Scope) -> Self {
        Self { def, captured }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn params(&self) -> &[String] {
        &self.def.params
    }

    pub fn definition(&self) -> &Rc<FunctionDef> {
        &self.def
    }

    /// Layers visible to the body besides its own call layer
    pub fn captured(&self) -> &Scope {
        &self.captured
    }

    /// Invoke with positional arguments and a fresh recursion budget
    pub fn call(&self, interp: &Interpreter, args: &[Value]) -> Result<Value> {
        interp.invoke(self, args, HashMap::new(), interp.options().recursion_limit)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F<{}>", self.def.name)
    }
}

/// Source of process-unique identifiers for synthetic bindings
///
/// The counter only grows, so a minted name never repeats within one
/// interpreter and cannot collide with identifiers in player source.
#[derive(Debug, Default)]
pub struct SyntheticNames {
    counter: Cell<u64>,
}

impl SyntheticNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self) -> String {
        let next = self.counter.get() + 1;
        self.counter.set(next);
        format!("__ytjs_obj{}", next)
    }

    /// Number of names minted so far
    pub fn minted(&self) -> u64 {
        self.counter.get()
    }
}
