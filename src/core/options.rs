//! Interpreter configuration

use serde::{Deserialize, Serialize};

/// Interpreter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Evaluation depth allowed per top-level invocation
    ///
    /// Every nested statement and expression node spends one unit, so one
    /// level of JavaScript recursion costs several. With the default of 100,
    /// `function f(n){return n?1+f(n-1):0}` stops at a depth of about 25.
    pub recursion_limit: usize,
    /// Maximum syntactic nesting accepted by the parser
    pub max_nesting: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            recursion_limit: 100,
            max_nesting: 256,
        }
    }
}

impl InterpreterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation depth budget
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Set the parser nesting bound
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Load options from a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
