//! # ryt-js - minimal JavaScript interpreter for signature deciphering
//!
//! Video players ship small obfuscated JavaScript routines that turn a
//! scrambled signature or throttling parameter into the value a media URL
//! needs. This crate runs those routines without a JavaScript engine: it
//! finds a named function in the player source, parses the subset of the
//! language such routines use and evaluates it.
//!
//! ## Features
//!
//! - Function and object-table extraction from raw player source
//! - Memoized extraction per interpreter instance
//! - Closures over shared, mutable outer scopes
//! - Emulated `String`/`Array` builtins used by deciphering code
//! - Recursion budget against runaway source
//!
//! ## Example
//!
//! ```rust
//! use ryt_js::{Interpreter, Value};
//!
//! let interp = Interpreter::new("var sig=function(a){a=a.split(\"\");a.reverse();return a.join(\"\")}");
//! let result = interp.call_function("sig", &[Value::from("abc")]).unwrap();
//! assert_eq!(result, Value::from("cba"));
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod interp;
pub mod parse;
pub mod utils;

// Re-export main types
pub use core::{InterpreterOptions, JsFunction, Scope, Value};
pub use error::JsError;
pub use interp::Interpreter;

/// Result type alias for ryt-js operations
pub type Result<T> = std::result::Result<T, JsError>;
