//! Core runtime types for ryt-js

pub mod function;
pub mod options;
pub mod scope;
pub mod value;

pub use function::*;
pub use options::*;
pub use scope::*;
pub use value::*;
