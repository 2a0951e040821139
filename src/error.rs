//! Error types for ryt-js

use thiserror::Error;

/// Main error type for interpreter operations
#[derive(Debug, Error)]
pub enum JsError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unsupported JS expression: {0}")]
    Unsupported(String),

    #[error("{target}.{method} {message}")]
    Builtin {
        target: String,
        method: String,
        message: String,
    },

    #[error("Type error: {0}")]
    Type(String),

    #[error("Recursion limit reached")]
    RecursionLimit,

    #[error("Uncaught exception {0}")]
    Thrown(String),

    #[error("Internal interpreter error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl JsError {
    /// Build a syntax error that quotes the offending code
    pub fn syntax(message: &str, code: &str) -> Self {
        JsError::Syntax(format!("{} in: {}", message.trim_end(), truncate_code(code)))
    }

    /// Build an unsupported-construct error that quotes the offending code
    pub fn unsupported(code: &str) -> Self {
        JsError::Unsupported(truncate_code(code))
    }

    /// Build a builtin precondition error
    pub fn builtin(target: &str, method: &str, message: &str) -> Self {
        JsError::Builtin {
            target: target.to_string(),
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    /// Check if error comes from malformed or unrecognised source text
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, JsError::Syntax(_) | JsError::Unsupported(_))
    }

    /// Check if error is the runaway-evaluation guard
    pub fn is_recursion_limit(&self) -> bool {
        matches!(self, JsError::RecursionLimit)
    }
}

/// Shorten code for error messages, keeping 50 leading and 50 trailing chars
pub fn truncate_code(code: &str) -> String {
    const LEAD: usize = 50;
    const TAIL: usize = 50;

    let code = code.trim();
    let count = code.chars().count();
    if count <= LEAD + TAIL + 3 {
        return code.to_string();
    }
    let head: String = code.chars().take(LEAD).collect();
    let tail: String = code.chars().skip(count - TAIL).collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_code_short() {
        assert_eq!(truncate_code("  a+b  "), "a+b");
    }

    #[test]
    fn test_truncate_code_long() {
        let code = "x".repeat(60) + &"y".repeat(60);
        let truncated = truncate_code(&code);
        assert_eq!(truncated.len(), 103);
        assert!(truncated.starts_with(&"x".repeat(50)));
        assert!(truncated.ends_with(&"y".repeat(50)));
    }

    #[test]
    fn test_error_classification() {
        assert!(JsError::syntax("No terminating paren }", "{a").is_syntax_error());
        assert!(JsError::unsupported("a ~ b").is_syntax_error());
        assert!(JsError::RecursionLimit.is_recursion_limit());
        assert!(!JsError::Thrown("10".to_string()).is_syntax_error());
    }

    #[test]
    fn test_builtin_message_names_method() {
        let err = JsError::builtin("array", "join", "takes exactly one argument");
        assert_eq!(err.to_string(), "array.join takes exactly one argument");
    }
}
