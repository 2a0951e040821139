//! Developer command line front end

pub mod args;

pub use args::*;

use crate::core::options::InterpreterOptions;
use crate::core::value::Value;
use crate::interp::Interpreter;
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a JavaScript source file
pub fn load_source(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Read interpreter options from an optional JSON file
pub fn load_options(path: Option<&Path>) -> Result<InterpreterOptions> {
    match path {
        Some(path) => InterpreterOptions::from_json(&fs::read_to_string(path)?),
        None => Ok(InterpreterOptions::default()),
    }
}

/// Decode one `--arg` value
pub fn parse_arg(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(Value::from_json(&json))
}

/// Load the source, call the requested function and return its result as JSON
pub fn run(args: &Args) -> Result<serde_json::Value> {
    let source = load_source(&args.source)?;
    let mut options = load_options(args.options.as_deref())?;
    if let Some(limit) = args.recursion_limit {
        options = options.with_recursion_limit(limit);
    }
    debug!("Loaded {} bytes of source, options {:?}", source.len(), options);

    let values = args
        .args
        .iter()
        .map(|arg| parse_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    let interp = Interpreter::new(source).with_options(options);
    let result = interp.call_function(&args.function, &values)?;
    Ok(result.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_file(code: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(code.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("3").unwrap(), Value::from(3));
        assert_eq!(parse_arg("\"ab\"").unwrap(), Value::from("ab"));
        assert_eq!(parse_arg("[1]").unwrap(), Value::array(vec![Value::from(1)]));
        assert!(parse_arg("nope").is_err());
    }

    #[test]
    fn test_run_calls_function() {
        let file = source_file("var sig=function(a){return a.split(\"\").reverse().join(\"\")}");
        let args = Args {
            source: file.path().to_path_buf(),
            function: "sig".to_string(),
            args: vec!["\"abc\"".to_string()],
            ..Default::default()
        };
        assert_eq!(run(&args).unwrap(), serde_json::json!("cba"));
    }

    #[test]
    fn test_run_with_options_file() {
        let file = source_file("function f(){return f()}");
        let options = source_file(r#"{"recursion_limit": 5}"#);
        let args = Args {
            source: file.path().to_path_buf(),
            function: "f".to_string(),
            options: Some(options.path().to_path_buf()),
            ..Default::default()
        };
        assert!(run(&args).unwrap_err().is_recursion_limit());
    }

    #[test]
    fn test_missing_source_file() {
        let args = Args {
            source: "/nonexistent/player.js".into(),
            function: "f".to_string(),
            ..Default::default()
        };
        assert!(matches!(run(&args), Err(crate::error::JsError::IoError(_))));
    }
}
