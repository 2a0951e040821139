//! Locating function and object declarations in player source

use crate::core::function::JsFunction;
use crate::core::value::{ObjectRef, Value};
use crate::error::JsError;
use crate::interp::Interpreter;
use crate::utils::splitter::{separate, separate_at_paren};
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

fn split_params(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Interpreter {
    /// Find a function declaration and return its parameters and body text
    ///
    /// Recognises `function name(...)`, `...; name = function(...)` and
    /// `var name = function(...)` declarations.
    pub fn extract_function_code(&self, name: &str) -> Result<(Vec<String>, String)> {
        let name_pattern = regex::escape(name);
        let declaration = Regex::new(&format!(
            r"(?:function\s+{name}|[{{;,]\s*{name}\s*=\s*function|(?:var|let|const)\s+{name}\s*=\s*function)\s*\((?P<args>[^)]*)\)\s*\{{",
            name = name_pattern
        ))?;

        let captures = declaration
            .captures(self.source())
            .ok_or_else(|| JsError::syntax(&format!("Could not find JS function \"{}\"", name), name))?;
        let params = split_params(captures.name("args").map_or("", |m| m.as_str()));
        let brace = captures.get(0).map_or(0, |m| m.end() - 1);
        let (body, _) = separate_at_paren(&self.source()[brace..], None)?;

        debug!("Found function {} with {} params", name, params.len());
        Ok((params, body.to_string()))
    }

    /// Compile a named function from the source, memoized per name
    pub fn extract_function(&self, name: &str) -> Result<Rc<JsFunction>> {
        let key = name.to_string();
        if let Some(func) = self.functions.get(&key) {
            debug!("Function cache hit: {}", name);
            return Ok(func);
        }
        self.functions.get_or_try_insert_with(&key, || {
            let (params, body) = self.extract_function_code(name)?;
            self.compile(name.to_string(), params, &body, vec![self.globals().clone()])
        })
    }

    /// Compile an object literal of function members, memoized per name
    pub fn extract_object(&self, name: &str) -> Result<ObjectRef> {
        match self.resolve_object(name)? {
            Value::Object(table) => Ok(table),
            other => Err(JsError::Type(format!("{} is a {}, not an object", name, other.type_name()))),
        }
    }

    /// Cached or freshly extracted object table, including pre-seeded values
    pub(crate) fn resolve_object(&self, name: &str) -> Result<Value> {
        let key = name.to_string();
        if let Some(value) = self.objects.get(&key) {
            debug!("Object cache hit: {}", name);
            return Ok(value);
        }
        self.objects
            .get_or_try_insert_with(&key, || Ok(Value::object(self.extract_object_members(name)?)))
    }

    fn extract_object_members(&self, name: &str) -> Result<HashMap<String, Value>> {
        let declaration = Regex::new(&format!(r"(?:^|[^a-zA-Z0-9_$.]){}\s*=\s*\{{", regex::escape(name)))?;

        for found in declaration.find_iter(self.source()) {
            let brace = found.end() - 1;
            let Ok((body, _)) = separate_at_paren(&self.source()[brace..], None) else {
                continue;
            };
            if let Some(members) = self.compile_members(body)? {
                debug!("Found object {} with {} members", name, members.len());
                return Ok(members);
            }
        }

        Err(JsError::syntax(&format!("Could not find object {}", name), name))
    }

    /// Compile `key: function(args){...}` fields; `None` if any field is not a function
    fn compile_members(&self, body: &str) -> Result<Option<HashMap<String, Value>>> {
        let member = Regex::new(r"^\s*function\s*\((?P<args>[^)]*)\)\s*\{")?;
        let mut members = HashMap::new();

        for field in separate(body, ",", None) {
            if field.trim().is_empty() {
                continue;
            }
            let mut parts = separate(field, ":", Some(1));
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                return Ok(None);
            };
            let key = key.trim().trim_matches(&['"', '\''][..]).to_string();

            let Some(captures) = member.captures(value) else {
                return Ok(None);
            };
            let params = split_params(captures.name("args").map_or("", |m| m.as_str()));
            let brace = captures.get(0).map_or(0, |m| m.end() - 1);
            let (code, _) = separate_at_paren(&value[brace..], None)?;

            let func = self.compile(key.clone(), params, code, vec![self.globals().clone()])?;
            members.insert(key, Value::Function(func));
        }

        Ok(Some(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_declaration_shapes() {
        let interp = Interpreter::new("function a(x){return x} ;b=function(y, z){return y}; var c = function(){return {k:1}}");
        let (params, body) = interp.extract_function_code("a").unwrap();
        assert_eq!(params, vec!["x".to_string()]);
        assert_eq!(body, "return x");

        let (params, _) = interp.extract_function_code("b").unwrap();
        assert_eq!(params, vec!["y".to_string(), "z".to_string()]);

        let (params, body) = interp.extract_function_code("c").unwrap();
        assert!(params.is_empty());
        assert_eq!(body, "return {k:1}");
    }

    #[test]
    fn test_body_braces_inside_strings() {
        let interp = Interpreter::new(r#"function f(){return "}{" + '}'}"#);
        let (_, body) = interp.extract_function_code("f").unwrap();
        assert_eq!(body, r#"return "}{" + '}'"#);
    }

    #[test]
    fn test_missing_function() {
        let interp = Interpreter::new("function a(){}");
        let err = interp.extract_function_code("zz").unwrap_err();
        assert!(err.is_syntax_error());
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn test_name_is_matched_literally() {
        let interp = Interpreter::new("var a$b=function(q){return q}");
        let (params, _) = interp.extract_function_code("a$b").unwrap();
        assert_eq!(params, vec!["q".to_string()]);
    }

    #[test]
    fn test_function_cache() {
        let interp = Interpreter::new("function f(){return 1}");
        let first = interp.extract_function("f").unwrap();
        let second = interp.extract_function("f").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_extract_object_members() {
        let interp = Interpreter::new(r#"var Xy={ab:function(a,b){a.splice(0,b)},"cd":function(a){a.reverse()}};"#);
        let table = interp.extract_object("Xy").unwrap();
        let table = table.borrow();
        assert_eq!(table.len(), 2);
        assert!(table.get("ab").and_then(Value::as_function).is_some());
        assert!(table.get("cd").and_then(Value::as_function).is_some());
    }

    #[test]
    fn test_object_with_plain_members_is_skipped() {
        let interp = Interpreter::new("var O={a:1}; O2={a:function(){}}");
        assert!(interp.extract_object("O").is_err());
        assert!(interp.extract_object("O2").is_ok());
    }
}
