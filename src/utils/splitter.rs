//! Nesting-aware splitting of raw JavaScript source text
//!
//! Splits happen only where every bracket counter is zero and the scanner is
//! outside a quoted string.

use crate::error::JsError;

const OPENERS: [char; 3] = ['(', '{', '['];
const CLOSERS: [char; 3] = [')', '}', ']'];
const QUOTES: [char; 2] = ['"', '\''];

/// Matching close bracket for an opening bracket
pub fn matching_paren(open: char) -> Option<char> {
    OPENERS
        .iter()
        .position(|&c| c == open)
        .map(|idx| CLOSERS[idx])
}

/// Iterator over the top-level pieces of a code string
pub struct Separate<'a, 'd> {
    code: &'a str,
    delim: &'d str,
    max_split: Option<usize>,
    start: usize,
    cursor: usize,
    splits: usize,
    counters: [usize; 3],
    in_quote: Option<char>,
    escaping: bool,
    finished: bool,
}

impl<'a> Separate<'a, '_> {
    fn is_top_level(&self) -> bool {
        self.in_quote.is_none() && self.counters.iter().all(|&c| c == 0)
    }

    fn finish(&mut self) -> Option<&'a str> {
        self.finished = true;
        Some(&self.code[self.start..])
    }
}

impl<'a> Iterator for Separate<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.finished {
            return None;
        }
        if self.max_split.is_some_and(|max| self.splits >= max) {
            return self.finish();
        }

        while let Some(ch) = self.code[self.cursor..].chars().next() {
            let idx = self.cursor;
            self.cursor += ch.len_utf8();

            if self.in_quote.is_none() && OPENERS.contains(&ch) {
                let slot = OPENERS.iter().position(|&c| c == ch).unwrap_or(0);
                self.counters[slot] += 1;
            } else if self.in_quote.is_none() && CLOSERS.contains(&ch) {
                let slot = CLOSERS.iter().position(|&c| c == ch).unwrap_or(0);
                // Stray closers are ignored rather than going negative
                self.counters[slot] = self.counters[slot].saturating_sub(1);
            } else if !self.escaping && QUOTES.contains(&ch) {
                match self.in_quote {
                    None => self.in_quote = Some(ch),
                    Some(open) if open == ch => self.in_quote = None,
                    Some(_) => {}
                }
            }
            self.escaping = !self.escaping && self.in_quote.is_some() && ch == '\\';

            if self.is_top_level() && self.code[idx..].starts_with(self.delim) {
                let piece = &self.code[self.start..idx];
                self.start = idx + self.delim.len();
                self.cursor = self.cursor.max(self.start);
                self.splits += 1;
                return Some(piece);
            }
        }

        self.finish()
    }
}

/// Split `code` at top-level occurrences of `delim`
///
/// At most `max_split` delimiters are honoured; the remainder is yielded as a
/// final piece. Empty input yields nothing.
pub fn separate<'a, 'd>(code: &'a str, delim: &'d str, max_split: Option<usize>) -> Separate<'a, 'd> {
    Separate {
        code,
        delim,
        max_split,
        start: 0,
        cursor: 0,
        splits: 0,
        counters: [0; 3],
        in_quote: None,
        escaping: false,
        finished: code.is_empty() || delim.is_empty(),
    }
}

/// Split a code string that starts with an opening bracket at its matching close
///
/// Returns the bracket contents and whatever trails the close, both trimmed.
/// When `delim` is `None` the closer is derived from the first character.
pub fn separate_at_paren<'a>(code: &'a str, delim: Option<&str>) -> Result<(&'a str, &'a str), JsError> {
    let first = code
        .chars()
        .next()
        .ok_or_else(|| JsError::syntax("Expected an opening bracket", code))?;

    let derived;
    let delim = match delim {
        Some(delim) => delim,
        None => {
            let close = matching_paren(first)
                .ok_or_else(|| JsError::syntax(&format!("Unexpected {}", first), code))?;
            derived = close.to_string();
            derived.as_str()
        }
    };

    let mut pieces = separate(code, delim, Some(1));
    let inner = pieces.next().unwrap_or("");
    let outer = pieces
        .next()
        .ok_or_else(|| JsError::syntax(&format!("No terminating paren {}", delim), code))?;

    Ok((inner[first.len_utf8()..].trim(), outer.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(code: &str, delim: &str, max_split: Option<usize>) -> Vec<String> {
        separate(code, delim, max_split).map(str::to_string).collect()
    }

    #[test]
    fn test_separate_commas() {
        assert_eq!(pieces("a,b,c", ",", None), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_separate_respects_nesting() {
        assert_eq!(
            pieces("f(a,b),[1,2],{x:1,y:2},c", ",", None),
            vec!["f(a,b)", "[1,2]", "{x:1,y:2}", "c"]
        );
    }

    #[test]
    fn test_separate_respects_quotes() {
        assert_eq!(pieces(r#""a,b",'c;d',e"#, ",", None), vec![r#""a,b""#, "'c;d'", "e"]);
        assert_eq!(pieces(r#""a\",b",c"#, ",", None), vec![r#""a\",b""#, "c"]);
        assert_eq!(pieces(r#"'it"s',x"#, ",", None), vec![r#"'it"s'"#, "x"]);
    }

    #[test]
    fn test_separate_max_split() {
        assert_eq!(pieces("a:b:c", ":", Some(1)), vec!["a", "b:c"]);
        assert_eq!(pieces("a;b;c;d", ";", Some(2)), vec!["a", "b", "c;d"]);
    }

    #[test]
    fn test_separate_multichar_delimiter() {
        assert_eq!(pieces("a>>b>>c", ">>", None), vec!["a", "b", "c"]);
        assert_eq!(pieces("case 1:x;case 2:y", "case ", None), vec!["", "1:x;", "2:y"]);
    }

    #[test]
    fn test_separate_empty_input() {
        assert!(pieces("", ",", None).is_empty());
    }

    #[test]
    fn test_separate_reconstructs_input() {
        let inputs = [
            ("var a=[1,2];b(a,'x,y');c=d;", ";"),
            ("f(g(h(1),2),3),{a:[b,c]},\"q,\\\"r\"", ","),
            ("a||b||(c||d)", "||"),
            ("x", ","),
            (",,", ","),
        ];
        for (code, delim) in inputs {
            let joined = pieces(code, delim, None).join(delim);
            assert_eq!(joined, code);
            let joined = pieces(code, delim, Some(1)).join(delim);
            assert_eq!(joined, code);
        }
    }

    #[test]
    fn test_separate_at_paren() {
        assert_eq!(separate_at_paren("(a,b) + c", None).unwrap(), ("a,b", "+ c"));
        assert_eq!(separate_at_paren("{x{y}z}rest", None).unwrap(), ("x{y}z", "rest"));
        assert_eq!(separate_at_paren("[\"]\"]", None).unwrap(), ("\"]\"", ""));
    }

    #[test]
    fn test_separate_at_paren_explicit_delimiter() {
        assert_eq!(separate_at_paren("{a}b}c", Some("}")).unwrap(), ("a", "b}c"));
    }

    #[test]
    fn test_separate_at_paren_unbalanced() {
        let err = separate_at_paren("(a,b", None).unwrap_err();
        assert!(err.is_syntax_error());
        assert!(err.to_string().contains("No terminating paren )"));
        assert!(separate_at_paren("abc", None).is_err());
        assert!(separate_at_paren("", None).is_err());
    }
}
