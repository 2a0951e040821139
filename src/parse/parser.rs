//! Recursive-descent parser over token slices
//!
//! Source is tokenized once and bracket pairs are matched up front, so every
//! "split at top level" step is a scan that hops over bracketed groups.
//! Expressions are decomposed in a fixed order: comma, assignment,
//! conditional, binary operators in [`BinaryOp::SCAN_ORDER`] (splitting at
//! the last top-level occurrence), prefix and postfix operators, then a
//! primary followed by member/index/call suffixes.

use crate::core::function::SyntheticNames;
use crate::core::value::number_to_string;
use crate::error::JsError;
use crate::parse::ast::{
    BinaryOp, CatchClause, Expr, FunctionDef, Literal, Property, Stmt, SwitchCase, UnaryOp, UpdateOp, VarDecl,
};
use crate::parse::lexer::{tokenize, Token, TokenKind};
use crate::utils::splitter::matching_paren;
use crate::Result;
use std::rc::Rc;

const NO_PARTNER: usize = usize::MAX;

/// Words that start a statement and therefore never name a value
const STATEMENT_KEYWORDS: &[&str] = &[
    "var", "let", "const", "return", "throw", "break", "continue", "if", "else", "for", "while", "do",
    "switch", "case", "default", "try", "catch", "finally", "class",
];

/// Parse source text as a list of statements
///
/// Function literals in the text receive synthetic names from `names`.
pub fn parse_statements(src: &str, names: &SyntheticNames, max_depth: usize) -> Result<Vec<Stmt>> {
    let mut parser = Parser::new(src, names, max_depth)?;
    let len = parser.tokens.len();
    parser.statements(0, len)
}

pub struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    partners: Vec<usize>,
    names: &'a SyntheticNames,
    depth: usize,
    max_depth: usize,
}

fn match_brackets(src: &str, tokens: &[Token]) -> Result<Vec<usize>> {
    let mut partners = vec![NO_PARTNER; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token.punct() {
            Some("(" | "[" | "{") => stack.push(idx),
            Some(close @ (")" | "]" | "}")) => {
                let open_idx = stack
                    .pop()
                    .ok_or_else(|| JsError::syntax(&format!("Unexpected {}", close), &src[token.start..]))?;
                let expected = tokens[open_idx]
                    .punct()
                    .and_then(|open| open.chars().next())
                    .and_then(matching_paren);
                if expected != close.chars().next() {
                    return Err(JsError::syntax(
                        &format!("Mismatched {}", close),
                        &src[tokens[open_idx].start..token.end],
                    ));
                }
                partners[open_idx] = idx;
                partners[idx] = open_idx;
            }
            _ => {}
        }
    }

    if let Some(open_idx) = stack.pop() {
        let close = tokens[open_idx]
            .punct()
            .and_then(|open| open.chars().next())
            .and_then(matching_paren)
            .unwrap_or(')');
        return Err(JsError::syntax(
            &format!("No terminating paren {}", close),
            &src[tokens[open_idx].start..],
        ));
    }
    Ok(partners)
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, names: &'a SyntheticNames, max_depth: usize) -> Result<Self> {
        let tokens = tokenize(src)?;
        let partners = match_brackets(src, &tokens)?;
        Ok(Self {
            src,
            tokens,
            partners,
            names,
            depth: 0,
            max_depth,
        })
    }

    // ----- token helpers -----

    fn text(&self, lo: usize, hi: usize) -> &'a str {
        if lo >= hi || hi > self.tokens.len() {
            return "";
        }
        &self.src[self.tokens[lo].start..self.tokens[hi - 1].end]
    }

    fn punct_at(&self, idx: usize, punct: &str) -> bool {
        self.tokens.get(idx).is_some_and(|t| t.is_punct(punct))
    }

    fn keyword_at(&self, idx: usize, word: &str) -> bool {
        self.tokens.get(idx).is_some_and(|t| t.is_ident(word))
    }

    fn close_of(&self, idx: usize, hi: usize) -> Result<usize> {
        let close = self.partners[idx];
        if close == NO_PARTNER || close >= hi {
            return Err(JsError::syntax("No terminating paren", self.text(idx, hi)));
        }
        Ok(close)
    }

    /// Require an opening bracket at `idx` and return the index of its partner
    fn expect_open(&self, idx: usize, hi: usize, punct: &str) -> Result<usize> {
        if idx >= hi || !self.punct_at(idx, punct) {
            return Err(JsError::syntax(&format!("Expected {}", punct), self.text(idx, hi)));
        }
        self.close_of(idx, hi)
    }

    fn next_top_level(&self, idx: usize) -> usize {
        match self.partners[idx] {
            close if close != NO_PARTNER && close > idx => close + 1,
            _ => idx + 1,
        }
    }

    fn find_top_level<F: Fn(&Token) -> bool>(&self, lo: usize, hi: usize, pred: F) -> Option<usize> {
        let mut idx = lo;
        while idx < hi {
            if pred(&self.tokens[idx]) {
                return Some(idx);
            }
            idx = self.next_top_level(idx);
        }
        None
    }

    fn top_level<F: Fn(&Token) -> bool>(&self, lo: usize, hi: usize, pred: F) -> Vec<usize> {
        let mut found = Vec::new();
        let mut idx = lo;
        while idx < hi {
            if pred(&self.tokens[idx]) {
                found.push(idx);
            }
            idx = self.next_top_level(idx);
        }
        found
    }

    fn split_top_level(&self, lo: usize, hi: usize, punct: &str) -> Vec<(usize, usize)> {
        let mut pieces = Vec::new();
        let mut start = lo;
        for idx in self.top_level(lo, hi, |t| t.is_punct(punct)) {
            pieces.push((start, idx));
            start = idx + 1;
        }
        pieces.push((start, hi));
        pieces
    }

    /// Comma-separated list where a trailing comma is allowed
    fn list_items(&self, lo: usize, hi: usize) -> Vec<(usize, usize)> {
        if lo >= hi {
            return Vec::new();
        }
        let mut pieces = self.split_top_level(lo, hi, ",");
        if pieces.len() > 1 && pieces.last().is_some_and(|(a, b)| a == b) {
            pieces.pop();
        }
        pieces
    }

    fn statement_end(&self, lo: usize, hi: usize) -> usize {
        self.find_top_level(lo, hi, |t| t.is_punct(";")).unwrap_or(hi)
    }

    /// Whether the token at `idx` can end an operand, making a following
    /// `+`/`-` binary rather than unary
    fn ends_operand(&self, idx: usize) -> bool {
        match &self.tokens[idx].kind {
            TokenKind::Number(_) | TokenKind::Str(_) => true,
            TokenKind::Ident(name) => !matches!(
                name.as_str(),
                "return" | "typeof" | "void" | "new" | "delete" | "in" | "instanceof" | "case" | "throw" | "else"
            ),
            TokenKind::Punct(p) => matches!(*p, ")" | "]" | "}" | "++" | "--"),
        }
    }

    fn enter(&mut self, lo: usize, hi: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(JsError::syntax("Nesting too deep", self.text(lo, hi)));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ----- statements -----

    fn statements(&mut self, lo: usize, hi: usize) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        let mut pos = lo;
        while pos < hi {
            if self.punct_at(pos, ";") {
                pos += 1;
                continue;
            }
            let (stmt, next) = self.statement(pos, hi)?;
            stmts.push(stmt);
            pos = next;
        }
        Ok(stmts)
    }

    fn statement(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        if pos >= hi {
            return Err(JsError::syntax("Expected statement", self.text(pos.saturating_sub(1), hi)));
        }
        self.enter(pos, hi)?;
        let parsed = self.statement_inner(pos, hi);
        self.leave();
        parsed
    }

    fn statement_inner(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let first = self.tokens[pos].clone();

        if first.is_punct(";") {
            return Ok((Stmt::Empty, pos + 1));
        }

        if first.is_punct("{") {
            let close = self.close_of(pos, hi)?;
            // `{...}.key`, `{key: ...}` and a lone `{}` are object literals used as values
            let member_follows = close + 1 < hi
                && (self.punct_at(close + 1, ".") || self.punct_at(close + 1, "?.") || self.punct_at(close + 1, "["));
            let keyed = pos + 2 < close
                && matches!(
                    self.tokens[pos + 1].kind,
                    TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Number(_)
                )
                && self.punct_at(pos + 2, ":");
            let lone_empty = close == pos + 1 && close + 1 == hi;
            if !(member_follows || keyed || lone_empty) {
                return Ok((Stmt::Block(self.statements(pos + 1, close)?), close + 1));
            }
        }

        if let Some(word) = first.ident() {
            match word {
                "var" | "let" | "const" => {
                    let end = self.statement_end(pos + 1, hi);
                    return Ok((Stmt::Var(self.var_decls(pos + 1, end)?), end));
                }
                "return" => {
                    let end = self.statement_end(pos + 1, hi);
                    let value = if pos + 1 < end {
                        Some(self.expression(pos + 1, end)?)
                    } else {
                        None
                    };
                    return Ok((Stmt::Return(value), end));
                }
                "throw" => {
                    let end = self.statement_end(pos + 1, hi);
                    return Ok((Stmt::Throw(self.expression(pos + 1, end)?), end));
                }
                "break" | "continue" => {
                    let end = self.statement_end(pos + 1, hi);
                    if end != pos + 1 {
                        return Err(JsError::unsupported(self.text(pos, end)));
                    }
                    let stmt = if word == "break" { Stmt::Break } else { Stmt::Continue };
                    return Ok((stmt, end));
                }
                "if" => return self.if_statement(pos, hi),
                "for" => return self.for_statement(pos, hi),
                "switch" => return self.switch_statement(pos, hi),
                "try" => return self.try_statement(pos, hi),
                "function" if self.tokens.get(pos + 1).and_then(Token::ident).is_some() => {
                    return self.function_declaration(pos, hi);
                }
                "while" | "do" | "class" | "import" | "export" => {
                    let end = self.statement_end(pos, hi);
                    return Err(JsError::unsupported(self.text(pos, end)));
                }
                _ => {}
            }
        }

        let end = self.statement_end(pos, hi);
        Ok((Stmt::Expr(self.expression(pos, end)?), end))
    }

    fn var_decls(&mut self, lo: usize, hi: usize) -> Result<Vec<VarDecl>> {
        if lo >= hi {
            return Err(JsError::syntax("Expected variable name", self.text(lo.saturating_sub(1), hi)));
        }
        let mut decls = Vec::new();
        for (a, b) in self.split_top_level(lo, hi, ",") {
            let name = self
                .tokens
                .get(a)
                .filter(|_| a < b)
                .and_then(Token::ident)
                .map(str::to_string)
                .ok_or_else(|| JsError::syntax("Expected variable name", self.text(a, b)))?;
            let init = if b == a + 1 {
                None
            } else if self.punct_at(a + 1, "=") && b > a + 2 {
                Some(self.expression(a + 2, b)?)
            } else {
                return Err(JsError::syntax("Invalid variable declaration", self.text(a, b)));
            };
            decls.push(VarDecl { name, init });
        }
        Ok(decls)
    }

    fn if_statement(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let close = self.expect_open(pos + 1, hi, "(")?;
        let cond = self.expression(pos + 2, close)?;
        let (then, mut next) = self.statement(close + 1, hi)?;

        let mut look = next;
        if self.punct_at(look, ";") && look + 1 < hi && self.keyword_at(look + 1, "else") {
            look += 1;
        }
        let mut otherwise = None;
        if look < hi && self.keyword_at(look, "else") {
            let (stmt, after) = self.statement(look + 1, hi)?;
            otherwise = Some(Box::new(stmt));
            next = after;
        }

        Ok((
            Stmt::If {
                cond,
                then: Box::new(then),
                otherwise,
            },
            next,
        ))
    }

    fn for_statement(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let close = self.expect_open(pos + 1, hi, "(")?;
        let clauses = self.split_top_level(pos + 2, close, ";");
        if clauses.len() != 3 {
            return Err(JsError::unsupported(self.text(pos, close + 1)));
        }

        let (init_lo, init_hi) = clauses[0];
        let init = if init_lo < init_hi {
            let stmt = if self.keyword_at(init_lo, "var") || self.keyword_at(init_lo, "let") || self.keyword_at(init_lo, "const") {
                Stmt::Var(self.var_decls(init_lo + 1, init_hi)?)
            } else {
                Stmt::Expr(self.expression(init_lo, init_hi)?)
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        let cond = self.optional_expression(clauses[1])?;
        let update = self.optional_expression(clauses[2])?;

        // The body may be a bare `switch(...){...}` directly after the header
        let (body, next) = self.statement(close + 1, hi)?;
        Ok((
            Stmt::For {
                init,
                cond,
                update,
                body: Box::new(body),
            },
            next,
        ))
    }

    fn optional_expression(&mut self, (lo, hi): (usize, usize)) -> Result<Option<Expr>> {
        if lo >= hi {
            return Ok(None);
        }
        Ok(Some(self.expression(lo, hi)?))
    }

    fn switch_statement(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let close = self.expect_open(pos + 1, hi, "(")?;
        let selector = self.expression(pos + 2, close)?;
        let body_close = self.expect_open(close + 1, hi, "{")?;
        let (lo, end) = (close + 2, body_close);

        let mut markers = self.top_level(lo, end, |t| t.is_ident("case") || t.is_ident("default"));
        markers.retain(|&idx| idx == lo || !(self.punct_at(idx - 1, ".") || self.punct_at(idx - 1, "?.")));
        if lo < end && markers.first() != Some(&lo) {
            return Err(JsError::syntax("Expected case", self.text(lo, end)));
        }

        let mut cases = Vec::with_capacity(markers.len());
        for (n, &marker) in markers.iter().enumerate() {
            let clause_end = markers.get(n + 1).copied().unwrap_or(end);
            let colon = self
                .find_top_level(marker + 1, clause_end, |t| t.is_punct(":"))
                .ok_or_else(|| JsError::syntax("Expected : after case", self.text(marker, clause_end)))?;
            let label = if self.keyword_at(marker, "default") {
                if colon != marker + 1 {
                    return Err(JsError::syntax("Invalid default clause", self.text(marker, clause_end)));
                }
                None
            } else {
                Some(self.expression(marker + 1, colon)?)
            };
            let body = self.statements(colon + 1, clause_end)?;
            cases.push(SwitchCase { label, body });
        }

        Ok((Stmt::Switch { selector, cases }, body_close + 1))
    }

    fn try_statement(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let close = self.expect_open(pos + 1, hi, "{")?;
        let body = self.statements(pos + 2, close)?;
        let mut next = close + 1;

        // The catch body is skipped, never parsed
        let mut catch = None;
        if next < hi && self.keyword_at(next, "catch") {
            let mut block = next + 1;
            let mut param = None;
            if self.punct_at(block, "(") {
                let paren_close = self.close_of(block, hi)?;
                if paren_close == block + 2 {
                    param = self.tokens[block + 1].ident().map(str::to_string);
                }
                block = paren_close + 1;
            }
            let block_close = self.expect_open(block, hi, "{")?;
            catch = Some(CatchClause { param });
            next = block_close + 1;
        }

        let mut finally = None;
        if next < hi && self.keyword_at(next, "finally") {
            let block_close = self.expect_open(next + 1, hi, "{")?;
            finally = Some(self.statements(next + 2, block_close)?);
            next = block_close + 1;
        }

        Ok((Stmt::Try { body, catch, finally }, next))
    }

    fn function_declaration(&mut self, pos: usize, hi: usize) -> Result<(Stmt, usize)> {
        let (def, next) = self.function_literal(pos, hi)?;
        let decl = VarDecl {
            name: def.name.clone(),
            init: Some(Expr::Function(def)),
        };
        Ok((Stmt::Var(vec![decl]), next))
    }

    fn function_literal(&mut self, pos: usize, hi: usize) -> Result<(Rc<FunctionDef>, usize)> {
        let mut cursor = pos + 1;
        let name = match self.tokens.get(cursor).filter(|_| cursor < hi).and_then(Token::ident) {
            Some(name) => {
                let name = name.to_string();
                cursor += 1;
                name
            }
            None => self.names.mint(),
        };

        let params_close = self.expect_open(cursor, hi, "(")?;
        let params = self.params(cursor + 1, params_close)?;
        let body_close = self.expect_open(params_close + 1, hi, "{")?;
        let body = self.statements(params_close + 2, body_close)?;

        Ok((Rc::new(FunctionDef { name, params, body }), body_close + 1))
    }

    fn params(&self, lo: usize, hi: usize) -> Result<Vec<String>> {
        self.list_items(lo, hi)
            .into_iter()
            .map(|(a, b)| match self.tokens[a].ident() {
                Some(name) if b == a + 1 => Ok(name.to_string()),
                _ => Err(JsError::unsupported(self.text(a, b))),
            })
            .collect()
    }

    // ----- expressions -----

    fn expression(&mut self, lo: usize, hi: usize) -> Result<Expr> {
        if lo >= hi {
            return Err(JsError::syntax("Expected expression", self.text(lo.saturating_sub(1), hi.max(lo))));
        }
        self.enter(lo, hi)?;
        let parsed = self.expression_inner(lo, hi);
        self.leave();
        parsed
    }

    fn expression_inner(&mut self, lo: usize, hi: usize) -> Result<Expr> {
        // Comma operator: every piece is evaluated, the last one is the value
        let pieces = self.split_top_level(lo, hi, ",");
        if pieces.len() > 1 {
            let exprs = pieces
                .into_iter()
                .map(|(a, b)| self.expression(a, b))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Expr::Sequence(exprs));
        }

        if let Some(op_idx) = self.find_top_level(lo, hi, |t| {
            t.punct().is_some_and(|p| BinaryOp::from_assign_token(p).is_some())
        }) {
            return self.assignment(lo, op_idx, hi);
        }

        if let Some(question) = self.find_top_level(lo, hi, |t| t.is_punct("?")) {
            return self.conditional(lo, question, hi);
        }

        for op in BinaryOp::SCAN_ORDER {
            let token = op.token();
            let split = self
                .top_level(lo, hi, |t| t.is_punct(token))
                .into_iter()
                .rev()
                .find(|&idx| idx > lo && self.ends_operand(idx - 1));
            if let Some(idx) = split {
                let left = self.expression(lo, idx)?;
                let right = self.expression(idx + 1, hi)?;
                return Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
        }

        let first = self.tokens[lo].clone();
        let unary = match (&first.kind, first.ident()) {
            (TokenKind::Punct("-"), _) => Some(UnaryOp::Neg),
            (TokenKind::Punct("+"), _) => Some(UnaryOp::Plus),
            (TokenKind::Punct("!"), _) => Some(UnaryOp::Not),
            (_, Some("void")) => Some(UnaryOp::Void),
            _ => None,
        };
        if let Some(op) = unary {
            let operand = self.expression(lo + 1, hi)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        if first.is_punct("++") || first.is_punct("--") {
            return match self.tokens[lo + 1..hi].first().and_then(Token::ident) {
                Some(name) if hi == lo + 2 => Ok(Expr::Update {
                    op: update_op(&first),
                    prefix: true,
                    name: name.to_string(),
                }),
                _ => Err(JsError::unsupported(self.text(lo, hi))),
            };
        }

        if hi == lo + 2 && (self.punct_at(lo + 1, "++") || self.punct_at(lo + 1, "--")) {
            return match first.ident() {
                Some(name) if !STATEMENT_KEYWORDS.contains(&name) => Ok(Expr::Update {
                    op: update_op(&self.tokens[lo + 1]),
                    prefix: false,
                    name: name.to_string(),
                }),
                _ => Err(JsError::unsupported(self.text(lo, hi))),
            };
        }

        self.postfix(lo, hi)
    }

    fn assignment(&mut self, lo: usize, op_idx: usize, hi: usize) -> Result<Expr> {
        let op = self.tokens[op_idx]
            .punct()
            .and_then(BinaryOp::from_assign_token)
            .unwrap_or(None);
        let name = self
            .tokens
            .get(lo)
            .filter(|_| lo < op_idx)
            .and_then(Token::ident)
            .filter(|name| !STATEMENT_KEYWORDS.contains(name))
            .map(str::to_string)
            .ok_or_else(|| JsError::syntax("Invalid assignment target", self.text(lo, hi)))?;

        let index = if op_idx == lo + 1 {
            None
        } else if self.punct_at(lo + 1, "[") && self.partners[lo + 1] == op_idx - 1 && op_idx > lo + 3 {
            Some(Box::new(self.expression(lo + 2, op_idx - 1)?))
        } else {
            return Err(JsError::syntax("Invalid assignment target", self.text(lo, hi)));
        };

        let value = self.expression(op_idx + 1, hi)?;
        Ok(Expr::Assign {
            name,
            index,
            op,
            value: Box::new(value),
        })
    }

    fn conditional(&mut self, lo: usize, question: usize, hi: usize) -> Result<Expr> {
        let mut nested = 0usize;
        let mut colon = None;
        for idx in self.top_level(question + 1, hi, |t| t.is_punct("?") || t.is_punct(":")) {
            if self.punct_at(idx, "?") {
                nested += 1;
            } else if nested == 0 {
                colon = Some(idx);
                break;
            } else {
                nested -= 1;
            }
        }
        let colon = colon.ok_or_else(|| JsError::syntax("Expected : in conditional", self.text(lo, hi)))?;

        let test = self.expression(lo, question)?;
        let consequent = self.expression(question + 1, colon)?;
        let alternate = self.expression(colon + 1, hi)?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn postfix(&mut self, lo: usize, hi: usize) -> Result<Expr> {
        let (mut expr, mut pos) = self.primary(lo, hi)?;

        while pos < hi {
            let token = self.tokens[pos].clone();
            match token.punct() {
                Some(dot @ ("." | "?.")) => {
                    let optional = dot == "?.";
                    if optional && self.punct_at(pos + 1, "[") {
                        let close = self.close_of(pos + 1, hi)?;
                        let key = self.expression(pos + 2, close)?;
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property: Property::Computed(Box::new(key)),
                            optional,
                        };
                        pos = close + 1;
                        continue;
                    }
                    let name = self
                        .tokens
                        .get(pos + 1)
                        .filter(|_| pos + 1 < hi)
                        .and_then(Token::ident)
                        .map(str::to_string)
                        .ok_or_else(|| JsError::unsupported(self.text(lo, hi)))?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Property::Name(name),
                        optional,
                    };
                    pos += 2;
                }
                Some("[") => {
                    let close = self.close_of(pos, hi)?;
                    let key = self.expression(pos + 1, close)?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Property::Computed(Box::new(key)),
                        optional: false,
                    };
                    pos = close + 1;
                }
                Some("(") => {
                    let close = self.close_of(pos, hi)?;
                    let args = self.arguments(pos + 1, close)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                    pos = close + 1;
                }
                _ => return Err(JsError::unsupported(self.text(lo, hi))),
            }
        }

        Ok(expr)
    }

    fn arguments(&mut self, lo: usize, hi: usize) -> Result<Vec<Expr>> {
        self.list_items(lo, hi)
            .into_iter()
            .map(|(a, b)| self.expression(a, b))
            .collect()
    }

    fn primary(&mut self, lo: usize, hi: usize) -> Result<(Expr, usize)> {
        let token = self.tokens[lo].clone();
        let literal = |lit: Literal| -> Result<(Expr, usize)> { Ok((Expr::Literal(lit), lo + 1)) };

        match &token.kind {
            TokenKind::Number(n) => literal(Literal::Number(*n)),
            TokenKind::Str(s) => literal(Literal::String(s.clone())),
            TokenKind::Ident(name) => match name.as_str() {
                "function" => {
                    let (def, next) = self.function_literal(lo, hi)?;
                    Ok((Expr::Function(def), next))
                }
                "true" => literal(Literal::Bool(true)),
                "false" => literal(Literal::Bool(false)),
                "null" => literal(Literal::Null),
                "undefined" => literal(Literal::Undefined),
                "NaN" => literal(Literal::Number(f64::NAN)),
                "Infinity" => literal(Literal::Number(f64::INFINITY)),
                "typeof" | "new" | "delete" | "in" | "instanceof" => Err(JsError::unsupported(self.text(lo, hi))),
                word if STATEMENT_KEYWORDS.contains(&word) => Err(JsError::unsupported(self.text(lo, hi))),
                _ => Ok((Expr::Ident(name.clone()), lo + 1)),
            },
            TokenKind::Punct("(") => {
                let close = self.close_of(lo, hi)?;
                let inner = self.expression(lo + 1, close)?;
                Ok((inner, close + 1))
            }
            TokenKind::Punct("[") => {
                let close = self.close_of(lo, hi)?;
                let mut elements = Vec::new();
                for (a, b) in self.list_items(lo + 1, close) {
                    // Holes like `[1,,2]` read as undefined
                    elements.push(if a == b {
                        Expr::Literal(Literal::Undefined)
                    } else {
                        self.expression(a, b)?
                    });
                }
                Ok((Expr::Array(elements), close + 1))
            }
            TokenKind::Punct("{") => {
                let close = self.close_of(lo, hi)?;
                let members = self.object_members(lo + 1, close)?;
                Ok((Expr::Object(members), close + 1))
            }
            _ => Err(JsError::unsupported(self.text(lo, hi))),
        }
    }

    fn object_members(&mut self, lo: usize, hi: usize) -> Result<Vec<(String, Expr)>> {
        let mut members = Vec::new();
        for (a, b) in self.list_items(lo, hi) {
            let key = match self.tokens.get(a).filter(|_| a < b).map(|t| &t.kind) {
                Some(TokenKind::Ident(name)) => name.clone(),
                Some(TokenKind::Str(s)) => s.clone(),
                Some(TokenKind::Number(n)) => number_to_string(*n),
                _ => return Err(JsError::unsupported(self.text(a, b))),
            };
            if !self.punct_at(a + 1, ":") || b <= a + 2 {
                return Err(JsError::unsupported(self.text(a, b)));
            }
            let value = self.expression(a + 2, b)?;
            members.push((key, value));
        }
        Ok(members)
    }
}

fn update_op(token: &Token) -> UpdateOp {
    if token.is_punct("++") {
        UpdateOp::Increment
    } else {
        UpdateOp::Decrement
    }
}
