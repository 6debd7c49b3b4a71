//! Recursive-descent JavaScript parser that validates a program and records
//! the source edits needed to lower it
//!
//! The parser never builds a tree. Every construct that needs rewriting
//! (JSX, `**`, object spread, optional chains, `??`, logical assignment,
//! numeric separators, optional catch bindings) replaces its own source
//! range with an [`Edit`]; everything else is copied through verbatim,
//! which keeps comments and formatting intact.
//!
//! Lowerings that must evaluate an operand once store it in a `var`
//! temporary declared at the end of the enclosing function body.

use std::collections::HashSet;

use crate::emit::{render, Edit};
use crate::error::{ErrorKind, TransformError, TransformResult};
use crate::lexer::{is_identifier_name, Scanner, Tok, Token};
use crate::{Dialect, TransformOptions};

/// Maximum syntactic nesting before the parser gives up
pub(crate) const MAX_DEPTH: usize = 256;

/// Coarse shape of a parsed expression, enough to validate assignment
/// targets, the `**` operand rules and `??` mixing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprKind {
    Identifier,
    Member,
    Call,
    ObjectLiteral,
    ArrayLiteral,
    Parenthesized,
    Unary,
    OptionalChain,
    /// `a || b` or `a && b`
    Logical,
    /// `a ?? b`
    Nullish,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ExprInfo {
    pub start: usize,
    pub end: usize,
    pub kind: ExprKind,
    /// Offset of a `{ a = 1 }` shorthand initializer that is only legal if
    /// this expression turns out to be a destructuring target
    pub cover_init: Option<usize>,
}

impl ExprInfo {
    pub(crate) fn new(start: usize, end: usize, kind: ExprKind) -> Self {
        Self {
            start,
            end,
            kind,
            cover_init: None,
        }
    }

    pub(crate) fn other(start: usize, end: usize) -> Self {
        Self::new(start, end, ExprKind::Other)
    }

    fn is_simple_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier | ExprKind::Member | ExprKind::Parenthesized
        )
    }
}

/// Per-function context for `return`, `await`, `yield` and jump targets
#[derive(Debug, Clone, Default)]
struct FunctionScope<'a> {
    in_function: bool,
    is_async: bool,
    is_generator: bool,
    loop_depth: u32,
    switch_depth: u32,
    labels: Vec<&'a str>,
    /// Temporaries to declare at the end of this function body
    temps: Vec<String>,
}

impl<'a> FunctionScope<'a> {
    fn function(is_async: bool, is_generator: bool) -> Self {
        Self {
            in_function: true,
            is_async,
            is_generator,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    tok: Tok,
    prev_end: usize,
    edits: usize,
    temps: usize,
}

struct ObjectPart {
    start: usize,
    end: usize,
    spread: bool,
}

/// One `.x`, `[x]`, `(...)` or template step of a member/call chain
#[derive(Debug, Clone, Copy)]
struct ChainLink {
    /// Offset of the opening token (`?.` for optional links)
    start: usize,
    end: usize,
    /// Where the text kept in the lowered chain begins
    text_start: usize,
    optional: bool,
    call: bool,
    /// `?.x` keeps `x` and needs its dot back
    needs_dot: bool,
}

/// Where the object of the last parsed member expression ends
#[derive(Debug, Clone, Copy)]
struct MemberSplit {
    start: usize,
    object_end: usize,
    end: usize,
    computed: bool,
}

/// Bound parameter names with their offsets
type ParamNames<'a> = Vec<(&'a str, usize)>;

pub(crate) struct Parser<'a> {
    pub(crate) src: &'a str,
    pub(crate) scanner: Scanner<'a>,
    pub(crate) options: &'a TransformOptions,
    pub(crate) tok: Tok,
    pub(crate) prev_end: usize,
    pub(crate) edits: Vec<Edit>,
    scope: FunctionScope<'a>,
    no_in: bool,
    depth: usize,
    failed_arrows: HashSet<usize>,
    lower_spread: bool,
    /// Names bound by the parameter list being parsed
    params: Option<ParamNames<'a>>,
    /// Offset of the `delete` keyword whose operand is being parsed
    deleting: Option<usize>,
    last_member: Option<MemberSplit>,
    /// End of the last statement terminated by automatic semicolon insertion
    asi_end: Option<usize>,
    temp_prefix: String,
    temp_count: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str, options: &'a TransformOptions) -> Self {
        Self {
            src,
            scanner: Scanner::new(src),
            options,
            tok: Tok {
                kind: None,
                start: 0,
                end: 0,
                newline_before: false,
            },
            prev_end: 0,
            edits: Vec::new(),
            scope: FunctionScope::default(),
            no_in: false,
            depth: 0,
            failed_arrows: HashSet::new(),
            lower_spread: true,
            params: None,
            deleting: None,
            last_member: None,
            asi_end: None,
            temp_prefix: temp_prefix(src),
            temp_count: 0,
        }
    }

    /// Parse the whole program and return the lowered source
    pub(crate) fn parse(mut self) -> TransformResult<String> {
        let start = self.scanner.hashbang_end();
        if start > 0 {
            self.edits.push(Edit::replace(0..start, ""));
        }

        self.tok = self.scanner.next_token(start)?;
        while self.tok.kind.is_some() {
            self.parse_statement()?;
        }

        let temps = std::mem::take(&mut self.scope.temps);
        self.declare_temps(&temps, self.src.len());
        Ok(render(self.src, 0..self.src.len(), &self.edits))
    }

    // ---- token helpers ----

    pub(crate) fn text(&self, tok: Tok) -> &'a str {
        &self.src[tok.start..tok.end]
    }

    pub(crate) fn is(&self, kind: Token) -> bool {
        self.tok.kind == Some(kind)
    }

    fn is_word(&self, word: &str) -> bool {
        self.is(Token::Ident) && self.text(self.tok) == word
    }

    pub(crate) fn bump(&mut self) -> TransformResult<Tok> {
        let current = self.tok;
        self.prev_end = current.end;
        self.tok = self.scanner.next_token(current.end)?;
        Ok(current)
    }

    /// Resume lexing at `offset` after a hand-scanned construct
    pub(crate) fn resume_at(&mut self, offset: usize) -> TransformResult<()> {
        self.prev_end = offset;
        self.tok = self.scanner.next_token(offset)?;
        Ok(())
    }

    fn peek(&self) -> TransformResult<Tok> {
        self.scanner.next_token(self.tok.end)
    }

    fn eat(&mut self, kind: Token) -> TransformResult<bool> {
        if self.is(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn eat_word(&mut self, word: &str) -> TransformResult<bool> {
        if self.is_word(word) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: Token) -> TransformResult<Tok> {
        if self.is(kind) {
            self.bump()
        } else {
            Err(self.error_at(self.tok.start, ErrorKind::Expected(kind.describe())))
        }
    }

    pub(crate) fn error_at(&self, offset: usize, kind: ErrorKind) -> TransformError {
        TransformError::at(self.src, offset, kind)
    }

    fn unexpected(&self) -> TransformError {
        self.error_at(self.tok.start, ErrorKind::UnexpectedToken)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tok: self.tok,
            prev_end: self.prev_end,
            edits: self.edits.len(),
            temps: self.scope.temps.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.tok = checkpoint.tok;
        self.prev_end = checkpoint.prev_end;
        self.edits.truncate(checkpoint.edits);
        self.scope.temps.truncate(checkpoint.temps);
    }

    /// Whether the output runs as strict code
    fn strict(&self) -> bool {
        self.options.strict_prologue
    }

    /// A fresh temporary, declared in the current function
    fn temp(&mut self) -> String {
        self.temp_count += 1;
        let name = format!("{}{}", self.temp_prefix, self.temp_count);
        self.scope.temps.push(name.clone());
        name
    }

    fn declare_temps(&mut self, temps: &[String], at: usize) {
        if !temps.is_empty() {
            self.edits
                .push(Edit::insert(at, format!("\nvar {};\n", temps.join(", "))));
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`]
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> TransformResult<T>,
    ) -> TransformResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_at(self.tok.start, ErrorKind::TooDeeplyNested));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn with_in<T>(
        &mut self,
        allow_in: bool,
        f: impl FnOnce(&mut Self) -> TransformResult<T>,
    ) -> TransformResult<T> {
        let saved = std::mem::replace(&mut self.no_in, !allow_in);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn consume_semicolon(&mut self) -> TransformResult<()> {
        if self.eat(Token::Semi)? {
            return Ok(());
        }
        if self.is(Token::RBrace) || self.tok.kind.is_none() || self.tok.newline_before {
            self.asi_end = Some(self.prev_end);
            return Ok(());
        }
        Err(self.error_at(self.prev_end, ErrorKind::MissingSemicolon))
    }

    fn binding_identifier(&mut self) -> TransformResult<()> {
        if !self.is(Token::Ident) {
            return Err(self.unexpected());
        }
        self.check_binding_name(self.tok)?;
        let tok = self.bump()?;
        self.bind(tok);
        Ok(())
    }

    fn check_binding_name(&self, tok: Tok) -> TransformResult<()> {
        let word = self.text(tok);
        let keyword = is_reserved(word)
            || (word == "await" && self.scope.is_async)
            || (word == "yield" && self.scope.is_generator);
        if keyword {
            return Err(self.error_at(tok.start, ErrorKind::UnexpectedKeyword(word.to_string())));
        }
        if self.strict() {
            if is_strict_reserved(word) {
                return Err(self.error_at(tok.start, ErrorKind::StrictReservedWord(word.to_string())));
            }
            if matches!(word, "eval" | "arguments") {
                return Err(self.error_at(
                    tok.start,
                    ErrorKind::StrictEvalArgumentsBinding(word.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Record a bound name while a parameter list is being parsed
    fn bind(&mut self, tok: Tok) {
        let name = self.text(tok);
        if let Some(params) = self.params.as_mut() {
            params.push((name, tok.start));
        }
    }

    fn check_unique_params(&self, params: &[(&'a str, usize)]) -> TransformResult<()> {
        for (i, (name, offset)) in params.iter().enumerate() {
            if params[..i].iter().any(|(seen, _)| seen == name) {
                return Err(self.error_at(*offset, ErrorKind::DuplicateParameter(name.to_string())));
            }
        }
        Ok(())
    }

    /// `eval` and `arguments` cannot be assigned in strict code
    fn check_strict_target(&self, target: &ExprInfo) -> TransformResult<()> {
        if self.strict() && target.kind == ExprKind::Identifier {
            let name = &self.src[target.start..target.end];
            if matches!(name, "eval" | "arguments") {
                return Err(self.error_at(
                    target.start,
                    ErrorKind::StrictEvalArguments(name.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Consume a numeric or string literal
    fn parse_literal(&mut self) -> TransformResult<()> {
        let tok = self.bump()?;
        let text = self.text(tok);
        match tok.kind {
            Some(Token::Number) => {
                if self.strict() && is_legacy_octal(text) {
                    return Err(self.error_at(tok.start, ErrorKind::StrictOctal));
                }
                if text.contains('_') {
                    self.edits
                        .push(Edit::replace(tok.start..tok.end, text.replace('_', "")));
                }
            }
            Some(Token::String) if self.strict() => {
                if let Some(at) = octal_escape(text) {
                    return Err(self.error_at(tok.start + at, ErrorKind::StrictNumericEscape));
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> TransformResult<()> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> TransformResult<()> {
        match self.tok.kind {
            None => Err(self.unexpected()),
            Some(Token::LBrace) => self.parse_block(),
            Some(Token::Semi) => {
                self.bump()?;
                Ok(())
            }
            Some(Token::Ident) => {
                let word = self.text(self.tok);
                match word {
                    "var" => self.parse_variable_statement("var"),
                    "const" => self.parse_variable_statement("const"),
                    "let" if self.let_starts_declaration()? => {
                        self.parse_variable_statement("let")
                    }
                    "function" => self.parse_function(true).map(drop),
                    "async" if self.async_function_follows()? => {
                        self.parse_function(true).map(drop)
                    }
                    "class" => self.parse_class(true).map(drop),
                    "if" => self.parse_if(),
                    "for" => self.parse_for(),
                    "while" => self.parse_while(),
                    "do" => self.parse_do_while(),
                    "return" => self.parse_return(),
                    "break" => self.parse_jump("break"),
                    "continue" => self.parse_jump("continue"),
                    "throw" => self.parse_throw(),
                    "try" => self.parse_try(),
                    "switch" => self.parse_switch(),
                    "with" => Err(self.error_at(self.tok.start, ErrorKind::StrictWith)),
                    "debugger" => {
                        self.bump()?;
                        self.consume_semicolon()
                    }
                    "export" => Err(self.error_at(self.tok.start, ErrorKind::ModuleSyntax)),
                    "import" => {
                        let next = self.peek()?;
                        if matches!(next.kind, Some(Token::LParen)) {
                            self.parse_expression_statement()
                        } else {
                            Err(self.error_at(self.tok.start, ErrorKind::ModuleSyntax))
                        }
                    }
                    _ if !is_reserved(word) && self.peek()?.kind == Some(Token::Colon) => {
                        self.parse_labeled(word)
                    }
                    _ => self.parse_expression_statement(),
                }
            }
            Some(_) => self.parse_expression_statement(),
        }
    }

    fn let_starts_declaration(&self) -> TransformResult<bool> {
        let next = self.peek()?;
        Ok(matches!(
            next.kind,
            Some(Token::Ident) | Some(Token::LBracket) | Some(Token::LBrace)
        ))
    }

    fn async_function_follows(&self) -> TransformResult<bool> {
        let next = self.peek()?;
        Ok(next.kind == Some(Token::Ident)
            && !next.newline_before
            && self.text(next) == "function")
    }

    fn parse_variable_statement(&mut self, kind: &'static str) -> TransformResult<()> {
        self.bump()?;
        self.parse_declarations(kind, false)?;
        self.consume_semicolon()
    }

    fn parse_expression_statement(&mut self) -> TransformResult<()> {
        let start = self.tok.start;
        let mark = self.edits.len();
        let asi_end = self.asi_end.filter(|end| *end == self.prev_end);

        self.parse_expression()?;

        // A lowering that opens with `(` must not continue the previous line
        let opens_paren = self
            .edits
            .get(mark)
            .is_some_and(|edit| edit.range.start == start && edit.text.starts_with('('));
        if let Some(end) = asi_end.filter(|_| opens_paren) {
            self.edits.insert(mark, Edit::insert(end, ";"));
        }
        self.consume_semicolon()
    }

    fn parse_block(&mut self) -> TransformResult<()> {
        self.expect(Token::LBrace)?;
        while !self.is(Token::RBrace) && self.tok.kind.is_some() {
            self.parse_statement()?;
        }
        self.expect(Token::RBrace)?;
        Ok(())
    }

    /// Parse declarators after `var`/`let`/`const`
    ///
    /// Returns the number of declarators and, inside a `for` head, the
    /// offset of the first declarator missing a required initializer.
    fn parse_declarations(
        &mut self,
        kind: &'static str,
        in_for: bool,
    ) -> TransformResult<(usize, Option<(usize, &'static str)>)> {
        let mut count = 0;
        let mut missing = None;

        loop {
            if kind != "var" && self.is_word("let") {
                return Err(self.error_at(self.tok.start, ErrorKind::LetInLexicalBinding));
            }
            let is_pattern = self.is(Token::LBrace) || self.is(Token::LBracket);
            self.parse_binding_target()?;
            count += 1;

            if self.eat(Token::Eq)? {
                self.with_in(!in_for, |p| p.parse_assignment())?;
            } else if kind == "const" || is_pattern {
                let what = if is_pattern { "destructuring" } else { "const" };
                if !in_for {
                    return Err(self.error_at(self.prev_end, ErrorKind::MissingInitializer(what)));
                }
                missing.get_or_insert((self.prev_end, what));
            }

            if !self.eat(Token::Comma)? {
                break;
            }
        }

        Ok((count, missing))
    }

    fn parse_if(&mut self) -> TransformResult<()> {
        self.bump()?;
        self.parse_paren_expression()?;
        self.parse_statement()?;
        if self.eat_word("else")? {
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_paren_expression(&mut self) -> TransformResult<()> {
        self.expect(Token::LParen)?;
        self.with_in(true, |p| p.parse_expression())?;
        self.expect(Token::RParen)?;
        Ok(())
    }

    fn parse_loop_body(&mut self) -> TransformResult<()> {
        self.scope.loop_depth += 1;
        let result = self.parse_statement();
        self.scope.loop_depth -= 1;
        result
    }

    fn parse_while(&mut self) -> TransformResult<()> {
        self.bump()?;
        self.parse_paren_expression()?;
        self.parse_loop_body()
    }

    fn parse_do_while(&mut self) -> TransformResult<()> {
        self.bump()?;
        self.parse_loop_body()?;
        if !self.eat_word("while")? {
            return Err(self.error_at(self.tok.start, ErrorKind::Expected("while")));
        }
        self.parse_paren_expression()?;
        self.eat(Token::Semi)?;
        Ok(())
    }

    fn parse_for(&mut self) -> TransformResult<()> {
        self.bump()?;
        if self.is_word("await") {
            if !self.scope.is_async {
                return Err(self.unexpected());
            }
            self.bump()?;
        }
        self.expect(Token::LParen)?;

        let head_start = self.tok.start;
        let mut iteration = false;

        if self.is(Token::Semi) {
            // classic loop with an empty initializer
        } else if self.is_word("var")
            || self.is_word("const")
            || (self.is_word("let") && self.let_starts_declaration()?)
        {
            let kind = match self.text(self.tok) {
                "var" => "var",
                "let" => "let",
                _ => "const",
            };
            self.bump()?;
            let (count, missing) = self.parse_declarations(kind, true)?;
            if self.is_word("of") || self.is_word("in") {
                if count != 1 {
                    return Err(self.error_at(head_start, ErrorKind::InvalidLhs("for-loop")));
                }
                iteration = true;
            } else if let Some((offset, what)) = missing {
                return Err(self.error_at(offset, ErrorKind::MissingInitializer(what)));
            }
        } else {
            let checkpoint = self.checkpoint();
            let mut init = self.with_in(false, |p| p.parse_expression())?;

            if self.is_word("of") || self.is_word("in") {
                if self.lower_spread
                    && matches!(init.kind, ExprKind::ObjectLiteral | ExprKind::ArrayLiteral)
                {
                    // A destructuring target: parse again without rewriting spreads
                    self.restore(checkpoint);
                    let saved = std::mem::replace(&mut self.lower_spread, false);
                    let reparsed = self.with_in(false, |p| p.parse_expression());
                    self.lower_spread = saved;
                    init = reparsed?;
                }
                let valid = init.is_simple_target()
                    || matches!(init.kind, ExprKind::ObjectLiteral | ExprKind::ArrayLiteral);
                if !valid {
                    return Err(self.error_at(init.start, ErrorKind::InvalidLhs("for-loop")));
                }
                self.check_strict_target(&init)?;
                iteration = true;
            } else if let Some(offset) = init.cover_init {
                return Err(self.error_at(offset, ErrorKind::InvalidCoverInitializedName));
            }
        }

        if iteration {
            if self.eat_word("of")? {
                self.with_in(true, |p| p.parse_assignment())?;
            } else {
                self.bump()?;
                self.with_in(true, |p| p.parse_expression())?;
            }
        } else {
            self.expect(Token::Semi)?;
            if !self.is(Token::Semi) {
                self.with_in(true, |p| p.parse_expression())?;
            }
            self.expect(Token::Semi)?;
            if !self.is(Token::RParen) {
                self.with_in(true, |p| p.parse_expression())?;
            }
        }

        self.expect(Token::RParen)?;
        self.parse_loop_body()
    }

    fn parse_return(&mut self) -> TransformResult<()> {
        if !self.scope.in_function {
            return Err(self.error_at(self.tok.start, ErrorKind::IllegalReturn));
        }
        self.bump()?;
        let ends = self.is(Token::Semi)
            || self.is(Token::RBrace)
            || self.tok.kind.is_none()
            || self.tok.newline_before;
        if !ends {
            self.with_in(true, |p| p.parse_expression())?;
        }
        self.consume_semicolon()
    }

    fn parse_jump(&mut self, word: &'static str) -> TransformResult<()> {
        let keyword = self.bump()?;
        let is_break = word == "break";

        if self.is(Token::Ident) && !self.tok.newline_before {
            let label = self.text(self.tok);
            if !self.scope.labels.contains(&label) {
                return Err(self.error_at(keyword.start, ErrorKind::IllegalBreakContinue(word)));
            }
            self.bump()?;
        } else {
            let valid = if is_break {
                self.scope.loop_depth > 0 || self.scope.switch_depth > 0
            } else {
                self.scope.loop_depth > 0
            };
            if !valid {
                return Err(self.error_at(keyword.start, ErrorKind::IllegalBreakContinue(word)));
            }
        }

        self.consume_semicolon()
    }

    fn parse_throw(&mut self) -> TransformResult<()> {
        self.bump()?;
        if self.tok.newline_before {
            return Err(self.error_at(self.prev_end, ErrorKind::NewlineAfterThrow));
        }
        self.with_in(true, |p| p.parse_expression())?;
        self.consume_semicolon()
    }

    fn parse_try(&mut self) -> TransformResult<()> {
        self.bump()?;
        self.parse_block()?;

        let mut handled = false;
        if self.eat_word("catch")? {
            handled = true;
            if self.eat(Token::LParen)? {
                self.parse_binding_target()?;
                self.expect(Token::RParen)?;
            } else {
                self.edits.push(Edit::insert(self.prev_end, " (_unused)"));
            }
            self.parse_block()?;
        }
        if self.eat_word("finally")? {
            handled = true;
            self.parse_block()?;
        }

        if !handled {
            return Err(self.error_at(self.tok.start, ErrorKind::NoCatchOrFinally));
        }
        Ok(())
    }

    fn parse_switch(&mut self) -> TransformResult<()> {
        self.bump()?;
        self.parse_paren_expression()?;
        self.expect(Token::LBrace)?;
        self.scope.switch_depth += 1;
        let result = self.parse_switch_cases();
        self.scope.switch_depth -= 1;
        result
    }

    fn parse_switch_cases(&mut self) -> TransformResult<()> {
        let mut seen_default = false;
        while !self.eat(Token::RBrace)? {
            if self.eat_word("case")? {
                self.with_in(true, |p| p.parse_expression())?;
            } else if self.is_word("default") && !seen_default {
                seen_default = true;
                self.bump()?;
            } else {
                return Err(self.unexpected());
            }
            self.expect(Token::Colon)?;

            while !(self.is(Token::RBrace) || self.is_word("case") || self.is_word("default")) {
                if self.tok.kind.is_none() {
                    return Err(self.error_at(self.tok.start, ErrorKind::Expected("}")));
                }
                self.parse_statement()?;
            }
        }
        Ok(())
    }

    fn parse_labeled(&mut self, label: &'a str) -> TransformResult<()> {
        self.bump()?;
        self.expect(Token::Colon)?;
        self.scope.labels.push(label);
        let result = self.parse_statement();
        self.scope.labels.pop();
        result
    }

    // ---- functions and classes ----

    fn parse_function(&mut self, declaration: bool) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        let is_async = self.eat_word("async")?;
        self.bump()?; // function
        let is_generator = self.eat(Token::Star)?;

        if self.is(Token::Ident) {
            self.binding_identifier()?;
        } else if declaration {
            return Err(self.unexpected());
        }

        self.parse_function_rest(is_async, is_generator, self.strict())?;
        Ok(ExprInfo::other(start, self.prev_end))
    }

    /// Parameters and body of any function-like construct
    ///
    /// `unique` rejects repeated parameter names.
    fn parse_function_rest(
        &mut self,
        is_async: bool,
        is_generator: bool,
        unique: bool,
    ) -> TransformResult<()> {
        let outer = std::mem::replace(
            &mut self.scope,
            FunctionScope::function(is_async, is_generator),
        );
        let result = self.parse_function_parts(unique);
        self.scope = outer;

        // Parameter defaults cannot see the body's vars
        self.scope.temps.extend(result?);
        Ok(())
    }

    /// Returns the temporaries the parameter list needs from the outer scope
    fn parse_function_parts(&mut self, unique: bool) -> TransformResult<Vec<String>> {
        let params = self.with_in(true, |p| p.parse_params())?;
        if unique {
            self.check_unique_params(&params)?;
        }
        let param_temps = std::mem::take(&mut self.scope.temps);

        self.parse_function_body()?;
        let body_temps = std::mem::take(&mut self.scope.temps);
        self.declare_temps(&body_temps, self.prev_end - 1);
        Ok(param_temps)
    }

    fn parse_params(&mut self) -> TransformResult<ParamNames<'a>> {
        let outer = self.params.replace(Vec::new());
        let result = self.parse_param_list();
        let params = std::mem::replace(&mut self.params, outer).unwrap_or_default();
        result.map(|_| params)
    }

    fn parse_param_list(&mut self) -> TransformResult<()> {
        self.expect(Token::LParen)?;
        while !self.is(Token::RParen) {
            if self.eat(Token::Ellipsis)? {
                self.parse_binding_target()?;
                break;
            }
            self.parse_binding_element()?;
            if !self.is(Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RParen)?;
        Ok(())
    }

    fn parse_function_body(&mut self) -> TransformResult<()> {
        self.with_in(true, |p| p.parse_block())
    }

    fn parse_class(&mut self, declaration: bool) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        self.bump()?; // class

        if self.is(Token::Ident) && !self.is_word("extends") {
            self.binding_identifier()?;
        } else if declaration {
            return Err(self.unexpected());
        }

        if self.eat_word("extends")? {
            self.parse_lhs(None)?;
        }

        self.expect(Token::LBrace)?;
        while !self.eat(Token::RBrace)? {
            if self.tok.kind.is_none() {
                return Err(self.error_at(self.tok.start, ErrorKind::Expected("}")));
            }
            self.parse_class_member()?;
        }
        Ok(ExprInfo::other(start, self.prev_end))
    }

    /// Whether a contextual word (`static`, `get`, `async`, ...) at the
    /// current token is a modifier rather than a member name
    fn is_modifier(&self, allow_newline: bool) -> TransformResult<bool> {
        let next = self.peek()?;
        if !allow_newline && next.newline_before {
            return Ok(false);
        }
        Ok(!matches!(
            next.kind,
            None | Some(Token::LParen)
                | Some(Token::Eq)
                | Some(Token::Semi)
                | Some(Token::RBrace)
                | Some(Token::Comma)
                | Some(Token::Colon)
        ))
    }

    fn parse_class_member(&mut self) -> TransformResult<()> {
        if self.eat(Token::Semi)? {
            return Ok(());
        }

        if self.is_word("static") {
            if self.peek()?.kind == Some(Token::LBrace) {
                self.bump()?;
                let outer = std::mem::replace(&mut self.scope, FunctionScope::default());
                let result = self.parse_block();
                let inner = std::mem::replace(&mut self.scope, outer);
                result?;
                self.declare_temps(&inner.temps, self.prev_end - 1);
                return Ok(());
            }
            if self.is_modifier(true)? {
                self.bump()?;
            }
        }

        let mut is_async = false;
        let mut is_generator = false;
        let mut accessor = false;

        if self.is_word("async") && self.is_modifier(false)? {
            self.bump()?;
            is_async = true;
        }
        if self.eat(Token::Star)? {
            is_generator = true;
        }
        if !is_async && !is_generator && (self.is_word("get") || self.is_word("set")) && self.is_modifier(true)? {
            self.bump()?;
            accessor = true;
        }

        self.parse_property_key(true)?;

        if self.is(Token::LParen) {
            return self.parse_function_rest(is_async, is_generator, true);
        }
        if is_async || is_generator || accessor {
            return Err(self.error_at(self.tok.start, ErrorKind::Expected("(")));
        }

        if self.eat(Token::Eq)? {
            let outer = std::mem::replace(&mut self.scope, FunctionScope::default());
            let result = self.with_in(true, |p| p.parse_assignment());
            let inner = std::mem::replace(&mut self.scope, outer);
            result?;
            // Initializers run in the constructor, which closes over these
            self.scope.temps.extend(inner.temps);
        }
        self.consume_semicolon()
    }

    /// Returns `true` when the key was a plain identifier
    fn parse_property_key(&mut self, allow_private: bool) -> TransformResult<bool> {
        match self.tok.kind {
            Some(Token::Ident) => {
                self.bump()?;
                Ok(true)
            }
            Some(Token::String) | Some(Token::Number) => {
                self.parse_literal()?;
                Ok(false)
            }
            Some(Token::PrivateName) if allow_private => {
                self.bump()?;
                Ok(false)
            }
            Some(Token::LBracket) => {
                self.bump()?;
                self.with_in(true, |p| p.parse_assignment())?;
                self.expect(Token::RBracket)?;
                Ok(false)
            }
            _ => Err(self.unexpected()),
        }
    }

    // ---- binding patterns ----

    fn parse_binding_target(&mut self) -> TransformResult<()> {
        match self.tok.kind {
            Some(Token::LBracket) => self.nested(|p| p.parse_array_pattern()),
            Some(Token::LBrace) => self.nested(|p| p.parse_object_pattern()),
            _ => self.binding_identifier(),
        }
    }

    fn parse_binding_element(&mut self) -> TransformResult<()> {
        self.parse_binding_target()?;
        if self.eat(Token::Eq)? {
            self.with_in(true, |p| p.parse_assignment())?;
        }
        Ok(())
    }

    fn parse_array_pattern(&mut self) -> TransformResult<()> {
        self.bump()?;
        while !self.is(Token::RBracket) {
            if self.eat(Token::Comma)? {
                continue;
            }
            if self.eat(Token::Ellipsis)? {
                self.parse_binding_target()?;
                break;
            }
            self.parse_binding_element()?;
            if !self.is(Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RBracket)?;
        Ok(())
    }

    fn parse_object_pattern(&mut self) -> TransformResult<()> {
        self.bump()?;
        while !self.is(Token::RBrace) {
            if self.eat(Token::Ellipsis)? {
                self.binding_identifier()?;
                break;
            }

            let key = self.tok;
            let plain = self.parse_property_key(false)?;
            if self.eat(Token::Colon)? {
                self.parse_binding_element()?;
            } else {
                if !plain {
                    return Err(self.error_at(self.tok.start, ErrorKind::Expected(":")));
                }
                self.check_binding_name(key)?;
                self.bind(key);
                if self.eat(Token::Eq)? {
                    self.with_in(true, |p| p.parse_assignment())?;
                }
            }

            if !self.is(Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(())
    }

    // ---- expressions ----

    pub(crate) fn parse_expression(&mut self) -> TransformResult<ExprInfo> {
        let first = self.parse_assignment()?;
        if !self.is(Token::Comma) {
            return Ok(first);
        }
        while self.eat(Token::Comma)? {
            self.parse_assignment()?;
        }
        Ok(ExprInfo::other(first.start, self.prev_end))
    }

    /// An assignment expression that must not be a destructuring cover
    pub(crate) fn parse_assignment(&mut self) -> TransformResult<ExprInfo> {
        let expr = self.parse_assignment_cover()?;
        if let Some(offset) = expr.cover_init {
            return Err(self.error_at(offset, ErrorKind::InvalidCoverInitializedName));
        }
        Ok(expr)
    }

    fn parse_assignment_cover(&mut self) -> TransformResult<ExprInfo> {
        // Names in default values and computed keys are not parameters
        let params = self.params.take();
        let result = self.nested(|p| p.parse_assignment_inner());
        self.params = params;
        result
    }

    fn parse_assignment_inner(&mut self) -> TransformResult<ExprInfo> {
        if let Some(arrow) = self.try_arrow()? {
            return Ok(arrow);
        }
        if self.is_word("yield") && self.scope.is_generator {
            return self.parse_yield();
        }

        let checkpoint = self.checkpoint();
        let left_mark = checkpoint.edits;
        let mut left = self.parse_conditional()?;

        let op = match self.tok.kind {
            Some(kind) if kind.is_assignment() => kind,
            _ => return Ok(left),
        };

        if op == Token::Eq
            && self.lower_spread
            && matches!(left.kind, ExprKind::ObjectLiteral | ExprKind::ArrayLiteral)
        {
            // A destructuring target: parse again without rewriting spreads
            self.restore(checkpoint);
            let saved = std::mem::replace(&mut self.lower_spread, false);
            let reparsed = self.parse_conditional();
            self.lower_spread = saved;
            left = reparsed?;
        }

        let valid = match op {
            Token::Eq => {
                left.is_simple_target()
                    || matches!(left.kind, ExprKind::ObjectLiteral | ExprKind::ArrayLiteral)
            }
            _ => left.is_simple_target(),
        };
        if !valid {
            return Err(self.error_at(left.start, ErrorKind::InvalidLhs("assignment expression")));
        }
        self.check_strict_target(&left)?;

        let split = self.last_member.filter(|split| {
            left.kind == ExprKind::Member && split.start == left.start && split.end == left.end
        });

        self.bump()?;
        let right_mark = self.edits.len();
        let right = self.parse_assignment()?;

        let compound = matches!(
            op,
            Token::StarStarEq | Token::PipePipeEq | Token::AmpAmpEq | Token::QuestionQuestionEq
        );
        if compound {
            let code = self.lower_compound(op, left, split, left_mark, right_mark, right);
            self.edits.truncate(left_mark);
            self.edits.push(Edit::replace(left.start..right.end, code));
        }

        Ok(ExprInfo::other(left.start, right.end))
    }

    /// `a **= b`, `a ||= b`, `a &&= b` and `a ??= b` without the operator
    ///
    /// The target's object and computed key are evaluated once.
    fn lower_compound(
        &mut self,
        op: Token,
        left: ExprInfo,
        split: Option<MemberSplit>,
        left_mark: usize,
        right_mark: usize,
        right: ExprInfo,
    ) -> String {
        let left_edits = &self.edits[left_mark..right_mark];
        let parts = split.map(|split| {
            (
                render(self.src, left.start..split.object_end, left_edits),
                render(self.src, split.object_end..split.end, left_edits),
                split.computed,
            )
        });
        let whole = render(self.src, left.start..left.end, left_edits);
        let value = render(self.src, right.start..right.end, &self.edits[right_mark..]);

        let (first, again) = match parts {
            None => (whole.clone(), whole),
            Some((object, member, computed)) => {
                let (object_first, object_again) = if is_simple_reference(&object) {
                    (object.clone(), object)
                } else {
                    let temp = self.temp();
                    (format!("({} = {})", temp, object), temp)
                };
                let (member_first, member_again) = if computed {
                    let key = member.trim();
                    let key = &key[1..key.len() - 1];
                    if key.trim().chars().all(|c| c.is_ascii_digit()) {
                        (member.clone(), member)
                    } else {
                        let temp = self.temp();
                        (format!("[{} = {}]", temp, key), format!("[{}]", temp))
                    }
                } else {
                    (member.clone(), member)
                };
                (object_first + &member_first, object_again + &member_again)
            }
        };

        match op {
            Token::StarStarEq => format!("{} = Math.pow({}, {})", first, again, value),
            Token::PipePipeEq => format!("{} || ({} = {})", first, again, value),
            Token::AmpAmpEq => format!("{} && ({} = {})", first, again, value),
            _ if split.is_none() && left.kind == ExprKind::Identifier => format!(
                "{0} !== null && {0} !== void 0 ? {0} : ({0} = {1})",
                first, value
            ),
            _ => {
                let temp = self.temp();
                format!(
                    "({0} = {1}) !== null && {0} !== void 0 ? {0} : ({2} = {3})",
                    temp, first, again, value
                )
            }
        }
    }

    fn parse_yield(&mut self) -> TransformResult<ExprInfo> {
        let start = self.bump()?.start;
        if self.tok.newline_before {
            return Ok(ExprInfo::other(start, self.prev_end));
        }
        let delegate = self.eat(Token::Star)?;
        let has_argument = delegate
            || !matches!(
                self.tok.kind,
                None | Some(Token::RParen)
                    | Some(Token::RBracket)
                    | Some(Token::RBrace)
                    | Some(Token::Comma)
                    | Some(Token::Semi)
                    | Some(Token::Colon)
            );
        if has_argument {
            self.parse_assignment()?;
        }
        Ok(ExprInfo::other(start, self.prev_end))
    }

    /// Recognise and parse an arrow function at the current token
    fn try_arrow(&mut self) -> TransformResult<Option<ExprInfo>> {
        let start = self.tok.start;
        match self.tok.kind {
            Some(Token::Ident) => {
                let word = self.text(self.tok);
                let next = self.peek()?;

                if word == "async" && !next.newline_before {
                    if next.kind == Some(Token::Ident) && self.text(next) != "function" {
                        let after = self.scanner.next_token(next.end)?;
                        if after.kind == Some(Token::Arrow) && !after.newline_before {
                            self.bump()?;
                            self.binding_identifier()?;
                            return self.parse_arrow_body(start, true).map(Some);
                        }
                    }
                    if next.kind == Some(Token::LParen) {
                        return self.try_paren_arrow(start, next.start, true);
                    }
                }

                if next.kind == Some(Token::Arrow) && !next.newline_before && !is_reserved(word) {
                    self.binding_identifier()?;
                    return self.parse_arrow_body(start, false).map(Some);
                }
                Ok(None)
            }
            Some(Token::LParen) => self.try_paren_arrow(start, start, false),
            _ => Ok(None),
        }
    }

    fn try_paren_arrow(
        &mut self,
        start: usize,
        paren: usize,
        is_async: bool,
    ) -> TransformResult<Option<ExprInfo>> {
        if self.failed_arrows.contains(&paren) {
            return Ok(None);
        }

        let checkpoint = self.checkpoint();
        let outer = std::mem::replace(&mut self.scope, FunctionScope::function(is_async, false));
        let head = self.parse_arrow_head(is_async);
        let head_scope = std::mem::replace(&mut self.scope, outer);

        match head {
            Ok(params) => {
                self.check_unique_params(&params)?;
                self.scope.temps.extend(head_scope.temps);
                self.parse_arrow_body(start, is_async).map(Some)
            }
            Err(_) => {
                self.restore(checkpoint);
                self.failed_arrows.insert(paren);
                Ok(None)
            }
        }
    }

    fn parse_arrow_head(&mut self, is_async: bool) -> TransformResult<ParamNames<'a>> {
        if is_async {
            self.bump()?;
        }
        let params = self.with_in(true, |p| p.parse_params())?;
        if self.is(Token::Arrow) && !self.tok.newline_before {
            Ok(params)
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_arrow_body(&mut self, start: usize, is_async: bool) -> TransformResult<ExprInfo> {
        self.expect(Token::Arrow)?;
        let outer = std::mem::replace(&mut self.scope, FunctionScope::function(is_async, false));
        let body_start = self.tok.start;
        let mark = self.edits.len();
        let block = self.is(Token::LBrace);
        let result = if block {
            self.parse_function_body()
        } else {
            self.parse_assignment().map(drop)
        };
        let inner = std::mem::replace(&mut self.scope, outer);
        result?;

        if block {
            self.declare_temps(&inner.temps, self.prev_end - 1);
        } else if !inner.temps.is_empty() {
            // An expression body needs a block to declare its temporaries in
            self.edits.insert(mark, Edit::insert(body_start, "{ return "));
            self.edits.push(Edit::insert(
                self.prev_end,
                format!(";\nvar {};\n}}", inner.temps.join(", ")),
            ));
        }
        Ok(ExprInfo::other(start, self.prev_end))
    }

    fn parse_conditional(&mut self) -> TransformResult<ExprInfo> {
        let test = self.parse_binary(0)?;
        if !self.is(Token::Question) {
            return Ok(test);
        }
        self.bump()?;
        self.with_in(true, |p| p.parse_assignment())?;
        self.expect(Token::Colon)?;
        self.parse_assignment()?;
        Ok(ExprInfo::other(test.start, self.prev_end))
    }

    fn binary_precedence(&self) -> Option<u8> {
        let prec = match self.tok.kind? {
            Token::QuestionQuestion | Token::PipePipe => 1,
            Token::AmpAmp => 2,
            Token::Pipe => 3,
            Token::Caret => 4,
            Token::Amp => 5,
            Token::EqEq | Token::NotEq | Token::EqEqEq | Token::NotEqEq => 6,
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => 7,
            Token::Shl | Token::Shr | Token::UShr => 8,
            Token::Plus | Token::Minus => 9,
            Token::Star | Token::Slash | Token::Percent => 10,
            Token::Ident => match self.text(self.tok) {
                "instanceof" => 7,
                "in" if !self.no_in => 7,
                _ => return None,
            },
            _ => return None,
        };
        Some(prec)
    }

    fn parse_binary(&mut self, min_prec: u8) -> TransformResult<ExprInfo> {
        let mark = self.edits.len();
        let mut left = self.parse_exponent()?;
        while let Some(prec) = self.binary_precedence() {
            if prec <= min_prec {
                break;
            }
            let op = self.bump()?;
            let right_mark = self.edits.len();
            let right = self.parse_binary(prec)?;

            let kind = match op.kind {
                Some(Token::QuestionQuestion) => {
                    if left.kind == ExprKind::Logical || right.kind == ExprKind::Logical {
                        return Err(self.error_at(op.start, ErrorKind::MixedNullish));
                    }
                    let code = self.lower_nullish(left, right, mark, right_mark);
                    self.edits.truncate(mark);
                    self.edits.push(Edit::replace(left.start..right.end, code));
                    ExprKind::Nullish
                }
                Some(Token::PipePipe) | Some(Token::AmpAmp) => {
                    if left.kind == ExprKind::Nullish || right.kind == ExprKind::Nullish {
                        return Err(self.error_at(op.start, ErrorKind::MixedNullish));
                    }
                    ExprKind::Logical
                }
                _ => ExprKind::Other,
            };
            left = ExprInfo::new(left.start, right.end, kind);
        }
        Ok(left)
    }

    /// `a ?? b` as a conditional on `a` evaluated once
    fn lower_nullish(
        &mut self,
        left: ExprInfo,
        right: ExprInfo,
        mark: usize,
        right_mark: usize,
    ) -> String {
        let value = render(self.src, left.start..left.end, &self.edits[mark..right_mark]);
        let fallback = render(self.src, right.start..right.end, &self.edits[right_mark..]);

        if left.kind == ExprKind::Identifier {
            return format!(
                "({0} !== null && {0} !== void 0 ? {0} : {1})",
                value, fallback
            );
        }
        let temp = self.temp();
        format!(
            "(({0} = {1}) !== null && {0} !== void 0 ? {0} : {2})",
            temp, value, fallback
        )
    }

    /// `a ** b` becomes `Math.pow(a, b)`; the operator is right-associative
    fn parse_exponent(&mut self) -> TransformResult<ExprInfo> {
        let mark = self.edits.len();
        let left = self.parse_unary()?;
        if !self.is(Token::StarStar) {
            return Ok(left);
        }
        if left.kind == ExprKind::Unary {
            return Err(self.error_at(self.tok.start, ErrorKind::UnaryBeforeExponent));
        }

        self.bump()?;
        let right_mark = self.edits.len();
        let right = self.nested(|p| p.parse_exponent())?;

        let base = render(self.src, left.start..left.end, &self.edits[mark..right_mark]);
        let exponent = render(self.src, right.start..right.end, &self.edits[right_mark..]);
        self.edits.truncate(mark);
        self.edits.push(Edit::replace(
            left.start..right.end,
            format!("Math.pow({}, {})", base, exponent),
        ));

        Ok(ExprInfo::other(left.start, right.end))
    }

    fn parse_unary(&mut self) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        let deleting = self.deleting.take();
        match self.tok.kind {
            Some(Token::Plus) | Some(Token::Minus) | Some(Token::Bang) | Some(Token::Tilde) => {
                self.bump()?;
                self.nested(|p| p.parse_unary())?;
                Ok(ExprInfo::new(start, self.prev_end, ExprKind::Unary))
            }
            Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                self.bump()?;
                let argument = self.nested(|p| p.parse_unary())?;
                if !argument.is_simple_target() {
                    return Err(self.error_at(argument.start, ErrorKind::InvalidLhs("prefix operation")));
                }
                self.check_strict_target(&argument)?;
                Ok(ExprInfo::other(start, self.prev_end))
            }
            Some(Token::Ident) => {
                let word = self.text(self.tok);
                let is_unary = matches!(word, "typeof" | "void" | "delete")
                    || (word == "await" && self.scope.is_async);
                if is_unary {
                    self.bump()?;
                    if word == "delete" {
                        self.deleting = Some(start);
                    }
                    let argument = self.nested(|p| p.parse_unary())?;
                    if word == "delete" && self.strict() && argument.kind == ExprKind::Identifier {
                        return Err(self.error_at(start, ErrorKind::StrictDelete));
                    }
                    Ok(ExprInfo::new(start, self.prev_end, ExprKind::Unary))
                } else {
                    self.parse_postfix(deleting)
                }
            }
            _ => self.parse_postfix(deleting),
        }
    }

    fn parse_postfix(&mut self, deleting: Option<usize>) -> TransformResult<ExprInfo> {
        let expr = self.parse_lhs(deleting)?;
        let is_update = self.is(Token::PlusPlus) || self.is(Token::MinusMinus);
        if is_update && !self.tok.newline_before {
            if !expr.is_simple_target() {
                return Err(self.error_at(expr.start, ErrorKind::InvalidLhs("postfix operation")));
            }
            self.check_strict_target(&expr)?;
            self.bump()?;
            return Ok(ExprInfo::other(expr.start, self.prev_end));
        }
        Ok(expr)
    }

    /// `deleting` is the offset of a `delete` applied to this expression
    fn parse_lhs(&mut self, deleting: Option<usize>) -> TransformResult<ExprInfo> {
        let mark = self.edits.len();
        let callee = if self.is_word("new") {
            self.nested(|p| p.parse_new())?
        } else {
            self.parse_primary()?
        };
        self.parse_call_tail(callee, true, mark, deleting)
    }

    fn parse_new(&mut self) -> TransformResult<ExprInfo> {
        let start = self.bump()?.start;

        if self.eat(Token::Dot)? {
            if !self.is_word("target") {
                return Err(self.unexpected());
            }
            self.bump()?;
            return Ok(ExprInfo::other(start, self.prev_end));
        }

        let mark = self.edits.len();
        let callee = if self.is_word("new") {
            self.nested(|p| p.parse_new())?
        } else {
            self.parse_primary()?
        };
        self.parse_call_tail(callee, false, mark, None)?;
        if self.is(Token::LParen) {
            self.parse_arguments()?;
        }
        Ok(ExprInfo::other(start, self.prev_end))
    }

    fn parse_call_tail(
        &mut self,
        mut expr: ExprInfo,
        allow_call: bool,
        mark: usize,
        deleting: Option<usize>,
    ) -> TransformResult<ExprInfo> {
        let base = expr;
        let mut links: Vec<ChainLink> = Vec::new();
        let mut in_chain = false;

        loop {
            let start = self.tok.start;
            let mut link = ChainLink {
                start,
                end: start,
                text_start: start,
                optional: false,
                call: false,
                needs_dot: false,
            };

            let kind = match self.tok.kind {
                Some(Token::Dot) => {
                    self.bump()?;
                    if !(self.is(Token::Ident) || self.is(Token::PrivateName)) {
                        return Err(self.unexpected());
                    }
                    self.bump()?;
                    ExprKind::Member
                }
                Some(Token::QuestionDot) => {
                    if !allow_call {
                        return Err(self.unexpected());
                    }
                    link.text_start = self.bump()?.end;
                    link.optional = true;
                    in_chain = true;
                    match self.tok.kind {
                        Some(Token::LParen) => {
                            self.parse_arguments()?;
                            link.call = true;
                        }
                        Some(Token::LBracket) => {
                            self.bump()?;
                            self.with_in(true, |p| p.parse_expression())?;
                            self.expect(Token::RBracket)?;
                        }
                        Some(Token::Ident) | Some(Token::PrivateName) => {
                            self.bump()?;
                            link.needs_dot = true;
                        }
                        _ => return Err(self.unexpected()),
                    }
                    ExprKind::OptionalChain
                }
                Some(Token::LBracket) => {
                    self.bump()?;
                    self.with_in(true, |p| p.parse_expression())?;
                    self.expect(Token::RBracket)?;
                    ExprKind::Member
                }
                Some(Token::LParen) if allow_call => {
                    self.parse_arguments()?;
                    link.call = true;
                    ExprKind::Call
                }
                Some(Token::Backtick) => {
                    if in_chain {
                        return Err(self.unexpected());
                    }
                    self.parse_template()?;
                    link.call = true;
                    ExprKind::Call
                }
                _ => break,
            };

            link.end = self.prev_end;
            links.push(link);
            let kind = if in_chain { ExprKind::OptionalChain } else { kind };
            expr = ExprInfo::new(expr.start, self.prev_end, kind);
        }

        self.last_member = match links.last() {
            Some(link) if !in_chain && !link.call => Some(MemberSplit {
                start: expr.start,
                object_end: link.start,
                end: link.end,
                computed: self.src[link.start..].starts_with('['),
            }),
            _ => None,
        };

        if in_chain {
            let code = self.lower_chain(base, &links, mark, deleting.is_some());
            let start = deleting.unwrap_or(expr.start);
            self.edits.truncate(mark);
            self.edits.push(Edit::replace(start..expr.end, code));
        }

        Ok(expr)
    }

    /// Rewrite a chain containing `?.` as nested null checks
    ///
    /// Each optional link tests the value so far once and short-circuits
    /// the whole rest of the chain. Under `delete` a short-circuit yields
    /// `true` and the tail is deleted.
    fn lower_chain(
        &mut self,
        base: ExprInfo,
        links: &[ChainLink],
        mark: usize,
        deleting: bool,
    ) -> String {
        let edits = &self.edits[mark..];
        let mut current = render(self.src, base.start..links[0].start, edits);
        let pieces: Vec<String> = links
            .iter()
            .map(|link| {
                let text = render(self.src, link.text_start..link.end, edits);
                if link.needs_dot {
                    format!(".{}", text)
                } else {
                    text
                }
            })
            .collect();

        let mut simple = base.kind == ExprKind::Identifier || current == "this";
        let mut checks = Vec::new();
        // Object and member text of the previous link, for method calls
        let mut member: Option<(String, String)> = None;

        for (link, piece) in links.iter().zip(pieces) {
            if link.optional {
                match member.take() {
                    Some((object, property)) if link.call => {
                        let (object_first, this) = if is_simple_reference(&object) {
                            let this = if object == "super" { "this".to_string() } else { object.clone() };
                            (object, this)
                        } else {
                            let temp = self.temp();
                            (format!("({} = {})", temp, object), temp)
                        };
                        let callee = self.temp();
                        checks.push(format!(
                            "({0} = {1}{2}) === null || {0} === void 0",
                            callee, object_first, property
                        ));
                        current = call_with_this(&callee, &this, &piece);
                        simple = false;
                        continue;
                    }
                    _ => {}
                }

                if simple {
                    checks.push(format!("{0} === null || {0} === void 0", current));
                } else {
                    let temp = self.temp();
                    checks.push(format!("({0} = {1}) === null || {0} === void 0", temp, current));
                    current = temp;
                }
            }

            let object = current.clone();
            current.push_str(&piece);
            member = (!link.call).then_some((object, piece));
            simple = false;
        }

        let (fallback, tail) = if deleting {
            ("true", format!("delete {}", current))
        } else {
            ("void 0", current)
        };
        let mut out = String::from("(");
        for check in &checks {
            out.push_str(check);
            out.push_str(" ? ");
            out.push_str(fallback);
            out.push_str(" : ");
        }
        out.push_str(&tail);
        out.push(')');
        out
    }

    fn parse_arguments(&mut self) -> TransformResult<()> {
        self.expect(Token::LParen)?;
        self.with_in(true, |p| {
            while !p.is(Token::RParen) {
                p.eat(Token::Ellipsis)?;
                p.parse_assignment()?;
                if !p.is(Token::RParen) {
                    p.expect(Token::Comma)?;
                }
            }
            Ok(())
        })?;
        self.expect(Token::RParen)?;
        Ok(())
    }

    fn parse_primary(&mut self) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        match self.tok.kind {
            None => Err(self.unexpected()),
            Some(Token::Ident) => self.parse_word(),
            Some(Token::Number) | Some(Token::String) => {
                self.parse_literal()?;
                Ok(ExprInfo::other(start, self.prev_end))
            }
            Some(Token::Slash) | Some(Token::SlashEq) => {
                let end = self.scanner.scan_regex(start)?;
                self.resume_at(end)?;
                Ok(ExprInfo::other(start, end))
            }
            Some(Token::Backtick) => self.parse_template(),
            Some(Token::LParen) => self.parse_parenthesized(),
            Some(Token::LBracket) => self.parse_array_literal(),
            Some(Token::LBrace) => self.parse_object_literal(),
            Some(Token::Lt) => match self.options.dialect {
                Dialect::Jsx => self.nested(|p| p.parse_jsx()),
                Dialect::EsNext => Err(self.error_at(start, ErrorKind::JsxNotEnabled)),
            },
            Some(_) => Err(self.unexpected()),
        }
    }

    fn parse_word(&mut self) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        let word = self.text(self.tok);
        match word {
            "function" => self.parse_function(false),
            "class" => self.parse_class(false),
            "async" if self.async_function_follows()? => self.parse_function(false),
            "this" | "null" | "true" | "false" => {
                self.bump()?;
                Ok(ExprInfo::other(start, self.prev_end))
            }
            "super" => {
                self.bump()?;
                if !matches!(
                    self.tok.kind,
                    Some(Token::LParen) | Some(Token::Dot) | Some(Token::LBracket)
                ) {
                    return Err(self.unexpected());
                }
                Ok(ExprInfo::other(start, self.prev_end))
            }
            "import" => {
                self.bump()?;
                if !self.is(Token::LParen) {
                    return Err(self.error_at(start, ErrorKind::ModuleSyntax));
                }
                Ok(ExprInfo::other(start, self.prev_end))
            }
            _ if is_reserved(word) => Err(self.unexpected()),
            "await" if self.scope.is_async => Err(self.unexpected()),
            _ if self.strict() && is_strict_reserved(word) => Err(self.error_at(
                start,
                ErrorKind::StrictReservedWord(word.to_string()),
            )),
            _ => {
                self.bump()?;
                Ok(ExprInfo::new(start, self.prev_end, ExprKind::Identifier))
            }
        }
    }

    fn parse_parenthesized(&mut self) -> TransformResult<ExprInfo> {
        let start = self.bump()?.start;
        let inner = self.with_in(true, |p| p.parse_expression())?;
        self.expect(Token::RParen)?;
        let kind = if inner.is_simple_target() {
            ExprKind::Parenthesized
        } else {
            ExprKind::Other
        };
        Ok(ExprInfo::new(start, self.prev_end, kind))
    }

    fn parse_template(&mut self) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        let mut chunk = self.scanner.scan_template(start + 1, start)?;

        while !chunk.tail {
            self.tok = self.scanner.next_token(chunk.end)?;
            self.with_in(true, |p| p.parse_expression())?;
            if !self.is(Token::RBrace) {
                return Err(self.error_at(self.tok.start, ErrorKind::Expected("}")));
            }
            chunk = self.scanner.scan_template(self.tok.end, start)?;
        }

        self.resume_at(chunk.end)?;
        Ok(ExprInfo::other(start, chunk.end))
    }

    fn parse_array_literal(&mut self) -> TransformResult<ExprInfo> {
        let start = self.bump()?.start;
        let mut cover_init = None;

        self.with_in(true, |p| {
            while !p.is(Token::RBracket) {
                if p.eat(Token::Comma)? {
                    continue;
                }
                p.eat(Token::Ellipsis)?;
                let element = p.parse_assignment_cover()?;
                cover_init = cover_init.or(element.cover_init);
                if !p.is(Token::RBracket) {
                    p.expect(Token::Comma)?;
                }
            }
            Ok(())
        })?;
        self.expect(Token::RBracket)?;

        Ok(ExprInfo {
            start,
            end: self.prev_end,
            kind: ExprKind::ArrayLiteral,
            cover_init,
        })
    }

    /// Object literals with spread properties become `Object.assign` calls
    fn parse_object_literal(&mut self) -> TransformResult<ExprInfo> {
        let mark = self.edits.len();
        let start = self.bump()?.start;
        let mut parts = Vec::new();
        let mut cover_init = None;

        self.with_in(true, |p| {
            while !p.is(Token::RBrace) {
                let part_start = p.tok.start;
                if p.eat(Token::Ellipsis)? {
                    let argument = p.parse_assignment()?;
                    parts.push(ObjectPart {
                        start: argument.start,
                        end: argument.end,
                        spread: true,
                    });
                } else {
                    p.parse_property(&mut cover_init)?;
                    parts.push(ObjectPart {
                        start: part_start,
                        end: p.prev_end,
                        spread: false,
                    });
                }
                if !p.is(Token::RBrace) {
                    p.expect(Token::Comma)?;
                }
            }
            Ok(())
        })?;
        self.expect(Token::RBrace)?;
        let end = self.prev_end;

        if self.lower_spread && parts.iter().any(|part| part.spread) {
            let code = self.object_assign(&parts, mark);
            self.edits.truncate(mark);
            self.edits.push(Edit::replace(start..end, code));
        }

        Ok(ExprInfo {
            start,
            end,
            kind: ExprKind::ObjectLiteral,
            cover_init,
        })
    }

    fn object_assign(&self, parts: &[ObjectPart], mark: usize) -> String {
        let edits = &self.edits[mark..];
        let mut args = vec!["{}".to_string()];
        let mut group: Vec<String> = Vec::new();

        for part in parts {
            let text = render(self.src, part.start..part.end, edits);
            if part.spread {
                if !group.is_empty() {
                    args.push(format!("{{ {} }}", group.join(", ")));
                    group.clear();
                }
                args.push(text);
            } else {
                group.push(text);
            }
        }
        if !group.is_empty() {
            args.push(format!("{{ {} }}", group.join(", ")));
        }

        format!("Object.assign({})", args.join(", "))
    }

    fn parse_property(&mut self, cover_init: &mut Option<usize>) -> TransformResult<()> {
        if self.eat(Token::Star)? {
            self.parse_property_key(false)?;
            return self.parse_function_rest(false, true, true);
        }

        if self.is_word("async") && self.is_modifier(false)? {
            self.bump()?;
            let is_generator = self.eat(Token::Star)?;
            self.parse_property_key(false)?;
            return self.parse_function_rest(true, is_generator, true);
        }

        if (self.is_word("get") || self.is_word("set")) && self.is_modifier(true)? {
            self.bump()?;
            self.parse_property_key(false)?;
            return self.parse_function_rest(false, false, true);
        }

        let key = self.tok;
        let plain = self.parse_property_key(false)?;

        match self.tok.kind {
            Some(Token::Colon) => {
                self.bump()?;
                let value = self.parse_assignment_cover()?;
                if cover_init.is_none() {
                    *cover_init = value.cover_init;
                }
                Ok(())
            }
            Some(Token::LParen) => self.parse_function_rest(false, false, true),
            _ if plain => {
                let word = self.text(key);
                if is_reserved(word) {
                    return Err(self.error_at(key.start, ErrorKind::UnexpectedKeyword(word.to_string())));
                }
                if self.strict() && is_strict_reserved(word) {
                    return Err(self.error_at(key.start, ErrorKind::StrictReservedWord(word.to_string())));
                }
                if self.is(Token::Eq) {
                    cover_init.get_or_insert(self.tok.start);
                    self.bump()?;
                    self.parse_assignment()?;
                }
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Words that can never be identifier references in strict code
pub(crate) fn is_reserved(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "implements"
            | "interface"
            | "package"
            | "private"
            | "protected"
            | "public"
    )
}

/// Words that are only reserved in strict code
fn is_strict_reserved(word: &str) -> bool {
    matches!(word, "let" | "static" | "yield")
}

/// An object that can be read twice without side effects
fn is_simple_reference(text: &str) -> bool {
    matches!(text, "this" | "super") || (is_identifier_name(text) && !is_reserved(text))
}

/// `010` and `08` style numbers
fn is_legacy_octal(number: &str) -> bool {
    let bytes = number.as_bytes();
    bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit()
}

/// Offset of the first `\1`..`\9` or `\0` + digit escape in a string literal
fn octal_escape(literal: &str) -> Option<usize> {
    let bytes = literal.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'1'..=b'9') => return Some(i),
            Some(b'0') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_digit()) => return Some(i),
            _ => i += 2,
        }
    }
    None
}

/// A temporary name that no identifier in `src` can collide with
fn temp_prefix(src: &str) -> String {
    let mut prefix = String::from("_ref");
    while src.contains(prefix.as_str()) {
        prefix.push('$');
    }
    prefix
}

/// `callee(args)` called with an explicit receiver
fn call_with_this(callee: &str, this: &str, args: &str) -> String {
    let inner = &args[1..args.len() - 1];
    if inner.trim().is_empty() {
        format!("{}.call({})", callee, this)
    } else {
        format!("{}.call({}, {})", callee, this, inner)
    }
}
