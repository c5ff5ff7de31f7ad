//! Recursive-descent parser producing the byte-ranged syntax tree.
//!
//! Covers the statement and expression grammar the directive scanner needs to
//! traverse, including the constructs real-world sources put directive calls
//! inside (conditionals, loops, switch, try/catch, nested functions). Missing
//! semicolons are handled with the usual automatic-semicolon-insertion rules:
//! a statement may end at a line terminator, a closing brace, or end of input.

use crate::{
    ast::{LiteralValue, Node, NodeKind},
    error::ParseError,
    lexer::{self, Kw, Token, TokenKind},
};

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", ">>>=", "&=", "|=", "^=",
];

/// Parse a whole source fragment into a `Program` node.
pub fn parse_program(source: &str) -> Result<Node, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser {
        src: source,
        tokens,
        pos: 0,
    };
    let mut body = Vec::new();
    while !matches!(parser.kind(), TokenKind::Eof) {
        body.push(parser.parse_statement()?);
    }
    Ok(Node::new(NodeKind::Program(body), (0, source.len())))
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_ahead(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn at_punct(&self, p: &str) -> bool {
        matches!(self.kind(), TokenKind::Punct(q) if *q == p)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), ParseError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected `{p}`")))
        }
    }

    fn at_kw(&self, kw: Kw) -> bool {
        matches!(self.kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_kw(&mut self, kw: Kw) -> bool {
        if self.at_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_kw(&mut self, kw: Kw) -> Result<(), ParseError> {
        if self.eat_kw(kw) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected `{kw:?}` keyword").to_lowercase()))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.peek().start, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let (line, column) = lexer::offset_to_line_col(self.src, offset);
        ParseError {
            offset,
            line,
            column,
            message: message.into(),
        }
    }

    fn token_text(&self, token: &Token) -> String {
        self.src[token.start..token.end].to_owned()
    }

    /// Consume a statement terminator, inserting one when the grammar allows:
    /// before `}`, at end of input, or after a line terminator.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat_punct(";") {
            return Ok(());
        }
        if self.at_punct("}")
            || matches!(self.kind(), TokenKind::Eof)
            || self.peek().newline_before
        {
            return Ok(());
        }
        Err(self.error_here("expected `;`"))
    }

    fn expect_ident(&mut self) -> Result<(String, usize, usize), ParseError> {
        match self.kind() {
            TokenKind::Ident(_) => {
                let token = self.advance();
                let TokenKind::Ident(name) = token.kind else {
                    unreachable!()
                };
                Ok((name, token.start, token.end))
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.kind() {
            TokenKind::Punct("{") => self.parse_block(),
            TokenKind::Punct(";") => {
                let token = self.advance();
                Ok(Node::new(NodeKind::Empty, (token.start, token.end)))
            }
            TokenKind::Keyword(Kw::Var) => {
                let decl = self.parse_var_declaration(true)?;
                self.consume_semicolon()?;
                Ok(decl)
            }
            TokenKind::Keyword(Kw::Function) => self.parse_function(true),
            TokenKind::Keyword(Kw::If) => self.parse_if(),
            TokenKind::Keyword(Kw::For) => self.parse_for(),
            TokenKind::Keyword(Kw::While) => self.parse_while(),
            TokenKind::Keyword(Kw::Do) => self.parse_do_while(),
            TokenKind::Keyword(Kw::Switch) => self.parse_switch(),
            TokenKind::Keyword(Kw::Try) => self.parse_try(),
            TokenKind::Keyword(Kw::Throw) => {
                let start = self.advance().start;
                let argument = self.parse_expression(true)?;
                self.consume_semicolon()?;
                let end = argument.range.1;
                Ok(Node::new(NodeKind::Throw(Box::new(argument)), (start, end)))
            }
            TokenKind::Keyword(Kw::Return) => {
                let start = self.advance().start;
                let argument = if self.statement_boundary() {
                    None
                } else {
                    Some(Box::new(self.parse_expression(true)?))
                };
                self.consume_semicolon()?;
                let end = argument.as_ref().map_or(start + 6, |a| a.range.1);
                Ok(Node::new(NodeKind::Return(argument), (start, end)))
            }
            TokenKind::Keyword(Kw::Break) => self.parse_jump(true),
            TokenKind::Keyword(Kw::Continue) => self.parse_jump(false),
            TokenKind::Keyword(Kw::With) => self.parse_with(),
            TokenKind::Keyword(Kw::Debugger) => {
                let token = self.advance();
                self.consume_semicolon()?;
                Ok(Node::new(NodeKind::Empty, (token.start, token.end)))
            }
            TokenKind::Ident(_) if matches!(self.peek_ahead(1).kind, TokenKind::Punct(":")) => {
                let (label, start, _) = self.expect_ident()?;
                self.expect_punct(":")?;
                let body = self.parse_statement()?;
                let end = body.range.1;
                Ok(Node::new(
                    NodeKind::Labeled {
                        label,
                        body: Box::new(body),
                    },
                    (start, end),
                ))
            }
            _ => {
                let expr = self.parse_expression(true)?;
                self.consume_semicolon()?;
                let range = expr.range;
                Ok(Node::new(NodeKind::ExpressionStmt(Box::new(expr)), range))
            }
        }
    }

    /// Whether the current position terminates a restricted production
    /// (`return` with no argument).
    fn statement_boundary(&self) -> bool {
        self.at_punct(";")
            || self.at_punct("}")
            || matches!(self.kind(), TokenKind::Eof)
            || self.peek().newline_before
    }

    fn parse_block(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().start;
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.at_punct("}") {
            if matches!(self.kind(), TokenKind::Eof) {
                return Err(self.error_at(start, "unclosed block"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect_punct("}")?;
        Ok(Node::new(NodeKind::Block(body), (start, self.prev_end())))
    }

    /// `var` declarator list, without the trailing semicolon (shared with
    /// `for` initializers).
    fn parse_var_declaration(&mut self, allow_in: bool) -> Result<Node, ParseError> {
        let start = self.peek().start;
        self.expect_kw(Kw::Var)?;
        let mut declarators = Vec::new();
        loop {
            let (name, decl_start, mut decl_end) = self.expect_ident()?;
            let init = if self.eat_punct("=") {
                let value = self.parse_assignment(allow_in)?;
                decl_end = value.range.1;
                Some(Box::new(value))
            } else {
                None
            };
            declarators.push(Node::new(
                NodeKind::VarDeclarator { name, init },
                (decl_start, decl_end),
            ));
            if !self.eat_punct(",") {
                break;
            }
        }
        let end = declarators.last().map_or(start, |d| d.range.1);
        Ok(Node::new(NodeKind::VarDeclaration(declarators), (start, end)))
    }

    fn parse_function(&mut self, declaration: bool) -> Result<Node, ParseError> {
        let start = self.peek().start;
        self.expect_kw(Kw::Function)?;
        let name = if matches!(self.kind(), TokenKind::Ident(_)) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };
        if declaration && name.is_none() {
            return Err(self.error_here("function declaration requires a name"));
        }
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.at_punct(")") {
            loop {
                params.push(self.expect_ident()?.0);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        let body = self.parse_block()?;
        let range = (start, body.range.1);
        let kind = if declaration {
            NodeKind::FunctionDecl {
                name: name.unwrap_or_default(),
                params,
                body: Box::new(body),
            }
        } else {
            NodeKind::FunctionExpr {
                name,
                params,
                body: Box::new(body),
            }
        };
        Ok(Node::new(kind, range))
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat_kw(Kw::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let end = alternate
            .as_ref()
            .map_or(consequent.range.1, |a| a.range.1);
        Ok(Node::new(
            NodeKind::If {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            },
            (start, end),
        ))
    }

    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        self.expect_punct("(")?;

        let init = if self.at_punct(";") {
            None
        } else if self.at_kw(Kw::Var) {
            let decl = self.parse_var_declaration(false)?;
            if self.at_kw(Kw::In) {
                return self.parse_for_in_rest(start, decl);
            }
            Some(Box::new(decl))
        } else {
            let expr = self.parse_expression(false)?;
            if self.at_kw(Kw::In) {
                return self.parse_for_in_rest(start, expr);
            }
            Some(Box::new(expr))
        };
        self.expect_punct(";")?;

        let test = if self.at_punct(";") {
            None
        } else {
            Some(Box::new(self.parse_expression(true)?))
        };
        self.expect_punct(";")?;
        let update = if self.at_punct(")") {
            None
        } else {
            Some(Box::new(self.parse_expression(true)?))
        };
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        let end = body.range.1;
        Ok(Node::new(
            NodeKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            (start, end),
        ))
    }

    fn parse_for_in_rest(&mut self, start: usize, left: Node) -> Result<Node, ParseError> {
        self.expect_kw(Kw::In)?;
        let right = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        let end = body.range.1;
        Ok(Node::new(
            NodeKind::ForIn {
                left: Box::new(left),
                right: Box::new(right),
                body: Box::new(body),
            },
            (start, end),
        ))
    }

    fn parse_while(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        let end = body.range.1;
        Ok(Node::new(
            NodeKind::While {
                test: Box::new(test),
                body: Box::new(body),
            },
            (start, end),
        ))
    }

    fn parse_do_while(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        let body = self.parse_statement()?;
        self.expect_kw(Kw::While)?;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        self.eat_punct(";");
        Ok(Node::new(
            NodeKind::DoWhile {
                body: Box::new(body),
                test: Box::new(test),
            },
            (start, self.prev_end()),
        ))
    }

    fn parse_switch(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let discriminant = self.parse_expression(true)?;
        self.expect_punct(")")?;
        self.expect_punct("{")?;
        let mut cases = Vec::new();
        while !self.at_punct("}") {
            let case_start = self.peek().start;
            let test = if self.eat_kw(Kw::Case) {
                Some(Box::new(self.parse_expression(true)?))
            } else {
                self.expect_kw(Kw::Default)?;
                None
            };
            self.expect_punct(":")?;
            let mut consequent = Vec::new();
            while !self.at_punct("}")
                && !self.at_kw(Kw::Case)
                && !self.at_kw(Kw::Default)
            {
                if matches!(self.kind(), TokenKind::Eof) {
                    return Err(self.error_at(start, "unclosed switch statement"));
                }
                consequent.push(self.parse_statement()?);
            }
            cases.push(Node::new(
                NodeKind::SwitchCase { test, consequent },
                (case_start, self.prev_end()),
            ));
        }
        self.expect_punct("}")?;
        Ok(Node::new(
            NodeKind::Switch {
                discriminant: Box::new(discriminant),
                cases,
            },
            (start, self.prev_end()),
        ))
    }

    fn parse_try(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        let block = self.parse_block()?;
        let handler = if self.at_kw(Kw::Catch) {
            let catch_start = self.advance().start;
            self.expect_punct("(")?;
            let (param, ..) = self.expect_ident()?;
            self.expect_punct(")")?;
            let body = self.parse_block()?;
            let end = body.range.1;
            Some(Box::new(Node::new(
                NodeKind::Catch {
                    param,
                    body: Box::new(body),
                },
                (catch_start, end),
            )))
        } else {
            None
        };
        let finalizer = if self.eat_kw(Kw::Finally) {
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(start, "missing catch or finally clause"));
        }
        Ok(Node::new(
            NodeKind::Try {
                block: Box::new(block),
                handler,
                finalizer,
            },
            (start, self.prev_end()),
        ))
    }

    fn parse_jump(&mut self, is_break: bool) -> Result<Node, ParseError> {
        let token = self.advance();
        let label = if matches!(self.kind(), TokenKind::Ident(_)) && !self.peek().newline_before {
            Some(self.expect_ident()?.0)
        } else {
            None
        };
        self.consume_semicolon()?;
        let kind = if is_break {
            NodeKind::Break(label)
        } else {
            NodeKind::Continue(label)
        };
        Ok(Node::new(kind, (token.start, self.prev_end())))
    }

    fn parse_with(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let object = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        let end = body.range.1;
        Ok(Node::new(
            NodeKind::With {
                object: Box::new(object),
                body: Box::new(body),
            },
            (start, end),
        ))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self, allow_in: bool) -> Result<Node, ParseError> {
        let first = self.parse_assignment(allow_in)?;
        if !self.at_punct(",") {
            return Ok(first);
        }
        let start = first.range.0;
        let mut exprs = vec![first];
        while self.eat_punct(",") {
            exprs.push(self.parse_assignment(allow_in)?);
        }
        let end = exprs.last().map_or(start, |e| e.range.1);
        Ok(Node::new(NodeKind::Sequence(exprs), (start, end)))
    }

    fn parse_assignment(&mut self, allow_in: bool) -> Result<Node, ParseError> {
        let left = self.parse_conditional(allow_in)?;
        let op = match self.kind() {
            TokenKind::Punct(p) if ASSIGN_OPS.contains(p) => *p,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_assignment(allow_in)?;
        let range = (left.range.0, right.range.1);
        Ok(Node::new(
            NodeKind::Assignment {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            range,
        ))
    }

    fn parse_conditional(&mut self, allow_in: bool) -> Result<Node, ParseError> {
        let test = self.parse_binary(1, allow_in)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment(true)?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment(allow_in)?;
        let range = (test.range.0, alternate.range.1);
        Ok(Node::new(
            NodeKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            range,
        ))
    }

    fn binary_op(&self, allow_in: bool) -> Option<(u8, &'static str, bool)> {
        let (prec, op, logical) = match self.kind() {
            TokenKind::Punct(p @ "||") => (1, *p, true),
            TokenKind::Punct(p @ "&&") => (2, *p, true),
            TokenKind::Punct(p @ "|") => (3, *p, false),
            TokenKind::Punct(p @ "^") => (4, *p, false),
            TokenKind::Punct(p @ "&") => (5, *p, false),
            TokenKind::Punct(p @ ("==" | "!=" | "===" | "!==")) => (6, *p, false),
            TokenKind::Punct(p @ ("<" | ">" | "<=" | ">=")) => (7, *p, false),
            TokenKind::Keyword(Kw::Instanceof) => (7, "instanceof", false),
            TokenKind::Keyword(Kw::In) if allow_in => (7, "in", false),
            TokenKind::Punct(p @ ("<<" | ">>" | ">>>")) => (8, *p, false),
            TokenKind::Punct(p @ ("+" | "-")) => (9, *p, false),
            TokenKind::Punct(p @ ("*" | "/" | "%")) => (10, *p, false),
            _ => return None,
        };
        Some((prec, op, logical))
    }

    fn parse_binary(&mut self, min_prec: u8, allow_in: bool) -> Result<Node, ParseError> {
        let mut left = self.parse_unary(allow_in)?;
        while let Some((prec, op, logical)) = self.binary_op(allow_in) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1, allow_in)?;
            let range = (left.range.0, right.range.1);
            let kind = if logical {
                NodeKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            } else {
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            };
            left = Node::new(kind, range);
        }
        Ok(left)
    }

    fn parse_unary(&mut self, allow_in: bool) -> Result<Node, ParseError> {
        let op = match self.kind() {
            TokenKind::Punct(p @ ("!" | "~" | "+" | "-")) => Some(*p),
            TokenKind::Keyword(Kw::Delete) => Some("delete"),
            TokenKind::Keyword(Kw::Void) => Some("void"),
            TokenKind::Keyword(Kw::Typeof) => Some("typeof"),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().start;
            let argument = self.parse_unary(allow_in)?;
            let range = (start, argument.range.1);
            return Ok(Node::new(
                NodeKind::Unary {
                    op,
                    argument: Box::new(argument),
                },
                range,
            ));
        }
        if let TokenKind::Punct(p @ ("++" | "--")) = self.kind() {
            let op = *p;
            let start = self.advance().start;
            let argument = self.parse_unary(allow_in)?;
            let range = (start, argument.range.1);
            return Ok(Node::new(
                NodeKind::Update {
                    op,
                    prefix: true,
                    argument: Box::new(argument),
                },
                range,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let expr = self.parse_lhs()?;
        // No line terminator is allowed before a postfix operator.
        if let TokenKind::Punct(p @ ("++" | "--")) = self.kind() {
            if !self.peek().newline_before {
                let op = *p;
                let end = self.advance().end;
                let range = (expr.range.0, end);
                return Ok(Node::new(
                    NodeKind::Update {
                        op,
                        prefix: false,
                        argument: Box::new(expr),
                    },
                    range,
                ));
            }
        }
        Ok(expr)
    }

    fn parse_lhs(&mut self) -> Result<Node, ParseError> {
        let expr = if self.at_kw(Kw::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_suffixes(expr, true)
    }

    fn parse_new(&mut self) -> Result<Node, ParseError> {
        let start = self.advance().start;
        let base = if self.at_kw(Kw::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        // Member accesses bind tighter than the `new` argument list.
        let callee = self.parse_suffixes(base, false)?;
        let arguments = if self.at_punct("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Node::new(
            NodeKind::New {
                callee: Box::new(callee),
                arguments,
            },
            (start, self.prev_end()),
        ))
    }

    fn parse_suffixes(&mut self, mut expr: Node, allow_call: bool) -> Result<Node, ParseError> {
        loop {
            if self.eat_punct(".") {
                let token = self.advance();
                if !matches!(token.kind, TokenKind::Ident(_) | TokenKind::Keyword(_)) {
                    return Err(self.error_at(token.start, "expected property name"));
                }
                let property = Node::new(
                    NodeKind::Identifier(self.token_text(&token)),
                    (token.start, token.end),
                );
                let range = (expr.range.0, token.end);
                expr = Node::new(
                    NodeKind::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: false,
                    },
                    range,
                );
            } else if self.at_punct("[") {
                self.advance();
                let property = self.parse_expression(true)?;
                self.expect_punct("]")?;
                let range = (expr.range.0, self.prev_end());
                expr = Node::new(
                    NodeKind::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                    },
                    range,
                );
            } else if allow_call && self.at_punct("(") {
                let arguments = self.parse_arguments()?;
                let range = (expr.range.0, self.prev_end());
                expr = Node::new(
                    NodeKind::Call {
                        callee: Box::new(expr),
                        arguments,
                    },
                    range,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        self.expect_punct("(")?;
        let mut arguments = Vec::new();
        if !self.at_punct(")") {
            loop {
                arguments.push(self.parse_assignment(true)?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match self.kind().clone() {
            TokenKind::Punct("(") => {
                self.advance();
                let expr = self.parse_expression(true)?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Identifier(name),
                    (token.start, token.end),
                ))
            }
            TokenKind::Number(value) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Number(value)),
                    (token.start, token.end),
                ))
            }
            TokenKind::Str(value) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Str(value)),
                    (token.start, token.end),
                ))
            }
            TokenKind::Regex(value) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Regex(value)),
                    (token.start, token.end),
                ))
            }
            TokenKind::Keyword(Kw::True) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Bool(true)),
                    (token.start, token.end),
                ))
            }
            TokenKind::Keyword(Kw::False) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Bool(false)),
                    (token.start, token.end),
                ))
            }
            TokenKind::Keyword(Kw::Null) => {
                let token = self.advance();
                Ok(Node::new(
                    NodeKind::Literal(LiteralValue::Null),
                    (token.start, token.end),
                ))
            }
            TokenKind::Keyword(Kw::This) => {
                let token = self.advance();
                Ok(Node::new(NodeKind::This, (token.start, token.end)))
            }
            TokenKind::Keyword(Kw::Function) => self.parse_function(false),
            TokenKind::Punct("[") => self.parse_array(),
            TokenKind::Punct("{") => self.parse_object(),
            _ => Err(self.error_here("unexpected token")),
        }
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().start;
        self.expect_punct("[")?;
        let mut elements = Vec::new();
        while !self.at_punct("]") {
            // Elision: a bare comma contributes no element.
            if self.eat_punct(",") {
                continue;
            }
            elements.push(self.parse_assignment(true)?);
            if !self.at_punct("]") {
                self.expect_punct(",")?;
            }
        }
        self.expect_punct("]")?;
        Ok(Node::new(
            NodeKind::Array(elements),
            (start, self.prev_end()),
        ))
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().start;
        self.expect_punct("{")?;
        let mut properties = Vec::new();
        while !self.at_punct("}") {
            let key_token = self.advance();
            let key = match &key_token.kind {
                TokenKind::Ident(_) | TokenKind::Keyword(_) | TokenKind::Number(_) => {
                    self.token_text(&key_token)
                }
                TokenKind::Str(s) => s.clone(),
                _ => return Err(self.error_at(key_token.start, "expected property key")),
            };
            self.expect_punct(":")?;
            let value = self.parse_assignment(true)?;
            let range = (key_token.start, value.range.1);
            properties.push(Node::new(
                NodeKind::Property {
                    key,
                    value: Box::new(value),
                },
                range,
            ));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(Node::new(
            NodeKind::Object(properties),
            (start, self.prev_end()),
        ))
    }
}
