use crate::ast::*;
use crate::diagnostics::{CompileError, CompileResult, Diagnostic};
use crate::position::{Span, DUMMY_SPAN};
use crate::tokens::{Keyword, Symbol, Token, TokenKind};
use smol_str::SmolStr;

/// Deepest nesting of blocks and expressions the parser accepts. Later
/// passes walk the tree recursively, so this also bounds their stack use.
pub const MAX_NESTING: usize = 100;

pub struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> CompileResult<Program> {
        let mut imports = Vec::new();
        let mut items = Vec::new();

        loop {
            self.skip_terminators();
            if self.is_eof() {
                break;
            }
            if self.peek_keyword(Keyword::Import) {
                self.parse_imports(&mut imports)?;
            } else if self.peek_keyword(Keyword::Var) {
                items.push(Item::Var(self.parse_var_decl()?));
            } else if self.peek_keyword(Keyword::Func) {
                items.push(Item::Function(self.parse_function_decl()?));
            } else {
                return Err(self.error_here("expected `import`, `var` or `func` declaration"));
            }
            self.expect_terminator("expected newline after declaration")?;
        }

        Ok(Program::new(imports, items))
    }

    fn parse_imports(&mut self, imports: &mut Vec<ImportDecl>) -> CompileResult<()> {
        self.expect_keyword(Keyword::Import)?;
        if self.eat_symbol(Symbol::LParen) {
            loop {
                self.skip_terminators();
                if self.eat_symbol(Symbol::RParen) {
                    return Ok(());
                }
                let span = self.current().span;
                let path = self.expect_string_literal("expected import path string")?;
                imports.push(ImportDecl { path, span });
            }
        }
        let span = self.current().span;
        let path = self.expect_string_literal("expected import path string")?;
        imports.push(ImportDecl { path, span });
        Ok(())
    }

    fn parse_var_decl(&mut self) -> CompileResult<VarDecl> {
        let start = self.expect_keyword(Keyword::Var)?.span;
        let name = self.expect_identifier("variable name")?;
        let ty = if self.peek_symbol(Symbol::Equals) {
            None
        } else {
            Some(self.parse_type_expr()?)
        };
        let value = if self.eat_symbol(Symbol::Equals) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(VarDecl {
            name,
            ty,
            value,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_function_decl(&mut self) -> CompileResult<FunctionDecl> {
        let start = self.expect_keyword(Keyword::Func)?.span;
        let name = self.expect_identifier("function name")?;
        let (params, return_type) = self.parse_signature()?;
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span: start,
        })
    }

    /// Parses `(a T, b, c U) R`. Consecutive names share the type that follows
    /// them.
    fn parse_signature(&mut self) -> CompileResult<(Vec<Parameter>, Option<TypeExpr>)> {
        self.expect_symbol(Symbol::LParen, "expected '(' to open parameter list")?;
        let mut params = Vec::new();
        let mut pending: Vec<(SmolStr, Span)> = Vec::new();
        while !self.peek_symbol(Symbol::RParen) {
            let span = self.current().span;
            let name = self.expect_identifier("parameter name")?;
            pending.push((name, span));
            if self.eat_symbol(Symbol::Comma) {
                continue;
            }
            if self.peek_symbol(Symbol::RParen) {
                break;
            }
            let ty = self.parse_type_expr()?;
            for (name, span) in pending.drain(..) {
                params.push(Parameter {
                    name,
                    ty: ty.clone(),
                    span,
                });
            }
            if !self.eat_symbol(Symbol::Comma) {
                break;
            }
        }
        if let Some((name, span)) = pending.first() {
            return Err(Diagnostic::error(format!("missing type for parameter `{name}`"))
                .with_code("E0100")
                .with_primary(*span, None)
                .into());
        }
        self.expect_symbol(Symbol::RParen, "expected ')' to close parameter list")?;
        let return_type = if self.peek_symbol(Symbol::LBrace) || self.peek_terminator() {
            None
        } else {
            Some(self.parse_type_expr()?)
        };
        Ok((params, return_type))
    }

    fn parse_type_expr(&mut self) -> CompileResult<TypeExpr> {
        let span = self.current().span;
        if self.eat_keyword(Keyword::Func) {
            self.expect_symbol(Symbol::LParen, "expected '(' in function type")?;
            let mut params = Vec::new();
            while !self.peek_symbol(Symbol::RParen) {
                params.push(self.parse_type_expr()?);
                if !self.eat_symbol(Symbol::Comma) {
                    break;
                }
            }
            self.expect_symbol(Symbol::RParen, "expected ')' in function type")?;
            let ret = if self.peek_type_start() {
                Some(Box::new(self.parse_type_expr()?))
            } else {
                None
            };
            return Ok(TypeExpr::Function {
                params,
                ret,
                span: span.to(self.prev_span()),
            });
        }
        let name = self.expect_identifier("type name")?;
        Ok(TypeExpr::Named(name, span))
    }

    fn peek_type_start(&self) -> bool {
        self.peek_keyword(Keyword::Func)
            || self.peek_token(|t| matches!(t.kind, TokenKind::Identifier(_)))
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        self.enter()?;
        let block = self.parse_block_inner();
        self.leave(1);
        block
    }

    fn parse_block_inner(&mut self) -> CompileResult<Block> {
        let open = self
            .expect_symbol(Symbol::LBrace, "expected '{' to open block")?
            .span;
        let mut statements = Vec::new();
        loop {
            self.skip_terminators();
            if self.peek_symbol(Symbol::RBrace) || self.is_eof() {
                break;
            }
            statements.push(self.parse_statement()?);
            if !self.peek_symbol(Symbol::RBrace) {
                self.expect_terminator("expected newline or ';' after statement")?;
            }
        }
        self.expect_symbol(Symbol::RBrace, "expected '}' to close block")?;
        Ok(Block::new(statements, open.to(self.prev_span())))
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        if self.peek_keyword(Keyword::Var) {
            return Ok(Stmt::Var(self.parse_var_decl()?));
        }
        if self.peek_keyword(Keyword::Return) {
            let span = self.expect_keyword(Keyword::Return)?.span;
            if self.peek_terminator() || self.peek_symbol(Symbol::RBrace) {
                return Ok(Stmt::Return(ReturnStmt { value: None, span }));
            }
            let value = self.parse_expression()?;
            return Ok(Stmt::Return(ReturnStmt {
                span: span.to(value.span()),
                value: Some(value),
            }));
        }
        if self.peek_keyword(Keyword::Break) {
            return Ok(Stmt::Break(self.expect_keyword(Keyword::Break)?.span));
        }
        if self.peek_keyword(Keyword::Continue) {
            return Ok(Stmt::Continue(self.expect_keyword(Keyword::Continue)?.span));
        }
        if self.peek_keyword(Keyword::If) {
            return Ok(Stmt::If(self.parse_if_statement()?));
        }
        if self.peek_keyword(Keyword::For) {
            return self.parse_for_statement();
        }
        if self.peek_symbol(Symbol::LBrace) {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        self.parse_simple_statement()
    }

    fn parse_simple_statement(&mut self) -> CompileResult<Stmt> {
        if let TokenKind::Identifier(name) = self.current().kind.clone() {
            let start = self.current().span;
            let next = self.tokens.get(self.index + 1).map(|t| &t.kind);
            let assign_op = match next {
                Some(TokenKind::Symbol(Symbol::Define)) => {
                    self.index += 2;
                    let value = self.parse_expression()?;
                    return Ok(Stmt::Define(DefineStmt {
                        name,
                        span: start.to(value.span()),
                        value,
                    }));
                }
                Some(TokenKind::Symbol(sym @ (Symbol::PlusPlus | Symbol::MinusMinus))) => {
                    let increment = *sym == Symbol::PlusPlus;
                    self.index += 2;
                    return Ok(Stmt::IncDec(IncDecStmt {
                        target: name,
                        increment,
                        span: start.to(self.prev_span()),
                    }));
                }
                Some(TokenKind::Symbol(Symbol::Equals)) => Some(None),
                Some(TokenKind::Symbol(Symbol::PlusEquals)) => Some(Some(BinaryOp::Add)),
                Some(TokenKind::Symbol(Symbol::MinusEquals)) => Some(Some(BinaryOp::Sub)),
                Some(TokenKind::Symbol(Symbol::StarEquals)) => Some(Some(BinaryOp::Mul)),
                Some(TokenKind::Symbol(Symbol::SlashEquals)) => Some(Some(BinaryOp::Div)),
                Some(TokenKind::Symbol(Symbol::PercentEquals)) => Some(Some(BinaryOp::Mod)),
                _ => None,
            };
            if let Some(op) = assign_op {
                self.index += 2;
                let value = self.parse_expression()?;
                return Ok(Stmt::Assign(AssignStmt {
                    target: name,
                    op,
                    span: start.to(value.span()),
                    value,
                }));
            }
        }
        Ok(Stmt::Expr(self.parse_expression()?))
    }

    fn parse_if_statement(&mut self) -> CompileResult<IfStmt> {
        let start = self.expect_keyword(Keyword::If)?.span;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        let mut else_branch = None;
        if self.peek_else() {
            self.skip_terminators();
            self.expect_keyword(Keyword::Else)?;
            if self.peek_keyword(Keyword::If) {
                self.enter()?;
                let nested = self.parse_if_statement();
                self.leave(1);
                let nested = nested?;
                let span = nested.span;
                else_branch = Some(Block::new(vec![Stmt::If(nested)], span));
            } else {
                else_branch = Some(self.parse_block()?);
            }
        }
        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.to(self.prev_span()),
        })
    }

    /// `else` may follow the closing brace directly or on the next line.
    fn peek_else(&self) -> bool {
        let mut at = self.index;
        while matches!(self.tokens.get(at).map(|t| &t.kind), Some(TokenKind::Newline)) {
            at += 1;
        }
        matches!(
            self.tokens.get(at).map(|t| &t.kind),
            Some(TokenKind::Keyword(Keyword::Else))
        )
    }

    fn parse_for_statement(&mut self) -> CompileResult<Stmt> {
        let start = self.expect_keyword(Keyword::For)?.span;
        if self.peek_symbol(Symbol::LBrace) {
            let body = self.parse_block()?;
            return Ok(Stmt::For(ForStmt {
                init: None,
                condition: None,
                post: None,
                span: start.to(body.span),
                body,
            }));
        }

        let init = if self.peek_symbol(Symbol::Semicolon) {
            None
        } else {
            Some(self.parse_simple_statement()?)
        };

        if self.eat_symbol(Symbol::Semicolon) {
            let condition = if self.peek_symbol(Symbol::Semicolon) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect_symbol(Symbol::Semicolon, "expected ';' after for loop condition")?;
            let post = if self.peek_symbol(Symbol::LBrace) {
                None
            } else {
                Some(Box::new(self.parse_simple_statement()?))
            };
            let body = self.parse_block()?;
            return Ok(Stmt::For(ForStmt {
                init: init.map(Box::new),
                condition,
                post,
                span: start.to(body.span),
                body,
            }));
        }

        match init {
            Some(Stmt::Expr(condition)) => {
                let body = self.parse_block()?;
                Ok(Stmt::For(ForStmt {
                    init: None,
                    condition: Some(condition),
                    post: None,
                    span: start.to(body.span),
                    body,
                }))
            }
            _ => Err(self.error_here("expected for loop condition")),
        }
    }

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.enter()?;
        let expr = self.parse_binary_expr(1);
        self.leave(1);
        expr
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expr()?;
        let mut chained = 0;

        loop {
            let (op, prec) = match self.current().kind {
                TokenKind::Symbol(Symbol::PipePipe) => (BinaryOp::Or, 1),
                TokenKind::Symbol(Symbol::AmpAmp) => (BinaryOp::And, 2),
                TokenKind::Symbol(Symbol::EqEq) => (BinaryOp::Eq, 3),
                TokenKind::Symbol(Symbol::NotEq) => (BinaryOp::NotEq, 3),
                TokenKind::Symbol(Symbol::Lt) => (BinaryOp::Lt, 3),
                TokenKind::Symbol(Symbol::Le) => (BinaryOp::Lte, 3),
                TokenKind::Symbol(Symbol::Gt) => (BinaryOp::Gt, 3),
                TokenKind::Symbol(Symbol::Ge) => (BinaryOp::Gte, 3),
                TokenKind::Symbol(Symbol::Plus) => (BinaryOp::Add, 4),
                TokenKind::Symbol(Symbol::Minus) => (BinaryOp::Sub, 4),
                TokenKind::Symbol(Symbol::Star) => (BinaryOp::Mul, 5),
                TokenKind::Symbol(Symbol::Slash) => (BinaryOp::Div, 5),
                TokenKind::Symbol(Symbol::Percent) => (BinaryOp::Mod, 5),
                _ => break,
            };

            if prec < min_prec {
                break;
            }

            self.advance();
            chained += 1;
            self.enter()?;
            let right = self.parse_binary_expr(prec + 1)?;
            let span = left.span().to(right.span());
            left = Expr::Binary(Box::new(BinaryExpr {
                op,
                left,
                right,
                span,
            }));
        }

        self.leave(chained);
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> CompileResult<Expr> {
        let op = if self.peek_symbol(Symbol::Minus) {
            UnaryOp::Neg
        } else if self.peek_symbol(Symbol::Bang) {
            UnaryOp::Not
        } else if self.eat_symbol(Symbol::Plus) {
            self.enter()?;
            let expr = self.parse_unary_expr();
            self.leave(1);
            return expr;
        } else {
            return self.parse_postfix_expr();
        };
        let start = self.advance().span;
        self.enter()?;
        let expr = self.parse_unary_expr()?;
        self.leave(1);
        Ok(Expr::Unary(Box::new(UnaryExpr {
            op,
            span: start.to(expr.span()),
            expr,
        })))
    }

    fn parse_postfix_expr(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary_expr()?;
        let mut chained = 0;
        loop {
            if self.eat_symbol(Symbol::LParen) {
                chained += 1;
                self.enter()?;
                let args = self.parse_argument_list()?;
                self.expect_symbol(Symbol::RParen, "expected ')' after arguments")?;
                let span = expr.span().to(self.prev_span());
                expr = Expr::Call(Box::new(CallExpr {
                    function: expr,
                    args,
                    span,
                }));
                continue;
            }
            if self.peek_symbol(Symbol::Dot) {
                let target = match &expr {
                    Expr::Identifier(name, _) => name.clone(),
                    _ => return Err(self.error_here("selector requires a package name")),
                };
                self.advance();
                let member = self.expect_identifier("package member name")?;
                let span = expr.span().to(self.prev_span());
                expr = Expr::Selector(Box::new(SelectorExpr {
                    target,
                    member,
                    span,
                }));
                continue;
            }
            break;
        }
        self.leave(chained);
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> CompileResult<Expr> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::BoolLiteral(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(*value), token.span))
            }
            TokenKind::IntLiteral(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Int(*value), token.span))
            }
            TokenKind::FloatLiteral(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(*value), token.span))
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(value.clone()), token.span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier(name.clone(), token.span))
            }
            TokenKind::Symbol(Symbol::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_symbol(Symbol::RParen, "expected ')' to close parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::Keyword(Keyword::Func) => self.parse_func_literal(),
            _ => Err(self.error_here(format!("unexpected {} in expression", token.kind))),
        }
    }

    fn parse_func_literal(&mut self) -> CompileResult<Expr> {
        let start = self.expect_keyword(Keyword::Func)?.span;
        let (params, return_type) = self.parse_signature()?;
        let body = self.parse_block()?;
        Ok(Expr::Func(Box::new(FuncLit {
            params,
            return_type,
            span: start.to(body.span),
            body,
        })))
    }

    fn parse_argument_list(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.peek_symbol(Symbol::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat_symbol(Symbol::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn peek_token<F>(&self, predicate: F) -> bool
    where
        F: FnOnce(&Token) -> bool,
    {
        self.tokens.get(self.index).map_or(false, predicate)
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.peek_token(|t| matches!(t.kind, TokenKind::Keyword(k) if k == keyword))
    }

    fn peek_symbol(&self, symbol: Symbol) -> bool {
        self.peek_token(|t| matches!(t.kind, TokenKind::Symbol(s) if s == symbol))
    }

    fn peek_terminator(&self) -> bool {
        self.peek_token(|t| {
            matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Eof | TokenKind::Symbol(Symbol::Semicolon)
            )
        })
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> CompileResult<&Token> {
        if self.peek_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected keyword `{keyword}`")))
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol, message: &str) -> CompileResult<&Token> {
        if self.peek_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn eat_symbol(&mut self, symbol: Symbol) -> bool {
        if self.peek_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self, what: &str) -> CompileResult<SmolStr> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        Err(self.error_here(format!("expected {what}")))
    }

    fn expect_string_literal(&mut self, message: &str) -> CompileResult<String> {
        if let TokenKind::StringLiteral(value) = &self.current().kind {
            let value = value.clone();
            self.advance();
            return Ok(value);
        }
        Err(self.error_here(message))
    }

    fn expect_terminator(&mut self, message: &str) -> CompileResult<()> {
        if self.is_eof() {
            return Ok(());
        }
        if self.peek_terminator() {
            self.advance();
            return Ok(());
        }
        Err(self.error_here(message))
    }

    fn skip_terminators(&mut self) {
        while self.peek_token(|t| {
            matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Symbol(Symbol::Semicolon)
            )
        }) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.index];
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn prev_span(&self) -> Span {
        if self.index == 0 {
            DUMMY_SPAN
        } else {
            self.tokens[self.index - 1].span
        }
    }

    fn enter(&mut self) -> CompileResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error_here("expression nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        let token = self.current();
        Diagnostic::error(message)
            .with_code("E0100")
            .with_primary(token.span, Some(format!("found {}", token.kind)))
            .into()
    }
}

pub fn parse(tokens: &[Token]) -> CompileResult<Program> {
    if tokens.is_empty() {
        return Err(CompileError::error("no tokens to parse"));
    }
    let mut parser = Parser::new(tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::position::FileId;
    use crate::source::SourceFile;

    fn parse_source(text: &str) -> CompileResult<Program> {
        let file = SourceFile::new(FileId(0), "test", text);
        let tokens = lex(&file)?;
        parse(&tokens)
    }

    fn entry_statements(program: &Program) -> &[Stmt] {
        match program.items.last() {
            Some(Item::Function(func)) => &func.body.statements,
            _ => panic!("expected trailing function"),
        }
    }

    #[test]
    fn parses_declarations_and_entry_point() {
        let program = parse_source(
            r#"
import "fmt"
import (
    "strings"
    "math/rand"
)
var A int = 0
var B float64 = 10.5
var IF = func(cond bool, ok, nok string) string { if cond { return ok } else { return nok } }
func evaluate() {
    ACasted := float64(A)
    C := ACasted + B
    return C
}
"#,
        )
        .expect("program should parse");
        assert_eq!(program.imports.len(), 3);
        assert_eq!(program.imports[2].binding(), "rand");
        assert_eq!(program.items.len(), 4);
        match &program.items[2] {
            Item::Var(VarDecl {
                value: Some(Expr::Func(func)),
                ..
            }) => {
                let names: Vec<_> = func.params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, ["cond", "ok", "nok"]);
                assert!(matches!(&func.params[1].ty, TypeExpr::Named(n, _) if n == "string"));
            }
            other => panic!("unexpected item {other:?}"),
        }
        assert_eq!(entry_statements(&program).len(), 3);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse_source("func evaluate() {\nreturn 1 + 2 * 3\n}").expect("parse");
        match &entry_statements(&program)[0] {
            Stmt::Return(ReturnStmt {
                value: Some(Expr::Binary(binary)),
                ..
            }) => {
                assert_eq!(binary.op, BinaryOp::Add);
                assert!(matches!(&binary.right, Expr::Binary(b) if b.op == BinaryOp::Mul));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn parses_all_for_forms() {
        let program = parse_source(
            "func evaluate() {\n\
             i := 0\n\
             for i < 3 { i++ }\n\
             for j := 0; j < 2; j += 1 { i-- }\n\
             for { break }\n\
             return i\n\
             }",
        )
        .expect("parse");
        let statements = entry_statements(&program);
        assert!(matches!(&statements[1], Stmt::For(f) if f.init.is_none() && f.condition.is_some()));
        assert!(matches!(&statements[2], Stmt::For(f) if f.init.is_some() && f.post.is_some()));
        assert!(matches!(&statements[3], Stmt::For(f) if f.condition.is_none()));
    }

    #[test]
    fn else_may_start_on_next_line() {
        let program = parse_source(
            "func evaluate() {\nif true {\nreturn 1\n}\nelse if false {\nreturn 2\n} else {\nreturn 3\n}\n}",
        )
        .expect("parse");
        match &entry_statements(&program)[0] {
            Stmt::If(stmt) => {
                let else_block = stmt.else_branch.as_ref().expect("else branch");
                assert!(matches!(&else_block.statements[0], Stmt::If(nested) if nested.else_branch.is_some()));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn reports_missing_parameter_type() {
        let err = parse_source("var f = func(a, b) int { return 1 }").expect_err("should fail");
        assert_eq!(err.message(), "missing type for parameter `a`");
    }

    #[test]
    fn reports_unexpected_token() {
        let err = parse_source("func evaluate() {\nreturn 1 +\n}").expect_err("should fail");
        assert!(err.message().starts_with("unexpected"));
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let depth = 10_000;
        let sources = [
            format!("func evaluate() {{\nreturn {}1{}\n}}", "(".repeat(depth), ")".repeat(depth)),
            format!("func evaluate() {{\nreturn {}1\n}}", "- ".repeat(depth)),
            format!("func evaluate() {{\nreturn 1{}\n}}", "+1".repeat(depth)),
            format!("func evaluate() {{\n{}\n{}\n}}", "{".repeat(depth), "}".repeat(depth)),
            format!("func evaluate() {{\nreturn f{}\n}}", "()".repeat(depth)),
        ];
        for source in &sources {
            let err = parse_source(source).expect_err("too deep");
            assert_eq!(err.message(), "expression nesting too deep");
            assert_eq!(err.diagnostic().and_then(|d| d.code.as_deref()), Some("E0100"));
        }
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let depth = MAX_NESTING / 2;
        let source = format!(
            "func evaluate() {{\nreturn {}1{}\n}}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        assert!(parse_source(&source).is_ok());
    }
}
