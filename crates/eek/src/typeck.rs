use crate::ast::*;
use crate::diagnostics::{CompileError, CompileResult, Diagnostic};
use crate::position::Span;
use crate::stdlib;
use crate::types::{resolve_type_expr, Builtin, Type, TypeEnvironment, TypeInfo};
use smol_str::SmolStr;
use std::collections::HashSet;

enum ReturnMode {
    Declared(Type),
    /// Entry point without a declared result: every `return` is recorded and
    /// unified once the body has been checked.
    Infer(Vec<InferredReturn>),
}

struct InferredReturn {
    ty: Type,
    span: Span,
    untyped: Vec<Span>,
}

struct FunctionContext {
    returns: ReturnMode,
    loops: usize,
}

pub struct TypeChecker {
    env: TypeEnvironment,
    info: TypeInfo,
    entry_point: SmolStr,
    functions: Vec<FunctionContext>,
}

impl TypeChecker {
    pub fn new(entry_point: impl Into<SmolStr>) -> Self {
        let mut env = TypeEnvironment::new();
        for builtin in Builtin::ALL {
            env.insert(builtin.name().into(), Type::Builtin(builtin));
        }
        env.push_scope();
        Self {
            env,
            info: TypeInfo::default(),
            entry_point: entry_point.into(),
            functions: Vec::new(),
        }
    }

    pub fn check_program(mut self, program: &Program) -> CompileResult<TypeInfo> {
        let mut declared = HashSet::new();
        for import in &program.imports {
            if !stdlib::package_exists(&import.path) {
                return Err(error_at(
                    import.span,
                    format!("package {} is not in std", import.path),
                ));
            }
            let binding = SmolStr::from(import.binding());
            if !declared.insert(binding.clone()) {
                return Err(error_at(import.span, format!("{binding} redeclared in this block")));
            }
            self.env.insert(binding, Type::Package(import.path.as_str().into()));
        }

        for item in &program.items {
            let (name, span) = match item {
                Item::Var(var) => (&var.name, var.span),
                Item::Function(func) => (&func.name, func.span),
            };
            if !declared.insert(name.clone()) {
                return Err(error_at(span, format!("{name} redeclared in this block")));
            }
            if let Item::Function(func) = item {
                if func.name != self.entry_point {
                    let ty = self.function_type(&func.params, func.return_type.as_ref())?;
                    self.env.insert(func.name.clone(), ty);
                }
            }
        }

        // Package-level variables first, so function bodies may refer to any of them.
        for item in &program.items {
            if let Item::Var(var) = item {
                self.check_var_decl(var)?;
            }
        }

        let has_entry = program
            .items
            .iter()
            .any(|item| matches!(item, Item::Function(func) if func.name == self.entry_point));
        if !has_entry {
            return Err(CompileError::error(format!(
                "function {} is undeclared",
                self.entry_point
            )));
        }

        for item in &program.items {
            if let Item::Function(func) = item {
                if func.name == self.entry_point {
                    self.check_entry_point(func)?;
                } else {
                    let ret = match &func.return_type {
                        Some(ty) => resolve_type_expr(ty)?,
                        None => Type::Void,
                    };
                    self.check_function_body(&func.params, ret, &func.body)?;
                }
            }
        }

        Ok(self.info)
    }

    fn function_type(
        &self,
        params: &[Parameter],
        return_type: Option<&TypeExpr>,
    ) -> CompileResult<Type> {
        let params = params
            .iter()
            .map(|param| resolve_type_expr(&param.ty))
            .collect::<CompileResult<Vec<_>>>()?;
        let ret = match return_type {
            Some(ty) => resolve_type_expr(ty)?,
            None => Type::Void,
        };
        Ok(Type::function(params, ret))
    }

    fn check_entry_point(&mut self, func: &FunctionDecl) -> CompileResult<()> {
        if let Some(param) = func.params.first() {
            return Err(error_at(
                param.span,
                format!("func {} must have no arguments", func.name),
            ));
        }
        let returns = match &func.return_type {
            Some(ty) => {
                let ret = resolve_type_expr(ty)?;
                if ret == Type::Void {
                    return Err(error_at(ty.span(), "entry point must return a value"));
                }
                ReturnMode::Declared(ret)
            }
            None => ReturnMode::Infer(Vec::new()),
        };
        let context = self.check_function_with(&[], returns, &func.body)?;
        let ty = match context.returns {
            ReturnMode::Declared(ret) => ret,
            ReturnMode::Infer(returns) => self.unify_returns(&func.name, func.span, returns)?,
        };
        self.info.entry_return = Some(ty);
        Ok(())
    }

    fn unify_returns(
        &mut self,
        name: &SmolStr,
        span: Span,
        returns: Vec<InferredReturn>,
    ) -> CompileResult<Type> {
        let Some(first) = returns.first() else {
            return Err(error_at(span, "missing return"));
        };
        if let Some(other) = returns.iter().find(|ret| ret.ty != first.ty) {
            let widens = returns
                .iter()
                .all(|ret| ret.ty == Type::Float || (ret.ty == Type::Int && !ret.untyped.is_empty()));
            if !widens {
                return Err(error_at(
                    other.span,
                    format!(
                        "inconsistent result types in {name}: {} and {}",
                        first.ty, other.ty
                    ),
                ));
            }
            for ret in returns.iter().filter(|ret| ret.ty == Type::Int) {
                for literal in &ret.untyped {
                    self.info.mark_float_literal(*literal);
                }
            }
            return Ok(Type::Float);
        }
        Ok(first.ty.clone())
    }

    fn check_function_body(&mut self, params: &[Parameter], ret: Type, body: &Block) -> CompileResult<()> {
        self.check_function_with(params, ReturnMode::Declared(ret), body)?;
        Ok(())
    }

    fn check_function_with(
        &mut self,
        params: &[Parameter],
        returns: ReturnMode,
        body: &Block,
    ) -> CompileResult<FunctionContext> {
        let needs_return = !matches!(returns, ReturnMode::Declared(Type::Void));
        self.functions.push(FunctionContext { returns, loops: 0 });
        self.env.push_scope();
        let result = self.check_parameters_and_body(params, body);
        self.env.pop_scope();
        let context = self.functions.pop();
        result?;
        let context = context.ok_or_else(|| CompileError::error("function context underflow"))?;
        if needs_return && !block_terminates(body) {
            return Err(error_at(closing_brace(body.span), "missing return"));
        }
        Ok(context)
    }

    fn check_parameters_and_body(&mut self, params: &[Parameter], body: &Block) -> CompileResult<()> {
        for param in params {
            if self.env.declared_in_current_scope(&param.name) {
                return Err(error_at(param.span, format!("duplicate argument {}", param.name)));
            }
            let ty = resolve_type_expr(&param.ty)?;
            self.env.insert(param.name.clone(), ty);
        }
        for stmt in &body.statements {
            self.check_statement(stmt)?;
        }
        Ok(())
    }

    fn check_var_decl(&mut self, var: &VarDecl) -> CompileResult<()> {
        let ty = match (&var.ty, &var.value) {
            (Some(ty), value) => {
                let declared = resolve_type_expr(ty)?;
                if let Some(value) = value {
                    let found = self.check_value_expecting(value, &declared)?;
                    self.expect_assignable(&declared, &found, value.span(), "variable declaration")?;
                }
                declared
            }
            (None, Some(value)) => self.check_value(value)?,
            (None, None) => return Err(error_at(var.span, "missing type or initializer")),
        };
        self.env.insert(var.name.clone(), ty);
        Ok(())
    }

    fn check_block(&mut self, block: &Block) -> CompileResult<()> {
        self.env.push_scope();
        let result = block
            .statements
            .iter()
            .try_for_each(|stmt| self.check_statement(stmt));
        self.env.pop_scope();
        result
    }

    fn check_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Define(define) => {
                if self.env.declared_in_current_scope(&define.name) {
                    return Err(error_at(define.span, "no new variables on left side of :="));
                }
                let ty = self.check_value(&define.value)?;
                self.env.insert(define.name.clone(), ty);
                Ok(())
            }
            Stmt::Var(var) => {
                if self.env.declared_in_current_scope(&var.name) {
                    return Err(error_at(var.span, format!("{} redeclared in this block", var.name)));
                }
                self.check_var_decl(var)
            }
            Stmt::Assign(assign) => {
                let target = self.assignable_target(&assign.target, assign.span)?;
                match assign.op {
                    None => {
                        let found = self.check_value_expecting(&assign.value, &target)?;
                        self.expect_assignable(&target, &found, assign.value.span(), "assignment")
                    }
                    Some(op) => {
                        let found = self.check_value_expecting(&assign.value, &target)?;
                        let result = binary_result(op, &target, &found, assign.span)?;
                        self.expect_assignable(&target, &result, assign.span, "assignment")
                    }
                }
            }
            Stmt::IncDec(inc) => {
                let target = self.assignable_target(&inc.target, inc.span)?;
                if !target.is_numeric() {
                    let op = if inc.increment { "++" } else { "--" };
                    return Err(error_at(
                        inc.span,
                        format!("invalid operation: {}{op} (non-numeric type {target})", inc.target),
                    ));
                }
                Ok(())
            }
            Stmt::Expr(expr) => {
                if !matches!(expr, Expr::Call(_)) {
                    return Err(error_at(expr.span(), "expression result is not used"));
                }
                self.check_expr(expr)?;
                Ok(())
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Break(span) => self.expect_in_loop(*span, "break"),
            Stmt::Continue(span) => self.expect_in_loop(*span, "continue"),
            Stmt::If(if_stmt) => {
                self.check_condition(&if_stmt.condition, "if statement")?;
                self.check_block(&if_stmt.then_branch)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.check_block(else_branch)?;
                }
                Ok(())
            }
            Stmt::For(for_stmt) => {
                self.env.push_scope();
                let result = self.check_for(for_stmt);
                self.env.pop_scope();
                result
            }
            Stmt::Block(block) => self.check_block(block),
        }
    }

    fn check_for(&mut self, for_stmt: &ForStmt) -> CompileResult<()> {
        if let Some(init) = &for_stmt.init {
            self.check_statement(init)?;
        }
        if let Some(condition) = &for_stmt.condition {
            self.check_condition(condition, "for statement")?;
        }
        if let Some(post) = &for_stmt.post {
            if let Stmt::Define(define) = post.as_ref() {
                return Err(error_at(define.span, "cannot declare in post statement of for loop"));
            }
            self.check_statement(post)?;
        }
        self.current_function()?.loops += 1;
        let result = self.check_block(&for_stmt.body);
        self.current_function()?.loops -= 1;
        result
    }

    fn check_return(&mut self, ret: &ReturnStmt) -> CompileResult<()> {
        let declared = match &self.current_function()?.returns {
            ReturnMode::Declared(ty) => Some(ty.clone()),
            ReturnMode::Infer(_) => None,
        };
        match (declared, &ret.value) {
            (Some(Type::Void), Some(value)) => Err(error_at(value.span(), "too many return values")),
            (Some(Type::Void), None) => Ok(()),
            (_, None) => Err(error_at(ret.span, "not enough return values")),
            (Some(expected), Some(value)) => {
                let found = self.check_value_expecting(value, &expected)?;
                self.expect_assignable(&expected, &found, value.span(), "return statement")
            }
            (None, Some(value)) => {
                let ty = self.check_value(value)?;
                let mut untyped = Vec::new();
                if !untyped_int_literals(value, &mut untyped) {
                    untyped.clear();
                }
                if let ReturnMode::Infer(returns) = &mut self.current_function()?.returns {
                    returns.push(InferredReturn {
                        ty,
                        span: value.span(),
                        untyped,
                    });
                }
                Ok(())
            }
        }
    }

    fn expect_in_loop(&mut self, span: Span, keyword: &str) -> CompileResult<()> {
        if self.current_function()?.loops == 0 {
            return Err(error_at(span, format!("{keyword} is not in a loop")));
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &Expr, context: &str) -> CompileResult<()> {
        let ty = self.check_value(condition)?;
        if ty != Type::Bool {
            return Err(error_at(
                condition.span(),
                format!("non-boolean condition in {context} (type {ty})"),
            ));
        }
        Ok(())
    }

    fn assignable_target(&self, name: &SmolStr, span: Span) -> CompileResult<Type> {
        match self.env.get(name) {
            None => Err(error_at(span, format!("undefined: {name}"))),
            Some(ty) if !ty.is_value() => Err(error_at(span, format!("cannot assign to {name}"))),
            Some(ty) => Ok(ty.clone()),
        }
    }

    fn current_function(&mut self) -> CompileResult<&mut FunctionContext> {
        self.functions
            .last_mut()
            .ok_or_else(|| CompileError::error("statement outside of a function body"))
    }

    fn expect_assignable(
        &self,
        expected: &Type,
        found: &Type,
        span: Span,
        context: &str,
    ) -> CompileResult<()> {
        if expected.is_assignable_from(found) {
            Ok(())
        } else {
            Err(error_at(
                span,
                format!("cannot use value of type {found} as {expected} value in {context}"),
            ))
        }
    }

    /// Checks an expression whose value is consumed.
    fn check_value(&mut self, expr: &Expr) -> CompileResult<Type> {
        let ty = self.check_expr(expr)?;
        self.require_value(expr, ty)
    }

    /// Like [`Self::check_value`], but an untyped integer constant adopts
    /// `float64` when that is the expected type.
    fn check_value_expecting(&mut self, expr: &Expr, expected: &Type) -> CompileResult<Type> {
        if *expected == Type::Float {
            let mut literals = Vec::new();
            if untyped_int_literals(expr, &mut literals) {
                self.check_expr(expr)?;
                for span in literals {
                    self.info.mark_float_literal(span);
                }
                return Ok(Type::Float);
            }
        }
        self.check_value(expr)
    }

    fn require_value(&self, expr: &Expr, ty: Type) -> CompileResult<Type> {
        match &ty {
            Type::Void => Err(error_at(expr.span(), "function call (no value) used as value")),
            Type::Package(_) => Err(error_at(
                expr.span(),
                format!("use of package {} without selector", expr_name(expr)),
            )),
            Type::Builtin(builtin) => Err(error_at(
                expr.span(),
                format!("{} (built-in function) must be called", builtin.name()),
            )),
            _ => Ok(ty),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> CompileResult<Type> {
        match expr {
            Expr::Literal(lit, _) => Ok(match lit {
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Bool(_) => Type::Bool,
                Literal::String(_) => Type::String,
            }),
            Expr::Identifier(name, span) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| error_at(*span, format!("undefined: {name}"))),
            Expr::Binary(binary) => {
                let (left, right) = if untyped_int_literals(&binary.left, &mut Vec::new())
                    && !untyped_int_literals(&binary.right, &mut Vec::new())
                {
                    let right = self.check_value(&binary.right)?;
                    let left = self.check_value_expecting(&binary.left, &right)?;
                    (left, right)
                } else {
                    let left = self.check_value(&binary.left)?;
                    let right = self.check_value_expecting(&binary.right, &left)?;
                    (left, right)
                };
                binary_result(binary.op, &left, &right, binary.span)
            }
            Expr::Unary(unary) => {
                let ty = self.check_value(&unary.expr)?;
                match unary.op {
                    UnaryOp::Neg if ty.is_numeric() => Ok(ty),
                    UnaryOp::Not if ty == Type::Bool => Ok(ty),
                    UnaryOp::Neg => Err(error_at(
                        unary.span,
                        format!("invalid operation: operator - not defined on value of type {ty}"),
                    )),
                    UnaryOp::Not => Err(error_at(
                        unary.span,
                        format!("invalid operation: operator ! not defined on value of type {ty}"),
                    )),
                }
            }
            Expr::Call(call) => self.check_call(call),
            Expr::Selector(selector) => match self.env.get(&selector.target) {
                Some(Type::Package(path)) => stdlib::member_signature(path, &selector.member)
                    .map(|sig| Type::Function(Box::new(sig)))
                    .ok_or_else(|| {
                        error_at(
                            selector.span,
                            format!("undefined: {}.{}", selector.target, selector.member),
                        )
                    }),
                Some(other) => Err(error_at(
                    selector.span,
                    format!(
                        "{}.{} undefined (type {other} has no field or method {})",
                        selector.target, selector.member, selector.member
                    ),
                )),
                None => Err(error_at(selector.span, format!("undefined: {}", selector.target))),
            },
            Expr::Func(func) => {
                let ty = self.function_type(&func.params, func.return_type.as_ref())?;
                let ret = match &ty {
                    Type::Function(sig) => sig.ret.clone(),
                    _ => Type::Void,
                };
                self.check_function_body(&func.params, ret, &func.body)?;
                Ok(ty)
            }
        }
    }

    fn check_call(&mut self, call: &CallExpr) -> CompileResult<Type> {
        let callee = self.check_expr(&call.function)?;
        match callee {
            Type::Builtin(builtin) => self.check_builtin_call(builtin, call),
            Type::Function(sig) => {
                let fixed = sig.params.len();
                if call.args.len() < fixed {
                    return Err(error_at(
                        call.span,
                        format!(
                            "not enough arguments in call to {} (expected {fixed}, found {})",
                            expr_name(&call.function),
                            call.args.len()
                        ),
                    ));
                }
                if call.args.len() > fixed && sig.variadic.is_none() {
                    return Err(error_at(
                        call.span,
                        format!(
                            "too many arguments in call to {} (expected {fixed}, found {})",
                            expr_name(&call.function),
                            call.args.len()
                        ),
                    ));
                }
                for (index, arg) in call.args.iter().enumerate() {
                    let expected = sig
                        .params
                        .get(index)
                        .or(sig.variadic.as_ref())
                        .cloned()
                        .unwrap_or(Type::Any);
                    let found = self.check_value_expecting(arg, &expected)?;
                    self.expect_assignable(&expected, &found, arg.span(), "argument")?;
                }
                Ok(sig.ret)
            }
            other => Err(error_at(
                call.function.span(),
                format!("invalid operation: cannot call non-function of type {other}"),
            )),
        }
    }

    fn check_builtin_call(&mut self, builtin: Builtin, call: &CallExpr) -> CompileResult<Type> {
        if call.args.len() != 1 {
            return Err(error_at(
                call.span,
                format!(
                    "{} expects exactly 1 argument, found {}",
                    builtin.name(),
                    call.args.len()
                ),
            ));
        }
        let arg = &call.args[0];
        let ty = self.check_value(arg)?;
        let (accepted, result) = match builtin {
            Builtin::Int => (ty.is_numeric(), Type::Int),
            Builtin::Float64 => (ty.is_numeric(), Type::Float),
            Builtin::String => (ty == Type::String, Type::String),
            Builtin::Len => (ty == Type::String, Type::Int),
        };
        if !accepted {
            let message = match builtin {
                Builtin::Len => format!("invalid argument for len: value of type {ty}"),
                _ => format!("cannot convert value of type {ty} to {}", result),
            };
            return Err(error_at(arg.span(), message));
        }
        Ok(result)
    }
}

/// Result type of `left op right`, or the error Go would report.
fn binary_result(op: BinaryOp, left: &Type, right: &Type, span: Span) -> CompileResult<Type> {
    if left != right {
        return Err(error_at(
            span,
            format!(
                "invalid operation: mismatched types {left} and {right} for operator {}",
                op.as_str()
            ),
        ));
    }
    let defined = match op {
        BinaryOp::Add => left.is_ordered(),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => left.is_numeric(),
        BinaryOp::Mod => *left == Type::Int,
        BinaryOp::And | BinaryOp::Or => *left == Type::Bool,
        BinaryOp::Eq | BinaryOp::NotEq => left.is_comparable(),
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => left.is_ordered(),
    };
    if !defined {
        return Err(error_at(
            span,
            format!(
                "invalid operation: operator {} not defined on values of type {left}",
                op.as_str()
            ),
        ));
    }
    if op.is_comparison() {
        Ok(Type::Bool)
    } else {
        Ok(left.clone())
    }
}

/// Collects the spans that turn an untyped integer constant expression into
/// float64: its literals, except that `/` and `%` keep integer semantics and
/// only their result converts. Returns false when the expression is not such
/// a constant.
fn untyped_int_literals(expr: &Expr, out: &mut Vec<Span>) -> bool {
    match expr {
        Expr::Literal(Literal::Int(_), span) => {
            out.push(*span);
            true
        }
        Expr::Unary(unary) if unary.op == UnaryOp::Neg => untyped_int_literals(&unary.expr, out),
        Expr::Binary(binary)
            if matches!(binary.op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul) =>
        {
            untyped_int_literals(&binary.left, out) && untyped_int_literals(&binary.right, out)
        }
        Expr::Binary(binary) if matches!(binary.op, BinaryOp::Div | BinaryOp::Mod) => {
            let mut operands = Vec::new();
            let constant = untyped_int_literals(&binary.left, &mut operands)
                && untyped_int_literals(&binary.right, &mut operands);
            if constant {
                out.push(binary.span);
            }
            constant
        }
        _ => false,
    }
}

fn is_terminating(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Block(block) => block_terminates(block),
        Stmt::If(if_stmt) => match &if_stmt.else_branch {
            Some(else_branch) => {
                block_terminates(&if_stmt.then_branch) && block_terminates(else_branch)
            }
            None => false,
        },
        Stmt::For(for_stmt) => for_stmt.condition.is_none() && !breaks_out(&for_stmt.body),
        _ => false,
    }
}

fn block_terminates(block: &Block) -> bool {
    block.statements.last().map_or(false, is_terminating)
}

/// Whether a `break` in this block targets the enclosing loop.
fn breaks_out(block: &Block) -> bool {
    block.statements.iter().any(|stmt| match stmt {
        Stmt::Break(_) => true,
        Stmt::Block(inner) => breaks_out(inner),
        Stmt::If(if_stmt) => {
            breaks_out(&if_stmt.then_branch)
                || if_stmt.else_branch.as_ref().map_or(false, breaks_out)
        }
        _ => false,
    })
}

fn expr_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name, _) => name.to_string(),
        Expr::Selector(selector) => format!("{}.{}", selector.target, selector.member),
        _ => "function value".to_string(),
    }
}

fn closing_brace(span: Span) -> Span {
    Span::new(span.file_id, span.end, span.end)
}

fn error_at(span: Span, message: impl Into<String>) -> CompileError {
    Diagnostic::error(message)
        .with_code("E0200")
        .with_primary(span, None)
        .into()
}

pub fn check(program: &Program, entry_point: &str) -> CompileResult<TypeInfo> {
    TypeChecker::new(entry_point).check_program(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::position::FileId;
    use crate::source::SourceFile;

    fn check_source(text: &str) -> CompileResult<TypeInfo> {
        let file = SourceFile::new(FileId(0), "test", text);
        let tokens = lex(&file)?;
        let program = parse(&tokens)?;
        check(&program, "evaluate")
    }

    fn error_message(text: &str) -> String {
        check_source(text)
            .expect_err("type checking should fail")
            .message()
            .to_string()
    }

    #[test]
    fn infers_entry_result_from_returns() {
        let info = check_source(
            "var A int = 0\nvar B float64 = 10.5\nfunc evaluate() {\nC := float64(A) + B\nreturn C\n}",
        )
        .expect("well typed");
        assert_eq!(info.entry_return, Some(Type::Float));
    }

    #[test]
    fn untyped_literals_adopt_float_context() {
        let info = check_source(
            "var B float64 = 1\nfunc evaluate() {\nif B > 2 {\nreturn 0\n}\nreturn B * 2\n}",
        )
        .expect("well typed");
        assert_eq!(info.entry_return, Some(Type::Float));
        assert_eq!(info.float_literals.len(), 4);
    }

    #[test]
    fn constant_division_converts_as_a_whole() {
        let info = check_source("var F float64 = 1 / 2\nfunc evaluate() {\nreturn F\n}").expect("well typed");
        assert_eq!(info.float_literals.len(), 1);
        let info = check_source("func evaluate() {\nreturn 9 / 2\n}").expect("well typed");
        assert_eq!(info.entry_return, Some(Type::Int));
        assert!(info.float_literals.is_empty());
    }

    #[test]
    fn rejects_mixed_arithmetic_without_conversion() {
        let message = error_message(
            "var A int = 0\nvar B float64 = 0.0\nfunc evaluate() {\nreturn A + B\n}",
        );
        assert_eq!(
            message,
            "invalid operation: mismatched types int and float64 for operator +"
        );
    }

    #[test]
    fn reports_missing_return() {
        let message = error_message("func evaluate() {\nx := 1\nif x > 0 {\nreturn x\n}\n}");
        assert_eq!(message, "missing return");
        let message = error_message(
            "var f = func(a int) int {\nif a > 0 {\nreturn 1\n}\n}\nfunc evaluate() {\nreturn f(1)\n}",
        );
        assert_eq!(message, "missing return");
    }

    #[test]
    fn infinite_loop_without_break_terminates() {
        check_source("func evaluate() {\ni := 0\nfor {\ni++\nif i > 3 {\nreturn i\n}\n}\n}")
            .expect("for without condition is terminating");
    }

    #[test]
    fn reports_inconsistent_results() {
        let message = error_message("func evaluate() {\nif true {\nreturn 1\n}\nreturn \"x\"\n}");
        assert_eq!(message, "inconsistent result types in evaluate: int and string");
    }

    #[test]
    fn reports_undefined_names_and_packages() {
        assert_eq!(error_message("func evaluate() {\nreturn y\n}"), "undefined: y");
        assert_eq!(
            error_message("import \"os\"\nfunc evaluate() {\nreturn 1\n}"),
            "package os is not in std"
        );
        assert_eq!(
            error_message("import \"strings\"\nfunc evaluate() {\nreturn strings.Split(\"a\")\n}"),
            "undefined: strings.Split"
        );
    }

    #[test]
    fn checks_call_arity_and_argument_types() {
        let prelude = "var NOT = func(cond bool) bool { return !cond }\n";
        assert_eq!(
            error_message(&format!("{prelude}func evaluate() {{\nreturn NOT()\n}}")),
            "not enough arguments in call to NOT (expected 1, found 0)"
        );
        assert_eq!(
            error_message(&format!("{prelude}func evaluate() {{\nreturn NOT(1)\n}}")),
            "cannot use value of type int as bool value in argument"
        );
    }

    #[test]
    fn variadic_package_functions_accept_any_values() {
        let info = check_source(
            "import \"fmt\"\nvar N int = 1\nfunc evaluate() {\nreturn fmt.Sprintf(\"%d-%v\", N, true)\n}",
        )
        .expect("well typed");
        assert_eq!(info.entry_return, Some(Type::String));
    }

    #[test]
    fn rejects_duplicates_and_redeclaration() {
        assert_eq!(
            error_message("var A int = 1\nvar A int = 2\nfunc evaluate() {\nreturn A\n}"),
            "A redeclared in this block"
        );
        assert_eq!(
            error_message("func evaluate() {\nx := 1\nx := 2\nreturn x\n}"),
            "no new variables on left side of :="
        );
    }

    #[test]
    fn break_must_be_inside_loop() {
        assert_eq!(
            error_message("func evaluate() {\nbreak\nreturn 1\n}"),
            "break is not in a loop"
        );
    }

    #[test]
    fn missing_entry_point_is_reported() {
        assert_eq!(
            error_message("var A int = 1"),
            "function evaluate is undeclared"
        );
    }

    #[test]
    fn missing_entry_point_outranks_body_errors() {
        assert_eq!(
            error_message("func helper() {\nreturn 1\n}"),
            "function evaluate is undeclared"
        );
    }
}
