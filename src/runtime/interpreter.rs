//! The tree-walking evaluator for Uni.

use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ensure_sufficient_stack;
use crate::runtime::env::{Environment, ScopeId};
use crate::runtime::error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
use crate::runtime::ops;
use crate::runtime::value::{Map, Value};
use crate::syntax::ast::{Block, Expr, FunctionDecl, Stmt};

/// Calls nested deeper than this fault unless configured otherwise.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion. Carries the value of an expression statement, `nil` otherwise.
    Normal(Value),
    /// Hit a `return`; the enclosing call takes the value.
    Return(Value),
}

impl Flow {
    #[inline]
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(v) | Flow::Return(v) => v,
        }
    }
}

/// Where `print` and `println` write to.
#[derive(Debug, Default)]
pub enum Output {
    #[default]
    Stdout,
    /// Collects everything in memory, for tests and embedding.
    Buffer(String),
}

impl Output {
    fn write(&mut self, text: &str) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()
            }
            Output::Buffer(buf) => {
                buf.push_str(text);
                Ok(())
            }
        }
    }
}

/// Formats the arguments of `print` (`newline == false`) or `println`.
///
/// `println` puts one space between all arguments. `print` only separates two
/// neighbours when neither of them is a string.
pub fn format_print(values: &[Value], newline: bool) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            let touching_string =
                matches!(value, Value::Str(_)) || matches!(values[i - 1], Value::Str(_));
            if newline || !touching_string {
                out.push(' ');
            }
        }
        out.push_str(&value.to_string());
    }
    if newline {
        out.push('\n');
    }
    out
}

/// Evaluates statements against a persistent global scope.
#[derive(Debug)]
pub struct Interpreter {
    env: Environment,
    output: Output,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter that prints to stdout.
    pub fn new() -> Self {
        Self::with_output(Output::Stdout)
    }

    /// An interpreter that keeps its output in memory; see [`Interpreter::captured`].
    pub fn capturing() -> Self {
        Self::with_output(Output::Buffer(String::new()))
    }

    pub fn with_output(output: Output) -> Self {
        Interpreter {
            env: Environment::new(),
            output,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Output collected so far; always empty when printing to stdout.
    pub fn captured(&self) -> &str {
        match &self.output {
            Output::Buffer(buf) => buf,
            Output::Stdout => "",
        }
    }

    /// Drains the collected output.
    pub fn take_captured(&mut self) -> String {
        match &mut self.output {
            Output::Buffer(buf) => std::mem::take(buf),
            Output::Stdout => String::new(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Looks up a global variable.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.env.get(Environment::ROOT, name)
    }

    /// Runs one top-level statement in the global scope and returns its value.
    ///
    /// A top-level `return` just yields its value; the caller moves on to the
    /// next statement.
    pub fn exec(&mut self, stmt: &Stmt) -> RuntimeResult<Value> {
        self.eval_stmt(stmt, Environment::ROOT).map(Flow::into_value)
    }

    /// Runs `f` in a fresh child of `parent`, dropping the scope afterwards
    /// whether or not `f` succeeded.
    fn in_child_scope<T>(
        &mut self,
        parent: ScopeId,
        f: impl FnOnce(&mut Self, ScopeId) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        let scope = self.env.push(parent);
        let result = f(self, scope);
        self.env.pop(scope);
        result
    }

    pub fn eval_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> RuntimeResult<Flow> {
        ensure_sufficient_stack(|| self.eval_stmt_inner(stmt, scope))
    }

    fn eval_stmt_inner(&mut self, stmt: &Stmt, scope: ScopeId) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Var { name, value, is_new } => {
                let value = self.eval_expr(value, scope)?;
                if *is_new {
                    self.env.declare(scope, name, value);
                } else if !self.env.assign(scope, name, value) {
                    debug!(variable = %name, "assignment to undeclared variable ignored");
                }
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::SetIndex { subject, index, value } => {
                let target = self.eval_expr(subject, scope)?;
                let key = self.eval_expr(index, scope)?;
                let value = self.eval_expr(value, scope)?;
                match &target {
                    Value::Array(items) => {
                        let len = items.borrow().len();
                        let i = checked_index(&key, len, stmt)?;
                        items.borrow_mut()[i] = value;
                    }
                    Value::Map(map) => {
                        check_key(&key, stmt)?;
                        map.borrow_mut().insert(key, value);
                    }
                    other => {
                        debug!(kind = other.type_name(), "index assignment ignored");
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::If { condition, consequence, alternative } => {
                let branch = if self.eval_condition(condition, scope)? {
                    Some(consequence)
                } else {
                    alternative.as_ref()
                };
                match branch {
                    Some(block) => self.in_child_scope(scope, |it, s| it.eval_block(block, s)),
                    None => Ok(Flow::Normal(Value::Nil)),
                }
            }
            Stmt::While { condition, body } => {
                while self.eval_condition(condition, scope)? {
                    let flow = self.in_child_scope(scope, |it, s| it.eval_block(body, s))?;
                    if let Flow::Return(_) = flow {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::For { key, value, subject, body } => {
                self.eval_for(key, value.as_deref(), subject, body, scope)
            }
            Stmt::Function(decl) => {
                self.env.declare_function(scope, Rc::clone(decl));
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::Return(value) => Ok(Flow::Return(self.eval_expr(value, scope)?)),
            Stmt::Block(block) => self.in_child_scope(scope, |it, s| it.eval_block(block, s)),
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval_expr(expr, scope)?)),
        }
    }

    /// Runs the statements of `block` directly in `scope`.
    pub fn eval_block(&mut self, block: &Block, scope: ScopeId) -> RuntimeResult<Flow> {
        for stmt in &block.statements {
            if let Flow::Return(value) = self.eval_stmt(stmt, scope)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn eval_condition(&mut self, condition: &Expr, scope: ScopeId) -> RuntimeResult<bool> {
        match self.eval_expr(condition, scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(
                RuntimeErrorKind::ConditionNotBool,
                format!("`{condition}` evaluated to {}", other.type_name()),
            )),
        }
    }

    fn eval_for(
        &mut self,
        key: &str,
        value: Option<&str>,
        subject: &Expr,
        body: &Block,
        scope: ScopeId,
    ) -> RuntimeResult<Flow> {
        // Iterate over a snapshot so the body may mutate the container
        let subject = self.eval_expr(subject, scope)?;
        let pairs: Vec<(Value, Value)> = match &subject {
            Value::Str(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::Int(i as i64), Value::Str(c.to_string().into())))
                .collect(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item.clone()))
                .collect(),
            Value::Map(map) => map.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            other => {
                debug!(subject = other.type_name(), "nothing to iterate");
                return Ok(Flow::Normal(Value::Nil));
            }
        };

        for (k, v) in pairs {
            let flow = self.in_child_scope(scope, |it, s| {
                it.env.declare(s, key, k);
                if let Some(name) = value {
                    it.env.declare(s, name, v);
                }
                it.eval_block(body, s)
            })?;
            if let Flow::Return(_) = flow {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    /// Evaluates `expr`, growing the host stack first when it runs low.
    pub fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, scope))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, scope: ScopeId) -> RuntimeResult<Value> {
        match expr {
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(Rc::clone(s))),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope)?);
                }
                Ok(Value::array(values))
            }
            Expr::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = self.eval_expr(key, scope)?;
                    check_key(&key, expr)?;
                    let value = self.eval_expr(value, scope)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            Expr::Identifier(name) => {
                if let Some(value) = self.env.get(scope, name) {
                    return Ok(value.clone());
                }
                if let Some(decl) = self.env.get_function(scope, name) {
                    return Ok(Value::Function(Rc::clone(decl)));
                }
                debug!(variable = %name, "undefined name evaluates to nil");
                Ok(Value::Nil)
            }
            Expr::Index { subject, index } => {
                let target = self.eval_expr(subject, scope)?;
                let key = self.eval_expr(index, scope)?;
                index_value(&target, &key, expr)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, scope),
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, scope)?;
                Ok(ops::unary(*op, &operand))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                ops::binary(*op, &left, &right)
                    .map_err(|kind| RuntimeError::new(kind, format!("in `{expr}`")))
            }
            Expr::Len(subject) => {
                let subject = self.eval_expr(subject, scope)?;
                Ok(length_of(&subject))
            }
            Expr::Print { args, newline } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope)?);
                }
                let text = format_print(&values, *newline);
                self.output.write(&text).map_err(|err| {
                    RuntimeError::new(RuntimeErrorKind::OutputFailed, format!("{err} in `{expr}`"))
                })?;
                Ok(Value::Nil)
            }
        }
    }

    fn lookup_function(&self, scope: ScopeId, name: &str) -> Option<Rc<FunctionDecl>> {
        if let Some(decl) = self.env.get_function(scope, name) {
            return Some(Rc::clone(decl));
        }
        match self.env.get(scope, name) {
            Some(Value::Function(decl)) => Some(Rc::clone(decl)),
            _ => None,
        }
    }

    fn eval_call(&mut self, callee: &str, args: &[Expr], scope: ScopeId) -> RuntimeResult<Value> {
        let Some(function) = self.lookup_function(scope, callee) else {
            debug!(callee, "call to undefined function evaluates to nil");
            return Ok(Value::Nil);
        };
        if function.params.len() != args.len() {
            debug!(
                callee,
                expected = function.params.len(),
                found = args.len(),
                "call with wrong number of arguments evaluates to nil"
            );
            return Ok(Value::Nil);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, scope)?);
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::new(
                RuntimeErrorKind::CallDepthExceeded,
                format!("`{callee}` nested more than {} calls deep", self.max_call_depth),
            ));
        }
        trace!(callee, depth = self.call_depth, "call");

        // The body sees the caller's bindings, not the ones where it was declared
        self.call_depth += 1;
        let result = self.in_child_scope(scope, |it, s| {
            for (param, value) in function.params.iter().zip(values) {
                it.env.declare(s, param, value);
            }
            it.eval_block(&function.body, s)
        });
        self.call_depth -= 1;

        Ok(match result? {
            Flow::Return(value) => value,
            Flow::Normal(_) => Value::Nil,
        })
    }
}

fn check_key(key: &Value, site: &dyn fmt::Display) -> RuntimeResult<()> {
    if key.is_valid_key() {
        Ok(())
    } else {
        Err(RuntimeError::new(
            RuntimeErrorKind::InvalidMapKey,
            format!("{} cannot be a map key in `{site}`", key.type_name()),
        ))
    }
}

/// Validates `key` as a position in a sequence of `len` elements.
fn checked_index(key: &Value, len: usize, site: &dyn fmt::Display) -> RuntimeResult<usize> {
    let i = match key {
        Value::Int(i) => *i,
        other => {
            return Err(RuntimeError::new(
                RuntimeErrorKind::InvalidIndex,
                format!("cannot index with {} in `{site}`", other.type_name()),
            ));
        }
    };
    usize::try_from(i).ok().filter(|&i| i < len).ok_or_else(|| {
        RuntimeError::new(
            RuntimeErrorKind::IndexOutOfRange,
            format!("index {i} is out of range for length {len} in `{site}`"),
        )
    })
}

fn length_of(subject: &Value) -> Value {
    match subject {
        Value::Str(s) => Value::Int(s.chars().count() as i64),
        Value::Array(items) => Value::Int(items.borrow().len() as i64),
        Value::Map(map) => Value::Int(map.borrow().len() as i64),
        other => {
            debug!(subject = other.type_name(), "len of a value without length");
            Value::Nil
        }
    }
}

fn index_value(target: &Value, key: &Value, site: &Expr) -> RuntimeResult<Value> {
    match target {
        Value::Array(items) => {
            let items = items.borrow();
            let i = checked_index(key, items.len(), site)?;
            Ok(items[i].clone())
        }
        Value::Map(map) => Ok(map.borrow().get(key).cloned().unwrap_or_default()),
        Value::Str(s) => {
            let i = checked_index(key, s.chars().count(), site)?;
            Ok(s.chars().nth(i).map(|c| Value::Str(c.to_string().into())).unwrap_or_default())
        }
        other => {
            debug!(kind = other.type_name(), "indexing a value that has no elements");
            Ok(Value::Nil)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Parser;

    fn run(src: &str) -> (RuntimeResult<Value>, String) {
        let mut interp = Interpreter::capturing();
        let program = Parser::from_source(src).parse_program().unwrap();
        let mut last = Ok(Value::Nil);
        for stmt in &program {
            last = interp.exec(stmt);
            if last.is_err() {
                break;
            }
        }
        (last, interp.take_captured())
    }

    fn value_of(src: &str) -> Value {
        run(src).0.unwrap()
    }

    #[test]
    fn test_print_spacing() {
        let values = [Value::Int(1), Value::Int(2), Value::str("a"), Value::Int(3)];
        assert_eq!(format_print(&values, false), "1 2a3");
        assert_eq!(format_print(&values, true), "1 2 a 3\n");
        assert_eq!(format_print(&[], true), "\n");
    }

    #[test]
    fn test_return_escapes_nested_loops() {
        let src = r#"
            fn find(xs, want) {
                for i, x in xs {
                    while true {
                        if x == want { return i }
                        return -1
                    }
                }
                return -2
            }
            find([4, 5, 6], 5)
        "#;
        assert_eq!(value_of(src), Value::Int(-1));
        let src = "fn f(x) { if x > 0 { return x } } f(3)";
        assert_eq!(value_of(src), Value::Int(3));
    }

    #[test]
    fn test_calls_see_the_callers_bindings() {
        let src = r#"
            fn show() { return x }
            fn outer() { var x = "inner"; return show() }
            var x = "global"
            outer()
        "#;
        assert_eq!(value_of(src), Value::str("inner"));
    }

    #[test]
    fn test_scopes_are_released_after_faults() {
        let mut interp = Interpreter::capturing();
        let program = Parser::from_source("fn f(a) { { return 1 / a } } f(0)").parse_program().unwrap();
        interp.exec(&program[0]).unwrap();
        let err = interp.exec(&program[1]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
        assert_eq!(interp.env().depth(), 1);
    }

    #[test]
    fn test_runaway_recursion_faults() {
        let mut interp = Interpreter::capturing().with_max_call_depth(50);
        let program = Parser::from_source("fn f(n) { return f(n + 1) } f(0)").parse_program().unwrap();
        interp.exec(&program[0]).unwrap();
        let err = interp.exec(&program[1]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::CallDepthExceeded);
        assert_eq!(interp.env().depth(), 1);
    }

    #[test]
    fn test_function_values_can_be_passed_around() {
        let src = "fn double(n) { return n * 2 } var g = double; g(21)";
        assert_eq!(value_of(src), Value::Int(42));
        let (result, _) = run("fn f() { return 1 } f");
        assert_eq!(result.unwrap().to_string(), "fn f()");
    }

    #[test]
    fn test_string_index_uses_characters() {
        assert_eq!(value_of(r#"var s = "héllo"; s[1]"#), Value::str("é"));
        assert_eq!(value_of(r#"len("héllo")"#), Value::Int(5));
        let (result, _) = run(r#"var s = "abc"; s[3]"#);
        assert_eq!(result.unwrap_err().kind, RuntimeErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_fault_context_names_the_expression() {
        let (result, _) = run("var xs = [1, 2]\nxs[\"a\"]");
        let err = result.unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::InvalidIndex);
        assert_eq!(err.context, "cannot index with string in `xs[\"a\"]`");
    }
}
