//! Variable and function scopes.
//!
//! Scopes live in one arena and point at their parent by index. A scope is
//! pushed when a block, a loop iteration or a call starts and popped when it
//! ends, so the arena behaves like a stack even though lookups follow parent
//! links rather than stack order.

use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::value::Value;
use crate::syntax::ast::FunctionDecl;

/// Index of a scope inside an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Rc<FunctionDecl>>,
    parent: Option<ScopeId>,
}

#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// The global scope. It is never popped.
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Environment { scopes: vec![Scope::default()] }
    }

    /// Number of live scopes, the root included.
    #[inline]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Opens a new empty scope whose lookups fall back to `parent`.
    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { parent: Some(parent), ..Scope::default() });
        id
    }

    /// Drops `scope` and everything opened after it.
    pub fn pop(&mut self, scope: ScopeId) {
        debug_assert!(scope != Self::ROOT, "the root scope cannot be popped");
        self.scopes.truncate(scope.0.max(1));
    }

    /// Walks from `scope` up through its parents and returns the first
    /// scope for which `found` holds.
    fn find(&self, scope: ScopeId, found: impl Fn(&Scope) -> bool) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id.0)?;
            if found(s) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        let id = self.find(scope, |s| s.variables.contains_key(name))?;
        self.scopes[id.0].variables.get(name)
    }

    pub fn get_function(&self, scope: ScopeId, name: &str) -> Option<&Rc<FunctionDecl>> {
        let id = self.find(scope, |s| s.functions.contains_key(name))?;
        self.scopes[id.0].functions.get(name)
    }

    /// Binds `name` in `scope` itself, shadowing any outer binding.
    pub fn declare(&mut self, scope: ScopeId, name: &str, value: Value) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.variables.insert(name.to_string(), value);
        }
    }

    pub fn declare_function(&mut self, scope: ScopeId, decl: Rc<FunctionDecl>) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.functions.insert(decl.name.clone(), decl);
        }
    }

    /// Overwrites `name` in the nearest scope that defines it.
    /// Returns `false` when no scope on the chain has it.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> bool {
        let Some(id) = self.find(scope, |s| s.variables.contains_key(name)) else {
            return false;
        };
        match self.scopes[id.0].variables.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
