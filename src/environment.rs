use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::Value;

/// A lexical scope: a name-to-value map plus an optional link to the
/// enclosing scope. Cloning an `Environment` aliases the same scope, which
/// is what lets a closure observe bindings added to its captured scope
/// after the closure was created.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
}

#[derive(Debug, Default)]
struct Scope {
    store: HashMap<String, Value>,
    outer: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// A fresh innermost scope whose outer link is `self`. The outer link
    /// always points at the pre-existing environment, never at the new one.
    pub fn extend(&self) -> Self {
        Environment {
            scope: Rc::new(RefCell::new(Scope {
                store: HashMap::new(),
                outer: Some(self.clone()),
            })),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.scope.borrow();
        match scope.store.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Bind `name` in the innermost scope, shadowing any outer binding.
    pub fn insert(&self, name: impl Into<String>, value: Value) {
        self.scope.borrow_mut().store.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let env = Environment::new();
        env.insert("x", Value::Integer(5));

        assert_eq!(env.get("x"), Some(Value::Integer(5)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_lookup_walks_outward() {
        let outer = Environment::new();
        outer.insert("x", Value::Integer(1));

        let inner = outer.extend();
        assert_eq!(inner.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let outer = Environment::new();
        outer.insert("x", Value::Integer(1));

        let inner = outer.extend();
        inner.insert("x", Value::Integer(2));

        assert_eq!(inner.get("x"), Some(Value::Integer(2)));
        assert_eq!(outer.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_insert_never_touches_outer_scope() {
        let outer = Environment::new();
        let inner = outer.extend();
        inner.insert("x", Value::Integer(2));

        assert_eq!(outer.get("x"), None);
    }

    #[test]
    fn test_clones_alias_the_same_scope() {
        let env = Environment::new();
        let captured = env.clone();

        env.insert("late", Value::Integer(42));
        assert_eq!(captured.get("late"), Some(Value::Integer(42)));
    }
}
