use std::collections::HashMap;

use crate::runtime::value::Value;

/// Stack of variable frames. Frame 0 is the global frame and is never popped.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind in the innermost frame. Returns `true` when the name was already
    /// bound in that same frame; the new value replaces it.
    pub fn declare(&mut self, name: &str, value: Value) -> bool {
        let Some(frame) = self.scopes.last_mut() else { return false };
        frame.insert(name.to_string(), value).is_some()
    }

    /// Overwrite the innermost existing binding. Returns `false` when the
    /// name is bound nowhere; assignment never creates a variable.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for Environment {
    fn default() -> Self { Self::new() }
}
