//! Name tables consulted by the evaluator.
//!
//! Callables (user functions and builtins) live in one map keyed by name, so
//! a name can only ever mean one thing. Settable properties and event
//! handlers have their own maps: they are reached only through `set` and
//! through dispatch, never through an identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::BuiltinError;
use crate::runtime::value::Value;
use crate::syntax::ast::FnDef;

pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, BuiltinError> + Send + Sync>;
pub type PropertySetter = Arc<dyn Fn(Value) -> Result<(), BuiltinError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::Any => true,
        }
    }

    /// The count reported in arity errors.
    pub fn expected(self) -> usize {
        match self {
            Arity::Exact(k) | Arity::AtLeast(k) => k,
            Arity::Any => 0,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(1) => write!(f, "1 argument"),
            Arity::Exact(k) => write!(f, "{k} arguments"),
            Arity::AtLeast(1) => write!(f, "at least 1 argument"),
            Arity::AtLeast(k) => write!(f, "at least {k} arguments"),
            Arity::Any => write!(f, "any number of arguments"),
        }
    }
}

#[derive(Clone)]
pub struct Builtin {
    pub arity: Arity,
    pub func: NativeFn,
}

#[derive(Clone)]
pub enum Symbol {
    Builtin(Builtin),
    Function(Arc<FnDef>),
}

impl Symbol {
    fn describe(&self) -> &'static str {
        match self {
            Symbol::Builtin(_) => "a builtin function",
            Symbol::Function(_) => "a function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("`{name}` is already defined as {existing}")]
    Taken { name: String, existing: &'static str },
    #[error("event handler `on {0}` is already defined")]
    DuplicateEvent(String),
    #[error("cannot register `{0}`: the program has already started")]
    Sealed(String),
}

#[derive(Default)]
pub struct SymbolTable {
    callables: HashMap<String, Symbol>,
    properties: HashMap<String, PropertySetter>,
    events: HashMap<String, Arc<FnDef>>,
    sealed: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close native registration. Called once the program starts running.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn register_builtin(&mut self, name: &str, arity: Arity, func: NativeFn) -> Result<(), DefinitionError> {
        if self.sealed {
            return Err(DefinitionError::Sealed(name.to_string()));
        }
        self.insert_callable(name, Symbol::Builtin(Builtin { arity, func }))
    }

    /// Returns `true` when an existing setter was replaced.
    pub fn register_property(&mut self, name: &str, setter: PropertySetter) -> Result<bool, DefinitionError> {
        if self.sealed {
            return Err(DefinitionError::Sealed(name.to_string()));
        }
        Ok(self.properties.insert(name.to_string(), setter).is_some())
    }

    pub fn define_function(&mut self, def: Arc<FnDef>) -> Result<(), DefinitionError> {
        let name = def.name.clone();
        self.insert_callable(&name, Symbol::Function(def))
    }

    pub fn define_event(&mut self, def: Arc<FnDef>) -> Result<(), DefinitionError> {
        if self.events.contains_key(&def.name) {
            return Err(DefinitionError::DuplicateEvent(def.name.clone()));
        }
        self.events.insert(def.name.clone(), def);
        Ok(())
    }

    fn insert_callable(&mut self, name: &str, symbol: Symbol) -> Result<(), DefinitionError> {
        if let Some(existing) = self.callables.get(name) {
            return Err(DefinitionError::Taken { name: name.to_string(), existing: existing.describe() });
        }
        self.callables.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn callable(&self, name: &str) -> Option<&Symbol> {
        self.callables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<FnDef>> {
        match self.callables.get(name) {
            Some(Symbol::Function(def)) => Some(def),
            _ => None,
        }
    }

    pub fn builtin(&self, name: &str) -> Option<&Builtin> {
        match self.callables.get(name) {
            Some(Symbol::Builtin(b)) => Some(b),
            _ => None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertySetter> {
        self.properties.get(name)
    }

    pub fn event(&self, name: &str) -> Option<&Arc<FnDef>> {
        self.events.get(name)
    }

    /// What kind of callable `name` is, if any.
    pub fn describe(&self, name: &str) -> Option<&'static str> {
        self.callables.get(name).map(Symbol::describe)
    }
}
