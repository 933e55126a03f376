pub mod builtins;
pub mod environment;
pub mod flow;
pub mod interpreter;
pub mod ops;
pub mod symbols;
pub mod value;
