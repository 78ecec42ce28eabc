pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod runtime;
pub mod symtable;
