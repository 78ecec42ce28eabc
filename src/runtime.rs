//! Value model and native machinery shared by the evaluator.
//!
//! This module contains the pieces that know nothing about scopes: values and
//! their operators, the atom factory, native builtin entry points and the
//! output sink abstraction.
pub mod complex;
pub mod dict;
pub mod error;
pub(crate) mod execution;
pub mod factory;
pub(crate) mod operators;
pub mod output;
pub mod value;
