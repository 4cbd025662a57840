//! Calltrace - caller-identification logging for instrumented programs
//!
//! This library provides the injectable logging component an external
//! instrumentation host wires into target programs: stack-introspection
//! based caller resolution, a single debug-level logging operation, and the
//! data-driven contract surface (export allow-list and well-known instance
//! binding) the host locates the component by.

pub mod caller;
pub mod cli;
pub mod config;
pub mod logger;
pub mod registry;
