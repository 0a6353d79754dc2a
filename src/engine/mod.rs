//! Report orchestration engine.
//!
//! Provides module registration, action dispatch, findings accumulation,
//! and report assembly.

pub mod assembler;
pub mod dispatcher;
pub mod findings;
pub mod registry;
pub mod resources;
pub mod runner;
