//! Report configuration and run settings.

pub mod report;
pub mod settings;
