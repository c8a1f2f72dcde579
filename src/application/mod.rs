//! Application services: classification, adaptation, and orchestration

pub mod adapter;
pub mod classifier;
pub mod database;
pub mod introspection;
pub mod orchestrator;
pub mod provisioner;
