//! Skylift - Deployment orchestration core
//!
//! Takes an uploaded, already-extracted source tree, classifies it as a
//! static website or a Maven-built server application, mechanically adapts
//! server projects for a managed compute runtime, and drives provisioning
//! against serverless AWS infrastructure until the project is publicly
//! reachable.
//!
//! # Features
//!
//! - **Classification** — label a project tree STATIC, SERVER, or UNKNOWN
//!   from its build descriptor and file layout
//! - **Introspection** — best-effort discovery of HTTP routes and the
//!   application entry point for reporting
//! - **Runtime adaptation** — idempotent build-descriptor and source
//!   rewrites so a Spring Boot project runs behind a Lambda proxy
//! - **Provisioning** — create-or-converge compute functions, proxy
//!   gateways, and public website buckets, with non-essential steps allowed
//!   to degrade instead of aborting
//!
//! # Architecture
//!
//! ```text
//! skylift/
//! ├── domain/           # Entities, value objects, provider traits
//! ├── application/      # Classifier, adapter, provisioners, orchestrator
//! └── infrastructure/   # AWS SDK providers, Maven invocation, repositories
//! ```
//!
//! The HTTP edge, archive extraction, and durable persistence live outside
//! this crate; they drive the [`application::orchestrator::DeploymentOrchestrator`]
//! through the repository and provider traits in [`domain`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
