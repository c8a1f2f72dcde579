//! Infrastructure implementations of the domain's service traits

pub mod aws;
pub mod build;
pub mod fs;
pub mod repository;
