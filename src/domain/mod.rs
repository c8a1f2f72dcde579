//! Domain layer: entities, value objects, and the trait seams the
//! application layer is written against.

pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;
