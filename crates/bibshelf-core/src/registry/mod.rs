//! Service registry for working-directory to store mapping.
//!
//! The registry is an explicit context object rather than global state. An
//! application creates one and hands it to whatever needs a store; it
//! guarantees that each canonical working directory is served by exactly one
//! [`LibraryService`](crate::LibraryService).

pub mod service_registry;

pub use service_registry::ServiceRegistry;
