//! Container-definition normalization and equivalence.
//!
//! # Modules
//!
//! - [`model`]: typed `ContainerSpec` / `ContainerDefinition`
//! - [`normalizer`]: `normalize()` (ordering, pruning, remote defaults)
//! - [`equivalence`]: `equivalent()`, `canonicalize()`, `order_for_state()`
//! - [`network_mode`]: `NetworkMode` and the awsvpc flag

pub mod equivalence;
pub mod model;
pub mod network_mode;
pub mod normalizer;

pub use equivalence::{canonicalize, equivalent, order_for_state, validate_container_definitions};
pub use model::{ContainerDefinition, ContainerSpec};
pub use network_mode::NetworkMode;
pub use normalizer::normalize;
