//! Domain types for ECS Converge.
//!
//! - `ConvergeError`: the one error type callers of the core receive
//! - `handle`: typed addresses of remote resources and their composite ids
//! - `arn`: ARN parsing and the name/revision helpers built on it

pub mod arn;
pub mod error;
pub mod handle;

pub use arn::{
    cluster_name_from_arn, family_and_revision_from_arn, role_name_from_arn, strip_revision, Arn,
};
pub use error::{ConvergeError, Result};
pub use handle::{ClusterHandle, GatewayServiceHandle, ServiceHandle, TaskSetHandle};
