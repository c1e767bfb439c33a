//! ECS Converge Core Library
//!
//! Client-side reconciliation against a container control plane:
//!
//! - [`normalize`]: container-definition normalization and semantic
//!   equivalence
//! - [`waiter`]: the status poller
//! - [`waiters`]: cluster, service, task-set and gateway-service waiters
//! - [`retry`]: retry-on-mutate with per-mutation classifiers
//! - [`flow`]: mutate-then-confirm
//! - [`domain`]: handles, ARN helpers, the error type

pub mod config;
pub mod domain;
pub mod flow;
pub mod normalize;
pub mod obs;
pub mod retry;
pub mod telemetry;
pub mod waiter;
pub mod waiters;

pub use config::{ConvergeConfig, Operation, ResourceKind};

pub use domain::{
    cluster_name_from_arn, family_and_revision_from_arn, role_name_from_arn, strip_revision, Arn,
    ClusterHandle, ConvergeError, GatewayServiceHandle, Result, ServiceHandle, TaskSetHandle,
};

pub use flow::{apply_and_confirm, delete_and_confirm};

pub use normalize::{
    canonicalize, equivalent, normalize, order_for_state, validate_container_definitions,
    ContainerDefinition, ContainerSpec, NetworkMode,
};

pub use obs::{emit_retry_attempt_failed, emit_retry_final_attempt, emit_wait_tick, WaitSpan};

pub use retry::{
    retry_mutation, retry_mutation_cancellable, retry_when, retry_when_cancellable, ClientToken,
    RetryDecision, RetryError, RetryPolicy, RetryProfile,
};

pub use telemetry::init_tracing;

pub use waiter::{FnRefresh, Observation, Refresh, StateChangeConf, WaitError};

pub use waiters::{
    classify_deletion_status, wait_cluster_active, wait_cluster_deleted,
    wait_gateway_service_active, wait_gateway_service_inactive, wait_gateway_service_stable,
    wait_service_active, wait_service_inactive, wait_service_stable, wait_task_set_deleted,
    wait_task_set_stable, Lifecycle, WaitOptions,
};
