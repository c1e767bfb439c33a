//! In-memory fakes for the control-plane trait (testing only)
//!
//! `ScriptedEcsApi` answers each describe/list call from a per-call script.
//! Responses are consumed in order; the last scripted response repeats
//! forever, so a script of `[PROVISIONING, ACTIVE]` yields `ACTIVE` for every
//! call after the first. Unscripted calls answer `ApiError::NotFound`.
//! Every call is counted, so tests can assert exact refresh counts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api_traits::EcsApi;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Cluster, GatewayService, Service, ServiceDeployment, ServiceDeploymentBrief, TaskSet,
};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ScriptState<T> {
    responses: VecDeque<ApiResult<T>>,
    calls: usize,
}

/// Ordered responses for a single API call; the last one repeats.
#[derive(Debug)]
struct Script<T> {
    state: Mutex<ScriptState<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                responses: VecDeque::new(),
                calls: 0,
            }),
        }
    }
}

impl<T: Clone> Script<T> {
    fn push(&self, response: ApiResult<T>) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    fn next(&self, what: &str) -> ApiResult<T> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.responses.len() > 1 {
            return state
                .responses
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::not_found(what)));
        }
        state
            .responses
            .front()
            .cloned()
            .unwrap_or_else(|| Err(ApiError::not_found(what)))
    }

    fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

// ---------------------------------------------------------------------------
// ScriptedEcsApi
// ---------------------------------------------------------------------------

/// Scripted, call-counting implementation of [`EcsApi`].
#[derive(Debug, Default)]
pub struct ScriptedEcsApi {
    clusters: Script<Cluster>,
    services: Script<Service>,
    task_sets: Script<TaskSet>,
    gateway_services: Script<GatewayService>,
    deployment_lists: Script<Vec<ServiceDeploymentBrief>>,
    deployments: Script<ServiceDeployment>,
    list_filters: Mutex<Vec<Option<DateTime<Utc>>>>,
}

impl ScriptedEcsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `describe_cluster` response.
    pub fn push_cluster(&self, response: ApiResult<Cluster>) -> &Self {
        self.clusters.push(response);
        self
    }

    /// Queue a `describe_service` response.
    pub fn push_service(&self, response: ApiResult<Service>) -> &Self {
        self.services.push(response);
        self
    }

    /// Queue a `describe_task_set` response.
    pub fn push_task_set(&self, response: ApiResult<TaskSet>) -> &Self {
        self.task_sets.push(response);
        self
    }

    /// Queue a `describe_gateway_service` response.
    pub fn push_gateway_service(&self, response: ApiResult<GatewayService>) -> &Self {
        self.gateway_services.push(response);
        self
    }

    /// Queue a `list_service_deployments` response.
    pub fn push_deployment_list(
        &self,
        response: ApiResult<Vec<ServiceDeploymentBrief>>,
    ) -> &Self {
        self.deployment_lists.push(response);
        self
    }

    /// Queue a `describe_service_deployment` response.
    pub fn push_service_deployment(&self, response: ApiResult<ServiceDeployment>) -> &Self {
        self.deployments.push(response);
        self
    }

    pub fn cluster_calls(&self) -> usize {
        self.clusters.calls()
    }

    pub fn service_calls(&self) -> usize {
        self.services.calls()
    }

    pub fn task_set_calls(&self) -> usize {
        self.task_sets.calls()
    }

    pub fn gateway_service_calls(&self) -> usize {
        self.gateway_services.calls()
    }

    pub fn deployment_list_calls(&self) -> usize {
        self.deployment_lists.calls()
    }

    pub fn service_deployment_calls(&self) -> usize {
        self.deployments.calls()
    }

    /// `created_after` filters passed to `list_service_deployments`, in call order.
    pub fn list_filters(&self) -> Vec<Option<DateTime<Utc>>> {
        self.list_filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl EcsApi for ScriptedEcsApi {
    async fn describe_cluster(&self, cluster: &str) -> ApiResult<Cluster> {
        self.clusters.next(cluster)
    }

    async fn describe_service(&self, service: &str, _cluster: &str) -> ApiResult<Service> {
        self.services.next(service)
    }

    async fn describe_task_set(
        &self,
        task_set: &str,
        _service: &str,
        _cluster: &str,
    ) -> ApiResult<TaskSet> {
        self.task_sets.next(task_set)
    }

    async fn describe_gateway_service(&self, service_arn: &str) -> ApiResult<GatewayService> {
        self.gateway_services.next(service_arn)
    }

    async fn list_service_deployments(
        &self,
        service: &str,
        _cluster: &str,
        created_after: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<ServiceDeploymentBrief>> {
        self.list_filters.lock().unwrap().push(created_after);
        self.deployment_lists.next(service)
    }

    async fn describe_service_deployment(
        &self,
        deployment_arn: &str,
    ) -> ApiResult<ServiceDeployment> {
        self.deployments.next(deployment_arn)
    }
}
