//! Contract tests for the scripted `EcsApi` fake.
//!
//! Waiter tests in converge-core rely on these behaviours: ordered
//! responses, a repeating last response, not-found when unscripted, and
//! exact call counts.

use chrono::{TimeZone, Utc};
use converge_api::fakes::ScriptedEcsApi;
use converge_api::*;

fn cluster(status: ClusterStatus) -> Cluster {
    Cluster {
        cluster_arn: "arn:aws:ecs:us-east-1:000000000000:cluster/web".to_string(),
        cluster_name: "web".to_string(),
        status,
    }
}

// ===========================================================================
// Script ordering
// ===========================================================================

#[tokio::test]
async fn scripted_responses_are_returned_in_order() {
    let api = ScriptedEcsApi::new();
    api.push_cluster(Ok(cluster(ClusterStatus::Provisioning)))
        .push_cluster(Ok(cluster(ClusterStatus::Active)));

    let first = api.describe_cluster("web").await.unwrap();
    let second = api.describe_cluster("web").await.unwrap();

    assert_eq!(first.status, ClusterStatus::Provisioning);
    assert_eq!(second.status, ClusterStatus::Active);
}

#[tokio::test]
async fn last_response_repeats() {
    let api = ScriptedEcsApi::new();
    api.push_cluster(Ok(cluster(ClusterStatus::Active)));

    for _ in 0..5 {
        let c = api.describe_cluster("web").await.unwrap();
        assert_eq!(c.status, ClusterStatus::Active);
    }
    assert_eq!(api.cluster_calls(), 5);
}

#[tokio::test]
async fn unscripted_call_is_not_found() {
    let api = ScriptedEcsApi::new();
    let err = api.describe_service("svc", "web").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(api.service_calls(), 1);
}

#[tokio::test]
async fn scripted_errors_are_returned() {
    let api = ScriptedEcsApi::new();
    api.push_task_set(Err(ApiError::ServiceNotFound {
        service: "svc".to_string(),
    }));

    let err = api.describe_task_set("ts-1", "svc", "web").await.unwrap_err();
    assert!(matches!(err, ApiError::ServiceNotFound { .. }));
    assert!(err.is_not_found());
}

// ===========================================================================
// Call recording
// ===========================================================================

#[tokio::test]
async fn list_filters_are_recorded() {
    let api = ScriptedEcsApi::new();
    api.push_deployment_list(Ok(vec![]));
    let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    api.list_service_deployments("svc", "web", Some(after))
        .await
        .unwrap();
    api.list_service_deployments("svc", "web", None).await.unwrap();

    assert_eq!(api.list_filters(), vec![Some(after), None]);
    assert_eq!(api.deployment_list_calls(), 2);
    assert_eq!(api.service_deployment_calls(), 0);
}
