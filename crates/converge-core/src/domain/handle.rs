//! Typed addresses of remote resources.
//!
//! A handle is what a waiter or mutation needs to find its resource again.
//! Handles that travel through state as strings have a composite-key form
//! that parses back losslessly; anything else is a permanent
//! `ConvergeError::InvalidHandle`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ConvergeError, Result};

/// A cluster, by name or ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterHandle {
    pub cluster: String,
}

impl ClusterHandle {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }
}

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cluster)
    }
}

/// A service inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceHandle {
    pub service: String,
    pub cluster: String,
}

impl ServiceHandle {
    pub fn new(service: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            cluster: cluster.into(),
        }
    }

    /// Parse the `cluster-name/service-name` import form.
    pub fn from_import_id(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split('/').collect();
        match parts.as_slice() {
            [cluster, service] if !cluster.is_empty() && !service.is_empty() => {
                Ok(Self::new(*service, *cluster))
            }
            _ => Err(ConvergeError::invalid_handle(
                id,
                "expected cluster-name/service-name",
            )),
        }
    }

    /// The `cluster-name/service-name` import form.
    pub fn import_id(&self) -> String {
        format!("{}/{}", self.cluster, self.service)
    }
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.service)
    }
}

/// A task set of a service, addressed by `TASK_SET_ID,SERVICE,CLUSTER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskSetHandle {
    pub task_set: String,
    pub service: String,
    pub cluster: String,
}

impl TaskSetHandle {
    pub fn new(
        task_set: impl Into<String>,
        service: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            task_set: task_set.into(),
            service: service.into(),
            cluster: cluster.into(),
        }
    }

    pub fn service_handle(&self) -> ServiceHandle {
        ServiceHandle::new(&self.service, &self.cluster)
    }
}

impl fmt::Display for TaskSetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.task_set, self.service, self.cluster)
    }
}

impl FromStr for TaskSetHandle {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(ConvergeError::invalid_handle(
                s,
                format!(
                    "expected TASK_SET_ID,SERVICE,CLUSTER, got {} part(s)",
                    parts.len()
                ),
            ));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ConvergeError::invalid_handle(
                s,
                "expected TASK_SET_ID,SERVICE,CLUSTER with no empty parts",
            ));
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// A gateway service, addressed by ARN; the cluster is kept for deployment
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatewayServiceHandle {
    pub service_arn: String,
    pub cluster: String,
}

impl GatewayServiceHandle {
    pub fn new(service_arn: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            service_arn: service_arn.into(),
            cluster: cluster.into(),
        }
    }
}

impl fmt::Display for GatewayServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.service_arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_set_handle_round_trip() {
        let handle: TaskSetHandle = "ecs-svc/1234,web,prod".parse().unwrap();
        assert_eq!(handle.task_set, "ecs-svc/1234");
        assert_eq!(handle.service, "web");
        assert_eq!(handle.cluster, "prod");
        assert_eq!(handle.to_string(), "ecs-svc/1234,web,prod");
    }

    #[test]
    fn test_task_set_handle_rejects_wrong_shape() {
        for bad in ["", "a,b", "a,b,c,d", "a,,c", ",b,c"] {
            match bad.parse::<TaskSetHandle>() {
                Err(ConvergeError::InvalidHandle { input, .. }) => assert_eq!(input, bad),
                other => panic!("expected InvalidHandle for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_service_import_id() {
        let handle = ServiceHandle::from_import_id("prod/web").unwrap();
        assert_eq!(handle, ServiceHandle::new("web", "prod"));
        assert_eq!(handle.import_id(), "prod/web");

        assert!(ServiceHandle::from_import_id("web").is_err());
        assert!(ServiceHandle::from_import_id("prod/web/extra").is_err());
        assert!(ServiceHandle::from_import_id("/web").is_err());
    }

    #[test]
    fn test_task_set_service_handle() {
        let handle = TaskSetHandle::new("ts-1", "web", "prod");
        assert_eq!(handle.service_handle(), ServiceHandle::new("web", "prod"));
    }
}
