//! ARN parsing and resource-name helpers.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::error::ConvergeError;

fn arn_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^arn:([^:]+):([^:]+):([^:]*):([^:]*):(.+)$").ok())
        .as_ref()
}

/// `arn:partition:service:region:account:resource`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl FromStr for Arn {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = arn_pattern()
            .and_then(|re| re.captures(s))
            .ok_or_else(|| ConvergeError::InvalidArn {
                input: s.to_string(),
                reason: "expected arn:partition:service:region:account:resource".to_string(),
            })?;
        Ok(Arn {
            partition: caps[1].to_string(),
            service: caps[2].to_string(),
            region: caps[3].to_string(),
            account_id: caps[4].to_string(),
            resource: caps[5].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Role name as the service-create call expects it.
///
/// `role/EcsService` gives `EcsService`; a role with a path keeps the path
/// with a leading slash (`role/group/EcsService` gives `/group/EcsService`).
pub fn role_name_from_arn(arn: &str) -> String {
    let parts: Vec<&str> = arn.split('/').collect();
    match parts.len() {
        2 => parts[1].to_string(),
        n if n > 2 => format!("/{}", parts[1..].join("/")),
        _ => String::new(),
    }
}

/// Cluster name from `...:cluster/name`; empty when the ARN has another shape.
pub fn cluster_name_from_arn(arn: &str) -> String {
    let parts: Vec<&str> = arn.split('/').collect();
    if parts.len() == 2 {
        parts[1].to_string()
    } else {
        String::new()
    }
}

/// Task-definition ARN without its `:revision` suffix; empty for anything
/// that is not an ARN.
pub fn strip_revision(s: &str) -> String {
    let Ok(mut arn) = s.parse::<Arn>() else {
        return String::new();
    };
    let parts: Vec<&str> = arn.resource.split(':').collect();
    if parts.len() == 2 {
        arn.resource = parts[0].to_string();
    }
    arn.to_string()
}

/// `family:revision` from a task-definition ARN.
pub fn family_and_revision_from_arn(arn: &str) -> Option<String> {
    arn.split_once('/').map(|(_, rest)| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arn() {
        let arn: Arn = "arn:aws:ecs:us-east-1:000000000000:task-definition/my-task:42"
            .parse()
            .unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "ecs");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account_id, "000000000000");
        assert_eq!(arn.resource, "task-definition/my-task:42");
    }

    #[test]
    fn test_parse_arn_rejects_garbage() {
        assert!("some:string:thing".parse::<Arn>().is_err());
        assert!("".parse::<Arn>().is_err());
    }

    #[test]
    fn test_role_name_from_arn() {
        assert_eq!(role_name_from_arn(""), "");
        assert_eq!(
            role_name_from_arn("arn:aws:iam::0123456789:role/EcsService"),
            "EcsService"
        );
        assert_eq!(
            role_name_from_arn("arn:aws:iam::0123456789:role/group/EcsService"),
            "/group/EcsService"
        );
    }

    #[test]
    fn test_cluster_name_from_arn() {
        assert_eq!(
            cluster_name_from_arn("arn:aws:ecs:us-west-2:0123456789:cluster/my-cluster"),
            "my-cluster"
        );
        assert_eq!(cluster_name_from_arn("my-cluster"), "");
    }

    #[test]
    fn test_strip_revision() {
        assert_eq!(strip_revision(""), "");
        assert_eq!(strip_revision("some:string:thing"), "");
        assert_eq!(
            strip_revision("arn:aws:ecs:us-east-1:000000000000:task-definition/my-task:42"),
            "arn:aws:ecs:us-east-1:000000000000:task-definition/my-task"
        );
        assert_eq!(
            strip_revision("arn:aws:ecs:us-east-1:000000000000:task-definition/my-task"),
            "arn:aws:ecs:us-east-1:000000000000:task-definition/my-task"
        );
    }

    #[test]
    fn test_family_and_revision() {
        assert_eq!(
            family_and_revision_from_arn(
                "arn:aws:ecs:us-east-1:000000000000:task-definition/web:3"
            )
            .as_deref(),
            Some("web:3")
        );
        assert_eq!(family_and_revision_from_arn("web"), None);
    }
}
