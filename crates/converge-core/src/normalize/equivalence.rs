//! Semantic equivalence of container-definition documents.

use tracing::debug;

use super::model::ContainerSpec;
use super::normalizer::{normalize, order};
use crate::domain::Result;

/// Whether two raw documents describe the same containers once remote
/// defaulting and reordering are accounted for.
///
/// A document that fails to decode is an error, never "not equivalent".
pub fn equivalent(doc1: &str, doc2: &str, is_awsvpc: bool) -> Result<bool> {
    let left = canonicalize(doc1, is_awsvpc)?;
    let right = canonicalize(doc2, is_awsvpc)?;
    let same = left.as_bytes() == right.as_bytes();
    if !same {
        debug!(left = %left, right = %right, "container definitions differ");
    }
    Ok(same)
}

/// Decode, normalize and re-serialize a document.
pub fn canonicalize(doc: &str, is_awsvpc: bool) -> Result<String> {
    let mut spec = ContainerSpec::from_json(doc)?;
    normalize(&mut spec, is_awsvpc);
    spec.to_json()
}

/// Decode and apply only the ordering steps, for storing a document without
/// spurious reorderings.
pub fn order_for_state(doc: &str) -> Result<String> {
    let mut spec = ContainerSpec::from_json(doc)?;
    order(&mut spec);
    spec.to_json()
}

/// Check that a document decodes as a list of container definitions.
pub fn validate_container_definitions(doc: &str) -> Result<()> {
    ContainerSpec::from_json(doc).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConvergeError;

    #[test]
    fn test_remote_echo_is_equivalent() {
        let desired = r#"[{"name":"web","image":"nginx","portMappings":[{"containerPort":80,"protocol":"tcp"}]}]"#;
        let remote = r#"[{"name":"web","image":"nginx","essential":true,"portMappings":[{"containerPort":80,"hostPort":80,"protocol":"tcp"}],"environment":[],"mountPoints":[],"volumesFrom":[]}]"#;
        assert!(equivalent(desired, remote, true).unwrap());
    }

    #[test]
    fn test_real_change_is_not_equivalent() {
        let a = r#"[{"name":"web","image":"nginx:1.25"}]"#;
        let b = r#"[{"name":"web","image":"nginx:1.26"}]"#;
        assert!(!equivalent(a, b, false).unwrap());
    }

    #[test]
    fn test_decode_failure_is_error() {
        let good = r#"[{"name":"web"}]"#;
        match equivalent(good, "not json", false) {
            Err(ConvergeError::Parse(_)) => {}
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        assert!(validate_container_definitions(r#"[{"name":"a"}]"#).is_ok());
        assert!(validate_container_definitions(r#"[{"name":"a","command":"sleep 360"}]"#).is_err());
        assert!(validate_container_definitions(r#"{"name":"a"}"#).is_err());
    }

    #[test]
    fn test_order_for_state_keeps_values() {
        let out = order_for_state(r#"[{"name":"b","essential":false},{"name":"a","environment":[]}]"#)
            .unwrap();
        assert_eq!(
            out,
            r#"[{"name":"a","environment":[]},{"name":"b","essential":false}]"#
        );
    }
}
