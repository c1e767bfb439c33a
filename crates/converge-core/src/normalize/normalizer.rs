//! In-place normalization of a `ContainerSpec`.
//!
//! Brings a user-authored document and the control plane's echo of it to the
//! same canonical shape: containers and keyed sub-collections sorted, empty
//! collections absent, remote defaults filled in. Pure; no I/O.

use std::collections::BTreeMap;

use super::model::{ContainerDefinition, ContainerSpec};

const DEFAULT_HEALTH_CHECK_INTERVAL: i64 = 30;
const DEFAULT_HEALTH_CHECK_RETRIES: i64 = 3;
const DEFAULT_HEALTH_CHECK_TIMEOUT: i64 = 5;

/// Normalize `spec` in place.
///
/// `is_awsvpc` selects flat-network semantics, where an unset host port is
/// the container port.
pub fn normalize(spec: &mut ContainerSpec, is_awsvpc: bool) {
    order(spec);

    for def in spec.0.iter_mut() {
        compact(def);
        fill_defaults(def, is_awsvpc);
        // defaulting can leave elements that are entirely unset
        compact(def);
    }
}

/// Sort containers by name, then environment and secrets by name.
///
/// All sorts are stable; other collections keep their order.
pub fn order(spec: &mut ContainerSpec) {
    spec.0.sort_by(|a, b| a.name.cmp(&b.name));
    for def in spec.0.iter_mut() {
        if let Some(env) = def.environment.as_mut() {
            env.sort_by(|a, b| a.name.cmp(&b.name));
        }
        if let Some(secrets) = def.secrets.as_mut() {
            secrets.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

fn fill_defaults(def: &mut ContainerDefinition, is_awsvpc: bool) {
    if def.essential.is_none() {
        def.essential = Some(true);
    }

    if let Some(hc) = def.health_check.as_mut() {
        hc.interval.get_or_insert(DEFAULT_HEALTH_CHECK_INTERVAL);
        hc.retries.get_or_insert(DEFAULT_HEALTH_CHECK_RETRIES);
        hc.timeout.get_or_insert(DEFAULT_HEALTH_CHECK_TIMEOUT);
    }

    for pm in def.port_mappings.iter_mut().flatten() {
        if pm.protocol.as_deref() == Some("tcp") {
            pm.protocol = None;
        }
        if pm.host_port == Some(0) {
            pm.host_port = None;
        }
        if is_awsvpc && pm.host_port.is_none() {
            pm.host_port = pm.container_port;
        }
    }
}

/// Drop entirely-unset elements from object lists and turn empty
/// collections into absent ones.
fn compact(def: &mut ContainerDefinition) {
    compact_objects(&mut def.port_mappings);
    compact_objects(&mut def.environment);
    compact_objects(&mut def.environment_files);
    compact_objects(&mut def.secrets);
    compact_objects(&mut def.mount_points);
    compact_objects(&mut def.volumes_from);
    compact_objects(&mut def.depends_on);
    compact_objects(&mut def.ulimits);
    compact_objects(&mut def.resource_requirements);
    compact_objects(&mut def.system_controls);
    compact_objects(&mut def.extra_hosts);

    compact_strings(&mut def.links);
    compact_strings(&mut def.entry_point);
    compact_strings(&mut def.command);
    compact_strings(&mut def.dns_servers);
    compact_strings(&mut def.dns_search_domains);
    compact_strings(&mut def.docker_security_options);

    compact_map(&mut def.docker_labels);
}

fn compact_objects<T: Default + PartialEq>(field: &mut Option<Vec<T>>) {
    if let Some(items) = field.as_mut() {
        let zero = T::default();
        items.retain(|item| *item != zero);
        if items.is_empty() {
            *field = None;
        }
    }
}

fn compact_strings(field: &mut Option<Vec<String>>) {
    if field
        .as_ref()
        .is_some_and(|items| items.iter().all(String::is_empty))
    {
        *field = None;
    }
}

fn compact_map(field: &mut Option<BTreeMap<String, String>>) {
    if field.as_ref().is_some_and(BTreeMap::is_empty) {
        *field = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(raw: &str) -> ContainerSpec {
        ContainerSpec::from_json(raw).unwrap()
    }

    fn normalized(raw: &str, is_awsvpc: bool) -> String {
        let mut s = spec(raw);
        normalize(&mut s, is_awsvpc);
        s.to_json().unwrap()
    }

    #[test]
    fn test_containers_and_environment_sorted() {
        let out = normalized(
            r#"[{"name":"b","environment":[{"name":"Z","value":"1"},{"name":"A","value":"2"}]},
                {"name":"a"}]"#,
            false,
        );
        assert_eq!(
            out,
            r#"[{"name":"a","essential":true},{"name":"b","essential":true,"environment":[{"name":"A","value":"2"},{"name":"Z","value":"1"}]}]"#
        );
    }

    #[test]
    fn test_empty_collections_become_absent() {
        let out = normalized(
            r#"[{"name":"a","environment":[],"mountPoints":[{}],"links":[""],"dockerLabels":{}}]"#,
            false,
        );
        assert_eq!(out, r#"[{"name":"a","essential":true}]"#);
    }

    #[test]
    fn test_health_check_defaults() {
        let out = normalized(
            r#"[{"name":"a","healthCheck":{"command":["CMD","true"],"retries":5}}]"#,
            false,
        );
        assert_eq!(
            out,
            r#"[{"name":"a","essential":true,"healthCheck":{"command":["CMD","true"],"interval":30,"retries":5,"timeout":5}}]"#
        );
    }

    #[test]
    fn test_port_mapping_defaults() {
        let out = normalized(
            r#"[{"name":"a","portMappings":[{"containerPort":80,"hostPort":0,"protocol":"tcp"},{"protocol":"tcp"}]}]"#,
            false,
        );
        assert_eq!(
            out,
            r#"[{"name":"a","essential":true,"portMappings":[{"containerPort":80}]}]"#
        );
    }

    #[test]
    fn test_awsvpc_fills_host_port() {
        let out = normalized(
            r#"[{"name":"a","portMappings":[{"containerPort":8080,"protocol":"udp"}]}]"#,
            true,
        );
        assert_eq!(
            out,
            r#"[{"name":"a","essential":true,"portMappings":[{"containerPort":8080,"hostPort":8080,"protocol":"udp"}]}]"#
        );
    }

    #[test]
    fn test_explicit_essential_false_kept() {
        let out = normalized(r#"[{"name":"a","essential":false}]"#, false);
        assert_eq!(out, r#"[{"name":"a","essential":false}]"#);
    }

    #[test]
    fn test_order_only_touches_ordering() {
        let mut s = spec(r#"[{"name":"b","secrets":[{"name":"S2"},{"name":"S1"}]},{"name":"a"}]"#);
        order(&mut s);
        assert_eq!(
            s.to_json().unwrap(),
            r#"[{"name":"a"},{"name":"b","secrets":[{"name":"S1"},{"name":"S2"}]}]"#
        );
    }
}
