//! Per-activation route identity and the endpoint names derived from it.

use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRY_URI_PREFIX: &str = "local:entry-";
const ROUTE_NAME_PREFIX: &str = "route-";
const OFFRAMP_URI_PREFIX: &str = "local:flow=";
const OFFRAMP_URI_SUFFIX: &str = "endpoint=1";
const ERROR_SINK_OPTIONS: &str = "level=OFF&showAll=true&multiline=true&style=Fixed";

/// Process-unique key for one activation's route.
///
/// Composed of the instance name and a fresh random token, so two activations never
/// share an identity, even for the same instance.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RouteIdentity(String);

impl RouteIdentity {
    /// Generates a new identity seeded with `instance_name`.
    ///
    /// Characters that would break the derived endpoint URIs are replaced with `_`.
    pub fn generate(instance_name: &str) -> Self {
        let instance: String = instance_name
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();

        Self(format!("{instance}{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal entry endpoint of the route; never user-supplied.
    pub fn entry_uri(&self) -> String {
        format!("{ENTRY_URI_PREFIX}{}", self.0)
    }

    pub fn route_name(&self) -> String {
        format!("{ROUTE_NAME_PREFIX}{}", self.0)
    }

    pub fn offramp_key(&self) -> String {
        format!("{OFFRAMP_URI_PREFIX}{}{OFFRAMP_URI_SUFFIX}", self.0)
    }

    /// No-op logging sink used when no error endpoint is configured.
    pub fn error_sink_uri(&self) -> String {
        format!("log:{}?{ERROR_SINK_OPTIONS}", self.0)
    }
}

impl Display for RouteIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::RouteIdentity;
    use std::collections::HashSet;

    #[test]
    fn generate_is_unique_per_call() {
        let identities: HashSet<RouteIdentity> = (0..256)
            .map(|_| RouteIdentity::generate("bridge"))
            .collect();

        assert_eq!(identities.len(), 256);
    }

    #[test]
    fn generate_keeps_instance_name_as_prefix() {
        let identity = RouteIdentity::generate("orders-bridge");

        assert!(identity.as_str().starts_with("orders-bridge"));
        assert!(identity.as_str().len() > "orders-bridge".len());
    }

    #[test]
    fn generate_replaces_uri_breaking_characters() {
        let identity = RouteIdentity::generate("my bridge?x=1&y");

        assert!(identity.as_str().starts_with("my_bridge_x_1_y"));
        assert!(!identity.entry_uri().contains('?'));
    }

    #[test]
    fn derived_names_embed_the_identity() {
        let identity = RouteIdentity::generate("b");
        let id = identity.as_str();

        assert_eq!(identity.entry_uri(), format!("local:entry-{id}"));
        assert_eq!(identity.route_name(), format!("route-{id}"));
        assert_eq!(identity.offramp_key(), format!("local:flow={id}endpoint=1"));
        assert_eq!(
            identity.error_sink_uri(),
            format!("log:{id}?level=OFF&showAll=true&multiline=true&style=Fixed")
        );
    }
}
