//! Route-configuration table built fresh on every activation.

use crate::control_plane::route_identity::RouteIdentity;
use crate::error::ConfigurationError;
use crate::settings::{parse_setting, RouteLogLevel, RouteSettings};
use std::collections::BTreeMap;
use std::time::Duration;

pub const ID: &str = "id";
pub const FLOW_NAME: &str = "flow.name";
pub const FLOW_TYPE: &str = "flow.type";
pub const FLOW_MAXIMUM_REDELIVERIES: &str = "flow.maximumRedeliveries";
pub const FLOW_REDELIVERY_DELAY: &str = "flow.redeliveryDelay";
pub const FLOW_LOG_LEVEL: &str = "flow.logLevel";
pub const FLOW_OFFLOADING: &str = "flow.offloading";
pub const FROM_URI: &str = "from.uri";
pub const TO_URI: &str = "to.1.uri";
pub const ERROR_URI: &str = "error.uri";
pub const OFFRAMP_URI_LIST: &str = "offramp.uri.list";

pub const DEFAULT_FLOW_TYPE: &str = "default";
const OFFLOADING_DISABLED: &str = "false";

/// Ordered, stringly-typed key/value table handed to the route engine.
///
/// The table is the whole contract surface with the engine. It is built only through
/// [`RouteConfiguration::build`] and is immutable once shared.
///
/// ```
/// use route_bridge::{RouteConfiguration, RouteIdentity, RouteSettings};
///
/// let identity = RouteIdentity::generate("doc");
/// let configuration = RouteConfiguration::build(&RouteSettings::default(), &identity);
///
/// assert_eq!(configuration.from_uri(), identity.entry_uri());
/// assert_eq!(configuration.error_uri(), identity.error_sink_uri());
/// assert_eq!(configuration.get("flow.type"), Some("default"));
/// ```
///
/// Callers cannot rewrite entries of a built table:
///
/// ```compile_fail
/// use route_bridge::{RouteConfiguration, RouteIdentity, RouteSettings};
///
/// let identity = RouteIdentity::generate("doc");
/// let configuration = RouteConfiguration::build(&RouteSettings::default(), &identity)
///     .with_property("from.uri", "direct:elsewhere");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteConfiguration {
    identity: RouteIdentity,
    properties: BTreeMap<String, String>,
}

impl RouteConfiguration {
    /// Translates settings into the full route table. Performs no I/O and no validation.
    pub fn build(settings: &RouteSettings, identity: &RouteIdentity) -> Self {
        let error_uri = settings
            .error_uri()
            .map(str::to_string)
            .unwrap_or_else(|| identity.error_sink_uri());

        let mut properties = BTreeMap::new();
        properties.insert(ID.to_string(), identity.as_str().to_string());
        properties.insert(FLOW_NAME.to_string(), identity.route_name());
        properties.insert(FLOW_TYPE.to_string(), DEFAULT_FLOW_TYPE.to_string());
        properties.insert(
            FLOW_MAXIMUM_REDELIVERIES.to_string(),
            settings.maximum_redeliveries.to_string(),
        );
        properties.insert(
            FLOW_REDELIVERY_DELAY.to_string(),
            settings.redelivery_delay_ms.to_string(),
        );
        properties.insert(
            FLOW_LOG_LEVEL.to_string(),
            settings.log_level.as_str().to_string(),
        );
        properties.insert(
            FLOW_OFFLOADING.to_string(),
            OFFLOADING_DISABLED.to_string(),
        );
        properties.insert(FROM_URI.to_string(), identity.entry_uri());
        properties.insert(TO_URI.to_string(), settings.destination_uri().to_string());
        properties.insert(ERROR_URI.to_string(), error_uri);
        properties.insert(OFFRAMP_URI_LIST.to_string(), identity.offramp_key());

        Self {
            identity: identity.clone(),
            properties,
        }
    }

    /// Returns a copy with one key replaced, for tables the builder would never produce.
    #[cfg(test)]
    pub(crate) fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn identity(&self) -> &RouteIdentity {
        &self.identity
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn route_name(&self) -> &str {
        self.get(FLOW_NAME).unwrap_or_default()
    }

    pub fn flow_type(&self) -> &str {
        self.get(FLOW_TYPE).unwrap_or_default()
    }

    pub fn from_uri(&self) -> &str {
        self.get(FROM_URI).unwrap_or_default()
    }

    /// Destination URI; empty when the route has no destination.
    pub fn to_uri(&self) -> &str {
        self.get(TO_URI).unwrap_or_default()
    }

    pub fn error_uri(&self) -> &str {
        self.get(ERROR_URI).unwrap_or_default()
    }

    pub fn offramp_key(&self) -> &str {
        self.get(OFFRAMP_URI_LIST).unwrap_or_default()
    }

    pub fn maximum_redeliveries(&self) -> Result<u32, ConfigurationError> {
        parse_setting(
            FLOW_MAXIMUM_REDELIVERIES,
            self.get(FLOW_MAXIMUM_REDELIVERIES).unwrap_or_default(),
        )
    }

    pub fn redelivery_delay(&self) -> Result<Duration, ConfigurationError> {
        parse_setting::<u64>(
            FLOW_REDELIVERY_DELAY,
            self.get(FLOW_REDELIVERY_DELAY).unwrap_or_default(),
        )
        .map(Duration::from_millis)
    }

    pub fn log_level(&self) -> Result<RouteLogLevel, ConfigurationError> {
        parse_setting(
            FLOW_LOG_LEVEL,
            self.get(FLOW_LOG_LEVEL).unwrap_or_default(),
        )
    }
}
