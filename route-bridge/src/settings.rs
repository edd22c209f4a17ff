/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! User-facing route settings.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::Level;

/// Host property names, as supplied in a flat property table.
pub const TO_URI_PROPERTY: &str = "TO_URI";
pub const ERROR_URI_PROPERTY: &str = "ERROR_URI";
pub const MAXIMUM_REDELIVERIES_PROPERTY: &str = "MAXIMUM_REDELIVERIES";
pub const REDELIVERY_DELAY_PROPERTY: &str = "REDELIVERY_DELAY";
pub const LOG_LEVEL_PROPERTY: &str = "LOG_LEVEL";

pub const DEFAULT_MAXIMUM_REDELIVERIES: u32 = 0;
pub const DEFAULT_REDELIVERY_DELAY_MS: u64 = 3000;

/// Verbosity used for route tracing and for `log:` endpoints.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteLogLevel {
    #[default]
    Off,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
}

impl RouteLogLevel {
    pub const ALLOWED: [&'static str; 6] = ["OFF", "INFO", "WARN", "ERROR", "DEBUG", "TRACE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteLogLevel::Off => "OFF",
            RouteLogLevel::Info => "INFO",
            RouteLogLevel::Warn => "WARN",
            RouteLogLevel::Error => "ERROR",
            RouteLogLevel::Debug => "DEBUG",
            RouteLogLevel::Trace => "TRACE",
        }
    }

    /// `None` for [`RouteLogLevel::Off`].
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            RouteLogLevel::Off => None,
            RouteLogLevel::Info => Some(Level::INFO),
            RouteLogLevel::Warn => Some(Level::WARN),
            RouteLogLevel::Error => Some(Level::ERROR),
            RouteLogLevel::Debug => Some(Level::DEBUG),
            RouteLogLevel::Trace => Some(Level::TRACE),
        }
    }
}

impl Display for RouteLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(RouteLogLevel::Off),
            "INFO" => Ok(RouteLogLevel::Info),
            "WARN" => Ok(RouteLogLevel::Warn),
            "ERROR" => Ok(RouteLogLevel::Error),
            "DEBUG" => Ok(RouteLogLevel::Debug),
            "TRACE" => Ok(RouteLogLevel::Trace),
            _ => Err(format!(
                "expected one of {}",
                RouteLogLevel::ALLOWED.join(", ")
            )),
        }
    }
}

/// Parses one raw setting, naming `key` in the error when the value is rejected.
pub(crate) fn parse_setting<T>(key: &str, raw: &str) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConfigurationError::new(key, raw, err.to_string()))
}

fn default_maximum_redeliveries() -> u32 {
    DEFAULT_MAXIMUM_REDELIVERIES
}

fn default_redelivery_delay_ms() -> u64 {
    DEFAULT_REDELIVERY_DELAY_MS
}

/// Settings for one bridge instance, from which every activation builds its route.
///
/// ```
/// use route_bridge::{RouteLogLevel, RouteSettings};
///
/// let settings = RouteSettings::default()
///     .with_to_uri("mock:out")
///     .with_maximum_redeliveries(2)
///     .with_redelivery_delay_ms(100)
///     .with_log_level(RouteLogLevel::Info);
///
/// assert_eq!(settings.destination_uri(), "mock:out");
/// assert_eq!(settings.error_uri(), None);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteSettings {
    #[serde(default)]
    pub to_uri: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
    #[serde(default = "default_maximum_redeliveries")]
    pub maximum_redeliveries: u32,
    #[serde(default = "default_redelivery_delay_ms")]
    pub redelivery_delay_ms: u64,
    #[serde(default)]
    pub log_level: RouteLogLevel,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            to_uri: None,
            error_uri: None,
            maximum_redeliveries: DEFAULT_MAXIMUM_REDELIVERIES,
            redelivery_delay_ms: DEFAULT_REDELIVERY_DELAY_MS,
            log_level: RouteLogLevel::default(),
        }
    }
}

impl RouteSettings {
    pub fn with_to_uri(mut self, to_uri: impl Into<String>) -> Self {
        self.to_uri = Some(to_uri.into());
        self
    }

    pub fn with_error_uri(mut self, error_uri: impl Into<String>) -> Self {
        self.error_uri = Some(error_uri.into());
        self
    }

    pub fn with_maximum_redeliveries(mut self, maximum_redeliveries: u32) -> Self {
        self.maximum_redeliveries = maximum_redeliveries;
        self
    }

    pub fn with_redelivery_delay_ms(mut self, redelivery_delay_ms: u64) -> Self {
        self.redelivery_delay_ms = redelivery_delay_ms;
        self
    }

    pub fn with_log_level(mut self, log_level: RouteLogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Reads settings from a flat host property table (`TO_URI`, `ERROR_URI`,
    /// `MAXIMUM_REDELIVERIES`, `REDELIVERY_DELAY`, `LOG_LEVEL`).
    ///
    /// Absent keys take their defaults. Present values that do not parse are rejected.
    pub fn from_properties(
        properties: &HashMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let optional_uri = |key: &str| {
            properties
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let maximum_redeliveries = match properties.get(MAXIMUM_REDELIVERIES_PROPERTY) {
            Some(raw) => parse_setting(MAXIMUM_REDELIVERIES_PROPERTY, raw)?,
            None => DEFAULT_MAXIMUM_REDELIVERIES,
        };
        let redelivery_delay_ms = match properties.get(REDELIVERY_DELAY_PROPERTY) {
            Some(raw) => parse_setting(REDELIVERY_DELAY_PROPERTY, raw)?,
            None => DEFAULT_REDELIVERY_DELAY_MS,
        };
        let log_level = match properties.get(LOG_LEVEL_PROPERTY) {
            Some(raw) => parse_setting(LOG_LEVEL_PROPERTY, raw)?,
            None => RouteLogLevel::default(),
        };

        Ok(Self {
            to_uri: optional_uri(TO_URI_PROPERTY),
            error_uri: optional_uri(ERROR_URI_PROPERTY),
            maximum_redeliveries,
            redelivery_delay_ms,
            log_level,
        })
    }

    /// Destination URI, empty when none was configured.
    pub fn destination_uri(&self) -> &str {
        self.to_uri.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Error URI, `None` when absent or blank.
    pub fn error_uri(&self) -> Option<&str> {
        self.error_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }
}
