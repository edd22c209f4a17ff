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

//! Error taxonomy shared by route activation, engine calls and record dispatch.
//!
//! Activation-time errors ([`ActivationError`]) are fatal to one activation attempt only.
//! Per-record errors ([`DispatchError`]) are never fatal to the bridge instance.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// A user setting that could not be turned into a route configuration value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigurationError {
    key: String,
    value: String,
    reason: String,
}

impl ConfigurationError {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// The setting or configuration key that was rejected.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw value that was rejected.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value {:?} for {}: {}",
            self.value, self.key, self.reason
        )
    }
}

impl Error for ConfigurationError {}

/// Coarse classification of a failure reported by a [`RouteEngine`](crate::RouteEngine).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EngineErrorKind {
    InvalidUri,
    UnknownScheme,
    InvalidConfiguration,
    Unreachable,
    NotStarted,
    RouteNotFound,
    RouteStopped,
    Io,
    Internal,
}

impl EngineErrorKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineErrorKind::InvalidUri => "invalid_uri",
            EngineErrorKind::UnknownScheme => "unknown_scheme",
            EngineErrorKind::InvalidConfiguration => "invalid_configuration",
            EngineErrorKind::Unreachable => "unreachable",
            EngineErrorKind::NotStarted => "not_started",
            EngineErrorKind::RouteNotFound => "route_not_found",
            EngineErrorKind::RouteStopped => "route_stopped",
            EngineErrorKind::Io => "io",
            EngineErrorKind::Internal => "internal",
        }
    }
}

/// Failure reported by an engine or one of its endpoints.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineError {
    kind: EngineErrorKind,
    message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EngineErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_label(), self.message)
    }
}

impl Error for EngineError {}

impl From<ConfigurationError> for EngineError {
    fn from(err: ConfigurationError) -> Self {
        EngineError::new(EngineErrorKind::InvalidConfiguration, err.to_string())
    }
}

/// Failures that abort one activation attempt.
#[derive(Debug)]
pub enum ActivationError {
    AlreadyActive,
    Configuration(ConfigurationError),
    EngineStart(EngineError),
    RouteConfig(EngineError),
    RouteStart(EngineError),
    ProducerCreate(EngineError),
    /// The runtime shut down before the activation task finished.
    Interrupted,
}

impl ActivationError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivationError::AlreadyActive => "already_active",
            ActivationError::Configuration(_) => "configuration_error",
            ActivationError::EngineStart(_) => "engine_start_error",
            ActivationError::RouteConfig(_) => "route_config_error",
            ActivationError::RouteStart(_) => "route_start_error",
            ActivationError::ProducerCreate(_) => "producer_create_error",
            ActivationError::Interrupted => "interrupted",
        }
    }
}

impl Display for ActivationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationError::AlreadyActive => write!(f, "route is already active"),
            ActivationError::Configuration(err) => write!(f, "bad route settings: {err}"),
            ActivationError::EngineStart(err) => write!(f, "failed to start route engine: {err}"),
            ActivationError::RouteConfig(err) => {
                write!(f, "failed to apply route configuration: {err}")
            }
            ActivationError::RouteStart(err) => write!(f, "failed to start route: {err}"),
            ActivationError::ProducerCreate(err) => {
                write!(f, "failed to create route producer: {err}")
            }
            ActivationError::Interrupted => write!(f, "route activation was interrupted"),
        }
    }
}

impl Error for ActivationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ActivationError::AlreadyActive | ActivationError::Interrupted => None,
            ActivationError::Configuration(err) => Some(err),
            ActivationError::EngineStart(err)
            | ActivationError::RouteConfig(err)
            | ActivationError::RouteStart(err)
            | ActivationError::ProducerCreate(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for ActivationError {
    fn from(err: ConfigurationError) -> Self {
        ActivationError::Configuration(err)
    }
}

/// A record the route could not deliver, after the route's own redelivery policy ran out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeliveryError {
    attempts: u32,
    cause: EngineError,
}

impl DeliveryError {
    pub fn new(attempts: u32, cause: EngineError) -> Self {
        Self { attempts, cause }
    }

    /// Number of delivery attempts made, including the first one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn cause(&self) -> &EngineError {
        &self.cause
    }
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "delivery failed after {} attempt(s): {}",
            self.attempts, self.cause
        )
    }
}

impl Error for DeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Per-record dispatch failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    /// No route is active; the record was not submitted.
    NotActive,
    Delivery(DeliveryError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::NotActive => write!(f, "route is not active"),
            DispatchError::Delivery(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::NotActive => None,
            DispatchError::Delivery(err) => Some(err),
        }
    }
}

impl From<DeliveryError> for DispatchError {
    fn from(err: DeliveryError) -> Self {
        DispatchError::Delivery(err)
    }
}
