//! Delivery endpoints the local engine can resolve from a URI.

use crate::engine::local::endpoint_uri::EndpointUri;
use crate::engine::local::mock::{MockEndpoint, MockEndpoints};
use crate::error::{EngineError, EngineErrorKind};
use crate::observability::{event_at_level, events};
use crate::settings::RouteLogLevel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

const COMPONENT: &str = "local_endpoint";
const LOG_LEVEL_PARAM: &str = "level";

pub(crate) const LOCAL_SCHEME: &str = "local";
const MOCK_SCHEME: &str = "mock";
const LOG_SCHEME: &str = "log";
const FILE_SCHEME: &str = "file";

/// A resolved, deliverable endpoint.
pub(crate) enum DeliveryEndpoint {
    Mock(Arc<MockEndpoint>),
    Log { category: String, level: RouteLogLevel },
    File(PathBuf),
}

impl DeliveryEndpoint {
    /// Syntax and scheme checks only; used when a configuration is applied.
    pub(crate) fn validate(uri: &EndpointUri) -> Result<(), EngineError> {
        match uri.scheme() {
            MOCK_SCHEME | FILE_SCHEME => Ok(()),
            LOG_SCHEME => Self::log_level(uri).map(|_| ()),
            other => Err(EngineError::new(
                EngineErrorKind::UnknownScheme,
                format!("no endpoint component for scheme {other:?} in {uri}"),
            )),
        }
    }

    /// Binds the endpoint behind `uri`; fails when it cannot be reached at route start.
    pub(crate) async fn resolve(
        uri: &EndpointUri,
        mock_endpoints: &MockEndpoints,
    ) -> Result<Self, EngineError> {
        Self::validate(uri)?;
        match uri.scheme() {
            MOCK_SCHEME => mock_endpoints.resolve(uri.path()).map(DeliveryEndpoint::Mock),
            LOG_SCHEME => Ok(DeliveryEndpoint::Log {
                category: uri.path().to_string(),
                level: Self::log_level(uri)?,
            }),
            _ => {
                let path = PathBuf::from(uri.path());
                let parent = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                Self::ensure_directory(&parent).await?;
                Ok(DeliveryEndpoint::File(path))
            }
        }
    }

    pub(crate) async fn deliver(&self, body: &str) -> Result<(), EngineError> {
        match self {
            DeliveryEndpoint::Mock(endpoint) => endpoint.deliver(body),
            DeliveryEndpoint::Log { category, level } => {
                event_at_level!(
                    *level,
                    event = events::LOCAL_LOG_ENDPOINT_BODY,
                    component = COMPONENT,
                    category = category.as_str(),
                    body,
                    "log endpoint received body"
                );
                Ok(())
            }
            DeliveryEndpoint::File(path) => Self::append_line(path, body).await,
        }
    }

    fn log_level(uri: &EndpointUri) -> Result<RouteLogLevel, EngineError> {
        match uri.query_param(LOG_LEVEL_PARAM) {
            None => Ok(RouteLogLevel::Info),
            Some(raw) => raw.parse().map_err(|reason: String| {
                EngineError::new(
                    EngineErrorKind::InvalidUri,
                    format!("bad log level {raw:?} in {uri}: {reason}"),
                )
            }),
        }
    }

    async fn ensure_directory(directory: &Path) -> Result<(), EngineError> {
        match tokio::fs::metadata(directory).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(EngineError::new(
                EngineErrorKind::Unreachable,
                format!("{} is not a directory", directory.display()),
            )),
            Err(err) => Err(EngineError::new(
                EngineErrorKind::Unreachable,
                format!("directory {} is not accessible: {err}", directory.display()),
            )),
        }
    }

    async fn append_line(path: &Path, body: &str) -> Result<(), EngineError> {
        let io_error = |err: std::io::Error| {
            EngineError::new(
                EngineErrorKind::Io,
                format!("write to {} failed: {err}", path.display()),
            )
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(io_error)?;
        let mut line = String::with_capacity(body.len() + 1);
        line.push_str(body);
        line.push('\n');
        file.write_all(line.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)
    }
}
