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

mod config;

use crate::config::{Config, ConfigError, OutputFormat};
use clap::Parser;
use route_bridge::{
    ActivationError, DispatchError, Dispatcher, LocalEngine, RouteLifecycleManager,
};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Forwards stdin records through a provisioned route")]
struct BridgeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[derive(Debug)]
enum BridgeError {
    Config(ConfigError),
    Activation(ActivationError),
    Io(std::io::Error),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Config(err) => write!(f, "{err}"),
            BridgeError::Activation(err) => write!(f, "route activation failed: {err}"),
            BridgeError::Io(err) => write!(f, "record stream failed: {err}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::Config(err) => Some(err),
            BridgeError::Activation(err) => Some(err),
            BridgeError::Io(err) => Some(err),
        }
    }
}

#[derive(Serialize)]
struct ForwardedLine<'a> {
    record: &'a str,
    delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn render(record: &str, outcome: &Result<(), DispatchError>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => record.to_string(),
        OutputFormat::Json => {
            let line = ForwardedLine {
                record,
                delivered: outcome.is_ok(),
                error: outcome.as_ref().err().map(ToString::to_string),
            };
            serde_json::to_string(&line).unwrap_or_else(|_| record.to_string())
        }
    }
}

/// Forwards every line of `records` through `dispatcher` and echoes it to `out`.
///
/// Returns at end of input or as soon as `shutdown` resolves, including while a record
/// is still being delivered.
async fn forward_records<R, W, S>(
    dispatcher: &Dispatcher,
    records: R,
    mut out: W,
    shutdown: S,
    format: OutputFormat,
) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut records = records.lines();

    loop {
        let record = tokio::select! {
            record = records.next_line() => record.map_err(BridgeError::Io)?,
            _ = &mut shutdown => {
                info!("Interrupted; stopping route");
                return Ok(());
            }
        };
        let Some(record) = record else {
            return Ok(());
        };

        // Every record is forwarded onward; a failed dispatch is only logged.
        let outcome = tokio::select! {
            outcome = dispatcher.send(&record) => outcome,
            _ = &mut shutdown => {
                info!("Interrupted during delivery; stopping route");
                return Ok(());
            }
        };
        if let Err(err) = &outcome {
            warn!(err = %err, "Record was not delivered");
        }
        let mut line = render(&record, &outcome, format);
        line.push('\n');
        out.write_all(line.as_bytes()).await.map_err(BridgeError::Io)?;
        out.flush().await.map_err(BridgeError::Io)?;
    }
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(err = %err, "Unable to listen for Ctrl-C; stop the bridge by closing stdin");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args = BridgeArgs::parse();
    let config = Config::load(&args.config).map_err(BridgeError::Config)?;

    info!("Started route-bridge instance {}", config.instance_name);

    let engine = Arc::new(LocalEngine::new(&config.instance_name));
    let manager = RouteLifecycleManager::new(&config.instance_name, engine);
    let identity = manager
        .activate(&config.settings)
        .await
        .map_err(BridgeError::Activation)?;
    info!("Route {identity} is active");

    let forwarded = forward_records(
        &manager.dispatcher(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        ctrl_c(),
        config.output,
    )
    .await;

    let report = manager.deactivate().await;
    if !report.is_clean() {
        warn!(failed_steps = ?report.failed_steps(), "Route teardown was incomplete");
    }

    forwarded
}
