/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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
mod topology;

use crate::config::Config;
use crate::topology::Topology;
use clap::Parser;
use msg_router::{RouterContext, RouterError};
use std::fs;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pump intervals to wait for in-flight messages after the script ran.
const DEFAULT_SETTLE_INTERVALS: u32 = 10;

#[derive(Parser)]
#[command()]
struct RouterArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
    /// Keep the topology running until Ctrl-C once the script is done.
    #[arg(long)]
    hold: bool,
}

#[tokio::main]
async fn main() -> Result<(), RouterError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    info!("Started configurable-router");

    let args = RouterArgs::parse();
    let contents = fs::read_to_string(&args.config).map_err(|e| {
        RouterError::InvalidConfig(format!("Unable to read config file {}: {e}", args.config))
    })?;
    let config: Config = json5::from_str(&contents)
        .map_err(|e| RouterError::InvalidConfig(format!("Unable to parse config file: {e}")))?;

    let ctx = RouterContext::new(config.router.clone())?;
    let topology = Topology::build(&ctx, &config)?;
    topology.run_script(&config.script)?;

    let settle = config.settle_ms.map_or_else(
        || ctx.config().pump_interval() * DEFAULT_SETTLE_INTERVALS,
        Duration::from_millis,
    );
    tokio::time::sleep(settle).await;

    if args.hold {
        info!("Script done, waiting for Ctrl-C");
        tokio::signal::ctrl_c().await?;
    }

    topology.shutdown();
    info!("Stopped configurable-router");
    Ok(())
}
