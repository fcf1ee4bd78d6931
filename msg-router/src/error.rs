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

//! Error type shared by the read-side, function-call and configuration APIs.
//!
//! Routing decisions never produce errors; a forward that cannot be delivered is dropped.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("read-side access on a synchronous sink")]
    SynchronousSink,
    #[error("function call timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("message codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
