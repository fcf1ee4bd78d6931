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


mod recording;
pub use recording::{recording_handler, MessageLog};

mod waiting;
pub use waiting::{wait_for_len, wait_until};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Installs a `tracing` fmt subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
