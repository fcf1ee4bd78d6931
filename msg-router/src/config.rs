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

//! Tunables for sinks, controls and the pump runtime.

use crate::error::RouterError;
use crate::routing::routing_table::DEFAULT_ROUTING_TABLE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_PUMP_INTERVAL_MS: u64 = 20;
const DEFAULT_FUNCTION_POLL_INTERVAL_MS: u64 = 20;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct RouterConfig {
    /// Number of remote client ids each sink remembers for addressed delivery.
    pub routing_table_capacity: usize,
    pub pump_interval_ms: u64,
    pub function_poll_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routing_table_capacity: DEFAULT_ROUTING_TABLE_CAPACITY,
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            function_poll_interval_ms: DEFAULT_FUNCTION_POLL_INTERVAL_MS,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.routing_table_capacity == 0 {
            return Err(RouterError::InvalidConfig(
                "routing_table_capacity must be at least 1".to_string(),
            ));
        }
        if self.pump_interval_ms == 0 || self.function_poll_interval_ms == 0 {
            return Err(RouterError::InvalidConfig(
                "poll intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    pub fn function_poll_interval(&self) -> Duration {
        Duration::from_millis(self.function_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::RouterConfig;

    #[test]
    fn default_config_is_valid() {
        let config = RouterConfig::default();

        assert_eq!(config.routing_table_capacity, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: RouterConfig =
            serde_json::from_str(r#"{ "routing_table_capacity": 4 }"#).expect("parse");

        assert_eq!(config.routing_table_capacity, 4);
        assert_eq!(config.pump_interval_ms, 20);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = RouterConfig {
            routing_table_capacity: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<RouterConfig>(r#"{ "capacity": 4 }"#);

        assert!(parsed.is_err());
    }
}
