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


use msg_router::{RouterConfig, Value};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) router: RouterConfig,
    #[serde(default)]
    pub(crate) settle_ms: Option<u64>,
    pub(crate) entities: Vec<EntityConfig>,
    #[serde(default)]
    pub(crate) proxies: Vec<LinkConfig>,
    pub(crate) frontends: Vec<LinkConfig>,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub(crate) name: String,
    /// Whether commands are queued and served by a pump thread.
    #[serde(default)]
    pub(crate) buffered: bool,
}

/// A proxy or frontend attached to a named entity or proxy.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub(crate) name: String,
    pub(crate) upstream: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    pub(crate) frontend: String,
    pub(crate) ctx: String,
    pub(crate) var: String,
    pub(crate) value: ScriptValue,
    #[serde(default)]
    pub(crate) relative: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScriptValue {
    Int(i32),
    Float(f64),
    Text(String),
}

impl From<ScriptValue> for Value {
    fn from(value: ScriptValue) -> Self {
        match value {
            ScriptValue::Int(v) => Value::Int(v),
            ScriptValue::Float(v) => Value::Float(v),
            ScriptValue::Text(v) => Value::String(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ScriptValue};

    #[test]
    fn parses_topology_with_defaults() {
        let config: Config = json5::from_str(
            r#"{
                entities: [{ name: "player" }],
                frontends: [{ name: "gui", upstream: "player" }],
                script: [
                    { frontend: "gui", ctx: "audio", var: "volume", value: 0.5 },
                    { frontend: "gui", ctx: "audio", var: "volume", value: 1, relative: true },
                    { frontend: "gui", ctx: "track", var: "title", value: "intro" },
                ],
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.router.routing_table_capacity, 32);
        assert!(config.proxies.is_empty());
        assert!(!config.entities[0].buffered);
        assert_eq!(config.script[0].value, ScriptValue::Float(0.5));
        assert_eq!(config.script[1].value, ScriptValue::Int(1));
        assert!(config.script[1].relative);
        assert_eq!(config.script[2].value, ScriptValue::Text("intro".to_string()));
    }

    #[test]
    fn sample_config_parses() {
        let config: Config =
            json5::from_str(include_str!("../configs/player_with_remote.json5"))
                .expect("sample config should parse");

        assert_eq!(config.frontends.len(), 2);
        assert_eq!(config.script.len(), 4);
        assert!(config.router.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = json5::from_str::<Config>(
            r#"{ entities: [], frontends: [], transports: {} }"#,
        );

        assert!(result.is_err());
    }
}
