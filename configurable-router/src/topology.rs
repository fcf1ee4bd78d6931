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


use crate::config::{Config, EntityConfig, LinkConfig, ScriptStep};
use msg_router::{
    ns, state, Control, ControlBridge, Controllable, Message, PumpHandle, RouterContext,
    RouterError, SinkMode, Value,
};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

struct Frontend {
    control: Arc<Control>,
    events: Arc<Mutex<Vec<Message>>>,
}

/// Entities, proxies and frontends wired from a [`Config`].
pub(crate) struct Topology {
    nodes: HashMap<String, Arc<Controllable>>,
    // Keeps proxy controls attached to their upstream.
    bridges: Vec<ControlBridge>,
    frontends: BTreeMap<String, Frontend>,
    pumps: Vec<PumpHandle>,
}

impl Topology {
    pub(crate) fn build(ctx: &RouterContext, config: &Config) -> Result<Self, RouterError> {
        let mut topology = Self {
            nodes: HashMap::new(),
            bridges: Vec::new(),
            frontends: BTreeMap::new(),
            pumps: Vec::new(),
        };
        let mut names = HashSet::new();

        for entity in &config.entities {
            claim_name(&mut names, &entity.name)?;
            let controllable = topology.build_entity(ctx, entity)?;
            topology.nodes.insert(entity.name.clone(), controllable);
        }

        for proxy in &config.proxies {
            claim_name(&mut names, &proxy.name)?;
            let upstream = topology.upstream(proxy)?;
            let bridge = ctx.bridge(&upstream);
            topology
                .nodes
                .insert(proxy.name.clone(), bridge.controllable().clone());
            topology.bridges.push(bridge);
            info!("Proxy {} forwards to {}", proxy.name, proxy.upstream);
        }

        for frontend in &config.frontends {
            claim_name(&mut names, &frontend.name)?;
            let upstream = topology.upstream(frontend)?;
            let built = topology.build_frontend(ctx, frontend, &upstream)?;
            topology.frontends.insert(frontend.name.clone(), built);
        }

        Ok(topology)
    }

    /// Sends every script step as a state command from its frontend.
    pub(crate) fn run_script(&self, script: &[ScriptStep]) -> Result<(), RouterError> {
        for step in script {
            let frontend = self.frontends.get(&step.frontend).ok_or_else(|| {
                RouterError::InvalidConfig(format!(
                    "Script refers to unknown frontend: {}",
                    step.frontend
                ))
            })?;
            let value = Value::from(step.value.clone());
            let cmd = if step.relative {
                Message::set_state_rel(true, &step.ctx, &step.var, value)
            } else {
                Message::set_state(true, &step.ctx, &step.var, value)
            };
            debug!(
                frontend = step.frontend.as_str(),
                ctx = step.ctx.as_str(),
                var = step.var.as_str(),
                relative = step.relative,
                "sending script command"
            );
            frontend.control.cmd_sink().put_copy(&cmd);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn events_seen(&self, frontend: &str) -> Option<Vec<Message>> {
        self.frontends
            .get(frontend)
            .map(|frontend| lock_events(&frontend.events).clone())
    }

    /// Stops every pump and logs what each frontend observed.
    pub(crate) fn shutdown(self) {
        for pump in self.pumps {
            pump.stop();
        }
        for (name, frontend) in &self.frontends {
            info!(
                frontend = name.as_str(),
                num_events = lock_events(&frontend.events).len(),
                "frontend summary"
            );
        }
        drop(self.bridges);
    }

    fn upstream(&self, link: &LinkConfig) -> Result<Arc<Controllable>, RouterError> {
        self.nodes.get(&link.upstream).cloned().ok_or_else(|| {
            RouterError::InvalidConfig(format!(
                "Unknown upstream {} for {}",
                link.upstream, link.name
            ))
        })
    }

    fn build_entity(
        &mut self,
        ctx: &RouterContext,
        entity: &EntityConfig,
    ) -> Result<Arc<Controllable>, RouterError> {
        let evt_hub = ctx.hub(SinkMode::Synchronous);
        let events = evt_hub.sink().clone();
        let name = entity.name.clone();
        let values: Mutex<HashMap<(String, String), Value>> = Mutex::new(HashMap::new());

        let handler = move |cmd: &mut Message| {
            let relative = cmd.is(ns::STATE, state::CMD_SET_STATE_REL);
            if !relative && !cmd.is(ns::STATE, state::CMD_SET_STATE) {
                warn!(entity = name.as_str(), ns = cmd.ns(), id = cmd.id(), "ignoring command");
                return true;
            }
            let Some((last, ctx, var, value)) = cmd.state_parts() else {
                warn!(entity = name.as_str(), "malformed state command");
                return true;
            };

            let mut values = values.lock().unwrap_or_else(PoisonError::into_inner);
            let current = match values.entry((ctx.to_string(), var.to_string())) {
                Entry::Occupied(mut entry) if relative => {
                    if !entry.get_mut().add_delta(value) {
                        warn!(entity = name.as_str(), ctx, var, "delta type mismatch");
                        return true;
                    }
                    entry.get().clone()
                }
                Entry::Occupied(mut entry) => {
                    entry.insert(value.clone());
                    value.clone()
                }
                Entry::Vacant(entry) => entry.insert(value.clone()).clone(),
            };
            info!(entity = name.as_str(), ctx, var, value = ?current, "state changed");
            events.put_copy(&Message::state_changed(last, ctx, var, current));
            true
        };

        let cmd_sink = if entity.buffered {
            let sink = ctx.buffered_sink(handler);
            self.pumps.push(ctx.spawn_pump(&entity.name, sink.clone())?);
            sink
        } else {
            ctx.sink(handler)
        };
        info!(entity = entity.name.as_str(), buffered = entity.buffered, "entity ready");
        Ok(ctx.controllable(cmd_sink, evt_hub))
    }

    fn build_frontend(
        &mut self,
        ctx: &RouterContext,
        frontend: &LinkConfig,
        upstream: &Arc<Controllable>,
    ) -> Result<Frontend, RouterError> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = events.clone();
        let name = frontend.name.clone();

        let evt_sink = ctx.buffered_sink(move |msg: &mut Message| {
            match msg.state_parts() {
                Some((_, ctx, var, value)) => {
                    info!(frontend = name.as_str(), ctx, var, value = ?value, "event")
                }
                None => info!(frontend = name.as_str(), ns = msg.ns(), id = msg.id(), "event"),
            }
            lock_events(&recorded).push(msg.clone());
            true
        });
        self.pumps
            .push(ctx.spawn_pump(&frontend.name, evt_sink.clone())?);

        let control = ctx.control(evt_sink);
        upstream.connect(&control);
        info!(
            frontend = frontend.name.as_str(),
            upstream = frontend.upstream.as_str(),
            "frontend attached"
        );
        Ok(Frontend { control, events })
    }
}

fn claim_name(names: &mut HashSet<String>, name: &str) -> Result<(), RouterError> {
    if names.insert(name.to_string()) {
        Ok(())
    } else {
        Err(RouterError::InvalidConfig(format!(
            "Duplicate name found: {name}"
        )))
    }
}

fn lock_events(events: &Mutex<Vec<Message>>) -> std::sync::MutexGuard<'_, Vec<Message>> {
    events.lock().unwrap_or_else(PoisonError::into_inner)
}
