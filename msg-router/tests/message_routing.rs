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


mod support;

use integration_test_utils::{recording_handler, MessageLog};
use msg_router::{ns, state, Message, RouterConfig, RouterContext, SinkMode, Value};
use support::{echo_entity, recording_frontend, volume, FOREIGN_CLIENT};

#[test]
fn reply_returns_to_originating_frontend_only() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    let (frontend_a, log_a) = recording_frontend(&ctx, &player);
    let (_frontend_b, log_b) = recording_frontend(&ctx, &player);

    frontend_a.cmd_sink().put_copy(&volume(0.25));

    let replies = log_a.snapshot();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].is(ns::STATE, state::STATE_CHANGED));
    assert_eq!(replies[0].client_id(), Some(frontend_a.id()));
    assert!(log_b.is_empty());
}

#[test]
fn reply_through_bridge_is_not_forwarded_back_upstream() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);

    let bystanders = MessageLog::new();
    let tap = ctx.sink(recording_handler(&bystanders));
    player.evt_hub().connect(&tap);

    let bridge = ctx.bridge(&player);
    let (frontend_a, log_a) = recording_frontend(&ctx, bridge.controllable());
    let (frontend_b, log_b) = recording_frontend(&ctx, bridge.controllable());

    frontend_a.cmd_sink().put_copy(&volume(0.5));

    assert_eq!(log_a.len(), 1);
    assert!(log_b.is_empty());
    assert!(bridge
        .control()
        .evt_sink()
        .routing_table()
        .contains(frontend_a.id()));
    assert!(!bridge
        .control()
        .evt_sink()
        .routing_table()
        .contains(frontend_b.id()));

    // Only the bridge claims the addressed reply at the entity's hub.
    assert!(bystanders.is_empty());
}

#[test]
fn unaddressed_events_fan_out_through_bridge() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    let bridge = ctx.bridge(&player);
    let frontends: Vec<_> = (0..3)
        .map(|_| recording_frontend(&ctx, bridge.controllable()))
        .collect();

    player
        .evt_sink()
        .put_copy(&Message::state_changed(true, "audio", "mute", 1));

    for (_, log) in &frontends {
        assert_eq!(log.ids(), vec![(ns::STATE, state::STATE_CHANGED)]);
    }
}

#[test]
fn late_frontend_receives_cached_state_first() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    player
        .evt_sink()
        .put_copy(&Message::state_changed(false, "audio", "volume", 0.75));
    player
        .evt_sink()
        .put_copy(&Message::state_changed(true, "audio", "mute", 0));

    let (_frontend, log) = recording_frontend(&ctx, &player);

    let replayed = log.snapshot();
    assert_eq!(replayed.len(), 2);
    let volume = replayed
        .iter()
        .find_map(|msg| match msg.state_parts() {
            Some((_, "audio", "volume", value)) => Some(value.clone()),
            _ => None,
        })
        .expect("volume should be replayed");
    assert_eq!(volume, Value::Float(0.75));
    let last_flags: Vec<_> = replayed
        .iter()
        .filter_map(|msg| msg.state_parts().map(|(last, ..)| last))
        .collect();
    assert_eq!(last_flags, vec![false, true]);
}

#[test]
fn routing_table_keeps_most_recent_ids_up_to_configured_capacity() {
    let ctx = RouterContext::new(RouterConfig {
        routing_table_capacity: 2,
        ..RouterConfig::default()
    })
    .expect("config should be valid");
    let sink = ctx.queue_sink();
    let ids = [
        "11111111-1111-4111-8111-111111111111",
        "22222222-2222-4222-8222-222222222222",
        "33333333-3333-4333-8333-333333333333",
    ];

    sink.routing_table().insert(ids[0]);
    sink.routing_table().insert(ids[0]);
    assert_eq!(sink.routing_table().len(), 1);

    sink.routing_table().insert(ids[1]);
    sink.routing_table().insert(ids[0]);
    sink.routing_table().insert(ids[2]);

    assert!(sink.has_id(ids[0]));
    assert!(!sink.has_id(ids[1]));
    assert!(sink.has_id(ids[2]));
}

#[test]
fn buffered_frontend_drains_replies_in_fifo_order() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    let frontend = ctx.control(ctx.queue_sink());
    player.connect(&frontend);

    for value in [1, 2, 3] {
        frontend
            .cmd_sink()
            .put_copy(&Message::set_state(true, "track", "position", value));
    }

    let mut positions = Vec::new();
    while let Some(msg) = frontend.evt_sink().get_read().expect("sink is buffered") {
        positions.push(msg.arg(3).and_then(Value::as_int));
        frontend.evt_sink().done_read(msg);
    }
    assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn foreign_client_id_is_kept_and_recorded_by_control() {
    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    let (frontend, log) = recording_frontend(&ctx, &player);

    let mut cmd = volume(0.1);
    cmd.set_client_id(FOREIGN_CLIENT);
    frontend.cmd_sink().put_copy(&cmd);

    assert!(frontend.evt_sink().routing_table().contains(FOREIGN_CLIENT));
    let replies = log.snapshot();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].client_id(), Some(FOREIGN_CLIENT));
}

#[test]
fn hub_in_buffered_mode_routes_on_iteration() {
    let ctx = RouterContext::default();
    let hub = ctx.hub(SinkMode::Buffered);
    let log = MessageLog::new();
    let member = ctx.sink(recording_handler(&log));
    hub.connect(&member);

    hub.post(&Message::new(ns::PLAYER, 9));
    assert!(log.is_empty());

    assert!(hub.sink().iteration());
    assert_eq!(log.ids(), vec![(ns::PLAYER, 9)]);
}
