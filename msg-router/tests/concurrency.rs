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

use integration_test_utils::{recording_handler, wait_for_len, wait_until, MessageLog};
use msg_router::{ns, spawn_pump, Message, MsgSink, RouterContext, SinkMode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use support::{echo_entity, recording_frontend, volume};

const WRITERS: usize = 8;
const MESSAGES_PER_WRITER: usize = 200;

#[test]
fn concurrent_writers_are_serialized_on_synchronous_sink() {
    integration_test_utils::init_logging();

    let in_handler = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let torn = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(AtomicUsize::new(0));

    let sink = {
        let in_handler = in_handler.clone();
        let overlaps = overlaps.clone();
        let torn = torn.clone();
        let delivered = delivered.clone();
        MsgSink::new(
            move |msg: &mut Message| {
                if in_handler.swap(true, Ordering::SeqCst) {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                let writer = Some(msg.id() as i32);
                let intact = msg.args().len() == 3
                    && msg.arg(0).and_then(|value| value.as_int()) == writer
                    && msg.arg(2).and_then(|value| value.as_int()) == writer;
                if !intact {
                    torn.fetch_add(1, Ordering::SeqCst);
                }
                delivered.fetch_add(1, Ordering::SeqCst);
                in_handler.store(false, Ordering::SeqCst);
                true
            },
            SinkMode::Synchronous,
        )
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let sink = sink.clone();
            thread::spawn(move || {
                for seq in 0..MESSAGES_PER_WRITER {
                    let mut slot = sink.get();
                    slot.set_ns_id(ns::PLAYER, writer as u32);
                    slot.push_arg(writer as i32);
                    slot.push_arg(seq as i32);
                    slot.push_arg(writer as i32);
                    slot.put();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread should not panic");
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(torn.load(Ordering::SeqCst), 0);
    assert_eq!(
        delivered.load(Ordering::SeqCst),
        WRITERS * MESSAGES_PER_WRITER
    );
}

#[test]
fn concurrent_writers_keep_per_writer_order_in_buffered_sink() {
    let sink = MsgSink::detached();

    let writers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let sink = sink.clone();
            thread::spawn(move || {
                for seq in 0..MESSAGES_PER_WRITER {
                    let mut msg = Message::new(ns::PLAYER, writer as u32);
                    msg.push_arg(seq as i32);
                    sink.put_copy(&msg);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread should not panic");
    }

    let mut next_seq = vec![0; WRITERS];
    while let Some(msg) = sink.get_read().expect("sink is buffered") {
        let writer = msg.id() as usize;
        let seq = msg.arg(0).and_then(|value| value.as_int()).unwrap_or(-1);
        assert_eq!(seq, next_seq[writer]);
        next_seq[writer] += 1;
        sink.done_read(msg);
    }
    assert!(next_seq
        .iter()
        .all(|count| *count == MESSAGES_PER_WRITER as i32));
}

#[test]
fn disconnect_during_broadcast_stops_delivery_to_removed_sink() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let hub = Arc::new(ctx.hub(SinkMode::Synchronous));

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let resume_rx = Mutex::new(resume_rx);

    // First member parks the broadcast until the other thread has disconnected `late`.
    let blocker = ctx.sink(move |_msg: &mut Message| {
        let _ = entered_tx.lock().expect("lock").send(());
        let _ = resume_rx
            .lock()
            .expect("lock")
            .recv_timeout(Duration::from_secs(5));
        true
    });
    let late_log = MessageLog::new();
    let late = ctx.sink(recording_handler(&late_log));

    hub.connect(&blocker);
    hub.connect(&late);

    let disconnector = {
        let hub = hub.clone();
        let late = late.clone();
        thread::spawn(move || {
            entered_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("broadcast should reach the first sink");
            let removed = hub.disconnect(&late);
            let _ = resume_tx.send(());
            removed
        })
    };

    hub.post(&Message::new(ns::PLAYER, 1));

    assert!(disconnector.join().expect("disconnector should not panic"));
    assert!(late_log.is_empty());
    assert_eq!(hub.num_sinks(), 1);
}

#[test]
fn disconnect_while_hub_waits_on_busy_sink_stops_delivery() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let hub = Arc::new(ctx.hub(SinkMode::Synchronous));

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let resume_rx = Mutex::new(resume_rx);
    let disconnected = Arc::new(AtomicBool::new(false));
    let delivered = Arc::new(AtomicUsize::new(0));
    let after_disconnect = Arc::new(AtomicUsize::new(0));

    // The first message parks inside the handler and keeps the write slot busy.
    let target = {
        let disconnected = disconnected.clone();
        let delivered = delivered.clone();
        let after_disconnect = after_disconnect.clone();
        ctx.sink(move |_msg: &mut Message| {
            if disconnected.load(Ordering::SeqCst) {
                after_disconnect.fetch_add(1, Ordering::SeqCst);
            }
            if delivered.fetch_add(1, Ordering::SeqCst) == 0 {
                let _ = entered_tx.lock().expect("lock").send(());
                let _ = resume_rx
                    .lock()
                    .expect("lock")
                    .recv_timeout(Duration::from_secs(5));
            }
            true
        })
    };
    hub.connect(&target);

    let direct_writer = {
        let target = target.clone();
        thread::spawn(move || target.put_copy(&Message::new(ns::PLAYER, 1)))
    };
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("direct write should reach the handler");

    let hub_writer = {
        let hub = hub.clone();
        thread::spawn(move || hub.post(&Message::new(ns::PLAYER, 2)))
    };
    // Gives the hub time to block on the busy write slot.
    thread::sleep(Duration::from_millis(50));

    assert!(hub.disconnect(&target));
    disconnected.store(true, Ordering::SeqCst);
    resume_tx.send(()).expect("handler should be waiting");

    direct_writer.join().expect("direct writer should not panic");
    hub_writer.join().expect("hub writer should not panic");

    assert_eq!(after_disconnect.load(Ordering::SeqCst), 0);
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert_eq!(hub.num_sinks(), 0);
}

#[test]
fn pumped_entity_serves_commands_from_frontend_thread() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let evt_hub = ctx.hub(SinkMode::Synchronous);
    let events = evt_hub.sink().clone();
    let cmd_sink = ctx.buffered_sink(move |cmd: &mut Message| {
        if let Some((last, context, var, value)) = cmd.state_parts() {
            let mut evt = Message::state_changed(last, context, var, value.clone());
            if let Some(client_id) = cmd.client_id() {
                evt.set_client_id(client_id);
            }
            events.put_copy(&evt);
        }
        true
    });
    let player = ctx.controllable(cmd_sink, evt_hub);
    let pump = ctx
        .spawn_pump("player", player.cmd_sink().clone())
        .expect("pump should spawn");

    let (frontend, log) = recording_frontend(&ctx, &player);
    frontend.cmd_sink().put_copy(&volume(0.3));

    assert!(wait_for_len(&log, 1, Duration::from_secs(2)));
    assert_eq!(log.snapshot()[0].client_id(), Some(frontend.id()));

    pump.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn pump_exits_after_quit_command() {
    integration_test_utils::init_logging();

    let log = MessageLog::new();
    let sink = MsgSink::new(recording_handler(&log), SinkMode::Buffered);
    let pump = spawn_pump("quit-test", sink.clone(), Duration::from_millis(1))
        .expect("pump should spawn");

    sink.put_copy(&Message::new(ns::PLAYER, 1));
    sink.put_copy(&Message::quit());
    sink.put_copy(&Message::new(ns::PLAYER, 2));

    let finished = tokio::time::timeout(Duration::from_secs(2), async {
        while !pump.is_finished() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;

    assert!(finished.is_ok());
    assert_eq!(log.ids(), vec![(ns::PLAYER, 1)]);
    assert_eq!(sink.pending(), 1);
    pump.stop();
}

#[test]
fn synchronous_entity_handles_commands_from_many_frontends() {
    integration_test_utils::init_logging();

    let ctx = RouterContext::default();
    let player = echo_entity(&ctx);
    let frontends: Vec<_> = (0..4)
        .map(|_| recording_frontend(&ctx, &player))
        .collect();

    thread::scope(|scope| {
        for (frontend, _) in &frontends {
            scope.spawn(move || {
                for step in 0..50 {
                    frontend.cmd_sink().put_copy(&volume(f64::from(step)));
                }
            });
        }
    });

    for (frontend, log) in &frontends {
        assert!(wait_until(Duration::from_secs(1), || log.len() == 50));
        assert!(log
            .snapshot()
            .iter()
            .all(|msg| msg.client_id() == Some(frontend.id())));
    }
}
