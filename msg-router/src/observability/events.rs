//! Canonical structured event names used across `msg-router`.

// Sink and queue events.
pub const SINK_QUEUE_MERGED: &str = "sink_queue_merged";
pub const SINK_QUIT_RECEIVED: &str = "sink_quit_received";
pub const SINK_READ_ON_SYNCHRONOUS: &str = "sink_read_on_synchronous";
pub const SINK_DRAIN_DONE: &str = "sink_drain_done";
pub const SINK_CLEANUP: &str = "sink_cleanup";

// Routing-table events.
pub const ROUTING_TABLE_INVALID_ID: &str = "routing_table_invalid_id";
pub const ROUTING_TABLE_EVICT: &str = "routing_table_evict";

// Hub events.
pub const HUB_CONNECT: &str = "hub_connect";
pub const HUB_DISCONNECT: &str = "hub_disconnect";
pub const HUB_DISCONNECT_UNKNOWN: &str = "hub_disconnect_unknown";
pub const HUB_DELIVER_ADDRESSED: &str = "hub_deliver_addressed";
pub const HUB_ADDRESSED_NO_MATCH: &str = "hub_addressed_no_match";
pub const HUB_STATE_REPLAY: &str = "hub_state_replay";

// Control-plane events.
pub const CONTROL_CREATE: &str = "control_create";
pub const CONTROL_LOCAL_DELIVERY: &str = "control_local_delivery";
pub const CONTROL_STAMP_CLIENT_ID: &str = "control_stamp_client_id";
pub const CONTROL_RECORD_ROUTE: &str = "control_record_route";
pub const CONTROL_FORWARD: &str = "control_forward";
pub const CONTROL_UPSTREAM_GONE: &str = "control_upstream_gone";
pub const CONTROLLABLE_CONNECT: &str = "controllable_connect";
pub const CONTROLLABLE_DISCONNECT: &str = "controllable_disconnect";
pub const FUNCTION_CALL_START: &str = "function_call_start";
pub const FUNCTION_CALL_OK: &str = "function_call_ok";
pub const FUNCTION_CALL_TIMEOUT: &str = "function_call_timeout";

// Pump runtime events.
pub const PUMP_THREAD_NAME_FALLBACK: &str = "pump_thread_name_fallback";
pub const PUMP_SPAWN_START: &str = "pump_spawn_start";
pub const PUMP_SPAWN_OK: &str = "pump_spawn_ok";
pub const PUMP_SPAWN_FAILED: &str = "pump_spawn_failed";
pub const PUMP_RUNTIME_FAILED: &str = "pump_runtime_failed";
pub const PUMP_STOPPED: &str = "pump_stopped";
pub const PUMP_QUIT: &str = "pump_quit";
