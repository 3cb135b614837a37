//! End-to-end behaviour of a client session: facade, supervisor loop,
//! router, and store together, with the recording doubles standing in for
//! the server and the page.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uib_runtime::testing::{Injected, RecordingDocument, RecordingTransport, TransportCall};
use uib_runtime::{
    ConnectionState, EventSender, SupervisorExit, TransportEvent, UiBuilder, event_channel,
};
use uib_settings::{ClientSettings, RetrySettings, load_settings_from_str};

struct Session {
    ui: UiBuilder,
    events: EventSender,
    transport: Arc<RecordingTransport>,
    document: Arc<RecordingDocument>,
    cancel: CancellationToken,
    handle: JoinHandle<SupervisorExit>,
}

impl Session {
    fn start(settings: ClientSettings) -> Self {
        let transport = Arc::new(RecordingTransport::new());
        let document = Arc::new(RecordingDocument::new());
        let (ui, supervisor) = UiBuilder::new(
            settings,
            "/uibuilder/dashboard/",
            transport.clone(),
            document.clone(),
        );
        let (events, rx) = event_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervisor.run(rx, cancel.clone()));
        Self {
            ui,
            events,
            transport,
            document,
            cancel,
            handle,
        }
    }

    fn classic() -> Self {
        Self::start(ClientSettings {
            retry: RetrySettings {
                watch_startup: false,
                ..RetrySettings::unbounded()
            },
            ..ClientSettings::default()
        })
    }

    async fn push(&self, event: TransportEvent) {
        self.events.send(event).unwrap();
        settle().await;
    }

    async fn stop(self) -> SupervisorExit {
        self.cancel.cancel();
        self.handle.await.unwrap()
    }
}

/// Let the supervisor drain its queue without moving the clock far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn recorder(ui: &UiBuilder, name: &str) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    ui.on_change(name, move |v| sink.lock().push(v.clone()));
    seen
}

#[tokio::test(start_paused = true)]
async fn plain_data_message() {
    let s = Session::classic();
    s.push(TransportEvent::Connect).await;
    s.push(TransportEvent::message("uiBuilder", json!({"payload": 5})))
        .await;

    assert_eq!(s.ui.get("msg"), Some(json!({"payload": 5})));
    assert_eq!(s.ui.get("msgsReceived"), Some(json!(1)));
    assert!(s.document.injected().is_empty());
    assert_eq!(s.stop().await, SupervisorExit::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn script_message_is_injected_and_stripped() {
    let s = Session::classic();
    s.push(TransportEvent::message(
        "uiBuilder",
        json!({"script": "console.log(1)"}),
    ))
    .await;

    assert_eq!(
        s.document.injected(),
        vec![Injected::Script("console.log(1)".into())]
    );
    let msg = s.ui.msg();
    assert!(msg.get("script").is_none());
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn control_message_turns_debug_on() {
    let s = Session::classic();
    assert!(!s.ui.debug());
    s.push(TransportEvent::message("uiBuilderControl", json!({"debug": true})))
        .await;

    assert!(s.ui.debug());
    assert_eq!(s.ui.get("ctrlMsg"), Some(json!({"debug": true})));
    assert_eq!(s.ui.get("msgsCtrl"), Some(json!(1)));
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn server_disconnect_arms_retry_and_transport_close_does_not() {
    let s = Session::classic();
    s.push(TransportEvent::Connect).await;
    assert!(s.ui.is_connected());

    s.push(TransportEvent::disconnect("io server disconnect")).await;
    assert!(!s.ui.is_connected());
    assert_eq!(s.ui.connection_state(), ConnectionState::Retrying);
    assert!(s.ui.get("timerid").is_some_and(|id| id.is_u64()));

    s.push(TransportEvent::Connect).await;
    assert_eq!(s.ui.get("timerid"), Some(Value::Null));

    s.push(TransportEvent::disconnect("transport close")).await;
    assert!(!s.ui.is_connected());
    assert_eq!(s.ui.connection_state(), ConnectionState::Idle);
    assert_eq!(s.ui.get("timerid"), Some(Value::Null));

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(s.transport.opens(), 1);
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn retry_delays_grow_by_factor() {
    let s = Session::classic();
    s.push(TransportEvent::Connect).await;
    s.push(TransportEvent::disconnect("io server disconnect")).await;
    s.transport.clear();

    // Attempts land at 2000, 5000, 9500, 16250ms after the disconnect.
    let mut elapsed = 0;
    for (gap, expected_opens) in [(2000, 1), (3000, 2), (4500, 3), (6750, 4)] {
        tokio::time::sleep(Duration::from_millis(gap - 2)).await;
        elapsed += gap;
        assert_eq!(
            s.transport.opens(),
            expected_opens - 1,
            "fired early at {elapsed}ms"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(s.transport.opens(), expected_opens, "missed {elapsed}ms");
    }
    assert_eq!(s.transport.closes(), 4);
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn retry_delay_respects_cap() {
    let settings = load_settings_from_str(
        r#"{"retry": {"initialDelayMs": 1000, "factor": 10, "maxDelayMs": 5000, "watchStartup": false}}"#,
    )
    .unwrap();
    let s = Session::start(settings);
    s.push(TransportEvent::disconnect("io server disconnect")).await;
    s.transport.clear();

    // 1000, then capped at 5000 each time
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(s.transport.opens(), 1);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(s.transport.opens(), 2);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(s.transport.opens(), 3);
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn startup_watchdog_retries_until_first_connect() {
    let s = Session::start(ClientSettings::default());
    settle().await;
    assert_eq!(s.ui.connection_state(), ConnectionState::Connecting);
    assert!(s.ui.get("timerid").is_some_and(|id| !id.is_null()));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(s.transport.opens(), 2);
    assert_eq!(s.ui.connection_state(), ConnectionState::Retrying);

    s.push(TransportEvent::Connect).await;
    assert_eq!(s.ui.connection_state(), ConnectionState::Connected);
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(s.transport.opens(), 2);
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn send_emits_once_on_client_channel() {
    let s = Session::classic();
    s.ui.send(json!({"payload": "x"}));

    assert_eq!(s.ui.get("sentMsg"), Some(json!({"payload": "x"})));
    assert_eq!(s.ui.get("msgsSent"), Some(json!(1)));
    let emits: Vec<TransportCall> = s
        .transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, TransportCall::Emit { .. }))
        .collect();
    assert_eq!(
        emits,
        vec![TransportCall::Emit {
            channel: "uiBuilderClient".into(),
            message: json!({"payload": "x"}),
        }]
    );
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn counters_only_grow() {
    let s = Session::classic();
    for n in 1..=5 {
        s.push(TransportEvent::message("uiBuilder", json!(n))).await;
        s.ui.send(json!({"n": n}));
    }
    s.push(TransportEvent::message("uiBuilderControl", Value::Null))
        .await;

    assert_eq!(s.ui.get("msgsReceived"), Some(json!(5)));
    assert_eq!(s.ui.get("msgsSent"), Some(json!(5)));
    assert_eq!(s.ui.get("msgsCtrl"), Some(json!(1)));
    s.ui.set("msgsReceived", 0);
    assert_eq!(s.ui.get("msgsReceived"), Some(json!(5)));
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn listeners_fire_in_order_and_survive_a_panic() {
    let s = Session::classic();
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        let order = order.clone();
        s.ui.on_change("msg", move |_| order.lock().push(tag));
        if tag == "first" {
            s.ui.on_change("msg", |_| panic!("bad listener"));
        }
    }
    s.push(TransportEvent::message("uiBuilder", json!({"payload": 1})))
        .await;

    assert_eq!(*order.lock(), vec!["first", "second"]);
    assert_eq!(s.ui.get("msgsReceived"), Some(json!(1)));
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn listener_registered_early_sees_first_value() {
    let s = Session::classic();
    let seen = recorder(&s.ui, "temperature");
    s.ui.set("temperature", 21.5);
    assert_eq!(*seen.lock(), vec![json!(21.5)]);
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn protected_writes_emit_nothing() {
    let s = Session::classic();
    let seen = recorder(&s.ui, "msg");
    s.ui.set("msg", json!({"forged": true}));
    s.ui.set("send", "nope");
    assert!(seen.lock().is_empty());
    assert_eq!(s.ui.msg(), json!({}));
    let _ = s.stop().await;
}

#[tokio::test(start_paused = true)]
async fn closing_the_event_channel_stops_the_loop() {
    let s = Session::classic();
    let Session {
        events, handle, ..
    } = s;
    drop(events);
    assert_eq!(handle.await.unwrap(), SupervisorExit::EventsClosed);
}
