//! End-to-end stream recovery: probe, watchdog and orchestrator wired
//! through a shared state store, with a shell stand-in for the decode tool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use camvisor::{
    Attempt, Bus, ControlChannel, Orchestrator, Probe, RequestError, StateDelta, StateStore,
    StreamLiveness, StreamRequestState, StreamingCommand, Task, Watchdog,
};

/// Captures crate logs per test; enable with `RUST_LOG=camvisor=debug`.
fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct RecordingChannel {
    calls: Mutex<Vec<StreamingCommand>>,
    reject_starts: bool,
}

impl RecordingChannel {
    fn arc(reject_starts: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject_starts,
        })
    }

    fn starts(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == StreamingCommand::Start)
            .count()
    }

    fn stops(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == StreamingCommand::Stop)
            .count()
    }
}

#[async_trait]
impl ControlChannel for RecordingChannel {
    async fn request_streaming(
        &self,
        _device_id: &str,
        _local_url: &str,
        command: StreamingCommand,
    ) -> Result<(), RequestError> {
        self.calls.lock().unwrap().push(command);
        if self.reject_starts && command == StreamingCommand::Start {
            return Err(RequestError::Rejected {
                reason: "device unreachable".to_string(),
            });
        }
        Ok(())
    }
}

/// A decode stand-in that proves liveness once then dies, exercising the
/// full cycle: request, alive, unhealthy, re-request.
#[tokio::test(flavor = "multi_thread")]
async fn stream_death_triggers_exactly_one_rerequest_cycle() {
    init_logs();
    let device = "cam-1";
    let store = Arc::new(StateStore::new());
    let bus = Bus::new(64);
    let channel = RecordingChannel::arc(false);

    // Emits a valid FLV header, lingers briefly, then exits on its own.
    // The self-exit is a probe failure and demotes the device.
    let probe = Probe::new(device, "rtmp://127.0.0.1/local/cam-1", store.clone(), bus.clone())
        .with_command(
            "sh",
            vec![
                "-c".to_string(),
                r"printf 'FLV\001\005\000\000\000\011'; sleep 0.3".to_string(),
            ],
        );
    let watchdog = Watchdog::new(device, Arc::new(probe), store.clone(), bus.clone())
        .with_delay(Duration::from_millis(100));
    let orch = Orchestrator::new(
        device,
        "rtmp://127.0.0.1/local/cam-1",
        store.clone(),
        channel.clone() as Arc<dyn ControlChannel>,
        bus,
    );

    let token = CancellationToken::new();
    let wd_handle = {
        let child = token.child_token();
        tokio::spawn(async move { watchdog.run(Attempt::new(1, child)).await })
    };
    let orch_handle = {
        let child = token.child_token();
        tokio::spawn(async move { orch.run(Attempt::new(1, child)).await })
    };

    // Wait until the stream has been proven alive at least once.
    let mut was_alive = false;
    for _ in 0..100 {
        if store.get(device).stream_liveness == StreamLiveness::Alive {
            was_alive = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(was_alive, "probe never decoded the container header");

    // Let the stand-in die and the watchdog demote at least once more.
    for _ in 0..100 {
        if channel.starts() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    token.cancel();
    assert!(wd_handle.await.unwrap().is_ok());
    assert!(orch_handle.await.unwrap().is_ok());

    // Initial request plus at least one recovery request, and a stop on
    // the way out.
    assert!(channel.starts() >= 2, "got {} starts", channel.starts());
    assert_eq!(channel.stops(), 1);
    assert_eq!(
        store.get(device).stream_request_state,
        StreamRequestState::Requested
    );
    assert!(store.get(device).local_streaming_initiated);
}

/// Once a start request is rejected, repeated unhealthy rounds must not
/// produce more requests.
#[tokio::test(flavor = "multi_thread")]
async fn rejected_request_is_not_hammered_by_the_watchdog() {
    init_logs();
    let device = "cam-2";
    let store = Arc::new(StateStore::new());
    let bus = Bus::new(64);
    let channel = RecordingChannel::arc(true);

    // Never produces a stream at all.
    let probe = Probe::new(device, "rtmp://127.0.0.1/local/cam-2", store.clone(), bus.clone())
        .with_command("sh", vec!["-c".to_string(), "exit 1".to_string()]);
    let watchdog = Watchdog::new(device, Arc::new(probe), store.clone(), bus.clone())
        .with_delay(Duration::from_millis(50));
    let orch = Orchestrator::new(
        device,
        "rtmp://127.0.0.1/local/cam-2",
        store.clone(),
        channel.clone() as Arc<dyn ControlChannel>,
        bus,
    );

    let token = CancellationToken::new();
    let wd_handle = {
        let child = token.child_token();
        tokio::spawn(async move { watchdog.run(Attempt::new(1, child)).await })
    };
    let orch_handle = {
        let child = token.child_token();
        tokio::spawn(async move { orch.run(Attempt::new(1, child)).await })
    };

    // Several probe rounds and demotions happen in this window.
    tokio::time::sleep(Duration::from_millis(500)).await;

    token.cancel();
    assert!(wd_handle.await.unwrap().is_ok());
    assert!(orch_handle.await.unwrap().is_ok());

    assert_eq!(channel.starts(), 1, "rejected request must not be retried");
    assert_eq!(
        store.get(device).stream_request_state,
        StreamRequestState::RequestFailed
    );
    assert_eq!(store.get(device).stream_liveness, StreamLiveness::Unhealthy);
}

/// External sensor updates merge into the same record without clobbering
/// stream fields maintained by the workers.
#[tokio::test]
async fn sensor_updates_do_not_clobber_stream_fields() {
    use camvisor::{SensorKind, SensorReading, SensorValue};

    init_logs();

    let store = Arc::new(StateStore::new());
    store.update(
        "cam-3",
        StateDelta::new().with_stream_liveness(StreamLiveness::Alive),
    );
    store.update(
        "cam-3",
        StateDelta::new().with_sensor(
            SensorKind::Temperature,
            SensorReading::now(SensorValue::Number(21.5)),
        ),
    );

    let state = store.get("cam-3");
    assert_eq!(state.stream_liveness, StreamLiveness::Alive);
    assert_eq!(
        state.sensors.get(&SensorKind::Temperature).map(|r| r.value),
        Some(SensorValue::Number(21.5))
    );
}
