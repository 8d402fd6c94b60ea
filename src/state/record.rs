//! Device state record and partial update (delta) types.
//!
//! [`DeviceState`] is the full per-device record held by the store;
//! [`StateDelta`] is a partial update built with chained setters (only the
//! fields explicitly set participate in the merge). Merging is field-wise
//! last-write-wins: an unset field never overwrites a stored value.

use std::collections::HashMap;
use std::time::SystemTime;

/// Whether the monitored stream is currently confirmed to carry media.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamLiveness {
    /// No probe has reported anything yet.
    #[default]
    Unknown,
    /// The probe successfully decoded the container header.
    Alive,
    /// The probe terminated; the stream is considered dead until re-proven.
    Unhealthy,
}

/// Whether a start-stream command has been sent and how it went.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamRequestState {
    /// No start request has been issued.
    #[default]
    NotRequested,
    /// A start request was sent and not rejected so far.
    Requested,
    /// The device rejected the start request.
    RequestFailed,
}

/// Kind of sensor reported by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Motion,
    Sound,
    Night,
}

/// A sensor value: numeric (temperature, humidity) or boolean (motion,
/// sound, night mode).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorValue {
    Number(f64),
    Flag(bool),
}

/// Last known value of one sensor with its observation timestamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorReading {
    pub value: SensorValue,
    pub at: SystemTime,
}

impl SensorReading {
    /// Creates a reading timestamped now.
    pub fn now(value: SensorValue) -> Self {
        Self {
            value,
            at: SystemTime::now(),
        }
    }
}

/// Full state record for one monitored device.
///
/// Returned by [`StateStore::get`](crate::StateStore::get) as a snapshot;
/// mutated only through delta merges inside the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceState {
    /// Current stream liveness.
    pub stream_liveness: StreamLiveness,
    /// State of the last start-stream request.
    pub stream_request_state: StreamRequestState,
    /// Latched true once a start request has ever been accepted.
    pub local_streaming_initiated: bool,
    /// Last known sensor readings, keyed by kind.
    pub sensors: HashMap<SensorKind, SensorReading>,
}

impl DeviceState {
    /// Merges a partial update into this record.
    ///
    /// Fields the delta leaves unset keep their stored value; sensor
    /// readings are merged per kind.
    pub fn apply(&mut self, delta: &StateDelta) {
        if let Some(liveness) = delta.stream_liveness {
            self.stream_liveness = liveness;
        }
        if let Some(request_state) = delta.stream_request_state {
            self.stream_request_state = request_state;
        }
        if let Some(initiated) = delta.local_streaming_initiated {
            self.local_streaming_initiated = initiated;
        }
        for (kind, reading) in &delta.sensors {
            self.sensors.insert(*kind, *reading);
        }
    }
}

/// Partial update to a device record.
///
/// Built with chained setters; broadcast verbatim to subscribers after the
/// merge.
///
/// ## Example
/// ```rust
/// use camvisor::{StateDelta, StreamLiveness};
///
/// let delta = StateDelta::new().with_stream_liveness(StreamLiveness::Alive);
/// assert_eq!(delta.stream_liveness, Some(StreamLiveness::Alive));
/// assert!(delta.stream_request_state.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateDelta {
    /// New stream liveness, if changed.
    pub stream_liveness: Option<StreamLiveness>,
    /// New request state, if changed.
    pub stream_request_state: Option<StreamRequestState>,
    /// New latch value, if changed.
    pub local_streaming_initiated: Option<bool>,
    /// Sensor readings carried by this update.
    pub sensors: HashMap<SensorKind, SensorReading>,
}

impl StateDelta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stream liveness.
    pub fn with_stream_liveness(mut self, liveness: StreamLiveness) -> Self {
        self.stream_liveness = Some(liveness);
        self
    }

    /// Sets the stream request state.
    pub fn with_stream_request_state(mut self, state: StreamRequestState) -> Self {
        self.stream_request_state = Some(state);
        self
    }

    /// Sets the local-streaming-initiated latch.
    pub fn with_local_streaming_initiated(mut self, initiated: bool) -> Self {
        self.local_streaming_initiated = Some(initiated);
        self
    }

    /// Adds a sensor reading.
    pub fn with_sensor(mut self, kind: SensorKind, reading: SensorReading) -> Self {
        self.sensors.insert(kind, reading);
        self
    }
}
