//! Session text protocol for the headless driver.
//!
//! Defines the JSON command/response envelope external programs use to
//! drive a session over newline-delimited JSON on stdin/stdout. These types
//! live in the `simulation` crate so they can be unit-tested without the
//! app binary; the I/O loop lives in `crates/app`.

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::incidents::IncidentPriority;
use crate::observation::SessionObservation;

pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Commands (stdin → simulation)
// ---------------------------------------------------------------------------

/// A single command sent by the external program over stdin. Each line of
/// stdin is parsed as one `SessionCommand`, with `cmd` as the tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd")]
pub enum SessionCommand {
    /// Request the current session snapshot.
    #[serde(rename = "observe")]
    Observe,

    /// Report a new incident.
    #[serde(rename = "report")]
    Report {
        location: Location,
        priority: IncidentPriority,
        description: String,
    },

    /// Advance the simulation by `ticks` fixed-update ticks.
    #[serde(rename = "step")]
    Step { ticks: u64 },

    /// Archive a resolved incident.
    #[serde(rename = "archive")]
    Archive { incident_id: String },

    /// Start or stop the background scenario generator.
    #[serde(rename = "scenario")]
    Scenario { running: bool },

    /// Gracefully shut down the session.
    #[serde(rename = "quit")]
    Quit,
}

// ---------------------------------------------------------------------------
// Responses (simulation → stdout)
// ---------------------------------------------------------------------------

/// Every response carries the protocol version and a tagged payload.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ResponsePayload {
    /// The simulation is ready to accept commands.
    #[serde(rename = "ready")]
    Ready,

    /// A session snapshot.
    #[serde(rename = "observation")]
    Observation { observation: SessionObservation },

    /// A command was accepted.
    #[serde(rename = "ack")]
    Ack { message: String },

    /// The simulation has advanced; reports the current tick counter.
    #[serde(rename = "step_complete")]
    StepComplete { tick: u64 },

    /// A command failed; the session keeps running.
    #[serde(rename = "error")]
    Error { message: String },
}

pub fn make_response(payload: ResponsePayload) -> SessionResponse {
    SessionResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}
