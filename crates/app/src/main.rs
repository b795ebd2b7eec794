//! emsim — headless ambulance dispatch session driven over newline-delimited
//! JSON on stdin/stdout.
//!
//! Each line of stdin is a JSON object with a `"cmd"` discriminator; each
//! line of stdout is a JSON response with `"protocol_version"` and `"type"`
//! fields. See [`simulation::protocol`] for the full schema. Logs go to
//! stderr so they never interfere with the protocol stream.

use std::io::{BufRead, Write};

use bevy::prelude::*;

use simulation::dispatch::IncidentReported;
use simulation::incidents::IncidentLedger;
use simulation::observation;
use simulation::protocol::{
    make_response, ResponsePayload, SessionCommand, SessionResponse, PROTOCOL_VERSION,
};
use simulation::scenario::ScenarioConfig;
use simulation::{SimulationPlugin, TickCounter};

fn main() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SimulationPlugin);

    // Initial update so Startup systems execute and the roster spawns.
    app.update();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    let ready = make_response(ResponsePayload::Ready);
    let _ = writeln!(stdout, "{}", serde_json::to_string(&ready).unwrap());
    let _ = stdout.flush();
    eprintln!("emsim protocol v{PROTOCOL_VERSION} ready — waiting for commands on stdin");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("stdin read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let parsed = serde_json::from_str::<SessionCommand>(&line);
        let quit = matches!(parsed, Ok(SessionCommand::Quit));
        let response = match parsed {
            Ok(cmd) => handle_command(&mut app, cmd),
            Err(e) => make_response(ResponsePayload::Error {
                message: format!("bad command: {e}"),
            }),
        };
        let _ = writeln!(stdout, "{}", serde_json::to_string(&response).unwrap());
        let _ = stdout.flush();
        if quit {
            break;
        }
    }
}

fn handle_command(app: &mut App, cmd: SessionCommand) -> SessionResponse {
    match cmd {
        SessionCommand::Observe => {
            let observation = observation::observe(app.world_mut());
            make_response(ResponsePayload::Observation { observation })
        }

        SessionCommand::Report {
            location,
            priority,
            description,
        } => {
            app.world_mut().send_event(IncidentReported {
                location,
                priority,
                description,
            });
            make_response(ResponsePayload::Ack {
                message: "incident report queued".to_string(),
            })
        }

        SessionCommand::Step { ticks } => {
            // Cap to prevent accidental runaway loops.
            let n = ticks.min(10_000);
            for _ in 0..n {
                app.world_mut().run_schedule(FixedUpdate);
            }
            let tick = app.world().resource::<TickCounter>().0;
            make_response(ResponsePayload::StepComplete { tick })
        }

        SessionCommand::Archive { incident_id } => {
            let mut ledger = app.world_mut().resource_mut::<IncidentLedger>();
            match ledger.archive(&incident_id) {
                Ok(()) => make_response(ResponsePayload::Ack {
                    message: format!("{incident_id} archived"),
                }),
                Err(e) => make_response(ResponsePayload::Error {
                    message: e.to_string(),
                }),
            }
        }

        SessionCommand::Scenario { running } => {
            app.world_mut().resource_mut::<ScenarioConfig>().running = running;
            make_response(ResponsePayload::Ack {
                message: if running {
                    "scenario generator running".to_string()
                } else {
                    "scenario generator stopped".to_string()
                },
            })
        }

        SessionCommand::Quit => make_response(ResponsePayload::Ack {
            message: "session closed".to_string(),
        }),
    }
}
