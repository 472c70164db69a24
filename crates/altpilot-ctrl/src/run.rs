use std::time::Duration;

use altpilot_link::{CommandChannel, LinkError, WsLink};
use altpilot_proto::{command::Command, telemetry::TelemetryRecord};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::display::DisplaySink;
use crate::machine::ControlStateMachine;
use crate::stop::StopSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Delay between decision cycles; also the command rate.
    pub interval: Duration,
    /// How long the landed frame stays up before the run ends.
    pub landed_grace: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self { interval: Duration::from_millis(300), landed_grace: Duration::from_secs(3) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Landed,
    Stopped,
    PeerClosed,
    SendFailed,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reason: EndReason,
    pub commands_sent: u64,
    pub final_x: Option<f64>,
    pub landed_iterations: Option<i64>,
    pub started_at: OffsetDateTime,
    pub ended_at: OffsetDateTime,
}

/// Connects to `endpoint` and flies the schedule until landing, stop or
/// disconnect. Only a failed connect is an error.
pub async fn fly<D: DisplaySink>(
    endpoint: &str,
    machine: ControlStateMachine,
    pacing: Pacing,
    sink: D,
    stop: StopSignal,
) -> Result<RunOutcome, LinkError> {
    let link = WsLink::connect(endpoint).await?;
    info!("Connection established");
    Ok(ControlLoop::new(link, sink, machine, pacing, stop).run().await)
}

pub struct ControlLoop<C, D> {
    link: C,
    sink: D,
    machine: ControlStateMachine,
    pacing: Pacing,
    stop: StopSignal,
}

impl<C: CommandChannel, D: DisplaySink> ControlLoop<C, D> {
    pub fn new(link: C, sink: D, machine: ControlStateMachine, pacing: Pacing, stop: StopSignal) -> Self {
        Self { link, sink, machine, pacing, stop }
    }

    pub fn machine(&self) -> &ControlStateMachine {
        &self.machine
    }

    /// Drives the run to its end. The link is closed on every path out.
    pub async fn run(mut self) -> RunOutcome {
        let started_at = OffsetDateTime::now_utc();
        let reason = self.drive().await;
        self.link.close().await;

        let landed = self.machine.is_landed();
        let outcome = RunOutcome {
            reason,
            commands_sent: self.machine.state().command_count,
            final_x: landed.then(|| self.machine.state().final_x),
            landed_iterations: landed.then(|| self.machine.landed_iterations()),
            started_at,
            ended_at: OffsetDateTime::now_utc(),
        };
        info!("run: ended ({:?}) after {} commands", outcome.reason, outcome.commands_sent);
        outcome
    }

    async fn drive(&mut self) -> EndReason {
        let initial = self.machine.initial_command();
        if let Err(e) = self.send(initial).await {
            return send_failed(e);
        }

        loop {
            if self.stop.requested() {
                info!("run: stop requested");
                return EndReason::Stopped;
            }

            if let Some(land) = self.machine.reassert_landing() {
                if let Err(e) = self.send(land).await {
                    return send_failed(e);
                }
            }

            let raw = tokio::select! {
                biased;
                _ = self.stop.wait() => return EndReason::Stopped,
                res = self.link.recv() => match res {
                    Ok(raw) => raw,
                    Err(e) => {
                        info!("run: telemetry stream ended: {}", e);
                        return EndReason::PeerClosed;
                    }
                },
            };

            let rec = TelemetryRecord::decode(&raw);
            let out = self.machine.step(&rec);
            self.sink.present(&out.display);

            if self.machine.is_landed() {
                info!("run: landed, holding final frame for {:?}", self.pacing.landed_grace);
                if self.pause(self.pacing.landed_grace).await {
                    return EndReason::Stopped;
                }
                return EndReason::Landed;
            }

            if let Some(cmd) = out.command {
                if let Err(e) = self.send(cmd).await {
                    return send_failed(e);
                }
            }

            if self.pause(self.pacing.interval).await {
                return EndReason::Stopped;
            }
        }
    }

    async fn send(&mut self, cmd: Command) -> Result<(), LinkError> {
        self.link.send(&cmd).await?;
        self.machine.note_sent();
        debug!("run: sent {:?} (#{})", cmd, self.machine.state().command_count);
        Ok(())
    }

    /// Sleeps for `d`; true if a stop request cut the sleep short.
    async fn pause(&mut self, d: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.stop.wait() => true,
            _ = tokio::time::sleep(d) => false,
        }
    }
}

fn send_failed(e: LinkError) -> EndReason {
    match e {
        LinkError::Closed => info!("run: link closed while sending"),
        e => warn!("run: {}", e),
    }
    EndReason::SendFailed
}
