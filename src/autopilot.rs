//! Optional steering source consulted by the engine before every move.
//!
//! An [`Autopilot`] sees the head, the food and the current heading and may
//! answer with a raw [`Hint`]. The engine sign-normalises hints and throws
//! away anything that is not a legal, non-reversing unit step, so
//! implementations are free to return rough vectors.

use crate::grid::{Cell, Delta, Direction};
use log::warn;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Per-call budget used when none is configured.
pub const DEFAULT_BUDGET: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    pub head: Cell,
    pub food: Cell,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hint(pub Delta);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutopilotFault {
    #[error("hint was not a usable direction: {0:?}")]
    Malformed(Delta),
    #[error("no answer within {0:?}")]
    TimedOut(Duration),
    #[error("autopilot panicked: {0}")]
    Panicked(String),
    #[error("autopilot worker is gone")]
    Disconnected,
    #[error("autopilot failed: {0}")]
    Failed(String),
}

pub trait Autopilot: Send {
    fn name(&self) -> &str;

    /// `Ok(None)` means "no opinion this tick".
    fn suggest(&mut self, probe: &Probe) -> Result<Option<Hint>, AutopilotFault>;
}

/// Look up one of the built-in autopilots. Every autopilot returned here runs
/// behind a [`Guarded`] worker so a slow answer can never stall a tick.
pub fn by_name(name: &str, budget: Duration) -> Option<Box<dyn Autopilot>> {
    match name.to_ascii_lowercase().as_str() {
        "greedy" => Some(Box::new(Guarded::spawn(Greedy, budget))),
        _ => None,
    }
}

pub fn known_names() -> &'static [&'static str] {
    &["greedy"]
}

/// Heads for the food along whichever axis is further off, turning aside
/// rather than reversing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl Greedy {
    fn steer(probe: &Probe) -> Delta {
        let (hx, hy) = (probe.head.x as i32, probe.head.y as i32);
        let (fx, fy) = (probe.food.x as i32, probe.food.y as i32);

        let mut v = if (fx - hx).abs() > (fy - hy).abs() {
            Delta::new((fx - hx).signum(), 0)
        } else {
            Delta::new(0, (fy - hy).signum())
        };

        let cur = probe.direction.delta();
        if v.x == -cur.x && v.y == -cur.y {
            v = if v.x != 0 {
                Delta::new(0, if fy >= hy { 1 } else { -1 })
            } else {
                Delta::new(if fx >= hx { 1 } else { -1 }, 0)
            };
        }
        v
    }
}

impl Autopilot for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn suggest(&mut self, probe: &Probe) -> Result<Option<Hint>, AutopilotFault> {
        let v = Self::steer(probe);
        Ok((!v.is_zero()).then_some(Hint(v)))
    }
}

type Reply = (u64, Result<Option<Hint>, AutopilotFault>);

/// Runs an autopilot on its own thread and bounds every call by `budget`.
///
/// At most one request is in flight. While the worker is still busy with a
/// request that ran over its budget, further calls time out at once instead
/// of queueing work that would be stale by the time it runs.
pub struct Guarded {
    name: String,
    budget: Duration,
    seq: u64,
    in_flight: Option<u64>,
    requests: Option<Sender<(u64, Probe)>>,
    replies: Receiver<Reply>,
}

impl Guarded {
    pub fn spawn<A: Autopilot + 'static>(mut inner: A, budget: Duration) -> Self {
        let name = inner.name().to_string();
        let (req_tx, req_rx) = mpsc::channel::<(u64, Probe)>();
        let (rep_tx, rep_rx) = mpsc::channel::<Reply>();

        let spawned = thread::Builder::new()
            .name(format!("autopilot-{}", name))
            .spawn(move || {
                for (seq, probe) in req_rx {
                    let answer = panic::catch_unwind(AssertUnwindSafe(|| inner.suggest(&probe)))
                        .unwrap_or_else(|payload| {
                            Err(AutopilotFault::Panicked(panic_message(&*payload)))
                        });
                    if rep_tx.send((seq, answer)).is_err() {
                        break;
                    }
                }
            });

        let requests = match spawned {
            Ok(_) => Some(req_tx),
            Err(e) => {
                warn!("Could not start autopilot worker for {}: {}", name, e);
                None
            }
        };

        Guarded {
            name,
            budget,
            seq: 0,
            in_flight: None,
            requests,
            replies: rep_rx,
        }
    }

}

impl Autopilot for Guarded {
    fn name(&self) -> &str {
        &self.name
    }

    fn suggest(&mut self, probe: &Probe) -> Result<Option<Hint>, AutopilotFault> {
        let requests = self.requests.as_ref().ok_or(AutopilotFault::Disconnected)?;

        // A late reply frees the worker; its answer is for an old board.
        while self.in_flight.is_some() {
            match self.replies.try_recv() {
                Ok((id, _)) if Some(id) == self.in_flight => self.in_flight = None,
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Err(AutopilotFault::TimedOut(self.budget)),
                Err(TryRecvError::Disconnected) => return Err(AutopilotFault::Disconnected),
            }
        }

        self.seq += 1;
        let seq = self.seq;
        requests
            .send((seq, *probe))
            .map_err(|_| AutopilotFault::Disconnected)?;
        self.in_flight = Some(seq);

        match self.replies.recv_timeout(self.budget) {
            Ok((_, answer)) => {
                self.in_flight = None;
                answer
            }
            Err(RecvTimeoutError::Timeout) => Err(AutopilotFault::TimedOut(self.budget)),
            Err(RecvTimeoutError::Disconnected) => Err(AutopilotFault::Disconnected),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
