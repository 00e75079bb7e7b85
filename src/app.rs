//! Host shell: wires commands, the scheduler, the play clock and the screen
//! to one [`Engine`].

use crate::clock::{format_clock, PlayClock};
use crate::engine::{Engine, EngineEvent, SpeedChange, TickOutcome, MANUAL_SPEED_STEP};
use crate::grid::GridSize;
use crate::input::Command;
use crate::render::{self, Board, Phase, Scene, CELL_COLUMNS};
use crate::ticker::Ticker;
use log::info;
use rand::rngs::StdRng;
use rand::Rng;
use ratatui::Frame;
use std::time::{Duration, Instant};

pub struct App<R = StdRng> {
    engine: Engine<R>,
    ticker: Ticker,
    clock: PlayClock,
    quit: bool,
}

impl<R: Rng> App<R> {
    pub fn new(mut engine: Engine<R>) -> Self {
        // construction leaves a Halt/Render pair that a stopped ticker ignores
        engine.drain_events();
        let ticker = Ticker::new(engine.interval());
        App {
            engine,
            ticker,
            clock: PlayClock::new(),
            quit: false,
        }
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle(&mut self, command: Command, now: Instant) {
        match command {
            Command::Steer(direction) => self.engine.set_direction(direction),
            Command::TogglePause => self.engine.toggle_running(),
            Command::Start => self.engine.set_running(true),
            Command::Reset => self.engine.reset(),
            Command::Faster => {
                self.engine.set_speed(SpeedChange::Faster(MANUAL_SPEED_STEP));
            }
            Command::Slower => {
                self.engine.set_speed(SpeedChange::Slower(MANUAL_SPEED_STEP));
            }
            Command::ToggleAutopilot => {
                let enabled = !self.engine.autopilot_enabled();
                let now_enabled = self.engine.set_autopilot_enabled(enabled);
                info!("Autopilot {}", if now_enabled { "on" } else { "off" });
            }
            Command::Quit => {
                info!("Quitting");
                self.quit = true;
            }
        }
        self.sync(now);
        if command == Command::Reset {
            self.clock.reset();
        }
    }

    /// Runs one tick if the scheduler says one is due.
    pub fn poll_tick(&mut self, now: Instant) -> Option<TickOutcome> {
        if !self.ticker.due(now) {
            return None;
        }
        let outcome = self.engine.tick();
        self.sync(now);
        Some(outcome)
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.ticker.time_until_due(now)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    pub fn phase(&self) -> Phase {
        if let Some(reason) = self.engine.end_reason() {
            Phase::Over(reason)
        } else if self.engine.is_running() {
            Phase::Playing
        } else if self.engine.has_started() {
            Phase::Paused
        } else {
            Phase::Ready
        }
    }

    /// Paints the frame, then fits the grid to the room the screen offers.
    pub fn render(&mut self, frame: &mut Frame, now: Instant) {
        let room = {
            let engine = &self.engine;
            let scene = Scene {
                board: Board {
                    snake: engine.snake(),
                    food: engine.food(),
                    grid: engine.grid(),
                },
                status: engine.status(),
                phase: self.phase(),
                interval_ms: engine.interval().as_millis(),
                clock: format_clock(self.clock.elapsed(now)),
                autopilot: engine
                    .autopilot_name()
                    .map(|name| (name, engine.autopilot_enabled())),
            };
            render::draw(frame, &scene)
        };

        self.engine
            .resize(GridSize::fit((room.width, room.height), (CELL_COLUMNS, 1)));
        self.sync(now);
    }

    fn sync(&mut self, now: Instant) {
        for event in self.engine.drain_events() {
            self.ticker.apply(&event, now);
            match event {
                EngineEvent::Reschedule(_) => self.clock.resume(now),
                EngineEvent::Halt => self.clock.pause(now),
                EngineEvent::GameOver(reason) => info!(
                    "Run lasted {}, ended by {:?}",
                    format_clock(self.clock.elapsed(now)),
                    reason
                ),
                EngineEvent::Render | EngineEvent::HighScore(_) => {}
            }
        }
    }
}
