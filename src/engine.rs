//! The fixed-tick simulation: steering, movement, collisions, growth, score
//! and speed.
//!
//! The engine never touches a clock or a screen. Every step that the host has
//! to act on (re-arm the scheduler, stop it, repaint, show the game-over box)
//! is queued as an [`EngineEvent`] and collected with
//! [`Engine::drain_events`] after each call.

use crate::autopilot::{panic_message, Autopilot, AutopilotFault, Hint, Probe};
use crate::grid::{Cell, Direction, GridSize};
use crate::high_score::HighScoreStore;
use crate::snek::Snek;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

pub const INITIAL_LENGTH: u16 = 3;
pub const INITIAL_INTERVAL: Duration = Duration::from_millis(140);
pub const MIN_INTERVAL: Duration = Duration::from_millis(60);
pub const MAX_INTERVAL: Duration = Duration::from_millis(260);
/// Interval shaved off every [`SPEEDUP_EVERY`] points.
pub const SCORE_SPEEDUP: Duration = Duration::from_millis(6);
pub const SPEEDUP_EVERY: u32 = 5;
/// Step used by the faster/slower controls.
pub const MANUAL_SPEED_STEP: Duration = Duration::from_millis(12);

const START_HEADING: Direction = Direction::East;
const RESAMPLE_ATTEMPTS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedChange {
    Faster(Duration),
    Slower(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    Wall,
    SelfCollision,
    /// The snake covers every cell and no food can be placed.
    BoardFilled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or already over.
    Idle,
    Moved,
    Ate { score: u32 },
    Crashed(EndReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// (Re)start the tick scheduler at this interval.
    Reschedule(Duration),
    /// Stop the tick scheduler.
    Halt,
    Render,
    GameOver(EndReason),
    HighScore(u32),
}

/// What the HUD shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub score: u32,
    pub high_score: u32,
    pub snake_len: usize,
    pub running: bool,
    pub game_over: bool,
}

pub struct Engine<R = StdRng> {
    grid: GridSize,
    next_grid: Option<GridSize>,
    snake: Snek,
    current: Direction,
    pending: Direction,
    food: Cell,
    score: u32,
    high_score: u32,
    base_interval: Duration,
    interval: Duration,
    running: bool,
    started: bool,
    over: Option<EndReason>,
    autopilot: Option<Box<dyn Autopilot>>,
    autopilot_enabled: bool,
    store: Box<dyn HighScoreStore>,
    rng: R,
    events: Vec<EngineEvent>,
}

impl Engine<StdRng> {
    pub fn new(grid: GridSize, store: Box<dyn HighScoreStore>) -> Self {
        Engine::with_rng(grid, store, StdRng::from_entropy())
    }

    pub fn seeded(grid: GridSize, store: Box<dyn HighScoreStore>, seed: u64) -> Self {
        Engine::with_rng(grid, store, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Engine<R> {
    pub fn with_rng(grid: GridSize, mut store: Box<dyn HighScoreStore>, rng: R) -> Self {
        let grid = grid.clamped();
        let high_score = match store.load() {
            Ok(score) => score,
            Err(e) => {
                error!("Error loading high score: {}", e);
                0
            }
        };

        let snake = Snek::new(grid, INITIAL_LENGTH);
        let food = snake.tail();
        let mut engine = Engine {
            grid,
            next_grid: None,
            snake,
            current: START_HEADING,
            pending: START_HEADING,
            food,
            score: 0,
            high_score,
            base_interval: INITIAL_INTERVAL,
            interval: INITIAL_INTERVAL,
            running: false,
            started: false,
            over: None,
            autopilot: None,
            autopilot_enabled: false,
            store,
            rng,
            events: Vec::new(),
        };
        engine.reset();
        engine
    }

    /// Fresh snake, fresh food, score 0, stopped.
    pub fn reset(&mut self) {
        if let Some(grid) = self.next_grid.take() {
            self.grid = grid;
        }
        self.snake = Snek::new(self.grid, INITIAL_LENGTH);
        self.current = START_HEADING;
        self.pending = START_HEADING;
        self.score = 0;
        self.interval = self.base_interval;
        self.running = false;
        self.started = false;
        self.over = None;
        // a fresh board always has room
        if let Some(food) = self.spawn_food() {
            self.food = food;
        }
        debug!(
            "Reset on {}x{} grid, food at {:?}",
            self.grid.width, self.grid.height, self.food
        );
        self.events.push(EngineEvent::Halt);
        self.events.push(EngineEvent::Render);
    }

    /// Queue a turn for the next tick. Turning straight back is ignored.
    pub fn set_direction(&mut self, direction: Direction) {
        if !direction.is_opposite(self.current) {
            self.pending = direction;
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running || self.over.is_some() {
            return TickOutcome::Idle;
        }

        self.consult_autopilot();

        if !self.pending.is_opposite(self.current) {
            self.current = self.pending;
        }

        // The tail cell is about to be vacated, so stepping onto it is fine.
        // It never holds food, so it is vacated whenever it is reachable.
        let new_head = match self.snake.head().step(self.current, self.grid) {
            None => return self.crash(EndReason::Wall),
            Some(cell) if cell != self.snake.tail() && self.snake.occupies(cell) => {
                return self.crash(EndReason::SelfCollision)
            }
            Some(cell) => cell,
        };

        let ate = new_head == self.food;
        self.snake.advance(new_head, ate);

        let outcome = if ate {
            self.eat()
        } else {
            TickOutcome::Moved
        };
        if let TickOutcome::Crashed(_) = outcome {
            return outcome;
        }

        self.events.push(EngineEvent::Render);
        outcome
    }

    /// Adjust the tick interval within [`MIN_INTERVAL`, `MAX_INTERVAL`].
    /// A running game is rescheduled straight away.
    pub fn set_speed(&mut self, change: SpeedChange) -> Duration {
        self.interval = match change {
            SpeedChange::Faster(delta) => self.interval.saturating_sub(delta),
            SpeedChange::Slower(delta) => self.interval.saturating_add(delta),
        }
        .clamp(MIN_INTERVAL, MAX_INTERVAL);

        if self.running {
            self.events.push(EngineEvent::Reschedule(self.interval));
        }
        self.events.push(EngineEvent::Render);
        self.interval
    }

    /// Interval the next [`reset`](Self::reset) starts from.
    pub fn set_base_interval(&mut self, interval: Duration) {
        self.base_interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        if !self.started {
            self.interval = self.base_interval;
        }
    }

    /// Pause or resume. A finished game cannot be resumed; only
    /// [`reset`](Self::reset) brings it back.
    pub fn set_running(&mut self, running: bool) {
        if running == self.running {
            return;
        }
        if running {
            if self.over.is_some() {
                return;
            }
            info!(
                "{} at {}ms per tick",
                if self.started { "Resumed" } else { "Started" },
                self.interval.as_millis()
            );
            self.running = true;
            self.started = true;
            self.events.push(EngineEvent::Reschedule(self.interval));
        } else {
            info!("Paused at score {}", self.score);
            self.running = false;
            self.events.push(EngineEvent::Halt);
        }
        self.events.push(EngineEvent::Render);
    }

    pub fn toggle_running(&mut self) {
        if self.over.is_none() {
            self.set_running(!self.running);
        }
    }

    /// Use a new board size. It is taken up at once on a board that has not
    /// been played yet, otherwise at the next reset.
    pub fn resize(&mut self, grid: GridSize) {
        let grid = grid.clamped();
        if grid == self.next_grid.unwrap_or(self.grid) {
            return;
        }
        debug!("Grid resized to {}x{}", grid.width, grid.height);
        if self.started {
            self.next_grid = (grid != self.grid).then_some(grid);
        } else {
            self.grid = grid;
            self.next_grid = None;
            self.reset();
        }
    }

    pub fn attach_autopilot(&mut self, autopilot: Box<dyn Autopilot>) {
        info!("Autopilot {} attached", autopilot.name());
        self.autopilot = Some(autopilot);
        self.autopilot_enabled = true;
        self.events.push(EngineEvent::Render);
    }

    pub fn detach_autopilot(&mut self) -> Option<Box<dyn Autopilot>> {
        self.autopilot_enabled = false;
        self.autopilot.take()
    }

    /// Returns whether the autopilot is now in control. Enabling without an
    /// attached autopilot does nothing.
    pub fn set_autopilot_enabled(&mut self, enabled: bool) -> bool {
        self.autopilot_enabled = enabled && self.autopilot.is_some();
        self.events.push(EngineEvent::Render);
        self.autopilot_enabled
    }

    pub fn autopilot_name(&self) -> Option<&str> {
        self.autopilot.as_deref().map(|a| a.name())
    }

    pub fn autopilot_enabled(&self) -> bool {
        self.autopilot_enabled
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn status(&self) -> Status {
        Status {
            score: self.score,
            high_score: self.high_score,
            snake_len: self.snake.len(),
            running: self.running,
            game_over: self.over.is_some(),
        }
    }

    pub fn snake(&self) -> &Snek {
        &self.snake
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn direction(&self) -> Direction {
        self.current
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the current board has been played since the last reset.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_over(&self) -> bool {
        self.over.is_some()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.over
    }

    fn consult_autopilot(&mut self) {
        if !self.autopilot_enabled {
            return;
        }
        let Some(pilot) = self.autopilot.as_mut() else {
            return;
        };

        let probe = Probe {
            head: self.snake.head(),
            food: self.food,
            direction: self.current,
        };
        // The panic hook still fires; hosts that own the terminal route it to the log.
        let answer = panic::catch_unwind(AssertUnwindSafe(|| pilot.suggest(&probe)))
            .unwrap_or_else(|payload| Err(AutopilotFault::Panicked(panic_message(&*payload))));

        match answer.and_then(|hint| accept_hint(hint, self.current)) {
            Ok(Some(direction)) => self.pending = direction,
            Ok(None) => {}
            Err(fault) => warn!("Ignoring autopilot {}: {}", pilot.name(), fault),
        }
    }

    fn eat(&mut self) -> TickOutcome {
        self.score += 1;
        debug!("Ate food at {:?}, score {}", self.food, self.score);

        if self.score % SPEEDUP_EVERY == 0 {
            let interval = self.set_speed(SpeedChange::Faster(SCORE_SPEEDUP));
            debug!("Speed up to {}ms per tick", interval.as_millis());
        }

        if self.score > self.high_score {
            self.high_score = self.score;
            self.save_high_score();
            self.events.push(EngineEvent::HighScore(self.high_score));
        }

        match self.spawn_food() {
            Some(food) => {
                self.food = food;
                TickOutcome::Ate { score: self.score }
            }
            None => self.crash(EndReason::BoardFilled),
        }
    }

    fn crash(&mut self, reason: EndReason) -> TickOutcome {
        info!(
            "Game over ({:?}) with score {}, length {}",
            reason,
            self.score,
            self.snake.len()
        );
        self.running = false;
        self.over = Some(reason);
        self.events.push(EngineEvent::Halt);
        self.events.push(EngineEvent::GameOver(reason));
        self.events.push(EngineEvent::Render);
        TickOutcome::Crashed(reason)
    }

    fn save_high_score(&mut self) {
        info!("New high score {}", self.high_score);
        if let Err(e) = self.store.save(self.high_score) {
            error!("Error saving high score: {}", e);
        }
    }

    /// A random free cell, or `None` when the snake covers the board.
    fn spawn_food(&mut self) -> Option<Cell> {
        let area = self.grid.area();
        if self.snake.len() >= area {
            return None;
        }

        // Sampling gets slow as the board fills up.
        if self.snake.len() * 2 <= area {
            for _ in 0..RESAMPLE_ATTEMPTS {
                let cell = Cell::new(
                    self.rng.gen_range(0..self.grid.width),
                    self.rng.gen_range(0..self.grid.height),
                );
                if !self.snake.occupies(cell) {
                    return Some(cell);
                }
            }
        }

        let snake = &self.snake;
        self.grid
            .cells()
            .filter(|cell| !snake.occupies(*cell))
            .choose(&mut self.rng)
    }
}

/// Turn a raw hint into a direction the snake may take.
fn accept_hint(
    hint: Option<Hint>,
    current: Direction,
) -> Result<Option<Direction>, AutopilotFault> {
    let Some(Hint(raw)) = hint else {
        return Ok(None);
    };
    let delta = raw.signum();
    if delta.is_zero() {
        return Ok(None);
    }
    let direction = Direction::try_from(delta).map_err(|_| AutopilotFault::Malformed(raw))?;
    Ok((!direction.is_opposite(current)).then_some(direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Delta, MIN_GRID_SIDE};
    use crate::high_score::MemoryStore;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn cells(list: &[(u16, u16)]) -> Snek {
        Snek::from_cells(list.iter().map(|&(x, y)| Cell::new(x, y)))
    }

    fn engine_on(grid: GridSize, store: Box<dyn HighScoreStore>) -> Engine<StdRng> {
        Engine::seeded(grid, store, 7)
    }

    /// A running engine on a 10x10 board with the given body and food.
    fn engine_with(body: &[(u16, u16)], direction: Direction, food: (u16, u16)) -> Engine<StdRng> {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        engine.snake = cells(body);
        engine.current = direction;
        engine.pending = direction;
        engine.food = Cell::new(food.0, food.1);
        engine.set_running(true);
        engine.drain_events();
        engine
    }

    /// Put the food right in front of the head.
    fn feed(engine: &mut Engine<StdRng>) {
        if let Some(cell) = engine.snake.head().step(engine.current, engine.grid) {
            engine.food = cell;
        }
    }

    fn body(engine: &Engine<StdRng>) -> Vec<(u16, u16)> {
        engine.snake.iter().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn test_initial_state() {
        let engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::with_score(9)));
        assert_eq!(engine.snake.len(), 3);
        assert_eq!(engine.direction(), Direction::East);
        assert_eq!(engine.interval(), INITIAL_INTERVAL);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.high_score(), 9);
        assert!(!engine.is_running());
        assert!(!engine.is_over());
        assert!(!engine.snake.occupies(engine.food()));

        let snake = &engine.snake;
        let first = snake.head();
        assert!(snake.iter().all(|c| c.y == first.y), "horizontal");
    }

    #[test]
    fn test_tick_does_nothing_until_started() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        let before = body(&engine);
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(body(&engine), before);
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (6, 5));

        assert_eq!(engine.tick(), TickOutcome::Ate { score: 1 });

        assert_eq!(body(&engine), vec![(6, 5), (5, 5), (4, 5), (3, 5)]);
        assert_eq!(engine.score(), 1);
        assert!(!engine.snake.occupies(engine.food()));
        assert!(engine.drain_events().contains(&EngineEvent::Render));
    }

    #[test]
    fn test_moving_keeps_length() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        for _ in 0..3 {
            assert_eq!(engine.tick(), TickOutcome::Moved);
        }
        assert_eq!(body(&engine), vec![(8, 5), (7, 5), (6, 5)]);
    }

    #[test]
    fn test_length_tracks_food_eaten() {
        let mut engine = engine_with(&[(2, 1), (1, 1), (0, 1)], Direction::East, (0, 9));
        let mut eaten = 0;
        for step in 0..7 {
            if step % 2 == 0 {
                feed(&mut engine);
                eaten += 1;
            } else {
                engine.food = Cell::new(0, 9);
            }
            engine.tick();
            assert_eq!(engine.snake.len(), 3 + eaten);
            assert_eq!(engine.score() as usize, eaten);
        }
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = engine_with(&[(0, 5), (1, 5), (2, 5)], Direction::West, (7, 7));
        let before = body(&engine);

        assert_eq!(engine.tick(), TickOutcome::Crashed(EndReason::Wall));
        assert!(engine.is_over());
        assert!(!engine.is_running());
        assert_eq!(body(&engine), before);

        let events = engine.drain_events();
        assert!(events.contains(&EngineEvent::Halt));
        assert!(events.contains(&EngineEvent::GameOver(EndReason::Wall)));

        // nothing moves until reset
        assert_eq!(engine.tick(), TickOutcome::Idle);
        engine.set_running(true);
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(body(&engine), before);

        engine.reset();
        assert!(!engine.is_over());
        assert_eq!(engine.snake.len(), 3);
    }

    #[test]
    fn test_every_wall() {
        let cases: [(&[(u16, u16)], Direction); 3] = [
            (&[(9, 3), (8, 3), (7, 3)], Direction::East),
            (&[(3, 0), (3, 1), (3, 2)], Direction::North),
            (&[(3, 9), (3, 8), (3, 7)], Direction::South),
        ];
        for (snake, direction) in cases {
            let mut engine = engine_with(snake, direction, (5, 5));
            assert_eq!(engine.tick(), TickOutcome::Crashed(EndReason::Wall));
        }
    }

    #[test]
    fn test_self_collision() {
        let mut engine = engine_with(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::West,
            (0, 0),
        );
        engine.set_direction(Direction::South);
        assert_eq!(engine.tick(), TickOutcome::Crashed(EndReason::SelfCollision));
        assert!(engine.is_over());
        assert_eq!(engine.snake.head(), Cell::new(5, 5));
    }

    #[test]
    fn test_chasing_the_tail_is_allowed() {
        let mut engine = engine_with(&[(5, 5), (6, 5), (6, 6), (5, 6)], Direction::West, (0, 0));
        engine.set_direction(Direction::South);
        assert_eq!(engine.tick(), TickOutcome::Moved);
        assert_eq!(body(&engine), vec![(5, 6), (5, 5), (6, 5), (6, 6)]);
    }

    #[test]
    fn test_reverse_request_is_ignored() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));

        engine.set_direction(Direction::West);
        assert_eq!(engine.pending_direction(), Direction::East);

        engine.set_direction(Direction::South);
        assert_eq!(engine.pending_direction(), Direction::South);
        assert_eq!(engine.direction(), Direction::East, "not committed before the tick");

        engine.tick();
        assert_eq!(engine.direction(), Direction::South);
    }

    #[test]
    fn test_two_turns_between_ticks_cannot_reverse() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        engine.set_direction(Direction::North);
        engine.set_direction(Direction::West);
        assert_eq!(engine.pending_direction(), Direction::North);
        engine.tick();
        assert_eq!(body(&engine), vec![(5, 4), (5, 5), (4, 5)]);
    }

    #[test]
    fn test_stray_reverse_pending_is_not_committed() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        engine.pending = Direction::West;
        engine.tick();
        assert_eq!(engine.direction(), Direction::East);
        assert_eq!(engine.snake.head(), Cell::new(6, 5));
    }

    #[test]
    fn test_random_steering_never_reverses() {
        let mut engine = engine_on(GridSize::new(20, 20), Box::new(MemoryStore::default()));
        let mut rng = StdRng::seed_from_u64(99);
        engine.set_running(true);

        for _ in 0..2000 {
            for _ in 0..rng.gen_range(0..3) {
                let dir = Direction::ALL[rng.gen_range(0..4)];
                engine.set_direction(dir);
            }
            let before = engine.direction();
            engine.tick();
            assert!(!engine.direction().is_opposite(before));

            if engine.is_over() {
                engine.reset();
                engine.set_running(true);
            }
        }
    }

    #[test]
    fn test_speed_up_every_fifth_point() {
        let mut engine = engine_with(&[(2, 1), (1, 1), (0, 1)], Direction::East, (0, 9));
        for _ in 0..4 {
            feed(&mut engine);
            engine.tick();
        }
        assert_eq!(engine.interval(), INITIAL_INTERVAL);
        engine.drain_events();

        feed(&mut engine);
        engine.tick();
        assert_eq!(engine.score(), 5);
        assert_eq!(engine.interval(), INITIAL_INTERVAL - SCORE_SPEEDUP);
        assert!(engine
            .drain_events()
            .contains(&EngineEvent::Reschedule(INITIAL_INTERVAL - SCORE_SPEEDUP)));
    }

    #[test]
    fn test_score_speed_up_floors() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (6, 5));
        engine.interval = Duration::from_millis(62);
        engine.score = 4;
        engine.tick();
        assert_eq!(engine.interval(), MIN_INTERVAL);
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        assert_eq!(
            engine.set_speed(SpeedChange::Faster(Duration::from_millis(12))),
            Duration::from_millis(128)
        );
        assert_eq!(engine.set_speed(SpeedChange::Faster(Duration::from_secs(5))), MIN_INTERVAL);
        assert_eq!(engine.set_speed(SpeedChange::Slower(Duration::from_secs(5))), MAX_INTERVAL);
    }

    #[test]
    fn test_set_speed_reschedules_only_when_running() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        engine.drain_events();
        engine.set_speed(SpeedChange::Slower(MANUAL_SPEED_STEP));
        assert!(!engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::Reschedule(_))));

        engine.set_running(true);
        engine.drain_events();
        let interval = engine.set_speed(SpeedChange::Slower(MANUAL_SPEED_STEP));
        assert_eq!(interval, Duration::from_millis(164));
        assert!(engine.drain_events().contains(&EngineEvent::Reschedule(interval)));
    }

    #[test]
    fn test_reset_restores_speed() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        engine.set_speed(SpeedChange::Faster(Duration::from_millis(50)));
        engine.reset();
        assert_eq!(engine.interval(), INITIAL_INTERVAL);

        engine.set_base_interval(Duration::from_millis(1000));
        assert_eq!(engine.interval(), MAX_INTERVAL);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        engine.food = Cell::new(0, 0);
        engine.drain_events();

        engine.toggle_running();
        assert!(engine.is_running());
        assert!(engine.drain_events().contains(&EngineEvent::Reschedule(INITIAL_INTERVAL)));
        engine.tick();
        let paused_at = body(&engine);

        engine.toggle_running();
        assert!(!engine.is_running());
        assert!(engine.drain_events().contains(&EngineEvent::Halt));
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(body(&engine), paused_at);

        engine.toggle_running();
        assert_eq!(engine.tick(), TickOutcome::Moved);
    }

    #[test]
    fn test_high_score_saved_once_per_increase() {
        let store = Arc::new(Mutex::new(MemoryStore::with_score(2)));
        let mut engine = engine_on(GridSize::new(20, 20), Box::new(store.clone()));
        engine.set_running(true);

        for _ in 0..3 {
            feed(&mut engine);
            engine.tick();
        }
        assert_eq!(engine.high_score(), 3);
        assert_eq!(store.lock().unwrap().saves(), &[3]);

        engine.reset();
        engine.set_running(true);
        feed(&mut engine);
        engine.tick();
        assert_eq!(engine.high_score(), 3);
        assert_eq!(store.lock().unwrap().saves(), &[3]);

        for _ in 0..3 {
            feed(&mut engine);
            engine.tick();
        }
        assert_eq!(engine.high_score(), 4);
        assert_eq!(store.lock().unwrap().saves(), &[3, 4]);
    }

    /// Cells of `grid` in a back-and-forth path, so any prefix is a valid body.
    fn serpentine(grid: GridSize) -> Vec<Cell> {
        (0..grid.height)
            .flat_map(|y| {
                let row: Vec<Cell> = (0..grid.width).map(|x| Cell::new(x, y)).collect();
                if y % 2 == 0 {
                    row
                } else {
                    row.into_iter().rev().collect()
                }
            })
            .collect()
    }

    #[test]
    fn test_food_never_lands_on_snake() {
        let grid = GridSize::new(5, 5);
        let path = serpentine(grid);
        let mut engine = engine_on(grid, Box::new(MemoryStore::default()));

        for len in 1..grid.area() {
            engine.snake = Snek::from_cells(path[..len].iter().rev().copied());
            let mut seen = std::collections::HashSet::new();
            for _ in 0..200 {
                let food = engine.spawn_food().expect("board has room");
                assert!(!engine.snake.occupies(food), "food on snake at len {}", len);
                assert!(food.x < grid.width && food.y < grid.height);
                seen.insert(food);
            }
            if len == grid.area() - 1 {
                assert_eq!(seen.len(), 1);
            }
        }

        engine.snake = Snek::from_cells(path.iter().copied());
        assert_eq!(engine.spawn_food(), None);
    }

    #[test]
    fn test_filling_the_board_ends_the_game() {
        let grid = GridSize::new(5, 5);
        let path = serpentine(grid);
        let mut engine = engine_on(grid, Box::new(MemoryStore::default()));
        engine.snake = Snek::from_cells(path[..24].iter().rev().copied());
        engine.current = Direction::East;
        engine.pending = Direction::East;
        engine.food = path[24];
        engine.set_running(true);

        assert_eq!(engine.tick(), TickOutcome::Crashed(EndReason::BoardFilled));
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.snake.len(), 25);
        assert!(engine.is_over());
    }

    #[test]
    fn test_resize_before_and_after_start() {
        let mut engine = engine_on(GridSize::new(10, 10), Box::new(MemoryStore::default()));
        engine.resize(GridSize::new(20, 12));
        assert_eq!(engine.grid(), GridSize::new(20, 12));
        assert_eq!(engine.snake.head(), Cell::new(11, 6));

        engine.set_running(true);
        engine.resize(GridSize::new(8, 8));
        assert_eq!(engine.grid(), GridSize::new(20, 12));
        engine.reset();
        assert_eq!(engine.grid(), GridSize::new(8, 8));
    }

    #[test]
    fn test_degenerate_grid_is_raised_to_the_minimum() {
        let tiny = GridSize {
            width: 1,
            height: 0,
        };
        let mut engine = engine_on(tiny, Box::new(MemoryStore::default()));
        assert_eq!(engine.grid(), GridSize::new(MIN_GRID_SIDE, MIN_GRID_SIDE));
        assert_eq!(engine.snake().len(), INITIAL_LENGTH as usize);

        engine.resize(GridSize {
            width: 0,
            height: 0,
        });
        assert_eq!(engine.grid(), GridSize::new(MIN_GRID_SIDE, MIN_GRID_SIDE));
        engine.set_running(true);
        let outcome = engine.tick();
        assert!(matches!(outcome, TickOutcome::Moved | TickOutcome::Ate { .. }));
    }

    #[test]
    fn test_status_snapshot() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (6, 5));
        engine.tick();
        assert_eq!(
            engine.status(),
            Status {
                score: 1,
                high_score: 1,
                snake_len: 4,
                running: true,
                game_over: false,
            }
        );
    }

    struct Scripted {
        answers: VecDeque<Result<Option<Hint>, AutopilotFault>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(
            answers: Vec<Result<Option<Hint>, AutopilotFault>>,
        ) -> (Box<dyn Autopilot>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let pilot = Scripted {
                answers: answers.into(),
                calls: calls.clone(),
            };
            (Box::new(pilot), calls)
        }
    }

    impl Autopilot for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn suggest(&mut self, _probe: &Probe) -> Result<Option<Hint>, AutopilotFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.pop_front() {
                Some(answer) => answer,
                None => panic!("out of answers"),
            }
        }
    }

    fn hint(x: i32, y: i32) -> Result<Option<Hint>, AutopilotFault> {
        Ok(Some(Hint(Delta::new(x, y))))
    }

    #[test]
    fn test_autopilot_hint_is_normalised() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        let (pilot, _) = Scripted::boxed(vec![hint(0, 7)]);
        engine.attach_autopilot(pilot);
        engine.tick();
        assert_eq!(engine.direction(), Direction::South);
    }

    #[test]
    fn test_autopilot_overrides_player() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        let (pilot, _) = Scripted::boxed(vec![hint(0, -1)]);
        engine.attach_autopilot(pilot);
        engine.set_direction(Direction::South);
        engine.tick();
        assert_eq!(engine.direction(), Direction::North);
    }

    #[test]
    fn test_bad_hints_keep_prior_pending() {
        let mut engine = engine_with(&[(4, 5), (3, 5), (2, 5)], Direction::East, (0, 0));
        let (pilot, calls) = Scripted::boxed(vec![
            hint(-3, 0),
            hint(0, 0),
            hint(2, -2),
            Ok(None),
            Err(AutopilotFault::Failed("boom".into())),
        ]);
        engine.attach_autopilot(pilot);
        engine.set_direction(Direction::East);

        for _ in 0..5 {
            assert_eq!(engine.tick(), TickOutcome::Moved);
            assert_eq!(engine.direction(), Direction::East);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // script exhausted: the autopilot panics and the game carries on
        assert_eq!(engine.tick(), TickOutcome::Crashed(EndReason::Wall));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_disabled_autopilot_is_not_consulted() {
        let mut engine = engine_with(&[(5, 5), (4, 5), (3, 5)], Direction::East, (0, 0));
        let (pilot, calls) = Scripted::boxed(vec![hint(0, 1)]);
        engine.attach_autopilot(pilot);
        assert!(!engine.set_autopilot_enabled(false));
        engine.tick();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.direction(), Direction::East);

        assert!(engine.set_autopilot_enabled(true));
        assert_eq!(engine.autopilot_name(), Some("scripted"));
        engine.tick();
        assert_eq!(engine.direction(), Direction::South);

        assert!(engine.detach_autopilot().is_some());
        assert!(!engine.set_autopilot_enabled(true));
    }
}
