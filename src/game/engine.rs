use super::clock::{Clock, SystemClock};
use super::constants::{
    BASE_LOGIC_INTERVAL_MS, DOUBLE_POINTS_FACTOR, FOOD_POINTS, INITIAL_POWER_UP_SPAWN_DELAY_MS,
    INITIAL_SNAKE_LENGTH, MAX_POWER_UPS, MAX_POWER_UPS_PER_SPAWN, MAX_POWER_UP_SPAWN_DELAY_MS,
    MAX_QUEUED_DIRECTIONS, MIN_BOARD_SIZE, MIN_INTERVAL_SCALE, MIN_POWER_UP_SPAWN_DELAY_MS,
    MIN_SNAKE_LENGTH, POWER_UP_POINTS, SCORE_SPEEDUP_PER_POINT, SHRINK_SEGMENTS,
    SPEED_BOOST_MULTIPLIER,
};
use super::geometry::{Direction, Position};
use super::power_up::{PowerUp, PowerUpKind};
use super::snapshot::{ActiveEffectSnapshot, BoardSize, GameSnapshot, PowerUpSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    Ready,
    Playing,
    Paused,
    GameOver,
}

impl GameState {
    pub fn name(self) -> &'static str {
        match self {
            GameState::Ready => "Ready",
            GameState::Playing => "Playing",
            GameState::Paused => "Paused",
            GameState::GameOver => "GameOver",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("board must be at least {min}x{min}, got {width}x{height}", min = MIN_BOARD_SIZE)]
    InvalidBoardSize { width: i32, height: i32 },
}

/// One player's simulation. Owns the whole board; nothing in here is shared between sessions.
#[derive(Debug)]
pub struct Engine {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    state: GameState,
    width: i32,
    height: i32,
    snake: VecDeque<Position>,
    food: Position,
    direction: Direction,
    direction_queue: VecDeque<Direction>,
    grow_pending: bool,
    score: u32,
    power_ups: Vec<PowerUp>,
    active_effects: Vec<PowerUp>,
    shield_active: bool,
    double_points_active: bool,
    speed_multiplier: f64,
    logic_accumulator: f64,
    logic_steps: u64,
    games_started: u64,
    last_power_up_spawn_at: i64,
    next_power_up_spawn_delay: i64,
    started_at: i64,
    ended_at: Option<i64>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(SystemClock), StdRng::from_entropy())
    }

    pub fn with_parts(clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            clock,
            rng,
            state: GameState::Ready,
            width: 0,
            height: 0,
            snake: VecDeque::new(),
            food: Position::new(0, 0),
            direction: Direction::Right,
            direction_queue: VecDeque::with_capacity(MAX_QUEUED_DIRECTIONS),
            grow_pending: false,
            score: 0,
            power_ups: Vec::new(),
            active_effects: Vec::new(),
            shield_active: false,
            double_points_active: false,
            speed_multiplier: 1.0,
            logic_accumulator: 0.0,
            logic_steps: 0,
            games_started: 0,
            last_power_up_spawn_at: 0,
            next_power_up_spawn_delay: INITIAL_POWER_UP_SPAWN_DELAY_MS,
            started_at: 0,
            ended_at: None,
        }
    }

    /// Starts a fresh game, discarding whatever was running before.
    pub fn initialize(&mut self, width: i32, height: i32) -> Result<(), EngineError> {
        if width < MIN_BOARD_SIZE || height < MIN_BOARD_SIZE {
            return Err(EngineError::InvalidBoardSize { width, height });
        }

        let now = self.clock.now_millis();
        self.width = width;
        self.height = height;
        self.score = 0;
        self.logic_accumulator = 0.0;
        self.logic_steps = 0;
        self.games_started += 1;
        self.grow_pending = false;
        self.power_ups.clear();
        self.active_effects.clear();
        self.direction_queue.clear();
        self.shield_active = false;
        self.double_points_active = false;
        self.speed_multiplier = 1.0;
        self.last_power_up_spawn_at = now;
        self.next_power_up_spawn_delay = INITIAL_POWER_UP_SPAWN_DELAY_MS;
        self.started_at = now;
        self.ended_at = None;

        let center = Position::new(width / 2, height / 2);
        self.snake = (0..INITIAL_SNAKE_LENGTH as i32)
            .map(|offset| center - Position::new(offset, 0))
            .collect();
        self.direction = Direction::Right;

        self.spawn_food();
        self.spawn_power_ups(now);
        self.state = GameState::Playing;
        tracing::debug!(width, height, "game initialized");
        Ok(())
    }

    /// Feeds `delta_ms` of wall time into the fixed-step accumulator and runs every logic
    /// step that became due. Returns false when not playing or when a step ended the game.
    pub fn update(&mut self, delta_ms: f64) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.logic_accumulator += delta_ms;
        }

        loop {
            let interval = self.logic_interval_ms();
            if self.logic_accumulator < interval {
                return true;
            }
            if !self.step() {
                return false;
            }
            self.logic_accumulator -= interval;
        }
    }

    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if self.state != GameState::Playing {
            return false;
        }

        let last = self.direction_queue.back().copied().unwrap_or(self.direction);
        if direction.is_opposite(last) || direction == last {
            return false;
        }
        if self.direction_queue.len() >= MAX_QUEUED_DIRECTIONS {
            return false;
        }
        self.direction_queue.push_back(direction);
        true
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            GameState::Playing => GameState::Paused,
            GameState::Paused => GameState::Playing,
            other => other,
        };
    }

    /// Current interval between logic steps, shortened by score and speed boosts.
    pub fn logic_interval_ms(&self) -> f64 {
        let scale = (1.0 - self.score as f64 * SCORE_SPEEDUP_PER_POINT).clamp(MIN_INTERVAL_SCALE, 1.0);
        BASE_LOGIC_INTERVAL_MS * scale / self.speed_multiplier
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn board_size(&self) -> BoardSize {
        BoardSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn head(&self) -> Option<Position> {
        self.snake.front().copied()
    }

    /// Number of logic steps completed since the last `initialize`.
    pub fn logic_steps(&self) -> u64 {
        self.logic_steps
    }

    /// How many times `initialize` has succeeded; identifies the current game.
    pub fn games_started(&self) -> u64 {
        self.games_started
    }

    /// Wall time since `initialize`, frozen once the game is over.
    pub fn elapsed_millis(&self) -> i64 {
        match (self.state, self.ended_at) {
            (GameState::Ready, _) => 0,
            (_, Some(ended_at)) => ended_at - self.started_at,
            _ => self.clock.now_millis() - self.started_at,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let now = self.clock.now_millis();
        GameSnapshot {
            board_size: self.board_size(),
            snake: self.snake.iter().copied().collect(),
            food: self.food,
            score: self.score,
            game_state: self.state,
            direction: self.direction,
            power_ups: self
                .power_ups
                .iter()
                .map(|power_up| PowerUpSnapshot {
                    kind: power_up.kind,
                    position: power_up.position,
                    remaining_expiry: power_up.remaining_expiry_fraction(now),
                })
                .collect(),
            active_effects: self
                .active_effects
                .iter()
                .map(|effect| ActiveEffectSnapshot {
                    kind: effect.kind,
                    remaining_effect: effect.remaining_effect_fraction(now),
                    effect_duration_secs: effect.kind.effect_duration_secs(),
                })
                .collect(),
            is_shield_active: self.shield_active,
            is_double_points_active: self.double_points_active,
            speed_multiplier: self.speed_multiplier,
            elapsed_ms: self.elapsed_millis(),
        }
    }

    fn step(&mut self) -> bool {
        let now = self.clock.now_millis();
        if let Some(next) = self.direction_queue.pop_front() {
            self.direction = next;
        }

        let Some(head) = self.head() else { return false };
        let mut new_head = head + self.direction.to_vector();
        if self.shield_active {
            new_head = new_head.wrapped(self.width, self.height);
        } else if !new_head.is_within(self.width, self.height) || self.snake.contains(&new_head) {
            self.end_game(now);
            return false;
        }

        self.snake.push_front(new_head);

        if new_head == self.food {
            self.score += self.award(FOOD_POINTS);
            self.grow_pending = true;
            if !self.spawn_food() {
                self.end_game(now);
                return false;
            }
        }

        if self.grow_pending {
            self.grow_pending = false;
        } else {
            self.snake.pop_back();
        }

        self.update_power_ups(now);
        self.logic_steps += 1;
        true
    }

    fn end_game(&mut self, now: i64) {
        self.state = GameState::GameOver;
        self.ended_at = Some(now);
        tracing::debug!(score = self.score, length = self.snake.len(), "game over");
    }

    fn award(&self, points: u32) -> u32 {
        if self.double_points_active {
            points * DOUBLE_POINTS_FACTOR
        } else {
            points
        }
    }

    fn update_power_ups(&mut self, now: i64) {
        let (ended, running): (Vec<PowerUp>, Vec<PowerUp>) = std::mem::take(&mut self.active_effects)
            .into_iter()
            .partition(|effect| effect.is_active() && !effect.is_active_effect(now));
        self.active_effects = running;
        for mut effect in ended {
            effect.deactivate();
            self.clear_effect(effect.kind);
        }

        self.power_ups.retain(|power_up| !power_up.is_expired(now));

        let head = self.head();
        let mut index = self.power_ups.len();
        while index > 0 {
            index -= 1;
            if Some(self.power_ups[index].position) != head {
                continue;
            }
            let power_up = self.power_ups.remove(index);
            self.collect(power_up, now);
        }

        if self.power_ups.len() < MAX_POWER_UPS
            && now - self.last_power_up_spawn_at > self.next_power_up_spawn_delay
        {
            self.spawn_power_ups(now);
        }
    }

    fn collect(&mut self, mut power_up: PowerUp, now: i64) {
        self.score += self.award(POWER_UP_POINTS);

        if let Some(existing) = self
            .active_effects
            .iter_mut()
            .find(|effect| effect.kind == power_up.kind)
        {
            existing.activate(now);
            return;
        }

        power_up.activate(now);
        self.apply_effect(power_up.kind);
        if !power_up.kind.is_instant() {
            self.active_effects.push(power_up);
        }
    }

    fn apply_effect(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Shield => self.shield_active = true,
            PowerUpKind::DoublePoints => self.double_points_active = true,
            PowerUpKind::SpeedBoost => self.speed_multiplier = SPEED_BOOST_MULTIPLIER,
            PowerUpKind::Shrink => {
                let removable = SHRINK_SEGMENTS.min(self.snake.len().saturating_sub(MIN_SNAKE_LENGTH));
                self.snake.truncate(self.snake.len() - removable);
                debug_assert!(self.snake.len() >= MIN_SNAKE_LENGTH);
            }
        }
    }

    fn clear_effect(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Shield => self.shield_active = false,
            PowerUpKind::DoublePoints => self.double_points_active = false,
            PowerUpKind::SpeedBoost => self.speed_multiplier = 1.0,
            PowerUpKind::Shrink => {}
        }
    }

    fn free_cells(&self, blocked: &HashSet<Position>) -> Vec<Position> {
        let mut cells = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let cell = Position::new(x, y);
                if !blocked.contains(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    fn spawn_food(&mut self) -> bool {
        let blocked: HashSet<Position> = self.snake.iter().copied().collect();
        let free = self.free_cells(&blocked);
        if free.is_empty() {
            return false;
        }
        self.food = free[self.rng.gen_range(0..free.len())];
        true
    }

    fn spawn_power_ups(&mut self, now: i64) {
        if self.power_ups.len() >= MAX_POWER_UPS {
            return;
        }

        let mut blocked: HashSet<Position> = self.snake.iter().copied().collect();
        blocked.insert(self.food);
        blocked.extend(self.power_ups.iter().map(|power_up| power_up.position));
        let mut free = self.free_cells(&blocked);
        if free.is_empty() {
            return;
        }

        let room = (MAX_POWER_UPS - self.power_ups.len()).min(MAX_POWER_UPS_PER_SPAWN);
        let count = self.rng.gen_range(1..=room);
        for _ in 0..count {
            if free.is_empty() {
                break;
            }
            let index = self.rng.gen_range(0..free.len());
            let position = free.swap_remove(index);
            let kind = PowerUpKind::random(&mut self.rng);
            self.power_ups
                .push(PowerUp::spawn(kind, position, now, &mut self.rng));
        }

        self.last_power_up_spawn_at = now;
        self.next_power_up_spawn_delay =
            self.rng.gen_range(MIN_POWER_UP_SPAWN_DELAY_MS..=MAX_POWER_UP_SPAWN_DELAY_MS);
    }
}

#[cfg(test)]
impl Engine {
    pub fn seeded(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(clock, StdRng::seed_from_u64(seed))
    }

    pub fn snake(&self) -> &VecDeque<Position> {
        &self.snake
    }

    pub fn food(&self) -> Position {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn queued_directions(&self) -> &VecDeque<Direction> {
        &self.direction_queue
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    pub fn active_effects(&self) -> &[PowerUp] {
        &self.active_effects
    }

    pub fn is_shield_active(&self) -> bool {
        self.shield_active
    }

    pub fn is_double_points_active(&self) -> bool {
        self.double_points_active
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub(crate) fn force_game_over(&mut self, score: u32) {
        self.score = score;
        let now = self.clock.now_millis();
        self.end_game(now);
    }
}
