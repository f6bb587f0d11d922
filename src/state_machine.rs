/// The global game phase and the machine that moves between phases.
///
/// Every transition goes through `StateMachine::change_state`, which exits the
/// old phase, notifies subscribers in registration order, then enters the new
/// phase.  Only `Countdown` has per-frame behaviour.

use std::fmt;
use std::str::FromStr;

use crate::error::PhaseParseError;

/// Countdown length used when no configuration overrides it.
pub const DEFAULT_COUNTDOWN_SECONDS: f32 = 3.0;

/// Slack on the countdown's zero check so that frame deltas which sum to the
/// countdown length in exact arithmetic fire on that same frame.
const COUNTDOWN_EPSILON: f32 = 1e-4;

// ── Phases ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Countdown,
    Ignition,
    Launch,
    AtmosphereLow,
    AtmosphereMid,
    AtmosphereHigh,
    Space,
    Planet4,
    Planet5,
    Planet6,
    Planet7,
    Planet8,
    Planet9,
    Pause,
    PlayerDied,
}

impl GamePhase {
    pub const ALL: [GamePhase; 15] = [
        GamePhase::Countdown,
        GamePhase::Ignition,
        GamePhase::Launch,
        GamePhase::AtmosphereLow,
        GamePhase::AtmosphereMid,
        GamePhase::AtmosphereHigh,
        GamePhase::Space,
        GamePhase::Planet4,
        GamePhase::Planet5,
        GamePhase::Planet6,
        GamePhase::Planet7,
        GamePhase::Planet8,
        GamePhase::Planet9,
        GamePhase::Pause,
        GamePhase::PlayerDied,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GamePhase::Countdown => "Countdown",
            GamePhase::Ignition => "Ignition",
            GamePhase::Launch => "Launch",
            GamePhase::AtmosphereLow => "AtmosphereLow",
            GamePhase::AtmosphereMid => "AtmosphereMid",
            GamePhase::AtmosphereHigh => "AtmosphereHigh",
            GamePhase::Space => "Space",
            GamePhase::Planet4 => "Planet4",
            GamePhase::Planet5 => "Planet5",
            GamePhase::Planet6 => "Planet6",
            GamePhase::Planet7 => "Planet7",
            GamePhase::Planet8 => "Planet8",
            GamePhase::Planet9 => "Planet9",
            GamePhase::Pause => "Pause",
            GamePhase::PlayerDied => "PlayerDied",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive; `_` and `-` are ignored so `atmosphere_low` and
/// `Atmosphere-Low` both parse.
impl FromStr for GamePhase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        GamePhase::ALL
            .iter()
            .copied()
            .find(|p| p.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| PhaseParseError(s.to_string()))
    }
}

// ── Subscribers ───────────────────────────────────────────────────────────────

/// Returned by `subscribe`; pass it to `unsubscribe` at teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriberId(u64);

type PhaseCallback = Box<dyn FnMut(GamePhase)>;

// ── Machine ───────────────────────────────────────────────────────────────────

pub struct StateMachine {
    current: GamePhase,
    /// Seconds left in the countdown.  Meaningful only during `Countdown`.
    state_timer: f32,
    countdown_seconds: f32,
    countdown_visible: bool,
    /// Phase that `Pause` interrupted, with the timer it had left.
    resume_to: Option<(GamePhase, f32)>,
    subscribers: Vec<(SubscriberId, PhaseCallback)>,
    next_id: u64,
}

impl StateMachine {
    /// Builds a machine sitting in `Countdown` with a full timer.  Nothing is
    /// notified until `start` or `change_state` is called.
    pub fn new(countdown_seconds: f32) -> Self {
        Self {
            current: GamePhase::Countdown,
            state_timer: countdown_seconds,
            countdown_seconds,
            countdown_visible: false,
            resume_to: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    pub fn is_paused(&self) -> bool {
        self.current == GamePhase::Pause
    }

    /// Whole seconds left, rounded up, while the countdown is showing.
    pub fn countdown_display(&self) -> Option<u32> {
        if self.countdown_visible {
            Some(self.state_timer.max(0.0).ceil() as u32)
        } else {
            None
        }
    }

    /// Register a callback for every future phase change.  Earlier changes
    /// are not replayed.
    pub fn subscribe(&mut self, callback: impl FnMut(GamePhase) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Enter the opening phase so that subscribers see it.
    pub fn start(&mut self) {
        self.change_state(GamePhase::Countdown);
    }

    /// The single mutation point.  Re-entering the current phase is allowed
    /// and notifies subscribers again.
    pub fn change_state(&mut self, next: GamePhase) {
        let previous = self.current;
        self.exit_phase();
        self.current = next;
        log::info!("Game phase {} -> {}", previous, next);

        for (_, callback) in self.subscribers.iter_mut() {
            callback(next);
        }

        self.enter_phase(previous);
    }

    /// Leave `Pause` for the phase it interrupted.  Subscribers are notified
    /// of that phase again, but its timer carries on from where it stopped
    /// instead of restarting.  Does nothing outside `Pause`.
    pub fn resume(&mut self) {
        if self.current != GamePhase::Pause {
            return;
        }
        match self.resume_to.take() {
            Some((phase, timer)) => {
                self.change_state(phase);
                self.state_timer = timer;
            }
            None => self.change_state(GamePhase::Countdown),
        }
    }

    /// Per-frame update.
    pub fn tick(&mut self, delta_time: f32) {
        if self.current == GamePhase::Countdown {
            self.state_timer -= delta_time;
            if self.state_timer <= COUNTDOWN_EPSILON {
                self.change_state(GamePhase::Ignition);
            }
        }
    }

    fn exit_phase(&mut self) {
        if self.current == GamePhase::Countdown {
            self.countdown_visible = false;
        }
    }

    fn enter_phase(&mut self, previous: GamePhase) {
        match self.current {
            GamePhase::Countdown => {
                self.state_timer = self.countdown_seconds;
                self.countdown_visible = true;
            }
            GamePhase::Ignition => {
                self.state_timer = self.countdown_seconds;
            }
            GamePhase::Pause => {
                if previous != GamePhase::Pause {
                    self.resume_to = Some((previous, self.state_timer));
                }
            }
            GamePhase::PlayerDied => {
                self.resume_to = None;
            }
            _ => {}
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECONDS)
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("state_timer", &self.state_timer)
            .field("countdown_visible", &self.countdown_visible)
            .field("resume_to", &self.resume_to)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
