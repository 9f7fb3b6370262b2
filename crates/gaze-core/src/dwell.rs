//! Two-phase dwell timer: a silent pre-hold followed by a visible fill.
//!
//! ```text
//!            begin_gaze                elapsed >= pre_hold         progress == 1
//!   Idle ───────────────▶ PreHold ─────────────────────▶ Filling ──────────────▶ commit ─▶ Idle
//!     ▲                      │                               │
//!     └──── end_gaze ────────┴───────────────────────────────┘
//! ```
//!
//! Timers are owned task values. Cancelling drops the task, so a cancelled
//! timer has nothing left that could update the indicator or commit.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FILL_SECS, DEFAULT_PRE_HOLD_SECS, DWELL_COUNTER_INTERVAL_SECS, MIN_FILL_SECS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DwellPhase {
    Idle,
    PreHold,
    Filling,
}

/// What happens when a dwell commits while gaze stays on the tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// Stay idle until gaze leaves and re-enters the tile.
    #[default]
    RequireExit,
    /// Start a fresh pre-hold immediately.
    AutoRestart,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    pub pre_hold_secs: f64,
    pub fill_secs: f64,
    pub rearm: RearmPolicy,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            pre_hold_secs: DEFAULT_PRE_HOLD_SECS,
            fill_secs: DEFAULT_FILL_SECS,
            rearm: RearmPolicy::default(),
        }
    }
}

/// Radial progress ring shown during the fill phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FillIndicator {
    pub visible: bool,
    /// Always within [0, 1].
    pub amount: f64,
}

impl FillIndicator {
    fn show(&mut self) {
        self.visible = true;
        self.amount = 0.0;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.amount = 0.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellEvent {
    /// Pre-hold elapsed; the indicator just became visible.
    FillStarted,
    /// Fill reached 100%.
    Committed,
}

/// The in-flight selection timer.
#[derive(Clone, Copy, Debug)]
enum SelectTask {
    PreHold { elapsed: f64 },
    Filling { elapsed: f64 },
}

/// Advisory once-per-second dwell counter.
#[derive(Clone, Copy, Debug, Default)]
struct CounterTask {
    pending: f64,
}

/// Per-tile dwell state machine.
#[derive(Debug)]
pub struct DwellEngine {
    pre_hold_secs: f64,
    fill_secs: f64,
    rearm: RearmPolicy,
    task: Option<SelectTask>,
    counter: Option<CounterTask>,
    indicator: FillIndicator,
    session_secs: u64,
    total_secs: u64,
}

impl DwellEngine {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            pre_hold_secs: sanitize_secs(config.pre_hold_secs, 0.0),
            fill_secs: sanitize_secs(config.fill_secs, MIN_FILL_SECS).max(MIN_FILL_SECS),
            rearm: config.rearm,
            task: None,
            counter: None,
            indicator: FillIndicator::default(),
            session_secs: 0,
            total_secs: 0,
        }
    }

    pub fn phase(&self) -> DwellPhase {
        match self.task {
            None => DwellPhase::Idle,
            Some(SelectTask::PreHold { .. }) => DwellPhase::PreHold,
            Some(SelectTask::Filling { .. }) => DwellPhase::Filling,
        }
    }

    /// Seconds spent in the current phase.
    pub fn elapsed(&self) -> f64 {
        match self.task {
            None => 0.0,
            Some(SelectTask::PreHold { elapsed } | SelectTask::Filling { elapsed }) => elapsed,
        }
    }

    pub fn progress(&self) -> f64 {
        self.indicator.amount
    }

    pub fn indicator(&self) -> FillIndicator {
        self.indicator
    }

    /// True while in PreHold or Filling.
    pub fn is_dwelling(&self) -> bool {
        self.task.is_some()
    }

    /// Whole seconds counted during the current (or last) gaze session.
    pub fn session_secs(&self) -> u64 {
        self.session_secs
    }

    /// Whole seconds counted over the engine's lifetime.
    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    /// Start a fresh dwell, cancelling any timer already running.
    pub fn begin_gaze(&mut self) {
        self.cancel();
        self.task = Some(SelectTask::PreHold { elapsed: 0.0 });
        self.counter = Some(CounterTask::default());
        self.session_secs = 0;
    }

    /// Abort the dwell. Idempotent.
    pub fn end_gaze(&mut self) {
        self.cancel();
    }

    /// Lifecycle teardown: same guarantees as [`end_gaze`](Self::end_gaze)
    /// whatever the phase.
    pub fn disable(&mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.task = None;
        self.counter = None;
        self.indicator.hide();
    }

    /// Advance both timers by unscaled `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Option<DwellEvent> {
        let dt = sanitize_secs(dt, 0.0);
        self.advance_counter(dt);
        self.advance_task(dt)
    }

    fn advance_counter(&mut self, dt: f64) {
        let Some(counter) = self.counter.as_mut() else {
            return;
        };
        counter.pending += dt;
        let whole = (counter.pending / DWELL_COUNTER_INTERVAL_SECS).floor();
        if whole < 1.0 {
            return;
        }
        counter.pending -= whole * DWELL_COUNTER_INTERVAL_SECS;
        // Float-to-int `as` saturates, so an absurd dt pins the counters at u64::MAX.
        let secs = whole as u64;
        self.session_secs = self.session_secs.saturating_add(secs);
        self.total_secs = self.total_secs.saturating_add(secs);
    }

    fn advance_task(&mut self, dt: f64) -> Option<DwellEvent> {
        match self.task.as_mut()? {
            SelectTask::PreHold { elapsed } => {
                *elapsed += dt;
                if *elapsed >= self.pre_hold_secs {
                    // Overshoot past the pre-hold is not carried into the fill.
                    self.task = Some(SelectTask::Filling { elapsed: 0.0 });
                    self.indicator.show();
                    return Some(DwellEvent::FillStarted);
                }
                None
            }
            SelectTask::Filling { elapsed } => {
                *elapsed += dt;
                let progress = (*elapsed / self.fill_secs).clamp(0.0, 1.0);
                self.indicator.amount = progress;
                if progress >= 1.0 {
                    self.indicator.hide();
                    self.task = match self.rearm {
                        RearmPolicy::RequireExit => None,
                        RearmPolicy::AutoRestart => Some(SelectTask::PreHold { elapsed: 0.0 }),
                    };
                    return Some(DwellEvent::Committed);
                }
                None
            }
        }
    }
}

fn sanitize_secs(secs: f64, fallback: f64) -> f64 {
    if secs.is_finite() && secs >= 0.0 {
        secs
    } else {
        fallback
    }
}
