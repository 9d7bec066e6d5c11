//! Cyclic phase timer for the signal-controlled intersection.

use std::time::Duration;

use pursuit_core::{Axis, LightPhase};

const EAST_WEST_GREEN: Duration = Duration::from_millis(6_000);
const EAST_WEST_YELLOW: Duration = Duration::from_millis(2_000);
const NORTH_SOUTH_GREEN: Duration = Duration::from_millis(6_000);
const NORTH_SOUTH_YELLOW: Duration = Duration::from_millis(2_000);

/// Deterministic four-phase signal timer.
///
/// Invariant: elapsed time within the current phase is always strictly less
/// than that phase's duration; overshoot rolls into following phases.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    phase: LightPhase,
    elapsed: Duration,
}

impl TrafficLight {
    /// Creates a light resting at the start of the east-west green phase.
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            phase: LightPhase::EastWestGreen,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns the light to phase 0 with zero elapsed time.
    pub(crate) fn reset(&mut self) {
        self.phase = LightPhase::EastWestGreen;
        self.elapsed = Duration::ZERO;
    }

    /// Advances the timer, carrying overshoot into later phases.
    ///
    /// Returns `true` when at least one phase boundary was crossed.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut changed = false;
        while self.elapsed >= phase_duration(self.phase) {
            self.elapsed -= phase_duration(self.phase);
            self.phase = self.phase.next();
            changed = true;
        }
        changed
    }

    /// Reports whether travel along the provided axis may enter the
    /// intersection right now.
    #[must_use]
    pub fn permits(&self, axis: Axis) -> bool {
        self.phase.permits(axis)
    }

    /// Phase currently displayed by the signal head.
    #[must_use]
    pub const fn phase(&self) -> LightPhase {
        self.phase
    }

    /// Time left before the signal advances to the next phase.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        phase_duration(self.phase).saturating_sub(self.elapsed)
    }

    #[cfg(any(test, feature = "scenario_scaffolding"))]
    pub(crate) fn force_phase(&mut self, phase: LightPhase) {
        self.phase = phase;
        self.elapsed = Duration::ZERO;
    }
}

/// Fixed duration of each signal phase.
#[must_use]
pub fn phase_duration(phase: LightPhase) -> Duration {
    match phase {
        LightPhase::EastWestGreen => EAST_WEST_GREEN,
        LightPhase::EastWestYellow => EAST_WEST_YELLOW,
        LightPhase::NorthSouthGreen => NORTH_SOUTH_GREEN,
        LightPhase::NorthSouthYellow => NORTH_SOUTH_YELLOW,
    }
}
