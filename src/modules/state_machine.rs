use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::modules::checks::{CheckDefinition, GoalKind};
use crate::modules::signal_extractor::GeometricSignals;

/// Progress of one goal within the active check.
#[derive(Debug, Clone)]
enum GoalProgress {
    /// HOLD goal: qualifying-tick counter with decay.
    Hold { count: u32, hold_ticks: u32 },
    /// EDGE goal: counts ticks inside the threshold region; `primed` once the
    /// debounce is met, satisfied on the first tick back outside the region.
    Edge {
        region_ticks: u32,
        debounce_ticks: u32,
        primed: bool,
    },
    Satisfied,
}

impl GoalProgress {
    fn new(kind: GoalKind) -> Self {
        match kind {
            GoalKind::Hold { hold_ticks } => GoalProgress::Hold {
                count: 0,
                hold_ticks,
            },
            GoalKind::Edge { debounce_ticks } => GoalProgress::Edge {
                region_ticks: 0,
                debounce_ticks,
                primed: false,
            },
        }
    }

    fn is_satisfied(&self) -> bool {
        matches!(self, GoalProgress::Satisfied)
    }

    /// progress_pct maps the internal counters to 0-100 for UI display.
    fn progress_pct(&self) -> u8 {
        match *self {
            GoalProgress::Satisfied => 100,
            GoalProgress::Hold { count, hold_ticks } => {
                if hold_ticks == 0 {
                    100
                } else {
                    ((count * 100 / hold_ticks).min(99)) as u8
                }
            }
            GoalProgress::Edge {
                region_ticks,
                debounce_ticks,
                primed,
            } => {
                if primed {
                    50
                } else if debounce_ticks == 0 {
                    0
                } else {
                    ((region_ticks * 50 / debounce_ticks).min(49)) as u8
                }
            }
        }
    }

    /// update consumes one tick's predicate outcome. Returns true once the
    /// goal has just become satisfied.
    fn update(&mut self, qualifying: bool) -> bool {
        match self {
            GoalProgress::Satisfied => false,
            GoalProgress::Hold { count, hold_ticks } => {
                if qualifying {
                    *count += 1;
                    if *count >= *hold_ticks {
                        *self = GoalProgress::Satisfied;
                        return true;
                    }
                } else {
                    // Decay instead of reset so one dropped frame does not
                    // discard a nearly-complete hold.
                    *count = count.saturating_sub(1);
                }
                false
            }
            GoalProgress::Edge {
                region_ticks,
                debounce_ticks,
                primed,
            } => {
                if qualifying {
                    *region_ticks += 1;
                    if *region_ticks >= *debounce_ticks {
                        *primed = true;
                    }
                } else if *primed {
                    // Leaving the region after the debounce completes the
                    // transition cycle.
                    *self = GoalProgress::Satisfied;
                    return true;
                } else {
                    *region_ticks = region_ticks.saturating_sub(1);
                }
                false
            }
        }
    }

    /// coast applies the per-tick decay without a signal, for no-face and
    /// too-far ticks.
    fn coast(&mut self) {
        match self {
            GoalProgress::Satisfied => {}
            GoalProgress::Hold { count, .. } => *count = count.saturating_sub(1),
            GoalProgress::Edge {
                region_ticks,
                primed,
                ..
            } => {
                // A primed edge goal stays primed: the subject already held
                // the region, and losing the face is not the completing
                // transition.
                if !*primed {
                    *region_ticks = region_ticks.saturating_sub(1);
                }
            }
        }
    }
}

/// Per-tick result of advancing the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceOutcome {
    /// Id of the check completed on this tick, if any.
    pub check_completed: Option<String>,
    /// True once every check in the sequence has been satisfied.
    pub all_done: bool,
}

/// UI-facing view of one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSnapshot {
    pub label: String,
    pub satisfied: bool,
    /// 0-100.
    pub progress: u8,
}

/// Ordered liveness challenge sequence with hysteresis.
///
/// The check index only moves forward; a satisfied goal never regresses.
#[derive(Debug, Clone)]
pub struct LivenessStateMachine {
    checks: Vec<CheckDefinition>,
    current: usize,
    active_goals: Vec<GoalProgress>,
    done: bool,
}

impl LivenessStateMachine {
    /// new initializes the machine over a fixed check sequence.
    pub fn new(checks: Vec<CheckDefinition>) -> Self {
        let active_goals = checks
            .first()
            .map(|c| c.goals.iter().map(|g| GoalProgress::new(g.kind)).collect())
            .unwrap_or_default();
        let done = checks.is_empty();
        LivenessStateMachine {
            checks,
            current: 0,
            active_goals,
            done,
        }
    }

    /// advance consumes one tick's signals.
    ///
    /// # Arguments
    /// * `signals` - the current tick's geometric signals
    ///
    /// # Returns
    /// * `AdvanceOutcome`
    pub fn advance(&mut self, signals: &GeometricSignals) -> AdvanceOutcome {
        if self.done {
            return AdvanceOutcome {
                check_completed: None,
                all_done: true,
            };
        }

        let check = &self.checks[self.current];
        for (goal, progress) in check.goals.iter().zip(self.active_goals.iter_mut()) {
            let qualifying = goal.predicate.eval(signals);
            if progress.update(qualifying) {
                debug!(check = %check.id, goal = %goal.label, "liveness goal satisfied");
            }
        }

        if self.active_goals.iter().all(GoalProgress::is_satisfied) {
            let completed = self.checks[self.current].id.clone();
            info!(check = %completed, "liveness check completed");
            self.current += 1;
            if self.current >= self.checks.len() {
                self.done = true;
                self.active_goals.clear();
            } else {
                self.active_goals = self.checks[self.current]
                    .goals
                    .iter()
                    .map(|g| GoalProgress::new(g.kind))
                    .collect();
            }
            return AdvanceOutcome {
                check_completed: Some(completed),
                all_done: self.done,
            };
        }

        AdvanceOutcome {
            check_completed: None,
            all_done: false,
        }
    }

    /// coast applies one tick of decay without signals, used for no-face and
    /// too-far ticks. The check index never moves.
    pub fn coast(&mut self) {
        for progress in &mut self.active_goals {
            progress.coast();
        }
    }

    /// is_done reports whether every check has been satisfied.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// current_check_index returns the active check's position. Equals the
    /// check count once the machine is done.
    pub fn current_check_index(&self) -> usize {
        self.current
    }

    /// current_check_id returns the active check's id, or None when done.
    pub fn current_check_id(&self) -> Option<&str> {
        self.checks.get(self.current).map(|c| c.id.as_str())
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// goal_snapshots returns the UI view of the active check's goals.
    pub fn goal_snapshots(&self) -> Vec<GoalSnapshot> {
        match self.checks.get(self.current) {
            None => Vec::new(),
            Some(check) => check
                .goals
                .iter()
                .zip(self.active_goals.iter())
                .map(|(goal, progress)| GoalSnapshot {
                    label: goal.label.clone(),
                    satisfied: progress.is_satisfied(),
                    progress: progress.progress_pct(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::LivenessConfig;
    use crate::modules::checks::canonical_sequence;
    use proptest::prelude::*;

    fn signals(yaw: f32, pitch: f32, ear: f32, mar: f32) -> GeometricSignals {
        GeometricSignals {
            ear,
            mar,
            yaw_deg: yaw,
            pitch_deg: pitch,
            face_ratio: 0.375,
        }
    }

    fn centered() -> GeometricSignals {
        signals(0.0, 0.0, 0.3, 0.1)
    }

    fn machine() -> LivenessStateMachine {
        LivenessStateMachine::new(canonical_sequence(&LivenessConfig::new()))
    }

    /// Drives a fresh machine through the centered hold.
    fn complete_center(m: &mut LivenessStateMachine) {
        for _ in 0..12 {
            m.advance(&centered());
        }
        assert_eq!(m.current_check_id(), Some("turn"));
    }

    fn complete_turn(m: &mut LivenessStateMachine) {
        for _ in 0..3 {
            m.advance(&signals(-25.0, 0.0, 0.3, 0.1));
        }
        for _ in 0..3 {
            m.advance(&signals(25.0, 0.0, 0.3, 0.1));
        }
        assert_eq!(m.current_check_id(), Some("mouth-open"));
    }

    #[test]
    fn test_hold_goal_needs_more_than_one_qualifying_tick() {
        let mut m = machine();
        let out = m.advance(&centered());
        assert_eq!(out.check_completed, None);
        assert_eq!(m.current_check_index(), 0);
    }

    #[test]
    fn test_hold_counter_decays_instead_of_resetting() {
        let mut m = machine();
        // 11 qualifying ticks, one noisy tick, then one more qualifying tick
        // leaves the counter one short; a second qualifying tick completes.
        for _ in 0..11 {
            m.advance(&centered());
        }
        m.advance(&signals(30.0, 0.0, 0.3, 0.1));
        let out = m.advance(&centered());
        assert_eq!(out.check_completed, None);
        let out = m.advance(&centered());
        assert_eq!(out.check_completed.as_deref(), Some("center"));
    }

    #[test]
    fn test_turn_never_completes_from_one_side_only() {
        let mut m = machine();
        complete_center(&mut m);
        for _ in 0..500 {
            let out = m.advance(&signals(-30.0, 0.0, 0.3, 0.1));
            assert_eq!(out.check_completed, None);
        }
        assert_eq!(m.current_check_id(), Some("turn"));
    }

    #[test]
    fn test_turn_completes_in_either_order_exactly_once() {
        for flip in [false, true] {
            let mut m = machine();
            complete_center(&mut m);
            let (first, second) = if flip { (25.0, -25.0) } else { (-25.0, 25.0) };
            let mut completions = 0;
            for _ in 0..3 {
                if m.advance(&signals(first, 0.0, 0.3, 0.1))
                    .check_completed
                    .is_some()
                {
                    completions += 1;
                }
            }
            for _ in 0..3 {
                if m.advance(&signals(second, 0.0, 0.3, 0.1))
                    .check_completed
                    .is_some()
                {
                    completions += 1;
                }
            }
            assert_eq!(completions, 1);
            assert_eq!(m.current_check_id(), Some("mouth-open"));
        }
    }

    #[test]
    fn test_edge_goal_needs_the_full_cycle() {
        let mut m = machine();
        complete_center(&mut m);
        complete_turn(&mut m);
        // Mouth opens and stays open: never satisfies the edge goal.
        for _ in 0..500 {
            let out = m.advance(&signals(0.0, 0.0, 0.3, 0.8));
            assert_eq!(out.check_completed, None);
        }
        assert_eq!(m.current_check_id(), Some("mouth-open"));
        // Closing after the debounced open completes the cycle.
        let out = m.advance(&signals(0.0, 0.0, 0.3, 0.1));
        assert_eq!(out.check_completed.as_deref(), Some("mouth-open"));
    }

    #[test]
    fn test_edge_goal_ignores_single_noisy_frame() {
        let mut m = machine();
        complete_center(&mut m);
        complete_turn(&mut m);
        // One frame above the MAR threshold does not reach the debounce, so
        // the following closed frame is not a completing transition.
        m.advance(&signals(0.0, 0.0, 0.3, 0.8));
        let out = m.advance(&signals(0.0, 0.0, 0.3, 0.1));
        assert_eq!(out.check_completed, None);
        assert_eq!(m.current_check_id(), Some("mouth-open"));
    }

    #[test]
    fn test_blink_requires_reopening() {
        let mut m = machine();
        complete_center(&mut m);
        complete_turn(&mut m);
        for _ in 0..8 {
            m.advance(&signals(0.0, 0.0, 0.3, 0.8));
        }
        m.advance(&signals(0.0, 0.0, 0.3, 0.1));
        assert_eq!(m.current_check_id(), Some("blink"));
        // Eyes close and stay closed: no completion.
        for _ in 0..300 {
            let out = m.advance(&signals(0.0, 0.0, 0.1, 0.1));
            assert!(!out.all_done);
        }
        // Re-opening completes the blink and the whole sequence.
        let out = m.advance(&signals(0.0, 0.0, 0.32, 0.1));
        assert_eq!(out.check_completed.as_deref(), Some("blink"));
        assert!(out.all_done);
        assert!(m.is_done());
    }

    #[test]
    fn test_coast_pauses_without_losing_all_progress() {
        let mut m = machine();
        for _ in 0..10 {
            m.advance(&centered());
        }
        m.coast();
        m.coast();
        assert_eq!(m.current_check_index(), 0);
        // Two decayed ticks cost two, so four more qualifying ticks finish.
        for _ in 0..3 {
            assert_eq!(m.advance(&centered()).check_completed, None);
        }
        let out = m.advance(&centered());
        assert_eq!(out.check_completed.as_deref(), Some("center"));
    }

    #[test]
    fn test_advance_after_done_is_inert() {
        let mut m = machine();
        complete_center(&mut m);
        complete_turn(&mut m);
        for _ in 0..8 {
            m.advance(&signals(0.0, 0.0, 0.3, 0.8));
        }
        m.advance(&signals(0.0, 0.0, 0.3, 0.1));
        for _ in 0..3 {
            m.advance(&signals(0.0, 0.0, 0.1, 0.1));
        }
        m.advance(&signals(0.0, 0.0, 0.32, 0.1));
        assert!(m.is_done());
        let idx = m.current_check_index();
        let out = m.advance(&signals(40.0, 40.0, 0.0, 1.0));
        assert!(out.all_done);
        assert_eq!(out.check_completed, None);
        assert_eq!(m.current_check_index(), idx);
    }

    #[test]
    fn test_goal_snapshots_report_progress() {
        let mut m = machine();
        let snaps = m.goal_snapshots();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].progress, 0);
        for _ in 0..6 {
            m.advance(&centered());
        }
        let snaps = m.goal_snapshots();
        assert!(!snaps[0].satisfied);
        assert_eq!(snaps[0].progress, 50);
    }

    proptest! {
        /// For any signal sequence the check index never decreases and a
        /// satisfied goal never regresses.
        #[test]
        fn prop_check_index_is_monotone(
            seq in proptest::collection::vec(
                (-45.0f32..45.0, -45.0f32..45.0, 0.0f32..0.4, 0.0f32..1.0),
                1..200,
            )
        ) {
            let mut m = machine();
            let mut last_index = m.current_check_index();
            let mut satisfied_labels: Vec<String> = Vec::new();
            for (yaw, pitch, ear, mar) in seq {
                m.advance(&signals(yaw, pitch, ear, mar));
                let index = m.current_check_index();
                prop_assert!(index >= last_index);
                if index == last_index {
                    let now: Vec<String> = m
                        .goal_snapshots()
                        .iter()
                        .filter(|g| g.satisfied)
                        .map(|g| g.label.clone())
                        .collect();
                    for label in &satisfied_labels {
                        prop_assert!(now.contains(label));
                    }
                    satisfied_labels = now;
                } else {
                    satisfied_labels.clear();
                }
                last_index = index;
            }
        }
    }
}
