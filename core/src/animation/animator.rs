use crate::animation::frames::{FramePolicy, FrameSet, FALLBACK_FRAME_MS};
use crate::animation::toggle::ToggleClock;
use crate::feed_interface::WarningCode;

/// Position within a loop of `total_ms`, keyed to absolute elapsed time so
/// animators built at different times stay aligned.
pub fn cycle_position_ms(now: f64, total_ms: u64) -> f64 {
    if total_ms == 0 {
        return 0.0;
    }
    (now * 1000.0).rem_euclid(total_ms as f64)
}

/// Index of the frame whose running duration sum first exceeds `position_ms`.
///
/// All-zero durations are treated as the fallback duration per frame.
pub fn select_frame(durations_ms: &[u32], position_ms: f64) -> usize {
    if durations_ms.is_empty() {
        return 0;
    }
    let untimed = durations_ms.iter().all(|&ms| ms == 0);
    let mut accumulated = 0.0;
    for (index, &duration) in durations_ms.iter().enumerate() {
        let duration = if untimed { FALLBACK_FRAME_MS } else { duration };
        accumulated += f64::from(duration);
        if position_ms < accumulated {
            return index;
        }
    }
    durations_ms.len() - 1
}

/// Picks the frame to render for one displayed warning.
#[derive(Debug, Clone)]
pub struct IconAnimator<F> {
    code: WarningCode,
    frames: FrameSet<F>,
    current: usize,
}

impl<F> IconAnimator<F> {
    pub fn new(code: WarningCode, frames: FrameSet<F>) -> Self {
        Self {
            code,
            frames,
            current: 0,
        }
    }

    pub fn update(&mut self, now: f64, clock: &ToggleClock) {
        self.current = match self.frames.policy() {
            FramePolicy::Toggle => clock.stage().min(self.frames.len() - 1),
            FramePolicy::Cycle => {
                let position = cycle_position_ms(now, self.frames.total_duration_ms());
                select_frame(self.frames.durations_ms(), position)
            }
        };
    }

    pub fn current_frame(&self) -> &F {
        &self.frames.frames()[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn code(&self) -> WarningCode {
        self.code
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn policy(&self) -> FramePolicy {
        self.frames.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_frame_by_cycle_position() {
        let durations = [200, 300, 500];
        assert_eq!(select_frame(&durations, 0.0), 0);
        assert_eq!(select_frame(&durations, 250.0), 1);
        assert_eq!(select_frame(&durations, 999.0), 2);
    }

    #[test]
    fn zero_durations_are_spread_evenly() {
        assert_eq!(select_frame(&[0, 0], 50.0), 0);
        assert_eq!(select_frame(&[0, 0], 150.0), 1);
    }

    #[test]
    fn cycle_animator_loops_on_elapsed_time() {
        let frames = FrameSet::cycle(vec![("a", 200), ("b", 300), ("c", 500)]).unwrap();
        let mut animator = IconAnimator::new(WarningCode::Signal8NorthEast, frames);
        let clock = ToggleClock::new();

        animator.update(1.25, &clock);
        assert_eq!(*animator.current_frame(), "b");
        animator.update(3.999, &clock);
        assert_eq!(*animator.current_frame(), "c");
        animator.update(7.0, &clock);
        assert_eq!(animator.current_index(), 0);
    }

    #[test]
    fn animators_built_later_stay_in_phase() {
        let make = || {
            IconAnimator::new(
                WarningCode::RedRain,
                FrameSet::cycle(vec![(0, 100), (1, 100), (2, 100)]).unwrap(),
            )
        };
        let clock = ToggleClock::new();
        let mut early = make();
        early.update(0.05, &clock);
        let mut late = make();
        for now in [0.15, 0.42, 12.61] {
            early.update(now, &clock);
            late.update(now, &clock);
            assert_eq!(early.current_index(), late.current_index());
        }
    }

    #[test]
    fn toggle_animator_follows_shared_clock() {
        let mut clock = ToggleClock::new();
        let mut animator =
            IconAnimator::new(WarningCode::VeryHot, FrameSet::toggle("on", "off"));

        animator.update(0.4, &clock);
        assert_eq!(*animator.current_frame(), "on");
        clock.advance(1.0);
        animator.update(1.0, &clock);
        assert_eq!(*animator.current_frame(), "off");
    }

    #[test]
    fn placeholder_always_shows_its_only_frame() {
        let mut animator = IconAnimator::new(WarningCode::Frost, FrameSet::placeholder("blank"));
        animator.update(123.456, &ToggleClock::new());
        assert_eq!(*animator.current_frame(), "blank");
    }
}
