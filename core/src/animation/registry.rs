use crate::animation::animator::IconAnimator;
use crate::animation::frames::{FramePolicy, FrameSet};
use crate::animation::toggle::ToggleClock;
use crate::feed_interface::WarningCode;
use crate::telemetry::log::LogManager;

/// Supplies the frames for a warning icon.
pub trait IconSource {
    type Frame: Clone;

    /// Never fails; a source with nothing to offer returns a placeholder set.
    fn load(&mut self, code: WarningCode) -> FrameSet<Self::Frame>;
}

/// Frame chosen for one warning on one tick.
#[derive(Debug, Clone)]
pub struct DisplayedFrame<F> {
    pub code: WarningCode,
    pub index: usize,
    pub frame_count: usize,
    pub policy: FramePolicy,
    pub frame: F,
}

/// One lazily built animator per tracked code, kept for the process lifetime.
pub struct AnimatorRegistry<S: IconSource> {
    source: S,
    slots: Vec<Option<IconAnimator<S::Frame>>>,
    clock: ToggleClock,
    logger: LogManager,
}

impl<S: IconSource> AnimatorRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: (0..WarningCode::COUNT).map(|_| None).collect(),
            clock: ToggleClock::new(),
            logger: LogManager::new("warncore::animation"),
        }
    }

    /// Animator for `code`, loading its frames on first use.
    pub fn animator(&mut self, code: WarningCode) -> &mut IconAnimator<S::Frame> {
        let source = &mut self.source;
        let logger = &self.logger;
        self.slots[code.index()].get_or_insert_with(|| {
            let frames = source.load(code);
            logger.record(&format!(
                "loaded {} frame(s) for {} ({:?})",
                frames.len(),
                code,
                frames.policy()
            ));
            IconAnimator::new(code, frames)
        })
    }

    pub fn get(&self, code: WarningCode) -> Option<&IconAnimator<S::Frame>> {
        self.slots[code.index()].as_ref()
    }

    /// Advances the shared toggle clock once, then every listed animator.
    pub fn update_active<I>(&mut self, now: f64, codes: I) -> Vec<DisplayedFrame<S::Frame>>
    where
        I: IntoIterator<Item = WarningCode>,
    {
        if self.clock.advance(now) {
            self.logger
                .trace_tick(&format!("toggle stage {} at {:.3}s", self.clock.stage(), now));
        }

        let clock = self.clock.clone();
        let mut displayed = Vec::new();
        for code in codes {
            let animator = self.animator(code);
            animator.update(now, &clock);
            displayed.push(DisplayedFrame {
                code,
                index: animator.current_index(),
                frame_count: animator.frame_count(),
                policy: animator.policy(),
                frame: animator.current_frame().clone(),
            });
        }
        displayed
    }

    pub fn clock(&self) -> &ToggleClock {
        &self.clock
    }

    /// Number of animators built so far.
    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
