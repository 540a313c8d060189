use crate::assets::icons::IconFrame;
use crate::status_bridge::bridge::StatusBridge;
use crate::status_bridge::model::BoardModel;
use crate::workflow::config::MonitorConfig;
use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use warncore::animation::DisplayedFrame;
use warncore::prelude::CueConfig;
use warncore::telemetry::MetricsRecorder;
use warncore::{
    AnimatorRegistry, AudioBackend, Evaluation, FeedInput, Freshness, IconSource,
    NotificationSoundSequencer, SequenceState, WarningCode, WarningStateTracker,
};

/// Everything the presentation needs from one tick.
pub struct TickReport<F> {
    pub tick: u64,
    pub elapsed_secs: f64,
    /// Latest evaluation; `None` until the first poll result arrives.
    pub evaluation: Option<Evaluation>,
    pub frames: Vec<DisplayedFrame<F>>,
    pub notified: Vec<WarningCode>,
    pub sound_state: SequenceState,
    pub sound_code: Option<WarningCode>,
}

impl<F> TickReport<F> {
    pub fn no_active(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn freshness(&self) -> Option<Freshness> {
        self.evaluation.as_ref().map(|evaluation| evaluation.freshness)
    }
}

/// Drives the tracker, the sound sequencer and the icon animators from one
/// cooperative tick.
pub struct Runner<S: IconSource, B: AudioBackend> {
    tracker: WarningStateTracker,
    animators: AnimatorRegistry<S>,
    sequencer: NotificationSoundSequencer<B>,
    metrics: Arc<MetricsRecorder>,
    latest: Option<Evaluation>,
    tick: u64,
}

impl<S: IconSource, B: AudioBackend> Runner<S, B> {
    pub fn new(icons: S, audio: B, cues: CueConfig) -> Self {
        Self {
            tracker: WarningStateTracker::new(),
            animators: AnimatorRegistry::new(icons),
            sequencer: NotificationSoundSequencer::new(audio, cues),
            metrics: Arc::new(MetricsRecorder::new()),
            latest: None,
            tick: 0,
        }
    }

    /// Applies every poll result received since the last tick, in order, then
    /// advances playback and animation to `now`.
    pub fn tick(&mut self, now: f64, inputs: Vec<FeedInput>) -> TickReport<S::Frame> {
        self.tick += 1;
        self.metrics.record_tick();

        let mut notified = Vec::new();
        for input in &inputs {
            let evaluation = self.tracker.evaluate(input, now);
            self.metrics
                .record_evaluation(evaluation.freshness == Freshness::Stale);
            for &code in &evaluation.newly_active {
                let started = self.sequencer.start(code, now);
                self.metrics.record_notification(started);
                if started {
                    notified.push(code);
                }
            }
            self.latest = Some(evaluation);
        }

        self.sequencer.update(now);

        let active: BTreeSet<WarningCode> = self
            .latest
            .as_ref()
            .map(|evaluation| evaluation.active.clone())
            .unwrap_or_default();
        let frames = self.animators.update_active(now, active);

        TickReport {
            tick: self.tick,
            elapsed_secs: now,
            evaluation: self.latest.clone(),
            frames,
            notified,
            sound_state: self.sequencer.state(),
            sound_code: self.sequencer.current_code(),
        }
    }

    pub fn animators(&self) -> &AnimatorRegistry<S> {
        &self.animators
    }

    #[cfg(test)]
    pub fn sequencer(&self) -> &NotificationSoundSequencer<B> {
        &self.sequencer
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Runs the tick loop at the configured frame rate until Ctrl+C, or until
    /// `max_ticks` ticks have run. `publish` turns each report into the board
    /// model; the displayed frames go to the bridge's icon store.
    pub async fn run<P>(
        &mut self,
        config: &MonitorConfig,
        mut feed: mpsc::UnboundedReceiver<FeedInput>,
        bridge: &StatusBridge,
        max_ticks: Option<u64>,
        publish: P,
    ) -> anyhow::Result<()>
    where
        S: IconSource<Frame = IconFrame>,
        P: Fn(&Self, &TickReport<IconFrame>) -> BoardModel,
    {
        let started = Instant::now();
        let mut interval = tokio::time::interval(config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let mut inputs = Vec::new();
                    while let Ok(input) = feed.try_recv() {
                        inputs.push(input);
                    }
                    let now = started.elapsed().as_secs_f64();
                    let report = self.tick(now, inputs);
                    if !report.notified.is_empty() {
                        info!("notifying for {:?}", report.notified);
                    }
                    debug!(
                        "tick {} -> {} icon(s), sound {:?}",
                        report.tick,
                        report.frames.len(),
                        report.sound_state
                    );
                    bridge.publish_frames(&report.frames);
                    bridge.publish(publish(self, &report));

                    if max_ticks.is_some_and(|limit| report.tick >= limit) {
                        break;
                    }
                }
                result = &mut shutdown => {
                    result?;
                    info!("shutdown requested");
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warncore::prelude::{WarnError, WarnResult};
    use warncore::FrameSet;

    struct LabelIcons;

    impl IconSource for LabelIcons {
        type Frame = String;

        fn load(&mut self, code: WarningCode) -> FrameSet<String> {
            FrameSet::toggle(format!("{}-on", code), format!("{}-off", code))
        }
    }

    #[derive(Default)]
    struct CountingAudio {
        played: Vec<String>,
    }

    impl AudioBackend for CountingAudio {
        type Clip = String;

        fn load(&mut self, name: &str) -> WarnResult<String> {
            if name == "tc10" {
                Err(WarnError::AssetMissing(name.into()))
            } else {
                Ok(name.to_string())
            }
        }

        fn duration_secs(&self, _clip: &String) -> f64 {
            1.0
        }

        fn play(&mut self, clip: &String) -> WarnResult<()> {
            self.played.push(clip.clone());
            Ok(())
        }
    }

    fn runner() -> Runner<LabelIcons, CountingAudio> {
        Runner::new(LabelIcons, CountingAudio::default(), CueConfig::default())
    }

    fn fetched(codes: &[&str]) -> FeedInput {
        let mut records = serde_json::Map::new();
        for code in codes {
            records.insert(code.to_string(), json!({"code": code, "actionCode": "ISSUE"}));
        }
        FeedInput::Fetched(serde_json::Value::Object(records))
    }

    #[test]
    fn waits_for_first_poll() {
        let mut runner = runner();
        let report = runner.tick(0.0, Vec::new());
        assert!(report.evaluation.is_none());
        assert!(report.no_active());
        assert_eq!(report.sound_state, SequenceState::Idle);
    }

    #[test]
    fn startup_warnings_animate_without_sound() {
        let mut runner = runner();
        let report = runner.tick(0.1, vec![fetched(&["WHOT", "WTS"])]);
        assert_eq!(report.frames.len(), 2);
        assert!(report.notified.is_empty());
        assert_eq!(report.sound_state, SequenceState::Idle);

        // No new poll: the last evaluation keeps driving the icons.
        let report = runner.tick(0.2, Vec::new());
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.frames[0].frame, "WHOT-on");
    }

    #[test]
    fn new_warning_plays_full_sequence() {
        let mut runner = runner();
        runner.tick(0.0, vec![fetched(&[])]);
        let report = runner.tick(1.0, vec![fetched(&["TC3"])]);
        assert_eq!(report.notified, vec![WarningCode::Signal3]);
        assert_eq!(report.sound_state, SequenceState::Playing(0));

        runner.tick(2.5, Vec::new());
        runner.tick(3.5, Vec::new());
        let report = runner.tick(4.5, Vec::new());
        assert_eq!(report.sound_state, SequenceState::Done);
        assert_eq!(
            runner.sequencer().backend().played,
            vec!["start", "tc3", "end"]
        );
        assert_eq!(runner.metrics().snapshot().notifications, 1);
    }

    #[test]
    fn last_new_warning_in_a_tick_wins() {
        let mut runner = runner();
        runner.tick(0.0, vec![fetched(&[])]);
        let report = runner.tick(1.0, vec![fetched(&["TC1", "WRAINA"])]);
        assert_eq!(report.notified.len(), 2);
        assert_eq!(report.sound_code, Some(WarningCode::Signal1));
        assert_eq!(
            runner.sequencer().backend().played,
            vec!["start", "start"]
        );
    }

    #[test]
    fn stale_poll_keeps_icons_and_counts_failure() {
        let mut runner = runner();
        runner.tick(0.0, vec![fetched(&["WL"])]);
        let report = runner.tick(0.5, vec![FeedInput::Unavailable("timeout".into())]);
        assert_eq!(report.freshness(), Some(Freshness::Stale));
        assert_eq!(report.frames.len(), 1);
        assert_eq!(runner.metrics().snapshot().feed_failures, 1);
    }

    #[test]
    fn placeholder_sound_is_used_for_missing_clip() {
        let mut runner = runner();
        runner.tick(0.0, vec![fetched(&[])]);
        runner.tick(1.0, vec![fetched(&["TC10"])]);
        runner.tick(2.5, Vec::new());
        assert_eq!(
            runner.sequencer().backend().played,
            vec!["start", "place_holder"]
        );
    }
}
