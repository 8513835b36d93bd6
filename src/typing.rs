use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{Clock, Millis};
use crate::samples::{Difficulty, TextSampleProvider};
use crate::scheduler::{Scheduler, TimerId};
use crate::sound::{play, Cue, CueSink};

pub const DEFAULT_DURATION_SECS: u32 = 60;

const TICK_INTERVAL_MS: Millis = 1_000;
const CHARS_PER_WORD: f64 = 5.0;
const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    Running,
    Finished,
}

/// How a reference character should be drawn
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    Incorrect,
    Current,
    Pending,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub wpm: u32,
    pub accuracy: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
        }
    }
}

impl Metrics {
    /// WPM counts five correct characters as a word; accuracy is the share of
    /// judged keystrokes that were correct, 100 when nothing was judged.
    pub fn compute(correct: usize, errors: usize, elapsed_ms: Millis) -> Self {
        let elapsed_minutes = elapsed_ms as f64 / MS_PER_MINUTE;
        let wpm = if elapsed_minutes > 0.0 {
            ((correct as f64 / CHARS_PER_WORD) / elapsed_minutes).round() as u32
        } else {
            0
        };

        let judged = correct + errors;
        let accuracy = if judged > 0 {
            (100.0 * correct as f64 / judged as f64).round() as u32
        } else {
            100
        };

        Self { wpm, accuracy }
    }
}

/// Read-only view of a typing session for rendering
#[derive(Clone, Debug, PartialEq)]
pub struct TypingSnapshot {
    pub state: TypingState,
    pub difficulty: Difficulty,
    pub reference: String,
    pub typed: String,
    pub classes: Vec<CharClass>,
    pub cursor: usize,
    pub correct_count: usize,
    pub error_count: usize,
    pub duration_secs: u32,
    pub remaining_seconds: u32,
    pub progress_percent: u32,
    pub metrics: Metrics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TypingTimer {
    Countdown,
}

/// Timed typing test scored against a reference text.
///
/// `Idle -> Running -> Finished`, back to `Idle` only through [`reset`].
/// Every judged position is either correct or wrong, so
/// `correct_count + error_count == cursor` holds after every call.
///
/// [`reset`]: TypingSession::reset
pub struct TypingSession<C: Clock> {
    provider: Rc<TextSampleProvider>,
    difficulty: Difficulty,
    custom_text: Option<String>,
    reference: Vec<char>,
    typed: Vec<char>,
    // one verdict per judged position, so deletions undo exactly what was counted
    verdicts: Vec<Outcome>,
    correct_count: usize,
    error_count: usize,
    state: TypingState,
    started_at: Option<Millis>,
    ended_at: Option<Millis>,
    duration_secs: u32,
    remaining_seconds: u32,
    final_metrics: Option<Metrics>,
    clock: C,
    sink: Box<dyn CueSink>,
    timers: Scheduler<TypingTimer>,
    countdown: Option<TimerId>,
    rng: StdRng,
}

impl<C: Clock> TypingSession<C> {
    pub fn new(provider: Rc<TextSampleProvider>, clock: C, sink: Box<dyn CueSink>) -> Self {
        Self::with_rng(provider, clock, sink, StdRng::from_entropy())
    }

    pub fn with_rng(
        provider: Rc<TextSampleProvider>,
        clock: C,
        sink: Box<dyn CueSink>,
        rng: StdRng,
    ) -> Self {
        let mut session = Self {
            provider,
            difficulty: Difficulty::default(),
            custom_text: None,
            reference: Vec::new(),
            typed: Vec::new(),
            verdicts: Vec::new(),
            correct_count: 0,
            error_count: 0,
            state: TypingState::Idle,
            started_at: None,
            ended_at: None,
            duration_secs: DEFAULT_DURATION_SECS,
            remaining_seconds: DEFAULT_DURATION_SECS,
            final_metrics: None,
            clock,
            sink,
            timers: Scheduler::new(),
            countdown: None,
            rng,
        };
        session.reference = session.next_reference();
        session
    }

    /// Sets the time budget. Ignored outside `Idle` and for zero seconds.
    pub fn configure(&mut self, duration_secs: u32) {
        if self.state != TypingState::Idle || duration_secs == 0 {
            tracing::debug!(duration_secs, state = ?self.state, "duration rejected");
            return;
        }
        self.duration_secs = duration_secs;
        self.remaining_seconds = duration_secs;
    }

    /// Like [`configure`](Self::configure) for raw user text; anything that is
    /// not a positive whole number keeps the previous budget.
    pub fn configure_from_str(&mut self, duration: &str) {
        match duration.trim().parse::<u32>() {
            Ok(secs) => self.configure(secs),
            Err(_) => tracing::debug!(duration, "ignoring non-numeric duration"),
        }
    }

    /// Picks the tier and draws a fresh reference text from it. Idle only.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if self.state != TypingState::Idle {
            return;
        }
        self.difficulty = difficulty;
        self.reference = self.next_reference();
    }

    /// Use fixed text instead of sampling. Idle only; empty text is ignored.
    pub fn set_custom_text(&mut self, text: Option<String>) {
        if self.state != TypingState::Idle {
            return;
        }
        self.custom_text = text.filter(|t| !t.is_empty());
        self.reference = self.next_reference();
    }

    pub fn start(&mut self) {
        if self.state != TypingState::Idle {
            return;
        }

        let now = self.clock.now();
        self.reference = self.next_reference();
        self.clear_progress();
        self.started_at = Some(now);
        self.state = TypingState::Running;
        self.countdown = Some(
            self.timers
                .schedule_after(now, TICK_INTERVAL_MS, TypingTimer::Countdown),
        );

        tracing::debug!(
            difficulty = %self.difficulty,
            chars = self.reference.len(),
            duration_secs = self.duration_secs,
            "typing test started"
        );
        play(self.sink.as_mut(), Cue::Start);
    }

    /// One second of the countdown.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.tick_at(now);
    }

    fn tick_at(&mut self, at: Millis) {
        if self.state != TypingState::Running {
            return;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.finish_at(at);
        }
    }

    /// Fires every countdown tick that is due by the clock's current time.
    pub fn run_due(&mut self) {
        while let Some((due, timer)) = self.timers.pop_due(self.clock.now()) {
            match timer {
                TypingTimer::Countdown => {
                    self.countdown = None;
                    if self.state != TypingState::Running {
                        continue;
                    }
                    self.tick_at(due);
                    if self.state == TypingState::Running {
                        self.countdown = Some(self.timers.schedule_after(
                            due,
                            TICK_INTERVAL_MS,
                            TypingTimer::Countdown,
                        ));
                    }
                }
            }
        }
    }

    /// Judges the difference between the previous and the new input buffer.
    ///
    /// Only the length change is judged: removed trailing positions undo
    /// their verdicts, appended positions are compared one by one against
    /// the reference. Characters past the end of the reference are kept but
    /// never judged.
    pub fn apply_input(&mut self, new_text: &str) {
        if self.state != TypingState::Running {
            return;
        }

        let new_typed: Vec<char> = new_text.chars().collect();
        let old_len = self.typed.len();

        if new_typed.len() < old_len {
            for _ in new_typed.len()..old_len {
                self.undo_last_verdict();
            }
        } else {
            for (idx, &typed) in new_typed.iter().enumerate().skip(old_len) {
                if let Some(&expected) = self.reference.get(idx) {
                    let outcome = if typed == expected {
                        Outcome::Correct
                    } else {
                        Outcome::Incorrect
                    };
                    self.record_verdict(outcome);
                }
            }
        }

        self.typed = new_typed;

        if self.cursor() >= self.reference.len() {
            self.finish();
        }
    }

    fn record_verdict(&mut self, outcome: Outcome) {
        self.verdicts.push(outcome);
        match outcome {
            Outcome::Correct => {
                self.correct_count += 1;
                play(self.sink.as_mut(), Cue::Correct);
            }
            Outcome::Incorrect => {
                self.error_count += 1;
                play(self.sink.as_mut(), Cue::Error);
            }
        }
    }

    fn undo_last_verdict(&mut self) {
        match self.verdicts.pop() {
            Some(Outcome::Correct) => self.correct_count = self.correct_count.saturating_sub(1),
            Some(Outcome::Incorrect) => self.error_count = self.error_count.saturating_sub(1),
            None => {}
        }
    }

    /// Ends the test. No-op unless running.
    pub fn finish(&mut self) {
        let now = self.clock.now();
        self.finish_at(now);
    }

    fn finish_at(&mut self, at: Millis) {
        if self.state != TypingState::Running {
            return;
        }

        self.state = TypingState::Finished;
        self.ended_at = Some(at);
        self.timers.cancel_all();
        self.countdown = None;

        let metrics = Metrics::compute(self.correct_count, self.error_count, self.elapsed_ms());
        self.final_metrics = Some(metrics);

        tracing::debug!(
            wpm = metrics.wpm,
            accuracy = metrics.accuracy,
            errors = self.error_count,
            "typing test finished"
        );
        play(self.sink.as_mut(), Cue::Complete);
    }

    /// Back to `Idle` with zeroed counters and a fresh reference text.
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.countdown = None;
        self.clear_progress();
        self.state = TypingState::Idle;
        self.started_at = None;
        self.ended_at = None;
        self.reference = self.next_reference();
    }

    fn clear_progress(&mut self) {
        self.typed.clear();
        self.verdicts.clear();
        self.correct_count = 0;
        self.error_count = 0;
        self.remaining_seconds = self.duration_secs;
        self.final_metrics = None;
    }

    fn next_reference(&mut self) -> Vec<char> {
        match &self.custom_text {
            Some(text) => text.chars().collect(),
            None => self
                .provider
                .sample(self.difficulty, &mut self.rng)
                .chars()
                .collect(),
        }
    }

    /// Time spent so far, frozen once finished.
    pub fn elapsed_ms(&self) -> Millis {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            (Some(start), None) => self.clock.now().saturating_sub(start),
            _ => 0,
        }
    }

    pub fn live_metrics(&self) -> Metrics {
        match self.state {
            TypingState::Finished => self.final_metrics.unwrap_or_default(),
            TypingState::Running => {
                Metrics::compute(self.correct_count, self.error_count, self.elapsed_ms())
            }
            TypingState::Idle => Metrics::default(),
        }
    }

    pub fn snapshot(&self) -> TypingSnapshot {
        let cursor = self.cursor();
        let classes = self
            .reference
            .iter()
            .enumerate()
            .map(|(idx, expected)| match self.typed.get(idx) {
                Some(typed) if typed == expected => CharClass::Correct,
                Some(_) => CharClass::Incorrect,
                None if idx == cursor && self.state == TypingState::Running => CharClass::Current,
                None => CharClass::Pending,
            })
            .collect();

        TypingSnapshot {
            state: self.state,
            difficulty: self.difficulty,
            reference: self.reference_text(),
            typed: self.typed.iter().collect(),
            classes,
            cursor,
            correct_count: self.correct_count,
            error_count: self.error_count,
            duration_secs: self.duration_secs,
            remaining_seconds: self.remaining_seconds,
            progress_percent: self.progress_percent(),
            metrics: self.live_metrics(),
        }
    }

    fn progress_percent(&self) -> u32 {
        if self.reference.is_empty() {
            return 0;
        }
        let pct = self.cursor() as f64 / self.reference.len() as f64 * 100.0;
        pct.clamp(0.0, 100.0).round() as u32
    }

    pub fn state(&self) -> TypingState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.verdicts.len()
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn has_pending_tick(&self) -> bool {
        self.countdown.is_some()
    }
}
