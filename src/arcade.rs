use std::ops::Range;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{Clock, Millis};
use crate::scheduler::Scheduler;
use crate::sound::{play, Cue, CueSink};
use crate::word_bank::WordBank;

const POINTS_PER_LEVEL: u32 = 10;

/// Timing and difficulty knobs of the arcade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArcadeTuning {
    pub starting_lives: u32,
    pub initial_word_lifetime_ms: Millis,
    /// Floor for the lifetime as the level rises.
    pub min_word_lifetime_ms: Millis,
    pub lifetime_step_ms: Millis,
    pub spawn_delay_ms: Range<Millis>,
    pub difficulty_tick_ms: Millis,
    /// How long a matched word lingers for the match animation.
    pub match_grace_ms: Millis,
}

impl Default for ArcadeTuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            initial_word_lifetime_ms: 2_000,
            min_word_lifetime_ms: 1_000,
            lifetime_step_ms: 100,
            spawn_delay_ms: 500..1_500,
            difficulty_tick_ms: 100,
            match_grace_ms: 300,
        }
    }
}

impl ArcadeTuning {
    /// Coerces zero periods and lifetimes up to 1 ms so that no timer can
    /// reschedule itself at the instant it fired.
    pub fn sanitized(self) -> Self {
        let spawn_start = self.spawn_delay_ms.start.max(1);
        let spawn_end = self.spawn_delay_ms.end.max(spawn_start);
        Self {
            starting_lives: self.starting_lives.max(1),
            initial_word_lifetime_ms: self.initial_word_lifetime_ms.max(1),
            min_word_lifetime_ms: self.min_word_lifetime_ms.max(1),
            spawn_delay_ms: spawn_start..spawn_end,
            difficulty_tick_ms: self.difficulty_tick_ms.max(1),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallingWord {
    pub id: u64,
    pub text: String,
    pub matched: bool,
    pub spawned_at: Millis,
    pub expires_at: Millis,
}

impl FallingWord {
    /// Fraction of the lifetime used up at `now`, in `[0, 1]`.
    pub fn progress(&self, now: Millis) -> f64 {
        let lifetime = self.expires_at.saturating_sub(self.spawned_at);
        if lifetime == 0 {
            return 1.0;
        }
        let used = now.saturating_sub(self.spawned_at) as f64 / lifetime as f64;
        used.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum ArcadeState {
    Idle,
    Running,
    Paused,
    Over,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Matched { word: String, points: u32 },
    NoMatch,
    /// Not running, or nothing left after trimming.
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArcadeSnapshot {
    pub state: ArcadeState,
    pub words: Vec<FallingWord>,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub word_lifetime_ms: Millis,
    pub now: Millis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArcadeTimer {
    Spawn,
    Expire,
    Difficulty,
    Remove(u64),
}

/// Falling-word game: words spawn on a timer and must be typed before they
/// expire. Each expiry costs a life; the game is over exactly when the last
/// life is lost.
pub struct ArcadeSession<C: Clock> {
    bank: Rc<WordBank>,
    tuning: ArcadeTuning,
    words: Vec<FallingWord>,
    next_word_id: u64,
    score: u32,
    lives: u32,
    level: u32,
    word_lifetime_ms: Millis,
    state: ArcadeState,
    paused_at: Option<Millis>,
    clock: C,
    sink: Box<dyn CueSink>,
    timers: Scheduler<ArcadeTimer>,
    rng: StdRng,
}

impl<C: Clock> ArcadeSession<C> {
    pub fn new(bank: Rc<WordBank>, clock: C, sink: Box<dyn CueSink>) -> Self {
        Self::with_rng(bank, clock, sink, StdRng::from_entropy())
    }

    pub fn with_rng(bank: Rc<WordBank>, clock: C, sink: Box<dyn CueSink>, rng: StdRng) -> Self {
        let tuning = ArcadeTuning::default();
        Self {
            bank,
            words: Vec::new(),
            next_word_id: 0,
            score: 0,
            lives: tuning.starting_lives,
            level: 1,
            word_lifetime_ms: tuning.initial_word_lifetime_ms,
            tuning,
            state: ArcadeState::Idle,
            paused_at: None,
            clock,
            sink,
            timers: Scheduler::new(),
            rng,
        }
    }

    pub fn with_tuning(mut self, tuning: ArcadeTuning) -> Self {
        self.tuning = tuning.sanitized();
        self.restore_defaults();
        self
    }

    fn restore_defaults(&mut self) {
        self.words.clear();
        self.score = 0;
        self.lives = self.tuning.starting_lives;
        self.level = 1;
        self.word_lifetime_ms = self.tuning.initial_word_lifetime_ms;
        self.paused_at = None;
    }

    pub fn start(&mut self) {
        if self.state != ArcadeState::Idle {
            return;
        }

        let now = self.clock.now();
        self.timers.cancel_all();
        self.restore_defaults();
        self.state = ArcadeState::Running;

        tracing::debug!(lives = self.lives, "arcade started");
        play(self.sink.as_mut(), Cue::GameStart);

        self.spawn_cycle(now);
        self.difficulty_cycle(now);
    }

    /// Any state back to `Idle` with defaults; all pending timers are dropped.
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.restore_defaults();
        self.state = ArcadeState::Idle;
    }

    pub fn pause(&mut self) {
        if self.state != ArcadeState::Running {
            return;
        }
        self.timers.cancel_all();
        self.paused_at = Some(self.clock.now());
        self.state = ArcadeState::Paused;
        tracing::debug!(words = self.words.len(), "arcade paused");
    }

    /// Words in flight keep the lifetime they had left when paused.
    pub fn resume(&mut self) {
        if self.state != ArcadeState::Paused {
            return;
        }

        let now = self.clock.now();
        let paused_for = self
            .paused_at
            .take()
            .map_or(0, |paused_at| now.saturating_sub(paused_at));

        for word in &mut self.words {
            word.spawned_at += paused_for;
            word.expires_at += paused_for;
            if word.matched {
                self.timers.schedule_after(
                    now,
                    self.tuning.match_grace_ms,
                    ArcadeTimer::Remove(word.id),
                );
            } else {
                self.timers.schedule_at(word.expires_at, ArcadeTimer::Expire);
            }
        }

        self.state = ArcadeState::Running;
        tracing::debug!(paused_for, "arcade resumed");

        self.spawn_cycle(now);
        self.difficulty_cycle(now);
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            ArcadeState::Running => self.pause(),
            ArcadeState::Paused => self.resume(),
            ArcadeState::Idle | ArcadeState::Over => {}
        }
    }

    /// Fires every timer due by the clock's current time, in due order.
    pub fn run_due(&mut self) {
        while let Some((due, timer)) = self.timers.pop_due(self.clock.now()) {
            match timer {
                ArcadeTimer::Spawn => self.spawn_cycle(due),
                ArcadeTimer::Expire => self.expire_words_at(due),
                ArcadeTimer::Difficulty => self.difficulty_cycle(due),
                ArcadeTimer::Remove(id) => self.words.retain(|w| !(w.id == id && w.matched)),
            }
        }
    }

    fn spawn_cycle(&mut self, at: Millis) {
        if self.spawn_word_at(at).is_none() {
            return;
        }
        let delay = self.next_spawn_delay();
        self.timers.schedule_after(at, delay, ArcadeTimer::Spawn);
    }

    fn difficulty_cycle(&mut self, at: Millis) {
        if self.state != ArcadeState::Running {
            return;
        }
        self.tick_difficulty();
        self.timers
            .schedule_after(at, self.tuning.difficulty_tick_ms, ArcadeTimer::Difficulty);
    }

    fn next_spawn_delay(&mut self) -> Millis {
        let range = self.tuning.spawn_delay_ms.clone();
        if range.is_empty() {
            range.start
        } else {
            self.rng.gen_range(range)
        }
    }

    /// Drops one word from the bank now. Returns its id, or `None` when not
    /// running.
    pub fn spawn_word(&mut self) -> Option<u64> {
        let now = self.clock.now();
        self.spawn_word_at(now)
    }

    fn spawn_word_at(&mut self, at: Millis) -> Option<u64> {
        if self.state != ArcadeState::Running {
            return None;
        }

        let id = self.next_word_id;
        self.next_word_id += 1;

        let word = FallingWord {
            id,
            text: self.bank.draw(&mut self.rng).to_string(),
            matched: false,
            spawned_at: at,
            expires_at: at + self.word_lifetime_ms,
        };
        tracing::trace!(id, text = %word.text, expires_at = word.expires_at, "word spawned");

        self.timers.schedule_at(word.expires_at, ArcadeTimer::Expire);
        self.words.push(word);
        Some(id)
    }

    /// Removes every unmatched word whose lifetime is up, one life each.
    pub fn expire_words(&mut self) {
        let now = self.clock.now();
        self.expire_words_at(now);
    }

    fn expire_words_at(&mut self, at: Millis) {
        while self.state == ArcadeState::Running {
            let Some(idx) = self
                .words
                .iter()
                .position(|w| !w.matched && at >= w.expires_at)
            else {
                break;
            };

            let missed = self.words.remove(idx);
            self.lives = self.lives.saturating_sub(1);
            tracing::trace!(id = missed.id, text = %missed.text, lives = self.lives, "word missed");
            play(self.sink.as_mut(), Cue::Miss);

            if self.lives == 0 {
                self.finish();
            }
        }
    }

    /// Enter-key submission: a miss is signalled with an `error` cue.
    pub fn submit(&mut self, candidate: &str) -> SubmitOutcome {
        self.match_candidate(candidate, true)
    }

    /// As-you-type check: same matching as [`submit`](Self::submit) but a
    /// miss is silent, since the word may simply be unfinished.
    pub fn try_match(&mut self, candidate: &str) -> SubmitOutcome {
        self.match_candidate(candidate, false)
    }

    fn match_candidate(&mut self, candidate: &str, signal_miss: bool) -> SubmitOutcome {
        if self.state != ArcadeState::Running {
            return SubmitOutcome::Ignored;
        }

        let normalized = candidate.trim().to_lowercase();
        if normalized.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let now = self.clock.now();
        let Some(word) = self
            .words
            .iter_mut()
            .find(|w| !w.matched && w.text.to_lowercase() == normalized)
        else {
            if signal_miss {
                play(self.sink.as_mut(), Cue::Error);
            }
            return SubmitOutcome::NoMatch;
        };

        word.matched = true;
        let id = word.id;
        let matched = word.text.clone();
        let points = normalized.chars().count() as u32;

        self.score += points;
        self.timers
            .schedule_after(now, self.tuning.match_grace_ms, ArcadeTimer::Remove(id));
        play(self.sink.as_mut(), Cue::Match);

        SubmitOutcome::Matched {
            word: matched,
            points,
        }
    }

    /// Raises the level and shortens word lifetimes whenever the score sits
    /// on a multiple of ten.
    pub fn tick_difficulty(&mut self) {
        if self.state != ArcadeState::Running {
            return;
        }
        if self.score > 0 && self.score % POINTS_PER_LEVEL == 0 {
            self.level = self.score / POINTS_PER_LEVEL + 1;
            self.word_lifetime_ms = self
                .word_lifetime_ms
                .saturating_sub(self.tuning.lifetime_step_ms)
                .max(self.tuning.min_word_lifetime_ms);
        }
    }

    fn finish(&mut self) {
        if !matches!(self.state, ArcadeState::Running | ArcadeState::Paused) {
            return;
        }
        self.timers.cancel_all();
        self.words.clear();
        self.paused_at = None;
        self.state = ArcadeState::Over;

        tracing::debug!(score = self.score, level = self.level, "game over");
        play(self.sink.as_mut(), Cue::GameOver);
    }

    pub fn snapshot(&self) -> ArcadeSnapshot {
        ArcadeSnapshot {
            state: self.state,
            words: self.words.clone(),
            score: self.score,
            lives: self.lives,
            level: self.level,
            word_lifetime_ms: self.word_lifetime_ms,
            now: self.paused_at.unwrap_or_else(|| self.clock.now()),
        }
    }

    pub fn state(&self) -> ArcadeState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn word_lifetime_ms(&self) -> Millis {
        self.word_lifetime_ms
    }

    pub fn words(&self) -> &[FallingWord] {
        &self.words
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sound::{RecordingSink, SilentSink};
    use assert_matches::assert_matches;

    fn quiet_tuning() -> ArcadeTuning {
        // spawns rarely enough that a test controls every word in flight
        ArcadeTuning {
            spawn_delay_ms: 60_000..60_001,
            ..ArcadeTuning::default()
        }
    }

    fn arcade(words: &[&str]) -> (ArcadeSession<ManualClock>, ManualClock, RecordingSink) {
        let bank = Rc::new(WordBank::new(words.iter().copied()).unwrap());
        let clock = ManualClock::new();
        let sink = RecordingSink::new();
        let session = ArcadeSession::with_rng(
            bank,
            clock.clone(),
            Box::new(sink.clone()),
            StdRng::seed_from_u64(0),
        )
        .with_tuning(quiet_tuning());
        (session, clock, sink)
    }

    #[test]
    fn start_spawns_first_word() {
        let (mut game, _, sink) = arcade(&["speed"]);
        game.start();

        assert_eq!(game.state(), ArcadeState::Running);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.level(), 1);
        assert_eq!(game.words().len(), 1);
        assert_eq!(game.words()[0].expires_at, 2_000);
        assert_eq!(sink.cues(), vec![Cue::GameStart]);
    }

    #[test]
    fn only_earliest_duplicate_is_matched() {
        let (mut game, _, _) = arcade(&["zone"]);
        game.start();
        game.spawn_word();

        let outcome = game.submit("ZONE ");
        assert_matches!(outcome, SubmitOutcome::Matched { points: 4, .. });
        assert!(game.words()[0].matched);
        assert!(!game.words()[1].matched);
        assert_eq!(game.score(), 4);
    }

    #[test]
    fn submit_miss_signals_error_but_try_match_does_not() {
        let (mut game, _, sink) = arcade(&["speed"]);
        game.start();
        sink.clear();

        assert_eq!(game.try_match("spe"), SubmitOutcome::NoMatch);
        assert!(sink.cues().is_empty());

        assert_eq!(game.submit("spe"), SubmitOutcome::NoMatch);
        assert_eq!(sink.cues(), vec![Cue::Error]);

        assert_eq!(game.submit("   "), SubmitOutcome::Ignored);
        assert_eq!(sink.cues(), vec![Cue::Error]);
    }

    #[test]
    fn matched_word_does_not_expire() {
        let (mut game, clock, sink) = arcade(&["ace"]);
        game.start();
        game.submit("ace");

        clock.advance(5_000);
        game.run_due();

        assert_eq!(game.lives(), 3);
        assert_eq!(sink.count(Cue::Miss), 0);
        assert!(game.words().is_empty());
    }

    #[test]
    fn difficulty_rises_on_multiples_of_ten() {
        let (mut game, _, _) = arcade(&["rocket", "bolt"]);
        game.start();
        game.score = 10;

        game.tick_difficulty();
        assert_eq!(game.level(), 2);
        assert_eq!(game.word_lifetime_ms(), 1_900);

        game.score = 11;
        game.tick_difficulty();
        assert_eq!(game.word_lifetime_ms(), 1_900);

        game.score = 40;
        for _ in 0..20 {
            game.tick_difficulty();
        }
        assert_eq!(game.level(), 5);
        assert_eq!(game.word_lifetime_ms(), 1_000);
    }

    #[test]
    fn difficulty_loop_runs_every_tick_while_score_stays() {
        let (mut game, clock, _) = arcade(&["champion"]);
        game.start();
        game.score = 20;

        clock.advance(300);
        game.run_due();

        // ticks at 100, 200, 300
        assert_eq!(game.word_lifetime_ms(), 1_700);
        assert_eq!(game.level(), 3);
    }

    #[test]
    fn pause_freezes_timers_and_resume_keeps_remaining_lifetime() {
        let (mut game, clock, _) = arcade(&["flow"]);
        game.start();

        clock.advance(1_500);
        game.pause();
        assert_eq!(game.state(), ArcadeState::Paused);
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.spawn_word(), None);
        assert_eq!(game.submit("flow"), SubmitOutcome::Ignored);

        clock.advance(10_000);
        game.run_due();
        assert_eq!(game.lives(), 3);

        game.resume();
        assert_eq!(game.state(), ArcadeState::Running);
        // resume drops one fresh word straight away
        assert_eq!(game.words().len(), 2);
        assert_eq!(game.words()[0].expires_at, 12_000);

        clock.advance(499);
        game.run_due();
        assert_eq!(game.lives(), 3);

        clock.advance(1);
        game.run_due();
        assert_eq!(game.lives(), 2);
    }

    #[test]
    fn toggle_pause_flips_between_running_and_paused() {
        let (mut game, _, _) = arcade(&["hero"]);
        game.toggle_pause();
        assert_eq!(game.state(), ArcadeState::Idle);

        game.start();
        game.toggle_pause();
        assert_eq!(game.state(), ArcadeState::Paused);
        game.toggle_pause();
        assert_eq!(game.state(), ArcadeState::Running);
    }

    #[test]
    fn finish_is_idempotent() {
        let (mut game, _, sink) = arcade(&["star"]);
        game.start();
        game.lives = 0;

        game.finish();
        let once = game.snapshot();
        game.finish();

        assert_eq!(game.snapshot(), once);
        assert_eq!(sink.count(Cue::GameOver), 1);
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn reset_returns_to_idle_defaults() {
        let (mut game, clock, _) = arcade(&["win"]);
        game.start();
        game.submit("win");
        clock.advance(2_500);
        game.run_due();

        game.reset();
        assert_eq!(game.state(), ArcadeState::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), 3);
        assert!(game.words().is_empty());
        assert_eq!(game.pending_timers(), 0);
    }

    fn zeroed_tuning() -> ArcadeTuning {
        ArcadeTuning {
            starting_lives: 0,
            initial_word_lifetime_ms: 0,
            min_word_lifetime_ms: 0,
            lifetime_step_ms: 0,
            spawn_delay_ms: 0..0,
            difficulty_tick_ms: 0,
            match_grace_ms: 0,
        }
    }

    #[test]
    fn zero_tuning_is_coerced_to_one_millisecond() {
        let tuning = zeroed_tuning().sanitized();
        assert_eq!(tuning.starting_lives, 1);
        assert_eq!(tuning.initial_word_lifetime_ms, 1);
        assert_eq!(tuning.min_word_lifetime_ms, 1);
        assert_eq!(tuning.spawn_delay_ms, 1..1);
        assert_eq!(tuning.difficulty_tick_ms, 1);

        let inverted = ArcadeTuning {
            spawn_delay_ms: 900..200,
            ..ArcadeTuning::default()
        }
        .sanitized();
        assert_eq!(inverted.spawn_delay_ms, 900..900);
        assert_eq!(ArcadeTuning::default().sanitized(), ArcadeTuning::default());
    }

    #[test]
    fn zeroed_tuning_still_returns_from_run_due() {
        let bank = Rc::new(WordBank::new(["loop"]).unwrap());
        let clock = ManualClock::new();
        let mut game = ArcadeSession::with_rng(
            bank,
            clock.clone(),
            Box::new(SilentSink),
            StdRng::seed_from_u64(0),
        )
        .with_tuning(zeroed_tuning());

        game.start();
        assert_eq!(game.lives(), 1);
        assert_eq!(game.word_lifetime_ms(), 1);

        clock.advance(50);
        game.run_due();

        // the first word expires at 1 ms and takes the only life
        assert_eq!(game.state(), ArcadeState::Over);
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn zero_spawn_delay_spawns_once_per_millisecond() {
        let bank = Rc::new(WordBank::new(["loop"]).unwrap());
        let clock = ManualClock::new();
        let mut game = ArcadeSession::with_rng(
            bank,
            clock.clone(),
            Box::new(SilentSink),
            StdRng::seed_from_u64(0),
        )
        .with_tuning(ArcadeTuning {
            initial_word_lifetime_ms: 60_000,
            spawn_delay_ms: 0..0,
            difficulty_tick_ms: 0,
            ..ArcadeTuning::default()
        });

        game.start();
        clock.advance(100);
        game.run_due();

        // one word at start, then one at each of 1..=100
        assert_eq!(game.words().len(), 101);
        assert_eq!(game.state(), ArcadeState::Running);
    }

    #[test]
    fn progress_tracks_lifetime() {
        let word = FallingWord {
            id: 0,
            text: "fast".into(),
            matched: false,
            spawned_at: 1_000,
            expires_at: 3_000,
        };
        assert_eq!(word.progress(500), 0.0);
        assert_eq!(word.progress(2_000), 0.5);
        assert_eq!(word.progress(9_000), 1.0);
    }
}
