// Typing test scenarios driven end to end on virtual time.
use std::rc::Rc;

use keysprint::{
    clock::ManualClock,
    rating::{rate_typing, TypingRating},
    samples::TextSampleProvider,
    sound::{Cue, CueSink, RecordingSink},
    typing::{Metrics, TypingSession, TypingState},
    Error,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn session(text: &str) -> (TypingSession<ManualClock>, ManualClock, RecordingSink) {
    let provider = Rc::new(TextSampleProvider::from_samples([text]).unwrap());
    let clock = ManualClock::new();
    let sink = RecordingSink::new();
    let session = TypingSession::with_rng(
        provider,
        clock.clone(),
        Box::new(sink.clone()),
        StdRng::seed_from_u64(42),
    );
    (session, clock, sink)
}

/// Feeds `text` one keystroke at a time, like a user typing it.
fn type_chars(s: &mut TypingSession<ManualClock>, text: &str) {
    let mut typed = s.typed_text();
    for c in text.chars() {
        typed.push(c);
        s.apply_input(&typed);
    }
}

fn delete_chars(s: &mut TypingSession<ManualClock>, n: usize) {
    let mut typed = s.typed_text();
    for _ in 0..n {
        typed.pop();
        s.apply_input(&typed);
    }
}

#[test]
fn exact_typing_finishes_with_perfect_accuracy() {
    let (mut s, clock, sink) = session("cat");
    s.start();
    clock.advance(600);

    type_chars(&mut s, "cat");

    assert_eq!(s.correct_count(), 3);
    assert_eq!(s.error_count(), 0);
    assert_eq!(s.cursor(), 3);
    assert_eq!(s.state(), TypingState::Finished);
    assert_eq!(s.live_metrics().accuracy, 100);
    assert_eq!(
        sink.cues(),
        vec![
            Cue::Start,
            Cue::Correct,
            Cue::Correct,
            Cue::Correct,
            Cue::Complete
        ]
    );
}

#[test]
fn corrected_typo_leaves_no_error_behind() {
    // reference longer than the edit sequence so the typo does not end the test
    let (mut s, _, sink) = session("cats");
    s.start();

    type_chars(&mut s, "cot");
    assert_eq!((s.correct_count(), s.error_count()), (2, 1));

    delete_chars(&mut s, 2);
    assert_eq!(s.typed_text(), "c");
    assert_eq!((s.correct_count(), s.error_count(), s.cursor()), (1, 0, 1));

    type_chars(&mut s, "at");
    assert_eq!(s.typed_text(), "cat");
    assert_eq!(s.cursor(), 3);
    assert_eq!(s.correct_count(), 3);
    assert_eq!(s.error_count(), 0);
    assert_eq!(s.state(), TypingState::Running);
    assert_eq!(sink.count(Cue::Error), 1);
}

#[test]
fn typo_on_the_last_character_ends_the_test() {
    let (mut s, _, _) = session("cat");
    s.start();

    type_chars(&mut s, "cot");

    assert_eq!(s.state(), TypingState::Finished);
    assert_eq!((s.correct_count(), s.error_count()), (2, 1));

    // finished sessions ignore further edits
    delete_chars(&mut s, 2);
    assert_eq!(s.typed_text(), "cot");
    assert_eq!(s.cursor(), 3);
}

#[test]
fn countdown_expires_without_input() {
    let (mut s, clock, sink) = session("a sentence nobody types");
    s.configure(5);
    s.start();

    for _ in 0..4 {
        clock.advance(1_000);
        s.run_due();
    }
    assert_eq!(s.state(), TypingState::Running);
    assert_eq!(s.remaining_seconds(), 1);

    clock.advance(1_000);
    s.run_due();

    assert_eq!(s.state(), TypingState::Finished);
    assert_eq!(s.remaining_seconds(), 0);
    assert_eq!(s.live_metrics(), Metrics { wpm: 0, accuracy: 100 });
    assert_eq!(sink.count(Cue::Complete), 1);
    assert!(!s.has_pending_tick());
}

#[test]
fn wpm_uses_elapsed_time_until_finish() {
    let (mut s, clock, _) = session("hello world");
    s.start();
    clock.advance(6_000);
    type_chars(&mut s, "hello world");

    // 11 correct chars / 5 over 0.1 minutes
    assert_eq!(s.live_metrics().wpm, 22);

    clock.advance(60_000);
    assert_eq!(s.live_metrics().wpm, 22);
    assert_eq!(s.elapsed_ms(), 6_000);
    assert_eq!(
        rate_typing(s.live_metrics().wpm, s.live_metrics().accuracy),
        TypingRating::KeepPracticing
    );
}

#[test]
fn counts_stay_balanced_under_random_edits() {
    let reference = "the quick brown fox jumps over the lazy dog";
    let (mut s, _, _) = session(reference);
    let mut rng = StdRng::seed_from_u64(7);
    let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz ".chars().collect();

    s.start();
    for _ in 0..2_000 {
        let mut typed: Vec<char> = s.typed_text().chars().collect();
        if typed.is_empty() || rng.gen_bool(0.7) {
            let burst = rng.gen_range(1..=3);
            for _ in 0..burst {
                typed.push(alphabet[rng.gen_range(0..alphabet.len())]);
            }
        } else {
            let cut = rng.gen_range(1..=typed.len().min(4));
            typed.truncate(typed.len() - cut);
        }
        s.apply_input(&typed.iter().collect::<String>());

        assert_eq!(s.correct_count() + s.error_count(), s.cursor());
        assert!(s.cursor() <= reference.len());

        if s.state() == TypingState::Finished {
            s.reset();
            s.start();
        }
    }
}

#[test]
fn finish_is_idempotent() {
    let (mut s, clock, sink) = session("idempotent");
    s.start();
    type_chars(&mut s, "idem");
    clock.advance(3_000);

    s.finish();
    let metrics = s.live_metrics();
    clock.advance(5_000);
    s.finish();

    assert_eq!(s.live_metrics(), metrics);
    assert_eq!(s.elapsed_ms(), 3_000);
    assert_eq!(sink.count(Cue::Complete), 1);
}

#[test]
fn reset_returns_to_a_fresh_idle_session() {
    let (mut s, clock, _) = session("round trip");
    s.configure(30);
    s.start();
    clock.advance(2_500);
    s.run_due();
    type_chars(&mut s, "rou");
    s.finish();

    s.reset();

    assert_eq!(s.state(), TypingState::Idle);
    assert_eq!(s.cursor(), 0);
    assert_eq!(s.correct_count(), 0);
    assert_eq!(s.error_count(), 0);
    assert_eq!(s.typed_text(), "");
    assert_eq!(s.remaining_seconds(), 30);
    assert_eq!(s.duration_secs(), 30);
    assert_eq!(s.live_metrics(), Metrics::default());
    assert!(!s.has_pending_tick());

    // the old countdown must not leak into the next run
    s.start();
    clock.advance(1_000);
    s.run_due();
    assert_eq!(s.remaining_seconds(), 29);
}

#[test]
fn invalid_durations_keep_the_previous_budget() {
    let (mut s, _, _) = session("x");
    s.configure(45);
    s.configure(0);
    s.configure_from_str("soon");
    s.configure_from_str("-3");
    assert_eq!(s.duration_secs(), 45);

    s.configure_from_str(" 90 ");
    assert_eq!(s.duration_secs(), 90);
    assert_eq!(s.remaining_seconds(), 90);
}

#[test]
fn single_character_reference() {
    let (mut s, _, _) = session("x");
    s.start();
    s.apply_input("x");

    let snap = s.snapshot();
    assert_eq!(snap.state, TypingState::Finished);
    assert_eq!(snap.progress_percent, 100);
    assert_eq!(snap.cursor, 1);
}

struct FailingSink;

impl CueSink for FailingSink {
    fn emit(&mut self, _cue: Cue) -> keysprint::Result<()> {
        Err(Error::Io(std::io::Error::other("audio device gone")))
    }
}

#[test]
fn failing_sound_does_not_disturb_scoring() {
    let provider = Rc::new(TextSampleProvider::from_samples(["cat"]).unwrap());
    let clock = ManualClock::new();
    let mut s = TypingSession::new(provider, clock.clone(), Box::new(FailingSink));

    s.start();
    assert_eq!(s.state(), TypingState::Running);

    clock.advance(600);
    type_chars(&mut s, "cx");
    assert_eq!(s.correct_count(), 1);
    assert_eq!(s.error_count(), 1);

    delete_chars(&mut s, 1);
    type_chars(&mut s, "at");
    assert_eq!(s.state(), TypingState::Finished);
    assert_eq!(s.correct_count(), 3);
    assert_eq!(s.error_count(), 0);
    assert_eq!(s.live_metrics().accuracy, 100);
}
