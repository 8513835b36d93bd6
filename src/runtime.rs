use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within one tick.
    Tick,
}

/// Input the app loop polls between redraws
pub trait EventSource: Send + 'static {
    /// `None` when `wait` elapses first or the source has gone quiet for good.
    fn next_event(&self, wait: Duration) -> Option<AppEvent>;
}

/// Events delivered over an mpsc channel, either from the terminal reader
/// thread or pushed by hand in tests.
pub struct ChannelEvents {
    rx: Receiver<AppEvent>,
}

impl ChannelEvents {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// Starts a thread that forwards terminal input until the receiver is
    /// dropped or reading fails.
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(raw) => {
                    let Some(ev) = translate(raw) else { continue };
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "terminal input failed");
                    break;
                }
            }
        });

        Self::new(rx)
    }
}

impl EventSource for ChannelEvents {
    fn next_event(&self, wait: Duration) -> Option<AppEvent> {
        self.rx.recv_timeout(wait).ok()
    }
}

/// Key releases (reported on Windows) and mouse or focus events are dropped.
fn translate(raw: CtEvent) -> Option<AppEvent> {
    match raw {
        CtEvent::Key(key) if key.kind != KeyEventKind::Release => Some(AppEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

/// One loop iteration yields exactly one event, with silence reported as
/// [`AppEvent::Tick`] so timers keep firing while the user is idle.
pub struct Runner<E: EventSource> {
    source: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick: Duration) -> Self {
        Self { source, tick }
    }

    pub fn step(&self) -> AppEvent {
        self.source.next_event(self.tick).unwrap_or(AppEvent::Tick)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}
