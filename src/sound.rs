//! Audio feedback boundary.
//!
//! Sessions only name events; what a [`Cue`] sounds like is up to the sink.
//! Sink failures never reach the sessions: [`play`] logs and drops them.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Named feedback events emitted by the sessions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum Cue {
    Start,
    Correct,
    Error,
    Complete,
    Match,
    Miss,
    GameStart,
    GameOver,
}

pub trait CueSink {
    fn emit(&mut self, cue: Cue) -> Result<()>;
}

/// Fire-and-forget emit: failures are logged and swallowed.
pub(crate) fn play(sink: &mut dyn CueSink, cue: Cue) {
    if let Err(err) = sink.emit(cue) {
        tracing::warn!(%cue, error = %err, "sound cue failed");
    }
}

/// Sink that discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl CueSink for SilentSink {
    fn emit(&mut self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

/// Records cues in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    cues: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.borrow().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues.borrow().iter().filter(|c| **c == cue).count()
    }

    pub fn clear(&self) {
        self.cues.borrow_mut().clear();
    }
}

impl CueSink for RecordingSink {
    fn emit(&mut self, cue: Cue) -> Result<()> {
        self.cues.borrow_mut().push(cue);
        Ok(())
    }
}

/// Mechanical keyboard switch the keystroke feedback imitates
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SwitchProfile {
    #[default]
    CherryMxBlue,
    CherryMxBrown,
    CherryMxRed,
    CherryMxBlack,
    CherryMxClear,
    GateronBlue,
    GateronBrown,
    GateronRed,
    GateronYellow,
    KailhBoxWhite,
    KailhBoxBrown,
    KailhSpeedSilver,
    HolyPanda,
    ZealiosV2,
    Topre,
}

impl SwitchProfile {
    /// Unknown names fall back to `cherry-mx-blue`.
    pub fn from_name(name: &str) -> Self {
        SwitchProfile::from_str(name.trim()).unwrap_or_else(|_| {
            tracing::debug!(name, "unknown switch profile");
            SwitchProfile::default()
        })
    }

    /// Switches with an audible click on actuation.
    pub fn is_clicky(&self) -> bool {
        matches!(
            self,
            SwitchProfile::CherryMxBlue
                | SwitchProfile::GateronBlue
                | SwitchProfile::KailhBoxWhite
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    pub enabled: bool,
    pub volume: f32,
    pub profile: SwitchProfile,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.5,
            profile: SwitchProfile::default(),
        }
    }
}

impl SoundSettings {
    pub fn is_audible(&self) -> bool {
        self.enabled && self.volume > 0.0
    }

    pub fn sanitized(mut self) -> Self {
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            SoundSettings::default().volume
        };
        self
    }
}

/// Rings the terminal bell for the cues that matter.
pub struct BellSink<W: Write> {
    out: W,
    settings: SoundSettings,
}

impl<W: Write> BellSink<W> {
    pub fn new(out: W, settings: SoundSettings) -> Self {
        Self { out, settings }
    }

    pub fn settings(&self) -> &SoundSettings {
        &self.settings
    }

    fn rings_for(&self, cue: Cue) -> bool {
        if !self.settings.is_audible() {
            return false;
        }
        match cue {
            Cue::Error | Cue::Miss | Cue::Complete | Cue::GameOver => true,
            Cue::Correct => self.settings.profile.is_clicky(),
            Cue::Start | Cue::Match | Cue::GameStart => false,
        }
    }
}

impl<W: Write> CueSink for BellSink<W> {
    fn emit(&mut self, cue: Cue) -> Result<()> {
        if self.rings_for(cue) {
            self.out.write_all(b"\x07")?;
            self.out.flush()?;
        }
        Ok(())
    }
}
