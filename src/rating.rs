/// Qualitative tier for a finished typing test, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum TypingRating {
    #[strum(serialize = "Typing Master!")]
    TypingMaster,
    #[strum(serialize = "Excellent!")]
    Excellent,
    #[strum(serialize = "Great Job!")]
    GreatJob,
    #[strum(serialize = "Good Work!")]
    GoodWork,
    #[strum(serialize = "Keep Practicing!")]
    KeepPracticing,
}

/// Qualitative tier for a finished arcade game, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum ArcadeRating {
    #[strum(serialize = "Word Wizard!")]
    WordWizard,
    #[strum(serialize = "Speed Demon!")]
    SpeedDemon,
    #[strum(serialize = "Lightning Fast!")]
    LightningFast,
    #[strum(serialize = "Getting There!")]
    GettingThere,
    #[strum(serialize = "Just Getting Started!")]
    JustGettingStarted,
}

// (min wpm, min accuracy), checked top-down
const TYPING_TIERS: [(u32, u32, TypingRating); 4] = [
    (80, 95, TypingRating::TypingMaster),
    (60, 90, TypingRating::Excellent),
    (40, 85, TypingRating::GreatJob),
    (25, 75, TypingRating::GoodWork),
];

const ARCADE_TIERS: [(u32, ArcadeRating); 4] = [
    (200, ArcadeRating::WordWizard),
    (150, ArcadeRating::SpeedDemon),
    (100, ArcadeRating::LightningFast),
    (50, ArcadeRating::GettingThere),
];

pub fn rate_typing(wpm: u32, accuracy: u32) -> TypingRating {
    TYPING_TIERS
        .iter()
        .find(|(min_wpm, min_acc, _)| wpm >= *min_wpm && accuracy >= *min_acc)
        .map(|(_, _, rating)| *rating)
        .unwrap_or(TypingRating::KeepPracticing)
}

pub fn rate_arcade(score: u32) -> ArcadeRating {
    ARCADE_TIERS
        .iter()
        .find(|(min_score, _)| score >= *min_score)
        .map(|(_, rating)| *rating)
        .unwrap_or(ArcadeRating::JustGettingStarted)
}
