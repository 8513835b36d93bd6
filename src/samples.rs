use std::collections::HashMap;
use std::str::FromStr;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::error::{Error, Result};

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

/// Difficulty tier of the typing test text
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Parses a tier name, falling back to `Medium` for anything unrecognized.
    pub fn from_name(name: &str) -> Self {
        Difficulty::from_str(name.trim()).unwrap_or_default()
    }
}

#[derive(Deserialize, Clone, Debug)]
struct SampleFile {
    name: String,
    samples: Vec<String>,
}

/// Reads and deserializes one of the JSON files embedded from `src/corpus`.
pub(crate) fn read_corpus_file<T: DeserializeOwned>(file_name: &str) -> Result<T> {
    let file = CORPUS_DIR.get_file(file_name).ok_or_else(|| Error::Corpus {
        message: format!("{file_name} not found"),
    })?;

    let contents = file.contents_utf8().ok_or_else(|| Error::Corpus {
        message: format!("{file_name} is not valid utf-8"),
    })?;

    Ok(serde_json::from_str(contents)?)
}

/// Text samples keyed by difficulty. Every tier is non-empty once built.
#[derive(Debug, Clone)]
pub struct TextSampleProvider {
    tiers: HashMap<Difficulty, Vec<String>>,
}

impl TextSampleProvider {
    /// Loads the corpora compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let mut tiers = HashMap::new();
        for difficulty in Difficulty::iter() {
            let file: SampleFile = read_corpus_file(&format!("{difficulty}.json"))?;
            tracing::trace!(tier = %file.name, count = file.samples.len(), "loaded samples");
            tiers.insert(difficulty, file.samples);
        }
        Self::from_tiers(tiers)
    }

    /// Builds a provider from custom corpora. Empty samples are dropped and
    /// tiers left without samples borrow the `Medium` list, which must exist.
    pub fn from_tiers(mut tiers: HashMap<Difficulty, Vec<String>>) -> Result<Self> {
        for samples in tiers.values_mut() {
            samples.retain(|s| !s.is_empty());
        }

        let medium = match tiers.get(&Difficulty::Medium) {
            Some(samples) if !samples.is_empty() => samples.clone(),
            _ => {
                return Err(Error::Corpus {
                    message: "medium tier has no samples".to_string(),
                })
            }
        };

        for difficulty in Difficulty::iter() {
            let samples = tiers.entry(difficulty).or_default();
            if samples.is_empty() {
                *samples = medium.clone();
            }
        }

        Ok(Self { tiers })
    }

    /// Same samples for every tier.
    pub fn from_samples<S: Into<String>>(samples: impl IntoIterator<Item = S>) -> Result<Self> {
        let samples: Vec<String> = samples.into_iter().map(Into::into).collect();
        Self::from_tiers(HashMap::from([(Difficulty::Medium, samples)]))
    }

    /// Picks a sample uniformly at random from the tier.
    pub fn sample<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> &str {
        self.samples(difficulty)
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn samples(&self, difficulty: Difficulty) -> &[String] {
        self.tiers
            .get(&difficulty)
            .or_else(|| self.tiers.get(&Difficulty::Medium))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
