use serde::{Deserialize, Serialize};

use super::choice::{Choice, Gauge, GaugeImpact, Outcome};

/// Lowest value a character gauge can hold.
pub const GAUGE_MIN: i32 = 0;
/// Highest value a character gauge can hold.
pub const GAUGE_MAX: i32 = 100;

/// A special ability granted to a character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trait {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// An object bought or found, which may protect against a danger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub protects_against: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    Tibouchi,
    Tibizou,
    Ptibou,
}

/// Current need levels of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeState {
    pub faim: i32,
    pub soif: i32,
    pub mental: i32,
}

impl Default for GaugeState {
    fn default() -> Self {
        Self {
            faim: GAUGE_MAX,
            soif: GAUGE_MAX,
            mental: GAUGE_MAX,
        }
    }
}

impl GaugeState {
    pub fn get(&self, gauge: Gauge) -> i32 {
        match gauge {
            Gauge::Faim => self.faim,
            Gauge::Soif => self.soif,
            Gauge::Mental => self.mental,
        }
    }

    /// Add each delta, keeping every gauge within `GAUGE_MIN..=GAUGE_MAX`.
    pub fn apply(&mut self, impact: &GaugeImpact) {
        let shift = |current: i32, delta: i64| {
            let next = i64::from(current).saturating_add(delta);
            next.clamp(i64::from(GAUGE_MIN), i64::from(GAUGE_MAX)) as i32
        };
        self.faim = shift(self.faim, impact.faim);
        self.soif = shift(self.soif, impact.soif);
        self.mental = shift(self.mental, impact.mental);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterState {
    #[serde(rename = "type")]
    pub kind: CharacterType,
    pub is_alive: bool,
    pub gauges: GaugeState,
    pub traits: Vec<Trait>,
    pub inventory: Vec<Item>,
}

impl CharacterState {
    /// A living character with full gauges and nothing learned or carried.
    pub fn new(kind: CharacterType) -> Self {
        Self {
            kind,
            is_alive: true,
            gauges: GaugeState::default(),
            traits: Vec::new(),
            inventory: Vec::new(),
        }
    }

    pub fn has_trait(&self, id: &str) -> bool {
        self.traits.iter().any(|t| t.id == id)
    }

    /// Apply the effects of a selected choice: gauge deltas, the granted
    /// trait (once), and death when the outcome says so.
    pub fn apply_choice(&mut self, choice: &Choice) {
        self.gauges.apply(&choice.gauge_impact);

        if let Some(grant) = &choice.gain_trait {
            if !self.has_trait(grant.id()) {
                self.traits.push(grant.to_trait());
            }
        }

        if matches!(choice.outcome, Outcome::Die { .. }) {
            self.is_alive = false;
        }
    }
}

/// Whole-session save data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub characters: Vec<CharacterState>,
    pub coins: u32,
    pub days_survived: u32,
}
