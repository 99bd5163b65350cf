use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::character::Trait;

/// Smallest gauge delta a single choice may carry.
pub const IMPACT_MIN: i64 = -10;
/// Largest gauge delta a single choice may carry.
pub const IMPACT_MAX: i64 = 10;

/// The three needs tracked for every character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gauge {
    /// Hunger.
    Faim,
    /// Thirst.
    Soif,
    /// Morale.
    Mental,
}

impl Gauge {
    pub const ALL: [Gauge; 3] = [Gauge::Faim, Gauge::Soif, Gauge::Mental];

    /// Wire name of the gauge, as used in `gaugeImpact` objects.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Faim => "faim",
            Self::Soif => "soif",
            Self::Mental => "mental",
        }
    }
}

impl fmt::Display for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-gauge deltas applied when a choice is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GaugeImpact {
    pub faim: i64,
    pub soif: i64,
    pub mental: i64,
}

impl GaugeImpact {
    pub fn get(&self, gauge: Gauge) -> i64 {
        match gauge {
            Gauge::Faim => self.faim,
            Gauge::Soif => self.soif,
            Gauge::Mental => self.mental,
        }
    }

    /// First gauge (in `faim`, `soif`, `mental` order) whose delta falls
    /// outside `IMPACT_MIN..=IMPACT_MAX`.
    pub fn first_out_of_range(&self) -> Option<(Gauge, i64)> {
        Gauge::ALL
            .into_iter()
            .map(|gauge| (gauge, self.get(gauge)))
            .find(|(_, value)| !(IMPACT_MIN..=IMPACT_MAX).contains(value))
    }
}

/// What happens to the character once a choice has been made.
///
/// On the wire an outcome is a plain label (`"survive"`, `"die"`,
/// `"returnHome"`, `"nextStep"` or anything else). The tagged form written by
/// older content (`{"die": {"reason": "..."}}`, `{"survive": {}}`) is accepted
/// as well, and is the form used to write a death that carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OutcomeRepr", into = "OutcomeRepr")]
pub enum Outcome {
    Survive,
    Die { reason: Option<String> },
    ReturnHome,
    NextStep,
    /// Any label outside the known set, kept verbatim.
    Other(String),
}

impl Outcome {
    pub fn from_label(label: &str) -> Self {
        match label {
            "survive" => Self::Survive,
            "die" => Self::Die { reason: None },
            "returnHome" => Self::ReturnHome,
            "nextStep" => Self::NextStep,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Survive => "survive",
            Self::Die { .. } => "die",
            Self::ReturnHome => "returnHome",
            Self::NextStep => "nextStep",
            Self::Other(label) => label,
        }
    }

    /// Returns true if this outcome ends the storyline early.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Die { .. } | Self::ReturnHome)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OutcomePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OutcomeRepr {
    Label(String),
    Tagged(BTreeMap<String, OutcomePayload>),
}

impl TryFrom<OutcomeRepr> for Outcome {
    type Error = String;

    fn try_from(repr: OutcomeRepr) -> Result<Self, Self::Error> {
        match repr {
            OutcomeRepr::Label(label) => Ok(Outcome::from_label(&label)),
            OutcomeRepr::Tagged(tags) => {
                let mut tags = tags.into_iter();
                match (tags.next(), tags.next()) {
                    (Some((tag, payload)), None) => Ok(match Outcome::from_label(&tag) {
                        Outcome::Die { .. } => Outcome::Die {
                            reason: payload.reason,
                        },
                        other => other,
                    }),
                    _ => Err("a tagged outcome must have exactly one tag".to_string()),
                }
            }
        }
    }
}

impl From<Outcome> for OutcomeRepr {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Die {
                reason: Some(reason),
            } => OutcomeRepr::Tagged(BTreeMap::from([(
                "die".to_string(),
                OutcomePayload {
                    reason: Some(reason),
                },
            )])),
            other => OutcomeRepr::Label(other.label().to_string()),
        }
    }
}

/// A trait granted by a choice: either a bare identifier or a full definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitGrant {
    Id(String),
    Definition(Trait),
}

impl TraitGrant {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Definition(t) => &t.id,
        }
    }

    /// Materialize the granted trait. A bare identifier doubles as the name.
    pub fn to_trait(&self) -> Trait {
        match self {
            Self::Id(id) => Trait {
                id: id.clone(),
                name: id.clone(),
                description: String::new(),
            },
            Self::Definition(t) => t.clone(),
        }
    }
}

/// One player-selectable branch of a story step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub consequence: String,
    pub gauge_impact: GaugeImpact,
    pub outcome: Outcome,
    #[serde(default)]
    pub gain_trait: Option<TraitGrant>,
    /// Item expected in the inventory to survive a dangerous choice.
    /// Stored only; nothing enforces it yet.
    #[serde(default)]
    pub required_item: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::from_label("survive"), Outcome::Survive);
        assert_eq!(Outcome::from_label("die"), Outcome::Die { reason: None });
        assert_eq!(Outcome::from_label("returnHome"), Outcome::ReturnHome);
        assert_eq!(Outcome::from_label("nextStep"), Outcome::NextStep);
        assert_eq!(
            Outcome::from_label("flee"),
            Outcome::Other("flee".to_string())
        );
        assert_eq!(Outcome::Other("flee".to_string()).label(), "flee");
    }

    #[test]
    fn outcome_decodes_tagged_form() {
        let die: Outcome = serde_json::from_value(json!({"die": {"reason": "noyade"}})).unwrap();
        assert_eq!(
            die,
            Outcome::Die {
                reason: Some("noyade".to_string())
            }
        );

        let survive: Outcome = serde_json::from_value(json!({"survive": {}})).unwrap();
        assert_eq!(survive, Outcome::Survive);
    }

    #[test]
    fn outcome_rejects_multiple_tags() {
        let result: Result<Outcome, _> =
            serde_json::from_value(json!({"die": {}, "survive": {}}));
        assert!(result.is_err());
        let result: Result<Outcome, _> = serde_json::from_value(json!(42));
        assert!(result.is_err());
    }

    #[test]
    fn outcome_encoding() {
        assert_eq!(serde_json::to_value(Outcome::NextStep).unwrap(), json!("nextStep"));
        assert_eq!(
            serde_json::to_value(Outcome::Die { reason: None }).unwrap(),
            json!("die")
        );
        assert_eq!(
            serde_json::to_value(Outcome::Die {
                reason: Some("chute".to_string())
            })
            .unwrap(),
            json!({"die": {"reason": "chute"}})
        );
    }

    #[test]
    fn terminal_outcomes() {
        assert!(Outcome::Die { reason: None }.is_terminal());
        assert!(Outcome::ReturnHome.is_terminal());
        assert!(!Outcome::Survive.is_terminal());
        assert!(!Outcome::NextStep.is_terminal());
    }

    #[test]
    fn trait_grant_forms() {
        let bare: TraitGrant = serde_json::from_value(json!("agile")).unwrap();
        assert_eq!(bare, TraitGrant::Id("agile".to_string()));
        assert_eq!(bare.to_trait().name, "agile");

        let full: TraitGrant = serde_json::from_value(json!({
            "id": "nageur",
            "name": "Nageur",
            "description": "Sait nager"
        }))
        .unwrap();
        assert_eq!(full.id(), "nageur");
        assert_eq!(full.to_trait().description, "Sait nager");
    }

    #[test]
    fn gauge_impact_range() {
        let ok = GaugeImpact {
            faim: -10,
            soif: 10,
            mental: 0,
        };
        assert_eq!(ok.first_out_of_range(), None);

        let bad = GaugeImpact {
            faim: 0,
            soif: 11,
            mental: -11,
        };
        assert_eq!(bad.first_out_of_range(), Some((Gauge::Soif, 11)));
    }

    #[test]
    fn choice_optional_fields_default_to_none() {
        let choice: Choice = serde_json::from_value(json!({
            "text": "Boire",
            "consequence": "L'eau est fraiche.",
            "gaugeImpact": {"faim": 0, "soif": 5, "mental": 1},
            "outcome": "survive"
        }))
        .unwrap();
        assert_eq!(choice.gain_trait, None);
        assert_eq!(choice.required_item, None);
        assert_eq!(choice.gauge_impact.soif, 5);
    }
}
