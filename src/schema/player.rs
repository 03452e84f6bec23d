//! Player identities: two profile slots and the closed pronoun set that
//! drives template variable derivation.

use serde::{Deserialize, Serialize};

/// Pronoun selection for a player. Drives the grammatical case variants
/// and the gendered-noun variables; `They` always maps to the neutral
/// noun variants, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pronoun {
    He,
    She,
    #[default]
    They,
}

impl Pronoun {
    /// Nominative form: "he", "she", "they".
    pub fn subject(&self) -> &'static str {
        match self {
            Self::He => "he",
            Self::She => "she",
            Self::They => "they",
        }
    }

    /// Accusative form: "him", "her", "them".
    pub fn object(&self) -> &'static str {
        match self {
            Self::He => "him",
            Self::She => "her",
            Self::They => "them",
        }
    }

    /// Possessive determiner: "his", "her", "their".
    pub fn possessive(&self) -> &'static str {
        match self {
            Self::He => "his",
            Self::She => "her",
            Self::They => "their",
        }
    }

    /// Reflexive: "himself", "herself", "themself".
    pub fn reflexive(&self) -> &'static str {
        match self {
            Self::He => "himself",
            Self::She => "herself",
            Self::They => "themself",
        }
    }

    /// Sentence-initial nominative: "He", "She", "They".
    pub fn subject_cap(&self) -> &'static str {
        match self {
            Self::He => "He",
            Self::She => "She",
            Self::They => "They",
        }
    }

    /// Sentence-initial accusative: "Him", "Her", "Them".
    pub fn object_cap(&self) -> &'static str {
        match self {
            Self::He => "Him",
            Self::She => "Her",
            Self::They => "Them",
        }
    }

    /// Sentence-initial possessive: "His", "Her", "Their".
    pub fn possessive_cap(&self) -> &'static str {
        match self {
            Self::He => "His",
            Self::She => "Her",
            Self::They => "Their",
        }
    }

    /// "boy" / "girl" / "kid".
    pub fn boy_girl(&self) -> &'static str {
        match self {
            Self::He => "boy",
            Self::She => "girl",
            Self::They => "kid",
        }
    }

    /// "brother" / "sister" / "sibling".
    pub fn brother_sister(&self) -> &'static str {
        match self {
            Self::He => "brother",
            Self::She => "sister",
            Self::They => "sibling",
        }
    }

    /// "prince" / "princess" / "royal".
    pub fn prince_princess(&self) -> &'static str {
        match self {
            Self::He => "prince",
            Self::She => "princess",
            Self::They => "royal",
        }
    }

    /// "king" / "queen" / "ruler".
    pub fn king_queen(&self) -> &'static str {
        match self {
            Self::He => "king",
            Self::She => "queen",
            Self::They => "ruler",
        }
    }

    /// "son" / "daughter" / "child".
    pub fn son_daughter(&self) -> &'static str {
        match self {
            Self::He => "son",
            Self::She => "daughter",
            Self::They => "child",
        }
    }
}

/// One player slot: display name plus pronoun selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub pronoun: Pronoun,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, pronoun: Pronoun) -> Self {
        Self {
            name: name.into(),
            pronoun,
        }
    }
}

/// The two co-players. Created once during setup, mutable via settings,
/// removed only by a full data reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPair {
    pub player1: PlayerProfile,
    pub player2: PlayerProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pronoun_cases_she() {
        let p = Pronoun::She;
        assert_eq!(p.subject(), "she");
        assert_eq!(p.object(), "her");
        assert_eq!(p.possessive(), "her");
        assert_eq!(p.reflexive(), "herself");
        assert_eq!(p.subject_cap(), "She");
    }

    #[test]
    fn pronoun_cases_he() {
        let p = Pronoun::He;
        assert_eq!(p.subject(), "he");
        assert_eq!(p.object(), "him");
        assert_eq!(p.possessive(), "his");
        assert_eq!(p.reflexive(), "himself");
        assert_eq!(p.possessive_cap(), "His");
    }

    #[test]
    fn they_maps_to_neutral_nouns() {
        let p = Pronoun::They;
        assert_eq!(p.boy_girl(), "kid");
        assert_eq!(p.brother_sister(), "sibling");
        assert_eq!(p.prince_princess(), "royal");
        assert_eq!(p.king_queen(), "ruler");
        assert_eq!(p.son_daughter(), "child");
        assert_eq!(p.reflexive(), "themself");
    }

    #[test]
    fn pronoun_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Pronoun::He).unwrap(), "\"he\"");
        let p: Pronoun = serde_json::from_str("\"they\"").unwrap();
        assert_eq!(p, Pronoun::They);
    }

    #[test]
    fn player_pair_round_trip() {
        let pair = PlayerPair {
            player1: PlayerProfile::new("Ava", Pronoun::She),
            player2: PlayerProfile::new("Milo", Pronoun::He),
        };
        let json = serde_json::to_string(&pair).unwrap();
        let back: PlayerPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
