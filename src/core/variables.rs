//! Variable substitution — maps the two player identities to named
//! template values and applies them to story text.
//!
//! Placeholders use the `{{NAME}}` form. Unknown placeholders pass through
//! verbatim so newer stories keep working against older engines.

use rustc_hash::FxHashMap;

use crate::schema::player::{PlayerPair, PlayerProfile};
use crate::schema::story::{Story, StoryNode};

/// The derived value table for one pair of players. Construction is
/// deterministic and side-effect free.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    values: FxHashMap<String, String>,
}

impl VariableSet {
    /// Derive all template values from the player pair: names, four pronoun
    /// cases in lower and capitalized form, gendered-noun variants, and the
    /// combined forms.
    pub fn from_players(players: &PlayerPair) -> VariableSet {
        let mut values = FxHashMap::default();
        insert_player(&mut values, "PLAYER1", &players.player1);
        insert_player(&mut values, "PLAYER2", &players.player2);

        values.insert(
            "BOTH_NAMES".to_string(),
            format!("{} and {}", players.player1.name, players.player2.name),
        );
        values.insert("THEY".to_string(), "they".to_string());
        values.insert("THEM".to_string(), "them".to_string());
        values.insert("THEIR".to_string(), "their".to_string());

        VariableSet { values }
    }

    /// Look up a single variable by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of derived values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every `{{NAME}}` placeholder with its value. A placeholder
    /// with no matching value — or malformed braces — is left verbatim.
    pub fn substitute(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < len {
            if chars[i] == '{' && i + 1 < len && chars[i + 1] == '{' {
                // Scan a word-character name followed by `}}`.
                let name_start = i + 2;
                let mut end = name_start;
                while end < len && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let well_formed =
                    end > name_start && end + 1 < len && chars[end] == '}' && chars[end + 1] == '}';
                if well_formed {
                    let name: String = chars[name_start..end].iter().collect();
                    if let Some(value) = self.values.get(&name) {
                        out.push_str(value);
                    } else {
                        // Unknown variable: emit the placeholder unchanged.
                        out.push_str("{{");
                        out.push_str(&name);
                        out.push_str("}}");
                    }
                    i = end + 2;
                    continue;
                }
            }
            out.push(chars[i]);
            i += 1;
        }

        out
    }

    /// Apply substitution to all player-facing text of a node. Structural
    /// fields (ids, choice targets, ending flags) are untouched.
    pub fn substitute_node(&self, node: &StoryNode) -> StoryNode {
        let mut out = node.clone();
        out.text = self.substitute(&node.text);
        for choice in &mut out.choices {
            choice.text = self.substitute(&choice.text);
        }
        out.ending_text = node.ending_text.as_deref().map(|t| self.substitute(t));
        out.ending_title = node.ending_title.as_deref().map(|t| self.substitute(t));
        out
    }

    /// Apply substitution to a story's display metadata (title,
    /// description); everything else passes through unchanged.
    pub fn substitute_story_meta(&self, story: &Story) -> Story {
        let mut out = story.clone();
        out.title = self.substitute(&story.title);
        out.description = story.description.as_deref().map(|d| self.substitute(d));
        out
    }
}

fn insert_player(values: &mut FxHashMap<String, String>, prefix: &str, player: &PlayerProfile) {
    let p = player.pronoun;
    let mut put = |suffix: &str, value: &str| {
        values.insert(format!("{prefix}_{suffix}"), value.to_string());
    };

    put("NAME", &player.name);
    put("HE_SHE", p.subject());
    put("HIM_HER", p.object());
    put("HIS_HER", p.possessive());
    put("HIMSELF_HERSELF", p.reflexive());
    put("HE_SHE_CAP", p.subject_cap());
    put("HIM_HER_CAP", p.object_cap());
    put("HIS_HER_CAP", p.possessive_cap());
    put("BOY_GIRL", p.boy_girl());
    put("BROTHER_SISTER", p.brother_sister());
    put("PRINCE_PRINCESS", p.prince_princess());
    put("KING_QUEEN", p.king_queen());
    put("SON_DAUGHTER", p.son_daughter());
}
