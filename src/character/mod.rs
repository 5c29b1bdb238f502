//! The partner character's categorical psychological state.
//!
//! Every field is a label from a closed enumeration, nothing numeric.
//! The state is evolved once per turn by the rule sequence in
//! [`rules`], serialized to a string for storage inside the world
//! document, and summarized into system notes for prompt assembly.

pub mod rules;

use serde::{Deserialize, Serialize};

pub use rules::{transition, TurnContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Calm,
    Playful,
    Tired,
    Stressed,
    Annoyed,
    Vulnerable,
    Focused,
    Overwhelmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Energy {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trust {
    Growing,
    Steady,
    Strained,
    Repairing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comfort {
    Safe,
    SlightlyOnGuard,
    Alert,
    Uncomfortable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntimacyBand {
    Ordinary,
    Warm,
    Intimate,
    PostIntimacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialContext {
    AloneTogether,
    PublicLowNoise,
    PublicBusy,
    GroupSmall,
    GroupLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveLoad {
    Light,
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumourChannel {
    Off,
    Light,
    Playful,
    Chaotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearChannel {
    Idle,
    Background,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaustrophobiaFlag {
    None,
    Subtle,
    Triggered,
}

pub const RECENT_EVENT_TAG_CAP: usize = 10;

/// Snapshot of the partner's mood, trust and intimacy. Never mutated in
/// place; each turn produces a new value via [`transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub mood: Mood,
    pub energy: Energy,
    pub trust: Trust,
    pub comfort: Comfort,
    pub intimacy: IntimacyBand,
    pub social_context: SocialContext,
    pub cognitive_load: CognitiveLoad,
    pub humour: HumourChannel,
    pub fear: FearChannel,
    pub claustrophobia: ClaustrophobiaFlag,
    pub recent_event_tags: Vec<String>,
    pub physical_state: Vec<String>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            mood: Mood::Calm,
            energy: Energy::Medium,
            trust: Trust::Steady,
            comfort: Comfort::Safe,
            intimacy: IntimacyBand::Warm,
            social_context: SocialContext::AloneTogether,
            cognitive_load: CognitiveLoad::Light,
            humour: HumourChannel::Light,
            fear: FearChannel::Idle,
            claustrophobia: ClaustrophobiaFlag::None,
            recent_event_tags: Vec::new(),
            physical_state: vec!["well_rested".to_string()],
        }
    }
}

impl CharacterState {
    /// Serialize for storage inside the world document
    pub fn to_stored(&self) -> String {
        // A struct of enums and strings cannot fail to serialize
        serde_json::to_string(self).expect("character state serializes")
    }

    /// Decode a stored state string. A missing, malformed or
    /// partially-valid string yields exactly the default state; a
    /// partial or invalid state never escapes.
    pub fn from_stored(stored: Option<&str>) -> Self {
        match stored {
            Some(json) => serde_json::from_str(json).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Prepend new event tags, keeping the newest ten
    pub fn push_event_tags(&mut self, new_tags: Vec<String>) {
        let mut tags = new_tags;
        tags.append(&mut self.recent_event_tags);
        tags.truncate(RECENT_EVENT_TAG_CAP);
        self.recent_event_tags = tags;
    }

    /// Semicolon-joined `key: value` summary for prompt injection.
    /// Fields sitting at their neutral or idle value are omitted from
    /// the tail sections; only the first three event tags are shown.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("mood: {}", label(&self.mood)),
            format!("energy: {}", label(&self.energy)),
            format!("trust: {}", label(&self.trust)),
            format!("comfort: {}", label(&self.comfort)),
            format!("intimacy band: {}", label(&self.intimacy)),
            format!("social context: {}", label(&self.social_context)),
            format!("cognitive load: {}", label(&self.cognitive_load)),
            format!("humour channel: {}", label(&self.humour)),
        ];

        if self.fear != FearChannel::Idle {
            parts.push(format!("fear channel: {}", label(&self.fear)));
        }
        if self.claustrophobia != ClaustrophobiaFlag::None {
            parts.push(format!("claustrophobia: {}", label(&self.claustrophobia)));
        }
        if !self.physical_state.is_empty() {
            parts.push(format!("physical: {}", self.physical_state.join(", ")));
        }
        if !self.recent_event_tags.is_empty() {
            let recent: Vec<&str> = self
                .recent_event_tags
                .iter()
                .take(3)
                .map(String::as_str)
                .collect();
            parts.push(format!("recent events: {}", recent.join(", ")));
        }

        parts.join("; ")
    }

    /// System note guiding the character's own expression, injected
    /// without ever being narrated or spoken directly.
    pub fn expression_note(&self, partner_name: &str) -> String {
        format!(
            "System note for {partner_name}'s expression engine:\n\
             {partner_name} currently feels/behaves in a way consistent with: {}.\n\
             Adjust tone, humour, and rhythm accordingly, without explaining the state.",
            self.summary()
        )
    }

    /// System note for the narrator pipeline: observational phrasing,
    /// never stating feelings as facts.
    pub fn narrator_note(&self, partner_name: &str) -> String {
        format!(
            "System note (not to be narrated):\n\
             {partner_name}'s current state: {}.\n\
             Use this only to decide which observable behaviours to highlight, \
             not to state feelings as facts.",
            self.summary()
        )
    }
}

fn label<T: Serialize>(value: &T) -> String {
    // Enum labels serialize as quoted snake_case strings
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
