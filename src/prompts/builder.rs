use anyhow::Result;
use std::path::Path;

use super::loader::PromptLoader;
use super::templates::CHARACTER_DIRECTIVE;
use crate::character::CharacterState;
use crate::types::{Cast, PromptMessage, StoredMessage};
use crate::world::{Location, TimeOfDay, WorldState};

/// How many past messages are replayed into every prompt
const HISTORY_WINDOW: usize = 6;

/// Which pipeline variant a prompt is assembled for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// The partner speaks in her own voice: fingerprint, expression
    /// engine and the hard output directive are all injected
    Character,
    /// Scene narration only: the state note is phrased for indirect,
    /// observational use and the character templates are omitted
    Narrator,
}

/// Scene flavour per location, looked up by enum with the serialized
/// identifier as fallback for any missing entry
const LOCATION_FLAVOUR: &[(Location, &str)] = &[
    (
        Location::Kitchen,
        "the kitchen, with morning light through the window, the smell of coffee",
    ),
    (
        Location::Lounge,
        "the lounge, comfortable and familiar, the sofa inviting",
    ),
    (Location::Bedroom, "the bedroom, quiet and private"),
    (
        Location::Hallway,
        "the hallway, a transitional space between rooms",
    ),
    (Location::Bathroom, "the bathroom"),
    (Location::Garden, "the garden, fresh air and open sky"),
    (
        Location::Cafe,
        "a café, the hum of other customers, the clink of cups",
    ),
    (
        Location::Park,
        "the park, trees and grass, people walking by in the distance",
    ),
    (
        Location::Street,
        "the street, urban sounds, passing cars and pedestrians",
    ),
    (Location::Shop, "a shop, browsing among shelves and displays"),
];

const TIME_FLAVOUR: &[(TimeOfDay, &str)] = &[
    (
        TimeOfDay::EarlyMorning,
        "Early morning light filters in, the day just beginning.",
    ),
    (TimeOfDay::LateMorning, "Late morning, the day well underway."),
    (TimeOfDay::Afternoon, "Afternoon, relaxed and unhurried."),
    (
        TimeOfDay::Evening,
        "Evening settles in, the light growing softer.",
    ),
    (TimeOfDay::LateNight, "Late night, quiet and still."),
];

fn location_flavour(location: Location) -> &'static str {
    LOCATION_FLAVOUR
        .iter()
        .find(|(key, _)| *key == location)
        .map(|(_, text)| *text)
        .unwrap_or_else(|| location.identifier())
}

fn time_flavour(time_of_day: TimeOfDay) -> &'static str {
    TIME_FLAVOUR
        .iter()
        .find(|(key, _)| *key == time_of_day)
        .map(|(_, text)| *text)
        .unwrap_or("")
}

/// Builds the ordered prompt for a turn. Deterministic given its inputs
/// and the loaded template texts; the block order is fixed and must not
/// change.
pub struct PromptBuilder {
    loader: PromptLoader,
    cast: Cast,
}

impl PromptBuilder {
    pub fn new(data_path: impl AsRef<Path>, cast: Cast) -> Self {
        Self {
            loader: PromptLoader::new(data_path),
            cast,
        }
    }

    pub fn cast(&self) -> &Cast {
        &self.cast
    }

    pub fn loader(&self) -> &PromptLoader {
        &self.loader
    }

    /// Assemble the full prompt for one turn.
    ///
    /// Character mode, in order: narrator system, fingerprint,
    /// expression engine, state note, world ledger slice, scene block,
    /// output directive, last six history messages, the user input.
    /// Narrator mode drops the fingerprint, engine and directive and
    /// swaps in the observational state note.
    pub fn assemble(
        &self,
        mode: AssemblyMode,
        world: &WorldState,
        character: &CharacterState,
        user_input: &str,
        history: &[StoredMessage],
    ) -> Result<Vec<PromptMessage>> {
        let mut messages = Vec::new();

        messages.push(PromptMessage::system(self.loader.load_narrator_system()?));

        match mode {
            AssemblyMode::Character => {
                messages.push(PromptMessage::system(self.loader.load_fingerprint()?));
                messages.push(PromptMessage::system(
                    self.loader.load_expression_engine()?,
                ));
                messages.push(PromptMessage::system(
                    character.expression_note(&self.cast.partner_name),
                ));
            }
            AssemblyMode::Narrator => {
                messages.push(PromptMessage::system(
                    character.narrator_note(&self.cast.partner_name),
                ));
            }
        }

        messages.push(PromptMessage::system(self.world_ledger_slice(world)));
        messages.push(PromptMessage::system(self.scene_block(world)));

        if mode == AssemblyMode::Character {
            messages.push(PromptMessage::system(CHARACTER_DIRECTIVE));
        }

        let start = history.len().saturating_sub(HISTORY_WINDOW);
        for message in &history[start..] {
            messages.push(PromptMessage {
                role: message.role.into(),
                content: message.content.clone(),
            });
        }

        messages.push(PromptMessage::user(user_input));

        Ok(messages)
    }

    /// The authoritative world facts for this turn, rendered compactly
    fn world_ledger_slice(&self, world: &WorldState) -> String {
        let mut lines = vec!["## World Ledger Slice".to_string(), String::new()];

        lines.push(format!(
            "**Time:** {} (Day {})",
            world.time.time_of_day.description(),
            world.time.days_into_stay + 1
        ));

        if world.together() {
            lines.push(format!(
                "**Location:** Both in {}",
                world.locations.user.display_name()
            ));
        } else {
            lines.push(format!(
                "**{}:** {}",
                self.cast.user_name,
                world.locations.user.display_name()
            ));
            lines.push(format!(
                "**{}:** {}",
                self.cast.partner_name,
                world.locations.partner.display_name()
            ));
        }

        if let Some(shared) = &world.activities.shared {
            lines.push(format!("**Activity:** {} (together)", shared.description));
        } else {
            if let Some(activity) = &world.activities.partner {
                lines.push(format!(
                    "**{}'s activity:** {}",
                    self.cast.partner_name, activity.description
                ));
            }
            if let Some(activity) = &world.activities.user {
                lines.push(format!(
                    "**{}'s activity:** {}",
                    self.cast.user_name, activity.description
                ));
            }
        }

        lines.push(format!(
            "**Relationship tone:** {}",
            world.relationship.overall_tone
        ));

        let moments = &world.relationship.recent_key_moments;
        if !moments.is_empty() {
            let start = moments.len().saturating_sub(2);
            lines.push(format!("**Recent moments:** {}", moments[start..].join("; ")));
        }

        lines.join("\n")
    }

    /// Sensory scene description, seen from the partner's location
    fn scene_block(&self, world: &WorldState) -> String {
        let location = world.locations.partner;

        let mut scene = String::from("## Scene Summary\n\n");
        scene.push_str(&format!("You are in {}.\n", location_flavour(location)));
        scene.push_str(time_flavour(world.time.time_of_day));
        scene.push('\n');

        if world.together() {
            scene.push_str(&format!(
                "{} is here with you.\n",
                self.cast.partner_name
            ));
        } else {
            scene.push_str(&format!(
                "{} is in {}.\n",
                self.cast.partner_name,
                location_flavour(world.locations.partner)
            ));
        }

        scene
    }
}
