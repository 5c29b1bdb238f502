//! Ordered transition rules for the partner's state.
//!
//! Each rule inspects the lower-cased turn texts and both reads and
//! writes the shared draft, so later rules see (and may override)
//! what earlier rules wrote. The slice order below is therefore part of
//! the behaviour, not an implementation detail: the indoor reset (8)
//! re-safes comfort that dismissive input (4) guarded in the same turn,
//! and nocturnal decay (9) can push mood to tired over anything set
//! before it.

use crate::character::{
    CharacterState, ClaustrophobiaFlag, CognitiveLoad, Comfort, Energy, FearChannel,
    HumourChannel, IntimacyBand, Mood, SocialContext, Trust,
};
use crate::world::{Location, TimeOfDay};

/// Everything a single transition gets to look at
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub user_input: &'a str,
    pub partner_reply: &'a str,
    pub location: Location,
    pub time_of_day: TimeOfDay,
}

struct Draft {
    state: CharacterState,
    new_tags: Vec<String>,
    input: String,
    reply: String,
    location: Location,
    time_of_day: TimeOfDay,
}

impl Draft {
    fn tag(&mut self, tag: &str) {
        self.new_tags.push(tag.to_string());
    }

    fn input_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.input.contains(n))
    }

    fn reply_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.reply.contains(n))
    }
}

type Rule = fn(&mut Draft);

/// The rule sequence, applied top to bottom on every turn
const RULES: [(&str, Rule); 10] = [
    ("shared_laughter", shared_laughter),
    ("sincere_disclosure", sincere_disclosure),
    ("physical_affection", physical_affection),
    ("dismissive_input", dismissive_input),
    ("reconciliation", reconciliation),
    ("supportive_language", supportive_language),
    ("confinement_trigger", confinement_trigger),
    ("social_context_reset", social_context_reset),
    ("nocturnal_energy_decay", nocturnal_energy_decay),
    ("playfulness", playfulness),
];

/// Rule names in evaluation order, for diagnostics and tests
pub fn rule_order() -> Vec<&'static str> {
    RULES.iter().map(|(name, _)| *name).collect()
}

/// Evolve the character state for one turn. Pure and total: unmatched
/// input leaves every field unchanged, and the result's fields are
/// enum members by construction.
pub fn transition(state: &CharacterState, ctx: &TurnContext) -> CharacterState {
    let mut draft = Draft {
        state: state.clone(),
        new_tags: Vec::new(),
        input: ctx.user_input.to_lowercase(),
        reply: ctx.partner_reply.to_lowercase(),
        location: ctx.location,
        time_of_day: ctx.time_of_day,
    };

    for (_, rule) in RULES {
        rule(&mut draft);
    }

    let mut next = draft.state;
    next.push_event_tags(draft.new_tags);
    next
}

fn shared_laughter(draft: &mut Draft) {
    if draft.reply_has(&["laugh", "chuckle", "grin"]) || draft.input_has(&["haha", "lol", "funny"])
    {
        draft.tag("shared_laughter");
        if matches!(
            draft.state.humour,
            HumourChannel::Off | HumourChannel::Light
        ) {
            draft.state.humour = HumourChannel::Playful;
        }
    }
}

fn sincere_disclosure(draft: &mut Draft) {
    let phrases = ["i love you", "love you"];
    if draft.input_has(&phrases) || draft.reply_has(&phrases) {
        draft.tag("sincere_disclosure");
        if draft.state.trust != Trust::Strained {
            draft.state.trust = Trust::Steady;
        }
        if matches!(
            draft.state.intimacy,
            IntimacyBand::Ordinary | IntimacyBand::Warm
        ) {
            draft.state.intimacy = IntimacyBand::Warm;
        }
    }
}

fn physical_affection(draft: &mut Draft) {
    if draft.input_has(&["kiss", "hug", "hold", "touch"])
        || draft.reply_has(&["leans", "brushes", "reaches", "kisses"])
    {
        draft.tag("physical_intimacy");
        if draft.state.comfort == Comfort::Safe {
            draft.state.intimacy = IntimacyBand::Intimate;
        }
    }
}

fn dismissive_input(draft: &mut Draft) {
    if draft.input_has(&["shut up", "whatever", "i don't care", "leave me alone"]) {
        draft.tag("dismissive_input");
        draft.state.trust = Trust::Strained;
        draft.state.mood = Mood::Annoyed;
        draft.state.comfort = Comfort::SlightlyOnGuard;
    }
}

fn reconciliation(draft: &mut Draft) {
    if draft.input_has(&["sorry", "apologize", "my fault", "forgive"]) {
        if draft.state.trust == Trust::Strained {
            draft.state.trust = Trust::Repairing;
            draft.state.mood = Mood::Calm;
        }
        draft.tag("reconciliation");
    }
}

fn supportive_language(draft: &mut Draft) {
    if draft.input_has(&["it's okay", "i understand", "i'm here", "take your time"]) {
        draft.tag("supportive_response");
        if matches!(draft.state.mood, Mood::Stressed | Mood::Vulnerable) {
            draft.state.cognitive_load = CognitiveLoad::Moderate;
        }
    }
}

fn confinement_trigger(draft: &mut Draft) {
    let bathroom_close = draft.location == Location::Bathroom && draft.input.contains("close");
    if bathroom_close || draft.input_has(&["lift", "elevator", "confined", "stuck"]) {
        draft.tag("claustrophobic_trigger");
        draft.state.fear = FearChannel::Active;
        draft.state.claustrophobia = ClaustrophobiaFlag::Subtle;
    }
}

fn social_context_reset(draft: &mut Draft) {
    if draft.location.is_indoor() {
        draft.state.social_context = SocialContext::AloneTogether;
        draft.state.comfort = Comfort::Safe;
        return;
    }
    match draft.location {
        Location::Park => {
            draft.state.social_context = SocialContext::PublicLowNoise;
        }
        Location::Cafe | Location::Shop => {
            draft.state.social_context = SocialContext::PublicBusy;
            // More reserved among strangers
            if draft.state.mood == Mood::Playful {
                draft.state.humour = HumourChannel::Light;
            }
        }
        _ => {}
    }
}

fn nocturnal_energy_decay(draft: &mut Draft) {
    if !draft.time_of_day.is_nocturnal() {
        return;
    }
    if draft.state.energy == Energy::High {
        draft.state.energy = Energy::Medium;
    } else if draft.state.energy == Energy::Medium {
        draft.state.energy = Energy::Low;
    }
    if draft.state.energy == Energy::Low {
        draft.state.mood = Mood::Tired;
    }
}

fn playfulness(draft: &mut Draft) {
    if draft.input_has(&["tease", "joke", "play", "silly"])
        || draft.reply_has(&["teasing", "winks", "mischief"])
    {
        draft.tag("playful_moment");
        if draft.state.comfort == Comfort::Safe {
            draft.state.mood = Mood::Playful;
            draft.state.humour = HumourChannel::Playful;
        }
    }
}
