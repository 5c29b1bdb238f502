//! Pattern-based identity validation for generated output.
//!
//! The checks themselves are data: a [`RulePack`] carries compiled
//! denylists and marker sets, and the validator maps character ids to
//! packs, so phrase families can be tuned or new characters added
//! without touching the turn pipeline.

use regex::Regex;
use std::collections::HashMap;

/// Outcome of validating one generated text
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn clean() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

/// A denylist entry: the pattern plus the description reported when it
/// matches.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: Regex,
    pub description: String,
}

impl PatternRule {
    fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: re(pattern),
            description: description.to_string(),
        }
    }
}

/// A negative-space rule: fires when the trigger matches and, if set,
/// the corroborating pattern matches too.
#[derive(Debug, Clone)]
pub struct NegativeSpaceRule {
    pub description: String,
    pub trigger: Regex,
    pub corroborator: Option<Regex>,
}

/// Everything the validator knows about one character's voice
#[derive(Debug, Clone)]
pub struct RulePack {
    /// Label used for spoken lines, e.g. `Elin: "..."`
    pub dialogue_label: String,
    /// Hard-reject phrases anywhere in the output
    pub generic_denylist: Vec<PatternRule>,
    /// At least one must appear in substantial dialogue
    pub signature_markers: Vec<Regex>,
    /// Rejected when found inside dialogue
    pub pr_speak: Vec<PatternRule>,
    /// Required somewhere in substantial narration
    pub physicality: Regex,
    pub negative_space: Vec<NegativeSpaceRule>,
    /// Dialogue shorter than this skips the marker checks
    pub dialogue_min_len: usize,
    /// Narration shorter than this skips the grounding check
    pub narration_min_len: usize,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded validation pattern compiles")
}

impl RulePack {
    /// The built-in pack for the default partner character: a blunt,
    /// dry-witted voice that must never drift into generic romance-bot
    /// or PR phrasing.
    pub fn default_partner(dialogue_label: &str) -> Self {
        let generic_denylist = vec![
            PatternRule::new(r"(?i)it feels like home already", "generic \"feels like home\""),
            PatternRule::new(
                r"(?i)what's on your mind\??",
                "generic therapy-speak \"what's on your mind\"",
            ),
            PatternRule::new(r"(?i)what is on your mind\??", "generic therapy-speak"),
            PatternRule::new(
                r"(?i)i'm here for you",
                "generic reassurance \"I'm here for you\"",
            ),
            PatternRule::new(r"(?i)i am here for you", "generic reassurance"),
            PatternRule::new(
                r"(?i)anything you want to talk about\??",
                "generic therapy prompt",
            ),
            PatternRule::new(r"(?i)how are you feeling\??$", "generic check-in question"),
            PatternRule::new(r"(?i)tell me more about that", "generic therapy prompt"),
            PatternRule::new(r"(?i)whenever you're ready", "generic patience statement"),
            PatternRule::new(r"(?i)whenever you are ready", "generic patience statement"),
            PatternRule::new(r"(?i)take your time", "generic patience statement"),
            PatternRule::new(r"(?i)i understand how you feel", "generic empathy statement"),
            PatternRule::new(r"(?i)that must be hard", "generic empathy statement"),
            PatternRule::new(r"(?i)i can only imagine", "generic empathy statement"),
            PatternRule::new(r"(?i)you're so brave", "generic reassurance"),
            PatternRule::new(r"(?i)you are so brave", "generic reassurance"),
            PatternRule::new(r"(?i)like secret agents", "generic rom-com trope"),
            PatternRule::new(
                r"(?i)oversized sunglasses and hat",
                "generic celebrity cliche",
            ),
            PatternRule::new(r"(?i)your wish is my command", "generic romance-bot"),
            PatternRule::new(r"(?i)anything for you", "generic romance-bot"),
        ];

        let signature_markers = vec![
            // humour
            re(r"(?i)squint|brow|corner of.*mouth|teasing|wry|dry|bloody|fucking|damn|christ|god\s|bollocks|arse|ridiculous"),
            // directness
            re(r"(?i)look,|here's the|the thing is|actually,|honestly,|truth is|right,|fine\.|okay\."),
            // self-interruption
            re(r"(?i)wait,|no—|actually—|—|i mean,"),
            // bluntness
            re(r"(?i)you know|that's|that is|not going to|won't|can't|shouldn't|don't|do not"),
        ];

        let pr_speak = vec![
            PatternRule::new(r"(?i)i appreciate that", "PR-speak"),
            PatternRule::new(r"(?i)thank you for sharing", "PR-speak"),
            PatternRule::new(r"(?i)that sounds wonderful", "PR-speak"),
            PatternRule::new(r"(?i)how lovely", "PR-speak"),
            PatternRule::new(r"(?i)that's so sweet", "PR-speak"),
            PatternRule::new(r"(?i)that is so sweet", "PR-speak"),
            PatternRule::new(r"(?i)you're too kind", "PR-speak"),
            PatternRule::new(r"(?i)you are too kind", "PR-speak"),
        ];

        let physicality = re(
            r"(?i)lean|step|bump|touch|hand|shoulder|hip|mug|coffee|kitchen|window|counter|chair|sofa|couch|door|walk|stand|sit|move|turn|glance|look",
        );

        let negative_space = vec![
            NegativeSpaceRule {
                description: "No cruelty or manipulative humour".to_string(),
                trigger: re(r"(?i)humiliat|mock|demean|belittl|cruel"),
                corroborator: None,
            },
            NegativeSpaceRule {
                description: "No corporate PR-speak".to_string(),
                trigger: re(r"(?i)synergy|leverage|optimize|circle back|touch base|moving forward"),
                corroborator: None,
            },
            NegativeSpaceRule {
                description: "Possible emotional dishonesty pattern".to_string(),
                trigger: re(r"(?i)everything is fine|nothing is wrong|i'm fine|don't worry about"),
                corroborator: Some(re(r"clearly|obviously|visibly")),
            },
        ];

        Self {
            dialogue_label: dialogue_label.to_string(),
            generic_denylist,
            signature_markers,
            pr_speak,
            physicality,
            negative_space,
            dialogue_min_len: 20,
            narration_min_len: 100,
        }
    }

    fn dialogue_pattern(&self) -> Regex {
        re(&format!(
            r#"{}:\s*"([^"]+)""#,
            regex::escape(&self.dialogue_label)
        ))
    }
}

/// Maps character ids to rule packs and runs the checks. Pure and
/// deterministic; never fails on any well-formed string input.
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    packs: HashMap<String, RulePack>,
}

impl OutputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the default partner pack under `elin`
    pub fn with_defaults() -> Self {
        Self::new().with_pack("elin", RulePack::default_partner("Elin"))
    }

    pub fn with_pack(mut self, character_id: impl Into<String>, pack: RulePack) -> Self {
        self.packs.insert(character_id.into().to_lowercase(), pack);
        self
    }

    pub fn validate(&self, character_id: &str, text: &str) -> ValidationReport {
        let Some(pack) = self.packs.get(&character_id.to_lowercase()) else {
            return ValidationReport::from_issues(vec![format!(
                "Character identity not found: {}",
                character_id
            )]);
        };

        let mut issues = Vec::new();

        for rule in &pack.generic_denylist {
            if rule.pattern.is_match(text) {
                issues.push(format!("Contains generic pattern: {}", rule.description));
            }
        }

        let dialogue_pattern = pack.dialogue_pattern();
        let dialogue: String = dialogue_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if dialogue.len() > pack.dialogue_min_len {
            let has_marker = pack
                .signature_markers
                .iter()
                .any(|marker| marker.is_match(&dialogue));
            if !has_marker {
                issues.push(format!(
                    "{} dialogue lacks signature markers (humour, directness, \
                     self-interruption, or bluntness)",
                    pack.dialogue_label
                ));
            }

            for rule in &pack.pr_speak {
                if rule.pattern.is_match(&dialogue) {
                    issues.push(format!(
                        "{} dialogue contains {}, violating the character's blunt register",
                        pack.dialogue_label, rule.description
                    ));
                }
            }
        }

        let narration = dialogue_pattern.replace_all(text, "").to_string();
        if narration.len() > pack.narration_min_len && !pack.physicality.is_match(&narration) {
            issues.push("Output lacks physical grounding in narration".to_string());
        }

        for rule in &pack.negative_space {
            let corroborated = rule
                .corroborator
                .as_ref()
                .map_or(true, |extra| extra.is_match(text));
            if rule.trigger.is_match(text) && corroborated {
                issues.push(format!("Violates negative space: {}", rule.description));
            }
        }

        ValidationReport::from_issues(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> OutputValidator {
        OutputValidator::with_defaults()
    }

    #[test]
    fn grounded_in_character_output_passes() {
        let text = "Elin: \"Right, that kettle's not going to fix itself.\" \
                    She bumps his hip on the way to the counter.";
        let report = validator().validate("elin", text);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn generic_patterns_are_rejected_with_descriptions() {
        let report = validator().validate("elin", "I'm here for you, whenever you're ready.");
        assert!(!report.valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("I'm here for you")));
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("generic patience statement")));
    }

    #[test]
    fn substantial_dialogue_without_markers_is_flagged() {
        let text = "Elin: \"I will make us some tea now if you like.\"";
        let report = validator().validate("elin", text);
        assert!(!report.valid);
        assert!(report.issues[0].contains("signature markers"));
    }

    #[test]
    fn short_dialogue_skips_marker_checks() {
        let report = validator().validate("elin", "Elin: \"Mm.\"");
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn pr_speak_inside_dialogue_is_flagged() {
        let text = "Elin: \"Honestly, that sounds wonderful, thank you for sharing.\"";
        let report = validator().validate("elin", text);
        assert!(!report.valid);
        assert!(report.issues.iter().any(|i| i.contains("PR-speak")));
    }

    #[test]
    fn long_ungrounded_narration_is_flagged() {
        let text = "A long pause follows. The evening air seems heavier than \
                    before, and somewhere upstairs a radio murmurs an old song \
                    about nothing in particular.";
        let report = validator().validate("elin", text);
        assert!(!report.valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("physical grounding")));
    }

    #[test]
    fn corporate_phrasing_violates_negative_space() {
        let text = "Elin: \"Right, let's circle back to that after breakfast.\"";
        let report = validator().validate("elin", text);
        assert!(!report.valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("No corporate PR-speak")));
    }

    #[test]
    fn emotional_dishonesty_needs_corroboration() {
        let bare = "Elin: \"I'm fine, honestly. Don't fuss.\" She looks away.";
        assert!(validator().validate("elin", bare).valid);

        let corroborated = "Elin: \"I'm fine, honestly. Don't fuss.\" \
                            She is visibly shaking as she turns away.";
        let report = validator().validate("elin", corroborated);
        assert!(!report.valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("emotional dishonesty")));
    }

    #[test]
    fn unknown_character_fails_with_single_issue() {
        let report = validator().validate("nobody", "Hello.");
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("nobody"));
    }

    #[test]
    fn validation_is_deterministic() {
        let text = "Elin: \"Take your time, whenever you're ready.\"";
        let a = validator().validate("elin", text);
        let b = validator().validate("elin", text);
        assert_eq!(a, b);
    }
}
