use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Every place the simulation knows about. Indoor rooms carry the
/// `house:` prefix in storage, outdoor spots the `outside:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "house:kitchen")]
    Kitchen,
    #[serde(rename = "house:lounge")]
    Lounge,
    #[serde(rename = "house:bedroom")]
    Bedroom,
    #[serde(rename = "house:hallway")]
    Hallway,
    #[serde(rename = "house:bathroom")]
    Bathroom,
    #[serde(rename = "house:garden")]
    Garden,
    #[serde(rename = "outside:cafe")]
    Cafe,
    #[serde(rename = "outside:park")]
    Park,
    #[serde(rename = "outside:street")]
    Street,
    #[serde(rename = "outside:shop")]
    Shop,
}

impl Location {
    /// The serialized identifier, used as the fallback wherever a lookup
    /// table has no entry for this location.
    pub fn identifier(&self) -> &'static str {
        match self {
            Location::Kitchen => "house:kitchen",
            Location::Lounge => "house:lounge",
            Location::Bedroom => "house:bedroom",
            Location::Hallway => "house:hallway",
            Location::Bathroom => "house:bathroom",
            Location::Garden => "house:garden",
            Location::Cafe => "outside:cafe",
            Location::Park => "outside:park",
            Location::Street => "outside:street",
            Location::Shop => "outside:shop",
        }
    }

    pub fn is_indoor(&self) -> bool {
        self.identifier().starts_with("house:")
    }

    pub fn is_outdoor(&self) -> bool {
        !self.is_indoor()
    }

    /// Human-readable name for prose rendering
    pub fn display_name(&self) -> &'static str {
        match self {
            Location::Kitchen => "the kitchen",
            Location::Lounge => "the lounge",
            Location::Bedroom => "the bedroom",
            Location::Hallway => "the hallway",
            Location::Bathroom => "the bathroom",
            Location::Garden => "the garden",
            Location::Cafe => "the café",
            Location::Park => "the park",
            Location::Street => "the street",
            Location::Shop => "the shop",
        }
    }

    /// Directly connected rooms. Only indoor locations are part of the
    /// connectivity graph; outdoor spots have no adjacency.
    pub fn connections(&self) -> &'static [Location] {
        match self {
            Location::Kitchen => &[Location::Hallway, Location::Lounge, Location::Garden],
            Location::Lounge => &[Location::Kitchen, Location::Hallway],
            Location::Bedroom => &[Location::Hallway],
            Location::Hallway => &[
                Location::Kitchen,
                Location::Lounge,
                Location::Bedroom,
                Location::Bathroom,
            ],
            Location::Bathroom => &[Location::Hallway],
            Location::Garden => &[Location::Kitchen],
            _ => &[],
        }
    }

    pub fn is_adjacent_to(&self, other: Location) -> bool {
        self.connections().contains(&other)
    }
}

/// Shortest indoor path between two rooms (BFS over the connectivity
/// graph). Falls back to the direct `[from, to]` pair when either end is
/// outdoors or the rooms are not connected.
pub fn path_between(from: Location, to: Location) -> Vec<Location> {
    if from == to {
        return vec![from];
    }
    if !from.is_indoor() || !to.is_indoor() {
        return vec![from, to];
    }

    let mut visited = vec![from];
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(vec![from]);

    while let Some(path) = queue.pop_front() {
        let last = *path.last().expect("path is never empty");
        if last == to {
            return path;
        }
        for &next in last.connections() {
            if !visited.contains(&next) {
                visited.push(next);
                let mut extended = path.clone();
                extended.push(next);
                queue.push_back(extended);
            }
        }
    }

    vec![from, to]
}

/// Categorical time-of-day bucket, always derivable from the current
/// timestamp via a fixed hour table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    EarlyMorning,
    LateMorning,
    Afternoon,
    Evening,
    LateNight,
}

impl TimeOfDay {
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        match datetime.hour() {
            6..=8 => TimeOfDay::EarlyMorning,
            9..=11 => TimeOfDay::LateMorning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::LateNight,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TimeOfDay::EarlyMorning => "early morning",
            TimeOfDay::LateMorning => "late morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::LateNight => "late at night",
        }
    }

    pub fn is_nocturnal(&self) -> bool {
        matches!(self, TimeOfDay::LateNight | TimeOfDay::EarlyMorning)
    }
}

/// Which of the two inhabitants a mutation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Person {
    User,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldTime {
    pub current_datetime: DateTime<Utc>,
    pub days_into_stay: u32,
    pub time_of_day: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locations {
    pub user: Location,
    pub partner: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub description: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            started_at: None,
        }
    }

    pub fn starting_at(description: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            started_at: Some(at),
        }
    }
}

/// Per-person activities plus one optional shared activity. A set shared
/// activity always means both individual slots are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activities {
    pub user: Option<Activity>,
    pub partner: Option<Activity>,
    pub shared: Option<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub overall_tone: String,
    pub recent_key_moments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facts {
    pub shared: Vec<String>,
    pub partner_about_user: Vec<String>,
}

const RECENT_PLACES_CAP: usize = 5;

/// The simulation's ground truth for one world. Read and replaced
/// wholesale on every turn; never shared across worlds.
///
/// Every field carries a default so documents written by an older shape
/// deserialize cleanly, absent fields filled from the initial snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default = "default_time")]
    pub time: WorldTime,
    #[serde(default = "default_locations")]
    pub locations: Locations,
    #[serde(default = "default_activities")]
    pub activities: Activities,
    #[serde(default = "default_relationship")]
    pub relationship: Relationship,
    #[serde(default = "default_threads")]
    pub threads: Vec<String>,
    #[serde(default = "default_facts")]
    pub facts: Facts,
    #[serde(default = "default_recent_places")]
    pub recent_places: Vec<Location>,
    /// Serialized CharacterState, carried opaquely for persistence
    #[serde(default)]
    pub character_state: Option<String>,
}

fn simulation_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 8, 0, 0).unwrap()
}

fn default_time() -> WorldTime {
    let start = simulation_start();
    WorldTime {
        current_datetime: start,
        days_into_stay: 0,
        time_of_day: TimeOfDay::from_datetime(start),
    }
}

fn default_locations() -> Locations {
    Locations {
        user: Location::Kitchen,
        partner: Location::Kitchen,
    }
}

fn default_activities() -> Activities {
    Activities {
        user: None,
        partner: Some(Activity::new("making coffee")),
        shared: None,
    }
}

fn default_relationship() -> Relationship {
    Relationship {
        overall_tone: "warm, newly cohabiting, tentative and excited".to_string(),
        recent_key_moments: vec![
            "Elin just moved in with Daniel".to_string(),
            "They agreed to ten days off-grid to settle in together".to_string(),
        ],
    }
}

fn default_threads() -> Vec<String> {
    vec![
        "Elin settling into the house and its routines".to_string(),
        "Their first morning together in the shared home".to_string(),
        "The start of ten days off-grid together".to_string(),
    ]
}

fn default_facts() -> Facts {
    Facts {
        shared: vec![
            "The house is theirs, a brick terrace in Meanwood".to_string(),
            "Both have taken ten days off work".to_string(),
            "They agreed to stay mostly off-grid to focus on each other".to_string(),
            "Elin has just moved in".to_string(),
        ],
        partner_about_user: vec![
            "Daniel overthinks almost everything".to_string(),
            "Daniel plays piano late at night when he can't sleep".to_string(),
            "Daniel lived alone for a long time before Elin".to_string(),
            "Daniel has a younger sister he dotes on".to_string(),
        ],
    }
}

fn default_recent_places() -> Vec<Location> {
    vec![Location::Kitchen]
}

impl Default for WorldState {
    fn default() -> Self {
        Self::initial()
    }
}

impl WorldState {
    /// The fixed snapshot a world starts from: both in the kitchen at
    /// 08:00 on day zero, the partner making coffee.
    pub fn initial() -> Self {
        Self {
            time: default_time(),
            locations: default_locations(),
            activities: default_activities(),
            relationship: default_relationship(),
            threads: default_threads(),
            facts: default_facts(),
            recent_places: default_recent_places(),
            character_state: None,
        }
    }

    pub fn location_of(&self, person: Person) -> Location {
        match person {
            Person::User => self.locations.user,
            Person::Partner => self.locations.partner,
        }
    }

    pub fn together(&self) -> bool {
        self.locations.user == self.locations.partner
    }

    /// Move one person, recording the destination in `recent_places`.
    /// A location already on the list is left where it is.
    pub fn move_person(&mut self, person: Person, destination: Location) {
        match person {
            Person::User => self.locations.user = destination,
            Person::Partner => self.locations.partner = destination,
        }
        if !self.recent_places.contains(&destination) {
            self.recent_places.insert(0, destination);
            self.recent_places.truncate(RECENT_PLACES_CAP);
        }
    }

    pub fn move_together(&mut self, destination: Location) {
        self.move_person(Person::User, destination);
        self.move_person(Person::Partner, destination);
    }

    /// Advance the clock, rolling the day counter when the UTC date
    /// changes and recomputing the time-of-day bucket.
    pub fn advance_minutes(&mut self, minutes: i64) {
        let previous_day = self.time.current_datetime.day();
        self.time.current_datetime += Duration::minutes(minutes);
        if self.time.current_datetime.day() != previous_day {
            self.time.days_into_stay += 1;
        }
        self.normalize_time();
    }

    /// Re-derive `time_of_day` from the timestamp. Called after any
    /// mutation and after accepting an externally produced document, so
    /// the bucket can never drift from the clock.
    pub fn normalize_time(&mut self) {
        self.time.time_of_day = TimeOfDay::from_datetime(self.time.current_datetime);
    }

    /// Set a shared activity, clearing both individual slots
    pub fn set_shared_activity(&mut self, description: impl Into<String>) {
        self.activities = Activities {
            user: None,
            partner: None,
            shared: Some(Activity::starting_at(
                description,
                self.time.current_datetime,
            )),
        };
    }

    pub fn set_user_activity(&mut self, description: Option<String>) {
        self.activities.user = description
            .map(|d| Activity::starting_at(d, self.time.current_datetime));
    }

    pub fn set_partner_activity(&mut self, description: Option<String>) {
        self.activities.partner = description
            .map(|d| Activity::starting_at(d, self.time.current_datetime));
    }

    pub fn clear_activities(&mut self) {
        self.activities = Activities {
            user: None,
            partner: None,
            shared: None,
        };
    }

    /// Append to the append-only key-moment log
    pub fn push_key_moment(&mut self, moment: impl Into<String>) {
        self.relationship.recent_key_moments.push(moment.into());
    }

    /// Plain-text rendering of the document for diagnostics and the CLI
    pub fn world_context(&self, user_name: &str, partner_name: &str) -> String {
        let mut context = format!(
            "Current time: {} (Day {} of the stay)\n",
            self.time.time_of_day.description(),
            self.time.days_into_stay + 1
        );

        if self.together() {
            context.push_str(&format!(
                "Location: Both {} and {} are in {}.\n",
                user_name,
                partner_name,
                self.locations.user.display_name()
            ));
        } else {
            context.push_str(&format!(
                "{} is in {}. {} is in {}.\n",
                user_name,
                self.locations.user.display_name(),
                partner_name,
                self.locations.partner.display_name()
            ));
        }

        if let Some(shared) = &self.activities.shared {
            context.push_str(&format!(
                "Activity: They are {} together.\n",
                shared.description
            ));
        } else {
            if let Some(activity) = &self.activities.partner {
                context.push_str(&format!(
                    "{} is currently {}.\n",
                    partner_name, activity.description
                ));
            }
            if let Some(activity) = &self.activities.user {
                context.push_str(&format!(
                    "{} is currently {}.\n",
                    user_name, activity.description
                ));
            }
        }

        context.push_str(&format!(
            "Relationship tone: {}\n",
            self.relationship.overall_tone
        ));

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_hour_table() {
        let cases = [
            (6, TimeOfDay::EarlyMorning),
            (8, TimeOfDay::EarlyMorning),
            (9, TimeOfDay::LateMorning),
            (11, TimeOfDay::LateMorning),
            (12, TimeOfDay::Afternoon),
            (16, TimeOfDay::Afternoon),
            (17, TimeOfDay::Evening),
            (20, TimeOfDay::Evening),
            (21, TimeOfDay::LateNight),
            (23, TimeOfDay::LateNight),
            (0, TimeOfDay::LateNight),
            (5, TimeOfDay::LateNight),
        ];
        for (hour, expected) in cases {
            let dt = Utc.with_ymd_and_hms(2025, 5, 12, hour, 0, 0).unwrap();
            assert_eq!(TimeOfDay::from_datetime(dt), expected, "hour {}", hour);
        }
    }

    #[test]
    fn location_identifiers_round_trip() {
        let all = [
            Location::Kitchen,
            Location::Lounge,
            Location::Bedroom,
            Location::Hallway,
            Location::Bathroom,
            Location::Garden,
            Location::Cafe,
            Location::Park,
            Location::Street,
            Location::Shop,
        ];
        for location in all {
            let json = serde_json::to_string(&location).unwrap();
            assert_eq!(json, format!("\"{}\"", location.identifier()));
            let back: Location = serde_json::from_str(&json).unwrap();
            assert_eq!(back, location);
        }
    }

    #[test]
    fn indoor_outdoor_partition() {
        assert!(Location::Kitchen.is_indoor());
        assert!(Location::Garden.is_indoor());
        assert!(Location::Cafe.is_outdoor());
        assert!(Location::Park.is_outdoor());
    }

    #[test]
    fn adjacency_is_symmetric_across_the_graph() {
        let indoor = [
            Location::Kitchen,
            Location::Lounge,
            Location::Bedroom,
            Location::Hallway,
            Location::Bathroom,
            Location::Garden,
        ];
        for a in indoor {
            for &b in a.connections() {
                assert!(b.is_adjacent_to(a), "{:?} -> {:?} not symmetric", a, b);
            }
        }
        assert!(!Location::Bedroom.is_adjacent_to(Location::Kitchen));
    }

    #[test]
    fn path_between_rooms_uses_graph() {
        assert_eq!(
            path_between(Location::Bedroom, Location::Bathroom),
            vec![Location::Bedroom, Location::Hallway, Location::Bathroom]
        );
        assert_eq!(
            path_between(Location::Garden, Location::Garden),
            vec![Location::Garden]
        );
        // Outdoor ends fall back to the direct pair
        assert_eq!(
            path_between(Location::Kitchen, Location::Park),
            vec![Location::Kitchen, Location::Park]
        );
    }

    #[test]
    fn recent_places_keeps_five_distinct_newest_first() {
        let mut state = WorldState::initial();
        state.recent_places.clear();

        let visits = [
            Location::Kitchen,
            Location::Lounge,
            Location::Kitchen,
            Location::Bedroom,
            Location::Garden,
            Location::Park,
        ];
        for place in visits {
            state.move_person(Person::Partner, place);
        }

        assert_eq!(
            state.recent_places,
            vec![
                Location::Park,
                Location::Garden,
                Location::Bedroom,
                Location::Lounge,
                Location::Kitchen,
            ]
        );
    }

    #[test]
    fn recent_places_never_exceeds_cap() {
        let mut state = WorldState::initial();
        state.recent_places.clear();
        let visits = [
            Location::Kitchen,
            Location::Lounge,
            Location::Bedroom,
            Location::Garden,
            Location::Park,
            Location::Cafe,
            Location::Shop,
        ];
        for place in visits {
            state.move_person(Person::User, place);
        }
        assert_eq!(state.recent_places.len(), 5);
        assert_eq!(state.recent_places[0], Location::Shop);
    }

    #[test]
    fn shared_activity_clears_individual_slots() {
        let mut state = WorldState::initial();
        state.set_user_activity(Some("reading".to_string()));
        state.set_partner_activity(Some("cooking".to_string()));
        state.set_shared_activity("watching a film");

        assert!(state.activities.user.is_none());
        assert!(state.activities.partner.is_none());
        assert_eq!(
            state.activities.shared.as_ref().unwrap().description,
            "watching a film"
        );
    }

    #[test]
    fn advance_minutes_rolls_day_and_bucket() {
        let mut state = WorldState::initial();
        assert_eq!(state.time.time_of_day, TimeOfDay::EarlyMorning);

        state.advance_minutes(6 * 60);
        assert_eq!(state.time.time_of_day, TimeOfDay::Afternoon);
        assert_eq!(state.time.days_into_stay, 0);

        // 14:00 -> past midnight
        state.advance_minutes(11 * 60);
        assert_eq!(state.time.days_into_stay, 1);
        assert_eq!(state.time.time_of_day, TimeOfDay::LateNight);
    }

    #[test]
    fn older_document_shape_fills_defaults() {
        // A pre-activities document: only time, locations and relationship
        let old = serde_json::json!({
            "time": {
                "current_datetime": "2025-05-14T19:30:00Z",
                "days_into_stay": 2,
                "time_of_day": "evening"
            },
            "locations": { "user": "house:lounge", "partner": "house:lounge" },
            "relationship": {
                "overall_tone": "settled",
                "recent_key_moments": ["first argument, already repaired"]
            }
        });

        let state: WorldState = serde_json::from_value(old).unwrap();
        assert_eq!(state.time.days_into_stay, 2);
        assert_eq!(state.locations.user, Location::Lounge);
        assert_eq!(state.relationship.overall_tone, "settled");
        // Absent fields filled from the initial snapshot
        assert_eq!(
            state.activities.partner.as_ref().unwrap().description,
            "making coffee"
        );
        assert!(!state.facts.shared.is_empty());
        assert_eq!(state.recent_places, vec![Location::Kitchen]);
        assert!(state.character_state.is_none());
    }

    #[test]
    fn document_round_trips() {
        let mut state = WorldState::initial();
        state.push_key_moment("they cooked together for the first time");
        state.character_state = Some("{\"mood\":\"calm\"}".to_string());

        let json = serde_json::to_string(&state).unwrap();
        let back: WorldState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
