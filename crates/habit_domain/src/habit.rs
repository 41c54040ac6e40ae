use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A recurring habit as configured by the user. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitDefinition {
    pub name: String,
    pub template_id: String,
    #[serde(default)]
    pub frequency: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl HabitDefinition {
    pub fn new(
        name: impl Into<String>,
        template_id: impl Into<String>,
        frequency: &[&str],
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            template_id: template_id.into(),
            frequency: frequency.iter().map(|token| token.to_string()).collect(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Effective weekday set after normalizing the raw tokens.
    pub fn schedule(&self) -> Frequency {
        Frequency::from_tokens(self.frequency.as_slice())
    }

    /// Tokens that did not name a weekday and are therefore ignored.
    pub fn invalid_frequency_tokens(&self) -> Vec<&str> {
        self.frequency
            .iter()
            .map(|token| token.as_str())
            .filter(|token| parse_weekday_token(token).is_none())
            .collect()
    }
}

/// Set of weekdays on which a habit recurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Frequency {
    bits: u8,
}

impl Frequency {
    pub const EMPTY: Frequency = Frequency { bits: 0 };
    pub const DAILY: Frequency = Frequency { bits: 0b111_1111 };
    pub const WEEKDAYS: Frequency = Frequency { bits: 0b001_1111 };
    pub const WEEKENDS: Frequency = Frequency { bits: 0b110_0000 };

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        tokens
            .iter()
            .filter_map(|token| parse_weekday_token(token.as_ref()))
            .collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.bits |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.bits & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Scheduled days, Monday first.
    pub fn days(&self) -> Vec<Weekday> {
        ALL_WEEKDAYS
            .iter()
            .copied()
            .filter(|day| self.contains(*day))
            .collect()
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

impl FromIterator<Weekday> for Frequency {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut frequency = Frequency::EMPTY;
        for day in iter {
            frequency.insert(day);
        }
        frequency
    }
}

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Parses a full English weekday name, ignoring case and surrounding whitespace.
pub fn parse_weekday_token(token: &str) -> Option<Weekday> {
    let normalized = token.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_case_insensitive_and_deduplicated() {
        let frequency = Frequency::from_tokens(&["Monday", "MONDAY", " friday ", "funday"]);
        assert_eq!(frequency.len(), 2);
        assert_eq!(frequency.days(), vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn invalid_tokens_are_reported_but_inert() {
        let habit = HabitDefinition::new("Read", "tpl", &["mon", "Tuesday"], "07:00", "08:00");
        assert_eq!(habit.invalid_frequency_tokens(), vec!["mon"]);
        assert_eq!(habit.schedule().days(), vec![Weekday::Tue]);
    }

    #[test]
    fn deserializes_camel_case_and_defaults_enabled() {
        let raw = r#"{
            "name": "Stretch",
            "templateId": "abc123",
            "frequency": ["saturday", "sunday"],
            "startTime": "9:15",
            "endTime": "09:45"
        }"#;
        let habit: HabitDefinition = serde_json::from_str(raw).expect("habit parses");
        assert!(habit.enabled);
        assert_eq!(habit.template_id, "abc123");
        assert_eq!(habit.schedule(), Frequency::WEEKENDS);
    }

    #[test]
    fn named_sets_match_their_days() {
        assert_eq!(Frequency::DAILY.days(), ALL_WEEKDAYS.to_vec());
        assert_eq!(
            Frequency::from_tokens(&["monday", "tuesday", "wednesday", "thursday", "friday"]),
            Frequency::WEEKDAYS
        );
        assert!(Frequency::EMPTY.is_empty());
    }
}
