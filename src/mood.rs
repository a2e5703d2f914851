//! Mood value model: the two persisted record shapes and their
//! normalization onto the 0-10 scale.

/// Categorical mood label used by older records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyMood {
    Good,
    Neutral,
    Bad,
}

impl LegacyMood {
    /// Parse a stored label. Recognizes exactly `good`, `neutral`, `bad`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "good" => Some(LegacyMood::Good),
            "neutral" => Some(LegacyMood::Neutral),
            "bad" => Some(LegacyMood::Bad),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyMood::Good => "good",
            LegacyMood::Neutral => "neutral",
            LegacyMood::Bad => "bad",
        }
    }
}

/// A mood reading as persisted. Old categorical records and new numeric
/// records coexist indefinitely; `Unknown` covers rows carrying neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodValue {
    /// 0-10 rating from the inline scale.
    Numeric(u8),
    /// good/neutral/bad label written by the old schema.
    Legacy(LegacyMood),
    /// Empty or unrecognized record; reads as neutral.
    Unknown,
}

impl MoodValue {
    /// Decode the stored column pair. A numeric score takes priority over a
    /// label; an out-of-range score or unrecognized label becomes `Unknown`.
    pub fn from_fields(score: Option<i64>, label: Option<&str>) -> Self {
        if let Some(n) = score {
            return match u8::try_from(n) {
                Ok(n) if n <= 10 => MoodValue::Numeric(n),
                _ => MoodValue::Unknown,
            };
        }
        match label.and_then(LegacyMood::parse) {
            Some(legacy) => MoodValue::Legacy(legacy),
            None => MoodValue::Unknown,
        }
    }

    /// Column pair (score, label) for persistence.
    pub fn to_fields(&self) -> (Option<i64>, Option<&'static str>) {
        match self {
            MoodValue::Numeric(n) => (Some(*n as i64), None),
            MoodValue::Legacy(legacy) => (None, Some(legacy.as_str())),
            MoodValue::Unknown => (None, None),
        }
    }

    /// Project onto the 0-10 scale: good=8, neutral=5, bad=2, unknown=5.
    pub fn normalize(&self) -> u8 {
        match self {
            MoodValue::Numeric(n) => *n,
            MoodValue::Legacy(LegacyMood::Good) => 8,
            MoodValue::Legacy(LegacyMood::Neutral) => 5,
            MoodValue::Legacy(LegacyMood::Bad) => 2,
            MoodValue::Unknown => 5,
        }
    }
}

/// Score band used for the weekly distribution and the confirmation emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Low,
    Mid,
    High,
}

impl Bucket {
    /// Band for a normalized score: 0-3 low, 4-6 mid, 7-10 high.
    pub fn of(score: u8) -> Self {
        match score {
            0..=3 => Bucket::Low,
            4..=6 => Bucket::Mid,
            _ => Bucket::High,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Bucket::Low => "😞",
            Bucket::Mid => "😐",
            Bucket::High => "😊",
        }
    }
}

/// One persisted mood reading.
#[derive(Debug, Clone)]
pub struct MoodEntry {
    #[allow(dead_code)]
    pub id: i64,
    #[allow(dead_code)]
    pub user_id: i64,
    pub value: MoodValue,
    /// UTC, `%Y-%m-%d %H:%M:%S`.
    #[allow(dead_code)]
    pub timestamp: String,
}
