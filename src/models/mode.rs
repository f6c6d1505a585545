use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Selects which prompt template the relay places in front of user text.
///
/// On the wire a mode is a short key (`default`, `a`, `b`, `c`). Any key the
/// relay does not recognise resolves to [`Mode::Default`], the same as
/// sending no mode at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Default,
    Quick,
    Sectioned,
    Chat,
}

impl Mode {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "a" | "quick" => Mode::Quick,
            "b" | "sectioned" => Mode::Sectioned,
            "c" | "chat" => Mode::Chat,
            _ => Mode::Default,
        }
    }

    /// Resolves an optional wire key; absence and unknown keys are equivalent.
    pub fn resolve(key: Option<&str>) -> Self {
        key.map(Self::from_key).unwrap_or_default()
    }

    pub fn wire_key(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Quick => "a",
            Mode::Sectioned => "b",
            Mode::Chat => "c",
        }
    }

    /// Environment variable holding this mode's template.
    pub fn env_var(&self) -> &'static str {
        match self {
            Mode::Default => "DEFAULT",
            Mode::Quick => "SUMMARY_PROMPT",
            Mode::Sectioned => "SECTION_WISE_SUMMARY_PROMPT",
            Mode::Chat => "CHATBOT",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_key())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Mode::from_key(&key))
    }
}
