//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

/// The entity classes served by the cache layer.
///
/// Each class gets its own key namespace, policy, and default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Entries,
    Globals,
    Fieldsets,
}

impl EntityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityClass::Entries => "entries",
            EntityClass::Globals => "globals",
            EntityClass::Fieldsets => "fieldsets",
        }
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityClass {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "entries" => Ok(EntityClass::Entries),
            "globals" => Ok(EntityClass::Globals),
            "fieldsets" => Ok(EntityClass::Fieldsets),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_round_trips() {
        for class in [
            EntityClass::Entries,
            EntityClass::Globals,
            EntityClass::Fieldsets,
        ] {
            assert_eq!(EntityClass::try_from(class.as_str()), Ok(class));
        }
    }

    #[test]
    fn unknown_class_is_rejected() {
        assert!(EntityClass::try_from("assets").is_err());
    }
}
