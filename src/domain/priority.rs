//! Priority classes for task scheduling

use serde::{Deserialize, Serialize};

/// Priority class for a scheduled task.
///
/// Exactly four levels, ordered highest-precedence first: render threads,
/// then auxiliary game threads, then everything else. Dispatch drains the
/// ready queues in this order, so `Render < GameOther < Normal < Background`
/// in the derived ordering (lower value = dispatched first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    /// Highest: main render threads
    Render = 0,
    /// Secondary game threads
    #[serde(rename = "game")]
    GameOther = 1,
    /// Regular system tasks (the default for unregistered tasks)
    #[default]
    Normal = 2,
    /// Low priority background work
    Background = 3,
}

impl PriorityClass {
    /// All classes in dispatch order (highest precedence first).
    pub const LEVELS: [PriorityClass; 4] = [
        PriorityClass::Render,
        PriorityClass::GameOther,
        PriorityClass::Normal,
        PriorityClass::Background,
    ];

    /// Queue index for this class (0 = highest precedence).
    pub fn level(self) -> usize {
        self as usize
    }

    /// Whether this is one of the two game classes.
    ///
    /// Game classes are counted separately in the dispatch statistics and
    /// are permitted to run on isolated CPUs.
    pub fn is_game(self) -> bool {
        matches!(self, Self::Render | Self::GameOther)
    }
}

impl std::fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render => write!(f, "render"),
            Self::GameOther => write!(f, "game"),
            Self::Normal => write!(f, "normal"),
            Self::Background => write!(f, "background"),
        }
    }
}

impl std::str::FromStr for PriorityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "render" => Ok(Self::Render),
            "game" => Ok(Self::GameOther),
            "normal" => Ok(Self::Normal),
            "background" => Ok(Self::Background),
            _ => Err(format!("Unknown priority: {} (use 'render' or 'game')", s)),
        }
    }
}
