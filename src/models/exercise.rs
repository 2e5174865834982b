use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTRUCTIONS: &str = "Custom Exercise";
pub const DEFAULT_CATEGORY: &str = "Custom";

/// An exercise in the library.
///
/// Names are unique case-insensitively; both backends reject a duplicate
/// before writing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscle: String,
    pub instructions: String,
    pub difficulty: Difficulty,
    pub category: String,
}

/// Difficulty ordinal, 1 (easiest) to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Clamps into the 1..=5 range.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Parses a stored value. Unparsable text reads as the lowest difficulty.
    pub fn from_str(s: &str) -> Self {
        s.trim()
            .parse::<f64>()
            .map(|v| Self::new(v as i64))
            .unwrap_or_default()
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

/// Input for creating a custom exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExerciseInput {
    pub name: String,
    pub muscle: String,
    /// Defaults to "Custom Exercise".
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    /// Defaults to "Custom".
    #[serde(default)]
    pub category: Option<String>,
}

impl CreateExerciseInput {
    pub fn new(name: impl Into<String>, muscle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            muscle: muscle.into(),
            instructions: None,
            difficulty: None,
            category: None,
        }
    }
}

/// A fully resolved exercise row awaiting an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub muscle: String,
    pub instructions: String,
    pub difficulty: Difficulty,
    pub category: String,
}

impl NewExercise {
    pub fn with_id(self, id: i64) -> Exercise {
        Exercise {
            id,
            name: self.name,
            muscle: self.muscle,
            instructions: self.instructions,
            difficulty: self.difficulty,
            category: self.category,
        }
    }
}

impl From<CreateExerciseInput> for NewExercise {
    fn from(input: CreateExerciseInput) -> Self {
        Self {
            name: input.name,
            muscle: input.muscle,
            instructions: input
                .instructions
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            difficulty: input.difficulty.map(Difficulty::new).unwrap_or_default(),
            category: input.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

/// Case-insensitive name comparison used for uniqueness and seeding lookups.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
