//! Static, ordered stage definitions.
//!
//! The registry is validated once at construction and never changes at
//! runtime. Option labels and image references are opaque here: the
//! progression core only ever looks at how many options a stage has.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One pickable option of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOption {
    pub label: String,
    #[serde(default)]
    pub image_ref: String,
}

impl StageOption {
    pub fn new(label: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image_ref: image_ref.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    pub options: Vec<StageOption>,
}

impl StageDefinition {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, options: Vec<StageOption>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
        }
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

/// Validated, immutable list of stages in progression order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRegistry {
    stages: Vec<StageDefinition>,
}

impl StageRegistry {
    /// Build a registry from an ordered stage list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, a stage has no options, or two
    /// stages share an id.
    pub fn new(stages: Vec<StageDefinition>) -> Result<Self, ConfigError> {
        if stages.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if stage.options.is_empty() {
                return Err(ConfigError::EmptyOptions {
                    stage_id: stage.id.clone(),
                });
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(ConfigError::DuplicateStageId(stage.id.clone()));
            }
        }

        Ok(Self { stages })
    }

    /// The built-in five-stage date plan: coffee, walk, food, movie, gift.
    pub fn date_plan() -> Self {
        Self {
            stages: default_date_plan(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StageDefinition> {
        self.stages.get(index)
    }

    pub fn option_count(&self, index: usize) -> Option<usize> {
        self.get(index).map(StageDefinition::option_count)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    pub fn last_index(&self) -> usize {
        self.stages.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDefinition> {
        self.stages.iter()
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::date_plan()
    }
}

fn default_date_plan() -> Vec<StageDefinition> {
    vec![
        StageDefinition::new(
            "coffee",
            "Coffee time, pick the place:",
            vec![
                StageOption::new("Parcoffka", "images/coffee_parcoffka.jpg"),
                StageOption::new("Koryzia cafe", "images/coffee_koryzia.jpg"),
                StageOption::new("HIWAY bar", "images/coffee_hiway.jpg"),
                StageOption::new("Vilna Zona", "images/coffee_vilna_zona.jpg"),
            ],
        ),
        StageDefinition::new(
            "walk",
            "Fancy a walk? Pick the route:",
            vec![
                StageOption::new("Starov square", "images/walk_starov.jpg"),
                StageOption::new("Shevchenko park", "images/walk_shevchenko.jpg"),
                StageOption::new("Sich yacht club", "images/walk_yacht.jpg"),
                StageOption::new("Zelenyi Hai park", "images/walk_zelenyi_hai.jpg"),
            ],
        ),
        StageDefinition::new(
            "food",
            "Getting hungry, pick where we eat:",
            vec![
                StageOption::new("Buon Fratelli", "images/food_buon_fratelli.jpg"),
                StageOption::new("BROOKS eats & drinks", "images/food_brooks.jpg"),
                StageOption::new("Flip NEO", "images/food_flipneo.jpg"),
                StageOption::new("Giannivino", "images/food_giannivino.jpg"),
            ],
        ),
        StageDefinition::new(
            "movie",
            "Maybe a movie?",
            vec![
                StageOption::new("Sinners", "images/movie_sinners.jpg"),
                StageOption::new("Thunderbolts", "images/movie_thunderbolts.jpg"),
                StageOption::new("Minecraft", "images/movie_minecraft.jpg"),
            ],
        ),
        StageDefinition::new(
            "gift",
            "A small gift for your patience:",
            vec![
                StageOption::new("Flowers", "images/gift_flowers.jpg"),
                StageOption::new("Raffaello", "images/gift_raffaello.jpg"),
                StageOption::new("Keychain", "images/gift_keychain.jpg"),
                StageOption::new("Mini toy", "images/gift_toy.jpg"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_plan_has_five_stages() {
        let registry = StageRegistry::date_plan();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get(0).unwrap().id, "coffee");
        assert_eq!(registry.get(4).unwrap().id, "gift");
        assert_eq!(registry.option_count(3), Some(3));
        assert_eq!(registry.last_index(), 4);
    }

    #[test]
    fn date_plan_passes_validation() {
        let registry = StageRegistry::new(default_date_plan()).unwrap();
        assert_eq!(registry, StageRegistry::date_plan());
    }

    #[test]
    fn empty_option_list_is_rejected() {
        let result = StageRegistry::new(vec![
            StageDefinition::new("a", "", vec![StageOption::new("x", "")]),
            StageDefinition::new("b", "", vec![]),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::EmptyOptions { stage_id }) if stage_id == "b"
        ));
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(matches!(
            StageRegistry::new(Vec::new()),
            Err(ConfigError::EmptyRegistry)
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let opt = || vec![StageOption::new("x", "")];
        let result = StageRegistry::new(vec![
            StageDefinition::new("same", "", opt()),
            StageDefinition::new("same", "", opt()),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateStageId(id)) if id == "same"));
    }

    #[test]
    fn index_of_finds_stage() {
        let registry = StageRegistry::date_plan();
        assert_eq!(registry.index_of("food"), Some(2));
        assert_eq!(registry.index_of("bowling"), None);
    }
}
