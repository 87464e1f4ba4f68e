//! Summary of confirmed choices, in stage order.

use serde::{Deserialize, Serialize};

use super::snapshot::ProgressionSnapshot;
use crate::stage::StageRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryEntry {
    pub stage_index: usize,
    pub stage_id: String,
    pub prompt: String,
    pub option_index: usize,
    pub label: String,
    pub image_ref: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub entries: Vec<ItineraryEntry>,
    pub complete: bool,
}

impl Itinerary {
    pub fn from_progress(registry: &StageRegistry, snapshot: &ProgressionSnapshot) -> Self {
        let entries = snapshot
            .stages
            .iter()
            .enumerate()
            .filter(|(_, progress)| progress.confirmed)
            .filter_map(|(stage_index, progress)| {
                let stage = registry.get(stage_index)?;
                let option_index = progress.selected_index?;
                let option = stage.options.get(option_index)?;
                Some(ItineraryEntry {
                    stage_index,
                    stage_id: stage.id.clone(),
                    prompt: stage.prompt.clone(),
                    option_index,
                    label: option.label.clone(),
                    image_ref: option.image_ref.clone(),
                })
            })
            .collect::<Vec<_>>();

        Self {
            complete: entries.len() == registry.len(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_confirmed_stages() {
        let registry = StageRegistry::date_plan();
        let mut snap = ProgressionSnapshot::new("u", registry.len());
        snap.stages[0].selected_index = Some(0);
        snap.stages[0].confirmed = true;
        snap.stages[1].selected_index = Some(2);

        let itinerary = Itinerary::from_progress(&registry, &snap);
        assert_eq!(itinerary.entries.len(), 1);
        assert_eq!(itinerary.entries[0].stage_id, "coffee");
        assert_eq!(itinerary.entries[0].label, "Parcoffka");
        assert!(!itinerary.complete);
    }

    #[test]
    fn empty_when_nothing_confirmed() {
        let registry = StageRegistry::date_plan();
        let snap = ProgressionSnapshot::new("u", registry.len());
        assert!(Itinerary::from_progress(&registry, &snap).is_empty());
    }
}
