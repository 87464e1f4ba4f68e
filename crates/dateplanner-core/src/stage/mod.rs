mod randomizer;
mod registry;

pub use randomizer::{Randomizer, PcgRandomizer};
pub use registry::{StageDefinition, StageOption, StageRegistry};
