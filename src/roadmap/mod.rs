//! Roadmaps: the learning path catalog, generation from it, the completion
//! state machine and career path switching.

pub mod career;
pub mod catalog;
pub mod generator;
pub mod progression;

pub use career::{career_paths, CareerPath, CareerPathService};
pub use catalog::{Catalog, CatalogStep, DifficultyLevel};
pub use generator::{ReplacedRoadmap, RoadmapGenerator, REPLACEMENT_DIFFICULTY};
pub use progression::{CompletionResult, ProgressionService, Reconciled, SkipReason};
