// Application layer - Use case interactors

pub mod container;
pub mod gap_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use gap_interactor::{
    FileOutcome, GapInteractor, InteractorSettings, RunMode, RunSummary, ScanResult,
};
