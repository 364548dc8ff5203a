pub mod console;
pub mod coordinator;
pub mod registry;

pub use console::ConsoleCollector;
pub use coordinator::{OutcomeCollector, ResumeMode, TournamentCoordinator, TournamentDraft};
pub use registry::PlayerRegistry;
