pub mod builder;
pub mod connectors;
pub mod controller;
pub mod graph;
pub mod protocol;
pub mod step;
pub mod steps;

pub use builder::build_steps;
pub use controller::{WizardController, WizardFrame};
pub use protocol::{AdvanceOutcome, HostCallbacks};
