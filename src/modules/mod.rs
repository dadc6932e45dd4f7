pub mod checks;
pub mod descriptor;
pub mod detector;
pub mod signal_extractor;
pub mod state_machine;
