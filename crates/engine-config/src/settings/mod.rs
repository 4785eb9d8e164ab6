pub mod command;
pub mod env;
pub mod error;
pub mod scan;

pub use command::CommandSettings;
pub use env::EnvSettings;
pub use scan::{ScanSettings, ScanSettingsBuilder};
