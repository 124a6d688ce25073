pub mod algo;
pub mod error;
pub mod ops;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "lsp")]
pub mod lsp;

#[cfg(feature = "plugin")]
pub mod commands;

pub use algo::cleaner::{CleanOutcome, CleanResult, Cleaner};
pub use algo::registry::{PlatformSpec, Registry};
pub use error::{CleanError, RegistryError};

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

/// Nushell plugin. Owns the cleaner every command runs against.
#[cfg(feature = "plugin")]
pub struct SocialCleanPlugin {
    pub cleaner: Cleaner,
}

#[cfg(feature = "plugin")]
impl SocialCleanPlugin {
    pub fn new(registry: Registry) -> Self {
        Self {
            cleaner: Cleaner::new(registry),
        }
    }
}

#[cfg(feature = "plugin")]
impl Default for SocialCleanPlugin {
    fn default() -> Self {
        Self::new(Registry::discover())
    }
}

#[cfg(feature = "plugin")]
impl Plugin for SocialCleanPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::CleanUrl),
            Box::new(commands::Clean),
            Box::new(commands::CleanText),
            Box::new(commands::Platforms),
        ]
    }
}
