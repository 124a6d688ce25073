pub mod cleaner;
pub mod registry;
pub mod scan;
