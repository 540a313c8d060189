pub mod audio;
pub mod icons;

pub use audio::RodioBackend;
pub use icons::{IconCatalog, IconOrigin};
