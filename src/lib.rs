pub mod app;
pub mod assets;
pub mod logging;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod sound;
pub mod trigger;
