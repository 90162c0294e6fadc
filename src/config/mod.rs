//! Configuration loaded from `<data_dir>/eggcarton.toml`.

pub mod settings;

pub use settings::Settings;
