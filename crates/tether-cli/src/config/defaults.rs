use std::path::PathBuf;

/// Host bound when the config names none or says `localhost`.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Advisory port; negotiation may move off it.
pub const DEFAULT_PORT: u16 = 8080;

pub const CONFIG_FILE_NAMES: [&str; 2] = ["tether.config.toml", "tether.config.json"];

pub fn default_entry() -> Vec<PathBuf> {
    vec![PathBuf::from("src/index.js")]
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("www")
}

pub fn default_static_dir() -> PathBuf {
    PathBuf::from("www")
}
