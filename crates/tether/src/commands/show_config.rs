use tether_core::config::{self, Config};

/// Prints where the configuration file lives and the settings in effect.
pub fn execute(config: &Config) -> i32 {
    match config::config_path() {
        Some(path) if path.exists() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not found, using defaults)", path.display()),
        None => println!("# no home directory, using defaults"),
    }

    match toml::to_string_pretty(config) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("Error: could not serialize configuration: {e}");
            1
        }
    }
}
