use std::path::PathBuf;

/// Directory name used under the platform config directory
pub const APP_DIR: &str = "vk-auth";

/// Gets the default configuration file path.
/// - Linux: ~/.config/vk-auth/config.toml
/// - macOS: ~/Library/Application Support/vk-auth/config.toml
/// - Windows: %APPDATA%/vk-auth/config.toml
pub fn get_config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_layout() {
        if let Some(path) = get_config_path() {
            assert!(path.ends_with("vk-auth/config.toml"));
        }
    }
}
