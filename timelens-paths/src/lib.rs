//! XDG Base Directory paths for timelens.
//!
//! The CLI keeps its config and saved images under XDG paths on every
//! platform, the same way gh or kubectl do.

use std::path::PathBuf;

const APP_DIR: &str = "timelens";

/// Get the timelens config directory.
///
/// Returns `$XDG_CONFIG_HOME/timelens` if set, otherwise `~/.config/timelens`.
///
/// # Examples
///
/// ```
/// use timelens_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the timelens data directory.
///
/// Returns `$XDG_DATA_HOME/timelens` if set, otherwise `~/.local/share/timelens`.
/// Generated images land in `images/` below it unless configured otherwise.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Default directory for images saved by `timelens generate --save`.
pub fn images_dir() -> PathBuf {
    data_dir().join("images")
}

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(base) = std::env::var(env_var)
        && !base.is_empty()
    {
        PathBuf::from(base).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn config_dir_ends_with_app_name() {
        assert!(config_dir().ends_with("timelens"));
    }

    #[test]
    #[serial]
    fn config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
        assert_eq!(path, PathBuf::from("/tmp/test-config/timelens"));
    }

    #[test]
    #[serial]
    fn empty_xdg_value_falls_back_to_home() {
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "");
        }
        let path = data_dir();
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
        assert!(path.ends_with(".local/share/timelens"));
    }

    #[test]
    #[serial]
    fn images_dir_is_below_data_dir() {
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        let path = images_dir();
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
        assert_eq!(path, PathBuf::from("/tmp/test-data/timelens/images"));
    }
}
