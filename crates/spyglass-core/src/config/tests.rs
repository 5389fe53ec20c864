use std::path::{Path, PathBuf};

use super::*;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();

    assert_eq!(config.highlight.color, "#000000");
    assert!(config.inject.enabled);
    assert_eq!(config.inject.library, None);
    assert!(!config.logging.enabled);
}

#[test]
fn partial_toml_uses_defaults_for_missing_sections() {
    // Arrange
    let toml_str = "[inject]\nenabled = false\n";

    // Act
    let config = loader::parse(toml_str).unwrap();

    // Assert
    assert!(!config.inject.enabled);
    assert_eq!(config.highlight, HighlightConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn invalid_highlight_color_falls_back_to_black() {
    // Arrange
    let mut config = Config {
        highlight: HighlightConfig {
            color: "magenta-ish".into(),
        },
        ..Default::default()
    };

    // Act
    config.validate();

    // Assert
    assert_eq!(config.highlight.color, "#000000");
    assert_eq!(config.highlight.pen_color(), Color::BLACK);
}

#[test]
fn unknown_log_level_falls_back_to_info() {
    let config = loader::parse("[logging]\nenabled = true\nlevel = \"chatty\"\n").unwrap();

    assert_eq!(config.logging.level, "info");
    assert!(config.logging.enabled);
}

#[test]
fn custom_highlight_color_is_kept() {
    let config = loader::parse("[highlight]\ncolor = \"#ff0000\"\n").unwrap();

    assert_eq!(
        config.highlight.pen_color(),
        Color { r: 0xFF, g: 0, b: 0 }
    );
}

#[test]
fn default_library_sits_next_to_executable() {
    let inject = InjectConfig::default();

    let path = inject.library_path(Path::new("/opt/spyglass"));

    assert_eq!(path, Path::new("/opt/spyglass").join(DEFAULT_LIBRARY));
}

#[test]
fn relative_library_resolves_against_executable_dir() {
    let inject = InjectConfig {
        library: Some(PathBuf::from("probes/custom.dll")),
        ..Default::default()
    };

    let path = inject.library_path(Path::new("/opt/spyglass"));

    assert_eq!(path, Path::new("/opt/spyglass/probes/custom.dll"));
}

#[test]
fn absolute_library_is_used_verbatim() {
    // Arrange
    let absolute = std::env::temp_dir().join("probe.dll");
    let inject = InjectConfig {
        library: Some(absolute.clone()),
        ..Default::default()
    };

    // Act
    let path = inject.library_path(Path::new("/opt/spyglass"));

    // Assert
    assert_eq!(path, absolute);
}

#[test]
fn empty_library_is_treated_as_unset() {
    let config = loader::parse("[inject]\nlibrary = \"\"\n").unwrap();

    assert_eq!(config.inject.library, None);
}

#[test]
fn log_size_is_clamped() {
    let config = loader::parse("[logging]\nmax_file_mb = 0\n").unwrap();

    assert_eq!(config.logging.max_file_mb, 1);
}

#[test]
fn unknown_field_types_are_rejected() {
    let result = loader::parse("[inject]\nenabled = \"yes\"\n");

    assert!(result.is_err());
}
