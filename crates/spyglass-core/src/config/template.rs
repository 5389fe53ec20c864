/// Generates the default `config.toml` contents with explanatory comments.
///
/// This is used by `spyglass init` to create a starter config file that
/// users can immediately edit.
pub fn generate_config() -> String {
    r##"# Spyglass configuration
# Location: ~/.config/spyglass/config.toml

[highlight]
# Pen color of the border drawn on the window under the finder (hex).
color = "#000000"

[inject]
# Load and immediately unload the companion library in every foreign
# process whose window the finder passes over.
enabled = true
# Companion library path. Relative paths are resolved next to the
# spyglass executable. Defaults to "spyglass_probe.dll".
# library = "C:\\tools\\spyglass_probe.dll"

[logging]
# Enable file logging to ~/.config/spyglass/logs/spyglass.log.
enabled = false
# Minimum log level: "debug", "info", "warn", or "error".
level = "info"
# Maximum log file size in MB before rotation.
max_file_mb = 10
"##
    .to_string()
}
