//! Common constants used throughout qmatch-core.
//!
//! This module centralizes paths, file names, and the built-in knowledge pack
//! so the CLI and the engine agree on where things live.

// ============================================================================
// Directory & File Names
// ============================================================================

/// The name of the global qmatch configuration directory.
///
/// Located at `~/.qmatch/` on Unix-like systems.
pub const QMATCH_HOME_DIR: &str = ".qmatch";

/// The global configuration file name (inside [`QMATCH_HOME_DIR`]).
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

/// File extensions accepted for knowledge packs loaded from disk.
///
/// `.json` is parsed with serde_json, `.yaml`/`.yml` with serde_yaml.
pub const PACK_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

// ============================================================================
// Built-in Knowledge Pack
// ============================================================================

/// Display name used for the compiled-in knowledge pack.
pub const BUILTIN_PACK_NAME: &str = "builtin:portfolio";

/// The compiled-in knowledge pack (portfolio FAQ).
pub const BUILTIN_PACK_JSON: &str = include_str!("../data/portfolio.json");

// ============================================================================
// Placeholders
// ============================================================================

/// Placeholder replaced by the contact address in fallback templates.
pub const CONTACT_PLACEHOLDER: &str = "{contact}";

/// Placeholder replaced by a random example prompt in the generic fallback.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Returns true if `ext` (without the dot) is an accepted knowledge pack extension.
pub fn is_pack_extension(ext: &str) -> bool {
    let lower = ext.to_lowercase();
    PACK_EXTENSIONS.contains(&lower.as_str())
}
