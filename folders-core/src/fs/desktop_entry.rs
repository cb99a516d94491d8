//! src/fs/desktop_entry.rs
//! ============================================================================
//! # DesktopEntryReader: Shortcut-File Metadata Overlay
//!
//! Parses `.desktop`-style shortcut files (flat key/value lines inside a
//! `[Desktop Entry]` section) and overlays the two fields this engine
//! consumes onto an already-resolved [`IconRecord`]: a localized `Name`
//! replacing the display name, and an `Icon` theme identifier resolved to a
//! glyph path.
//!
//! Parse failures are non-fatal: the record keeps its resolver defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::AppError;
use crate::fs::icon_record::IconRecord;
use crate::fs::icon_theme::IconTheme;

/// Whether this path names a shortcut file at all.
pub fn is_shortcut(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("desktop")
}

/// Fields extracted from one shortcut file.
#[derive(Debug, Default, PartialEq, Eq)]
struct ShortcutMeta {
    name: Option<String>,
    icon: Option<String>,
}

/// Overlay shortcut metadata onto `record`. Returns `false` (after a log
/// line) when the file is unreadable or malformed; the record is untouched
/// in that case.
pub fn apply_shortcut(path: &Path, record: &mut IconRecord, theme: &IconTheme) -> bool {
    let meta = match load(path) {
        Ok(meta) => meta,
        Err(e) => {
            warn!("Failed to parse shortcut file: {e}");
            return false;
        }
    };

    if let Some(name) = meta.name {
        record.name = name.into();
    }

    // The Icon key is a theme identifier, not a raw path; only a successful
    // theme lookup overwrites the glyph.
    if let Some(icon) = meta.icon
        && let Some(resolved) = theme.resolve(&icon)
    {
        record.glyph_path = Some(resolved);
    }

    true
}

fn load(path: &Path) -> Result<ShortcutMeta, AppError> {
    let content = fs::read_to_string(path).map_err(|e| AppError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let entries = parse_desktop_section(&content);
    if entries.is_empty() {
        return Err(AppError::Parse {
            path: path.to_path_buf(),
            reason: "no [Desktop Entry] section".into(),
        });
    }

    Ok(ShortcutMeta {
        name: localized_name(&entries, current_locale().as_deref()),
        icon: entries.get("Icon").cloned(),
    })
}

/// Parse the flat key/value lines of the `[Desktop Entry]` section.
/// Comments and blank lines are skipped; other sections are ignored.
fn parse_desktop_section(content: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            continue;
        }

        if in_desktop_entry
            && let Some((key, value)) = line.split_once('=')
        {
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    entries
}

/// The `Name` key, preferring the locale-qualified variants: `Name[ll_CC]`,
/// then `Name[ll]`, then plain `Name`.
fn localized_name(entries: &HashMap<String, String>, locale: Option<&str>) -> Option<String> {
    if let Some(locale) = locale {
        if let Some(name) = entries.get(&format!("Name[{locale}]")) {
            return Some(name.clone());
        }

        if let Some((lang, _)) = locale.split_once('_')
            && let Some(name) = entries.get(&format!("Name[{lang}]"))
        {
            return Some(name.clone());
        }
    }

    entries.get("Name").cloned()
}

/// Message locale from the environment (`ll_CC` form, encoding stripped).
fn current_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
        .map(|v| v.split('.').next().unwrap_or(&v).to_string())
}
