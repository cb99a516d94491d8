//! src/fs/icon_theme.rs
//! ============================================================================
//! # IconTheme: Glyph Lookup at a Fixed Pixel Size
//!
//! Indexes the icon directories once and resolves theme-relative icon
//! identifiers (e.g. `"folder"`, `"firefox"`) to image paths. Lookups prefer
//! images found under a `<size>x<size>` theme directory matching the target
//! pixel size; any other hit is kept as a fallback.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "svg", "xpm", "webp"];

/// An indexed icon entry: resolved path plus whether it came from a
/// directory matching the target pixel size.
struct IndexedIcon {
    path: PathBuf,
    size_matched: bool,
}

/// Handles icon lookups across the standard icon directories.
pub struct IconTheme {
    pixel_size: u32,
    /// Icon name (lowercase, no extension) -> indexed entry.
    index: RwLock<HashMap<String, IndexedIcon>>,
}

impl IconTheme {
    pub fn new(pixel_size: u32) -> Self {
        Self {
            pixel_size,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Build the index from the standard icon search roots.
    pub fn build_index(&self) {
        let search_dirs = Self::search_directories();
        debug!("Indexing {} icon directories", search_dirs.len());
        self.build_index_from(&search_dirs);
    }

    /// Build the index from explicit roots. First match wins per name unless
    /// a later hit is size-matched and the earlier one was not.
    pub fn build_index_from(&self, search_dirs: &[PathBuf]) {
        let mut index: HashMap<String, IndexedIcon> = HashMap::new();
        let allowed: HashSet<&str> = ALLOWED_EXTENSIONS.into_iter().collect();
        let size_component = format!("{0}x{0}", self.pixel_size);

        for dir_path in search_dirs {
            if !dir_path.exists() {
                continue;
            }

            let walker = walkdir::WalkDir::new(dir_path)
                .follow_links(true)
                .max_depth(10);

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                    continue;
                }

                let path = entry.path();
                let ext = match path.extension().and_then(|e| e.to_str()) {
                    Some(e) => e.to_lowercase(),
                    None => continue,
                };

                if !allowed.contains(ext.as_str()) {
                    continue;
                }

                let stem = match path.file_stem().and_then(|s| s.to_str()) {
                    Some(s) => s.to_lowercase(),
                    None => continue,
                };

                let size_matched = path
                    .components()
                    .any(|c| c.as_os_str().to_str() == Some(size_component.as_str()));

                match index.get(&stem) {
                    Some(existing) if existing.size_matched || !size_matched => {}
                    _ => {
                        index.insert(
                            stem,
                            IndexedIcon {
                                path: path.to_path_buf(),
                                size_matched,
                            },
                        );
                    }
                }
            }
        }

        *self.index.write().expect("icon index poisoned") = index;
    }

    /// Resolve an icon identifier to an image path.
    ///
    /// Absolute identifiers bypass the theme search (a shortcut file may
    /// carry a raw path). Otherwise the lookup tries the identifier as-is,
    /// then common separator variations.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        if Path::new(name).is_absolute() {
            let path = PathBuf::from(name);
            if path.exists() {
                return Some(path);
            }
        }

        let index = self.index.read().expect("icon index poisoned");
        let name_lower = name.to_lowercase();

        if let Some(hit) = index.get(&name_lower) {
            return Some(hit.path.clone());
        }

        // Separator variations (e.g. "my icon" -> "my-icon")
        let variations = [name_lower.replace(' ', "-"), name_lower.replace('_', "-")];

        for variant in &variations {
            if let Some(hit) = index.get(variant) {
                return Some(hit.path.clone());
            }
        }

        None
    }

    /// The standard icon search roots: `~/.icons`, XDG data icon dirs, and
    /// the shared pixmaps directory.
    fn search_directories() -> Vec<PathBuf> {
        let mut result = Vec::new();

        if let Some(base) = directories::BaseDirs::new() {
            result.push(base.home_dir().join(".icons"));
            result.push(base.data_dir().join("icons"));
        }

        result.push(PathBuf::from("/usr/local/share/icons"));
        result.push(PathBuf::from("/usr/share/icons"));
        result.push(PathBuf::from("/usr/share/pixmaps"));

        result
    }
}
