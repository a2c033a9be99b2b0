//! In-place edits of flat configuration files.
//!
//! A file is read fully into a [`PropertiesDocument`], edited in memory and
//! written back whole through a temporary sibling and a rename. Lines that an
//! edit does not touch are kept byte-for-byte, comments and blanks included.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use forage_config::ROOT_TOKEN;
use forage_config::properties::{PropertyLine, parse_line};
use indexmap::IndexMap;

use crate::catalog::DeploymentTarget;
use crate::dependencies::{DependencySet, parse_list, render_list};
use crate::error::{Result, ToolingError};

/// First lines of a file created by the tooling.
pub const NEW_FILE_HEADER: &str = "# Forage configuration";

/// Keys and hints removed by [`PropertiesDocument::remove_instance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedInstance {
    pub keys: Vec<String>,
    /// Values of removed keys ending in `kind`.
    pub kind_values: BTreeSet<String>,
    /// Segment following the instance name in each removed key.
    pub segments: BTreeSet<String>,
}

impl RemovedInstance {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.keys.extend(other.keys);
        self.kind_values.extend(other.kind_values);
        self.segments.extend(other.segments);
    }
}

/// What an [`PropertiesDocument::apply`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub updated: usize,
    pub appended: usize,
}

/// Line model of a flat configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl PropertiesDocument {
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(str::to_string).collect()
        };
        Self {
            lines,
            trailing_newline,
        }
    }

    /// Empty document starting with [`NEW_FILE_HEADER`].
    pub fn with_header() -> Self {
        Self {
            lines: vec![NEW_FILE_HEADER.to_string(), String::new()],
            trailing_newline: true,
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Entries in file order; later duplicates win.
    pub fn entries(&self) -> IndexMap<String, String> {
        let mut entries = IndexMap::new();
        for line in &self.lines {
            if let PropertyLine::Entry { key, value, .. } = parse_line(line) {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        entries
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lines.iter().rev().find_map(|line| match parse_line(line) {
            PropertyLine::Entry { key: k, value, .. } if k == key => Some(value.to_string()),
            _ => None,
        })
    }

    /// Replace values of existing keys in place, then append the rest in
    /// map order.
    pub fn apply(&mut self, properties: &IndexMap<String, String>) -> ApplyOutcome {
        let mut consumed = BTreeSet::new();
        let mut updated = 0;
        for line in &mut self.lines {
            let text = line.as_str();
            let replacement = match parse_line(text) {
                PropertyLine::Entry {
                    key, value_offset, ..
                } => properties
                    .get(key)
                    .map(|value| (key.to_string(), replace_value(text, value_offset, value))),
                _ => None,
            };
            if let Some((key, new_line)) = replacement {
                if *line != new_line {
                    updated += 1;
                }
                *line = new_line;
                consumed.insert(key);
            }
        }

        let mut appended = 0;
        for (key, value) in properties {
            if !consumed.contains(key) {
                self.push_entry(key, value);
                appended += 1;
            }
        }
        ApplyOutcome { updated, appended }
    }

    /// Set one key, in place when present, appended otherwise.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut single = IndexMap::new();
        single.insert(key.to_string(), value.to_string());
        self.apply(&single);
    }

    /// Drop every line for `key`. Returns whether any line was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(parse_line(line), PropertyLine::Entry { key: k, .. } if k == key));
        self.lines.len() != before
    }

    /// Remove every `forage.<instance>.*` entry.
    pub fn remove_instance(&mut self, instance: &str) -> RemovedInstance {
        let prefix = format!("{ROOT_TOKEN}{instance}.");
        let mut removed = RemovedInstance::default();
        self.lines.retain(|line| {
            let PropertyLine::Entry { key, value, .. } = parse_line(line) else {
                return true;
            };
            let Some(rest) = key.strip_prefix(&prefix) else {
                return true;
            };
            removed.keys.push(key.to_string());
            if let Some(segment) = rest.split('.').next().filter(|s| !s.is_empty()) {
                removed.segments.insert(segment.to_string());
            }
            if key.ends_with("kind") && !value.trim().is_empty() {
                removed.kind_values.insert(value.trim().to_string());
            }
            false
        });
        removed
    }

    /// Dependency lists currently recorded in this document.
    pub fn dependencies(&self) -> DependencySet {
        let mut set = DependencySet::default();
        for target in DeploymentTarget::ALL {
            if let Some(value) = self.get(target.dependency_key()) {
                for coordinate in parse_list(&value) {
                    set.insert(target, &coordinate);
                }
            }
        }
        set
    }

    /// Union `required` into the dependency lists. Returns whether anything changed.
    pub fn merge_dependencies(&mut self, required: &DependencySet) -> bool {
        let mut merged = self.dependencies();
        merged.extend(required);
        self.write_dependencies(&merged)
    }

    /// Remove every `eligible` coordinate from all four dependency lists.
    /// Returns whether anything changed.
    pub fn remove_dependencies(&mut self, eligible: &DependencySet) -> bool {
        let dropped = eligible.coordinates();
        let mut remaining = self.dependencies();
        remaining.retain(|coordinate| !dropped.contains(coordinate));
        self.write_dependencies(&remaining)
    }

    // Emptied lists are dropped rather than written as `key=`.
    fn write_dependencies(&mut self, lists: &DependencySet) -> bool {
        let mut changed = false;
        for (target, coordinates) in lists.iter() {
            let key = target.dependency_key();
            let current = self.get(key);
            if coordinates.is_empty() {
                changed |= self.remove(key);
                continue;
            }
            let rendered = render_list(coordinates);
            if current.as_deref() != Some(rendered.as_str()) {
                self.set(key, &rendered);
                changed = true;
            }
        }
        changed
    }

    fn push_entry(&mut self, key: &str, value: &str) {
        self.lines.push(format!("{key}={value}"));
        self.trailing_newline = true;
    }
}

fn replace_value(line: &str, value_offset: usize, value: &str) -> String {
    let head = line.get(..value_offset).unwrap_or(line);
    let carriage_return = if line.ends_with('\r') { "\r" } else { "" };
    format!("{head}{value}{carriage_return}")
}

// ─────────────────────────────────────────────────────────────────────────────
// File operations
// ─────────────────────────────────────────────────────────────────────────────

/// Read `path` fully; `None` if it does not exist.
pub fn load(path: &Path) -> Result<Option<PropertiesDocument>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(PropertiesDocument::parse(&text))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ToolingError::io(path, e)),
    }
}

/// Write the whole document through a temporary sibling and a rename.
pub fn save(path: &Path, document: &PropertiesDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ToolingError::io(parent, e))?;
    }
    let tmp = temp_sibling(path);
    std::fs::write(&tmp, document.render()).map_err(|e| ToolingError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| ToolingError::io(path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Apply `properties` to the file at `path`, creating it if absent.
pub fn apply(path: &Path, properties: &IndexMap<String, String>) -> Result<ApplyOutcome> {
    let mut document = load(path)?.unwrap_or_else(PropertiesDocument::with_header);
    let outcome = document.apply(properties);
    save(path, &document)?;
    Ok(outcome)
}

/// Remove an instance's keys from the file at `path`.
pub fn delete_instance(path: &Path, instance: &str) -> Result<RemovedInstance> {
    let Some(mut document) = load(path)? else {
        return Ok(RemovedInstance::default());
    };
    let removed = document.remove_instance(instance);
    if !removed.is_empty() {
        save(path, &document)?;
    }
    Ok(removed)
}

pub fn merge_dependencies(path: &Path, required: &DependencySet) -> Result<bool> {
    if required.is_empty() {
        return Ok(false);
    }
    let mut document = load(path)?.unwrap_or_else(PropertiesDocument::with_header);
    let changed = document.merge_dependencies(required);
    if changed {
        save(path, &document)?;
    }
    Ok(changed)
}

pub fn remove_dependencies(path: &Path, eligible: &DependencySet) -> Result<bool> {
    let Some(mut document) = load(path)? else {
        return Ok(false);
    };
    let changed = document.remove_dependencies(eligible);
    if changed {
        save(path, &document)?;
    }
    Ok(changed)
}
