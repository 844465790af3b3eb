// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Directory rescans and manifest parsing

use super::{manifest_path, modified, Database, Source, Status, Tags};
use crate::plist::{self, Item};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A manifest entry: tags and a file name or glob pattern
#[derive(Debug, PartialEq)]
struct Entry {
    tags: Tags,
    path: String,
}

impl Entry {
    fn from_item(item: &Item) -> Option<Entry> {
        let list = item.as_list()?;
        let (last, syms) = list.split_last()?;
        let path = last.as_text()?.to_string();
        if syms.is_empty() || syms.len() > 4 {
            return None;
        }
        let mut tags = Tags::default();
        for (tag, item) in tags.0.iter_mut().zip(syms) {
            *tag = item.as_symbol()?;
        }
        Some(Entry { tags, path })
    }

    fn is_pattern(&self) -> bool {
        self.path.contains(['*', '?', '['])
    }
}

/// The time a directory last changed: the later of its own and its
/// manifest's modification time
fn dir_stamp(dir: &Path) -> Option<SystemTime> {
    if !dir.is_dir() {
        return None;
    }
    let own = modified(dir);
    let manifest = modified(&manifest_path(dir));
    own.max(manifest).or(Some(SystemTime::UNIX_EPOCH))
}

/// Read the tag list a resource file declares as its first item
fn read_declared_tags(path: &Path) -> Option<Tags> {
    let text = std::fs::read_to_string(path).ok()?;
    let item = plist::parse_one(&text).ok()??;
    let list = item.as_list()?;
    if list.is_empty() || list.len() > 4 {
        return None;
    }
    let mut tags = Tags::default();
    for (tag, item) in tags.0.iter_mut().zip(list) {
        *tag = item.as_symbol()?;
    }
    Some(tags)
}

/// True if every non-nil tag of `pattern` equals that of `declared`
fn tags_agree(pattern: &Tags, declared: &Tags) -> bool {
    pattern
        .0
        .iter()
        .zip(declared.0.iter())
        .all(|(p, d)| p.is_nil() || p == d)
}

impl Database {
    /// Re-check directories, rescanning manifests if anything changed
    ///
    /// This is called by [`Database::find`] and [`Database::list`]; it is
    /// cheap when nothing changed.
    pub fn update(&mut self) {
        let mut rescan = false;
        for dir in &mut self.dirs {
            match dir_stamp(&dir.path) {
                None => {
                    if dir.status != Status::Disabled {
                        log::debug!("Database::update: {} disappeared", dir.path.display());
                        dir.status = Status::Disabled;
                        dir.scanned = None;
                        rescan = true;
                    }
                }
                Some(stamp) if dir.scanned.map_or(true, |last| stamp > last) => {
                    dir.status = Status::Auto;
                    dir.scanned = Some(stamp);
                    rescan = true;
                }
                Some(_) => dir.status = Status::Explicit,
            }
        }

        if rescan {
            self.rescan();
        }
    }

    fn rescan(&mut self) {
        for rec in &mut self.records {
            if rec.status == Status::Auto {
                rec.status = Status::Disabled;
            }
        }

        // Lowest precedence first, so that later registrations win
        let dirs: Vec<PathBuf> = self
            .dirs
            .iter()
            .rev()
            .filter(|dir| dir.status != Status::Disabled)
            .map(|dir| dir.path.clone())
            .collect();
        for dir in dirs {
            self.scan_manifest(&dir);
        }
    }

    fn scan_manifest(&mut self, dir: &Path) {
        let path = manifest_path(dir);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                log::debug!("Database: no manifest in {}: {err}", dir.display());
                return;
            }
        };
        let items = match plist::parse(&text) {
            Ok(items) => items,
            Err(err) => {
                log::warn!("Database: ignoring {}: {err}", path.display());
                return;
            }
        };

        let mut count = 0;
        for item in &items {
            let Some(entry) = Entry::from_item(item) else {
                log::warn!("Database: bad entry in {}: {item}", path.display());
                continue;
            };
            if entry.is_pattern() {
                count += self.register_matches(&entry);
            } else {
                self.register(entry.tags, Source::file(&entry.path), Status::Auto);
                count += 1;
            }
        }
        log::info!(
            "Database: registered {count} resources from {}",
            path.display()
        );
    }

    /// Register each file matching a wildcard entry whose declared tags
    /// agree with the entry's tags
    ///
    /// Relative patterns are expanded in every directory, in order of
    /// precedence; the first file declaring given tags wins.
    fn register_matches(&mut self, entry: &Entry) -> usize {
        let bases: Vec<PathBuf> = if Path::new(&entry.path).is_absolute() {
            vec![PathBuf::new()]
        } else {
            self.dirs
                .iter()
                .filter(|dir| dir.status != Status::Disabled)
                .map(|dir| dir.path.clone())
                .collect()
        };

        let mut seen = HashSet::new();
        for base in bases {
            let pattern = base.join(&entry.path);
            let Some(pattern) = pattern.to_str() else {
                continue;
            };
            let paths = match glob::glob(pattern) {
                Ok(paths) => paths,
                Err(err) => {
                    log::warn!("Database: bad pattern {pattern}: {err}");
                    break;
                }
            };
            for path in paths.filter_map(Result::ok) {
                let Some(declared) = read_declared_tags(&path) else {
                    log::debug!("Database: {} declares no tags", path.display());
                    continue;
                };
                if tags_agree(&entry.tags, &declared) && seen.insert(declared) {
                    self.register(declared, Source::File(path), Status::Auto);
                }
            }
        }
        seen.len()
    }
}
