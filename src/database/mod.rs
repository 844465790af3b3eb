// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Tagged resource store
//!
//! Resources are identified by a tuple of four [`Symbol`]s ([`Tags`]). The
//! first tag decides how a resource is parsed:
//!
//! -   `char-table`: a sparse map from code point to value; the second tag
//!     names the value type (`symbol`, `integer`, `string`, `text` or
//!     `plist`)
//! -   `charset`: a charset code table; the second tag names the charset
//! -   anything else: nested-list text (see [`crate::plist`])
//!
//! Resources are registered explicitly with [`Database::register`] or
//! discovered from the manifest file ([`MANIFEST_NAME`]) of each configured
//! directory. Every [`Database::find`] and [`Database::list`] first checks
//! whether directories changed and rescans them if so.

mod loader;
mod lock;
mod scan;

use crate::chartab::CharTable;
use crate::charset::Charset;
use crate::conv::{to_u32, to_usize};
use crate::env::{Config, MANIFEST_NAME};
use crate::plist::Item;
use crate::{Error, Result, Symbol};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

pub(crate) use lock::LockState;

/// The four tags identifying a resource
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tags(pub [Symbol; 4]);

impl Tags {
    /// Construct from four symbols
    pub fn new(tag0: Symbol, tag1: Symbol, tag2: Symbol, tag3: Symbol) -> Self {
        Tags([tag0, tag1, tag2, tag3])
    }

    /// Construct from names; missing trailing tags are `nil`
    pub fn from_names(names: &[&str]) -> Self {
        let mut tags = Tags::default();
        for (tag, name) in tags.0.iter_mut().zip(names) {
            *tag = Symbol::new(name);
        }
        tags
    }

    /// The first tag, selecting the resource format
    pub fn kind(&self) -> Symbol {
        self.0[0]
    }

    /// True if each tag equals the corresponding pattern slot
    ///
    /// `None` slots match anything.
    pub fn matches(&self, pattern: &TagPattern) -> bool {
        self.0
            .iter()
            .zip(pattern.iter())
            .all(|(tag, pat)| pat.map_or(true, |p| p == *tag))
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "({a} {b} {c} {d})")
    }
}

/// A tag pattern for [`Database::list`]; `None` is a wildcard
pub type TagPattern = [Option<Symbol>; 4];

/// Resource identifier
///
/// Identifiers are stable for the lifetime of a [`Database`]; re-registering
/// the same tags yields the same identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u32);

impl ResourceId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

/// A value in a character table
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharValue {
    /// Unmapped (the default for all but integer tables)
    Nil,
    Symbol(Symbol),
    Integer(i64),
    /// A `string` or `text` value
    String(String),
    Plist(Item),
}

/// A parsed resource
#[derive(Clone, Debug)]
pub enum Value {
    CharTable(CharTable<CharValue>),
    Charset(Arc<Charset>),
    Plist(Vec<Item>),
}

impl Value {
    /// Get as a character table
    pub fn as_char_table(&self) -> Option<&CharTable<CharValue>> {
        match self {
            Value::CharTable(table) => Some(table),
            _ => None,
        }
    }

    /// Get as a charset
    pub fn as_charset(&self) -> Option<&Arc<Charset>> {
        match self {
            Value::Charset(charset) => Some(charset),
            _ => None,
        }
    }

    /// Get as nested-list items
    pub fn as_plist(&self) -> Option<&[Item]> {
        match self {
            Value::Plist(items) => Some(items),
            _ => None,
        }
    }
}

/// An in-memory resource producer
pub type Producer = fn(&Tags) -> Result<Value>;

/// Where a resource's content comes from
#[derive(Clone, Debug)]
pub enum Source {
    /// A file: absolute, or relative to the directory list
    File(PathBuf),
    /// A function producing the value
    Producer(Producer),
}

impl Source {
    /// Convenience constructor for [`Source::File`]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }
}

/// Status of a record or directory
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Registered by the application, or a directory present and unchanged
    Explicit,
    /// Discovered by a manifest scan, or a directory changed since last scan
    Auto,
    /// Not available
    Disabled,
}

/// Result of [`Database::check_staleness`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Staleness {
    /// The cached value is current
    Fresh,
    /// The next load will re-read the source
    Stale,
    /// The source file cannot be found
    Unavailable,
}

/// Bookkeeping for one resource
#[derive(Debug)]
pub struct Record {
    tags: Tags,
    source: Source,
    status: Status,
    /// Resolved path and its modification time at the last load
    loaded_from: Option<(PathBuf, Option<SystemTime>)>,
    loaded: bool,
    value: Option<Arc<Value>>,
    lock: Option<LockState>,
}

impl Record {
    /// The resource's tags
    pub fn tags(&self) -> Tags {
        self.tags
    }

    /// The resource's source
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The record's status
    pub fn status(&self) -> Status {
        self.status
    }

    /// The file the value was last loaded from, if any
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded_from.as_ref().map(|(path, _)| path.as_path())
    }

    /// True while this process holds the resource's lock
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

/// Role of a directory in the search path
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirRole {
    User,
    App,
    System,
}

/// A directory in the search path
#[derive(Clone, Debug)]
pub struct DirEntry {
    path: PathBuf,
    role: DirRole,
    status: Status,
    scanned: Option<SystemTime>,
}

impl DirEntry {
    fn new(path: PathBuf, role: DirRole) -> Self {
        DirEntry {
            path,
            role,
            status: Status::Disabled,
            scanned: None,
        }
    }

    /// The directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory's role
    pub fn role(&self) -> DirRole {
        self.role
    }

    /// Status as of the last [`Database::update`]
    pub fn status(&self) -> Status {
        self.status
    }
}

/// The resource store
#[derive(Debug, Default)]
pub struct Database {
    /// In order of precedence
    dirs: Vec<DirEntry>,
    records: Vec<Record>,
    index: HashMap<Tags, ResourceId>,
}

impl Database {
    /// Construct with directories from `config`
    pub fn new(config: &Config) -> Self {
        let mut db = Database::default();
        let dirs = [
            (&config.user_dir, DirRole::User),
            (&config.app_dir, DirRole::App),
            (&config.system_dir, DirRole::System),
        ];
        for (dir, role) in dirs {
            if let Some(path) = dir {
                db.dirs.push(DirEntry::new(path.clone(), role));
            }
        }
        db
    }

    /// Directories, in order of precedence
    pub fn dirs(&self) -> &[DirEntry] {
        &self.dirs
    }

    /// Add an application directory
    ///
    /// It takes precedence over the system directory and over application
    /// directories added earlier, but not over the user directory. The next
    /// lookup scans it.
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        let pos = self
            .dirs
            .iter()
            .position(|dir| dir.role != DirRole::User)
            .unwrap_or(self.dirs.len());
        self.dirs.insert(pos, DirEntry::new(path.into(), DirRole::App));
    }

    /// Access a record
    ///
    /// Panics if `id` did not come from this database.
    pub fn record(&self, id: ResourceId) -> &Record {
        &self.records[id.get()]
    }

    /// Find a resource by exact tags
    pub fn find(&mut self, tags: Tags) -> Option<ResourceId> {
        self.update();
        let id = *self.index.get(&tags)?;
        (self.record(id).status != Status::Disabled).then_some(id)
    }

    /// List all available resources matching `pattern`
    pub fn list(&mut self, pattern: TagPattern) -> Vec<ResourceId> {
        self.update();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.status != Status::Disabled && rec.tags.matches(&pattern))
            .map(|(i, _)| ResourceId(to_u32(i)))
            .collect()
    }

    /// Register a resource
    ///
    /// If `tags` are already registered the existing record is updated in
    /// place and the next [`Database::load`] re-reads it, even if the source
    /// is unchanged. The previously loaded value is kept until then.
    ///
    /// Records registered with [`Status::Explicit`] are not replaced by
    /// manifest scans.
    pub fn register(&mut self, tags: Tags, source: Source, status: Status) -> ResourceId {
        if let Some(&id) = self.index.get(&tags) {
            let rec = &mut self.records[id.get()];
            if status == Status::Auto && rec.status == Status::Explicit {
                return id;
            }
            rec.loaded = false;
            rec.source = source;
            rec.status = status;
            return id;
        }

        let id = ResourceId(to_u32(self.records.len()));
        self.records.push(Record {
            tags,
            source,
            status,
            loaded_from: None,
            loaded: false,
            value: None,
            lock: None,
        });
        self.index.insert(tags, id);
        id
    }

    /// Load a resource, using the cached value if still fresh
    pub fn load(&mut self, id: ResourceId) -> Result<Arc<Value>> {
        let staleness = self.check_staleness(id);
        let rec = &self.records[id.get()];
        if staleness == Staleness::Fresh {
            if let Some(value) = rec.value.as_ref() {
                log::trace!("Database::load: cache hit for {}", rec.tags);
                return Ok(value.clone());
            }
        }
        let tags = rec.tags;

        let (value, loaded_from) = match &rec.source {
            Source::Producer(produce) => (produce(&tags)?, None),
            Source::File(name) => {
                let path = self.resolve(name).ok_or(Error::Unavailable(tags))?;
                let mtime = modified(&path);
                let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                let value = loader::load(&tags, &text)?;
                (value, Some((path, mtime)))
            }
        };
        log::debug!("Database::load: loaded {tags}");

        let value = Arc::new(value);
        let rec = &mut self.records[id.get()];
        rec.value = Some(value.clone());
        rec.loaded_from = loaded_from;
        rec.loaded = true;
        Ok(value)
    }

    /// Find and load a resource by tags
    pub fn find_and_load(&mut self, tags: Tags) -> Result<Arc<Value>> {
        let id = self.find(tags).ok_or(Error::NotFound(tags))?;
        self.load(id)
    }

    /// Check whether a cached value is still current
    pub fn check_staleness(&self, id: ResourceId) -> Staleness {
        let rec = &self.records[id.get()];
        let name = match &rec.source {
            Source::Producer(_) if rec.loaded => return Staleness::Fresh,
            Source::Producer(_) => return Staleness::Stale,
            Source::File(name) => name,
        };

        let Some(path) = self.resolve(name) else {
            return Staleness::Unavailable;
        };
        let Some(mtime) = modified(&path) else {
            return Staleness::Unavailable;
        };
        match &rec.loaded_from {
            Some((loaded_path, Some(loaded_mtime)))
                if rec.loaded && *loaded_path == path && mtime <= *loaded_mtime =>
            {
                Staleness::Fresh
            }
            _ => Staleness::Stale,
        }
    }

    /// Resolve a file name through the directory list
    ///
    /// Absolute names resolve to themselves if they exist. Relative names
    /// resolve in the first directory containing them.
    pub fn resolve(&self, name: &Path) -> Option<PathBuf> {
        if name.is_absolute() {
            return name.is_file().then(|| name.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.path.join(name))
            .find(|path| path.is_file())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_NAME)
}
