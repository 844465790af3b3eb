// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Advisory locking for resource writers
//!
//! A writer creates a uniquely named file next to the target and hard-links
//! it to `TARGET.LCK`. Creating the link fails if another writer's sentinel
//! exists. Locks are cooperative: readers are not blocked, and a sentinel
//! left by a crashed writer must be removed by hand.

use super::{modified, DirRole, Database, ResourceId, Source, Value};
use crate::plist::{write_items, Item};
use crate::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static UNIQUE: AtomicU32 = AtomicU32::new(0);

/// Files belonging to a held lock
#[derive(Debug)]
pub(crate) struct LockState {
    target: PathBuf,
    sentinel: PathBuf,
    unique: PathBuf,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Verify the link really points at our file
        fn link_held(unique: &Path) -> bool {
            use std::os::unix::fs::MetadataExt;
            fs::metadata(unique).is_ok_and(|m| m.nlink() == 2)
        }
    } else {
        fn link_held(_: &Path) -> bool {
            true
        }
    }
}

impl Database {
    /// The file a resource is written to
    ///
    /// Absolute sources are written in place; relative sources are written
    /// to the user directory.
    fn write_target(&self, id: ResourceId) -> Result<PathBuf> {
        let rec = self.record(id);
        match &rec.source {
            Source::File(name) if name.is_absolute() => Ok(name.clone()),
            Source::File(name) => self
                .dirs
                .iter()
                .find(|dir| dir.role == DirRole::User)
                .map(|dir| dir.path.join(name))
                .ok_or(Error::NoWritableDir),
            Source::Producer(_) => Err(Error::Unavailable(rec.tags)),
        }
    }

    /// Acquire the write lock for a resource
    ///
    /// Fails with [`Error::Locked`] if any writer (this process included)
    /// already holds it.
    pub fn lock(&mut self, id: ResourceId) -> Result<()> {
        let target = self.write_target(id)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let sentinel = with_suffix(&target, ".LCK");
        let n = UNIQUE.fetch_add(1, Ordering::Relaxed);
        let unique = with_suffix(&target, &format!(".{}.{n}", std::process::id()));
        fs::File::create(&unique).map_err(|e| Error::io(&unique, e))?;

        let held = fs::hard_link(&unique, &sentinel).is_ok() && link_held(&unique);
        if !held {
            let _ = fs::remove_file(&unique);
            log::debug!("Database::lock: {} is held", sentinel.display());
            return Err(Error::Locked(sentinel));
        }

        self.records[id.get()].lock = Some(LockState {
            target,
            sentinel,
            unique,
        });
        Ok(())
    }

    /// Write `items` to the resource's file
    ///
    /// The lock must be held. The content is written to a temporary file then
    /// renamed over the target. On success the saved items become the cached
    /// value. On failure the lock is still held.
    pub fn save(&mut self, id: ResourceId, items: &[Item]) -> Result<()> {
        let rec = &mut self.records[id.get()];
        let lock = rec.lock.as_ref().ok_or(Error::NotLocked)?;

        let result = fs::write(&lock.unique, write_items(items))
            .and_then(|()| fs::rename(&lock.unique, &lock.target));
        if let Err(err) = result {
            let _ = fs::remove_file(&lock.unique);
            return Err(Error::io(&lock.target, err));
        }

        let mtime = modified(&lock.target);
        rec.loaded_from = Some((lock.target.clone(), mtime));
        rec.value = Some(Arc::new(Value::Plist(items.to_vec())));
        rec.loaded = true;
        Ok(())
    }

    /// Release the write lock
    pub fn unlock(&mut self, id: ResourceId) -> Result<()> {
        let lock = self.records[id.get()].lock.take().ok_or(Error::NotLocked)?;
        let _ = fs::remove_file(&lock.unique);
        match fs::remove_file(&lock.sentinel) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                Err(Error::io(&lock.sentinel, err))
            }
            _ => Ok(()),
        }
    }
}
