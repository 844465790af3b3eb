// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Resource database over scratch directories

use kas_fontset::database::{CharValue, Source, Staleness, Status, Tags, Value};
use kas_fontset::plist::{self, Item};
use kas_fontset::{Config, Database, Error, ErrorKind, FontLibrary, Result, Symbol};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

/// Move the modification time forward, beyond filesystem granularity
fn touch_later(path: &Path) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();
}

fn tags(names: &[&str]) -> Tags {
    Tags::from_names(names)
}

fn database(dir: &TempDir) -> Database {
    Database::new(&Config::empty().with_user_dir(dir.path()))
}

#[test]
fn combining_class_table() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "cc.tab", "# combining classes\n0x0300-0x0314 1\n");
    let mut db = Database::new(&Config::empty());
    let id = db.register(
        tags(&["char-table", "integer", "combining-class", "*"]),
        Source::file(dir.path().join("cc.tab")),
        Status::Explicit,
    );

    let value = db.load(id).unwrap();
    let table = value.as_char_table().unwrap();
    assert_eq!(table.get(0x0305), &CharValue::Integer(1));
    assert_eq!(table.get(0x0400), &CharValue::Integer(-1));
}

#[test]
fn idempotent_registration() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one.plist", "(one)");
    write(dir.path(), "two.plist", "(two)");
    let mut db = database(&dir);
    let words = tags(&["data", "words"]);

    let id = db.register(words, Source::file("one.plist"), Status::Explicit);
    let first = db.load(id).unwrap();
    assert_eq!(first.as_plist().unwrap()[0].to_string(), "(one)");

    // Even an unchanged source is re-read
    assert_eq!(db.register(words, Source::file("one.plist"), Status::Explicit), id);
    assert_eq!(db.check_staleness(id), Staleness::Stale);
    let again = db.load(id).unwrap();
    assert!(!Arc::ptr_eq(&first, &again));
    assert_eq!(db.check_staleness(id), Staleness::Fresh);

    assert_eq!(db.register(words, Source::file("two.plist"), Status::Explicit), id);
    assert_eq!(db.list([None; 4]).len(), 1);
    assert_eq!(db.check_staleness(id), Staleness::Stale);
    let second = db.load(id).unwrap();
    assert_eq!(second.as_plist().unwrap()[0].to_string(), "(two)");
}

fn empty(_: &Tags) -> Result<Value> {
    Ok(Value::Plist(vec![]))
}

#[test]
fn wildcard_listing() {
    let mut db = Database::new(&Config::empty());
    let alphabet = ["a", "b", "c"];
    let mut ids = vec![];
    for x in alphabet {
        for y in alphabet {
            ids.push(db.register(tags(&["data", x, y]), Source::Producer(empty), Status::Explicit));
        }
    }

    assert_eq!(db.list([None; 4]), ids);
    let a = Some(Symbol::new("a"));
    assert_eq!(db.list([None, a, None, None]).len(), 3);
    assert_eq!(db.list([None, None, a, None]).len(), 3);
    let exact = [Some(Symbol::new("data")), a, a, Some(Symbol::NIL)];
    assert_eq!(db.list(exact), vec![ids[0]]);
    let missing = [Some(Symbol::new("data")), a, Some(Symbol::new("z")), None];
    assert!(db.list(missing).is_empty());
}

#[test]
fn staleness() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "words.plist", "(apple banana)");
    let path = dir.path().join("words.plist");
    let mut db = Database::new(&Config::empty());
    let id = db.register(tags(&["data", "words"]), Source::file(&path), Status::Explicit);

    let first = db.load(id).unwrap();
    assert_eq!(db.check_staleness(id), Staleness::Fresh);
    let again = db.load(id).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    touch_later(&path);
    assert_eq!(db.check_staleness(id), Staleness::Stale);
    let reloaded = db.load(id).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(*reloaded.as_plist().unwrap(), *first.as_plist().unwrap());

    fs::remove_file(&path).unwrap();
    assert_eq!(db.check_staleness(id), Staleness::Unavailable);
    assert!(matches!(db.load(id), Err(Error::Unavailable(_))));
}

#[test]
fn manifest_scan() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "mdb.dir",
        r#";; resources
(char-table "*.tab")
(data words "words.plist")
(bad entry)"#,
    );
    write(
        dir.path(),
        "cc.tab",
        "(char-table integer combining-class)\n0x0300-0x0314 1\n",
    );
    write(dir.path(), "koi.tab", "(charset koi8-x)\n0x00 0x00\n");
    write(dir.path(), "words.plist", "(apple)");
    let mut db = database(&dir);

    let cc = db
        .find(tags(&["char-table", "integer", "combining-class"]))
        .unwrap();
    assert_eq!(db.record(cc).status(), Status::Auto);
    let value = db.load(cc).unwrap();
    assert_eq!(value.as_char_table().unwrap().get(0x0314), &CharValue::Integer(1));

    assert!(db.find(tags(&["charset", "koi8-x"])).is_none());
    assert!(db.find(tags(&["data", "words"])).is_some());
    assert_eq!(db.list([None; 4]).len(), 2);

    // Explicit registrations survive rescans
    let words = tags(&["data", "words"]);
    db.register(words, Source::Producer(empty), Status::Explicit);
    write(dir.path(), "mdb.dir", r#"(data words "words.plist")"#);
    touch_later(&dir.path().join("mdb.dir"));
    let id = db.find(words).unwrap();
    assert!(db.load(id).unwrap().as_plist().unwrap().is_empty());

    // Removing the manifest entry disables the record
    assert!(db.find(tags(&["char-table", "integer", "combining-class"])).is_none());
}

#[test]
fn directory_precedence() {
    let user = tempfile::tempdir().unwrap();
    let app = tempfile::tempdir().unwrap();
    let system = tempfile::tempdir().unwrap();
    for (dir, word) in [(&user, "user"), (&app, "app"), (&system, "system")] {
        write(dir.path(), "mdb.dir", r#"(data words "words.plist")"#);
        write(dir.path(), "words.plist", &format!("({word})"));
    }
    write(system.path(), "mdb.dir", r#"(data words "words.plist") (data extra "extra.plist")"#);
    write(system.path(), "extra.plist", "(extra)");

    let config = Config {
        system_dir: Some(system.path().into()),
        app_dir: Some(app.path().into()),
        user_dir: Some(user.path().into()),
    };
    let mut db = Database::new(&config);
    let words = db.find_and_load(tags(&["data", "words"])).unwrap();
    assert_eq!(words.as_plist().unwrap()[0].to_string(), "(user)");
    let extra = db.find_and_load(tags(&["data", "extra"])).unwrap();
    assert_eq!(extra.as_plist().unwrap()[0].to_string(), "(extra)");

    fs::remove_file(user.path().join("words.plist")).unwrap();
    let words = db.find_and_load(tags(&["data", "words"])).unwrap();
    assert_eq!(words.as_plist().unwrap()[0].to_string(), "(app)");

    let err = db.find_and_load(tags(&["data", "missing"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);
}

#[test]
fn vanished_directory() {
    let user = tempfile::tempdir().unwrap();
    let app = tempfile::tempdir().unwrap();
    write(user.path(), "mdb.dir", r#"(data words "words.plist")"#);
    write(user.path(), "words.plist", "(user)");
    write(app.path(), "mdb.dir", r#"(data extra "extra.plist")"#);
    write(app.path(), "extra.plist", "(extra)");

    let config = Config {
        system_dir: None,
        app_dir: Some(app.path().into()),
        user_dir: Some(user.path().into()),
    };
    let mut db = Database::new(&config);
    let extra = tags(&["data", "extra"]);
    assert!(db.find(extra).is_some());
    assert_eq!(db.list([None; 4]).len(), 2);

    fs::remove_dir_all(app.path()).unwrap();
    assert!(db.find(extra).is_none());
    assert!(matches!(db.find_and_load(extra), Err(Error::NotFound(_))));
    let words = db.find_and_load(tags(&["data", "words"])).unwrap();
    assert_eq!(words.as_plist().unwrap()[0].to_string(), "(user)");
    assert_eq!(db.list([None; 4]).len(), 1);
}

#[test]
fn added_directory() {
    let user = tempfile::tempdir().unwrap();
    let app = tempfile::tempdir().unwrap();
    write(user.path(), "mdb.dir", r#"(data words "words.plist")"#);
    write(user.path(), "words.plist", "(user)");
    write(app.path(), "mdb.dir", r#"(data words "words.plist") (data extra "extra.plist")"#);
    write(app.path(), "words.plist", "(app)");
    write(app.path(), "extra.plist", "(extra)");

    let mut db = database(&user);
    let extra = tags(&["data", "extra"]);
    assert!(db.find(extra).is_none());

    db.add_dir(app.path());
    let value = db.find_and_load(extra).unwrap();
    assert_eq!(value.as_plist().unwrap()[0].to_string(), "(extra)");
    // The user directory still takes precedence
    let words = db.find_and_load(tags(&["data", "words"])).unwrap();
    assert_eq!(words.as_plist().unwrap()[0].to_string(), "(user)");
    assert_eq!(db.dirs().len(), 2);
}

#[test]
fn lock_exclusion_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = database(&dir);
    let id = db.register(tags(&["data", "words"]), Source::file("words.plist"), Status::Explicit);

    let items = plist::parse("(apple \"banana\" 3)").unwrap();
    assert!(matches!(db.save(id, &items), Err(Error::NotLocked)));

    db.lock(id).unwrap();
    assert!(db.record(id).is_locked());
    assert!(dir.path().join("words.plist.LCK").exists());
    assert!(matches!(db.lock(id), Err(Error::Locked(_))));

    db.save(id, &items).unwrap();
    let saved = fs::read_to_string(dir.path().join("words.plist")).unwrap();
    assert_eq!(plist::parse(&saved).unwrap(), items);
    let value = db.load(id).unwrap();
    assert_eq!(value.as_plist().unwrap(), items.as_slice());

    db.unlock(id).unwrap();
    assert!(!dir.path().join("words.plist.LCK").exists());
    db.lock(id).unwrap();
    db.unlock(id).unwrap();
}

#[test]
fn lock_without_user_dir() {
    let mut db = Database::new(&Config::empty());
    let id = db.register(tags(&["data", "words"]), Source::file("words.plist"), Status::Explicit);
    assert!(matches!(db.lock(id), Err(Error::NoWritableDir)));
    let id = db.register(tags(&["data", "made"]), Source::Producer(empty), Status::Explicit);
    assert!(matches!(db.lock(id), Err(Error::Unavailable(_))));
}

#[test]
fn malformed_char_table() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "bad.tab", "0x0300-0x0314 1\n0x20-0x10 2\n");
    write(dir.path(), "empty.map", "# nothing here\n");
    let mut db = database(&dir);

    let id = db.register(
        tags(&["char-table", "integer", "bad"]),
        Source::file("bad.tab"),
        Status::Explicit,
    );
    let err = db.load(id).unwrap_err();
    assert!(matches!(err, Error::Malformed { line: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::Database);

    let id = db.register(tags(&["charset", "empty"]), Source::file("empty.map"), Status::Explicit);
    assert!(matches!(db.load(id), Err(Error::Malformed { .. })));
}

#[test]
fn charset_from_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "mdb.dir", r#"(charset koi8-x "koi8-x.map")"#);
    write(
        dir.path(),
        "koi8-x.map",
        "# test charset\n0x00-0x7F 0x0000\n0xC1 0x0430\n0xC2-0xC3 0x0431\n",
    );
    let mut lib = FontLibrary::new(&Config::empty().with_user_dir(dir.path()));

    let koi = lib.charset(Symbol::new("koi8-x")).unwrap();
    assert_eq!(koi.encode_char('а'), Some(0xC1));
    assert_eq!(koi.encode_char('в'), Some(0xC3));
    assert_eq!(koi.decode_char(0x41), Some('A'));
    assert_eq!(koi.encode_char('é'), None);
    assert!(lib.charset(Symbol::new("no-such-charset")).is_none());
}

#[test]
fn sparse_charset_from_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sparse.map", "0x00-0x7F 0x0000\n0x0FFFFFFF 0x4E00\n0x81308130 0x80\n");
    let mut db = database(&dir);
    let id = db.register(
        tags(&["charset", "sparse"]),
        Source::file("sparse.map"),
        Status::Explicit,
    );
    let value = db.load(id).unwrap();
    let charset = value.as_charset().unwrap();
    assert_eq!(charset.decode_char(0x41), Some('A'));
    assert_eq!(charset.decode_char(0x0FFFFFFF), Some('一'));
    assert_eq!(charset.decode_char(0x81308130), Some('\u{80}'));
    assert_eq!(charset.decode_char(0x0FFFFFFE), None);
    assert_eq!(charset.encode_char('一'), Some(0x0FFFFFFF));
    assert_eq!(charset.encode_char('\u{81}'), None);
}

#[test]
fn declared_list_items() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "words.plist", "(data words)\n(apple) (banana)");
    let mut db = database(&dir);
    let id = db.register(tags(&["data", "words"]), Source::file("words.plist"), Status::Explicit);
    let value = db.load(id).unwrap();
    let items: Vec<String> = value.as_plist().unwrap().iter().map(Item::to_string).collect();
    assert_eq!(items, vec!["(apple)", "(banana)"]);
}
