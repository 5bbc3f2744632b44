use super::{
    config::{Config, GIT_DIR},
    git_object::{
        tree::{Mode, Tree, TreeEntry},
        ObjectKind,
    },
    store::ObjectStore,
    Error, Result, Sha1Hash,
};
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Snapshots a directory into tree and blob objects.
///
/// The store's metadata directory is never part of the snapshot, whether it
/// is named `.git` or sits at the configured `git_dir`. Entries that cannot
/// be stat'ed or read are logged and left out of the tree. Failing to open
/// the top-level directory, failing to store an object and tripping a
/// capacity limit are all fatal.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    store: &'a ObjectStore,
    git_dir: PathBuf,
    max_entries: usize,
    max_bytes: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a ObjectStore, config: &Config) -> Self {
        Self {
            store,
            git_dir: config.git_dir.clone(),
            max_entries: config.max_tree_entries,
            max_bytes: config.max_tree_bytes,
        }
    }

    pub fn write_tree<P: AsRef<Path>>(&self, dir: P) -> Result<Sha1Hash> {
        let dir = dir.as_ref();
        let read_dir = fs::read_dir(dir)?;
        self.write_entries(dir, read_dir)
    }

    fn write_entries<I>(&self, dir: &Path, read_dir: I) -> Result<Sha1Hash>
    where
        I: IntoIterator<Item = io::Result<DirEntry>>,
    {
        let mut entries: Vec<TreeEntry> = vec![];
        let mut size = 0usize;

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            let Some(tree_entry) = self.entry_of(&entry)? else {
                continue;
            };

            size += tree_entry.serialized_len();
            if entries.len() + 1 > self.max_entries {
                return Err(Error::ResourceExhausted(format!(
                    "{} has more than {} entries",
                    dir.display(),
                    self.max_entries
                )));
            }
            if size > self.max_bytes {
                return Err(Error::ResourceExhausted(format!(
                    "tree for {} exceeds {} bytes",
                    dir.display(),
                    self.max_bytes
                )));
            }
            entries.push(tree_entry);
        }

        let tree = Tree::new(entries)?;
        let hash = self.store.put(ObjectKind::Tree, &tree.serialize())?;
        debug!(dir = %dir.display(), %hash, entries = tree.entries().len(), "wrote tree");
        Ok(hash)
    }

    /// `Ok(None)` means the entry is excluded or was skipped after a
    /// filesystem failure.
    fn entry_of(&self, entry: &DirEntry) -> Result<Option<TreeEntry>> {
        let path = entry.path();

        let name = match entry.file_name().into_string() {
            Ok(name) if name == GIT_DIR => return Ok(None),
            Ok(name) => name,
            Err(name) => {
                warn!(?name, "skipping entry with non UTF-8 name");
                return Ok(None);
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => return skip(&path, err),
        };

        let (mode, hash) = if file_type.is_dir() {
            if self.is_git_dir(&path) {
                debug!(path = %path.display(), "excluding store directory");
                return Ok(None);
            }
            let read_dir = match fs::read_dir(&path) {
                Ok(read_dir) => read_dir,
                Err(err) => return skip(&path, err),
            };
            (Mode::Directory, self.write_entries(&path, read_dir)?)
        } else if file_type.is_symlink() {
            let target = match fs::read_link(&path) {
                Ok(target) => target,
                Err(err) => return skip(&path, err),
            };
            let hash = self.store.put(ObjectKind::Blob, &link_bytes(&target))?;
            (Mode::Symlink, hash)
        } else if file_type.is_file() {
            let (content, mode) = match fs::read(&path).and_then(|c| Ok((c, file_mode(entry)?))) {
                Ok(read) => read,
                Err(err) => return skip(&path, err),
            };
            (mode, self.store.put(ObjectKind::Blob, &content)?)
        } else {
            warn!(path = %path.display(), "skipping special file");
            return Ok(None);
        };

        TreeEntry::new(mode, name, hash).map(Some)
    }

    /// Compared after resolving both sides, since `git_dir` may be relative
    /// or reached through a symlink.
    fn is_git_dir(&self, path: &Path) -> bool {
        match (fs::canonicalize(path), fs::canonicalize(&self.git_dir)) {
            (Ok(path), Ok(git_dir)) => path == git_dir,
            _ => false,
        }
    }
}

fn skip(path: &Path, err: io::Error) -> Result<Option<TreeEntry>> {
    warn!(path = %path.display(), %err, "skipping entry");
    Ok(None)
}

#[cfg(unix)]
fn file_mode(entry: &DirEntry) -> io::Result<Mode> {
    use std::os::unix::fs::PermissionsExt;

    let mode = entry.metadata()?.permissions().mode();
    Ok(if mode & 0o100 != 0 {
        Mode::Executable
    } else {
        Mode::File
    })
}

#[cfg(not(unix))]
fn file_mode(_entry: &DirEntry) -> io::Result<Mode> {
    Ok(Mode::File)
}

#[cfg(unix)]
fn link_bytes(target: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    target.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn link_bytes(target: &Path) -> Vec<u8> {
    target.to_string_lossy().into_owned().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_object::GitObject;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        work: std::path::PathBuf,
        store: ObjectStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        let store = ObjectStore::new(work.join(".git/objects"));
        Fixture {
            _dir: dir,
            work,
            store,
        }
    }

    fn names(store: &ObjectStore, hash: &Sha1Hash) -> Vec<String> {
        match store.read(hash).unwrap() {
            GitObject::Tree(tree) => tree.entries().iter().map(|e| e.name().into()).collect(),
            other => panic!("expected tree, got {other:?}"),
        }
    }

    #[test]
    fn it_lists_entries_in_byte_order() {
        let f = fixture();
        // created out of order so directory listing order cannot help
        fs::create_dir(f.work.join("c")).unwrap();
        fs::write(f.work.join("c/inner"), "hello\n").unwrap();
        fs::write(f.work.join("b"), "hello\n").unwrap();
        fs::write(f.work.join("a"), "hello\n").unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_tree(&f.work).unwrap();
        assert_eq!(names(&f.store, &hash), ["a", "b", "c"]);

        let GitObject::Tree(tree) = f.store.read(&hash).unwrap() else {
            panic!("expected tree");
        };
        let blob = Sha1Hash::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        assert_eq!(tree.entries()[0].hash(), blob);
        assert_eq!(tree.entries()[0].mode(), Mode::File);
        assert_eq!(tree.entries()[2].mode(), Mode::Directory);
        assert_eq!(names(&f.store, &tree.entries()[2].hash()), ["inner"]);
    }

    #[test]
    fn it_matches_git_digest_for_flat_tree() {
        let f = fixture();
        fs::write(f.work.join("hello.txt"), "hello\n").unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_tree(&f.work).unwrap();
        // `git write-tree` over a single `hello.txt` containing "hello\n"
        assert_eq!(hash.hex(), "aaa96ced2d9a1c8e72c56b253a0e2fe78393feb7");
    }

    #[test]
    fn it_is_deterministic() {
        let f = fixture();
        fs::create_dir_all(f.work.join("src/nested")).unwrap();
        fs::write(f.work.join("src/nested/x.rs"), "fn x() {}").unwrap();
        fs::write(f.work.join("README"), "readme").unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let first = builder.write_tree(&f.work).unwrap();
        let second = builder.write_tree(&f.work).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn it_excludes_git_dir() {
        let f = fixture();
        fs::write(f.work.join("file"), "x").unwrap();
        fs::create_dir_all(f.work.join(".git/refs")).unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_tree(&f.work).unwrap();
        assert_eq!(names(&f.store, &hash), ["file"]);
    }

    #[test]
    fn it_excludes_configured_git_dir() {
        let f = fixture();
        fs::write(f.work.join("file"), "x").unwrap();
        let meta = f.work.join("meta");
        fs::create_dir_all(meta.join("objects")).unwrap();
        let store = ObjectStore::new(meta.join("objects"));
        let config = Config {
            git_dir: meta,
            ..Config::default()
        };

        let hash = TreeBuilder::new(&store, &config).write_tree(&f.work).unwrap();
        assert_eq!(names(&store, &hash), ["file"]);
    }

    #[test]
    fn it_keeps_directory_merely_named_like_git_dir() {
        let f = fixture();
        fs::create_dir(f.work.join("meta")).unwrap();
        fs::write(f.work.join("meta/notes"), "x").unwrap();
        let config = Config {
            git_dir: f.work.join("other/meta"),
            ..Config::default()
        };

        let hash = TreeBuilder::new(&f.store, &config).write_tree(&f.work).unwrap();
        assert_eq!(names(&f.store, &hash), ["meta"]);
    }

    #[test]
    fn it_skips_entries_that_fail_mid_walk() {
        let f = fixture();
        fs::write(f.work.join("ok"), "ok").unwrap();
        fs::write(f.work.join("gone"), "gone").unwrap();
        fs::create_dir(f.work.join("gone-dir")).unwrap();

        let mut listed: Vec<_> = fs::read_dir(&f.work).unwrap().collect();
        listed.push(Err(io::Error::other("unreadable entry")));
        fs::remove_file(f.work.join("gone")).unwrap();
        fs::remove_dir(f.work.join("gone-dir")).unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_entries(&f.work, listed).unwrap();
        assert_eq!(names(&f.store, &hash), ["ok"]);
    }

    #[test]
    fn it_fails_when_root_is_missing() {
        let f = fixture();
        let builder = TreeBuilder::new(&f.store, &Config::default());
        assert!(matches!(
            builder.write_tree(f.work.join("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn it_guards_entry_count() {
        let f = fixture();
        for name in ["a", "b", "c"] {
            fs::write(f.work.join(name), name).unwrap();
        }
        let config = Config {
            max_tree_entries: 2,
            ..Config::default()
        };
        let builder = TreeBuilder::new(&f.store, &config);
        assert!(matches!(
            builder.write_tree(&f.work),
            Err(Error::ResourceExhausted(_))
        ));
    }

    #[test]
    fn it_guards_serialized_size() {
        let f = fixture();
        fs::write(f.work.join("a-rather-long-file-name"), "x").unwrap();
        let config = Config {
            max_tree_bytes: 16,
            ..Config::default()
        };
        let builder = TreeBuilder::new(&f.store, &config);
        assert!(matches!(
            builder.write_tree(&f.work),
            Err(Error::ResourceExhausted(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn it_records_executable_and_symlink_modes() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let f = fixture();
        let script = f.work.join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        symlink("run.sh", f.work.join("link")).unwrap();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_tree(&f.work).unwrap();
        let GitObject::Tree(tree) = f.store.read(&hash).unwrap() else {
            panic!("expected tree");
        };
        assert_eq!(tree.entries()[0].name(), "link");
        assert_eq!(tree.entries()[0].mode(), Mode::Symlink);
        let (_, target) = f.store.get(&tree.entries()[0].hash()).unwrap();
        assert_eq!(target, b"run.sh");
        assert_eq!(tree.entries()[1].mode(), Mode::Executable);
    }

    #[cfg(unix)]
    #[test]
    fn it_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let f = fixture();
        fs::write(f.work.join("ok"), "ok").unwrap();
        let locked = f.work.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits, in which case nothing is skipped
        let readable = fs::read_dir(&locked).is_ok();

        let builder = TreeBuilder::new(&f.store, &Config::default());
        let hash = builder.write_tree(&f.work).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let expected: &[&str] = if readable { &["locked", "ok"] } else { &["ok"] };
        assert_eq!(names(&f.store, &hash), expected);
    }
}
