//! Name-based lookup of the files in a mod directory.
//!
//! Every file is indexed under two keys: its short lump name (lowercased,
//! everything from the first dot dropped, at most 8 characters) and its full
//! path relative to the mod root (lowercased, `/` separators). When two files
//! share a key, the one walked later wins. The walk is sorted by file name, so
//! the winner is stable for a given tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use walkdir::WalkDir;

use crate::{BoxedIncludeProviderError, IncludeProvider, PreviewError, ResolvedIncludePath};

const SHORT_NAME_LEN: usize = 8;

/// A single file found under the mod root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lump {
    /// Short lump name, e.g. `gldefs` for `GLDEFS.txt`
    pub short_name: String,

    /// Lowercased path relative to the mod root, using `/` separators
    pub relative_path: String,

    /// Location on disk
    pub path: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct LumpIndex {
    root: PathBuf,
    lumps: Vec<Lump>,
    by_short_name: HashMap<String, PathBuf>,
    by_path: HashMap<String, PathBuf>,
}

/// Short lump name of a file name or path: the last component, cut at its
/// first dot, lowercased and truncated to 8 characters.
pub fn short_name(name: &str) -> String {
    let normalized = normalize_path(name);
    let file_name = normalized.rsplit('/').next().unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    stem.chars().take(SHORT_NAME_LEN).collect()
}

/// Lowercase, use `/` separators and drop any leading `./` or `/`.
pub fn normalize_path(name: &str) -> String {
    let mut normalized = name.trim().replace('\\', "/").to_lowercase();
    loop {
        if let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_owned();
        } else if let Some(rest) = normalized.strip_prefix('/') {
            normalized = rest.to_owned();
        } else {
            return normalized;
        }
    }
}

impl LumpIndex {
    /// Walk `root` recursively and index every file found.
    ///
    /// Entries that cannot be read (dangling links, link loops, unreadable
    /// directories) are logged and skipped. Only an unreadable `root` fails.
    pub fn build(root: impl AsRef<Path>) -> Result<LumpIndex, PreviewError> {
        let root = root.as_ref();
        let mut index = LumpIndex {
            root: root.to_path_buf(),
            ..Default::default()
        };

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    log::warn!("skipping entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let relative_path = normalize_path(&relative.to_string_lossy());

            index.insert(Lump {
                short_name: short_name(&relative_path),
                relative_path,
                path,
            });
        }

        log::debug!(
            "indexed {} lumps under {}",
            index.lumps.len(),
            root.display()
        );

        Ok(index)
    }

    /// Run [`LumpIndex::build`] on a worker thread and hand the result to
    /// `callback` once the walk is done.
    pub fn build_in_background<F>(root: impl Into<PathBuf>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<LumpIndex, PreviewError>) + Send + 'static,
    {
        let root = root.into();
        std::thread::spawn(move || callback(LumpIndex::build(&root)))
    }

    fn insert(&mut self, lump: Lump) {
        self.by_short_name
            .insert(lump.short_name.clone(), lump.path.clone());
        self.by_path
            .insert(lump.relative_path.clone(), lump.path.clone());
        self.lumps.push(lump);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every indexed file, in walk order.
    pub fn lumps(&self) -> &[Lump] {
        &self.lumps
    }

    /// All files with the given short name, in walk order.
    pub fn lumps_named<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s Lump> + 's {
        let name = short_name(name);
        self.lumps.iter().filter(move |lump| lump.short_name == name)
    }

    /// Look up `name` as a relative path first, then as a short lump name.
    pub fn resolve(&self, name: &str) -> Result<&Path, PreviewError> {
        let normalized = normalize_path(name);

        self.by_path
            .get(&normalized)
            .or_else(|| self.by_short_name.get(&short_name(&normalized)))
            .map(PathBuf::as_path)
            .ok_or_else(|| PreviewError::Resolution {
                name: name.to_owned(),
            })
    }
}

impl IncludeProvider for &LumpIndex {
    fn resolve_path(&self, path: &str) -> Result<ResolvedIncludePath, BoxedIncludeProviderError> {
        let resolved = self.resolve(path)?;
        Ok(ResolvedIncludePath(resolved.to_string_lossy().into_owned()))
    }

    fn get_include(
        &mut self,
        resolved: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError> {
        let bytes = std::fs::read(&resolved.0)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, relative).unwrap();
        path
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name("GLDEFS"), "gldefs");
        assert_eq!(short_name("GLDEFS.txt"), "gldefs");
        assert_eq!(short_name("filter/doom/GLDEFS.brick.txt"), "gldefs");
        assert_eq!(short_name("textures\\LongTextureName.png"), "longtext");
        assert_eq!(short_name(""), "");
    }

    #[test]
    fn normalized_paths() {
        assert_eq!(normalize_path("Textures\\Brick.PNG"), "textures/brick.png");
        assert_eq!(normalize_path("./shaders/s.fp"), "shaders/s.fp");
        assert_eq!(normalize_path("/shaders/s.fp"), "shaders/s.fp");
    }

    #[test]
    fn full_path_beats_short_name() {
        let dir = tempfile::tempdir().unwrap();
        let first = touch(dir.path(), "a/B.txt");
        let second = touch(dir.path(), "c/B.png");

        let index = LumpIndex::build(dir.path()).unwrap();

        assert_eq!(index.resolve("a/b.txt").unwrap(), first);
        assert_eq!(index.resolve("A\\B.TXT").unwrap(), first);
        assert_eq!(index.resolve("c/b.png").unwrap(), second);

        // Sorted walk: `c/` comes after `a/`, so it owns the short name.
        assert_eq!(index.resolve("b").unwrap(), second);
        assert_eq!(index.resolve("B.whatever").unwrap(), second);
    }

    #[test]
    fn every_file_reachable_by_short_name() {
        let dir = tempfile::tempdir().unwrap();
        let brick = touch(dir.path(), "textures/BRICK1.png");
        let shader = touch(dir.path(), "shaders/glsl/Brick.fp");

        let index = LumpIndex::build(dir.path()).unwrap();

        assert_eq!(index.lumps().len(), 2);
        assert_eq!(index.resolve("brick1").unwrap(), brick);
        assert_eq!(index.resolve("brick").unwrap(), shader);
        assert_eq!(index.resolve("shaders/glsl/brick.fp").unwrap(), shader);
    }

    #[test]
    fn missing_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "textures/brick1.png");

        let index = LumpIndex::build(dir.path()).unwrap();

        match index.resolve("nothere") {
            Err(PreviewError::Resolution { name }) => assert_eq!(name, "nothere"),
            val => panic!("{:?}", val),
        }
    }

    #[test]
    fn lumps_named_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "GLDEFS.txt");
        touch(dir.path(), "filter/GLDEFS.bricks");
        touch(dir.path(), "textures/brick1.png");

        let index = LumpIndex::build(dir.path()).unwrap();
        let found: Vec<_> = index
            .lumps_named("GLDEFS")
            .map(|lump| lump.relative_path.as_str())
            .collect();

        // Uppercase sorts before lowercase in the walk.
        assert_eq!(found, vec!["gldefs.txt", "filter/gldefs.bricks"]);
    }

    #[cfg(unix)]
    #[test]
    fn bad_links_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "GLDEFS.txt");
        let brick = touch(dir.path(), "textures/brick1.png");
        std::os::unix::fs::symlink(dir.path().join("gone.png"), dir.path().join("dangling"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("textures/loop")).unwrap();

        let index = LumpIndex::build(dir.path()).unwrap();

        assert_eq!(index.resolve("brick1").unwrap(), brick);
        assert!(index.resolve("gldefs").is_ok());
        assert!(index.resolve("dangling").is_err());
    }

    #[test]
    fn missing_root() {
        let dir = tempfile::tempdir().unwrap();

        match LumpIndex::build(dir.path().join("nothere")) {
            Err(PreviewError::Walk(_)) => {}
            val => panic!("{:?}", val),
        }
    }

    #[test]
    fn background_build() {
        let dir = tempfile::tempdir().unwrap();
        let brick = touch(dir.path(), "brick1.png");

        let (tx, rx) = std::sync::mpsc::channel();
        LumpIndex::build_in_background(dir.path(), move |index| {
            tx.send(index).unwrap();
        })
        .join()
        .unwrap();

        let index = rx.recv().unwrap().unwrap();
        assert_eq!(index.resolve("brick1").unwrap(), brick);
    }
}
