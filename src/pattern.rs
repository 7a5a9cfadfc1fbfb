//! Glob dialect used by search entries.
//!
//! A pattern is either anchored at the root (`*.md`, `docs/*.md`) or
//! recursive (`**/SKILL.md`, `**/commands/*.md`). For recursive patterns the
//! directory segments between `**/` and the file name are matched against the
//! *end* of each directory's path relative to the root, so
//! `**/commands/*.md` finds `commands/a.md` as well as
//! `plugins/x/commands/b.md`. A single `{a,b}` group expands to one pattern
//! per alternative; the matched file sets are unioned.

use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One compiled path segment (`*`, `?`, literals).
#[derive(Debug, Clone)]
pub enum Segment {
    /// The bare `*`.
    Any,
    Glob(Regex),
    /// A glob too large to compile.
    Never,
}

impl Segment {
    pub fn new(glob: &str) -> Self {
        if glob == "*" {
            return Segment::Any;
        }
        let mut re = String::with_capacity(glob.len() + 8);
        re.push('^');
        for c in glob.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                c => re.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }
        re.push('$');
        match Regex::new(&re) {
            Ok(re) => Segment::Glob(re),
            Err(e) => {
                debug!("Unusable glob segment '{}': {}", glob, e);
                Segment::Never
            }
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::Glob(re) => re.is_match(text),
            Segment::Never => false,
        }
    }
}

/// Expand the first `{a,b,c}` group, recursing for any group that remains.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };

    let head = &pattern[..open];
    let tail = &pattern[close + 1..];
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{head}{alt}{tail}")))
        .collect()
}

#[derive(Debug, Clone)]
enum Shape {
    /// Directory segments matched from the root downwards.
    Anchored(Vec<Segment>),
    /// Directory segments matched against the tail of any directory path.
    Recursive(Vec<Segment>),
}

/// A brace-free pattern, compiled.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    shape: Shape,
    file: Segment,
}

impl GlobPattern {
    pub fn parse(pattern: &str) -> Self {
        let (recursive, rest) = match pattern.strip_prefix("**/") {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        let (dirs, file) = match rest.rsplit_once('/') {
            Some((dirs, file)) => (dirs.split('/').map(Segment::new).collect(), file),
            None => (Vec::new(), rest),
        };
        let shape = if recursive {
            Shape::Recursive(dirs)
        } else {
            Shape::Anchored(dirs)
        };
        Self {
            shape,
            file: Segment::new(file),
        }
    }

    /// Files under `root` matching this pattern, in traversal order.
    pub fn find(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        match &self.shape {
            Shape::Anchored(dirs) if dirs.is_empty() => self.scan_dir(root, &mut files),
            Shape::Anchored(dirs) => {
                for dir in walk_dirs(root, dirs.len(), Some(dirs.len())) {
                    if segments_match(dirs, &relative_segments(root, &dir)) {
                        self.scan_dir(&dir, &mut files);
                    }
                }
            }
            Shape::Recursive(intermediate) if intermediate.is_empty() => {
                self.scan_dir(root, &mut files);
                for dir in walk_dirs(root, 1, None) {
                    self.scan_dir(&dir, &mut files);
                }
            }
            Shape::Recursive(intermediate) => {
                for dir in walk_dirs(root, 1, None) {
                    let segments = relative_segments(root, &dir);
                    if segments.len() < intermediate.len() {
                        continue;
                    }
                    let tail = &segments[segments.len() - intermediate.len()..];
                    if segments_match(intermediate, tail) {
                        self.scan_dir(&dir, &mut files);
                    }
                }
            }
        }
        files
    }

    /// Direct children of `dir` that are files matching the file segment.
    fn scan_dir(&self, dir: &Path, out: &mut Vec<PathBuf>) {
        let read_dir = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) => {
                debug!("Cannot read directory {:?}: {}", dir, e);
                return;
            }
        };
        let mut found: Vec<PathBuf> = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.file.matches(n))
            })
            .collect();
        found.sort();
        out.extend(found);
    }
}

fn segments_match(globs: &[Segment], names: &[String]) -> bool {
    globs.len() == names.len() && globs.iter().zip(names).all(|(g, n)| g.matches(n))
}

fn relative_segments(root: &Path, dir: &Path) -> Vec<String> {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// Depth-first directory walk. Unreadable directories are skipped.
fn walk_dirs(root: &Path, min_depth: usize, max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).min_depth(min_depth).sort_by_file_name();
    if let Some(max) = max_depth {
        walker = walker.max_depth(max);
    }
    walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!("Skipping during walk of {:?}: {}", root, e);
                None
            }
        })
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect()
}

/// Files under `root` matching `pattern` after brace expansion, without duplicates.
pub fn find_files(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for expanded in expand_braces(pattern) {
        for path in GlobPattern::parse(&expanded).find(root) {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    files
}
