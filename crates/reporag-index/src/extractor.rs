//! Source file discovery and text extraction.

use std::collections::HashSet;
use std::path::Path;

/// Extensions ingested when no override is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".tsx", ".jsx", ".ipynb", ".java", ".cpp", ".ts", ".go", ".rs", ".vue", ".swift",
    ".c", ".h",
];

/// Directory names whose whole subtree is skipped.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "venv",
    "env",
    "dist",
    "build",
    ".git",
    "__pycache__",
    ".next",
    ".vscode",
    "vendor",
];

/// Files larger than this are skipped by default (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Allowed extensions, with or without the leading dot. Matched case-sensitively.
    pub extensions: Vec<String>,
    /// Directory names excluded wherever they appear below the root.
    pub ignored_dirs: Vec<String>,
    pub max_file_size: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| (*s).to_owned()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// One source file: its `/`-separated path relative to the root and its UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub identifier: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Extraction result: readable documents plus the files that failed to read.
#[derive(Debug, Default)]
pub struct Extraction {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

fn relative_identifier(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_allowed_extension(path: &Path, allowed: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| allowed.contains(ext))
}

/// Walk `root` and read every allowed, non-excluded file.
///
/// Unreadable, oversized, or non-UTF-8 files are logged and reported in
/// [`Extraction::skipped`]; they never abort the walk. Documents are sorted by identifier.
#[must_use]
pub fn extract(root: &Path, config: &ExtractorConfig) -> Extraction {
    let allowed: HashSet<String> = config
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_owned())
        .collect();
    let ignored: HashSet<String> = config.ignored_dirs.iter().cloned().collect();

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| ignored.contains(name)))
        })
        .build();

    let mut extraction = Extraction::default();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file())
            || !has_allowed_extension(entry.path(), &allowed)
        {
            continue;
        }

        let identifier = relative_identifier(root, entry.path());
        match read_document(entry.path(), config.max_file_size) {
            Ok(text) => extraction.documents.push(Document { identifier, text }),
            Err(reason) => {
                tracing::warn!(file = %identifier, %reason, "skipping file");
                extraction.skipped.push(SkippedFile {
                    path: identifier,
                    reason,
                });
            }
        }
    }

    extraction
        .documents
        .sort_by(|a, b| a.identifier.cmp(&b.identifier));
    extraction
}

fn read_document(path: &Path, max_size: u64) -> Result<String, String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("stat failed: {e}"))?;
    if meta.len() > max_size {
        return Err(format!("file too large ({} bytes > {max_size})", meta.len()));
    }
    let bytes = std::fs::read(path).map_err(|e| format!("read failed: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn identifiers(ex: &Extraction) -> Vec<&str> {
        ex.documents.iter().map(|d| d.identifier.as_str()).collect()
    }

    #[test]
    fn default_config_lists() {
        let cfg = ExtractorConfig::default();
        assert_eq!(cfg.extensions.len(), 14);
        assert!(cfg.extensions.contains(&".ipynb".to_owned()));
        assert!(cfg.ignored_dirs.contains(&"node_modules".to_owned()));
        assert_eq!(cfg.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn extracts_allowed_extensions_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.py", b"print('hi')");
        write(dir.path(), "src/lib.rs", b"pub fn f() {}");
        write(dir.path(), "README.md", b"# readme");
        write(dir.path(), "Makefile", b"all:");

        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), ["app.py", "src/lib.rs"]);
        assert_eq!(ex.documents[0].text, "print('hi')");
        assert!(ex.skipped.is_empty());
    }

    #[test]
    fn excludes_denied_directories_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "node_modules/lib.js", b"x");
        write(dir.path(), "web/node_modules/pkg/index.js", b"x");
        write(dir.path(), ".git/hooks/pre-commit.py", b"x");
        write(dir.path(), "pkg/__pycache__/mod.py", b"x");
        write(dir.path(), "web/index.js", b"ok");

        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), ["web/index.js"]);
    }

    #[test]
    fn deny_list_matches_whole_components_not_substrings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "environment/config.py", b"x");
        write(dir.path(), "builder/main.go", b"x");
        write(dir.path(), "env/site.py", b"x");

        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), ["builder/main.go", "environment/config.py"]);
    }

    #[test]
    fn root_named_like_denied_dir_is_still_walked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("build");
        write(&root, "main.c", b"int main() {}");

        let ex = extract(&root, &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), ["main.c"]);
    }

    #[test]
    fn hidden_and_gitignored_files_are_included() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", b"generated.ts\n");
        write(dir.path(), "generated.ts", b"export {}");
        write(dir.path(), ".config/setup.js", b"x");

        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), [".config/setup.js", "generated.ts"]);
    }

    #[test]
    fn non_utf8_file_is_skipped_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.c", &[0xff, 0xfe, 0x00, 0x80]);
        write(dir.path(), "good.c", b"int x;");

        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert_eq!(identifiers(&ex), ["good.c"]);
        assert_eq!(ex.skipped.len(), 1);
        assert_eq!(ex.skipped[0].path, "bad.c");
        assert!(ex.skipped[0].reason.contains("UTF-8"));
    }

    #[test]
    fn oversized_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.go", &[b'a'; 64]);
        let cfg = ExtractorConfig {
            max_file_size: 16,
            ..ExtractorConfig::default()
        };
        let ex = extract(dir.path(), &cfg);
        assert!(ex.documents.is_empty());
        assert!(ex.skipped[0].reason.contains("too large"));
    }

    #[test]
    fn custom_extensions_accept_missing_dot() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.md", b"# x");
        write(dir.path(), "app.py", b"x");
        let cfg = ExtractorConfig {
            extensions: vec!["md".into()],
            ..ExtractorConfig::default()
        };
        let ex = extract(dir.path(), &cfg);
        assert_eq!(identifiers(&ex), ["notes.md"]);
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "LEGACY.PY", b"x");
        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert!(ex.documents.is_empty());
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ex = extract(dir.path(), &ExtractorConfig::default());
        assert!(ex.documents.is_empty());
        assert!(ex.skipped.is_empty());
    }
}
