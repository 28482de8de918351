//! Package loading
//!
//! Reads and parses the files of one package. Files are independent, so
//! they are parsed on scoped worker threads; results come back in
//! enumeration order and the first failure in that order wins.

use std::path::{Path, PathBuf};
use std::thread;

use log::debug;

use crate::frontend::ast;
use crate::frontend::parse_file;
use crate::frontend::source::SourceProvider;
use crate::utils::{Error, Result};

/// One successfully parsed file
#[derive(Debug)]
pub(crate) struct ParsedFile {
    pub name: String,
    pub path: PathBuf,
    pub ast: ast::File,
}

/// Key of a file in its package's file table: the file name without
/// extension
pub(crate) fn file_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_one(source: &dyn SourceProvider, path: &Path, file_id: usize) -> Result<ParsedFile> {
    let text = source.read(path)?;
    let ast = parse_file(&text, file_id).map_err(|e| e.in_file(path))?;
    debug!("parsed {} ({} declarations)", path.display(), ast.decls.len());

    Ok(ParsedFile {
        name: file_key(path),
        path: path.to_path_buf(),
        ast,
    })
}

/// Parse `files`, numbering their spans from `first_id`
///
/// Nothing is returned unless every file parses.
pub(crate) fn parse_package(
    source: &dyn SourceProvider,
    files: &[PathBuf],
    first_id: usize,
    parallel: bool,
) -> Result<Vec<ParsedFile>> {
    if !parallel || files.len() < 2 {
        return files
            .iter()
            .enumerate()
            .map(|(i, path)| parse_one(source, path, first_id + i))
            .collect();
    }

    let results: Vec<Result<ParsedFile>> = thread::scope(|scope| {
        let workers: Vec<_> = files
            .iter()
            .enumerate()
            .map(|(i, path)| scope.spawn(move || parse_one(source, path, first_id + i)))
            .collect();

        workers
            .into_iter()
            .zip(files)
            .map(|(worker, path)| {
                worker
                    .join()
                    .unwrap_or_else(|_| Err(Error::Io(format!("{}: parser thread panicked", path.display()))))
            })
            .collect()
    });

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::MemorySource;
    use pretty_assertions::assert_eq;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_file("geom/a.go", "package geom\n\ntype Point struct{ X, Y float64 }\n")
            .with_file("geom/b.go", "package geom\n\nvar Origin = Point{}\n")
            .with_file("geom/c.go", "package geom\n\nfunc Dist(p, q Point) float64 { return 0 }\n")
    }

    #[test]
    fn test_parallel_matches_sequential_order() {
        let source = source();
        let files = source.list("geom").expect("geom has files");

        let parallel = parse_package(&source, &files, 0, true).expect("all files parse");
        let sequential = parse_package(&source, &files, 0, false).expect("all files parse");

        let names = |parsed: &[ParsedFile]| parsed.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&parallel), vec!["a", "b", "c"]);
        assert_eq!(names(&parallel), names(&sequential));
        assert_eq!(parallel[2].ast.span.file_id, 2);
    }

    #[test]
    fn test_first_failure_is_reported() {
        let source = MemorySource::new()
            .with_file("bad/a.go", "package bad\n")
            .with_file("bad/b.go", "package bad\nvar = 1\n")
            .with_file("bad/c.go", "package bad\nconst = 2\n");
        let files = source.list("bad").expect("bad has files");

        let err = parse_package(&source, &files, 0, true).unwrap_err();
        match err {
            Error::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad/b.go")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_key_strips_extension() {
        assert_eq!(file_key(Path::new("pkg/util.go")), "util");
    }
}
