use std::path::{Path, PathBuf};
use std::{env, fs, io};

use log::{debug, info};

use crate::error::BabbleError;
use crate::model::NgramGraph;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Invalid UTF-8 sequences are replaced instead of failing the read
/// - Each line has its trailing whitespace removed and is lowercased
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let bytes = fs::read(filename)?;
	let contents = String::from_utf8_lossy(&bytes);
	Ok(contents.lines().map(|line| line.trim_end().to_lowercase()).collect())
}

/// Feeds every line of a corpus file into `graph`, one sentence per line.
///
/// Returns the number of lines read.
///
/// # Errors
/// Returns [`BabbleError::Io`] if the file cannot be read. The graph is
/// left untouched in that case.
pub fn train_from_file<P: AsRef<Path>>(graph: &mut NgramGraph, filename: P) -> Result<usize, BabbleError> {
	let path = filename.as_ref();
	info!("reading corpus {}", path.display());

	let lines = read_lines(path).map_err(|source| BabbleError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let count = graph.ingest_lines(&lines);

	info!("done reading {} ({} lines)", path.display(), count);
	debug!(
		"graph: {} states, {} starters, {} stoppers",
		graph.len(),
		graph.get_starters().len(),
		graph.get_stoppers().len()
	);
	Ok(count)
}

/// Name under which a corpus file is known: its file stem.
///
/// `"./data/sample.txt"` is the corpus `"sample"`.
pub fn corpus_name<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let path = path.as_ref();
	match path.file_stem() {
		Some(stem) => Ok(stem.to_string_lossy().into_owned()),
		None => Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("{} does not name a corpus file", path.display()),
		)),
	}
}

/// Directory the corpora are read from.
///
/// An empty setting, `"."` or `"./"` means the working directory.
/// Anything else is used as given, without canonicalization.
pub fn resolve_data_dir(setting: &str) -> PathBuf {
	match setting.trim() {
		"" | "." | "./" => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
		dir => PathBuf::from(dir),
	}
}

/// Lists the stems of all files with a given extension in a directory.
///
/// Subdirectories are skipped. The result is sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(corpus_name(&path)?);
		}
	}

	files.sort();
	Ok(files)
}
