use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Splits a line into word tokens on any whitespace.
///
/// Example: `"i  ate\ta pizza"` → `["i", "ate", "a", "pizza"]`
pub fn tokenize(line: &str) -> Vec<String> {
	line.split_whitespace().map(str::to_owned).collect()
}

/// Creates the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
	match path.as_ref().parent() {
		Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
		_ => Ok(()),
	}
}
