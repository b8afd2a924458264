use std::{
	fs,
	path::{Path, PathBuf},
	process::Command,
};

use crate::prelude::*;
use super::{
	call_site::{Finding, Severity},
	lexer::{self, Token},
};

/// One reported finding, anchored to a file position instead of a token index.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostic {
	pub(crate) file: PathBuf,
	pub(crate) line: usize,
	pub(crate) column: usize,
	pub(crate) severity: Severity,
	pub(crate) rule: &'static str,
	pub(crate) message: String,
	/// Callee name, kept as structured payload next to the rendered message.
	pub(crate) callee: String,
}

impl Diagnostic {
	pub(crate) fn format(&self) -> String {
		format!(
			"{}:{}:{}: {}: [{}] {}",
			self.file.display(),
			self.line,
			self.column,
			self.severity,
			self.rule,
			self.message
		)
	}
}

#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
	pub(crate) file_count: usize,
	pub(crate) error_count: usize,
	pub(crate) warning_count: usize,
	pub(crate) output_lines: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct FileContext {
	pub(crate) path: PathBuf,
	pub(crate) tokens: Vec<Token>,
	pub(crate) line_starts: Vec<usize>,
}

pub(crate) fn diagnostic_from_finding(ctx: &FileContext, finding: Finding) -> Diagnostic {
	let offset = ctx.tokens[finding.anchor].offset;
	let line = line_from_offset(&ctx.line_starts, offset);
	let column = offset - ctx.line_starts[line - 1] + 1;

	Diagnostic {
		file: ctx.path.clone(),
		line,
		column,
		severity: finding.severity,
		rule: finding.rule,
		message: finding.message,
		callee: finding.callee,
	}
}

pub(crate) fn resolve_files(requested_files: &[PathBuf]) -> Result<Vec<PathBuf>> {
	if !requested_files.is_empty() {
		let mut files = Vec::new();

		for file in requested_files {
			if file.extension().is_some_and(|ext| ext == "php" || ext == "phtml") {
				files.push(file.clone());
			}
		}

		return Ok(files);
	}

	git_ls_files_php()
}

pub(crate) fn read_file_context(path: &Path) -> Result<Option<FileContext>> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(_) => return Ok(None),
	};

	Ok(read_file_context_from_text(path, &text))
}

pub(crate) fn read_file_context_from_text(path: &Path, text: &str) -> Option<FileContext> {
	if text.is_empty() {
		return None;
	}

	Some(FileContext {
		path: path.to_path_buf(),
		tokens: lexer::tokenize(text),
		line_starts: build_line_starts(text),
	})
}

pub(crate) fn line_from_offset(line_starts: &[usize], offset: usize) -> usize {
	match line_starts.binary_search(&offset) {
		Ok(pos) => pos + 1,
		Err(pos) => pos,
	}
}

fn git_ls_files_php() -> Result<Vec<PathBuf>> {
	let output = Command::new("git")
		.args(["ls-files", "*.php"])
		.output()
		.map_err(|err| eyre::eyre!("Failed to run git ls-files: {err}."))?;

	if !output.status.success() {
		return Err(eyre::eyre!("git ls-files failed with status {}.", output.status));
	}

	let stdout = String::from_utf8(output.stdout)?;
	let mut files = Vec::new();

	for line in stdout.lines() {
		if !line.is_empty() {
			files.push(PathBuf::from(line));
		}
	}

	Ok(files)
}

fn build_line_starts(text: &str) -> Vec<usize> {
	let mut starts = vec![0_usize];

	for (idx, ch) in text.char_indices() {
		if ch == '\n' {
			starts.push(idx + 1);
		}
	}

	starts
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn line_lookup_maps_offsets_to_one_based_lines() {
		let starts = build_line_starts("ab\ncd\nef");

		assert_eq!(starts, vec![0, 3, 6]);
		assert_eq!(line_from_offset(&starts, 0), 1);
		assert_eq!(line_from_offset(&starts, 2), 1);
		assert_eq!(line_from_offset(&starts, 3), 2);
		assert_eq!(line_from_offset(&starts, 7), 3);
	}

	#[test]
	fn empty_text_yields_no_context() {
		assert!(read_file_context_from_text(Path::new("a.php"), "").is_none());
	}

	#[test]
	fn explicit_file_arguments_are_filtered_by_extension() {
		let requested = vec![
			PathBuf::from("a.php"),
			PathBuf::from("view.phtml"),
			PathBuf::from("notes.txt"),
		];
		let resolved = resolve_files(&requested).expect("resolve explicit files");

		assert_eq!(resolved, vec![PathBuf::from("a.php"), PathBuf::from("view.phtml")]);
	}
}
