//! Driver: resolves files, fans the analyzer out over them, and aggregates
//! diagnostics for the reporting side of the CLI.

mod call_site;
mod lexer;
mod shared;

use std::path::PathBuf;

use rayon::prelude::*;

pub(crate) use call_site::AnalyzerConfig;
pub(crate) use shared::RunSummary;

use crate::prelude::*;
use call_site::{RULE_POSITIONAL_AFTER_NAMED, RULE_SHOULD_USE_NAMED, Severity};
use lexer::TokenKind;
use shared::{Diagnostic, FileContext};

pub(crate) const RULE_IDS: [&str; 2] = [RULE_POSITIONAL_AFTER_NAMED, RULE_SHOULD_USE_NAMED];

const FILE_BATCH_SIZE: usize = 64;

pub(crate) fn run_check(
	requested_files: &[PathBuf],
	config: &AnalyzerConfig,
) -> Result<RunSummary> {
	let files = shared::resolve_files(requested_files)?;
	let mut diagnostics: Vec<Diagnostic> = Vec::new();

	for batch in files.chunks(FILE_BATCH_SIZE) {
		let batch_results = batch
			.par_iter()
			.map(|file| -> Result<Vec<Diagnostic>> {
				let Some(ctx) = shared::read_file_context(file)? else {
					return Ok(Vec::new());
				};

				Ok(collect_diagnostics(&ctx, config))
			})
			.collect::<Vec<_>>();

		for result in batch_results {
			diagnostics.extend(result?);
		}
	}

	diagnostics.sort_by(|a, b| {
		a.file
			.cmp(&b.file)
			.then(a.line.cmp(&b.line))
			.then(a.column.cmp(&b.column))
			.then(a.rule.cmp(b.rule))
			.then(a.callee.cmp(&b.callee))
	});

	let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
	let warning_count = diagnostics.len() - error_count;
	let output_lines = diagnostics.into_iter().map(|d| d.format()).collect::<Vec<_>>();

	Ok(RunSummary { file_count: files.len(), error_count, warning_count, output_lines })
}

pub(crate) fn print_coverage() {
	for rule in RULE_IDS {
		println!("{rule}\timplemented");
	}
}

/// Every identifier token is an independent call-site candidate, so nested
/// calls inside an argument list get their own findings.
fn collect_diagnostics(ctx: &FileContext, config: &AnalyzerConfig) -> Vec<Diagnostic> {
	let mut diagnostics = Vec::new();

	for (idx, token) in ctx.tokens.iter().enumerate() {
		if token.kind != TokenKind::Identifier {
			continue;
		}

		for finding in call_site::analyze(&ctx.tokens, idx, config) {
			diagnostics.push(shared::diagnostic_from_finding(ctx, finding));
		}
	}

	diagnostics
}
