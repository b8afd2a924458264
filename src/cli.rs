// crates.io
use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};

// std
use std::{path::PathBuf, process::ExitCode};

// self
use crate::{
	checker::{self, AnalyzerConfig, RunSummary},
	prelude::*,
};

/// Command-line interface for the PHP named-argument checker.
#[derive(Debug, Parser)]
#[command(
	version = concat!(
		env!("CARGO_PKG_VERSION"),
		"-",
		env!("VERGEN_GIT_SHA"),
		"-",
		env!("VERGEN_CARGO_TARGET_TRIPLE"),
	),
	rename_all = "kebab",
	styles = styles(),
)]
pub(crate) struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Check call sites and report argument-style diagnostics.
	Check {
		/// Optional PHP files. Defaults to git-tracked `*.php`.
		files: Vec<PathBuf>,
		/// Extra callee names exempted from the named-argument advisory.
		#[arg(long, value_name = "NAME")]
		skip_callee: Vec<String>,
		/// Extra data-mapper method names excluded from analysis entirely.
		#[arg(long, value_name = "NAME")]
		mapper_method: Vec<String>,
	},
	/// Print implemented rule codes.
	Coverage,
}

impl Cli {
	pub(crate) fn run(&self) -> Result<ExitCode> {
		match &self.command {
			Command::Check { files, skip_callee, mapper_method } => {
				let config = AnalyzerConfig::default()
					.with_advisory_skips(skip_callee)
					.with_mapper_methods(mapper_method);
				let summary = checker::run_check(files, &config)?;

				print_summary(&summary);

				if summary.error_count > 0 {
					eprintln!("\nFound {} fatal argument-order error(s).", summary.error_count);

					return Ok(ExitCode::FAILURE);
				}
			},
			Command::Coverage => checker::print_coverage(),
		}

		Ok(ExitCode::SUCCESS)
	}
}

fn print_summary(summary: &RunSummary) {
	for line in &summary.output_lines {
		println!("{line}");
	}

	println!("\nChecked {} file(s).", summary.file_count);

	if summary.warning_count > 0 {
		println!("{} warning(s) are advisory and do not fail the check.", summary.warning_count);
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_check_subcommand() {
		let cli = Cli::parse_from(["app", "check"]);
		assert!(matches!(cli.command, Command::Check { .. }));
	}

	#[test]
	fn parses_repeatable_set_overrides() {
		let cli = Cli::parse_from([
			"app",
			"check",
			"--skip-callee",
			"render",
			"--skip-callee",
			"dump",
			"--mapper-method",
			"load",
		]);

		let Command::Check { skip_callee, mapper_method, .. } = cli.command else {
			panic!("Expected the check subcommand.");
		};

		assert_eq!(skip_callee, vec!["render", "dump"]);
		assert_eq!(mapper_method, vec!["load"]);
	}
}
