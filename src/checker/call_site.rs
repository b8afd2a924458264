//! Call-site argument-style analysis.
//!
//! A call site is an identifier token whose next significant token is an open
//! paren, outside any declaration context. Two findings can come out of one:
//! a fatal `PositionalAfterNamedArgument` error, or a `ShouldUseNamedParameters`
//! advisory when the whole argument list is positional. Every abort path is a
//! silent no-op; the analyzer never fails, it only emits findings or nothing.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::lexer::{Token, TokenKind};

pub(crate) const RULE_POSITIONAL_AFTER_NAMED: &str = "PositionalAfterNamedArgument";
pub(crate) const RULE_SHOULD_USE_NAMED: &str = "ShouldUseNamedParameters";

/// Methods of the base persistence mapper; their signatures do not take named
/// arguments, so member calls to them are never analyzed.
const MAPPER_METHODS: &[&str] = &[
	"find",
	"findentity",
	"findall",
	"findentities",
	"insert",
	"update",
	"delete",
	"insertorupdate",
];

/// Builtins with no benefit from naming: I/O and dump primitives, type
/// predicates, string/array/math/filesystem/time primitives, and variadic or
/// special calling conventions that do not support named arguments at all.
const ADVISORY_SKIPS: &[&str] = &[
	"array_filter",
	"array_key_exists",
	"array_keys",
	"array_map",
	"array_merge",
	"array_values",
	"basename",
	"boolval",
	"call_user_func",
	"call_user_func_array",
	"ceil",
	"compact",
	"count",
	"date",
	"dirname",
	"explode",
	"file_exists",
	"file_get_contents",
	"file_put_contents",
	"floatval",
	"floor",
	"fprintf",
	"func_get_args",
	"implode",
	"in_array",
	"intval",
	"is_array",
	"is_bool",
	"is_callable",
	"is_float",
	"is_int",
	"is_null",
	"is_numeric",
	"is_object",
	"is_string",
	"json_decode",
	"json_encode",
	"ltrim",
	"max",
	"microtime",
	"min",
	"printf",
	"print_r",
	"round",
	"rtrim",
	"sort",
	"sprintf",
	"str_contains",
	"str_replace",
	"strlen",
	"strpos",
	"strtolower",
	"strtoupper",
	"strval",
	"substr",
	"time",
	"trim",
	"unlink",
	"usort",
	"var_dump",
	"vsprintf",
];

static DEFAULT_MAPPER_METHODS: Lazy<HashSet<String>> =
	Lazy::new(|| MAPPER_METHODS.iter().map(|name| (*name).to_owned()).collect());
static DEFAULT_ADVISORY_SKIPS: Lazy<HashSet<String>> =
	Lazy::new(|| ADVISORY_SKIPS.iter().map(|name| (*name).to_owned()).collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
	Error,
	Warning,
}

impl std::fmt::Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warning => write!(f, "warning"),
		}
	}
}

/// One finding for one call site, anchored to the callee's token index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
	pub(crate) anchor: usize,
	pub(crate) severity: Severity,
	pub(crate) rule: &'static str,
	pub(crate) message: String,
	pub(crate) callee: String,
}

/// The two name sets the analyzer consults, injectable so adopters can extend
/// them without touching the analysis itself. Lookups are on lower-cased names.
#[derive(Debug, Clone)]
pub(crate) struct AnalyzerConfig {
	mapper_methods: HashSet<String>,
	advisory_skips: HashSet<String>,
}

impl Default for AnalyzerConfig {
	fn default() -> Self {
		Self {
			mapper_methods: DEFAULT_MAPPER_METHODS.clone(),
			advisory_skips: DEFAULT_ADVISORY_SKIPS.clone(),
		}
	}
}

impl AnalyzerConfig {
	pub(crate) fn with_mapper_methods(mut self, names: &[String]) -> Self {
		self.mapper_methods.extend(names.iter().map(|name| name.to_ascii_lowercase()));

		self
	}

	pub(crate) fn with_advisory_skips(mut self, names: &[String]) -> Self {
		self.advisory_skips.extend(names.iter().map(|name| name.to_ascii_lowercase()));

		self
	}

	fn is_mapper_method(&self, lowercased: &str) -> bool {
		self.mapper_methods.contains(lowercased)
	}

	fn skips_advisory(&self, lowercased: &str) -> bool {
		self.advisory_skips.contains(lowercased)
	}
}

#[derive(Debug)]
struct CallSite {
	callee: usize,
	/// First token index strictly inside the parens.
	args_start: usize,
	/// Index of the matching close paren (exclusive end of the interior).
	args_end: usize,
}

/// Analyzes one candidate identifier position. Returns at most one finding:
/// the fatal ordering error short-circuits the advisory pass.
pub(crate) fn analyze(tokens: &[Token], candidate: usize, config: &AnalyzerConfig) -> Vec<Finding> {
	let Some(site) = qualify(tokens, candidate, config) else {
		return Vec::new();
	};

	if let Some(finding) = check_argument_order(tokens, &site) {
		return vec![finding];
	}

	check_named_usage(tokens, &site, config).into_iter().collect()
}

fn qualify(tokens: &[Token], candidate: usize, config: &AnalyzerConfig) -> Option<CallSite> {
	let token = tokens.get(candidate)?;

	if token.kind != TokenKind::Identifier {
		return None;
	}

	let open = find_next_significant(tokens, candidate + 1, tokens.len())?;

	if tokens[open].kind != TokenKind::OpenParen {
		return None;
	}
	// A declaration's parameter list must never be analyzed as an argument list.
	if in_declaration_context(tokens, candidate) {
		return None;
	}

	let is_member_call = find_prev_significant(tokens, candidate)
		.is_some_and(|prev| tokens[prev].kind == TokenKind::MemberAccess);

	if is_member_call && config.is_mapper_method(&token.text.to_ascii_lowercase()) {
		return None;
	}

	let close = find_matching_close(tokens, open)?;

	if open + 1 == close {
		return None;
	}
	// `foo(...)` is first-class callable syntax; it passes no arguments.
	if is_first_class_callable(tokens, open + 1, close) {
		return None;
	}

	Some(CallSite { callee: candidate, args_start: open + 1, args_end: close })
}

fn is_first_class_callable(tokens: &[Token], start: usize, end: usize) -> bool {
	let Some(first) = find_next_significant(tokens, start, end) else {
		return false;
	};

	tokens[first].kind == TokenKind::Ellipsis
		&& find_next_significant(tokens, first + 1, end).is_none()
}

/// Scans backward to the nearest statement boundary; hitting a function
/// keyword first means `candidate` names a declaration, not a call.
fn in_declaration_context(tokens: &[Token], candidate: usize) -> bool {
	for token in tokens[..candidate].iter().rev() {
		if token.kind.is_statement_boundary() {
			return false;
		}
		if token.kind == TokenKind::FunctionKeyword {
			return true;
		}
	}

	false
}

fn find_next_significant(tokens: &[Token], from: usize, to: usize) -> Option<usize> {
	tokens[from.min(to)..to]
		.iter()
		.position(|token| !token.kind.is_trivia())
		.map(|found| from + found)
}

fn find_prev_significant(tokens: &[Token], before: usize) -> Option<usize> {
	tokens[..before].iter().rposition(|token| !token.kind.is_trivia())
}

/// Prefers the tokenizer's precomputed match; falls back to a depth scan so a
/// cheap tokenizer without a bracket table can feed the analyzer too.
fn find_matching_close(tokens: &[Token], open: usize) -> Option<usize> {
	if let Some(close) = tokens[open].matching_paren {
		return Some(close);
	}

	let mut depth = 1_u32;

	for (idx, token) in tokens.iter().enumerate().skip(open + 1) {
		match token.kind {
			TokenKind::OpenParen => depth += 1,
			TokenKind::CloseParen => {
				depth -= 1;

				if depth == 0 {
					return Some(idx);
				}
			},
			_ => {},
		}
	}

	None
}

/// True when the first significant token of an argument starts a named one:
/// either a pre-marked label, or any token whose next significant neighbor
/// within the list is a colon (covers tokenizers that do not mark labels).
fn argument_is_named(tokens: &[Token], first: usize, args_end: usize) -> bool {
	if matches!(tokens[first].kind, TokenKind::Label | TokenKind::Colon) {
		return true;
	}

	find_next_significant(tokens, first + 1, args_end)
		.is_some_and(|next| tokens[next].kind == TokenKind::Colon)
}

fn check_argument_order(tokens: &[Token], site: &CallSite) -> Option<Finding> {
	let mut depth = 0_i32;
	let mut named_seen = false;
	let mut expecting_argument = true;

	for (idx, token) in bounded(tokens, site) {
		if depth == 0 {
			if token.kind == TokenKind::Comma {
				expecting_argument = true;

				continue;
			}
			if expecting_argument && !token.kind.is_trivia() {
				expecting_argument = false;

				if argument_is_named(tokens, idx, site.args_end) {
					named_seen = true;
				} else if named_seen {
					let callee = tokens[site.callee].text.clone();

					return Some(Finding {
						anchor: site.callee,
						severity: Severity::Error,
						rule: RULE_POSITIONAL_AFTER_NAMED,
						message: format!(
							"Cannot pass a positional argument after a named argument in the call to `{callee}`; this is fatal in PHP, every argument after the first named one must be named as well."
						),
						callee,
					});
				}
			}
		}
		if token.kind.opens_nesting() {
			depth += 1;
		} else if token.kind.closes_nesting() {
			depth -= 1;
		}
	}

	None
}

fn check_named_usage(tokens: &[Token], site: &CallSite, config: &AnalyzerConfig) -> Option<Finding> {
	let mut depth = 0_i32;
	let mut top_level_commas = 0_usize;
	let mut has_content = false;
	let mut named_used = false;
	let mut expecting_argument = true;

	for (idx, token) in bounded(tokens, site) {
		if depth == 0 {
			if token.kind == TokenKind::Comma {
				top_level_commas += 1;
				expecting_argument = true;
			} else if !token.kind.is_trivia() {
				has_content = true;

				if token.kind == TokenKind::Label
					|| (expecting_argument && argument_is_named(tokens, idx, site.args_end))
				{
					named_used = true;
				}

				expecting_argument = false;
			}
		}
		if token.kind.opens_nesting() {
			depth += 1;
		} else if token.kind.closes_nesting() {
			depth -= 1;
		}
	}

	if !has_content || named_used {
		return None;
	}

	let callee = tokens[site.callee].text.clone();

	if config.skips_advisory(&callee.to_ascii_lowercase()) {
		return None;
	}

	let argument_count = top_level_commas + 1;

	Some(Finding {
		anchor: site.callee,
		severity: Severity::Warning,
		rule: RULE_SHOULD_USE_NAMED,
		message: format!(
			"Call to `{callee}` passes {argument_count} positional argument(s); consider named arguments (`name: value`) instead."
		),
		callee,
	})
}

fn bounded<'a>(
	tokens: &'a [Token],
	site: &CallSite,
) -> impl Iterator<Item = (usize, &'a Token)> + 'a {
	tokens.iter().enumerate().take(site.args_end).skip(site.args_start)
}
