//! Minimal PHP tokenizer feeding the call-site analyzer.
//!
//! Only the lexical shape the analyzer cares about is modeled: identifiers,
//! variables, argument labels, member-access operators, brackets, commas,
//! statement boundaries, and trivia. Everything else lexes as [`TokenKind::Other`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
	Identifier,
	Variable,
	FunctionKeyword,
	/// Reserved control-flow or construct keyword; never names a callable.
	Keyword,
	/// An identifier immediately followed by a single colon, i.e. a named-argument label.
	Label,
	Colon,
	/// `->`, `?->`, or `::`.
	MemberAccess,
	OpenParen,
	CloseParen,
	OpenBracket,
	CloseBracket,
	OpenBrace,
	CloseBrace,
	Comma,
	Semicolon,
	/// `...`, both argument unpacking and first-class callable syntax.
	Ellipsis,
	Whitespace,
	Comment,
	Other,
}

/// Reserved words that take a parenthesized clause or argument-like list but
/// are language constructs, not callables (PHP lexes them as dedicated token
/// types, never as plain names).
const CONTROL_KEYWORDS: &[&str] = &[
	"array",
	"break",
	"case",
	"catch",
	"clone",
	"continue",
	"declare",
	"default",
	"die",
	"do",
	"echo",
	"else",
	"elseif",
	"empty",
	"exit",
	"finally",
	"for",
	"foreach",
	"global",
	"goto",
	"if",
	"include",
	"include_once",
	"instanceof",
	"isset",
	"list",
	"match",
	"namespace",
	"new",
	"print",
	"require",
	"require_once",
	"return",
	"switch",
	"throw",
	"try",
	"unset",
	"use",
	"while",
	"yield",
];

impl TokenKind {
	pub(crate) fn is_trivia(self) -> bool {
		matches!(self, Self::Whitespace | Self::Comment)
	}

	pub(crate) fn is_statement_boundary(self) -> bool {
		matches!(self, Self::Semicolon | Self::OpenBrace | Self::CloseBrace)
	}

	pub(crate) fn opens_nesting(self) -> bool {
		matches!(self, Self::OpenParen | Self::OpenBracket | Self::OpenBrace)
	}

	pub(crate) fn closes_nesting(self) -> bool {
		matches!(self, Self::CloseParen | Self::CloseBracket | Self::CloseBrace)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
	pub(crate) kind: TokenKind,
	pub(crate) text: String,
	/// Byte offset of the token start in the source text.
	pub(crate) offset: usize,
	/// For an open paren, the index of its matching close paren when known.
	pub(crate) matching_paren: Option<usize>,
}

impl Token {
	fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
		Self { kind, text: text.into(), offset, matching_paren: None }
	}
}

pub(crate) fn tokenize(text: &str) -> Vec<Token> {
	let chars = text.char_indices().collect::<Vec<_>>();
	let mut tokens = Vec::new();
	let mut idx = 0;

	while idx < chars.len() {
		let (offset, ch) = chars[idx];
		let next = chars.get(idx + 1).map(|(_, ch)| *ch);

		if ch.is_whitespace() {
			let end = scan_while(&chars, idx, |ch| ch.is_whitespace());

			tokens.push(Token::new(TokenKind::Whitespace, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if ch == '/' && next == Some('/') || ch == '#' {
			let end = scan_while(&chars, idx, |ch| ch != '\n');

			tokens.push(Token::new(TokenKind::Comment, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if ch == '/' && next == Some('*') {
			let end = scan_block_comment(&chars, idx + 2);

			tokens.push(Token::new(TokenKind::Comment, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if ch == '\'' || ch == '"' {
			let end = scan_string(&chars, idx + 1, ch);

			tokens.push(Token::new(TokenKind::Other, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if ch == '<'
			&& next == Some('<')
			&& chars.get(idx + 2).is_some_and(|(_, ch)| *ch == '<')
			&& let Some(end) = scan_heredoc(&chars, idx + 3)
		{
			tokens.push(Token::new(TokenKind::Other, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if ch == '$' {
			let end = scan_while(&chars, idx + 1, is_identifier_char);

			tokens.push(Token::new(TokenKind::Variable, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}
		if is_identifier_start(ch) {
			let end = scan_while(&chars, idx, is_identifier_char);
			let word = slice(text, &chars, idx, end);
			let kind = classify_word(&word, &chars, end, &tokens);

			tokens.push(Token::new(kind, word, offset));

			idx = end;

			continue;
		}
		if ch.is_ascii_digit() {
			let end = scan_while(&chars, idx, |ch| {
				ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
			});

			tokens.push(Token::new(TokenKind::Other, slice(text, &chars, idx, end), offset));

			idx = end;

			continue;
		}

		let (kind, len) = match (ch, next) {
			('-', Some('>')) => (TokenKind::MemberAccess, 2),
			('?', Some('-')) if chars.get(idx + 2).is_some_and(|(_, ch)| *ch == '>') =>
				(TokenKind::MemberAccess, 3),
			(':', Some(':')) => (TokenKind::MemberAccess, 2),
			(':', _) => (TokenKind::Colon, 1),
			('.', Some('.')) if chars.get(idx + 2).is_some_and(|(_, ch)| *ch == '.') =>
				(TokenKind::Ellipsis, 3),
			('<', Some('?')) => (TokenKind::Other, open_tag_len(&chars, idx)),
			('?', Some('>')) => (TokenKind::Other, 2),
			('(', _) => (TokenKind::OpenParen, 1),
			(')', _) => (TokenKind::CloseParen, 1),
			('[', _) => (TokenKind::OpenBracket, 1),
			(']', _) => (TokenKind::CloseBracket, 1),
			('{', _) => (TokenKind::OpenBrace, 1),
			('}', _) => (TokenKind::CloseBrace, 1),
			(',', _) => (TokenKind::Comma, 1),
			(';', _) => (TokenKind::Semicolon, 1),
			_ => (TokenKind::Other, 1),
		};
		let end = idx + len;

		tokens.push(Token::new(kind, slice(text, &chars, idx, end), offset));

		idx = end;
	}

	link_matching_parens(&mut tokens);

	tokens
}

fn is_identifier_start(ch: char) -> bool {
	ch.is_alphabetic() || ch == '_' || ch as u32 >= 0x80
}

fn is_identifier_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_' || ch as u32 >= 0x80
}

fn classify_word(word: &str, chars: &[(usize, char)], end: usize, tokens: &[Token]) -> TokenKind {
	// PHP keywords are case-insensitive; `fn` declares arrow-function parameters.
	if word.eq_ignore_ascii_case("function") || word.eq_ignore_ascii_case("fn") {
		return TokenKind::FunctionKeyword;
	}
	// After `->`/`?->`/`::` a reserved word is an ordinary member name.
	let member_context = tokens
		.iter()
		.rev()
		.find(|token| !token.kind.is_trivia())
		.is_some_and(|token| token.kind == TokenKind::MemberAccess);

	if !member_context && CONTROL_KEYWORDS.iter().any(|keyword| word.eq_ignore_ascii_case(keyword))
	{
		return TokenKind::Keyword;
	}

	let next = chars.get(end).map(|(_, ch)| *ch);
	let after = chars.get(end + 1).map(|(_, ch)| *ch);

	if next == Some(':') && after != Some(':') { TokenKind::Label } else { TokenKind::Identifier }
}

fn scan_while(chars: &[(usize, char)], mut idx: usize, keep: impl Fn(char) -> bool) -> usize {
	while idx < chars.len() && keep(chars[idx].1) {
		idx += 1;
	}

	idx
}

fn scan_block_comment(chars: &[(usize, char)], mut idx: usize) -> usize {
	while idx < chars.len() {
		if chars[idx].1 == '*' && chars.get(idx + 1).is_some_and(|(_, ch)| *ch == '/') {
			return idx + 2;
		}

		idx += 1;
	}

	idx
}

fn scan_string(chars: &[(usize, char)], mut idx: usize, quote: char) -> usize {
	while idx < chars.len() {
		match chars[idx].1 {
			'\\' => idx += 2,
			ch if ch == quote => return idx + 1,
			_ => idx += 1,
		}
	}

	chars.len()
}

/// Consumes a heredoc/nowdoc opened at `idx` (just past `<<<`) through its
/// closing label, which may be indented. Returns `None` when the text after
/// `<<<` is not a valid opener, so `<<` plus `<` can lex as ordinary tokens.
fn scan_heredoc(chars: &[(usize, char)], mut idx: usize) -> Option<usize> {
	idx = scan_while(chars, idx, |ch| ch == ' ' || ch == '\t');

	let quote = chars.get(idx).map(|(_, ch)| *ch).filter(|ch| *ch == '\'' || *ch == '"');

	if quote.is_some() {
		idx += 1;
	}

	let label_start = idx;
	let label_end = scan_while(chars, idx, is_identifier_char);

	if label_end == label_start {
		return None;
	}

	idx = label_end;

	if let Some(quote) = quote {
		if chars.get(idx).map(|(_, ch)| *ch) != Some(quote) {
			return None;
		}

		idx += 1;
	}

	idx = scan_while(chars, idx, |ch| ch == ' ' || ch == '\t' || ch == '\r');

	if chars.get(idx).map(|(_, ch)| *ch) != Some('\n') {
		return None;
	}

	let label = &chars[label_start..label_end];
	let mut line_start = idx + 1;

	while line_start < chars.len() {
		let closer = scan_while(chars, line_start, |ch| ch == ' ' || ch == '\t');
		let closer_end = closer + label.len();
		let closes = chars.len() >= closer_end
			&& label.iter().zip(&chars[closer..closer_end]).all(|((_, a), (_, b))| a == b)
			&& chars.get(closer_end).is_none_or(|(_, ch)| !is_identifier_char(*ch));

		if closes {
			return Some(closer_end);
		}

		line_start = scan_while(chars, line_start, |ch| ch != '\n') + 1;
	}

	// Unterminated heredoc swallows the rest of the source.
	Some(chars.len())
}

fn open_tag_len(chars: &[(usize, char)], idx: usize) -> usize {
	let matches_at = |at: usize, expected: char| {
		chars.get(idx + at).is_some_and(|(_, ch)| ch.eq_ignore_ascii_case(&expected))
	};

	if matches_at(2, 'p') && matches_at(3, 'h') && matches_at(4, 'p') {
		5
	} else if matches_at(2, '=') {
		3
	} else {
		2
	}
}

fn slice(text: &str, chars: &[(usize, char)], start: usize, end: usize) -> String {
	let from = chars[start].0;
	let to = chars.get(end).map_or(text.len(), |(offset, _)| *offset);

	text[from..to].to_owned()
}

fn link_matching_parens(tokens: &mut [Token]) {
	let mut stack = Vec::new();

	for idx in 0..tokens.len() {
		match tokens[idx].kind {
			TokenKind::OpenParen => stack.push(idx),
			TokenKind::CloseParen =>
				if let Some(open) = stack.pop() {
					tokens[open].matching_paren = Some(idx);
				},
			_ => {},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(text: &str) -> Vec<TokenKind> {
		tokenize(text)
			.into_iter()
			.filter(|token| !token.kind.is_trivia())
			.map(|token| token.kind)
			.collect()
	}

	#[test]
	fn labels_and_member_access_are_distinguished() {
		assert_eq!(
			kinds("$mapper->find(5);"),
			vec![
				TokenKind::Variable,
				TokenKind::MemberAccess,
				TokenKind::Identifier,
				TokenKind::OpenParen,
				TokenKind::Other,
				TokenKind::CloseParen,
				TokenKind::Semicolon,
			]
		);
		assert_eq!(
			kinds("foo(a: 1)"),
			vec![
				TokenKind::Identifier,
				TokenKind::OpenParen,
				TokenKind::Label,
				TokenKind::Colon,
				TokenKind::Other,
				TokenKind::CloseParen,
			]
		);
	}

	#[test]
	fn static_access_is_not_a_label() {
		let tokens = tokenize("Mapper::find(5)");

		assert_eq!(tokens[0].kind, TokenKind::Identifier);
		assert_eq!(tokens[1].kind, TokenKind::MemberAccess);
		assert_eq!(tokens[1].text, "::");
	}

	#[test]
	fn nullsafe_access_is_member_access() {
		let tokens = tokenize("$a?->b(1)");

		assert_eq!(tokens[1].kind, TokenKind::MemberAccess);
		assert_eq!(tokens[1].text, "?->");
	}

	#[test]
	fn commas_inside_strings_and_comments_are_not_commas() {
		assert!(!kinds("foo('a, b')").contains(&TokenKind::Comma));
		assert!(!kinds("/* a, b */ foo()").contains(&TokenKind::Comma));
		assert!(!kinds("// a, b\nfoo()").contains(&TokenKind::Comma));
	}

	#[test]
	fn open_parens_carry_their_matching_close() {
		let tokens = tokenize("foo(bar(1), 2)");
		let opens = tokens
			.iter()
			.enumerate()
			.filter(|(_, token)| token.kind == TokenKind::OpenParen)
			.map(|(idx, token)| (idx, token.matching_paren))
			.collect::<Vec<_>>();

		assert_eq!(opens.len(), 2);

		for (open, close) in opens {
			let close = close.expect("matching close paren");

			assert_eq!(tokens[close].kind, TokenKind::CloseParen);
			assert!(close > open);
		}
	}

	#[test]
	fn unbalanced_open_paren_has_no_match() {
		let tokens = tokenize("foo(1, 2");
		let open = tokens.iter().find(|token| token.kind == TokenKind::OpenParen);

		assert_eq!(open.expect("open paren").matching_paren, None);
	}

	#[test]
	fn control_keywords_do_not_lex_as_identifiers() {
		for source in ["if ($x)", "while ($x)", "declare(strict_types=1)", "isset($x)", "match ($x)"]
		{
			let first = tokenize(source).into_iter().next().expect("first token");

			assert_eq!(first.kind, TokenKind::Keyword, "in `{source}`");
		}
	}

	#[test]
	fn keywords_after_member_access_are_method_names() {
		let tokens = tokenize("$router->match($request)");
		let word = tokens.iter().find(|token| token.text == "match").expect("match token");

		assert_eq!(word.kind, TokenKind::Identifier);
	}

	#[test]
	fn heredoc_bodies_lex_as_a_single_token() {
		let tokens = tokenize("$s = <<<EOT\nfoo(1, 2), bar\nEOT;\n");

		assert!(!tokens.iter().any(|token| token.kind == TokenKind::OpenParen));
		assert!(!tokens.iter().any(|token| token.kind == TokenKind::Comma));

		let heredoc =
			tokens.iter().find(|token| token.text.starts_with("<<<")).expect("heredoc token");

		assert_eq!(heredoc.kind, TokenKind::Other);
		assert!(heredoc.text.ends_with("EOT"));
		// The statement terminator after the closing label survives.
		assert!(tokens.iter().any(|token| token.kind == TokenKind::Semicolon));
	}

	#[test]
	fn nowdoc_with_indented_closer_lexes_as_a_single_token() {
		let tokens = tokenize("$s = <<<'SQL'\nselect(a, b)\n  SQL;\n");

		assert!(!tokens.iter().any(|token| token.kind == TokenKind::OpenParen));
		assert!(tokens.iter().any(|token| token.kind == TokenKind::Semicolon));
	}

	#[test]
	fn shift_left_is_not_mistaken_for_a_heredoc() {
		let tokens = tokenize("$x = 1 << 2; foo(3);");

		assert!(tokens.iter().any(|token| token.kind == TokenKind::OpenParen));
		assert!(tokens.iter().any(|token| token.text == "foo"));
	}

	#[test]
	fn ellipsis_lexes_as_a_single_token() {
		let tokens = tokenize("foo(...$args)");
		let spreads =
			tokens.iter().filter(|token| token.kind == TokenKind::Ellipsis).collect::<Vec<_>>();

		assert_eq!(spreads.len(), 1);
		assert_eq!(spreads[0].text, "...");
	}

	#[test]
	fn php_tags_lex_as_plain_tokens() {
		let tokens = tokenize("<?php foo(); ?>");

		assert_eq!(tokens[0].kind, TokenKind::Other);
		assert_eq!(tokens[0].text, "<?php");
		assert_eq!(tokens.last().map(|token| token.text.as_str()), Some("?>"));
	}

	#[test]
	fn byte_offsets_survive_multibyte_text() {
		let tokens = tokenize("f('é'); g()");
		let g = tokens.iter().find(|token| token.text == "g").expect("g token");

		assert_eq!(&"f('é'); g()"[g.offset..g.offset + 1], "g");
	}
}
