use std::collections::HashSet;

/// Words that start with a capital letter in questions without naming
/// anything, plus auxiliaries that commonly follow a name. Checked
/// case-insensitively.
const STOP_WORDS: &[&str] = &[
	"who", "what", "where", "when", "why", "how", "which", "tell", "show", "find", "is", "are",
	"was", "were", "the", "a", "an", "about", "opinion", "view", "think", "thought", "idea",
	"belief", "say", "said", "did", "do", "does", "have", "has", "their", "his", "her", "its",
	"our", "your", "my",
];

/// Extracts candidate entity names from a query: spans of consecutive
/// capitalized, non-stop-word tokens. Each multi-word span is emitted as one
/// phrase plus its individual tokens longer than two characters, so both
/// "Stanford University" and "Stanford" get tried against the graph. An empty
/// result means the query names nothing; callers must not graph-filter in
/// that case.
pub fn entity_candidates(query: &str) -> Vec<String> {
	let tokens: Vec<String> = query
		.split_whitespace()
		.map(normalize_token)
		.filter(|token| !token.is_empty())
		.collect();
	let mut candidates = Vec::new();
	let mut seen = HashSet::new();
	let mut index = 0;

	while index < tokens.len() {
		if !opens_span(&tokens[index]) {
			index += 1;

			continue;
		}

		let mut end = index + 1;

		while end < tokens.len() && opens_span(&tokens[end]) {
			end += 1;
		}

		let span = &tokens[index..end];

		if span.len() > 1 {
			push_candidate(&mut candidates, &mut seen, span.join(" "));

			// Short tokens ("Ng", "Li") ride along inside the phrase but are
			// too noisy to look up alone.
			for token in span {
				if token.chars().count() > 2 {
					push_candidate(&mut candidates, &mut seen, token.clone());
				}
			}
		} else if span[0].chars().count() > 2 {
			push_candidate(&mut candidates, &mut seen, span[0].clone());
		}

		index = end;
	}

	candidates
}

fn normalize_token(token: &str) -> String {
	let trimmed = token
		.trim_end_matches(|ch: char| matches!(ch, '?' | '!' | '.' | ',' | ';' | ':' | '"' | '\u{201D}'));
	let stripped = trimmed
		.strip_suffix("'s")
		.or_else(|| trimmed.strip_suffix("\u{2019}s"))
		.unwrap_or(trimmed);

	stripped.to_string()
}

fn opens_span(token: &str) -> bool {
	if !token.chars().next().is_some_and(char::is_uppercase) {
		return false;
	}

	let lower = token.to_lowercase();

	!STOP_WORDS.contains(&lower.as_str())
}

fn push_candidate(candidates: &mut Vec<String>, seen: &mut HashSet<String>, candidate: String) {
	if seen.insert(candidate.clone()) {
		candidates.push(candidate);
	}
}
