use std::collections::HashSet;

/// Lowercased alphanumeric query terms, order-preserving and deduplicated.
/// Terms shorter than two characters carry no signal and are skipped.
pub fn tokenize(query: &str, max_terms: usize) -> Vec<String> {
	let mut normalized = String::with_capacity(query.len());

	for ch in query.chars() {
		if ch.is_ascii_alphanumeric() {
			normalized.push(ch.to_ascii_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for token in normalized.split_whitespace() {
		if token.len() < 2 {
			continue;
		}
		if seen.insert(token) {
			out.push(token.to_string());
		}
		if out.len() >= max_terms {
			break;
		}
	}

	out
}

/// Fraction of query terms present in the text, 0.0 to 1.0. An auxiliary
/// signal only; it never gates a result on its own.
pub fn overlap_score(query_tokens: &[String], text: &str, max_text_terms: usize) -> f32 {
	if query_tokens.is_empty() || max_text_terms == 0 {
		return 0.0;
	}

	let mut normalized = String::with_capacity(text.len());

	for ch in text.chars() {
		if ch.is_ascii_alphanumeric() {
			normalized.push(ch.to_ascii_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut text_terms = HashSet::new();

	for token in normalized.split_whitespace() {
		if token.len() < 2 {
			continue;
		}

		text_terms.insert(token);

		if text_terms.len() >= max_text_terms {
			break;
		}
	}

	if text_terms.is_empty() {
		return 0.0;
	}

	let matched =
		query_tokens.iter().filter(|token| text_terms.contains(token.as_str())).count();

	matched as f32 / query_tokens.len() as f32
}
