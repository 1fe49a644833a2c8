use serde::Serialize;

/// Lowercase `text` one character at a time.
///
/// Unlike [`str::to_lowercase`] this never looks at neighbouring
/// characters, so a folded query lines up with a folded haystack the same
/// way during matching and highlighting.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Case-insensitive literal containment. `query` must already be folded.
///
/// A match starts and ends on character boundaries of `haystack`, the same
/// rule [`highlight`] marks by, so every hit has at least one marked span.
pub fn contains_folded(haystack: &str, folded_query: &str) -> bool {
    folded_query.is_empty()
        || haystack
            .char_indices()
            .any(|(idx, _)| match_at(&haystack[idx..], folded_query).is_some())
}

/// A run of source text, marked when it matched the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `text` into spans, marking every non-overlapping case-insensitive
/// occurrence of `query` from left to right.
///
/// The query is matched literally. Source casing is preserved and text that
/// does not match is returned untouched. An empty query yields a single
/// unmarked span.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Span<'a>> {
    let needle = fold_case(query);
    if needle.is_empty() || text.is_empty() {
        return plain(text);
    }

    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while cursor < text.len() {
        match match_at(&text[cursor..], &needle) {
            Some(len) => {
                if plain_start < cursor {
                    spans.push(Span {
                        text: &text[plain_start..cursor],
                        matched: false,
                    });
                }
                spans.push(Span {
                    text: &text[cursor..cursor + len],
                    matched: true,
                });
                cursor += len;
                plain_start = cursor;
            }
            None => {
                cursor +=
                    text[cursor..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if plain_start < text.len() {
        spans.push(Span {
            text: &text[plain_start..],
            matched: false,
        });
    }
    spans
}

/// Byte length of the prefix of `text` whose folded form equals `needle`.
///
/// Only whole characters of `text` count: a character whose lowercase form
/// runs past the end of `needle` does not match.
fn match_at(text: &str, needle: &str) -> Option<usize> {
    let mut want = needle.chars().peekable();
    for (idx, c) in text.char_indices() {
        for folded in c.to_lowercase() {
            if want.next() != Some(folded) {
                return None;
            }
        }
        if want.peek().is_none() {
            return Some(idx + c.len_utf8());
        }
    }
    None
}

fn plain(text: &str) -> Vec<Span<'_>> {
    vec![Span {
        text,
        matched: false,
    }]
}
