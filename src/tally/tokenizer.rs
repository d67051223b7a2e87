// Word extraction for the text column.
// Splits on whitespace plus a fixed punctuation set, lowercases each piece and
// drops pieces that are too short, too long or carry no letter at all.

/// Lengths are counted in characters after case folding.
pub const MIN_TOKEN_LEN: usize = 2;
/// Tokens of this many characters or more are dropped, never truncated.
pub const TOKEN_LEN_LIMIT: usize = 100;

const PUNCTUATION: &[char] = &[
    ',', '.', '-', '?', '!', '"', '\'', '(', ')', '[', ']', '{', '}', ':', ';', '/', '\\',
];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || PUNCTUATION.contains(&c)
}

/// Lazy token sequence over a borrowed text. Cloning forks it at the current
/// position; calling `tokenize` again starts over.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    pieces: std::str::Split<'a, fn(char) -> bool>,
}

pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        pieces: text.split(is_delimiter as fn(char) -> bool),
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        for piece in self.pieces.by_ref() {
            if piece.is_empty() {
                continue;
            }
            if let Some(token) = normalize(piece) {
                return Some(token);
            }
        }
        None
    }
}

fn normalize(piece: &str) -> Option<String> {
    let folded = piece.to_lowercase();
    let len = folded.chars().count();
    if len < MIN_TOKEN_LEN || len >= TOKEN_LEN_LIMIT {
        return None;
    }
    if !folded.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(folded)
}
