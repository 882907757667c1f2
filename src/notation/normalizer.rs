//! Transliterating recognized move tokens into Latin algebraic notation.
//!
//! Scoresheets written in Greek notation use Greek piece initials and file
//! letters; recognizers additionally confuse Greek capitals with their
//! Latin homoglyphs. The normalizer applies an ordered substitution table
//! to every character, then fixes up castling zeros and promotion suffixes.

use tracing::trace;

/// Transliterates move tokens from a source notation script to Latin
/// algebraic notation.
///
/// The substitution table is an explicit ordered list owned by the
/// instance, so tests and other notations can supply their own alphabet.
/// Within one token each character is looked up once, first match wins;
/// substitution never cascades.
///
/// The table is intentionally asymmetric: a Latin capital that is a
/// homoglyph of a Greek piece initial is mapped to that single piece even
/// though it could also be read as a Latin piece letter (e.g. `B` maps to
/// the queen, never the bishop). Collapsing each ambiguous letter to one
/// fixed target keeps transliteration deterministic.
#[derive(Debug, Clone)]
pub struct TokenNormalizer {
    substitutions: Vec<(char, char)>,
}

impl TokenNormalizer {
    /// Creates a normalizer with a caller-supplied substitution table.
    pub fn new(substitutions: Vec<(char, char)>) -> Self {
        Self { substitutions }
    }

    /// The default Greek-to-Latin table.
    ///
    /// Piece initials, their Latin homoglyphs, file letters alpha through
    /// theta, and capture-sign variants.
    pub fn greek() -> Self {
        Self::new(vec![
            // Piece initials.
            ('\u{03A1}', 'K'), // Rho, king
            ('\u{0392}', 'Q'), // Beta, queen
            ('\u{03A0}', 'R'), // Pi, rook
            ('\u{0391}', 'B'), // Alpha, bishop
            ('\u{0399}', 'N'), // Iota, knight
            ('\u{03A3}', 'P'), // Sigma, pawn
            // Latin homoglyph capitals the recognizer produces for the same
            // pieces; one fixed target each.
            ('P', 'K'),
            ('B', 'Q'),
            ('A', 'B'),
            ('I', 'N'),
            // File letters.
            ('\u{03B1}', 'a'),
            ('\u{03B2}', 'b'),
            ('\u{03B3}', 'c'),
            ('\u{03B4}', 'd'),
            ('\u{03B5}', 'e'),
            ('\u{03B6}', 'f'),
            ('\u{03B7}', 'g'),
            ('\u{03B8}', 'h'),
            // Capture signs.
            ('\u{03C7}', 'x'), // chi
            ('\u{03A7}', 'x'), // Chi
            ('\u{00D7}', 'x'), // multiplication sign
        ])
    }

    /// Normalizes a single raw token.
    ///
    /// Applies the substitution table left to right, rewrites castling
    /// zeros to letter O, and re-applies the table to the character after
    /// a promotion `=` (recognizers often emit the promotion piece in the
    /// source script even when the rest of the token came out Latin).
    pub fn normalize_token(&self, token: &str) -> String {
        let mut normalized: String = token
            .trim()
            .chars()
            .map(|c| self.substitute(c))
            .collect();

        // Castling: longest pattern first so 0-0-0 is not half-rewritten.
        if normalized.contains("0-0-0") {
            normalized = normalized.replace("0-0-0", "O-O-O");
        }
        if normalized.contains("0-0") {
            normalized = normalized.replace("0-0", "O-O");
        }

        if let Some(eq) = normalized.find('=') {
            let tail = &normalized[eq + 1..];
            if let Some(piece) = tail.chars().next() {
                let replaced = self.substitute(piece);
                if replaced != piece {
                    trace!(target: "notation", token, %piece, "Promotion piece transliterated");
                    let mut fixed = normalized[..eq + 1].to_string();
                    fixed.push(replaced);
                    fixed.push_str(&tail[piece.len_utf8()..]);
                    normalized = fixed;
                }
            }
        }
        normalized
    }

    /// Normalizes every token of one column, preserving order.
    pub fn normalize_column(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| self.normalize_token(t))
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn substitute(&self, c: char) -> char {
        self.substitutions
            .iter()
            .find(|(source, _)| *source == c)
            .map(|(_, target)| *target)
            .unwrap_or(c)
    }
}

impl Default for TokenNormalizer {
    fn default() -> Self {
        Self::greek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greek_knight_move() {
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("Ιβ3"), "Nb3");
    }

    #[test]
    fn test_greek_capture_and_check() {
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("Πχδ4+"), "Rxd4+");
        assert_eq!(normalizer.normalize_token("εχδ5"), "exd5");
    }

    #[test]
    fn test_castling_zeros() {
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("0-0"), "O-O");
        assert_eq!(normalizer.normalize_token("0-0-0"), "O-O-O");
        assert_eq!(normalizer.normalize_token("0-0+"), "O-O+");
    }

    #[test]
    fn test_promotion_piece_is_transliterated() {
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("ε8=Β"), "e8=Q");
        // Latin homoglyph after the equals sign gets the same treatment.
        assert_eq!(normalizer.normalize_token("e8=B"), "e8=Q");
        // An already-Latin promotion target is left alone.
        assert_eq!(normalizer.normalize_token("e8=Q"), "e8=Q");
    }

    #[test]
    fn test_homoglyphs_map_to_single_targets() {
        let normalizer = TokenNormalizer::greek();
        // Latin B reads as the Greek queen, by fixed policy.
        assert_eq!(normalizer.normalize_token("Bδ3"), "Qd3");
        // Substitution does not cascade: alpha -> B stays B.
        assert_eq!(normalizer.normalize_token("Αε2"), "Be2");
    }

    #[test]
    fn test_substitution_is_single_pass_per_char() {
        // A -> B in one lookup; the produced B must not turn into Q.
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("Aε2"), "Be2");
    }

    #[test]
    fn test_untranslatable_characters_pass_through() {
        let normalizer = TokenNormalizer::greek();
        assert_eq!(normalizer.normalize_token("Nf3"), "Nf3");
        assert_eq!(normalizer.normalize_token("??"), "??");
    }

    #[test]
    fn test_column_normalization_drops_empty_tokens() {
        let normalizer = TokenNormalizer::greek();
        let tokens = vec!["ε4".to_string(), "  ".to_string(), "Ιζ3".to_string()];
        assert_eq!(normalizer.normalize_column(&tokens), vec!["e4", "Nf3"]);
    }

    #[test]
    fn test_custom_alphabet() {
        // A test double with a tiny Cyrillic-style table.
        let normalizer = TokenNormalizer::new(vec![('\u{041A}', 'N')]);
        assert_eq!(normalizer.normalize_token("\u{041A}f3"), "Nf3");
        assert_eq!(normalizer.normalize_token("Ιβ3"), "Ιβ3");
    }
}
