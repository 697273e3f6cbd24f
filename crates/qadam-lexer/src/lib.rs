//! qadam-lexer — découpage des sources d’archives en jetons, ligne par ligne
//!
//! Règles :
//! - délimiteurs : espace, tabulation, `\r`, `\n` ; `;` hors guillemets commente la fin de ligne
//! - `"…"` : chaîne (les blancs internes sont conservés), échappements `\n \t \r \\ \" \xHH`
//!   décodés par `qadam_core::escape` ; un `"` en milieu de mot coupe le mot
//! - `[…]` : bloc hexadécimal, éventuellement réparti sur plusieurs mots (`[01 02 0A]`)
//! - `SECTION n` (casse indifférente), `NO_NUL`
//!
//! Exemple éclair :
//! ```
//! use qadam_lexer::{tokenize_line, Token};
//!
//! let toks = tokenize_line(r#"[01 02] "Ahoj" NO_NUL ; fin"#, 1).unwrap();
//! assert_eq!(toks, vec![
//!     Token::HexBlock(vec![1, 2]),
//!     Token::QuotedString("Ahoj".into()),
//!     Token::NoNulMarker,
//! ]);
//! ```

#![deny(missing_docs)]

use qadam_core::{escape, CoreError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Jeton d’une ligne source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Token {
    /// Mot nu non reconnu (le compilateur le refuse).
    Word(String),
    /// Chaîne entre guillemets, échappements décodés.
    QuotedString(String),
    /// Octets d’un bloc `[..]`.
    HexBlock(Vec<u8>),
    /// `SECTION n`.
    SectionMarker(u32),
    /// `NO_NUL` : retire le terminateur de la chaîne précédente.
    NoNulMarker,
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Genre d’erreur lexicale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LexErrorKind {
    /// Chaîne sans `"` fermant.
    #[error("unterminated quoted string")]
    UnterminatedString,
    /// Échappement refusé dans une chaîne.
    #[error("{0}")]
    InvalidEscape(CoreError),
    /// Chiffres hex invalides (ou en nombre impair).
    #[error("invalid hex `{digits}`: {reason}")]
    InvalidHex {
        /// Chiffres concaténés entre les crochets.
        digits: String,
        /// Diagnostic du décodeur.
        reason: String,
    },
    /// Bloc `[` sans `]`.
    #[error("missing closing ] for hex block")]
    UnterminatedHexBlock,
    /// `SECTION` en fin de ligne.
    #[error("SECTION missing argument")]
    MissingSectionNumber,
    /// `SECTION` suivi d’autre chose qu’un entier.
    #[error("invalid SECTION number `{0}`")]
    InvalidSectionNumber(String),
}

/// Erreur lexicale avec numéro de ligne (1-based).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error("line {line}: {kind}")]
pub struct LexError {
    /// Ligne fautive.
    pub line: u32,
    /// Genre d’erreur.
    pub kind: LexErrorKind,
}

/* ─────────────────────────── Lexer ─────────────────────────── */

/// Morceau brut avant interprétation.
#[derive(Debug)]
enum Piece<'a> {
    Bare(&'a str),
    Quoted(String),
}

/// Découpeur d’une ligne en morceaux (mots nus, chaînes).
struct Lexer<'a> {
    src: &'a str,
    off: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    const fn new(src: &'a str, line: u32) -> Self { Self { src, off: 0, line } }

    fn next_piece(&mut self) -> Result<Option<Piece<'a>>, LexError> {
        self.skip_delimiters();
        match self.peek() {
            None => Ok(None),
            Some(';') => {
                self.off = self.src.len();
                Ok(None)
            }
            Some('"') => {
                self.bump();
                self.quoted().map(|s| Some(Piece::Quoted(s)))
            }
            Some(_) => {
                let start = self.off;
                while let Some(c) = self.peek() {
                    if is_delimiter(c) || c == '"' || c == ';' {
                        break;
                    }
                    self.bump();
                }
                Ok(Some(Piece::Bare(&self.src[start..self.off])))
            }
        }
    }

    /// Corps d’une chaîne, `"` ouvrant déjà consommé.
    fn quoted(&mut self) -> Result<String, LexError> {
        let start = self.off;
        let mut escaped = false;
        while let Some(c) = self.bump() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                let raw = &self.src[start..self.off - 1];
                return escape::unescape(raw).map_err(|e| self.err(LexErrorKind::InvalidEscape(e)));
            }
        }
        Err(self.err(LexErrorKind::UnterminatedString))
    }

    fn skip_delimiters(&mut self) {
        while self.peek().is_some_and(is_delimiter) {
            self.bump();
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> { self.src[self.off..].chars().next() }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.off += c.len_utf8();
        Some(c)
    }

    #[inline]
    const fn err(&self, kind: LexErrorKind) -> LexError { LexError { line: self.line, kind } }
}

/* ─────────────────────────── API ─────────────────────────── */

/// Découpe une ligne source en jetons.
///
/// La ligne est d’abord rognée ; une ligne vide ou réduite à un commentaire
/// donne un vecteur vide.
///
/// # Errors
/// `LexError` portant `line_no` : chaîne ou bloc hex non terminé, échappement
/// invalide, hex invalide, `SECTION` sans numéro valide.
pub fn tokenize_line(line: &str, line_no: u32) -> Result<Vec<Token>, LexError> {
    let mut lx = Lexer::new(line.trim(), line_no);
    let mut out = Vec::new();

    while let Some(piece) = lx.next_piece()? {
        let word = match piece {
            Piece::Quoted(s) => {
                out.push(Token::QuotedString(s));
                continue;
            }
            Piece::Bare(w) => w,
        };

        if let Some(rest) = word.strip_prefix('[') {
            out.push(hex_block(&mut lx, rest)?);
        } else if word.eq_ignore_ascii_case("SECTION") {
            let n = match lx.next_piece()? {
                None => return Err(lx.err(LexErrorKind::MissingSectionNumber)),
                Some(Piece::Bare(n)) => n
                    .parse::<u32>()
                    .map_err(|_| lx.err(LexErrorKind::InvalidSectionNumber(n.to_string())))?,
                Some(Piece::Quoted(s)) => {
                    return Err(lx.err(LexErrorKind::InvalidSectionNumber(format!("\"{}\"", escape::escape(&s)))))
                }
            };
            out.push(Token::SectionMarker(n));
        } else if word == "NO_NUL" {
            out.push(Token::NoNulMarker);
        } else {
            out.push(Token::Word(word.to_string()));
        }
    }
    Ok(out)
}

/// Lignes non vides d’un source : `(numéro de ligne, jetons)`.
///
/// Une ligne fautive produit son `Err` ; les appelants s’arrêtent au premier.
pub fn tokenize(source: &str) -> impl Iterator<Item = Result<(u32, Vec<Token>), LexError>> + '_ {
    source.lines().zip(1u32..).filter_map(|(line, no)| match tokenize_line(line, no) {
        Ok(toks) if toks.is_empty() => None,
        Ok(toks) => Some(Ok((no, toks))),
        Err(e) => Some(Err(e)),
    })
}

/// Bloc hex : `first` suit le `[` ouvrant ; on concatène les mots jusqu’à `]`.
fn hex_block(lx: &mut Lexer<'_>, first: &str) -> Result<Token, LexError> {
    let mut digits = String::new();
    let mut part = first;
    loop {
        if let Some(last) = part.strip_suffix(']') {
            digits.push_str(last);
            break;
        }
        digits.push_str(part);
        part = match lx.next_piece()? {
            Some(Piece::Bare(w)) => w,
            Some(Piece::Quoted(_)) => {
                return Err(lx.err(LexErrorKind::InvalidHex {
                    digits,
                    reason: "quoted string inside hex block".into(),
                }))
            }
            None => return Err(lx.err(LexErrorKind::UnterminatedHexBlock)),
        };
    }
    hex::decode(&digits)
        .map(Token::HexBlock)
        .map_err(|e| lx.err(LexErrorKind::InvalidHex { reason: e.to_string(), digits }))
}

#[inline]
const fn is_delimiter(c: char) -> bool { matches!(c, ' ' | '\t' | '\r' | '\n') }

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use Token::*;

    fn toks(src: &str) -> Vec<Token> { tokenize_line(src, 1).unwrap() }

    fn err(src: &str) -> LexErrorKind { tokenize_line(src, 7).unwrap_err().kind }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(toks(""), vec![]);
        assert_eq!(toks("   \t "), vec![]);
        assert_eq!(toks("; rien ici"), vec![]);
        assert_eq!(toks("  ;\"pas une chaîne"), vec![]);
    }

    #[test]
    fn directives() {
        assert_eq!(toks("SECTION 0"), vec![SectionMarker(0)]);
        assert_eq!(toks("section\t12 ; commentaire"), vec![SectionMarker(12)]);
        assert_eq!(toks("Section 3 NO_NUL"), vec![SectionMarker(3), NoNulMarker]);
        assert_eq!(toks("no_nul"), vec![Word("no_nul".into())]);
        assert_eq!(toks("bogus ]"), vec![Word("bogus".into()), Word("]".into())]);
    }

    #[test]
    fn quoted_strings_keep_whitespace() {
        assert_eq!(toks(r#""  a  b  ""#), vec![QuotedString("  a  b  ".into())]);
        assert_eq!(toks(r#""a;b" ; c"#), vec![QuotedString("a;b".into())]);
        assert_eq!(toks(r#""""#), vec![QuotedString(String::new())]);
        assert_eq!(toks(r#""x\"y\\" "z""#), vec![QuotedString("x\"y\\".into()), QuotedString("z".into())]);
    }

    #[test]
    fn escapes_are_decoded() {
        assert_eq!(toks(r#""a\nb\tc\rd\x41""#), vec![QuotedString("a\nb\tc\rdA".into())]);
    }

    #[test]
    fn quote_splits_words() {
        assert_eq!(toks(r#"abc"d e"fgh"#), vec![Word("abc".into()), QuotedString("d e".into()), Word("fgh".into())]);
        assert_eq!(toks(r#"[01 02 03 04 05] "Hi""#), vec![HexBlock(vec![1, 2, 3, 4, 5]), QuotedString("Hi".into())]);
    }

    #[test]
    fn hex_blocks() {
        assert_eq!(toks("[48656C6C6F]"), vec![HexBlock(b"Hello".to_vec())]);
        assert_eq!(toks("[48 65 6c\t6C 6F]"), vec![HexBlock(b"Hello".to_vec())]);
        assert_eq!(toks("[]"), vec![HexBlock(vec![])]);
        assert_eq!(toks("[ ]"), vec![HexBlock(vec![])]);
        assert_eq!(toks("[0A] [0B]"), vec![HexBlock(vec![0x0A]), HexBlock(vec![0x0B])]);
    }

    #[test]
    fn lexical_errors() {
        assert_eq!(err(r#""abc"#), LexErrorKind::UnterminatedString);
        assert_eq!(err(r#""abc\""#), LexErrorKind::UnterminatedString);
        assert_eq!(err("[01 02"), LexErrorKind::UnterminatedHexBlock);
        assert!(matches!(err("[0G]"), LexErrorKind::InvalidHex { .. }));
        assert!(matches!(err("[012]"), LexErrorKind::InvalidHex { ref digits, .. } if digits == "012"));
        assert!(matches!(err(r#"[01 "x"]"#), LexErrorKind::InvalidHex { .. }));
        assert_eq!(err("SECTION"), LexErrorKind::MissingSectionNumber);
        assert_eq!(err("SECTION ; 3"), LexErrorKind::MissingSectionNumber);
        assert_eq!(err("SECTION x1"), LexErrorKind::InvalidSectionNumber("x1".into()));
        assert_eq!(err(r#""bad\q""#), LexErrorKind::InvalidEscape(CoreError::InvalidEscape { escape: "q".into() }));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let e = tokenize_line("[01", 42).unwrap_err();
        assert_eq!(e.line, 42);
        assert_eq!(e.to_string(), "line 42: missing closing ] for hex block");
    }

    #[test]
    fn whole_source() {
        let src = "SECTION 0\n\n; note\n[01] \"a\"\nSECTION 1\n";
        let lines: Vec<_> = tokenize(src).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            lines,
            vec![
                (1, vec![SectionMarker(0)]),
                (4, vec![HexBlock(vec![1]), QuotedString("a".into())]),
                (5, vec![SectionMarker(1)]),
            ]
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn escaped_text_reads_back(s in any::<String>()) {
                let line = format!("\"{}\" ; fin", escape::escape(&s));
                prop_assert_eq!(tokenize_line(&line, 1), Ok(vec![QuotedString(s)]));
            }

            #[test]
            fn hex_blocks_read_back(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
                let spaced: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
                let line = format!("[{}]", spaced.join(" "));
                prop_assert_eq!(tokenize_line(&line, 1), Ok(vec![HexBlock(bytes.clone())]));
                let packed = format!("[{}]", hex::encode(&bytes));
                prop_assert_eq!(tokenize_line(&packed, 1), Ok(vec![HexBlock(bytes)]));
            }
        }
    }
}
