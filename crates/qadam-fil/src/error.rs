//! Erreurs du codec d’archives.
//!
//! Toute erreur met fin à l’opération qui la lève ; `class()` la range dans
//! la taxonomie grossière que les appelants affichent.

use core::fmt;
use std::io;

use qadam_lexer::{LexError, LexErrorKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Taxonomie commune au compilateur et au décompilateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorClass {
    /// Archive binaire malformée ou incohérente.
    FormatViolation,
    /// Texte source malformé.
    SyntaxError,
    /// Caractère sans octet dans la table.
    CharsetError,
    /// Lecture du source ou écriture du listing en échec.
    Io,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FormatViolation => "format violation",
            Self::SyntaxError => "syntax error",
            Self::CharsetError => "charset error",
            Self::Io => "i/o error",
        })
    }
}

/* ─────────────────────────── Côté binaire ─────────────────────────── */

/// Archive binaire refusée. Chaque variante porte l’offset fautif et la
/// longueur du tampon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormatError {
    /// Le tampon s’arrête dans le répertoire.
    #[error("archive truncated at offset {offset}: directory needs {needed} bytes, buffer holds {len}")]
    Truncated {
        /// Offset où la lecture a échoué.
        offset: usize,
        /// Octets requis par le répertoire.
        needed: usize,
        /// Longueur du tampon.
        len: usize,
    },
    /// Compte de sections au-delà du plafond de cohérence.
    #[error("invalid number of entries: {count} (buffer holds {len} bytes)")]
    TooManyEntries {
        /// Compte déclaré.
        count: usize,
        /// Longueur du tampon.
        len: usize,
    },
    /// Entrée du répertoire hors du tampon, ou section qui pointe dans le
    /// répertoire lui-même.
    #[error("entry {index}: offset {offset} is out of bounds (buffer holds {len} bytes)")]
    OffsetOutOfBounds {
        /// Rang de l’entrée.
        index: usize,
        /// Offset lu.
        offset: usize,
        /// Longueur du tampon.
        len: usize,
    },
    /// Section qui commence avant la précédente.
    #[error("entry {index}: offset {offset} precedes the previous section (buffer holds {len} bytes)")]
    UnorderedOffsets {
        /// Rang de l’entrée.
        index: usize,
        /// Offset lu.
        offset: usize,
        /// Longueur du tampon.
        len: usize,
    },
    /// La dernière entrée ne vaut pas la longueur du tampon.
    #[error("last offset {offset} does not match data size {len}")]
    SizeMismatch {
        /// Taille déclarée.
        offset: usize,
        /// Longueur du tampon.
        len: usize,
    },
}

impl FormatError {
    /// `(offset fautif, longueur du tampon)`.
    #[must_use]
    pub const fn location(&self) -> (usize, usize) {
        match *self {
            Self::TooManyEntries { len, .. } => (0, len),
            Self::Truncated { offset, len, .. }
            | Self::OffsetOutOfBounds { offset, len, .. }
            | Self::UnorderedOffsets { offset, len, .. }
            | Self::SizeMismatch { offset, len } => (offset, len),
        }
    }
}

/// [`Archive`](crate::Archive) en mémoire impossible à construire ou sérialiser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArchiveError {
    /// Plus de sections que le compte sur un octet n’en permet.
    #[error("{count} sections do not fit in the directory (max 255)")]
    TooManySections {
        /// Nombre de sections.
        count: usize,
    },
    /// Les indices doivent suivre 0, 1, 2, …
    #[error("section at position {position} has index {index}")]
    MisnumberedSection {
        /// Rang dans la liste.
        position: usize,
        /// Indice porté par la section.
        index: u8,
    },
    /// Section qui commence après la fin du corps.
    #[error("section {index} starts at body offset {offset}, past the body end {body_len}")]
    SectionPastEnd {
        /// Indice de la section.
        index: u8,
        /// Offset dans le corps.
        offset: u32,
        /// Longueur du corps.
        body_len: usize,
    },
    /// Section qui commence avant la précédente.
    #[error("section {index} starts at body offset {offset}, before the previous section at {previous}")]
    UnorderedSections {
        /// Indice de la section.
        index: u8,
        /// Offset dans le corps.
        offset: u32,
        /// Offset de la section précédente.
        previous: u32,
    },
    /// Répertoire + corps au-delà de ce que des offsets 24 bits adressent.
    #[error("archive size {size} does not fit in 24-bit offsets (max 16777215)")]
    TooLarge {
        /// Taille totale visée.
        size: usize,
    },
}

/* ─────────────────────────── Côté texte ─────────────────────────── */

/// Ce qui cloche sur une ligne source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SyntaxErrorKind {
    /// Échec du découpage (chaîne, échappement, bloc hex, numéro de SECTION).
    #[error(transparent)]
    Lex(LexErrorKind),
    /// Mot nu qui n’est pas une directive.
    #[error("unrecognized token '{0}'")]
    UnrecognizedToken(String),
    /// `SECTION n` où `n` n’est pas l’indice suivant.
    #[error("out-of-order SECTION, expected {expected} got {found}")]
    OutOfOrderSection {
        /// Indice attendu.
        expected: u32,
        /// Indice lu.
        found: u32,
    },
    /// 256e `SECTION`.
    #[error("too many sections, the directory holds at most 255")]
    TooManySections,
    /// `NO_NUL` avant tout octet émis.
    #[error("encountered NO_NUL without any output so far")]
    NoNulWithoutOutput,
    /// `NO_NUL` après un octet autre que le terminateur NUL.
    #[error("encountered NO_NUL but previous byte wasn't a NUL")]
    NoNulWithoutNul,
}

/// Échec de compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Ligne source malformée.
    #[error("line {line}: {kind}")]
    Syntax {
        /// Ligne fautive (1-based).
        line: u32,
        /// Genre d’erreur.
        kind: SyntaxErrorKind,
    },
    /// Chaîne contenant un caractère sans octet dans la table.
    #[error("line {line}: character {symbol:?} missing from charset")]
    UnknownCharacter {
        /// Ligne fautive (1-based).
        line: u32,
        /// Caractère fautif.
        symbol: char,
    },
    /// Aucun `SECTION` dans le source.
    #[error("no sections found")]
    NoSections,
    /// Archive compilée impossible à sérialiser.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// Lecture du source en échec.
    #[error("failed to read source: {0}")]
    Io(#[from] io::Error),
}

impl CompileError {
    pub(crate) const fn syntax(line: u32, kind: SyntaxErrorKind) -> Self { Self::Syntax { line, kind } }

    /// Classe de l’erreur.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Syntax { .. } | Self::NoSections => ErrorClass::SyntaxError,
            Self::UnknownCharacter { .. } => ErrorClass::CharsetError,
            Self::Archive(_) => ErrorClass::FormatViolation,
            Self::Io(_) => ErrorClass::Io,
        }
    }

    /// Ligne source (1-based), quand l’erreur en a une.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        match self {
            Self::Syntax { line, .. } | Self::UnknownCharacter { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self { Self::syntax(e.line, SyntaxErrorKind::Lex(e.kind)) }
}

/// Échec de décompilation.
#[derive(Debug, thiserror::Error)]
pub enum DecompileError {
    /// Archive malformée.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Écriture du listing en échec.
    #[error("failed to write listing: {0}")]
    Io(#[from] io::Error),
}

impl DecompileError {
    /// Classe de l’erreur.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Format(_) => ErrorClass::FormatViolation,
            Self::Io(_) => ErrorClass::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_line() {
        let e = CompileError::syntax(3, SyntaxErrorKind::OutOfOrderSection { expected: 1, found: 2 });
        assert_eq!(e.to_string(), "line 3: out-of-order SECTION, expected 1 got 2");
        assert_eq!(e.class(), ErrorClass::SyntaxError);
        assert_eq!(e.line(), Some(3));

        let e = CompileError::UnknownCharacter { line: 9, symbol: '€' };
        assert_eq!(e.to_string(), "line 9: character '€' missing from charset");
        assert_eq!(e.class(), ErrorClass::CharsetError);
    }

    #[test]
    fn lexer_errors_keep_their_line() {
        let e: CompileError = LexError { line: 4, kind: LexErrorKind::UnterminatedString }.into();
        assert_eq!(e.to_string(), "line 4: unterminated quoted string");
        assert_eq!(e.line(), Some(4));
    }

    #[test]
    fn format_errors_locate_the_fault() {
        let e = FormatError::SizeMismatch { offset: 10, len: 12 };
        assert_eq!(e.location(), (10, 12));
        assert_eq!(e.to_string(), "last offset 10 does not match data size 12");
        assert_eq!(DecompileError::from(e).class(), ErrorClass::FormatViolation);
        assert_eq!(FormatError::TooManyEntries { count: 1001, len: 4 }.location(), (0, 4));
    }
}
