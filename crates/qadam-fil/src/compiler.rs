//! Texte source → archive binaire.
//!
//! Le dialecte source, une directive par jeton :
//!
//! ```text
//! SECTION 0              ; ouvre la section 0 ici
//! [01 02 0A]             ; octets bruts, tels quels
//! "Dobrý den\n"          ; table, obfuscation, terminateur NUL
//! "sans fin" NO_NUL      ; retire le NUL tout juste émis
//! ```
//!
//! Les sections se déclarent dans l’ordre `0, 1, 2, …`. Tout ou rien : la
//! première erreur interrompt la compilation et rien n’est rendu.

use std::io::BufRead;

use qadam_core::{obfuscate, CharsetTable};
use qadam_lexer::{tokenize_line, Token};
use tracing::{debug, trace};

use crate::archive::{Archive, Section, MAX_SECTIONS};
use crate::error::{ArchiveError, CompileError, SyntaxErrorKind};

/// Compilateur incrémental : on pousse les lignes, puis [`Compiler::finish`].
#[derive(Debug)]
pub struct Compiler<'t> {
    charset: &'t CharsetTable,
    sections: Vec<Section>,
    body: Vec<u8>,
}

impl<'t> Compiler<'t> {
    /// Compilateur vide sur `charset`.
    #[must_use]
    pub const fn new(charset: &'t CharsetTable) -> Self {
        Self { charset, sections: Vec::new(), body: Vec::new() }
    }

    /// Découpe et applique une ligne source (`line_no` 1-based).
    ///
    /// # Errors
    /// Toute erreur lexicale, syntaxique ou de table sur cette ligne.
    pub fn feed_line(&mut self, line_no: u32, line: &str) -> Result<(), CompileError> {
        for token in tokenize_line(line, line_no)? {
            self.apply(line_no, token)?;
        }
        Ok(())
    }

    /// Applique un jeton.
    ///
    /// # Errors
    /// `SECTION` hors d’ordre ou en trop, `NO_NUL` mal placé, caractère
    /// inconnu ou mot nu.
    pub fn apply(&mut self, line: u32, token: Token) -> Result<(), CompileError> {
        match token {
            Token::SectionMarker(found) => self.open_section(line, found)?,
            Token::HexBlock(bytes) => self.body.extend_from_slice(&bytes),
            Token::QuotedString(text) => self.push_string(line, &text)?,
            Token::NoNulMarker => match self.body.last() {
                Some(0) => {
                    self.body.pop();
                }
                Some(_) => return Err(CompileError::syntax(line, SyntaxErrorKind::NoNulWithoutNul)),
                None => return Err(CompileError::syntax(line, SyntaxErrorKind::NoNulWithoutOutput)),
            },
            Token::Word(word) => return Err(CompileError::syntax(line, SyntaxErrorKind::UnrecognizedToken(word))),
        }
        Ok(())
    }

    /// Valide et rend le modèle d’archive.
    ///
    /// # Errors
    /// `NoSections` si aucun `SECTION` n’a été déclaré.
    pub fn finish(self) -> Result<Archive, CompileError> {
        if self.sections.is_empty() {
            return Err(CompileError::NoSections);
        }
        let archive = Archive::new(self.sections, self.body)?;
        debug!(
            sections = archive.sections().len(),
            body_len = archive.body().len(),
            total = archive.total_size(),
            "compiled archive"
        );
        Ok(archive)
    }

    fn open_section(&mut self, line: u32, found: u32) -> Result<(), CompileError> {
        let expected = self.sections.len();
        if found as usize != expected {
            return Err(CompileError::syntax(
                line,
                SyntaxErrorKind::OutOfOrderSection { expected: expected as u32, found },
            ));
        }
        let index = u8::try_from(expected)
            .ok()
            .filter(|_| expected < MAX_SECTIONS)
            .ok_or_else(|| CompileError::syntax(line, SyntaxErrorKind::TooManySections))?;
        let body_offset =
            u32::try_from(self.body.len()).map_err(|_| ArchiveError::TooLarge { size: self.body.len() })?;
        trace!(line, index, body_offset, "section");
        self.sections.push(Section { index, body_offset });
        Ok(())
    }

    fn push_string(&mut self, line: u32, text: &str) -> Result<(), CompileError> {
        self.body.reserve(text.len() + 1);
        for symbol in text.chars() {
            let b = self
                .charset
                .display_to_byte(symbol)
                .map_err(|_| CompileError::UnknownCharacter { line, symbol })?;
            self.body.push(obfuscate(b));
        }
        self.body.push(0);
        Ok(())
    }
}

/// Compile un texte source entier.
///
/// # Errors
/// La première [`CompileError`] rencontrée ; rien n’est produit en cas d’échec.
pub fn compile(source: &str, charset: &CharsetTable) -> Result<Vec<u8>, CompileError> {
    let mut compiler = Compiler::new(charset);
    for (line, line_no) in source.lines().zip(1u32..) {
        compiler.feed_line(line_no, line)?;
    }
    Ok(compiler.finish()?.to_bytes()?)
}

/// Comme [`compile`], en lisant les lignes depuis `reader`.
///
/// # Errors
/// Les échecs de lecture remontent en `CompileError::Io`.
pub fn compile_reader<R: BufRead>(reader: R, charset: &CharsetTable) -> Result<Vec<u8>, CompileError> {
    let mut compiler = Compiler::new(charset);
    for (line, line_no) in reader.lines().zip(1u32..) {
        compiler.feed_line(line_no, &line?)?;
    }
    Ok(compiler.finish()?.to_bytes()?)
}
