//! qadam-fil — format d’archive `.FIL` (TEXTS.FIL, RESOURCE.FIL)
//!
//! Une archive = un octet de compte de sections, un répertoire d’offsets
//! 24 bits little-endian, puis un corps mêlant enregistrements binaires et
//! chaînes obfusquées terminées par NUL. Ce crate passe des listings source
//! aux archives, et retour :
//!
//! - [`compile`] / [`Compiler`] : texte source → octets
//! - [`decompile`] / [`decompile_with`] / [`decompile_to`] : octets → texte source
//! - [`Archive`] / [`Directory`] : modèle en mémoire et en-tête côté lecture
//!
//! ```
//! use qadam_core::CharsetTable;
//! use qadam_fil::{compile, decompile};
//!
//! let cs = CharsetTable::cp852();
//! let bytes = compile("SECTION 0\n[01 02]\n\"Hi\"\n", &cs).unwrap();
//! assert_eq!(bytes, [0x01, 0x07, 0, 0, 0x0C, 0, 0, 0x01, 0x02, 0x79, 0x9A, 0x00]);
//!
//! let text = decompile(&bytes, &cs).unwrap();
//! assert_eq!(compile(&text, &cs).unwrap(), bytes);
//! ```
//!
//! Features :
//! - `serde` : derive sur `Section`, `Archive` (sérialisation seule) et les types d’erreur

#![deny(missing_docs)]

pub mod archive;
pub mod compiler;
pub mod decompiler;
pub mod error;

pub use archive::{directory_size, Archive, Directory, Section, MAX_DIRECTORY_ENTRIES, MAX_SECTIONS};
pub use compiler::{compile, compile_reader, Compiler};
pub use decompiler::{decompile, decompile_to, decompile_with, DecompileOptions, DEFAULT_HEX_RUN_LIMIT};
pub use error::{ArchiveError, CompileError, DecompileError, ErrorClass, FormatError, SyntaxErrorKind};

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        compile, decompile, decompile_with, Archive, CompileError, DecompileError, DecompileOptions, Directory,
        ErrorClass, FormatError, Section,
    };
    pub use qadam_core::CharsetTable;
}
