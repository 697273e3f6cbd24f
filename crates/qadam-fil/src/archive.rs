//! Modèle d’archive en mémoire et répertoire binaire.
//!
//! Disposition :
//! ```text
//! count: u8
//! offset[0..count]: u24 LE      début absolu de chaque section
//! total: u24 LE                 taille du fichier
//! corps
//! ```
//! `directory_size(n) = 1 + 3 * (n + 1)` ; chaque offset l’inclut déjà.

use core::ops::Range;

use qadam_core::{ByteReader, ByteWriter, CoreError, U24_MAX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, FormatError};

/// Sections qu’un compte sur un octet peut déclarer.
pub const MAX_SECTIONS: usize = 255;

/// Plafond de cohérence du compte déclaré, à la lecture.
pub const MAX_DIRECTORY_ENTRIES: usize = 1000;

/// Longueur du répertoire pour `section_count` sections.
#[inline]
#[must_use]
pub const fn directory_size(section_count: usize) -> usize { 1 + 3 * (section_count + 1) }

/// Une directive `SECTION n` : début de ses données dans le corps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Section {
    /// Indice séquentiel, à partir de 0.
    pub index: u8,
    /// Offset dans le corps (après le répertoire).
    pub body_offset: u32,
}

/* ─────────────────────────── Archive ─────────────────────────── */

/// Sections + corps ; se sérialise octet pour octet comme sur disque.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Archive {
    sections: Vec<Section>,
    body: Vec<u8>,
}

impl Archive {
    /// Valide numérotation et placement des sections.
    ///
    /// # Errors
    /// Plus de 255 sections, indices hors de la suite `0, 1, 2, …`, offsets
    /// après la fin du corps ou en recul.
    pub fn new(sections: Vec<Section>, body: Vec<u8>) -> Result<Self, ArchiveError> {
        if sections.len() > MAX_SECTIONS {
            return Err(ArchiveError::TooManySections { count: sections.len() });
        }
        let mut previous = 0u32;
        for (position, s) in sections.iter().enumerate() {
            if usize::from(s.index) != position {
                return Err(ArchiveError::MisnumberedSection { position, index: s.index });
            }
            if s.body_offset as usize > body.len() {
                return Err(ArchiveError::SectionPastEnd { index: s.index, offset: s.body_offset, body_len: body.len() });
            }
            if s.body_offset < previous {
                return Err(ArchiveError::UnorderedSections { index: s.index, offset: s.body_offset, previous });
            }
            previous = s.body_offset;
        }
        Ok(Self { sections, body })
    }

    /// Lit et valide une archive binaire.
    ///
    /// # Errors
    /// Voir [`Directory::read`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        let dir = Directory::read(data)?;
        let end = dir.directory_end();
        let sections = (0u8..)
            .zip(dir.section_starts())
            .map(|(index, &start)| Section { index, body_offset: (start - end) as u32 })
            .collect();
        Ok(Self { sections, body: data[end..].to_vec() })
    }

    /// Sections dans l’ordre des indices.
    #[must_use]
    pub fn sections(&self) -> &[Section] { &self.sections }

    /// Octets du corps (tout ce qui suit le répertoire).
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// `1 + 3 * (sections + 1)`.
    #[must_use]
    pub fn directory_size(&self) -> usize { directory_size(self.sections.len()) }

    /// Taille de l’archive sérialisée.
    #[must_use]
    pub fn total_size(&self) -> usize { self.directory_size() + self.body.len() }

    /// Entrées absolues du répertoire : une par section, puis la taille totale.
    #[must_use]
    pub fn offsets(&self) -> Vec<usize> {
        let dir = self.directory_size();
        self.sections
            .iter()
            .map(|s| dir + s.body_offset as usize)
            .chain(core::iter::once(self.total_size()))
            .collect()
    }

    /// Octets du corps de la section `index` (jusqu’à la suivante).
    #[must_use]
    pub fn section_bytes(&self, index: usize) -> Option<&[u8]> {
        let start = self.sections.get(index)?.body_offset as usize;
        let end = self.sections.get(index + 1).map_or(self.body.len(), |s| s.body_offset as usize);
        self.body.get(start..end)
    }

    /// Sérialise répertoire + corps.
    ///
    /// # Errors
    /// `ArchiveError::TooLarge` si les offsets dépassent 24 bits.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let total = self.total_size();
        if total > U24_MAX as usize {
            return Err(ArchiveError::TooLarge { size: total });
        }
        let count = u8::try_from(self.sections.len())
            .map_err(|_| ArchiveError::TooManySections { count: self.sections.len() })?;

        let mut w = ByteWriter::with_capacity(total);
        w.write_u8(count);
        for offset in self.offsets() {
            w.write_u24_le(offset).map_err(|_| ArchiveError::TooLarge { size: total })?;
        }
        w.write_bytes(&self.body);
        Ok(w.into_vec())
    }
}

/* ─────────────────────────── Directory (lecture) ─────────────────────────── */

/// En-tête validé d’une archive binaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    starts: Vec<usize>,
    end: usize,
    total: usize,
}

impl Directory {
    /// Lit le répertoire de `data` et le confronte au tampon.
    ///
    /// # Errors
    /// - `Truncated` pour un tampon vide ou plus court que son répertoire ;
    /// - `TooManyEntries` au-delà de [`MAX_DIRECTORY_ENTRIES`] ;
    /// - `OffsetOutOfBounds` pour une entrée hors du tampon, ou une section
    ///   qui commence dans le répertoire ;
    /// - `SizeMismatch` si la dernière entrée n’est pas la longueur du tampon ;
    /// - `UnorderedOffsets` si une section commence avant la précédente.
    pub fn read(data: &[u8]) -> Result<Self, FormatError> {
        let len = data.len();
        let truncated = |e: CoreError, needed: usize| match e {
            CoreError::UnexpectedEof { at, .. } => FormatError::Truncated { offset: at, needed, len },
            _ => FormatError::Truncated { offset: 0, needed, len },
        };

        let mut r = ByteReader::new(data);
        let count = usize::from(r.read_u8().map_err(|e| truncated(e, 1))?);
        if count > MAX_DIRECTORY_ENTRIES {
            return Err(FormatError::TooManyEntries { count, len });
        }
        let end = directory_size(count);
        if len < end {
            return Err(FormatError::Truncated { offset: len, needed: end, len });
        }

        let mut entries = Vec::with_capacity(count + 1);
        for index in 0..=count {
            let offset = r.read_u24_le().map_err(|e| truncated(e, end))? as usize;
            if offset > len {
                return Err(FormatError::OffsetOutOfBounds { index, offset, len });
            }
            entries.push(offset);
        }

        let total = entries.pop().unwrap_or(len);
        if total != len {
            return Err(FormatError::SizeMismatch { offset: total, len });
        }

        let mut previous = end;
        for (index, &offset) in entries.iter().enumerate() {
            if offset < end {
                return Err(FormatError::OffsetOutOfBounds { index, offset, len });
            }
            if offset < previous {
                return Err(FormatError::UnorderedOffsets { index, offset, len });
            }
            previous = offset;
        }

        Ok(Self { starts: entries, end, total })
    }

    /// Nombre de sections déclarées.
    #[must_use]
    pub fn section_count(&self) -> usize { self.starts.len() }

    /// Offset absolu de début de chaque section.
    #[must_use]
    pub fn section_starts(&self) -> &[usize] { &self.starts }

    /// Premier octet du corps (`directory_size(count)`).
    #[must_use]
    pub const fn directory_end(&self) -> usize { self.end }

    /// Taille totale, égale à la longueur du tampon.
    #[must_use]
    pub const fn total_size(&self) -> usize { self.total }

    /// Plage absolue des octets de la section `index`.
    #[must_use]
    pub fn section_range(&self, index: usize) -> Option<Range<usize>> {
        let start = *self.starts.get(index)?;
        let end = self.starts.get(index + 1).copied().unwrap_or(self.total);
        Some(start..end)
    }

    /// Indices des sections qui commencent exactement à `at`.
    pub fn sections_at(&self, at: usize) -> impl Iterator<Item = usize> + '_ {
        self.starts.iter().enumerate().filter(move |&(_, &s)| s == at).map(|(i, _)| i)
    }

    /// Premier début de section strictement après `at`, sinon la taille totale.
    #[must_use]
    pub fn next_boundary(&self, at: usize) -> usize {
        self.starts.iter().copied().find(|&s| s > at).unwrap_or(self.total)
    }
}
