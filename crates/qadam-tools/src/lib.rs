//! qadam-tools — bibliothèque commune des outils CLI QADAM.
//!
//! Objectifs : mutualiser I/O, chrono, couleurs, traces et résumés d’archives
//! entre `qadam-compile` et `qadam-decompile`.
//!
//! ## Modules & zones clés
//! - `prelude` : import rapide des types/fns usuels
//! - I/O       : `read_bytes`, `read_input`, `write_text`, `write_bytes`
//!   (écriture atomique : fichier temporaire voisin puis `rename`)
//! - Time      : `Timer`, `human_millis`
//! - Couleurs  : `ColorMode`, `setup_colors`
//! - Traces    : `init_tracing` (`RUST_LOG`, `-v`, `-q`)
//! - Archives  : `ArchiveSummary`, `summarize`, `verify_round_trip`
//!
//! Les fonctions sont pensées "no surprises" et avec `anyhow::Result`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use qadam_core::CharsetTable;
use qadam_fil::{compile, decompile_with, DecompileOptions, Directory, FormatError, Section};

/* ------------------------------------------------------------------------- */
/* Prelude                                                                   */
/* ------------------------------------------------------------------------- */

/// Prelude pratique pour les bins: re-exports compacts.
pub mod prelude {
    pub use anyhow::{anyhow, bail, Context, Result};
    pub use camino::{Utf8Path, Utf8PathBuf};
    pub use crate::{
        human_millis, Timer,
        read_bytes, read_input, read_stdin_to_bytes,
        write_text, write_bytes,
        to_utf8, default_out_path, default_filename_with_ext,
        ColorMode, setup_colors, init_tracing,
        ArchiveSummary, SectionSummary, summarize, verify_round_trip,
    };
}

/* ------------------------------------------------------------------------- */
/* I/O utils                                                                 */
/* ------------------------------------------------------------------------- */

/// Lis un fichier binaire.
pub fn read_bytes(path: &Utf8Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("lecture {path}"))
}

/// Lis tout `stdin` en bytes.
pub fn read_stdin_to_bytes() -> Result<Vec<u8>> {
    let mut v = Vec::new();
    io::stdin().read_to_end(&mut v).context("lecture stdin")?;
    Ok(v)
}

/// Lis une entrée CLI : `-` pour stdin (nommé `stdin_name`), sinon un chemin.
pub fn read_input(arg: &str, stdin_name: &str) -> Result<(Vec<u8>, Utf8PathBuf)> {
    if arg == "-" {
        Ok((read_stdin_to_bytes()?, Utf8PathBuf::from(stdin_name)))
    } else {
        let p = Utf8PathBuf::from(arg);
        Ok((read_bytes(&p)?, p))
    }
}

/// Écrit un texte (UTF-8). Crée les dossiers au besoin.
pub fn write_text(path: &Utf8Path, s: &str) -> Result<()> {
    write_bytes(path, s.as_bytes())
}

/// Écrit des bytes via un fichier temporaire voisin renommé ensuite :
/// un échec ne laisse jamais de fichier partiel. Crée les dossiers au besoin.
pub fn write_bytes(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("création {parent}"))?;
    }
    let name = path.file_name().ok_or_else(|| anyhow!("chemin sans nom de fichier: {path}"))?;
    let tmp = path.with_file_name(format!(".{name}.tmp"));

    let res = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res.with_context(|| format!("écriture {path}"))
}

/// Convertit un `PathBuf` en `Utf8PathBuf` (erreur si non UTF-8).
pub fn to_utf8(p: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(p).map_err(|p| anyhow!("chemin non UTF-8: {}", p.display()))
}

/* ------------------------------------------------------------------------- */
/* Time / chrono                                                             */
/* ------------------------------------------------------------------------- */

/// Chrono de scope simple; loggable ensuite.
pub struct Timer {
    start: Instant,
}
impl Timer {
    /// Démarre un chrono.
    pub fn start() -> Self { Self { start: Instant::now() } }
    /// Durée écoulée.
    pub fn elapsed(&self) -> Duration { self.start.elapsed() }
    /// Format humain court.
    pub fn pretty(&self) -> String { human_millis(self.elapsed()) }
}

/// Format "humain" d'une durée.
pub fn human_millis(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1_000 { return format!("{ms} ms"); }
    let s = d.as_secs_f64();
    if s < 60.0 { return format!("{s:.3} s"); }
    let m = (s / 60.0).floor();
    let rest = s - m * 60.0;
    format!("{m:.0} min {rest:.1} s")
}

/* ------------------------------------------------------------------------- */
/* Couleurs & traces                                                         */
/* ------------------------------------------------------------------------- */

/// Contrôle l'application de couleurs ANSI dans les sorties CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Active les couleurs seulement si la sortie supporte ANSI (auto-détection).
    Auto,
    /// Force l'activation des couleurs.
    Always,
    /// Désactive complètement les couleurs ANSI.
    Never,
}

/// Configure le mode couleur global pour yansi.
pub fn setup_colors(mode: ColorMode) {
    match mode {
        ColorMode::Auto => yansi::whenever(yansi::Condition::DEFAULT),
        ColorMode::Always => yansi::enable(),
        ColorMode::Never => yansi::disable(),
    }
}

/// Installe le subscriber `tracing` (stderr).
///
/// `RUST_LOG` l’emporte ; sinon `warn`, `info` avec `-v`, `debug` avec `-vv`,
/// `trace` au-delà, `error` avec `-q`. Un second appel est sans effet.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/* ------------------------------------------------------------------------- */
/* Archives                                                                  */
/* ------------------------------------------------------------------------- */

/// Vue sérialisable d’un répertoire d’archive (`--summary`, `--json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Nom logique de l’entrée.
    pub file: String,
    /// Taille du répertoire (`1 + 3 * (n + 1)`).
    pub directory_size: usize,
    /// Octets après le répertoire.
    pub body_len: usize,
    /// Taille totale du fichier.
    pub total_size: usize,
    /// Une entrée par section.
    pub sections: Vec<SectionSummary>,
}

/// Une section du résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    /// Index et offset relatif au corps.
    #[serde(flatten)]
    pub section: Section,
    /// Offset absolu dans le fichier.
    pub offset: usize,
    /// Longueur jusqu’à la section suivante (ou la fin).
    pub len: usize,
}

/// Lit le répertoire de `bytes` et en fait un résumé.
pub fn summarize(file: &str, bytes: &[u8]) -> Result<ArchiveSummary, FormatError> {
    let dir = Directory::read(bytes)?;
    let end = dir.directory_end();
    let sections = (0u8..)
        .zip(0..dir.section_count())
        .filter_map(|(index, i)| {
            let range = dir.section_range(i)?;
            let body_offset = u32::try_from(range.start - end).ok()?;
            Some(SectionSummary { section: Section { index, body_offset }, offset: range.start, len: range.len() })
        })
        .collect();
    Ok(ArchiveSummary {
        file: file.to_owned(),
        directory_size: end,
        body_len: dir.total_size() - end,
        total_size: dir.total_size(),
        sections,
    })
}

/// Décompile puis recompile `bytes` ; échoue si le résultat diffère.
pub fn verify_round_trip(bytes: &[u8], charset: &CharsetTable, options: DecompileOptions) -> Result<()> {
    let listing = decompile_with(bytes, charset, options).context("décompilation")?;
    let again = compile(&listing, charset).context("recompilation du listing")?;
    if again != bytes {
        let at = again.iter().zip(bytes).position(|(a, b)| a != b).unwrap_or_else(|| again.len().min(bytes.len()));
        bail!("round-trip divergent à l’offset {at} ({} octets relus, {} attendus)", again.len(), bytes.len());
    }
    Ok(())
}

/* ------------------------------------------------------------------------- */
/* Divers                                                                     */
/* ------------------------------------------------------------------------- */

/// Construit un nom `<stem>.<ext>` à partir d'un input.
pub fn default_filename_with_ext(input: &Utf8Path, ext: &str) -> String {
    let stem = input.file_stem().unwrap_or("out");
    format!("{stem}.{ext}")
}

/// Remplace l’extension par `ext` (sans point), ex: `fil`.
pub fn default_out_path(input: &Utf8Path, ext: &str) -> Utf8PathBuf {
    input.with_extension(ext)
}

/* ------------------------------------------------------------------------- */
/* Tests                                                                      */
/* ------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn durations() {
        assert_eq!(human_millis(Duration::from_millis(42)), "42 ms");
        assert_eq!(human_millis(Duration::from_millis(1_500)), "1.500 s");
        assert_eq!(human_millis(Duration::from_secs(90)), "1 min 30.0 s");
    }

    #[test]
    fn out_paths() {
        let p = Utf8Path::new("data/TEXTS.txt");
        assert_eq!(default_out_path(p, "fil"), Utf8PathBuf::from("data/TEXTS.fil"));
        assert_eq!(default_filename_with_ext(p, "txt"), "TEXTS.txt");
        assert_eq!(default_filename_with_ext(Utf8Path::new(""), "fil"), "out.fil");
    }

    #[test]
    fn atomic_write_creates_dirs_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let root = to_utf8(tmp.path().to_path_buf()).unwrap();
        let out = root.join("nested/dir/TEXTS.FIL");

        write_bytes(&out, &[1, 2, 3]).unwrap();
        write_bytes(&out, &[4]).unwrap();
        assert_eq!(read_bytes(&out).unwrap(), vec![4]);

        let names: Vec<_> = fs::read_dir(out.parent().unwrap()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("TEXTS.FIL")]);
    }

    #[test]
    fn summary_of_compiled_archive() {
        let cs = CharsetTable::cp852();
        let bytes = compile("SECTION 0\n[01 02]\nSECTION 1\n\"Hi\"\n", &cs).unwrap();
        let s = summarize("T.FIL", &bytes).unwrap();
        assert_eq!(s.directory_size, 10);
        assert_eq!(s.body_len, 5);
        assert_eq!(s.total_size, 15);
        assert_eq!(
            s.sections,
            vec![
                SectionSummary { section: Section { index: 0, body_offset: 0 }, offset: 10, len: 2 },
                SectionSummary { section: Section { index: 1, body_offset: 2 }, offset: 12, len: 3 },
            ]
        );

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["sections"][1]["index"], 1);
        assert_eq!(json["sections"][1]["offset"], 12);
    }

    #[test]
    fn summary_rejects_bad_archives() {
        assert!(matches!(summarize("x", &[1, 0]), Err(FormatError::Truncated { .. })));
    }

    #[test]
    fn round_trip_check() {
        let cs = CharsetTable::cp852();
        let bytes = compile("SECTION 0\n[05 04 03 02 01] \"Ahoj\" NO_NUL\nSECTION 1\n", &cs).unwrap();
        verify_round_trip(&bytes, &cs, DecompileOptions::default()).unwrap();
        assert!(verify_round_trip(&[0, 4, 0, 0], &cs, DecompileOptions::default()).is_err());
    }
}
