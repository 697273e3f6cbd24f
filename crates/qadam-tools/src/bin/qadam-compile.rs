// crates/qadam-tools/src/bin/qadam-compile.rs
//! Compilateur d’archives QADAM : listing texte -> .FIL
//! Usage basique :
//!   qadam-compile TEXTS.txt -o TEXTS.FIL
//!   cat TEXTS.txt | qadam-compile - --out TEXTS.FIL --verify
//! Multi-fichiers :
//!   qadam-compile TEXTS.txt RESOURCE.txt --out-dir build/ --time
//! Flags utiles :
//!   --check         : dry-run, n’écrit rien
//!   --verify        : round-trip (décompile puis recompile, octets identiques)
//!   --emit-listing  : écrit le listing décompilé du résultat dans un fichier
//!   --stdin-name    : nom logique quand l’entrée est '-'
//!   --time          : affiche le temps de compilation
//!   -v / -q         : verbosité des traces (RUST_LOG l’emporte)

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use clap::{ArgAction, Parser};
use tracing::info;

use qadam_core::CharsetTable;
use qadam_fil::{compile, decompile, DecompileOptions};
use qadam_tools::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "qadam-compile", version, about = "Compilateur d’archives QADAM (texte -> .FIL)")]
struct Cli {
    /// Listing(s) source (ou '-' pour stdin, unique)
    inputs: Vec<String>,

    /// Fichier de sortie .FIL (uniquement si 1 entrée)
    #[arg(short, long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Dossier de sortie pour plusieurs entrées (garde <stem>.fil)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// N’écrit rien, vérifie seulement que la compilation passe
    #[arg(long, action = ArgAction::SetTrue)]
    check: bool,

    /// Décompile le résultat et exige une recompilation identique
    #[arg(long, action = ArgAction::SetTrue)]
    verify: bool,

    /// Écrit le listing décompilé du résultat dans ce fichier
    #[arg(long)]
    emit_listing: Option<PathBuf>,

    /// Nom logique du fichier quand l’entrée est '-' (stdin)
    #[arg(long, default_value = "<stdin>")]
    stdin_name: String,

    /// Affiche la durée de compilation
    #[arg(long, action = ArgAction::SetTrue)]
    time: bool,

    /// Plus de traces (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Seulement les erreurs
    #[arg(short, long, action = ArgAction::SetTrue, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    color_eyre::install().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.inputs.is_empty() {
        return Err(anyhow!("Aucune entrée fournie. Exemple: qadam-compile TEXTS.txt -o TEXTS.FIL"));
    }

    let use_stdin = cli.inputs.len() == 1 && cli.inputs[0] == "-";
    if use_stdin && cli.out_dir.is_some() {
        return Err(anyhow!("`--out-dir` n’a pas de sens pour stdin; utilise `--out`"));
    }
    if cli.inputs.len() > 1 && (cli.out.is_some() || cli.emit_listing.is_some()) {
        return Err(anyhow!("Avec plusieurs entrées, utilise `--out-dir` au lieu de `--out` / `--emit-listing`"));
    }
    if use_stdin && cli.out.is_none() && !cli.check {
        return Err(anyhow!("Entrée stdin : précise `--out` (ou `--check`)"));
    }

    let charset = CharsetTable::cp852();
    for inp in &cli.inputs {
        let (bytes, in_name) = read_input(inp, &cli.stdin_name)?;
        run_one(&bytes, &in_name, &charset, &cli)?;
    }

    Ok(())
}

fn run_one(src: &[u8], in_name: &Utf8Path, charset: &CharsetTable, cli: &Cli) -> Result<()> {
    let timer = Timer::start();

    let src = std::str::from_utf8(src).with_context(|| format!("Source non UTF-8: {in_name}"))?;
    let bytes = compile(src, charset).with_context(|| format!("Erreur de compilation ({in_name})"))?;
    info!(file = %in_name, size = bytes.len(), "compiled");

    if cli.verify {
        verify_round_trip(&bytes, charset, DecompileOptions::default())
            .with_context(|| format!("Vérification échouée ({in_name})"))?;
    }

    if let Some(path) = &cli.emit_listing {
        let path = to_utf8(path.clone())?;
        let listing = decompile(&bytes, charset)?;
        write_text(&path, &listing)?;
        eprintln!("📝 Listing écrit → {path}");
    }

    if cli.check {
        if cli.time {
            eprintln!("⏱️  {}", timer.pretty());
        }
        eprintln!("✅ Compilation OK (check-only) — {in_name}");
        return Ok(());
    }

    let out_path = if let Some(out) = &cli.out {
        to_utf8(out.clone())?
    } else if let Some(dir) = &cli.out_dir {
        to_utf8(dir.clone())?.join(default_filename_with_ext(in_name, "fil"))
    } else {
        default_out_path(in_name, "fil")
    };
    if out_path.as_path() == in_name {
        return Err(anyhow!("La sortie écraserait l’entrée: {out_path}"));
    }

    write_bytes(&out_path, &bytes)?;
    eprintln!("✅ Compilé → {out_path} ({} octets)", bytes.len());

    if cli.time {
        eprintln!("⏱️  {}", timer.pretty());
    }

    Ok(())
}
