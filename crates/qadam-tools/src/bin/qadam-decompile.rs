// crates/qadam-tools/src/bin/qadam-decompile.rs
//! Décompilateur d’archives QADAM pour fichiers `.FIL`.
//!
//! Exemples :
//!   qadam-decompile TEXTS.FIL > TEXTS.txt
//!   qadam-decompile TEXTS.FIL RESOURCE.FIL --out-dir listings/
//!   cat TEXTS.FIL | qadam-decompile - --stdin-name TEXTS.FIL --summary
//!   qadam-decompile TEXTS.FIL --json | jq
//!
//! Options utiles :
//!   --emit <f>          : écrit le listing dans un fichier
//!   --out-dir <d>       : écrit <stem>.txt par entrée
//!   --summary           : résumé coloré du répertoire (stderr)
//!   --json              : résumé JSON structuré (stdout, remplace le listing)
//!   --verify            : round-trip (recompile le listing, octets identiques)
//!   --hex-run-limit <n> : octets hex avant de basculer en chaîne (défaut 5)
//!   --color <mode>      : auto|always|never (couleurs pour résumé)
//!   --time              : chrono
//!
//! NB: sans --emit ni --out-dir, le listing part sur stdout.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use clap::Parser;
use tracing::info;
use yansi::{Color, Paint};

use qadam_core::CharsetTable;
use qadam_fil::{decompile_with, DecompileOptions, DEFAULT_HEX_RUN_LIMIT};
use qadam_tools::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "qadam-decompile", version, about = "Décompilateur d’archives QADAM (.FIL -> texte/JSON)")]
struct Cli {
    /// Archive(s) .FIL à décompiler (ou '-' pour stdin, unique)
    inputs: Vec<String>,

    /// Chemin fichier où écrire le listing (si 1 entrée)
    #[arg(long, conflicts_with = "out_dir")]
    emit: Option<PathBuf>,

    /// Dossier où écrire le(s) listing(s) (si N entrées)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Résumé rapide (sections/offsets/tailles)
    #[arg(long)]
    summary: bool,

    /// Affiche le résumé en JSON sur stdout
    #[arg(long)]
    json: bool,

    /// Recompile le listing et exige les mêmes octets
    #[arg(long)]
    verify: bool,

    /// Octets hex consécutifs avant de supposer une chaîne
    #[arg(long, default_value_t = DEFAULT_HEX_RUN_LIMIT)]
    hex_run_limit: NonZeroUsize,

    /// Nom logique quand l’entrée est '-' (stdin)
    #[arg(long, default_value = "<stdin>")]
    stdin_name: String,

    /// Affiche la durée de traitement
    #[arg(long)]
    time: bool,

    /// Couleurs du résumé: auto|always|never
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Plus de traces (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Seulement les erreurs
    #[arg(short, long, conflicts_with = "verbose")]
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
    setup_colors(cli.color);
    init_tracing(cli.verbose, cli.quiet);

    if cli.inputs.is_empty() {
        return Err(anyhow!("Aucune entrée. Exemple: qadam-decompile TEXTS.FIL --emit TEXTS.txt"));
    }
    let use_stdin = cli.inputs.len() == 1 && cli.inputs[0] == "-";
    if use_stdin && cli.out_dir.is_some() {
        return Err(anyhow!("--out-dir n’a pas de sens avec stdin; utilise --emit"));
    }
    if cli.inputs.len() > 1 && cli.emit.is_some() {
        return Err(anyhow!("Plusieurs entrées → utilise --out-dir au lieu de --emit"));
    }

    let charset = CharsetTable::cp852();
    let options = DecompileOptions { hex_run_limit: cli.hex_run_limit };
    for inp in &cli.inputs {
        let (bytes, name) = read_input(inp, &cli.stdin_name)?;
        process_one(&bytes, &name, &charset, options, &cli)?;
    }

    Ok(())
}

fn process_one(bytes: &[u8], name: &Utf8Path, charset: &CharsetTable, options: DecompileOptions, cli: &Cli) -> Result<()> {
    let timer = Timer::start();

    let listing = decompile_with(bytes, charset, options)
        .with_context(|| format!("Archive invalide: {name}"))?;
    info!(file = %name, size = bytes.len(), "decompiled");

    // avant toute écriture : un listing non fidèle n’est jamais produit
    if cli.verify {
        verify_round_trip(bytes, charset, options).with_context(|| format!("Vérification échouée ({name})"))?;
        eprintln!("{}", "✓ verify round-trip OK".paint(Color::Green));
    }

    if cli.summary || cli.json {
        let summary = summarize(name.as_str(), bytes)?;
        if cli.summary {
            print_summary(&summary);
        }
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    if let Some(file) = &cli.emit {
        let out = to_utf8(file.clone())?;
        write_text(&out, &listing)?;
        eprintln!("📝 Listing → {out}");
    } else if let Some(dir) = &cli.out_dir {
        let out = to_utf8(dir.clone())?.join(default_filename_with_ext(name, "txt"));
        write_text(&out, &listing)?;
        eprintln!("📝 Listing → {out}");
    } else if !cli.json {
        let mut stdout = io::stdout().lock();
        stdout.write_all(listing.as_bytes())?;
        stdout.flush()?;
    }

    if cli.time {
        eprintln!("⏱️  {}", timer.pretty());
    }

    Ok(())
}

fn print_summary(summary: &ArchiveSummary) {
    let title = Utf8Path::new(&summary.file).file_name().unwrap_or("<stdin>");
    let hdr = format!("== {title} ==");
    eprintln!("{}", hdr.paint(Color::Cyan).bold());
    eprintln!(
        "{} sections={}, directory={} B, body={} B, total={} B",
        "•".paint(Color::Blue),
        summary.sections.len(),
        summary.directory_size,
        summary.body_len,
        summary.total_size
    );

    // un petit aperçu des premières sections
    for s in summary.sections.iter().take(8) {
        let len = if s.len == 0 { "vide".paint(Color::Yellow).to_string() } else { format!("{} B", s.len) };
        eprintln!("   [{}] @0x{:06X} {len}", s.section.index, s.offset);
    }
    if summary.sections.len() > 8 {
        eprintln!("   … {} de plus", summary.sections.len() - 8);
    }
}
