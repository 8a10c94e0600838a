//! `kindred` — reconcile provider DNA-match exports into a genealogy graph.
//!
//! Reads a DNAGedcom-style source database, normalizes the selected kits'
//! match data into canonical records, and merges them into a
//! RootsMagic-shaped target database.
//!
//! ```
//! kindred --source dnagedcom.db --target tree.rmtree
//! kindred --source dnagedcom.db --target tree.rmtree --kits a --limit 500
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use kindred_core::{
  clock::SystemClock, config::PipelineConfig, ident::IdentityResolver,
  record::Provider,
};
use kindred_extract::{fetch::SourceDb, normalize_all, rows::KitRow};
use kindred_store_sqlite::{GraphStore, MergeEngine, MergeReport};

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Reconcile DNA-match exports into a genealogy database"
)]
struct Cli {
  /// Source (DNAGedcom-style) SQLite database.
  #[arg(short, long)]
  source: PathBuf,

  /// Target (RootsMagic-shaped) SQLite database.
  #[arg(short, long)]
  target: PathBuf,

  /// Kits to process: guids, or provider selectors `a` (Ancestry),
  /// `f` (FTDNA), `m` (MyHeritage). Default: every discovered kit.
  #[arg(short, long)]
  kits: Vec<String>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "kindred.toml")]
  config: PathBuf,

  /// Cap on rows fetched per source table (0 = no cap).
  #[arg(long)]
  limit: Option<u32>,

  /// Progress checkpoint interval inside merge passes.
  #[arg(long)]
  batch: Option<u32>,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("KINDRED"))
    .build()
    .context("failed to read config file")?;
  let mut cfg: PipelineConfig = settings
    .try_deserialize()
    .context("failed to deserialise PipelineConfig")?;
  if let Some(limit) = cli.limit {
    cfg.row_limit = limit;
  }
  if let Some(batch) = cli.batch {
    cfg.batch_size = batch;
  }

  let source = SourceDb::open(&cli.source)
    .with_context(|| format!("failed to open source {:?}", cli.source))?;
  let store = GraphStore::open(&cli.target)
    .with_context(|| format!("failed to open target {:?}", cli.target))?;

  let kits = source.user_kits().context("kit discovery failed")?;
  if kits.is_empty() {
    bail!("no kits registered in the source database");
  }
  let selected = select_kits(&kits, &cli.kits);
  if selected.is_empty() {
    bail!("no kits match the given selectors");
  }
  for kit in &selected {
    info!(
      provider = kit.provider.label(),
      guid = %kit.guid,
      name = %format!("{} {}", kit.given, kit.surname).trim(),
      "selected kit"
    );
  }

  let ids = source
    .filter_selected_kits(&selected, &cfg)
    .context("kit filtering failed")?;

  let mut resolver = IdentityResolver::new();
  let (mut records, skips) =
    normalize_all(&source, &cfg, &selected, &ids, &mut resolver)
      .context("normalization failed")?;
  if skips.rows > 0 {
    info!(rows = skips.rows, "source rows skipped for missing keys");
  }

  let clock = SystemClock;
  store
    .ensure_dna_kit_fact_type(&clock)
    .context("fact-type setup failed")?;

  let mut engine = MergeEngine::new(store, clock, cfg.batch_size);
  let report = engine.run(&mut records).context("merge aborted")?;
  log_report(&report);

  Ok(())
}

fn log_report(report: &MergeReport) {
  let passes = [
    ("family", report.families),
    ("person", report.persons),
    ("name", report.names),
    ("child", report.children),
    ("dna", report.dna_edges),
    ("event", report.events),
  ];
  for (pass, counts) in passes {
    info!(pass, processed = counts.processed, skipped = counts.skipped, "merged");
  }
}

/// Selectors are kit guids or single-letter provider names; an empty
/// selector list keeps every kit.
fn select_kits(kits: &[KitRow], selectors: &[String]) -> Vec<KitRow> {
  if selectors.is_empty() {
    return kits.to_vec();
  }
  kits
    .iter()
    .filter(|kit| selectors.iter().any(|sel| selector_matches(kit, sel)))
    .cloned()
    .collect()
}

fn selector_matches(kit: &KitRow, selector: &str) -> bool {
  match selector.to_ascii_lowercase().as_str() {
    "a" => kit.provider == Provider::Ancestry,
    "f" => kit.provider == Provider::Ftdna,
    "m" => kit.provider == Provider::MyHeritage,
    guid => kit.guid.eq_ignore_ascii_case(guid),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kit(provider: Provider, guid: &str) -> KitRow {
    KitRow {
      provider,
      guid: guid.to_owned(),
      given: String::new(),
      surname: String::new(),
    }
  }

  #[test]
  fn empty_selector_keeps_all_kits() {
    let kits =
      vec![kit(Provider::Ancestry, "g1"), kit(Provider::MyHeritage, "g2")];
    assert_eq!(select_kits(&kits, &[]).len(), 2);
  }

  #[test]
  fn provider_letter_selects_by_provider() {
    let kits =
      vec![kit(Provider::Ancestry, "g1"), kit(Provider::MyHeritage, "g2")];
    let picked = select_kits(&kits, &["m".to_owned()]);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].guid, "g2");
  }

  #[test]
  fn guid_selector_is_case_insensitive() {
    let kits = vec![kit(Provider::Ancestry, "AbC-123")];
    assert_eq!(select_kits(&kits, &["abc-123".to_owned()]).len(), 1);
  }
}
