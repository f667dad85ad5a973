use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Build (and by default publish) the page for one peptide.
    Run(RunArgs),
    /// Run every peptide listed in a TOML file, one after another.
    Batch(BatchArgs),
    /// Grade a JSON array of studies without calling any service.
    Grade(GradeArgs),
    /// Check a page record JSON file for citations and compliance.
    Audit(AuditArgs),
    /// Show the latest stored page for a slug.
    Show(SlugArgs),
    /// Publish the stored page again as a new version.
    Republish(SlugArgs),
    /// Publish history for a slug.
    History(SlugArgs),
}

/// Step toggles shared by `run` and `batch`.
#[derive(Clone, Debug, Default, Args)]
pub struct StepArgs {
    /// Stop after the compliance gates; do not publish.
    #[arg(long)]
    pub draft: bool,

    /// Skip the external compliance audit.
    #[arg(long)]
    pub skip_full_audit: bool,

    /// Fail the quick audit when any study is never cited.
    #[arg(long)]
    pub require_citations: bool,

    /// Do not request lay summaries for sections.
    #[arg(long)]
    pub no_plain_summaries: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Display name of the peptide (e.g. "BPC-157").
    pub name: String,

    /// Alternative names searched alongside the display name.
    #[arg(short, long = "alias")]
    pub aliases: Vec<String>,

    /// Explicit slug; derived from the name when omitted.
    #[arg(long)]
    pub slug: Option<String>,

    #[command(flatten)]
    pub steps: StepArgs,
}

#[derive(Clone, Debug, Args)]
pub struct BatchArgs {
    /// TOML file with `[[peptide]]` entries.
    pub file: PathBuf,

    /// Stop at the first failed peptide.
    #[arg(long)]
    pub stop_on_error: bool,

    /// Override the pause between peptides, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    #[command(flatten)]
    pub steps: StepArgs,
}

#[derive(Clone, Debug, Args)]
pub struct GradeArgs {
    /// JSON file holding an array of studies.
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// JSON file holding a page record.
    pub file: PathBuf,

    /// Also run the external compliance audit.
    #[arg(long)]
    pub full: bool,
}

#[derive(Clone, Debug, Args)]
pub struct SlugArgs {
    /// Peptide slug, e.g. `bpc-157`.
    pub slug: String,
}
