use pep_core::{PeptideIdentity, RunStatus};
use pep_pipeline::{BatchEntry, RunRecord};

use crate::cli::root_commands::RunArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::RunProgress;

/// Handle `pep run`.
pub async fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let peptide = identity(args)?;
    let driver = ctx.driver(&args.steps)?;

    let progress = RunProgress::single(&format!("Building page for {}", peptide.name));
    let run = driver.run(&peptide).await;
    progress.finish_run(&run);

    print_run(&run, flags.format)?;
    ensure_not_failed(&run)
}

fn identity(args: &RunArgs) -> anyhow::Result<PeptideIdentity> {
    let peptide = match &args.slug {
        Some(slug) => PeptideIdentity::new(slug.clone(), args.name.clone(), args.aliases.clone())?,
        None => PeptideIdentity::from_name(args.name.clone(), args.aliases.clone())?,
    };
    Ok(peptide)
}

/// Tables get the one-line summary; JSON gets the full record.
pub fn print_run(run: &RunRecord, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Table {
        output(&BatchEntry::from(run), format)
    } else {
        output(run, format)
    }
}

pub fn ensure_not_failed(run: &RunRecord) -> anyhow::Result<()> {
    if run.status == RunStatus::Failed {
        let step = run
            .failed_step
            .map_or_else(|| "unknown".to_string(), |step| step.to_string());
        anyhow::bail!(
            "run for '{}' failed at {step}: {}",
            run.peptide,
            run.error.as_deref().unwrap_or("no error recorded")
        );
    }
    if run.status == RunStatus::NotReady {
        tracing::warn!(
            peptide = %run.peptide,
            reason = run.error.as_deref().unwrap_or_default(),
            "page is not ready to publish"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::identity;
    use crate::cli::{Cli, Commands};

    fn run_args(argv: &[&str]) -> crate::cli::root_commands::RunArgs {
        match Cli::try_parse_from(argv).expect("should parse").command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn slug_is_derived_from_name() {
        let peptide = identity(&run_args(&["pep", "run", "BPC-157"])).unwrap();
        assert_eq!(peptide.slug, "bpc-157");
    }

    #[test]
    fn explicit_slug_wins() {
        let args = run_args(&["pep", "run", "Thymosin beta-4", "--slug", "tb-500"]);
        assert_eq!(identity(&args).unwrap().slug, "tb-500");
    }

    #[test]
    fn invalid_slug_is_rejected() {
        let args = run_args(&["pep", "run", "GHK-Cu", "--slug", "GHK Cu"]);
        assert!(identity(&args).is_err());
    }
}
