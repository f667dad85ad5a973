use anyhow::Context;
use pep_pipeline::{BatchRunner, parse_peptide_list};

use crate::cli::root_commands::BatchArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::RunProgress;

/// Handle `pep batch`.
pub async fn handle(args: &BatchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let peptides = parse_peptide_list(&text)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    if peptides.is_empty() {
        anyhow::bail!("{} lists no peptides", args.file.display());
    }

    let mut pipeline = ctx.config.pipeline.clone();
    if args.stop_on_error {
        pipeline.continue_on_error = false;
    }
    if let Some(delay_ms) = args.delay_ms {
        pipeline.delay_between_ms = delay_ms;
    }
    let runner = BatchRunner::from_config(ctx.driver(&args.steps)?, &pipeline);

    let progress = RunProgress::batch(peptides.len());
    let report = runner
        .run_with(&peptides, |index, run| {
            let next = peptides.get(index + 1).map(|peptide| peptide.slug.as_str());
            progress.run_finished(run, next);
        })
        .await;
    progress.clear();

    if flags.format == OutputFormat::Table {
        output(&report.entries, flags.format)?;
    } else {
        output(&report, flags.format)?;
    }

    if let Some(slug) = &report.halted_by {
        anyhow::bail!("batch stopped after '{slug}' failed");
    }
    if !report.all_succeeded() {
        anyhow::bail!(
            "{} of {} peptides failed",
            report.count(pep_core::RunStatus::Failed),
            report.entries.len()
        );
    }
    Ok(())
}
