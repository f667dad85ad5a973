use crate::cli::root_commands::SlugArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::RunProgress;

/// Handle `pep republish`.
pub async fn handle(args: &SlugArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(page) = ctx.db.load_page(&args.slug).await? else {
        anyhow::bail!("no published page for '{}'", args.slug);
    };
    let publisher = ctx.publisher()?;

    let progress = RunProgress::single(&format!("Republishing {}", args.slug));
    let outcome = match publisher.republish(page.record).await {
        Ok(outcome) => outcome,
        Err(error) => {
            progress.finish_failed(&args.slug, error.step());
            return Err(error.into());
        }
    };
    progress.finish_published(&args.slug, outcome.record.version);

    if flags.format == OutputFormat::Table {
        output(
            &serde_json::json!({
                "slug": outcome.record.peptide.slug,
                "version": outcome.record.version,
                "pdf_url": outcome.pdf_url,
                "sections": outcome.sections_inserted,
            }),
            flags.format,
        )
    } else {
        output(&outcome, flags.format)
    }
}
