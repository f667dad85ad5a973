use crate::cli::GlobalFlags;
use crate::cli::root_commands::SlugArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pep history`.
pub async fn handle(args: &SlugArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let entries = ctx.db.changelog(&args.slug).await?;
    if entries.is_empty() && ctx.db.get_peptide(&args.slug).await?.is_none() {
        anyhow::bail!("unknown peptide '{}'", args.slug);
    }
    output(&entries, flags.format)
}
