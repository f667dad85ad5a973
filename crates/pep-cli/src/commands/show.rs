use pep_core::PageRecord;
use serde::Serialize;

use crate::cli::root_commands::SlugArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct PageSummary<'a> {
    slug: &'a str,
    name: &'a str,
    version: u32,
    grade: String,
    studies: usize,
    sections: usize,
    last_updated: String,
    pdf_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    record: &'a PageRecord,
    pdf_url: Option<&'a str>,
}

/// Handle `pep show`.
pub async fn handle(args: &SlugArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(page) = ctx.db.load_page(&args.slug).await? else {
        anyhow::bail!("no published page for '{}'", args.slug);
    };
    let record = &page.record;
    let pdf_url = page.pdf_url.as_deref();

    if flags.format == OutputFormat::Table {
        output(
            &PageSummary {
                slug: &record.peptide.slug,
                name: &record.peptide.name,
                version: record.version,
                grade: record.grade.to_string(),
                studies: record.studies.len(),
                sections: record.sections.len(),
                last_updated: record.last_updated.to_rfc3339(),
                pdf_url,
            },
            flags.format,
        )
    } else {
        output(&PageView { record, pdf_url }, flags.format)
    }
}
