use std::sync::Arc;

use anyhow::Context;
use pep_config::PepConfig;
use pep_core::CostRates;
use pep_db::PageDb;
use pep_llm::{AnthropicClient, TextGenerator};
use pep_pipeline::{DriverOptions, PipelineDriver, retry_config};
use pep_publish::{ObjectStoreArtifacts, PdfRenderer, Publisher};
use pep_sources::SourceClient;
use pep_synth::{ComplianceAuditor, ComplianceGate, LlmComplianceAuditor, Synthesizer};

use crate::cli::root_commands::StepArgs;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: PepConfig,
    pub db: Arc<PageDb>,
}

impl AppContext {
    /// Open the page store described by `config.store`.
    pub async fn init(config: PepConfig) -> anyhow::Result<Self> {
        let db = PageDb::open(&config.store)
            .await
            .context("failed to open page store")?;
        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    /// Publisher over this context's page store and the configured bucket.
    pub fn publisher(&self) -> anyhow::Result<Publisher> {
        let artifacts = ObjectStoreArtifacts::from_config(&self.config.r2)
            .context("failed to initialize artifact store")?;
        Ok(Publisher::new(
            Arc::clone(&self.db),
            Arc::new(artifacts),
            Arc::new(PdfRenderer),
        ))
    }

    /// A publishing driver, or a drafting one when `--draft` is set.
    pub fn driver(&self, steps: &StepArgs) -> anyhow::Result<PipelineDriver> {
        let driver = build_driver(&self.config, steps)?;
        if steps.draft {
            return Ok(driver);
        }
        Ok(driver.with_publisher(self.publisher()?))
    }
}

/// Assemble a drafting driver from configuration plus per-invocation flags.
pub fn build_driver(config: &PepConfig, steps: &StepArgs) -> anyhow::Result<PipelineDriver> {
    let llm = config.require_llm()?;
    let retry = retry_config(&config.pipeline);

    let source = SourceClient::new(config.sources.clone(), retry.clone())
        .context("failed to initialize literature sources")?;
    let generator: Arc<dyn TextGenerator> = Arc::new(
        AnthropicClient::new(llm, retry).context("failed to initialize text generation client")?,
    );

    let options = driver_options(config, steps);
    let auditor: Option<Arc<dyn ComplianceAuditor>> = if options.full_audit {
        Some(Arc::new(LlmComplianceAuditor::new(Arc::clone(&generator))))
    } else {
        None
    };

    let synthesizer = Synthesizer::new(generator).with_max_tokens(llm.max_tokens);
    let rates = CostRates {
        input_per_mtok: llm.input_usd_per_mtok,
        output_per_mtok: llm.output_usd_per_mtok,
    };

    Ok(
        PipelineDriver::new(Arc::new(source), synthesizer, ComplianceGate::new(auditor))
            .with_options(options)
            .with_rates(rates),
    )
}

fn driver_options(config: &PepConfig, steps: &StepArgs) -> DriverOptions {
    let mut options = DriverOptions::from_config(&config.pipeline);
    if steps.skip_full_audit {
        options.full_audit = false;
    }
    if steps.require_citations {
        options.require_citation_completeness = true;
    }
    if steps.no_plain_summaries {
        options.plain_summaries = false;
    }
    options
}
