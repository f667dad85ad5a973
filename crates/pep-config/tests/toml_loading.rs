//! Integration tests for TOML and environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pep_config::PepConfig;

fn jailed_figment() -> Figment {
    Figment::from(Serialized::defaults(PepConfig::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("PEPTIDE_").split("__"))
}

#[test]
fn loads_sources_and_llm_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[sources]
page_size = 50
max_results = 120
contact_email = "ops@example.org"

[llm]
api_key = "sk-toml"
model = "claude-test"
input_usd_per_mtok = 1.5
"#,
        )?;

        let config: PepConfig = jailed_figment().extract()?;
        assert_eq!(config.sources.page_size, 50);
        assert_eq!(config.sources.max_results, 120);
        assert_eq!(config.sources.contact_email, "ops@example.org");
        assert!(config.sources.europe_pmc_url.contains("europepmc"));
        assert_eq!(config.llm.api_key, "sk-toml");
        assert_eq!(config.llm.model, "claude-test");
        assert!((config.llm.input_usd_per_mtok - 1.5).abs() < f64::EPSILON);
        assert!((config.llm.output_usd_per_mtok - 15.0).abs() < f64::EPSILON);
        assert!(config.llm.is_configured());
        Ok(())
    });
}

#[test]
fn loads_r2_and_pipeline_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[r2]
account_id = "acct"
access_key_id = "key"
secret_access_key = "secret"
bucket_name = "pages"
public_base_url = "https://cdn.example.org"

[pipeline]
continue_on_error = false
require_citation_completeness = true
delay_between_ms = 0

[pipeline.caps]
animal_in_vivo = 10
animal_in_vitro = 5
"#,
        )?;

        let config: PepConfig = jailed_figment().extract()?;
        assert!(config.r2.is_configured());
        assert_eq!(config.r2.public_url_base(), "https://cdn.example.org");
        assert!(!config.pipeline.continue_on_error);
        assert!(config.pipeline.require_citation_completeness);
        assert!(config.pipeline.full_audit);
        assert_eq!(config.pipeline.delay_between_ms, 0);
        assert_eq!(config.pipeline.caps.animal_in_vivo, Some(10));
        assert_eq!(config.pipeline.caps.animal_in_vitro, Some(5));
        assert_eq!(config.pipeline.caps.human_controlled_trial, None);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[llm]
api_key = "sk-toml"

[store]
db_path = "from-toml.db"
"#,
        )?;
        jail.set_env("PEPTIDE_LLM__API_KEY", "sk-env");
        jail.set_env("PEPTIDE_PIPELINE__FULL_AUDIT", "false");

        let config: PepConfig = jailed_figment().extract()?;
        assert_eq!(config.llm.api_key, "sk-env");
        assert_eq!(config.store.db_path, "from-toml.db");
        assert!(!config.pipeline.full_audit);
        Ok(())
    });
}

#[test]
fn load_reads_project_config_and_validates() {
    Jail::expect_with(|jail| {
        jail.create_dir(".peptide")?;
        jail.create_file(
            ".peptide/config.toml",
            r#"
[sources]
page_size = 5000
"#,
        )?;

        let err = PepConfig::load().unwrap_err();
        assert!(err.to_string().contains("sources.page_size"), "{err}");

        jail.create_file(
            ".peptide/config.toml",
            r#"
[sources]
page_size = 25
"#,
        )?;
        let config = PepConfig::load().expect("valid config loads");
        assert_eq!(config.sources.page_size, 25);
        Ok(())
    });
}
