use pep_config::PepConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &PepConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &PepConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.llm.is_configured() && has_env_prefix(&env_keys, "PEPTIDE_LLM") {
        warnings.push(
            "LLM config appears default while PEPTIDE_LLM* env vars exist. Use double underscores (example: PEPTIDE_LLM__API_KEY)."
                .to_string(),
        );
    }

    if !config.r2.is_configured() && has_env_prefix(&env_keys, "PEPTIDE_R2") {
        warnings.push(
            "R2 config appears default while PEPTIDE_R2* env vars exist. Use double underscores (example: PEPTIDE_R2__ACCOUNT_ID)."
                .to_string(),
        );
    }

    if !config.store.is_remote() && has_env_prefix(&env_keys, "PEPTIDE_STORE_") {
        warnings.push(
            "Store config is local while PEPTIDE_STORE_* env vars exist. Use double underscores (example: PEPTIDE_STORE__URL)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter()
        .any(|key| key.starts_with(prefix) && !key.contains("__"))
}
