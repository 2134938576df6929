use crate::core::{
    errors::{AppError, AppResult},
    types::Provider,
};

const SERVICE: &str = "planscope";

fn username_for_provider(provider: &Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "openai",
    }
}

fn env_var_for_provider(provider: &Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "OPENAI_API_KEY",
    }
}

pub fn set_provider_key(provider: Provider, api_key: &str) -> AppResult<()> {
    if api_key.trim().is_empty() {
        return Err(AppError::InvalidInput("api key cannot be empty".to_string()));
    }
    let entry = keyring::Entry::new(SERVICE, username_for_provider(&provider))
        .map_err(|err| AppError::Internal(err.to_string()))?;
    entry
        .set_password(api_key.trim())
        .map_err(|err| AppError::Internal(err.to_string()))
}

pub fn get_provider_key(provider: Provider) -> AppResult<String> {
    let entry = keyring::Entry::new(SERVICE, username_for_provider(&provider))
        .map_err(|err| AppError::Internal(err.to_string()))?;
    entry
        .get_password()
        .map_err(|_err| AppError::ProviderAuth)
}

/// Environment first, then the OS key store.
pub fn resolve_provider_key(provider: Provider) -> AppResult<String> {
    match std::env::var(env_var_for_provider(&provider)) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => get_provider_key(provider),
    }
}
