//! Azure Blob Storage backend implementation.

use object_store::ObjectStore;
use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AzureConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// Azure Blob Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    /// Storage account; taken from the environment when absent from the URL.
    pub account: Option<String>,
    pub container: String,
}

impl StorageProvider {
    pub(super) fn construct_azure(
        config: AzureConfig,
        options: &HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let mut builder = MicrosoftAzureBuilder::from_env().with_container_name(&config.container);

        if let Some(account) = &config.account {
            builder = builder.with_account(account);
        }

        for (key, value) in options {
            match key.parse::<AzureConfigKey>() {
                Ok(config_key) => builder = builder.with_config(config_key, value),
                Err(_) => warn!("Ignoring unknown Azure storage option: {}", key),
            }
        }

        let canonical_url = match &config.account {
            Some(account) => format!(
                "https://{}.blob.core.windows.net/{}",
                account, config.container
            ),
            None => format!("az://{}", config.container),
        };

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(AzureConfigSnafu)?);

        Ok(Self {
            config: BackendConfig::Azure(config),
            object_store,
            canonical_url,
        })
    }
}
