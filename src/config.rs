//! Configuration Management
//!
//! Handles persistent configuration storage for extname. The stored region
//! and account id become the `setup.configuration` and
//! `setup.client_metadata` layers of a resolution context.

use crate::external_name::ParameterBag;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

const DEFAULT_REGION: &str = "us-east-1";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default provider region
    #[serde(default)]
    pub region: Option<String>,
    /// Account the resources live in
    #[serde(default)]
    pub account_id: Option<String>,
    /// Extra external name tables loaded on every run
    #[serde(default)]
    pub tables: Vec<PathBuf>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("extname").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective region (config > AWS_REGION > AWS_DEFAULT_REGION > us-east-1)
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| env_var("AWS_REGION"))
            .or_else(|| env_var("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective account id (config > AWS_ACCOUNT_ID)
    pub fn effective_account_id(&self) -> Option<String> {
        self.account_id.clone().or_else(|| env_var("AWS_ACCOUNT_ID"))
    }

    /// The `setup.configuration` layer
    pub fn setup_configuration(&self) -> ParameterBag {
        let mut bag = ParameterBag::new();
        bag.insert("region".to_string(), Value::String(self.effective_region()));
        bag
    }

    /// The `setup.client_metadata` layer
    pub fn client_metadata(&self) -> ParameterBag {
        let mut bag = ParameterBag::new();
        if let Some(account_id) = self.effective_account_id() {
            bag.insert("account_id".to_string(), Value::String(account_id));
        }
        bag
    }

    /// Set region and save
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }

    /// Set account id and save
    pub fn set_account_id(&mut self, account_id: &str) -> Result<()> {
        self.account_id = Some(account_id.to_string());
        self.save()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
