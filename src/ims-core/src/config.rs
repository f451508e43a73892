// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The configuration enumeration from spec §6, loaded from a layered
//! `config::Config` source: an optional `config/*.toml` file, overridden by
//! `IMS_`-prefixed environment variables. Mirrors the layered-config
//! pattern used for service configuration elsewhere in the retrieval pack.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorageConfig {
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_object_storage_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub auth_token_source: String,
}

fn default_object_storage_timeout_seconds() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreadcrumbsConfig {
    #[serde(default = "default_max_trail_length")]
    pub max_trail_length: usize,
}

fn default_max_trail_length() -> usize {
    ims_store::DEFAULT_MAX_TRAIL_LENGTH
}

impl Default for BreadcrumbsConfig {
    fn default() -> BreadcrumbsConfig {
        BreadcrumbsConfig {
            max_trail_length: default_max_trail_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparesRecomputeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SparesRecomputeConfig {
    fn default() -> SparesRecomputeConfig {
        SparesRecomputeConfig { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub object_storage: ObjectStorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub breadcrumbs: BreadcrumbsConfig,
    #[serde(default)]
    pub spares: SparesSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparesSettings {
    #[serde(default)]
    pub recompute: SparesRecomputeConfig,
}

impl Default for AuthConfig {
    fn default() -> AuthConfig {
        AuthConfig { enabled: false }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl Settings {
    /// Loads configuration from `config/default.toml` (if present),
    /// overridden by `IMS_`-prefixed, double-underscore-nested environment
    /// variables (e.g. `IMS_DATABASE__URI`).
    pub fn load() -> Result<Settings, ConfigError> {
        let raw = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("IMS").separator("__"))
            .build()?;
        Ok(raw.try_deserialize()?)
    }
}
