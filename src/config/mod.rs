//! Configuration module for passgrammar
//!
//! This module handles:
//! - Project-level configuration (passgrammar.toml)
//! - Training and strength estimation defaults
//! - Resource file locations

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, ProjectConfig, ResourceConfig, StrengthConfig,
    TrainConfig, JSON_CONFIG, TOML_CONFIG,
};
