use anyhow::Context;
use graha_rules::rules::{RawDefinition, DEFAULT_ORB_DEG};
use graha_rules::timeaware::DEFAULT_TRANSIT_ORB_DEG;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATHS: [&str; 2] = ["configs/graha.toml", "../../configs/graha.toml"];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub rules_dir: PathBuf,
    pub default_orb_deg: f64,
    pub transit_orb_deg: f64,
    pub top_n: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("rulesets"),
            default_orb_deg: DEFAULT_ORB_DEG,
            transit_orb_deg: DEFAULT_TRANSIT_ORB_DEG,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EngineToml {
    #[serde(default)]
    rules_dir: Option<PathBuf>,
    #[serde(default)]
    default_orb_deg: Option<f64>,
    #[serde(default)]
    transit_orb_deg: Option<f64>,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    engine: Option<EngineToml>,
}

/// Try the common relative locations for `configs/graha.toml`.
/// `None` when none of them exist.
pub fn read_graha_toml_text() -> Option<(PathBuf, String)> {
    CONFIG_PATHS.iter().find_map(|p| {
        fs::read_to_string(p)
            .ok()
            .map(|text| (PathBuf::from(p), text))
    })
}

pub fn parse_engine_settings(text: &str) -> anyhow::Result<EngineSettings> {
    let root: RootConfigToml =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse graha.toml: {e}"))?;
    let cfg = root.engine.unwrap_or_default();
    let defaults = EngineSettings::default();
    let settings = EngineSettings {
        rules_dir: cfg.rules_dir.unwrap_or(defaults.rules_dir),
        default_orb_deg: cfg.default_orb_deg.unwrap_or(defaults.default_orb_deg),
        transit_orb_deg: cfg.transit_orb_deg.unwrap_or(defaults.transit_orb_deg),
        top_n: cfg.top_n.unwrap_or(defaults.top_n),
    };
    if settings.default_orb_deg <= 0.0 || settings.transit_orb_deg <= 0.0 {
        anyhow::bail!(
            "engine orbs must be positive (default_orb_deg={}, transit_orb_deg={})",
            settings.default_orb_deg,
            settings.transit_orb_deg
        );
    }
    Ok(settings)
}

/// Settings from an explicit file, or from the usual locations. A missing
/// default file means defaults; a missing explicit file is an error.
pub fn load_engine_settings(explicit: Option<&Path>) -> anyhow::Result<EngineSettings> {
    if let Some(path) = explicit {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        return parse_engine_settings(&text);
    }
    match read_graha_toml_text() {
        Some((path, text)) => {
            info!("Using config {}", path.display());
            parse_engine_settings(&text)
        }
        None => {
            debug!("No graha.toml in {:?}, using defaults", CONFIG_PATHS);
            Ok(EngineSettings::default())
        }
    }
}

/// Read every `*.json` file in `dir`, sorted by file name. Files that fail to
/// parse are kept so the loader can report them.
pub fn read_rule_definitions(dir: &Path) -> anyhow::Result<Vec<RawDefinition>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Could not read rules directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut definitions = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Could not read rule file {}", path.display()))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        definitions.push(RawDefinition::from_json(source, &text));
    }
    Ok(definitions)
}
