use crate::types::Phase;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        repo_root().join(path)
    }
}

pub fn config_path() -> PathBuf {
    repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn env_flag_true(key: &str) -> bool {
    match env::var(key) {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            matches!(value.as_str(), "1" | "true" | "yes" | "on")
        }
        Err(_) => false,
    }
}

// ── Point schedule ─────────────────────────────────────────────────────

/// Points awarded per reached phase. Injected configuration: the league has
/// historically run with two slightly different tables, so both ship as
/// named presets and `config.json` decides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointSchedule {
    pub champion: u32,
    pub runner_up: u32,
    pub semifinal: u32,
    pub quarterfinal: u32,
    pub round_of_16: u32,
    pub group_stage: u32,
}

impl PointSchedule {
    pub fn classic() -> Self {
        PointSchedule {
            champion: 2000,
            runner_up: 1000,
            semifinal: 500,
            quarterfinal: 200,
            round_of_16: 100,
            group_stage: 0,
        }
    }

    pub fn boosted() -> Self {
        PointSchedule {
            champion: 2000,
            runner_up: 1200,
            semifinal: 720,
            quarterfinal: 360,
            round_of_16: 180,
            group_stage: 0,
        }
    }

    pub fn points(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Champion => self.champion,
            Phase::RunnerUp => self.runner_up,
            Phase::Semifinal => self.semifinal,
            Phase::Quarterfinal => self.quarterfinal,
            Phase::RoundOf16 => self.round_of_16,
            Phase::GroupStage => self.group_stage,
        }
    }
}

impl Default for PointSchedule {
    fn default() -> Self {
        PointSchedule::classic()
    }
}

// ── Category resolution ────────────────────────────────────────────────

/// Which category a tournament's points land in: the tournament's own fixed
/// category, or one bucket per team keyed by the sum of its partners'
/// categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryRule {
    #[default]
    Fixed,
    PartnerSum,
}

// ── App config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub test_mode: bool,
    pub fixture_path: String,
    pub point_schedule: PointSchedule,
    pub category_rule: CategoryRule,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8480".to_string(),
            test_mode: false,
            fixture_path: "fixtures/demo_league.json".to_string(),
            point_schedule: PointSchedule::classic(),
            category_rule: CategoryRule::Fixed,
        }
    }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
    if let Some(value) = env_default("PADEL_BIND_ADDR") {
        config.bind_addr = value;
    }
    if env_flag_true("PADEL_TEST_MODE") {
        config.test_mode = true;
    }
    if let Some(value) = env_default("PADEL_FIXTURE_PATH") {
        config.fixture_path = value;
    }
    config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
    let path = config_path();
    if !path.is_file() {
        return Ok(apply_env_defaults(AppConfig::default()));
    }
    let data =
        fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
    let config = serde_json::from_str::<AppConfig>(&data)
        .map_err(|e| format!("parse config {}: {e}", path.display()))?;
    Ok(apply_env_defaults(config))
}

pub fn load_env_file() {
    let env_path = repo_root().join(".env");
    if !env_path.is_file() {
        return;
    }
    let contents = match fs::read_to_string(&env_path) {
        Ok(data) => data,
        Err(_) => return,
    };
    for line in contents.lines() {
        if let Some((key, value)) = parse_env_line(line) {
            if env::var_os(&key).is_none() {
                env::set_var(key, value);
            }
        }
    }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, raw_value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = raw_value.trim();
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        value = &value[1..value.len() - 1];
    } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
        value = &value[1..value.len() - 1];
    } else if let Some(idx) = value.find('#') {
        value = value[..idx].trim_end();
    }
    Some((key.to_string(), value.to_string()))
}

/// Local wall-clock stamp written into finalized matches.
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
