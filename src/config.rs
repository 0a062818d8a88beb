use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::display::{SchedulerConfig, MAX_SLOTS};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Host configuration, every field optional so files and CLI can layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// root of the emulated flash filesystem
    pub data_dir: Option<PathBuf>,
    /// act as if the provisioning button is held at boot
    pub provision_hold: Option<bool>,
    pub matrix: Option<MatrixConfig>,
    pub scheduler: Option<SchedulerSection>,
    pub web: Option<WebConfig>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct MatrixConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    /// draw the matrix to the terminal
    pub ansi: Option<bool>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct SchedulerSection {
    pub slots: Option<usize>,
    pub slot_duration_secs: Option<u64>,
    pub fade_steps: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct WebConfig {
    pub queue_capacity: Option<usize>,
    pub queue_timeout_ms: Option<u64>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "pixslot", about = "pixslot LED matrix appliance", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub matrix_width: Option<u32>,
    #[arg(long)]
    pub matrix_height: Option<u32>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long, action = ArgAction::Set)]
    pub ansi: Option<bool>,
    #[arg(long)]
    pub slots: Option<usize>,
    #[arg(long)]
    pub slot_duration_secs: Option<u64>,
    /// boot into the captive portal
    #[arg(long, action = ArgAction::SetTrue)]
    pub provision: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            home_dir()
                .map(|home| home.join(".local/share/pixslot"))
                .unwrap_or_else(|| PathBuf::from("pixslot-data"))
        })
    }

    pub fn provision_hold(&self) -> bool {
        self.provision_hold.unwrap_or(false)
    }

    pub fn matrix_size(&self) -> (u32, u32) {
        let m = self.matrix.as_ref();
        (
            m.and_then(|m| m.width).unwrap_or(32),
            m.and_then(|m| m.height).unwrap_or(8),
        )
    }

    pub fn fps(&self) -> u32 {
        self.matrix.as_ref().and_then(|m| m.fps).unwrap_or(25)
    }

    pub fn ansi(&self) -> bool {
        self.matrix.as_ref().and_then(|m| m.ansi).unwrap_or(true)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        let defaults = SchedulerConfig::default();
        let s = self.scheduler.as_ref();
        SchedulerConfig {
            slots: s.and_then(|s| s.slots).unwrap_or(defaults.slots),
            slot_duration: s
                .and_then(|s| s.slot_duration_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.slot_duration),
            fade_steps: s.and_then(|s| s.fade_steps).unwrap_or(defaults.fade_steps),
            fps: self.fps(),
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.web.as_ref().and_then(|w| w.queue_capacity).unwrap_or(crate::services::DEFAULT_QUEUE_CAPACITY)
    }

    pub fn queue_timeout(&self) -> Duration {
        self.web
            .as_ref()
            .and_then(|w| w.queue_timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(crate::queue::DEFAULT_TIMEOUT)
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, the YAML file and `cli`
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/pixslot/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/pixslot/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/pixslot.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["pixslot.yaml", "config/pixslot.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.data_dir.is_some()       { dst.data_dir = src.data_dir; }
    if src.provision_hold.is_some() { dst.provision_hold = src.provision_hold; }
    match (&mut dst.matrix, src.matrix) {
        (None, Some(c)) => dst.matrix = Some(c),
        (Some(d), Some(s)) => merge_matrix(d, s),
        _ => {}
    }
    match (&mut dst.scheduler, src.scheduler) {
        (None, Some(c)) => dst.scheduler = Some(c),
        (Some(d), Some(s)) => {
            if s.slots.is_some()              { d.slots = s.slots; }
            if s.slot_duration_secs.is_some() { d.slot_duration_secs = s.slot_duration_secs; }
            if s.fade_steps.is_some()         { d.fade_steps = s.fade_steps; }
        }
        _ => {}
    }
    match (&mut dst.web, src.web) {
        (None, Some(c)) => dst.web = Some(c),
        (Some(d), Some(s)) => {
            if s.queue_capacity.is_some()   { d.queue_capacity = s.queue_capacity; }
            if s.queue_timeout_ms.is_some() { d.queue_timeout_ms = s.queue_timeout_ms; }
        }
        _ => {}
    }
}

fn merge_matrix(dst: &mut MatrixConfig, src: MatrixConfig) {
    if src.width.is_some()  { dst.width = src.width; }
    if src.height.is_some() { dst.height = src.height; }
    if src.fps.is_some()    { dst.fps = src.fps; }
    if src.ansi.is_some()   { dst.ansi = src.ansi; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.data_dir.is_some()  { cfg.data_dir = cli.data_dir.clone(); }
    if cli.provision           { cfg.provision_hold = Some(true); }

    let any_matrix = cli.matrix_width.is_some()
        || cli.matrix_height.is_some()
        || cli.fps.is_some()
        || cli.ansi.is_some();
    if any_matrix {
        let matrix = cfg.matrix.get_or_insert_with(MatrixConfig::default);
        if cli.matrix_width.is_some()  { matrix.width = cli.matrix_width; }
        if cli.matrix_height.is_some() { matrix.height = cli.matrix_height; }
        if cli.fps.is_some()           { matrix.fps = cli.fps; }
        if cli.ansi.is_some()          { matrix.ansi = cli.ansi; }
    }

    if cli.slots.is_some() || cli.slot_duration_secs.is_some() {
        let scheduler = cfg.scheduler.get_or_insert_with(SchedulerSection::default);
        if cli.slots.is_some()              { scheduler.slots = cli.slots; }
        if cli.slot_duration_secs.is_some() { scheduler.slot_duration_secs = cli.slot_duration_secs; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let (w, h) = cfg.matrix_size();
    if w == 0 || h == 0 {
        return Err(ConfigError::Validation("matrix width/height must be > 0".into()));
    }
    if cfg.fps() == 0 {
        return Err(ConfigError::Validation("matrix fps must be > 0".into()));
    }
    let slots = cfg.scheduler().slots;
    if !(1..=MAX_SLOTS).contains(&slots) {
        return Err(ConfigError::Validation(format!("scheduler slots must be 1..={}", MAX_SLOTS)));
    }
    if cfg.queue_capacity() == 0 {
        return Err(ConfigError::Validation("web queue_capacity must be > 0".into()));
    }
    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
            _ => return Err(ConfigError::Validation(format!("unknown log_level {}", level))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_then_cli() {
        let Ok(dir) = tempfile::tempdir() else { return };
        let path = dir.path().join("pixslot.yaml");
        let yaml = "log_level: debug\nmatrix:\n  width: 16\n  height: 16\nscheduler:\n  slots: 4\n";
        assert!(fs::write(&path, yaml).is_ok());
        let cli = Cli { config: Some(path), matrix_width: Some(64), ..Cli::default() };
        let Ok(cfg) = load_with(&cli) else { panic!("config rejected") };
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.matrix_size(), (64, 16));
        assert_eq!(cfg.scheduler().slots, 4);
        assert_eq!(cfg.scheduler().fade_steps, 8);
    }

    #[test]
    fn test_slot_range_validated() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/pixslot.yaml")), ..Cli::default() };
        assert!(matches!(load_with(&cli), Err(ConfigError::Validation(_))));
        let mut cfg = Config::default();
        cfg.scheduler = Some(SchedulerSection { slots: Some(17), ..SchedulerSection::default() });
        assert!(validate(&cfg).is_err());
    }
}
