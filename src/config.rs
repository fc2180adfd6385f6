/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or the
/// data directories. Falls back to defaults if the file is missing or
/// incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::step::PATROL_MARGIN;

/// Smallest logical screen edge that still leaves room for a patrol.
pub const MIN_SCREEN_EXTENT: f32 = 2.0 * PATROL_MARGIN + 1.0;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub screen: ScreenConfig,
    pub gameplay: GameplayConfig,
    pub controls: ControlsConfig,
    pub gamepad: GamepadConfig,
    pub audio: AudioConfig,
    /// Level file overriding the built-in level.
    pub level_file: Option<PathBuf>,
    pub log_file: PathBuf,
}

/// Logical screen size in world units. Spawn anchors and patrol routes
/// are laid out relative to it.
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GameplayConfig {
    pub character_speed: f32,
    pub dash_speed: f32,
    pub dash_ms: f32,
    pub wanderer_speed: f32,
    pub spawn_delay_ms: f32,
    pub color_cooldown_frames: u32,
}

#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub scheme: String,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub red: Vec<String>,
    pub green: Vec<String>,
    pub blue: Vec<String>,
    pub yellow: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub enabled: bool,
    pub music: bool,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    gameplay: TomlGameplay,
    #[serde(default)]
    controls: TomlControls,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlScreen {
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGameplay {
    #[serde(default = "default_character_speed")]
    character_speed: f32,
    #[serde(default = "default_dash_speed")]
    dash_speed: f32,
    #[serde(default = "default_dash_ms")]
    dash_ms: f32,
    #[serde(default = "default_wanderer_speed")]
    wanderer_speed: f32,
    #[serde(default = "default_spawn_delay")]
    spawn_delay_ms: f32,
    #[serde(default = "default_color_cooldown")]
    color_cooldown_frames: u32,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_scheme")]
    scheme: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_red")]
    red: Vec<String>,
    #[serde(default = "default_green")]
    green: Vec<String>,
    #[serde(default = "default_blue")]
    blue: Vec<String>,
    #[serde(default = "default_yellow")]
    yellow: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    music: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_width() -> f32 { 1200.0 }
fn default_height() -> f32 { 800.0 }
fn default_frame_ms() -> u64 { 16 }

fn default_character_speed() -> f32 { 220.0 }
fn default_dash_speed() -> f32 { 900.0 }
fn default_dash_ms() -> f32 { 180.0 }
fn default_wanderer_speed() -> f32 { 150.0 }
fn default_spawn_delay() -> f32 { 2000.0 }
fn default_color_cooldown() -> u32 { 50 }  // frames, ~0.8s at 60fps

fn default_scheme() -> String { "wasd".into() }

fn default_red() -> Vec<String> { vec!["B".into()] }
fn default_green() -> Vec<String> { vec!["A".into()] }
fn default_blue() -> Vec<String> { vec!["X".into()] }
fn default_yellow() -> Vec<String> { vec!["Y".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

fn default_true() -> bool { true }
fn default_log_file() -> String { "chameleon.log".into() }

impl Default for TomlScreen {
    fn default() -> Self {
        TomlScreen {
            width: default_width(),
            height: default_height(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlGameplay {
    fn default() -> Self {
        TomlGameplay {
            character_speed: default_character_speed(),
            dash_speed: default_dash_speed(),
            dash_ms: default_dash_ms(),
            wanderer_speed: default_wanderer_speed(),
            spawn_delay_ms: default_spawn_delay(),
            color_cooldown_frames: default_color_cooldown(),
        }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls { scheme: default_scheme() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            red: default_red(),
            green: default_green(),
            blue: default_blue(),
            yellow: default_yellow(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { enabled: true, music: true }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { level_file: String::new(), log_file: default_log_file() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_schema(toml_cfg, &search_dirs)
    }

    /// Parse config text directly, resolving relative paths against the CWD.
    #[cfg(test)]
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_schema(cfg, &[PathBuf::from(".")]))
    }

    fn from_schema(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let level_file = if cfg.general.level_file.trim().is_empty() {
            None
        } else {
            Some(resolve_path(cfg.general.level_file.trim(), search_dirs))
        };

        GameConfig {
            screen: ScreenConfig {
                width: screen_extent("width", cfg.screen.width),
                height: screen_extent("height", cfg.screen.height),
                frame_ms: cfg.screen.frame_ms.max(1),
            },
            gameplay: GameplayConfig {
                character_speed: cfg.gameplay.character_speed,
                dash_speed: cfg.gameplay.dash_speed,
                dash_ms: cfg.gameplay.dash_ms,
                wanderer_speed: cfg.gameplay.wanderer_speed,
                spawn_delay_ms: cfg.gameplay.spawn_delay_ms,
                color_cooldown_frames: cfg.gameplay.color_cooldown_frames,
            },
            controls: ControlsConfig { scheme: cfg.controls.scheme },
            gamepad: GamepadConfig {
                red: cfg.gamepad.red,
                green: cfg.gamepad.green,
                blue: cfg.gamepad.blue,
                yellow: cfg.gamepad.yellow,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            audio: AudioConfig { enabled: cfg.audio.enabled, music: cfg.audio.music },
            level_file,
            log_file: PathBuf::from(cfg.general.log_file),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), &[])
    }
}

fn screen_extent(name: &str, value: f32) -> f32 {
    if value.is_finite() && value >= MIN_SCREEN_EXTENT {
        return value;
    }
    eprintln!("Warning: screen {name} {value} is too small, using {MIN_SCREEN_EXTENT}");
    MIN_SCREEN_EXTENT
}

/// Absolute paths are kept; relative ones are looked up in the search
/// dirs and otherwise left relative to the CWD.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/chameleon");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/chameleon");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml("").unwrap();
        assert_eq!(cfg.screen.width, 1200.0);
        assert_eq!(cfg.screen.frame_ms, 16);
        assert_eq!(cfg.gameplay.spawn_delay_ms, 2000.0);
        assert_eq!(cfg.gameplay.color_cooldown_frames, 50);
        assert_eq!(cfg.controls.scheme, "wasd");
        assert!(cfg.audio.enabled);
        assert!(cfg.level_file.is_none());
        assert_eq!(cfg.log_file, PathBuf::from("chameleon.log"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml(
            "[gameplay]\nwanderer_speed = 90.0\n[controls]\nscheme = \"arrows\"\n[audio]\nmusic = false\n",
        )
        .unwrap();
        assert_eq!(cfg.gameplay.wanderer_speed, 90.0);
        assert_eq!(cfg.gameplay.character_speed, 220.0);
        assert_eq!(cfg.controls.scheme, "arrows");
        assert!(cfg.audio.enabled);
        assert!(!cfg.audio.music);
        assert_eq!(cfg.gamepad.confirm, vec!["Start".to_string()]);
    }

    #[test]
    fn absolute_level_file_is_kept() {
        let cfg = GameConfig::from_toml("[general]\nlevel_file = \"/tmp/lvl.txt\"\n").unwrap();
        assert_eq!(cfg.level_file, Some(PathBuf::from("/tmp/lvl.txt")));
    }

    #[test]
    fn tiny_screen_is_raised_to_the_minimum() {
        let cfg = GameConfig::from_toml("[screen]\nwidth = 100.0\nheight = 280.0\n").unwrap();
        assert_eq!(cfg.screen.width, MIN_SCREEN_EXTENT);
        assert_eq!(cfg.screen.height, MIN_SCREEN_EXTENT);
        let cfg = GameConfig::from_toml("[screen]\nheight = 640.0\n").unwrap();
        assert_eq!(cfg.screen.height, 640.0);
    }

    #[test]
    fn bad_types_are_errors() {
        assert!(GameConfig::from_toml("[screen]\nwidth = \"wide\"\n").is_err());
    }
}
