//! User configuration: engine tuning, display settings and keybindings.
//!
//! Stored as TOML at `$XDG_CONFIG_HOME/pet-grid/config.toml` (default
//! `~/.config/pet-grid/config.toml`).  Every section is optional.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::engine::EngineTuning;
use crate::core::follower::FollowerTuning;
use crate::core::gesture::GestureTuning;
use crate::core::grid::LayoutTuning;
use crate::core::momentum::NavigationTuning;
use crate::core::wrap::WrapTuning;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialise config: {0}")]
    Serialise(#[from] toml::ser::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ───────────────────────────────────────── actions ───────────

/// All configurable keyboard actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    Recenter,
    FocusNext,
    Activate,
    CancelMode,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for serialisation).
    pub const ALL: &[Action] = &[
        Action::PanLeft,
        Action::PanRight,
        Action::PanUp,
        Action::PanDown,
        Action::Recenter,
        Action::FocusNext,
        Action::Activate,
        Action::CancelMode,
        Action::Quit,
    ];

    /// Key used in the `[bindings]` table.
    fn config_key(self) -> &'static str {
        match self {
            Action::PanLeft => "pan_left",
            Action::PanRight => "pan_right",
            Action::PanUp => "pan_up",
            Action::PanDown => "pan_down",
            Action::Recenter => "recenter",
            Action::FocusNext => "focus_next",
            Action::Activate => "activate",
            Action::CancelMode => "cancel_mode",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Short display string for the status bar (e.g. `"←"`, `"Ctrl+c"`).
    pub fn display(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Config-file form (e.g. `"Left"`, `"Ctrl+c"`).
    fn to_config_string(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Left => "Left".into(),
            KeyCode::Right => "Right".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Backspace".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Left"`, `"q"`, `"Space"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => KeyCode::F(k[1..].parse().ok()?),
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

fn modifier_prefix(modifiers: KeyModifiers) -> String {
    let mut s = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        s.push_str("Ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        s.push_str("Alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        s.push_str("Shift+");
    }
    s
}

// ───────────────────────────────────────── settings ──────────

/// How the grid is put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Frame rate of the physics/render loop.
    pub fps: u32,
    /// Disable follower springs and the entrance animation.
    pub reduced_motion: bool,
    /// World units per terminal column.
    pub cell_width: f64,
    /// World units per terminal row.
    pub cell_height: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            fps: 60,
            reduced_motion: false,
            cell_width: 8.0,
            cell_height: 16.0,
        }
    }
}

/// On-disk layout.  Missing sections and keys fall back to defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    display: DisplaySettings,
    navigation: NavigationTuning,
    layout: LayoutTuning,
    wrap: WrapTuning,
    follower: FollowerTuning,
    gesture: GestureTuning,
    bindings: BTreeMap<String, Vec<String>>,
}

// ───────────────────────────────────────── config ────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub tuning: EngineTuning,
    pub display: DisplaySettings,
    pub bindings: HashMap<Action, Vec<KeyBind>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tuning: EngineTuning::default(),
            display: DisplaySettings::default(),
            bindings: Self::default_bindings(),
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(PanLeft, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(PanRight, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(PanUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(PanDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(Recenter, vec![KeyBind::new(Char('r'), n)]);
        m.insert(FocusNext, vec![KeyBind::new(Tab, n)]);
        m.insert(Activate, vec![KeyBind::new(Enter, n), KeyBind::new(Char(' '), n)]);
        m.insert(CancelMode, vec![KeyBind::new(Esc, n)]);
        m.insert(
            Quit,
            vec![
                KeyBind::new(Char('q'), n),
                KeyBind::new(Char('c'), KeyModifiers::CONTROL),
            ],
        );

        m
    }

    /// Find the action that matches a key event.  When several bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Short display of the first binding only (for the status bar).
    pub fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "drag/scroll: move | {}: pets | {}: pet it | {}: home | {}: quit",
            self.short_binding(Action::FocusNext),
            self.short_binding(Action::Activate),
            self.short_binding(Action::Recenter),
            self.short_binding(Action::Quit),
        )
    }

    /// Reject tunings that would make the simulation unstable or let the
    /// duplicated tile block fall short of the view.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;
        let unit_open = |v: f64| v > 0.0 && v < 1.0;
        let unit_half_open = |v: f64| v > 0.0 && v <= 1.0;

        let (nav, fol) = (&t.navigation, &t.follower);
        let mut numbers = vec![
            ("navigation.ease", nav.ease),
            ("navigation.drag_ease", nav.drag_ease),
            ("navigation.momentum_multiplier", nav.momentum_multiplier),
            ("navigation.max_momentum", nav.max_momentum),
            ("navigation.wheel_smoothing", nav.wheel_smoothing),
            ("navigation.wheel_max_delta", nav.wheel_max_delta),
            ("navigation.key_pan", nav.key_pan),
            ("layout.gap_ratio", t.layout.gap_ratio),
            ("layout.cells_per_height", t.layout.cells_per_height),
            ("wrap.factor", t.wrap.factor),
            ("follower.spring", fol.spring),
            ("follower.damping", fol.damping),
            ("follower.offset_gain", fol.offset_gain),
            ("follower.rotation_spring", fol.rotation_spring),
            ("follower.rotation_damping", fol.rotation_damping),
            ("follower.swing", fol.swing),
            ("follower.factor_min", fol.factor_min),
            ("follower.factor_max", fol.factor_max),
            ("gesture.click_slop", t.gesture.click_slop),
            ("display.cell_width", self.display.cell_width),
            ("display.cell_height", self.display.cell_height),
        ];
        if let Some(gate) = &t.wrap.gate {
            numbers.push(("wrap.gate.max_pending", gate.max_pending));
            numbers.push(("wrap.gate.max_speed", gate.max_speed));
        }
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not a finite number")));
            }
        }

        if !unit_half_open(t.navigation.ease) {
            return Err(invalid("navigation.ease", "must be in (0, 1]"));
        }
        if !unit_half_open(t.navigation.drag_ease) {
            return Err(invalid("navigation.drag_ease", "must be in (0, 1]"));
        }
        if !(t.navigation.max_momentum >= 0.0 && t.navigation.wheel_max_delta >= 0.0) {
            return Err(invalid("navigation", "limits must be non-negative"));
        }
        for (field, value) in [
            ("follower.spring", t.follower.spring),
            ("follower.damping", t.follower.damping),
            ("follower.rotation_spring", t.follower.rotation_spring),
            ("follower.rotation_damping", t.follower.rotation_damping),
        ] {
            if !unit_open(value) {
                return Err(invalid(field, format!("{value} is not in (0, 1)")));
            }
        }
        if !(t.follower.factor_min > 0.0 && t.follower.factor_min <= t.follower.factor_max) {
            return Err(invalid("follower.factor_min", "must be positive and <= factor_max"));
        }
        if !(t.wrap.factor > 1.0) {
            return Err(invalid("wrap.factor", "must be greater than 1"));
        }
        if t.layout.cols == 0 {
            return Err(invalid("layout.cols", "must be at least 1"));
        }
        if !(t.layout.cells_per_height > 0.0 && t.layout.gap_ratio >= 0.0) {
            return Err(invalid("layout", "cell sizing must be positive"));
        }
        let half = t.layout.tiles.saturating_sub(1) / 2;
        if t.layout.tiles % 2 == 0 || (half as f64) < t.wrap.factor + 1.0 {
            return Err(invalid(
                "layout.tiles",
                format!(
                    "{} copies cannot cover a wrap factor of {}",
                    t.layout.tiles, t.wrap.factor
                ),
            ));
        }
        if !(t.gesture.click_slop >= 0.0) {
            return Err(invalid("gesture.click_slop", "must be non-negative"));
        }
        if !(1..=240).contains(&self.display.fps) {
            return Err(invalid("display.fps", "must be between 1 and 240"));
        }
        if !(self.display.cell_width > 0.0 && self.display.cell_height > 0.0) {
            return Err(invalid("display", "cell metric must be positive"));
        }
        Ok(())
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk.  A missing file gives defaults; a broken one
    /// is reported and replaced by defaults.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "ignoring config file");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(s)?;
        let mut bindings = Self::default_bindings();
        for (key, keys) in &file.bindings {
            let Some(action) = Action::from_config_key(key) else {
                tracing::warn!(key, "unknown action in [bindings]");
                continue;
            };
            let parsed: Vec<KeyBind> = keys.iter().filter_map(|k| KeyBind::parse(k.trim())).collect();
            if !parsed.is_empty() {
                bindings.insert(action, parsed);
            }
        }
        let config = Self {
            tuning: EngineTuning {
                navigation: file.navigation,
                layout: file.layout,
                wrap: file.wrap,
                follower: file.follower,
                gesture: file.gesture,
            },
            display: file.display,
            bindings,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let bindings = Action::ALL
            .iter()
            .filter_map(|action| {
                let binds = self.bindings.get(action)?;
                let keys = binds.iter().map(KeyBind::to_config_string).collect();
                Some((action.config_key().to_string(), keys))
            })
            .collect();
        let file = ConfigFile {
            display: self.display,
            navigation: self.tuning.navigation,
            layout: self.tuning.layout,
            wrap: self.tuning.wrap,
            follower: self.tuning.follower,
            gesture: self.tuning.gesture,
            bindings,
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/pet-grid/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("pet-grid").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [navigation]
            ease = 0.1

            [wrap.gate]
            max_pending = 25.0

            [bindings]
            quit = ["x", "Ctrl+q"]
            "#,
        )
        .unwrap();
        assert_eq!(config.tuning.navigation.ease, 0.1);
        assert_eq!(config.tuning.navigation.max_momentum, 400.0);
        let gate = config.tuning.wrap.gate.unwrap();
        assert_eq!(gate.max_pending, 25.0);
        assert_eq!(gate.min_interval_ms, 300);

        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(config.match_key(ctrl_q), Some(Action::Quit));
        let plain_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(config.match_key(plain_q), None);
    }

    #[test]
    fn unstable_springs_are_rejected() {
        let err = AppConfig::from_toml_str("[follower]\ndamping = 1.2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "follower.damping", .. }));

        let err = AppConfig::from_toml_str("[follower]\nspring = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "follower.spring", .. }));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let err = AppConfig::from_toml_str("[follower]\nfactor_max = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "follower.factor_max", .. }));

        let err = AppConfig::from_toml_str("[navigation]\nkey_pan = nan\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "navigation.key_pan", .. }));

        let err = AppConfig::from_toml_str("[display]\ncell_height = -inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "display.cell_height", .. }));

        let err = AppConfig::from_toml_str("[wrap.gate]\nmax_speed = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "wrap.gate.max_speed", .. }));
    }

    #[test]
    fn tile_block_must_cover_wrap_range() {
        let err = AppConfig::from_toml_str("[layout]\ntiles = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "layout.tiles", .. }));
        assert!(AppConfig::from_toml_str("[layout]\ntiles = 9\n").is_ok());
    }

    #[test]
    fn written_config_reads_back() {
        let mut config = AppConfig::default();
        config.display.reduced_motion = true;
        config.tuning.layout.cols = 4;
        let text = config.to_toml().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, text).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn key_strings_parse() {
        assert_eq!(KeyBind::parse("Space"), Some(KeyBind::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert_eq!(
            KeyBind::parse("Ctrl+c"),
            Some(KeyBind::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        );
        assert_eq!(KeyBind::parse("F5"), Some(KeyBind::new(KeyCode::F(5), KeyModifiers::NONE)));
        assert_eq!(KeyBind::parse("Hyper+x"), None);
        assert_eq!(KeyBind::new(KeyCode::Left, KeyModifiers::NONE).display(), "←");
    }
}
