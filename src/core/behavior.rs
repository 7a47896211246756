//! Item catalog and per-item behaviour descriptors.
//!
//! Behaviours are resolved once, when the catalog is built, from a static
//! table keyed by file name.  Nothing downstream compares names again.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default click cooldown for ordinary items.
pub const DEFAULT_CLICK_COOLDOWN: Duration = Duration::from_millis(500);

/// What kind of stamp a placement mode puts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StampKind {
    MapleLeaf,
    Daisy,
}

impl StampKind {
    pub fn label(self) -> &'static str {
        match self {
            StampKind::MapleLeaf => "Maple leaf",
            StampKind::Daisy => "Daisy",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            StampKind::MapleLeaf => "maple leaves",
            StampKind::Daisy => "daisies",
        }
    }

    /// Stamp edge length in world units.
    pub fn size(self) -> f64 {
        match self {
            StampKind::MapleLeaf => 80.0,
            StampKind::Daisy => 30.0,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            StampKind::MapleLeaf => "🍁",
            StampKind::Daisy => "✿",
        }
    }
}

/// Capabilities an item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Sound cue on click.
    Sound,
    Spin,
    /// Leans toward the hovering pointer.
    Tilt,
    Flip,
    /// Stop-motion frames on hover.
    StopMotion,
    /// Texture offset that drifts with grid velocity.
    Holographic,
    Framed,
    /// Reacts to grid velocity with a coasting/forward/backward mood.
    MomentumMood,
    /// Clicking enters a timed placement mode.
    Stamp(StampKind),
    /// Clicking wiggles, then spawns a particle burst.
    Burst,
}

/// Resolved behaviour of one logical item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBehavior {
    pub capabilities: &'static [Capability],
    pub description: Option<&'static str>,
    pub click_cooldown: Duration,
    /// Delay between the click and its effect (wiggle time).
    pub click_delay: Duration,
}

impl Default for ItemBehavior {
    fn default() -> Self {
        Self {
            capabilities: &[],
            description: None,
            click_cooldown: DEFAULT_CLICK_COOLDOWN,
            click_delay: Duration::ZERO,
        }
    }
}

impl ItemBehavior {
    pub fn has(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn stamp(&self) -> Option<StampKind> {
        self.capabilities.iter().find_map(|c| match c {
            Capability::Stamp(kind) => Some(*kind),
            _ => None,
        })
    }
}

struct BehaviorEntry {
    file: &'static str,
    behavior: ItemBehavior,
}

const fn entry(
    file: &'static str,
    capabilities: &'static [Capability],
    description: &'static str,
) -> BehaviorEntry {
    BehaviorEntry {
        file,
        behavior: ItemBehavior {
            capabilities,
            description: Some(description),
            click_cooldown: DEFAULT_CLICK_COOLDOWN,
            click_delay: Duration::ZERO,
        },
    }
}

static BEHAVIORS: &[BehaviorEntry] = &[
    entry("01.png", &[Capability::Sound], "Cat with purr sound effect - click to hear"),
    entry("02.png", &[Capability::Spin], "Spinning pet"),
    entry("03.png", &[Capability::Tilt], "3D tilting card - hover to interact"),
    entry(
        "05.png",
        &[Capability::Stamp(StampKind::MapleLeaf)],
        "Canadian maple leaf - click to activate stamp mode",
    ),
    entry(
        "07.png",
        &[Capability::Stamp(StampKind::Daisy)],
        "Daisy flower - click to activate stamp mode",
    ),
    entry("13.png", &[Capability::MomentumMood], "Dynamic momentum animation"),
    entry("17.png", &[Capability::StopMotion], "Fortune cookie - hover to see animation"),
    entry("19.svg", &[Capability::Holographic], "Logo with holographic effect"),
    entry("21.png", &[Capability::Framed], "Framed pet"),
    BehaviorEntry {
        file: "23.png",
        behavior: ItemBehavior {
            capabilities: &[Capability::Burst],
            description: Some("Pumpkin - click to spawn flying pumpkins"),
            click_cooldown: Duration::from_millis(2000),
            click_delay: Duration::from_millis(600),
        },
    },
    entry("24.png", &[Capability::Flip], "Flipping image"),
];

/// Look up the behaviour for a file name.  Unknown names get the default.
pub fn resolve_behavior(file_name: &str) -> ItemBehavior {
    BEHAVIORS
        .iter()
        .find(|e| e.file == file_name)
        .map(|e| e.behavior.clone())
        .unwrap_or_default()
}

/// One logical item of the grid.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub index: usize,
    /// File name, used as the item id (`"05.png"`).
    pub id: String,
    pub path: PathBuf,
    pub behavior: ItemBehavior,
}

impl CatalogItem {
    /// Accessible description, falling back to a generic label.
    pub fn description(&self) -> String {
        match self.behavior.description {
            Some(d) => d.to_string(),
            None => format!("Interactive pet image {}", self.index + 1),
        }
    }

    /// Short label for the tile (file stem).
    pub fn label(&self) -> &str {
        self.id.rsplit_once('.').map_or(self.id.as_str(), |(stem, _)| stem)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<CatalogItem>,
}

impl ItemCatalog {
    /// The built-in 24-pet set, rooted at `dir`.
    pub fn builtin(dir: &Path) -> Self {
        let files = (1..=24).map(|n| {
            if n == 19 {
                format!("{n:02}.svg")
            } else {
                format!("{n:02}.png")
            }
        });
        Self::from_files(dir, files)
    }

    pub fn from_files(dir: &Path, files: impl IntoIterator<Item = String>) -> Self {
        let items = files
            .into_iter()
            .enumerate()
            .map(|(index, id)| CatalogItem {
                index,
                path: dir.join(&id),
                behavior: resolve_behavior(&id),
                id,
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.items.iter().map(|i| i.path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves_behaviours_once() {
        let catalog = ItemCatalog::builtin(Path::new("pets"));
        assert_eq!(catalog.len(), 24);

        let maple = catalog.get(4).unwrap();
        assert_eq!(maple.id, "05.png");
        assert_eq!(maple.behavior.stamp(), Some(StampKind::MapleLeaf));

        let pumpkin = catalog.get(22).unwrap();
        assert!(pumpkin.behavior.has(Capability::Burst));
        assert_eq!(pumpkin.behavior.click_cooldown, Duration::from_millis(2000));
        assert_eq!(pumpkin.behavior.click_delay, Duration::from_millis(600));

        assert_eq!(catalog.get(18).unwrap().id, "19.svg");
    }

    #[test]
    fn unknown_items_get_defaults() {
        let b = resolve_behavior("99.png");
        assert!(b.capabilities.is_empty());
        assert_eq!(b.click_cooldown, DEFAULT_CLICK_COOLDOWN);

        let catalog = ItemCatalog::from_files(Path::new("."), vec!["99.png".to_string()]);
        let item = catalog.get(0).unwrap();
        assert_eq!(item.description(), "Interactive pet image 1");
        assert_eq!(item.label(), "99");
    }
}
