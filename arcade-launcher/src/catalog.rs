//! Game catalog built by scanning the base directory.
//!
//! Display metadata is scraped from each payload's source text. The catalog
//! is rebuilt on every lookup and only read by the launch pipeline.

use std::path::Path;
use std::sync::LazyLock;

use arcade_core::GameDescriptor;
use indexmap::IndexMap;
use regex::Regex;

use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::vetting::{decode_head, read_head, SCAN_WINDOW_BYTES};

static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(title_patterns);

#[expect(clippy::expect_used, reason = "title patterns are valid regexes")]
fn title_patterns() -> Vec<Regex> {
    [
        r#"root\.title\(\s*["']([^"']+)["']\s*\)"#,
        r#"super\(\)\.__init__\([^)]*title\s*=\s*["']([^"']+)["']"#,
        r#"title\s*=\s*["']([^"']+)["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("title pattern compiles"))
    .collect()
}

/// Keyword → description, checked against the lowercased title and filename.
const DESCRIPTIONS: &[(&str, &str)] = &[
    ("typing", "Test your typing speed against the clock."),
    ("shuriken", "Practice your aim with shuriken target practice."),
    ("memory", "Challenge your memory with pattern recall."),
    ("clash", "Battle opponents in fast-paced combat."),
    ("cat", "Help catch runaway cats in this fun mission."),
    ("tree", "Master the art of tree climbing."),
    ("ramen", "Serve ramen to hungry customers."),
    ("roof", "Run endlessly across the rooftops."),
    ("hand", "Learn and memorize hand signs."),
    ("shadow", "Test your reflexes with clone training."),
    ("difference", "Spot the differences before time runs out."),
    ("whack", "Test your speed at whack-a-mole."),
];

/// The set of launchable games, keyed and sorted by filename.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    games: IndexMap<String, GameDescriptor>,
}

impl GameCatalog {
    /// Scan `config.base_dir` for payloads.
    ///
    /// Only regular files directly under the base directory that carry the
    /// allowed extension and are not excluded are listed. Titles are scraped
    /// from the first [`SCAN_WINDOW_BYTES`] only; a file whose head cannot be
    /// read or decoded falls back to a title derived from its name. Size,
    /// readability and encoding are left to validation and vetting.
    ///
    /// # Errors
    /// Returns [`LauncherError::Catalog`] if the directory cannot be listed.
    pub fn scan(config: &LauncherConfig) -> Result<Self, LauncherError> {
        let base = std::path::absolute(&config.base_dir).unwrap_or_else(|_| config.base_dir.clone());
        let entries = std::fs::read_dir(&base).map_err(|source| LauncherError::Catalog {
            path: base.clone(),
            source,
        })?;

        let mut games = IndexMap::new();
        for entry in entries.flatten() {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !filename.ends_with(&config.allowed_extension)
                || config.excluded_files.iter().any(|ex| ex == &filename)
            {
                continue;
            }
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let game = describe(&entry.path(), &filename, config);
            games.insert(filename, game);
        }
        games.sort_keys();

        tracing::debug!(dir = %base.display(), count = games.len(), "scanned game catalog");
        Ok(Self { games })
    }

    /// Look up a game by filename.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&GameDescriptor> {
        self.games.get(filename)
    }

    /// Every catalog filename, in order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    /// Every descriptor, in filename order.
    pub fn games(&self) -> impl Iterator<Item = &GameDescriptor> {
        self.games.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

fn describe(path: &Path, filename: &str, config: &LauncherConfig) -> GameDescriptor {
    let stem = filename.strip_suffix(&config.allowed_extension).unwrap_or(filename);
    let scraped = match read_head(path) {
        Ok(head) => decode_head(&head).and_then(scrape_title),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "cannot read game head for title");
            None
        }
    };
    let display_name = scraped.unwrap_or_else(|| title_from_stem(stem));
    let description = describe_title(&display_name, filename);
    GameDescriptor::new(filename.to_owned(), display_name, description, path.to_owned())
}

/// First title found by the known window/constructor patterns.
fn scrape_title(source: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|re| {
        re.captures(source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|t| !t.is_empty())
    })
}

/// `shadow_clone_whack` → `Shadow Clone Whack`.
fn title_from_stem(stem: &str) -> String {
    stem.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn describe_title(title: &str, filename: &str) -> String {
    let title_lower = title.to_lowercase();
    let filename_lower = filename.to_lowercase();
    DESCRIPTIONS
        .iter()
        .find(|(keyword, _)| title_lower.contains(keyword) || filename_lower.contains(keyword))
        .map_or_else(|| format!("Experience {title}."), |(_, desc)| (*desc).to_owned())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn game_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = match TempDir::new() {
            Ok(d) => d,
            Err(e) => panic!("failed to create temp dir: {e}"),
        };
        for (name, content) in files {
            if let Err(e) = fs::write(dir.path().join(name), content) {
                panic!("write {name} failed: {e}");
            }
        }
        dir
    }

    #[test]
    fn scan_lists_games_sorted_and_skips_excluded() {
        let dir = game_dir(&[
            ("zeta_run.py", "print(1)"),
            ("alpha_quest.py", "print(2)"),
            ("__init__.py", ""),
            ("README.md", "docs"),
        ]);
        let catalog = match GameCatalog::scan(&LauncherConfig::new(dir.path())) {
            Ok(c) => c,
            Err(e) => panic!("scan failed: {e}"),
        };
        let names: Vec<&str> = catalog.filenames().collect();
        assert_eq!(names, vec!["alpha_quest.py", "zeta_run.py"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn scan_skips_subdirectories() {
        let dir = game_dir(&[("solo.py", "")]);
        if let Err(e) = fs::create_dir(dir.path().join("nested.py")) {
            panic!("mkdir failed: {e}");
        }
        let catalog = match GameCatalog::scan(&LauncherConfig::new(dir.path())) {
            Ok(c) => c,
            Err(e) => panic!("scan failed: {e}"),
        };
        assert!(catalog.get("nested.py").is_none());
        assert!(catalog.get("solo.py").is_some());
    }

    #[test]
    fn scan_of_missing_directory_errors() {
        let config = LauncherConfig::new("/nonexistent/arcade-games");
        assert!(matches!(GameCatalog::scan(&config), Err(LauncherError::Catalog { .. })));
    }

    #[test]
    fn title_is_scraped_from_window_title() {
        let src = "root = tk.Tk()\nroot.title(\"Ramen Rush\")\n";
        assert_eq!(scrape_title(src).as_deref(), Some("Ramen Rush"));
    }

    #[test]
    fn title_is_scraped_from_constructor_keyword() {
        let src = "class G(Base):\n    def __init__(self):\n        super().__init__(width=3, title='Tree Climb')\n";
        assert_eq!(scrape_title(src).as_deref(), Some("Tree Climb"));
    }

    #[test]
    fn title_falls_back_to_filename() {
        let dir = game_dir(&[("shadow_clone_whack.py", "print('hi')\n")]);
        let catalog = match GameCatalog::scan(&LauncherConfig::new(dir.path())) {
            Ok(c) => c,
            Err(e) => panic!("scan failed: {e}"),
        };
        let Some(game) = catalog.get("shadow_clone_whack.py") else {
            panic!("game missing from catalog");
        };
        assert_eq!(game.display_name, "Shadow Clone Whack");
        assert_eq!(game.description, "Test your reflexes with clone training.");
        assert!(game.resolved_path.is_absolute());
    }

    #[test]
    fn oversized_and_binary_files_are_still_listed() {
        let dir = game_dir(&[("big_game.py", "print('x')\n")]);
        if let Err(e) = fs::write(dir.path().join("latin1.py"), [b'#', 0xe9, b'\n']) {
            panic!("write failed: {e}");
        }
        let config = LauncherConfig { max_file_size_bytes: 4, ..LauncherConfig::new(dir.path()) };
        let catalog = match GameCatalog::scan(&config) {
            Ok(c) => c,
            Err(e) => panic!("scan failed: {e}"),
        };
        assert!(catalog.get("big_game.py").is_some());
        let Some(latin) = catalog.get("latin1.py") else {
            panic!("non-UTF-8 file missing from catalog");
        };
        assert_eq!(latin.display_name, "Latin1");
    }

    #[test]
    fn title_beyond_head_window_is_ignored() {
        let mut source = "#".repeat(SCAN_WINDOW_BYTES);
        source.push_str("\nroot.title(\"Hidden\")\n");
        let dir = game_dir(&[("deep_title.py", &source)]);
        let catalog = match GameCatalog::scan(&LauncherConfig::new(dir.path())) {
            Ok(c) => c,
            Err(e) => panic!("scan failed: {e}"),
        };
        let Some(game) = catalog.get("deep_title.py") else {
            panic!("game missing from catalog");
        };
        assert_eq!(game.display_name, "Deep Title");
    }

    #[test]
    fn description_defaults_to_title() {
        assert_eq!(describe_title("Orbit", "orbit.py"), "Experience Orbit.");
    }
}
