// THEORY:
// The runner core never touches a camera, a screen, a disk or a dialog directly.
// Each of those is a collaborator behind one of the traits below, so the same
// core runs against a webcam and a window in production and against synthetic
// frames and recording renderers in tests.
//
// Persistence is a flat string key-value store. Missing keys and unparsable
// values are never errors; they fall back to defaults.

use crate::core_modules::education::Concept;
use crate::core_modules::session::SceneSnapshot;
use crate::error::Result;
use image::RgbaImage;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

pub const HIGH_SCORE_KEY: &str = "motionRunnerHighScore";
pub const THEME_KEY: &str = "motionRunnerTheme";

/// A camera, or anything else that yields RGBA frames at the analysis size.
pub trait VideoSource {
    /// Acquires the device. Failure is terminal for motion control.
    fn open(&mut self) -> Result<()>;
    /// The newest frame, or `None` when nothing new is ready yet.
    fn current_frame(&mut self) -> Option<RgbaImage>;
}

pub trait Renderer {
    fn draw_scene(&mut self, scene: &SceneSnapshot);
    fn draw_motion_view(&mut self, view: &RgbaImage);
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Shows the quiz overlay. The host answers later with `Command::QuizFinished`.
pub trait QuizPresenter {
    fn present(&mut self, concept: &'static Concept);
}

pub fn load_high_score(store: &dyn KeyValueStore) -> u32 {
    store
        .get(HIGH_SCORE_KEY)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

pub fn save_high_score(store: &mut dyn KeyValueStore, score: u32) -> Result<()> {
    store.set(HIGH_SCORE_KEY, &score.to_string())
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    values: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "ignoring unreadable store");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_score_defaults_to_zero() {
        let mut store = InMemoryStore::new();
        assert_eq!(load_high_score(&store), 0);
        store.set(HIGH_SCORE_KEY, "not a number").unwrap();
        assert_eq!(load_high_score(&store), 0);
        save_high_score(&mut store, 17).unwrap();
        assert_eq!(load_high_score(&store), 17);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!("motion_runner_store_{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        let mut store = FileStore::open(&path);
        assert_eq!(store.get(THEME_KEY), None);
        store.set(THEME_KEY, "neon").unwrap();
        save_high_score(&mut store, 9).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("neon"));
        assert_eq!(load_high_score(&reopened), 9);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = std::env::temp_dir().join(format!("motion_runner_corrupt_{}.json", std::process::id()));
        fs::write(&path, "{ broken").unwrap();
        let store = FileStore::open(&path);
        assert_eq!(store.get(HIGH_SCORE_KEY), None);
        fs::remove_file(&path).unwrap();
    }
}
