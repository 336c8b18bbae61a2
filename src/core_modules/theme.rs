// THEORY:
// A theme is a named palette for the track. The core never draws, but it owns
// the selected theme so renderers can read it from the scene snapshot and so the
// choice survives restarts through the key-value store.

use crate::error::Result;
use crate::interfaces::{KeyValueStore, THEME_KEY};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Midnight,
    Daylight,
    Neon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub track: Rgba<u8>,
    pub lane_marking: Rgba<u8>,
    pub player: Rgba<u8>,
    pub obstacle: Rgba<u8>,
    pub coin: Rgba<u8>,
    pub coin_rim: Rgba<u8>,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Midnight, Theme::Daylight, Theme::Neon];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Midnight => "midnight",
            Theme::Daylight => "daylight",
            Theme::Neon => "neon",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Midnight => Palette {
                track: Rgba([0x16, 0x1e, 0x35, 255]),
                lane_marking: Rgba([255, 255, 255, 38]),
                player: Rgba([0x7e, 0xf5, 0xa5, 255]),
                obstacle: Rgba([0xff, 0x6f, 0x91, 255]),
                coin: Rgba([0xff, 0xd8, 0x5d, 255]),
                coin_rim: Rgba([0xf5, 0xa8, 0x00, 255]),
            },
            Theme::Daylight => Palette {
                track: Rgba([0xe8, 0xee, 0xf6, 255]),
                lane_marking: Rgba([0x20, 0x2a, 0x44, 60]),
                player: Rgba([0x1f, 0x9d, 0x55, 255]),
                obstacle: Rgba([0xd6, 0x33, 0x5c, 255]),
                coin: Rgba([0xf2, 0xb7, 0x05, 255]),
                coin_rim: Rgba([0xb3, 0x7a, 0x00, 255]),
            },
            Theme::Neon => Palette {
                track: Rgba([0x0b, 0x02, 0x1a, 255]),
                lane_marking: Rgba([0x00, 0xf0, 0xff, 90]),
                player: Rgba([0x39, 0xff, 0x14, 255]),
                obstacle: Rgba([0xff, 0x10, 0xf0, 255]),
                coin: Rgba([0xff, 0xf0, 0x1f, 255]),
                coin_rim: Rgba([0xff, 0x9f, 0x00, 255]),
            },
        }
    }

    /// The stored theme, or the default when absent or unknown.
    pub fn load(store: &dyn KeyValueStore) -> Theme {
        store
            .get(THEME_KEY)
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }

    pub fn save(self, store: &mut dyn KeyValueStore) -> Result<()> {
        debug!(theme = self.as_str(), "theme saved");
        store.set(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}`")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownTheme(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::InMemoryStore;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Neon".parse::<Theme>(), Ok(Theme::Neon));
        assert_eq!(" daylight ".parse::<Theme>(), Ok(Theme::Daylight));
        assert_eq!("sepia".parse::<Theme>(), Err(UnknownTheme("sepia".into())));
    }

    #[test]
    fn persists_through_store() {
        let mut store = InMemoryStore::new();
        assert_eq!(Theme::load(&store), Theme::Midnight);
        Theme::Neon.save(&mut store).unwrap();
        assert_eq!(Theme::load(&store), Theme::Neon);
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Theme::load(&store), Theme::Midnight);
    }

    #[test]
    fn palettes_differ() {
        assert_ne!(Theme::Midnight.palette(), Theme::Daylight.palette());
        assert_eq!(Theme::Midnight.palette().obstacle, Rgba([255, 111, 145, 255]));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Daylight).unwrap(), "\"daylight\"");
    }
}
