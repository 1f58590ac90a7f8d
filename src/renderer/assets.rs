//! Image assets: manifest, load status and generated placeholders
//!
//! Every asset starts `Pending`. A load either succeeds (`Ready`) or fails;
//! failed assets with a placeholder recipe become `Placeholder` and stay
//! drawable, the rest become `Missing` and their layers are skipped.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

use super::scene::DrawCmd;
use crate::config::PlayfieldConfig;
use crate::sim::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    Background,
    /// The couple
    Target,
    /// The cameraman
    Obstruction,
    ViewfinderOverlay,
    Jumbotron,
    BandOnScreen,
    /// Rotating close-up crowd image, zero-based
    Crowd(usize),
}

impl AssetId {
    /// Path relative to the page
    pub fn path(&self) -> String {
        match self {
            AssetId::Background => "assets/stadium_background.png".to_string(),
            AssetId::Target => "assets/couple1.webp.png".to_string(),
            AssetId::Obstruction => "assets/cameraman.png".to_string(),
            AssetId::ViewfinderOverlay => "assets/camera_overlay.png".to_string(),
            AssetId::Jumbotron => "assets/jumbotron.png".to_string(),
            AssetId::BandOnScreen => "assets/band_on_screen.png".to_string(),
            AssetId::Crowd(i) => format!("assets/close-up-crowd{}.webp", i + 1),
        }
    }
}

/// Every asset the game loads
pub fn manifest(crowd_image_count: usize) -> Vec<AssetId> {
    let mut ids = vec![
        AssetId::Background,
        AssetId::Target,
        AssetId::Obstruction,
        AssetId::ViewfinderOverlay,
        AssetId::Jumbotron,
        AssetId::BandOnScreen,
    ];
    ids.extend((0..crowd_image_count).map(AssetId::Crowd));
    ids
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Ready,
    /// Load failed, a generated stand-in is used
    Placeholder,
    /// Load failed, nothing to draw
    Missing,
}

/// Whether an asset can be drawn this frame
pub trait AssetAvailability {
    fn is_drawable(&self, id: AssetId) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct AssetBook {
    status: HashMap<AssetId, AssetStatus>,
}

impl AssetBook {
    pub fn new(ids: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            status: ids.into_iter().map(|id| (id, AssetStatus::Pending)).collect(),
        }
    }

    pub fn status(&self, id: AssetId) -> Option<AssetStatus> {
        self.status.get(&id).copied()
    }

    pub fn mark_loaded(&mut self, id: AssetId) {
        self.status.insert(id, AssetStatus::Ready);
    }

    /// Record a failed load. Returns the resulting status.
    pub fn mark_failed(&mut self, id: AssetId) -> AssetStatus {
        let status = if has_placeholder(id) {
            log::info!("Asset {} failed to load, using placeholder", id.path());
            AssetStatus::Placeholder
        } else {
            log::warn!("Asset {} failed to load", id.path());
            AssetStatus::Missing
        };
        self.status.insert(id, status);
        status
    }

    /// True once no asset is still pending
    pub fn all_settled(&self) -> bool {
        self.status.values().all(|s| *s != AssetStatus::Pending)
    }
}

impl AssetAvailability for AssetBook {
    fn is_drawable(&self, id: AssetId) -> bool {
        matches!(
            self.status(id),
            Some(AssetStatus::Ready | AssetStatus::Placeholder)
        )
    }
}

/// A generated image: draw `cmds` into an offscreen surface of `size`
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub size: Vec2,
    pub cmds: Vec<DrawCmd>,
}

pub fn has_placeholder(id: AssetId) -> bool {
    matches!(id, AssetId::Background | AssetId::Target)
}

/// Placeholder recipe for `id`, if it has one
pub fn placeholder<R: Rng + ?Sized>(id: AssetId, config: &PlayfieldConfig, rng: &mut R) -> Option<Placeholder> {
    match id {
        AssetId::Background => Some(crowd_pattern(Vec2::new(config.canvas_width, config.canvas_height), rng)),
        AssetId::Target => Some(couple_silhouette(config.target_size())),
        _ => None,
    }
}

const CROWD_COLORS: [&str; 4] = ["#2B1B4D", "#1F1340", "#362454", "#4A3266"];
const CROWD_CELL: f32 = 20.0;
const HEAD_CHANCE: f32 = 0.3;

/// Pixelated crowd: random purple cells, some with a dark "head"
fn crowd_pattern<R: Rng + ?Sized>(size: Vec2, rng: &mut R) -> Placeholder {
    let mut cmds = Vec::new();
    let mut y = 0.0;
    while y < size.y {
        let mut x = 0.0;
        while x < size.x {
            cmds.push(DrawCmd::FillRect {
                rect: Rect::new(x, y, CROWD_CELL, CROWD_CELL),
                color: CROWD_COLORS[rng.random_range(0..CROWD_COLORS.len())],
            });
            if rng.random::<f32>() < HEAD_CHANCE {
                cmds.push(DrawCmd::FillRect {
                    rect: Rect::new(x + 5.0, y + 5.0, 10.0, 10.0),
                    color: "#000",
                });
            }
            x += CROWD_CELL;
        }
        y += CROWD_CELL;
    }
    Placeholder { size, cmds }
}

/// Two pink figures with a red heart, laid out on a 60x80 grid and scaled
/// to the target size
fn couple_silhouette(size: Vec2) -> Placeholder {
    let scale = size / Vec2::new(60.0, 80.0);
    let block = |x: f32, y: f32, w: f32, h: f32, color| DrawCmd::FillRect {
        rect: Rect::new(x * scale.x, y * scale.y, w * scale.x, h * scale.y),
        color,
    };

    let cmds = vec![
        block(5.0, 20.0, 25.0, 60.0, "#FF69B4"),
        block(10.0, 5.0, 15.0, 15.0, "#FF69B4"),
        block(30.0, 20.0, 25.0, 60.0, "#FF69B4"),
        block(35.0, 5.0, 15.0, 15.0, "#FF69B4"),
        block(25.0, 30.0, 10.0, 10.0, "#FF0000"),
    ];
    Placeholder { size, cmds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_manifest_and_paths() {
        let ids = manifest(19);
        assert_eq!(ids.len(), 25);
        assert_eq!(AssetId::Crowd(0).path(), "assets/close-up-crowd1.webp");
        assert_eq!(AssetId::Crowd(18).path(), "assets/close-up-crowd19.webp");
        assert_eq!(AssetId::Obstruction.path(), "assets/cameraman.png");
    }

    #[test]
    fn test_status_transitions() {
        let mut book = AssetBook::new(manifest(2));
        assert!(!book.all_settled());
        assert!(!book.is_drawable(AssetId::Target));

        book.mark_loaded(AssetId::Jumbotron);
        assert!(book.is_drawable(AssetId::Jumbotron));

        assert_eq!(book.mark_failed(AssetId::Target), AssetStatus::Placeholder);
        assert!(book.is_drawable(AssetId::Target));

        assert_eq!(book.mark_failed(AssetId::ViewfinderOverlay), AssetStatus::Missing);
        assert!(!book.is_drawable(AssetId::ViewfinderOverlay));

        for id in manifest(2) {
            if book.status(id) == Some(AssetStatus::Pending) {
                book.mark_loaded(id);
            }
        }
        assert!(book.all_settled());
    }

    #[test]
    fn test_unknown_asset_not_drawable() {
        let book = AssetBook::new(manifest(3));
        assert_eq!(book.status(AssetId::Crowd(7)), None);
        assert!(!book.is_drawable(AssetId::Crowd(7)));
    }

    #[test]
    fn test_placeholders() {
        let config = PlayfieldConfig::default();
        let mut rng = Pcg32::seed_from_u64(1);

        let bg = placeholder(AssetId::Background, &config, &mut rng).unwrap();
        assert_eq!(bg.size, Vec2::new(1250.0, 875.0));
        // 63 x 44 cells, plus heads
        assert!(bg.cmds.len() >= 63 * 44);

        let target = placeholder(AssetId::Target, &config, &mut rng).unwrap();
        assert_eq!(target.cmds.len(), 5);
        for cmd in &target.cmds {
            let DrawCmd::FillRect { rect, .. } = cmd else {
                panic!("unexpected {cmd:?}");
            };
            assert!(Rect::new(0.0, 0.0, 25.0, 35.0).contains(rect));
        }

        assert!(placeholder(AssetId::Jumbotron, &config, &mut rng).is_none());
    }
}
