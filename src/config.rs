//! Playfield geometry configuration
//!
//! Immutable for the lifetime of a game session. Defaults reproduce the
//! stadium layout; hosts may override them with JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::Rect;

/// A panel that shows the secondary-display content (jumbotron or replica)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelStyle {
    /// Inset between the panel frame and its content
    pub padding: f32,
    /// Announcement font size in pixels
    pub font_px: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,

    pub viewfinder_width: f32,
    pub viewfinder_height: f32,
    /// Keyboard nudge distance per tick
    pub viewfinder_speed: f32,

    pub target_width: f32,
    pub target_height: f32,

    /// The cameraman sprite; the target is never placed behind it
    pub obstruction: Rect,
    /// Extra clearance around the obstruction during placement
    pub obstruction_padding: f32,

    pub jumbotron: Rect,
    pub jumbotron_style: PanelStyle,

    /// Replica panel position, relative to the obstruction's top-left
    pub replica_offset: Vec2,
    pub replica_size: Vec2,
    pub replica_style: PanelStyle,

    /// Regions the target prefers to appear in (the crowd)
    pub preferred_regions: Vec<Rect>,
    /// Canvas inset used by the placement fallback
    pub fallback_margin: f32,

    /// Number of rotating crowd images on the secondary display
    pub crowd_image_count: usize,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        let canvas_width = 1250.0;
        Self {
            canvas_width,
            canvas_height: 875.0,

            viewfinder_width: 250.0,
            viewfinder_height: 188.0,
            viewfinder_speed: 6.0,

            // Small on purpose so the couple is hard to spot
            target_width: 25.0,
            target_height: 35.0,

            obstruction: Rect::new(450.0, 400.0, 375.0, 469.0),
            obstruction_padding: 50.0,

            jumbotron: Rect::new(438.0, 100.0, 375.0, 150.0),
            jumbotron_style: PanelStyle {
                padding: 20.0,
                font_px: 30.0,
            },

            replica_offset: Vec2::new(150.0, 30.0),
            replica_size: Vec2::new(180.0, 120.0),
            replica_style: PanelStyle {
                padding: 2.0,
                font_px: 12.0,
            },

            preferred_regions: vec![
                // Left stand
                Rect::new(50.0, 200.0, 300.0, 400.0),
                // Right stand
                Rect::new(canvas_width - 350.0, 200.0, 300.0, 400.0),
                // Centre, below the jumbotron
                Rect::new(350.0, 300.0, 550.0, 300.0),
            ],
            fallback_margin: 50.0,

            crowd_image_count: 19,
        }
    }
}

impl PlayfieldConfig {
    /// Parse a JSON config (missing fields take defaults) and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn canvas(&self) -> Rect {
        Rect::new(0.0, 0.0, self.canvas_width, self.canvas_height)
    }

    #[inline]
    pub fn viewfinder_size(&self) -> Vec2 {
        Vec2::new(self.viewfinder_width, self.viewfinder_height)
    }

    #[inline]
    pub fn target_size(&self) -> Vec2 {
        Vec2::new(self.target_width, self.target_height)
    }

    /// Area the target must stay out of: the obstruction plus its padding
    pub fn exclusion_zone(&self) -> Rect {
        self.obstruction.expand(self.obstruction_padding)
    }

    /// The miniature secondary display held by the cameraman
    pub fn replica_panel(&self) -> Rect {
        Rect::new(
            self.obstruction.x + self.replica_offset.x,
            self.obstruction.y + self.replica_offset.y,
            self.replica_size.x,
            self.replica_size.y,
        )
    }

    /// Check every geometric invariant. Call before starting a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("canvas", self.canvas_width, self.canvas_height),
            ("viewfinder", self.viewfinder_width, self.viewfinder_height),
            ("target", self.target_width, self.target_height),
            ("obstruction", self.obstruction.w, self.obstruction.h),
            ("jumbotron", self.jumbotron.w, self.jumbotron.h),
            ("replica panel", self.replica_size.x, self.replica_size.y),
        ];
        for (name, w, h) in sizes {
            if !(w > 0.0 && h > 0.0) {
                return Err(ConfigError::NonPositiveSize { name });
            }
        }

        if self.target_width > self.viewfinder_width || self.target_height > self.viewfinder_height {
            return Err(ConfigError::TargetTooLarge {
                target_w: self.target_width,
                target_h: self.target_height,
                view_w: self.viewfinder_width,
                view_h: self.viewfinder_height,
            });
        }
        if self.target_width >= self.viewfinder_width && self.target_height >= self.viewfinder_height {
            return Err(ConfigError::TargetNotSmaller);
        }
        if self.viewfinder_width > self.canvas_width || self.viewfinder_height > self.canvas_height {
            return Err(ConfigError::OutOfBounds { name: "viewfinder" });
        }

        let canvas = self.canvas();
        let panels = [
            ("obstruction", self.obstruction),
            ("jumbotron", self.jumbotron),
            ("replica panel", self.replica_panel()),
        ];
        for (name, rect) in panels {
            if !canvas.contains(&rect) {
                return Err(ConfigError::OutOfBounds { name });
            }
        }

        if !(self.viewfinder_speed > 0.0) {
            return Err(ConfigError::NonPositiveSpeed);
        }

        // The fallback samples inside the canvas shrunk by the margin
        let margin = self.fallback_margin;
        if !(margin >= 0.0)
            || margin * 2.0 + self.target_width > self.canvas_width
            || margin * 2.0 + self.target_height > self.canvas_height
        {
            return Err(ConfigError::FallbackMargin { margin });
        }

        if self.preferred_regions.is_empty() {
            return Err(ConfigError::NoPreferredRegions);
        }
        for (index, region) in self.preferred_regions.iter().enumerate() {
            if !canvas.contains(region) {
                return Err(ConfigError::OutOfBounds {
                    name: "preferred region",
                });
            }
            if region.w < self.target_width || region.h < self.target_height {
                return Err(ConfigError::RegionTooSmall { index });
            }
        }

        Ok(())
    }
}
