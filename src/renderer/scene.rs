//! Scene composition
//!
//! Turns a `GameSession` into a flat display list, back to front. Pure: the
//! only inputs are the session, which assets are drawable, and the clock,
//! so every frame can be asserted on in tests without a browser.

use glam::Vec2;

use super::assets::{AssetAvailability, AssetId};
use crate::config::PanelStyle;
use crate::consts::*;
use crate::sim::{GameSession, Rect, center_distance};

pub const GOLD: &str = "#FFD700";
pub const RED: &str = "#FF0000";
pub const SOFT_RED: &str = "#FF6B6B";
const ANNOUNCE_BACKDROP: &str = "rgba(0, 0, 0, 0.7)";
const INSET_BACKDROP: &str = "rgba(0, 0, 0, 0.8)";

const FRAME_LINE_WIDTH: f32 = 3.0;
const CORNER_LENGTH: f32 = 20.0;
const CROSSHAIR_HALF: f32 = 19.0;
const CROSSHAIR_RING: f32 = 4.0;
const REC_DOT_RADIUS: f32 = 5.0;

pub const ANNOUNCE_HEADLINE: &str = "TARGET FOUND";
pub const ANNOUNCE_SUBLINE: &str = "MATCH DETECTED";
pub const REC_LABEL: &str = "REC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Left aligned, alphabetic baseline
    Start,
    /// Centred both ways on the anchor
    Center,
}

/// One drawing operation in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear {
        size: Vec2,
    },
    Image {
        asset: AssetId,
        rect: Rect,
        alpha: f32,
    },
    FillRect {
        rect: Rect,
        color: &'static str,
    },
    StrokeRect {
        rect: Rect,
        color: &'static str,
        width: f32,
    },
    /// Open polylines stroked in one path
    Lines {
        paths: Vec<Vec<Vec2>>,
        color: &'static str,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: &'static str,
        /// `None` fills, `Some(w)` strokes with line width `w`
        stroke: Option<f32>,
    },
    Text {
        text: &'static str,
        at: Vec2,
        color: &'static str,
        font: String,
        align: TextAlign,
    },
}

/// Target sprite opacity for a given centre-to-centre distance.
/// Linear from 1 at distance 0 down to the floor at the falloff distance.
pub fn target_opacity(distance: f32) -> f32 {
    (1.0 - distance / OPACITY_FALLOFF_DISTANCE).clamp(MIN_TARGET_OPACITY, 1.0)
}

/// Time-based blink parity: on for the first `interval_ms` of every two
#[inline]
pub fn blink_on(now_ms: f64, interval_ms: f64) -> bool {
    ((now_ms / interval_ms).floor() as i64).rem_euclid(2) == 0
}

/// Build the full frame
pub fn compose(session: &GameSession, assets: &impl AssetAvailability, now_ms: f64) -> Vec<DrawCmd> {
    let config = session.config();
    let mut cmds = Vec::with_capacity(32);

    cmds.push(DrawCmd::Clear {
        size: Vec2::new(config.canvas_width, config.canvas_height),
    });

    if assets.is_drawable(AssetId::Background) {
        cmds.push(DrawCmd::Image {
            asset: AssetId::Background,
            rect: config.canvas(),
            alpha: 1.0,
        });
    }

    if assets.is_drawable(AssetId::Jumbotron) {
        cmds.push(DrawCmd::Image {
            asset: AssetId::Jumbotron,
            rect: config.jumbotron,
            alpha: 1.0,
        });
        push_display_content(&mut cmds, session, assets, config.jumbotron, config.jumbotron_style, now_ms);
    }

    let target = session.state.target_rect();
    let viewfinder = session.state.viewfinder_rect();
    if assets.is_drawable(AssetId::Target) {
        cmds.push(DrawCmd::Image {
            asset: AssetId::Target,
            rect: target,
            alpha: target_opacity(center_distance(&viewfinder, &target)),
        });
    }

    if assets.is_drawable(AssetId::Obstruction) {
        cmds.push(DrawCmd::Image {
            asset: AssetId::Obstruction,
            rect: config.obstruction,
            alpha: 1.0,
        });
        push_display_content(&mut cmds, session, assets, config.replica_panel(), config.replica_style, now_ms);
    }

    if assets.is_drawable(AssetId::ViewfinderOverlay) {
        cmds.push(DrawCmd::Image {
            asset: AssetId::ViewfinderOverlay,
            rect: viewfinder,
            alpha: 1.0,
        });
    } else {
        push_viewfinder_overlay(&mut cmds, session, assets, now_ms);
    }

    cmds
}

/// Secondary display content inside `panel`: the announcement, the current
/// crowd image, or the band image as a fallback
fn push_display_content(
    cmds: &mut Vec<DrawCmd>,
    session: &GameSession,
    assets: &impl AssetAvailability,
    panel: Rect,
    style: PanelStyle,
    now_ms: f64,
) {
    let inner = panel.inset(style.padding);

    if session.display.show_capture_message() {
        cmds.push(DrawCmd::FillRect {
            rect: inner,
            color: ANNOUNCE_BACKDROP,
        });

        let font = format!("bold {}px Arial", style.font_px);
        let center = panel.center();
        let half_line = Vec2::new(0.0, style.font_px / 2.0);
        cmds.push(DrawCmd::Text {
            text: ANNOUNCE_HEADLINE,
            at: center - half_line,
            color: if blink_on(now_ms, ANNOUNCE_BLINK_MS) { RED } else { SOFT_RED },
            font: font.clone(),
            align: TextAlign::Center,
        });
        cmds.push(DrawCmd::Text {
            text: ANNOUNCE_SUBLINE,
            at: center + half_line,
            color: GOLD,
            font,
            align: TextAlign::Center,
        });
        return;
    }

    let crowd = AssetId::Crowd(session.display.current_image);
    let image = [crowd, AssetId::BandOnScreen]
        .into_iter()
        .find(|id| assets.is_drawable(*id));
    if let Some(asset) = image {
        cmds.push(DrawCmd::Image {
            asset,
            rect: inner,
            alpha: 1.0,
        });
    }
}

/// Procedural viewfinder: frame and corner brackets always, tracking
/// affordances only while the target overlaps the frame
fn push_viewfinder_overlay(
    cmds: &mut Vec<DrawCmd>,
    session: &GameSession,
    assets: &impl AssetAvailability,
    now_ms: f64,
) {
    let vf = session.state.viewfinder_rect();
    let (l, t, r, b) = (vf.x, vf.y, vf.right(), vf.bottom());
    let c = CORNER_LENGTH;

    cmds.push(DrawCmd::StrokeRect {
        rect: vf,
        color: GOLD,
        width: FRAME_LINE_WIDTH,
    });
    cmds.push(DrawCmd::Lines {
        paths: vec![
            vec![Vec2::new(l, t + c), Vec2::new(l, t), Vec2::new(l + c, t)],
            vec![Vec2::new(r - c, t), Vec2::new(r, t), Vec2::new(r, t + c)],
            vec![Vec2::new(r, b - c), Vec2::new(r, b), Vec2::new(r - c, b)],
            vec![Vec2::new(l + c, b), Vec2::new(l, b), Vec2::new(l, b - c)],
        ],
        color: GOLD,
        width: FRAME_LINE_WIDTH,
    });

    if !session.state.target_in_frame {
        return;
    }

    let center = vf.center();
    let h = CROSSHAIR_HALF;
    cmds.push(DrawCmd::Lines {
        paths: vec![
            vec![center - Vec2::new(h, 0.0), center + Vec2::new(h, 0.0)],
            vec![center - Vec2::new(0.0, h), center + Vec2::new(0.0, h)],
        ],
        color: RED,
        width: 2.0,
    });
    cmds.push(DrawCmd::Circle {
        center,
        radius: CROSSHAIR_RING,
        color: RED,
        stroke: Some(2.0),
    });
    cmds.push(DrawCmd::Text {
        text: REC_LABEL,
        at: Vec2::new(l + 10.0, t + 25.0),
        color: RED,
        font: "bold 18px Courier New".to_string(),
        align: TextAlign::Start,
    });
    if blink_on(now_ms, REC_BLINK_MS) {
        cmds.push(DrawCmd::Circle {
            center: Vec2::new(l + 56.0, t + 19.0),
            radius: REC_DOT_RADIUS,
            color: RED,
            stroke: None,
        });
    }

    push_zoom_inset(cmds, session, assets);
}

/// Magnified target in the viewfinder's bottom-right corner
fn push_zoom_inset(cmds: &mut Vec<DrawCmd>, session: &GameSession, assets: &impl AssetAvailability) {
    let vf = session.state.viewfinder_rect();
    let inset = Rect::new(
        vf.right() - ZOOM_INSET_SIZE - ZOOM_INSET_MARGIN,
        vf.bottom() - ZOOM_INSET_SIZE - ZOOM_INSET_MARGIN,
        ZOOM_INSET_SIZE,
        ZOOM_INSET_SIZE,
    );

    cmds.push(DrawCmd::FillRect {
        rect: inset,
        color: INSET_BACKDROP,
    });
    cmds.push(DrawCmd::StrokeRect {
        rect: inset,
        color: GOLD,
        width: 2.0,
    });

    if assets.is_drawable(AssetId::Target) {
        let zoomed = session.state.target_size * ZOOM_INSET_SCALE;
        cmds.push(DrawCmd::Image {
            asset: AssetId::Target,
            rect: Rect::from_pos_size(inset.center() - zoomed / 2.0, zoomed),
            alpha: 1.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayfieldConfig;
    use crate::sim::NoopHook;
    use proptest::prelude::*;

    /// Availability stub: everything drawable except the listed assets
    struct Except(Vec<AssetId>);

    impl AssetAvailability for Except {
        fn is_drawable(&self, id: AssetId) -> bool {
            !self.0.contains(&id)
        }
    }

    fn session() -> GameSession {
        GameSession::new(PlayfieldConfig::default(), 5, Box::new(NoopHook)).unwrap()
    }

    fn framed_session() -> GameSession {
        let mut s = session();
        s.on_pointer_move(625.0, 437.0);
        s.state.target_pos = Vec2::new(600.0, 430.0);
        // Keep the display on image 0
        s.state.viewfinder.clear_moved();
        s.update_frame();
        s
    }

    fn images(cmds: &[DrawCmd]) -> Vec<AssetId> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Image { asset, .. } => Some(*asset),
                _ => None,
            })
            .collect()
    }

    fn texts(cmds: &[DrawCmd]) -> Vec<&'static str> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(*text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_opacity_values() {
        assert_eq!(target_opacity(0.0), 1.0);
        assert!((target_opacity(150.0) - 0.5).abs() < 1e-6);
        assert_eq!(target_opacity(300.0), 0.2);
        assert_eq!(target_opacity(10_000.0), 0.2);
    }

    #[test]
    fn test_blink_parity() {
        assert!(blink_on(0.0, 500.0));
        assert!(blink_on(499.0, 500.0));
        assert!(!blink_on(500.0, 500.0));
        assert!(blink_on(1000.0, 500.0));
        assert!(!blink_on(300.0, 300.0));
    }

    #[test]
    fn test_layer_order() {
        let s = framed_session();
        let cmds = compose(&s, &Except(vec![AssetId::ViewfinderOverlay]), 0.0);

        assert!(matches!(cmds[0], DrawCmd::Clear { .. }));
        assert_eq!(
            images(&cmds),
            vec![
                AssetId::Background,
                AssetId::Jumbotron,
                AssetId::Crowd(0),
                AssetId::Target,
                AssetId::Obstruction,
                AssetId::Crowd(0),
                // Zoom inset
                AssetId::Target,
            ]
        );
        assert_eq!(texts(&cmds), vec![REC_LABEL]);
    }

    #[test]
    fn test_overlay_image_replaces_procedural_overlay() {
        let s = framed_session();
        let cmds = compose(&s, &Except(vec![]), 0.0);
        assert_eq!(images(&cmds).last(), Some(&AssetId::ViewfinderOverlay));
        assert!(texts(&cmds).is_empty());
        assert!(!cmds.iter().any(|c| matches!(c, DrawCmd::StrokeRect { .. })));
    }

    #[test]
    fn test_affordances_only_when_target_in_frame() {
        let mut s = session();
        s.on_pointer_move(100.0, 100.0);
        s.state.target_pos = Vec2::new(1000.0, 700.0);
        s.update_frame();
        assert!(!s.state.target_in_frame);

        let cmds = compose(&s, &Except(vec![AssetId::ViewfinderOverlay]), 0.0);
        // Frame and brackets only
        assert!(cmds.iter().any(|c| matches!(c, DrawCmd::StrokeRect { color: GOLD, .. })));
        assert!(!cmds.iter().any(|c| matches!(c, DrawCmd::Circle { .. })));
        assert!(texts(&cmds).is_empty());
    }

    #[test]
    fn test_rec_dot_blinks() {
        let s = framed_session();
        let avail = Except(vec![AssetId::ViewfinderOverlay]);
        let dots = |now| {
            compose(&s, &avail, now)
                .iter()
                .filter(|c| matches!(c, DrawCmd::Circle { stroke: None, .. }))
                .count()
        };
        assert_eq!(dots(100.0), 1);
        assert_eq!(dots(600.0), 0);
    }

    #[test]
    fn test_announcement_on_both_panels() {
        let mut s = framed_session();
        s.trigger_capture(0.0);
        let cmds = compose(&s, &Except(vec![]), 0.0);

        assert_eq!(
            texts(&cmds),
            vec![ANNOUNCE_HEADLINE, ANNOUNCE_SUBLINE, ANNOUNCE_HEADLINE, ANNOUNCE_SUBLINE]
        );
        assert!(!images(&cmds).contains(&AssetId::Crowd(0)));

        let headline_color = |now| {
            compose(&s, &Except(vec![]), now).iter().find_map(|c| match c {
                DrawCmd::Text {
                    text: ANNOUNCE_HEADLINE,
                    color,
                    font,
                    ..
                } => Some((*color, font.clone())),
                _ => None,
            })
        };
        assert_eq!(headline_color(0.0), Some((RED, "bold 30px Arial".to_string())));
        assert_eq!(headline_color(300.0).map(|(c, _)| c), Some(SOFT_RED));
    }

    #[test]
    fn test_display_falls_back_to_band_image() {
        let s = session();
        let cmds = compose(&s, &Except(vec![AssetId::Crowd(0)]), 0.0);
        let shown = images(&cmds);
        assert!(shown.contains(&AssetId::BandOnScreen));
        assert!(!shown.contains(&AssetId::Crowd(0)));

        let cmds = compose(&s, &Except(vec![AssetId::Crowd(0), AssetId::BandOnScreen]), 0.0);
        let shown = images(&cmds);
        assert!(!shown.contains(&AssetId::BandOnScreen));
    }

    #[test]
    fn test_panels_need_their_frame_sprites() {
        let mut s = session();
        s.display.announce(0.0);
        let cmds = compose(&s, &Except(vec![AssetId::Jumbotron, AssetId::Obstruction]), 0.0);
        assert!(!texts(&cmds).contains(&ANNOUNCE_HEADLINE));
    }

    #[test]
    fn test_target_faint_when_far() {
        let mut s = session();
        s.on_pointer_move(125.0, 94.0);
        s.state.target_pos = Vec2::new(1000.0, 700.0);
        let cmds = compose(&s, &Except(vec![]), 0.0);
        let alpha = cmds.iter().find_map(|c| match c {
            DrawCmd::Image {
                asset: AssetId::Target,
                alpha,
                ..
            } => Some(*alpha),
            _ => None,
        });
        assert_eq!(alpha, Some(MIN_TARGET_OPACITY));
    }

    proptest! {
        #[test]
        fn opacity_is_bounded_and_monotone(d1 in 0.0f32..2000.0, d2 in 0.0f32..2000.0) {
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let (a, b) = (target_opacity(near), target_opacity(far));
            prop_assert!(a >= b);
            prop_assert!((MIN_TARGET_OPACITY..=1.0).contains(&a));
            prop_assert!((MIN_TARGET_OPACITY..=1.0).contains(&b));
        }
    }
}
