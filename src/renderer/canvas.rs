//! Canvas2D backend
//!
//! The only place that touches `CanvasRenderingContext2d`. Loads the image
//! manifest, rasterizes placeholders for failed loads into offscreen
//! canvases, and executes display lists. Fallible canvas calls propagate
//! as `Result<(), JsValue>`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::rc::Rc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::assets::{AssetAvailability, AssetBook, AssetId, Placeholder, manifest, placeholder};
use super::scene::{DrawCmd, TextAlign, compose};
use crate::config::PlayfieldConfig;
use crate::sim::GameSession;

enum ImageSource {
    Image(HtmlImageElement),
    Canvas(HtmlCanvasElement),
}

#[derive(Default)]
struct AssetStore {
    book: AssetBook,
    sources: HashMap<AssetId, ImageSource>,
}

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    store: Rc<RefCell<AssetStore>>,
}

impl CanvasRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(canvas)?;
        // Pixel art
        ctx.set_image_smoothing_enabled(false);
        Ok(Self {
            ctx,
            store: Rc::new(RefCell::new(AssetStore::default())),
        })
    }

    /// Start loading every asset. Layers appear as their images arrive.
    pub fn load_assets(&self, config: &PlayfieldConfig) -> Result<(), JsValue> {
        let ids = manifest(config.crowd_image_count);
        self.store.borrow_mut().book = AssetBook::new(ids.iter().copied());

        for id in ids {
            let img = HtmlImageElement::new()?;

            let onload = {
                let store = self.store.clone();
                let img = img.clone();
                Closure::<dyn FnMut()>::new(move || {
                    let mut store = store.borrow_mut();
                    store.book.mark_loaded(id);
                    store.sources.insert(id, ImageSource::Image(img.clone()));
                })
            };

            let onerror = {
                let store = self.store.clone();
                let config = config.clone();
                Closure::<dyn FnMut()>::new(move || {
                    let mut store = store.borrow_mut();
                    store.book.mark_failed(id);
                    let mut rng = Pcg32::seed_from_u64(crate::now_ms() as u64);
                    if let Some(recipe) = placeholder(id, &config, &mut rng) {
                        match rasterize(&recipe) {
                            Ok(canvas) => {
                                store.sources.insert(id, ImageSource::Canvas(canvas));
                            }
                            Err(e) => log::warn!("Placeholder for {} failed: {e:?}", id.path()),
                        }
                    }
                })
            };

            img.set_onload(Some(onload.as_ref().unchecked_ref()));
            img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onload.forget();
            onerror.forget();
            img.set_src(&id.path());
        }

        Ok(())
    }

    /// Compose and draw one frame
    pub fn render(&self, session: &GameSession, now_ms: f64) -> Result<(), JsValue> {
        let store = self.store.borrow();
        let cmds = compose(session, self, now_ms);
        for cmd in &cmds {
            draw_cmd(&self.ctx, cmd, &store.sources)?;
        }
        Ok(())
    }
}

impl AssetAvailability for CanvasRenderer {
    fn is_drawable(&self, id: AssetId) -> bool {
        let store = self.store.borrow();
        store.book.is_drawable(id) && store.sources.contains_key(&id)
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))
}

/// Draw a placeholder recipe into a fresh offscreen canvas
fn rasterize(recipe: &Placeholder) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(recipe.size.x.ceil() as u32);
    canvas.set_height(recipe.size.y.ceil() as u32);

    let ctx = context_2d(&canvas)?;
    let none = HashMap::new();
    for cmd in &recipe.cmds {
        draw_cmd(&ctx, cmd, &none)?;
    }
    Ok(canvas)
}

fn draw_cmd(
    ctx: &CanvasRenderingContext2d,
    cmd: &DrawCmd,
    sources: &HashMap<AssetId, ImageSource>,
) -> Result<(), JsValue> {
    match cmd {
        DrawCmd::Clear { size } => {
            ctx.clear_rect(0.0, 0.0, size.x as f64, size.y as f64);
        }
        DrawCmd::Image { asset, rect, alpha } => {
            let Some(source) = sources.get(asset) else {
                return Ok(());
            };
            let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
            ctx.set_global_alpha(*alpha as f64);
            let drawn = match source {
                ImageSource::Image(img) => ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, w, h),
                ImageSource::Canvas(c) => ctx.draw_image_with_html_canvas_element_and_dw_and_dh(c, x, y, w, h),
            };
            ctx.set_global_alpha(1.0);
            drawn?;
        }
        DrawCmd::FillRect { rect, color } => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
        }
        DrawCmd::StrokeRect { rect, color, width } => {
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width as f64);
            ctx.stroke_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
        }
        DrawCmd::Lines { paths, color, width } => {
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width as f64);
            ctx.begin_path();
            for path in paths {
                let mut points = path.iter();
                if let Some(first) = points.next() {
                    ctx.move_to(first.x as f64, first.y as f64);
                }
                for p in points {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
            }
            ctx.stroke();
        }
        DrawCmd::Circle {
            center,
            radius,
            color,
            stroke,
        } => {
            ctx.begin_path();
            ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU)?;
            match stroke {
                Some(width) => {
                    ctx.set_stroke_style_str(color);
                    ctx.set_line_width(*width as f64);
                    ctx.stroke();
                }
                None => {
                    ctx.set_fill_style_str(color);
                    ctx.fill();
                }
            }
        }
        DrawCmd::Text {
            text,
            at,
            color,
            font,
            align,
        } => {
            ctx.save();
            ctx.set_font(font);
            ctx.set_fill_style_str(color);
            match align {
                TextAlign::Start => {
                    ctx.set_text_align("start");
                    ctx.set_text_baseline("alphabetic");
                }
                TextAlign::Center => {
                    ctx.set_text_align("center");
                    ctx.set_text_baseline("middle");
                }
            }
            let filled = ctx.fill_text(text, at.x as f64, at.y as f64);
            ctx.restore();
            filled?;
        }
    }
    Ok(())
}
