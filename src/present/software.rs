use std::collections::HashMap;

use crate::{
    assets::{decode::PreparedImage, store::LoadedAssets},
    foundation::core::{NodeId, Point, Rect, Viewport},
    foundation::error::ViewerResult,
    graph::node_graph::NodeGraph,
    layout::hotspots::Marker,
    present::{
        blend::{PremulRgba8, over, premultiply, unpremultiply},
        surface::PresentationSurface,
    },
};

const MARKER_FILL: [u8; 4] = [255, 255, 255, 90];
const MARKER_RING: [u8; 4] = [255, 255, 255, 230];
const MARKER_RING_PX: f64 = 1.5;

#[derive(Clone, Debug, PartialEq)]
/// Last state set on one node's image layer.
pub struct LayerState {
    /// Owning node.
    pub node: NodeId,
    /// Box the image is drawn into, viewport pixels.
    pub bounds: Rect,
    /// Opacity in [0, 1].
    pub opacity: f64,
}

/// In-memory [`PresentationSurface`] that can composite its state into an RGBA frame.
#[derive(Clone, Debug)]
pub struct SoftwareSurface {
    layers: Vec<LayerState>,
    index: HashMap<NodeId, usize>,
    overlay: Rect,
    markers: Vec<Marker>,
    markers_visible: bool,
}

impl SoftwareSurface {
    /// One transparent, unplaced layer per node of `graph`, in declaration order. Markers
    /// start hidden.
    pub fn new(graph: &NodeGraph) -> Self {
        let layers: Vec<LayerState> = graph
            .nodes()
            .iter()
            .map(|n| LayerState {
                node: n.id.clone(),
                bounds: Rect::ZERO,
                opacity: 0.0,
            })
            .collect();
        let index = layers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.node.clone(), i))
            .collect();
        Self {
            layers,
            index,
            overlay: Rect::ZERO,
            markers: Vec::new(),
            markers_visible: false,
        }
    }

    /// State of node `id`'s layer.
    pub fn layer(&self, id: &str) -> Option<&LayerState> {
        self.index.get(id).map(|&i| &self.layers[i])
    }

    /// All layers, bottom to top.
    pub fn layers(&self) -> &[LayerState] {
        &self.layers
    }

    /// Nodes whose layer is at least partly opaque, bottom to top.
    pub fn visible_nodes(&self) -> Vec<&NodeId> {
        self.layers
            .iter()
            .filter(|l| l.opacity > 0.0)
            .map(|l| &l.node)
            .collect()
    }

    /// Current overlay box.
    pub fn overlay_bounds(&self) -> Rect {
        self.overlay
    }

    /// Markers in drawing order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Whether markers are drawn.
    pub fn markers_visible(&self) -> bool {
        self.markers_visible
    }

    /// Composite every visible layer, then the markers if shown, over `background`.
    ///
    /// Images are sampled nearest-neighbour at pixel centers.
    #[tracing::instrument(skip_all, fields(width = viewport.width, height = viewport.height))]
    pub fn compose(
        &self,
        assets: &LoadedAssets,
        viewport: Viewport,
        background: [u8; 4],
    ) -> ViewerResult<image::RgbaImage> {
        let (w, h) = viewport.pixel_dims();
        let bg = premultiply(background);
        let mut frame = Frame {
            width: w,
            height: h,
            pixels: vec![bg; (w as usize) * (h as usize)],
        };

        for layer in &self.layers {
            if layer.opacity <= 0.0 || layer.bounds.area() <= 0.0 {
                continue;
            }
            let image = &assets.get(layer.node.as_str())?.image;
            frame.draw_image(image, layer.bounds, layer.opacity as f32);
        }

        if self.markers_visible {
            let fill = premultiply(MARKER_FILL);
            let ring = premultiply(MARKER_RING);
            for marker in &self.markers {
                frame.draw_marker(marker, fill, ring);
            }
        }

        let straight: Vec<u8> = frame
            .pixels
            .into_iter()
            .flat_map(unpremultiply)
            .collect();
        let img = image::RgbaImage::from_raw(w, h, straight)
            .ok_or_else(|| anyhow::anyhow!("invalid rgba buffer size"))?;
        Ok(img)
    }
}

impl PresentationSurface for SoftwareSurface {
    fn set_image_bounds(&mut self, id: &NodeId, bounds: Rect) {
        match self.index.get(id) {
            Some(&i) => self.layers[i].bounds = bounds,
            None => tracing::warn!(node = %id, "bounds set on unknown layer"),
        }
    }

    fn set_image_opacity(&mut self, id: &NodeId, opacity: f64) {
        match self.index.get(id) {
            Some(&i) => self.layers[i].opacity = opacity.clamp(0.0, 1.0),
            None => tracing::warn!(node = %id, "opacity set on unknown layer"),
        }
    }

    fn set_overlay_bounds(&mut self, bounds: Rect) {
        self.overlay = bounds;
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn set_markers_visible(&mut self, visible: bool) {
        self.markers_visible = visible;
    }
}

struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<PremulRgba8>,
}

impl Frame {
    // Pixel index range covered by `[lo, hi)` on an axis of `len` pixels.
    fn span(lo: f64, hi: f64, len: u32) -> (u32, u32) {
        let start = lo.floor().max(0.0).min(f64::from(len)) as u32;
        let end = hi.ceil().max(0.0).min(f64::from(len)) as u32;
        (start, end)
    }

    fn blend(&mut self, x: u32, y: u32, src: PremulRgba8, opacity: f32) {
        let i = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[i] = over(self.pixels[i], src, opacity);
    }

    fn draw_image(&mut self, image: &PreparedImage, bounds: Rect, opacity: f32) {
        let (x0, x1) = Self::span(bounds.x0, bounds.x1, self.width);
        let (y0, y1) = Self::span(bounds.y0, bounds.y1, self.height);
        let sx = f64::from(image.width) / bounds.width();
        let sy = f64::from(image.height) / bounds.height();

        for y in y0..y1 {
            let cy = f64::from(y) + 0.5;
            if cy < bounds.y0 || cy >= bounds.y1 {
                continue;
            }
            let iy = ((cy - bounds.y0) * sy).floor() as u32;
            for x in x0..x1 {
                let cx = f64::from(x) + 0.5;
                if cx < bounds.x0 || cx >= bounds.x1 {
                    continue;
                }
                let ix = ((cx - bounds.x0) * sx).floor() as u32;
                let src = image.pixel(ix.min(image.width - 1), iy.min(image.height - 1));
                self.blend(x, y, src, opacity);
            }
        }
    }

    fn draw_marker(&mut self, marker: &Marker, fill: PremulRgba8, ring: PremulRgba8) {
        let r = 0.5 * marker.diameter;
        if r <= 0.0 {
            return;
        }
        let c = marker.center;
        let (x0, x1) = Self::span(c.x - r, c.x + r, self.width);
        let (y0, y1) = Self::span(c.y - r, c.y + r, self.height);
        let inner = (r - MARKER_RING_PX).max(0.0);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let d = (p - c).hypot();
                if d > r {
                    continue;
                }
                let src = if d > inner { ring } else { fill };
                self.blend(x, y, src, 1.0);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/present/software.rs"]
mod tests;
