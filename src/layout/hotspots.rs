use crate::{
    foundation::core::{NodeId, Point, Rect},
    graph::model::Node,
};

#[derive(Clone, Debug, PartialEq)]
/// On-screen circular click target for one hotspot.
pub struct Marker {
    /// Position of the hotspot in its node's list.
    pub index: usize,
    /// Center in viewport pixels.
    pub center: Point,
    /// Diameter in viewport pixels.
    pub diameter: f64,
    /// Node reached by clicking.
    pub target: NodeId,
}

impl Marker {
    /// Whether `p` lies inside the circle (boundary included).
    pub fn contains(&self, p: Point) -> bool {
        let r = 0.5 * self.diameter;
        (p - self.center).hypot2() <= r * r
    }
}

/// Place `node`'s hotspots over an image rendered at `bounds`.
///
/// Centers scale the normalized coordinates by the box; diameters are `0.01 × width × size`.
pub fn place_markers(node: &Node, bounds: Rect) -> Vec<Marker> {
    let w = bounds.width();
    let h = bounds.height();
    node.hotspots
        .iter()
        .enumerate()
        .map(|(index, h_spot)| Marker {
            index,
            center: Point::new(bounds.x0 + h_spot.x * w, bounds.y0 + h_spot.y * h),
            diameter: 0.01 * w * h_spot.size,
            target: h_spot.target.clone(),
        })
        .collect()
}

/// Topmost marker under `p`; later markers are drawn above earlier ones.
pub fn hit_test(markers: &[Marker], p: Point) -> Option<&Marker> {
    markers.iter().rev().find(|m| m.contains(p))
}

/// Position of `p` relative to `bounds`, as fractions of its width and height.
///
/// Not clamped: clicks outside the image report values outside [0, 1].
pub fn normalized_position(bounds: Rect, p: Point) -> Option<Point> {
    let w = bounds.width();
    let h = bounds.height();
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(Point::new((p.x - bounds.x0) / w, (p.y - bounds.y0) / h))
}

/// Authoring notation for a normalized position: `[x, y]` with six decimals.
pub fn format_position(p: Point) -> String {
    format!("[{:.6}, {:.6}]", p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/hotspots.rs"]
mod tests;
