use super::*;
use crate::graph::model::{AudioRef, Hotspot, ImageRef};

fn node_with(hotspots: Vec<Hotspot>) -> Node {
    Node {
        id: NodeId::new("a"),
        image: ImageRef {
            file_name: "a.png".to_string(),
            fade_secs: None,
        },
        audio: AudioRef {
            file_name: "a.wav".to_string(),
            gain_db: 0.0,
            looping: false,
            sync: false,
            fade_in_secs: None,
            fade_out_secs: None,
        },
        hotspots,
    }
}

fn spot(x: f64, y: f64, size: f64, target: &str) -> Hotspot {
    Hotspot {
        x,
        y,
        size,
        target: NodeId::new(target),
    }
}

#[test]
fn markers_scale_with_bounds() {
    let node = node_with(vec![spot(0.5, 0.5, 5.0, "b"), spot(0.0, 1.0, 2.0, "c")]);
    let bounds = Rect::new(100.0, 50.0, 900.0, 450.0);
    let markers = place_markers(&node, bounds);

    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].center, Point::new(500.0, 250.0));
    assert!((markers[0].diameter - 40.0).abs() < 1e-9);
    assert_eq!(markers[0].target.as_str(), "b");
    assert_eq!(markers[1].index, 1);
    assert_eq!(markers[1].center, Point::new(100.0, 450.0));
    assert!((markers[1].diameter - 16.0).abs() < 1e-9);
}

#[test]
fn node_without_hotspots_has_no_markers() {
    assert!(place_markers(&node_with(vec![]), Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
}

#[test]
fn hit_test_prefers_topmost() {
    let node = node_with(vec![spot(0.5, 0.5, 10.0, "under"), spot(0.5, 0.5, 4.0, "over")]);
    let markers = place_markers(&node, Rect::new(0.0, 0.0, 100.0, 100.0));

    assert_eq!(
        hit_test(&markers, Point::new(50.0, 50.0)).map(|m| m.target.as_str()),
        Some("over")
    );
    assert_eq!(
        hit_test(&markers, Point::new(54.0, 50.0)).map(|m| m.target.as_str()),
        Some("under")
    );
    assert!(hit_test(&markers, Point::new(90.0, 90.0)).is_none());
}

#[test]
fn normalized_position_inverts_placement() {
    let bounds = Rect::new(100.0, 50.0, 900.0, 450.0);
    let p = normalized_position(bounds, Point::new(439.0, 235.85)).unwrap();
    assert!((p.x - 0.42375).abs() < 1e-9);
    assert!((p.y - 0.464625).abs() < 1e-9);
    assert_eq!(format_position(p), "[0.423750, 0.464625]");
    assert!(normalized_position(Rect::ZERO, Point::ORIGIN).is_none());
}
