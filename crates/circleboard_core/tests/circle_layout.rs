use circleboard_core::hierarchy::circle_tree::{CircleNode, RoleSummary};
use circleboard_core::layout::pack::RING_GAP;
use circleboard_core::{pack_circles, place_on_ring, truncate_to_width, wrap_text, LayoutKind};
use uuid::Uuid;

fn node(name: &str, color: Option<&str>) -> CircleNode {
    CircleNode {
        id: Uuid::new_v4(),
        name: name.to_string(),
        color: color.map(str::to_string),
        icon: None,
        children: Vec::new(),
        roles: Vec::new(),
    }
}

fn role(name: &str) -> RoleSummary {
    RoleSummary {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

#[test]
fn siblings_on_a_ring_never_overlap() {
    for count in 2..=24 {
        let circles: Vec<CircleNode> = (0..count).map(|n| node(&format!("K{n}"), None)).collect();
        let items = pack_circles(150.0, &circles, &[], "#111111");
        assert_eq!(items.len(), count);
        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                let gap = distance(a.x, a.y, b.x, b.y) - a.radius - b.radius;
                assert!(
                    gap >= RING_GAP - 1e-6,
                    "count={count} gap={gap} between {} and {}",
                    a.label,
                    b.label
                );
            }
        }
    }
}

#[test]
fn single_child_is_centered() {
    let items = pack_circles(100.0, &[node("Einzig", None)], &[], "#111111");
    assert_eq!(items.len(), 1);
    assert_eq!((items[0].x, items[0].y), (0.0, 0.0));

    let roles = pack_circles(100.0, &[], &[role("Solo")], "#111111");
    assert_eq!((roles[0].x, roles[0].y), (0.0, 0.0));
}

#[test]
fn layout_is_deterministic() {
    let circles = vec![node("A", Some("#ff0000")), node("B", None), node("C", None)];
    let roles = vec![role("R1"), role("R2")];
    assert_eq!(
        pack_circles(200.0, &circles, &roles, "#222222"),
        pack_circles(200.0, &circles, &roles, "#222222")
    );
}

#[test]
fn empty_input_yields_empty_layout() {
    assert!(pack_circles(200.0, &[], &[], "#000").is_empty());
}

#[test]
fn colors_fall_back_to_parent() {
    let circles = vec![node("Rot", Some("#ff0000")), node("Erbt", None)];
    let roles = vec![role("Rolle")];
    let items = pack_circles(200.0, &circles, &roles, "#00ff00");

    assert_eq!(items[0].color, "#ff0000");
    assert_eq!(items[1].color, "#00ff00");
    assert_eq!(items[2].kind, LayoutKind::Role);
    assert_eq!(items[2].color, "#00ff00");
}

#[test]
fn mixed_layout_uses_outer_and_inner_rings() {
    let circles = vec![node("A", None), node("B", None), node("C", None)];
    let roles = vec![role("R1"), role("R2")];
    let items = pack_circles(200.0, &circles, &roles, "#000");

    let circle_ring = distance(items[0].x, items[0].y, 0.0, 0.0);
    let role_ring = distance(items[3].x, items[3].y, 0.0, 0.0);
    assert!((circle_ring - 116.0).abs() < 1e-9);
    assert!(role_ring < circle_ring);
    assert!((items[3].radius - 14.0).abs() < 1e-9);
    // First circle starts straight up.
    assert!(items[0].x.abs() < 1e-9 && items[0].y < 0.0);
}

#[test]
fn ring_start_angle_is_respected() {
    let points = place_on_ring(2, 5.0, 50.0, 0.0);
    assert!((points[0].0 - 50.0).abs() < 1e-9);
    assert!((points[1].0 + 50.0).abs() < 1e-9);
}

#[test]
fn long_compound_label_wraps_within_budget() {
    let font_size = 12.0;
    let max_width = 8.0 * font_size * 0.55;
    let lines = wrap_text("Elterndienst-Koordination und Planung", max_width, font_size, 3);

    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert!(line.chars().count() <= 8, "line too wide: {line}");
    }
    assert!(lines[2].ends_with('\u{2026}'));
}

#[test]
fn role_label_truncates_with_ellipsis() {
    let truncated = truncate_to_width("Schatzmeisterin", 7.0 * 10.0 * 0.55, 10.0);
    assert_eq!(truncated, "Schatz\u{2026}");
    assert_eq!(truncate_to_width("Kasse", 100.0, 10.0), "Kasse");
}
