use std::time::Duration;

use image::RgbaImage;
use pagecrop::editor::coords::{ClientPoint, PointerInput, SurfaceLayout};
use pagecrop::editor::{Outcome, Point, stroke_dashed_rect, map_to_raster};
use pagecrop::settings::StrokeSettings;
use pagecrop::test_utils::test_helpers::{DragBuilder, ScriptedRenderer, page_color, replay};
use pagecrop::{CropBox, EditorConfig, EditorSession, PointerEvent, Rect, Scale};

const WAIT: Duration = Duration::from_secs(5);

fn config_at(scale: f32) -> EditorConfig {
    EditorConfig {
        initial_scale: Some(scale),
        ..EditorConfig::default()
    }
}

fn open_idle(renderer: ScriptedRenderer) -> EditorSession {
    let mut session = EditorSession::open(renderer, vec![1u8], config_at(1.0)).unwrap();
    assert!(session.wait_until_idle(WAIT));
    session
}

fn drag(session: &mut EditorSession, from: (f32, f32), to: (f32, f32)) -> Outcome {
    let outcomes = replay(
        session,
        DragBuilder::mouse(from.0, from.1).move_to(to.0, to.1).up(),
    );
    *outcomes.last().unwrap()
}

#[test]
fn burst_of_navigation_paints_only_the_last_page() {
    let (renderer, gate) = ScriptedRenderer::new(4, (100.0, 100.0)).gated();
    let painted = renderer.paint_log();
    let mut session = EditorSession::open(renderer, vec![1u8], config_at(1.0)).unwrap();
    assert!(session.is_rendering());

    for page in [2, 3, 4] {
        session.go_to_page(page);
    }
    assert_eq!(session.pending_page(), Some(4));
    assert_eq!(session.current_page(), 1);

    drop(gate);
    assert!(session.wait_until_idle(WAIT));

    assert_eq!(*painted.lock().unwrap(), vec![1, 4]);
    assert_eq!(session.current_page(), 4);
    assert_eq!(*session.surface().get_pixel(50, 50), page_color(4));
    assert!(!session.navigation().can_go_forward);
}

#[test]
fn repeated_next_page_while_busy_advances_from_pending() {
    let (renderer, gate) = ScriptedRenderer::new(5, (100.0, 100.0)).gated();
    let painted = renderer.paint_log();
    let mut session = EditorSession::open(renderer, vec![1u8], config_at(1.0)).unwrap();

    session.next_page();
    session.next_page();
    session.next_page();
    assert_eq!(session.pending_page(), Some(4));

    drop(gate);
    assert!(session.wait_until_idle(WAIT));
    assert_eq!(*painted.lock().unwrap(), vec![1, 4]);
}

#[test]
fn zoom_while_busy_goes_through_the_pending_slot() {
    let (renderer, gate) = ScriptedRenderer::new(2, (100.0, 100.0)).gated();
    let painted = renderer.paint_log();
    let mut session = EditorSession::open(renderer, vec![1u8], config_at(1.0)).unwrap();

    session.set_zoom(Scale::Factor(2.0));
    assert_eq!(session.pending_page(), Some(1));

    drop(gate);
    assert!(session.wait_until_idle(WAIT));
    assert_eq!(*painted.lock().unwrap(), vec![1, 1]);
    assert_eq!(session.surface().dimensions(), (200, 200));
    assert_eq!(session.resolved_scale(), Some(2.0));
}

#[test]
fn failed_render_does_not_block_navigation() {
    let mut session = open_idle(ScriptedRenderer::new(3, (100.0, 100.0)).failing_page(2));

    session.go_to_page(2);
    assert!(session.wait_until_idle(WAIT));
    assert!(!session.is_rendering());
    // The previous page stays on screen.
    assert_eq!(*session.surface().get_pixel(10, 10), page_color(1));
    assert_eq!(session.notifications().count(), 1);

    session.go_to_page(3);
    assert!(session.is_rendering());
    assert!(session.wait_until_idle(WAIT));
    assert_eq!(*session.surface().get_pixel(10, 10), page_color(3));
}

#[test]
fn failed_render_still_starts_pending_page() {
    let (renderer, gate) = ScriptedRenderer::new(3, (100.0, 100.0))
        .failing_page(1)
        .gated();
    let mut session = EditorSession::open(renderer, vec![1u8], config_at(1.0)).unwrap();
    session.go_to_page(3);

    drop(gate);
    assert!(session.wait_until_idle(WAIT));
    assert_eq!(session.current_page(), 3);
    assert_eq!(*session.surface().get_pixel(0, 0), page_color(3));
}

#[test]
fn small_drag_leaves_store_untouched() {
    let mut session = open_idle(ScriptedRenderer::new(1, (400.0, 400.0)));
    assert_eq!(session.crop_box(0), None);

    assert_eq!(drag(&mut session, (100.0, 100.0), (103.0, 103.0)), Outcome::Discard);
    assert_eq!(session.crop_box(0), None);

    drag(&mut session, (10.0, 10.0), (110.0, 60.0));
    let before = session.crop_box(0).copied();
    assert_eq!(drag(&mut session, (200.0, 200.0), (203.0, 203.0)), Outcome::Discard);
    assert_eq!(session.crop_box(0).copied(), before);
}

#[test]
fn click_without_move_is_discarded() {
    let mut session = open_idle(ScriptedRenderer::new(1, (100.0, 100.0)));
    let outcomes = replay(&mut session, DragBuilder::mouse(20.0, 20.0).up());
    assert_eq!(outcomes, vec![Outcome::Started, Outcome::Discard]);
    assert!(session.selections().is_empty());
}

#[test]
fn new_drag_replaces_box_on_same_page() {
    let mut session = open_idle(ScriptedRenderer::new(2, (400.0, 400.0)));

    drag(&mut session, (10.0, 10.0), (100.0, 100.0));
    drag(&mut session, (50.0, 60.0), (250.0, 300.0));

    let selections = session.selections();
    assert_eq!(selections.len(), 1);
    assert_eq!(selections[&0].rect, Rect::new(50.0, 60.0, 200.0, 240.0));
}

#[test]
fn clear_semantics() {
    let mut session = open_idle(ScriptedRenderer::new(3, (200.0, 200.0)));

    session.clear_current_page_selection();
    assert!(session.selections().is_empty());

    drag(&mut session, (10.0, 10.0), (100.0, 100.0));
    session.go_to_page(2);
    assert!(session.wait_until_idle(WAIT));
    session.clear_current_page_selection();
    assert_eq!(session.selections().len(), 1);

    drag(&mut session, (10.0, 10.0), (100.0, 100.0));
    session.clear_all_selections();
    assert!(session.selections().is_empty());

    session.clear_all_selections();
    assert!(session.selections().is_empty());
}

#[test]
fn pointer_maps_from_css_space_to_raster() {
    let layout = SurfaceLayout::new(0.0, 0.0, 800.0, 600.0);
    let input = PointerInput::Mouse(ClientPoint::new(100.0, 100.0));
    assert_eq!(
        map_to_raster(&layout, (1600, 1200), &input),
        Some(Point::new(200.0, 200.0))
    );

    let mut session = open_idle(ScriptedRenderer::new(1, (1600.0, 1200.0)));
    session.set_surface_layout(layout);
    drag(&mut session, (100.0, 100.0), (200.0, 175.0));
    assert_eq!(
        session.crop_box(0).map(|b| b.rect),
        Some(Rect::new(200.0, 200.0, 200.0, 150.0))
    );
}

#[test]
fn leaving_the_surface_commits_like_release() {
    let mut session = open_idle(ScriptedRenderer::new(1, (300.0, 300.0)));
    let outcomes = replay(
        &mut session,
        DragBuilder::mouse(10.0, 10.0).move_to(80.0, 90.0).leave(),
    );
    assert_eq!(
        outcomes.last(),
        Some(&Outcome::Commit(Rect::new(10.0, 10.0, 70.0, 80.0)))
    );
}

#[test]
fn touch_uses_first_contact() {
    let mut session = open_idle(ScriptedRenderer::new(1, (300.0, 300.0)));
    session.handle_pointer(PointerEvent::Down(PointerInput::Touch(vec![
        ClientPoint::new(20.0, 20.0),
        ClientPoint::new(250.0, 250.0),
    ])));
    session.handle_pointer(PointerEvent::Move(PointerInput::Touch(vec![
        ClientPoint::new(120.0, 70.0),
        ClientPoint::new(5.0, 5.0),
    ])));
    assert!(matches!(
        session.handle_pointer(PointerEvent::TouchEnd),
        Outcome::Commit(_)
    ));
    assert_eq!(
        session.crop_box(0).map(|b| b.rect),
        Some(Rect::new(20.0, 20.0, 100.0, 50.0))
    );

    let outcomes = replay(
        &mut session,
        DragBuilder::touch(0.0, 0.0).move_to(2.0, 2.0).touch_end(),
    );
    assert_eq!(outcomes.last(), Some(&Outcome::Discard));
}

#[test]
fn drag_past_the_surface_edge_is_clamped_to_the_page() {
    let mut session = open_idle(ScriptedRenderer::new(1, (100.0, 100.0)));
    let outcomes = replay(
        &mut session,
        DragBuilder::touch(50.0, 50.0).move_to(-40.0, 400.0).touch_end(),
    );
    assert_eq!(
        outcomes.last(),
        Some(&Outcome::Commit(Rect::new(0.0, 50.0, 50.0, 50.0)))
    );
    assert_eq!(
        session.crop_box(0).map(|b| b.rect),
        Some(Rect::new(0.0, 50.0, 50.0, 50.0))
    );
}

#[test]
fn live_preview_does_not_accumulate_strokes() {
    let mut session = open_idle(ScriptedRenderer::new(1, (100.0, 100.0)));
    let events = DragBuilder::mouse(5.0, 5.0)
        .move_to(40.0, 40.0)
        .move_to(60.0, 70.0)
        .build();
    replay(&mut session, events);

    let mut expected = RgbaImage::from_pixel(100, 100, page_color(1));
    stroke_dashed_rect(
        &mut expected,
        &Rect::new(5.0, 5.0, 55.0, 65.0),
        &StrokeSettings::default(),
    );
    assert_eq!(session.surface(), &expected);
}

#[test]
fn stored_box_keeps_its_scale_across_zoom() {
    let mut session = open_idle(ScriptedRenderer::new(1, (100.0, 100.0)));
    session.set_zoom(Scale::Factor(2.0));
    assert!(session.wait_until_idle(WAIT));

    drag(&mut session, (20.0, 20.0), (120.0, 80.0));
    let stored = CropBox::new(Rect::new(20.0, 20.0, 100.0, 60.0), 2.0);
    assert_eq!(session.crop_box(0), Some(&stored));

    session.zoom_out();
    assert!(session.wait_until_idle(WAIT));
    assert_eq!(session.resolved_scale(), Some(1.75));
    assert_eq!(session.crop_box(0), Some(&stored));
}

#[test]
fn end_to_end_select_then_clear() {
    let mut session = open_idle(ScriptedRenderer::new(3, (612.0, 792.0)));
    assert_eq!(session.page_count(), 3);

    session.go_to_page(1);
    assert!(session.wait_until_idle(WAIT));
    drag(&mut session, (100.0, 100.0), (300.0, 250.0));

    let selections = session.require_selections().unwrap();
    assert_eq!(selections.len(), 1);
    assert_eq!(
        selections[&0],
        CropBox::new(Rect::new(100.0, 100.0, 200.0, 150.0), 1.0)
    );
    assert_eq!(
        serde_json::to_value(&selections).unwrap(),
        serde_json::json!({
            "0": { "x": 100.0, "y": 100.0, "width": 200.0, "height": 150.0, "scale": 1.0 }
        })
    );

    session.go_to_page(2);
    assert!(session.wait_until_idle(WAIT));
    session.clear_all_selections();
    assert!(session.selections().is_empty());
    assert!(session.require_selections().is_err());
}
