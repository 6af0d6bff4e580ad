mod common;

use approx::assert_relative_eq;
use battlemap::{
    ContextTarget, DrawTool, Gesture, InputHandler, MemoryStore, Modifiers, PointerButton, Scene, SceneEvent, SceneStore, ScreenPos,
    StoreCommand, WorldPos,
};
use common::{agent, at, battlefield};
use rstest::rstest;

const NONE: Modifiers = Modifiers { ctrl: false, shift: false, alt: false, meta: false };

fn click(
    input: &mut InputHandler,
    scene: &mut Scene<MemoryStore>,
    x: f64,
    z: f64,
    button: PointerButton,
    now: f64,
) -> Vec<SceneEvent> {
    let p = at(scene, x, z);
    let mut events = input.on_pointer_down(scene, p, button, NONE, now);
    events.extend(input.on_pointer_up(scene, p, now + 20.0));
    events
}

#[test]
fn two_quick_clicks_are_a_double_click() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    assert!(click(&mut input, &mut scene, 0.0, 0.0, PointerButton::Primary, 0.0).is_empty());
    let events = click(&mut input, &mut scene, 0.0, 0.0, PointerButton::Primary, 300.0);

    assert_eq!(events, vec![SceneEvent::AgentDoubleClick { agent_id: "a1".into() }]);
    assert!(!input.has_pending_click());
    assert!(input.tick(&mut scene, 2000.0).is_empty());
}

#[test]
fn slow_clicks_are_two_single_clicks() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let single = SceneEvent::AgentClick { agent_id: "a1".into(), shift: false };

    let mut events = click(&mut input, &mut scene, 0.0, 0.0, PointerButton::Primary, 0.0);
    events.extend(click(&mut input, &mut scene, 0.0, 0.0, PointerButton::Primary, 500.0));
    events.extend(input.tick(&mut scene, 1500.0));

    assert_eq!(events, vec![single.clone(), single]);
}

#[test]
fn single_click_waits_for_the_double_click_window() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    click(&mut input, &mut scene, 0.0, 0.0, PointerButton::Primary, 0.0);
    assert!(input.tick(&mut scene, 200.0).is_empty());
    assert!(input.has_pending_click());
    assert_eq!(input.tick(&mut scene, 450.0).len(), 1);
}

#[test]
fn agent_wins_over_building_underneath() {
    let mut scene = battlefield();
    scene.store_mut().upsert_agent(agent("a2", 5.0, 0.0));
    scene.sync_agents(false, 0.0);
    let mut input = InputHandler::new();

    let mut events = click(&mut input, &mut scene, 5.0, 0.0, PointerButton::Primary, 0.0);
    events.extend(input.tick(&mut scene, 1000.0));

    assert_eq!(events, vec![SceneEvent::AgentClick { agent_id: "a2".into(), shift: false }]);
}

#[test]
fn building_click_selects_it() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let mut events = click(&mut input, &mut scene, 5.0, 0.0, PointerButton::Primary, 0.0);
    events.extend(input.tick(&mut scene, 1000.0));

    assert!(matches!(&events[..], [SceneEvent::BuildingClick { building_id, .. }] if building_id == "b1"));
    assert!(scene.store().snapshot().selected_building_ids.contains("b1"));
}

#[test]
fn dragging_a_building_reports_start_move_end() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let (down, dest) = (at(&scene, 5.0, 0.0), at(&scene, 7.0, 0.0));
    input.on_pointer_down(&mut scene, down, PointerButton::Primary, NONE, 0.0);
    let moved = input.on_pointer_move(&mut scene, dest);
    assert!(matches!(
        &moved[..],
        [SceneEvent::BuildingDragStart { .. }, SceneEvent::BuildingDragMove { .. }]
    ));

    let up = input.on_pointer_up(&mut scene, dest, 100.0);
    match &up[..] {
        [SceneEvent::BuildingDragEnd { building_id, position }] => {
            assert_eq!(building_id, "b1");
            assert_relative_eq!(position.x, 7.0, epsilon = 1e-9);
            assert_relative_eq!(position.z, 0.0, epsilon = 1e-9);
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert!(!input.has_pending_click());
}

#[test]
fn leaving_mid_drag_cancels_it() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let (down, away) = (at(&scene, 5.0, 0.0), at(&scene, 8.0, 0.0));
    input.on_pointer_down(&mut scene, down, PointerButton::Primary, NONE, 0.0);
    input.on_pointer_move(&mut scene, away);
    let events = input.on_pointer_leave(&mut scene, away);

    assert_eq!(events, vec![SceneEvent::BuildingDragCancel { building_id: "b1".into() }]);
    assert_eq!(scene.building("b1").map(|b| b.position), Some(WorldPos::new(5.0, 0.0)));
    assert!(input.on_pointer_up(&mut scene, away, 50.0).is_empty());
}

#[test]
fn marquee_drag_reports_selection_box() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let start = at(&scene, -5.0, -5.0);
    let end = at(&scene, 3.0, 2.0);
    input.on_pointer_down(&mut scene, start, PointerButton::Primary, NONE, 0.0);
    input.on_pointer_move(&mut scene, end);
    let events = input.on_pointer_up(&mut scene, end, 100.0);

    match &events[..] {
        [SceneEvent::SelectionBox { start, end }] => {
            assert_relative_eq!(start.x, -5.0, epsilon = 1e-9);
            assert_relative_eq!(end.z, 2.0, epsilon = 1e-9);
            assert_eq!(scene.agents_in_box(*start, *end), vec!["a1".to_string()]);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn ground_click_clears_area_and_building_selection() {
    let mut scene = battlefield();
    scene.store_mut().dispatch(StoreCommand::SelectArea { area_id: Some("r1".into()) });
    scene.store_mut().dispatch(StoreCommand::SelectBuilding { building_id: Some("b1".into()) });
    let mut input = InputHandler::new();

    let events = click(&mut input, &mut scene, -5.0, -5.0, PointerButton::Primary, 0.0);

    assert!(matches!(&events[..], [SceneEvent::GroundClick { .. }]));
    let snap = scene.store().snapshot();
    assert_eq!(snap.selected_area_id, None);
    assert!(snap.selected_building_ids.is_empty());
}

#[test]
fn area_click_selects_without_an_event() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let mut events = click(&mut input, &mut scene, 0.0, 4.0, PointerButton::Primary, 0.0);
    events.extend(input.tick(&mut scene, 1000.0));

    assert!(events.is_empty());
    assert_eq!(scene.store().snapshot().selected_area_id.as_deref(), Some("r1"));
}

#[test]
fn right_click_on_ground_orders_selected_agents() {
    let mut scene = battlefield();
    scene.store_mut().snapshot_mut().selected_agent_ids.insert("a1".into());
    let mut input = InputHandler::new();

    let events = click(&mut input, &mut scene, -5.0, -5.0, PointerButton::Secondary, 0.0);

    match &events[..] {
        [SceneEvent::MoveCommand { agent_ids, target }] => {
            assert_eq!(agent_ids, &vec!["a1".to_string()]);
            assert_relative_eq!(target.x, -5.0, epsilon = 1e-9);
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert_eq!(scene.effects().ripples().len(), 1);
}

#[rstest]
#[case(0.0, 0.0, Some(ContextTarget::Agent { id: "a1".into() }))]
#[case(5.0, 0.0, Some(ContextTarget::Building { id: "b1".into() }))]
#[case(0.0, 4.0, Some(ContextTarget::Area { id: "r1".into() }))]
#[case(-5.0, -5.0, None)]
fn right_click_without_selection_opens_context_menu(
    #[case] x: f64,
    #[case] z: f64,
    #[case] expected: Option<ContextTarget>,
) {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let events = click(&mut input, &mut scene, x, z, PointerButton::Secondary, 0.0);

    match &events[..] {
        [SceneEvent::ContextMenu { target, .. }] => assert_eq!(target, &expected),
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn right_drag_pans_instead_of_clicking() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let from = at(&scene, 0.0, 0.0);
    input.on_pointer_down(&mut scene, from, PointerButton::Secondary, NONE, 0.0);
    let to = ScreenPos::new(460.0, 300.0);
    input.on_pointer_move(&mut scene, to);
    let events = input.on_pointer_up(&mut scene, to, 100.0);

    assert!(events.is_empty());
    assert_relative_eq!(scene.camera().center().x, -2.0, epsilon = 1e-9);
}

#[test]
fn long_press_opens_context_menu_and_eats_the_release() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let finger = at(&scene, 0.0, 0.0);

    assert!(input.on_touch_start(&mut scene, &[finger], 0.0).is_empty());
    assert!(input.tick(&mut scene, 300.0).is_empty());
    let events = input.tick(&mut scene, 600.0);
    assert!(matches!(
        &events[..],
        [SceneEvent::ContextMenu { target: Some(ContextTarget::Agent { id }), .. }] if id == "a1"
    ));

    assert!(input.on_touch_end(&mut scene, finger, 0, 700.0).is_empty());
    assert!(!input.has_pending_click());
}

#[test]
fn pinch_zooms_about_the_midpoint() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let (a, b) = (ScreenPos::new(300.0, 300.0), ScreenPos::new(500.0, 300.0));

    input.on_touch_start(&mut scene, &[a, b], 0.0);
    input.on_touch_move(
        &mut scene,
        &[ScreenPos::new(200.0, 300.0), ScreenPos::new(600.0, 300.0)],
    );

    assert_relative_eq!(scene.camera().zoom(), 60.0, epsilon = 1e-9);
    assert_relative_eq!(scene.camera().center().x, 0.0, epsilon = 1e-9);
}

#[test]
fn escape_cancels_and_disarms() {
    let mut scene = battlefield();
    scene.set_drawing_tool(Some(DrawTool::Rectangle));
    scene.store_mut().dispatch(StoreCommand::SelectArea { area_id: Some("r1".into()) });
    let mut input = InputHandler::new();

    input.on_key_down(&mut scene, "Escape", NONE);

    assert_eq!(scene.drawing_tool(), None);
    assert_eq!(scene.store().snapshot().selected_area_id, None);
}

#[test]
fn delete_key_removes_the_selected_area() {
    let mut scene = battlefield();
    scene.store_mut().dispatch(StoreCommand::SelectArea { area_id: Some("r1".into()) });
    let mut input = InputHandler::new();

    input.on_key_down(&mut scene, "Delete", NONE);

    assert!(scene.area("r1").is_none());
    assert!(scene.store().commands().contains(&StoreCommand::DeleteArea { area_id: "r1".into() }));
}

#[test]
fn pan_keys_hold_until_released() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    input.on_key_down(&mut scene, "ArrowRight", NONE);
    assert!(scene.camera().pan_keys.right);
    input.on_key_up(&mut scene, "ArrowRight");
    assert!(!scene.camera().pan_keys.right);
}

#[test]
fn hover_reports_entering_and_leaving_an_agent() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let (over, off) = (at(&scene, 0.0, 0.0), at(&scene, -5.0, -5.0));

    let entered = input.on_pointer_move(&mut scene, over);
    assert_eq!(entered, vec![SceneEvent::AgentHover { agent_id: Some("a1".into()), screen: over }]);
    assert_eq!(scene.hovered_agent(), Some("a1"));
    assert!(input.on_pointer_move(&mut scene, over).is_empty());

    let left = input.on_pointer_move(&mut scene, off);
    assert_eq!(left, vec![SceneEvent::AgentHover { agent_id: None, screen: off }]);
    assert_eq!(scene.hovered_agent(), None);
}

#[test]
fn leaving_the_canvas_clears_hover() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let over = at(&scene, 0.0, 0.0);
    input.on_pointer_move(&mut scene, over);

    let events = input.on_pointer_leave(&mut scene, over);

    assert_eq!(events, vec![SceneEvent::AgentHover { agent_id: None, screen: over }]);
    assert_eq!(scene.hovered_agent(), None);
}

#[test]
fn leaving_mid_marquee_drops_the_box() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    let (start, end) = (at(&scene, -5.0, -5.0), at(&scene, 3.0, 2.0));
    input.on_pointer_down(&mut scene, start, PointerButton::Primary, NONE, 0.0);
    input.on_pointer_move(&mut scene, end);
    assert!(matches!(scene.gesture(), Gesture::Selecting { .. }));

    assert!(input.on_pointer_leave(&mut scene, end).is_empty());
    assert_eq!(scene.gesture(), &Gesture::Idle);
    assert!(input.on_pointer_up(&mut scene, end, 100.0).is_empty());
}

#[test]
fn leaving_mid_pan_stops_panning() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();

    input.on_pointer_down(&mut scene, ScreenPos::new(400.0, 300.0), PointerButton::Secondary, NONE, 0.0);
    input.on_pointer_move(&mut scene, ScreenPos::new(460.0, 300.0));
    assert!(matches!(scene.gesture(), Gesture::Panning { .. }));
    let center = scene.camera().center();

    input.on_pointer_leave(&mut scene, ScreenPos::new(460.0, 300.0));
    input.on_pointer_move(&mut scene, ScreenPos::new(560.0, 300.0));

    assert_eq!(scene.gesture(), &Gesture::Idle);
    assert_eq!(scene.camera().center(), center);
    assert!(input.on_pointer_up(&mut scene, ScreenPos::new(560.0, 300.0), 100.0).is_empty());
}

#[test]
fn finger_left_after_a_pinch_does_not_hover() {
    let mut scene = battlefield();
    let mut input = InputHandler::new();
    let (a, b) = (ScreenPos::new(300.0, 300.0), ScreenPos::new(500.0, 300.0));
    input.on_touch_start(&mut scene, &[a, b], 0.0);
    input.on_touch_end(&mut scene, b, 1, 100.0);

    let finger = at(&scene, 0.0, 0.0);
    assert!(input.on_touch_move(&mut scene, &[finger]).is_empty());
    assert_eq!(scene.hovered_agent(), None);

    assert!(input.on_touch_end(&mut scene, finger, 0, 200.0).is_empty());
    assert!(!input.has_pending_click());
    input.on_touch_start(&mut scene, &[finger], 300.0);
    input.on_touch_end(&mut scene, finger, 0, 320.0);
    assert!(input.has_pending_click());
}
