use flow_cube::{
    Primitive,
    input::{InputState, LookButton},
};
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::KeyCode,
};

fn press(input: &mut InputState, code: KeyCode) -> bool {
    input.handle_key(code, ElementState::Pressed, false)
}

#[test]
fn movement_keys_follow_press_and_release() {
    let mut input = InputState::new(LookButton::Right);
    assert!(press(&mut input, KeyCode::KeyW));
    assert!(input.forward);
    input.handle_key(KeyCode::KeyW, ElementState::Released, false);
    assert!(!input.forward);

    press(&mut input, KeyCode::Space);
    press(&mut input, KeyCode::ControlLeft);
    assert!(input.up && input.down);
}

#[test]
fn unbound_keys_are_reported() {
    let mut input = InputState::new(LookButton::Right);
    assert!(!press(&mut input, KeyCode::KeyZ));
}

#[test]
fn add_keys_queue_one_item_per_press() {
    let mut input = InputState::new(LookButton::Right);
    press(&mut input, KeyCode::KeyN);
    // held keys repeat; only the first press counts
    input.handle_key(KeyCode::KeyN, ElementState::Pressed, true);
    input.handle_key(KeyCode::KeyN, ElementState::Released, false);
    press(&mut input, KeyCode::KeyT);
    press(&mut input, KeyCode::KeyQ);

    assert_eq!(
        input.take_pending_items(),
        vec![Primitive::Cube, Primitive::Triangle, Primitive::Quad]
    );
    assert!(input.take_pending_items().is_empty());
}

#[test]
fn escape_requests_quit() {
    let mut input = InputState::new(LookButton::Right);
    input.handle_key(KeyCode::Escape, ElementState::Released, false);
    assert!(!input.quit_requested);
    press(&mut input, KeyCode::Escape);
    assert!(input.quit_requested);
}

#[test]
fn only_the_configured_button_looks() {
    let mut input = InputState::new(LookButton::Left);
    input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
    assert!(!input.look_held);
    input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
    assert!(input.look_held);

    input.handle_mouse_motion(3.0, -2.0);
    input.handle_mouse_motion(1.0, 1.0);
    assert_eq!(input.pointer_delta, (4.0, -1.0));

    input.end_frame();
    assert_eq!(input.pointer_delta, (0.0, 0.0));
    assert!(input.look_held);
}

#[test]
fn losing_focus_releases_everything() {
    let mut input = InputState::new(LookButton::Right);
    press(&mut input, KeyCode::KeyA);
    press(&mut input, KeyCode::ShiftLeft);
    input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);

    assert!(input.handle_window_event(&WindowEvent::Focused(false)));
    assert!(!input.left);
    assert!(!input.pan_modifier);
    assert!(!input.look_held);
}
