//! Camera input events.
//!
//! The windowing layer translates its native mouse events into
//! [`CameraInput`] and feeds them to the camera controller. Nothing else in
//! the renderer mutates the camera.

/// Mouse buttons that start a drag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DragButton {
    /// Left button orbits the camera
    Rotate,
    /// Right button pans the pivot
    Pan,
}

/// One input event relevant to the orbit camera
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraInput {
    /// A drag button was pressed
    DragStart(DragButton),
    /// A drag button was released
    DragEnd(DragButton),
    /// Mouse moved by `(dx, dy)` pixels while a button may be held
    Drag { dx: f32, dy: f32 },
    /// Scroll wheel; negative is towards the user
    Scroll { delta: f32 },
}
