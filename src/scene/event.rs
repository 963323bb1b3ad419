// SPDX-License-Identifier: GPL-3.0-or-later

/// A point in window coordinates, `(x, y)`.
pub(crate) type Position = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

impl MouseButton {
    /// The step a button applies to a cyclic selection: left and wheel up move forward, right and
    /// wheel down move back.
    pub(crate) fn step(&self) -> i32 {
        match self {
            MouseButton::Left | MouseButton::WheelUp => 1,
            MouseButton::Right | MouseButton::WheelDown => -1,
            MouseButton::Middle => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    Q,
    Space,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Input delivered to the scene once per occurrence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Event {
    PointerMoved(Position),

    ButtonPressed {
        position: Position,
        button: MouseButton,
    },

    ButtonReleased {
        position: Position,
        button: MouseButton,
    },

    KeyReleased(Key),

    /// The window was closed.
    Quit,
}
