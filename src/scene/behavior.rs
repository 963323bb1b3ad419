// SPDX-License-Identifier: GPL-3.0-or-later
//! Optional behaviors that can be attached to a scene node.
use std::fmt;
use std::time::Duration;

use super::event::{MouseButton, Position};
use super::rect::Corner;
use super::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HoverPhase {
    /// The pointer moved into the node.
    Entered,

    /// The pointer moved while inside the node.
    Hovered,

    /// The pointer moved out of the node.
    Exited,
}

/// Called with the hover phase and the pointer position relative to the node.
pub(crate) type HoverHandler<M> = Box<dyn Fn(HoverPhase, Position) -> Option<M>>;

/// Called with the released button and the pointer position relative to the node.
pub(crate) type ClickHandler<M> = Box<dyn Fn(MouseButton, Position) -> Option<M>>;

/// Called with the new state of a toggle.
pub(crate) type ToggleHandler<M> = Box<dyn Fn(bool) -> Option<M>>;

/// Computes a position from the current viewport size.
pub(crate) type AnchorFn = Box<dyn Fn((u32, u32)) -> Position>;

pub(crate) struct Hover<M> {
    hovered: bool,
    pub(super) underline: bool,
    pub(super) handler: Option<HoverHandler<M>>,
}

impl<M> Hover<M> {
    pub(super) fn new(underline: bool, handler: Option<HoverHandler<M>>) -> Self {
        Self {
            hovered: false,
            underline,
            handler,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Advance the hover state for a pointer that is (or isn't) inside the node.
    ///
    /// Returns the phases to fire, in order.
    pub(super) fn update(&mut self, inside: bool) -> &'static [HoverPhase] {
        match (self.hovered, inside) {
            (false, true) => {
                self.hovered = true;
                &[HoverPhase::Entered, HoverPhase::Hovered]
            }
            (true, true) => &[HoverPhase::Hovered],
            (true, false) => {
                self.hovered = false;
                &[HoverPhase::Exited]
            }
            (false, false) => &[],
        }
    }
}

pub(crate) struct Toggle<M> {
    pub(super) on: bool,
    pub(super) handler: Option<ToggleHandler<M>>,
}

/// How a node is positioned each time the scene is rendered.
pub(crate) enum Layout {
    /// Put the given corner of the node at a position computed from the viewport size.
    Anchor { corner: Corner, position: AnchorFn },

    /// Put the node's top left corner at the bottom left corner of another node.
    Below(NodeId),

    /// Put the node's top left corner at the top right corner of another node.
    RightOf(NodeId),
}

impl Layout {
    pub(crate) fn anchor<F>(corner: Corner, position: F) -> Self
    where
        F: Fn((u32, u32)) -> Position + 'static,
    {
        Self::Anchor {
            corner,
            position: Box::new(position),
        }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Anchor { corner, .. } => f.debug_struct("Anchor").field("corner", corner).finish(),
            Layout::Below(id) => f.debug_tuple("Below").field(id).finish(),
            Layout::RightOf(id) => f.debug_tuple("RightOf").field(id).finish(),
        }
    }
}

/// Hides a node once a time-to-live has passed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Expiry {
    remaining: Duration,
}

impl Expiry {
    pub(crate) fn new(time_to_live: Duration) -> Self {
        Self {
            remaining: time_to_live,
        }
    }

    /// Returns true once the time-to-live has fully elapsed.
    pub(super) fn tick(&mut self, elapsed: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining == Duration::ZERO
    }
}
