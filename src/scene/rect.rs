// SPDX-License-Identifier: GPL-3.0-or-later
use super::event::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// An axis-aligned rectangle. The right and bottom edges are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Rect {
    pub(crate) const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub(crate) fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub(crate) fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub(crate) fn top_left(&self) -> Position {
        (self.x, self.y)
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn corner(&self, corner: Corner) -> Position {
        match corner {
            Corner::TopLeft => (self.x, self.y),
            Corner::TopRight => (self.right(), self.y),
            Corner::BottomLeft => (self.x, self.bottom()),
            Corner::BottomRight => (self.right(), self.bottom()),
        }
    }

    /// Move the rectangle so that the given corner is at `position`, keeping its size.
    pub(crate) fn set_corner(&mut self, corner: Corner, position: Position) {
        let (x, y) = position;
        let (width, height) = (self.width as i32, self.height as i32);
        let (x, y) = match corner {
            Corner::TopLeft => (x, y),
            Corner::TopRight => (x - width, y),
            Corner::BottomLeft => (x, y - height),
            Corner::BottomRight => (x - width, y - height),
        };
        self.x = x;
        self.y = y;
    }

    pub(crate) fn contains(&self, (x, y): Position) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Convert window coordinates to coordinates relative to the top left corner.
    pub(crate) fn local(&self, (x, y): Position) -> Position {
        (x - self.x, y - self.y)
    }
}

#[cfg(test)]
mod test {
    use super::{Corner, Rect};

    #[test]
    fn contains_excludes_far_edges() {
        let rect = Rect::new(10, 20, 5, 5);
        assert!(rect.contains((10, 20)));
        assert!(rect.contains((14, 24)));
        assert!(!rect.contains((15, 24)));
        assert!(!rect.contains((14, 25)));
        assert!(!rect.contains((9, 20)));
        assert!(!Rect::new(0, 0, 0, 0).contains((0, 0)));
    }

    #[test]
    fn corners() {
        let mut rect = Rect::new(0, 0, 30, 10);
        rect.set_corner(Corner::BottomRight, (100, 50));
        assert_eq!(rect.top_left(), (70, 40));
        assert_eq!(rect.corner(Corner::BottomRight), (100, 50));
        rect.set_corner(Corner::BottomLeft, (0, 50));
        assert_eq!(rect.top_left(), (0, 40));
        rect.set_corner(Corner::TopRight, (30, 0));
        assert_eq!(rect.top_left(), (0, 0));
        assert_eq!(rect.corner(Corner::TopRight), (30, 0));
    }

    #[test]
    fn local_coordinates() {
        let rect = Rect::new(-5, 7, 10, 10);
        assert_eq!(rect.local((0, 7)), (5, 0));
        assert_eq!(rect.local((-6, 0)), (-1, -7));
    }
}
