// SPDX-License-Identifier: GPL-3.0-or-later
use std::str::FromStr;

use num_traits::Num;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Point<T: Num> {
    pub x: T,
    pub y: T,
}

impl<T: Num> Point<T> {
    pub(crate) fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<u32> {
    /// The point at a row-major pixel index.
    pub(crate) fn from_pixel_number(pixel_number: usize, image_width: u32) -> Self {
        let width = image_width.max(1) as usize;
        Self::new((pixel_number % width) as u32, (pixel_number / width) as u32)
    }

    /// Move the point inside an image of the given size.
    pub(crate) fn clamp_to(&self, (width, height): (u32, u32)) -> Self {
        Self::new(
            self.x.min(width.saturating_sub(1)),
            self.y.min(height.saturating_sub(1)),
        )
    }
}

impl Point<i32> {
    pub(crate) fn squared_distance(&self, other: Self) -> i32 {
        (self.x - other.x).pow(2) + (self.y - other.y).pow(2)
    }
}

impl From<Point<u32>> for Point<i32> {
    fn from(point: Point<u32>) -> Self {
        Self::new(point.x as i32, point.y as i32)
    }
}

/// Parses `"x,y"`, as given on the command line.
impl FromStr for Point<u32> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("\"{}\" is not a point, expected x,y", s);
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        Ok(Self::new(
            x.trim().parse().map_err(|_| invalid())?,
            y.trim().parse().map_err(|_| invalid())?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::Point;

    #[test]
    fn pixel_numbers() {
        let point = Point::from_pixel_number(23, 10);
        assert_eq!(point, Point::new(3, 2));
    }

    #[test]
    fn clamp() {
        assert_eq!(Point::new(15u32, 3).clamp_to((10, 10)), Point::new(9, 3));
        assert_eq!(Point::new(5u32, 30).clamp_to((10, 10)), Point::new(5, 9));
        assert_eq!(Point::new(5u32, 5).clamp_to((0, 0)), Point::new(0, 0));
    }

    #[test]
    fn parse() {
        assert_eq!("12,7".parse::<Point<u32>>(), Ok(Point::new(12, 7)));
        assert_eq!(" 3, 4".parse::<Point<u32>>(), Ok(Point::new(3, 4)));
        assert!("3".parse::<Point<u32>>().is_err());
        assert!("-1,4".parse::<Point<u32>>().is_err());
    }

    #[test]
    fn distance() {
        assert_eq!(Point::new(1, 1).squared_distance(Point::new(4, 5)), 25);
    }
}
