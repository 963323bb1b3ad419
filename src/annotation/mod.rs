// SPDX-License-Identifier: GPL-3.0-or-later
//! Measurement points placed over a thermal image.
//!
//! There are always two system owned points, at the coldest and hottest pixels of the current
//! image. Users can add more points by clicking on the image, and remove them again with a right
//! click.
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use imageproc::drawing::draw_filled_circle_mut;
use itertools::{Itertools, MinMaxResult};
use tracing::{debug, trace};

use crate::image_buffer::ThermalImage;
use crate::render::color::Color;
use crate::scene::event::{MouseButton, Position};

mod point;

pub(crate) use point::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PointId(u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) const MIN_POINT: PointId = PointId(0);
pub(crate) const MAX_POINT: PointId = PointId(1);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MeasurementPoint {
    id: PointId,
    position: Point<u32>,
    name: String,
    color_index: usize,
    enabled: bool,
    deletable: bool,
    label: String,
}

impl MeasurementPoint {
    fn new(
        id: PointId,
        name: &str,
        position: Point<u32>,
        color_index: usize,
        deletable: bool,
    ) -> Self {
        Self {
            id,
            position,
            name: name.to_string(),
            color_index,
            enabled: true,
            deletable,
            label: String::new(),
        }
    }

    pub(crate) fn id(&self) -> PointId {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Point<u32> {
        self.position
    }

    #[cfg(test)]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn color_index(&self) -> usize {
        self.color_index
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub(crate) fn is_deletable(&self) -> bool {
        self.deletable
    }

    /// `name (x, y) = value°C`, recomputed whenever the image or the point changes.
    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

/// What happened in response to a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointAction {
    Created(PointId),
    Deleted(PointId),
    Recolored(PointId),
    Toggled(PointId),
    Ignored,
}

/// The number of characters needed for any coordinate along a dimension.
fn coordinate_width(dimension: u32) -> usize {
    dimension.saturating_sub(1).to_string().len()
}

#[derive(Clone, Debug)]
pub(crate) struct Annotations {
    points: Vec<MeasurementPoint>,
    colors: Vec<Color>,
    marker_radius: u32,
    next_id: u32,
    next_name: u32,
    next_color: usize,
    image: Arc<ThermalImage>,
}

impl Annotations {
    pub(crate) fn new(colors: Vec<Color>, marker_radius: u32) -> Self {
        let colors = if colors.is_empty() {
            vec![Color::WHITE]
        } else {
            colors
        };
        let points = vec![
            MeasurementPoint::new(MIN_POINT, "Min", Point::new(0, 0), 0, false),
            MeasurementPoint::new(MAX_POINT, "Max", Point::new(0, 0), 1 % colors.len(), false),
        ];
        Self {
            next_color: 2 % colors.len(),
            points,
            colors,
            marker_radius,
            next_id: MAX_POINT.0 + 1,
            next_name: 1,
            image: Arc::new(ThermalImage::new(0, 0)),
        }
    }

    pub(crate) fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub(crate) fn get(&self, id: PointId) -> Option<&MeasurementPoint> {
        self.points.iter().find(|point| point.id == id)
    }

    fn get_mut(&mut self, id: PointId) -> Option<&mut MeasurementPoint> {
        self.points.iter_mut().find(|point| point.id == id)
    }

    pub(crate) fn color_of(&self, point: &MeasurementPoint) -> Color {
        self.colors[point.color_index % self.colors.len()]
    }

    /// The temperature at a position relative to the top left of the image.
    pub(crate) fn temperature_at(&self, (x, y): Position) -> Option<f32> {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return None;
        }
        Some(self.image.get_pixel(x as u32, y as u32)[0])
    }

    fn relabel(&mut self, id: PointId) {
        let width = coordinate_width(self.image.width());
        let height = coordinate_width(self.image.height());
        let image = &self.image;
        if let Some(point) = self.points.iter_mut().find(|point| point.id == id) {
            let Point { x, y } = point.position;
            let value = if x < image.width() && y < image.height() {
                format!("{:.2}°C", image.get_pixel(x, y)[0])
            } else {
                "--".to_string()
            };
            point.label = format!(
                "{} ({:>width$}, {:>height$}) = {}",
                point.name,
                x,
                y,
                value,
                width = width,
                height = height
            );
        }
    }

    /// Move the min and max points to the coldest and hottest pixels of a new image, and
    /// recompute every label.
    ///
    /// User placed points are kept, moved inside the image if it is smaller than the last one.
    pub(crate) fn update_data(&mut self, image: Arc<ThermalImage>) {
        let width = image.width();
        let dimensions = image.dimensions();
        let (min, max) = match image.iter().position_minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(index) => (index, index),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        self.image = image;
        for point in self.points.iter_mut() {
            point.position = match point.id {
                MIN_POINT => Point::from_pixel_number(min, width),
                MAX_POINT => Point::from_pixel_number(max, width),
                _ => point.position.clamp_to(dimensions),
            }
        }
        let ids: Vec<PointId> = self.points.iter().map(|point| point.id).collect();
        ids.into_iter().for_each(|id| self.relabel(id));
        trace!(
            min = ?self.points[0].position,
            max = ?self.points[1].position,
            "updated measurement points"
        );
    }

    /// Add a deletable point with the next color, returning its ID.
    pub(crate) fn add_point(&mut self, position: Point<u32>) -> PointId {
        let id = PointId(self.next_id);
        self.next_id += 1;
        let name = format!("P{}", self.next_name);
        self.next_name += 1;
        let color_index = self.next_color;
        self.next_color = (self.next_color + 1) % self.colors.len();
        let point = MeasurementPoint::new(id, &name, position, color_index, true);
        self.points.push(point);
        self.relabel(id);
        debug!(%id, ?position, "added measurement point");
        id
    }

    /// The enabled point with a marker under the given position, preferring the one drawn last.
    pub(crate) fn point_at(&self, position: Position) -> Option<PointId> {
        let position = Point::new(position.0, position.1);
        let radius = self.marker_radius as i32;
        self.points
            .iter()
            .rev()
            .filter(|point| point.enabled)
            .find(|point| {
                Point::<i32>::from(point.position).squared_distance(position) <= radius * radius
            })
            .map(|point| point.id)
    }

    /// Handle a button released over the image at a position relative to its top left corner.
    ///
    /// Clicks on a marker act on that point, and a left click anywhere else adds a new point.
    pub(crate) fn click_image(&mut self, button: MouseButton, position: Position) -> PointAction {
        if let Some(id) = self.point_at(position) {
            return self.click_point(id, button);
        }
        let wheel = matches!(button, MouseButton::WheelUp | MouseButton::WheelDown);
        if !wheel && self.temperature_at(position).is_some() {
            let (x, y) = position;
            PointAction::Created(self.add_point(Point::new(x as u32, y as u32)))
        } else {
            PointAction::Ignored
        }
    }

    /// Handle a button released over a point's marker or label.
    ///
    /// Right clicks delete deletable points, the wheel cycles through the marker colors and left
    /// clicks show or hide the marker.
    pub(crate) fn click_point(&mut self, id: PointId, button: MouseButton) -> PointAction {
        let color_count = self.colors.len() as i64;
        let point = match self.get_mut(id) {
            Some(point) => point,
            None => return PointAction::Ignored,
        };
        match button {
            MouseButton::Right if point.deletable => {
                self.points.retain(|point| point.id != id);
                debug!(%id, "deleted measurement point");
                PointAction::Deleted(id)
            }
            MouseButton::WheelUp | MouseButton::WheelDown => {
                let stepped = point.color_index as i64 + button.step() as i64;
                point.color_index = stepped.rem_euclid(color_count) as usize;
                PointAction::Recolored(id)
            }
            MouseButton::Left => {
                point.enabled = !point.enabled;
                PointAction::Toggled(id)
            }
            _ => PointAction::Ignored,
        }
    }

    /// Draw a marker for every enabled point, in list order.
    pub(crate) fn draw(&self, image: &mut RgbaImage) {
        let radius = self.marker_radius as i32;
        for point in self.points.iter().filter(|point| point.enabled) {
            let color = self.color_of(point);
            let center = (point.position.x as i32, point.position.y as i32);
            let outline = color.foreground_color().to_rgba();
            draw_filled_circle_mut(image, center, radius + 1, outline);
            draw_filled_circle_mut(image, center, radius, color.to_rgba());
        }
    }
}
