// SPDX-License-Identifier: GPL-3.0-or-later
//! The colorized thermal image, with its caption, pickers and measurement point list.
use std::sync::Arc;

use image::RgbaImage;
use itertools::{Itertools, MinMaxResult};
use tracing::trace;

use crate::annotation::{Annotations, PointAction, PointId};
use crate::image_buffer::ThermalImage;
use crate::render::color::Color;
use crate::render::colorize::Colorizer;
use crate::scene::behavior::{HoverPhase, Layout};
use crate::scene::event::{MouseButton, Position};
use crate::scene::{NodeId, Scene};

use super::Message;

const CAPTION: &str = "Thermal";

const DISABLED_COLOR: Color = Color::new(0x80, 0x80, 0x80);

/// `[min - max]°C` for an image, or `[]` if it is empty.
pub(crate) fn range_text(image: &ThermalImage) -> String {
    match image.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => "[]".to_string(),
        MinMaxResult::OneElement(value) => format!("[{:.2} - {:.2}]°C", value, value),
        MinMaxResult::MinMax(min, max) => format!("[{:.2} - {:.2}]°C", min, max),
    }
}

fn picker_text(kind: &str, name: &str) -> String {
    format!("{}: {}", kind, name)
}

#[derive(Debug)]
pub(crate) struct ThermalDisplay {
    image: NodeId,
    caption: NodeId,
    range: NodeId,
    palette_picker: NodeId,
    scale_picker: NodeId,
    point_labels: Vec<(PointId, NodeId)>,
    colorizer: Colorizer,
    annotations: Annotations,
    thermal: Arc<ThermalImage>,
}

impl ThermalDisplay {
    /// Create the thermal image nodes, placing the image to the right of `left_of`.
    pub(crate) fn new(
        scene: &mut Scene<Message>,
        left_of: Option<NodeId>,
        colorizer: Colorizer,
        annotations: Annotations,
    ) -> Self {
        let image = scene.add_node(None, RgbaImage::new(0, 0));
        if let Some(left) = left_of {
            scene.set_layout(image, Layout::RightOf(left));
        }
        scene.set_hover_handler(image, |phase, position| {
            Some(Message::ImageHover(phase, position))
        });
        scene.set_click_handler(image, |button, position| {
            Some(Message::ImageClicked(button, position))
        });
        let caption = scene.add_label(None, CAPTION);
        scene.set_layout(caption, Layout::Below(image));
        let range = scene.add_label(None, "[]");
        scene.set_layout(range, Layout::Below(caption));
        let palette_picker = scene.add_button(
            None,
            &picker_text("Palette", colorizer.palette().name()),
            |button, _| palette_step(button).map(Message::PaletteStep),
        );
        scene.set_layout(palette_picker, Layout::Below(range));
        let scale_picker = scene.add_button(
            None,
            &picker_text("Scale", colorizer.scale().name()),
            |button, _| palette_step(button).map(Message::ScaleStep),
        );
        scene.set_layout(scale_picker, Layout::Below(palette_picker));
        Self {
            image,
            caption,
            range,
            palette_picker,
            scale_picker,
            point_labels: Vec::new(),
            colorizer,
            annotations,
            thermal: Arc::new(ThermalImage::new(0, 0)),
        }
    }

    #[cfg(test)]
    pub(crate) fn image_node(&self) -> NodeId {
        self.image
    }

    #[cfg(test)]
    pub(crate) fn caption_node(&self) -> NodeId {
        self.caption
    }

    #[cfg(test)]
    pub(crate) fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    #[cfg(test)]
    pub(crate) fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    #[cfg(test)]
    /// The label listing a measurement point, if it has one.
    pub(crate) fn point_label(&self, id: PointId) -> Option<NodeId> {
        self.point_labels
            .iter()
            .find(|(point, _)| *point == id)
            .map(|(_, node)| *node)
    }

    /// Show a new thermal image.
    pub(crate) fn update(&mut self, scene: &mut Scene<Message>, thermal: Arc<ThermalImage>) {
        self.annotations.update_data(Arc::clone(&thermal));
        scene.set_text(self.range, &range_text(&thermal));
        self.thermal = thermal;
        self.sync_point_labels(scene);
        self.redraw(scene);
    }

    /// Colorize the current image and draw the point markers over it.
    fn redraw(&self, scene: &mut Scene<Message>) {
        let mut surface = self.colorizer.colorize(&self.thermal);
        self.annotations.draw(&mut surface);
        scene.set_surface(self.image, surface);
    }

    /// Make the point list match the current points, in order, below the scale picker.
    fn sync_point_labels(&mut self, scene: &mut Scene<Message>) {
        let annotations = &self.annotations;
        self.point_labels.retain(|(id, node)| {
            let keep = annotations.get(*id).is_some();
            if !keep {
                scene.remove(*node);
            }
            keep
        });
        let mut above = self.scale_picker;
        let mut labels = Vec::with_capacity(annotations.points().len());
        for point in annotations.points() {
            let id = point.id();
            let node = match self.point_labels.iter().find(|(existing, _)| *existing == id) {
                Some((_, node)) => *node,
                None => scene.add_button(None, point.label(), move |button, _| {
                    Some(Message::PointClicked(id, button))
                }),
            };
            scene.set_text(node, point.label());
            let color = if point.is_enabled() {
                annotations.color_of(point)
            } else {
                DISABLED_COLOR
            };
            scene.set_text_color(node, color);
            scene.set_layout(node, Layout::Below(above));
            labels.push((id, node));
            above = node;
        }
        self.point_labels = labels;
    }

    /// Show the temperature under the pointer in the caption.
    pub(crate) fn hover(&mut self, scene: &mut Scene<Message>, phase: HoverPhase, position: Position) {
        let caption = match phase {
            HoverPhase::Exited => None,
            HoverPhase::Entered | HoverPhase::Hovered => self
                .annotations
                .temperature_at(position)
                .map(|value| format!("{}\n{:.2}°C", CAPTION, value)),
        };
        scene.set_text(self.caption, caption.as_deref().unwrap_or(CAPTION));
    }

    pub(crate) fn click_image(
        &mut self,
        scene: &mut Scene<Message>,
        button: MouseButton,
        position: Position,
    ) -> PointAction {
        let action = self.annotations.click_image(button, position);
        self.apply(scene, action);
        action
    }

    pub(crate) fn click_point(
        &mut self,
        scene: &mut Scene<Message>,
        id: PointId,
        button: MouseButton,
    ) -> PointAction {
        let action = self.annotations.click_point(id, button);
        self.apply(scene, action);
        action
    }

    fn apply(&mut self, scene: &mut Scene<Message>, action: PointAction) {
        if action != PointAction::Ignored {
            trace!(?action, "measurement points changed");
            self.sync_point_labels(scene);
            self.redraw(scene);
        }
    }

    pub(crate) fn step_palette(&mut self, scene: &mut Scene<Message>, delta: i32) {
        let name = self.colorizer.step_palette(delta).name().to_string();
        scene.set_text(self.palette_picker, &picker_text("Palette", &name));
        self.redraw(scene);
    }

    pub(crate) fn step_scale(&mut self, scene: &mut Scene<Message>, delta: i32) {
        let name = self.colorizer.step_scale(delta).name();
        scene.set_text(self.scale_picker, &picker_text("Scale", name));
        self.redraw(scene);
    }
}

/// Left clicks and the wheel step pickers forwards or backwards.
fn palette_step(button: MouseButton) -> Option<i32> {
    match button.step() {
        0 => None,
        step => Some(step),
    }
}
