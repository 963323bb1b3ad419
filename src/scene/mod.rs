// SPDX-License-Identifier: GPL-3.0-or-later
//! A retained tree of positioned surfaces with pointer event dispatch.
//!
//! Nodes are stored in an arena owned by the [`Scene`] and referred to by [`NodeId`]. Instead of
//! a type per widget, every node can carry any combination of behaviors: hover and click
//! handlers, a toggle, text, a layout rule and an expiry. Handlers never touch application state
//! directly; they return messages which are collected and handed back to the caller of
//! [`Scene::handle_event`].
use std::fmt;
use std::time::Duration;

use image::RgbaImage;
use tracing::trace;

use crate::render::blit;
use crate::render::color::Color;
use crate::render::font::FontRenderer;

pub(crate) mod behavior;
pub(crate) mod event;
pub(crate) mod rect;
pub(crate) mod text;

use behavior::{Expiry, Hover, HoverPhase, Layout, Toggle};
use event::{Event, MouseButton, Position};
use rect::{Corner, Rect};
use text::Text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

struct Node<M> {
    rect: Rect,
    surface: RgbaImage,
    visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hover: Option<Hover<M>>,
    click: Option<behavior::ClickHandler<M>>,
    toggle: Option<Toggle<M>>,
    text: Option<Text>,
    layout: Option<Layout>,
    expiry: Option<Expiry>,
}

impl<M> Node<M> {
    fn new(surface: RgbaImage) -> Self {
        Self {
            rect: Rect::new(0, 0, surface.width(), surface.height()),
            surface,
            visible: true,
            parent: None,
            children: Vec::new(),
            hover: None,
            click: None,
            toggle: None,
            text: None,
            layout: None,
            expiry: None,
        }
    }

    fn with_text(font: &dyn FontRenderer, content: &str) -> Self {
        let mut node = Self::new(RgbaImage::new(0, 0));
        node.text = Some(Text::new(content));
        node.layout_text(font);
        node
    }

    /// Resize the node to fit its text and repaint it.
    ///
    /// The surface is only reallocated when it is too small; the rectangle always matches the
    /// text.
    fn layout_text(&mut self, font: &dyn FontRenderer) {
        if let Some(text) = &self.text {
            let (width, height) = text.required_size(font);
            if self.surface.width() < width || self.surface.height() < height {
                self.surface = RgbaImage::new(width, height);
            }
            self.rect.width = width;
            self.rect.height = height;
            text.paint(font, &mut self.surface);
        }
    }
}

pub(crate) struct Scene<M> {
    nodes: Vec<Option<Node<M>>>,
    roots: Vec<NodeId>,
    font: Box<dyn FontRenderer>,
}

impl<M> Scene<M> {
    pub(crate) fn new(font: Box<dyn FontRenderer>) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            font,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node<M>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<M>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn insert(&mut self, parent: Option<NodeId>, mut node: Node<M>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|parent| self.contains(*parent));
        node.parent = parent;
        self.nodes.push(Some(node));
        match parent.and_then(|parent| self.node_mut(parent)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Add a node showing an image. Its size is the size of the image.
    pub(crate) fn add_node(&mut self, parent: Option<NodeId>, surface: RgbaImage) -> NodeId {
        self.insert(parent, Node::new(surface))
    }

    /// Add a node showing text, resized to fit whenever the text changes.
    pub(crate) fn add_label(&mut self, parent: Option<NodeId>, content: &str) -> NodeId {
        let node = Node::with_text(self.font.as_ref(), content);
        self.insert(parent, node)
    }

    /// Add a label that is underlined while hovered and calls `on_click` when clicked.
    pub(crate) fn add_button<F>(
        &mut self,
        parent: Option<NodeId>,
        content: &str,
        on_click: F,
    ) -> NodeId
    where
        F: Fn(MouseButton, Position) -> Option<M> + 'static,
    {
        let mut node = Node::with_text(self.font.as_ref(), content);
        node.hover = Some(Hover::new(true, None));
        node.click = Some(Box::new(on_click));
        self.insert(parent, node)
    }

    /// Add a button that flips between on and off when left clicked. The text is bold while on.
    pub(crate) fn add_toggle<F>(
        &mut self,
        parent: Option<NodeId>,
        content: &str,
        on: bool,
        on_toggle: F,
    ) -> NodeId
    where
        F: Fn(bool) -> Option<M> + 'static,
    {
        let mut node = Node::new(RgbaImage::new(0, 0));
        let mut text = Text::new(content);
        text.bold = on;
        node.text = Some(text);
        node.layout_text(self.font.as_ref());
        node.hover = Some(Hover::new(true, None));
        node.toggle = Some(Toggle {
            on,
            handler: Some(Box::new(on_toggle)),
        });
        self.insert(parent, node)
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Remove a node and every node below it.
    pub(crate) fn remove(&mut self, id: NodeId) {
        let parent = match self.node(id) {
            Some(node) => node.parent,
            None => return,
        };
        match parent.and_then(|parent| self.node_mut(parent)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
        trace!(?id, "removed node");
    }

    #[cfg(test)]
    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn rect(&self, id: NodeId) -> Option<Rect> {
        self.node(id).map(|node| node.rect)
    }

    #[cfg(test)]
    pub(crate) fn surface(&self, id: NodeId) -> Option<&RgbaImage> {
        self.node(id).map(|node| &node.surface)
    }

    /// Replace a node's surface, resizing the node to match.
    pub(crate) fn set_surface(&mut self, id: NodeId, surface: RgbaImage) {
        if let Some(node) = self.node_mut(id) {
            node.rect.width = surface.width();
            node.rect.height = surface.height();
            node.surface = surface;
        }
    }

    #[cfg(test)]
    pub(crate) fn set_position(&mut self, id: NodeId, position: Position) {
        if let Some(node) = self.node_mut(id) {
            node.rect.set_corner(Corner::TopLeft, position);
        }
    }

    pub(crate) fn set_layout(&mut self, id: NodeId, layout: Layout) {
        if let Some(node) = self.node_mut(id) {
            node.layout = Some(layout);
        }
    }

    pub(crate) fn set_hover_handler<F>(&mut self, id: NodeId, handler: F)
    where
        F: Fn(HoverPhase, Position) -> Option<M> + 'static,
    {
        if let Some(node) = self.node_mut(id) {
            let underline = node.hover.as_ref().map_or(false, |hover| hover.underline);
            node.hover = Some(Hover::new(underline, Some(Box::new(handler))));
        }
    }

    pub(crate) fn set_click_handler<F>(&mut self, id: NodeId, handler: F)
    where
        F: Fn(MouseButton, Position) -> Option<M> + 'static,
    {
        if let Some(node) = self.node_mut(id) {
            node.click = Some(Box::new(handler));
        }
    }

    #[cfg(test)]
    pub(crate) fn is_hovered(&self, id: NodeId) -> bool {
        self.node(id)
            .and_then(|node| node.hover.as_ref())
            .map_or(false, Hover::is_hovered)
    }

    #[cfg(test)]
    pub(crate) fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .and_then(|node| node.text.as_ref())
            .map(|text| text.content.as_str())
    }

    /// Replace a node's text. The node is repainted even when the text is unchanged.
    pub(crate) fn set_text(&mut self, id: NodeId, content: &str) {
        let font = self.font.as_ref();
        if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            match node.text.as_mut() {
                Some(text) => {
                    text.content.clear();
                    text.content.push_str(content);
                }
                None => node.text = Some(Text::new(content)),
            }
            node.layout_text(font);
        }
    }

    pub(crate) fn set_text_color(&mut self, id: NodeId, color: Color) {
        let font = self.font.as_ref();
        if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            if let Some(text) = node.text.as_mut() {
                if text.color != color {
                    text.color = color;
                    node.layout_text(font);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).map_or(false, |node| node.visible)
    }

    /// Show or hide a node and everything below it. Hidden nodes are neither drawn nor sent
    /// events.
    pub(crate) fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
            node.expiry = None;
        }
    }

    /// Show a node, then hide it again after `time_to_live` worth of ticks.
    pub(crate) fn show_for(&mut self, id: NodeId, time_to_live: Duration) {
        if let Some(node) = self.node_mut(id) {
            node.visible = true;
            node.expiry = Some(Expiry::new(time_to_live));
        }
    }

    #[cfg(test)]
    pub(crate) fn is_toggled(&self, id: NodeId) -> bool {
        self.node(id)
            .and_then(|node| node.toggle.as_ref())
            .map_or(false, |toggle| toggle.on)
    }

    /// Set the state of a toggle, returning the toggle handler's message if the state changed.
    pub(crate) fn set_toggle(&mut self, id: NodeId, on: bool) -> Option<M> {
        let font = self.font.as_ref();
        let node = self.nodes.get_mut(id.0).and_then(Option::as_mut)?;
        flip_toggle(font, node, Some(on))
    }

    /// Node IDs of every visible node, parents before their children, siblings in the order they
    /// were added.
    fn traversal(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut pending: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            if let Some(node) = self.node(id).filter(|node| node.visible) {
                order.push(id);
                pending.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn resolve_layout(&mut self, id: NodeId, viewport: (u32, u32)) {
        let placement = match self.node(id).and_then(|node| node.layout.as_ref()) {
            None => None,
            Some(Layout::Anchor { corner, position }) => Some((*corner, position(viewport))),
            Some(Layout::Below(other)) => self
                .rect(*other)
                .map(|rect| (Corner::TopLeft, rect.corner(Corner::BottomLeft))),
            Some(Layout::RightOf(other)) => self
                .rect(*other)
                .map(|rect| (Corner::TopLeft, rect.corner(Corner::TopRight))),
        };
        if let (Some((corner, position)), Some(node)) = (placement, self.node_mut(id)) {
            node.rect.set_corner(corner, position);
        }
    }

    /// Lay out and draw every visible node onto `target`, back to front.
    pub(crate) fn render(&mut self, target: &mut RgbaImage) {
        let viewport = target.dimensions();
        for id in self.traversal() {
            self.resolve_layout(id, viewport);
            if let Some(node) = self.node(id) {
                blit(target, &node.surface, node.rect.top_left(), node.rect.size());
            }
        }
    }

    /// Deliver an event to every visible node, returning the messages from any handlers that
    /// fired.
    pub(crate) fn handle_event(&mut self, event: &Event) -> Vec<M> {
        let mut messages = Vec::new();
        let order = self.traversal();
        let font = self.font.as_ref();
        for id in order {
            let node = match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
                Some(node) => node,
                None => continue,
            };
            match *event {
                Event::PointerMoved(position) => {
                    let inside = node.rect.contains(position);
                    let local = node.rect.local(position);
                    let mut underline = None;
                    if let Some(hover) = node.hover.as_mut() {
                        for phase in hover.update(inside) {
                            match phase {
                                HoverPhase::Entered if hover.underline => underline = Some(true),
                                HoverPhase::Exited if hover.underline => underline = Some(false),
                                _ => (),
                            }
                            if let Some(handler) = &hover.handler {
                                messages.extend(handler(*phase, local));
                            }
                        }
                    }
                    if let (Some(underline), Some(text)) = (underline, node.text.as_mut()) {
                        text.underline = underline;
                        node.layout_text(font);
                    }
                }
                Event::ButtonReleased { position, button } if node.rect.contains(position) => {
                    let local = node.rect.local(position);
                    if button == MouseButton::Left {
                        messages.extend(flip_toggle(font, node, None));
                    }
                    if let Some(handler) = &node.click {
                        messages.extend(handler(button, local));
                    }
                }
                _ => (),
            }
        }
        messages
    }

    /// Advance every node's timers by `elapsed`.
    pub(crate) fn tick(&mut self, elapsed: Duration) {
        for node in self.nodes.iter_mut().flatten() {
            if let Some(expiry) = node.expiry.as_mut() {
                if expiry.tick(elapsed) {
                    node.visible = false;
                    node.expiry = None;
                }
            }
        }
    }
}

impl<M> fmt::Debug for Scene<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.iter().flatten().count())
            .field("roots", &self.roots)
            .field("font", &self.font)
            .finish()
    }
}

/// Set (or flip, when `on` is `None`) a node's toggle and restyle its text.
fn flip_toggle<M>(font: &dyn FontRenderer, node: &mut Node<M>, on: Option<bool>) -> Option<M> {
    let toggle = node.toggle.as_mut()?;
    let on = on.unwrap_or(!toggle.on);
    if toggle.on == on {
        return None;
    }
    toggle.on = on;
    let message = toggle.handler.as_ref().and_then(|handler| handler(on));
    if let Some(text) = node.text.as_mut() {
        text.bold = on;
        node.layout_text(font);
    }
    message
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use image::{Rgba, RgbaImage};

    use crate::render::font::BoxRenderer;

    use super::behavior::{HoverPhase, Layout};
    use super::event::{Event, MouseButton, Position};
    use super::rect::{Corner, Rect};
    use super::Scene;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Message {
        Hover(HoverPhase, Position),
        Click(MouseButton, Position),
        Toggled(bool),
    }

    fn scene() -> Scene<Message> {
        Scene::new(Box::new(BoxRenderer::new(8, 16)))
    }

    fn block(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn release(position: Position, button: MouseButton) -> Event {
        Event::ButtonReleased { position, button }
    }

    #[test]
    fn hover_counts_per_crossing() {
        let mut scene = scene();
        let id = scene.add_node(None, block(10, 10, 0));
        scene.set_position(id, (10, 10));
        scene.set_hover_handler(id, |phase, local| Some(Message::Hover(phase, local)));
        let path = [
            (0, 0),
            (12, 12),
            (15, 15),
            (25, 15),
            (30, 30),
            (19, 19),
            (5, 5),
            (10, 10),
            (11, 11),
        ];
        let messages: Vec<Message> = path
            .iter()
            .flat_map(|position| scene.handle_event(&Event::PointerMoved(*position)))
            .collect();
        let count = |wanted: HoverPhase| {
            messages
                .iter()
                .filter(|m| matches!(m, Message::Hover(phase, _) if *phase == wanted))
                .count()
        };
        // Three entries, and the path ends inside the node.
        assert_eq!(count(HoverPhase::Entered), 3);
        assert_eq!(count(HoverPhase::Exited), 2);
        assert_eq!(count(HoverPhase::Hovered), 5);
        assert_eq!(messages[0], Message::Hover(HoverPhase::Entered, (2, 2)));
        assert!(scene.is_hovered(id));
    }

    #[test]
    fn click_on_release_only() {
        let mut scene = scene();
        let id = scene.add_node(None, block(10, 10, 0));
        scene.set_position(id, (5, 5));
        scene.set_click_handler(id, |button, local| Some(Message::Click(button, local)));
        let press = Event::ButtonPressed {
            position: (7, 8),
            button: MouseButton::Left,
        };
        assert!(scene.handle_event(&press).is_empty());
        assert_eq!(
            scene.handle_event(&release((7, 8), MouseButton::Right)),
            vec![Message::Click(MouseButton::Right, (2, 3))]
        );
        assert!(scene
            .handle_event(&release((15, 8), MouseButton::Left))
            .is_empty());
    }

    #[test]
    fn anchor_follows_viewport() {
        let mut scene = scene();
        let id = scene.add_node(None, block(10, 4, 200));
        scene.set_layout(
            id,
            Layout::anchor(Corner::BottomRight, |(width, height)| {
                (width as i32, height as i32)
            }),
        );
        let mut small = RgbaImage::new(100, 50);
        scene.render(&mut small);
        assert_eq!(scene.rect(id), Some(Rect::new(90, 46, 10, 4)));
        assert_eq!(small[(99, 49)], Rgba([200, 200, 200, 255]));
        let mut large = RgbaImage::new(200, 80);
        scene.render(&mut large);
        assert_eq!(scene.rect(id), Some(Rect::new(190, 76, 10, 4)));
    }

    #[test]
    fn relative_layouts() {
        let mut scene = scene();
        let first = scene.add_node(None, block(10, 4, 0));
        let below = scene.add_node(None, block(3, 3, 0));
        let right = scene.add_node(None, block(3, 3, 0));
        scene.set_position(first, (2, 3));
        scene.set_layout(below, Layout::Below(first));
        scene.set_layout(right, Layout::RightOf(first));
        scene.render(&mut RgbaImage::new(20, 20));
        assert_eq!(scene.rect(below).map(|r| r.top_left()), Some((2, 7)));
        assert_eq!(scene.rect(right).map(|r| r.top_left()), Some((12, 3)));
    }

    #[test]
    fn later_nodes_draw_over_earlier() {
        let mut scene = scene();
        let parent = scene.add_node(None, block(4, 4, 10));
        scene.add_node(Some(parent), block(2, 2, 20));
        scene.add_node(None, block(1, 1, 30));
        let mut target = RgbaImage::new(4, 4);
        scene.render(&mut target);
        assert_eq!(target[(0, 0)], Rgba([30, 30, 30, 255]));
        assert_eq!(target[(1, 1)], Rgba([20, 20, 20, 255]));
        assert_eq!(target[(3, 3)], Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn label_resizes() {
        let mut scene = scene();
        let id = scene.add_label(None, "abc\nde");
        assert_eq!(scene.rect(id).map(|r| r.size()), Some((24, 33)));
        scene.set_text(id, "a");
        assert_eq!(scene.rect(id).map(|r| r.size()), Some((8, 17)));
        // Shrinking doesn't reallocate the surface
        assert_eq!(scene.surface(id).map(|s| s.dimensions()), Some((24, 33)));
        scene.set_text(id, "abcdef");
        assert_eq!(scene.surface(id).map(|s| s.dimensions()), Some((48, 17)));
        assert_eq!(scene.text(id), Some("abcdef"));
    }

    #[test]
    fn identical_text_repaints() {
        let mut scene = scene();
        let id = scene.add_label(None, "ab");
        scene.set_surface(id, block(40, 40, 255));
        scene.set_text(id, "ab");
        let surface = scene.surface(id).unwrap();
        assert_eq!(surface.dimensions(), (40, 40));
        assert_eq!(surface[(39, 39)], Rgba([0, 0, 0, 0]));
        assert_eq!(scene.rect(id).map(|r| r.size()), Some((16, 17)));
    }

    #[test]
    fn button_underlines_while_hovered() {
        let mut scene = scene();
        let id = scene.add_button(None, "ab", |button, _| Some(Message::Click(button, (0, 0))));
        let underlined = |scene: &Scene<Message>| scene.surface(id).unwrap()[(0, 16)][3] != 0;
        assert!(!underlined(&scene));
        scene.handle_event(&Event::PointerMoved((3, 3)));
        assert!(underlined(&scene));
        scene.handle_event(&Event::PointerMoved((30, 30)));
        assert!(!underlined(&scene));
    }

    #[test]
    fn toggle() {
        let mut scene = scene();
        let id = scene.add_toggle(None, "Play", false, |on| Some(Message::Toggled(on)));
        let width = |scene: &Scene<Message>| scene.rect(id).unwrap().width;
        assert_eq!(width(&scene), 32);
        assert_eq!(
            scene.handle_event(&release((1, 1), MouseButton::Left)),
            vec![Message::Toggled(true)]
        );
        assert!(scene.is_toggled(id));
        // Bold text is one pixel wider
        assert_eq!(width(&scene), 33);
        assert!(scene
            .handle_event(&release((1, 1), MouseButton::Right))
            .is_empty());
        assert!(scene.is_toggled(id));
        assert_eq!(scene.set_toggle(id, true), None);
        assert_eq!(scene.set_toggle(id, false), Some(Message::Toggled(false)));
        assert_eq!(width(&scene), 32);
    }

    #[test]
    fn remove_subtree() {
        let mut scene = scene();
        let parent = scene.add_node(None, block(5, 5, 0));
        let child = scene.add_node(Some(parent), block(5, 5, 0));
        let other = scene.add_node(None, block(5, 5, 0));
        scene.set_click_handler(child, |button, local| Some(Message::Click(button, local)));
        scene.remove(parent);
        assert!(!scene.contains(parent));
        assert!(!scene.contains(child));
        assert!(scene.contains(other));
        assert!(scene
            .handle_event(&release((1, 1), MouseButton::Left))
            .is_empty());
        // Removing twice is harmless
        scene.remove(parent);
        assert!(scene.children(parent).is_empty());
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let mut scene = scene();
        let id = scene.add_node(None, block(5, 5, 90));
        scene.set_click_handler(id, |button, local| Some(Message::Click(button, local)));
        scene.set_visible(id, false);
        let mut target = RgbaImage::new(5, 5);
        scene.render(&mut target);
        assert_eq!(target[(0, 0)], Rgba([0, 0, 0, 0]));
        assert!(scene
            .handle_event(&release((1, 1), MouseButton::Left))
            .is_empty());
    }

    #[test]
    fn expiry_hides() {
        let mut scene = scene();
        let id = scene.add_label(None, "Error");
        scene.set_visible(id, false);
        scene.show_for(id, Duration::from_secs(5));
        assert!(scene.is_visible(id));
        scene.tick(Duration::from_secs(3));
        assert!(scene.is_visible(id));
        scene.tick(Duration::from_secs(2));
        assert!(!scene.is_visible(id));
    }
}
