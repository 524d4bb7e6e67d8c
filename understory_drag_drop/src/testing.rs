// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document used by the unit tests.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::geometry::is_inside_rect;
use crate::host::{
    DragHost, GlobalListener, ListenerOptions, ListenerTarget, PreviewSpec, ScrollMetrics,
    ScrollTarget,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct El(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Element,
    Placeholder,
    Preview,
    Anchor,
}

#[derive(Clone, Debug)]
pub(crate) struct FakeNode {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<El>,
    pub(crate) children: Vec<El>,
    /// Layout box in document coordinates, or client coordinates for previews.
    pub(crate) rect: Rect,
    pub(crate) transform: String,
    pub(crate) scroll_snap: String,
    pub(crate) visible: bool,
    pub(crate) removed: bool,
    pub(crate) classes: Vec<String>,
    pub(crate) native_drag: bool,
    pub(crate) scroll: ScrollMetrics,
    pub(crate) shadow_root: Option<El>,
    pub(crate) preview_spec: Option<PreviewSpec>,
}

impl FakeNode {
    fn new(kind: NodeKind, rect: Rect) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            rect,
            transform: String::new(),
            scroll_snap: String::new(),
            visible: true,
            removed: false,
            classes: Vec::new(),
            native_drag: true,
            scroll: ScrollMetrics::default(),
            shadow_root: None,
            preview_spec: None,
        }
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug)]
pub(crate) struct FakeHost {
    nodes: Vec<FakeNode>,
    body: El,
    pub(crate) viewport_scroll: Vec2,
    pub(crate) viewport: Size,
    pub(crate) transition_duration: u64,
    listeners: Vec<(ListenerTarget<El>, GlobalListener, ListenerOptions)>,
    scroll_calls: Vec<(ScrollTarget<El>, Vec2)>,
    transform_writes: usize,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![FakeNode::new(
                NodeKind::Element,
                Rect::new(0.0, 0.0, 1000.0, 1000.0),
            )],
            body: El(0),
            viewport_scroll: Vec2::ZERO,
            viewport: Size::new(1000.0, 1000.0),
            transition_duration: 0,
            listeners: Vec::new(),
            scroll_calls: Vec::new(),
            transform_writes: 0,
        }
    }

    pub(crate) fn body_element(&self) -> El {
        self.body
    }

    /// Append a new element to `parent`.
    pub(crate) fn element(&mut self, parent: El, rect: Rect) -> El {
        let el = self.push(FakeNode::new(NodeKind::Element, rect));
        self.insert_before(parent, el, None);
        el
    }

    pub(crate) fn node(&self, el: El) -> &FakeNode {
        &self.nodes[el.0]
    }

    pub(crate) fn node_mut(&mut self, el: El) -> &mut FakeNode {
        &mut self.nodes[el.0]
    }

    pub(crate) fn nodes_of_kind(&self, kind: NodeKind) -> Vec<El> {
        (0..self.nodes.len())
            .map(El)
            .filter(|el| {
                let node = self.node(*el);
                node.kind == kind && !node.removed
            })
            .collect()
    }

    pub(crate) fn set_scroll_metrics(&mut self, el: El, metrics: ScrollMetrics) {
        self.nodes[el.0].scroll = metrics;
    }

    pub(crate) fn set_scroll_metrics_offset(&mut self, el: El, offset: Vec2) {
        let scroll = &mut self.nodes[el.0].scroll;
        scroll.scroll_left = offset.x;
        scroll.scroll_top = offset.y;
    }

    pub(crate) fn transform_writes(&self) -> usize {
        self.transform_writes
    }

    pub(crate) fn listener_count(&self, listener: GlobalListener) -> usize {
        self.listeners
            .iter()
            .filter(|(_, l, _)| *l == listener)
            .count()
    }

    pub(crate) fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn scroll_calls(&self) -> &[(ScrollTarget<El>, Vec2)] {
        &self.scroll_calls
    }

    fn push(&mut self, node: FakeNode) -> El {
        self.nodes.push(node);
        El(self.nodes.len() - 1)
    }

    fn detach(&mut self, el: El) {
        if let Some(parent) = self.nodes[el.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != el);
        }
    }

    fn is_rendered(&self, el: El) -> bool {
        let mut current = Some(el);
        while let Some(node) = current {
            let n = self.node(node);
            if n.removed || !n.visible {
                return false;
            }
            if node == self.body {
                return true;
            }
            current = n.parent;
        }
        false
    }

    /// Sum of the scroll offsets of every element above `el`.
    fn ancestor_scroll(&self, el: El) -> Vec2 {
        let mut offset = Vec2::ZERO;
        let mut current = self.node(el).parent;
        while let Some(parent) = current {
            offset += self.node(parent).scroll.offset();
            current = self.node(parent).parent;
        }
        offset
    }
}

impl DragHost for FakeHost {
    type Element = El;

    fn client_rect(&self, element: El) -> Rect {
        let node = self.node(element);
        if node.kind == NodeKind::Preview {
            return node.rect;
        }
        node.rect - self.viewport_scroll - self.ancestor_scroll(element)
    }

    fn scroll_metrics(&self, element: El) -> ScrollMetrics {
        self.node(element).scroll
    }

    fn viewport_scroll_position(&self) -> Vec2 {
        self.viewport_scroll
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn contains(&self, ancestor: El, node: El) -> bool {
        let mut current = Some(node);
        while let Some(el) = current {
            if el == ancestor {
                return true;
            }
            current = self.node(el).parent;
        }
        false
    }

    fn parent(&self, node: El) -> Option<El> {
        self.node(node).parent
    }

    fn element_from_point(&self, scope: Option<El>, point: Point) -> Option<El> {
        (0..self.nodes.len()).rev().map(El).find(|el| {
            let node = self.node(*el);
            matches!(node.kind, NodeKind::Element | NodeKind::Placeholder)
                && *el != self.body
                && scope.is_none_or(|scope| self.contains(scope, *el))
                && self.is_rendered(*el)
                && is_inside_rect(&self.client_rect(*el), point.x, point.y)
        })
    }

    fn shadow_root(&self, element: El) -> Option<El> {
        let mut current = Some(element);
        while let Some(el) = current {
            if let Some(root) = self.node(el).shadow_root {
                return Some(root);
            }
            current = self.node(el).parent;
        }
        None
    }

    fn owner_svg_element(&self, _element: El) -> Option<El> {
        None
    }

    fn screen_ctm(&self, _svg: El) -> Option<Affine> {
        None
    }

    fn fullscreen_element(&self) -> Option<El> {
        None
    }

    fn body(&self) -> El {
        self.body
    }

    fn transform(&self, element: El) -> String {
        self.node(element).transform.clone()
    }

    fn scroll_snap_type(&self, element: El) -> String {
        self.node(element).scroll_snap.clone()
    }

    fn transition_duration(&self, _element: El) -> u64 {
        self.transition_duration
    }

    fn scroll_by(&mut self, target: ScrollTarget<El>, delta: Vec2) {
        self.scroll_calls.push((target, delta));
        match target {
            ScrollTarget::Document => {
                self.viewport_scroll += delta;
                self.viewport_scroll.x = self.viewport_scroll.x.max(0.0);
                self.viewport_scroll.y = self.viewport_scroll.y.max(0.0);
            }
            ScrollTarget::Element(el) => {
                let scroll = &mut self.nodes[el.0].scroll;
                let max_top = (scroll.scroll_height - scroll.client_height).max(0.0);
                let max_left = (scroll.scroll_width - scroll.client_width).max(0.0);
                scroll.scroll_top = (scroll.scroll_top + delta.y).clamp(0.0, max_top);
                scroll.scroll_left = (scroll.scroll_left + delta.x).clamp(0.0, max_left);
            }
        }
    }

    fn create_placeholder(&mut self, source: El) -> El {
        let src = self.node(source);
        let mut node = FakeNode::new(NodeKind::Placeholder, src.rect);
        node.transform = src.transform.clone();
        self.push(node)
    }

    fn create_preview(&mut self, _source: El, spec: &PreviewSpec) -> El {
        let mut node = FakeNode::new(NodeKind::Preview, spec.rect);
        node.preview_spec = Some(*spec);
        self.push(node)
    }

    fn create_anchor(&mut self) -> El {
        self.push(FakeNode::new(NodeKind::Anchor, Rect::ZERO))
    }

    fn insert_before(&mut self, parent: El, node: El, reference: Option<El>) {
        self.detach(node);
        let children = &mut self.nodes[parent.0].children;
        let at = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(at, node);
        self.nodes[node.0].parent = Some(parent);
    }

    fn replace_child(&mut self, new: El, old: El) {
        let Some(parent) = self.node(old).parent else {
            return;
        };
        self.detach(new);
        let children = &mut self.nodes[parent.0].children;
        if let Some(at) = children.iter().position(|c| *c == old) {
            children[at] = new;
        }
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
    }

    fn remove(&mut self, node: El) {
        self.detach(node);
        self.nodes[node.0].removed = true;
    }

    fn set_visible(&mut self, element: El, visible: bool) {
        self.nodes[element.0].visible = visible;
    }

    fn set_transform(&mut self, element: El, transform: &str) {
        self.transform_writes += 1;
        self.nodes[element.0].transform = String::from(transform);
    }

    fn set_scroll_snap_type(&mut self, element: El, value: &str) {
        self.nodes[element.0].scroll_snap = String::from(value);
    }

    fn set_native_drag_interactions(&mut self, element: El, enabled: bool) {
        self.nodes[element.0].native_drag = enabled;
    }

    fn add_class(&mut self, element: El, class: &str) {
        self.nodes[element.0].classes.push(String::from(class));
    }

    fn add_listener(
        &mut self,
        target: ListenerTarget<El>,
        listener: GlobalListener,
        options: ListenerOptions,
    ) {
        self.listeners.push((target, listener, options));
    }

    fn remove_listener(
        &mut self,
        target: ListenerTarget<El>,
        listener: GlobalListener,
        options: ListenerOptions,
    ) {
        if let Some(at) = self
            .listeners
            .iter()
            .position(|entry| *entry == (target, listener, options))
        {
            self.listeners.remove(at);
        }
    }
}
