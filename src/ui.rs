// src/ui.rs
//
// What the dispatcher needs from the page it drives. The host owns the real
// element tree; the engine only asks what is under the pointer, walks up from
// there, and asks for scrolls and activations.
use std::time::Duration;

use serde::Serialize;

use crate::pointer::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Read-only view of one element.
pub trait UiElement {
    fn tag(&self) -> &str;
    fn role(&self) -> Option<&str>;
    fn has_attribute(&self, name: &str) -> bool;
    fn has_class(&self, class: &str) -> bool;
    /// A click handler attached directly to the element.
    fn has_click_handler(&self) -> bool;
}

pub trait UiSurface {
    fn viewport(&self) -> Viewport;
    /// Topmost element at viewport coordinates.
    fn element_at(&self, x: f64, y: f64) -> Option<NodeId>;
    fn element(&self, id: NodeId) -> Option<&dyn UiElement>;
    fn parent(&self, id: NodeId) -> Option<NodeId>;
    /// Brief press animation: shrink to `scale`, restore after `duration`.
    fn press_feedback(&mut self, id: NodeId, scale: f64, duration: Duration);
    fn activate(&mut self, id: NodeId);
}

pub trait Scroller {
    /// Positive scrolls down. `smooth` asks for an animated scroll.
    fn scroll_by(&mut self, delta_y: f64, smooth: bool);
}

/// Everything the dispatcher drives, in one object the session can own.
pub trait ActionTarget: UiSurface + Scroller + Send {}

impl<T: UiSurface + Scroller + Send> ActionTarget for T {}

pub const ACTIVATABLE_TAGS: [&str; 5] = ["button", "a", "input", "select", "label"];
pub const CLICKABLE_ATTRIBUTE: &str = "data-clickable";
pub const POINTER_CLASS: &str = "cursor-pointer";

pub fn is_activatable(element: &dyn UiElement) -> bool {
    ACTIVATABLE_TAGS
        .iter()
        .any(|t| element.tag().eq_ignore_ascii_case(t))
        || element.role() == Some("button")
        || element.has_attribute(CLICKABLE_ATTRIBUTE)
        || element.has_class(POINTER_CLASS)
        || element.has_click_handler()
}

/// Nearest activatable node among `start` and its ancestors, looking at no
/// more than `max_depth` nodes in total.
pub fn find_activatable<S>(surface: &S, start: NodeId, max_depth: usize) -> Option<NodeId>
where
    S: UiSurface + ?Sized,
{
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(id) = current {
        if depth >= max_depth {
            break;
        }
        if surface.element(id).is_some_and(is_activatable) {
            return Some(id);
        }
        current = surface.parent(id);
        depth += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{HeadlessPage, PageNode, Rect};

    fn page_with_chain(depth: usize, leaf_clickable_at: Option<usize>) -> (HeadlessPage, NodeId) {
        let mut page = HeadlessPage::new(Viewport::new(800.0, 600.0));
        let rect = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut parent = None;
        let mut ids = Vec::new();
        for level in 0..depth {
            let mut node = PageNode::new("div", rect);
            if Some(level) == leaf_clickable_at {
                node = node.role("button");
            }
            let id = page.add(parent, node);
            ids.push(id);
            parent = Some(id);
        }
        (page, *ids.last().expect("at least one node"))
    }

    #[test]
    fn recognises_each_activation_marker() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(is_activatable(&PageNode::new("BUTTON", rect)));
        assert!(is_activatable(&PageNode::new("a", rect)));
        assert!(is_activatable(&PageNode::new("label", rect)));
        assert!(is_activatable(&PageNode::new("div", rect).role("button")));
        assert!(is_activatable(&PageNode::new("div", rect).attr(CLICKABLE_ATTRIBUTE, "")));
        assert!(is_activatable(&PageNode::new("span", rect).class(POINTER_CLASS)));
        assert!(is_activatable(&PageNode::new("li", rect).on_click()));

        assert!(!is_activatable(&PageNode::new("div", rect)));
        assert!(!is_activatable(&PageNode::new("div", rect).role("listitem")));
        assert!(!is_activatable(&PageNode::new("div", rect).class("card")));
    }

    #[test]
    fn walk_finds_nearest_clickable_ancestor() {
        // root(0) is the button; leaf is 4 levels below it
        let (page, leaf) = page_with_chain(5, Some(0));
        assert_eq!(find_activatable(&page, leaf, 5), Some(NodeId(0)));
    }

    #[test]
    fn walk_stops_at_depth_limit() {
        // button is 5 levels above the leaf: one too far
        let (page, leaf) = page_with_chain(6, Some(0));
        assert_eq!(find_activatable(&page, leaf, 5), None);
        assert_eq!(find_activatable(&page, leaf, 6), Some(NodeId(0)));
    }

    #[test]
    fn walk_checks_the_start_node_first() {
        let (page, leaf) = page_with_chain(3, Some(2));
        assert_eq!(find_activatable(&page, leaf, 1), Some(leaf));
    }
}
