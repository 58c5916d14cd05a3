// src/page.rs
//
// In-memory page: a tree of boxes with the attributes the click-through
// predicate cares about, a vertical scroll offset, and a journal of every
// side effect the engine caused. Used by the replay demo and the tests.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::pointer::Viewport;
use crate::ui::{NodeId, Scroller, UiElement, UiSurface};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    tag: String,
    role: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    click_handler: bool,
    /// Document coordinates, or viewport coordinates when `fixed`.
    rect: Rect,
    fixed: bool,
    text: String,
    parent: Option<NodeId>,
}

impl PageNode {
    pub fn new(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.to_string(),
            role: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            click_handler: false,
            rect,
            fixed: false,
            text: String::new(),
            parent: None,
        }
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn on_click(mut self) -> Self {
        self.click_handler = true;
        self
    }

    /// Pinned to the viewport; does not move when the page scrolls.
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

impl UiElement for PageNode {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k == name)
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn has_click_handler(&self) -> bool {
        self.click_handler
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PageEvent {
    Scrolled { delta: f64, scroll_y: f64 },
    Pressed { node: NodeId, scale: f64, duration_ms: u64 },
    Activated { node: NodeId, label: String },
}

/// Cloneable read handle on a page's side-effect log.
#[derive(Debug, Clone, Default)]
pub struct PageJournal {
    events: Arc<Mutex<Vec<PageEvent>>>,
}

impl PageJournal {
    fn record(&self, event: PageEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn activated_labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::Activated { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn scroll_y(&self) -> f64 {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                PageEvent::Scrolled { scroll_y, .. } => Some(*scroll_y),
                _ => None,
            })
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessPage {
    viewport: Viewport,
    nodes: Vec<PageNode>,
    scroll_y: f64,
    journal: PageJournal,
}

impl HeadlessPage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            nodes: Vec::new(),
            scroll_y: 0.0,
            journal: PageJournal::default(),
        }
    }

    /// Later nodes paint over earlier ones.
    pub fn add(&mut self, parent: Option<NodeId>, mut node: PageNode) -> NodeId {
        node.parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.text == text).map(NodeId)
    }

    pub fn journal(&self) -> PageJournal {
        self.journal.clone()
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn max_scroll(&self) -> f64 {
        let content = self
            .nodes
            .iter()
            .filter(|n| !n.fixed)
            .map(|n| n.rect.bottom())
            .fold(0.0, f64::max);
        (content - self.viewport.height).max(0.0)
    }

    fn on_screen_rect(&self, node: &PageNode) -> Rect {
        if node.fixed {
            node.rect
        } else {
            Rect {
                y: node.rect.y - self.scroll_y,
                ..node.rect
            }
        }
    }
}

impl UiSurface for HeadlessPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn element_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, n)| self.on_screen_rect(n).contains(x, y))
            .map(|(i, _)| NodeId(i))
    }

    fn element(&self, id: NodeId) -> Option<&dyn UiElement> {
        self.nodes.get(id.0).map(|n| n as &dyn UiElement)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    fn press_feedback(&mut self, id: NodeId, scale: f64, duration: Duration) {
        debug!("Press feedback on {:?}", id);
        self.journal.record(PageEvent::Pressed {
            node: id,
            scale,
            duration_ms: duration.as_millis() as u64,
        });
    }

    fn activate(&mut self, id: NodeId) {
        let label = self
            .nodes
            .get(id.0)
            .map(|n| n.text.clone())
            .unwrap_or_default();
        info!("Activated <{:?}> {:?}", id, label);
        self.journal.record(PageEvent::Activated { node: id, label });
    }
}

impl Scroller for HeadlessPage {
    fn scroll_by(&mut self, delta_y: f64, _smooth: bool) {
        // smooth scrolling lands on the same offset; only the animation differs
        self.scroll_y = (self.scroll_y + delta_y).clamp(0.0, self.max_scroll());
        self.journal.record(PageEvent::Scrolled {
            delta: delta_y,
            scroll_y: self.scroll_y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> HeadlessPage {
        let mut page = HeadlessPage::new(Viewport::new(800.0, 600.0));
        let body = page.add(None, PageNode::new("main", Rect::new(0.0, 0.0, 800.0, 2000.0)));
        page.add(
            Some(body),
            PageNode::new("button", Rect::new(100.0, 100.0, 200.0, 50.0)).text("Start"),
        );
        page.add(
            None,
            PageNode::new("nav", Rect::new(0.0, 0.0, 800.0, 40.0)).fixed().text("Header"),
        );
        page
    }

    #[test]
    fn topmost_node_wins_hit_testing() {
        let page = page();
        assert_eq!(page.element_at(150.0, 120.0), page.find_by_text("Start"));
        assert_eq!(page.element_at(150.0, 20.0), page.find_by_text("Header"));
        assert_eq!(page.element_at(700.0, 500.0), Some(NodeId(0)));
        assert_eq!(page.element_at(900.0, 500.0), None);
    }

    #[test]
    fn scrolling_moves_document_nodes_but_not_fixed_ones() {
        let mut page = page();
        page.scroll_by(80.0, true);
        assert_eq!(page.element_at(150.0, 120.0), Some(NodeId(0)));
        assert_eq!(page.element_at(150.0, 40.0), page.find_by_text("Start"));
        assert_eq!(page.element_at(150.0, 20.0), page.find_by_text("Header"));
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut page = page();
        let journal = page.journal();
        page.scroll_by(-250.0, true);
        assert_eq!(page.scroll_y(), 0.0);
        page.scroll_by(5000.0, true);
        assert_eq!(page.scroll_y(), 1400.0);
        assert_eq!(journal.scroll_y(), 1400.0);
        assert_eq!(journal.events().len(), 2);
    }

    #[test]
    fn activation_is_journaled_with_label() {
        let mut page = page();
        let journal = page.journal();
        let start = page.find_by_text("Start").expect("button");
        page.activate(start);
        assert_eq!(journal.activated_labels(), vec!["Start".to_string()]);
    }
}
