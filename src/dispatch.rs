// src/dispatch.rs
//! Turns arbitrated gestures into page effects.
//!
//! Vertical swipes scroll (rate limited), a click in pointer mode activates
//! whatever clickable thing sits under the fingertip. Every other gesture is
//! left to the application callback.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::GestureConfig;
use crate::gesture::Gesture;
use crate::pointer::PointerState;
use crate::timer::Throttle;
use crate::ui::{find_activatable, ActionTarget, NodeId};

pub const PRESS_SCALE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickOutcome {
    /// Found an activatable node within the search depth.
    Activated(NodeId),
    /// Nothing activatable nearby; the hit element itself was activated.
    Fallback(NodeId),
    NoElement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Dispatched {
    Scrolled { delta: f64 },
    ScrollThrottled,
    Click(ClickOutcome),
    /// No page effect; the gesture only reaches the application.
    Forwarded,
}

#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    scroll_throttle: Throttle,
    scroll_amount: f64,
    search_depth: usize,
    press_feedback: Duration,
    pointer_enabled: bool,
}

impl ActionDispatcher {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            scroll_throttle: Throttle::new(config.scroll_throttle()),
            scroll_amount: config.scroll_amount,
            search_depth: config.click_search_depth,
            press_feedback: config.press_feedback(),
            pointer_enabled: config.enable_pointer,
        }
    }

    pub fn dispatch(
        &mut self,
        gesture: Gesture,
        pointer: &PointerState,
        target: &mut dyn ActionTarget,
        now: Instant,
    ) -> Dispatched {
        match gesture {
            Gesture::SwipeUp => self.scroll(-self.scroll_amount, target, now),
            Gesture::SwipeDown => self.scroll(self.scroll_amount, target, now),
            Gesture::Click if self.pointer_enabled => {
                Dispatched::Click(self.click_at(pointer.x, pointer.y, target))
            }
            _ => Dispatched::Forwarded,
        }
    }

    fn scroll(&mut self, delta: f64, target: &mut dyn ActionTarget, now: Instant) -> Dispatched {
        if !self.scroll_throttle.try_acquire(now) {
            debug!("Scroll throttled");
            return Dispatched::ScrollThrottled;
        }
        info!("Scrolling by {}px", delta);
        target.scroll_by(delta, true);
        Dispatched::Scrolled { delta }
    }

    pub fn click_at(&self, x: f64, y: f64, target: &mut dyn ActionTarget) -> ClickOutcome {
        let Some(hit) = target.element_at(x, y) else {
            debug!("Click at ({:.0}, {:.0}) hit nothing", x, y);
            return ClickOutcome::NoElement;
        };

        match find_activatable(&*target, hit, self.search_depth) {
            Some(node) => {
                info!("Click at ({:.0}, {:.0}) -> {:?}", x, y, node);
                target.press_feedback(node, PRESS_SCALE, self.press_feedback);
                target.activate(node);
                ClickOutcome::Activated(node)
            }
            None => {
                info!("Click at ({:.0}, {:.0}) -> {:?} (fallback)", x, y, hit);
                target.activate(hit);
                ClickOutcome::Fallback(hit)
            }
        }
    }

    pub fn reset(&mut self) {
        self.scroll_throttle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{HeadlessPage, PageEvent, PageNode, Rect};
    use crate::pointer::Viewport;

    fn page() -> HeadlessPage {
        let mut page = HeadlessPage::new(Viewport::new(800.0, 600.0));
        let body = page.add(None, PageNode::new("main", Rect::new(0.0, 0.0, 800.0, 3000.0)));
        let button = page.add(
            Some(body),
            PageNode::new("button", Rect::new(100.0, 100.0, 200.0, 60.0)).text("Next step"),
        );
        page.add(
            Some(button),
            PageNode::new("span", Rect::new(110.0, 110.0, 80.0, 20.0)).text("icon"),
        );
        page.add(
            Some(body),
            PageNode::new("p", Rect::new(100.0, 300.0, 400.0, 100.0)).text("Whisk the eggs"),
        );
        page
    }

    fn pointer_at(x: f64, y: f64) -> PointerState {
        PointerState {
            x,
            y,
            is_pointing: true,
            is_pinching: false,
        }
    }

    #[test]
    fn vertical_swipes_scroll_with_throttle() {
        let t0 = Instant::now();
        let ms = |n| t0 + Duration::from_millis(n);
        let mut dispatcher = ActionDispatcher::new(&GestureConfig::default());
        let mut page = page();
        let p = pointer_at(0.0, 0.0);

        assert_eq!(
            dispatcher.dispatch(Gesture::SwipeDown, &p, &mut page, ms(0)),
            Dispatched::Scrolled { delta: 250.0 }
        );
        assert_eq!(
            dispatcher.dispatch(Gesture::SwipeDown, &p, &mut page, ms(200)),
            Dispatched::ScrollThrottled
        );
        assert_eq!(
            dispatcher.dispatch(Gesture::SwipeUp, &p, &mut page, ms(400)),
            Dispatched::Scrolled { delta: -250.0 }
        );
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn click_walks_up_to_the_button() {
        let mut dispatcher = ActionDispatcher::new(&GestureConfig::default());
        let mut page = page();
        let journal = page.journal();
        let button = page.find_by_text("Next step").expect("button");

        let outcome = dispatcher.dispatch(
            Gesture::Click,
            &pointer_at(120.0, 115.0),
            &mut page,
            Instant::now(),
        );
        assert_eq!(outcome, Dispatched::Click(ClickOutcome::Activated(button)));
        assert_eq!(
            journal.events(),
            vec![
                PageEvent::Pressed {
                    node: button,
                    scale: PRESS_SCALE,
                    duration_ms: 150
                },
                PageEvent::Activated {
                    node: button,
                    label: "Next step".into()
                },
            ]
        );
    }

    #[test]
    fn click_without_clickable_ancestor_activates_hit_element() {
        let dispatcher = ActionDispatcher::new(&GestureConfig::default());
        let mut page = page();
        let journal = page.journal();
        let para = page.find_by_text("Whisk the eggs").expect("paragraph");

        assert_eq!(
            dispatcher.click_at(150.0, 350.0, &mut page),
            ClickOutcome::Fallback(para)
        );
        // fallback skips the press animation
        assert_eq!(journal.events().len(), 1);
    }

    #[test]
    fn click_on_empty_space_is_a_no_op() {
        let dispatcher = ActionDispatcher::new(&GestureConfig::default());
        let mut page = HeadlessPage::new(Viewport::new(800.0, 600.0));
        let journal = page.journal();
        assert_eq!(dispatcher.click_at(10.0, 10.0, &mut page), ClickOutcome::NoElement);
        assert!(journal.events().is_empty());
    }

    #[test]
    fn clicks_ignored_without_pointer_mode() {
        let config = GestureConfig {
            enable_pointer: false,
            ..GestureConfig::default()
        };
        let mut dispatcher = ActionDispatcher::new(&config);
        let mut page = page();
        assert_eq!(
            dispatcher.dispatch(
                Gesture::Click,
                &pointer_at(120.0, 115.0),
                &mut page,
                Instant::now()
            ),
            Dispatched::Forwarded
        );
    }

    #[test]
    fn other_gestures_are_forwarded() {
        let mut dispatcher = ActionDispatcher::new(&GestureConfig::default());
        let mut page = page();
        let p = pointer_at(120.0, 115.0);
        for g in [Gesture::SwipeLeft, Gesture::Palm, Gesture::Pinch, Gesture::ThumbsUp] {
            assert_eq!(
                dispatcher.dispatch(g, &p, &mut page, Instant::now()),
                Dispatched::Forwarded
            );
        }
    }
}
