// src/app.rs
//
// Demo application: a step-by-step recipe that hands-free gestures drive.
// Horizontal swipes move between steps, an open palm pauses auto-play and a
// thumbs-up is acknowledged. Vertical swipes and clicks never reach here as
// page effects; the dispatcher already scrolled or clicked the page.
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::gesture::Gesture;
use crate::page::{HeadlessPage, PageNode, Rect};
use crate::pointer::Viewport;
use crate::tracking::GestureHandler;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub title: String,
    pub steps: Vec<String>,
}

impl Recipe {
    pub fn new(title: &str, steps: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn sample() -> Self {
        Self::new(
            "Herb omelette",
            &[
                "Whisk three eggs with a pinch of salt",
                "Chop chives and parsley",
                "Melt butter in a pan over medium heat",
                "Pour in the eggs and stir gently",
                "Scatter the herbs, fold and serve",
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantState {
    pub current_step: usize,
    pub playing: bool,
    /// Notifications shown to the cook, oldest first.
    pub toasts: Vec<String>,
}

struct Inner {
    recipe: Recipe,
    state: AssistantState,
}

/// Cloneable handle; every clone drives the same recipe.
#[derive(Clone)]
pub struct CookingAssistant {
    inner: Arc<Mutex<Inner>>,
}

impl CookingAssistant {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                recipe,
                state: AssistantState {
                    current_step: 0,
                    playing: false,
                    toasts: Vec::new(),
                },
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AssistantState {
        self.lock().state.clone()
    }

    pub fn play(&self) {
        let mut inner = self.lock();
        inner.state.playing = true;
        inner.toast("Auto-play started");
    }

    /// Auto-play tick: one step forward, stopping at the last step.
    pub fn tick(&self) {
        let mut inner = self.lock();
        if !inner.state.playing {
            return;
        }
        if inner.state.current_step + 1 < inner.recipe.steps.len() {
            inner.state.current_step += 1;
        } else {
            inner.state.playing = false;
        }
    }

    pub fn on_gesture(&self, gesture: Gesture) {
        let mut inner = self.lock();
        match gesture {
            Gesture::SwipeLeft => {
                if inner.state.current_step > 0 {
                    inner.state.current_step -= 1;
                    inner.toast("Previous Step");
                }
            }
            Gesture::SwipeRight => {
                if inner.state.current_step + 1 < inner.recipe.steps.len() {
                    inner.state.current_step += 1;
                    inner.toast("Next Step");
                }
            }
            Gesture::ThumbsUp => inner.toast("Great!"),
            Gesture::Palm => {
                inner.state.playing = false;
                inner.toast("Paused");
            }
            _ => {}
        }
    }

    /// Gesture callback for a session, feeding this assistant.
    pub fn handler(&self) -> GestureHandler {
        let assistant = self.clone();
        Box::new(move |gesture| assistant.on_gesture(gesture))
    }
}

impl Inner {
    fn toast(&mut self, message: &str) {
        info!("{}", message);
        self.state.toasts.push(message.to_string());
    }
}

/// Headless rendering of the recipe page: a fixed header with step buttons,
/// then one card per step, tall enough to scroll.
pub fn recipe_page(recipe: &Recipe, viewport: Viewport) -> HeadlessPage {
    const HEADER: f64 = 80.0;
    const CARD: f64 = 320.0;

    let mut page = HeadlessPage::new(viewport);
    let width = viewport.width;
    let body = page.add(
        None,
        PageNode::new(
            "main",
            Rect::new(0.0, 0.0, width, HEADER + CARD * recipe.steps.len() as f64),
        ),
    );

    for (i, step) in recipe.steps.iter().enumerate() {
        let top = HEADER + CARD * i as f64;
        let card = page.add(
            Some(body),
            PageNode::new("section", Rect::new(40.0, top + 20.0, width - 80.0, CARD - 40.0))
                .class("step-card")
                .text(&format!("Step {}", i + 1)),
        );
        page.add(
            Some(card),
            PageNode::new("p", Rect::new(60.0, top + 40.0, width - 120.0, 120.0)).text(step),
        );
        page.add(
            Some(card),
            PageNode::new("div", Rect::new(60.0, top + 180.0, 160.0, 60.0))
                .attr("data-clickable", "true")
                .text(&format!("Done {}", i + 1)),
        );
    }

    let header = page.add(
        None,
        PageNode::new("header", Rect::new(0.0, 0.0, width, HEADER))
            .fixed()
            .text(&recipe.title),
    );
    page.add(
        Some(header),
        PageNode::new("button", Rect::new(width - 360.0, 16.0, 160.0, 48.0))
            .fixed()
            .text("Previous"),
    );
    page.add(
        Some(header),
        PageNode::new("button", Rect::new(width - 180.0, 16.0, 160.0, 48.0))
            .fixed()
            .text("Next"),
    );

    page
}
