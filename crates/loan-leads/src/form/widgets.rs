//! Presentation state for the decorative parts of the landing page.

use chrono::NaiveDate;

/// Gap between partner logos, in pixels.
const SLIDE_GAP: f64 = 20.0;
/// Logos in one pass of the track before it wraps around.
const SLIDES_PER_LOOP: f64 = 9.0;

/// Auto-scrolling partner logo track. Call [`PartnerCarousel::step`] once per
/// animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerCarousel {
    slide_width: f64,
    position: f64,
    speed: f64,
    hovered: bool,
}

impl PartnerCarousel {
    pub fn new(slide_width: f64) -> Self {
        Self {
            slide_width,
            position: 0.0,
            speed: 1.0,
            hovered: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// New slide width after a (debounced) window resize.
    pub fn resize(&mut self, slide_width: f64) {
        self.slide_width = slide_width;
    }

    fn reset_position(&self) -> f64 {
        -(self.slide_width + SLIDE_GAP) * SLIDES_PER_LOOP
    }

    /// Advance one frame and return the `translateX` offset to render.
    pub fn step(&mut self) -> f64 {
        if !self.hovered {
            self.position -= self.speed;
            if self.position <= self.reset_position() {
                self.position = 0.0;
            }
        }
        self.position
    }
}

/// FAQ list where at most one answer is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqAccordion {
    len: usize,
    open: Option<usize>,
}

impl FaqAccordion {
    pub fn new(len: usize) -> Self {
        Self { len, open: None }
    }

    pub fn open(&self) -> Option<usize> {
        self.open
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }

    /// Toggle one question, collapsing any other.
    pub fn toggle(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.open = if self.open == Some(index) {
            None
        } else {
            Some(index)
        };
    }
}

/// Banner text shown above the rates table, e.g. `Latest rate As Of Mar 4, 2026`.
pub fn rate_banner(today: NaiveDate) -> String {
    format!("Latest rate As Of {}", today.format("%b %-d, %Y"))
}
