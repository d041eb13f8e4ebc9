use std::time::Duration;

use super::fields::{validate_page, FieldDescriptor, FormValues, Page, ValidationReport};

/// Delay between starting the scroll and swapping the visible page.
pub const PAGE_SWAP_DELAY: Duration = Duration::from_millis(300);
/// Space kept above the form when scrolling it into view.
pub const SCROLL_MARGIN: f64 = 80.0;

impl Page {
    pub fn heading(self) -> &'static str {
        match self {
            Page::Details => "What are you looking for?",
            Page::Contact => "Final Step!",
        }
    }
}

/// Viewport geometry at the moment navigation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollAnchor {
    pub page_y_offset: f64,
    /// Top of the form wrapper relative to the viewport.
    pub form_top: f64,
}

impl ScrollAnchor {
    pub fn target(self) -> f64 {
        self.page_y_offset + self.form_top - SCROLL_MARGIN
    }
}

/// Scroll first, then after `swap_after` apply the page swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransition {
    pub to: Page,
    pub scroll_to: f64,
    pub swap_after: Duration,
}

impl PageTransition {
    fn towards(to: Page, anchor: ScrollAnchor) -> Self {
        Self {
            to,
            scroll_to: anchor.target(),
            swap_after: PAGE_SWAP_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNavigator {
    current: Page,
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self {
            current: Page::Details,
        }
    }
}

impl PageNavigator {
    pub fn current(&self) -> Page {
        self.current
    }

    pub fn heading(&self) -> &'static str {
        self.current.heading()
    }

    /// Plan the move to the contact page; refused while the details page has issues.
    pub fn next(
        &self,
        fields: &[FieldDescriptor],
        values: &FormValues,
        anchor: ScrollAnchor,
    ) -> Result<PageTransition, ValidationReport> {
        let report = validate_page(fields, Page::Details, values);
        if report.is_valid() {
            Ok(PageTransition::towards(Page::Contact, anchor))
        } else {
            Err(report)
        }
    }

    /// Back navigation is never gated.
    pub fn previous(&self, anchor: ScrollAnchor) -> PageTransition {
        PageTransition::towards(Page::Details, anchor)
    }

    /// Swap the visible page once the transition delay has run.
    pub fn complete(&mut self, transition: PageTransition) {
        self.current = transition.to;
    }

    pub fn reset(&mut self) {
        self.current = Page::Details;
    }
}
