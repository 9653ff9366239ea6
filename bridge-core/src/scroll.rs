//! Scroll and touch signals bridged from the native surface.

use serde::{Deserialize, Serialize};

/// A native scroll signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSignal {
    /// Current vertical scroll offset.
    pub scroll_top: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
    /// Total height of the scrollable content.
    pub content_height: f64,
}

impl ScrollSignal {
    /// Remaining distance between the bottom of the viewport and the end of
    /// the content, in scroll offset units.
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.scroll_top + self.viewport_height)
    }
}

/// Which producers a scroll listener runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollListenerOptions {
    /// Emit `onPageScroll` on every signal.
    pub page_scroll: bool,
    /// Emit `onReachBottom` when the distance to bottom crosses this threshold.
    pub reach_bottom_distance: Option<f64>,
}

impl ScrollListenerOptions {
    /// Whether any producer is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.page_scroll || self.reach_bottom_distance.is_some()
    }
}

/// An outbound message produced by a scroll signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutput {
    /// Current scroll position.
    PageScroll {
        /// Vertical scroll offset.
        scroll_top: f64,
    },
    /// The reach-bottom threshold was crossed.
    ReachBottom,
}

/// Converts scroll signals into page-scroll and reach-bottom outputs.
///
/// Reach-bottom fires once when the distance to bottom drops to the threshold
/// and re-arms only after the distance rises back above it.
///
/// A new listener starts armed: if the first signal is already within the
/// threshold it fires, e.g. content shorter than the viewport.
#[derive(Debug, Clone)]
pub struct ScrollListener {
    options: ScrollListenerOptions,
    armed: bool,
}

impl ScrollListener {
    /// Create a listener for the given producers.
    #[must_use]
    pub fn new(options: ScrollListenerOptions) -> Self {
        Self {
            options,
            armed: true,
        }
    }

    /// The producers this listener runs.
    #[must_use]
    pub fn options(&self) -> ScrollListenerOptions {
        self.options
    }

    /// Handle one scroll signal.
    pub fn handle(&mut self, signal: ScrollSignal) -> Vec<ScrollOutput> {
        let mut out = Vec::with_capacity(2);
        if self.options.page_scroll {
            out.push(ScrollOutput::PageScroll {
                scroll_top: signal.scroll_top,
            });
        }
        if let Some(threshold) = self.options.reach_bottom_distance {
            let below = signal.distance_to_bottom() <= threshold;
            if below && self.armed {
                self.armed = false;
                out.push(ScrollOutput::ReachBottom);
            } else if !below {
                self.armed = true;
            }
        }
        out
    }
}

/// What the view does with a touch-move signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchDisposition {
    /// The touch propagates and may scroll the page.
    Propagate,
    /// Propagation was stopped; the page does not scroll.
    Suppressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(scroll_top: f64) -> ScrollSignal {
        ScrollSignal {
            scroll_top,
            viewport_height: 600.0,
            content_height: 2000.0,
        }
    }

    #[test]
    fn test_distance_to_bottom() {
        assert!((at(1000.0).distance_to_bottom() - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_page_scroll_every_signal() {
        let mut listener = ScrollListener::new(ScrollListenerOptions {
            page_scroll: true,
            reach_bottom_distance: None,
        });
        assert_eq!(
            listener.handle(at(10.0)),
            vec![ScrollOutput::PageScroll { scroll_top: 10.0 }]
        );
        assert_eq!(listener.handle(at(20.0)).len(), 1);
    }

    #[test]
    fn test_reach_bottom_fires_once_per_crossing() {
        let mut listener = ScrollListener::new(ScrollListenerOptions {
            page_scroll: false,
            reach_bottom_distance: Some(50.0),
        });

        assert!(listener.handle(at(1000.0)).is_empty());
        assert_eq!(listener.handle(at(1360.0)), vec![ScrollOutput::ReachBottom]);
        // Still below threshold: no duplicates.
        assert!(listener.handle(at(1380.0)).is_empty());
        assert!(listener.handle(at(1400.0)).is_empty());

        // Back above threshold re-arms.
        assert!(listener.handle(at(1200.0)).is_empty());
        assert_eq!(listener.handle(at(1390.0)), vec![ScrollOutput::ReachBottom]);
    }

    #[test]
    fn test_short_content_fires_on_first_signal() {
        let mut listener = ScrollListener::new(ScrollListenerOptions {
            page_scroll: false,
            reach_bottom_distance: Some(50.0),
        });
        let short = ScrollSignal {
            scroll_top: 0.0,
            viewport_height: 600.0,
            content_height: 400.0,
        };
        assert!(short.distance_to_bottom() < 0.0);
        assert_eq!(listener.handle(short), vec![ScrollOutput::ReachBottom]);
        assert!(listener.handle(short).is_empty());
    }

    #[test]
    fn test_both_producers() {
        let mut listener = ScrollListener::new(ScrollListenerOptions {
            page_scroll: true,
            reach_bottom_distance: Some(50.0),
        });
        assert_eq!(
            listener.handle(at(1400.0)),
            vec![
                ScrollOutput::PageScroll { scroll_top: 1400.0 },
                ScrollOutput::ReachBottom
            ]
        );
    }
}
