#![forbid(unsafe_code)]

//! The decision to present a render list through a windowed view.
//!
//! Only the decision lives here. The windowing itself belongs to the host.

/// Item count above which lists are virtualized.
pub const DEFAULT_VIRTUALIZATION_THRESHOLD: usize = 500;

/// Threshold rule over the raw (unfiltered) item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualizationPolicy {
    threshold: usize,
}

impl Default for VirtualizationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUALIZATION_THRESHOLD)
    }
}

impl VirtualizationPolicy {
    /// A policy with a custom threshold.
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// The threshold.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether `item_count` items should be virtualized.
    #[must_use]
    pub const fn should_virtualize(&self, item_count: usize) -> bool {
        item_count > self.threshold
    }
}

/// [`VirtualizationPolicy::should_virtualize`] with the default threshold.
#[must_use]
pub const fn should_virtualize(item_count: usize) -> bool {
    item_count > DEFAULT_VIRTUALIZATION_THRESHOLD
}
