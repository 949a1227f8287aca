//! Width propagation.
//!
//! Every renderer receives the pixel width available to it. All arithmetic
//! saturates at zero.

use weaver_mail_core::registry::clamp_content_width;
use weaver_mail_core::{ImageProps, Padding, RootProps};

/// Width of the content table, from the root's `max_width`.
pub fn container_width(root: &RootProps) -> u32 {
    clamp_content_width(root.max_width)
}

/// Width left inside `padding`.
pub fn inner_width(available: u32, padding: &Padding) -> u32 {
    available.saturating_sub(padding.horizontal())
}

/// Width of each of `count` columns sharing `inner` pixels with `gap`
/// between neighbours.
pub fn column_width(inner: u32, gap: u32, count: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let gaps = gap.saturating_mul(count - 1);
    inner.saturating_sub(gaps) / count
}

/// Rendered width of an image given the width available to it.
pub fn image_width(image: &ImageProps, available: u32) -> u32 {
    let inner = inner_width(available, &image.padding);
    match image.width {
        None => inner,
        Some(requested) if image.fit_to_container => requested.min(inner),
        Some(requested) => requested,
    }
}
