//! Page-based slicing of the image list.

use serde::Serialize;

/// Default number of images per page.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Largest `per_page` a client may request.
pub const MAX_PER_PAGE: usize = 100;

/// Pagination metadata for one page of the image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-indexed page number
    pub current_page: usize,
    pub per_page: usize,
    pub total_images: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// A contiguous slice of the list plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub pagination: Pagination,
}

/// Slice `list` into 1-indexed pages of `per_page` items.
///
/// Pages and sizes below 1 are treated as 1. A page past the end yields an
/// empty slice with metadata still describing the whole list.
pub fn paginate<T>(list: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = list.len();

    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        items: &list[start..end],
        pagination: Pagination {
            current_page: page,
            per_page,
            total_images: total,
            total_pages: total.div_ceil(per_page),
            has_prev: page > 1,
            has_next: page.saturating_mul(per_page) < total,
        },
    }
}

/// Parse a `?page=` value leniently: anything that is not an integer is page 1.
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|p| p.clamp(1, i64::from(u32::MAX)) as usize)
        .unwrap_or(1)
}
