use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// One page of an ordered result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Slices `[(page-1)*size, page*size)`; page and size are floored to 1.
/// Pages past the end are empty but still report the full total.
pub fn paginate<T>(items: Vec<T>, page: i64, page_size: i64) -> Page<T> {
    let page = page.max(1) as usize;
    let page_size = page_size.max(1) as usize;
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);
    let data = items.into_iter().skip(start).take(page_size).collect();
    Page {
        data,
        total,
        page,
        page_size,
    }
}

/// Lenient parse for page parameters; anything unusable becomes `default`.
pub fn parse_page_param(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.floor() as i64)
        .unwrap_or(default)
}
