//! Display-side search and paging over an already ranked payload.
//!
//! Nothing here changes which pools the core returns; it only narrows and
//! slices a copy for a table view.

use serde::Serialize;
use crate::models::PoolRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Case-insensitive substring match on project, symbol or chain.
pub fn search<'a>(pools: &'a [PoolRecord], query: &str) -> Vec<&'a PoolRecord> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return pools.iter().collect();
    }

    let hit = |field: &Option<String>| {
        field.as_deref().map_or(false, |v| v.to_lowercase().contains(&needle))
    };

    pools
        .iter()
        .filter(|p| hit(&p.project) || p.symbol.to_lowercase().contains(&needle) || hit(&p.chain))
        .collect()
}

/// 1-based page; out-of-range pages clamp to the nearest valid one.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);

    Page {
        data: items[start..end].to_vec(),
        page,
        total_pages,
        total,
    }
}
