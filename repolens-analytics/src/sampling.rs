//! Deterministic downsampling of large listings
//!
//! Large commit and issue listings are walked keeping every Nth item, and
//! count-type aggregates are scaled back up by the same stride to
//! approximate the true totals.

use std::future::Future;

use repolens_core::RepolensResult;

/// Maximum commits retained per activity window
pub const COMMIT_SAMPLE_CAP: usize = 500;

/// Maximum issues retained per state
pub const ISSUE_SAMPLE_CAP: usize = 100;

/// Stride used when the provider cannot report a total up front
pub const UNKNOWN_TOTAL_FACTOR: u64 = 5;

/// How a listing will be downsampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePlan {
    pub is_sampled: bool,
    /// Stride: every `factor`-th item is retained
    pub factor: u64,
    /// Maximum number of items retained
    pub cap: usize,
}

impl SamplePlan {
    /// Plan for a listing with a best-effort total
    ///
    /// An unknown total is treated as large: sampling is applied with a
    /// conservative fixed stride rather than risking an unbounded walk.
    pub fn new(total: Option<u64>, cap: usize) -> Self {
        match total {
            Some(total) if total > cap as u64 => Self {
                is_sampled: true,
                factor: (total / cap as u64).max(1),
                cap,
            },
            Some(_) => Self {
                is_sampled: false,
                factor: 1,
                cap,
            },
            None => Self {
                is_sampled: true,
                factor: UNKNOWN_TOTAL_FACTOR,
                cap,
            },
        }
    }

    /// Whether the item at this zero-based stream position is retained
    pub fn keeps(&self, index: u64) -> bool {
        index % self.factor == 0
    }

    /// Scale a retained count back up to approximate the true count
    pub fn scale(&self, raw_count: u64) -> u64 {
        if self.is_sampled {
            raw_count * self.factor
        } else {
            raw_count
        }
    }

    /// Best estimate of the listing's true total
    pub fn estimate_total(&self, provider_total: Option<u64>, retained: usize) -> u64 {
        if !self.is_sampled {
            return retained as u64;
        }
        provider_total.unwrap_or(retained as u64 * self.factor)
    }
}

/// Walk a paginated listing, retaining every `factor`-th item
///
/// Stops when a short (or empty) page marks the end of the stream, or when
/// the plan's cap is reached, whichever comes first.
pub async fn collect_sampled<T, F, Fut>(
    plan: SamplePlan,
    page_size: usize,
    mut fetch_page: F,
) -> RepolensResult<Vec<T>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = RepolensResult<Vec<T>>>,
{
    let mut retained = Vec::new();
    let mut index: u64 = 0;
    let mut page: u64 = 1;

    loop {
        let items = fetch_page(page).await?;
        let page_len = items.len();

        for item in items {
            if plan.keeps(index) {
                retained.push(item);
                if retained.len() >= plan.cap {
                    return Ok(retained);
                }
            }
            index += 1;
        }

        if page_len < page_size {
            return Ok(retained);
        }
        page += 1;
    }
}
