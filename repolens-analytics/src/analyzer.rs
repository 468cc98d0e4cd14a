//! Cache-checked repository analytics
//!
//! One accessor per analytics category. Every accessor builds a cache key
//! from its name, the repository, and its parameters; serves a hit
//! unchanged; and on a miss fetches from the hosting API, samples large
//! listings, shapes the record, and writes it back with the configured TTL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use repolens_core::{
    AuthorCommitCount, CommitActivity, ContributorStat, DailyCommitCount, IssueAnalysis,
    IssueRecord, LanguageBreakdown, LanguageStat, RepoInfo, RepolensError, RepolensResult,
    RepositoryOverview,
};

use crate::api::{IssueState, RepositoryHost, PAGE_SIZE};
use crate::cache::{cache_key, CacheStore};
use crate::round2;
use crate::sampling::{collect_sampled, SamplePlan, COMMIT_SAMPLE_CAP, ISSUE_SAMPLE_CAP};

/// Contributors included in the composite overview
const OVERVIEW_CONTRIBUTOR_LIMIT: usize = 5;

/// Commit-activity window used by the composite overview, in days
const OVERVIEW_ACTIVITY_DAYS: u32 = 30;

/// Cache-first access to the four analytics categories
pub struct RepoAnalyzer {
    host: Arc<dyn RepositoryHost>,
    cache: Arc<dyn CacheStore>,
    ttl_minutes: u64,
}

impl RepoAnalyzer {
    pub fn new(host: Arc<dyn RepositoryHost>, cache: Arc<dyn CacheStore>, ttl_minutes: u64) -> Self {
        Self {
            host,
            cache,
            ttl_minutes,
        }
    }

    async fn read_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key).await?;
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "Discarding cache entry that no longer deserializes");
                self.cache.delete(key).await;
                None
            }
        }
    }

    async fn write_cache<T: Serialize>(&self, key: &str, record: &T) {
        match serde_json::to_value(record) {
            Ok(value) => self.cache.set(key, value, self.ttl_minutes).await,
            Err(e) => warn!(key, error = %e, "Failed to serialize record for caching"),
        }
    }

    /// Repository metadata snapshot
    pub async fn repository(&self, repo_name: &str) -> RepolensResult<RepoInfo> {
        let key = cache_key("get_repository", repo_name, &[]);
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let info = self.host.fetch_repository(repo_name).await?;
        self.write_cache(&key, &info).await;
        Ok(info)
    }

    /// Top contributors, provider order
    pub async fn contributors(
        &self,
        repo_name: &str,
        limit: usize,
    ) -> RepolensResult<Vec<ContributorStat>> {
        let key = cache_key(
            "get_contributors",
            repo_name,
            &[("limit", limit.to_string())],
        );
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let contributors = self.host.fetch_contributors(repo_name, limit).await?;
        self.write_cache(&key, &contributors).await;
        Ok(contributors)
    }

    /// Commit activity over the trailing `days`-day window
    pub async fn commit_activity(
        &self,
        repo_name: &str,
        days: u32,
    ) -> RepolensResult<CommitActivity> {
        let key = cache_key(
            "get_commit_activity",
            repo_name,
            &[("days", days.to_string())],
        );
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let until = Utc::now();
        let since = until - Duration::days(days as i64);

        let total = self.host.count_commits(repo_name, since, until).await?;
        let plan = SamplePlan::new(total, COMMIT_SAMPLE_CAP);

        let commits = collect_sampled(plan, PAGE_SIZE as usize, |page| {
            self.host.fetch_commit_page(repo_name, since, until, page)
        })
        .await?;

        let activity = if commits.is_empty() {
            CommitActivity::empty()
        } else {
            let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
            let mut by_author: HashMap<String, u64> = HashMap::new();
            for commit in &commits {
                *daily.entry(commit.date.date_naive()).or_insert(0) += 1;
                let author = commit
                    .author
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string());
                *by_author.entry(author).or_insert(0) += 1;
            }

            let daily_commits = daily
                .into_iter()
                .map(|(date, count)| DailyCommitCount {
                    date,
                    count: plan.scale(count),
                })
                .collect();

            let mut authors: Vec<AuthorCommitCount> = by_author
                .into_iter()
                .map(|(author, count)| AuthorCommitCount {
                    author,
                    count: plan.scale(count),
                })
                .collect();
            authors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.author.cmp(&b.author)));

            CommitActivity {
                total_commits: plan.estimate_total(total, commits.len()),
                daily_commits,
                authors,
                is_sampled: plan.is_sampled,
                sampling_factor: plan.factor,
            }
        };

        info!(
            repo_name,
            days,
            total_commits = activity.total_commits,
            is_sampled = activity.is_sampled,
            "Analyzed commit activity"
        );

        self.write_cache(&key, &activity).await;
        Ok(activity)
    }

    /// Open and closed issues, each side independently sampled
    ///
    /// A repository with issues disabled (404/410 from the listing) yields
    /// an empty analysis, cached like any other result.
    pub async fn issues_analysis(&self, repo_name: &str) -> RepolensResult<IssueAnalysis> {
        let key = cache_key(
            "get_issues_analysis",
            repo_name,
            &[("max_issues", ISSUE_SAMPLE_CAP.to_string())],
        );
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let (open_issues_count, open_issues) =
            self.issues_for_state(repo_name, IssueState::Open).await?;
        let (closed_issues_count, closed_issues) =
            self.issues_for_state(repo_name, IssueState::Closed).await?;

        let analysis = IssueAnalysis {
            open_issues_count,
            closed_issues_count,
            open_issues,
            closed_issues,
        };

        self.write_cache(&key, &analysis).await;
        Ok(analysis)
    }

    async fn issues_for_state(
        &self,
        repo_name: &str,
        state: IssueState,
    ) -> RepolensResult<(u64, Vec<IssueRecord>)> {
        let total = match self.host.count_issues(repo_name, state).await {
            Ok(total) => total,
            Err(RepolensError::NotFound { .. }) => {
                debug!(
                    repo_name,
                    state = state.as_str(),
                    "Issue listing unavailable, treating as empty"
                );
                return Ok((0, Vec::new()));
            }
            Err(e) => return Err(e),
        };

        let plan = SamplePlan::new(total, ISSUE_SAMPLE_CAP);
        let issues = match collect_sampled(plan, PAGE_SIZE as usize, |page| {
            self.host.fetch_issue_page(repo_name, state, page)
        })
        .await
        {
            Ok(issues) => issues,
            Err(RepolensError::NotFound { .. }) => return Ok((0, Vec::new())),
            Err(e) => return Err(e),
        };

        Ok((plan.estimate_total(total, issues.len()), issues))
    }

    /// Per-language byte counts with percentages
    pub async fn languages(&self, repo_name: &str) -> RepolensResult<LanguageBreakdown> {
        let key = cache_key("get_languages", repo_name, &[]);
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let byte_counts = self.host.fetch_languages(repo_name).await?;
        let total_bytes: u64 = byte_counts.values().sum();

        let mut languages: Vec<LanguageStat> = byte_counts
            .into_iter()
            .map(|(language, bytes)| {
                let percentage = if total_bytes > 0 {
                    round2(bytes as f64 / total_bytes as f64 * 100.0)
                } else {
                    0.0
                };
                LanguageStat {
                    language,
                    bytes,
                    percentage,
                }
            })
            .collect();
        languages.sort_by(|a, b| {
            b.percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.language.cmp(&b.language))
        });

        let breakdown = LanguageBreakdown {
            total_bytes,
            languages,
        };

        self.write_cache(&key, &breakdown).await;
        Ok(breakdown)
    }

    /// Composite overview: metadata + top contributors + languages +
    /// 30-day commit activity
    ///
    /// The nested accessors populate their own cache entries on the way
    /// through; the composite is cached under its own key as well.
    pub async fn overview(&self, repo_name: &str) -> RepolensResult<RepositoryOverview> {
        let key = cache_key("get_repository_overview", repo_name, &[]);
        if let Some(hit) = self.read_cache(&key).await {
            return Ok(hit);
        }

        let repository = self.repository(repo_name).await?;
        let contributors = self
            .contributors(repo_name, OVERVIEW_CONTRIBUTOR_LIMIT)
            .await?;
        let languages = self.languages(repo_name).await?;
        let commit_activity = self
            .commit_activity(repo_name, OVERVIEW_ACTIVITY_DAYS)
            .await?;

        let overview = RepositoryOverview {
            repository,
            contributors,
            languages,
            commit_activity,
        };

        self.write_cache(&key, &overview).await;
        Ok(overview)
    }
}
