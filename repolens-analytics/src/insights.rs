//! Derived analytics views
//!
//! Thin layer over the analyzer that turns raw category records into the
//! metrics the API serves: resolution rates, per-day averages, and the
//! top-5-plus-"Other" language split.

use tracing::debug;

use repolens_core::{
    CommitTrends, IssueMetrics, LanguageAnalysis, LanguageStat, RepolensResult,
    RepositoryOverview, TrendPoint,
};

use crate::analyzer::RepoAnalyzer;
use crate::round2;

/// Default commit-trend window, in days
pub const DEFAULT_TREND_DAYS: u32 = 30;

/// Languages listed individually before folding the rest into "Other"
const TOP_LANGUAGES: usize = 5;

/// Derived views over a repository's analytics
pub struct RepositoryInsights {
    analyzer: RepoAnalyzer,
}

impl RepositoryInsights {
    pub fn new(analyzer: RepoAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Composite repository overview
    pub async fn overview(&self, repo_name: &str) -> RepolensResult<RepositoryOverview> {
        self.analyzer.overview(repo_name).await
    }

    /// Commit trends over the trailing `days`-day window
    pub async fn commit_trends(&self, repo_name: &str, days: u32) -> RepolensResult<CommitTrends> {
        let activity = self.analyzer.commit_activity(repo_name, days).await?;

        let daily_commits = activity
            .daily_commits
            .iter()
            .map(|day| TrendPoint {
                date: day.date.format("%Y-%m-%d").to_string(),
                count: day.count,
            })
            .collect();

        let avg_commits_per_day = if days > 0 {
            round2(activity.total_commits as f64 / days as f64)
        } else {
            0.0
        };

        Ok(CommitTrends {
            total_commits: activity.total_commits,
            daily_commits,
            author_contributions: activity.authors,
            avg_commits_per_day,
        })
    }

    /// Issue resolution metrics
    pub async fn issue_metrics(&self, repo_name: &str) -> RepolensResult<IssueMetrics> {
        let analysis = self.analyzer.issues_analysis(repo_name).await?;

        let open_issues = analysis.open_issues_count;
        let closed_issues = analysis.closed_issues_count;
        let total_issues = open_issues + closed_issues;

        let resolution_rate = if total_issues > 0 {
            round2(closed_issues as f64 / total_issues as f64 * 100.0)
        } else {
            0.0
        };

        Ok(IssueMetrics {
            open_issues,
            closed_issues,
            total_issues,
            resolution_rate,
        })
    }

    /// Top languages, with everything past the fifth folded into "Other"
    pub async fn language_analysis(&self, repo_name: &str) -> RepolensResult<LanguageAnalysis> {
        let breakdown = self.analyzer.languages(repo_name).await?;

        let mut languages: Vec<LanguageStat> = breakdown
            .languages
            .iter()
            .take(TOP_LANGUAGES)
            .cloned()
            .collect();

        if breakdown.languages.len() > TOP_LANGUAGES {
            let folded = &breakdown.languages[TOP_LANGUAGES..];
            let other_percentage: f64 = folded.iter().map(|l| l.percentage).sum();
            let other_bytes: u64 = folded.iter().map(|l| l.bytes).sum();

            debug!(
                repo_name,
                folded = folded.len(),
                "Folding language tail into Other"
            );

            languages.push(LanguageStat {
                language: "Other".to_string(),
                bytes: other_bytes,
                percentage: round2(other_percentage),
            });
        }

        Ok(LanguageAnalysis {
            languages,
            total_bytes: breakdown.total_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::RepoAnalyzer;
    use crate::cache::MemoryCache;
    use crate::testing::{make_commits, MockHost};
    use std::sync::Arc;

    const REPO: &str = "acme/widgets";

    fn insights_with(host: MockHost) -> RepositoryInsights {
        let analyzer = RepoAnalyzer::new(Arc::new(host), Arc::new(MemoryCache::new()), 60);
        RepositoryInsights::new(analyzer)
    }

    #[tokio::test]
    async fn test_resolution_rate() {
        let insights = insights_with(MockHost::new());

        let metrics = insights.issue_metrics(REPO).await.unwrap();

        assert_eq!(metrics.open_issues, 3);
        assert_eq!(metrics.closed_issues, 7);
        assert_eq!(metrics.total_issues, 10);
        assert_eq!(metrics.resolution_rate, 70.0);
    }

    #[tokio::test]
    async fn test_resolution_rate_with_no_issues() {
        let mut host = MockHost::new();
        host.issues_disabled = true;
        let insights = insights_with(host);

        let metrics = insights.issue_metrics(REPO).await.unwrap();

        assert_eq!(metrics.total_issues, 0);
        assert_eq!(metrics.resolution_rate, 0.0);
    }

    #[tokio::test]
    async fn test_commit_trends_average_and_dates() {
        let host = MockHost::new().with_commits(make_commits(90), Some(90));
        let insights = insights_with(host);

        let trends = insights.commit_trends(REPO, 30).await.unwrap();

        assert_eq!(trends.total_commits, 90);
        assert_eq!(trends.avg_commits_per_day, 3.0);
        assert_eq!(trends.daily_commits[0].date, "2024-03-01");
    }

    #[tokio::test]
    async fn test_commit_trends_guards_zero_days() {
        let insights = insights_with(MockHost::new());

        let trends = insights.commit_trends(REPO, 0).await.unwrap();

        assert_eq!(trends.avg_commits_per_day, 0.0);
    }

    #[tokio::test]
    async fn test_language_analysis_folds_tail_into_other() {
        let mut host = MockHost::new();
        host.languages.clear();
        // Percentages 60/20/10/5/3/2 over 100kB.
        for (language, bytes) in [
            ("Rust", 60_000u64),
            ("C", 20_000),
            ("Python", 10_000),
            ("Shell", 5_000),
            ("TOML", 3_000),
            ("Dockerfile", 2_000),
        ] {
            host.languages.insert(language.to_string(), bytes);
        }
        let insights = insights_with(host);

        let analysis = insights.language_analysis(REPO).await.unwrap();

        // Top five plus the folded tail.
        assert_eq!(analysis.languages.len(), 6);
        assert_eq!(analysis.languages[0].language, "Rust");
        let other = analysis.languages.last().unwrap();
        assert_eq!(other.language, "Other");
        assert_eq!(other.percentage, 2.0);
        assert_eq!(other.bytes, 2_000);
        assert_eq!(analysis.total_bytes, 100_000);
    }

    #[tokio::test]
    async fn test_language_analysis_folds_multiple_entries() {
        let mut host = MockHost::new();
        host.languages.clear();
        for (language, bytes) in [
            ("Rust", 40_000u64),
            ("C", 20_000),
            ("Python", 15_000),
            ("Shell", 10_000),
            ("TOML", 8_000),
            ("Dockerfile", 4_000),
            ("Makefile", 3_000),
        ] {
            host.languages.insert(language.to_string(), bytes);
        }
        let insights = insights_with(host);

        let analysis = insights.language_analysis(REPO).await.unwrap();

        assert_eq!(analysis.languages.len(), 6);
        let other = analysis.languages.last().unwrap();
        assert_eq!(other.language, "Other");
        assert_eq!(other.bytes, 7_000);
        assert_eq!(other.percentage, 7.0);
    }

    #[tokio::test]
    async fn test_language_analysis_keeps_short_lists_intact() {
        let insights = insights_with(MockHost::new());

        let analysis = insights.language_analysis(REPO).await.unwrap();

        assert_eq!(analysis.languages.len(), 2);
        assert!(analysis.languages.iter().all(|l| l.language != "Other"));
    }
}
