//! Concurrent fan-out for the combined analysis
//!
//! Runs the four independent analytics operations as parallel tasks and
//! merges them once all four finish. Any failure fails the combined
//! operation as a whole; in-flight siblings run to completion.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinError;
use tracing::info;

use repolens_core::{ErrorContext, FullAnalysis, RepolensError, RepolensResult};

use crate::insights::{RepositoryInsights, DEFAULT_TREND_DAYS};
use crate::round2;

/// Run overview, commit trends, issue metrics, and language analysis
/// concurrently and merge them in fixed field order
pub async fn run_full_analysis(
    insights: Arc<RepositoryInsights>,
    repo_name: &str,
) -> RepolensResult<FullAnalysis> {
    let started = Instant::now();
    let repo = repo_name.to_string();

    let overview_task = tokio::spawn({
        let insights = insights.clone();
        let repo = repo.clone();
        async move { insights.overview(&repo).await }
    });
    let commits_task = tokio::spawn({
        let insights = insights.clone();
        let repo = repo.clone();
        async move { insights.commit_trends(&repo, DEFAULT_TREND_DAYS).await }
    });
    let issues_task = tokio::spawn({
        let insights = insights.clone();
        let repo = repo.clone();
        async move { insights.issue_metrics(&repo).await }
    });
    let languages_task = tokio::spawn({
        let insights = insights.clone();
        let repo = repo.clone();
        async move { insights.language_analysis(&repo).await }
    });

    // Awaiting in merge order makes the first error in field order win,
    // whatever order the tasks actually finish in.
    let overview = flatten(overview_task.await)?;
    let commits = flatten(commits_task.await)?;
    let issues = flatten(issues_task.await)?;
    let languages = flatten(languages_task.await)?;

    let analysis_time = round2(started.elapsed().as_secs_f64());

    info!(repo_name, analysis_time, "Combined analysis complete");

    Ok(FullAnalysis {
        overview,
        commits,
        issues,
        languages,
        analysis_time,
    })
}

fn flatten<T>(joined: Result<RepolensResult<T>, JoinError>) -> RepolensResult<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(RepolensError::Upstream {
            message: format!("Analysis task failed: {e}"),
            source: Some(Box::new(e)),
            context: ErrorContext::new("fanout").with_operation("run_full_analysis"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::RepoAnalyzer;
    use crate::cache::MemoryCache;
    use crate::testing::MockHost;

    const REPO: &str = "acme/widgets";

    fn insights_with(host: MockHost) -> Arc<RepositoryInsights> {
        let analyzer = RepoAnalyzer::new(Arc::new(host), Arc::new(MemoryCache::new()), 60);
        Arc::new(RepositoryInsights::new(analyzer))
    }

    #[tokio::test]
    async fn test_full_analysis_merges_all_four() {
        let insights = insights_with(MockHost::new());

        let analysis = run_full_analysis(insights, REPO).await.unwrap();

        assert_eq!(analysis.overview.repository.full_name, REPO);
        assert_eq!(analysis.commits.total_commits, 10);
        assert_eq!(analysis.issues.total_issues, 10);
        assert_eq!(analysis.languages.total_bytes, 10_000);
        assert!(analysis.analysis_time >= 0.0);
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_whole_analysis() {
        let mut host = MockHost::new();
        host.fail_issues = true;
        let insights = insights_with(host);

        let err = run_full_analysis(insights, REPO).await.unwrap_err();

        assert!(err.to_string().contains("mock upstream failure"));
    }

    #[tokio::test]
    async fn test_failure_in_first_field_wins() {
        let mut host = MockHost::new();
        host.fail_commits = true;
        let insights = insights_with(host);

        // Commits feed both the overview (field one) and the trends (field
        // two); the overview's error is the one reported.
        let err = run_full_analysis(insights, REPO).await.unwrap_err();
        assert!(err.to_string().contains("count_commits"));
    }
}
