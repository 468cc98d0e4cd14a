//! Test doubles for the hosting API
//!
//! `MockHost` serves canned data with per-method call counters so tests can
//! assert that cached paths skip the upstream entirely.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use repolens_core::{
    ContributorStat, ErrorContext, IssueRecord, RepoInfo, RepolensError, RepolensResult,
};

use crate::api::{IssueState, RawCommit, RepositoryHost, PAGE_SIZE};

#[derive(Default)]
pub struct CallCounts {
    pub fetch_repository: AtomicUsize,
    pub fetch_contributors: AtomicUsize,
    pub count_commits: AtomicUsize,
    pub fetch_commit_page: AtomicUsize,
    pub count_issues: AtomicUsize,
    pub fetch_issue_page: AtomicUsize,
    pub fetch_languages: AtomicUsize,
}

pub struct MockHost {
    pub repo: RepoInfo,
    pub contributors: Vec<ContributorStat>,
    pub commit_total: Option<u64>,
    pub commits: Vec<RawCommit>,
    pub open_total: Option<u64>,
    pub open_issues: Vec<IssueRecord>,
    pub closed_total: Option<u64>,
    pub closed_issues: Vec<IssueRecord>,
    pub languages: BTreeMap<String, u64>,
    /// Report 404 on issue listings, as GitHub does when issues are disabled
    pub issues_disabled: bool,
    /// Fail every commit operation with a generic upstream error
    pub fail_commits: bool,
    /// Fail every issue operation with a generic upstream error
    pub fail_issues: bool,
    pub calls: CallCounts,
}

impl MockHost {
    pub fn new() -> Self {
        let commits = make_commits(10);
        let open_issues = make_issues(3, IssueState::Open);
        let closed_issues = make_issues(7, IssueState::Closed);

        let mut languages = BTreeMap::new();
        languages.insert("Rust".to_string(), 6000);
        languages.insert("TOML".to_string(), 4000);

        Self {
            repo: sample_repo(),
            contributors: vec![
                sample_contributor("alice", 1, 120),
                sample_contributor("bob", 2, 45),
            ],
            commit_total: Some(commits.len() as u64),
            commits,
            open_total: Some(3),
            open_issues,
            closed_total: Some(7),
            closed_issues,
            languages,
            issues_disabled: false,
            fail_commits: false,
            fail_issues: false,
            calls: CallCounts::default(),
        }
    }

    pub fn with_commits(mut self, commits: Vec<RawCommit>, total: Option<u64>) -> Self {
        self.commit_total = total;
        self.commits = commits;
        self
    }

    fn upstream_failure(&self, operation: &str) -> RepolensError {
        RepolensError::Upstream {
            message: format!("mock upstream failure in {operation}"),
            source: None,
            context: ErrorContext::new("mock_host").with_operation(operation),
        }
    }

    fn not_found(&self, resource: &str) -> RepolensError {
        RepolensError::NotFound {
            resource: resource.to_string(),
            context: ErrorContext::new("mock_host"),
        }
    }
}

pub fn sample_repo() -> RepoInfo {
    RepoInfo {
        name: "widgets".to_string(),
        full_name: "acme/widgets".to_string(),
        owner: "acme".to_string(),
        description: Some("Widget factory".to_string()),
        url: "https://github.com/acme/widgets".to_string(),
        stars: 42,
        forks: 7,
        watchers: 42,
        open_issues: 3,
        created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        language: Some("Rust".to_string()),
    }
}

pub fn sample_contributor(login: &str, id: u64, contributions: u64) -> ContributorStat {
    ContributorStat {
        login: login.to_string(),
        id,
        contributions,
        url: format!("https://github.com/{login}"),
        avatar_url: format!("https://avatars.githubusercontent.com/u/{id}"),
    }
}

/// Commits spread over consecutive days, ten per day, alternating authors
pub fn make_commits(n: usize) -> Vec<RawCommit> {
    let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    (0..n)
        .map(|i| {
            let date = base + chrono::Duration::days((i / 10) as i64);
            RawCommit {
                sha: format!("sha{i:04}"),
                author: Some(if i % 2 == 0 { "alice" } else { "bob" }.to_string()),
                date: date_at_noon(date),
                message: format!("commit {i}"),
            }
        })
        .collect()
}

pub fn make_issues(n: usize, state: IssueState) -> Vec<IssueRecord> {
    let created = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| IssueRecord {
            number: i as u64 + 1,
            title: format!("issue {i}"),
            state: state.as_str().to_string(),
            created_at: created,
            updated_at: matches!(state, IssueState::Open).then_some(created),
            closed_at: matches!(state, IssueState::Closed).then_some(created),
            user: "alice".to_string(),
        })
        .collect()
}

fn date_at_noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

fn page_slice<T: Clone>(items: &[T], page: u64) -> Vec<T> {
    let start = ((page - 1) * PAGE_SIZE) as usize;
    let end = (start + PAGE_SIZE as usize).min(items.len());
    items[start.min(items.len())..end].to_vec()
}

#[async_trait]
impl RepositoryHost for MockHost {
    async fn fetch_repository(&self, _repo_name: &str) -> RepolensResult<RepoInfo> {
        self.calls.fetch_repository.fetch_add(1, Ordering::SeqCst);
        Ok(self.repo.clone())
    }

    async fn fetch_contributors(
        &self,
        _repo_name: &str,
        limit: usize,
    ) -> RepolensResult<Vec<ContributorStat>> {
        self.calls.fetch_contributors.fetch_add(1, Ordering::SeqCst);
        Ok(self.contributors.iter().take(limit).cloned().collect())
    }

    async fn count_commits(
        &self,
        _repo_name: &str,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> RepolensResult<Option<u64>> {
        self.calls.count_commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits {
            return Err(self.upstream_failure("count_commits"));
        }
        Ok(self.commit_total)
    }

    async fn fetch_commit_page(
        &self,
        _repo_name: &str,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
        page: u64,
    ) -> RepolensResult<Vec<RawCommit>> {
        self.calls.fetch_commit_page.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits {
            return Err(self.upstream_failure("fetch_commit_page"));
        }
        Ok(page_slice(&self.commits, page))
    }

    async fn count_issues(
        &self,
        repo_name: &str,
        state: IssueState,
    ) -> RepolensResult<Option<u64>> {
        self.calls.count_issues.fetch_add(1, Ordering::SeqCst);
        if self.fail_issues {
            return Err(self.upstream_failure("count_issues"));
        }
        if self.issues_disabled {
            return Err(self.not_found(&format!("repos/{repo_name}/issues")));
        }
        Ok(match state {
            IssueState::Open => self.open_total,
            IssueState::Closed => self.closed_total,
        })
    }

    async fn fetch_issue_page(
        &self,
        _repo_name: &str,
        state: IssueState,
        page: u64,
    ) -> RepolensResult<Vec<IssueRecord>> {
        self.calls.fetch_issue_page.fetch_add(1, Ordering::SeqCst);
        if self.fail_issues {
            return Err(self.upstream_failure("fetch_issue_page"));
        }
        let items = match state {
            IssueState::Open => &self.open_issues,
            IssueState::Closed => &self.closed_issues,
        };
        Ok(page_slice(items, page))
    }

    async fn fetch_languages(&self, _repo_name: &str) -> RepolensResult<BTreeMap<String, u64>> {
        self.calls.fetch_languages.fetch_add(1, Ordering::SeqCst);
        Ok(self.languages.clone())
    }

    async fn verify_credentials(&self) -> RepolensResult<String> {
        Ok("mock-user".to_string())
    }
}
