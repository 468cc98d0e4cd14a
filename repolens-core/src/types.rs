//! Core data type definitions
//!
//! Every record here is a read-only snapshot constructed from the hosting
//! API (or from cache) and serialized straight into a JSON response.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Repository information - basic metadata about a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub language: Option<String>,
}

/// A contributor with their contribution count, in provider order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorStat {
    pub login: String,
    pub id: u64,
    pub contributions: u64,
    pub url: String,
    pub avatar_url: String,
}

/// A single language's share of the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub language: String,
    pub bytes: u64,
    pub percentage: f64,
}

/// Per-language byte counts, sorted by percentage descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageBreakdown {
    pub total_bytes: u64,
    pub languages: Vec<LanguageStat>,
}

/// Commit count for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCommitCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Commit count for a single author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCommitCount {
    pub author: String,
    pub count: u64,
}

/// Commit activity over a date window
///
/// When `is_sampled` is true every count is `raw_count * sampling_factor`,
/// an estimate rather than an exact total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitActivity {
    pub total_commits: u64,
    pub daily_commits: Vec<DailyCommitCount>,
    pub authors: Vec<AuthorCommitCount>,
    pub is_sampled: bool,
    pub sampling_factor: u64,
}

impl CommitActivity {
    /// Activity record for a window with no commits
    pub fn empty() -> Self {
        Self {
            total_commits: 0,
            daily_commits: Vec::new(),
            authors: Vec::new(),
            is_sampled: false,
            sampling_factor: 1,
        }
    }
}

/// A single issue, as listed by the hosting API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub user: String,
}

/// Open and closed issues, each list independently sampled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueAnalysis {
    pub open_issues_count: u64,
    pub closed_issues_count: u64,
    pub open_issues: Vec<IssueRecord>,
    pub closed_issues: Vec<IssueRecord>,
}

impl IssueAnalysis {
    /// Analysis for a repository with no issues (or issues disabled)
    pub fn empty() -> Self {
        Self {
            open_issues_count: 0,
            closed_issues_count: 0,
            open_issues: Vec::new(),
            closed_issues: Vec::new(),
        }
    }
}

/// Composite overview: repository + contributors + languages + activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryOverview {
    pub repository: RepoInfo,
    pub contributors: Vec<ContributorStat>,
    pub languages: LanguageBreakdown,
    pub commit_activity: CommitActivity,
}

/// Derived issue metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueMetrics {
    pub open_issues: u64,
    pub closed_issues: u64,
    pub total_issues: u64,
    pub resolution_rate: f64,
}

/// Daily commit count with its date re-serialized as a canonical ISO string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: u64,
}

/// Derived commit trends over a window of days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitTrends {
    pub total_commits: u64,
    pub daily_commits: Vec<TrendPoint>,
    pub author_contributions: Vec<AuthorCommitCount>,
    pub avg_commits_per_day: f64,
}

/// Top languages with the remainder folded into "Other"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageAnalysis {
    pub languages: Vec<LanguageStat>,
    pub total_bytes: u64,
}

/// Combined result of the four concurrent analytics operations
///
/// Field order is fixed regardless of task completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub overview: RepositoryOverview,
    pub commits: CommitTrends,
    pub issues: IssueMetrics,
    pub languages: LanguageAnalysis,
    /// Wall-clock seconds spent on the fan-out, rounded to 2 decimals
    pub analysis_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_record_omits_absent_timestamps() {
        let record = IssueRecord {
            number: 7,
            title: "Panic on empty input".to_string(),
            state: "open".to_string(),
            created_at: Utc::now(),
            updated_at: Some(Utc::now()),
            closed_at: None,
            user: "alice".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("updated_at").is_some());
        assert!(json.get("closed_at").is_none());
    }

    #[test]
    fn test_daily_commit_count_date_is_iso() {
        let day = DailyCommitCount {
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            count: 4,
        };

        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["date"], "2024-03-09");
    }
}
