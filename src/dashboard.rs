//! A user's dashboard: profile, goal history, nailed posts and followers,
//! fetched concurrently, plus the chart bucketing the history view renders.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiError},
    models::{Goal, GoalStatus, Post, User},
};

pub struct DashboardService {
    api: Arc<ApiClient>,
}

#[derive(Debug, Clone)]
pub struct DashboardData {
    pub profile: User,
    pub goals: Vec<Goal>,
    pub nailed_posts: Vec<Post>,
    pub followers: Vec<User>,
}

impl DashboardService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn load(&self, user_id: i64) -> Result<DashboardData, ApiError> {
        let (profile, goals, nailed_posts, followers) = futures::try_join!(
            self.api.fetch_profile(user_id),
            self.api.fetch_goals(user_id),
            self.api.fetch_nailed_posts(user_id),
            self.api.fetch_followers(user_id),
        )?;

        Ok(DashboardData {
            profile,
            goals,
            nailed_posts,
            followers,
        })
    }
}

impl DashboardData {
    pub fn nailed_goals(&self) -> Vec<Goal> {
        self.partition(GoalStatus::NailedIt)
    }

    pub fn failed_goals(&self) -> Vec<Goal> {
        self.partition(GoalStatus::FailedOut)
    }

    pub fn is_followed_by(&self, viewer_id: i64) -> bool {
        self.followers.iter().any(|user| user.id == viewer_id)
    }

    fn partition(&self, status: GoalStatus) -> Vec<Goal> {
        self.goals
            .iter()
            .filter(|goal| goal.status == status)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartPeriod {
    Day,
    Week,
    Month,
    Year,
}

/// One chart bar: nailed and failed minutes under a shared label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub nailed_minutes: u32,
    pub failed_minutes: u32,
}

const DAY_SLOT_LABELS: [&str; 6] = ["0-4", "4-8", "8-12", "12-16", "16-20", "20-24"];

/// Buckets goal history for the dashboard chart. The nailed series drives the
/// labels; failed minutes are merged in by label afterwards, and new labels
/// seen only in the failed series are appended. The failed series is only
/// rendered on the owner's view.
///
/// An empty nailed history yields an empty chart even when failures exist,
/// matching how the history view has always rendered.
pub fn chart_points(
    nailed: &[Goal],
    failed: &[Goal],
    period: ChartPeriod,
    now: DateTime<Utc>,
    own_profile: bool,
) -> Vec<ChartPoint> {
    if nailed.is_empty() {
        return Vec::new();
    }

    let mut points: Vec<ChartPoint> = bucket_series(nailed, period, now)
        .into_iter()
        .map(|(label, minutes)| ChartPoint {
            label,
            nailed_minutes: minutes,
            failed_minutes: 0,
        })
        .collect();

    if !own_profile {
        return points;
    }

    for (label, minutes) in bucket_series(failed, period, now) {
        match points.iter_mut().find(|point| point.label == label) {
            Some(point) => point.failed_minutes = minutes,
            None => points.push(ChartPoint {
                label,
                nailed_minutes: 0,
                failed_minutes: minutes,
            }),
        }
    }

    points
}

/// Sums goal durations per bucket. Day charts always show all six 4-hour
/// slots of today; the other periods emit labels in first-seen order.
fn bucket_series(goals: &[Goal], period: ChartPeriod, now: DateTime<Utc>) -> Vec<(String, u32)> {
    match period {
        ChartPeriod::Day => {
            let mut slots = [0u32; 6];
            for goal in goals {
                if goal.created_at.date_naive() == now.date_naive() {
                    let slot = (goal.created_at.hour() / 4) as usize;
                    slots[slot] += goal.duration_minutes;
                }
            }
            DAY_SLOT_LABELS
                .iter()
                .zip(slots)
                .map(|(label, minutes)| (label.to_string(), minutes))
                .collect()
        }
        ChartPeriod::Week => {
            let cutoff = now - Duration::days(7);
            accumulate_by_label(
                goals.iter().filter(|goal| goal.created_at >= cutoff),
                "%b %d",
            )
        }
        ChartPeriod::Month => {
            let cutoff = now - Duration::days(30);
            accumulate_by_label(
                goals.iter().filter(|goal| goal.created_at >= cutoff),
                "%b %d",
            )
        }
        ChartPeriod::Year => accumulate_by_label(
            goals.iter().filter(|goal| goal.created_at.year() == now.year()),
            "%b",
        ),
    }
}

fn accumulate_by_label<'a>(
    goals: impl Iterator<Item = &'a Goal>,
    label_format: &str,
) -> Vec<(String, u32)> {
    let mut series: Vec<(String, u32)> = Vec::new();
    for goal in goals {
        let label = goal.created_at.format(label_format).to_string();
        match series.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, minutes)) => *minutes += goal.duration_minutes,
            None => series.push((label, goal.duration_minutes)),
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(status: GoalStatus, duration_minutes: u32, created_at: &str) -> Goal {
        Goal {
            id: 1,
            user_id: 1,
            title: "read".into(),
            duration_minutes,
            status,
            created_at: created_at.parse().unwrap(),
        }
    }

    fn nailed(duration_minutes: u32, created_at: &str) -> Goal {
        goal(GoalStatus::NailedIt, duration_minutes, created_at)
    }

    fn failed(duration_minutes: u32, created_at: &str) -> Goal {
        goal(GoalStatus::FailedOut, duration_minutes, created_at)
    }

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: None,
            profile_image: None,
        }
    }

    #[test]
    fn partitions_goals_by_terminal_status() {
        let data = DashboardData {
            profile: user(1),
            goals: vec![
                nailed(10, "2026-08-05T09:00:00Z"),
                failed(20, "2026-08-05T10:00:00Z"),
                goal(GoalStatus::InProgress, 30, "2026-08-05T11:00:00Z"),
            ],
            nailed_posts: Vec::new(),
            followers: vec![user(7)],
        };

        assert_eq!(data.nailed_goals().len(), 1);
        assert_eq!(data.failed_goals().len(), 1);
        assert!(data.is_followed_by(7));
        assert!(!data.is_followed_by(8));
    }

    #[test]
    fn day_chart_buckets_todays_goals_into_four_hour_slots() {
        let now: DateTime<Utc> = "2026-08-05T18:00:00Z".parse().unwrap();
        let nailed = vec![
            nailed(25, "2026-08-05T01:30:00Z"),
            nailed(15, "2026-08-05T02:00:00Z"),
            nailed(40, "2026-08-05T13:10:00Z"),
            // Yesterday; excluded from the day view.
            nailed(90, "2026-08-04T13:10:00Z"),
        ];

        let points = chart_points(&nailed, &[], ChartPeriod::Day, now, true);

        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["0-4", "4-8", "8-12", "12-16", "16-20", "20-24"]);
        assert_eq!(points[0].nailed_minutes, 40);
        assert_eq!(points[3].nailed_minutes, 40);
        assert_eq!(points[5].nailed_minutes, 0);
    }

    #[test]
    fn week_chart_excludes_goals_older_than_seven_days() {
        let now: DateTime<Utc> = "2026-08-05T12:00:00Z".parse().unwrap();
        let nailed = vec![
            nailed(30, "2026-08-04T08:00:00Z"),
            nailed(20, "2026-08-04T21:00:00Z"),
            nailed(60, "2026-07-20T08:00:00Z"),
        ];

        let points = chart_points(&nailed, &[], ChartPeriod::Week, now, true);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, "Aug 04");
        assert_eq!(points[0].nailed_minutes, 50);
    }

    #[test]
    fn merge_keeps_first_seen_label_order_and_appends_failed_only_labels() {
        let now: DateTime<Utc> = "2026-08-05T12:00:00Z".parse().unwrap();
        let nailed = vec![
            nailed(30, "2026-08-03T08:00:00Z"),
            nailed(20, "2026-08-04T08:00:00Z"),
        ];
        let failed = vec![
            failed(10, "2026-08-04T09:00:00Z"),
            failed(5, "2026-08-05T09:00:00Z"),
        ];

        let points = chart_points(&nailed, &failed, ChartPeriod::Week, now, true);

        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Aug 03", "Aug 04", "Aug 05"]);
        assert_eq!(points[1].nailed_minutes, 20);
        assert_eq!(points[1].failed_minutes, 10);
        assert_eq!(points[2].nailed_minutes, 0);
        assert_eq!(points[2].failed_minutes, 5);
    }

    #[test]
    fn failed_series_is_omitted_on_another_users_profile() {
        let now: DateTime<Utc> = "2026-08-05T12:00:00Z".parse().unwrap();
        let nailed = vec![nailed(30, "2026-08-04T08:00:00Z")];
        let failed = vec![failed(10, "2026-08-04T09:00:00Z")];

        let points = chart_points(&nailed, &failed, ChartPeriod::Week, now, false);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].failed_minutes, 0);
    }

    #[test]
    fn year_chart_buckets_by_month_since_january() {
        let now: DateTime<Utc> = "2026-08-05T12:00:00Z".parse().unwrap();
        let nailed = vec![
            nailed(30, "2026-02-10T08:00:00Z"),
            nailed(20, "2026-02-20T08:00:00Z"),
            nailed(15, "2026-08-01T08:00:00Z"),
            // Last year; excluded.
            nailed(99, "2025-12-30T08:00:00Z"),
        ];

        let points = chart_points(&nailed, &[], ChartPeriod::Year, now, true);

        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Feb", "Aug"]);
        assert_eq!(points[0].nailed_minutes, 50);
    }

    #[test]
    fn empty_nailed_history_yields_an_empty_chart() {
        let now: DateTime<Utc> = "2026-08-05T12:00:00Z".parse().unwrap();
        let failed = vec![failed(10, "2026-08-04T09:00:00Z")];

        let points = chart_points(&[], &failed, ChartPeriod::Week, now, true);
        assert!(points.is_empty());
    }
}
