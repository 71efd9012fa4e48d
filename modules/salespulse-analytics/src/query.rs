use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;

use salespulse_common::{Platform, QueryError};
use salespulse_store::EventFilter;

pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: usize = 100;
/// Length of the default window, today included.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;
/// Upper bound on the range length, so a daily trend stays a sane size.
pub const MAX_RANGE_DAYS: i64 = 3660;

/// Raw query-string parameters of the dashboard endpoints. Everything is
/// optional text; validation happens in [`DashboardQuery::from_params`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub top_n: Option<String>,
    pub platform: Option<String>,
}

/// A validated dashboard request: an inclusive range of UTC calendar days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub top_n: usize,
    pub platform: Option<Platform>,
}

impl DashboardQuery {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        top_n: usize,
        platform: Option<Platform>,
    ) -> Result<Self, QueryError> {
        if start_date > end_date {
            return Err(QueryError::InvalidQuery(format!(
                "start_date {start_date} is after end_date {end_date}"
            )));
        }
        if (end_date - start_date).num_days() >= MAX_RANGE_DAYS {
            return Err(QueryError::InvalidQuery(format!(
                "date range exceeds {MAX_RANGE_DAYS} days"
            )));
        }
        if top_n == 0 {
            return Err(QueryError::InvalidQuery("top_n must be positive".into()));
        }
        if end_date.checked_add_days(Days::new(1)).is_none() {
            return Err(QueryError::InvalidQuery(format!(
                "end_date {end_date} is out of range"
            )));
        }

        Ok(Self {
            start_date,
            end_date,
            top_n: top_n.min(MAX_TOP_N),
            platform,
        })
    }

    /// The default window: the last 30 days ending `today`.
    pub fn last_days(today: NaiveDate) -> Self {
        Self {
            start_date: today - Days::new(DEFAULT_WINDOW_DAYS - 1),
            end_date: today,
            top_n: DEFAULT_TOP_N,
            platform: None,
        }
    }

    /// Validate query-string parameters. Missing dates fall back to the
    /// default window; an empty platform means all platforms.
    pub fn from_params(params: &DashboardParams, today: NaiveDate) -> Result<Self, QueryError> {
        let default = Self::last_days(today);

        let end_date = match non_empty(&params.end_date) {
            Some(raw) => parse_date("end_date", raw)?,
            None => default.end_date,
        };
        let start_date = match non_empty(&params.start_date) {
            Some(raw) => parse_date("start_date", raw)?,
            None if non_empty(&params.end_date).is_some() => end_date
                .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS - 1))
                .ok_or_else(|| {
                    QueryError::InvalidQuery(format!("end_date {end_date} is out of range"))
                })?,
            None => default.start_date,
        };
        let top_n = match non_empty(&params.top_n) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                QueryError::InvalidQuery(format!("top_n must be a positive integer, got {raw:?}"))
            })?,
            None => DEFAULT_TOP_N,
        };
        let platform = match non_empty(&params.platform) {
            Some(raw) if raw.eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(
                raw.parse::<Platform>()
                    .map_err(|e| QueryError::InvalidQuery(e.to_string()))?,
            ),
            None => None,
        };

        Self::new(start_date, end_date, top_n, platform)
    }

    /// Half-open instant range `[start 00:00, end+1 00:00)` in UTC. An end
    /// date on the last representable day is clamped to that day's start.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let until = self
            .end_date
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end_date)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (from, until)
    }

    /// Store filter covering exactly this query.
    pub fn filter(&self) -> EventFilter {
        let (from, until) = self.window();
        EventFilter::new().platform(self.platform).between(from, until)
    }

    /// Every calendar day in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |d| *d <= end)
    }

    pub fn num_days(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| QueryError::InvalidQuery(format!("{name} must be YYYY-MM-DD, got {raw:?}")))
}
