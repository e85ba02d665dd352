//! Analytics stats queries.
//!
//! The reporting window is derived from a single captured `now`: it ends one
//! hour before `now` and spans `hours` hours back from there.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::proxy::transform::segment;

/// Timestamp layout the analytics API expects in `timeRange`.
const TIME_RANGE_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Query string accepted by `GET /environments/:env/stats/:dimension`.
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub hours: Option<String>,
    pub select: Option<String>,
    #[serde(rename = "timeUnit")]
    pub time_unit: Option<String>,
}

/// `start~end` for a window of `hours` ending one hour before `now`.
/// `None` when the arithmetic leaves chrono's representable range.
pub fn time_range(now: DateTime<Utc>, hours: u32) -> Option<String> {
    let end = now.checked_sub_signed(Duration::hours(1))?;
    let start = end.checked_sub_signed(Duration::hours(i64::from(hours)))?;
    Some(format!(
        "{}~{}",
        start.format(TIME_RANGE_FORMAT),
        end.format(TIME_RANGE_FORMAT)
    ))
}

/// Builds the upstream path suffix for a stats request.
pub fn stats_path(
    env: &str,
    dimension: &str,
    params: &StatsParams,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let raw_hours = required(&params.hours, "hours")?;
    let hours: u32 = raw_hours.trim().parse().map_err(|_| {
        AppError::InvalidQuery(format!(
            "hours must be a non-negative integer, got '{}'",
            raw_hours
        ))
    })?;
    let select = required(&params.select, "select")?;
    let time_unit = required(&params.time_unit, "timeUnit")?;

    let range = time_range(now, hours)
        .ok_or_else(|| AppError::InvalidQuery(format!("hours={} is out of range", hours)))?;

    Ok(format!(
        "/e/{}/stats/{}?select={}&timeRange={}&timeUnit={}",
        segment(env),
        segment(dimension),
        urlencoding::encode(select),
        urlencoding::encode(&range),
        urlencoding::encode(time_unit),
    ))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidQuery(format!("missing query parameter '{}'", name)))
}
