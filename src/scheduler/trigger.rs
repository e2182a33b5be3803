/// Fixed-period triggers.
///
/// Periods accept the simplified form (`0.5s`, `10m`, `1h`, `2d`) and a subset
/// of ISO-8601 durations (`PT0.5S`, `PT1M30S`, `P1DT2H`).
use crate::error::SchedulerError;
use std::time::Duration;

/// Upper bound for periods and initial delays: 100 years.
pub const MAX_PERIOD: Duration = Duration::from_secs(100 * 365 * 86_400);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    id: String,
    every: Duration,
    delay: Duration,
}

impl Trigger {
    pub fn new(id: impl Into<String>, every: Duration) -> Result<Self, SchedulerError> {
        if every.is_zero() {
            return Err(SchedulerError::invalid_period(
                format!("{every:?}"),
                "period must be positive",
            ));
        }
        if every > MAX_PERIOD {
            return Err(SchedulerError::invalid_period(
                format!("{every:?}"),
                "period exceeds 100 years",
            ));
        }
        Ok(Self {
            id: id.into(),
            every,
            delay: Duration::ZERO,
        })
    }

    pub fn parse(id: impl Into<String>, every: &str) -> Result<Self, SchedulerError> {
        Self::new(id, parse_period(every)?)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn every(&self) -> Duration {
        self.every
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Rejects an initial delay too large to schedule.
    pub fn check_delay(&self) -> Result<(), SchedulerError> {
        if self.delay > MAX_PERIOD {
            return Err(SchedulerError::invalid_period(
                format!("{:?}", self.delay),
                "delay exceeds 100 years",
            ));
        }
        Ok(())
    }
}

/// Parses a trigger period. Zero is rejected.
pub fn parse_period(value: &str) -> Result<Duration, SchedulerError> {
    let duration = parse_bounded(value)?;
    if duration.is_zero() {
        return Err(SchedulerError::invalid_period(value, "period must be positive"));
    }
    Ok(duration)
}

/// Parses an initial delay. `0s` means no delay.
pub fn parse_delay(value: &str) -> Result<Duration, SchedulerError> {
    parse_bounded(value)
}

fn parse_bounded(value: &str) -> Result<Duration, SchedulerError> {
    let trimmed = value.trim();
    let parsed = match trimmed.chars().next() {
        None => Err("period is empty".to_string()),
        Some(c) if c.is_ascii_digit() => parse_simplified(trimmed),
        Some('P') | Some('p') => parse_iso(trimmed),
        Some(_) => Err("expected a number with a unit or an ISO-8601 duration".to_string()),
    };

    let duration = parsed.map_err(|reason| SchedulerError::invalid_period(value, reason))?;
    if duration > MAX_PERIOD {
        return Err(SchedulerError::invalid_period(value, "exceeds 100 years"));
    }
    Ok(duration)
}

fn parse_simplified(value: &str) -> Result<Duration, String> {
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or("missing unit (s, m, h or d)")?;
    let (number, unit) = value.split_at(split);
    let amount: f64 = number
        .parse()
        .map_err(|_| format!("invalid number '{number}'"))?;

    let factor = match unit.to_ascii_lowercase().as_str() {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3_600.0,
        "d" => 86_400.0,
        other => return Err(format!("unknown unit '{other}'")),
    };
    seconds(amount * factor)
}

fn parse_iso(value: &str) -> Result<Duration, String> {
    let upper = value.to_ascii_uppercase();
    let body = &upper[1..];
    let (date, time) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    if date.is_empty() && time.map_or(true, str::is_empty) {
        return Err("duration has no components".to_string());
    }

    let mut total = components(date, &[('D', 86_400.0)])?;
    if let Some(time) = time {
        if time.is_empty() {
            return Err("time designator 'T' without components".to_string());
        }
        total += components(time, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)])?;
    }
    seconds(total)
}

/// Sums `<number><designator>` pairs, designators in the given order.
fn components(part: &str, units: &[(char, f64)]) -> Result<f64, String> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next = 0;

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let offset = units[next..]
            .iter()
            .position(|(unit, _)| *unit == c)
            .ok_or_else(|| format!("unexpected designator '{c}'"))?;
        let (_, factor) = units[next + offset];
        let amount: f64 = number
            .parse()
            .map_err(|_| format!("missing amount before '{c}'"))?;
        total += amount * factor;
        number.clear();
        next += offset + 1;
    }

    if !number.is_empty() {
        return Err(format!("number '{number}' has no designator"));
    }
    Ok(total)
}

fn seconds(value: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(value).map_err(|e| e.to_string())
}
