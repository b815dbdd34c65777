//! Source of "today" and timestamps.

use chrono::NaiveDate;

pub trait Clock {
    /// Local calendar date.
    fn today(&self) -> NaiveDate;
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Browser clock backed by `Date`.
#[cfg(target_arch = "wasm32")]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn today(&self) -> NaiveDate {
        let d = js_sys::Date::new_0();
        // getMonth() is 0-based.
        NaiveDate::from_ymd_opt(d.get_full_year() as i32, d.get_month() + 1, d.get_date())
            .unwrap_or_default()
    }

    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

/// Host clock for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Clone, Debug)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub ms: i64,
}

#[cfg(test)]
impl FixedClock {
    pub fn on(ymd: &str) -> Self {
        Self {
            date: NaiveDate::parse_from_str(ymd, "%Y-%m-%d").unwrap(),
            ms: 1_700_000_000_000,
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_ms(&self) -> i64 {
        self.ms
    }
}
