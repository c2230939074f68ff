use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::error::UtilError;
use crate::Result;

/// A git timestamp with timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    /// Seconds since Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g., -300 for EST).
    pub tz_offset: i32,
}

/// Git timezone offset stored as integer (e.g. -0500 for EST = -500 integer).
/// This is the same format C git uses: the "decimal parse" where -0100 => -100.
fn tz_offset_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    let hours = abs / 100;
    let mins = abs % 100;
    sign * (hours * 60 + mins)
}

/// Convert minutes offset to the git-style decimal representation.
fn minutes_to_tz_offset(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    let hours = abs / 60;
    let mins = abs % 60;
    sign * (hours * 100 + mins)
}

impl GitDate {
    /// Create a GitDate from a Unix timestamp and timezone offset in minutes.
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// Get the current time as a GitDate with the local timezone offset.
    pub fn now() -> Self {
        let now = Local::now();
        let offset_secs = now.offset().local_minus_utc();
        Self {
            timestamp: now.timestamp(),
            tz_offset: offset_secs / 60,
        }
    }

    /// Parse raw git format: "timestamp +/-offset" or just "timestamp".
    pub fn parse_raw(input: &str) -> Result<Self> {
        let input = input.trim();

        let parts: Vec<&str> = input.splitn(2, ' ').collect();

        let timestamp: i64 = parts[0]
            .parse()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp: '{}'", parts[0])))?;

        let tz_offset = if parts.len() > 1 {
            let tz_str = parts[1].trim();
            let tz_int: i32 = tz_str
                .parse()
                .map_err(|_| UtilError::DateParse(format!("invalid timezone: '{}'", tz_str)))?;
            tz_offset_to_minutes(tz_int)
        } else {
            0
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Format in git's raw form: `"<timestamp> ±HHMM"`.
    pub fn format_raw(&self) -> String {
        let tz = minutes_to_tz_offset(self.tz_offset);
        format!("{} {:+05}", self.timestamp, tz)
    }
}

/// Author/committer identity with timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    /// Parse from git format: `Name <email> timestamp tz`
    ///
    /// Example: "John Doe <john@example.com> 1234567890 +0000"
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        // Find the last '>' to split off the date portion
        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::DateParse("missing '>' in signature".into()))?;

        // Find the '<' for the email
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::DateParse("missing '<' in signature".into()))?;

        // Name is everything before '<', trimmed
        let name = input[..lt_pos].trim();

        // Email is between '<' and '>'
        let email = &input[lt_pos + 1..gt_pos];

        // Date is everything after '>'
        let date_str = input[gt_pos + 1..].trim();
        let date_str = std::str::from_utf8(date_str)
            .map_err(|_| UtilError::DateParse("non-UTF-8 date in signature".into()))?;

        let date = GitDate::parse_raw(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    /// Format in git's canonical format: `Name <email> timestamp tz`
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.date.format_raw().as_bytes());
        out
    }
}
