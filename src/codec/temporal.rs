//! Calendar/time types and their binary + text wire layouts (spec §4.3, §6).

use super::{BufExt, BufMutExt};
use crate::error::Error;

/// A MySQL `DATE`. `0000-00-00` ("zero date") is representable, per spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MyDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A MySQL `DATETIME`/`TIMESTAMP`. Spec's Open Questions note this is treated as a naive
/// local/session value with no timezone attached — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MyDateTime {
    pub date: MyDate,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

/// A MySQL `TIME`: a signed duration, not a time-of-day. `|hours| <= 838` per spec §3/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MyTime {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub micros: u32,
}

impl MyDate {
    /// Binary layout: always exactly 4 bytes when present (length prefix handled by caller).
    pub fn decode_binary(buf: &mut &[u8]) -> Result<Self, Error> {
        Ok(MyDate {
            year: buf.get_u16_le_checked("date.year")? as u16,
            month: buf.get_u8_checked("date.month")?,
            day: buf.get_u8_checked("date.day")?,
        })
    }

    pub fn encode_binary(&self, out: &mut Vec<u8>) {
        out.put_u16_le(self.year);
        out.put_u8(self.month);
        out.put_u8(self.day);
    }

    /// `YYYY-MM-DD` (spec §6 temporal text formats).
    pub fn parse_text(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(3, '-');
        let bad = || Error::ProtocolValueError(format!("invalid DATE text: {s:?}"));
        let year = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let month = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let day = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        Ok(MyDate { year, month, day })
    }

    pub fn format_text(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    pub fn is_zero(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }
}

impl MyDateTime {
    /// Length-prefixed binary layout: 0 (zero datetime), 4 (date only), 7 (+ h/m/s), or
    /// 11 bytes (+ microseconds), per spec §4.3.
    pub fn decode_binary(buf: &mut &[u8]) -> Result<Self, Error> {
        let len = buf.get_u8_checked("datetime length prefix")?;
        let mut v = MyDateTime::default();
        if len == 0 {
            return Ok(v);
        }
        v.date = MyDate::decode_binary(buf)?;
        if len >= 7 {
            v.hour = buf.get_u8_checked("datetime.hour")?;
            v.minute = buf.get_u8_checked("datetime.minute")?;
            v.second = buf.get_u8_checked("datetime.second")?;
        }
        if len >= 11 {
            v.micros = buf.get_u32_le_checked("datetime.micros")?;
        }
        Ok(v)
    }

    pub fn encode_binary(&self, out: &mut Vec<u8>) {
        let needs_micros = self.micros != 0;
        let needs_time = needs_micros || self.hour != 0 || self.minute != 0 || self.second != 0;
        let len: u8 = if needs_micros {
            11
        } else if needs_time {
            7
        } else {
            4
        };
        out.put_u8(len);
        if len == 0 {
            return;
        }
        self.date.encode_binary(out);
        if len >= 7 {
            out.put_u8(self.hour);
            out.put_u8(self.minute);
            out.put_u8(self.second);
        }
        if len >= 11 {
            out.put_u32_le(self.micros);
        }
    }

    /// `YYYY-MM-DD HH:MM:SS[.ffffff]` (spec §6).
    pub fn parse_text(s: &str) -> Result<Self, Error> {
        let bad = || Error::ProtocolValueError(format!("invalid DATETIME text: {s:?}"));
        let (date_part, rest) = s.split_once(' ').ok_or_else(bad)?;
        let date = MyDate::parse_text(date_part)?;
        let (time_part, frac) = match rest.split_once('.') {
            Some((t, f)) => (t, Some(f)),
            None => (rest, None),
        };
        let mut hms = time_part.splitn(3, ':');
        let hour = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let minute = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let second = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let micros = match frac {
            Some(f) => parse_fraction_micros(f)?,
            None => 0,
        };
        Ok(MyDateTime {
            date,
            hour,
            minute,
            second,
            micros,
        })
    }

    pub fn format_text(&self) -> String {
        let mut s = format!(
            "{} {:02}:{:02}:{:02}",
            self.date.format_text(),
            self.hour,
            self.minute,
            self.second
        );
        if self.micros != 0 {
            s.push_str(&format!(".{:06}", self.micros));
        }
        s
    }
}

impl MyTime {
    /// Length-prefixed binary layout: 0, 8 (sign/days/h/m/s), or 12 bytes (+ microseconds).
    pub fn decode_binary(buf: &mut &[u8]) -> Result<Self, Error> {
        let len = buf.get_u8_checked("time length prefix")?;
        let mut v = MyTime::default();
        if len == 0 {
            return Ok(v);
        }
        v.negative = buf.get_u8_checked("time.sign")? != 0;
        let days = buf.get_u32_le_checked("time.days")?;
        let hour = buf.get_u8_checked("time.hour")? as u32;
        v.hours = days * 24 + hour;
        v.minutes = buf.get_u8_checked("time.minute")?;
        v.seconds = buf.get_u8_checked("time.second")?;
        if len >= 12 {
            v.micros = buf.get_u32_le_checked("time.micros")?;
        }
        if v.hours > 838 {
            return Err(Error::ProtocolValueError(format!(
                "TIME hours {} exceeds the documented range of 838",
                v.hours
            )));
        }
        Ok(v)
    }

    pub fn encode_binary(&self, out: &mut Vec<u8>) {
        let needs_micros = self.micros != 0;
        let needs_time =
            needs_micros || self.hours != 0 || self.minutes != 0 || self.seconds != 0;
        if !needs_time {
            out.put_u8(0);
            return;
        }
        let len: u8 = if needs_micros { 12 } else { 8 };
        out.put_u8(len);
        out.put_u8(self.negative as u8);
        out.put_u32_le(self.hours / 24);
        out.put_u8((self.hours % 24) as u8);
        out.put_u8(self.minutes);
        out.put_u8(self.seconds);
        if len >= 12 {
            out.put_u32_le(self.micros);
        }
    }

    /// `[-]HH:MM:SS[.ffffff]`, 2-3 digit hours (spec §6).
    pub fn parse_text(s: &str) -> Result<Self, Error> {
        let bad = || Error::ProtocolValueError(format!("invalid TIME text: {s:?}"));
        let (negative, rest) = match s.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, s),
        };
        let (time_part, frac) = match rest.split_once('.') {
            Some((t, f)) => (t, Some(f)),
            None => (rest, None),
        };
        let mut hms = time_part.splitn(3, ':');
        let hours: u32 = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let minutes = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let seconds = hms.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        if hours > 838 {
            return Err(bad());
        }
        let micros = match frac {
            Some(f) => parse_fraction_micros(f)?,
            None => 0,
        };
        Ok(MyTime {
            negative,
            hours,
            minutes,
            seconds,
            micros,
        })
    }

    pub fn format_text(&self) -> String {
        let mut s = format!(
            "{}{:02}:{:02}:{:02}",
            if self.negative { "-" } else { "" },
            self.hours,
            self.minutes,
            self.seconds
        );
        if self.micros != 0 {
            s.push_str(&format!(".{:06}", self.micros));
        }
        s
    }
}

/// Parses 1-6 digits of fractional seconds into microseconds, right-padding as needed.
fn parse_fraction_micros(f: &str) -> Result<u32, Error> {
    if f.is_empty() || f.len() > 6 || !f.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ProtocolValueError(format!(
            "invalid fractional seconds: {f:?}"
        )));
    }
    let mut padded = f.to_string();
    while padded.len() < 6 {
        padded.push('0');
    }
    padded.parse().map_err(|_| {
        Error::ProtocolValueError(format!("invalid fractional seconds: {f:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_text_round_trips() {
        let d = MyDate::parse_text("2024-01-31").unwrap();
        assert_eq!(d, MyDate { year: 2024, month: 1, day: 31 });
        assert_eq!(d.format_text(), "2024-01-31");
    }

    #[test]
    fn datetime_text_with_fraction() {
        let dt = MyDateTime::parse_text("2024-01-31 10:20:30.5").unwrap();
        assert_eq!(dt.micros, 500_000);
        assert_eq!(dt.format_text(), "2024-01-31 10:20:30.500000");
    }

    #[test]
    fn time_text_negative_and_long_hours() {
        let t = MyTime::parse_text("-838:59:59").unwrap();
        assert!(t.negative);
        assert_eq!(t.hours, 838);
        assert_eq!(t.format_text(), "-838:59:59");
    }

    #[test]
    fn time_binary_round_trip() {
        let t = MyTime {
            negative: true,
            hours: 30,
            minutes: 5,
            seconds: 9,
            micros: 123,
        };
        let mut buf = Vec::new();
        t.encode_binary(&mut buf);
        let mut slice = buf.as_slice();
        let decoded = MyTime::decode_binary(&mut slice).unwrap();
        assert_eq!(t, decoded);
    }

    #[test]
    fn date_binary_round_trip() {
        let d = MyDate { year: 1999, month: 12, day: 31 };
        let mut buf = Vec::new();
        d.encode_binary(&mut buf);
        let mut slice = buf.as_slice();
        assert_eq!(MyDate::decode_binary(&mut slice).unwrap(), d);
    }
}
