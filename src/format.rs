use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::severity::{label_for, Severity};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

static ANSI_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Line formatter bound to a logger at creation.
///
/// Both variants produce `"<S>, [<timestamp>] <progname>: <message>\n"`.
/// The syslog variant additionally trims the message and strips ANSI
/// color codes, since syslog daemons store them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Plain,
    Syslog,
}

impl Formatter {
    /// Format one line. A missing `time` is taken from the local clock now,
    /// so the timestamp reflects emission rather than record construction.
    pub fn format(
        &self,
        severity: Severity,
        time: Option<NaiveDateTime>,
        progname: &str,
        message: &str,
    ) -> String {
        let time = time.unwrap_or_else(|| Local::now().naive_local());
        match self {
            Formatter::Plain => line(severity.initial(), time, progname, message),
            Formatter::Syslog => {
                let label = label_for(severity.index());
                let initial = label.chars().next().unwrap_or('A');
                line(initial, time, progname, &clean(message))
            }
        }
    }
}

fn line(initial: char, time: NaiveDateTime, progname: &str, message: &str) -> String {
    format!("{}, [{}] {}: {}\n", initial, time.format(TIME_FORMAT), progname, message)
}

fn clean(message: &str) -> String {
    ANSI_COLOR.replace_all(message.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 678)
            .unwrap()
    }

    #[test]
    fn plain_line_layout() {
        let line = Formatter::Plain.format(Severity::Error, Some(fixed()), "worker", "boom");
        assert_eq!(line, "E, [2024-01-02T03:04:05.678] worker: boom\n");
    }

    #[test]
    fn plain_keeps_message_verbatim() {
        let line = Formatter::Plain.format(Severity::Info, Some(fixed()), "api", " \x1b[31mred\x1b[0m ");
        assert_eq!(line, "I, [2024-01-02T03:04:05.678] api:  \x1b[31mred\x1b[0m \n");
    }

    #[test]
    fn syslog_strips_ansi_and_whitespace() {
        let line = Formatter::Syslog.format(Severity::Warn, Some(fixed()), "api", "  \x1b[1;31mslow\x1b[0m query \n");
        assert_eq!(line, "W, [2024-01-02T03:04:05.678] api: slow query\n");
    }

    #[test]
    fn unknown_severity_renders_as_any() {
        let plain = Formatter::Plain.format(Severity::Unknown, Some(fixed()), "p", "m");
        let syslog = Formatter::Syslog.format(Severity::Unknown, Some(fixed()), "p", "m");
        assert!(plain.starts_with("A, "));
        assert!(syslog.starts_with("A, "));
    }

    #[test]
    fn percent_signs_are_not_interpreted() {
        let line = Formatter::Syslog.format(Severity::Info, Some(fixed()), "api", "100%s done %d");
        assert!(line.ends_with("api: 100%s done %d\n"));
    }

    #[test]
    fn missing_time_uses_clock_with_millis() {
        let line = Formatter::Plain.format(Severity::Debug, None, "p", "m");
        let stamp = &line[4..line.find(']').unwrap()];
        assert!(NaiveDateTime::parse_from_str(stamp, TIME_FORMAT).is_ok(), "{stamp}");
        assert_eq!(stamp.len(), "2024-01-02T03:04:05.678".len());
    }
}
