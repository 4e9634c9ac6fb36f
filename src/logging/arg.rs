//! Format arguments
//!
//! `LogArg` is the closed set of values a log call can substitute into its
//! format string. Conversions exist for the common primitive, string, path,
//! list and time types; anything else must be wrapped explicitly with
//! [`LogArg::unknown`], which renders as `UNKNOWN TYPE: <type>`.

use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Timestamp layout used in log lines and time arguments
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One argument of a log call
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    StrList(Vec<String>),
    IntList(Vec<i64>),
    Time(DateTime<Local>),
    /// Value of a type with no text conversion, keeps only the type name
    Unknown(&'static str),
}

impl LogArg {
    /// Placeholder for a value whose type has no conversion
    pub fn unknown<T: ?Sized>(_value: &T) -> Self {
        Self::Unknown(std::any::type_name::<T>())
    }

    /// Text substituted for a `{}` placeholder
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Str(s) => Cow::Borrowed(s),
            Self::StrList(items) => Cow::Owned(items.join(" ")),
            Self::IntList(items) => Cow::Owned(
                items
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Self::Path(path) => path.to_string_lossy(),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Self::Unknown(type_name) => write!(f, "UNKNOWN TYPE: {}", type_name),
            other => f.write_str(&other.render()),
        }
    }
}

/// Substitute `{}` placeholders left to right
///
/// Extra arguments are ignored, unmatched placeholders stay verbatim, and
/// substituted text is never scanned again.
pub fn format_message(format: &str, args: &[LogArg]) -> String {
    const PLACEHOLDER: &str = "{}";

    let mut message = String::with_capacity(format.len());
    let mut rest = format;

    for arg in args {
        let Some(pos) = rest.find(PLACEHOLDER) else {
            break;
        };
        message.push_str(&rest[..pos]);
        message.push_str(&arg.render());
        rest = &rest[pos + PLACEHOLDER.len()..];
    }

    message.push_str(rest);
    message
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for LogArg {
                fn from(value: $source) -> Self {
                    Self::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(UInt as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for LogArg {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<char> for LogArg {
    fn from(value: char) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<&Path> for LogArg {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for LogArg {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&PathBuf> for LogArg {
    fn from(value: &PathBuf) -> Self {
        Self::Path(value.clone())
    }
}

impl From<Vec<String>> for LogArg {
    fn from(value: Vec<String>) -> Self {
        Self::StrList(value)
    }
}

impl From<&[String]> for LogArg {
    fn from(value: &[String]) -> Self {
        Self::StrList(value.to_vec())
    }
}

impl From<Vec<&str>> for LogArg {
    fn from(value: Vec<&str>) -> Self {
        Self::StrList(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i32>> for LogArg {
    fn from(value: Vec<i32>) -> Self {
        Self::IntList(value.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<i64>> for LogArg {
    fn from(value: Vec<i64>) -> Self {
        Self::IntList(value)
    }
}

impl From<&[i32]> for LogArg {
    fn from(value: &[i32]) -> Self {
        Self::IntList(value.iter().copied().map(i64::from).collect())
    }
}

impl From<DateTime<Local>> for LogArg {
    fn from(value: DateTime<Local>) -> Self {
        Self::Time(value)
    }
}

impl From<SystemTime> for LogArg {
    fn from(value: SystemTime) -> Self {
        Self::Time(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_format_substitutes_in_order() {
        let args = [LogArg::from(5), LogArg::from("ok")];
        assert_eq!(format_message("value={} and {}", &args), "value=5 and ok");
    }

    #[test]
    fn test_format_ignores_extra_args() {
        let args = [LogArg::from(1), LogArg::from(2), LogArg::from(3)];
        assert_eq!(format_message("a={} b={}", &args), "a=1 b=2");
        assert_eq!(format_message("no placeholders", &args), "no placeholders");
    }

    #[test]
    fn test_format_keeps_unmatched_placeholders() {
        let args = [LogArg::from("x")];
        assert_eq!(format_message("{} {} {}", &args), "x {} {}");
        assert_eq!(format_message("{}", &[]), "{}");
    }

    #[test]
    fn test_format_does_not_rescan_substituted_text() {
        let args = [LogArg::from("{}"), LogArg::from("b")];
        assert_eq!(format_message("{}-{}", &args), "{}-b");
    }

    #[test]
    fn test_render_variants() {
        assert_eq!(LogArg::from(-7_i32).to_string(), "-7");
        assert_eq!(LogArg::from(7_usize).to_string(), "7");
        assert_eq!(LogArg::from(1.5_f64).to_string(), "1.5");
        assert_eq!(LogArg::from(PathBuf::from("/var/log")).to_string(), "/var/log");
        assert_eq!(
            LogArg::from(vec!["file".to_string(), "console".to_string()]).to_string(),
            "file console"
        );
        assert_eq!(LogArg::from(vec![1_i32, 2, 3]).to_string(), "1 2 3");
        assert_eq!(LogArg::from(Vec::<i32>::new()).to_string(), "");
        assert_eq!(LogArg::from(true).to_string(), "true");
    }

    #[test]
    fn test_render_time() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(LogArg::from(time).to_string(), "2024-03-09 07:05:01");
    }

    #[test]
    fn test_unknown_type_renders_type_name() {
        struct Opaque;
        let arg = LogArg::unknown(&Opaque);
        let text = arg.to_string();
        assert!(text.starts_with("UNKNOWN TYPE: "));
        assert!(text.ends_with("Opaque"));
        assert_eq!(format_message("got {}", &[arg.clone()]), format!("got {}", text));
    }

    proptest! {
        #[test]
        fn prop_text_without_placeholders_is_unchanged(text in "[^{}]*", n in 0i64..100) {
            prop_assert_eq!(format_message(&text, &[LogArg::from(n)]), text);
        }

        #[test]
        fn prop_each_arg_fills_one_placeholder(
            values in proptest::collection::vec(0u32..1000, 0..6),
            slots in 0usize..6,
        ) {
            let format = vec!["{}"; slots].join(",");
            let args: Vec<LogArg> = values.iter().copied().map(LogArg::from).collect();
            let rendered = format_message(&format, &args);

            let filled = slots.min(values.len());
            let mut expected: Vec<String> = values[..filled].iter().map(u32::to_string).collect();
            expected.extend(std::iter::repeat("{}".to_string()).take(slots - filled));
            prop_assert_eq!(rendered, expected.join(","));
        }
    }
}
