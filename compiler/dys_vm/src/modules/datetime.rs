//! `datetime`: dates, times, datetimes and timedeltas.
//!
//! The clock is frozen at the block time, so `datetime.now()` is the same
//! on every node. Datetimes are naive unless built with
//! `tz=timezone.utc`; no other time zone exists. Local time is UTC.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::rc::Rc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};
use serde_json::Value as Json;

use dys_eval::errors::{exception, type_error, value_error};
use dys_eval::{
    native, CallArgs, EvalError, EvalResult, ExcType, Interpreter, ModuleBuilder, ModuleValue, NativeFn,
    Session, Value,
};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;
const SECOND: i64 = 1_000_000;
const DAY: i64 = 86_400 * SECOND;

fn out_of_range() -> EvalError {
    exception(ExcType::OverflowError, "date value out of range")
}

/// The block time as a naive UTC datetime; the Unix epoch when absent.
pub fn block_time(time: &Json) -> NaiveDateTime {
    let parsed = match time {
        Json::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|at| at.naive_utc())
            .ok()
            .or_else(|| parse_iso(text).ok().map(|(at, _)| at)),
        Json::Number(n) => n.as_f64().and_then(|seconds| from_seconds(seconds).ok()),
        _ => None,
    };
    parsed.map_or_else(NaiveDateTime::default, truncate_nanos)
}

fn truncate_nanos(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(at.nanosecond() / 1000 * 1000).unwrap_or(at)
}

fn in_range(at: NaiveDateTime) -> EvalResult<NaiveDateTime> {
    if (MIN_YEAR..=MAX_YEAR).contains(&at.year()) {
        Ok(at)
    } else {
        Err(out_of_range())
    }
}

fn from_seconds(seconds: f64) -> EvalResult<NaiveDateTime> {
    let micros = (seconds * 1e6).round_ties_even();
    if !micros.is_finite() || micros.abs() > 3e17 {
        return Err(exception(ExcType::OverflowError, "timestamp out of range for platform time_t"));
    }
    #[allow(clippy::cast_possible_truncation, reason = "bounded just above")]
    let micros = micros as i64;
    DateTime::from_timestamp_micros(micros)
        .map(|at| at.naive_utc())
        .ok_or_else(out_of_range)
        .and_then(in_range)
}

/// `YYYY-MM-DD[*HH:MM[:SS[.ffffff]]][Z|+00:00]`, with a flag for a UTC suffix.
fn parse_iso(text: &str) -> EvalResult<(NaiveDateTime, bool)> {
    let invalid = || value_error(format!("Invalid isoformat string: '{text}'"));
    let date = text
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .ok_or_else(invalid)?;
    let rest = text.get(10..).ok_or_else(invalid)?;
    let mut chars = rest.chars();
    if chars.next().is_none() {
        return Ok((date.and_time(NaiveTime::MIN), false));
    }
    let mut clock = chars.as_str();
    let mut aware = false;
    if let Some(stripped) = clock.strip_suffix('Z') {
        clock = stripped;
        aware = true;
    } else if let Some(sign) = clock.rfind(['+', '-']) {
        if !matches!(&clock[sign + 1..], "00:00" | "0000" | "00") {
            return Err(value_error("only UTC offsets are supported"));
        }
        clock = &clock[..sign];
        aware = true;
    }
    let time = ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(clock, format).ok())
        .ok_or_else(invalid)?;
    Ok((truncate_nanos(date.and_time(time)), aware))
}

/// Python `strftime` codes in chrono's dialect: `%f` is microseconds, and
/// naive values render `%z`/`%Z` as nothing.
fn chrono_pattern(format: &str, aware: bool) -> String {
    let mut pattern = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            pattern.push(c);
            continue;
        }
        match chars.next() {
            Some('f') => pattern.push_str("%6f"),
            Some('z' | 'Z') if !aware => {}
            Some(code) => {
                pattern.push('%');
                pattern.push(code);
            }
            None => pattern.push('%'),
        }
    }
    pattern
}

fn render(format: &str, at: NaiveDateTime, aware: bool) -> EvalResult<String> {
    let pattern = chrono_pattern(format, aware);
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    let bad_format = || value_error(format!("Invalid format string: '{format}'"));
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(bad_format());
    }
    let mut out = String::new();
    let written = if aware {
        write!(out, "{}", Utc.from_utc_datetime(&at).format_with_items(items.iter()))
    } else {
        write!(out, "{}", at.format_with_items(items.iter()))
    };
    written.map_err(|_| bad_format())?;
    Ok(out)
}

/// `strptime`: a full datetime, else a date at midnight, else a time on
/// 1900-01-01.
fn parse_with(text: &str, format: &str) -> EvalResult<NaiveDateTime> {
    let pattern = chrono_pattern(format, true);
    let mismatch = || value_error(format!("time data '{text}' does not match format '{format}'"));
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1).ok_or_else(mismatch)?;
    NaiveDateTime::parse_from_str(text, &pattern)
        .or_else(|_| NaiveDate::parse_from_str(text, &pattern).map(|date| date.and_time(NaiveTime::MIN)))
        .or_else(|_| NaiveTime::parse_from_str(text, &pattern).map(|time| epoch.and_time(time)))
        .map_err(|_| mismatch())
        .and_then(in_range)
}

fn iso_time(time: NaiveTime, timespec: &str) -> EvalResult<String> {
    let (h, m, s) = (time.hour(), time.minute(), time.second());
    let micros = time.nanosecond() / 1000;
    Ok(match timespec {
        "auto" if micros == 0 => format!("{h:02}:{m:02}:{s:02}"),
        "auto" | "microseconds" => format!("{h:02}:{m:02}:{s:02}.{micros:06}"),
        "milliseconds" => format!("{h:02}:{m:02}:{s:02}.{:03}", micros / 1000),
        "seconds" => format!("{h:02}:{m:02}:{s:02}"),
        "minutes" => format!("{h:02}:{m:02}"),
        "hours" => format!("{h:02}"),
        _ => return Err(value_error("Unknown timespec value")),
    })
}

fn iso_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Hour, minute, then second and microsecond when they are set.
fn clock_fields(time: NaiveTime) -> String {
    let micros = time.nanosecond() / 1000;
    let mut fields = format!("{}, {}", time.hour(), time.minute());
    if time.second() != 0 || micros != 0 {
        let _ = write!(fields, ", {}", time.second());
    }
    if micros != 0 {
        let _ = write!(fields, ", {micros}");
    }
    fields
}

fn delta_text(micros: i64) -> String {
    let days = micros.div_euclid(DAY);
    let rest = micros.rem_euclid(DAY);
    let seconds = rest / SECOND;
    let mut text = String::new();
    if days != 0 {
        let plural = if days.abs() == 1 { "" } else { "s" };
        let _ = write!(text, "{days} day{plural}, ");
    }
    let _ = write!(text, "{}:{:02}:{:02}", seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if rest % SECOND != 0 {
        let _ = write!(text, ".{:06}", rest % SECOND);
    }
    text
}

fn delta_repr(micros: i64) -> String {
    let parts: Vec<String> = [
        ("days", micros.div_euclid(DAY)),
        ("seconds", micros.rem_euclid(DAY) / SECOND),
        ("microseconds", micros.rem_euclid(DAY) % SECOND),
    ]
    .into_iter()
    .filter(|&(_, n)| n != 0)
    .map(|(name, n)| format!("{name}={n}"))
    .collect();
    if parts.is_empty() {
        "datetime.timedelta(0)".to_string()
    } else {
        format!("datetime.timedelta({})", parts.join(", "))
    }
}

/// A value of one of the four types, decoded from or encoded as an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Temporal {
    DateTime { at: NaiveDateTime, aware: bool },
    Date(NaiveDate),
    Time(NaiveTime),
    /// Microseconds.
    Delta(i64),
}

impl Temporal {
    fn type_name(self) -> &'static str {
        match self {
            Temporal::DateTime { .. } => "datetime",
            Temporal::Date(_) => "date",
            Temporal::Time(_) => "time",
            Temporal::Delta(_) => "timedelta",
        }
    }

    fn repr(self) -> String {
        match self {
            Temporal::DateTime { at, aware } => format!(
                "datetime.datetime({}, {}, {}, {}{})",
                at.year(),
                at.month(),
                at.day(),
                clock_fields(at.time()),
                if aware { ", tzinfo=datetime.timezone.utc" } else { "" }
            ),
            Temporal::Date(date) => format!("datetime.date({}, {}, {})", date.year(), date.month(), date.day()),
            Temporal::Time(time) => format!("datetime.time({})", clock_fields(time)),
            Temporal::Delta(micros) => delta_repr(micros),
        }
    }

    fn isoformat(self, sep: &str, timespec: &str) -> EvalResult<String> {
        match self {
            Temporal::DateTime { at, aware } => Ok(format!(
                "{}{sep}{}{}",
                iso_date(at.date()),
                iso_time(at.time(), timespec)?,
                if aware { "+00:00" } else { "" }
            )),
            Temporal::Date(date) => Ok(iso_date(date)),
            Temporal::Time(time) => iso_time(time, timespec),
            Temporal::Delta(micros) => Ok(delta_text(micros)),
        }
    }

    fn text(self) -> String {
        self.isoformat(" ", "auto").unwrap_or_default()
    }

    fn compare(self, other: Temporal) -> EvalResult<Option<Ordering>> {
        Ok(match (self, other) {
            (Temporal::DateTime { at: a, aware: x }, Temporal::DateTime { at: b, aware: y }) => {
                if x != y {
                    return Err(type_error("can't compare offset-naive and offset-aware datetimes"));
                }
                Some(a.cmp(&b))
            }
            (Temporal::Date(a), Temporal::Date(b)) => Some(a.cmp(&b)),
            (Temporal::Time(a), Temporal::Time(b)) => Some(a.cmp(&b)),
            (Temporal::Delta(a), Temporal::Delta(b)) => Some(a.cmp(&b)),
            _ => None,
        })
    }

    fn shifted(self, micros: i64) -> EvalResult<Temporal> {
        match self {
            Temporal::DateTime { at, aware } => {
                let at = at
                    .checked_add_signed(TimeDelta::microseconds(micros))
                    .ok_or_else(out_of_range)
                    .and_then(in_range)?;
                Ok(Temporal::DateTime { at, aware })
            }
            Temporal::Date(date) => {
                let days = TimeDelta::try_days(micros.div_euclid(DAY)).ok_or_else(out_of_range)?;
                let at = date
                    .checked_add_signed(days)
                    .map(|date| date.and_time(NaiveTime::MIN))
                    .ok_or_else(out_of_range)
                    .and_then(in_range)?;
                Ok(Temporal::Date(at.date()))
            }
            Temporal::Delta(own) => own.checked_add(micros).map(Temporal::Delta).ok_or_else(out_of_range),
            Temporal::Time(_) => Err(type_error("time objects do not support arithmetic")),
        }
    }

    /// `self + other`, `None` when the pair is unsupported.
    fn add(self, other: Temporal) -> EvalResult<Option<Temporal>> {
        match (self, other) {
            (Temporal::DateTime { .. } | Temporal::Date(_) | Temporal::Delta(_), Temporal::Delta(micros)) => {
                self.shifted(micros).map(Some)
            }
            (Temporal::Delta(micros), Temporal::DateTime { .. } | Temporal::Date(_)) => other.shifted(micros).map(Some),
            _ => Ok(None),
        }
    }

    /// `self - other`, `None` when the pair is unsupported.
    fn sub(self, other: Temporal) -> EvalResult<Option<Temporal>> {
        match (self, other) {
            (Temporal::DateTime { .. } | Temporal::Date(_) | Temporal::Delta(_), Temporal::Delta(micros)) => {
                let negated = micros.checked_neg().ok_or_else(out_of_range)?;
                self.shifted(negated).map(Some)
            }
            (Temporal::DateTime { at: a, aware: x }, Temporal::DateTime { at: b, aware: y }) => {
                if x != y {
                    return Err(type_error("can't subtract offset-naive and offset-aware datetimes"));
                }
                let micros = a.signed_duration_since(b).num_microseconds().ok_or_else(out_of_range)?;
                Ok(Some(Temporal::Delta(micros)))
            }
            (Temporal::Date(a), Temporal::Date(b)) => {
                let days = a.signed_duration_since(b).num_days();
                Ok(Some(Temporal::Delta(days * DAY)))
            }
            _ => Ok(None),
        }
    }
}

/// Type objects and the UTC singleton shared by every value the module
/// builds.
struct Calendar {
    now: NaiveDateTime,
    utc: Rc<ModuleValue>,
}

impl Calendar {
    fn is_utc(&self, value: &Value) -> bool {
        matches!(value, Value::Module(object) if Rc::ptr_eq(object, &self.utc))
    }

    /// `tz`/`tzinfo`: `None` is naive, `timezone.utc` is aware.
    fn zone(&self, value: Option<Value>) -> EvalResult<bool> {
        match value {
            None | Some(Value::None) => Ok(false),
            Some(value) if self.is_utc(&value) => Ok(true),
            Some(other) => Err(type_error(format!(
                "tzinfo argument must be None or timezone.utc, not {}",
                other.type_name()
            ))),
        }
    }

    fn decode(interp: &Interpreter<'_>, value: &Value) -> Option<Temporal> {
        let Value::Module(object) = value else {
            return None;
        };
        object.form.as_ref()?;
        let field = |name: &str| -> Option<Value> {
            let key = interp.session().interner().get(name)?;
            object.members.get(&key).cloned()
        };
        let int = |name: &str| -> Option<i64> {
            match field(name)? {
                Value::Int(n) => Some(n),
                _ => None,
            }
        };
        let small = |name: &str| -> Option<u32> { u32::try_from(int(name)?).ok() };
        let date = || NaiveDate::from_ymd_opt(i32::try_from(int("year")?).ok()?, small("month")?, small("day")?);
        let time = || NaiveTime::from_hms_micro_opt(small("hour")?, small("minute")?, small("second")?, small("microsecond")?);
        match object.name.as_ref() {
            "datetime.datetime" => Some(Temporal::DateTime {
                at: date()?.and_time(time()?),
                aware: !matches!(field("tzinfo")?, Value::None),
            }),
            "datetime.date" => date().map(Temporal::Date),
            "datetime.time" => time().map(Temporal::Time),
            "datetime.timedelta" => {
                let micros = int("days")?
                    .checked_mul(DAY)?
                    .checked_add(int("seconds")?.checked_mul(SECOND)?)?
                    .checked_add(int("microseconds")?)?;
                Some(Temporal::Delta(micros))
            }
            _ => None,
        }
    }

    fn operand(interp: &Interpreter<'_>, args: &CallArgs, func: &str) -> EvalResult<(Value, Option<Temporal>)> {
        args.arity(func, 1, 1)?;
        let value = args.arg(0);
        let decoded = Calendar::decode(interp, &value);
        Ok((value, decoded))
    }

    /// An arithmetic dunder: `this <symbol> other`, or `other <symbol> this`
    /// when `reflected`.
    fn arithmetic(self: &Rc<Self>, this: Temporal, symbol: &'static str, reflected: bool) -> NativeFn {
        let calendar = Rc::clone(self);
        native(move |interp, args| {
            let (value, other) = Calendar::operand(interp, &args, symbol)?;
            let result = match other {
                Some(other) => {
                    let (left, right) = if reflected { (other, this) } else { (this, other) };
                    if symbol == "+" {
                        left.add(right)?
                    } else {
                        left.sub(right)?
                    }
                }
                None => None,
            };
            let (own, theirs) = (this.type_name(), value.type_name());
            let (left, right) = if reflected { (&*theirs, own) } else { (own, &*theirs) };
            match result {
                Some(result) => Ok(calendar.object(interp, result)),
                None => Err(type_error(format!(
                    "unsupported operand type(s) for {symbol}: '{left}' and '{right}'"
                ))),
            }
        })
    }

    /// `timedelta * number` in either order.
    fn scaling(self: &Rc<Self>, micros: i64) -> NativeFn {
        let calendar = Rc::clone(self);
        native(move |interp, args| {
            args.arity("__mul__", 1, 1)?;
            let scaled = match args.arg(0) {
                Value::Int(n) => micros.checked_mul(n).ok_or_else(out_of_range)?,
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, reason = "bounded below")]
                Value::Float(f) => {
                    let product = (micros as f64 * f).round_ties_even();
                    if !product.is_finite() || product.abs() >= 9.2e18 {
                        return Err(out_of_range());
                    }
                    product as i64
                }
                other => {
                    return Err(type_error(format!(
                        "unsupported operand type(s) for *: 'timedelta' and '{}'",
                        other.type_name()
                    )))
                }
            };
            Ok(calendar.object(interp, Temporal::Delta(scaled)))
        })
    }

    fn comparison(this: Temporal, symbol: &'static str, test: fn(Ordering) -> bool) -> NativeFn {
        native(move |interp, args| {
            let (value, other) = Calendar::operand(interp, &args, symbol)?;
            match other.map(|other| this.compare(other)).transpose()?.flatten() {
                Some(ordering) => Ok(Value::Bool(test(ordering))),
                None => Err(type_error(format!(
                    "'{symbol}' not supported between instances of '{}' and '{}'",
                    this.type_name(),
                    value.type_name()
                ))),
            }
        })
    }

    fn equality(this: Temporal) -> NativeFn {
        native(move |interp, args| {
            let (_, other) = Calendar::operand(interp, &args, "__eq__")?;
            Ok(Value::Bool(other == Some(this)))
        })
    }

    /// The script-facing object for `this`, whitelisted in the session.
    fn object(self: &Rc<Self>, interp: &Interpreter<'_>, this: Temporal) -> Value {
        let name = format!("datetime.{}", this.type_name());
        let mut builder = ModuleBuilder::object(&name, this.repr(), this.text())
            .function("__eq__", None, Calendar::equality(this))
            .function("__lt__", None, Calendar::comparison(this, "<", Ordering::is_lt))
            .function("__le__", None, Calendar::comparison(this, "<=", Ordering::is_le))
            .function("__gt__", None, Calendar::comparison(this, ">", Ordering::is_gt))
            .function("__ge__", None, Calendar::comparison(this, ">=", Ordering::is_ge));
        if !matches!(this, Temporal::Time(_)) {
            builder = builder
                .function("__add__", None, self.arithmetic(this, "+", false))
                .function("__radd__", None, self.arithmetic(this, "+", true))
                .function("__sub__", None, self.arithmetic(this, "-", false))
                .function("__rsub__", None, self.arithmetic(this, "-", true));
        }
        builder = match this {
            Temporal::DateTime { at, aware } => self.datetime_members(builder, at, aware),
            Temporal::Date(date) => self.date_members(builder, date),
            Temporal::Time(time) => time_members(builder, time),
            Temporal::Delta(micros) => self.delta_members(builder, micros),
        };
        interp.session().adopt(builder.build(interp.session().interner()))
    }

    fn datetime_members(self: &Rc<Self>, builder: ModuleBuilder, at: NaiveDateTime, aware: bool) -> ModuleBuilder {
        let this = Temporal::DateTime { at, aware };
        let tzinfo = if aware { Value::Module(Rc::clone(&self.utc)) } else { Value::None };
        let calendar = Rc::clone(self);
        let date = native(move |interp, args| {
            args.arity("date", 0, 0)?;
            Ok(calendar.object(interp, Temporal::Date(at.date())))
        });
        let calendar = Rc::clone(self);
        let time = native(move |interp, args| {
            args.arity("time", 0, 0)?;
            Ok(calendar.object(interp, Temporal::Time(at.time())))
        });
        let calendar = Rc::clone(self);
        let replace = native(move |interp, mut args| {
            args.positional_arity("replace", 0, 0)?;
            let mut field = |name: &str, current: i64| match args.take_keyword(name) {
                Some(Value::Int(n)) => Ok(n),
                Some(other) => Err(type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                ))),
                None => Ok(current),
            };
            let year = field("year", i64::from(at.year()))?;
            let month = field("month", i64::from(at.month()))?;
            let day = field("day", i64::from(at.day()))?;
            let hour = field("hour", i64::from(at.hour()))?;
            let minute = field("minute", i64::from(at.minute()))?;
            let second = field("second", i64::from(at.second()))?;
            let micro = field("microsecond", i64::from(at.nanosecond() / 1000))?;
            let aware = match args.take_keyword("tzinfo") {
                None => aware,
                given => calendar.zone(given)?,
            };
            args.no_extra_keywords("replace")?;
            let at = build_datetime([year, month, day, hour, minute, second, micro])?;
            Ok(calendar.object(interp, Temporal::DateTime { at, aware }))
        });
        let base = clock_members(date_fields(builder, at.date()), at.time())
            .constant("tzinfo", tzinfo)
            .function("date", Some("Return date object with same year, month and day."), date)
            .function("time", Some("Return time object with same time but with tzinfo=None."), time)
            .function("replace", Some("Return datetime with new specified fields."), replace)
            .function(
                "timestamp",
                Some("Return POSIX timestamp as float."),
                native(move |_, args| {
                    args.arity("timestamp", 0, 0)?;
                    #[allow(clippy::cast_precision_loss, reason = "timestamps are floats")]
                    let seconds = Utc.from_utc_datetime(&at).timestamp_micros() as f64 / 1e6;
                    Ok(Value::Float(seconds))
                }),
            )
            .function(
                "isoformat",
                Some("[sep] -> string in ISO 8601 format, YYYY-MM-DDT[HH[:MM[:SS[.mmm[uuu]]]]][+HH:MM]."),
                native(move |_, mut args| {
                    let sep = string_arg(args.take(0, "sep"), "T")?;
                    let timespec = string_arg(args.take(1, "timespec"), "auto")?;
                    args.no_extra_keywords("isoformat")?;
                    args.positional_arity("isoformat", 0, 2)?;
                    Ok(Value::string(this.isoformat(&sep, &timespec)?))
                }),
            );
        strftime_member(base, at, aware)
    }

    fn date_members(self: &Rc<Self>, builder: ModuleBuilder, date: NaiveDate) -> ModuleBuilder {
        let calendar = Rc::clone(self);
        let replace = native(move |interp, mut args| {
            args.positional_arity("replace", 0, 0)?;
            let mut field = |name: &str, current: i64| match args.take_keyword(name) {
                Some(Value::Int(n)) => Ok(n),
                Some(other) => Err(type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                ))),
                None => Ok(current),
            };
            let year = field("year", i64::from(date.year()))?;
            let month = field("month", i64::from(date.month()))?;
            let day = field("day", i64::from(date.day()))?;
            args.no_extra_keywords("replace")?;
            let at = build_datetime([year, month, day, 0, 0, 0, 0])?;
            Ok(calendar.object(interp, Temporal::Date(at.date())))
        });
        let midnight = date.and_time(NaiveTime::MIN);
        let base = date_fields(builder, date)
            .function("replace", Some("Return date with new specified fields."), replace)
            .function(
                "isoformat",
                Some("Return string in ISO 8601 format, YYYY-MM-DD."),
                native(move |_, args| {
                    args.arity("isoformat", 0, 0)?;
                    Ok(Value::string(iso_date(date)))
                }),
            );
        strftime_member(base, midnight, false)
    }

    fn delta_members(self: &Rc<Self>, builder: ModuleBuilder, micros: i64) -> ModuleBuilder {
        builder
            .constant("days", Value::Int(micros.div_euclid(DAY)))
            .constant("seconds", Value::Int(micros.rem_euclid(DAY) / SECOND))
            .constant("microseconds", Value::Int(micros.rem_euclid(DAY) % SECOND))
            .function("__mul__", None, self.scaling(micros))
            .function("__rmul__", None, self.scaling(micros))
            .function(
                "total_seconds",
                Some("Total seconds in the duration."),
                native(move |_, args| {
                    args.arity("total_seconds", 0, 0)?;
                    #[allow(clippy::cast_precision_loss, reason = "durations are floats")]
                    let seconds = micros as f64 / 1e6;
                    Ok(Value::Float(seconds))
                }),
            )
    }
}

fn date_fields(builder: ModuleBuilder, date: NaiveDate) -> ModuleBuilder {
    builder
        .constant("year", Value::Int(i64::from(date.year())))
        .constant("month", Value::Int(i64::from(date.month())))
        .constant("day", Value::Int(i64::from(date.day())))
        .function(
            "weekday",
            Some("Return the day of the week represented by the date.\nMonday == 0 ... Sunday == 6"),
            native(move |_, args| {
                args.arity("weekday", 0, 0)?;
                Ok(Value::Int(i64::from(date.weekday().num_days_from_monday())))
            }),
        )
        .function(
            "isoweekday",
            Some("Return the day of the week represented by the date.\nMonday == 1 ... Sunday == 7"),
            native(move |_, args| {
                args.arity("isoweekday", 0, 0)?;
                Ok(Value::Int(i64::from(date.weekday().number_from_monday())))
            }),
        )
}

fn clock_members(builder: ModuleBuilder, time: NaiveTime) -> ModuleBuilder {
    builder
        .constant("hour", Value::Int(i64::from(time.hour())))
        .constant("minute", Value::Int(i64::from(time.minute())))
        .constant("second", Value::Int(i64::from(time.second())))
        .constant("microsecond", Value::Int(i64::from(time.nanosecond() / 1000)))
}

fn time_members(builder: ModuleBuilder, time: NaiveTime) -> ModuleBuilder {
    let base = clock_members(builder, time).function(
        "isoformat",
        Some("Return string in ISO 8601 format, [HH[:MM[:SS[.mmm[uuu]]]]]."),
        native(move |_, mut args| {
            let timespec = string_arg(args.take(0, "timespec"), "auto")?;
            args.no_extra_keywords("isoformat")?;
            args.positional_arity("isoformat", 0, 1)?;
            Ok(Value::string(iso_time(time, &timespec)?))
        }),
    );
    let anchored = NaiveDate::from_ymd_opt(1900, 1, 1).map_or_else(NaiveDateTime::default, |date| date.and_time(time));
    strftime_member(base, anchored, false)
}

fn strftime_member(builder: ModuleBuilder, at: NaiveDateTime, aware: bool) -> ModuleBuilder {
    builder.function(
        "strftime",
        Some("format -> strftime() style string."),
        native(move |_, args| {
            args.arity("strftime", 1, 1)?;
            let Value::Str(format) = args.arg(0) else {
                return Err(type_error("strftime() argument 1 must be str"));
            };
            Ok(Value::string(render(&format, at, aware)?))
        }),
    )
}

fn string_arg(value: Option<Value>, default: &str) -> EvalResult<String> {
    match value {
        None => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(type_error(format!("expected str, not {}", other.type_name()))),
    }
}

/// Validate `[year, month, day, hour, minute, second, microsecond]`.
fn build_datetime(fields: [i64; 7]) -> EvalResult<NaiveDateTime> {
    let [year, month, day, hour, minute, second, micro] = fields;
    let check = |value: i64, low: i64, high: i64, message: String| -> EvalResult<u32> {
        if (low..=high).contains(&value) {
            u32::try_from(value).map_err(|_| value_error(message))
        } else {
            Err(value_error(message))
        }
    };
    if !(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(&year) {
        return Err(value_error(format!("year {year} is out of range")));
    }
    let month = check(month, 1, 12, "month must be in 1..12".into())?;
    let hour = check(hour, 0, 23, "hour must be in 0..23".into())?;
    let minute = check(minute, 0, 59, "minute must be in 0..59".into())?;
    let second = check(second, 0, 59, "second must be in 0..59".into())?;
    let micro = check(micro, 0, 999_999, "microsecond must be in 0..999999".into())?;
    let year = i32::try_from(year).map_err(|_| out_of_range())?;
    let day = u32::try_from(day).unwrap_or(0);
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| value_error("day is out of range for month"))?;
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro)
        .map(|time| date.and_time(time))
        .ok_or_else(out_of_range)
}

/// Integer fields of a constructor call, in order, with their defaults.
fn int_fields<const N: usize>(
    args: &mut CallArgs,
    func: &str,
    names: [&str; N],
    defaults: [Option<i64>; N],
) -> EvalResult<[i64; N]> {
    let mut values = [0; N];
    for (index, (name, default)) in names.iter().zip(defaults).enumerate() {
        values[index] = match args.take(index, name) {
            Some(Value::Int(n)) => n,
            Some(Value::Bool(b)) => i64::from(b),
            Some(other) => {
                return Err(type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                )))
            }
            None => default.ok_or_else(|| {
                type_error(format!("{func}() missing required argument '{name}' (pos {})", index + 1))
            })?,
        };
    }
    Ok(values)
}

/// `timedelta(days, seconds, microseconds, milliseconds, minutes, hours, weeks)`.
fn delta_micros(args: &mut CallArgs) -> EvalResult<i64> {
    const UNITS: [(&str, i64); 7] = [
        ("days", DAY),
        ("seconds", SECOND),
        ("microseconds", 1),
        ("milliseconds", 1000),
        ("minutes", 60 * SECOND),
        ("hours", 3600 * SECOND),
        ("weeks", 7 * DAY),
    ];
    let mut whole: i128 = 0;
    let mut fraction = 0.0_f64;
    for (index, (name, unit)) in UNITS.into_iter().enumerate() {
        match args.take(index, name) {
            None => {}
            Some(Value::Int(n)) => whole += i128::from(n) * i128::from(unit),
            Some(Value::Bool(b)) => whole += i128::from(b) * i128::from(unit),
            #[allow(clippy::cast_precision_loss, reason = "unit scale")]
            Some(Value::Float(f)) => fraction += f * unit as f64,
            Some(other) => {
                return Err(type_error(format!(
                    "unsupported type for timedelta {name} component: {}",
                    other.type_name()
                )))
            }
        }
    }
    args.no_extra_keywords("timedelta")?;
    args.positional_arity("timedelta", 0, UNITS.len())?;
    let fraction = fraction.round_ties_even();
    if !fraction.is_finite() || fraction.abs() >= 9.2e18 {
        return Err(out_of_range());
    }
    #[allow(clippy::cast_possible_truncation, reason = "bounded just above")]
    let total = whole + i128::from(fraction as i64);
    i64::try_from(total).map_err(|_| out_of_range())
}

fn timestamp_arg(value: &Value) -> EvalResult<f64> {
    match value {
        #[allow(clippy::cast_precision_loss, reason = "timestamps are floats")]
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        other => Err(type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

fn text_arg(args: &CallArgs, index: usize, func: &str) -> EvalResult<Rc<str>> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(Rc::clone(s)),
        Some(other) => Err(type_error(format!(
            "{func}: argument must be str, not {}",
            other.type_name()
        ))),
        None => Err(type_error(format!("{func}() missing required argument"))),
    }
}

impl Calendar {
    fn datetime_type(self: &Rc<Self>, session: &Session) -> Value {
        let calendar = Rc::clone(self);
        let construct = native(move |interp, mut args| {
            let fields = int_fields(
                &mut args,
                "datetime",
                ["year", "month", "day", "hour", "minute", "second", "microsecond"],
                [None, None, None, Some(0), Some(0), Some(0), Some(0)],
            )?;
            let aware = calendar.zone(args.take(7, "tzinfo"))?;
            args.no_extra_keywords("datetime")?;
            args.positional_arity("datetime", 3, 8)?;
            let at = build_datetime(fields)?;
            Ok(calendar.object(interp, Temporal::DateTime { at, aware }))
        });
        let calendar = Rc::clone(self);
        let now = native(move |interp, mut args| {
            let aware = calendar.zone(args.take(0, "tz"))?;
            args.no_extra_keywords("now")?;
            args.positional_arity("now", 0, 1)?;
            Ok(calendar.object(interp, Temporal::DateTime { at: calendar.now, aware }))
        });
        let calendar = Rc::clone(self);
        let utcnow = native(move |interp, args| {
            args.arity("utcnow", 0, 0)?;
            Ok(calendar.object(interp, Temporal::DateTime { at: calendar.now, aware: false }))
        });
        let calendar = Rc::clone(self);
        let fromtimestamp = native(move |interp, mut args| {
            let aware = calendar.zone(args.take(1, "tz"))?;
            args.no_extra_keywords("fromtimestamp")?;
            args.positional_arity("fromtimestamp", 1, 2)?;
            let at = from_seconds(timestamp_arg(&args.arg(0))?)?;
            Ok(calendar.object(interp, Temporal::DateTime { at, aware }))
        });
        let calendar = Rc::clone(self);
        let utcfromtimestamp = native(move |interp, args| {
            args.arity("utcfromtimestamp", 1, 1)?;
            let at = from_seconds(timestamp_arg(&args.arg(0))?)?;
            Ok(calendar.object(interp, Temporal::DateTime { at, aware: false }))
        });
        let calendar = Rc::clone(self);
        let fromisoformat = native(move |interp, args| {
            args.arity("fromisoformat", 1, 1)?;
            let (at, aware) = parse_iso(&text_arg(&args, 0, "fromisoformat")?)?;
            Ok(calendar.object(interp, Temporal::DateTime { at: in_range(at)?, aware }))
        });
        let calendar = Rc::clone(self);
        let strptime = native(move |interp, args| {
            args.arity("strptime", 2, 2)?;
            let at = parse_with(&text_arg(&args, 0, "strptime")?, &text_arg(&args, 1, "strptime")?)?;
            Ok(calendar.object(interp, Temporal::DateTime { at, aware: false }))
        });
        let calendar = Rc::clone(self);
        let combine = native(move |interp, args| {
            args.arity("combine", 2, 2)?;
            match (Calendar::decode(interp, &args.arg(0)), Calendar::decode(interp, &args.arg(1))) {
                (Some(Temporal::Date(date)), Some(Temporal::Time(time))) => Ok(calendar.object(
                    interp,
                    Temporal::DateTime { at: date.and_time(time), aware: false },
                )),
                _ => Err(type_error("combine() expects a date and a time")),
            }
        });
        let class = ModuleBuilder::object("datetime.datetime", "<class 'datetime.datetime'>", "<class 'datetime.datetime'>")
            .function("__call__", Some("datetime(year, month, day[, hour[, minute[, second[, microsecond[,tzinfo]]]]])"), construct)
            .function("now", Some("Returns new datetime object representing current time local to tz."), now)
            .function("utcnow", Some("Return a new datetime representing UTC day and time."), utcnow)
            .function("today", Some("Current date or datetime:  same as self.__class__.fromtimestamp(time.time())."), self.today_of(true))
            .function("fromtimestamp", Some("timestamp[, tz] -> tz's local time from POSIX timestamp."), fromtimestamp)
            .function("utcfromtimestamp", Some("Construct a naive UTC datetime from a POSIX timestamp."), utcfromtimestamp)
            .function("fromisoformat", Some("string -> datetime from datetime.isoformat() output"), fromisoformat)
            .function("strptime", Some("string, format -> new datetime parsed from a string (like time.strptime())."), strptime)
            .function("combine", Some("date, time -> datetime with same date and time fields"), combine)
            .build(session.interner());
        Value::Module(Rc::new(class))
    }

    /// `today()`: the block day, as a datetime or a date.
    fn today_of(self: &Rc<Self>, with_time: bool) -> NativeFn {
        let calendar = Rc::clone(self);
        native(move |interp, args| {
            args.arity("today", 0, 0)?;
            let today = if with_time {
                Temporal::DateTime { at: calendar.now, aware: false }
            } else {
                Temporal::Date(calendar.now.date())
            };
            Ok(calendar.object(interp, today))
        })
    }

    fn date_type(self: &Rc<Self>, session: &Session) -> Value {
        let calendar = Rc::clone(self);
        let construct = native(move |interp, mut args| {
            let [year, month, day] = int_fields(&mut args, "date", ["year", "month", "day"], [None, None, None])?;
            args.no_extra_keywords("date")?;
            args.positional_arity("date", 3, 3)?;
            let at = build_datetime([year, month, day, 0, 0, 0, 0])?;
            Ok(calendar.object(interp, Temporal::Date(at.date())))
        });
        let calendar = Rc::clone(self);
        let fromtimestamp = native(move |interp, args| {
            args.arity("fromtimestamp", 1, 1)?;
            let at = from_seconds(timestamp_arg(&args.arg(0))?)?;
            Ok(calendar.object(interp, Temporal::Date(at.date())))
        });
        let calendar = Rc::clone(self);
        let fromisoformat = native(move |interp, args| {
            args.arity("fromisoformat", 1, 1)?;
            let text = text_arg(&args, 0, "fromisoformat")?;
            let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map_err(|_| value_error(format!("Invalid isoformat string: '{text}'")))?;
            let at = in_range(date.and_time(NaiveTime::MIN))?;
            Ok(calendar.object(interp, Temporal::Date(at.date())))
        });
        let class = ModuleBuilder::object("datetime.date", "<class 'datetime.date'>", "<class 'datetime.date'>")
            .function("__call__", Some("date(year, month, day) --> date object"), construct)
            .function("today", Some("Current date or datetime:  same as self.__class__.fromtimestamp(time.time())."), self.today_of(false))
            .function("fromtimestamp", Some("Create a date from a POSIX timestamp."), fromtimestamp)
            .function("fromisoformat", Some("str -> Construct a date from the output of date.isoformat()"), fromisoformat)
            .build(session.interner());
        Value::Module(Rc::new(class))
    }

    fn time_type(self: &Rc<Self>, session: &Session) -> Value {
        let calendar = Rc::clone(self);
        let construct = native(move |interp, mut args| {
            let [hour, minute, second, micro] = int_fields(
                &mut args,
                "time",
                ["hour", "minute", "second", "microsecond"],
                [Some(0), Some(0), Some(0), Some(0)],
            )?;
            args.no_extra_keywords("time")?;
            args.positional_arity("time", 0, 4)?;
            let at = build_datetime([1900, 1, 1, hour, minute, second, micro])?;
            Ok(calendar.object(interp, Temporal::Time(at.time())))
        });
        let class = ModuleBuilder::object("datetime.time", "<class 'datetime.time'>", "<class 'datetime.time'>")
            .function("__call__", Some("time([hour[, minute[, second[, microsecond]]]]) --> a time object"), construct)
            .build(session.interner());
        Value::Module(Rc::new(class))
    }

    fn timedelta_type(self: &Rc<Self>, session: &Session) -> Value {
        let calendar = Rc::clone(self);
        let construct = native(move |interp, mut args| {
            let micros = delta_micros(&mut args)?;
            Ok(calendar.object(interp, Temporal::Delta(micros)))
        });
        let class = ModuleBuilder::object("datetime.timedelta", "<class 'datetime.timedelta'>", "<class 'datetime.timedelta'>")
            .function("__call__", Some("Difference between two datetime values."), construct)
            .build(session.interner());
        Value::Module(Rc::new(class))
    }
}

pub fn module(session: &Session, now: NaiveDateTime) -> ModuleValue {
    let utc = Rc::new(
        ModuleBuilder::object("datetime.timezone", "datetime.timezone.utc", "UTC").build(session.interner()),
    );
    let timezone = ModuleBuilder::object("datetime.timezone", "<class 'datetime.timezone'>", "<class 'datetime.timezone'>")
        .constant("utc", Value::Module(Rc::clone(&utc)))
        .build(session.interner());
    let calendar = Rc::new(Calendar { now, utc: Rc::clone(&utc) });
    ModuleBuilder::new("datetime", Some("Fast implementation of the datetime type."))
        .constant("MINYEAR", Value::Int(i64::from(MIN_YEAR)))
        .constant("MAXYEAR", Value::Int(i64::from(MAX_YEAR)))
        .constant("datetime", calendar.datetime_type(session))
        .constant("date", calendar.date_type(session))
        .constant("time", calendar.time_type(session))
        .constant("timedelta", calendar.timedelta_type(session))
        .constant("timezone", Value::Module(Rc::new(timezone)))
        .constant("UTC", Value::Module(utc))
        .build(session.interner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(text: &str) -> NaiveDateTime {
        parse_iso(text).map(|(at, _)| at).unwrap_or_default()
    }

    #[test]
    fn block_time_truncates_to_microseconds() {
        assert_eq!(block_time(&json!("2023-05-01T12:30:00.123456789Z")), at("2023-05-01T12:30:00.123456"));
        assert_eq!(block_time(&json!(86_400)), at("1970-01-02"));
        assert_eq!(block_time(&Json::Null), NaiveDateTime::default());
    }

    #[test]
    fn iso_strings_round_trip_through_text() {
        let value = Temporal::DateTime { at: at("2024-02-29T08:05:03.000250"), aware: true };
        assert_eq!(value.isoformat("T", "auto").ok().as_deref(), Some("2024-02-29T08:05:03.000250+00:00"));
        assert_eq!(value.repr(), "datetime.datetime(2024, 2, 29, 8, 5, 3, 250, tzinfo=datetime.timezone.utc)");
        assert_eq!(parse_iso("2024-02-29 08:05+02:00").err().map(|e| e.message()).as_deref(), Some("only UTC offsets are supported"));
    }

    #[test]
    fn timedeltas_normalize_like_python() {
        assert_eq!(delta_repr(-SECOND), "datetime.timedelta(days=-1, seconds=86399)");
        assert_eq!(delta_text(-SECOND), "-1 day, 23:59:59");
        assert_eq!(delta_text(2 * DAY + 90 * SECOND + 5), "2 days, 0:01:30.000005");
        assert_eq!(delta_repr(0), "datetime.timedelta(0)");
    }

    #[test]
    fn strftime_speaks_python_codes() {
        let when = at("2023-07-04T09:08:07.000001");
        assert_eq!(render("%Y-%m-%d %H:%M:%S.%f%z", when, false).ok().as_deref(), Some("2023-07-04 09:08:07.000001"));
        assert_eq!(render("%z %Z", when, true).ok().as_deref(), Some("+0000 UTC"));
        assert_eq!(parse_with("04/07/2023", "%d/%m/%Y").ok(), Some(at("2023-07-04")));
    }

    #[test]
    fn arithmetic_keeps_the_calendar() {
        let day = Temporal::Date(at("2024-02-28").date());
        let next = day.add(Temporal::Delta(DAY)).ok().flatten();
        assert_eq!(next, Some(Temporal::Date(at("2024-02-29").date())));
        let gap = Temporal::Date(at("2024-03-01").date()).sub(day).ok().flatten();
        assert_eq!(gap, Some(Temporal::Delta(2 * DAY)));
        let overflow = Temporal::Date(at("9999-12-31").date()).add(Temporal::Delta(DAY));
        assert!(overflow.is_err());
    }
}
