//! Coloured test assertions reported through a [`Reporter`].
//!
//! Every check returns whether it passed, logs a `✓` / `✗` marker and, on
//! failure, hands a have/want message to the reporter. [`PanicReporter`]
//! turns failures into panics (hard assertions); [`Recorder`] collects them
//! (soft assertions).
//!
//! Output is coloured unless `NO_COLOR` is set.
//!
//! ```
//! use mtls_kit::assert::{self, Assert, Recorder};
//!
//! assert::equal(&2, &2);
//!
//! let soft = Assert::new(Recorder::default());
//! soft.lower(&3, &1);
//! assert!(soft.reporter().failed());
//! ```

use std::any::{Any, type_name};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use colored::Colorize;

use crate::{Error, ErrorKind};

/// Sink for assertion output.
pub trait Reporter {
    /// Informational line.
    fn log(&self, msg: &str);

    /// A failed assertion.
    fn fail(&self, msg: &str);
}

/// Prints log lines and panics on the first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn log(&self, msg: &str) {
        println!("{msg}");
    }

    #[track_caller]
    fn fail(&self, msg: &str) {
        panic!("{msg}");
    }
}

/// Keeps every log line and failure for later inspection.
#[derive(Debug, Default)]
pub struct Recorder {
    logs: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl Recorder {
    /// Failure messages so far.
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log lines so far.
    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True once any assertion failed.
    pub fn failed(&self) -> bool {
        !self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Reporter for Recorder {
    fn log(&self, msg: &str) {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg.to_owned());
    }

    fn fail(&self, msg: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg.to_owned());
    }
}

/// Assertion front-end bound to one reporter.
#[derive(Debug, Default)]
pub struct Assert<R = PanicReporter> {
    reporter: R,
}

impl<R: Reporter> Assert<R> {
    /// Bind to `reporter`.
    pub fn new(reporter: R) -> Self {
        Self { reporter }
    }

    /// The bound reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Unwrap the reporter.
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Forward an informational line to the reporter.
    pub fn log(&self, msg: &str) {
        self.reporter.log(msg);
    }

    /// Report an unconditional failure.
    #[track_caller]
    pub fn fail(&self, msg: &str) -> bool {
        self.check(false, || msg.to_owned())
    }

    #[track_caller]
    fn check(&self, ok: bool, msg: impl FnOnce() -> String) -> bool {
        if ok {
            self.reporter.log(&format!("\t\t\t\t {}", "✓".green()));
        } else {
            self.reporter.log(&format!("\t\t\t\t {}", "✗".red().bold()));
            self.reporter.fail(&msg());
        }
        ok
    }

    /// `have == want`
    #[track_caller]
    pub fn equal<T: PartialEq + Debug + ?Sized>(&self, have: &T, want: &T) -> bool {
        self.check(have == want, || not_equal_msg(have, want))
    }

    /// `have == want`, failing with `ctx`.
    #[track_caller]
    pub fn equal_ctx<T: PartialEq + ?Sized>(&self, have: &T, want: &T, ctx: &str) -> bool {
        self.check(have == want, || ctx.to_owned())
    }

    /// `have != want`
    #[track_caller]
    pub fn not_equal<T: PartialEq + Debug + ?Sized>(&self, have: &T, want: &T) -> bool {
        self.check(have != want, || {
            format!("{have:?} was expected to differ from {want:?}")
        })
    }

    /// `have != want`, failing with `ctx`.
    #[track_caller]
    pub fn not_equal_ctx<T: PartialEq + ?Sized>(&self, have: &T, want: &T, ctx: &str) -> bool {
        self.check(have != want, || ctx.to_owned())
    }

    /// `have` is true.
    #[track_caller]
    pub fn is_true(&self, have: bool) -> bool {
        self.check(have, || not_equal_msg(&have, &true))
    }

    /// `have` is true, failing with `ctx`.
    #[track_caller]
    pub fn is_true_ctx(&self, have: bool, ctx: &str) -> bool {
        self.check(have, || ctx.to_owned())
    }

    /// `have` is false.
    #[track_caller]
    pub fn is_false(&self, have: bool) -> bool {
        self.check(!have, || not_equal_msg(&have, &false))
    }

    /// `have` is false, failing with `ctx`.
    #[track_caller]
    pub fn is_false_ctx(&self, have: bool, ctx: &str) -> bool {
        self.check(!have, || ctx.to_owned())
    }

    /// `have` holds a value.
    #[track_caller]
    pub fn is_some<T: Debug>(&self, have: &Option<T>) -> bool {
        self.check(have.is_some(), || "expected a value, got None".to_owned())
    }

    /// `have` is empty.
    #[track_caller]
    pub fn is_none<T: Debug>(&self, have: &Option<T>) -> bool {
        self.check(have.is_none(), || format!("expected None, got {have:?}"))
    }

    /// `have < want`
    #[track_caller]
    pub fn lower<T: PartialOrd + Debug + ?Sized>(&self, have: &T, want: &T) -> bool {
        self.check(have < want, || format!("{have:?} is greater than {want:?}"))
    }

    /// `have >= want`
    #[track_caller]
    pub fn equal_or_greater<T: PartialOrd + Debug + ?Sized>(&self, have: &T, want: &T) -> bool {
        self.check(have >= want, || {
            format!("{have:?} is strictly lower than {want:?}")
        })
    }

    /// Check the concrete type behind `have`.
    #[track_caller]
    pub fn is<T: Any>(&self, have: &dyn Any) -> bool {
        self.check(have.is::<T>(), || format!("value is not a {}", type_name::<T>()))
    }

    /// `String` or `&str`.
    #[track_caller]
    pub fn is_string(&self, have: &dyn Any) -> bool {
        self.check(have.is::<String>() || have.is::<&str>(), || {
            "value is not a string".to_owned()
        })
    }

    /// Any signed or unsigned primitive integer.
    #[track_caller]
    pub fn is_int(&self, have: &dyn Any) -> bool {
        let ok = have.is::<i8>()
            || have.is::<i16>()
            || have.is::<i32>()
            || have.is::<i64>()
            || have.is::<isize>()
            || have.is::<u8>()
            || have.is::<u16>()
            || have.is::<u32>()
            || have.is::<u64>()
            || have.is::<usize>();
        self.check(ok, || "value is not an int".to_owned())
    }

    /// Classify `err` with [`Error::kind`].
    #[track_caller]
    pub fn error_kind(&self, err: &Error, want: ErrorKind) -> bool {
        self.check(err.kind() == want, || {
            format!("error {err} is {:?}, not {want:?}", err.kind())
        })
    }

    /// Substring check.
    #[track_caller]
    pub fn contains(&self, have: &str, needle: &str) -> bool {
        self.check(have.contains(needle), || {
            format!("{have:?} does not contain {needle:?}")
        })
    }
}

fn not_equal_msg<T: Debug + ?Sized>(have: &T, want: &T) -> String {
    format!(
        "\n\t[{}] :\t> {} <\t\n\t[{}] :\t> {} <\t\n",
        "✗".red().bold(),
        format!("{have:?}").yellow().bold(),
        "✓".green().bold(),
        format!("{want:?}").green().bold(),
    )
}

/// Panic unless `have == want`.
#[track_caller]
pub fn equal<T: PartialEq + Debug + ?Sized>(have: &T, want: &T) {
    Assert::new(PanicReporter).equal(have, want);
}

/// Panic if `have == want`.
#[track_caller]
pub fn not_equal<T: PartialEq + Debug + ?Sized>(have: &T, want: &T) {
    Assert::new(PanicReporter).not_equal(have, want);
}

/// Panic unless `have`.
#[track_caller]
pub fn is_true(have: bool) {
    Assert::new(PanicReporter).is_true(have);
}

/// Panic if `have`.
#[track_caller]
pub fn is_false(have: bool) {
    Assert::new(PanicReporter).is_false(have);
}

/// Panic unless `have < want`.
#[track_caller]
pub fn lower<T: PartialOrd + Debug + ?Sized>(have: &T, want: &T) {
    Assert::new(PanicReporter).lower(have, want);
}

/// Panic unless `have >= want`.
#[track_caller]
pub fn equal_or_greater<T: PartialOrd + Debug + ?Sized>(have: &T, want: &T) {
    Assert::new(PanicReporter).equal_or_greater(have, want);
}

/// Panic unless `needle` is in `have`.
#[track_caller]
pub fn contains(have: &str, needle: &str) {
    Assert::new(PanicReporter).contains(have, needle);
}
