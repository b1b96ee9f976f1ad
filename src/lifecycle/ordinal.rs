//! Class ordinals
//!
//! A class name doubles as its grade level: the first run of digits in the
//! name is the ordinal ("Class 7" is grade 7). A name without digits is not
//! part of the numbered sequence; the configured terminal pool is such a name.
//!
//! Pure, no I/O. Swapping the parsing rule only touches this file.

use std::sync::OnceLock;

use regex::Regex;

/// Default name of the class holding students who finished the last grade.
pub const DEFAULT_TERMINAL_CLASS_NAME: &str = "Last Year Students";

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("static pattern compiles"))
}

/// Ordinal rules for one school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOrdinal {
    terminal_class_name: String,
}

impl Default for ClassOrdinal {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_CLASS_NAME)
    }
}

impl ClassOrdinal {
    pub fn new(terminal_class_name: impl Into<String>) -> Self {
        Self {
            terminal_class_name: terminal_class_name.into(),
        }
    }

    pub fn terminal_class_name(&self) -> &str {
        &self.terminal_class_name
    }

    /// Whether `name` is the terminal pool.
    pub fn is_terminal(&self, name: &str) -> bool {
        name == self.terminal_class_name
    }

    /// First run of digits in `name`, or `None` if there is none or it
    /// does not fit in a `u32`.
    pub fn ordinal_of(name: &str) -> Option<u32> {
        digit_run()
            .find(name)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    }

    /// Name of the class a student in `name` moves to.
    ///
    /// - ordinal below `max_ordinal`: the digit run is replaced by `ordinal + 1`
    /// - ordinal equal to `max_ordinal`: the terminal pool name
    /// - no ordinal, or above `max_ordinal`: `None`
    pub fn successor_name(&self, name: &str, max_ordinal: u32) -> Option<String> {
        let m = digit_run().find(name)?;
        let ordinal: u32 = m.as_str().parse().ok()?;

        if ordinal < max_ordinal {
            let mut next = String::with_capacity(name.len() + 1);
            next.push_str(&name[..m.start()]);
            next.push_str(&(ordinal + 1).to_string());
            next.push_str(&name[m.end()..]);
            Some(next)
        } else if ordinal == max_ordinal {
            Some(self.terminal_class_name.clone())
        } else {
            None
        }
    }
}
