//! Non-fatal findings of a run.

use std::fmt;

use imdecl::Declaration;
use log::warn;

/// One finding, optionally tied to the declaration it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub decl: Option<Declaration>,
    /// Fully qualified description of the subject.
    pub subject: String,
    pub text: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.text)
    }
}

/// Sink collecting diagnostics; every entry is also logged as a warning.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, subject: impl Into<String>, text: impl Into<String>) {
        self.push(None, subject.into(), text.into());
    }

    pub fn warn_on(
        &mut self,
        decl: Declaration,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.push(Some(decl), subject.into(), text.into());
    }

    fn push(&mut self, decl: Option<Declaration>, subject: String, text: String) {
        warn!("{subject}: {text}");
        self.entries.push(Diagnostic {
            decl,
            subject,
            text,
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics about one declaration.
    pub fn about(&self, decl: Declaration) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.decl == Some(decl))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
