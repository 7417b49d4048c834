//! Two-generation reconciliation engine.
//!
//! [`Retrace`] keeps the two most recent parsed snapshots of a document. Each
//! successful parse shifts them; [`Retrace::compare`] plans the commands that
//! turn the live tree from the previous generation into the current one.

use log::{debug, info};

use crate::changeset::{Changeset, Outcome};
use crate::error::{ReconcileError, Result};
use crate::host::HostTree;
use crate::markup::{self, extract_body};
use crate::options::ReconcileOptions;
use crate::reconcile::compare;
use crate::snapshot::Snapshot;

/// Turns raw document text into a snapshot forest.
pub trait SnapshotParser {
    fn parse_complete(&mut self, raw: &str) -> Result<Vec<Snapshot>>;
}

/// [`SnapshotParser`] backed by the built-in markup reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupParser {
    pub ignore_whitespace: bool,
}

impl Default for MarkupParser {
    fn default() -> Self {
        MarkupParser {
            ignore_whitespace: true,
        }
    }
}

impl SnapshotParser for MarkupParser {
    fn parse_complete(&mut self, raw: &str) -> Result<Vec<Snapshot>> {
        markup::parse_with(raw, self.ignore_whitespace).map_err(|e| ReconcileError::Parse(e.to_string()))
    }
}

impl<F> SnapshotParser for F
where
    F: FnMut(&str) -> Result<Vec<Snapshot>>,
{
    fn parse_complete(&mut self, raw: &str) -> Result<Vec<Snapshot>> {
        self(raw)
    }
}

#[derive(Debug)]
pub struct Retrace<P> {
    parser: P,
    options: ReconcileOptions,
    previous: Option<Vec<Snapshot>>,
    current: Option<Vec<Snapshot>>,
}

impl Retrace<MarkupParser> {
    /// An engine using the built-in markup reader, configured from `options`.
    pub fn with_markup(options: ReconcileOptions) -> Self {
        let parser = MarkupParser {
            ignore_whitespace: options.ignore_whitespace,
        };
        Retrace::new(parser, options)
    }
}

impl<P: SnapshotParser> Retrace<P> {
    pub fn new(parser: P, options: ReconcileOptions) -> Self {
        Retrace {
            parser,
            options,
            previous: None,
            current: None,
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// The generation the live tree is expected to match.
    pub fn previous(&self) -> Option<&[Snapshot]> {
        self.previous.as_deref()
    }

    /// The most recently parsed generation.
    pub fn current(&self) -> Option<&[Snapshot]> {
        self.current.as_deref()
    }

    /// Parses `raw`, restricted to its `<body>` content when there is one.
    pub fn parse<H>(&mut self, raw: &str, host: &H, root: H::Node) -> Result<&[Snapshot]>
    where
        H: HostTree + ?Sized,
    {
        self.parse_with(raw, |raw| extract_body(raw).to_string(), host, root)
    }

    /// Parses `extract(raw)` and shifts the generations.
    ///
    /// On the first call the current children of `root` are parsed as the
    /// previous generation. A failed parse leaves both generations unchanged.
    pub fn parse_with<H, E>(&mut self, raw: &str, extract: E, host: &H, root: H::Node) -> Result<&[Snapshot]>
    where
        H: HostTree + ?Sized,
        E: FnOnce(&str) -> String,
    {
        let next = self.parser.parse_complete(&extract(raw))?;
        let previous = match self.current.take() {
            Some(current) => current,
            None => {
                let live = host.inner_markup(root)?;
                self.parser.parse_complete(&live)?
            }
        };
        debug!(
            target: "retrace.engine",
            "generations shifted: {} -> {} root nodes",
            previous.len(),
            next.len()
        );
        self.previous = Some(previous);
        let current = self.current.insert(next);
        Ok(current.as_slice())
    }

    /// Plans the commands that turn the previous generation into the current
    /// one. `Ok(None)` when both are identical.
    pub fn compare<H>(&self, host: &H, root: H::Node) -> Result<Option<Changeset<H::Node>>>
    where
        H: HostTree + ?Sized,
    {
        let (Some(previous), Some(current)) = (&self.previous, &self.current) else {
            return Err(ReconcileError::MissingGeneration);
        };
        compare(host, root, previous, current, &self.options)
    }

    /// Parses `raw`, compares and applies in one step.
    pub fn update<H>(&mut self, raw: &str, host: &mut H, root: H::Node) -> Result<Vec<Outcome<H::Node>>>
    where
        H: HostTree + ?Sized,
    {
        self.parse(raw, &*host, root)?;
        let Some(changeset) = self.compare(&*host, root)? else {
            debug!(target: "retrace.engine", "no changes");
            return Ok(Vec::new());
        };
        info!(target: "retrace.engine", "applying {} commands", changeset.len());
        changeset.apply(host)
    }
}
