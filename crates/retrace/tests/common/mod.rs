#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use retrace::{markup, Changeset, Document, NodeId, ReconcileOptions, Retrace};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenario: Vec<Scenario>,
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn load_scenarios() -> Vec<Scenario> {
    let path = fixtures_dir().join("scenarios.toml");
    let text = fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {e}", path));
    let file: ScenarioFile = toml::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {:?}: {e}", path));
    file.scenario
}

/// A live tree built from `old` and an engine that has parsed `new`.
pub fn prepare(old: &str, new: &str, options: ReconcileOptions) -> (Document, Retrace<retrace::MarkupParser>) {
    let doc = Document::from_markup("body", old).unwrap_or_else(|e| panic!("bad old markup: {e}"));
    let mut engine = Retrace::with_markup(options);
    engine
        .parse(new, &doc, doc.root())
        .unwrap_or_else(|e| panic!("bad new markup: {e}"));
    (doc, engine)
}

/// Plans the changes from `old` to `new` against a fresh live tree.
pub fn plan(old: &str, new: &str, options: ReconcileOptions) -> (Document, Option<Changeset<NodeId>>) {
    let (doc, engine) = prepare(old, new, options);
    let changeset = engine
        .compare(&doc, doc.root())
        .unwrap_or_else(|e| panic!("compare failed: {e}"));
    (doc, changeset)
}

/// Reconciles a live tree built from `old` towards `new` and returns the
/// resulting markup.
pub fn replay(old: &str, new: &str, options: ReconcileOptions) -> String {
    let (mut doc, changeset) = plan(old, new, options);
    if let Some(changeset) = changeset {
        changeset
            .apply(&mut doc)
            .unwrap_or_else(|e| panic!("apply failed: {e}"));
    }
    doc.markup()
}

pub fn with_order(order: retrace::CommandOrder) -> ReconcileOptions {
    ReconcileOptions {
        order,
        ..ReconcileOptions::default()
    }
}

/// Markup compared modulo whitespace-only text.
pub fn same_shape(a: &str, b: &str) -> bool {
    markup::parse(a).ok() == markup::parse(b).ok()
}
