mod common;

use proptest::prelude::*;

use retrace::{compare, diff, CommandOrder, Document, ReconcileOptions, Snapshot};

use common::with_order;

const TAGS: &[&str] = &["div", "p", "span", "em", "Em", "ul", "li", "h1", "section", "svgRect"];
const ATTRS: &[&str] = &["id", "class", "title"];

fn tag() -> impl Strategy<Value = String> {
    prop::sample::select(TAGS).prop_map(String::from)
}

fn leaf() -> impl Strategy<Value = Snapshot> {
    prop_oneof![
        3 => "[a-z]{1,4}".prop_map(Snapshot::text),
        1 => "[a-z ]{0,4}".prop_map(Snapshot::comment),
        3 => tag().prop_map(Snapshot::element),
    ]
}

fn node() -> impl Strategy<Value = Snapshot> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        (
            tag(),
            prop::collection::vec((prop::sample::select(ATTRS), "[a-z]{0,3}"), 0..3),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attrs, children)| {
                attrs
                    .into_iter()
                    .fold(Snapshot::element(name), |el, (k, v)| el.with_attr(k, v))
                    .with_children(merge_texts(children))
            })
    })
}

fn forest() -> impl Strategy<Value = Vec<Snapshot>> {
    prop::collection::vec(node(), 0..4).prop_map(merge_texts)
}

/// Adjacent text nodes cannot survive a trip through markup.
fn merge_texts(nodes: Vec<Snapshot>) -> Vec<Snapshot> {
    let mut out: Vec<Snapshot> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (out.last_mut(), node) {
            (Some(Snapshot::Text { data: prev }), Snapshot::Text { data }) => prev.push_str(&data),
            (_, node) => out.push(node),
        }
    }
    out
}

fn reconcile(old: &[Snapshot], new: &[Snapshot], options: &ReconcileOptions) -> Result<Vec<Snapshot>, String> {
    let mut doc = Document::from_snapshots("body", old);
    let root = doc.root();
    if let Some(changeset) = compare(&doc, root, old, new, options).map_err(|e| e.to_string())? {
        changeset.apply(&mut doc).map_err(|e| e.to_string())?;
    }
    Ok(doc.to_snapshots(root))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn reconciled_tree_matches_the_new_forest(old in forest(), new in forest()) {
        let result = reconcile(&old, &new, &ReconcileOptions::default());
        prop_assert_eq!(result, Ok(new));
    }

    #[test]
    fn identical_forests_need_no_changes(forest in forest()) {
        let doc = Document::from_snapshots("body", &forest);
        let value = retrace::snapshot::forest_to_value(&forest);
        prop_assert!(diff(&value, &value).is_none());
        let changeset = compare(&doc, doc.root(), &forest, &forest, &ReconcileOptions::default());
        prop_assert!(matches!(changeset, Ok(None)));
    }

    #[test]
    fn replace_last_reaches_the_same_tree(old in forest(), new in forest()) {
        let discovery = reconcile(&old, &new, &ReconcileOptions::default());
        let reordered = reconcile(&old, &new, &with_order(CommandOrder::ReplaceLast));
        prop_assert_eq!(&reordered, &discovery);
        prop_assert_eq!(reordered, Ok(new));
    }
}
