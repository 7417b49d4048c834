mod common;

use retrace::{
    compare, markup, Changeset, CommandBuilder, CommandOrder, Document, HostTree, NodeId, NodeRef, Operation,
    Outcome, ReconcileError, ReconcileOptions, Snapshot,
};

use common::{load_scenarios, plan, replay, same_shape, with_order};

#[test]
fn classic_scenarios_reproduce_the_new_markup() {
    let scenarios = load_scenarios();
    assert!(scenarios.len() >= 20);
    for s in &scenarios {
        let result = replay(&s.old, &s.new, ReconcileOptions::default());
        assert_eq!(result, s.new, "scenario {:?}", s.name);
    }
}

#[test]
fn replace_last_reproduces_every_scenario() {
    for s in &load_scenarios() {
        let result = replay(&s.old, &s.new, with_order(CommandOrder::ReplaceLast));
        assert_eq!(result, s.new, "scenario {:?}", s.name);
    }
}

#[test]
fn replace_last_keeps_kind_swaps_in_place() {
    let cases = [
        ("<div>test</div>", "<div><h1>Test</h1></div>"),
        ("<div><h1>Test</h1></div>", "<div>test!</div>"),
        ("<p><!--c--><b>x</b></p>", "<p><i class=\"k\">y</i>z</p>"),
    ];
    for (old, new) in cases {
        let (_, changeset) = plan(old, new, with_order(CommandOrder::ReplaceLast));
        let changeset = changeset.unwrap();
        let sorted = changeset.sorted();
        let first_rename = sorted.iter().position(|c| c.op.is_rename()).unwrap_or(sorted.len());
        assert!(sorted[first_rename..].iter().all(|c| c.op.is_rename()), "{old} -> {new}");
        assert_eq!(replay(old, new, with_order(CommandOrder::ReplaceLast)), new);
    }
}

#[test]
fn replace_last_handles_renames() {
    let old = r#"<div><h4 class="new"></h4><section><p>x</p></section></div>"#;
    let new = r#"<div><h6 class="new" id="test"><p></p></h6><article><p>y</p></article></div>"#;
    assert_eq!(replay(old, new, with_order(CommandOrder::ReplaceLast)), new);
}

#[test]
fn identical_markup_needs_no_changeset() {
    let markup = "<div><div>test!</div>test</div>";
    let (_, changeset) = plan(markup, markup, ReconcileOptions::default());
    assert!(changeset.is_none());
}

#[test]
fn nested_insert_targets_the_existing_node() {
    let old = "<div><h1></h1><h2></h2><h3><em></em></h3><h4></h4></div>";
    let new = "<div><h1></h1><h2></h2><h3><em><b></b><i></i></em></h3><h4></h4></div>";
    let (doc, changeset) = plan(old, new, ReconcileOptions::default());
    let changeset = changeset.unwrap();

    let commands = changeset.all();
    assert_eq!(commands.len(), 2);
    for (cmd, (index, tag)) in commands.iter().zip([(0, "b"), (1, "i")]) {
        assert_eq!(
            cmd.op,
            Operation::InsertNode {
                index,
                node: Snapshot::element(tag),
            }
        );
        assert_eq!(cmd.target.debug_path(&doc), "body.0.2.0");
        assert_eq!(cmd.depth, 3);
        assert_eq!(cmd.order, 0);
    }
}

#[test]
fn positional_change_is_a_single_replacement() {
    let old = "<div><h1></h1><h2></h2><h3></h3><h4></h4></div>";
    let new = "<div><h1></h1><h2></h2><h5><p></p></h5><h4></h4></div>";
    let (mut doc, changeset) = plan(old, new, ReconcileOptions::default());
    let changeset = changeset.unwrap();
    let h4 = doc.child_at(doc.child_at(doc.root(), 0).unwrap(), 3).unwrap();

    let names: Vec<_> = changeset.all().iter().map(|c| c.op.name()).collect();
    assert_eq!(names, vec!["replaceNode", "insertNode"]);
    changeset.apply(&mut doc).unwrap();
    assert_eq!(doc.markup(), new);
    // untouched siblings keep their identity
    assert_eq!(doc.child_at(doc.child_at(doc.root(), 0).unwrap(), 3), Some(h4));
}

#[test]
fn tag_replacement_keeps_attributes_and_children() {
    let old = r#"<div class="box" id="a">text<b>bold</b></div>"#;
    let new = r#"<h1 class="box" id="a">text<b>bold</b></h1>"#;
    let (mut doc, changeset) = plan(old, new, ReconcileOptions::default());
    let changeset = changeset.unwrap();
    assert_eq!(changeset.len(), 1);

    let outcomes = changeset.apply(&mut doc).unwrap();
    let Outcome::Replaced { old, new: replacement } = outcomes[0] else {
        panic!("expected a replacement, got {outcomes:?}");
    };
    assert_eq!(doc.node_name(old).as_deref(), Some("div"));
    assert_eq!(doc.attribute(replacement, "id"), Some("a"));
    assert_eq!(doc.child_count(replacement), 2);
    assert_eq!(doc.markup(), new);
}

#[test]
fn whole_collections_are_bulk_commands() {
    let (_, changeset) = plan("<ul></ul>", "<ul><li>a</li><li>b</li></ul>", ReconcileOptions::default());
    let ops: Vec<_> = changeset.unwrap().all().iter().map(|c| c.op.name()).collect();
    assert_eq!(ops, vec!["insertNode", "insertNode"]);

    let (_, changeset) = plan("<ul><li>a</li><li>b</li></ul>", "<ul></ul>", ReconcileOptions::default());
    let ops: Vec<_> = changeset.unwrap().all().iter().map(|c| c.op.name()).collect();
    assert_eq!(ops, vec!["emptyNode"]);
}

#[test]
fn attribute_fan_out_leaves_no_residue() {
    let old = "<h1></h1>";
    let new = r#"<h1 class="hide" id="test"></h1>"#;
    let (_, changeset) = plan(old, new, ReconcileOptions::default());
    let ops: Vec<_> = changeset.unwrap().all().iter().map(|c| c.op.name()).collect();
    assert_eq!(ops, vec!["setAttribute", "setAttribute"]);

    let (mut doc, changeset) = plan(new, old, ReconcileOptions::default());
    let changeset = changeset.unwrap();
    let ops: Vec<_> = changeset.all().iter().map(|c| c.op.name()).collect();
    assert_eq!(ops, vec!["removeAttribute", "removeAttribute"]);
    changeset.apply(&mut doc).unwrap();
    let h1 = doc.child_at(doc.root(), 0).unwrap();
    assert_eq!(doc.snapshot(h1), Some(Snapshot::element("h1")));
}

#[test]
fn blank_text_is_ignored_on_both_sides() {
    let old = "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>";
    let new = "<ul><li>a</li><li>c</li><li>d</li></ul>";
    let result = replay(old, new, ReconcileOptions::default());
    assert!(same_shape(&result, new), "{result}");
    assert!(result.contains("\n  <li>c</li>"));
}

#[test]
fn blank_text_counts_when_whitespace_matters() {
    let options = ReconcileOptions {
        ignore_whitespace: false,
        ..ReconcileOptions::default()
    };
    let old = "<p> a </p>\n<p>b</p>";
    let new = "<p> a </p>\n<p>c</p>\n";
    assert_eq!(replay(old, new, options), new);
}

#[test]
fn failing_command_leaves_earlier_commands_applied() {
    let mut doc = Document::from_markup("body", "<p>a</p>").unwrap();
    let root = NodeRef::root(doc.root(), ReconcileOptions::default().child_policy());
    let p = NodeRef::child(0, &root);
    let mut changeset: Changeset<NodeId> = Changeset::new(&ReconcileOptions::default());
    let set = Operation::SetAttribute {
        name: "id".into(),
        value: "x".into(),
    };
    changeset.add(CommandBuilder::new(set).target(p.clone()).depth(0).order(0)).unwrap();
    // setData on an element is rejected by the host
    let data = Operation::SetData { value: "b".into() };
    changeset.add(CommandBuilder::new(data).target(p).depth(0).order(1)).unwrap();

    let err = changeset.apply(&mut doc).unwrap_err();
    assert!(matches!(err, ReconcileError::Host(ref e) if e.op == "set_data"), "{err}");
    assert_eq!(doc.markup(), r#"<p id="x">a</p>"#);
}

#[test]
fn stale_live_tree_is_reported() {
    // The live tree lost its only child since the old snapshot was taken.
    let old = markup::parse("<p>a</p>").unwrap();
    let new = markup::parse("<p>b</p>").unwrap();
    let mut doc = Document::new("body");
    let changeset = compare(&doc, doc.root(), &old, &new, &ReconcileOptions::default())
        .unwrap()
        .unwrap();
    let err = changeset.apply(&mut doc).unwrap_err();
    assert!(matches!(err, ReconcileError::Unresolved { op: "setData", .. }), "{err}");
}

#[test]
fn engine_tracks_successive_generations() {
    let mut doc = Document::from_markup("body", "<div>1</div>").unwrap();
    let root = doc.root();
    let mut engine = retrace::Retrace::with_markup(ReconcileOptions::default());

    for next in ["<div></div><div></div>", "<div></div><li></li>", "<ol><li>x</li></ol>", "<ol><li>x</li></ol>"] {
        engine.update(next, &mut doc, root).unwrap();
        assert_eq!(doc.markup(), next);
        assert_eq!(engine.current(), Some(markup::parse(next).unwrap().as_slice()));
    }
}
