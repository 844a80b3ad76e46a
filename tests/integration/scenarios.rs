use snipkit::core::{DefinitionError, SnipError};
use snipkit::engine::{Direction, Engine, UpdateScope};
use snipkit::snippet::text::lines_from;
use snipkit::snippet::{Address, ArgRef, NodeDefinition as N, Snippet, SnippetDefinition};
use snipkit::test_utils::{arrow_definition, concat_lines, init_test_logging};

#[test]
fn test_arrow_snippet_end_to_end() {
    init_test_logging(None);
    let snippet = Snippet::compile(&arrow_definition()).unwrap();
    assert_eq!(snippet.static_text(), lines_from("a -> a == a"));

    let mut session = snippet.expand();
    assert_eq!(session.text(), lines_from("a -> a == a"));
    assert!(session.pending_functions().is_empty());

    session.on_text_changed(&Address::from(1), "b").unwrap();
    // Edits never recompute on their own
    assert_eq!(session.text(), lines_from("b -> a == a"));
    assert_eq!(session.pending_functions().len(), 2);

    let report = session.update(&UpdateScope::All).unwrap();
    assert_eq!(session.text(), lines_from("b -> b == b"));
    assert_eq!(report.deltas.len(), 2);
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.pending, 0);
    assert!(report.is_clean());

    // Deltas are positioned against the text at the time they were produced
    assert_eq!(report.deltas[0].start.column, 5);
    assert_eq!(report.deltas[1].start.column, 10);
}

#[test]
fn test_update_twice_is_a_no_op() {
    let mut session = Snippet::compile(&arrow_definition()).unwrap().expand();
    session.on_text_changed(&Address::from(1), "b").unwrap();
    session.update(&UpdateScope::All).unwrap();

    let second = session.update(&UpdateScope::All).unwrap();
    assert!(!second.changed());
    assert_eq!(second.evaluated, 0);
}

#[test]
fn test_chained_functions_update_in_dependency_order() {
    // The second function reads the first one through its absolute address
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "chain",
        vec![
            N::function([ArgRef::abs([3])], |args| Ok(vec![format!("[{}]", args[0][0])])),
            N::text(" "),
            // A nested snippet without tabstops still renders its function text
            N::nested(
                3,
                vec![N::function([ArgRef::abs([4])], |args| Ok(vec![args[0][0].to_uppercase()]))],
            ),
            N::insert(4, "x"),
        ],
    ));

    let mut session = Engine::default().expand(&snippet.unwrap());
    assert_eq!(session.text(), lines_from("[X] Xx"));

    session.on_text_changed(&Address::from(4), "abc").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();
    assert_eq!(session.text(), lines_from("[ABC] ABCabc"));
    assert_eq!(report.evaluated, 2);
}

#[test]
fn test_nested_scopes_resolve_relative_and_absolute_arguments() {
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "nested",
        vec![
            N::insert(1, "outer"),
            N::text("("),
            N::nested(
                2,
                vec![
                    N::insert(1, "inner"),
                    N::text(":"),
                    N::function([ArgRef::rel(1), ArgRef::abs([1])], concat_lines),
                ],
            ),
            N::text(")"),
        ],
    ))
    .unwrap();

    let mut session = snippet.expand();
    assert_eq!(session.text(), lines_from("outer(inner:innerouter)"));

    session.on_text_changed(&Address::from([2, 1]), "x").unwrap();
    session.update(&UpdateScope::Subtree(Address::from(2))).unwrap();
    assert_eq!(session.text(), lines_from("outer(x:xouter)"));

    session.on_text_changed(&Address::from(1), "y").unwrap();
    session.update(&UpdateScope::All).unwrap();
    assert_eq!(session.text(), lines_from("y(x:xy)"));
}

#[test]
fn test_subtree_update_leaves_other_functions_pending() {
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "scoped",
        vec![
            N::insert(1, "a"),
            N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
            N::nested(2, vec![N::function([ArgRef::abs([1])], |args| Ok(args[0].clone()))]),
        ],
    ))
    .unwrap();

    let mut session = snippet.expand();
    session.on_text_changed(&Address::from(1), "b").unwrap();
    let report = session.update(&UpdateScope::Subtree(Address::from(2))).unwrap();

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(session.text(), lines_from("bab"));
}

#[test]
fn test_multiline_edits_shift_later_deltas() {
    let mut session = Snippet::compile(&arrow_definition()).unwrap().expand();
    session.on_text_changed(&Address::from(1), "one\ntwo").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();

    assert_eq!(session.text(), lines_from("one\ntwo -> one\ntwo == one\ntwo"));
    assert_eq!(report.deltas[0].start.row, 1);
    assert_eq!(report.deltas[0].start.column, 7);
    assert_eq!(report.deltas[1].start.row, 2);
}

#[test]
fn test_failed_computation_keeps_old_text_and_retries() {
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "failing",
        vec![
            N::insert(1, "ok"),
            N::text("|"),
            N::function([ArgRef::rel(1)], |args| {
                if args[0][0].is_empty() {
                    anyhow::bail!("empty input");
                }
                Ok(args[0].clone())
            }),
        ],
    ))
    .unwrap();

    let mut session = snippet.expand();
    session.on_text_changed(&Address::from(1), "").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].cause.contains("empty input"));
    assert_eq!(session.text(), lines_from("|ok"));
    assert_eq!(report.pending, 1);

    session.on_text_changed(&Address::from(1), "again").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();
    assert!(report.is_clean());
    assert_eq!(session.text(), lines_from("again|again"));
}

#[test]
fn test_jumping_through_a_session() {
    let mut session = Snippet::compile(&arrow_definition()).unwrap().expand();
    assert_eq!(session.address_of(session.active().unwrap()), Some(Address::from(1)));

    session.on_text_changed(&Address::from(1), "q").unwrap();
    let outcome = session.jump(Direction::Forward).unwrap();

    // Leaving the only tabstop exits the snippet and settles its dependents
    assert_eq!(outcome.node, None);
    assert_eq!(outcome.report.deltas.len(), 2);
    assert_eq!(session.text(), lines_from("q -> q == q"));
}

#[test]
fn test_compile_errors() {
    let missing = Snippet::compile(&SnippetDefinition::new(
        "missing",
        vec![N::function([ArgRef::rel(3)], |args| Ok(args[0].clone()))],
    ));
    assert!(matches!(missing, Err(DefinitionError::UnknownTabstop { index: 3, .. })));

    let cycle = Snippet::compile(&SnippetDefinition::new(
        "cycle",
        vec![N::nested(
            1,
            vec![N::function([ArgRef::abs([1])], |args| Ok(args[0].clone()))],
        )],
    ));
    assert!(matches!(cycle, Err(DefinitionError::CircularDependency { .. })));
}

#[test]
fn test_sessions_are_independent() {
    let snippet = Snippet::compile(&arrow_definition()).unwrap();
    let mut first = snippet.expand();
    let second = snippet.expand();

    first.on_text_changed(&Address::from(1), "z").unwrap();
    first.update(&UpdateScope::All).unwrap();

    assert_eq!(first.text(), lines_from("z -> z == z"));
    assert_eq!(second.text(), lines_from("a -> a == a"));
}

#[test]
fn test_editing_a_function_node_is_rejected() {
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "fn_only",
        vec![
            N::nested(1, vec![N::insert(1, "a")]),
            N::function([ArgRef::abs([1, 1])], |args| Ok(args[0].clone())),
        ],
    ))
    .unwrap();
    let mut session = snippet.expand();

    assert!(matches!(
        session.on_text_changed(&Address::from(1), "x"),
        Err(SnipError::NotEditable { .. })
    ));
    assert!(matches!(
        session.on_text_changed(&Address::from(5), "x"),
        Err(SnipError::NotLive { .. })
    ));
}
