use snipkit::config::EngineConfig;
use snipkit::core::SnipError;
use snipkit::engine::{Engine, UpdateScope};
use snipkit::snippet::text::lines_from;
use snipkit::snippet::{Address, ArgRef, NodeDefinition as N, Snippet, SnippetDefinition};
use snipkit::test_utils::{choice_definition, concat_lines};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_function_waits_for_unselected_branch() {
    let snippet = Snippet::compile(&choice_definition()).unwrap();

    // The waiting function contributes nothing to the static text
    assert_eq!(snippet.static_text(), lines_from("cccc aaaa"));

    let mut session = snippet.expand();
    assert_eq!(session.text(), lines_from("cccc aaaa"));
    assert_eq!(session.unresolved_functions().len(), 1);
    assert!(matches!(
        session.text_at(&Address::from([2, 2])),
        Err(SnipError::NotLive { .. })
    ));

    session.select_choice(&Address::from(2), 2).unwrap();
    session.update(&UpdateScope::Subtree(Address::root())).unwrap();
    assert_eq!(session.text(), lines_from("cccc bbbbbbbbcccc"));
    assert!(session.unresolved_functions().is_empty());
    assert_eq!(session.text_at(&Address::from([2, 2])).unwrap(), lines_from("bbbb"));
}

#[test]
fn test_update_never_runs_function_with_dormant_argument() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "counted",
        vec![
            N::insert(1, "cccc"),
            N::text(" "),
            N::choice(2, vec![N::text("aaaa"), N::branch_insert("bbbb")]),
            N::function([ArgRef::abs([2, 2]), ArgRef::rel(1)], move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                concat_lines(args)
            }),
        ],
    ))
    .unwrap();

    let mut session = snippet.expand();
    session.on_text_changed(&Address::from(1), "z").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.evaluated, 0);
    assert_eq!(report.pending, 1);
    assert_eq!(session.text(), lines_from("z aaaa"));

    session.select_choice(&Address::from(2), 2).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.text(), lines_from("z bbbbbbbbz"));
}

#[test]
fn test_edits_in_selected_branch_propagate() {
    let mut session = Snippet::compile(&choice_definition()).unwrap().expand();
    session.select_choice(&Address::from(2), 2).unwrap();

    session.on_text_changed(&Address::from([2, 2]), "x").unwrap();
    session.on_text_changed(&Address::from(1), "y").unwrap();
    let report = session.update(&UpdateScope::All).unwrap();

    assert_eq!(session.text(), lines_from("y xxy"));
    assert_eq!(report.evaluated, 1);
}

#[test]
fn test_switching_back_keeps_branch_state() {
    let mut session = Snippet::compile(&choice_definition()).unwrap().expand();
    session.select_choice(&Address::from(2), 2).unwrap();
    session.on_text_changed(&Address::from([2, 2]), "kept").unwrap();
    session.update(&UpdateScope::All).unwrap();

    session.select_choice(&Address::from(2), 1).unwrap();
    assert_eq!(session.text(), lines_from("cccc aaaakeptcccc"));

    session.select_choice(&Address::from(2), 2).unwrap();
    assert_eq!(session.text(), lines_from("cccc keptkeptcccc"));
    assert_eq!(session.selected_branch(&Address::from(2)).unwrap(), 2);
}

#[test]
fn test_invalid_selections() {
    let mut session = Snippet::compile(&choice_definition()).unwrap().expand();

    assert!(matches!(
        session.select_choice(&Address::from(2), 3),
        Err(SnipError::BranchOutOfRange { branch: 3, available: 2, .. })
    ));
    assert!(matches!(
        session.select_choice(&Address::from(2), 0),
        Err(SnipError::BranchOutOfRange { .. })
    ));
    assert!(matches!(
        session.select_choice(&Address::from(1), 1),
        Err(SnipError::NotAChoice { .. })
    ));
    assert_eq!(session.selected_branch(&Address::from(2)).unwrap(), 1);
}

#[test]
fn test_unresolved_text_in_previews() {
    let config = EngineConfig {
        unresolved_text: "?".to_string(),
        ..EngineConfig::default()
    };
    let snippet = Snippet::compile(&choice_definition()).unwrap();
    assert_eq!(Engine::new(config).static_text(&snippet), lines_from("cccc aaaa?"));
}

#[test]
fn test_cycle_across_exclusive_branches_is_allowed() {
    // Each branch reads the other branch, but only one of them is ever live
    let snippet = Snippet::compile(&SnippetDefinition::new(
        "exclusive",
        vec![N::choice(
            1,
            vec![
                N::branch_snippet(vec![
                    N::insert(1, "left"),
                    N::function([ArgRef::abs([1, 2])], concat_lines),
                ]),
                N::branch_snippet(vec![
                    N::insert(1, "right"),
                    N::function([ArgRef::abs([1, 1])], concat_lines),
                ]),
            ],
        )],
    ))
    .unwrap();

    let mut session = snippet.expand();
    assert_eq!(session.text(), lines_from("left"));

    session.select_choice(&Address::from(1), 2).unwrap();
    assert_eq!(session.text(), lines_from("right"));
    assert_eq!(session.unresolved_functions().len(), 1);
}
