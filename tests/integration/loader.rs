use snipkit::cache::SnippetPathCache;
use snipkit::engine::UpdateScope;
use snipkit::loader::{SnippetLoader, find_snippet};
use snipkit::snippet::Address;
use snipkit::snippet::text::lines_from;
use snipkit::test_utils::{SnippetFixture, TestEnvironment};

#[test]
fn test_loaded_snippets_behave_like_built_ones() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::choice().content).unwrap();

    let snippets = SnippetLoader::default().load_file(&path).unwrap();
    let snippet = find_snippet(&snippets, "choice", "demo.toml").unwrap();
    assert_eq!(snippet.static_text(), lines_from("cccc aaaa"));

    let mut session = snippet.expand();
    session.select_choice(&Address::from(2), 2).unwrap();
    assert_eq!(session.text(), lines_from("cccc bbbbbbbbcccc"));
}

#[test]
fn test_nested_fixture_with_join() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("nested.toml", &SnippetFixture::nested().content).unwrap();
    let snippets = SnippetLoader::default().load_file(&path).unwrap();

    let mut session = snippets[0].expand();
    assert_eq!(session.text(), lines_from("outer(inner:inner/outer)"));

    session.on_text_changed(&Address::from(1), "o").unwrap();
    session.on_text_changed(&Address::from([2, 1]), "i").unwrap();
    session.update(&UpdateScope::All).unwrap();
    assert_eq!(session.text(), lines_from("o(i:i/o)"));
}

#[test]
fn test_check_file_reports_every_broken_snippet() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("mixed.toml", &SnippetFixture::mixed().content).unwrap();

    let loader = SnippetLoader::default();
    let (valid, errors) = loader.check_file(&path).unwrap();
    assert_eq!(valid, vec!["arrow".to_string(), "choice".to_string()]);
    assert_eq!(errors.len(), 1);
    assert!(format!("{:#}", errors[0]).contains("broken"));

    // Loading stops at the first error
    assert!(loader.load_file(&path).is_err());
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("bad.toml", &SnippetFixture::invalid_syntax().content).unwrap();

    let err = SnippetLoader::default().load_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse snippet file"));
}

#[test]
fn test_filetype_discovery_and_extends() {
    let env = TestEnvironment::new().unwrap();
    env.add_snippet_file("cpp.toml", &SnippetFixture::arrow().content).unwrap();
    env.add_snippet_file("c/extra.toml", &SnippetFixture::choice().content).unwrap();
    env.add_snippet_file("python.toml", &SnippetFixture::nested().content).unwrap();
    env.write_config("[filetype_extends]\ncpp = [\"c\"]\n").unwrap();
    let config = env.load_config().unwrap();

    let loader = SnippetLoader::default();
    let mut cache = SnippetPathCache::new();
    let snippets = loader.load_filetype(&mut cache, &config, "cpp").unwrap();

    let triggers: Vec<&str> = snippets.iter().map(|s| s.trigger()).collect();
    assert_eq!(triggers, vec!["arrow", "choice"]);
    assert!(cache.is_loaded("cpp"));
    assert!(cache.is_loaded("c"));
    assert!(!cache.is_loaded("python"));
    assert_eq!(cache.paths("c"), &[env.snippet_path("c/extra.toml")]);

    // A second load of an already loaded filetype yields nothing new
    assert!(loader.load_filetype(&mut cache, &config, "cpp").unwrap().is_empty());

    cache.cleanup();
    assert_eq!(loader.load_filetype(&mut cache, &config, "c").unwrap().len(), 1);
}
