use hotsearch_core::engines::{EngineError, EngineRegistry, InteractionKind, QUERY_PLACEHOLDER};

#[test]
fn builtin_catalog_is_numbered_from_one() {
    let registry = EngineRegistry::builtin();
    assert_eq!(registry.count(), 20);
    for (index, destination) in registry.iter().enumerate() {
        assert_eq!(destination.ordinal, index + 1);
    }
    assert_eq!(registry.get(1).map(|d| d.label), Some("Google"));
    assert!(registry.get(0).is_none());
    assert!(registry.get(21).is_none());
}

#[test]
fn direct_query_templates_carry_a_placeholder() {
    let registry = EngineRegistry::builtin();
    for destination in registry.iter() {
        match destination.interaction_kind {
            InteractionKind::DirectQuery => {
                assert!(
                    destination.url_template.contains(QUERY_PLACEHOLDER),
                    "{} has no placeholder",
                    destination.label
                );
            }
            InteractionKind::NoQueryEndpoint => {
                assert!(!destination.url_template.contains(QUERY_PLACEHOLDER));
            }
        }
    }
}

#[test]
fn chat_assistants_are_scripted() {
    let registry = EngineRegistry::builtin();
    let scripted: Vec<&str> = registry
        .iter()
        .filter(|d| d.interaction_kind == InteractionKind::NoQueryEndpoint)
        .map(|d| d.label)
        .collect();
    assert_eq!(scripted, vec!["ChatGPT", "Gemini"]);
}

#[test]
fn cycling_wraps_both_ways() {
    let registry = EngineRegistry::builtin();
    assert_eq!(registry.next_ordinal(1), 2);
    assert_eq!(registry.next_ordinal(20), 1);
    assert_eq!(registry.previous_ordinal(1), 20);
    assert_eq!(registry.previous_ordinal(7), 6);
}

#[test]
fn looks_up_labels() {
    let registry = EngineRegistry::builtin();
    assert_eq!(registry.index_of_label("YouTube"), Ok(2));
    assert_eq!(
        registry.index_of_label("AltaVista"),
        Err(EngineError::NotFound("AltaVista".to_string()))
    );
    assert_eq!(registry.get(3).map(|d| d.display_name()), Some("3. ChatGPT".to_string()));

    for destination in registry.iter() {
        let ordinal = registry.index_of_label(destination.label).unwrap();
        assert_eq!(ordinal, destination.ordinal);
        assert_eq!(registry.get(ordinal), Some(destination));
    }
}
