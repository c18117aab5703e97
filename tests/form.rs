//! Tests for the settings form: drafts, edits, derived lengths, visibility and the state machine.
mod common;
use common::{RecordingHost, bag, lesson_graph, registry, unbounded_registry};
use serde_json::json;
use settei::form::{Control, MAX_DERIVED_LENGTH, SubmissionPromptEdit};
use settei::prelude::*;

#[cfg(test)]
mod form_tests {
    use super::*;

    fn visible(form: &SettingsForm<'_>) -> Vec<String> {
        form.visible_properties().iter().map(|p| p.key.clone()).collect()
    }

    fn has(form: &SettingsForm<'_>, key: &str) -> bool {
        form.visible_properties().iter().any(|p| p.key == key)
    }

    #[test]
    fn test_open_fills_draft_in_schema_order() {
        let registry = registry();
        let form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());

        assert_eq!(form.state(), FormState::Editing);
        let keys: Vec<&str> = form.draft().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["function_name", "language", "parameter_count", "parameter_names", "test_cases"]
        );
        assert_eq!(form.value("function_name"), Some(json!("")));
        assert_eq!(form.value("language"), Some(json!("python")));
        assert_eq!(form.value("parameter_count"), Some(json!(1)));
        assert_eq!(form.value("parameter_names"), Some(json!([""])));
        assert_eq!(form.value("test_cases"), Some(json!([])));
    }

    #[test]
    fn test_open_prefers_current_data_and_drops_foreign_keys() {
        let registry = registry();
        let current = bag(json!({
            "function_name": "add",
            "language": null,
            "legacy_field": 42
        }));
        let form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        assert_eq!(form.value("function_name"), Some(json!("add")));
        // `null` counts as unset.
        assert_eq!(form.value("language"), Some(json!("python")));
        assert!(!form.draft().contains_key("legacy_field"));
        assert_eq!(form.value("legacy_field"), None);
    }

    #[test]
    fn test_count_growth_pads_and_shrink_truncates() {
        let registry = registry();
        let current = bag(json!({ "parameter_count": 2, "parameter_names": ["a", "b"] }));
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        form.set_field("parameter_count", json!(4)).expect("edit applies");
        assert_eq!(form.value("parameter_names"), Some(json!(["a", "b", "", ""])));

        form.set_field("parameter_count", json!(1)).expect("edit applies");
        assert_eq!(form.value("parameter_names"), Some(json!(["a"])));
    }

    #[test]
    fn test_setting_a_derived_list_keeps_its_length() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());

        form.set_field("parameter_names", json!(["x", "y", "z"])).expect("edit applies");
        assert_eq!(form.value("parameter_names"), Some(json!(["x"])));
        assert_eq!(form.value("parameter_count"), Some(json!(1)));
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());

        form.set_field("parameter_count", json!(-2)).expect("edit applies");
        assert_eq!(form.value("parameter_count"), Some(json!(0)));
        assert_eq!(form.value("parameter_names"), Some(json!([])));
    }

    #[test]
    fn test_fractional_count_is_stored_as_integer() {
        let registry = registry();
        let current = bag(json!({ "parameter_count": 1, "parameter_names": ["x"] }));
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        form.set_field("parameter_count", json!(2.5)).expect("edit applies");
        assert_eq!(form.draft().get("parameter_count"), Some(&json!(2)));
        assert_eq!(form.value("parameter_names"), Some(json!(["x", ""])));

        let saved = form.save().expect("save succeeds");
        assert_eq!(saved.get("parameter_count"), Some(&json!(2)));
    }

    #[test]
    fn test_negative_count_without_minimum_is_stored_as_zero() {
        let registry = unbounded_registry();
        let current = bag(json!({ "slot_count": 2, "slot_names": ["a", "b"] }));
        let mut form = SettingsForm::open(&registry, "s1", "slots", &current);

        form.set_field("slot_count", json!(-3)).expect("edit applies");
        assert_eq!(form.draft().get("slot_count"), Some(&json!(0)));
        assert_eq!(form.value("slot_names"), Some(json!([])));
        assert_eq!(form.value("slot_questions"), Some(json!([])));
    }

    #[test]
    fn test_huge_count_is_capped() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());

        form.apply_event("parameter_count", ControlEvent::Input("1e12".to_string()))
            .expect("event applies");
        assert_eq!(form.value("parameter_count"), Some(json!(MAX_DERIVED_LENGTH)));
        let names = form.value("parameter_names").expect("known property");
        assert_eq!(names.as_array().map(Vec::len), Some(MAX_DERIVED_LENGTH));

        let registry = unbounded_registry();
        let mut form = SettingsForm::open(&registry, "s1", "slots", &DataBag::new());
        form.set_field("slot_count", json!(1e12)).expect("edit applies");
        assert_eq!(form.draft().get("slot_count"), Some(&json!(MAX_DERIVED_LENGTH)));
        let questions = form.value("slot_questions").expect("known property");
        assert_eq!(questions.as_array().map(Vec::len), Some(MAX_DERIVED_LENGTH));
    }

    #[test]
    fn test_count_resizes_test_case_parameters_not_the_case_list() {
        let registry = registry();
        let current = bag(json!({
            "parameter_count": 1,
            "parameter_names": ["n"],
            "test_cases": [
                { "parameters": ["1"], "expectedResult": "1", "note": "kept" },
                { "parameters": ["5"], "expectedResult": "120" }
            ]
        }));
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        form.set_field("parameter_count", json!(2)).expect("edit applies");
        assert_eq!(
            form.value("test_cases"),
            Some(json!([
                { "parameters": ["1", ""], "expectedResult": "1", "note": "kept" },
                { "parameters": ["5", ""], "expectedResult": "120" }
            ]))
        );

        form.push_record("test_cases").expect("test cases accept new records");
        let cases = form.value("test_cases").expect("known property");
        assert_eq!(cases.as_array().map(Vec::len), Some(3));
        assert_eq!(cases[2], json!({ "parameters": ["", ""], "expectedResult": "" }));
    }

    #[test]
    fn test_unknown_property_is_rejected_without_changes() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());
        let before = form.draft().clone();

        assert_eq!(
            form.set_field("nope", json!(1)),
            Err(FormError::UnknownProperty("nope".to_string()))
        );
        assert_eq!(form.draft(), &before);
    }

    #[test]
    fn test_dynamic_list_slot_edit() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());
        form.set_field("parameter_count", json!(2)).expect("edit applies");

        form.set_list_item("parameter_names", 1, "b").expect("slot exists");
        assert_eq!(form.value("parameter_names"), Some(json!(["", "b"])));

        assert_eq!(
            form.set_list_item("parameter_names", 2, "c"),
            Err(FormError::IndexOutOfRange {
                key: "parameter_names".to_string(),
                index: 2,
                len: 2
            })
        );
        assert!(matches!(
            form.push_record("parameter_names"),
            Err(FormError::UnsupportedOperation { operation: "push_record", .. })
        ));
        assert!(matches!(
            form.set_list_item("function_name", 0, "x"),
            Err(FormError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_number_events_never_fail() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "a1", "aiAgent", &DataBag::new());
        assert_eq!(form.value("max_turns"), Some(json!(10)));

        form.apply_event("max_turns", ControlEvent::Input("abc".to_string()))
            .expect("unparseable input is absorbed");
        assert_eq!(form.value("max_turns"), Some(json!(10)));

        form.apply_event("max_turns", ControlEvent::Input(" 7 ".to_string())).expect("event applies");
        assert_eq!(form.value("max_turns"), Some(json!(7)));

        form.apply_event("max_turns", ControlEvent::Input("99".to_string())).expect("event applies");
        assert_eq!(form.value("max_turns"), Some(json!(50)));
    }

    #[test]
    fn test_range_and_choice_events() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "m1", "llmModel", &DataBag::new());

        form.apply_event("temperature", ControlEvent::Slide(1.5)).expect("event applies");
        assert_eq!(form.value("temperature"), Some(json!(1.0)));

        form.apply_event("model", ControlEvent::Choose("bogus".to_string())).expect("event applies");
        assert_eq!(form.value("model"), Some(json!("gpt-4o")));

        form.apply_event("model", ControlEvent::Choose("claude-sonnet".to_string()))
            .expect("event applies");
        assert_eq!(form.value("model"), Some(json!("claude-sonnet")));
    }

    #[test]
    fn test_selection_and_toggle_events() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "a1", "aiAgent", &DataBag::new());

        form.apply_event(
            "context_prompts",
            ControlEvent::SelectMany(vec!["p1".to_string(), "p1".to_string(), "p2".to_string()]),
        )
        .expect("event applies");
        assert_eq!(form.value("context_prompts"), Some(json!(["p1", "p2"])));

        assert!(matches!(
            form.apply_event("name", ControlEvent::Toggle(true)),
            Err(FormError::UnsupportedOperation { operation: "apply_event", .. })
        ));
    }

    #[test]
    fn test_malformed_stored_values_are_coerced_on_read() {
        let registry = registry();
        let current = bag(json!({
            "parameter_count": "3",
            "parameter_names": "oops",
            "test_cases": { "bad": true }
        }));
        let form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        assert_eq!(form.value("parameter_count"), Some(json!(3)));
        assert_eq!(form.value("parameter_names"), Some(json!([])));
        assert_eq!(form.value("test_cases"), Some(json!([])));
        // The stored draft is left as found until edited.
        assert_eq!(form.draft().get("parameter_count"), Some(&json!("3")));
    }

    #[test]
    fn test_checkbox_chain_controls_visibility() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "q1", "multipleChoice", &DataBag::new());

        assert_eq!(visible(&form), vec!["questions", "shuffle_answers", "enable_feedback"]);

        form.set_field("enable_feedback", json!(true)).expect("edit applies");
        assert_eq!(visible(&form).last().map(String::as_str), Some("adaptive_flow"));

        form.set_field("adaptive_flow", json!(true)).expect("edit applies");
        form.set_field("repeat_until_correct", json!(true)).expect("edit applies");
        assert_eq!(visible(&form).len(), 6);

        form.set_field("enable_feedback", json!(false)).expect("edit applies");
        assert_eq!(visible(&form), vec!["questions", "shuffle_answers", "enable_feedback"]);
        // Hidden sub-options keep their values.
        assert_eq!(form.value("adaptive_flow"), Some(json!(true)));
    }

    #[test]
    fn test_select_driven_visibility_and_hidden_fields() {
        let registry = registry();
        let mut grouping = SettingsForm::open(&registry, "g1", "grouping", &DataBag::new());

        assert!(!has(&grouping, "source_prompts"));
        grouping.set_field("method", json!("similar")).expect("edit applies");
        assert!(has(&grouping, "source_prompts"));

        let documents = SettingsForm::open(&registry, "d1", "documentUpload", &DataBag::new());
        assert!(has(&documents, "documents"));
        assert!(!has(&documents, "selected_document"));
        assert!(documents.render(&WorkflowGraph::default()).field("selected_document").is_none());
    }

    #[test]
    fn test_render_describes_visible_fields() {
        let registry = registry();
        let form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());
        let view = form.render(&WorkflowGraph::default());

        assert!(!view.is_fallback());
        assert_eq!(view.actions(), &[FormAction::Save, FormAction::Close]);
        assert_eq!(
            view.field("parameter_names").map(|f| &f.control),
            Some(&Control::TextList {
                items: vec![String::new()],
                fixed_length: true
            })
        );
        assert!(matches!(
            view.field("language").map(|f| &f.control),
            Some(Control::Select { selected, .. }) if selected == "python"
        ));

        let text = view.to_string();
        assert!(text.starts_with("== Coding exercise =="));
        assert!(text.contains("Parameter names: [\"\"]"));
        assert!(text.ends_with("[Save] [Close]"));
    }

    #[test]
    fn test_blocking_warning_refuses_save_only() {
        let registry = registry();
        let current = bag(json!({
            "submission_prompts": [
                { "id": "q", "text": "Pick one", "mediaType": "multiple_choice", "options": ["a", ""] }
            ]
        }));
        let mut form = SettingsForm::open(&registry, "s1", "submission", &current);

        let warnings = form.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].blocking);
        assert_eq!(warnings[0].index, Some(0));
        assert!(matches!(form.save(), Err(FormError::SaveBlocked(_))));
        assert_eq!(form.state(), FormState::Editing);

        // Edits are still accepted while the warning is shown.
        form.edit_record(
            "submission_prompts",
            0,
            SubmissionPromptEdit::SetOption {
                index: 1,
                text: "b".to_string(),
            },
        )
        .expect("edit applies");
        assert!(form.warnings().is_empty());
        assert!(form.save().is_ok());
        assert_eq!(form.state(), FormState::Saved);
    }

    #[test]
    fn test_non_blocking_warning_allows_save() {
        let registry = registry();
        let current = bag(json!({
            "questions": [{ "text": "", "answers": ["yes", "no"], "correctAnswer": 0 }]
        }));
        let mut form = SettingsForm::open(&registry, "q1", "multipleChoice", &current);

        let warnings = form.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].blocking);
        assert_eq!(warnings[0].to_string(), "questions[0]: Question text is empty");
        assert!(form.save().is_ok());
    }

    #[test]
    fn test_submit_emits_draft_and_finishes() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());
        form.set_field("function_name", json!("add")).expect("edit applies");
        let mut host = RecordingHost::default();

        form.submit(&mut host).expect("save succeeds");
        assert_eq!(host.saved.len(), 1);
        assert_eq!(host.saved[0].0, "c1");
        assert_eq!(host.saved[0].1.get("function_name"), Some(&json!("add")));

        assert_eq!(form.state(), FormState::Saved);
        assert_eq!(form.set_field("function_name", json!("sub")), Err(FormError::Closed));
        assert_eq!(form.close(&mut host), Err(FormError::Closed));
        assert_eq!(form.actions(), vec![FormAction::Close]);
    }

    #[test]
    fn test_close_discards_draft() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &DataBag::new());
        form.set_field("function_name", json!("add")).expect("edit applies");
        let mut host = RecordingHost::default();

        form.close(&mut host).expect("close succeeds");
        assert!(host.saved.is_empty());
        assert_eq!(host.closed, vec!["c1".to_string()]);
        assert_eq!(form.state(), FormState::Cancelled);
        assert!(form.draft().is_empty());
        assert_eq!(form.save(), Err(FormError::Closed));
    }

    #[test]
    fn test_submit_into_workflow_graph() {
        let registry = registry();
        let mut graph = lesson_graph();
        let mut form = SettingsForm::open_node(&registry, &graph, "p1").expect("node exists");

        form.set_field("title", json!("Introduction")).expect("edit applies");
        form.submit(&mut graph).expect("save succeeds");

        let page = graph.node("p1").expect("node still exists");
        assert_eq!(page.data.get("title"), Some(&json!("Introduction")));
        assert_eq!(page.data.get("show_progress"), Some(&json!(true)));
        assert!(SettingsForm::open_node(&registry, &graph, "ghost").is_none());
    }
}
