//! End-to-end tests: the documented editing scenarios and the invariants every form upholds.
mod common;
use common::{RecordingHost, bag, registry, unbounded_registry};
use serde_json::{Value, json};
use settei::error::WorkflowConversionError;
use settei::form::{LivePromptEdit, MAX_DERIVED_LENGTH, MediaType, QuestionEdit, SubmissionPromptEdit};
use settei::prelude::*;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_count_growth_pads_dependent_list() {
        let registry = registry();
        let current = bag(json!({ "parameter_count": 1, "parameter_names": ["x"] }));
        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);

        form.set_field("parameter_count", json!(3)).expect("edit applies");
        assert_eq!(form.value("parameter_names"), Some(json!(["x", "", ""])));
    }

    #[test]
    fn test_removing_answer_shifts_correct_index() {
        let registry = registry();
        let current = bag(json!({
            "questions": [{ "text": "Q1", "answers": ["A", "B", "C"], "correctAnswer": 2 }]
        }));
        let mut form = SettingsForm::open(&registry, "q1", "multipleChoice", &current);

        form.edit_record("questions", 0, QuestionEdit::RemoveAnswer(0)).expect("edit applies");
        let question = &form.value("questions").expect("known property")[0];
        assert_eq!(question["answers"], json!(["B", "C"]));
        assert_eq!(question["correctAnswer"], json!(1));
    }

    #[test]
    fn test_media_type_switch_clears_items() {
        let registry = registry();
        let current = bag(json!({
            "submission_prompts": [{ "id": "p", "text": "List them", "mediaType": "list", "items": 5 }]
        }));
        let mut form = SettingsForm::open(&registry, "s1", "submission", &current);

        form.edit_record(
            "submission_prompts",
            0,
            SubmissionPromptEdit::SetMediaType(MediaType::Textarea),
        )
        .expect("edit applies");
        let prompt = &form.value("submission_prompts").expect("known property")[0];
        assert_eq!(prompt["mediaType"], json!("textarea"));
        assert!(prompt.get("items").is_none());
    }

    #[test]
    fn test_unknown_type_falls_back_to_close_only() {
        let registry = registry();
        let mut form = SettingsForm::open(&registry, "x1", "bogus", &bag(json!({ "a": 1 })));
        let mut host = RecordingHost::default();

        assert_eq!(form.state(), FormState::Unavailable);
        let view = form.render(&WorkflowGraph::default());
        assert_eq!(
            view,
            FormView::Fallback {
                message: "Settings not available".to_string(),
                actions: vec![FormAction::Close]
            }
        );
        assert_eq!(view.to_string(), "Settings not available\n[Close]");
        assert!(form.visible_properties().is_empty());
        assert_eq!(form.value("a"), None);

        assert_eq!(form.set_field("a", json!(2)), Err(FormError::Unavailable));
        assert_eq!(form.submit(&mut host), Err(FormError::Unavailable));
        form.close(&mut host).expect("closing is always possible");

        assert!(host.saved.is_empty());
        assert_eq!(host.closed, vec!["x1".to_string()]);
    }

    #[test]
    fn test_disabling_navigation_drops_its_fields() {
        let registry = registry();
        let current = bag(json!({
            "prompts": [{
                "id": "s",
                "statement": "Review a peer",
                "enableGroupSubmissionNavigation": true,
                "submissionPromptId": "p1",
                "allowEditing": true
            }]
        }));
        let mut form = SettingsForm::open(&registry, "lp1", "livePresentation", &current);

        form.edit_record("prompts", 0, LivePromptEdit::SetGroupSubmissionNavigation(false))
            .expect("edit applies");
        let prompt = &form.value("prompts").expect("known property")[0];
        assert_eq!(prompt["enableGroupSubmissionNavigation"], json!(false));
        assert!(prompt.get("submissionPromptId").is_none());
        assert!(prompt.get("allowEditing").is_none());
    }

    #[test]
    fn test_derived_length_holds_for_every_count() {
        let registry = registry();
        let original = vec!["a", "b", "c"];
        let current = bag(json!({
            "parameter_count": 3,
            "parameter_names": original,
            "test_cases": [{ "parameters": ["1", "2", "3"], "expectedResult": "6" }]
        }));

        for n in 0..=12usize {
            let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);
            form.set_field("parameter_count", json!(n)).expect("edit applies");

            let names = form.value("parameter_names").expect("known property");
            let names = names.as_array().expect("a list");
            assert_eq!(names.len(), n, "parameter_names for n = {}", n);
            for (index, name) in names.iter().enumerate() {
                let expected = original.get(index).copied().unwrap_or("");
                assert_eq!(name, &json!(expected), "slot {} for n = {}", index, n);
            }

            let cases = form.value("test_cases").expect("known property");
            let parameters = cases[0]["parameters"].as_array().expect("a list");
            assert_eq!(parameters.len(), n);
            assert_eq!(cases[0]["expectedResult"], json!("6"));
        }
    }

    #[test]
    fn test_derived_length_holds_for_any_count_input() {
        let registry = unbounded_registry();
        let inputs = vec![
            json!(-5),
            json!(-1),
            json!(0),
            json!(0.5),
            json!(1),
            json!(2.5),
            json!(-2.5),
            json!(7.99),
            json!(12),
            json!("4"),
            json!("-2"),
            json!("abc"),
            json!(true),
            json!(null),
            json!(300),
            json!(1e12),
        ];

        for input in inputs {
            let current = bag(json!({ "slot_count": 2, "slot_names": ["a", "b"] }));
            let mut form = SettingsForm::open(&registry, "s1", "slots", &current);
            form.set_field("slot_count", input.clone()).expect("edit applies");
            let saved = form.save().expect("save succeeds");

            let count = saved
                .get("slot_count")
                .and_then(Value::as_u64)
                .expect("a non-negative integer") as usize;
            assert!(count <= MAX_DERIVED_LENGTH, "count {} for {}", count, input);
            for key in ["slot_names", "slot_questions"] {
                let len = saved.get(key).and_then(Value::as_array).map(Vec::len);
                assert_eq!(len, Some(count), "{} for {}", key, input);
            }
        }
    }

    #[test]
    fn test_answer_removal_keeps_feedback_parallel() {
        let registry = registry();

        for len in 3..=6usize {
            for correct in 0..len {
                for removed in 0..len {
                    let answers: Vec<String> = (0..len).map(|i| format!("answer {}", i)).collect();
                    let feedback: Vec<String> = (0..len).map(|i| format!("feedback {}", i)).collect();
                    let current = bag(json!({
                        "questions": [{
                            "text": "Q",
                            "answers": answers,
                            "correctAnswer": correct,
                            "feedbackMessages": feedback
                        }]
                    }));
                    let mut form = SettingsForm::open(&registry, "q1", "multipleChoice", &current);

                    form.edit_record("questions", 0, QuestionEdit::RemoveAnswer(removed))
                        .expect("edit applies");
                    let question = &form.value("questions").expect("known property")[0];
                    let answers = question["answers"].as_array().expect("a list");
                    let feedback = question["feedbackMessages"].as_array().expect("a list");
                    let correct_after = question["correctAnswer"].as_u64().expect("an index") as usize;

                    assert_eq!(answers.len(), len - 1);
                    assert_eq!(feedback.len(), answers.len());
                    assert!(correct_after < answers.len());
                    assert!(!answers.contains(&json!(format!("answer {}", removed))));
                    assert!(!feedback.contains(&json!(format!("feedback {}", removed))));
                }
            }
        }
    }

    #[test]
    fn test_setting_current_value_changes_nothing() {
        let registry = registry();
        let current = bag(json!({
            "parameter_count": 2,
            "parameter_names": ["a", "b"],
            "test_cases": [{ "parameters": ["1", "2"], "expectedResult": "3", "note": "kept" }]
        }));

        for type_id in registry.list_available_types() {
            let seeded = if type_id == "codingExercise" { current.clone() } else { DataBag::new() };
            let mut form = SettingsForm::open(&registry, "n1", type_id, &seeded);
            let keys: Vec<String> = form.draft().keys().cloned().collect();

            for key in keys {
                let before = serde_json::to_string(form.draft()).expect("serializable");
                let value = form.draft().get(&key).cloned().unwrap_or(Value::Null);
                form.set_field(&key, value).expect("edit applies");
                let after = serde_json::to_string(form.draft()).expect("serializable");
                assert_eq!(before, after, "{}.{} changed", type_id, key);
            }
        }
    }

    #[test]
    fn test_save_without_edits_round_trips() {
        let registry = registry();
        let current = bag(json!({
            "function_name": "fib",
            "language": null,
            "parameter_count": 1,
            "parameter_names": ["n"],
            "unrelated": true
        }));
        let schema = registry.schema("codingExercise").expect("schema exists");
        let expected: DataBag = schema
            .properties
            .iter()
            .map(|p| {
                let value = current
                    .get(&p.key)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| p.default_value());
                (p.key.clone(), value)
            })
            .collect();

        let mut form = SettingsForm::open(&registry, "c1", "codingExercise", &current);
        assert_eq!(form.save(), Ok(expected));
    }

    #[test]
    fn test_every_builtin_type_opens_and_saves() {
        let registry = registry();

        for type_id in registry.list_available_types() {
            let node = registry.create_node(type_id, "n1").expect("type exists");
            let mut form = SettingsForm::open(&registry, &node.id, &node.node_type, &node.data);
            assert_eq!(form.state(), FormState::Editing, "{}", type_id);
            assert!(!form.render(&WorkflowGraph::default()).is_fallback());
            assert_eq!(form.save(), Ok(node.data.clone()), "{}", type_id);
        }
    }

    const WORKFLOW: &str = r#"{
        "nodes": [
            { "id": "start", "type": "start", "data": { "title": "Rivers" }, "position": { "x": 0, "y": 0 } },
            { "id": "p1", "type": "page", "data": { "title": "Read" } },
            { "id": "q1", "type": "multipleChoice", "parentNode": "p1",
              "data": { "questions": [{ "text": "Longest river?", "answers": ["Nile", "Amazon"], "correctAnswer": 0 }] } },
            { "id": "end", "type": "end" }
        ],
        "edges": [
            { "id": "e1", "source": "start", "sourceHandle": "next", "target": "p1", "targetHandle": "in" },
            { "id": "e2", "source": "p1", "sourceHandle": "next", "target": "end", "targetHandle": "in" }
        ],
        "viewport": { "x": 10, "y": 20, "zoom": 1.5 }
    }"#;

    #[test]
    fn test_edit_a_loaded_workflow() {
        let registry = registry();
        let document = WorkflowDocument::from_json(WORKFLOW).expect("valid document");
        let mut graph = document.clone().into_workflow().expect("valid workflow");

        assert_eq!(graph.node("q1").and_then(|n| n.parent_id.as_deref()), Some("p1"));
        assert!(registry.validate_graph(&graph).is_clean());

        let mut form = SettingsForm::open_node(&registry, &graph, "q1").expect("node exists");
        form.edit_record("questions", 0, QuestionEdit::AddAnswer).expect("edit applies");
        form.edit_record(
            "questions",
            0,
            QuestionEdit::SetAnswer {
                index: 2,
                text: "Yangtze".to_string(),
            },
        )
        .expect("edit applies");
        form.set_field("shuffle_answers", json!(true)).expect("edit applies");
        form.submit(&mut graph).expect("save succeeds");

        let saved = document.with_graph(graph);
        let json = serde_json::to_value(&saved).expect("serializable");
        assert_eq!(json["viewport"]["zoom"], json!(1.5));
        let quiz = &json["nodes"][2];
        assert_eq!(quiz["parentId"], json!("p1"));
        assert_eq!(quiz["data"]["shuffle_answers"], json!(true));
        assert_eq!(
            quiz["data"]["questions"][0]["answers"],
            json!(["Nile", "Amazon", "Yangtze"])
        );
    }

    #[test]
    fn test_workflow_conversion_errors() {
        assert!(matches!(
            WorkflowDocument::from_json("{ nodes: "),
            Err(WorkflowConversionError::JsonParseError(_))
        ));

        let duplicate = r#"{ "nodes": [{ "id": "a", "type": "page" }, { "id": "a", "type": "end" }] }"#;
        let document = WorkflowDocument::from_json(duplicate).expect("valid json");
        assert!(matches!(
            document.into_workflow(),
            Err(WorkflowConversionError::ValidationError(message)) if message.contains("duplicate node id 'a'")
        ));

        let dangling = r#"{ "nodes": [{ "id": "a", "type": "page" }],
            "edges": [{ "source": "a", "sourceHandle": "next", "target": "b", "targetHandle": "in" }] }"#;
        let document = WorkflowDocument::from_json(dangling).expect("valid json");
        assert!(matches!(
            document.into_workflow(),
            Err(WorkflowConversionError::ValidationError(message)) if message.contains("missing node 'b'")
        ));
    }
}
