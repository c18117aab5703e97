//! Tests for selector options scanned from the workflow graph.
mod common;
use common::{lesson_graph, registry};
use serde_json::json;
use settei::form::{Control, collect_options};
use settei::prelude::*;

#[cfg(test)]
mod selectors_tests {
    use super::*;

    fn ids(options: &[settei::form::SelectorOption]) -> Vec<&str> {
        options.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_sibling_submission_prompts_are_offered() {
        let registry = registry();
        let graph = lesson_graph();
        let options = collect_options(&registry, &graph, "agent");

        assert_eq!(ids(&options.prompts), vec!["p-idea", "s1#1"]);
        let labels: Vec<&str> = options.prompts.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Your idea", "Prompt 2"]);
        assert!(options.prompts.iter().all(|o| o.source_node == "s1"));
    }

    #[test]
    fn test_only_list_variables_are_offered() {
        let registry = registry();
        let graph = lesson_graph();
        let options = collect_options(&registry, &graph, "agent");

        assert_eq!(ids(&options.list_variables), vec!["topics"]);
        assert_eq!(options.list_variables[0].source_node, "vars");
    }

    #[test]
    fn test_enclosing_container_provides_list_variable() {
        let registry = registry();
        let graph = lesson_graph();
        let options = collect_options(&registry, &graph, "lp2");

        assert_eq!(ids(&options.list_variables), vec!["teams", "topics"]);
        assert!(options.prompts.is_empty());
    }

    #[test]
    fn test_isolated_node_sees_only_global_outputs() {
        let registry = registry();
        let mut graph = lesson_graph();
        graph.nodes.push(FlowNode::new("loose", "prompt", DataBag::new()));

        let options = collect_options(&registry, &graph, "loose");
        assert!(options.prompts.is_empty());
        assert_eq!(ids(&options.list_variables), vec!["topics"]);

        let empty = collect_options(&registry, &WorkflowGraph::default(), "loose");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_offered_once() {
        let registry = registry();
        let mut graph = lesson_graph();
        graph.nodes.push(
            FlowNode::new(
                "s2",
                "submission",
                common::bag(json!({
                    "submission_prompts": [{ "id": "p-idea", "text": "Copied", "mediaType": "textarea" }]
                })),
            )
            .with_parent("p1"),
        );

        let options = collect_options(&registry, &graph, "agent");
        assert_eq!(ids(&options.prompts), vec!["p-idea", "s1#1"]);
        assert_eq!(options.prompts[0].label, "Your idea");
    }

    #[test]
    fn test_render_feeds_options_to_selectors() {
        let registry = registry();
        let graph = lesson_graph();

        let agent = SettingsForm::open_node(&registry, &graph, "agent").expect("node exists");
        let view = agent.render(&graph);
        match view.field("context_prompts").map(|f| &f.control) {
            Some(Control::MultiSelect { options, selected }) => {
                assert_eq!(ids(options), vec!["p-idea", "s1#1"]);
                assert!(selected.is_empty());
            }
            other => panic!("unexpected control: {:?}", other),
        }

        let live = SettingsForm::open_node(&registry, &graph, "lp1").expect("node exists");
        match live.render(&graph).field("prompts").map(|f| &f.control) {
            Some(Control::LivePrompts {
                prompts,
                list_variables,
                submission_prompts,
            }) => {
                assert!(prompts.is_empty());
                assert_eq!(ids(list_variables), vec!["topics"]);
                assert_eq!(submission_prompts.len(), 2);
            }
            other => panic!("unexpected control: {:?}", other),
        }
    }

    #[test]
    fn test_theming_offers_group_lists() {
        let registry = registry();
        let mut graph = lesson_graph();
        graph
            .nodes
            .push(FlowNode::new("t1", "theming", DataBag::new()).with_parent("g1"));

        let form = SettingsForm::open_node(&registry, &graph, "t1").expect("node exists");
        let view = form.render(&graph);
        assert!(matches!(
            view.field("assign_from").map(|f| &f.control),
            Some(Control::MultiSelect { options, .. }) if options.len() == 2
        ));
    }
}
