//! Visitor protocol: hook order, pruning, indexes and typed access

use ferrum_model::prelude::*;
use ferrum_model::{
    walk, AnyResource, Extension, PathCollector, Reference, ResearchSubject, Value,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

mod test_support;

/// Records every hook as a line, e.g. `start consent[1] Reference`
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    skip_children_of: Option<&'static str>,
    skip_type: Option<&'static str>,
}

fn label(name: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{}[{}]", name, i),
        None => name.to_string(),
    }
}

impl Visitor for Recorder {
    fn pre_visit(&mut self, node: &dyn Visitable) -> bool {
        self.skip_type != Some(node.type_name())
    }

    fn visit_start(&mut self, name: &str, index: Option<usize>, node: &dyn Visitable) {
        self.events
            .push(format!("start {} {}", label(name, index), node.type_name()));
    }

    fn visit(&mut self, name: &str, _index: Option<usize>, _node: &dyn Visitable) -> bool {
        self.skip_children_of != Some(name)
    }

    fn visit_end(&mut self, name: &str, index: Option<usize>, _node: &dyn Visitable) {
        self.events.push(format!("end {}", label(name, index)));
    }

    fn post_visit(&mut self, node: &dyn Visitable) {
        self.events.push(format!("post {}", node.type_name()));
    }

    fn visit_list_start(&mut self, name: &str, len: usize) {
        self.events.push(format!("list {} {}", name, len));
    }

    fn visit_list_end(&mut self, name: &str, _len: usize) {
        self.events.push(format!("/list {}", name));
    }

    fn visit_value(&mut self, name: &str, value: Value<'_>) {
        self.events.push(format!("value {}={}", name, value));
    }
}

fn subject_with_consents() -> ResearchSubject {
    test_support::research_subject()
        .consent(Reference::to("Consent/c-1"))
        .consent(Reference::to("Consent/c-2"))
        .build()
        .unwrap()
}

#[test]
fn test_hooks_fire_in_protocol_order() {
    let subject = test_support::research_subject().build().unwrap();
    let mut recorder = Recorder {
        skip_type: Some("Reference"),
        ..Recorder::default()
    };
    walk(&subject, &mut recorder);

    assert_eq!(
        recorder.events,
        vec![
            "start ResearchSubject ResearchSubject",
            "start status code",
            "value value=active",
            "end status",
            "post code",
            "end ResearchSubject",
            "post ResearchSubject",
        ]
    );
}

#[test]
fn test_list_elements_carry_zero_based_indexes() {
    let subject = subject_with_consents();
    let mut paths = PathCollector::new();
    subject.accept(&mut paths);

    let consents: Vec<&str> = paths
        .paths()
        .iter()
        .map(String::as_str)
        .filter(|p| p.starts_with("ResearchSubject.consent["))
        .filter(|p| p.ends_with(']'))
        .collect();
    assert_eq!(consents, vec!["ResearchSubject.consent[0]", "ResearchSubject.consent[1]"]);
}

#[test]
fn test_list_hooks_wrap_elements() {
    let subject = subject_with_consents();
    let mut recorder = Recorder {
        skip_children_of: Some("consent"),
        ..Recorder::default()
    };
    walk(&subject, &mut recorder);

    let start = recorder.events.iter().position(|e| e == "list consent 2").unwrap();
    assert_eq!(
        &recorder.events[start..start + 8],
        &[
            "list consent 2",
            "start consent[0] Reference",
            "end consent[0]",
            "post Reference",
            "start consent[1] Reference",
            "end consent[1]",
            "post Reference",
            "/list consent",
        ]
    );
}

#[test]
fn test_visit_false_still_ends_node() {
    let subject = test_support::research_subject().build().unwrap();
    let mut recorder = Recorder {
        skip_children_of: Some("study"),
        ..Recorder::default()
    };
    walk(&subject, &mut recorder);

    let start = recorder
        .events
        .iter()
        .position(|e| e == "start study Reference")
        .unwrap();
    assert_eq!(recorder.events[start + 1], "end study");
    assert_eq!(recorder.events[start + 2], "post Reference");
    assert!(!recorder.events.iter().any(|e| e.starts_with("start study.")));
}

#[test]
fn test_pre_visit_false_skips_subtree() {
    let subject = subject_with_consents();
    let mut recorder = Recorder {
        skip_type: Some("Reference"),
        ..Recorder::default()
    };
    walk(&subject, &mut recorder);

    assert!(!recorder.events.iter().any(|e| e.contains("Reference")));
    assert!(!recorder.events.iter().any(|e| e == "end consent[0]"));
    // the list hooks belong to the parent and still fire
    assert!(recorder.events.iter().any(|e| e == "list consent 2"));
}

#[test]
fn test_child_order_follows_type_definition() {
    let subject = test_support::research_subject()
        .identifier(
            ferrum_model::Identifier::builder()
                .system("http://example.org/subjects")
                .value("S-1")
                .build()
                .unwrap(),
        )
        .assigned_comparison_group("arm-a")
        .consent(Reference::to("Consent/c-1"))
        .build()
        .unwrap();

    let mut paths = PathCollector::new();
    walk(&subject, &mut paths);
    let children: Vec<String> = paths
        .paths()
        .iter()
        .filter_map(|p| p.strip_prefix("ResearchSubject."))
        .filter(|p| !p.contains('.'))
        .map(|p| p.split('[').next().unwrap_or(p).to_string())
        .collect();

    let declared = subject.type_def().field_names();
    let positions: Vec<usize> = children
        .iter()
        .map(|c| declared.iter().position(|d| *d == c.as_str()).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", children);
}

#[test]
fn test_contained_resources_are_walked() {
    let inner = test_support::research_subject().id("inner").build().unwrap();
    let outer = test_support::research_subject()
        .contained(AnyResource::from(inner))
        .build()
        .unwrap();

    let mut paths = PathCollector::new();
    walk(&outer, &mut paths);
    let paths = paths.into_paths();

    assert_eq!(paths[1], "ResearchSubject.contained[0]");
    assert!(paths.contains(&"ResearchSubject.contained[0].subject".to_string()));
}

/// Collects the literal of every reference in a tree
#[derive(Default)]
struct ReferenceLiterals(Vec<String>);

impl Visitor for ReferenceLiterals {
    fn visit(&mut self, _name: &str, _index: Option<usize>, node: &dyn Visitable) -> bool {
        match node.downcast_ref::<Reference>() {
            Some(reference) => {
                self.0.extend(reference.literal().map(str::to_string));
                false
            }
            None => true,
        }
    }
}

#[test]
fn test_typed_access_through_downcast() {
    let subject = subject_with_consents();
    let mut literals = ReferenceLiterals::default();
    walk(&subject, &mut literals);

    assert_eq!(
        literals.0,
        vec!["ResearchStudy/rs-1", "Patient/p-1", "Consent/c-1", "Consent/c-2"]
    );
}

#[test]
fn test_extension_values_are_reported() {
    let extension = Extension::builder()
        .url("http://example.org/fhir/StructureDefinition/cohort")
        .value(ferrum_model::FhirString::from("A"))
        .build()
        .unwrap();
    let subject = test_support::research_subject()
        .extension(extension)
        .build()
        .unwrap();

    let mut recorder = Recorder {
        skip_type: Some("Reference"),
        ..Recorder::default()
    };
    walk(&subject, &mut recorder);

    assert!(recorder
        .events
        .iter()
        .any(|e| e == "value url=http://example.org/fhir/StructureDefinition/cohort"));
    assert!(recorder.events.iter().any(|e| e == "value value=A"));
}

#[test]
fn test_concurrent_walks_see_same_paths() {
    let definition = Arc::new(
        test_support::condition_definition()
            .precondition(test_support::precondition("271649006"))
            .precondition(test_support::precondition("44054006"))
            .team(Reference::to("CareTeam/ct-1"))
            .build()
            .unwrap(),
    );

    let mut expected = PathCollector::new();
    walk(definition.as_ref(), &mut expected);
    let expected = expected.into_paths();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let definition = Arc::clone(&definition);
            thread::spawn(move || {
                let mut paths = PathCollector::new();
                walk(definition.as_ref(), &mut paths);
                paths.into_paths()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert!(expected
        .iter()
        .any(|p| p == "ConditionDefinition.precondition[1].code"));
}
