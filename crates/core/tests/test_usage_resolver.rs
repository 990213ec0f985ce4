//! Usage resolution: references, shadowing, field access

use cpg_core::frontend::cpp::CppFrontend;
use cpg_core::frontend::LanguageFrontend;
use cpg_core::graph::{EdgeKind, NodeId, NodeKind, PropertyGraph};
use cpg_core::passes::{default_passes, run_pipeline};
use std::path::Path;

fn analyze(source: &str) -> (PropertyGraph, NodeId) {
    let mut graph = PropertyGraph::new();
    let frontend = CppFrontend::default();
    let tu = frontend
        .parse_source(source, Path::new("test.cpp"), &mut graph)
        .expect("parse failed");
    run_pipeline(&mut graph, &[tu], &default_passes());
    (graph, tu)
}

fn first(graph: &PropertyGraph, unit: NodeId, name: &str, kind: NodeKind) -> NodeId {
    graph
        .query()
        .declarations_by_name(unit, name, &[kind])
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("{} ({:?}) not found", name, kind))
}

#[test]
fn test_local_shadows_global() {
    let (graph, tu) = analyze("int x;\nint f() { int x = 1; return x; }\n");

    let f = first(&graph, tu, "f", NodeKind::Function);
    let ret = graph
        .query()
        .body_statement_as(f, 1, NodeKind::Return)
        .or_else(|_| graph.query().body_statement_as(f, 0, NodeKind::Return))
        .expect("return statement not found");
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();

    let targets = graph.query().refers_to(value);
    assert_eq!(targets.len(), 1);
    let target = targets[0];
    // The local, not the global: its defining scope is not the global one
    assert_ne!(graph.node(target).unwrap().scope(), Some(graph.global_scope()));
    assert_eq!(graph.node(target).unwrap().name(), "x");
}

#[test]
fn test_global_reference_resolves() {
    let (graph, tu) = analyze("int counter;\nint f() { return counter; }\n");
    let counter = first(&graph, tu, "counter", NodeKind::Variable);
    let f = first(&graph, tu, "f", NodeKind::Function);
    let ret = graph.query().body_statement_as(f, 0, NodeKind::Return).unwrap();
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(value), vec![counter]);
}

#[test]
fn test_parameter_reference_resolves() {
    let (graph, tu) = analyze("int id(int v) { return v; }\n");
    let id = first(&graph, tu, "id", NodeKind::Function);
    let param = graph.query().parameters_of(id)[0];
    let ret = graph.query().body_statement_as(id, 0, NodeKind::Return).unwrap();
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(value), vec![param]);
}

#[test]
fn test_method_reaches_field_without_this() {
    let (graph, tu) = analyze(
        r#"
class Counter {
public:
  int bump() { return value; }
  int value;
};
"#,
    );
    let counter = first(&graph, tu, "Counter", NodeKind::Record);
    let value_field = graph.query().field(counter, "value").expect("field missing");
    let bump = graph.query().methods_of(counter)[0];
    let ret = graph.query().body_statement_as(bump, 0, NodeKind::Return).unwrap();
    let reference = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(reference), vec![value_field]);
}

#[test]
fn test_member_expression_through_object() {
    let (graph, tu) = analyze(
        r#"
class Point { public: int x; };
int f() {
  Point p;
  return p.x;
}
"#,
    );
    let point = first(&graph, tu, "Point", NodeKind::Record);
    let x = graph.query().field(point, "x").expect("field x missing");

    let member = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|m| m.kind()) == Some(NodeKind::MemberExpression))
        .expect("member expression not found");
    assert!(graph.query().refers_to(member).contains(&x));
}

#[test]
fn test_member_expression_through_this() {
    let (graph, tu) = analyze(
        r#"
class Box {
public:
  int get() { return this->size; }
  int size;
};
"#,
    );
    let record = first(&graph, tu, "Box", NodeKind::Record);
    let size = graph.query().field(record, "size").expect("field missing");
    let member = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|m| m.kind()) == Some(NodeKind::MemberExpression))
        .expect("member expression not found");
    assert!(graph.query().refers_to(member).contains(&size));
}

#[test]
fn test_inherited_field_resolves() {
    let (graph, tu) = analyze(
        r#"
class Base { public: int shared; };
class Child : public Base {
public:
  int get() { return shared; }
};
"#,
    );
    let base = first(&graph, tu, "Base", NodeKind::Record);
    let shared = graph.query().field(base, "shared").expect("field missing");
    let child = first(&graph, tu, "Child", NodeKind::Record);
    let get = graph.query().methods_of(child)[0];
    let ret = graph.query().body_statement_as(get, 0, NodeKind::Return).unwrap();
    let reference = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(reference), vec![shared]);
}

#[test]
fn test_unknown_name_is_flagged_not_fatal() {
    let (graph, tu) = analyze("int f() { return mystery; }\n");
    let f = first(&graph, tu, "f", NodeKind::Function);
    let ret = graph.query().body_statement_as(f, 0, NodeKind::Return).unwrap();
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert!(graph.query().refers_to(value).is_empty());
    assert!(graph.node(value).unwrap().is_unresolved());
}

// Property 3: a resolved target's defining scope is an ancestor of the
// reference's scope, or an accessible record scope
#[test]
fn test_refers_to_targets_are_visible() {
    let (graph, tu) = analyze(
        r#"
int global;
class Holder {
public:
  int held;
  int read() { return held + global; }
};
"#,
    );
    for id in graph.query().subtree(tu) {
        if graph.node(id).map(|n| n.kind()) != Some(NodeKind::DeclaredReference) {
            continue;
        }
        let Some(ref_scope) = graph.node(id).unwrap().scope() else {
            continue;
        };
        let chain = graph.scope_chain(ref_scope);
        for target in graph.query().refers_to(id) {
            let decl_scope = graph.node(target).unwrap().scope().expect("target scope");
            assert!(
                chain.contains(&decl_scope),
                "target of {:?} declared outside the visible chain",
                graph.node(id).unwrap().name()
            );
        }
    }
}
