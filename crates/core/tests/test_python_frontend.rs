//! Integration tests for the Python frontend

use cpg_core::frontend::python::PythonFrontend;
use cpg_core::frontend::LanguageFrontend;
use cpg_core::graph::{EdgeKind, NodeId, NodeKind, PropertyGraph};
use cpg_core::passes::{default_passes, run_pipeline};
use std::path::Path;

fn parse_python(source: &str) -> (PropertyGraph, NodeId) {
    let mut graph = PropertyGraph::new();
    let frontend = PythonFrontend::new();
    let tu = frontend
        .parse_source(source, Path::new("app.py"), &mut graph)
        .expect("failed to parse Python source");
    (graph, tu)
}

#[test]
fn test_parse_functions() {
    let source = r#"
def greet(name, punctuation="!"):
    return name
"#;
    let (graph, tu) = parse_python(source);
    let greet = graph
        .query()
        .declarations_by_name(tu, "greet", &[NodeKind::Function])
        .into_iter()
        .next()
        .expect("greet not found");
    let params = graph.query().parameters_of(greet);
    assert_eq!(params.len(), 2);
    assert_eq!(graph.node(params[0]).unwrap().name(), "name");
    assert!(graph.child(params[1], EdgeKind::Initializer).is_some());
}

#[test]
fn test_star_args_set_variadic() {
    let (graph, tu) = parse_python("def collect(*items):\n    return items\n");
    let collect = graph
        .query()
        .declarations_by_name(tu, "collect", &[NodeKind::Function])[0];
    let params = graph.query().parameters_of(collect);
    assert_eq!(params.len(), 1);
    match graph.node(params[0]).unwrap().data() {
        cpg_core::graph::NodeData::Parameter { variadic, .. } => assert!(variadic),
        other => panic!("expected parameter, got {:?}", other),
    }
}

#[test]
fn test_class_members_are_promoted() {
    let source = r#"
class Account:
    limit = 100

    def __init__(self, owner):
        self.owner = owner

    def balance(self):
        return 0
"#;
    let (graph, tu) = parse_python(source);
    let account = graph
        .query()
        .declarations_by_name(tu, "Account", &[NodeKind::Record])
        .into_iter()
        .next()
        .expect("Account not found");

    // `__init__` became the constructor, named after the class
    let ctors = graph.query().constructors_of(account);
    assert_eq!(ctors.len(), 1);
    assert_eq!(graph.node(ctors[0]).unwrap().name(), "Account");
    assert!(!graph.node(ctors[0]).unwrap().is_implicit());

    let methods = graph.query().methods_of(account);
    assert_eq!(methods.len(), 1);
    assert_eq!(graph.node(methods[0]).unwrap().name(), "balance");

    // The class-level assignment declares a field
    let limit = graph.query().field(account, "limit");
    assert!(limit.is_some(), "limit must be promoted to a field");
}

#[test]
fn test_class_without_init_gets_default_constructor() {
    let (graph, tu) = parse_python("class Empty:\n    pass\n");
    let empty = graph
        .query()
        .declarations_by_name(tu, "Empty", &[NodeKind::Record])[0];
    let ctors = graph.query().constructors_of(empty);
    assert_eq!(ctors.len(), 1);
    assert!(graph.node(ctors[0]).unwrap().is_implicit());
}

#[test]
fn test_first_assignment_declares_variable() {
    let source = r#"
def f():
    total = 1
    total = 2
    return total
"#;
    let (mut graph, tu) = parse_python(source);
    run_pipeline(&mut graph, &[tu], &default_passes());

    let decls = graph
        .query()
        .declarations_by_name(tu, "total", &[NodeKind::Variable]);
    assert_eq!(decls.len(), 1, "only the first assignment declares");

    let f = graph
        .query()
        .declarations_by_name(tu, "f", &[NodeKind::Function])[0];
    let ret = graph
        .query()
        .body_statement_as(f, 2, NodeKind::Return)
        .expect("return expected as third statement");
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(value), vec![decls[0]]);
}

#[test]
fn test_method_call_resolves() {
    let source = r#"
class Greeter:
    def hello(self):
        return 1

def run():
    g = Greeter()
    return g.hello()
"#;
    let (mut graph, tu) = parse_python(source);
    run_pipeline(&mut graph, &[tu], &default_passes());

    let greeter = graph
        .query()
        .declarations_by_name(tu, "Greeter", &[NodeKind::Record])[0];
    let hello = graph.query().methods_of(greeter)[0];
    let call = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|m| m.kind()) == Some(NodeKind::MemberCall))
        .expect("member call not found");
    assert!(graph.query().invokes(call).contains(&hello));
}
