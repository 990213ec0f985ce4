//! Integration tests for the Go frontend

use cpg_core::frontend::go::GoFrontend;
use cpg_core::frontend::LanguageFrontend;
use cpg_core::graph::{EdgeKind, NodeId, NodeKind, PropertyGraph};
use cpg_core::passes::{default_passes, run_pipeline};
use std::path::Path;

fn parse_go(source: &str) -> (PropertyGraph, NodeId) {
    let mut graph = PropertyGraph::new();
    let frontend = GoFrontend::new();
    let tu = frontend
        .parse_source(source, Path::new("main.go"), &mut graph)
        .expect("failed to parse Go source");
    (graph, tu)
}

#[test]
fn test_parse_functions() {
    let source = r#"
package main

func add(a int, b int) int {
	return a + b
}
"#;
    let (graph, tu) = parse_go(source);
    let add = graph
        .query()
        .declarations_by_name(tu, "add", &[NodeKind::Function])
        .into_iter()
        .next()
        .expect("add not found");
    let params = graph.query().parameters_of(add);
    assert_eq!(params.len(), 2);
    assert_eq!(graph.node(params[0]).unwrap().name(), "a");
    assert!(graph.child(add, EdgeKind::Body).is_some());
}

#[test]
fn test_package_becomes_namespace() {
    let (graph, tu) = parse_go("package tools\n");
    let ns = graph
        .query()
        .declarations_by_name(tu, "tools", &[NodeKind::Namespace]);
    assert_eq!(ns.len(), 1);
}

#[test]
fn test_struct_and_method() {
    let source = r#"
package main

type Server struct {
	port int
	host string
}

func (s *Server) Start() int {
	return s.port
}
"#;
    let (graph, tu) = parse_go(source);
    let server = graph
        .query()
        .declarations_by_name(tu, "Server", &[NodeKind::Record])
        .into_iter()
        .next()
        .expect("Server not found");

    let fields: Vec<&str> = graph
        .query()
        .fields_of(server)
        .iter()
        .filter_map(|&f| graph.node(f).map(|n| n.name()))
        .collect();
    assert_eq!(fields, vec!["port", "host"]);

    let methods = graph.query().methods_of(server);
    assert_eq!(methods.len(), 1);
    let start = methods[0];
    assert_eq!(graph.node(start).unwrap().name(), "Start");
    assert_eq!(graph.record_of(start), Some(server));
    assert_eq!(
        graph.node(start).unwrap().qualified_name(),
        Some("Server.Start")
    );
}

#[test]
fn test_member_access_resolves_through_receiver() {
    let source = r#"
package main

type Server struct {
	port int
}

func (s *Server) Port() int {
	return s.port
}
"#;
    let (mut graph, tu) = parse_go(source);
    run_pipeline(&mut graph, &[tu], &default_passes());

    let server = graph
        .query()
        .declarations_by_name(tu, "Server", &[NodeKind::Record])[0];
    let port = graph.query().field(server, "port").expect("field missing");
    let member = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|m| m.kind()) == Some(NodeKind::MemberExpression))
        .expect("member expression not found");
    assert!(graph.query().refers_to(member).contains(&port));
}

#[test]
fn test_short_var_declaration_declares() {
    let source = r#"
package main

func f() int {
	total := 3
	return total
}
"#;
    let (mut graph, tu) = parse_go(source);
    run_pipeline(&mut graph, &[tu], &default_passes());

    let total = graph
        .query()
        .declarations_by_name(tu, "total", &[NodeKind::Variable])
        .into_iter()
        .next()
        .expect("total not declared");
    assert!(graph.child(total, EdgeKind::Initializer).is_some());

    let f = graph
        .query()
        .declarations_by_name(tu, "f", &[NodeKind::Function])[0];
    let ret = graph
        .query()
        .body_statement_as(f, 1, NodeKind::Return)
        .expect("return expected as second statement");
    let value = graph.child(ret, EdgeKind::ReturnValue).unwrap();
    assert_eq!(graph.query().refers_to(value), vec![total]);
}

#[test]
fn test_calls_resolve_within_package() {
    let source = r#"
package main

func helper() int {
	return 1
}

func main() {
	helper()
}
"#;
    let (mut graph, tu) = parse_go(source);
    run_pipeline(&mut graph, &[tu], &default_passes());

    let helper = graph
        .query()
        .declarations_by_name(tu, "helper", &[NodeKind::Function])[0];
    let call = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|m| m.kind()) == Some(NodeKind::CallExpression))
        .expect("call not found");
    assert_eq!(graph.query().invokes(call), vec![helper]);
}
