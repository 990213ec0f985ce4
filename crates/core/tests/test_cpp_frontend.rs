//! Integration tests for the C/C++ frontend

use cpg_core::frontend::cpp::CppFrontend;
use cpg_core::frontend::LanguageFrontend;
use cpg_core::graph::{EdgeKind, NodeData, NodeId, NodeKind, PropertyGraph};
use std::path::Path;

fn parse_cpp(source: &str) -> (PropertyGraph, NodeId) {
    let mut graph = PropertyGraph::new();
    let frontend = CppFrontend::default();
    let tu = frontend
        .parse_source(source, Path::new("test.cpp"), &mut graph)
        .expect("failed to parse C++ source");
    (graph, tu)
}

fn find(graph: &PropertyGraph, unit: NodeId, name: &str, kind: NodeKind) -> Option<NodeId> {
    graph
        .query()
        .declarations_by_name(unit, name, &[kind])
        .into_iter()
        .next()
}

// ── Functions ────────────────────────────────────────────────────────────

#[test]
fn test_parse_functions() {
    let source = r#"
int add(int a, int b) {
    return a + b;
}

void greet(const char* name) {}
"#;
    let (graph, tu) = parse_cpp(source);

    let add = find(&graph, tu, "add", NodeKind::Function).expect("add not found");
    let params = graph.query().parameters_of(add);
    assert_eq!(params.len(), 2);
    assert_eq!(graph.node(params[0]).unwrap().name(), "a");
    assert_eq!(graph.node(params[1]).unwrap().name(), "b");
    assert_eq!(
        graph.node(add).unwrap().ty().map(|t| t.name().to_string()),
        Some("int".to_string())
    );
    assert!(graph.child(add, EdgeKind::Body).is_some());

    let greet = find(&graph, tu, "greet", NodeKind::Function).expect("greet not found");
    let greet_params = graph.query().parameters_of(greet);
    assert_eq!(greet_params.len(), 1);
    let ty = graph.node(greet_params[0]).unwrap().ty().unwrap().clone();
    assert!(ty.qualifiers().is_const);
    assert_eq!(ty.name(), "char");
    assert_eq!(ty.pointer_depth(), 1);
}

#[test]
fn test_variadic_gets_synthetic_marker() {
    let source = "int printf(const char*, ...);";
    let (graph, tu) = parse_cpp(source);

    let printf = find(&graph, tu, "printf", NodeKind::Function).expect("printf not found");
    match graph.node(printf).unwrap().data() {
        NodeData::Function(info) => assert!(info.is_variadic),
        other => panic!("expected function data, got {:?}", other),
    }

    let params = graph.query().parameters_of(printf);
    let last = *params.last().expect("parameter list must not be empty");
    match graph.node(last).unwrap().data() {
        NodeData::Parameter { variadic, .. } => {
            assert!(variadic, "the list must end with the variadic marker")
        }
        other => panic!("expected parameter data, got {:?}", other),
    }
    assert!(graph.node(last).unwrap().is_implicit());
}

// ── Records and member promotion ─────────────────────────────────────────

#[test]
fn test_struct_fields_are_promoted() {
    let source = "struct Point { int x; int y; };";
    let (graph, tu) = parse_cpp(source);

    let point = find(&graph, tu, "Point", NodeKind::Record).expect("Point not found");
    let fields = graph.query().fields_of(point);
    let names: Vec<&str> = fields
        .iter()
        .filter_map(|&f| graph.node(f).map(|n| n.name()))
        .collect();
    assert_eq!(names, vec!["x", "y"]);
    // No stray variable nodes survive the promotion in the record
    assert!(find(&graph, tu, "x", NodeKind::Variable).is_none());
}

#[test]
fn test_default_constructor_synthesis() {
    let source = "struct P { int x; };";
    let (graph, tu) = parse_cpp(source);

    let p = find(&graph, tu, "P", NodeKind::Record).expect("P not found");
    let constructors = graph.query().constructors_of(p);
    assert_eq!(constructors.len(), 1, "exactly one constructor expected");
    let ctor = constructors[0];
    assert_eq!(graph.node(ctor).unwrap().name(), "P");
    assert!(graph.query().parameters_of(ctor).is_empty());
    assert!(graph.node(ctor).unwrap().is_implicit());
}

#[test]
fn test_declared_constructor_suppresses_synthesis() {
    let source = r#"
class Widget {
public:
  Widget(int size) {}
};
"#;
    let (graph, tu) = parse_cpp(source);
    let widget = find(&graph, tu, "Widget", NodeKind::Record).unwrap();
    let constructors = graph.query().constructors_of(widget);
    assert_eq!(constructors.len(), 1);
    let ctor = constructors[0];
    assert!(!graph.node(ctor).unwrap().is_implicit());
    assert_eq!(graph.query().parameters_of(ctor).len(), 1);
}

#[test]
fn test_inline_method_is_reparented() {
    let source = r#"
class Calc {
public:
  int twice(int v) { return v + v; }
};
"#;
    let (graph, tu) = parse_cpp(source);

    let calc = find(&graph, tu, "Calc", NodeKind::Record).unwrap();
    let methods = graph.query().methods_of(calc);
    assert_eq!(methods.len(), 1);
    let twice = methods[0];
    assert_eq!(graph.node(twice).unwrap().kind(), NodeKind::Method);
    assert_eq!(graph.record_of(twice), Some(calc));
    // The promoted node keeps the signature and the body
    assert_eq!(graph.query().parameters_of(twice).len(), 1);
    assert!(graph.child(twice, EdgeKind::Body).is_some());
    // No Function node with that name remains attached
    assert!(find(&graph, tu, "twice", NodeKind::Function).is_none());
}

#[test]
fn test_out_of_line_definition_attaches_to_record() {
    let source = r#"
class Engine {
public:
  Engine();
  int start();
};

Engine::Engine() {}
int Engine::start() { return 1; }
"#;
    let (graph, tu) = parse_cpp(source);

    let engine = find(&graph, tu, "Engine", NodeKind::Record).unwrap();
    let starts = graph.query().declarations_by_name(tu, "start", &[NodeKind::Method]);
    assert_eq!(starts.len(), 2, "prototype plus definition");
    for method in starts {
        assert_eq!(graph.record_of(method), Some(engine));
    }

    let ctors = graph.query().constructors_of(engine);
    assert_eq!(ctors.len(), 2, "declared and defined constructor");
    assert!(ctors
        .iter()
        .all(|&c| graph.node(c).unwrap().name() == "Engine"));
}

#[test]
fn test_function_pointer_field_vs_variable() {
    let source = "struct S { int (*fp)(int); };\nint (*g)(int);";
    let (graph, tu) = parse_cpp(source);

    let s = find(&graph, tu, "S", NodeKind::Record).expect("S not found");
    let fp = graph.query().field(s, "fp").expect("fp must be a field of S");
    assert_eq!(graph.node(fp).unwrap().kind(), NodeKind::Field);

    let g = find(&graph, tu, "g", NodeKind::Variable).expect("g not found");
    assert_eq!(
        graph.node(g).unwrap().scope(),
        Some(graph.global_scope()),
        "g must live in the global scope"
    );
    assert!(graph.node(g).unwrap().ty().unwrap().is_function());
}

// ── Statements and expressions ───────────────────────────────────────────

#[test]
fn test_if_statement_shape() {
    let source = "void f(int a) { if (a) a; else a; }";
    let (graph, tu) = parse_cpp(source);
    let f = find(&graph, tu, "f", NodeKind::Function).unwrap();
    let body = graph.child(f, EdgeKind::Body).unwrap();
    let stmts = graph.children(body, EdgeKind::Ast);
    assert_eq!(stmts.len(), 1);
    let if_stmt = stmts[0];
    assert_eq!(graph.node(if_stmt).unwrap().kind(), NodeKind::If);
    assert!(graph.child(if_stmt, EdgeKind::Condition).is_some());
    assert!(graph.child(if_stmt, EdgeKind::Then).is_some());
    assert!(graph.child(if_stmt, EdgeKind::Else).is_some());
}

#[test]
fn test_call_arguments_are_ordered() {
    let source = r#"void f() { g(1, 2, 3); }"#;
    let (graph, tu) = parse_cpp(source);
    let call = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|x| x.kind()) == Some(NodeKind::CallExpression))
        .expect("call not found");
    let args = graph.children(call, EdgeKind::Arguments);
    assert_eq!(args.len(), 3);
    let values: Vec<String> = args
        .iter()
        .filter_map(|&a| graph.node(a).and_then(|n| n.code()).map(str::to_string))
        .collect();
    assert_eq!(values, vec!["1", "2", "3"]);
}

#[test]
fn test_member_call_keeps_base() {
    let source = "void f(int* p) { obj.run(1); }";
    let (graph, tu) = parse_cpp(source);
    let call = graph
        .query()
        .subtree(tu)
        .into_iter()
        .find(|&n| graph.node(n).map(|x| x.kind()) == Some(NodeKind::MemberCall))
        .expect("member call not found");
    assert_eq!(graph.node(call).unwrap().name(), "run");
    let base = graph.child(call, EdgeKind::Base).expect("base missing");
    assert_eq!(graph.node(base).unwrap().name(), "obj");
}

#[test]
fn test_unknown_construct_becomes_problem_node() {
    let source = "void f() { asm(\"nop\"); }";
    let (graph, tu) = parse_cpp(source);
    // Whatever the parser made of it, the build went through and the unit
    // exists with one function
    assert!(find(&graph, tu, "f", NodeKind::Function).is_some());
}

#[test]
fn test_locations_are_one_based_inclusive() {
    let source = "int x;\nint y;\n";
    let (graph, tu) = parse_cpp(source);
    let y = find(&graph, tu, "y", NodeKind::Variable).unwrap();
    let location = graph.node(y).unwrap().location().expect("location missing");
    assert_eq!(location.region.start_line, 2);
    assert_eq!(location.region.start_column, 1);
    assert_eq!(location.region.end_line, 2);
}

#[test]
fn test_code_keeps_source_text() {
    let source = "int answer = 42;";
    let (graph, tu) = parse_cpp(source);
    let answer = find(&graph, tu, "answer", NodeKind::Variable).unwrap();
    assert_eq!(graph.node(answer).unwrap().code(), Some("int answer = 42;"));
}

// Re-parsing a declaration's recorded source text yields a structurally
// equivalent declaration
#[test]
fn test_recorded_function_code_roundtrips() {
    let (graph, tu) = parse_cpp("int add(int a, int b) { return a + b; }\n");
    let add = find(&graph, tu, "add", NodeKind::Function).unwrap();
    let code = graph.node(add).unwrap().code().unwrap().to_string();

    let (reparsed, new_tu) = parse_cpp(&code);
    let first = reparsed.children(new_tu, EdgeKind::Ast)[0];
    let node = reparsed.node(first).unwrap();
    assert_eq!(node.kind(), NodeKind::Function);
    assert_eq!(node.name(), "add");
    assert_eq!(reparsed.query().parameters_of(first).len(), 2);
}

#[test]
fn test_recorded_record_code_roundtrips() {
    let (graph, tu) = parse_cpp("struct Point { int x; int y; };\n");
    let point = find(&graph, tu, "Point", NodeKind::Record).unwrap();
    let code = format!("{};", graph.node(point).unwrap().code().unwrap());

    let (reparsed, new_tu) = parse_cpp(&code);
    let first = find(&reparsed, new_tu, "Point", NodeKind::Record).expect("record lost");
    let field_names = |g: &PropertyGraph, r| {
        g.query()
            .fields_of(r)
            .iter()
            .filter_map(|&f| g.node(f).map(|n| n.name().to_string()))
            .collect::<Vec<_>>()
    };
    assert_eq!(field_names(&graph, point), field_names(&reparsed, first));
}

#[test]
fn test_body_statement_with_wrong_kind_fails() {
    let (graph, tu) = parse_cpp("int f() { return 1; }\n");
    let f = find(&graph, tu, "f", NodeKind::Function).unwrap();
    assert!(graph.query().body_statement_as(f, 0, NodeKind::Return).is_ok());
    assert!(graph.query().body_statement_as(f, 0, NodeKind::While).is_err());
    assert!(graph.query().body_statement_as(f, 9, NodeKind::Return).is_err());
}
