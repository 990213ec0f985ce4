//! Call resolution: candidates by name, arity, and type compatibility

use cpg_core::frontend::cpp::CppFrontend;
use cpg_core::frontend::LanguageFrontend;
use cpg_core::graph::{EdgeKind, NodeData, NodeId, NodeKind, PropertyGraph};
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

fn calls_of(graph: &PropertyGraph, unit: NodeId, kind: NodeKind) -> Vec<NodeId> {
    graph
        .query()
        .subtree(unit)
        .into_iter()
        .filter(|&n| graph.node(n).map(|m| m.kind()) == Some(kind))
        .collect()
}

#[test]
fn test_variadic_call_resolves() {
    let (graph, tu) = analyze(
        "int printf(const char*, ...);\nint main() { printf(\"%d\", 1); return 0; }\n",
    );
    let printf = graph
        .query()
        .declarations_by_name(tu, "printf", &[NodeKind::Function])[0];
    let calls = calls_of(&graph, tu, NodeKind::CallExpression);
    let call = calls
        .into_iter()
        .find(|&c| graph.node(c).unwrap().name() == "printf")
        .expect("printf call not found");
    assert_eq!(graph.query().invokes(call), vec![printf]);

    // The declaration's parameter list ends with the variadic marker
    let params = graph.query().parameters_of(printf);
    let last = graph.node(*params.last().unwrap()).unwrap();
    assert!(matches!(
        last.data(),
        NodeData::Parameter { variadic: true, .. }
    ));
}

#[test]
fn test_arity_filters_candidates() {
    let (graph, tu) = analyze(
        r#"
void go(int a);
void go(int a, int b);
int main() { go(1, 2); return 0; }
"#,
    );
    let call = calls_of(&graph, tu, NodeKind::CallExpression)
        .into_iter()
        .find(|&c| graph.node(c).unwrap().name() == "go")
        .expect("call not found");
    let targets = graph.query().invokes(call);
    assert_eq!(targets.len(), 1);
    assert_eq!(graph.query().parameters_of(targets[0]).len(), 2);
}

#[test]
fn test_argument_type_compatibility_filters() {
    let (graph, tu) = analyze(
        r#"
void emit(int v);
void emit(const char* s);
int main() { emit("hi"); return 0; }
"#,
    );
    let call = calls_of(&graph, tu, NodeKind::CallExpression)
        .into_iter()
        .find(|&c| graph.node(c).unwrap().name() == "emit")
        .expect("call not found");
    let targets = graph.query().invokes(call);
    assert_eq!(targets.len(), 1, "only the char* overload is compatible");
    let param = graph.query().parameters_of(targets[0])[0];
    assert_eq!(graph.node(param).unwrap().ty().unwrap().pointer_depth(), 1);
}

#[test]
fn test_member_call_resolves_to_method() {
    let (graph, tu) = analyze(
        r#"
class Engine {
public:
  int start() { return 1; }
};
int main() {
  Engine e;
  return e.start();
}
"#,
    );
    let engine = graph
        .query()
        .declarations_by_name(tu, "Engine", &[NodeKind::Record])[0];
    let start = graph.query().methods_of(engine)[0];
    let call = calls_of(&graph, tu, NodeKind::MemberCall)
        .into_iter()
        .next()
        .expect("member call not found");
    assert_eq!(graph.query().invokes(call), vec![start]);
}

#[test]
fn test_virtual_dispatch_includes_overrides() {
    let (graph, tu) = analyze(
        r#"
class Base {
public:
  int f() { return 1; }
};
class Derived : public Base {
public:
  int f() { return 2; }
};
int main() {
  Base b;
  return b.f();
}
"#,
    );
    let base = graph
        .query()
        .declarations_by_name(tu, "Base", &[NodeKind::Record])[0];
    let derived = graph
        .query()
        .declarations_by_name(tu, "Derived", &[NodeKind::Record])[0];
    let base_f = graph.query().methods_of(base)[0];
    let derived_f = graph.query().methods_of(derived)[0];

    let call = calls_of(&graph, tu, NodeKind::MemberCall)
        .into_iter()
        .next()
        .expect("member call not found");
    let targets = graph.query().invokes(call);
    assert!(targets.contains(&base_f), "static target expected");
    assert!(targets.contains(&derived_f), "override must stay a candidate");
}

#[test]
fn test_unknown_base_over_approximates() {
    let (graph, tu) = analyze(
        r#"
class A { public: int ping() { return 1; } };
class B { public: int ping() { return 2; } };
int f(int untyped) { return untyped.ping(); }
"#,
    );
    let a = graph.query().declarations_by_name(tu, "A", &[NodeKind::Record])[0];
    let b = graph.query().declarations_by_name(tu, "B", &[NodeKind::Record])[0];
    let a_ping = graph.query().methods_of(a)[0];
    let b_ping = graph.query().methods_of(b)[0];

    let call = calls_of(&graph, tu, NodeKind::MemberCall)
        .into_iter()
        .next()
        .expect("member call not found");
    let targets = graph.query().invokes(call);
    assert!(targets.contains(&a_ping));
    assert!(targets.contains(&b_ping));
}

#[test]
fn test_construct_expression_invokes_constructor() {
    let (graph, tu) = analyze(
        r#"
class Job {
public:
  Job(int id) {}
};
int main() { Job j(7); return 0; }
"#,
    );
    let job = graph
        .query()
        .declarations_by_name(tu, "Job", &[NodeKind::Record])[0];
    let ctor = graph.query().constructors_of(job)[0];
    let construct = calls_of(&graph, tu, NodeKind::ConstructExpression)
        .into_iter()
        .next()
        .expect("construct expression not found");
    assert_eq!(graph.query().invokes(construct), vec![ctor]);
}

#[test]
fn test_unresolvable_call_is_flagged() {
    let (graph, tu) = analyze("int main() { vanish(); return 0; }\n");
    let call = calls_of(&graph, tu, NodeKind::CallExpression)
        .into_iter()
        .find(|&c| graph.node(c).unwrap().name() == "vanish")
        .expect("call not found");
    assert!(graph.query().invokes(call).is_empty());
    assert!(graph.node(call).unwrap().is_unresolved());
}

// Property 6: every resolved target's arity matches the argument count,
// or the target is variadic with no more fixed parameters than arguments
#[test]
fn test_resolved_targets_match_arity() {
    let (graph, tu) = analyze(
        r#"
int log_all(const char* fmt, ...);
void two(int a, int b);
int main() {
  log_all("x", 1, 2, 3);
  two(4, 5);
  return 0;
}
"#,
    );
    for call in calls_of(&graph, tu, NodeKind::CallExpression) {
        let args = graph.children(call, EdgeKind::Arguments).len();
        for target in graph.query().invokes(call) {
            let variadic = matches!(
                graph.node(target).unwrap().data(),
                NodeData::Function(info) if info.is_variadic
            );
            let fixed = graph
                .query()
                .parameters_of(target)
                .into_iter()
                .filter(|&p| {
                    !matches!(
                        graph.node(p).unwrap().data(),
                        NodeData::Parameter { variadic: true, .. }
                    )
                })
                .count();
            if variadic {
                assert!(fixed <= args);
            } else {
                assert_eq!(fixed, args);
            }
        }
    }
}
