//! Tests for the scope manager: stack discipline, declaration placement,
//! lookup and shadowing

use cpg_core::graph::{Node, PropertyGraph};
use cpg_core::scope::{self, ScopeKind, ScopeManager, GLOBAL_SCOPE};
use cpg_core::types::Type;

#[test]
fn test_enter_leave_balanced() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let func = graph.add_node(Node::function("f", Type::parse("void")));

    scopes.enter_scope(&mut graph, func, ScopeKind::Function);
    assert_eq!(scopes.depth(), 2);
    scopes.leave_scope(&graph, func).expect("balanced leave");
    assert_eq!(scopes.current_scope(), GLOBAL_SCOPE);
}

#[test]
fn test_leave_wrong_scope_is_imbalance() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let func = graph.add_node(Node::function("f", Type::parse("void")));
    let other = graph.add_node(Node::function("g", Type::parse("void")));

    scopes.enter_scope(&mut graph, func, ScopeKind::Function);
    let err = scopes.leave_scope(&graph, other);
    assert!(err.is_err(), "leaving the wrong scope must fail");
}

#[test]
fn test_scope_tree_reaches_global() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let ns = graph.add_node(Node::namespace("ns"));
    let record = graph.add_node(Node::record("R", "class"));
    let func = graph.add_node(Node::function("m", Type::parse("void")));

    scopes.enter_scope(&mut graph, ns, ScopeKind::Namespace);
    scopes.enter_scope(&mut graph, record, ScopeKind::Record);
    let inner = scopes.enter_scope(&mut graph, func, ScopeKind::Function);

    let chain = graph.scope_chain(inner);
    assert_eq!(*chain.last().unwrap(), GLOBAL_SCOPE);
    assert_eq!(chain.len(), 4);
}

#[test]
fn test_declaration_placement_by_kind() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let record = graph.add_node(Node::record("R", "class"));
    let func = graph.add_node(Node::function("m", Type::parse("void")));
    let block = graph.add_node(Node::block());

    let record_scope = scopes.enter_scope(&mut graph, record, ScopeKind::Record);
    let func_scope = scopes.enter_scope(&mut graph, func, ScopeKind::Function);
    let block_scope = scopes.enter_scope(&mut graph, block, ScopeKind::Block);

    // Fields climb to the record, parameters to the function, variables
    // stay in the innermost block
    let field = graph.add_node(Node::field("f", Type::parse("int")));
    scopes.add_declaration(&mut graph, field);
    assert_eq!(graph.node(field).unwrap().scope(), Some(record_scope));

    let param = graph.add_node(Node::parameter("p", Type::parse("int"), 0));
    scopes.add_declaration(&mut graph, param);
    assert_eq!(graph.node(param).unwrap().scope(), Some(func_scope));

    let var = graph.add_node(Node::variable("v", Type::parse("int")));
    scopes.add_declaration(&mut graph, var);
    assert_eq!(graph.node(var).unwrap().scope(), Some(block_scope));
}

#[test]
fn test_resolve_walks_outward() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let global_var = graph.add_node(Node::variable("g", Type::parse("int")));
    scopes.add_declaration(&mut graph, global_var);

    let func = graph.add_node(Node::function("f", Type::parse("void")));
    let inner = scopes.enter_scope(&mut graph, func, ScopeKind::Function);

    let found = scope::resolve(&graph, "g", inner, |n| n.kind().is_value_declaration());
    assert_eq!(found, vec![global_var]);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let outer = graph.add_node(Node::variable("x", Type::parse("int")));
    scopes.add_declaration(&mut graph, outer);

    let func = graph.add_node(Node::function("f", Type::parse("void")));
    let inner_scope = scopes.enter_scope(&mut graph, func, ScopeKind::Function);
    let inner = graph.add_node(Node::variable("x", Type::parse("int")));
    scopes.add_declaration(&mut graph, inner);

    let found = scope::resolve(&graph, "x", inner_scope, |n| n.kind().is_value_declaration());
    assert_eq!(found, vec![inner], "the inner declaration shadows the outer");
}

#[test]
fn test_qualified_resolution() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();

    let ns = graph.add_node(Node::namespace("net"));
    scopes.enter_scope(&mut graph, ns, ScopeKind::Namespace);
    let record = graph.add_node(Node::record("Socket", "class"));
    scopes.add_declaration(&mut graph, record);
    scopes.enter_scope(&mut graph, record, ScopeKind::Record);
    let method = graph.add_node(Node::function("open", Type::parse("int")));
    scopes.add_declaration(&mut graph, method);
    scopes.leave_scope(&graph, record).unwrap();
    scopes.leave_scope(&graph, ns).unwrap();

    let found = scope::resolve_qualified(&graph, "net::Socket::open", "::", |n| {
        n.kind().is_value_declaration()
    });
    assert_eq!(found, vec![method]);

    let missing = scope::resolve_qualified(&graph, "net::Missing::open", "::", |_| true);
    assert!(missing.is_empty());
}

#[test]
fn test_name_prefix_concatenates_enclosing_containers() {
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    let ns = graph.add_node(Node::namespace("outer"));
    let record = graph.add_node(Node::record("Thing", "class"));

    scopes.enter_scope(&mut graph, ns, ScopeKind::Namespace);
    scopes.enter_scope(&mut graph, record, ScopeKind::Record);
    assert_eq!(scopes.current_name_prefix(&graph, "::"), "outer::Thing::");

    // Block scopes contribute nothing
    let block = graph.add_node(Node::block());
    scopes.enter_scope(&mut graph, block, ScopeKind::Block);
    assert_eq!(scopes.current_name_prefix(&graph, "::"), "outer::Thing::");
}
