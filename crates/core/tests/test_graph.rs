//! Tests for the graph core: nodes, edges, ordering, disconnect, merge

use cpg_core::graph::{
    Edge, EdgeKind, LiteralValue, Node, NodeKind, PropertyGraph,
};
use cpg_core::types::Type;

// ── Identity and ordering ────────────────────────────────────────────────

#[test]
fn test_node_identity_is_by_allocation() {
    let mut graph = PropertyGraph::new();
    let a = graph.add_node(Node::literal(LiteralValue::Int(42)));
    let b = graph.add_node(Node::literal(LiteralValue::Int(42)));
    assert_ne!(a, b, "two equal literals must stay distinct nodes");
    assert_eq!(graph.node(a), graph.node(b));
}

#[test]
fn test_ordered_children_keep_insertion_order() {
    let mut graph = PropertyGraph::new();
    let call = graph.add_node(Node::call_expression("f"));
    let first = graph.add_node(Node::literal(LiteralValue::Int(1)));
    let second = graph.add_node(Node::literal(LiteralValue::Int(2)));
    let third = graph.add_node(Node::literal(LiteralValue::Int(3)));
    graph.add_child(call, EdgeKind::Arguments, first);
    graph.add_child(call, EdgeKind::Arguments, second);
    graph.add_child(call, EdgeKind::Arguments, third);

    assert_eq!(
        graph.children(call, EdgeKind::Arguments),
        vec![first, second, third]
    );
}

#[test]
fn test_edge_properties() {
    let edge = Edge::ordered(EdgeKind::Ast, 3);
    assert_eq!(edge.index(), Some(3));
    assert_eq!(edge.branch_value(), None);

    let branch = Edge::branch(false);
    assert_eq!(branch.kind(), EdgeKind::Eog);
    assert_eq!(branch.branch_value(), Some(false));
}

// ── Disconnect and reparent ──────────────────────────────────────────────

#[test]
fn test_disconnect_severs_edges_but_keeps_node() {
    let mut graph = PropertyGraph::new();
    let block = graph.add_node(Node::block());
    let stmt = graph.add_node(Node::return_stmt());
    let value = graph.add_node(Node::literal(LiteralValue::Int(1)));
    graph.add_child(block, EdgeKind::Ast, stmt);
    graph.add_edge(stmt, value, Edge::new(EdgeKind::ReturnValue));

    graph.disconnect_from_graph(stmt);

    assert!(graph.children(block, EdgeKind::Ast).is_empty());
    assert!(graph.child(stmt, EdgeKind::ReturnValue).is_none());
    assert!(graph.node(stmt).is_some(), "node must stay allocated");
    assert!(graph.node(value).is_some());
}

#[test]
fn test_replace_node_moves_both_edge_directions() {
    let mut graph = PropertyGraph::new();
    let record = graph.add_node(Node::record("R", "struct"));
    let func = graph.add_node(Node::function("m", Type::parse("int")));
    let body = graph.add_node(Node::block());
    graph.add_child(record, EdgeKind::Ast, func);
    graph.add_edge(func, body, Edge::new(EdgeKind::Body));

    let method = graph.add_node(graph.node(func).unwrap().as_method());
    graph.replace_node(func, method);

    assert_eq!(graph.children(record, EdgeKind::Ast), vec![method]);
    assert_eq!(graph.child(method, EdgeKind::Body), Some(body));
    assert!(graph.ast_parent(func).is_none());
    assert_eq!(graph.node(method).unwrap().kind(), NodeKind::Method);
}

// ── Merge ────────────────────────────────────────────────────────────────

#[test]
fn test_merge_remaps_nodes_and_edges() {
    let mut target = PropertyGraph::new();
    let existing = target.add_node(Node::translation_unit("a.c"));

    let mut other = PropertyGraph::new();
    let tu = other.add_node(Node::translation_unit("b.c"));
    let func = other.add_node(Node::function("f", Type::parse("void")));
    other.add_child(tu, EdgeKind::Ast, func);

    let id_map = target.merge(other);
    let new_tu = id_map[&tu];
    let new_func = id_map[&func];

    assert_ne!(new_tu, existing);
    assert_eq!(target.children(new_tu, EdgeKind::Ast), vec![new_func]);
    assert_eq!(target.node(new_func).unwrap().name(), "f");
}

#[test]
fn test_merge_folds_global_scopes() {
    let mut a = PropertyGraph::new();
    let mut manager_a = cpg_core::ScopeManager::new();
    let var_a = a.add_node(Node::variable("x", Type::parse("int")));
    manager_a.add_declaration(&mut a, var_a);

    let mut b = PropertyGraph::new();
    let mut manager_b = cpg_core::ScopeManager::new();
    let var_b = b.add_node(Node::variable("y", Type::parse("int")));
    manager_b.add_declaration(&mut b, var_b);

    let id_map = a.merge(b);
    let global = a.global_scope();
    let names: Vec<&str> = a
        .scope(global)
        .declarations()
        .iter()
        .filter_map(|&d| a.node(d).map(|n| n.name()))
        .collect();
    assert!(names.contains(&"x"));
    assert!(names.contains(&"y"));
    assert_eq!(a.scope(global).lookup("y"), &[id_map[&var_b]]);
}

// ── Serialization ────────────────────────────────────────────────────────

#[test]
fn test_graph_serializes() {
    let mut graph = PropertyGraph::new();
    let tu = graph.add_node(Node::translation_unit("t.c"));
    let f = graph.add_node(Node::function("f", Type::parse("int")));
    graph.add_child(tu, EdgeKind::Ast, f);

    let json = serde_json::to_string(&graph).expect("graph should serialize");
    let back: PropertyGraph = serde_json::from_str(&json).expect("graph should deserialize");
    assert_eq!(back.node_count(), 2);
    assert_eq!(back.children(tu, EdgeKind::Ast), vec![f]);
}
