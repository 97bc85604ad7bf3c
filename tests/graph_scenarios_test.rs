use stratagraph::{
    Direction, Edge, ElementId, ElementKind, Graph, GraphConfig, GraphResult, PropertyValue,
    Vertex,
};

fn open(name: &str) -> Graph {
    Graph::open(GraphConfig::in_memory(name)).unwrap()
}

fn ids<E>(items: impl Iterator<Item = GraphResult<E>>, id: fn(&E) -> &ElementId) -> Vec<String> {
    let mut out: Vec<String> = items.map(|e| id(&e.unwrap()).to_string()).collect();
    out.sort();
    out
}

#[test]
fn test_create_edge_between_vertices() {
    let graph = open("scenario1");
    let a = graph.add_vertex(Some("A")).unwrap();
    let b = graph.add_vertex(Some("B")).unwrap();
    graph.add_edge(None, a.id(), b.id(), "knows").unwrap();

    let edges: Vec<Edge> = graph.edges().unwrap().collect::<GraphResult<_>>().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].out_vertex().map(|v| v.as_str()), Some("A"));
    assert_eq!(edges[0].in_vertex().map(|v| v.as_str()), Some("B"));
    assert_eq!(edges[0].label(), Some("knows"));
}

#[test]
fn test_auto_index_lookup() {
    let graph = Graph::open(GraphConfig::in_memory("scenario2").set_auto_index(true)).unwrap();
    let mut a = graph.add_vertex(Some("A")).unwrap();
    graph.add_vertex(Some("B")).unwrap();
    graph.set_property(&mut a, "name", "Alice").unwrap();

    assert_eq!(
        ids(graph.vertices_with("name", "Alice").unwrap(), Vertex::id),
        vec!["A".to_string()]
    );
    assert_eq!(graph.vertices_with("name", "Bob").unwrap().count(), 0);

    // Overwrite moves the index entry
    graph.set_property(&mut a, "name", "Bob").unwrap();
    assert_eq!(graph.vertices_with("name", "Alice").unwrap().count(), 0);
    assert_eq!(graph.vertices_with("name", "Bob").unwrap().count(), 1);
}

#[test]
fn test_remove_endpoint_vertex() {
    let graph = open("scenario3");
    let a = graph.add_vertex(Some("A")).unwrap();
    let b = graph.add_vertex(Some("B")).unwrap();
    let edge = graph.add_edge(None, a.id(), b.id(), "knows").unwrap();

    graph.remove_vertex(a.id()).unwrap();

    assert!(graph.get_edge(edge.id().clone()).unwrap().is_none());
    assert!(graph.get_vertex("B").unwrap().is_some());
    let incoming = graph.vertex_edges(b.id(), Direction::In, &[]).unwrap();
    assert!(incoming.is_empty());
    assert!(graph
        .adjacent_vertices(b.id(), Direction::Both, &[])
        .unwrap()
        .is_empty());
}

#[test]
fn test_named_index_drop_and_recreate() {
    let graph = open("scenario4");
    let e1 = graph
        .add_edge(Some("e1"), &"A".into(), &"B".into(), "knows")
        .unwrap();
    let index = graph.create_index("byLabel", ElementKind::Edge).unwrap();
    index.put("lbl", &"x".into(), e1.id()).unwrap();
    assert_eq!(index.count("lbl", &"x".into()).unwrap(), 1);

    graph.drop_index("byLabel").unwrap();
    assert!(graph.get_index("byLabel", ElementKind::Edge).unwrap().is_none());
    assert!(!graph.context().store().table_exists(index.table_name()));

    let again = graph.create_index("byLabel", ElementKind::Edge).unwrap();
    assert_eq!(again.count("lbl", &"x".into()).unwrap(), 0);
}

#[test]
fn test_scan_lookup_without_index() {
    let graph = open("scan");
    for (id, age) in [("A", 30i64), ("B", 25), ("C", 30)] {
        let mut vertex = graph.add_vertex(Some(id)).unwrap();
        graph.set_property(&mut vertex, "age", age).unwrap();
    }
    assert_eq!(
        ids(graph.vertices_with("age", 30i64).unwrap(), Vertex::id),
        vec!["A".to_string(), "C".to_string()]
    );
    // Same bytes only: a float never equals an integer
    assert_eq!(graph.vertices_with("age", 30.0).unwrap().count(), 0);

    let found: Vec<Vertex> = graph
        .vertices_with("age", 25i64)
        .unwrap()
        .collect::<GraphResult<_>>()
        .unwrap();
    assert_eq!(found[0].cached_property("age"), Some(&PropertyValue::Integer(25)));
}

#[test]
fn test_edge_properties_and_lookup() {
    let graph = open("edges");
    let mut edge = graph
        .add_edge(Some("e1"), &"A".into(), &"B".into(), "knows")
        .unwrap();
    graph.add_edge(Some("e2"), &"B".into(), &"C".into(), "knows").unwrap();
    graph.set_property(&mut edge, "since", 2020i64).unwrap();

    assert_eq!(
        ids(graph.edges_with("since", 2020i64).unwrap(), Edge::id),
        vec!["e1".to_string()]
    );
    assert_eq!(
        ids(graph.edges_with("label", "knows").unwrap(), Edge::id),
        vec!["e1".to_string(), "e2".to_string()]
    );

    let mut loaded = graph.get_edge("e1").unwrap().unwrap();
    assert_eq!(
        graph.get_property(&mut loaded, "since").unwrap(),
        Some(PropertyValue::Integer(2020))
    );
    assert_eq!(graph.property_keys(&mut loaded).unwrap(), vec!["since".to_string()]);
}

#[test]
fn test_adjacency_with_label_filter() {
    let graph = open("adjacency");
    for id in ["A", "B", "C", "D"] {
        graph.add_vertex(Some(id)).unwrap();
    }
    let a: ElementId = "A".into();
    graph.add_edge(None, &a, &"B".into(), "knows").unwrap();
    graph.add_edge(None, &a, &"C".into(), "likes").unwrap();
    graph.add_edge(None, &"D".into(), &a, "knows").unwrap();

    let out = graph.adjacent_vertices(&a, Direction::Out, &[]).unwrap();
    assert_eq!(out.len(), 2);
    let knows = graph.adjacent_vertices(&a, Direction::Both, &["knows"]).unwrap();
    let mut names: Vec<String> = knows.iter().map(|v| v.id().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["B".to_string(), "D".to_string()]);
    assert!(graph.vertex_edges(&a, Direction::Both, &["hates"]).unwrap().is_empty());
}

#[test]
fn test_buffered_writes_visible_after_flush() {
    let graph = Graph::open(GraphConfig::in_memory("buffered").set_auto_flush(false)).unwrap();
    graph.add_vertex(Some("A")).unwrap();
    assert_eq!(graph.context().pending_mutations(), 1);
    graph.flush().unwrap();
    assert_eq!(graph.context().pending_mutations(), 0);
    assert_eq!(graph.vertices().unwrap().count(), 1);
}

#[test]
fn test_summary_reports_counts() {
    let graph = open("summary");
    graph.add_edge(None, &"A".into(), &"B".into(), "knows").unwrap();
    graph.add_vertex(Some("A")).unwrap();
    graph.create_index("people", ElementKind::Vertex).unwrap();
    let summary = graph.summary().unwrap();
    assert_eq!(summary.vertex_count, 1);
    assert_eq!(summary.edge_count, 1);
    assert_eq!(summary.named_indices, vec!["people".to_string()]);
}
