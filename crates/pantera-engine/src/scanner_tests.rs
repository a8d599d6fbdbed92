use super::*;
use pantera_protocols::replay::{MemoryTree, ScreenNode};
use pantera_protocols::ScopedTree;

fn markers() -> MarkerSet {
    MarkerSet::new(["km", "$", "precio", "destino"])
}

fn offer_list() -> ScreenNode {
    ScreenNode::new().with_id("root").children([
        ScreenNode::new().with_id("header").child(ScreenNode::text("Ofertas")),
        ScreenNode::new().with_id("card-1").children([
            ScreenNode::text("5.2 km, $220").with_id("trip-1"),
            ScreenNode::text("Destino: Polanco").with_id("dest-1"),
        ]),
        ScreenNode::null(),
        ScreenNode::new()
            .with_id("card-2")
            .child(ScreenNode::text("3 KM · $150").with_id("trip-2")),
        ScreenNode::text("Precio sugerido").with_id("footer"),
    ])
}

/// Expected scan output computed from the declarative tree.
fn expected_matches(node: &ScreenNode, markers: &MarkerSet, out: &mut Vec<String>) {
    if node.missing || node.broken {
        return;
    }
    if let Some(text) = &node.text {
        if markers.matches(text) {
            out.push(text.clone());
        }
    }
    for child in &node.children {
        expected_matches(child, markers, out);
    }
}

#[test]
fn test_scan_yields_matches_in_depth_first_order() {
    let screen = offer_list();
    let mut tree = MemoryTree::new(screen.clone());
    let scanner = TreeScanner::new(markers());

    let root = tree.fetch_root().unwrap();
    let found: Vec<String> = scanner.scan(root).map(|c| c.text).collect();

    let mut expected = Vec::new();
    expected_matches(&screen, &markers(), &mut expected);
    assert_eq!(found, expected);
    assert_eq!(
        found,
        vec!["5.2 km, $220", "Destino: Polanco", "3 KM · $150", "Precio sugerido"]
    );
}

#[test]
fn test_scan_exact_set_for_nested_trees() {
    let screen = ScreenNode::new().children([
        ScreenNode::text("a").children([
            ScreenNode::text("b $1").child(ScreenNode::text("c 2km")),
            ScreenNode::text("d"),
        ]),
        ScreenNode::text("e precio").child(ScreenNode::new().child(ScreenNode::text("f $"))),
    ]);
    let mut tree = MemoryTree::new(screen.clone());
    let scanner = TreeScanner::new(markers());

    let root = tree.fetch_root().unwrap();
    let found: Vec<String> = scanner.scan(root).map(|c| c.text).collect();

    let mut expected = Vec::new();
    expected_matches(&screen, &markers(), &mut expected);
    assert_eq!(found, expected);
    assert_eq!(found, vec!["b $1", "c 2km", "e precio", "f $"]);
}

#[test]
fn test_textless_nodes_are_descended() {
    let screen = ScreenNode::new().child(
        ScreenNode::new().child(ScreenNode::new().child(ScreenNode::text("deep 9 km"))),
    );
    let mut tree = MemoryTree::new(screen);
    let scanner = TreeScanner::new(markers());
    let root = tree.fetch_root().unwrap();
    assert_eq!(scanner.scan(root).count(), 1);
}

#[test]
fn test_broken_subtree_is_isolated() {
    let screen = ScreenNode::new().children([
        ScreenNode::text("1 km $10")
            .broken()
            .child(ScreenNode::text("hidden 2 km")),
        ScreenNode::text("2 km $20"),
        ScreenNode::null(),
        ScreenNode::text("3 km $30"),
    ]);
    let mut tree = MemoryTree::new(screen);
    let scanner = TreeScanner::new(markers());

    let root = tree.fetch_root().unwrap();
    let mut scan = scanner.scan(root);
    let found: Vec<String> = scan.by_ref().map(|c| c.text).collect();
    assert_eq!(found, vec!["2 km $20", "3 km $30"]);
    assert_eq!(scan.errors(), 1);
    assert_eq!(scan.visited(), 3);
}

#[test]
fn test_scan_is_lazy() {
    let mut tree = MemoryTree::new(offer_list());
    let observer = tree.clone();
    let scanner = TreeScanner::new(markers());

    let root = tree.fetch_root().unwrap();
    let mut scan = scanner.scan(root);
    let first = scan.next().unwrap();
    assert_eq!(first.text, "5.2 km, $220");
    // Only the unvisited frontier and the yielded node are alive.
    assert!(observer.live_handles() < 8);
    drop(first);
    drop(scan);
    assert_eq!(observer.live_handles(), 0);
}

#[test]
fn test_handles_released_after_full_scan() {
    let mut tree = MemoryTree::new(offer_list());
    let observer = tree.clone();
    let scanner = TreeScanner::new(markers());
    {
        let root = tree.fetch_root().unwrap();
        let count = scanner.scan(root).count();
        assert_eq!(count, 4);
    }
    assert_eq!(observer.live_handles(), 0);
}

#[test]
fn test_candidate_node_is_live() {
    let mut tree = MemoryTree::new(offer_list());
    let scanner = TreeScanner::new(markers());
    let root = tree.fetch_root().unwrap();
    let candidate = scanner.scan(root).next().unwrap();
    let parent = candidate.node.parent().unwrap().unwrap();
    assert_eq!(parent.child_count().unwrap(), 2);
}

#[test]
fn test_find_first_by_predicate() {
    let screen = ScreenNode::new().children([
        ScreenNode::text("Tu oferta"),
        ScreenNode::new()
            .with_class("android.widget.EditText")
            .editable()
            .with_id("price"),
        ScreenNode::new().with_class("android.widget.EditText").editable(),
    ]);
    let mut tree = MemoryTree::new(screen);
    let root = tree.fetch_root().unwrap();
    let field = find_first(root, |v| v.node.is_editable().unwrap_or(false)).unwrap();
    assert!(field.set_text("150").unwrap());
    drop(field);
    assert_eq!(tree.entered_text(), vec!["150".to_string()]);
}

#[test]
fn test_find_first_none() {
    let mut tree = MemoryTree::new(offer_list());
    let root = tree.fetch_root().unwrap();
    assert!(find_first(root, |v| v.text.as_deref() == Some("nope")).is_none());
}
