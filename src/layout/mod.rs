mod connectors;
mod couples;
mod position;
pub(crate) mod types;

pub use types::*;

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::model::{FamilyGraph, PersonId};

/// Pure layout pipeline: index people, derive the couple partition,
/// order siblings, pick roots, position every box, emit connector
/// directives. Never mutates its input and never fails on malformed
/// graph data; edges referencing unknown people are simply dropped.
pub fn compute_layout(graph: &FamilyGraph, config: &LayoutConfig) -> Layout {
    let index = graph.person_index();

    let mut couples = couples::extract_couples(graph, &index);
    couples::assign_children(graph, &index, &mut couples);
    couples::sort_siblings(&mut couples, &index);

    if graph.persons.is_empty() {
        return placeholder_layout(&config.no_people_message, config);
    }
    if couples.is_empty() {
        return placeholder_layout(&config.no_couples_message, config);
    }

    let roots = couples::detect_roots(&couples, config.fallback_root_limit);
    let (boxes, rects) = position::place_couples(&couples, &roots, &index, config);
    let connectors =
        connectors::generate_connectors(graph, &couples, &boxes, &rects, &index, config);

    let (offset_x, offset_y, width, height) = bounds(&boxes, &connectors, config);

    Layout {
        boxes,
        couples,
        roots,
        connectors,
        placeholder: None,
        offset_x,
        offset_y,
        width,
        height,
    }
}

fn placeholder_layout(message: &str, config: &LayoutConfig) -> Layout {
    Layout {
        boxes: BTreeMap::new(),
        couples: Vec::new(),
        roots: Vec::new(),
        connectors: Vec::new(),
        placeholder: Some(PlaceholderLayout {
            message: message.to_string(),
            x: config.placeholder_width / 2.0,
            y: config.placeholder_height / 2.0,
            text_size: config.placeholder_text_size,
        }),
        offset_x: 0.0,
        offset_y: 0.0,
        width: config.placeholder_width,
        height: config.placeholder_height,
    }
}

fn bounds(
    boxes: &BTreeMap<PersonId, PersonBox>,
    connectors: &[Connector],
    config: &LayoutConfig,
) -> (f32, f32, f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for person_box in boxes.values() {
        min_x = min_x.min(person_box.x);
        min_y = min_y.min(person_box.y);
        max_x = max_x.max(person_box.x + person_box.width);
        max_y = max_y.max(person_box.y + person_box.height);
    }
    for connector in connectors {
        for point in [connector.from, connector.to] {
            min_x = min_x.min(point.0);
            min_y = min_y.min(point.1);
            max_x = max_x.max(point.0);
            max_y = max_y.max(point.1);
        }
    }

    if min_x == f32::MAX {
        return (0.0, 0.0, 1.0, 1.0);
    }

    // Married-in spouses can land left of or above the origin; the
    // viewbox offset absorbs that instead of shifting placed nodes.
    let offset_x = (min_x - config.bounds_margin).min(0.0);
    let offset_y = (min_y - config.bounds_margin).min(0.0);
    let width = max_x + config.bounds_margin - offset_x;
    let height = max_y + config.bounds_margin - offset_y;
    (offset_x, offset_y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Person, RelationKind, Relationship};

    fn person(id: PersonId, name: &str, gender: Gender) -> Person {
        Person {
            id,
            name: name.to_string(),
            gender,
            birth_date: None,
            death_date: None,
            is_adopted: false,
            notes: None,
        }
    }

    fn edge(id: i64, from: PersonId, to: PersonId, kind: RelationKind) -> Relationship {
        Relationship {
            id,
            person1_id: from,
            person2_id: to,
            kind,
        }
    }

    #[test]
    fn empty_input_yields_the_no_people_placeholder() {
        let config = LayoutConfig::default();
        let layout = compute_layout(&FamilyGraph::default(), &config);
        assert!(layout.is_empty());
        let placeholder = layout.placeholder.unwrap();
        assert_eq!(placeholder.message, config.no_people_message);
    }

    #[test]
    fn isolated_people_yield_the_no_couples_placeholder() {
        let graph = FamilyGraph {
            persons: vec![person(1, "a", Gender::Male), person(2, "b", Gender::Female)],
            relationships: Vec::new(),
        };
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        assert!(layout.is_empty());
        let placeholder = layout.placeholder.unwrap();
        assert_eq!(placeholder.message, config.no_couples_message);
    }

    #[test]
    fn child_edge_to_missing_parent_leaves_the_rest_intact() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "h", Gender::Male),
                person(2, "w", Gender::Female),
                person(3, "orphan", Gender::Male),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 99, 3, RelationKind::ParentChild),
            ],
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        assert!(layout.boxes.contains_key(&1));
        assert!(layout.boxes.contains_key(&2));
        assert!(!layout.boxes.contains_key(&3));
        assert!(layout.placeholder.is_none());
    }

    #[test]
    fn self_referential_edges_are_ignored() {
        let graph = FamilyGraph {
            persons: vec![person(1, "a", Gender::Male), person(2, "b", Gender::Female)],
            relationships: vec![
                edge(1, 1, 1, RelationKind::Spouse),
                edge(2, 1, 2, RelationKind::Spouse),
                edge(3, 2, 2, RelationKind::ParentChild),
            ],
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        assert_eq!(layout.couples.len(), 1);
        assert!(layout.couples[0].children.is_empty());
    }

    #[test]
    fn identical_inputs_yield_identical_layouts() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "h", Gender::Male),
                person(2, "w", Gender::Female),
                person(3, "c1", Gender::Male),
                person(4, "c2", Gender::Female),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ParentChild),
                edge(3, 2, 4, RelationKind::ParentChild),
            ],
        };
        let config = LayoutConfig::default();
        let first = compute_layout(&graph, &config);
        let second = compute_layout(&graph, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn bounds_cover_every_box_and_connector() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "h", Gender::Male),
                person(2, "w", Gender::Female),
                person(3, "c", Gender::Male),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ParentChild),
            ],
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        for person_box in layout.boxes.values() {
            assert!(person_box.x >= layout.offset_x);
            assert!(person_box.x + person_box.width <= layout.offset_x + layout.width);
            assert!(person_box.y + person_box.height <= layout.offset_y + layout.height);
        }
        for connector in &layout.connectors {
            for point in [connector.from, connector.to] {
                assert!(point.0 >= layout.offset_x);
                assert!(point.0 <= layout.offset_x + layout.width);
                assert!(point.1 <= layout.offset_y + layout.height);
            }
        }
    }
}
