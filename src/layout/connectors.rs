use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::model::{FamilyGraph, Person, PersonId};

use super::types::{
    BondKind, Connector, ConnectorKind, Couple, CoupleRect, LineStyle, PersonBox,
};

/// One directive list per layout, in draw order: each placed couple's
/// bond and child plumbing, then the unpaired-person underlines. All
/// endpoints are absolute coordinates; the renderer only strokes them.
pub(super) fn generate_connectors(
    graph: &FamilyGraph,
    couples: &[Couple],
    boxes: &BTreeMap<PersonId, PersonBox>,
    rects: &[Option<CoupleRect>],
    index: &HashMap<PersonId, &Person>,
    config: &LayoutConfig,
) -> Vec<Connector> {
    let mut connectors = Vec::new();

    for (idx, couple) in couples.iter().enumerate() {
        let Some(rect) = rects[idx] else {
            continue;
        };

        if let (Some(wife), Some(husband)) = (couple.wife, couple.husband)
            && let (Some(wife_box), Some(husband_box)) = (boxes.get(&wife), boxes.get(&husband))
        {
            let y = wife_box.y + wife_box.height / 2.0;
            let style = match couple.kind {
                BondKind::Spouse => LineStyle::Doubled,
                BondKind::ExSpouse => LineStyle::Dashed,
                // Single-parent couples never have both roles filled.
                BondKind::Single => LineStyle::Solid,
            };
            connectors.push(Connector {
                kind: ConnectorKind::CoupleBond,
                from: (wife_box.x + wife_box.width, y),
                to: (husband_box.x, y),
                style,
            });
        }

        if couple.children.is_empty() {
            continue;
        }

        let bottom = rect.y + config.person_height;
        let center_x = rect.x + rect.width / 2.0;
        let mid_y = bottom + (config.generation_gap - config.person_height) / 2.0;

        connectors.push(Connector {
            kind: ConnectorKind::ParentDrop,
            from: (center_x, bottom),
            to: (center_x, mid_y),
            style: LineStyle::Solid,
        });

        if couple.children.len() > 1
            && let (Some(leftmost), Some(rightmost)) = (
                couple.children.last().and_then(|id| boxes.get(id)),
                couple.children.first().and_then(|id| boxes.get(id)),
            )
        {
            connectors.push(Connector {
                kind: ConnectorKind::SiblingSpan,
                from: (leftmost.x + leftmost.width / 2.0, mid_y),
                to: (rightmost.x + rightmost.width / 2.0, mid_y),
                style: LineStyle::Solid,
            });
        }

        for child in &couple.children {
            let Some(child_box) = boxes.get(child) else {
                continue;
            };
            let center = child_box.x + child_box.width / 2.0;
            let adopted = index
                .get(child)
                .map(|person| person.is_adopted)
                .unwrap_or(false);
            connectors.push(Connector {
                kind: ConnectorKind::ChildDrop,
                from: (center, mid_y),
                to: (center, child_box.y),
                style: if adopted {
                    LineStyle::Doubled
                } else {
                    LineStyle::Solid
                },
            });
        }
    }

    for (id, person_box) in boxes {
        if graph.has_spousal_edge(*id) {
            continue;
        }
        let y = person_box.y + person_box.height + config.underline_offset;
        connectors.push(Connector {
            kind: ConnectorKind::UnpairedMark,
            from: (person_box.x, y),
            to: (person_box.x + person_box.width, y),
            style: LineStyle::Solid,
        });
    }

    connectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::model::{FamilyGraph, Gender, RelationKind, Relationship};

    fn person(id: PersonId, name: &str, gender: Gender, adopted: bool) -> Person {
        Person {
            id,
            name: name.to_string(),
            gender,
            birth_date: None,
            death_date: None,
            is_adopted: adopted,
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

    fn find<'a>(layout: &'a crate::layout::Layout, kind: ConnectorKind) -> Vec<&'a Connector> {
        layout
            .connectors
            .iter()
            .filter(|connector| connector.kind == kind)
            .collect()
    }

    #[test]
    fn former_spouse_bond_is_a_single_dashed_segment() {
        let graph = FamilyGraph {
            persons: vec![
                person(4, "a", Gender::Male, false),
                person(5, "b", Gender::Female, false),
            ],
            relationships: vec![edge(1, 4, 5, RelationKind::ExSpouse)],
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        let bonds = find(&layout, ConnectorKind::CoupleBond);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].style, LineStyle::Dashed);
    }

    #[test]
    fn current_spouse_bond_spans_the_inner_box_edges() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "h", Gender::Male, false),
                person(2, "w", Gender::Female, false),
            ],
            relationships: vec![edge(1, 1, 2, RelationKind::Spouse)],
        };
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let bonds = find(&layout, ConnectorKind::CoupleBond);
        assert_eq!(bonds[0].style, LineStyle::Doubled);

        let wife = &layout.boxes[&2];
        let husband = &layout.boxes[&1];
        assert_eq!(bonds[0].from, (wife.x + wife.width, wife.y + wife.height / 2.0));
        assert_eq!(bonds[0].to.0, husband.x);
    }

    #[test]
    fn adopted_child_drop_is_doubled() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "father", Gender::Male, false),
                person(2, "mother", Gender::Female, false),
                person(3, "adopted", Gender::Male, true),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ParentChild),
            ],
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        let drops = find(&layout, ConnectorKind::ChildDrop);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].style, LineStyle::Doubled);
    }

    #[test]
    fn sibling_span_only_appears_with_more_than_one_child() {
        let one_child = FamilyGraph {
            persons: vec![
                person(1, "f", Gender::Male, false),
                person(2, "m", Gender::Female, false),
                person(3, "c", Gender::Male, false),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ParentChild),
            ],
        };
        let layout = compute_layout(&one_child, &LayoutConfig::default());
        assert!(find(&layout, ConnectorKind::SiblingSpan).is_empty());
        assert_eq!(find(&layout, ConnectorKind::ParentDrop).len(), 1);

        let mut two_children = one_child.clone();
        two_children
            .persons
            .push(person(4, "c2", Gender::Female, false));
        two_children
            .relationships
            .push(edge(3, 1, 4, RelationKind::ParentChild));
        let layout = compute_layout(&two_children, &LayoutConfig::default());
        let spans = find(&layout, ConnectorKind::SiblingSpan);
        assert_eq!(spans.len(), 1);
        // Horizontal, on the midline between the generations.
        assert_eq!(spans[0].from.1, spans[0].to.1);
    }

    #[test]
    fn spouseless_people_get_an_underline() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "parent", Gender::Female, false),
                person(2, "child", Gender::Male, false),
            ],
            relationships: vec![edge(1, 1, 2, RelationKind::ParentChild)],
        };
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let marks = find(&layout, ConnectorKind::UnpairedMark);
        // Neither the single parent nor the child has a spousal edge.
        assert_eq!(marks.len(), 2);
        let child_box = &layout.boxes[&2];
        assert!(marks.iter().any(|mark| {
            mark.from
                == (
                    child_box.x,
                    child_box.y + child_box.height + config.underline_offset,
                )
        }));
    }

    #[test]
    fn parent_drop_starts_at_the_couple_bottom_center() {
        let graph = FamilyGraph {
            persons: vec![
                person(1, "f", Gender::Male, false),
                person(2, "m", Gender::Female, false),
                person(3, "c", Gender::Male, false),
            ],
            relationships: vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ParentChild),
            ],
        };
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let drops = find(&layout, ConnectorKind::ParentDrop);
        let wife = &layout.boxes[&2];
        let expected_center = wife.x + (config.person_width * 2.0 + config.couple_gap) / 2.0;
        assert_eq!(drops[0].from, (expected_center, wife.y + config.person_height));
        assert!(drops[0].to.1 > drops[0].from.1);
    }
}
