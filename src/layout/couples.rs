use std::collections::{HashMap, HashSet};

use crate::model::{FamilyGraph, Gender, Person, PersonId, RelationKind};

use super::types::{BondKind, Couple};

fn pair_key(a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Role precedence, first match wins: mixed genders put the male in the
/// husband slot; a single known male takes it; a single known female
/// pushes the other person into it; with neither known, person1 is the
/// husband so the outcome stays deterministic.
fn assign_roles(p1: &Person, p2: &Person) -> (PersonId, PersonId) {
    match (p1.gender, p2.gender) {
        (Gender::Male, Gender::Female) => (p1.id, p2.id),
        (Gender::Female, Gender::Male) => (p2.id, p1.id),
        (Gender::Male, _) => (p1.id, p2.id),
        (_, Gender::Male) => (p2.id, p1.id),
        (Gender::Female, _) => (p2.id, p1.id),
        (_, Gender::Female) => (p1.id, p2.id),
        _ => (p1.id, p2.id),
    }
}

/// One Couple per distinct spousal pair, in edge-encounter order.
/// Edges with an unresolvable endpoint produce nothing, and a later
/// duplicate edge over the same pair is ignored.
pub(super) fn extract_couples(
    graph: &FamilyGraph,
    index: &HashMap<PersonId, &Person>,
) -> Vec<Couple> {
    let mut couples = Vec::new();
    let mut processed: HashSet<(PersonId, PersonId)> = HashSet::new();

    for rel in &graph.relationships {
        if !rel.kind.is_spousal() || rel.person1_id == rel.person2_id {
            continue;
        }
        let key = pair_key(rel.person1_id, rel.person2_id);
        if processed.contains(&key) {
            continue;
        }
        let (Some(p1), Some(p2)) = (index.get(&rel.person1_id), index.get(&rel.person2_id))
        else {
            continue;
        };

        let (husband, wife) = assign_roles(p1, p2);
        let kind = if rel.kind == RelationKind::Spouse {
            BondKind::Spouse
        } else {
            BondKind::ExSpouse
        };
        couples.push(Couple {
            husband: Some(husband),
            wife: Some(wife),
            kind,
            children: Vec::new(),
        });
        processed.insert(key);
    }

    couples
}

fn is_single_parent_of(couple: &Couple, parent: PersonId) -> bool {
    (couple.husband == Some(parent) && couple.wife.is_none())
        || (couple.wife == Some(parent) && couple.husband.is_none())
}

/// Attach each child to the first couple (in current list order) that
/// contains one of its listed parents. Children whose parents match no
/// couple get a single-parent Couple, reused across siblings. Children
/// whose first parent cannot be resolved are dropped.
pub(super) fn assign_children(
    graph: &FamilyGraph,
    index: &HashMap<PersonId, &Person>,
    couples: &mut Vec<Couple>,
) {
    let mut order: Vec<PersonId> = Vec::new();
    let mut parents: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
    for rel in &graph.relationships {
        if rel.kind != RelationKind::ParentChild || rel.person1_id == rel.person2_id {
            continue;
        }
        parents
            .entry(rel.person2_id)
            .or_insert_with(|| {
                order.push(rel.person2_id);
                Vec::new()
            })
            .push(rel.person1_id);
    }

    for child in order {
        if !index.contains_key(&child) {
            continue;
        }
        let parent_ids = &parents[&child];

        let mut attached = false;
        for couple in couples.iter_mut() {
            // A couple never lists one of its own members as a child.
            if couple.contains(child) {
                continue;
            }
            if parent_ids.iter().any(|pid| couple.contains(*pid)) {
                if !couple.children.contains(&child) {
                    couple.children.push(child);
                }
                attached = true;
                break;
            }
        }
        if attached {
            continue;
        }

        let parent_id = parent_ids[0];
        let Some(parent) = index.get(&parent_id) else {
            continue;
        };

        let slot = couples
            .iter()
            .position(|couple| is_single_parent_of(couple, parent_id));
        let slot = match slot {
            Some(idx) => idx,
            None => {
                let couple = if parent.gender == Gender::Female {
                    Couple {
                        husband: None,
                        wife: Some(parent_id),
                        kind: BondKind::Single,
                        children: Vec::new(),
                    }
                } else {
                    Couple {
                        husband: Some(parent_id),
                        wife: None,
                        kind: BondKind::Single,
                        children: Vec::new(),
                    }
                };
                couples.push(couple);
                couples.len() - 1
            }
        };
        if !couples[slot].children.contains(&child) {
            couples[slot].children.push(child);
        }
    }
}

fn birth_key<'a>(index: &HashMap<PersonId, &'a Person>, id: PersonId) -> &'a str {
    index
        .get(&id)
        .and_then(|person| person.birth_date.as_deref())
        .unwrap_or("")
}

/// Stable ascending sort by birth marker; a missing marker sorts first
/// as the empty string.
pub(super) fn sort_siblings(couples: &mut [Couple], index: &HashMap<PersonId, &Person>) {
    for couple in couples.iter_mut() {
        couple
            .children
            .sort_by(|a, b| birth_key(index, *a).cmp(birth_key(index, *b)));
    }
}

/// Couples whose filled roles are nobody's child. Falls back to the
/// first `min(fallback_limit, n)` couples so something always renders.
pub(super) fn detect_roots(couples: &[Couple], fallback_limit: usize) -> Vec<usize> {
    let child_ids: HashSet<PersonId> = couples
        .iter()
        .flat_map(|couple| couple.children.iter().copied())
        .collect();

    let roots: Vec<usize> = couples
        .iter()
        .enumerate()
        .filter(|(_, couple)| !couple.members().any(|member| child_ids.contains(&member)))
        .map(|(idx, _)| idx)
        .collect();

    if roots.is_empty() {
        (0..couples.len().min(fallback_limit)).collect()
    } else {
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relationship;

    fn person(id: PersonId, name: &str, gender: Gender, birth: Option<&str>) -> Person {
        Person {
            id,
            name: name.to_string(),
            gender,
            birth_date: birth.map(|value| value.to_string()),
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

    fn build(persons: Vec<Person>, relationships: Vec<Relationship>) -> FamilyGraph {
        FamilyGraph {
            persons,
            relationships,
        }
    }

    #[test]
    fn male_female_pair_assigns_roles_by_gender() {
        let graph = build(
            vec![
                person(1, "Hanako", Gender::Female, None),
                person(2, "Taro", Gender::Male, None),
            ],
            vec![edge(1, 1, 2, RelationKind::Spouse)],
        );
        let couples = extract_couples(&graph, &graph.person_index());
        assert_eq!(couples.len(), 1);
        assert_eq!(couples[0].husband, Some(2));
        assert_eq!(couples[0].wife, Some(1));
        assert_eq!(couples[0].kind, BondKind::Spouse);
    }

    #[test]
    fn unknown_genders_fall_back_to_edge_order() {
        let graph = build(
            vec![
                person(1, "a", Gender::Unknown, None),
                person(2, "b", Gender::Unknown, None),
            ],
            vec![edge(1, 1, 2, RelationKind::Spouse)],
        );
        let couples = extract_couples(&graph, &graph.person_index());
        assert_eq!(couples[0].husband, Some(1));
        assert_eq!(couples[0].wife, Some(2));
    }

    #[test]
    fn single_known_female_takes_wife_slot() {
        let graph = build(
            vec![
                person(1, "a", Gender::Female, None),
                person(2, "b", Gender::Unknown, None),
            ],
            vec![edge(1, 1, 2, RelationKind::Spouse)],
        );
        let couples = extract_couples(&graph, &graph.person_index());
        assert_eq!(couples[0].husband, Some(2));
        assert_eq!(couples[0].wife, Some(1));
    }

    #[test]
    fn duplicate_spousal_edges_produce_one_couple() {
        let graph = build(
            vec![
                person(1, "a", Gender::Male, None),
                person(2, "b", Gender::Female, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 2, 1, RelationKind::Spouse),
                edge(3, 1, 2, RelationKind::ExSpouse),
            ],
        );
        let couples = extract_couples(&graph, &graph.person_index());
        assert_eq!(couples.len(), 1);
    }

    #[test]
    fn edges_with_missing_endpoints_are_ignored() {
        let graph = build(
            vec![person(1, "a", Gender::Male, None)],
            vec![
                edge(1, 1, 99, RelationKind::Spouse),
                edge(2, 1, 1, RelationKind::Spouse),
            ],
        );
        let couples = extract_couples(&graph, &graph.person_index());
        assert!(couples.is_empty());
    }

    #[test]
    fn child_attaches_to_first_matching_couple() {
        let graph = build(
            vec![
                person(1, "father", Gender::Male, None),
                person(2, "mother", Gender::Female, None),
                person(3, "stepmother", Gender::Female, None),
                person(4, "child", Gender::Male, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 3, RelationKind::ExSpouse),
                edge(3, 1, 4, RelationKind::ParentChild),
            ],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        assert_eq!(couples[0].children, vec![4]);
        assert!(couples[1].children.is_empty());
    }

    #[test]
    fn lone_parent_gets_a_synthesized_couple_reused_for_siblings() {
        let graph = build(
            vec![
                person(1, "mother", Gender::Female, None),
                person(2, "first", Gender::Male, None),
                person(3, "second", Gender::Female, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::ParentChild),
                edge(2, 1, 3, RelationKind::ParentChild),
            ],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);

        assert_eq!(couples.len(), 1);
        assert_eq!(couples[0].wife, Some(1));
        assert_eq!(couples[0].husband, None);
        assert_eq!(couples[0].kind, BondKind::Single);
        assert_eq!(couples[0].children, vec![2, 3]);
    }

    #[test]
    fn unknown_gender_parent_takes_the_husband_slot() {
        let graph = build(
            vec![
                person(1, "parent", Gender::Unknown, None),
                person(2, "child", Gender::Unknown, None),
            ],
            vec![edge(1, 1, 2, RelationKind::ParentChild)],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        assert_eq!(couples[0].husband, Some(1));
        assert_eq!(couples[0].wife, None);
    }

    #[test]
    fn child_of_unresolvable_parent_is_dropped() {
        let graph = build(
            vec![person(2, "child", Gender::Male, None)],
            vec![edge(1, 99, 2, RelationKind::ParentChild)],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        assert!(couples.is_empty());
    }

    #[test]
    fn couple_never_adopts_its_own_member() {
        let graph = build(
            vec![
                person(1, "a", Gender::Male, None),
                person(2, "b", Gender::Female, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 1, 2, RelationKind::ParentChild),
            ],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);

        assert!(couples[0].children.is_empty());
        // The child lands under a synthesized single-parent couple instead.
        assert_eq!(couples.len(), 2);
        assert_eq!(couples[1].husband, Some(1));
        assert_eq!(couples[1].children, vec![2]);
    }

    #[test]
    fn siblings_sort_ascending_with_missing_birth_first() {
        let graph = build(
            vec![
                person(1, "father", Gender::Male, None),
                person(2, "late", Gender::Male, Some("1980-05-01")),
                person(3, "early", Gender::Female, Some("1975-01-01")),
                person(4, "undated", Gender::Unknown, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::ParentChild),
                edge(2, 1, 3, RelationKind::ParentChild),
                edge(3, 1, 4, RelationKind::ParentChild),
            ],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        sort_siblings(&mut couples, &index);
        assert_eq!(couples[0].children, vec![4, 3, 2]);
    }

    #[test]
    fn roots_exclude_couples_built_on_children() {
        let graph = build(
            vec![
                person(1, "grandfather", Gender::Male, None),
                person(2, "grandmother", Gender::Female, None),
                person(3, "son", Gender::Male, None),
                person(4, "daughter_in_law", Gender::Female, None),
            ],
            vec![
                edge(1, 1, 2, RelationKind::Spouse),
                edge(2, 3, 4, RelationKind::Spouse),
                edge(3, 1, 3, RelationKind::ParentChild),
            ],
        );
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        let roots = detect_roots(&couples, 3);
        assert_eq!(roots, vec![0]);
    }

    #[test]
    fn root_fallback_is_bounded() {
        let mut persons = Vec::new();
        let mut relationships = Vec::new();
        // Four couples forming a parent cycle so nobody qualifies as root.
        for i in 0..4i64 {
            persons.push(person(i * 2 + 1, "h", Gender::Male, None));
            persons.push(person(i * 2 + 2, "w", Gender::Female, None));
            relationships.push(edge(i + 1, i * 2 + 1, i * 2 + 2, RelationKind::Spouse));
        }
        for i in 0..4i64 {
            let parent = i * 2 + 1;
            let child = ((i + 1) % 4) * 2 + 1;
            relationships.push(edge(10 + i, parent, child, RelationKind::ParentChild));
        }
        let graph = build(persons, relationships);
        let index = graph.person_index();
        let mut couples = extract_couples(&graph, &index);
        assign_children(&graph, &index, &mut couples);
        let roots = detect_roots(&couples, 3);
        assert_eq!(roots, vec![0, 1, 2]);
    }
}
