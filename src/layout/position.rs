use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::model::{Person, PersonId};

use super::types::{Couple, CoupleRect, PersonBox};

/// Place a person box unless the id already holds a position.
/// Coordinates are final once assigned.
fn place(
    boxes: &mut BTreeMap<PersonId, PersonBox>,
    index: &HashMap<PersonId, &Person>,
    id: PersonId,
    x: f32,
    y: f32,
    config: &LayoutConfig,
) {
    if boxes.contains_key(&id) {
        return;
    }
    let Some(person) = index.get(&id) else {
        return;
    };
    boxes.insert(
        id,
        PersonBox {
            id,
            name: person.name.clone(),
            gender: person.gender,
            x,
            y,
            width: config.person_width,
            height: config.person_height,
        },
    );
}

/// Children sit one generation below, centered under the couple
/// midpoint, in reverse sibling order so the oldest lands rightmost.
fn place_children(
    idx: usize,
    couples: &[Couple],
    boxes: &mut BTreeMap<PersonId, PersonBox>,
    rects: &[Option<CoupleRect>],
    index: &HashMap<PersonId, &Person>,
    config: &LayoutConfig,
) {
    let Some(rect) = rects[idx] else {
        return;
    };
    let couple = &couples[idx];
    if couple.children.is_empty() {
        return;
    }

    let child_y = rect.y + config.generation_gap;
    let count = couple.children.len() as f32;
    let total = count * config.person_width + (count - 1.0) * config.sibling_gap;
    let mut child_x = rect.x + rect.width / 2.0 - total / 2.0;

    for child in couple.children.iter().rev() {
        place(boxes, index, *child, child_x, child_y, config);
        child_x += config.person_width + config.sibling_gap;
    }
}

fn place_couple_at(
    idx: usize,
    x: f32,
    y: f32,
    couples: &[Couple],
    boxes: &mut BTreeMap<PersonId, PersonBox>,
    rects: &mut Vec<Option<CoupleRect>>,
    index: &HashMap<PersonId, &Person>,
    config: &LayoutConfig,
) {
    let couple = &couples[idx];
    let width = match (couple.wife, couple.husband) {
        (Some(wife), Some(husband)) => {
            place(boxes, index, wife, x, y, config);
            place(
                boxes,
                index,
                husband,
                x + config.person_width + config.couple_gap,
                y,
                config,
            );
            config.person_width * 2.0 + config.couple_gap
        }
        (Some(only), None) | (None, Some(only)) => {
            place(boxes, index, only, x, y, config);
            config.person_width
        }
        (None, None) => config.person_width,
    };
    rects[idx] = Some(CoupleRect { x, y, width });
    place_children(idx, couples, boxes, rects, index, config);
}

/// A couple whose member already holds a position (a placed child of an
/// earlier generation) inherits that member's column; the other spouse
/// fills the adjacent slot. Returns false when neither member is
/// placed yet.
fn place_inherited(
    idx: usize,
    couples: &[Couple],
    boxes: &mut BTreeMap<PersonId, PersonBox>,
    rects: &mut Vec<Option<CoupleRect>>,
    index: &HashMap<PersonId, &Person>,
    config: &LayoutConfig,
) -> bool {
    let couple = &couples[idx];
    let wife_pos = couple
        .wife
        .and_then(|id| boxes.get(&id).map(|b| (b.x, b.y)));
    let husband_pos = couple
        .husband
        .and_then(|id| boxes.get(&id).map(|b| (b.x, b.y)));

    let rect = match (wife_pos, husband_pos) {
        (Some(wife), Some(husband)) => {
            // Both spouses were already placed elsewhere; the rect spans
            // them and neither box moves.
            let x = wife.0.min(husband.0);
            let width = wife.0.max(husband.0) + config.person_width - x;
            CoupleRect { x, y: wife.1, width }
        }
        (Some((wx, wy)), None) => {
            if let Some(husband) = couple.husband {
                place(
                    boxes,
                    index,
                    husband,
                    wx + config.person_width + config.couple_gap,
                    wy,
                    config,
                );
                CoupleRect {
                    x: wx,
                    y: wy,
                    width: config.person_width * 2.0 + config.couple_gap,
                }
            } else {
                CoupleRect {
                    x: wx,
                    y: wy,
                    width: config.person_width,
                }
            }
        }
        (None, Some((hx, hy))) => {
            if let Some(wife) = couple.wife {
                let wx = hx - config.person_width - config.couple_gap;
                place(boxes, index, wife, wx, hy, config);
                CoupleRect {
                    x: wx,
                    y: hy,
                    width: config.person_width * 2.0 + config.couple_gap,
                }
            } else {
                CoupleRect {
                    x: hx,
                    y: hy,
                    width: config.person_width,
                }
            }
        }
        (None, None) => return false,
    };

    rects[idx] = Some(rect);
    place_children(idx, couples, boxes, rects, index, config);
    true
}

/// Roots go left-to-right on a horizontal cursor; every following
/// generation is placed by repeated passes until no unplaced couple has
/// a placed member. Couples disconnected from every root stay
/// unplaced.
pub(super) fn place_couples(
    couples: &[Couple],
    roots: &[usize],
    index: &HashMap<PersonId, &Person>,
    config: &LayoutConfig,
) -> (BTreeMap<PersonId, PersonBox>, Vec<Option<CoupleRect>>) {
    let mut boxes = BTreeMap::new();
    let mut rects: Vec<Option<CoupleRect>> = vec![None; couples.len()];

    let mut cursor = config.margin_left;
    for &root in roots {
        place_couple_at(
            root,
            cursor,
            config.margin_top,
            couples,
            &mut boxes,
            &mut rects,
            index,
            config,
        );
        if let Some(rect) = rects[root] {
            cursor = rect.x + rect.width + config.root_gap;
        }
    }

    loop {
        let mut progressed = false;
        for idx in 0..couples.len() {
            if rects[idx].is_some() {
                continue;
            }
            if place_inherited(idx, couples, &mut boxes, &mut rects, index, config) {
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    (boxes, rects)
}
