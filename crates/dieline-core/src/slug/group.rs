use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::Element;
use crate::model::{Point, Rect};

/// Identity of a slug: a shared group id, or a lone element's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum GroupKey {
    Id(u32),
    Single(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Id(id) => write!(f, "group {id}"),
            GroupKey::Single(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupMember {
    pub element: Element,
    /// Bottom-left corner relative to the group's bounding box.
    pub offset: Point,
}

/// Elements that travel together onto one slug, keeping their relative layout.
#[derive(Debug, Clone)]
pub struct ElementGroup {
    pub key: GroupKey,
    pub bounds: Rect,
    pub members: Vec<GroupMember>,
}

impl ElementGroup {
    /// `elements` must not be empty.
    fn new(key: GroupKey, elements: Vec<Element>) -> Self {
        let bounds = elements
            .iter()
            .map(Element::bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let members = elements
            .into_iter()
            .map(|element| GroupMember {
                offset: Point::new(
                    element.position.x - bounds.x,
                    element.position.y - bounds.y,
                ),
                element,
            })
            .collect();
        Self {
            key,
            bounds,
            members,
        }
    }

    pub fn width(&self) -> f64 {
        self.bounds.w
    }

    pub fn height(&self) -> f64 {
        self.bounds.h
    }
}

/// Splits non-margin elements into groups: grouped ones first, in order of
/// first appearance of their id, then one singleton per ungrouped element.
pub fn partition(elements: &[Element]) -> Vec<ElementGroup> {
    let mut ids: Vec<u32> = Vec::new();
    let mut grouped: Vec<Vec<Element>> = Vec::new();
    let mut singles: Vec<Element> = Vec::new();
    for element in elements.iter().filter(|e| !e.is_margin()) {
        match element.group_id {
            Some(id) => match ids.iter().position(|&g| g == id) {
                Some(i) => grouped[i].push(element.clone()),
                None => {
                    ids.push(id);
                    grouped.push(vec![element.clone()]);
                }
            },
            None => singles.push(element.clone()),
        }
    }

    let mut groups: Vec<ElementGroup> = ids
        .into_iter()
        .zip(grouped)
        .map(|(id, members)| ElementGroup::new(GroupKey::Id(id), members))
        .collect();
    groups.extend(
        singles
            .into_iter()
            .map(|e| ElementGroup::new(GroupKey::Single(e.name.clone()), vec![e])),
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_zero_is_a_real_group() {
        let els = vec![
            Element::new("a", 2.0, 3.0, 1.0, 1.0).with_group(0),
            Element::new("lone", 0.0, 0.0, 5.0, 5.0),
            Element::new("b", 4.0, 1.0, 1.0, 1.0).with_group(0),
            Element::margin("Left", 0.0, 0.0, 1.0, 10.0),
        ];
        let groups = partition(&els);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, GroupKey::Id(0));
        assert_eq!(groups[0].bounds, Rect::new(2.0, 1.0, 3.0, 3.0));
        assert_eq!(groups[0].members[0].offset, Point::new(0.0, 2.0));
        assert_eq!(groups[0].members[1].offset, Point::new(2.0, 0.0));
        assert_eq!(groups[1].key, GroupKey::Single("lone".into()));
    }
}
