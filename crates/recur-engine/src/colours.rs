//! Selection colours of groups and frames.
//!
//! Every fill and stroke in a container's subtree is flattened into one
//! list of [`ColourEntry`] slots: descendants in depth-first pre-order, each
//! contributing its fills then its strokes. Solid colours with the same
//! quantised RGB are linked so one instruction drives all of them.

use crate::edits::PaintEdit;
use recur_core::{ColorStop, GradientKind, ImageFilters, NodeIndex, Paint, Rgba, SceneGraph};
use std::collections::{BTreeMap, HashMap};

/// One flattened paint. Solids carry their opacity as alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum ColourEntry {
    Solid(Rgba),
    Gradient {
        kind: GradientKind,
        stops: Vec<ColorStop>,
    },
    Image {
        filters: ImageFilters,
        opacity: f64,
    },
}

impl From<&Paint> for ColourEntry {
    fn from(paint: &Paint) -> Self {
        match paint {
            Paint::Solid { color, opacity } => {
                ColourEntry::Solid(Rgba::new(color.r, color.g, color.b, *opacity))
            }
            Paint::Gradient { kind, stops } => ColourEntry::Gradient {
                kind: *kind,
                stops: stops.clone(),
            },
            Paint::Image { filters, opacity } => ColourEntry::Image {
                filters: *filters,
                opacity: *opacity,
            },
        }
    }
}

impl ColourEntry {
    /// Quantised RGB used to find duplicates. Only solids have one.
    pub fn dedup_key(&self) -> Option<String> {
        match self {
            ColourEntry::Solid(c) => Some(
                [c.r, c.g, c.b]
                    .map(|channel| (channel * 255.0).floor().to_string())
                    .join(","),
            ),
            _ => None,
        }
    }
}

/// Flatten the paints of every descendant of `idx`.
pub fn flatten(graph: &SceneGraph, idx: NodeIndex) -> Vec<ColourEntry> {
    graph
        .find_all(idx)
        .into_iter()
        .filter_map(|child| graph.get(child))
        .flat_map(|node| {
            let fills = node.fills.iter().flatten();
            let strokes = node.strokes.iter().flatten();
            fills.chain(strokes).map(ColourEntry::from)
        })
        .collect()
}

/// Groups of slots sharing one solid colour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColourLinks {
    /// Groups of two or more slots, each in slot order, ordered by leader.
    pub groups: Vec<Vec<usize>>,
    /// Per slot, the first slot of its group (the slot itself when unlinked).
    leader: Vec<usize>,
    /// Per slot, the index into `groups`.
    group: Vec<Option<usize>>,
}

impl ColourLinks {
    pub fn leader_of(&self, slot: usize) -> usize {
        self.leader.get(slot).copied().unwrap_or(slot)
    }

    /// True when `slot` mirrors an earlier slot.
    pub fn is_follower(&self, slot: usize) -> bool {
        self.leader_of(slot) != slot
    }

    /// Give every follower its own copy of its leader's edit.
    ///
    /// Copies are taken before any edit has run, so each member keeps its
    /// own running values and alpha while sharing the instruction.
    pub fn share<T: Clone>(&self, edits: &mut Vec<PaintEdit<T>>) {
        for (slot, &leader) in self.leader.iter().enumerate() {
            if leader == slot || leader >= edits.len() {
                continue;
            }
            if slot >= edits.len() {
                edits.resize_with(slot + 1, PaintEdit::default);
            }
            edits[slot] = edits[leader].clone();
        }
    }

    /// Every slot linked with `slot`, itself included.
    pub fn refs(&self, slot: usize) -> Option<&[usize]> {
        let group = (*self.group.get(slot)?)?;
        self.groups.get(group).map(Vec::as_slice)
    }
}

/// Link solid entries with identical quantised RGB. Gradients and images
/// are never linked.
pub fn link_duplicates(entries: &[ColourEntry]) -> ColourLinks {
    let mut leader: Vec<usize> = (0..entries.len()).collect();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

    for (slot, entry) in entries.iter().enumerate() {
        let Some(key) = entry.dedup_key() else { continue };
        match first_seen.get(&key) {
            Some(&first) => {
                leader[slot] = first;
                members.entry(first).or_insert_with(|| vec![first]).push(slot);
            }
            None => {
                first_seen.insert(key, slot);
            }
        }
    }

    let mut group = vec![None; entries.len()];
    let groups: Vec<Vec<usize>> = members.into_values().collect();
    for (gi, slots) in groups.iter().enumerate() {
        for &slot in slots {
            group[slot] = Some(gi);
        }
    }
    ColourLinks {
        groups,
        leader,
        group,
    }
}

/// A container's flattened colours together with their links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColourSet {
    pub entries: Vec<ColourEntry>,
    pub links: ColourLinks,
}

impl ColourSet {
    pub fn collect(graph: &SceneGraph, idx: NodeIndex) -> Self {
        let entries = flatten(graph, idx);
        let links = link_duplicates(&entries);
        Self { entries, links }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
