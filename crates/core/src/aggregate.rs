//! Chapter → section → verse aggregation.
//!
//! Reduces a flat record list into an [`AggregateTree`] in three grouping
//! passes, each keeping first-encounter order:
//!
//! 1. `(chapter, section, verse)` triples with an occurrence count,
//! 2. triples rolled up into `(chapter, section)` with their verses,
//! 3. pairs rolled up into chapters with their sections.
//!
//! Chapters are then sorted ascending by identifier. Missing identifiers group
//! under `None`, which sorts before every string. Only the chapter level is
//! sorted; sections and verses stay in encounter order.

use crate::language::FieldMapping;
use crate::record::Record;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// A verse identifier and how many records carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseCount {
    pub verse: Option<String>,
    pub count: usize,
}

/// A section and its verses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    #[serde(rename = "sectionName")]
    pub section_name: Option<String>,
    pub verses: Vec<VerseCount>,
}

/// A chapter and its sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterGroup {
    pub chapter: Option<String>,
    pub sections: Vec<SectionGroup>,
}

/// Aggregate output: chapters sorted by identifier.
pub type AggregateTree = Vec<ChapterGroup>;

/// Flattened `(chapter, section, verse, count)` row.
pub type TripleCount = (Option<String>, Option<String>, Option<String>, usize);

/// Groups values by key, keeping the order in which keys were first seen.
struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, V)>,
}

impl<K: Hash + Eq + Clone, V: Default> OrderedGroups<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut V {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(key.clone(), slot);
                self.groups.push((key, V::default()));
                slot
            }
        };
        &mut self.groups[slot].1
    }

    fn into_vec(self) -> Vec<(K, V)> {
        self.groups
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Builds the chapter/section/verse tree for `records` using `mapping`.
pub fn build_tree<'a, R, I>(records: I, mapping: &FieldMapping) -> AggregateTree
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    // Pass 1: count (chapter, section, verse) triples.
    let mut triples: OrderedGroups<(Option<String>, Option<String>, Option<String>), usize> =
        OrderedGroups::new();
    for record in records {
        let key = (
            owned(record.field(mapping.chapter)),
            owned(record.field(mapping.section)),
            owned(record.field(mapping.verse)),
        );
        *triples.entry(key) += 1;
    }

    // Pass 2: roll triples up into (chapter, section).
    let mut pairs: OrderedGroups<(Option<String>, Option<String>), Vec<VerseCount>> =
        OrderedGroups::new();
    for ((chapter, section, verse), count) in triples.into_vec() {
        pairs
            .entry((chapter, section))
            .push(VerseCount { verse, count });
    }

    // Pass 3: roll pairs up into chapters.
    let mut chapters: OrderedGroups<Option<String>, Vec<SectionGroup>> = OrderedGroups::new();
    for ((chapter, section_name), verses) in pairs.into_vec() {
        chapters.entry(chapter).push(SectionGroup {
            section_name,
            verses,
        });
    }

    let mut tree: AggregateTree = chapters
        .into_vec()
        .into_iter()
        .map(|(chapter, sections)| ChapterGroup { chapter, sections })
        .collect();
    tree.sort_by(|a, b| a.chapter.cmp(&b.chapter));
    tree
}

/// Flattens a tree back into `(chapter, section, verse, count)` rows.
pub fn flatten(tree: &[ChapterGroup]) -> Vec<TripleCount> {
    tree.iter()
        .flat_map(|chapter| {
            chapter.sections.iter().flat_map(move |section| {
                section.verses.iter().map(move |v| {
                    (
                        chapter.chapter.clone(),
                        section.section_name.clone(),
                        v.verse.clone(),
                        v.count,
                    )
                })
            })
        })
        .collect()
}
