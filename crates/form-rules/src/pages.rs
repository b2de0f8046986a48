use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Serialize;

use crate::model::{Condition, ConditionKind, Field, PageAction, PageId};

/// One derived page: all fields sharing a page number.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PageNode {
    pub id: PageId,
    pub number: u32,
    pub field_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Unconditional "Next" between consecutive pages.
    Next,
    SkipTo,
    Hide,
}

/// One transition edge. Conditional edges carry the id of the rule that
/// created them; parallel edges between the same pair are all kept and all
/// evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PageEdge {
    pub from: PageId,
    pub to: PageId,
    pub kind: EdgeKind,
    pub condition_id: Option<String>,
}

/// Directed graph of pages and transitions, recomputed from the field set
/// whenever fields are fetched. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct PageGraph {
    pub nodes: Vec<PageNode>,
    pub edges: Vec<PageEdge>,
}

impl PageGraph {
    pub fn first(&self) -> Option<PageId> {
        self.nodes.first().map(|node| node.id)
    }

    pub fn last(&self) -> Option<PageId> {
        self.nodes.last().map(|node| node.id)
    }

    pub fn contains(&self, page: PageId) -> bool {
        self.nodes.iter().any(|node| node.id == page)
    }

    /// First or last page of the form; these may never be hidden.
    pub fn is_boundary(&self, page: PageId) -> bool {
        self.first() == Some(page) || self.last() == Some(page)
    }
}

/// First and last page of the field set, when it has any pages at all.
pub fn page_bounds(fields: &[Field]) -> Option<(PageId, PageId)> {
    let numbers = fields.iter().map(|field| field.page);
    let first = numbers.clone().min()?;
    let last = numbers.max()?;
    Some((PageId::new(first), PageId::new(last)))
}

/// Derives the page graph: one node per distinct page number ascending,
/// linear `next` edges between consecutive pages, plus one labeled edge per
/// skip/hide rule whose endpoints both exist.
pub fn page_graph(fields: &[Field], conditions: &[Condition]) -> PageGraph {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for field in fields {
        *counts.entry(field.page).or_default() += 1;
    }

    let nodes: Vec<PageNode> = counts
        .into_iter()
        .map(|(number, field_count)| PageNode {
            id: PageId::new(number),
            number,
            field_count,
        })
        .collect();

    let mut edges: Vec<PageEdge> = nodes
        .windows(2)
        .map(|pair| PageEdge {
            from: pair[0].id,
            to: pair[1].id,
            kind: EdgeKind::Next,
            condition_id: None,
        })
        .collect();

    let exists = |page: PageId| nodes.iter().any(|node| node.id == page);
    for condition in conditions {
        if let ConditionKind::SkipHidePage {
            then_action,
            source_page,
            target_page,
            ..
        } = &condition.kind
            && exists(*source_page)
            && exists(*target_page)
        {
            edges.push(PageEdge {
                from: *source_page,
                to: *target_page,
                kind: match then_action {
                    PageAction::SkipTo => EdgeKind::SkipTo,
                    PageAction::Hide => EdgeKind::Hide,
                },
                condition_id: Some(condition.id.clone()),
            });
        }
    }

    PageGraph { nodes, edges }
}
