use crate::error::{Result, ZeroError};
use crate::registry::{capabilities, primary_types};
use crate::types::{GraphNode, NodeId, NodeType, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// How a keyword or category filter combines its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The node has at least one of the values.
    #[default]
    Any,
    /// The node has every value.
    All,
}

impl FromStr for MatchMode {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(ZeroError::validation(format!(
                "mode must be 'any' or 'all', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    #[default]
    All,
    Created,
    Interacted,
}

impl FromStr for InteractionMode {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(InteractionMode::All),
            "created" => Ok(InteractionMode::Created),
            "interacted" => Ok(InteractionMode::Interacted),
            other => Err(ZeroError::validation(format!(
                "user filter must be 'all', 'created' or 'interacted', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeFilter {
    pub values: Vec<NodeType>,
    /// `false` selects every type except `values`.
    pub include: bool,
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            include: true,
        }
    }
}

/// Set-membership filter over keywords or categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetFilter<T> {
    pub values: Vec<T>,
    pub mode: MatchMode,
    pub include: bool,
}

impl<T> Default for SetFilter<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            mode: MatchMode::Any,
            include: true,
        }
    }
}

impl<T> SetFilter<T> {
    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }

    /// Evaluate against a node, `has` answering membership of one value.
    /// An empty value list never filters anything out.
    pub fn matches(&self, has: impl Fn(&T) -> bool) -> bool {
        if self.values.is_empty() {
            return true;
        }
        let hit = match self.mode {
            MatchMode::Any => self.values.iter().any(&has),
            MatchMode::All => self.values.iter().all(&has),
        };
        hit == self.include
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionFilter {
    pub mode: InteractionMode,
    pub user_id: Option<UserId>,
}

/// The compound filter of one query. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub node_types: TypeFilter,
    pub keywords: SetFilter<String>,
    pub categories: SetFilter<NodeId>,
    pub user_interaction: InteractionFilter,
}

impl FilterSpec {
    pub fn validate(&self) -> Result<()> {
        if self.keywords.values.iter().any(|k| k.trim().is_empty()) {
            return Err(ZeroError::validation("keyword filter values must not be blank"));
        }

        match (&self.user_interaction.mode, &self.user_interaction.user_id) {
            (InteractionMode::All, _) => Ok(()),
            (mode, Some(user)) if !user.trim().is_empty() => {
                log::debug!("Interaction filter {:?} for {}", mode, user);
                Ok(())
            }
            (mode, _) => Err(ZeroError::validation(format!(
                "user filter '{:?}' needs a user id",
                mode
            ))),
        }
    }
}

/// Lookups the orchestrator performs up front so the predicate stays pure.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    /// Nodes the interaction filter's user voted on or commented on.
    pub interacted: HashSet<NodeId>,
}

/// Working type set for a filter: the explicit selection (or its
/// complement, or the primary types when nothing is selected) with
/// required parent types added.
pub fn resolve_types(filter: &TypeFilter) -> Vec<NodeType> {
    let mut working: HashSet<NodeType> = if filter.values.is_empty() {
        primary_types().into_iter().collect()
    } else if filter.include {
        filter.values.iter().copied().collect()
    } else {
        NodeType::ALL
            .into_iter()
            .filter(|t| !filter.values.contains(t))
            .collect()
    };

    let coupled: Vec<NodeType> = working
        .iter()
        .filter_map(|t| capabilities(*t).required_parent)
        .collect();
    working.extend(coupled);

    NodeType::ALL
        .into_iter()
        .filter(|t| working.contains(t))
        .collect()
}

#[derive(Debug, Clone)]
enum InteractionCheck {
    Everyone,
    CreatedBy(UserId),
    Within(HashSet<NodeId>),
}

/// AND of the type, keyword, category and interaction checks.
#[derive(Debug, Clone)]
pub struct Predicate {
    types: Vec<NodeType>,
    keywords: SetFilter<String>,
    categories: SetFilter<NodeId>,
    interaction: InteractionCheck,
}

impl Predicate {
    /// The resolved working type set, in enum order.
    pub fn types(&self) -> &[NodeType] {
        &self.types
    }

    pub fn matches(&self, node: &GraphNode) -> bool {
        self.types.contains(&node.node_type)
            && self.keywords.matches(|word| node.has_keyword(word))
            && self.categories.matches(|id| node.has_category(id))
            && match &self.interaction {
                InteractionCheck::Everyone => true,
                InteractionCheck::CreatedBy(user) => &node.created_by == user,
                InteractionCheck::Within(ids) => ids.contains(&node.id),
            }
    }
}

pub fn build_predicate(spec: &FilterSpec, context: FilterContext) -> Predicate {
    let keywords = SetFilter {
        values: spec
            .keywords
            .values
            .iter()
            .map(|k| k.trim().to_lowercase())
            .collect(),
        mode: spec.keywords.mode,
        include: spec.keywords.include,
    };

    let interaction = match (spec.user_interaction.mode, &spec.user_interaction.user_id) {
        (InteractionMode::Created, Some(user)) => InteractionCheck::CreatedBy(user.clone()),
        (InteractionMode::Interacted, Some(_)) => InteractionCheck::Within(context.interacted),
        _ => InteractionCheck::Everyone,
    };

    Predicate {
        types: resolve_types(&spec.node_types),
        keywords,
        categories: spec.categories.clone(),
        interaction,
    }
}
