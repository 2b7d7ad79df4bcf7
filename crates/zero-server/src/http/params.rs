use serde::Deserialize;
use std::str::FromStr;
use zero_core::{
    FilterSpec, InteractionFilter, InteractionMode, MatchMode, NodeId, NodeType, Pagination,
    QueryRequest, RelationshipKind, RelationshipOptions, Result, SetFilter, SortDirection,
    SortKey, SortSpec, TypeFilter, ZeroError,
};

/// Query string of `GET /graph/universal`. List values are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UniversalGraphParams {
    pub node_types: Option<String>,
    pub include_node_types: Option<bool>,
    pub keywords: Option<String>,
    pub keyword_mode: Option<String>,
    pub include_keywords: Option<bool>,
    pub categories: Option<String>,
    pub category_mode: Option<String>,
    pub include_categories: Option<bool>,
    pub user_filter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub include_relationships: Option<bool>,
    pub relationship_types: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| s.split(',').map(str::trim).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default()
}

fn parse_list<T: FromStr<Err = ZeroError>>(raw: Option<&str>) -> Result<Vec<T>> {
    split_list(raw).into_iter().map(str::parse).collect()
}

fn parse_or_default<T: FromStr<Err = ZeroError> + Default>(raw: Option<&str>) -> Result<T> {
    raw.map(str::parse).transpose().map(Option::unwrap_or_default)
}

impl UniversalGraphParams {
    /// Build a query request for `user`. Rejects anything malformed;
    /// semantic checks are left to the engine.
    pub fn into_request(self, user: Option<String>) -> Result<QueryRequest> {
        let node_types = TypeFilter {
            values: parse_list::<NodeType>(self.node_types.as_deref())?,
            include: self.include_node_types.unwrap_or(true),
        };

        let keywords = SetFilter {
            values: split_list(self.keywords.as_deref())
                .into_iter()
                .map(str::to_string)
                .collect(),
            mode: parse_or_default::<MatchMode>(self.keyword_mode.as_deref())?,
            include: self.include_keywords.unwrap_or(true),
        };

        let categories = SetFilter {
            values: split_list(self.categories.as_deref())
                .into_iter()
                .map(|raw| {
                    NodeId::parse_str(raw).map_err(|_| {
                        ZeroError::validation(format!("invalid category id '{}'", raw))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            mode: parse_or_default::<MatchMode>(self.category_mode.as_deref())?,
            include: self.include_categories.unwrap_or(true),
        };

        let mode = parse_or_default::<InteractionMode>(self.user_filter.as_deref())?;
        let user_interaction = InteractionFilter {
            mode,
            user_id: match mode {
                InteractionMode::All => None,
                _ => user.clone(),
            },
        };

        let sort = SortSpec {
            key: parse_or_default::<SortKey>(self.sort_by.as_deref())?,
            direction: parse_or_default::<SortDirection>(self.sort_direction.as_deref())?,
        };

        let relationships = RelationshipOptions {
            include: self.include_relationships.unwrap_or(true),
            kinds: parse_list::<RelationshipKind>(self.relationship_types.as_deref())?,
        };

        Ok(QueryRequest {
            filter: FilterSpec {
                node_types,
                keywords,
                categories,
                user_interaction,
            },
            sort,
            pagination: Pagination {
                limit: self.limit,
                offset: self.offset.unwrap_or(0),
            },
            relationships,
            requesting_user_id: user,
        })
    }
}
