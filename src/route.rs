use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{NavigationError, RouteTableError};
use crate::pattern::{Params, PathPattern};

// --- Route Definitions ---

/// RouteMeta
///
/// Access flags attached to a route. A matched route inherits the flags of every
/// ancestor, so children of `/admin` require admin without declaring it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteMeta {
    pub requires_admin: bool,
    /// Carried for UI code (e.g. hiding referee links). No guard enforces it.
    pub requires_staff: bool,
}

impl RouteMeta {
    fn inherit(self, parent: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_admin: self.requires_admin || parent.requires_admin,
            requires_staff: self.requires_staff || parent.requires_staff,
        }
    }
}

/// Route
///
/// One declared binding from a pattern to a view. Top-level patterns are absolute,
/// child patterns are relative to their parent (`""` is the parent path itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: String,
    /// Unique identifier used for named navigation and permission checks.
    pub name: Option<String>,
    /// Identifier of the lazily loaded view, resolved through the view registry.
    pub view: String,
    pub meta: RouteMeta,
    /// When set, path params are handed to the mounted view as props.
    pub props: bool,
    pub children: Vec<Route>,
}

impl Route {
    pub fn new(pattern: &str, view: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            name: None,
            view: view.to_string(),
            meta: RouteMeta::default(),
            props: false,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_props(mut self) -> Self {
        self.props = true;
        self
    }

    pub fn requires_admin(mut self) -> Self {
        self.meta.requires_admin = true;
        self
    }

    pub fn requires_staff(mut self) -> Self {
        self.meta.requires_staff = true;
        self
    }

    pub fn children(mut self, children: Vec<Route>) -> Self {
        self.children = children;
        self
    }
}

/// NavigationTarget
///
/// Where a navigation (or a guard redirect) wants to go: a raw location, or a
/// named route with its params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Path(String),
    Named { name: String, params: Params },
}

impl NavigationTarget {
    pub fn named(name: &str) -> Self {
        NavigationTarget::Named {
            name: name.to_string(),
            params: Params::new(),
        }
    }

    pub fn named_with(name: &str, params: &[(&str, &str)]) -> Self {
        NavigationTarget::Named {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl From<&str> for NavigationTarget {
    fn from(location: &str) -> Self {
        NavigationTarget::Path(location.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(location: String) -> Self {
        NavigationTarget::Path(location)
    }
}

// --- Resolution Results ---

/// ResolvedRoute
///
/// The outcome of matching a location against the table. This is what guards see
/// as the navigation target and source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResolvedRoute {
    pub name: Option<String>,
    /// Path plus query and hash, as navigated to.
    pub full_path: String,
    pub path: String,
    /// The full pattern of the matched record.
    pub pattern: String,
    pub params: BTreeMap<String, String>,
    /// Parsed query string. For repeated keys the last value wins.
    pub query: BTreeMap<String, String>,
    pub hash: Option<String>,
    /// Effective meta, merged along the ancestor chain.
    pub meta: RouteMeta,
    /// View of the matched leaf record.
    pub view: String,
    /// Records from the outermost ancestor down to the leaf, for nested mounting.
    pub matched_views: Vec<MatchedView>,
    /// Whether the leaf record passes params as props.
    pub props: bool,
}

/// MatchedView
///
/// One level of the nested view chain. `props` is the flag of the record that
/// declared the view, so a layout can receive params its leaf children do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MatchedView {
    pub view: String,
    pub props: bool,
}

impl ResolvedRoute {
    /// Name used for permission checks; unnamed records fall back to their pattern.
    pub fn identifier(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.pattern)
    }
}

/// RouteManifestEntry
///
/// Serializable view of the declared table, served to link-building code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteManifestEntry {
    /// Pattern as declared (relative for children).
    pub pattern: String,
    pub full_pattern: String,
    pub name: Option<String>,
    pub view: String,
    pub meta: RouteMeta,
    pub props: bool,
    #[schema(no_recursion)]
    pub children: Vec<RouteManifestEntry>,
}

// --- Route Table ---

#[derive(Debug, Clone)]
struct RouteRecord {
    pattern: PathPattern,
    name: Option<String>,
    view: String,
    meta: RouteMeta,
    props: bool,
    depth: usize,
    matched_views: Vec<MatchedView>,
}

/// RouteTable
///
/// A validated, flattened route tree. Every declared route (parents included)
/// becomes one matchable record holding its full pattern and inherited meta.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    records: Vec<RouteRecord>,
    by_name: HashMap<String, usize>,
}

impl RouteTable {
    /// new
    ///
    /// Validates and flattens `routes`. Fails on malformed patterns and on
    /// duplicate names anywhere in the tree.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let mut records = Vec::new();
        for route in &routes {
            let pattern = PathPattern::parse(&route.pattern)?;
            flatten(route, pattern, RouteMeta::default(), 0, &[], &mut records)?;
        }

        let mut by_name = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            if let Some(name) = &record.name {
                if by_name.insert(name.clone(), index).is_some() {
                    return Err(RouteTableError::DuplicateName(name.clone()));
                }
            }
        }

        tracing::debug!(records = records.len(), "route table built");

        Ok(Self {
            routes,
            records,
            by_name,
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().filter_map(|record| record.name.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// resolve
    ///
    /// Matches a location (`/path?query#hash`) against every record. When several
    /// records match, the most specific pattern wins; on equal patterns the deeper
    /// record wins (so an empty-path child beats its parent), then the earlier one.
    pub fn resolve(&self, location: &str) -> Result<ResolvedRoute, NavigationError> {
        let (path, query, hash) = split_location(location);

        let best = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record
                    .pattern
                    .matches(&path)
                    .map(|params| (index, record, params))
            })
            .max_by_key(|(index, record, _)| (record.pattern.score(), record.depth, Reverse(*index)));

        let Some((_, record, params)) = best else {
            return Err(NavigationError::NoMatch(path));
        };

        Ok(to_resolved(record, path, params, query, hash))
    }

    /// resolve_named
    ///
    /// Resolves a named route with explicit params, as used by `{ name, params }`
    /// navigations and guard redirects.
    pub fn resolve_named(&self, name: &str, params: &Params) -> Result<ResolvedRoute, NavigationError> {
        let record = self.record(name)?;
        let path = record.pattern.build(params).map_err(|param| NavigationError::MissingParam {
            route: name.to_string(),
            param,
        })?;

        // Only the params the pattern declares survive.
        let kept: Params = record
            .pattern
            .param_names()
            .filter_map(|key| params.get(key).map(|value| (key.to_string(), value.clone())))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        Ok(to_resolved(record, path, kept, BTreeMap::new(), None))
    }

    pub fn resolve_target(&self, target: &NavigationTarget) -> Result<ResolvedRoute, NavigationError> {
        match target {
            NavigationTarget::Path(location) => self.resolve(location),
            NavigationTarget::Named { name, params } => self.resolve_named(name, params),
        }
    }

    /// href
    ///
    /// Builds the path of a named route, for links.
    pub fn href(&self, name: &str, params: &Params) -> Result<String, NavigationError> {
        self.resolve_named(name, params).map(|resolved| resolved.path)
    }

    /// manifest
    ///
    /// The declared tree with full patterns filled in.
    pub fn manifest(&self) -> Vec<RouteManifestEntry> {
        self.routes
            .iter()
            .filter_map(|route| {
                PathPattern::parse(&route.pattern)
                    .ok()
                    .map(|pattern| manifest_entry(route, &pattern))
            })
            .collect()
    }

    fn record(&self, name: &str) -> Result<&RouteRecord, NavigationError> {
        self.by_name
            .get(name)
            .map(|index| &self.records[*index])
            .ok_or_else(|| NavigationError::UnknownRoute(name.to_string()))
    }
}

fn flatten(
    route: &Route,
    pattern: PathPattern,
    parent_meta: RouteMeta,
    depth: usize,
    parent_views: &[MatchedView],
    records: &mut Vec<RouteRecord>,
) -> Result<(), RouteTableError> {
    let meta = route.meta.inherit(parent_meta);
    let mut matched_views = parent_views.to_vec();
    matched_views.push(MatchedView {
        view: route.view.clone(),
        props: route.props,
    });

    for child in &route.children {
        let child_pattern = PathPattern::join(&pattern, &child.pattern)?;
        flatten(child, child_pattern, meta, depth + 1, &matched_views, records)?;
    }

    records.push(RouteRecord {
        pattern,
        name: route.name.clone(),
        view: route.view.clone(),
        meta,
        props: route.props,
        depth,
        matched_views,
    });
    Ok(())
}

fn manifest_entry(route: &Route, pattern: &PathPattern) -> RouteManifestEntry {
    let children = route
        .children
        .iter()
        .filter_map(|child| {
            PathPattern::join(pattern, &child.pattern)
                .ok()
                .map(|child_pattern| manifest_entry(child, &child_pattern))
        })
        .collect();

    RouteManifestEntry {
        pattern: route.pattern.clone(),
        full_pattern: pattern.to_string(),
        name: route.name.clone(),
        view: route.view.clone(),
        meta: route.meta,
        props: route.props,
        children,
    }
}

fn to_resolved(
    record: &RouteRecord,
    path: String,
    params: Params,
    query: BTreeMap<String, String>,
    hash: Option<String>,
) -> ResolvedRoute {
    let mut full_path = path.clone();
    if !query.is_empty() {
        let encoded: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        full_path.push('?');
        full_path.push_str(&encoded);
    }
    if let Some(hash) = &hash {
        full_path.push('#');
        full_path.push_str(hash);
    }

    ResolvedRoute {
        name: record.name.clone(),
        full_path,
        path,
        pattern: record.pattern.to_string(),
        params,
        query,
        hash,
        meta: record.meta,
        view: record.view.clone(),
        matched_views: record.matched_views.clone(),
        props: record.props,
    }
}

/// Splits `/path?query#hash` into its parts. The path always starts with `/`.
fn split_location(location: &str) -> (String, BTreeMap<String, String>, Option<String>) {
    let (rest, hash) = match location.split_once('#') {
        Some((rest, hash)) => (rest, Some(hash.to_string())),
        None => (location, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };

    let query = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    (path, query, hash)
}
