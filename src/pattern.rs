use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::RouteTableError;

/// Params
///
/// Named path params captured by a match, keyed by the segment name without its `:`.
pub type Params = BTreeMap<String, String>;

/// Segment
///
/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, compared case-insensitively.
    Static(String),
    /// `:name` (required) or `:name?` (optional, only allowed as the last segment).
    Param { name: String, optional: bool },
}

impl Segment {
    // Static beats dynamic beats optional when two patterns match the same path.
    fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 4,
            Segment::Param { optional: false, .. } => 2,
            Segment::Param { optional: true, .. } => 1,
        }
    }
}

/// PathPattern
///
/// A parsed, absolute route pattern such as `/t/:tid/match/:matchId` or
/// `/forum/editor/:id?`. Child patterns are joined onto their parent with
/// [`PathPattern::join`] so every flattened record carries its full pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// parse
    ///
    /// Parses an absolute pattern. The pattern must start with `/`; empty segments
    /// (double or trailing slashes) are ignored.
    pub fn parse(raw: &str) -> Result<Self, RouteTableError> {
        if !raw.starts_with('/') {
            return Err(invalid(raw, "pattern must start with '/'"));
        }

        let mut segments = Vec::new();
        for piece in raw.split('/').filter(|piece| !piece.is_empty()) {
            segments.push(parse_segment(raw, piece)?);
        }

        if let Some(position) = segments
            .iter()
            .position(|segment| matches!(segment, Segment::Param { optional: true, .. }))
        {
            if position != segments.len() - 1 {
                return Err(invalid(raw, "optional segment must be the last one"));
            }
        }

        let mut names: Vec<&str> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect();
        let declared = names.len();
        names.sort_unstable();
        names.dedup();
        if names.len() != declared {
            return Err(invalid(raw, "param names must be unique"));
        }

        Ok(Self {
            raw: normalize(&segments),
            segments,
        })
    }

    /// join
    ///
    /// Resolves a child pattern relative to `parent`. An empty child resolves to the
    /// parent path itself; absolute child patterns are rejected.
    pub fn join(parent: &PathPattern, child: &str) -> Result<Self, RouteTableError> {
        if child.starts_with('/') {
            return Err(invalid(child, "child pattern must be relative"));
        }
        if child.is_empty() {
            return Ok(parent.clone());
        }
        let base = parent.raw.trim_end_matches('/');
        Self::parse(&format!("{}/{}", base, child))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of every param the pattern declares, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// matches
    ///
    /// Matches a bare path (no query or hash) against the pattern and returns the
    /// captured params, percent-decoded. The whole path must be consumed; a
    /// trailing slash is tolerated.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut pieces = path.split('/').filter(|piece| !piece.is_empty());
        let mut params = Params::new();

        for segment in &self.segments {
            match (segment, pieces.next()) {
                (Segment::Static(text), Some(piece)) if text.eq_ignore_ascii_case(piece) => {}
                (Segment::Static(_), _) => return None,
                (Segment::Param { name, .. }, Some(piece)) => {
                    params.insert(name.clone(), decode(piece));
                }
                (Segment::Param { optional: true, .. }, None) => {}
                (Segment::Param { optional: false, .. }, None) => return None,
            }
        }

        if pieces.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// score
    ///
    /// Per-segment precedence ranks. Comparing two scores lexicographically orders
    /// matching patterns from least to most specific.
    pub fn score(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }

    /// build
    ///
    /// Fills the pattern with `params`, percent-encoding their values. Returns the
    /// name of the first missing required param on failure. A missing optional
    /// param drops the last segment.
    pub fn build(&self, params: &Params) -> Result<String, String> {
        let mut pieces: Vec<Cow<'_, str>> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => pieces.push(Cow::Borrowed(text.as_str())),
                Segment::Param { name, optional } => match params.get(name) {
                    Some(value) if !value.is_empty() => pieces.push(urlencoding::encode(value)),
                    _ if *optional => {}
                    _ => return Err(name.clone()),
                },
            }
        }
        Ok(format!("/{}", pieces.join("/")))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Invalid escapes and non-UTF-8 bytes keep the segment as written.
fn decode(piece: &str) -> String {
    urlencoding::decode(piece)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| piece.to_string())
}

fn parse_segment(raw: &str, piece: &str) -> Result<Segment, RouteTableError> {
    let Some(param) = piece.strip_prefix(':') else {
        if piece.contains(':') || piece.contains('?') {
            return Err(invalid(raw, "static segment contains ':' or '?'"));
        }
        return Ok(Segment::Static(piece.to_string()));
    };

    let (name, optional) = match param.strip_suffix('?') {
        Some(name) => (name, true),
        None => (param, false),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(raw, "param name must be non-empty and alphanumeric"));
    }

    Ok(Segment::Param {
        name: name.to_string(),
        optional,
    })
}

fn normalize(segments: &[Segment]) -> String {
    let pieces: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Static(text) => text.clone(),
            Segment::Param { name, optional: false } => format!(":{}", name),
            Segment::Param { name, optional: true } => format!(":{}?", name),
        })
        .collect();
    format!("/{}", pieces.join("/"))
}

fn invalid(pattern: &str, reason: &str) -> RouteTableError {
    RouteTableError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}
