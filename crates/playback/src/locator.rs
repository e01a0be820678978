//! Stream descriptors and the mount-time candidate list.
//!
//! Candidates are derived once from the primary locator:
//!   1. the primary itself
//!   2. one variant per substitution rule whose pattern occurs in the primary
//!   3. one variant per fallback template (`{url}` = percent-encoded primary,
//!      `{raw}` = primary as-is)
//! Duplicates are dropped, order is kept. Nothing is fetched remotely.

use catalog_store::{LiveTv, Match};
use serde::Serialize;
use url::Url;

// ── Descriptor ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Match,
    Channel,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Match   => "match",
            StreamKind::Channel => "channel",
        }
    }
}

/// Display metadata carried to embed player pages as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamMeta {
    pub title:       String,
    pub team_a:      Option<String>,
    pub team_a_flag: Option<String>,
    pub team_b:      Option<String>,
    pub team_b_flag: Option<String>,
    pub score:       Option<(i32, i32)>,
    pub competition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    pub kind:    StreamKind,
    pub id:      String,
    pub primary: Option<String>,
    pub meta:    StreamMeta,
}

impl StreamDescriptor {
    pub fn for_match(m: &Match) -> Self {
        let flag = |t: &Option<catalog_store::Team>| {
            t.as_ref().map(|t| t.flag.clone()).filter(|f| !f.is_empty())
        };
        Self {
            kind:    StreamKind::Match,
            id:      m.id.clone(),
            primary: m.stream_locator().map(str::to_string),
            meta: StreamMeta {
                title:       m.title(),
                team_a:      m.team_a.as_ref().map(|t| t.name.clone()),
                team_a_flag: flag(&m.team_a),
                team_b:      m.team_b.as_ref().map(|t| t.name.clone()),
                team_b_flag: flag(&m.team_b),
                score:       m.score(),
                competition: m.competition_name().map(str::to_string),
            },
        }
    }

    pub fn for_channel(tv: &LiveTv) -> Self {
        Self {
            kind:    StreamKind::Channel,
            id:      tv.id.clone(),
            primary: tv.stream_locator().map(str::to_string),
            meta: StreamMeta {
                title: tv.name.clone(),
                ..Default::default()
            },
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id)
    }
}

// ── Alternates ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlternateRules {
    pub substitutions: Vec<(String, String)>,
    pub templates:     Vec<String>,
}

impl AlternateRules {
    /// `"from=>to;from2=>to2"`. Malformed pairs are skipped.
    pub fn parse_substitutions(spec: &str) -> Vec<(String, String)> {
        spec.split(';')
            .filter_map(|pair| {
                let (from, to) = pair.split_once("=>")?;
                let from = from.trim();
                (!from.is_empty()).then(|| (from.to_string(), to.trim().to_string()))
            })
            .collect()
    }

    /// Templates are separated by `;` or `|`.
    pub fn parse(substitutions: Option<&str>, templates: Option<&str>) -> Self {
        Self {
            substitutions: substitutions.map(Self::parse_substitutions).unwrap_or_default(),
            templates: templates
                .map(|t| {
                    t.split(|c| c == ';' || c == '|')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn expand(&self, primary: &str) -> Vec<String> {
        let encoded: String = url::form_urlencoded::byte_serialize(primary.as_bytes()).collect();

        let substituted = self
            .substitutions
            .iter()
            .filter(|(from, _)| primary.contains(from.as_str()))
            .map(|(from, to)| primary.replace(from.as_str(), to));

        let templated = self
            .templates
            .iter()
            .map(|t| t.replace("{url}", &encoded).replace("{raw}", primary));

        substituted.chain(templated).collect()
    }
}

// ── Candidate list ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateList {
    locators: Vec<String>,
    index:    usize,
}

impl CandidateList {
    /// `None` when the primary is missing or blank.
    pub fn derive(primary: Option<&str>, rules: &AlternateRules) -> Option<Self> {
        let primary = primary.map(str::trim).filter(|p| !p.is_empty())?;

        let mut locators = vec![primary.to_string()];
        for alt in rules.expand(primary) {
            if !alt.trim().is_empty() && !locators.contains(&alt) {
                locators.push(alt);
            }
        }
        Some(Self { locators, index: 0 })
    }

    pub fn from_locators(locators: Vec<String>) -> Option<Self> {
        let mut out: Vec<String> = Vec::new();
        for l in locators.into_iter().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
            if !out.contains(&l) {
                out.push(l);
            }
        }
        (!out.is_empty()).then_some(Self { locators: out, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &str {
        &self.locators[self.index]
    }

    pub fn locators(&self) -> &[String] {
        &self.locators
    }

    /// Next candidate, wrapping. A single-entry list stays put.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.locators.len();
        self.index
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.locators.len() {
            self.index = index;
            true
        } else {
            false
        }
    }
}

// ── Locator rewriting ────────────────────────────────────────────────────────

pub const CACHE_BUST_PARAM: &str = "_t";

/// Same locator plus a uniqueness token, forcing the surface to reload.
pub fn cache_busted(locator: &str, token: &str) -> String {
    match Url::parse(locator) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, token);
            url.to_string()
        }
        Err(_) => {
            let sep = if locator.contains('?') { '&' } else { '?' };
            format!("{locator}{sep}{CACHE_BUST_PARAM}={token}")
        }
    }
}

/// Player page URL with the stream and its display metadata as query
/// parameters (`src`, `teamA`, `flagA`, `teamB`, `flagB`, `scoreA`,
/// `scoreB`, `competition`, `title`).
pub fn embed_locator(player_page: &str, src: &str, meta: &StreamMeta) -> Result<String, url::ParseError> {
    let mut url = Url::parse(player_page)?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("src", src);
        if !meta.title.is_empty() {
            q.append_pair("title", &meta.title);
        }
        let optional = [
            ("teamA", meta.team_a.as_deref()),
            ("flagA", meta.team_a_flag.as_deref()),
            ("teamB", meta.team_b.as_deref()),
            ("flagB", meta.team_b_flag.as_deref()),
            ("competition", meta.competition.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                q.append_pair(key, v);
            }
        }
        if let Some((a, b)) = meta.score {
            q.append_pair("scoreA", &a.to_string());
            q.append_pair("scoreB", &b.to_string());
        }
    }
    Ok(url.to_string())
}
