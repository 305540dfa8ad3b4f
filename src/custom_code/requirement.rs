use std::sync::LazyLock;
use pep508_rs::VersionOrUrl;
use regex::Regex;
use crate::error::{BqFlowError, Result};

/// One parsed line of a requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Normalized package name.
    pub name: String,
    pub extras: Vec<String>,
    /// Version clauses, e.g. `>=1.0`.
    pub specifiers: Vec<String>,
    pub url: Option<String>,
    pub marker: Option<String>,
    pub vcs: Option<String>,
    pub editable: bool,
}

impl From<pep508_rs::Requirement> for Requirement {
    fn from(req: pep508_rs::Requirement) -> Self {
        let (specifiers, url) = match req.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specs)) => {
                (specs.iter().map(ToString::to_string).collect(), None)
            }
            Some(VersionOrUrl::Url(url)) => (Vec::new(), Some(url.to_string())),
            None => (Vec::new(), None),
        };

        Self {
            name: req.name.to_string(),
            extras: req.extras.iter().map(ToString::to_string).collect(),
            specifiers,
            url,
            marker: req.marker.try_to_string(),
            vcs: None,
            editable: false,
        }
    }
}

/// `[-e] git+<url>#egg=<name>` lines, which are not PEP 508 but are accepted in
/// requirements files.
struct VcsParser {
    pattern: Regex,
}

impl VcsParser {
    fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"^\s*(?P<editable>-e\s+)?(?P<vcs>git|hg|svn|bzr)\+(?P<url>[^\s#]+)#egg=(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*$",
            )
            .unwrap(),
        }
    }

    fn parse(&self, line: &str) -> Option<Requirement> {
        let caps = self.pattern.captures(line)?;
        Some(Requirement {
            name: caps["name"].to_string(),
            extras: Vec::new(),
            specifiers: Vec::new(),
            url: Some(caps["url"].to_string()),
            marker: None,
            vcs: Some(caps["vcs"].to_string()),
            editable: caps.name("editable").is_some(),
        })
    }
}

static VCS: LazyLock<VcsParser> = LazyLock::new(VcsParser::new);

pub fn parse_requirement(line: &str) -> Result<Requirement> {
    if let Some(req) = VCS.parse(line) {
        return Ok(req);
    }

    let req: pep508_rs::Requirement = line.trim().parse().map_err(|e| {
        BqFlowError::InvalidRequirement(format!("'{}' is not a valid requirement line: {}", line, e))
    })?;
    Ok(req.into())
}
