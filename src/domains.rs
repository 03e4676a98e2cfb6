//src/domains.rs

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::DomainTableError;

/// Heavy-chain framework / CDR layout of the default profile (123 columns).
pub const HEAVY_CHAIN_DOMAINS: [(&str, usize); 7] = [
    ("H-FR1", 25),
    ("H-CDR1", 8),
    ("H-FR2", 17),
    ("H-CDR2", 8),
    ("H-FR3", 39),
    ("H-CDR3", 15),
    ("H-FR4", 11),
];

/// A named stretch of profile columns. `length: None` absorbs everything left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub length: Option<usize>,
}

/// Ordered domains covering the profile from its first column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTable {
    domains: Vec<Domain>,
}

impl DomainTable {
    /// Validate and wrap a domain list: non-empty, named, and only the last
    /// entry may be unbounded.
    pub fn new(domains: Vec<Domain>) -> Result<Self, DomainTableError> {
        if domains.is_empty() {
            return Err(DomainTableError::Empty);
        }
        let last = domains.len() - 1;
        for (i, domain) in domains.iter().enumerate() {
            if domain.name.is_empty() {
                return Err(DomainTableError::MissingName {
                    entry: format!("#{}", i + 1),
                });
            }
            if domain.length.is_none() && i != last {
                return Err(DomainTableError::UnboundedNotLast {
                    name: domain.name.clone(),
                });
            }
        }
        Ok(Self { domains })
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.name.as_str())
    }

    /// Total profile length, or `None` when the table ends in an unbounded domain.
    pub fn profile_len(&self) -> Option<usize> {
        self.domains.iter().map(|d| d.length).sum()
    }
}

impl Default for DomainTable {
    fn default() -> Self {
        Self {
            domains: HEAVY_CHAIN_DOMAINS
                .iter()
                .map(|&(name, length)| Domain {
                    name: name.to_string(),
                    length: Some(length),
                })
                .collect(),
        }
    }
}

fn parse_entry(name: &str, length: Option<&str>) -> Result<Domain, DomainTableError> {
    let name = name.trim();
    let length = match length.map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(text.parse::<usize>().map_err(|_| DomainTableError::InvalidLength {
            name: name.to_string(),
            length: text.to_string(),
        })?),
    };
    Ok(Domain {
        name: name.to_string(),
        length,
    })
}

/// `NAME:LEN,NAME:LEN,...`; a trailing `NAME` without length is unbounded.
impl FromStr for DomainTable {
    type Err = DomainTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let domains = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let mut parts = entry.splitn(2, ':');
                let name = parts.next().unwrap_or_default();
                parse_entry(name, parts.next())
            })
            .collect::<Result<Vec<_>, _>>()?;
        DomainTable::new(domains)
    }
}

impl fmt::Display for DomainTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, domain) in self.domains.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match domain.length {
                Some(length) => write!(f, "{}:{}", domain.name, length)?,
                None => f.write_str(&domain.name)?,
            }
        }
        Ok(())
    }
}

/// Parses a domain table file in the format:
/// ```text
/// <name>\t<length>
/// ```
/// Blank lines and lines starting with `#` are skipped. The last line may
/// leave out the length to declare an unbounded domain.
pub fn parse_domain_table<P: AsRef<Path>>(filepath: P) -> Result<DomainTable, DomainTableError> {
    let file = File::open(filepath)?;
    let reader = BufReader::new(file);

    let mut domains = Vec::new();
    for line_result in reader.lines() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.splitn(2, '\t');
        let name = parts.next().unwrap_or_default();
        domains.push(parse_entry(name, parts.next())?);
    }
    DomainTable::new(domains)
}
