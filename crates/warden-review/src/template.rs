//! Checklist templates.
//!
//! A template is a YAML mapping of groups:
//!
//! ```yaml
//! categories:          # optional: key -> display name
//!   code: Code review
//!   customization: Community
//! basic:               # review type -> items
//!   code:
//!     - condition: code-modified
//!       name: static-check
//!       claim: "Run {lang} checks with {checker}"
//!       explain: ...
//! src-openeuler:       # organization group, same shape as basic
//!   package: [...]
//! customization:       # repository name -> items
//!   community: [...]
//! ```
//!
//! Declaration order is kept everywhere.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use warden_core::WardenError;

const BASIC: &str = "basic";
const CUSTOMIZATION: &str = "customization";
const CATEGORIES: &str = "categories";

/// Inclusion rule of a checklist item.
///
/// Tags the template does not know parse as [`Condition::Unconditional`].
///
/// # Examples
///
/// ```
/// use warden_review::template::Condition;
///
/// assert_eq!("repo-introduce".parse::<Condition>().unwrap(), Condition::RepoIntroduce);
/// assert_eq!("sanity_check".parse::<Condition>().unwrap(), Condition::SanityCheck);
/// assert_eq!("anything-else".parse::<Condition>().unwrap(), Condition::Unconditional);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Source files in a known language changed.
    CodeModified,
    /// A file was added.
    NewFileAdd,
    /// A `.spec` file's `License` changed.
    LicenseChange,
    /// A `.spec` file's `Version` changed.
    VersionChange,
    /// A SIG's maintainer set changed.
    MaintainerChange,
    /// A SIG record was touched without a maintainer change.
    SigUpdate,
    /// A repository ownership file was added.
    RepoIntroduce,
    /// A repository was recycled.
    RepoBlacklistChange,
    /// A committer's assignments changed.
    CommitterChange,
    /// Sanity check of the governance tree. No detector yet.
    SanityCheck,
    /// A repository moved to another SIG. No detector yet.
    RepoOwnershipChange,
    /// A branch was declared. No detector yet.
    NewBranchAdd,
    /// Members were added. No detector yet.
    NewMembersAdd,
    /// A SIG record changed. Overlaps `sig-update`; no detector yet.
    SigInfoChange,
    /// Always included.
    #[default]
    Unconditional,
}

impl Condition {
    /// Template tag, or `None` for [`Condition::Unconditional`].
    pub fn tag(self) -> Option<&'static str> {
        Some(match self {
            Condition::CodeModified => "code-modified",
            Condition::NewFileAdd => "new-file-add",
            Condition::LicenseChange => "license-change",
            Condition::VersionChange => "version-change",
            Condition::MaintainerChange => "maintainer-change",
            Condition::SigUpdate => "sig-update",
            Condition::RepoIntroduce => "repo-introduce",
            Condition::RepoBlacklistChange => "repo-blacklist-change",
            Condition::CommitterChange => "committer-change",
            Condition::SanityCheck => "sanity_check",
            Condition::RepoOwnershipChange => "repo-ownership-change",
            Condition::NewBranchAdd => "new-branch-add",
            Condition::NewMembersAdd => "new-members-add",
            Condition::SigInfoChange => "sig-info-change",
            Condition::Unconditional => return None,
        })
    }

    /// Conditions that parse but have no detector; their items are always included.
    pub fn is_undetected(self) -> bool {
        matches!(
            self,
            Condition::SanityCheck
                | Condition::RepoOwnershipChange
                | Condition::NewBranchAdd
                | Condition::NewMembersAdd
                | Condition::SigInfoChange
        )
    }
}

impl FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "code-modified" => Condition::CodeModified,
            "new-file-add" => Condition::NewFileAdd,
            "license-change" => Condition::LicenseChange,
            "version-change" => Condition::VersionChange,
            "maintainer-change" => Condition::MaintainerChange,
            "sig-update" => Condition::SigUpdate,
            "repo-introduce" => Condition::RepoIntroduce,
            "repo-blacklist-change" => Condition::RepoBlacklistChange,
            "committer-change" => Condition::CommitterChange,
            "sanity_check" => Condition::SanityCheck,
            "repo-ownership-change" => Condition::RepoOwnershipChange,
            "new-branch-add" => Condition::NewBranchAdd,
            "new-members-add" => Condition::NewMembersAdd,
            "sig-info-change" => Condition::SigInfoChange,
            other => {
                debug!(tag = other, "unknown condition, item is unconditional");
                Condition::Unconditional
            }
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("always"))
    }
}

/// Where an item sits in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    /// `basic`: applies to every pull request.
    Basic,
    /// Group named after an organization; applies to its repositories.
    Organization(String),
    /// `customization.<repository>`: applies to one repository.
    Customization(String),
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Basic => write!(f, "{BASIC}"),
            Group::Organization(org) => write!(f, "{org}"),
            Group::Customization(repo) => write!(f, "{CUSTOMIZATION}.{repo}"),
        }
    }
}

/// One checklist item as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItemSpec {
    pub group: Group,
    /// Display category of the rows this item produces.
    pub category: String,
    pub claim: String,
    pub explain: String,
    pub condition: Condition,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    claim: String,
    #[serde(default)]
    explain: String,
}

/// A parsed checklist template, items flattened in declaration order.
///
/// # Examples
///
/// ```
/// use warden_review::template::{ChecklistTemplate, Condition, Group};
///
/// let template = ChecklistTemplate::from_yaml("
/// categories:
///   code: Code
/// basic:
///   code:
///     - condition: new-file-add
///       claim: New files carry a license header
///       explain: ''
/// customization:
///   community:
///     - condition: repo-introduce
///       claim: The new repository has an owner
///       explain: ''
/// ").unwrap();
///
/// assert_eq!(template.items().len(), 2);
/// assert_eq!(template.items()[0].category, "Code");
/// assert_eq!(template.items()[1].group, Group::Customization("community".into()));
/// assert_eq!(template.items()[1].condition, Condition::RepoIntroduce);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistTemplate {
    categories: BTreeMap<String, String>,
    items: Vec<ChecklistItemSpec>,
}

impl ChecklistTemplate {
    /// Load a template file.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::FileNotFound`] if `path` does not exist, or a
    /// parse error from [`ChecklistTemplate::from_yaml`].
    pub fn from_file(path: &Path) -> Result<Self, WardenError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WardenError::FileNotFound(path.to_path_buf())
            } else {
                WardenError::Io(e)
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Yaml`] for malformed YAML and
    /// [`WardenError::Parse`] when a group does not have the expected shape.
    pub fn from_yaml(content: &str) -> Result<Self, WardenError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let root: Option<Mapping> = serde_yaml::from_str(content)?;
        let Some(root) = root else {
            return Ok(Self::default());
        };

        let categories: BTreeMap<String, String> = match root.get(CATEGORIES) {
            Some(value) if !value.is_null() => serde_yaml::from_value(value.clone())?,
            _ => BTreeMap::new(),
        };

        let mut items = Vec::new();
        for (key, value) in &root {
            let key = key
                .as_str()
                .ok_or_else(|| WardenError::Parse(format!("group name must be a string: {key:?}")))?;
            if key == CATEGORIES {
                continue;
            }
            for (section, raw_items) in sections(key, value)? {
                let (group, category) = match key {
                    CUSTOMIZATION => (
                        Group::Customization(section.clone()),
                        display(&categories, CUSTOMIZATION),
                    ),
                    BASIC => (Group::Basic, display(&categories, &section)),
                    org => (Group::Organization(org.to_string()), display(&categories, &section)),
                };
                for raw in raw_items {
                    items.push(ChecklistItemSpec {
                        group: group.clone(),
                        category: category.clone(),
                        claim: raw.claim,
                        explain: raw.explain,
                        condition: raw
                            .condition
                            .as_deref()
                            .map(|tag| tag.parse().unwrap_or_default())
                            .unwrap_or_default(),
                        name: raw.name,
                    });
                }
            }
        }

        Ok(Self { categories, items })
    }

    /// All items in declaration order; the position is the item's index.
    pub fn items(&self) -> &[ChecklistItemSpec] {
        &self.items
    }

    /// Display name for a category key, or the key itself.
    pub fn category(&self, key: &str) -> String {
        display(&self.categories, key)
    }
}

fn display(categories: &BTreeMap<String, String>, key: &str) -> String {
    categories.get(key).cloned().unwrap_or_else(|| key.to_string())
}

fn sections(group: &str, value: &Value) -> Result<Vec<(String, Vec<RawItem>)>, WardenError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let mapping = value.as_mapping().ok_or_else(|| {
        WardenError::Parse(format!("group '{group}' must map names to item lists"))
    })?;

    let mut out = Vec::with_capacity(mapping.len());
    for (name, items) in mapping {
        let name = name.as_str().ok_or_else(|| {
            WardenError::Parse(format!("group '{group}' has a non-string key: {name:?}"))
        })?;
        let items: Vec<RawItem> = if items.is_null() {
            Vec::new()
        } else {
            serde_yaml::from_value(items.clone())?
        };
        out.push((name.to_string(), items));
    }
    Ok(out)
}
