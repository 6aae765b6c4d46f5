//! Localized comment header and fixed notices.

use std::path::Path;

use warden_core::{ReviewConfig, ReviewStatus, WardenError};

use crate::placeholder::{fill, Vars};

const HEADER_ZH: &str = "<!-- warden: review checklist, generated, do not edit this line -->
### 审视清单

请审视者逐项检查，并将每一行最后一列的状态修改为：`{go}`（满足要求）、`{nogo}`（不满足要求）、`{na}`（不涉及）或 `{question}`（有疑问）。`{ongoing}` 表示尚未审视。

|编号|类别|审视要求|说明|审视结果|
|---|---|---|---|---|
";

const HEADER_EN: &str = "<!-- warden: review checklist, generated, do not edit this line -->
### Review checklist

Reviewers, please go through every row and set its last column to `{go}` (meets the requirement), `{nogo}` (does not), `{na}` (not applicable) or `{question}` (needs discussion). `{ongoing}` means not reviewed yet.

|id|category|claim|explain|status|
|---|---|---|---|---|
";

const CONFLICT_ZH: &str =
    "@{owner} 该 PR 存在合并冲突，请解决冲突后重新提交，审视清单将在冲突解决后生成。";
const CONFLICT_EN: &str = "@{owner} this pull request has merge conflicts. Please resolve them and push again; the review checklist is generated once the branch merges cleanly.";

const FAILURE_ZH: &str = "审视清单生成失败，请联系社区基础设施维护者处理。";
const FAILURE_EN: &str =
    "Failed to generate the review checklist. Please contact the infrastructure maintainers.";

/// Comment language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Zh,
    En,
}

impl Locale {
    /// Chinese if the title or body contains a CJK ideograph, English otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_review::header::Locale;
    ///
    /// assert_eq!(Locale::detect("fix build", ""), Locale::En);
    /// assert_eq!(Locale::detect("fix build", "修复构建"), Locale::Zh);
    /// ```
    pub fn detect(title: &str, body: &str) -> Self {
        let cjk = |s: &str| s.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c));
        if cjk(title) || cjk(body) {
            Locale::Zh
        } else {
            Locale::En
        }
    }

    /// Checklist template configured for this locale.
    pub fn template_path(self, config: &ReviewConfig) -> &Path {
        match self {
            Locale::Zh => &config.template_zh,
            Locale::En => &config.template_en,
        }
    }

    /// Header template, placeholders unfilled.
    pub fn header_template(self) -> &'static str {
        match self {
            Locale::Zh => HEADER_ZH,
            Locale::En => HEADER_EN,
        }
    }

    /// Header with the status vocabulary filled in.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::TemplateRender`] if the header names an unknown placeholder.
    pub fn header(self, config: &ReviewConfig) -> Result<String, WardenError> {
        let vars: Vars<'_> = ReviewStatus::ALL
            .iter()
            .map(|s| (s.key(), config.status_token(*s).to_string()))
            .collect();
        fill(self.header_template(), &vars)
    }

    /// Text that identifies this bot's checklist comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_review::header::Locale;
    ///
    /// assert_eq!(Locale::En.fingerprint().chars().count(), 44);
    /// assert_eq!(Locale::En.fingerprint(), Locale::Zh.fingerprint());
    /// ```
    pub fn fingerprint(self) -> String {
        fingerprint(self.header_template())
    }

    /// Notice posted instead of a checklist when the PR does not merge cleanly.
    pub fn conflict_notice(self, author: &str) -> String {
        let template = match self {
            Locale::Zh => CONFLICT_ZH,
            Locale::En => CONFLICT_EN,
        };
        template.replace("{owner}", author)
    }

    /// Notice posted when the evaluation aborts.
    pub fn failure_notice(self) -> &'static str {
        match self {
            Locale::Zh => FAILURE_ZH,
            Locale::En => FAILURE_EN,
        }
    }
}

/// Characters `3..47` of a header template.
pub fn fingerprint(header_template: &str) -> String {
    header_template.chars().skip(3).take(44).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fills_status_tokens() {
        let mut config = ReviewConfig::default();
        config.status.go = Some(":white_check_mark:".into());
        let header = Locale::En.header(&config).unwrap();
        assert!(header.contains("`:white_check_mark:` (meets the requirement)"));
        assert!(header.contains("`ongoing` means"));
        assert!(!header.contains("{go}"));
    }

    #[test]
    fn rendered_header_keeps_fingerprint() {
        let config = ReviewConfig::default();
        for locale in [Locale::Zh, Locale::En] {
            assert!(locale.header(&config).unwrap().contains(&locale.fingerprint()));
        }
    }

    #[test]
    fn fingerprint_is_character_based() {
        assert_eq!(fingerprint("ab审视清单-0123"), "视清单-0123");
    }

    #[test]
    fn conflict_notice_addresses_author() {
        assert!(Locale::En.conflict_notice("carol").starts_with("@carol "));
        assert!(Locale::Zh.conflict_notice("carol").starts_with("@carol "));
    }

    #[test]
    fn locale_selects_template() {
        let config = ReviewConfig::default();
        assert!(Locale::Zh.template_path(&config).ends_with("reviewer_checklist_zh.yaml"));
        assert!(Locale::En.template_path(&config).ends_with("reviewer_checklist_en.yaml"));
    }
}
