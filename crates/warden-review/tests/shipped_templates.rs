use std::path::PathBuf;

use warden_core::{ChangeEntry, ChangeStatus};
use warden_governance::{FactSet, MaintainerChange};
use warden_review::checklist::DiffEvidence;
use warden_review::template::Group;
use warden_review::{ChecklistBuilder, ChecklistContext, ChecklistTemplate, Condition};

fn shipped(name: &str) -> ChecklistTemplate {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name);
    ChecklistTemplate::from_file(&path).unwrap()
}

#[test]
fn both_locales_declare_the_same_items() {
    let zh = shipped("reviewer_checklist_zh.yaml");
    let en = shipped("reviewer_checklist_en.yaml");

    let shape = |t: &ChecklistTemplate| {
        t.items()
            .iter()
            .map(|i| (i.group.clone(), i.condition, i.name.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&zh), shape(&en));
    assert!(en
        .items()
        .iter()
        .any(|i| i.group == Group::Customization("community".into())
            && i.condition == Condition::CommitterChange));
}

#[test]
fn community_checklist_renders_without_warnings() {
    let template = shipped("reviewer_checklist_en.yaml");
    let mut facts = FactSet::default();
    facts.maintainer_changes.insert(
        "sig-storage".into(),
        MaintainerChange {
            removed: vec!["bob".into()],
            current_owners: vec!["alice".into()],
            ..Default::default()
        },
    );
    facts.touched_sigs.insert("sig-storage".into(), vec!["alice".into()]);
    facts.touched_sigs.insert("sig-net".into(), vec!["dave".into()]);
    facts.committer_changes.insert("erin".into());

    let context = ChecklistContext {
        owner: "openeuler".into(),
        repo: "community".into(),
        target_branch: "master".into(),
        evidence: Some(DiffEvidence {
            changes: vec![ChangeEntry::new(ChangeStatus::Modified, "src/main.py")],
            languages: vec![("Python".into(), "pylint-3".into())],
            ..Default::default()
        }),
    };

    let checklist = ChecklistBuilder::new("master").build(&template, Some(&facts), &context);
    assert!(checklist.warnings.is_empty(), "{:?}", checklist.warnings);

    let claims: Vec<&str> = checklist.rows.iter().map(|r| r.claim.as_str()).collect();
    assert!(claims.contains(&"Python code passes the pylint-3 static check"));
    assert!(claims.contains(&"sig-storage maintainer change is approved by all members: @alice"));
    assert!(claims.contains(&"sig-net information update is confirmed by @dave"));
    assert!(claims.contains(&"@erin accepts the committer assignment"));
    assert!(!claims.iter().any(|c| c.starts_with("sig-storage information")));
    let ids: Vec<usize> = checklist.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (0..checklist.rows.len()).collect::<Vec<_>>());
}

#[test]
fn shipped_items_all_have_detectors() {
    for name in ["reviewer_checklist_zh.yaml", "reviewer_checklist_en.yaml"] {
        let template = shipped(name);
        let undetected: Vec<_> = template
            .items()
            .iter()
            .filter(|i| i.condition.is_undetected())
            .map(|i| i.condition)
            .collect();
        assert!(undetected.is_empty(), "{name}: {undetected:?}");
    }
}
