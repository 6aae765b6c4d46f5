use warden_core::{ChangeEntry, ChangeStatus};
use warden_difflens::fields::field_changed;
use warden_difflens::{ChangeFilter, DiffReader, StaticDiff};

#[test]
fn governance_listing_parses_canned_output() {
    let listing = "\
M\tsig/sig-storage/sig-info.yaml
A\tsig/new-sig/openeuler/foo.yaml
D\tsig/x/src-openeuler/p/pkg.yaml
R100\tsig/y/src-openeuler/q/qux.yaml\tsig/sig-recycle/src-openeuler/q/qux.yaml
R086\tsig/y/src-openeuler/r/rab.yaml\tsig/z/src-openeuler/r/rab.yaml
";
    let reader = DiffReader::new(StaticDiff::new(listing));
    let entries = reader.list_changed_files("master", ChangeFilter::All).unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries[3],
        ChangeEntry::renamed(
            "sig/y/src-openeuler/q/qux.yaml",
            "sig/sig-recycle/src-openeuler/q/qux.yaml"
        )
    );
    assert!(entries.iter().all(|e| !e.path.contains("rab.yaml")));
    assert_eq!(entries[2].status, ChangeStatus::Deleted);
}

#[test]
fn spec_version_change_end_to_end() {
    let diff = "\
diff --git a/pkg.spec b/pkg.spec
index 1111111..2222222 100644
--- a/pkg.spec
+++ b/pkg.spec
@@ -1,4 +1,4 @@
 Name:    pkg
-Version: 1.0
+Version: 1.1
 Release: 1
 License: MIT
";
    let reader = DiffReader::new(StaticDiff::new("M\tpkg.spec\n").with_file("pkg.spec", diff));
    let lines = reader.file_diff("master", "pkg.spec").unwrap();

    assert!(field_changed(&lines, "Version"));
    assert!(!field_changed(&lines, "License"));
}
