//! Incremental scenarios: the pseudo-up-to-date fast path, prepend
//! semantics, and declaration-output stability detection.

use std::time::{Duration, SystemTime};

use tsbuild_build::{BuildOptions, UpToDateStatus};
use tsbuild_common::ExitStatus;
use tsbuild_conformance::{TestEnv, Workspace};

const UPSTREAM: &str = r#"{
    "compilerOptions": { "outDir": "out", "rootDir": "src", "composite": true },
    "files": ["src/a.ts"]
}"#;

fn downstream(prepend: bool) -> String {
    format!(
        r#"{{
            "compilerOptions": {{ "outDir": "out", "rootDir": "src" }},
            "files": ["src/b.ts"],
            "references": [{{ "path": "../a", "prepend": {prepend} }}]
        }}"#
    )
}

fn future(seconds: u64) -> SystemTime {
    SystemTime::now() + Duration::from_secs(seconds)
}

/// Builds A and B, then touches A's source without changing its export
/// surface, and returns a fresh builder session for the second run.
fn build_then_touch_upstream(ws: &Workspace, env: &TestEnv, prepend: bool) {
    ws.project("a", UPSTREAM);
    ws.write("a/src/a.ts", "export const a = 1;\nconst internal = 0;");
    ws.project("b", &downstream(prepend));
    ws.write("b/src/b.ts", "export const b = 2;");

    let mut first = env.builder(BuildOptions::default(), &["b"]);
    assert_eq!(first.build_all(), ExitStatus::Success);

    // Edit a non-exported line; declaration bytes stay identical. The input
    // must become strictly newer than every output.
    ws.write("a/src/a.ts", "export const a = 1;\nconst internal = 1;");
    ws.set_mtime("a/src/a.ts", future(10));
}

#[test]
fn declaration_stable_rebuild_touches_downstream_only() {
    let ws = Workspace::new();
    let env = TestEnv::new(&ws);
    build_then_touch_upstream(&ws, &env, false);

    let b_js_before = ws.mtime("b/out/b.js");
    let emitted_before = env.emit_count();

    let mut second = env.builder(BuildOptions::default(), &["b"]);
    let b = second.project_id(&ws.abs("b/tsconfig.json"));
    assert_eq!(second.build_all(), ExitStatus::Success);

    // A was rebuilt with identical declaration bytes.
    let a = second.project_id(&ws.abs("a/tsconfig.json"));
    match second.cached_status(a) {
        Some(UpToDateStatus::UpToDate(info)) => {
            let changed = info.newest_declaration_change.expect("declaration time");
            assert!(changed < tsbuild_common::maximum_time());
            // The recorded change time predates B's outputs.
            assert!(changed <= ws.mtime("b/out/b.js"));
        }
        other => panic!("expected UpToDate for a, got {other:?}"),
    }

    // B got only a timestamp refresh: no emit, same bytes, newer mtime.
    let emitted: Vec<_> = env.emitted().split_off(emitted_before);
    assert!(
        !emitted.iter().any(|p| p.ends_with("b.js")),
        "B must not re-emit"
    );
    assert!(ws.mtime("b/out/b.js") > b_js_before);
    assert!(matches!(
        second.cached_status(b),
        Some(UpToDateStatus::UpToDate(_))
    ));
}

#[test]
fn downstream_classifies_pseudo_up_to_date() {
    let ws = Workspace::new();
    let env = TestEnv::new(&ws);
    build_then_touch_upstream(&ws, &env, false);

    let mut second = env.builder(BuildOptions::default(), &["b"]);
    let a = second.project_id(&ws.abs("a/tsconfig.json"));
    let b = second.project_id(&ws.abs("b/tsconfig.json"));

    // Rebuild A by itself, then ask for B's status.
    assert!(matches!(
        second.project_status(a),
        UpToDateStatus::OutOfDateWithSelf { .. }
    ));
    second.build_single_project(a);
    assert!(matches!(
        second.project_status(b),
        UpToDateStatus::UpToDateWithUpstreamTypes(_)
    ));
}

#[test]
fn prepend_forces_full_downstream_rebuild() {
    let ws = Workspace::new();
    let env = TestEnv::new(&ws);
    build_then_touch_upstream(&ws, &env, true);

    let emitted_before = env.emit_count();
    let mut second = env.builder(BuildOptions::default(), &["b"]);
    let b = second.project_id(&ws.abs("b/tsconfig.json"));
    assert_eq!(second.build_all(), ExitStatus::Success);

    // B re-emitted despite the stable upstream declarations.
    let emitted: Vec<_> = env.emitted().split_off(emitted_before);
    assert!(
        emitted.iter().any(|p| p.ends_with("b.js")),
        "B must re-emit under prepend"
    );
    assert!(matches!(
        second.cached_status(b),
        Some(UpToDateStatus::UpToDate(_))
    ));
}

#[test]
fn changed_export_surface_rebuilds_downstream() {
    let ws = Workspace::new();
    ws.project("a", UPSTREAM);
    ws.write("a/src/a.ts", "export const a = 1;");
    ws.project("b", &downstream(false));
    ws.write("b/src/b.ts", "export const b = 2;");

    let env = TestEnv::new(&ws);
    env.builder(BuildOptions::default(), &["b"]).build_all();

    // Change the export surface; declaration bytes will differ.
    ws.write("a/src/a.ts", "export const a = 1;\nexport const extra = 3;");
    ws.set_mtime("a/src/a.ts", future(10));

    let emitted_before = env.emit_count();
    let mut second = env.builder(BuildOptions::default(), &["b"]);
    assert_eq!(second.build_all(), ExitStatus::Success);

    let emitted: Vec<_> = env.emitted().split_off(emitted_before);
    assert!(emitted.iter().any(|p| p.ends_with("a.d.ts")));
    assert!(
        emitted.iter().any(|p| p.ends_with("b.js")),
        "B must rebuild after an export-surface change"
    );
}

#[test]
fn declaration_surface_helper_is_stable() {
    let before = tsbuild_conformance::declaration_surface(
        b"export const a = 1;\nconst internal = 0;\n",
    );
    let after = tsbuild_conformance::declaration_surface(
        b"export const a = 1;\nconst internal = 42;\n",
    );
    assert_eq!(before, after);

    let changed = tsbuild_conformance::declaration_surface(
        b"export const a = 1;\nexport const b = 2;\n",
    );
    assert_ne!(before, changed);
}
