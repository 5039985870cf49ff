mod common;

use chrono::Local;
use serde_json::json;

use common::{git, git_available, init_repo, TestProject, AGENT};
use pm_agents::agent::audit::{read_entries, AuditLog};
use pm_agents::agent::tools::{to_wire, ToolOutput};
use pm_agents::error::ToolError;

// ============================================================
// Files
// ============================================================

#[tokio::test]
async fn write_then_read_a_line_range() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let written = exec
        .execute(
            "write_file",
            &json!({"path": "src/app.ts", "content": "one\ntwo\nthree\nfour\n"}),
        )
        .await
        .unwrap();
    match written {
        ToolOutput::WriteFile(out) => {
            assert_eq!(out.path, "src/app.ts");
            assert_eq!(out.bytes_written, 19);
        }
        other => panic!("unexpected output: {other:?}"),
    }

    let read = exec
        .execute(
            "read_file",
            &json!({"path": "src/app.ts", "start_line": 2, "end_line": 3}),
        )
        .await
        .unwrap();
    match read {
        ToolOutput::ReadFile(out) => {
            assert_eq!(out.content, "two\nthree\n");
            assert_eq!(out.lines, 2);
        }
        other => panic!("unexpected output: {other:?}"),
    }
}

#[tokio::test]
async fn missing_file_reports_not_found() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let err = exec
        .execute("read_file", &json!({"path": "src/nope.ts"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "File not found: src/nope.ts");
}

#[tokio::test]
async fn oversized_file_is_refused() {
    let project = TestProject::new();
    let mut config = project.config();
    config.safety.max_file_read_size = 10;
    project.write("big.ts", "0123456789abcdef");
    let mut exec = project.executor(&config, 3);

    let err = exec
        .execute("read_file", &json!({"path": "big.ts"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::FileTooLarge { size: 16, max: 10, .. }
    ));
}

#[tokio::test]
async fn edit_replaces_first_occurrence_and_counts_all() {
    let project = TestProject::new();
    project.write("src/a.ts", "foo(); foo(); foo();\n");
    let mut exec = project.executor(&project.config(), 3);

    let out = exec
        .execute(
            "edit_file",
            &json!({"path": "src/a.ts", "old_string": "foo()", "new_string": "bar()"}),
        )
        .await
        .unwrap();
    match out {
        ToolOutput::EditFile(out) => {
            assert_eq!(out.occurrences_found, 3);
            assert_eq!(out.replaced, 1);
        }
        other => panic!("unexpected output: {other:?}"),
    }
    assert_eq!(project.read("src/a.ts"), "bar(); foo(); foo();\n");
}

#[tokio::test]
async fn repeating_an_applied_edit_fails_without_changes() {
    let project = TestProject::new();
    project.write("src/a.ts", "const x = 1;\n");
    let mut exec = project.executor(&project.config(), 3);
    let args = json!({"path": "src/a.ts", "old_string": "const x = 1;", "new_string": "const x = 2;"});

    exec.execute("edit_file", &args).await.unwrap();
    let err = exec.execute("edit_file", &args).await.unwrap_err();

    assert_eq!(err.to_string(), "String not found in file: const x = 1;...");
    assert_eq!(project.read("src/a.ts"), "const x = 2;\n");
}

#[tokio::test]
async fn forbidden_and_escaping_paths_never_touch_disk() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let denied = exec
        .execute("write_file", &json!({"path": ".env", "content": "KEY=1"}))
        .await
        .unwrap_err();
    assert_eq!(denied.to_string(), "Access denied to path: .env");
    assert!(!project.path(".env").exists());

    let outside = exec
        .execute("write_file", &json!({"path": "../escape.ts", "content": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(outside, ToolError::OutsideProject(_)));
    assert!(!project.root.parent().unwrap().join("escape.ts").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn write_through_dangling_symlink_stays_inside_project() {
    let project = TestProject::new();
    let outside = project.root.parent().unwrap().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    std::os::unix::fs::symlink(outside.join("pwned.txt"), project.path("notes.md")).unwrap();
    let mut exec = project.executor(&project.config(), 3);

    let err = exec
        .execute("write_file", &json!({"path": "notes.md", "content": "hello"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::OutsideProject(_)));
    assert!(!outside.join("pwned.txt").exists());
}

#[tokio::test]
async fn io_failure_becomes_an_error_result_and_is_audited() {
    let project = TestProject::new();
    std::fs::create_dir_all(project.path("src/components")).unwrap();
    let config = project.config();
    let mut exec = project.executor(&config, 3);

    let result = exec
        .execute(
            "write_file",
            &json!({"path": "src/components", "content": "export {}"}),
        )
        .await;

    let err = result.as_ref().unwrap_err();
    assert!(matches!(err, ToolError::Io { .. }), "got {err:?}");
    let wire = to_wire(&result);
    let fields = wire.as_object().unwrap();
    assert_eq!(fields.len(), 1);
    assert!(fields["error"].as_str().unwrap().starts_with("Failed to write file"));
    assert!(project.path("src/components").is_dir());

    let path = AuditLog::new(&config.logs_dir).path_for(Local::now().date_naive());
    let entries = read_entries(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tool, "write_file");
    assert!(!entries[0].success);
}

// ============================================================
// Commands
// ============================================================

#[tokio::test]
async fn allowed_command_runs_in_project_root() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let out = exec
        .execute("run_command", &json!({"command": "echo hello"}))
        .await
        .unwrap();
    match out {
        ToolOutput::RunCommand(out) => {
            assert_eq!(out.stdout, "hello\n");
            assert_eq!(out.exit_code, Some(0));
            assert!(out.success);
        }
        other => panic!("unexpected output: {other:?}"),
    }
}

#[tokio::test]
async fn dangerous_command_is_denied() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let err = exec
        .execute("run_command", &json!({"command": "rm -rf /"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Command not allowed: rm -rf /");

    let wire = to_wire(&Err(err));
    assert_eq!(wire, json!({"error": "Command not allowed: rm -rf /"}));
}

#[tokio::test]
async fn working_directory_must_stay_inside_project() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let err = exec
        .execute(
            "run_command",
            &json!({"command": "ls", "working_directory": "../"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::OutsideProject(_)));
}

// ============================================================
// Discovery
// ============================================================

#[tokio::test]
async fn list_directory_flat_and_recursive() {
    let project = TestProject::new();
    project.write("src/b.ts", "");
    project.write("src/a.ts", "");
    project.write("src/lib/c.ts", "");
    project.write("src/node_modules/pkg/index.js", "");
    let mut exec = project.executor(&project.config(), 3);

    let flat = exec
        .execute("list_directory", &json!({"path": "src"}))
        .await
        .unwrap();
    match flat {
        ToolOutput::ListDirectory(out) => {
            assert_eq!(out.items, vec!["a.ts", "b.ts", "lib", "node_modules"]);
            assert_eq!(out.count, 4);
        }
        other => panic!("unexpected output: {other:?}"),
    }

    let recursive = exec
        .execute("list_directory", &json!({"path": "src", "recursive": true}))
        .await
        .unwrap();
    match recursive {
        ToolOutput::ListDirectory(out) => {
            assert_eq!(out.items, vec!["a.ts", "b.ts", "lib/c.ts"]);
        }
        other => panic!("unexpected output: {other:?}"),
    }

    let err = exec
        .execute("list_directory", &json!({"path": "src/a.ts"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not a directory: src/a.ts");
}

#[tokio::test]
async fn search_truncates_and_skips_forbidden_files() {
    let project = TestProject::new();
    project.write(
        "src/a.ts",
        "// TODO one\nconst a = 1;\n// TODO two\n// TODO three\n// TODO four\n",
    );
    project.write("src/secrets.ts", "// TODO hidden\n");
    let mut exec = project.executor(&project.config(), 3);

    let out = exec
        .execute(
            "search_codebase",
            &json!({"pattern": "TODO", "file_pattern": "*.ts", "max_results": 3}),
        )
        .await
        .unwrap();
    match out {
        ToolOutput::Search(out) => {
            assert_eq!(out.count, 3);
            assert!(out.truncated);
            assert!(out.matches.iter().all(|m| m.file == "src/a.ts"));
            assert_eq!(out.matches[0].line, 1);
            assert_eq!(out.matches[0].text, "// TODO one");
            assert_eq!(out.matches[1].line, 3);
        }
        other => panic!("unexpected output: {other:?}"),
    }

    let err = exec
        .execute("search_codebase", &json!({"pattern": "("}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Search(_)));
}

#[tokio::test]
async fn search_skips_files_over_the_read_limit() {
    let project = TestProject::new();
    let mut config = project.config();
    config.safety.max_file_read_size = 64;
    project.write("dist/bundle.js", &format!("// TODO minified\n{}\n", "x".repeat(200)));
    project.write("src/app.js", "// TODO small\n");
    let mut exec = project.executor(&config, 3);

    let out = exec
        .execute("search_codebase", &json!({"pattern": "TODO"}))
        .await
        .unwrap();
    match out {
        ToolOutput::Search(out) => {
            let files: Vec<&str> = out.matches.iter().map(|m| m.file.as_str()).collect();
            assert_eq!(files, vec!["src/app.js"]);
            assert!(!out.truncated);
        }
        other => panic!("unexpected output: {other:?}"),
    }
}

// ============================================================
// Git
// ============================================================

#[tokio::test]
async fn commit_quota_is_checked_before_git_runs() {
    let project = TestProject::new();
    // Not a repository: reaching git would produce a different error.
    let mut exec = project.executor(&project.config(), 0);

    let err = exec
        .execute("git_commit", &json!({"message": "Add feature"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Commit limit reached (0 per day)");
    assert_eq!(exec.commits_made(), 0);
}

#[tokio::test]
async fn commit_refuses_forbidden_files() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let err = exec
        .execute(
            "git_commit",
            &json!({"message": "oops", "files": ["src/app.ts", ".env"]}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot commit forbidden file: .env");
}

#[tokio::test]
async fn commit_is_prefixed_and_counted() {
    if !git_available() {
        return;
    }
    let project = TestProject::new();
    init_repo(&project.root);
    project.write("src/app.ts", "export const a = 1;\n");
    let mut exec = project.executor(&project.config(), 1);

    let out = exec
        .execute(
            "git_commit",
            &json!({"message": "Add app module", "files": ["src/app.ts"]}),
        )
        .await
        .unwrap();
    match out {
        ToolOutput::GitCommit(out) => {
            assert_eq!(out.message, format!("[{AGENT}] Add app module"));
            assert_eq!(out.commits_today, 1);
        }
        other => panic!("unexpected output: {other:?}"),
    }
    let log = git(&project.root, &["log", "--format=%s"]);
    assert_eq!(log.trim(), "[PM-Test] Add app module");

    let status = exec.execute("git_status", &json!({})).await.unwrap();
    assert!(matches!(status, ToolOutput::GitStatus(s) if s.clean));

    project.write("src/app.ts", "export const a = 2;\n");
    let err = exec
        .execute("git_commit", &json!({"message": "Second"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::CommitQuotaReached(1)));
}

// ============================================================
// Documents and work log
// ============================================================

const BACKLOG: &str = "# PM-Test Backlog\n\n> **Last Updated:** 2020-01-01 00:00\n\n## Ready\n- T-1 Improve empty states\n- T-2 Add keyboard shortcuts\n";
const HANDOFFS: &str = "# Handoffs\n\n## Active Handoffs\n\n## Resolved\n";

#[tokio::test]
async fn update_backlog_tags_task_and_adds_note() {
    let project = TestProject::new();
    project.write("docs/pm-agents/agents/PM-Test/BACKLOG.md", BACKLOG);
    let mut exec = project.executor(&project.config(), 3);

    exec.execute(
        "update_backlog",
        &json!({"task_id": "T-2", "status": "in_progress", "notes": "started on search box"}),
    )
    .await
    .unwrap();

    let backlog = project.read("docs/pm-agents/agents/PM-Test/BACKLOG.md");
    assert!(backlog.contains(
        "- T-2 Add keyboard shortcuts [status: in_progress]\n  - Note: started on search box"
    ));
    assert!(!backlog.contains("2020-01-01 00:00"));

    let missing = exec
        .execute("update_backlog", &json!({"task_id": "T-9", "status": "completed"}))
        .await
        .unwrap_err();
    assert_eq!(missing.to_string(), "Task T-9 not found in backlog");

    for blank in ["", "   "] {
        let err = exec
            .execute("update_backlog", &json!({"task_id": blank, "status": "completed"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }), "got {err:?}");
    }
    assert_eq!(project.read("docs/pm-agents/agents/PM-Test/BACKLOG.md"), backlog);

    let bad_status = exec
        .execute("update_backlog", &json!({"task_id": "T-1", "status": "done"}))
        .await
        .unwrap_err();
    assert!(matches!(bad_status, ToolError::InvalidArguments { .. }));
}

#[tokio::test]
async fn handoff_is_inserted_under_active_heading() {
    let project = TestProject::new();
    project.write("docs/pm-agents/HANDOFFS.md", HANDOFFS);
    let mut exec = project.executor(&project.config(), 3);

    let out = exec
        .execute(
            "create_handoff",
            &json!({"to_pm": "PM-Design", "issue": "Buttons need focus rings", "priority": "high"}),
        )
        .await
        .unwrap();
    let id = match out {
        ToolOutput::CreateHandoff(out) => {
            assert_eq!(out.to, "PM-Design");
            out.handoff_id
        }
        other => panic!("unexpected output: {other:?}"),
    };

    let board = project.read("docs/pm-agents/HANDOFFS.md");
    let active = board.find("## Active Handoffs").unwrap();
    let entry = board.find(&format!("### [{id}] Buttons need focus rings")).unwrap();
    let resolved = board.find("## Resolved").unwrap();
    assert!(active < entry && entry < resolved);
    assert!(board.contains("- **From:** PM-Test"));
    assert!(board.contains("- **Priority:** High"));
}

#[tokio::test]
async fn log_work_accumulates_entries() {
    let project = TestProject::new();
    let mut exec = project.executor(&project.config(), 3);

    let out = exec
        .execute(
            "log_work",
            &json!({"summary": "Polished toolbar", "files_changed": ["src/toolbar.ts"]}),
        )
        .await
        .unwrap();
    assert_eq!(to_wire(&Ok(out)), json!({"logged": "Polished toolbar"}));

    let log = exec.work_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].summary, "Polished toolbar");
    assert_eq!(log[0].files_changed, vec!["src/toolbar.ts"]);
    assert!(log[0].details.is_none());
}

// ============================================================
// Audit trail
// ============================================================

#[tokio::test]
async fn every_call_is_audited_once() {
    let project = TestProject::new();
    let config = project.config();
    let mut exec = project.executor(&config, 3);

    exec.execute("log_work", &json!({"summary": "ok"})).await.unwrap();
    exec.execute("read_file", &json!({"path": ".env"}))
        .await
        .unwrap_err();
    let unknown = exec.execute("frobnicate", &json!({})).await.unwrap_err();
    assert_eq!(unknown.to_string(), "Unknown tool: frobnicate");

    let path = AuditLog::new(&config.logs_dir).path_for(Local::now().date_naive());
    let entries = read_entries(&path).unwrap();
    let summary: Vec<(&str, bool)> = entries
        .iter()
        .map(|e| (e.tool.as_str(), e.success))
        .collect();
    assert_eq!(
        summary,
        vec![("log_work", true), ("read_file", false), ("frobnicate", false)]
    );
    assert!(entries.iter().all(|e| e.agent == AGENT));
    assert_eq!(entries[1].inputs, json!({"path": ".env"}));
}
