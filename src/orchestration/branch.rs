//! Daily work branch: all commits of a run land on `{prefix}/{YYYY-MM-DD}`.

use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::exec::run_program;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn branch_name(prefix: &str, date: chrono::NaiveDate) -> String {
    format!("{prefix}/{}", date.format("%Y-%m-%d"))
}

/// Check out today's branch, creating it from HEAD if needed. On any git
/// failure the run continues on whatever is checked out and `"current"` is
/// returned.
pub async fn ensure_work_branch(project_root: &Path, prefix: &str) -> String {
    let branch = branch_name(prefix, Local::now().date_naive());

    match checkout(project_root, &branch).await {
        Ok(()) => {
            tracing::info!(branch = %branch, "Working on branch");
            branch
        }
        Err(e) => {
            tracing::warn!(branch = %branch, error = %e, "Branch setup failed, staying on current branch");
            "current".to_string()
        }
    }
}

async fn checkout(project_root: &Path, branch: &str) -> anyhow::Result<()> {
    let listed = run_program("git", &["branch", "--list", branch], project_root, GIT_TIMEOUT).await?;
    if !listed.success() {
        anyhow::bail!("git branch --list failed: {}", listed.stderr.trim());
    }

    let exists = listed
        .stdout
        .lines()
        .any(|l| l.trim_start_matches(['*', '+', ' ']) == branch);
    let args: &[&str] = if exists {
        &["checkout", branch]
    } else {
        &["checkout", "-b", branch]
    };

    let result = run_program("git", args, project_root, GIT_TIMEOUT).await?;
    if !result.success() {
        anyhow::bail!("git {} failed: {}", args.join(" "), result.stderr.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_is_prefixed_and_dated() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(branch_name("pm-agents", date), "pm-agents/2025-01-31");
    }

    #[tokio::test]
    async fn outside_a_repository_stays_on_current() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(ensure_work_branch(tmp.path(), "pm-agents").await, "current");
    }
}
