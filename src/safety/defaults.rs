//! Default guardrail lists used when the config does not override them.

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Path substrings agents may never touch. Includes the agents' own control
/// code and anything that looks like a secret store.
pub fn default_forbidden_paths() -> Vec<String> {
    owned(&[
        ".env",
        ".env.local",
        ".env.production",
        "node_modules/",
        ".git/",
        "pm_core/",
        "credentials",
        "secrets",
        ".ssh/",
    ])
}

/// Filename globs agents may never touch.
pub fn default_forbidden_patterns() -> Vec<String> {
    owned(&[
        "*.key",
        "*.pem",
        "*.cert",
        "*secret*",
        "*credential*",
        "*.env*",
    ])
}

/// Commands permitted as the first token of a command line.
pub fn default_allowed_commands() -> Vec<String> {
    owned(&[
        "npm", "npx", "node", "git", "ls", "cat", "grep", "find", "echo", "pwd", "which",
    ])
}

/// Substrings that reject a command line regardless of its first token.
/// Network clients are included so agents cannot reach outside the machine.
pub fn default_forbidden_commands() -> Vec<String> {
    owned(&[
        "rm -rf", "sudo", "chmod", "chown", "kill", "pkill", "shutdown", "reboot", "curl", "wget",
        "ssh", "scp",
    ])
}
