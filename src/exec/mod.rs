//! Child process execution with timeouts. Callers are responsible for
//! gating commands through the safety layer first.

pub mod shell;

pub use shell::{execute_shell, run_program, ExecResult};

/// Keep at most `max` characters from the start of `s`.
pub fn truncate_head(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Keep at most `max` characters from the end of `s`.
pub fn truncate_tail(s: &str, max: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(max)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_and_tail_respect_char_boundaries() {
        let s = "héllo wörld";
        assert_eq!(truncate_head(s, 2), "hé");
        assert_eq!(truncate_tail(s, 3), "rld");
        assert_eq!(truncate_tail(s, 100), s);
    }
}
