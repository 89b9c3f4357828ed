use std::io::Write;

use clap_complete::{generate, Shell};

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, "pdk", buf);
}

pub fn detect_current_shell() -> Option<Shell> {
    let shell_var = std::env::var("SHELL").ok()?;
    let basename = shell_var.rsplit('/').next()?;
    parse_shell_name(basename)
}

pub fn parse_shell_name(name: &str) -> Option<Shell> {
    match name.trim().to_ascii_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use clap_complete::Shell;

    use super::{generate_completions, parse_shell_name};

    #[test]
    fn recognizes_common_shells() {
        assert_eq!(parse_shell_name("bash"), Some(Shell::Bash));
        assert_eq!(parse_shell_name("ZSH"), Some(Shell::Zsh));
        assert_eq!(parse_shell_name("pwsh"), Some(Shell::PowerShell));
        assert_eq!(parse_shell_name("csh"), None);
    }

    #[test]
    fn bash_completions_mention_the_binary() {
        let mut buf = Vec::new();
        generate_completions(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).expect("completions should be UTF-8");
        assert!(script.contains("pdk"));
    }
}
