//! systemd unit file rendering.

use super::{ProcessUnit, ProtectSystem};
use std::fmt::Write as _;
use std::path::Path;

impl ProcessUnit {
    /// Render this unit as systemd service unit text.
    ///
    /// Output is a pure function of the unit: sections, keys and environment
    /// entries always appear in the same order.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("[Unit]\n");
        let _ = writeln!(out, "Description={}", escape_specifiers(&self.description));
        if !self.after.is_empty() {
            let _ = writeln!(out, "After={}", self.after.join(" "));
            let _ = writeln!(out, "Wants={}", self.after.join(" "));
        }

        out.push_str("\n[Service]\n");
        out.push_str("Type=simple\n");
        let _ = writeln!(out, "ExecStart={}", quote_exec_path(&self.exec_start));
        for (name, value) in self.environment.iter() {
            let _ = writeln!(out, "Environment={}", quote_assignment(name, value));
        }
        if let Some(file) = &self.environment_file {
            let _ = writeln!(
                out,
                "EnvironmentFile={}",
                escape_specifiers(&file.location().display().to_string())
            );
        }
        let _ = writeln!(out, "Restart={}", self.restart.restart);
        let _ = writeln!(out, "RestartSec={}", self.restart.restart_sec);

        let sandbox = &self.sandbox;
        if sandbox.dynamic_user {
            out.push_str("DynamicUser=yes\n");
        }
        let _ = writeln!(
            out,
            "ProtectSystem={}",
            match sandbox.protect_system {
                ProtectSystem::Full => "full",
                ProtectSystem::Strict => "strict",
            }
        );
        let _ = writeln!(out, "ProtectHome={}", yes_no(sandbox.protect_home));
        let _ = writeln!(out, "PrivateTmp={}", yes_no(sandbox.private_tmp));
        let _ = writeln!(out, "NoNewPrivileges={}", yes_no(sandbox.no_new_privileges));
        for path in &sandbox.read_write_paths {
            let _ = writeln!(
                out,
                "ReadWritePaths={}",
                escape_specifiers(&path.display().to_string())
            );
        }
        if let Some(name) = &sandbox.state_directory {
            let _ = writeln!(out, "StateDirectory={}", escape_specifiers(name));
        }

        if !self.wanted_by.is_empty() {
            out.push_str("\n[Install]\n");
            let _ = writeln!(out, "WantedBy={}", self.wanted_by.join(" "));
        }

        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// `%` introduces a specifier in unit files.
fn escape_specifiers(s: &str) -> String {
    s.replace('%', "%%")
}

/// Quote `NAME=value` for `Environment=`.
fn quote_assignment(name: &str, value: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + value.len() + 3);
    quoted.push('"');
    for c in name.chars().chain(std::iter::once('=')).chain(value.chars()) {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '%' => quoted.push_str("%%"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Quote the executable path for `ExecStart=` when it needs it.
fn quote_exec_path(path: &Path) -> String {
    let raw = path.display().to_string();
    let escaped = escape_specifiers(&raw).replace('$', "$$");
    if escaped
        .chars()
        .any(|c| c.is_whitespace() || c == '"' || c == '\\' || c == '\'')
    {
        format!(
            "\"{}\"",
            escaped.replace('\\', "\\\\").replace('"', "\\\"")
        )
    } else {
        escaped
    }
}
