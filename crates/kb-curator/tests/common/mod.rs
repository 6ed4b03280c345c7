use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Isolated home and project directories for one CLI run
pub struct Sandbox {
    pub home: TempDir,
    pub project: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let sandbox = Self {
            home: TempDir::new().unwrap(),
            project: TempDir::new().unwrap(),
        };
        std::fs::create_dir_all(sandbox.project.path().join(".opencode")).unwrap();
        sandbox
    }

    pub fn queue_dir(&self) -> std::path::PathBuf {
        self.project.path().join(".opencode").join("kb-recommendations")
    }

    /// Run the binary with `args`, feeding `stdin`, with HOME pointed at the sandbox
    pub fn run(&self, args: &[&str], stdin: &str, envs: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_kb-curator"));
        command
            .args(args)
            .env("HOME", self.home.path())
            .env_remove("AI_KB_ANALYZER_INTERNAL")
            .env("AI_KB_BACKEND_URL", "http://127.0.0.1:9")
            .current_dir(self.project.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in envs {
            command.env(key, value);
        }

        let mut child = command.spawn().unwrap();
        if let Some(mut pipe) = child.stdin.take() {
            // The hook may exit before reading stdin
            let _ = pipe.write_all(stdin.as_bytes());
        }
        child.wait_with_output().unwrap()
    }
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
