//! Structured remote commands, rendered to a POSIX shell string only at the transport.

/// One program invocation inside a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: String,
    pub args: Vec<String>,
}

/// A command to run on the speaker: a pipeline of stages, optionally escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    stages: Vec<Stage>,
    privileged: bool,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            stages: vec![Stage {
                program: program.into(),
                args: Vec::new(),
            }],
            privileged: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(stage) = self.stages.last_mut() {
            stage.args.push(arg.into());
        }
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Run the first stage through `sudo`.
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Feed this command's stdout into `next`.
    pub fn pipe(mut self, next: ShellCommand) -> Self {
        self.stages.extend(next.stages);
        self
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Program of the first stage.
    pub fn program(&self) -> &str {
        self.stages
            .first()
            .map(|s| s.program.as_str())
            .unwrap_or_default()
    }

    /// Arguments of the first stage.
    pub fn arguments(&self) -> &[String] {
        self.stages
            .first()
            .map(|s| s.args.as_slice())
            .unwrap_or_default()
    }

    pub fn render(&self) -> String {
        let rendered: Vec<String> = self
            .stages
            .iter()
            .enumerate()
            .map(|(idx, stage)| {
                let mut words = Vec::with_capacity(stage.args.len() + 2);
                if idx == 0 && self.privileged {
                    words.push("sudo".to_string());
                }
                words.push(quote(&stage.program));
                words.extend(stage.args.iter().map(|a| quote(a)));
                words.join(" ")
            })
            .collect();
        rendered.join(" | ")
    }
}

/// Single-quote `word` unless it is made only of characters the shell leaves alone.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
