//! Line-oriented command language shared by `lyt run` and `lyt repl`.

use anyhow::{Context, Result, bail};
use lyt_core::MemoryMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replace the host's activity list.
    Activities(Vec<String>),
    /// Replace the running set.
    Running(Vec<String>),
    /// Make an activity current (starting it if needed).
    Current(String),
    Start(String),
    Stop(String),
    Switch(String),
    Mode(MemoryMode),
    Pause(String),
    Info(bool),
    Wait(u64),
    Status,
    Flush,
    /// End the run without releasing layouts, as a crash would.
    Crash,
}

impl Command {
    /// Whether the command only touches the simulated host.
    pub fn is_host_setup(&self) -> bool {
        matches!(
            self,
            Command::Activities(_) | Command::Running(_) | Command::Current(_)
        )
    }
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args = || rest.split_whitespace().map(str::to_string).collect::<Vec<_>>();
    let one = |what: &str| -> Result<String> {
        if rest.is_empty() {
            bail!("'{word}' needs {what}");
        }
        Ok(rest.to_string())
    };

    let command = match word {
        "activities" => Command::Activities(args()),
        "running" => Command::Running(args()),
        "current" => Command::Current(one("an activity")?),
        "start" => Command::Start(one("an activity")?),
        "stop" => Command::Stop(one("an activity")?),
        "switch" => Command::Switch(one("a layout name")?),
        "pause" => Command::Pause(one("a layout name")?),
        "mode" => Command::Mode(
            one("single or multiple")?
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        ),
        "info" => match rest {
            "on" => Command::Info(true),
            "off" => Command::Info(false),
            other => bail!("'info' takes on or off, got '{other}'"),
        },
        "wait" => Command::Wait(
            one("milliseconds")?
                .trim_end_matches("ms")
                .parse()
                .with_context(|| format!("invalid duration '{rest}'"))?,
        ),
        "status" => Command::Status,
        "flush" => Command::Flush,
        "crash" => Command::Crash,
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(command))
}

/// Parse a whole script, reporting the first bad line by number.
pub fn parse_script(content: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(command) = parse_line(line).with_context(|| format!("line {}", idx + 1))? {
            commands.push(command);
        }
    }
    Ok(commands)
}
