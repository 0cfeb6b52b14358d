use std::collections::BTreeMap;
use std::path::PathBuf;

use ruby_annotate_engine::annotations::format_for_hotkey;
use ruby_annotate_engine::editing::{Cmd, Document, DocumentError, PositionParseError, Selection};
use ruby_annotate_engine::models::Format;
use ruby_annotate_engine::serialize::{Rendered, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Command '{0}' needs a value")]
    MissingValue(String),
    #[error("Invalid selection in '{token}': {source}")]
    InvalidSelection {
        token: String,
        source: PositionParseError,
    },
    #[error("Option {0} needs a value")]
    MissingOptionValue(String),
    #[error("Unknown option {0}")]
    UnknownOption(String),
    #[error("Command '{token}' failed: {source}")]
    Command {
        token: String,
        source: DocumentError,
    },
}

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub document: Option<PathBuf>,
    /// Write the edited document tree here as JSON
    pub save: Option<PathBuf>,
    /// Write the fixed markup here
    pub out: Option<PathBuf>,
    pub commands: Vec<String>,
}

/// One step of a command script
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Run(Cmd),
    Serialize,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--config PATH] [--save PATH] [--out PATH] [DOCUMENT.json] [COMMAND...]\n\
         Commands: select:P.P:O[-P.P:O] deselect type:TEXT bold italic underline <hotkey>\n\
         \x20         ruby:KANA ruby:KANJI:KANA unruby serialize"
    )
}

/// Options come first; the first remaining argument is the document when it
/// names a `.json` file, everything after is the command script
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Invocation, ScriptError> {
    let mut invocation = Invocation::default();
    let mut args = args.into_iter().peekable();

    while let Some(flag) = args.next_if(|arg| arg.starts_with("--")) {
        let target = match flag.as_str() {
            "--config" => &mut invocation.config,
            "--save" => &mut invocation.save,
            "--out" => &mut invocation.out,
            _ => return Err(ScriptError::UnknownOption(flag.clone())),
        };
        let value = args
            .next()
            .ok_or_else(|| ScriptError::MissingOptionValue(flag.clone()))?;
        *target = Some(PathBuf::from(value));
    }

    invocation.document = args
        .next_if(|arg| arg.ends_with(".json"))
        .map(PathBuf::from);
    invocation.commands = args.collect();
    Ok(invocation)
}

fn value<'a>(token: &'a str, rest: &'a str) -> Result<&'a str, ScriptError> {
    if rest.is_empty() {
        Err(ScriptError::MissingValue(token.to_string()))
    } else {
        Ok(rest)
    }
}

pub fn parse_step(token: &str, hotkeys: &BTreeMap<String, Format>) -> Result<Step, ScriptError> {
    if let Some(rest) = token.strip_prefix("select:") {
        let selection = value(token, rest)?.parse::<Selection>().map_err(|source| {
            ScriptError::InvalidSelection {
                token: token.to_string(),
                source,
            }
        })?;
        return Ok(Step::Run(Cmd::Select { selection }));
    }
    if let Some(rest) = token.strip_prefix("type:") {
        return Ok(Step::Run(Cmd::InsertText {
            text: value(token, rest)?.to_string(),
        }));
    }
    if let Some(rest) = token.strip_prefix("ruby:") {
        // an empty reading is passed through; the add-ruby flow ignores it
        let cmd = match rest.split_once(':') {
            Some((kanji, kana)) => Cmd::InsertRuby {
                kanji: kanji.to_string(),
                kana: kana.to_string(),
            },
            None => Cmd::AddRuby {
                kana: rest.to_string(),
            },
        };
        return Ok(Step::Run(cmd));
    }

    match token {
        "deselect" => return Ok(Step::Run(Cmd::Deselect)),
        "unruby" => return Ok(Step::Run(Cmd::RemoveRuby)),
        "serialize" => return Ok(Step::Serialize),
        _ => {}
    }

    token
        .parse::<Format>()
        .ok()
        .or_else(|| format_for_hotkey(hotkeys, token))
        .map(|format| Step::Run(Cmd::ToggleMark { format }))
        .ok_or_else(|| ScriptError::UnknownCommand(token.to_string()))
}

/// Serialize, log both forms, and hand the result back
pub fn serialize_and_log(serializer: &Serializer, doc: &Document) -> Rendered {
    let rendered = serializer.render(doc);
    log::info!("serialized (raw): {}", rendered.raw);
    log::info!("serialized (fixed): {}", rendered.fixed);
    rendered
}

/// Run a command script against `doc`, ending with a serialize-and-log
pub fn run(
    doc: &mut Document,
    tokens: &[String],
    hotkeys: &BTreeMap<String, Format>,
    serializer: &Serializer,
) -> Result<Rendered, ScriptError> {
    for token in tokens {
        match parse_step(token, hotkeys)? {
            Step::Run(cmd) => {
                let patch = doc.apply(cmd).map_err(|source| ScriptError::Command {
                    token: token.clone(),
                    source,
                })?;
                if patch.is_noop() {
                    log::info!("{token}: no change (version {})", patch.version);
                } else {
                    log::info!(
                        "{token}: {} block(s) changed (version {})",
                        patch.changed.len(),
                        patch.version
                    );
                }
            }
            Step::Serialize => {
                serialize_and_log(serializer, doc);
            }
        }
    }
    Ok(serialize_and_log(serializer, doc))
}
