// Custom event metadata pragmas
//
// Authors describe an event in comment lines of the form `; KEY: value`
// (assembly) or `// KEY: value` (C). Keys are case-insensitive:
//
//   NAME       display name, also the event id
//   GAMES      comma separated game ids
//   EXECUTION  Direct or Process
//   PARAM      Type|name, repeatable

use crate::error::EventError;
use crate::events::{EventLanguage, ExecutionType, ParamDef, ParamType};
use crate::game::Game;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomEventMetadata {
    pub name: Option<String>,
    pub games: Vec<Game>,
    pub execution: Option<ExecutionType>,
    pub parameters: Vec<ParamDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Name,
    Games,
    Execution,
    Param,
}

/// `(key, value)` if `line` is a pragma.
fn pragma(line: &str) -> Option<(Key, &str)> {
    let trimmed = line.trim_start();
    let body = trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix(';'))?
        .trim_start();
    let (key, value) = body.split_once(':')?;
    let key = match key.trim().to_ascii_uppercase().as_str() {
        "NAME" => Key::Name,
        "GAMES" => Key::Games,
        "EXECUTION" => Key::Execution,
        "PARAM" => Key::Param,
        _ => return None,
    };
    Some((key, value.trim()))
}

fn parse_param(value: &str, line: usize) -> Result<ParamDef, EventError> {
    let (ty, name) = value.split_once('|').ok_or_else(|| {
        EventError::metadata(format!(
            "line {}: PARAM must look like Type|name, found '{}'",
            line, value
        ))
    })?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EventError::metadata(format!(
            "line {}: '{}' is not a valid parameter name",
            line, name
        )));
    }
    let param_type: ParamType = ty.parse()?;
    Ok(ParamDef::new(name, param_type))
}

/// Parse every pragma in `source`. Later NAME and EXECUTION lines override
/// earlier ones; GAMES and PARAM lines accumulate.
pub fn extract_metadata(source: &str) -> Result<CustomEventMetadata, EventError> {
    let mut metadata = CustomEventMetadata::default();
    for (index, line) in source.lines().enumerate() {
        let Some((key, value)) = pragma(line) else {
            continue;
        };
        match key {
            Key::Name => {
                metadata.name = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Key::Games => {
                for id in value.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                    let game: Game = id.parse()?;
                    if !metadata.games.contains(&game) {
                        metadata.games.push(game);
                    }
                }
            }
            Key::Execution => metadata.execution = Some(value.parse()?),
            Key::Param => metadata.parameters.push(parse_param(value, index + 1)?),
        }
    }
    Ok(metadata)
}

fn comment_prefix(language: EventLanguage) -> &'static str {
    match language {
        EventLanguage::C => "//",
        _ => ";",
    }
}

/// The canonical pragma block for `metadata`.
pub fn metadata_block(metadata: &CustomEventMetadata, language: EventLanguage) -> Vec<String> {
    let prefix = comment_prefix(language);
    let mut lines = Vec::new();
    if let Some(name) = &metadata.name {
        lines.push(format!("{} NAME: {}", prefix, name));
    }
    if !metadata.games.is_empty() {
        let games: Vec<&str> = metadata.games.iter().map(|g| g.id()).collect();
        lines.push(format!("{} GAMES: {}", prefix, games.join(",")));
    }
    if let Some(execution) = metadata.execution {
        lines.push(format!("{} EXECUTION: {}", prefix, execution));
    }
    for param in &metadata.parameters {
        lines.push(format!("{} PARAM: {}|{}", prefix, param.param_type, param.name));
    }
    lines
}

/// Replace every pragma in `source` with the canonical block for `metadata`
/// at the top. Non-pragma lines are kept as they are.
pub fn rewrite_metadata(source: &str, metadata: &CustomEventMetadata, language: EventLanguage) -> String {
    let mut lines = metadata_block(metadata, language);
    lines.extend(
        source
            .lines()
            .filter(|line| pragma(line).is_none())
            .map(str::to_string),
    );
    let mut out = lines.join("\n");
    if source.ends_with('\n') {
        out.push('\n');
    }
    out
}
