use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::database::{DefDatabase, DifficultyDef};
use super::hashing::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDef,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

pub fn compile_def_database(file_path: &Path) -> Result<DefDatabase, ContentCompileError> {
    let raw = fs::read_to_string(file_path).map_err(|source| ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        file_path: file_path.to_path_buf(),
        location: None,
    })?;
    compile_def_source(file_path, &raw)
}

pub fn compile_def_source(file_path: &Path, raw: &str) -> Result<DefDatabase, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut defs = Vec::<DifficultyDef>::new();
    let mut seen = HashSet::<String>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "DifficultyDef" {
            return Err(error_at_node(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <DifficultyDef> is recognized",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        let def = parse_difficulty_def(file_path, &doc, child)?;
        if !seen.insert(def.def_name.clone()) {
            return Err(error_at_node(
                ContentErrorCode::DuplicateDef,
                format!("duplicate DifficultyDef '{}'", def.def_name),
                file_path,
                &doc,
                child,
            ));
        }
        defs.push(def);
    }

    let mut fingerprint = Fingerprint::new();
    fingerprint.update_bytes(raw.as_bytes());
    Ok(DefDatabase::from_difficulty_defs(defs, fingerprint.finish_hex()))
}

fn parse_difficulty_def(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<DifficultyDef, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut player_lives: Option<u32> = None;
    let mut enemy_speed_factor: Option<f32> = None;
    let mut platform_speed_factor: Option<f32> = None;
    let mut gravity_factor: Option<f32> = None;
    let mut enemies_to_kill: Option<u32> = None;
    let mut exp_per_kill: Option<u32> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <DifficultyDef>", field_name),
                file_path,
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => def_name = Some(required_text(file_path, doc, field, "defName")?),
            "playerLives" => player_lives = Some(parse_number(file_path, doc, field)?),
            "enemiesToKill" => enemies_to_kill = Some(parse_number(file_path, doc, field)?),
            "expPerKill" => exp_per_kill = Some(parse_number(file_path, doc, field)?),
            "enemySpeedFactor" => enemy_speed_factor = Some(parse_factor(file_path, doc, field)?),
            "platformSpeedFactor" => {
                platform_speed_factor = Some(parse_factor(file_path, doc, field)?)
            }
            "gravityFactor" => gravity_factor = Some(parse_factor(file_path, doc, field)?),
            _ => {
                return Err(error_at_node(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <DifficultyDef>", field_name),
                    file_path,
                    doc,
                    field,
                ))
            }
        }
    }

    let def_name = require_field(def_name, "defName", file_path, doc, node)?;
    let player_lives = require_field(player_lives, "playerLives", file_path, doc, node)?;
    let enemies_to_kill = require_field(enemies_to_kill, "enemiesToKill", file_path, doc, node)?;
    let exp_per_kill = require_field(exp_per_kill, "expPerKill", file_path, doc, node)?;

    Ok(DifficultyDef {
        def_name,
        player_lives,
        enemy_speed_factor: enemy_speed_factor.unwrap_or(1.0),
        platform_speed_factor: platform_speed_factor.unwrap_or(1.0),
        gravity_factor: gravity_factor.unwrap_or(1.0),
        enemies_to_kill,
        exp_per_kill,
    })
}

fn require_field<T>(
    value: Option<T>,
    field_name: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<T, ContentCompileError> {
    value.ok_or_else(|| {
        error_at_node(
            ContentErrorCode::MissingField,
            format!("missing required field <{}> in <DifficultyDef>", field_name),
            file_path,
            doc,
            node,
        )
    })
}

fn parse_number<T: FromStr>(
    file_path: &Path,
    doc: &Document<'_>,
    field: Node<'_, '_>,
) -> Result<T, ContentCompileError> {
    let field_name = field.tag_name().name();
    let value = required_text(file_path, doc, field, field_name)?;
    value.parse::<T>().map_err(|_| {
        error_at_node(
            ContentErrorCode::InvalidValue,
            format!("{} '{}' is not a valid non-negative integer", field_name, value),
            file_path,
            doc,
            field,
        )
    })
}

fn parse_factor(
    file_path: &Path,
    doc: &Document<'_>,
    field: Node<'_, '_>,
) -> Result<f32, ContentCompileError> {
    let field_name = field.tag_name().name();
    let value = required_text(file_path, doc, field, field_name)?;
    let parsed = value.parse::<f32>().map_err(|_| {
        error_at_node(
            ContentErrorCode::InvalidValue,
            format!("{} '{}' is not a valid number", field_name, value),
            file_path,
            doc,
            field,
        )
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(error_at_node(
            ContentErrorCode::InvalidValue,
            format!("{} must be finite and > 0", field_name),
            file_path,
            doc,
            field,
        ));
    }
    Ok(parsed)
}

fn required_text(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            format!("field <{}> must not be empty", field_name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: ContentErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ContentCompileError {
    let pos = doc.text_pos_at(node.range().start);
    ContentCompileError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}
