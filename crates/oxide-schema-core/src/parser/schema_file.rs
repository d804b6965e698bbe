//! Declarative schema text parser.

use tracing::debug;

use super::args::{parse_call, strip_comment, tokenize};
use super::{Diagnostic, DiagnosticKind, Parsed};
use crate::model::{Datasource, Enum, Field, FieldAttribute, Model, ModelAttribute, Schema};
use crate::relation::unquote;

/// The block currently being filled.
enum Block {
    Model(Model),
    Enum(Enum),
    Datasource(Datasource),
    /// `generator` and unknown blocks are skipped until their `}`.
    Skipped,
}

struct SchemaParser {
    schema: Schema,
    diagnostics: Vec<Diagnostic>,
    block: Option<(Block, usize)>,
}

/// Parses schema text into a [`Schema`].
///
/// Blank lines and `//` comments are ignored. Unrecognized top-level
/// constructs and malformed field lines are skipped and reported.
#[must_use]
pub fn parse_schema(source: &str) -> Parsed<Schema> {
    let mut parser = SchemaParser {
        schema: Schema::new(),
        diagnostics: Vec::new(),
        block: None,
    };

    for (index, raw) in source.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() || line == "{" {
            continue;
        }
        parser.line(line, index + 1);
    }

    if let Some((block, opened_at)) = parser.block.take() {
        parser.diagnostics.push(
            Diagnostic::new(DiagnosticKind::UnterminatedBlock, block_label(&block))
                .at_line(opened_at),
        );
        parser.close(block);
    }

    debug!(
        models = parser.schema.models.len(),
        enums = parser.schema.enums.len(),
        diagnostics = parser.diagnostics.len(),
        "Parsed schema"
    );
    Parsed {
        value: parser.schema,
        diagnostics: parser.diagnostics,
    }
}

impl SchemaParser {
    fn line(&mut self, line: &str, number: usize) {
        let Some((mut block, opened_at)) = self.block.take() else {
            self.top_level(line, number);
            return;
        };

        if line == "}" {
            self.close(block);
            return;
        }

        match &mut block {
            Block::Model(model) => self.model_line(model, line, number),
            Block::Enum(enumeration) => {
                if !line.starts_with("@@") {
                    let value = tokenize(line).into_iter().next().unwrap_or_default();
                    enumeration.values.push(value.trim_end_matches('}').to_string());
                }
            }
            Block::Datasource(datasource) => datasource_line(datasource, line),
            Block::Skipped => {}
        }

        if line.ends_with('}') && !line.starts_with('@') {
            // `VALUE }` style closing on the same line
            self.close(block);
        } else {
            self.block = Some((block, opened_at));
        }
    }

    fn top_level(&mut self, line: &str, number: usize) {
        if line == "}" {
            self.diagnostics
                .push(Diagnostic::new(DiagnosticKind::StrayClosingBrace, line).at_line(number));
            return;
        }

        let mut words = line.split_whitespace();
        let keyword = words.next().unwrap_or_default();
        let name = words
            .next()
            .map(|n| n.trim_end_matches('{').to_string())
            .unwrap_or_default();

        let block = match keyword {
            "model" if !name.is_empty() => Block::Model(Model::new(name)),
            "enum" if !name.is_empty() => Block::Enum(Enum::new(name, Vec::<String>::new())),
            "datasource" => Block::Datasource(Datasource {
                name,
                ..Datasource::default()
            }),
            "generator" => Block::Skipped,
            _ => {
                debug!(line = number, text = line, "Skipping unknown construct");
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::UnknownConstruct, line).at_line(number));
                if !line.contains('{') || line.ends_with('}') {
                    return;
                }
                Block::Skipped
            }
        };

        if line.ends_with('}') && line.contains('{') {
            self.close(block);
        } else {
            self.block = Some((block, number));
        }
    }

    fn model_line(&mut self, model: &mut Model, line: &str, number: usize) {
        if let Some(rest) = line.strip_prefix("@@") {
            let (name, args) = parse_call(rest);
            if name == "map" {
                if let Some(table) = args.first() {
                    model.table_name = unquote(table).to_string();
                }
            }
            model.attributes.push(ModelAttribute { name, args });
            return;
        }

        match parse_field(line) {
            Some(field) => model.fields.push(field),
            None => {
                debug!(line = number, text = line, "Skipping malformed field");
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::MalformedField, line).at_line(number));
            }
        }
    }

    fn close(&mut self, block: Block) {
        match block {
            Block::Model(model) => self.schema.models.push(model),
            Block::Enum(enumeration) => self.schema.enums.push(enumeration),
            Block::Datasource(datasource) => self.schema.datasource = Some(datasource),
            Block::Skipped => {}
        }
    }
}

/// Parses `name Type[?|[]] @attr...`. Returns `None` for lines that do not
/// have at least a name and a type.
fn parse_field(line: &str) -> Option<Field> {
    let tokens = tokenize(line);
    let [name, raw_type, rest @ ..] = tokens.as_slice() else {
        return None;
    };
    if name.starts_with('@') || raw_type.starts_with('@') {
        return None;
    }

    let mut field = Field::new(name.as_str(), raw_type.as_str());
    if let Some(base) = raw_type.strip_suffix('?') {
        field.is_optional = true;
        field.field_type = base.to_string();
    }
    if let Some(base) = field.field_type.strip_suffix("[]") {
        field.is_array = true;
        field.field_type = base.to_string();
    }

    for token in rest {
        let Some(raw) = token.strip_prefix('@') else {
            debug!(field = %field.name, token = %token, "Ignoring non-attribute token");
            continue;
        };
        let (attr_name, args) = parse_call(raw);
        if attr_name == "map" {
            if let Some(column) = args.first() {
                field.column_name = unquote(column).to_string();
            }
        }
        field.attributes.push(FieldAttribute {
            name: attr_name,
            args,
        });
    }
    Some(field)
}

fn datasource_line(datasource: &mut Datasource, line: &str) {
    let Some((key, value)) = line.split_once('=') else {
        return;
    };
    match key.trim() {
        "provider" => datasource.provider = Some(unquote(value).to_string()),
        "url" => datasource.url = Some(value.trim().to_string()),
        _ => {}
    }
}

fn block_label(block: &Block) -> String {
    match block {
        Block::Model(m) => format!("model {}", m.name),
        Block::Enum(e) => format!("enum {}", e.name),
        Block::Datasource(d) => format!("datasource {}", d.name),
        Block::Skipped => "block".to_string(),
    }
}
