//! Plain-text note importer.
//!
//! # Format
//! Each note is a block of `Field: value` lines, where `Field` is one of the
//! note type's field names. An optional `ID:` line pins the note ID.
//! ```text
//! ID: 1
//! Front: gato
//! Back: cat
//! Audio: [sound:gato.mp3]
//!
//! Front: perro
//! Back: dog
//! Values may continue on the next lines.
//! ```
//! A block ends at the next `ID:` line or when a field appears a second time.

use crate::error::{ParseError, Result};
use crate::types::RawNote;
use std::collections::HashSet;

/// Parse text into raw notes for a note type with the given fields.
pub fn parse_notes(content: &str, fields: &[String]) -> Result<Vec<RawNote>> {
    if fields.is_empty() {
        return Err(ParseError::NoFields);
    }
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut parser = Parser::new(fields);
    for (idx, line) in content.lines().enumerate() {
        parser.process_line(line, idx + 1)?;
    }
    parser.finalize()
}

struct NoteBuilder {
    id: Option<i64>,
    values: Vec<Option<String>>,
    start_line: usize,
}

impl NoteBuilder {
    fn new(field_count: usize, start_line: usize) -> Self {
        Self {
            id: None,
            values: vec![None; field_count],
            start_line,
        }
    }

    fn has_fields(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }

    fn build(self) -> Result<RawNote> {
        if !self.has_fields() {
            return Err(ParseError::EmptyNote {
                line: self.start_line,
            });
        }

        Ok(RawNote {
            id: self.id,
            fields: self
                .values
                .into_iter()
                .map(|v| v.map(|s| s.trim().to_string()).unwrap_or_default())
                .collect(),
            line_number: self.start_line,
        })
    }
}

struct Parser<'f> {
    fields: &'f [String],
    /// Field indices, longest name first, so "Back Extra" wins over "Back".
    match_order: Vec<usize>,
    notes: Vec<RawNote>,
    seen_ids: HashSet<i64>,
    current: Option<NoteBuilder>,
    current_field: Option<usize>,
    buffer: Vec<String>,
}

enum LineType<'a> {
    Id(&'a str),
    Field(usize, &'a str),
    Text(&'a str),
    Empty,
}

impl<'f> Parser<'f> {
    fn new(fields: &'f [String]) -> Self {
        let mut match_order: Vec<usize> = (0..fields.len()).collect();
        match_order.sort_by_key(|&i| std::cmp::Reverse(fields[i].len()));

        Self {
            fields,
            match_order,
            notes: Vec::new(),
            seen_ids: HashSet::new(),
            current: None,
            current_field: None,
            buffer: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<()> {
        match self.parse_line(line) {
            LineType::Id(id_str) => self.handle_id(id_str, line_num)?,
            LineType::Field(idx, text) => self.handle_field(idx, text, line_num)?,
            LineType::Text(text) => {
                if self.current_field.is_none() {
                    return Err(ParseError::OrphanText { line: line_num });
                }
                self.buffer.push(text.to_string());
            }
            LineType::Empty => {
                if self.current_field.is_some() {
                    self.buffer.push(String::new());
                }
            }
        }
        Ok(())
    }

    fn parse_line<'a>(&self, line: &'a str) -> LineType<'a> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return LineType::Empty;
        }
        if let Some(rest) = trimmed.strip_prefix("ID:") {
            return LineType::Id(rest.trim());
        }
        for &idx in &self.match_order {
            let rest = trimmed
                .strip_prefix(self.fields[idx].as_str())
                .and_then(|r| r.strip_prefix(':'));
            if let Some(rest) = rest {
                return LineType::Field(idx, rest.trim());
            }
        }
        LineType::Text(line)
    }

    fn handle_id(&mut self, id_str: &str, line_num: usize) -> Result<()> {
        let id = id_str.parse::<i64>().map_err(|_| ParseError::InvalidId {
            line: line_num,
            value: id_str.to_string(),
        })?;

        self.finish_note()?;
        let mut builder = NoteBuilder::new(self.fields.len(), line_num);
        builder.id = Some(id);
        self.current = Some(builder);
        Ok(())
    }

    fn handle_field(&mut self, idx: usize, text: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();

        let repeated = self
            .current
            .as_ref()
            .is_some_and(|note| note.values[idx].is_some());
        if repeated {
            self.finish_note()?;
        }
        if self.current.is_none() {
            self.current = Some(NoteBuilder::new(self.fields.len(), line_num));
        }

        self.current_field = Some(idx);
        self.buffer.push(text.to_string());
        Ok(())
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let content = self.buffer.join("\n");
        self.buffer.clear();

        if let (Some(note), Some(idx)) = (self.current.as_mut(), self.current_field) {
            note.values[idx] = Some(content);
        }
    }

    fn finish_note(&mut self) -> Result<()> {
        self.flush_buffer();
        self.current_field = None;

        let Some(builder) = self.current.take() else {
            return Ok(());
        };
        let note = builder.build()?;
        if let Some(id) = note.id {
            if !self.seen_ids.insert(id) {
                return Err(ParseError::DuplicateId {
                    id,
                    line: note.line_number,
                });
            }
        }
        self.notes.push(note);
        Ok(())
    }

    fn finalize(mut self) -> Result<Vec<RawNote>> {
        self.finish_note()?;
        Ok(self.notes)
    }
}
