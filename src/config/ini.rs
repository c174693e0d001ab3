//! Override file codec.
//!
//! A small INI dialect: `[section]` headers, `key = value` or `key: value`
//! options, `#`/`;` full-line comments, indented continuation lines and a
//! `[DEFAULT]` section inherited by every other section. Keys are
//! lower-cased on read; section names keep their case.
//!
//! Parsing is strict: duplicate sections, duplicate keys within a section
//! and options outside any section are errors.

use thiserror::Error;

/// Name of the section whose options every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Error, PartialEq)]
pub enum IniError {
    #[error("line {line}: option found before any section header")]
    MissingSectionHeader { line: usize },
    #[error("line {line}: cannot parse {content:?}")]
    Parse { line: usize, content: String },
    #[error("line {line}: section {section:?} already exists")]
    DuplicateSection { line: usize, section: String },
    #[error("line {line}: option {key:?} in section {section:?} already exists")]
    DuplicateOption {
        line: usize,
        section: String,
        key: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        let key = key.to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key, value.to_string())),
        }
    }
}

/// An ordered, in-memory override file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    defaults: IniSection,
    sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self {
            defaults: IniSection::new(DEFAULT_SECTION),
            sections: Vec::new(),
        }
    }

    /// Parse override file text.
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = Self::new();
        // Index into `sections`, or `None` for DEFAULT. Outer `None` means
        // no header has been seen yet.
        let mut current: Option<Option<usize>> = None;
        // Last option and the indent of its line; deeper lines continue it.
        let mut last_key: Option<(String, usize)> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = line.len() - trimmed.len();
            if let (Some(section), Some((key, key_indent))) = (current, last_key.as_ref()) {
                if indent > *key_indent {
                    let target = doc.slot_mut(section);
                    if let Some(entry) = target.entries.iter_mut().find(|(k, _)| k == key) {
                        entry.1.push('\n');
                        entry.1.push_str(trimmed);
                    }
                    continue;
                }
            }

            let header_end = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.rfind(']'))
                .filter(|&end| end > 0);
            if let Some(end) = header_end {
                let name = &trimmed[1..end + 1];
                last_key = None;
                if name == DEFAULT_SECTION {
                    current = Some(None);
                    continue;
                }
                if doc.sections.iter().any(|s| s.name == name) {
                    return Err(IniError::DuplicateSection {
                        line: line_no,
                        section: name.to_string(),
                    });
                }
                doc.sections.push(IniSection::new(name));
                current = Some(Some(doc.sections.len() - 1));
                continue;
            }

            let Some(section) = current else {
                return Err(IniError::MissingSectionHeader { line: line_no });
            };

            let Some(split) = trimmed.find(['=', ':']) else {
                return Err(IniError::Parse {
                    line: line_no,
                    content: trimmed.to_string(),
                });
            };
            let key = trimmed[..split].trim().to_lowercase();
            let value = trimmed[split + 1..].trim();
            if key.is_empty() {
                return Err(IniError::Parse {
                    line: line_no,
                    content: trimmed.to_string(),
                });
            }

            let target = doc.slot_mut(section);
            if target.get(&key).is_some() {
                return Err(IniError::DuplicateOption {
                    line: line_no,
                    section: target.name.clone(),
                    key,
                });
            }
            target.entries.push((key.clone(), value.to_string()));
            last_key = Some((key, indent));
        }

        Ok(doc)
    }

    fn slot_mut(&mut self, slot: Option<usize>) -> &mut IniSection {
        match slot {
            Some(idx) => &mut self.sections[idx],
            None => &mut self.defaults,
        }
    }

    fn find(&self, section: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == section)
    }

    /// Section names in file order, excluding `DEFAULT`.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Whether a section exists, compared case-insensitively.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(section))
    }

    /// Options of a section merged over `DEFAULT`: inherited keys first,
    /// then the section's own keys in file order.
    pub fn items(&self, section: &str) -> Vec<(String, String)> {
        let mut merged = self.defaults.entries.clone();
        if let Some(found) = self.find(section) {
            for (key, value) in &found.entries {
                match merged.iter_mut().find(|(k, _)| k == key) {
                    Some(entry) => entry.1 = value.clone(),
                    None => merged.push((key.clone(), value.clone())),
                }
            }
        }
        merged
    }

    /// Look up one option, honoring `DEFAULT` inheritance.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.find(section)
            .and_then(|s| s.get(&key))
            .or_else(|| self.defaults.get(&key))
    }

    /// Set one option, creating the section if needed. An existing section
    /// with the same name in a different case is reused.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        if section == DEFAULT_SECTION {
            self.defaults.set(key, value);
            return;
        }
        let idx = match self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(section))
        {
            Some(idx) => idx,
            None => {
                self.sections.push(IniSection::new(section));
                self.sections.len() - 1
            }
        };
        self.sections[idx].set(key, value);
    }

    /// Render the whole document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.defaults.entries.is_empty() {
            render_section(&mut out, &self.defaults);
        }
        for section in &self.sections {
            render_section(&mut out, section);
        }
        out
    }
}

fn render_section(out: &mut String, section: &IniSection) {
    out.push('[');
    out.push_str(&section.name);
    out.push_str("]\n");
    for (key, value) in &section.entries {
        out.push_str(key);
        out.push_str(" = ");
        // Continuation lines must stay indented to read back.
        out.push_str(&value.replace('\n', "\n\t"));
        out.push('\n');
    }
    out.push('\n');
}
