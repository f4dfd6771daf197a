// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::seasons::SeasonRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelContent {
    #[default]
    Empty,
    Record {
        title: String,
        sections: Vec<Section>,
    },
    Message {
        title: String,
        text: String,
    },
}

/// Display name for a species key, e.g. `wolf_coyote` → `WOLF COYOTE`.
pub fn species_label(species: &str) -> String {
    species.replace('_', " ").to_uppercase()
}

/// The slide-out results panel. Closing it keeps the last content.
#[derive(Debug, Default)]
pub struct ResultsPresenter {
    content: PanelContent,
    open: bool,
}

impl ResultsPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_record(&mut self, region_code: &str, species: &str, record: &SeasonRecord) {
        let title = format!("WMU {} - {}", region_code, species_label(species));
        let sections = record
            .categories()
            .iter()
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(category, lines)| Section {
                label: category.to_uppercase(),
                lines: lines.clone(),
            })
            .collect();
        self.content = PanelContent::Record { title, sections };
        self.open = true;
    }

    pub fn show_message(&mut self, text: impl Into<String>) {
        self.content = PanelContent::Message {
            title: "Message".to_string(),
            text: text.into(),
        };
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    pub fn title(&self) -> Option<&str> {
        match &self.content {
            PanelContent::Empty => None,
            PanelContent::Record { title, .. } | PanelContent::Message { title, .. } => {
                Some(title.as_str())
            }
        }
    }

    pub fn render_text(&self) -> String {
        match &self.content {
            PanelContent::Empty => String::new(),
            PanelContent::Message { text, .. } => format!("{}\n", text),
            PanelContent::Record { title, sections } => {
                let mut out = format!("{}\n", title);
                for section in sections {
                    out.push_str(&format!("\n{}\n", section.label));
                    for line in &section.lines {
                        out.push_str(&format!("  - {}\n", line));
                    }
                }
                out
            }
        }
    }
}
