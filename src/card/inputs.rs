/// Number of characters a text field shows on the card before it is cut.
pub const VISIBLE_LIMIT: usize = 18;
/// Marker appended to cut display strings.
pub const ELLIPSIS: &str = "..";
/// Warning shown next to a field whose value will be cut on the card.
pub const CUT_WARNING: &str = "Name will be cut, it will be shown as '..'";

/// User-editable card fields. Stored untruncated.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CardInputs {
    pub character_name: String,
    pub series_title: String,
    pub print_number: String,
    pub show_image: bool,
}

impl Default for CardInputs {
    fn default() -> Self {
        Self {
            character_name: String::new(),
            series_title: String::new(),
            print_number: String::new(),
            show_image: true,
        }
    }
}

impl CardInputs {
    pub fn display_name(&self) -> String {
        truncate_for_display(&self.character_name, VISIBLE_LIMIT)
    }

    pub fn display_series(&self) -> String {
        truncate_for_display(&self.series_title, VISIBLE_LIMIT)
    }

    pub fn length_warnings(&self) -> LengthWarnings {
        let warn = |s: &str| (s.chars().count() > VISIBLE_LIMIT).then_some(CUT_WARNING);
        LengthWarnings {
            character_name: warn(&self.character_name),
            series_title: warn(&self.series_title),
        }
    }
}

/// Per-field warnings for values longer than [`VISIBLE_LIMIT`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthWarnings {
    pub character_name: Option<&'static str>,
    pub series_title: Option<&'static str>,
}

/// Display-only truncation: strings up to `limit` characters are returned unchanged,
/// longer ones are cut to `limit` characters, trimmed, and suffixed with `..`.
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    let mut out = head.trim().to_string();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/card/inputs.rs"]
mod tests;
