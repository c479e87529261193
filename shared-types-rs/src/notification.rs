//! Backend-neutral notification payload.

/// Label/value pair rendered in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Titled block of lines (ranked tables, histograms)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub label: String,
    pub url: String,
}

/// Text file delivered next to the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notification {
    pub header: String,
    /// Plain text used by clients that cannot show rich layouts
    pub fallback_text: String,
    pub summary: Option<String>,
    pub fields: Vec<Field>,
    pub sections: Vec<Section>,
    pub deep_link: Option<DeepLink>,
    pub attachment: Option<Attachment>,
    pub footer: Vec<String>,
}

impl Notification {
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}
