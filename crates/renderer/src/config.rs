use std::time::Duration;

/// Converter settings.
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    /// Attribute marking `<br>` elements emitted as block fillers.
    pub block_filler_attribute: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            block_filler_attribute: "data-view-filler".to_string(),
        }
    }
}

/// Renderer settings.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Text of the fake selection container when the selection has no label
    /// of its own.
    pub fake_selection_label: String,
    /// Class of the fake selection container.
    pub fake_selection_class: String,
    /// Quiet period after which a selection counts as settled.
    pub settle_delay: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            fake_selection_label: "\u{00A0}".to_string(),
            fake_selection_class: "view-fake-selection-container".to_string(),
            settle_delay: Duration::from_millis(200),
        }
    }
}
