use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub male_fill: String,
    pub male_border: String,
    pub female_fill: String,
    pub female_border: String,
    pub text_color: String,
    pub line_color: String,
    pub muted_line_color: String,
    pub placeholder_color: String,
    pub background: String,
}

impl Theme {
    /// Palette of the original canvas renderer.
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 14.0,
            male_fill: "#dbeafe".to_string(),
            male_border: "#2563eb".to_string(),
            female_fill: "#fce7f3".to_string(),
            female_border: "#ec4899".to_string(),
            text_color: "#1e293b".to_string(),
            line_color: "#1e293b".to_string(),
            muted_line_color: "#64748b".to_string(),
            placeholder_color: "#64748b".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            male_fill: "#E8F1FD".to_string(),
            male_border: "#3B82F6".to_string(),
            female_fill: "#FDF0F6".to_string(),
            female_border: "#F472B6".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#27303E".to_string(),
            muted_line_color: "#7A8AA6".to_string(),
            placeholder_color: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
