use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry the layout core and the renderer must agree on. Every
/// constant of the placement and connector rules lives here rather
/// than as a hidden literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub person_width: f32,
    pub person_height: f32,
    /// Horizontal gap between sibling boxes.
    pub sibling_gap: f32,
    /// Row-to-row distance between a couple and its children.
    pub generation_gap: f32,
    /// Gap between the two boxes of a couple.
    pub couple_gap: f32,
    /// Gap between consecutive root couples.
    pub root_gap: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    /// Padding added around the content when computing the viewbox.
    pub bounds_margin: f32,
    /// Half-distance between the two strokes of a doubled connector.
    pub bond_gap: f32,
    /// Distance below a box at which the unpaired underline sits.
    pub underline_offset: f32,
    pub dash_on: f32,
    pub dash_off: f32,
    /// Horizontal padding kept around a name inside its box.
    pub name_padding: f32,
    /// Lower bound for the fit-to-box font shrink factor.
    pub min_name_scale: f32,
    /// How many couples to show when no root qualifies.
    pub fallback_root_limit: usize,
    pub placeholder_width: f32,
    pub placeholder_height: f32,
    pub placeholder_text_size: f32,
    pub no_people_message: String,
    pub no_couples_message: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            person_width: 100.0,
            person_height: 50.0,
            sibling_gap: 40.0,
            generation_gap: 120.0,
            couple_gap: 20.0,
            root_gap: 150.0,
            margin_left: 100.0,
            margin_top: 50.0,
            bounds_margin: 40.0,
            bond_gap: 3.0,
            underline_offset: 5.0,
            dash_on: 5.0,
            dash_off: 5.0,
            name_padding: 8.0,
            min_name_scale: 0.6,
            fallback_root_limit: 3,
            placeholder_width: 1600.0,
            placeholder_height: 1200.0,
            placeholder_text_size: 20.0,
            no_people_message: "No people recorded".to_string(),
            no_couples_message: "No family relationships to draw".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    male_fill: Option<String>,
    male_border: Option<String>,
    female_fill: Option<String>,
    female_border: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    muted_line_color: Option<String>,
    placeholder_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    person_width: Option<f32>,
    person_height: Option<f32>,
    sibling_gap: Option<f32>,
    generation_gap: Option<f32>,
    couple_gap: Option<f32>,
    root_gap: Option<f32>,
    margin_left: Option<f32>,
    margin_top: Option<f32>,
    bounds_margin: Option<f32>,
    bond_gap: Option<f32>,
    underline_offset: Option<f32>,
    dash_on: Option<f32>,
    dash_off: Option<f32>,
    name_padding: Option<f32>,
    min_name_scale: Option<f32>,
    fallback_root_limit: Option<usize>,
    placeholder_width: Option<f32>,
    placeholder_height: Option<f32>,
    placeholder_text_size: Option<f32>,
    no_people_message: Option<String>,
    no_couples_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOverrides {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
    render: Option<RenderOverrides>,
}

/// Load a config file (JSON, JSON5 accepted) and merge it over the
/// defaults field by field. `None` returns the defaults untouched.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.male_fill {
            config.theme.male_fill = v;
        }
        if let Some(v) = vars.male_border {
            config.theme.male_border = v;
        }
        if let Some(v) = vars.female_fill {
            config.theme.female_fill = v;
        }
        if let Some(v) = vars.female_border {
            config.theme.female_border = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.muted_line_color {
            config.theme.muted_line_color = v;
        }
        if let Some(v) = vars.placeholder_color {
            config.theme.placeholder_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.person_width {
            config.layout.person_width = v;
        }
        if let Some(v) = layout.person_height {
            config.layout.person_height = v;
        }
        if let Some(v) = layout.sibling_gap {
            config.layout.sibling_gap = v;
        }
        if let Some(v) = layout.generation_gap {
            config.layout.generation_gap = v;
        }
        if let Some(v) = layout.couple_gap {
            config.layout.couple_gap = v;
        }
        if let Some(v) = layout.root_gap {
            config.layout.root_gap = v;
        }
        if let Some(v) = layout.margin_left {
            config.layout.margin_left = v;
        }
        if let Some(v) = layout.margin_top {
            config.layout.margin_top = v;
        }
        if let Some(v) = layout.bounds_margin {
            config.layout.bounds_margin = v;
        }
        if let Some(v) = layout.bond_gap {
            config.layout.bond_gap = v;
        }
        if let Some(v) = layout.underline_offset {
            config.layout.underline_offset = v;
        }
        if let Some(v) = layout.dash_on {
            config.layout.dash_on = v;
        }
        if let Some(v) = layout.dash_off {
            config.layout.dash_off = v;
        }
        if let Some(v) = layout.name_padding {
            config.layout.name_padding = v;
        }
        if let Some(v) = layout.min_name_scale {
            config.layout.min_name_scale = v;
        }
        if let Some(v) = layout.fallback_root_limit {
            config.layout.fallback_root_limit = v;
        }
        if let Some(v) = layout.placeholder_width {
            config.layout.placeholder_width = v;
        }
        if let Some(v) = layout.placeholder_height {
            config.layout.placeholder_height = v;
        }
        if let Some(v) = layout.placeholder_text_size {
            config.layout.placeholder_text_size = v;
        }
        if let Some(v) = layout.no_people_message {
            config.layout.no_people_message = v;
        }
        if let Some(v) = layout.no_couples_message {
            config.layout.no_couples_message = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_returns_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // JSON5 comments are fine
                theme: "modern",
                themeVariables: { fontSize: 16 },
                layout: { personWidth: 120, fallbackRootLimit: 5 },
                render: { width: 800 },
            }"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.theme.font_size, 16.0);
        assert_eq!(config.theme.font_family, Theme::modern().font_family);
        assert_eq!(config.layout.person_width, 120.0);
        assert_eq!(config.layout.fallback_root_limit, 5);
        assert_eq!(config.layout.person_height, 50.0);
        assert_eq!(config.render.width, 800.0);
        assert_eq!(config.render.height, 1200.0);
    }
}
