use crate::config::LayoutConfig;
#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::layout::{Connector, ConnectorKind, Layout, LineStyle};
use crate::model::Gender;
use crate::text_metrics;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Stroke the connector directives and draw the person boxes. The
/// layout already carries final coordinates; this only turns style
/// hints into SVG attributes.
pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> String {
    let width = layout.width.max(1.0);
    let height = layout.height.max(1.0);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"{:.2} {:.2} {width:.2} {height:.2}\">",
        layout.offset_x, layout.offset_y
    ));
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>",
        layout.offset_x, layout.offset_y, theme.background
    ));

    if let Some(placeholder) = &layout.placeholder {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            placeholder.x,
            placeholder.y,
            theme.font_family,
            placeholder.text_size,
            theme.placeholder_color,
            escape_xml(&placeholder.message)
        ));
        svg.push_str("</svg>");
        return svg;
    }

    for connector in &layout.connectors {
        connector_svg(&mut svg, connector, theme, config);
    }

    for person_box in layout.boxes.values() {
        let (fill, border) = match person_box.gender {
            Gender::Male => (&theme.male_fill, &theme.male_border),
            _ => (&theme.female_fill, &theme.female_border),
        };
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
            person_box.x, person_box.y, person_box.width, person_box.height, fill, border
        ));

        let avail = person_box.width - config.name_padding * 2.0;
        let measured =
            text_metrics::measure_or_estimate(&person_box.name, theme.font_size, &theme.font_family);
        let font_size = if measured > avail && avail > 0.0 {
            (theme.font_size * avail / measured).max(theme.font_size * config.min_name_scale)
        } else {
            theme.font_size
        };
        let text_x = person_box.x + person_box.width / 2.0;
        let text_y = person_box.y + person_box.height / 2.0 + font_size * 0.36;
        svg.push_str(&format!(
            "<text x=\"{text_x:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{font_size:.2}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.text_color,
            escape_xml(&person_box.name)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn stroke_color<'a>(connector: &Connector, theme: &'a Theme) -> &'a str {
    match (connector.kind, connector.style) {
        (ConnectorKind::UnpairedMark, _) => &theme.muted_line_color,
        (ConnectorKind::CoupleBond, LineStyle::Dashed) => &theme.muted_line_color,
        _ => &theme.line_color,
    }
}

fn connector_svg(svg: &mut String, connector: &Connector, theme: &Theme, config: &LayoutConfig) {
    let color = stroke_color(connector, theme);
    match connector.style {
        LineStyle::Solid => push_line(svg, connector.from, connector.to, color, None),
        LineStyle::Dashed => push_line(
            svg,
            connector.from,
            connector.to,
            color,
            Some(format!("{},{}", config.dash_on, config.dash_off)),
        ),
        LineStyle::Doubled => {
            let (dx, dy) = perpendicular(connector.from, connector.to, config.bond_gap);
            push_line(
                svg,
                (connector.from.0 + dx, connector.from.1 + dy),
                (connector.to.0 + dx, connector.to.1 + dy),
                color,
                None,
            );
            push_line(
                svg,
                (connector.from.0 - dx, connector.from.1 - dy),
                (connector.to.0 - dx, connector.to.1 - dy),
                color,
                None,
            );
        }
    }
}

/// Unit perpendicular scaled by `gap`; doubled connectors are two
/// parallel strokes either side of the directive's segment.
fn perpendicular(from: (f32, f32), to: (f32, f32), gap: f32) -> (f32, f32) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        return (0.0, 0.0);
    }
    (-dy / len * gap, dx / len * gap)
}

fn push_line(svg: &mut String, from: (f32, f32), to: (f32, f32), color: &str, dash: Option<String>) {
    let dash_attr = dash
        .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
        .unwrap_or_default();
    svg.push_str(&format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"2\"{dash_attr}/>",
        from.0, from.1, to.0, to.1
    ));
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &RenderConfig,
    theme: &Theme,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .unwrap_or("sans-serif")
        .trim()
        .to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
