use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of a single line of text in the given font, if a matching
/// face can be loaded from the system font database.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Like `measure_text_width`, with a per-character estimate as the
/// fallback so headless environments without fonts still get a usable
/// number. Full-width characters count as a full em.
pub fn measure_or_estimate(text: &str, font_size: f32, font_family: &str) -> f32 {
    if let Some(width) = measure_text_width(text, font_size, font_family) {
        return width;
    }
    text.chars()
        .map(|ch| {
            if ch.is_ascii() {
                font_size * 0.56
            } else {
                font_size
            }
        })
        .sum()
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontData>>,
}

struct FontData {
    data: Vec<u8>,
    index: u32,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.cache.contains_key(&key) {
            let loaded = self.load_font(font_family);
            self.cache.insert(key.clone(), loaded);
        }
        let font = self.cache.get(&key)?.as_ref()?;
        let face = Face::parse(&font.data, font.index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let scale = font_size / units_per_em as f32;
        let fallback = font_size * 0.56;

        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph));
            match advance {
                Some(advance) => width += advance as f32 * scale,
                None => width += fallback,
            }
        }
        Some(width.max(0.0))
    }

    fn load_font(&mut self, font_family: &str) -> Option<FontData> {
        let mut names: Vec<String> = Vec::new();
        let mut generics: Vec<Family<'static>> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => generics.push(Family::Serif),
                "sans-serif" | "system-ui" | "-apple-system" => generics.push(Family::SansSerif),
                "monospace" => generics.push(Family::Monospace),
                "cursive" => generics.push(Family::Cursive),
                "fantasy" => generics.push(Family::Fantasy),
                _ => names.push(raw.to_string()),
            }
        }
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| Family::Name(name.as_str()))
            .collect();
        families.extend(generics);
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::BOLD,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontData> = None;
        self.db.with_face_data(id, |data, index| {
            loaded = Some(FontData {
                data: data.to_vec(),
                index,
            });
        });
        loaded
    }
}
