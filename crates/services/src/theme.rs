//! Accent color and light/dark mode, and the visual tokens derived from them.

use crate::store::{load_json, save_json, KeyValueStore, KEY_PRIMARY_COLOR};
use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use shared::palette::{PaletteEntry, DEFAULT_ACCENT};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeTokens {
    pub primary: String,
    pub primary_light: String,
    pub primary_dark: String,
    pub bg: String,
    pub bg_secondary: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub container: String,
    pub container_light: String,
    pub border: String,
    pub user_bubble_bg: String,
    pub user_bubble_text: String,
    pub model_bubble_bg: String,
    pub model_bubble_text: String,
}

impl ThemeTokens {
    /// `(name, value)` pairs ready to be applied as CSS custom properties.
    pub fn css_variables(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("--color-primary", self.primary.as_str()),
            ("--color-primary-light", self.primary_light.as_str()),
            ("--color-primary-dark", self.primary_dark.as_str()),
            ("--color-bg", self.bg.as_str()),
            ("--color-bg-secondary", self.bg_secondary.as_str()),
            ("--color-text-primary", self.text_primary.as_str()),
            ("--color-text-secondary", self.text_secondary.as_str()),
            ("--color-container", self.container.as_str()),
            ("--color-container-light", self.container_light.as_str()),
            ("--color-border", self.border.as_str()),
            ("--color-user-bubble-bg", self.user_bubble_bg.as_str()),
            ("--color-user-bubble-text", self.user_bubble_text.as_str()),
            ("--color-model-bubble-bg", self.model_bubble_bg.as_str()),
            ("--color-model-bubble-text", self.model_bubble_text.as_str()),
        ]
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn lighten_rgb((r, g, b): (u8, u8, u8), percent: u32) -> (u8, u8, u8) {
    let mix = |ch: u8| {
        let ch = ch as u32;
        (ch + (255 - ch) * percent / 100).min(255) as u8
    };
    (mix(r), mix(g), mix(b))
}

/// Move each channel `percent`% of the way to white.
pub fn lighten(hex: &str, percent: u32) -> Option<String> {
    parse_hex(hex).map(|rgb| to_hex(lighten_rgb(rgb, percent)))
}

/// Dark text on light backgrounds, light text on dark ones.
pub fn text_color_for(hex: &str) -> &'static str {
    let Some((r, g, b)) = parse_hex(hex) else {
        return "#F9FAFB";
    };
    let luminance = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0;
    if luminance > 0.5 {
        "#111827"
    } else {
        "#F9FAFB"
    }
}

pub fn derive_tokens(primary: &str, mode: ThemeMode, has_background_image: bool) -> ThemeTokens {
    let rgb = parse_hex(primary)
        .or_else(|| parse_hex(DEFAULT_ACCENT.hex))
        .unwrap_or((0x7c, 0x3a, 0xed));
    let primary = primary.to_string();
    let tint = |p| to_hex(lighten_rgb(rgb, p));

    let (bg, bg_secondary, text_primary, text_secondary, container, container_light, border) =
        match mode {
            ThemeMode::Dark => (
                if has_background_image {
                    "rgba(24, 24, 27, 0.85)".to_string()
                } else {
                    "#18181b".to_string()
                },
                "#27272a".to_string(),
                "#E5E7EB",
                "#9CA3AF",
                "#27272a".to_string(),
                "#3f3f46".to_string(),
                "#3f3f46".to_string(),
            ),
            ThemeMode::Light => {
                let (r, g, b) = lighten_rgb(rgb, 96);
                (
                    if has_background_image {
                        format!("rgba({}, {}, {}, 0.7)", r, g, b)
                    } else {
                        to_hex((r, g, b))
                    },
                    tint(93),
                    "#1F2937",
                    "#4B5563",
                    tint(98),
                    tint(88),
                    tint(85),
                )
            }
        };

    let model_bubble_bg = match mode {
        ThemeMode::Dark => "#3f3f46".to_string(),
        ThemeMode::Light => container.clone(),
    };

    ThemeTokens {
        primary_light: tint(80),
        primary_dark: primary.clone(),
        user_bubble_bg: primary.clone(),
        user_bubble_text: text_color_for(&primary).to_string(),
        primary,
        bg,
        bg_secondary,
        text_primary: text_primary.to_string(),
        text_secondary: text_secondary.to_string(),
        container,
        container_light,
        border,
        model_bubble_bg,
        model_bubble_text: text_primary.to_string(),
    }
}

/// Theme state. The accent color persists; the mode lasts for the session.
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    mode: Mutex<ThemeMode>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            mode: Mutex::new(ThemeMode::default()),
        }
    }

    pub fn primary_color(&self) -> String {
        match load_json::<String>(self.store.as_ref(), KEY_PRIMARY_COLOR) {
            Ok(Some(hex)) if parse_hex(&hex).is_some() => hex,
            Ok(_) => DEFAULT_ACCENT.hex.to_string(),
            Err(e) => {
                tracing::warn!("Could not read accent color: {}", e);
                DEFAULT_ACCENT.hex.to_string()
            }
        }
    }

    pub fn set_accent(&self, entry: PaletteEntry) -> Result<()> {
        tracing::debug!("Accent color -> {} ({})", entry.name, entry.hex);
        save_json(self.store.as_ref(), KEY_PRIMARY_COLOR, entry.hex)
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.lock()
    }

    pub fn toggle_mode(&self) -> ThemeMode {
        let mut mode = self.mode.lock();
        *mode = mode.toggled();
        *mode
    }

    pub fn tokens(&self) -> ThemeTokens {
        derive_tokens(&self.primary_color(), self.mode(), false)
    }

    /// Back to the default accent.
    pub fn clear(&self) -> Result<()> {
        self.set_accent(DEFAULT_ACCENT)
    }
}
