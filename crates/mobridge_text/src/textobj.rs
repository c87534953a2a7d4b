//! Text object over the native font capability.
//!
//! Font drawing and measurement live in the native UI layer; this
//! wrapper only owns a font and a string and forwards. The font is
//! constructed by the caller and handed in at creation, so there is no
//! hidden global font state.

/// Capability exposed by the native font implementation.
///
/// `bounds` selects the bounded measure/draw variants; `None` means
/// unbounded.
pub trait NativeFont {
    fn measure(&self, text: &str, bounds: Option<(i32, i32)>) -> (i32, i32);
    fn draw(&mut self, text: &str, x: i32, y: i32, bounds: Option<(i32, i32)>);
    fn set_line_spacing(&mut self, spacing: i32);
}

/// A font paired with the string it renders.
pub struct TextObject<F: NativeFont> {
    font: F,
    text: String,
}

impl<F: NativeFont> TextObject<F> {
    pub fn new(font: F) -> Self {
        Self {
            font,
            text: String::new(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_line_spacing(&mut self, spacing: i32) {
        self.font.set_line_spacing(spacing);
    }

    pub fn measure(&self, bounds: Option<(i32, i32)>) -> (i32, i32) {
        self.font.measure(&self.text, bounds)
    }

    pub fn draw(&mut self, x: i32, y: i32, bounds: Option<(i32, i32)>) {
        self.font.draw(&self.text, x, y, bounds);
    }
}
