//! # Card Model
//!
//! Declarative description of an ID card: background, border, font and an
//! ordered list of positioned elements (logo, text, QR code) in a fixed
//! 350×200 virtual canvas.
//!
//! ## Example
//!
//! ```
//! use carnet::card::{CardConfig, LayoutEditor};
//!
//! let mut editor = LayoutEditor::new(CardConfig::default()).unwrap();
//! editor.move_element("qrCode", 240.0, 90.0).unwrap();
//! assert_eq!(editor.config().element("qrCode").unwrap().x, 240.0);
//! ```

pub mod color;
pub mod editor;
pub mod model;
pub mod role;

pub use color::Color;
pub use editor::{ConfigPatch, ElementPatch, LayoutEditor, Point};
pub use model::{
    Background, Border, CANVAS_HEIGHT, CANVAS_WIDTH, CardConfig, CardElement, ElementKind,
    FontStyle, FontWeight, GradientKind, TextDecoration, TextStyle, TextStylePatch,
    TextTransform,
};
pub use role::{ElementRole, resolve_text};
