use tabbycat::attributes::Color;

pub const FONT: &str = "DejaVu Sans";
pub const FONTSIZE: f64 = 10.0; // pt
pub const BOX_HEIGHT: f64 = 0.30; // in
pub const NODE_MARGIN: f64 = 0.05; // in

pub const LEAF_COLOR  : Color = Color::Rgb(115, 150, 250); // blue
pub const TENSOR_COLOR: Color = Color::Rgb(250, 205, 115); // yellow
