pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        pub const SURFACE2: Color = Color::Rgb(108, 112, 134);  // Subtle dim

        // Accents
        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const GREEN: Color = Color::Rgb(166, 227, 161);
        pub const YELLOW: Color = Color::Rgb(249, 226, 175);
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);
        pub const PEACH: Color = Color::Rgb(250, 179, 135);
        pub const TEAL: Color = Color::Rgb(148, 226, 213);
        pub const SKY: Color = Color::Rgb(137, 220, 235);
    }
}

use nu_ansi_term::Style;
use catppuccin::Mocha as P;

/// Style for one source character.
///
/// > <   => SKY/TEAL (movement)
/// + -   => GREEN/RED (data modification)
/// . ,   => YELLOW/PEACH (I/O)
/// [ ]   => MAUVE (flow control)
pub fn instruction_style(ch: char) -> Style {
    let color = match ch {
        '>' => P::SKY,
        '<' => P::TEAL,
        '+' => P::GREEN,
        '-' => P::RED,
        '.' => P::YELLOW,
        ',' => P::PEACH,
        '[' | ']' => P::MAUVE,
        _ => P::SURFACE2,
    };
    Style::new().fg(color).bold()
}

/// Style used to flag errors and the pointer cell in diagnostics.
pub fn alert_style() -> Style {
    Style::new().fg(P::RED).bold()
}
