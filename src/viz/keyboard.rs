//! Text keyboard diagram widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Widget},
};

use crate::engine::KEYBOARD_KEYS;

const DIAGRAM: [&str; 6] = [
    "|   |   | |   |   |   |   | |   | |   |   |     |",
    "|   | W | | E |   |   | T | | Y | | U |   |     |",
    "|   |___| |___|   |   |___| |___| |___|   |     |",
    "|     |     |     |     |     |     |     |     |",
    "|  A  |  S  |  D  |  F  |  G  |  H  |  J  |  K  |",
    "|_____|_____|_____|_____|_____|_____|_____|_____|",
];

/// Width and height of the diagram in cells
pub const DIAGRAM_SIZE: (u16, u16) = (DIAGRAM[0].len() as u16, DIAGRAM.len() as u16);

/// Row and column of a key's label in the diagram
fn label_position(semitone: i32) -> Option<(u16, u16)> {
    let key = KEYBOARD_KEYS.chars().nth(usize::try_from(semitone).ok()?)?;
    DIAGRAM.iter().enumerate().find_map(|(row, line)| {
        line.find(key).map(|col| (row as u16, col as u16))
    })
}

/// The 13-key diagram with the sounding key highlighted
pub struct KeyboardDiagram<'a> {
    active: Option<i32>,
    style: Style,
    highlight: Style,
    block: Option<Block<'a>>,
}

impl<'a> KeyboardDiagram<'a> {
    pub fn new(active: Option<i32>) -> Self {
        Self {
            active,
            style: Style::default(),
            highlight: Style::default().add_modifier(Modifier::REVERSED),
            block: None,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn highlight(mut self, style: Style) -> Self {
        self.highlight = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn render_keys(&self, area: Rect, buf: &mut Buffer) {
        if area.width < DIAGRAM_SIZE.0 || area.height < DIAGRAM_SIZE.1 {
            return;
        }

        // Centre horizontally
        let x = area.x + (area.width - DIAGRAM_SIZE.0) / 2;
        for (row, line) in DIAGRAM.iter().enumerate() {
            buf.set_string(x, area.y + row as u16, line, self.style);
        }

        if let Some((row, col)) = self.active.and_then(label_position) {
            // Label plus one cell of padding either side
            let start = x + col - 1;
            let text: String = DIAGRAM[row as usize][(col - 1) as usize..=(col + 1) as usize].to_string();
            buf.set_string(start, area.y + row, text, self.highlight);
        }
    }
}

impl Widget for KeyboardDiagram<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_keys(inner_area, buf);
    }
}
