//! Oscilloscope widget for ratatui

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

/// Plots recent output samples as a dotted trace around a zero line
pub struct Scope<'a> {
    samples: &'a [f32],
    /// Vertical zoom; 1.0 maps -1..1 to the full height
    gain: f32,
    style: Style,
    block: Option<Block<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self {
            samples,
            gain: 1.0,
            style: Style::default(),
            block: None,
        }
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Row for a sample value, 0 at the top of `height` rows
    fn row(&self, sample: f32, height: u16) -> u16 {
        let half = (height.saturating_sub(1)) as f32 / 2.0;
        let value = (sample * self.gain).clamp(-1.0, 1.0);
        (half - value * half).round() as u16
    }

    fn render_trace(&self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let zero = area.y + self.row(0.0, area.height);
        for x in area.x..area.x + area.width {
            buf.set_string(x, zero, "─", Style::default());
        }

        if self.samples.is_empty() {
            return;
        }

        // Newest samples on the right edge, one per column
        let count = self.samples.len().min(area.width as usize);
        let visible = &self.samples[self.samples.len() - count..];
        let offset = area.width as usize - count;

        for (i, &sample) in visible.iter().enumerate() {
            let x = area.x + (offset + i) as u16;
            let y = area.y + self.row(sample, area.height);
            buf.set_string(x, y, "•", self.style);
        }
    }
}

impl Widget for Scope<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_trace(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_empty() {
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        Scope::new(&[]).render(area, &mut buf);

        // Only the zero line
        assert_eq!(buf[(0, 2)].symbol(), "─");
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn test_scope_rows() {
        let samples = [0.0];
        let scope = Scope::new(&samples);
        assert_eq!(scope.row(1.0, 5), 0);
        assert_eq!(scope.row(0.0, 5), 2);
        assert_eq!(scope.row(-1.0, 5), 4);
        assert_eq!(scope.row(3.0, 5), 0);
    }

    #[test]
    fn test_scope_plots_newest_on_right() {
        let samples = [1.0, 1.0, 1.0, -1.0];
        let area = Rect::new(0, 0, 3, 5);
        let mut buf = Buffer::empty(area);
        Scope::new(&samples).render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "•");
        assert_eq!(buf[(1, 0)].symbol(), "•");
        assert_eq!(buf[(2, 4)].symbol(), "•");
    }

    #[test]
    fn test_scope_gain() {
        let samples = [0.5];
        let area = Rect::new(0, 0, 1, 5);
        let mut buf = Buffer::empty(area);
        Scope::new(&samples).gain(2.0).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "•");
    }

    #[test]
    fn test_scope_with_block() {
        let samples = vec![0.5; 10];
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        Scope::new(&samples)
            .block(Block::bordered().title("Scope"))
            .render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "┌");
    }
}
