//! Waveform widget for the status display

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

/// Renders a sample window as a peak-envelope oscillogram: each column
/// spans the minimum to maximum sample value it covers.
pub struct Waveform<'a> {
    samples: &'a [f32],
    style: Style,
    block: Option<Block<'a>>,
}

impl<'a> Waveform<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self {
            samples,
            style: Style::default(),
            block: None,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn render_columns(&self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.samples.is_empty() {
            return;
        }

        let width = area.width as usize;
        let half_height = f32::from(area.height) / 2.0;
        let center_y = area.y + area.height / 2;
        let per_column = self.samples.len() as f32 / width as f32;

        for x in 0..width {
            let start = (x as f32 * per_column) as usize;
            if start >= self.samples.len() {
                break;
            }
            let end = (((x + 1) as f32) * per_column) as usize;
            let end = end.max(start + 1).min(self.samples.len());

            let mut low = 0.0f32;
            let mut high = 0.0f32;
            for &sample in &self.samples[start..end] {
                low = low.min(sample);
                high = high.max(sample);
            }

            let rows_up = (high.clamp(0.0, 1.0) * half_height) as u16;
            let rows_down = ((-low).clamp(0.0, 1.0) * half_height) as u16;
            let top = center_y.saturating_sub(rows_up).max(area.y);
            let bottom = (center_y + rows_down).min(area.y + area.height - 1);

            let screen_x = area.x + x as u16;
            for y in top..=bottom {
                buf.set_string(screen_x, y, "│", self.style);
            }
        }

        // Baseline through the untouched cells.
        if center_y < area.y + area.height {
            for x in area.x..area.x + area.width {
                if buf[(x, center_y)].symbol() == " " {
                    buf.set_string(x, center_y, "─", Style::default());
                }
            }
        }
    }
}

impl Widget for Waveform<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_columns(inner_area, buf);
    }
}
