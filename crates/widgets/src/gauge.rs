use overlay_core::{event::Message, state::GaugeReading};
use overlay_theme::{Color, Theme};
use iced::{
    widget::{column, container, text, Space},
    Element, Length,
};

/// One metric: a bar filled bottom-up to the value, then the label and the
/// rounded percentage underneath.
///
/// The fill colour follows the severity of the value; the text colour is
/// chosen against the configured backdrop.
#[derive(Debug, Clone, Copy)]
pub struct GaugeWidget {
    width:  f32,
    height: f32,
}

impl GaugeWidget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width:  width as f32,
            height: height as f32,
        }
    }

    pub fn view<'a>(&self, reading: &GaugeReading, theme: &Theme) -> Element<'a, Message> {
        let filled = fill_height(reading.percent, self.height);
        let fg = theme.foreground().to_iced();

        let bar = column![
            block(self.width, self.height - filled, theme.track),
            block(self.width, filled, theme.severity_color(reading.percent)),
        ];

        column![
            bar,
            text(reading.label.clone()).size(theme.font_size).color(fg),
            text(format_percent(reading.percent)).size(theme.font_size).color(fg),
        ]
        .into()
    }
}

/// A solid rectangle.
fn block<'a>(width: f32, height: f32, color: Color) -> Element<'a, Message> {
    let color = color.to_iced();
    container(Space::new())
        .width(Length::Fixed(width))
        .height(Length::Fixed(height))
        .style(move |_: &iced::Theme| container::Style {
            background: Some(iced::Background::Color(color)),
            ..Default::default()
        })
        .into()
}

/// Filled pixels for `percent` of a bar `height` tall.  Values past 100
/// (summed GPU engines) fill the bar completely.
pub fn fill_height(percent: f32, height: f32) -> f32 {
    (percent.clamp(0.0, 100.0) / 100.0 * height).round()
}

/// `"42%"`.
pub fn format_percent(percent: f32) -> String {
    format!("{percent:.0}%")
}
