//! Wayland layer-shell surface for `overlay-metrics`.
//!
//! Owns the Iced application loop and wires together all background tasks:
//! - Metrics sampler (counter registry + rolling aggregator)
//! - Config file watcher (live reload on change)
//! - Frame timer (cursor polling over Hyprland IPC)

use overlay_config::{default_path, load as load_config, MetricsConfig, OverlayConfig};
use overlay_core::{
    event::Message as AppMessage,
    state::{AppState, CursorPos},
    OverlayError, Result,
};
use overlay_ipc::{fetch_cursor_pos, HyprlandIpc};
use overlay_renderer::OverlayLayout;
use overlay_system::MonitorSettings;
use overlay_theme::Theme;
use overlay_widgets::GaugeWidget;
use futures::channel::mpsc::Sender;
use iced::{
    widget::{container, Row},
    Element, Font, Length, Subscription, Task,
};
use iced_layershell::{
    build_pattern::application,
    reexport::{Anchor, KeyboardInteractivity, Layer},
    settings::{LayerShellSettings, Settings},
    to_layer_message,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gauges shown before the first snapshot arrives: CPU, RAM, GPU.
const INITIAL_GAUGES: usize = 3;

/// Configuration handed to [`run`]; read by the boot function and the
/// sampler subscription, which iced builds without arguments.
static STARTUP: OnceLock<OverlayConfig> = OnceLock::new();

// ── Entry point ───────────────────────────────────────────────────────────────

/// Start the overlay with an already validated configuration.
/// Never returns under normal operation.
pub fn run(config: &OverlayConfig) -> Result<()> {
    remember(config);
    let layout = OverlayLayout::from_config(&config.overlay, config.font.size);

    // Iced wants a `'static` family name; leaked once for the process lifetime.
    let family: &'static str = Box::leak(config.font.family.clone().into_boxed_str());

    application(Overlay::new, Overlay::namespace, Overlay::update, Overlay::view)
        .subscription(Overlay::subscription)
        .style(Overlay::style)
        .settings(Settings {
            layer_settings: LayerShellSettings {
                size: Some(layout.surface_size(INITIAL_GAUGES)),
                exclusive_zone: -1,
                anchor: Anchor::Top | Anchor::Left,
                layer: Layer::Overlay,
                margin: layout.margins(None),
                keyboard_interactivity: KeyboardInteractivity::None,
                ..Default::default()
            },
            default_font: Font::with_name(family),
            ..Default::default()
        })
        .run()
        .map_err(|e| OverlayError::Wayland(e.to_string()))
}

// ── Message ───────────────────────────────────────────────────────────────────

/// Top-level application messages.
///
/// `#[to_layer_message]` injects layer-shell control variants; the overlay
/// uses `MarginChange` to follow the cursor and `SizeChange` when the number
/// of gauges changes.
#[to_layer_message]
#[derive(Debug, Clone)]
pub enum Message {
    /// Propagate a core event-bus message.
    App(AppMessage),
    /// A cursor query failed; carries the reason for logging.
    CursorUnavailable(String),
}

// ── State ─────────────────────────────────────────────────────────────────────

struct Overlay {
    state:  AppState,
    config: OverlayConfig,
    theme:  Theme,
    layout: OverlayLayout,
    gauge:  GaugeWidget,
    /// `None` when not running under Hyprland; the overlay then stays put.
    ipc:    Option<HyprlandIpc>,
    /// Gauges in the current surface size.
    shown:  usize,
}

impl Overlay {
    fn new() -> (Self, Task<Message>) {
        let config = startup_config();

        let ipc = match HyprlandIpc::new() {
            Ok(ipc) => Some(ipc),
            Err(e) => {
                warn!("Cursor tracking unavailable (not under Hyprland?): {e}");
                None
            }
        };

        let overlay = Self {
            state:  AppState::default(),
            theme:  Theme::from_config(&config),
            layout: OverlayLayout::from_config(&config.overlay, config.font.size),
            gauge:  GaugeWidget::new(config.overlay.gauge_width, config.overlay.gauge_height),
            config,
            ipc,
            shown:  INITIAL_GAUGES,
        };

        (overlay, Task::none())
    }

    fn namespace() -> String {
        String::from("overlay-metrics")
    }

    // ── Update ────────────────────────────────────────────────────────────────

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::App(msg) => self.handle_app(msg),
            Message::CursorUnavailable(e) => {
                debug!("cursor query failed: {e}");
                Task::none()
            }
            // Layer-shell injected variants are handled by the backend.
            _ => Task::none(),
        }
    }

    fn handle_app(&mut self, msg: AppMessage) -> Task<Message> {
        match msg {
            AppMessage::MetricsUpdated(snapshot) => {
                self.state.metrics = snapshot;
                self.resize_to_fit()
            }
            AppMessage::Frame => self.poll_cursor(),
            AppMessage::CursorMoved(pos) => self.move_to(pos),
            AppMessage::ConfigReloaded => match load_config(default_path()) {
                Ok(cfg) => {
                    info!("Config reloaded");
                    self.apply_config(cfg)
                }
                Err(e) => {
                    warn!("Config reload failed: {e}");
                    Task::none()
                }
            },
        }
    }

    fn poll_cursor(&self) -> Task<Message> {
        let Some(ipc) = self.ipc.clone().filter(|_| self.config.overlay.follow_mouse) else {
            return Task::none();
        };
        Task::perform(async move { fetch_cursor_pos(&ipc).await }, |result| match result {
            Ok(pos) => Message::App(AppMessage::CursorMoved(pos)),
            Err(e)  => Message::CursorUnavailable(e.to_string()),
        })
    }

    fn move_to(&mut self, pos: CursorPos) -> Task<Message> {
        if self.state.cursor == Some(pos) {
            return Task::none();
        }
        let before = self.layout.margins(self.state.cursor);
        self.state.cursor = Some(pos);

        let after = self.layout.margins(self.state.cursor);
        if after == before {
            return Task::none();
        }
        Task::done(Message::MarginChange(after))
    }

    fn resize_to_fit(&mut self) -> Task<Message> {
        let gauges = self.state.metrics.gauges().len();
        if gauges == self.shown {
            return Task::none();
        }
        self.shown = gauges;
        Task::done(Message::SizeChange(self.layout.surface_size(gauges)))
    }

    /// Visual settings apply immediately; sampler settings on next start.
    fn apply_config(&mut self, cfg: OverlayConfig) -> Task<Message> {
        if cfg.metrics != self.config.metrics {
            info!("Metrics settings change takes effect after restart");
        }

        self.theme  = Theme::from_config(&cfg);
        self.layout = OverlayLayout::from_config(&cfg.overlay, cfg.font.size);
        self.gauge  = GaugeWidget::new(cfg.overlay.gauge_width, cfg.overlay.gauge_height);
        self.config = cfg;

        Task::batch([
            Task::done(Message::SizeChange(self.layout.surface_size(self.shown))),
            Task::done(Message::MarginChange(self.layout.margins(self.state.cursor))),
        ])
    }

    // ── View ──────────────────────────────────────────────────────────────────

    fn view(&self) -> Element<'_, Message> {
        let gap = self.layout.spacing.saturating_sub(self.layout.gauge_width) as f32;

        let gauges = self
            .state
            .metrics
            .gauges()
            .iter()
            .map(|reading| self.gauge.view(reading, &self.theme).map(Message::App))
            .collect::<Vec<_>>();

        container(Row::from_vec(gauges).spacing(gap))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    fn subscription(&self) -> Subscription<Message> {
        let mut subs = vec![
            Subscription::run(metrics_stream),
            Subscription::run(config_stream),
        ];

        if self.config.overlay.follow_mouse && self.ipc.is_some() {
            let fps = self.config.overlay.fps.max(1) as u64;
            let frame = iced::time::every(Duration::from_millis(1_000 / fps))
                .map(|_| Message::App(AppMessage::Frame));
            subs.push(frame);
        }

        Subscription::batch(subs)
    }

    // ── Style ─────────────────────────────────────────────────────────────────

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        iced::theme::Style {
            background_color: iced::Color::TRANSPARENT,
            text_color: self.theme.foreground().to_iced(),
        }
    }
}

// ── Subscription streams ──────────────────────────────────────────────────────
//
// Each free function acts as both the stream builder AND the unique identity
// key for `Subscription::run(fn_ptr)`.

/// Runs the metrics sampler and forwards every averages table.
fn metrics_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(4, |mut sender: Sender<Message>| async move {
        let metrics = startup_config().metrics;
        let mut rx = overlay_system::spawn_monitor(monitor_settings(&metrics));

        while let Some(snapshot) = rx.recv().await {
            let _ = sender.try_send(Message::App(AppMessage::MetricsUpdated(snapshot)));
        }

        // Sampler exited; stall rather than end the subscription.
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    })
}

/// Watches `overlay.toml` for writes and sends `ConfigReloaded`.
fn config_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(1, |mut sender: Sender<Message>| async move {
        let (_watcher, mut rx) = overlay_config::ConfigWatcher::spawn(default_path());

        while rx.recv().await.is_some() {
            let _ = sender.try_send(Message::App(AppMessage::ConfigReloaded));
        }

        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Keep the first configuration passed to [`run`].
fn remember(config: &OverlayConfig) {
    if STARTUP.set(config.clone()).is_err() {
        debug!("startup config already set");
    }
}

fn startup_config() -> OverlayConfig {
    STARTUP.get().cloned().unwrap_or_default()
}

fn monitor_settings(cfg: &MetricsConfig) -> MonitorSettings {
    MonitorSettings {
        averaging_count: cfg.averaging_count,
        counter_refresh: Duration::from_millis(cfg.counter_refresh_ms),
        sample_interval: Duration::from_millis(cfg.sample_interval_ms.max(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_config_maps_to_sampler_settings() {
        let settings = monitor_settings(&MetricsConfig::default());
        assert_eq!(settings, MonitorSettings::default());
    }

    #[test]
    fn startup_config_is_the_one_passed_in() {
        let mut cfg = OverlayConfig::default();
        cfg.metrics.averaging_count = 3;
        cfg.font.size = 14.0;
        remember(&cfg);

        let seen = startup_config();
        assert_eq!(seen, cfg);
        assert_eq!(monitor_settings(&seen.metrics).averaging_count, 3);
    }

    #[test]
    fn zero_sample_interval_is_bumped() {
        let cfg = MetricsConfig {
            sample_interval_ms: 0,
            ..MetricsConfig::default()
        };
        assert_eq!(monitor_settings(&cfg).sample_interval, Duration::from_millis(1));
    }
}
