pub mod gauge;

pub use gauge::GaugeWidget;
