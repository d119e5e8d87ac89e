#![forbid(unsafe_code)]

//! Page configuration.
//!
//! [`LumenConfig`] groups the selectors, thresholds, timings and style values
//! of every mechanism. `Default` reproduces the landing page's constants, so
//! a page built with `LumenConfig::default()` behaves exactly like the
//! shipped markup expects. With the `serde` feature the whole tree can be
//! loaded from JSON; missing fields fall back to their defaults.

use lumen_core::error::{LumenError, Result};
use lumen_core::geometry::Margin;
use web_time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LumenConfig {
    pub reveal: RevealConfig,
    pub counter: CounterConfig,
    pub scroll: ScrollConfig,
    pub hero: HeroConfig,
    pub interactions: InteractionConfig,
}

/// Scroll-triggered reveal of content blocks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RevealConfig {
    /// Elements hidden at `dom_ready` and revealed on first crossing.
    pub selector: String,
    /// Reveal targets that finish with `scale(1)`.
    pub card_selector: String,
    /// Reveal targets revealed with a per-index delay.
    pub stagger_selector: String,
    /// Visible fraction that counts as a crossing. Default: 0.1.
    pub threshold: f64,
    /// Viewport bias, CSS margin shorthand. Default: `0px 0px -50px 0px`.
    pub root_margin: String,
    /// Delay added per staggered index. Default: 100.
    pub stagger_step_ms: u64,
    /// Hidden-state vertical offset. Default: 40.0.
    pub hidden_offset_px: f64,
    pub transition: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: ".problem-card, .target-card, .impact-card, .feature-card, .timeline-item, .floating-card"
                .to_string(),
            card_selector: ".problem-card, .target-card, .impact-card".to_string(),
            stagger_selector: ".feature-card".to_string(),
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_string(),
            stagger_step_ms: 100,
            hidden_offset_px: 40.0,
            transition: "opacity 0.8s cubic-bezier(0.4, 0, 0.2, 1), transform 0.8s cubic-bezier(0.4, 0, 0.2, 1)"
                .to_string(),
        }
    }
}

/// Numeric counter ramps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CounterConfig {
    pub selector: String,
    /// Default: 0.5.
    pub threshold: f64,
    /// Default: `0px`.
    pub root_margin: String,
    /// Total ramp duration. Default: 2000.
    pub duration_ms: u64,
    /// Ramp tick interval. Default: 16.
    pub tick_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            selector: ".stat-number, .metric-number, .circle-number".to_string(),
            threshold: 0.5,
            root_margin: "0px".to_string(),
            duration_ms: 2000,
            tick_ms: 16,
        }
    }
}

/// Throttled scroll effects: navbar chrome and parallax.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ScrollConfig {
    /// Quiet period before the trailing invocation. Default: 16.
    pub debounce_ms: u64,
    pub navbar_selector: String,
    /// Offset above which the navbar is raised. Default: 100.0.
    pub navbar_threshold_px: f64,
    /// Half-width of the band around the threshold in which the navbar keeps
    /// its previous level. Default: 0.0 (no hysteresis).
    pub navbar_hysteresis_px: f64,
    pub raised_background: String,
    pub raised_shadow: String,
    pub resting_background: String,
    pub resting_shadow: String,
    pub backdrop_filter: String,
    pub parallax_selector: String,
    /// Speed of the first parallax shape. Default: 0.5.
    pub parallax_base_speed: f64,
    /// Speed added per shape index. Default: 0.1.
    pub parallax_speed_step: f64,
    /// Degrees of rotation per scrolled pixel. Default: 0.1.
    pub parallax_rotation: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 16,
            navbar_selector: ".navbar".to_string(),
            navbar_threshold_px: 100.0,
            navbar_hysteresis_px: 0.0,
            raised_background: "rgba(255, 255, 255, 0.98)".to_string(),
            raised_shadow: "0 8px 40px rgba(0,0,0,0.12)".to_string(),
            resting_background: "rgba(255, 255, 255, 0.95)".to_string(),
            resting_shadow: "0 4px 20px rgba(0,0,0,0.08)".to_string(),
            backdrop_filter: "blur(20px)".to_string(),
            parallax_selector: ".floating-shapes .shape".to_string(),
            parallax_base_speed: 0.5,
            parallax_speed_step: 0.1,
            parallax_rotation: 0.1,
        }
    }
}

/// Hero intro on window load.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct HeroConfig {
    pub selector: String,
    /// Default: 30.0.
    pub hidden_offset_px: f64,
    pub transition: String,
    /// Default: 200.
    pub stagger_step_ms: u64,
    /// Class added to `body` on load. Default: `loaded`.
    pub loaded_class: String,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            selector: ".hero-badge, .hero-title, .hero-subtitle, .hero-stats, .hero-actions"
                .to_string(),
            hidden_offset_px: 30.0,
            transition: "opacity 0.8s ease, transform 0.8s ease".to_string(),
            stagger_step_ms: 200,
            loaded_class: "loaded".to_string(),
        }
    }
}

/// Click and hover wiring.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct InteractionConfig {
    pub active_class: String,
    pub hamburger_selector: String,
    pub nav_menu_selector: String,
    pub nav_link_selector: String,
    pub anchor_selector: String,
    pub demo_button_selector: String,
    pub demo_panel_selector: String,
    /// Tab whose activation replays the metric bars. Default: `ai`.
    pub metric_demo: String,
    pub metric_fill_selector: String,
    /// Default: 100.
    pub metric_restore_ms: u64,
    pub demo_step_selector: String,
    /// Default: 3000.
    pub step_rotation_ms: u64,
    pub ripple_selector: String,
    pub ripple_class: String,
    /// Default: 600.
    pub ripple_lifetime_ms: u64,
    pub hover_selector: String,
    pub hover_transform: String,
    pub hover_shadow: String,
    pub rest_transform: String,
    pub rest_shadow: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            active_class: "active".to_string(),
            hamburger_selector: ".hamburger".to_string(),
            nav_menu_selector: ".nav-menu".to_string(),
            nav_link_selector: ".nav-menu a".to_string(),
            anchor_selector: r##"a[href^="#"]"##.to_string(),
            demo_button_selector: ".demo-btn".to_string(),
            demo_panel_selector: ".demo-panel".to_string(),
            metric_demo: "ai".to_string(),
            metric_fill_selector: ".metric-fill".to_string(),
            metric_restore_ms: 100,
            demo_step_selector: ".demo-step".to_string(),
            step_rotation_ms: 3000,
            ripple_selector: "button, .cta-primary, .cta-secondary".to_string(),
            ripple_class: "ripple".to_string(),
            ripple_lifetime_ms: 600,
            hover_selector: ".problem-card, .target-card, .impact-card, .feature-card".to_string(),
            hover_transform: "translateY(-12px) scale(1.02)".to_string(),
            hover_shadow: "0 25px 80px rgba(0,0,0,0.15)".to_string(),
            rest_transform: "translateY(0) scale(1)".to_string(),
            rest_shadow: "0 4px 20px rgba(0,0,0,0.08)".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

impl LumenConfig {
    #[must_use]
    pub fn with_reveal_threshold(mut self, threshold: f64) -> Self {
        self.reveal.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_counter_timing(mut self, duration_ms: u64, tick_ms: u64) -> Self {
        self.counter.duration_ms = duration_ms;
        self.counter.tick_ms = tick_ms;
        self
    }

    #[must_use]
    pub fn with_navbar_hysteresis(mut self, px: f64) -> Self {
        self.scroll.navbar_hysteresis_px = px;
        self
    }

    /// Check ranges; a page refuses to build from an invalid config.
    pub fn validate(&self) -> Result<()> {
        check_threshold("reveal.threshold", self.reveal.threshold)?;
        check_threshold("counter.threshold", self.counter.threshold)?;
        self.reveal.margin()?;
        self.counter.margin()?;
        check_positive("counter.tick_ms", self.counter.tick_ms)?;
        check_positive("counter.duration_ms", self.counter.duration_ms)?;
        check_positive("scroll.debounce_ms", self.scroll.debounce_ms)?;
        check_positive("interactions.step_rotation_ms", self.interactions.step_rotation_ms)?;
        if !(self.scroll.navbar_hysteresis_px >= 0.0 && self.scroll.navbar_hysteresis_px.is_finite()) {
            return Err(LumenError::config(
                "scroll.navbar_hysteresis_px",
                "must be a finite non-negative number",
            ));
        }
        if !self.scroll.navbar_threshold_px.is_finite() {
            return Err(LumenError::config("scroll.navbar_threshold_px", "must be finite"));
        }
        Ok(())
    }
}

impl RevealConfig {
    /// Parsed viewport margin.
    pub fn margin(&self) -> Result<Margin> {
        Margin::parse(&self.root_margin).map_err(|_| bad_margin("reveal.root_margin", &self.root_margin))
    }
}

impl CounterConfig {
    pub fn margin(&self) -> Result<Margin> {
        Margin::parse(&self.root_margin).map_err(|_| bad_margin("counter.root_margin", &self.root_margin))
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl ScrollConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn check_threshold(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LumenError::config(field, format!("{value} is outside [0, 1]")))
    }
}

fn check_positive(field: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        Err(LumenError::config(field, "must be positive"))
    } else {
        Ok(())
    }
}

fn bad_margin(field: &'static str, value: &str) -> LumenError {
    LumenError::config(field, format!("unparseable margin {value:?}"))
}
