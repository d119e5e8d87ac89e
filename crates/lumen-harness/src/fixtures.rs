#![forbid(unsafe_code)]

//! Reference landing page.
//!
//! [`LandingPage::build`] lays out the markup the default configuration
//! expects: navbar, hero with floating shapes and a stat counter, problem,
//! feature, impact and timeline cards, and the tabbed demo. The page is
//! built as a [`DocumentSnapshot`] first, so the same fixture can be fed to
//! the web runner as JSON.
//!
//! Geometry is in document space with a 1280×800 viewport; the `*_OFFSET`
//! constants are scroll positions at which each section's reveal targets
//! cross their threshold.

use std::collections::BTreeMap;

use lumen_core::document::{Document, DocumentSnapshot, SnapshotElement};
use lumen_core::error::Result;
use lumen_core::geometry::{Rect, Viewport};
use lumen_core::style::StyleProp;
use lumen_core::surface::ElementSpec;
use lumen_core::ElementId;

pub const VIEWPORT: Viewport = Viewport::new(1280.0, 800.0);

/// Problem cards cross the reveal threshold.
pub const PROBLEM_OFFSET: f64 = 400.0;
/// Feature cards cross the reveal threshold.
pub const FEATURES_OFFSET: f64 = 1100.0;
/// Impact cards and their metric counters are in view.
pub const IMPACT_OFFSET: f64 = 1900.0;
/// Timeline items cross the reveal threshold.
pub const TIMELINE_OFFSET: f64 = 3400.0;
/// Bottom of the page.
pub const PAGE_HEIGHT: f64 = 4800.0;

/// Original texts of the impact metric counters.
pub const IMPACT_METRICS: [&str; 3] = ["2.5K", "85%", "1.2M"];

/// Handles of the fixture's interesting elements.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingPage {
    pub navbar: ElementId,
    pub hamburger: ElementId,
    pub nav_menu: ElementId,
    pub nav_links: Vec<ElementId>,
    pub shapes: Vec<ElementId>,
    pub hero_blocks: Vec<ElementId>,
    pub hero_stat: ElementId,
    pub cta_primary: ElementId,
    pub cta_secondary: ElementId,
    pub problem_cards: Vec<ElementId>,
    pub feature_cards: Vec<ElementId>,
    pub impact_cards: Vec<ElementId>,
    pub metrics: Vec<ElementId>,
    pub demo_buttons: Vec<ElementId>,
    pub demo_panels: Vec<ElementId>,
    pub metric_fills: Vec<ElementId>,
    pub demo_steps: Vec<ElementId>,
    pub timeline: Vec<ElementId>,
}

struct SnapshotBuilder {
    elements: Vec<SnapshotElement>,
}

impl SnapshotBuilder {
    fn add(&mut self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        self.elements.push(SnapshotElement {
            tag: spec.tag,
            parent: parent.map(|p| p.get() - 1),
            classes: spec.classes,
            attributes: spec.attributes.into_iter().collect(),
            text: spec.text,
            styles: spec.styles.into_iter().collect::<BTreeMap<StyleProp, String>>(),
            bounds: spec.bounds,
        });
        ElementId::new(u32::try_from(self.elements.len()).unwrap_or(u32::MAX))
    }

    fn add_all(
        &mut self,
        parent: Option<ElementId>,
        specs: impl IntoIterator<Item = ElementSpec>,
    ) -> Vec<ElementId> {
        specs.into_iter().map(|spec| self.add(parent, spec)).collect()
    }
}

fn section(id: &str, top: f64, height: f64) -> ElementSpec {
    ElementSpec::new("section")
        .id(id)
        .bounds(Rect::new(0.0, top, VIEWPORT.width, height))
}

fn card(class: &str, column: usize, top: f64) -> ElementSpec {
    ElementSpec::new("div")
        .class(class)
        .bounds(Rect::new(40.0 + 420.0 * column as f64, top, 400.0, 300.0))
}

impl LandingPage {
    /// Snapshot of the page plus the handles its elements will get.
    #[must_use]
    pub fn snapshot() -> (DocumentSnapshot, Self) {
        let mut b = SnapshotBuilder {
            elements: Vec::new(),
        };

        let navbar = b.add(
            None,
            ElementSpec::new("nav")
                .class("navbar")
                .bounds(Rect::new(0.0, 0.0, VIEWPORT.width, 70.0)),
        );
        let hamburger = b.add(
            Some(navbar),
            ElementSpec::new("div")
                .class("hamburger")
                .bounds(Rect::new(1200.0, 20.0, 40.0, 30.0)),
        );
        let nav_menu = b.add(Some(navbar), ElementSpec::new("ul").class("nav-menu"));
        let nav_links = b.add_all(
            Some(nav_menu),
            [
                ("#problem", "Problem"),
                ("#features", "Features"),
                ("#impact", "Impact"),
                ("#demo", "Demo"),
            ]
            .into_iter()
            .map(|(href, label)| ElementSpec::new("a").attr("href", href).text(label)),
        );

        let hero = b.add(None, section("home", 0.0, 800.0).class("hero"));
        let holder = b.add(Some(hero), ElementSpec::new("div").class("floating-shapes"));
        let shapes = b.add_all(
            Some(holder),
            (0..3).map(|i| {
                ElementSpec::new("div")
                    .class("shape")
                    .bounds(Rect::new(100.0 + 300.0 * f64::from(i), 150.0, 120.0, 120.0))
            }),
        );
        let badge = b.add(
            Some(hero),
            ElementSpec::new("div")
                .class("hero-badge")
                .text("Now in beta")
                .bounds(Rect::new(200.0, 160.0, 300.0, 30.0)),
        );
        let title = b.add(
            Some(hero),
            ElementSpec::new("h1")
                .class("hero-title")
                .text("Learning that adapts")
                .bounds(Rect::new(200.0, 200.0, 880.0, 120.0)),
        );
        let subtitle = b.add(
            Some(hero),
            ElementSpec::new("p")
                .class("hero-subtitle")
                .bounds(Rect::new(200.0, 330.0, 880.0, 60.0)),
        );
        let stats = b.add(
            Some(hero),
            ElementSpec::new("div")
                .class("hero-stats")
                .bounds(Rect::new(200.0, 420.0, 880.0, 80.0)),
        );
        let hero_stat = b.add(
            Some(stats),
            ElementSpec::new("span")
                .class("stat-number")
                .text("2.5K")
                .bounds(Rect::new(200.0, 430.0, 200.0, 50.0)),
        );
        let actions = b.add(
            Some(hero),
            ElementSpec::new("div")
                .class("hero-actions")
                .bounds(Rect::new(200.0, 540.0, 880.0, 60.0)),
        );
        let cta_primary = b.add(
            Some(actions),
            ElementSpec::new("button")
                .class("cta-primary")
                .text("Get started")
                .bounds(Rect::new(200.0, 540.0, 200.0, 50.0)),
        );
        let cta_secondary = b.add(
            Some(actions),
            ElementSpec::new("a")
                .class("cta-secondary")
                .attr("href", "#demo")
                .text("Watch demo")
                .bounds(Rect::new(420.0, 540.0, 200.0, 50.0)),
        );

        let problem = b.add(None, section("problem", 900.0, 600.0));
        let problem_cards = b.add_all(
            Some(problem),
            [
                ElementSpec::new("div")
                    .class("problem-card")
                    .bounds(Rect::new(80.0, 1000.0, 520.0, 300.0)),
                ElementSpec::new("div")
                    .class("problem-card")
                    .bounds(Rect::new(680.0, 1000.0, 520.0, 300.0)),
            ],
        );

        let features = b.add(None, section("features", 1600.0, 600.0));
        let feature_cards = b.add_all(
            Some(features),
            (0..3).map(|column| card("feature-card", column, 1700.0)),
        );

        let impact = b.add(None, section("impact", 2300.0, 600.0));
        let impact_cards = b.add_all(
            Some(impact),
            (0..3).map(|column| card("impact-card", column, 2400.0)),
        );
        let metrics = impact_cards
            .iter()
            .zip(IMPACT_METRICS)
            .enumerate()
            .map(|(column, (&card, text))| {
                b.add(
                    Some(card),
                    ElementSpec::new("span")
                        .class("metric-number")
                        .text(text)
                        .bounds(Rect::new(60.0 + 420.0 * column as f64, 2450.0, 200.0, 60.0)),
                )
            })
            .collect();

        let demo = b.add(None, section("demo", 3000.0, 800.0));
        let demo_buttons = b.add_all(
            Some(demo),
            [("ai", 200.0), ("classic", 370.0)].into_iter().map(|(tab, x)| {
                let spec = ElementSpec::new("button")
                    .class("demo-btn")
                    .attr("data-demo", tab)
                    .bounds(Rect::new(x, 3050.0, 150.0, 40.0));
                if tab == "ai" { spec.class("active") } else { spec }
            }),
        );
        let ai_panel = b.add(
            Some(demo),
            ElementSpec::new("div")
                .class("demo-panel")
                .class("active")
                .id("ai-demo")
                .bounds(Rect::new(200.0, 3120.0, 880.0, 500.0)),
        );
        let classic_panel = b.add(
            Some(demo),
            ElementSpec::new("div").class("demo-panel").id("classic-demo"),
        );
        let metric_fills = b.add_all(
            Some(ai_panel),
            ["87%", "64%"].into_iter().map(|width| {
                ElementSpec::new("div")
                    .class("metric-fill")
                    .style(StyleProp::Width, width)
            }),
        );
        let demo_steps = b.add_all(
            Some(ai_panel),
            (1..=3).map(|n| ElementSpec::new("div").class("demo-step").text(format!("Step {n}"))),
        );

        let story = b.add(None, section("timeline", 3900.0, 700.0));
        let timeline = b.add_all(
            Some(story),
            (0..2).map(|i| {
                ElementSpec::new("div")
                    .class("timeline-item")
                    .bounds(Rect::new(200.0, 4000.0 + 250.0 * f64::from(i), 880.0, 200.0))
            }),
        );
        b.add(
            None,
            ElementSpec::new("footer").bounds(Rect::new(0.0, 4600.0, VIEWPORT.width, 200.0)),
        );

        let snapshot = DocumentSnapshot {
            viewport: VIEWPORT,
            elements: b.elements,
        };
        let page = Self {
            navbar,
            hamburger,
            nav_menu,
            nav_links,
            shapes,
            hero_blocks: vec![badge, title, subtitle, stats, actions],
            hero_stat,
            cta_primary,
            cta_secondary,
            problem_cards,
            feature_cards,
            impact_cards,
            metrics,
            demo_buttons,
            demo_panels: vec![ai_panel, classic_panel],
            metric_fills,
            demo_steps,
            timeline,
        };
        (snapshot, page)
    }

    /// The page as a [`Document`].
    pub fn build() -> Result<(Document, Self)> {
        let (snapshot, page) = Self::snapshot();
        Ok((Document::from_snapshot(&snapshot)?, page))
    }

    /// Every element the default reveal selector hides.
    #[must_use]
    pub fn reveal_targets(&self) -> Vec<ElementId> {
        let mut all = Vec::new();
        all.extend(&self.problem_cards);
        all.extend(&self.feature_cards);
        all.extend(&self.impact_cards);
        all.extend(&self.timeline);
        all.sort_unstable();
        all
    }

    /// Every counter element, in document order.
    #[must_use]
    pub fn counters(&self) -> Vec<ElementId> {
        let mut all = vec![self.hero_stat];
        all.extend(&self.metrics);
        all
    }
}
