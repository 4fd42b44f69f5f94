use std::str::FromStr;

use anyhow::Context;

/// A reference line on an element or on the viewport, as a fraction of its height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    Percent(f32),
}

impl Edge {
    pub fn fraction(self) -> f32 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => 0.5,
            Edge::Bottom => 1.0,
            Edge::Percent(percent) => percent / 100.0,
        }
    }
}

impl FromStr for Edge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Edge::Top),
            "center" => Ok(Edge::Center),
            "bottom" => Ok(Edge::Bottom),
            _ => {
                let percent = s
                    .strip_suffix('%')
                    .ok_or_else(|| anyhow::anyhow!("Unknown edge {:?}", s))?;
                let percent = percent
                    .parse::<f32>()
                    .with_context(|| format!("Invalid percentage {:?}", s))?;
                Ok(Edge::Percent(percent))
            }
        }
    }
}

/// Start rule of a trigger: the trigger becomes active once `element` edge of the section
/// scrolls past `viewport` edge of the window. Parsed from strings like `"top center"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerStart {
    pub element: Edge,
    pub viewport: Edge,
}

impl TriggerStart {
    pub const TOP_CENTER: TriggerStart = TriggerStart {
        element: Edge::Top,
        viewport: Edge::Center,
    };

    /// Scroll offset at which the trigger becomes active.
    pub fn offset(&self, section_top: f32, section_height: f32, viewport_height: f32) -> f32 {
        section_top + self.element.fraction() * section_height
            - self.viewport.fraction() * viewport_height
    }
}

impl FromStr for TriggerStart {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (parts.next(), parts.next(), parts.next())
        else {
            anyhow::bail!("Trigger start {:?} must be \"<element edge> <viewport edge>\"", s);
        };

        Ok(TriggerStart {
            element: element.parse()?,
            viewport: viewport.parse()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// One block of the page. `height` is in viewport heights.
#[derive(Debug, Clone)]
pub struct Section {
    pub class: String,
    pub title: String,
    pub body: String,
    pub height: f32,
    pub align: CaptionAlign,
}

impl Section {
    pub fn new(class: &str, title: &str, body: &str) -> Self {
        Self {
            class: class.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            height: 1.0,
            align: CaptionAlign::default(),
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn with_align(mut self, align: CaptionAlign) -> Self {
        self.align = align;
        self
    }
}

/// Sections stacked top to bottom, measured in pixels for the current viewport.
#[derive(Debug, Clone)]
pub struct PageLayout {
    viewport_height: f32,
    tops: Vec<f32>,
    heights: Vec<f32>,
    total_height: f32,
}

impl PageLayout {
    pub fn new(sections: &[Section], viewport_height: f32) -> Self {
        let mut tops = Vec::with_capacity(sections.len());
        let mut heights = Vec::with_capacity(sections.len());
        let mut top = 0.0;

        for section in sections {
            let height = section.height.max(0.0) * viewport_height;
            tops.push(top);
            heights.push(height);
            top += height;
        }

        Self {
            viewport_height,
            tops,
            heights,
            total_height: top,
        }
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn section_top(&self, index: usize) -> f32 {
        self.tops[index]
    }

    pub fn section_height(&self, index: usize) -> f32 {
        self.heights[index]
    }

    pub fn section_count(&self) -> usize {
        self.tops.len()
    }

    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    pub fn max_scroll(&self) -> f32 {
        (self.total_height - self.viewport_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Scrolled down past the start line.
    Enter,
    /// Scrolled back up above the start line.
    LeaveBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub trigger: usize,
    pub kind: TriggerKind,
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    pub class: String,
    pub section: usize,
    pub start: TriggerStart,
    active: bool,
}

impl ScrollTrigger {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn offset(&self, layout: &PageLayout) -> f32 {
        self.start.offset(
            layout.section_top(self.section),
            layout.section_height(self.section),
            layout.viewport_height(),
        )
    }
}

pub struct ScrollTriggers {
    triggers: Vec<ScrollTrigger>,
}

impl ScrollTriggers {
    /// Binds one trigger per class name, in order. Every class must name a section.
    pub fn new<'a>(
        sections: &[Section],
        classes: impl IntoIterator<Item = &'a str>,
        start: TriggerStart,
    ) -> anyhow::Result<Self> {
        let triggers = classes
            .into_iter()
            .map(|class| {
                let section = sections
                    .iter()
                    .position(|section| section.class == class)
                    .with_context(|| format!("No page section with class {:?}", class))?;

                Ok(ScrollTrigger {
                    class: class.to_string(),
                    section,
                    start,
                    active: false,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { triggers })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrollTrigger> {
        self.triggers.iter()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.triggers.iter().filter(|trigger| trigger.active).count()
    }

    /// Updates every trigger against the scroll offset and returns the crossings in the
    /// order the scroll passed them: leave-backs bottom-up, then enters top-down.
    pub fn update(&mut self, layout: &PageLayout, scroll: f32) -> Vec<TriggerEvent> {
        let mut entered = Vec::new();
        let mut left = Vec::new();

        for (index, trigger) in self.triggers.iter_mut().enumerate() {
            let offset = trigger.offset(layout);
            let active = scroll > offset;

            if active == trigger.active {
                continue;
            }

            trigger.active = active;
            if active {
                entered.push((offset, index));
            } else {
                left.push((offset, index));
            }
        }

        left.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));
        entered.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let leave_backs = left.into_iter().map(|(_, trigger)| TriggerEvent {
            trigger,
            kind: TriggerKind::LeaveBack,
        });
        let enters = entered.into_iter().map(|(_, trigger)| TriggerEvent {
            trigger,
            kind: TriggerKind::Enter,
        });

        leave_backs.chain(enters).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<Section> {
        ["intro", "cordilleras", "placas", "left"]
            .into_iter()
            .map(|class| Section::new(class, class, ""))
            .collect()
    }

    fn enter(trigger: usize) -> TriggerEvent {
        TriggerEvent {
            trigger,
            kind: TriggerKind::Enter,
        }
    }

    fn leave_back(trigger: usize) -> TriggerEvent {
        TriggerEvent {
            trigger,
            kind: TriggerKind::LeaveBack,
        }
    }

    #[test]
    fn parses_start_rules() {
        assert_eq!(
            "top center".parse::<TriggerStart>().unwrap(),
            TriggerStart::TOP_CENTER
        );
        assert_eq!(
            "bottom 25%".parse::<TriggerStart>().unwrap(),
            TriggerStart {
                element: Edge::Bottom,
                viewport: Edge::Percent(25.0),
            }
        );
        assert!("top".parse::<TriggerStart>().is_err());
        assert!("middle center".parse::<TriggerStart>().is_err());
        assert!("top center bottom".parse::<TriggerStart>().is_err());
        assert!("top x%".parse::<TriggerStart>().is_err());
    }

    #[test]
    fn top_center_fires_when_section_top_reaches_middle() {
        let sections = page();
        let layout = PageLayout::new(&sections, 800.0);
        let mut triggers =
            ScrollTriggers::new(&sections, ["cordilleras"], TriggerStart::TOP_CENTER).unwrap();

        // Section starts at 800px, so it crosses the centre line at 400px of scroll
        assert!(triggers.update(&layout, 400.0).is_empty());
        assert_eq!(triggers.update(&layout, 401.0), [enter(0)]);
        assert!(triggers.update(&layout, 900.0).is_empty());
        assert_eq!(triggers.update(&layout, 100.0), [leave_back(0)]);
        assert_eq!(triggers.active_count(), 0);
    }

    #[test]
    fn jumps_report_crossings_in_scroll_order() {
        let sections = page();
        let layout = PageLayout::new(&sections, 800.0);
        let mut triggers = ScrollTriggers::new(
            &sections,
            ["cordilleras", "placas", "left"],
            TriggerStart::TOP_CENTER,
        )
        .unwrap();

        assert_eq!(
            triggers.update(&layout, layout.max_scroll()),
            [enter(0), enter(1), enter(2)]
        );
        assert_eq!(triggers.active_count(), 3);

        assert_eq!(
            triggers.update(&layout, 0.0),
            [leave_back(2), leave_back(1), leave_back(0)]
        );
    }

    #[test]
    fn unknown_section_is_an_error() {
        let sections = page();
        let error = ScrollTriggers::new(&sections, ["regreso"], TriggerStart::TOP_CENTER)
            .err()
            .unwrap();
        assert!(error.to_string().contains("regreso"));
    }

    #[test]
    fn layout_measures_in_viewport_heights() {
        let sections = vec![
            Section::new("a", "", "").with_height(1.5),
            Section::new("b", "", ""),
        ];
        let layout = PageLayout::new(&sections, 600.0);

        assert_eq!(layout.section_top(1), 900.0);
        assert_eq!(layout.total_height(), 1500.0);
        assert_eq!(layout.max_scroll(), 900.0);
    }
}
