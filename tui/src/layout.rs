use ratatui::layout::Size;

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 10;
const SMALL_WIDTH: u16 = 50;
const MEDIUM_WIDTH: u16 = 75;
const MAX_CONTAINER_HEIGHT: u16 = 30;
const CONTENT_PADDING: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    Undersized,
    Small,
    Medium,
    Large,
}

impl Breakpoint {
    pub fn from_dimensions(width: u16, height: u16) -> Self {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            Breakpoint::Undersized
        } else if width < SMALL_WIDTH {
            Breakpoint::Small
        } else if width < MEDIUM_WIDTH {
            Breakpoint::Medium
        } else {
            Breakpoint::Large
        }
    }

    /// Whether menu and detail regions sit side by side.
    pub fn is_split(self) -> bool {
        self == Breakpoint::Large
    }
}

/// Container and content dimensions derived from the terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    pub breakpoint: Breakpoint,
    pub container_width: u16,
    pub container_height: u16,
    pub content_width: u16,
    pub content_height: u16,
}

impl Layout {
    /// `chrome_height` is the combined height of header, breadcrumbs and footer.
    pub fn compute(width: u16, height: u16, chrome_height: u16) -> Self {
        let breakpoint = Breakpoint::from_dimensions(width, height);
        let (container_width, container_height) = match breakpoint {
            Breakpoint::Undersized | Breakpoint::Small => (width, height),
            Breakpoint::Medium => (SMALL_WIDTH, height.min(MAX_CONTAINER_HEIGHT)),
            Breakpoint::Large => (MEDIUM_WIDTH, height.min(MAX_CONTAINER_HEIGHT)),
        };
        Self {
            width,
            height,
            breakpoint,
            container_width,
            container_height,
            content_width: container_width.saturating_sub(CONTENT_PADDING),
            content_height: container_height.saturating_sub(chrome_height),
        }
    }
}

/// Sizes of the menu and detail regions of a two-pane page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub split: bool,
    pub menu: Size,
    pub detail: Size,
}

impl Layout {
    /// Side by side on large terminals, otherwise the menu is stacked above the detail.
    pub fn panes(&self, menu_width: u16, menu_lines: u16) -> Panes {
        if self.breakpoint.is_split() {
            let menu_width = menu_width.min(self.content_width / 2);
            Panes {
                split: true,
                menu: Size::new(menu_width, self.content_height),
                detail: Size::new(
                    self.content_width.saturating_sub(menu_width),
                    self.content_height,
                ),
            }
        } else {
            let menu_height = menu_lines.min(self.content_height / 2);
            Panes {
                split: false,
                menu: Size::new(self.content_width, menu_height),
                detail: Size::new(
                    self.content_width,
                    self.content_height.saturating_sub(menu_height),
                ),
            }
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::compute(0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_follow_width() {
        assert_eq!(Breakpoint::from_dimensions(19, 40), Breakpoint::Undersized);
        assert_eq!(Breakpoint::from_dimensions(80, 9), Breakpoint::Undersized);
        assert_eq!(Breakpoint::from_dimensions(20, 10), Breakpoint::Small);
        assert_eq!(Breakpoint::from_dimensions(49, 40), Breakpoint::Small);
        assert_eq!(Breakpoint::from_dimensions(50, 40), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_dimensions(74, 40), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_dimensions(75, 40), Breakpoint::Large);
    }

    #[test]
    fn container_sizes() {
        let small = Layout::compute(40, 50, 6);
        assert_eq!((small.container_width, small.container_height), (40, 50));
        assert_eq!((small.content_width, small.content_height), (36, 44));

        let medium = Layout::compute(60, 50, 6);
        assert_eq!((medium.container_width, medium.container_height), (50, 30));

        let large = Layout::compute(120, 24, 6);
        assert_eq!((large.container_width, large.container_height), (75, 24));
        assert_eq!((large.content_width, large.content_height), (71, 18));
    }

    #[test]
    fn panes_split_or_stack() {
        let large = Layout::compute(120, 40, 10);
        let panes = large.panes(16, 8);
        assert!(panes.split);
        assert_eq!(panes.menu, Size::new(16, 20));
        assert_eq!(panes.detail, Size::new(55, 20));

        let small = Layout::compute(40, 40, 10);
        let panes = small.panes(16, 8);
        assert!(!panes.split);
        assert_eq!(panes.menu, Size::new(36, 8));
        assert_eq!(panes.detail, Size::new(36, 22));
    }
}
