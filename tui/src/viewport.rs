use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Scrollable region with its own size and vertical offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    y_offset: u16,
    content_height: u16,
}

impl Viewport {
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn y_offset(&self) -> u16 {
        self.y_offset
    }

    /// Take a new size and content height together, clamping the offset once against both.
    pub fn fit(&mut self, width: u16, height: u16, content_height: u16) {
        self.width = width;
        self.height = height;
        self.content_height = content_height;
        self.clamp();
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.height)
    }

    fn clamp(&mut self) {
        self.y_offset = self.y_offset.min(self.max_offset());
    }

    /// Negative offsets clamp to the top. The upper bound is enforced once content is known.
    pub fn set_y_offset(&mut self, offset: i32) {
        self.y_offset = u16::try_from(offset.max(0)).unwrap_or(u16::MAX);
    }

    pub fn goto_top(&mut self) {
        self.y_offset = 0;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.y_offset = self.y_offset.saturating_add(lines).min(self.max_offset());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.y_offset = self.y_offset.saturating_sub(lines);
    }

    /// Scroll just enough to show an item estimated to start at `target_y`.
    pub fn reveal(&mut self, target_y: u16, item_height: u16) {
        let target = i32::from(target_y);
        let offset = i32::from(self.y_offset);
        let height = i32::from(self.height);
        let item_height = i32::from(item_height);
        if target < offset {
            self.set_y_offset(target - 2);
        } else if target + item_height > offset + height {
            self.set_y_offset(target - height + item_height);
        }
    }

    /// Center the viewport on `target_y`.
    pub fn center_on(&mut self, target_y: u16) {
        self.set_y_offset(i32::from(target_y) - i32::from(self.height / 2));
    }

    /// Paging keys shared by every scrollable region. Returns whether the key was used.
    pub fn handle_paging_key(&mut self, key: &KeyEvent) -> bool {
        let half = (self.height / 2).max(1);
        match (key.code, key.modifiers) {
            (KeyCode::PageDown, _) => self.scroll_down(self.height.max(1)),
            (KeyCode::PageUp, _) => self.scroll_up(self.height.max(1)),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => self.scroll_down(half),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.scroll_up(half),
            _ => return false,
        }
        true
    }

    /// Line-wise scrolling for regions that do not own a selection.
    pub fn handle_scroll_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            _ => return self.handle_paging_key(key),
        }
        true
    }
}

/// Menu and detail regions of a two-pane page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportPair {
    pub menu: Viewport,
    pub detail: Viewport,
}
