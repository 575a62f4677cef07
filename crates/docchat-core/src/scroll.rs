/// Rows from the bottom within which the transcript counts as "at the bottom".
pub const DEFAULT_PROXIMITY_THRESHOLD: u16 = 3;

/// Decides when the transcript view follows new messages.
///
/// All values are in rows. `offset` is the first visible row of the
/// transcript; the view is at the bottom when `offset` equals
/// `content_height - viewport_height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollCoordinator {
    offset: u16,
    content_height: u16,
    viewport_height: u16,
    threshold: u16,
    show_jump: bool,
}

impl Default for ScrollCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD)
    }
}

impl ScrollCoordinator {
    pub fn new(threshold: u16) -> Self {
        Self {
            offset: 0,
            content_height: 0,
            viewport_height: 0,
            // a threshold of zero would never count the bottom row as near
            threshold: threshold.max(1),
            show_jump: false,
        }
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn content_height(&self) -> u16 {
        self.content_height
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Whether the jump-to-bottom affordance should be shown
    pub fn show_jump_to_bottom(&self) -> bool {
        self.show_jump
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn distance_from_bottom(&self) -> u16 {
        self.max_offset().saturating_sub(self.offset)
    }

    pub fn is_near_bottom(&self) -> bool {
        self.distance_from_bottom() < self.threshold
    }

    /// New transcript content arrived. Follows it only if the view was near
    /// the bottom beforehand.
    pub fn on_new_message(&mut self, content_height: u16) {
        let was_near_bottom = self.is_near_bottom();
        self.content_height = content_height;
        if was_near_bottom {
            self.scroll_to_bottom();
        } else {
            self.offset = self.offset.min(self.max_offset());
            self.show_jump = !self.is_near_bottom();
        }
    }

    /// User scrolled by `delta` rows (negative is up).
    pub fn on_scroll(&mut self, delta: i32, has_messages: bool) {
        let target = (self.offset as i32).saturating_add(delta);
        self.offset = target.clamp(0, self.max_offset() as i32) as u16;
        self.show_jump = has_messages && !self.is_near_bottom();
    }

    pub fn scroll_to_top(&mut self, has_messages: bool) {
        self.on_scroll(-(self.offset as i32), has_messages);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.show_jump = false;
    }

    /// Geometry changed without a new message (terminal resize, rewrap,
    /// loading indicator). A view at the bottom stays at the bottom.
    pub fn resize(&mut self, content_height: u16, viewport_height: u16) {
        let was_near_bottom = self.is_near_bottom();
        self.content_height = content_height;
        self.viewport_height = viewport_height;
        if was_near_bottom {
            self.scroll_to_bottom();
        } else {
            self.offset = self.offset.min(self.max_offset());
            if self.is_near_bottom() {
                self.show_jump = false;
            }
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.content_height = 0;
        self.show_jump = false;
    }
}
